//! Unified error type for the marketplace keeper.
//!
//! Validation failures carry the text shown to the caller; everything else is
//! reported to Discord as the short fixed failure string of the command.

use thiserror::Error;

/// Every failure the workflow, the bot and the web server can produce.
#[derive(Debug, Error)]
pub enum Error {
    #[error("Configuration error: {message}")]
    Config { message: String },

    #[error("Environment variable error: {0}")]
    EnvVar(#[from] std::env::VarError),

    #[error("Missing required fields")]
    MissingFields,

    #[error("Addon already exists: {title}")]
    AddonExists { title: String },

    #[error("Addon not found: {title}")]
    AddonNotFound { title: String },

    #[error("Invalid asset file name: {name:?}")]
    InvalidAssetName { name: String },

    #[error("Failed to fetch image from {url}: HTTP {status}")]
    Fetch { url: String, status: u16 },

    #[error("HTTP client error: {0}")]
    Http(#[from] reqwest::Error),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("Page error: {message}")]
    Page { message: String },

    #[error("git {command} failed: {detail}")]
    Git { command: String, detail: String },

    #[error("Serenity/Poise framework error: {0}")]
    #[allow(clippy::enum_variant_names)]
    Framework(Box<poise::serenity_prelude::Error>),
}

impl From<poise::serenity_prelude::Error> for Error {
    fn from(value: poise::serenity_prelude::Error) -> Self {
        Self::Framework(Box::new(value))
    }
}

impl Error {
    /// Text to show the caller verbatim, for errors that are the caller's to fix.
    #[must_use]
    pub fn user_message(&self) -> Option<String> {
        match self {
            Self::MissingFields => Some(
                "Missing required fields. Please provide title, redirect URL, and image."
                    .to_string(),
            ),
            Self::AddonExists { .. } => Some("Failed: Addon already exists!".to_string()),
            Self::AddonNotFound { title } => {
                Some(format!("Failed: Addon with title \"{title}\" not found."))
            }
            Self::InvalidAssetName { name } => {
                Some(format!("Failed: \"{name}\" is not a usable image file name."))
            }
            _ => None,
        }
    }
}

/// Convenience `Result` type
pub type Result<T> = std::result::Result<T, Error>;
