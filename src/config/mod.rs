//! Application configuration.
//!
//! Settings come from an optional `marketplace.toml` and are then overridden by
//! environment variables. The resulting [`AppConfig`] is built once at startup
//! and shared by reference with the bot and the publish workflow.

/// Version control identity, remote and credential token
pub mod git;

/// Site layout: page, asset directory and catalog paths
pub mod site;

/// Allow-list of Discord users permitted to run commands
pub mod users;

use crate::errors::{Error, Result};
use serde::Deserialize;
use std::path::Path;

pub use git::{GitConfig, Secret};
pub use site::SiteConfig;
pub use users::Operators;

/// Default location of the optional configuration file.
pub const DEFAULT_CONFIG_PATH: &str = "marketplace.toml";

/// HTTP server settings.
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct ServerConfig {
    /// Port the static file server listens on
    pub port: u16,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self { port: 10000 }
    }
}

/// Command interface settings.
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct BotConfig {
    /// Discord user ids allowed to run `/add` and `/remove`
    pub operators: Operators,
    /// Whether the `/add` result reply is ephemeral
    pub add_reply_ephemeral: bool,
    /// Whether the `/remove` result reply is ephemeral
    pub remove_reply_ephemeral: bool,
}

impl Default for BotConfig {
    fn default() -> Self {
        Self {
            operators: Operators::default(),
            add_reply_ephemeral: true,
            remove_reply_ephemeral: true,
        }
    }
}

/// Everything the process needs to know, built once in `main`.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct AppConfig {
    pub server: ServerConfig,
    pub site: SiteConfig,
    pub git: GitConfig,
    pub bot: BotConfig,
}

impl AppConfig {
    /// Parses a configuration document; absent keys take their defaults.
    pub fn from_toml(contents: &str) -> Result<Self> {
        toml::from_str(contents).map_err(|e| Error::Config {
            message: format!("Failed to parse configuration: {e}"),
        })
    }

    /// Applies environment overrides read through `lookup`.
    ///
    /// Recognised keys: `PORT`, `GIT_EMAIL`, `GIT_NAME`, `GITHUB_TOKEN` and
    /// `AUTHORIZED_USERS` (comma separated user ids).
    pub fn apply_env_overrides<F>(&mut self, lookup: F) -> Result<()>
    where
        F: Fn(&str) -> Option<String>,
    {
        if let Some(port) = lookup("PORT") {
            self.server.port = port.trim().parse().map_err(|e| Error::Config {
                message: format!("PORT must be a port number, got {port:?}: {e}"),
            })?;
        }
        if let Some(email) = lookup("GIT_EMAIL") {
            self.git.author_email = email;
        }
        if let Some(name) = lookup("GIT_NAME") {
            self.git.author_name = name;
        }
        if let Some(token) = lookup("GITHUB_TOKEN").filter(|t| !t.trim().is_empty()) {
            self.git.token = Some(Secret::new(token));
        }
        if let Some(ids) = lookup("AUTHORIZED_USERS") {
            self.bot.operators = Operators::parse_list(&ids)?;
        }
        Ok(())
    }
}

/// Reads the configuration file at `path`, or the defaults when it does not exist.
pub fn load_config<P: AsRef<Path>>(path: P) -> Result<AppConfig> {
    let path_ref = path.as_ref();
    tracing::debug!("Attempting to load configuration from: {:?}", path_ref);
    match std::fs::read_to_string(path_ref) {
        Ok(contents) => AppConfig::from_toml(&contents),
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
            tracing::info!("No configuration file at {:?}, using defaults", path_ref);
            Ok(AppConfig::default())
        }
        Err(e) => Err(Error::Config {
            message: format!("Failed to read config file {path_ref:?}: {e}"),
        }),
    }
}

/// Loads the file named by `MARKETPLACE_CONFIG` (or the default path) and
/// layers the process environment on top.
pub fn load_app_configuration() -> Result<AppConfig> {
    let path = std::env::var("MARKETPLACE_CONFIG").unwrap_or_else(|_| DEFAULT_CONFIG_PATH.into());
    let mut config = load_config(&path)
        .inspect_err(|e| tracing::error!("Critical error loading configuration: {e}"))?;
    config.apply_env_overrides(|key| std::env::var(key).ok())?;
    tracing::info!(
        port = config.server.port,
        site_root = ?config.site.root,
        operators = config.bot.operators.len(),
        "Configuration loaded"
    );
    Ok(config)
}
