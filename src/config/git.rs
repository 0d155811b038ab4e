//! Version control settings.

use serde::{Deserialize, Deserializer};
use std::fmt;

/// A credential that never shows up in `Debug` output.
#[derive(Clone, PartialEq, Eq)]
pub struct Secret(String);

impl Secret {
    #[must_use]
    pub const fn new(value: String) -> Self {
        Self(value)
    }

    /// The raw credential. Only call this where the value is handed to git.
    #[must_use]
    pub fn expose(&self) -> &str {
        &self.0
    }

    /// Replaces every occurrence of the credential in `text`.
    #[must_use]
    pub fn redact(&self, text: &str) -> String {
        if self.0.is_empty() {
            return text.to_string();
        }
        text.replace(&self.0, "***")
    }
}

impl fmt::Debug for Secret {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("Secret(***)")
    }
}

impl<'de> Deserialize<'de> for Secret {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        String::deserialize(deserializer).map(Self)
    }
}

/// Commit identity, remote repository and branch.
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct GitConfig {
    pub author_name: String,
    pub author_email: String,
    /// Host of the remote, e.g. `github.com`
    pub remote_host: String,
    /// `owner/name` of the remote repository
    pub remote_repository: String,
    pub branch: String,
    /// Credential token embedded in the remote URL
    pub token: Option<Secret>,
}

impl Default for GitConfig {
    fn default() -> Self {
        Self {
            author_name: "Arcticnime".to_string(),
            author_email: "marketplace-bot@users.noreply.github.com".to_string(),
            remote_host: "github.com".to_string(),
            remote_repository: "Arcticnime/arctics-marketplace".to_string(),
            branch: "main".to_string(),
            token: None,
        }
    }
}

impl GitConfig {
    /// HTTPS remote URL, carrying the token as credentials when one is set.
    #[must_use]
    pub fn remote_url(&self) -> String {
        match &self.token {
            Some(token) => format!(
                "https://{}@{}/{}.git",
                token.expose(),
                self.remote_host,
                self.remote_repository
            ),
            None => format!(
                "https://{}/{}.git",
                self.remote_host, self.remote_repository
            ),
        }
    }
}
