//! Asset manager - downloads addon images into the asset directory and
//! deletes them again on removal.

use crate::errors::{Error, Result};
use reqwest::Client;
use std::path::{Path, PathBuf};
use tracing::{debug, info};

/// The directory of addon images plus the HTTP client used to fetch them.
#[derive(Debug, Clone)]
pub struct AssetStore {
    dir: PathBuf,
    http: Client,
}

impl AssetStore {
    #[must_use]
    pub fn new(dir: impl Into<PathBuf>, http: Client) -> Self {
        Self {
            dir: dir.into(),
            http,
        }
    }

    #[must_use]
    pub fn dir(&self) -> &Path {
        &self.dir
    }

    /// Path of the asset `name`, refusing names that would escape the directory.
    pub fn asset_path(&self, name: &str) -> Result<PathBuf> {
        validate_asset_name(name)?;
        Ok(self.dir.join(name))
    }

    /// Downloads `url` into memory. Any non-success status is a `Fetch` error.
    pub async fn fetch(&self, url: &str) -> Result<Vec<u8>> {
        debug!("Fetching image from URL: {url}");
        let response = self.http.get(url).send().await?;
        let status = response.status();
        if !status.is_success() {
            return Err(Error::Fetch {
                url: url.to_string(),
                status: status.as_u16(),
            });
        }
        Ok(response.bytes().await?.to_vec())
    }

    /// Writes `bytes` as asset `name`, replacing any existing file.
    pub async fn write(&self, name: &str, bytes: &[u8]) -> Result<u64> {
        let path = self.asset_path(name)?;
        tokio::fs::create_dir_all(&self.dir).await?;
        tokio::fs::write(&path, bytes).await?;
        info!("Saved image {:?} ({} bytes)", path, bytes.len());
        Ok(bytes.len() as u64)
    }

    /// Downloads `url` and stores it as asset `name`.
    pub async fn fetch_to_disk(&self, url: &str, name: &str) -> Result<u64> {
        validate_asset_name(name)?;
        let bytes = self.fetch(url).await?;
        self.write(name, &bytes).await
    }

    /// Removes asset `name`. Returns whether a file was actually deleted.
    pub async fn delete_if_exists(&self, name: &str) -> Result<bool> {
        let path = self.asset_path(name)?;
        match tokio::fs::remove_file(&path).await {
            Ok(()) => {
                info!("Deleted image {:?}", path);
                Ok(true)
            }
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(false),
            Err(e) => Err(e.into()),
        }
    }
}

/// Asset names are plain file names: no separators, no parent references.
pub fn validate_asset_name(name: &str) -> Result<()> {
    let trimmed = name.trim();
    let invalid = trimmed.is_empty()
        || trimmed != name
        || name == "."
        || name == ".."
        || name.contains(['/', '\\', '\0']);
    if invalid {
        return Err(Error::InvalidAssetName {
            name: name.to_string(),
        });
    }
    Ok(())
}
