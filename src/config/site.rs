//! Site layout configuration.
//!
//! All paths except `root` are relative to `root`, which is also the working
//! directory of the git repository the workflow publishes to.

use serde::Deserialize;
use std::path::{Path, PathBuf};

/// Where the page, the assets and the catalog live.
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct SiteConfig {
    /// Repository working directory
    pub root: PathBuf,
    /// HTML page holding the addon cards
    pub page: PathBuf,
    /// Directory of addon images, served as static files
    pub assets: PathBuf,
    /// JSON catalog of addons
    pub catalog: PathBuf,
    /// Display name used in embed footers
    pub name: String,
}

impl Default for SiteConfig {
    fn default() -> Self {
        Self {
            root: PathBuf::from("."),
            page: PathBuf::from("main/index.html"),
            assets: PathBuf::from("public"),
            catalog: PathBuf::from("addons.json"),
            name: "Arctics Marketplace".to_string(),
        }
    }
}

impl SiteConfig {
    /// Layout rooted at `root` with the default relative paths.
    #[must_use]
    pub fn rooted_at(root: impl Into<PathBuf>) -> Self {
        Self {
            root: root.into(),
            ..Self::default()
        }
    }

    #[must_use]
    pub fn page_path(&self) -> PathBuf {
        self.root.join(&self.page)
    }

    #[must_use]
    pub fn assets_dir(&self) -> PathBuf {
        self.root.join(&self.assets)
    }

    #[must_use]
    pub fn catalog_path(&self) -> PathBuf {
        self.root.join(&self.catalog)
    }

    /// Repository-relative path of an asset file.
    #[must_use]
    pub fn asset_repo_path(&self, name: &str) -> PathBuf {
        self.assets.join(name)
    }

    #[must_use]
    pub fn root(&self) -> &Path {
        &self.root
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_paths_are_joined_onto_root() {
        let site = SiteConfig::rooted_at("/srv/site");
        assert_eq!(site.page_path(), Path::new("/srv/site/main/index.html"));
        assert_eq!(site.assets_dir(), Path::new("/srv/site/public"));
        assert_eq!(site.catalog_path(), Path::new("/srv/site/addons.json"));
        assert_eq!(site.asset_repo_path("sky.png"), Path::new("public/sky.png"));
    }
}
