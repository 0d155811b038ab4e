//! Shared test utilities for the marketplace keeper.
//!
//! Provides a temporary site with a seeded page, a publisher fake that records
//! change sets instead of running git, and a tiny image server.

#![allow(clippy::unwrap_used, clippy::expect_used)]

use crate::config::SiteConfig;
use crate::core::Marketplace;
use crate::core::publish::{ChangeSet, PublishReport, Publisher};
use crate::errors::{Error, Result};
use async_trait::async_trait;
use axum::Router;
use axum::http::{StatusCode, header};
use axum::routing::get;
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex};
use tempfile::TempDir;

/// A page with one legacy card (no stable key) for "Forest Pack".
pub const SAMPLE_PAGE: &str = r##"<!DOCTYPE html>
<html lang="en">
<head>
  <meta charset="utf-8">
  <title>Marketplace</title>
</head>
<body>
  <h1>Addons</h1>

  <div class="grid">

        <div class="card">
          <h2 class="glow-text"> Forest Pack </h2>
          <a href="#" class="redirect-link" data-redirect="https://example.com/forest">
            <img src="forest.png" alt="Forest Pack">
          </a>
        </div>


  </div>
</body>
</html>
"##;

/// Bytes served as `/sky.png` by [`spawn_image_server`].
pub const SKY_PNG: &[u8] = b"\x89PNG\r\n\x1a\nsky-theme-image";

/// Serves `/sky.png` and answers 404 for everything else.
/// Returns the base URL, e.g. `http://127.0.0.1:43123`.
pub async fn spawn_image_server() -> String {
    let app = Router::new()
        .route(
            "/sky.png",
            get(|| async { ([(header::CONTENT_TYPE, "image/png")], SKY_PNG) }),
        )
        .fallback(|| async { StatusCode::NOT_FOUND });
    let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    tokio::spawn(async move {
        axum::serve(listener, app).await.unwrap();
    });
    format!("http://{addr}")
}

/// Publisher fake that records every change set.
#[derive(Debug, Default)]
pub struct RecordingPublisher {
    changes: Mutex<Vec<ChangeSet>>,
    fail_commit: AtomicBool,
    reject_push: AtomicBool,
}

impl RecordingPublisher {
    pub fn changes(&self) -> Vec<ChangeSet> {
        self.changes.lock().unwrap().clone()
    }

    /// Makes the next publish fail like a broken `git commit`.
    pub fn fail_next_commit(&self) {
        self.fail_commit.store(true, Ordering::SeqCst);
    }

    /// Makes every publish report a rejected push.
    pub fn reject_pushes(&self) {
        self.reject_push.store(true, Ordering::SeqCst);
    }
}

#[async_trait]
impl Publisher for RecordingPublisher {
    async fn publish(&self, change: &ChangeSet) -> Result<PublishReport> {
        if self.fail_commit.swap(false, Ordering::SeqCst) {
            return Err(Error::Git {
                command: "commit".to_string(),
                detail: "simulated failure".to_string(),
            });
        }
        self.changes.lock().unwrap().push(change.clone());
        let push_error = self
            .reject_push
            .load(Ordering::SeqCst)
            .then(|| "simulated push rejection".to_string());
        Ok(PublishReport {
            committed: true,
            push_error,
        })
    }
}

/// A throwaway site directory laid out like the default configuration.
pub struct TestSite {
    dir: TempDir,
    pub site: SiteConfig,
    pub publisher: Arc<RecordingPublisher>,
}

impl TestSite {
    /// Creates the site with [`SAMPLE_PAGE`] and an empty asset directory.
    pub fn new() -> Result<Self> {
        let dir = tempfile::tempdir()?;
        let site = SiteConfig::rooted_at(dir.path());
        std::fs::create_dir_all(site.page_path().parent().unwrap())?;
        std::fs::write(site.page_path(), SAMPLE_PAGE)?;
        std::fs::create_dir_all(site.assets_dir())?;
        Ok(Self {
            dir,
            site,
            publisher: Arc::new(RecordingPublisher::default()),
        })
    }

    pub fn root(&self) -> &Path {
        self.dir.path()
    }

    pub fn marketplace(&self) -> Marketplace {
        let publisher: Arc<dyn Publisher> = self.publisher.clone();
        Marketplace::new(self.site.clone(), reqwest::Client::new(), publisher)
    }

    pub fn page_html(&self) -> Result<String> {
        Ok(std::fs::read_to_string(self.site.page_path())?)
    }

    pub fn asset(&self, name: &str) -> PathBuf {
        self.site.assets_dir().join(name)
    }
}
