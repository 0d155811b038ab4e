//! Static file server for the marketplace page and its images.
//!
//! `GET /` answers with the page file; every other path is looked up in the
//! asset directory. Files are read per request, so changes made by the bot
//! are visible immediately.

use crate::config::SiteConfig;
use crate::errors::Result;
use axum::Router;
use std::net::SocketAddr;
use tokio::net::TcpListener;
use tower_http::services::{ServeDir, ServeFile};
use tower_http::trace::TraceLayer;
use tracing::info;

/// Routes for the page and the asset directory.
pub fn router(site: &SiteConfig) -> Router {
    Router::new()
        .route_service("/", ServeFile::new(site.page_path()))
        .fallback_service(ServeDir::new(site.assets_dir()))
        .layer(TraceLayer::new_for_http())
}

/// Serves `site` on all interfaces until the listener fails.
pub async fn serve(port: u16, site: SiteConfig) -> Result<()> {
    let listener = TcpListener::bind(SocketAddr::from(([0, 0, 0, 0], port))).await?;
    serve_on(listener, &site).await
}

/// Serves `site` on an already bound listener.
pub async fn serve_on(listener: TcpListener, site: &SiteConfig) -> Result<()> {
    info!("Server is running on {}", listener.local_addr()?);
    axum::serve(listener, router(site)).await?;
    Ok(())
}

#[cfg(test)]
mod tests {
    #![allow(clippy::unwrap_used)]
    use super::*;
    use crate::test_utils::{SAMPLE_PAGE, TestSite};

    async fn spawn(site: SiteConfig) -> String {
        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        tokio::spawn(async move { serve_on(listener, &site).await });
        format!("http://{addr}")
    }

    #[tokio::test]
    async fn test_serves_page_and_assets() -> Result<()> {
        let site = TestSite::new()?;
        std::fs::write(site.asset("forest.png"), b"forest-bytes")?;
        let base = spawn(site.site.clone()).await;
        let client = reqwest::Client::new();

        let page = client.get(format!("{base}/")).send().await?;
        assert!(page.status().is_success());
        assert_eq!(page.text().await?, SAMPLE_PAGE);

        let image = client.get(format!("{base}/forest.png")).send().await?;
        assert!(image.status().is_success());
        assert_eq!(image.bytes().await?.as_ref(), b"forest-bytes");

        let missing = client.get(format!("{base}/nope.png")).send().await?;
        assert_eq!(missing.status().as_u16(), 404);
        Ok(())
    }

    #[tokio::test]
    async fn test_page_changes_are_served_without_restart() -> Result<()> {
        let site = TestSite::new()?;
        let base = spawn(site.site.clone()).await;

        std::fs::write(site.site.page_path(), "<p>updated</p>")?;
        let body = reqwest::get(format!("{base}/")).await?.text().await?;
        assert_eq!(body, "<p>updated</p>");
        Ok(())
    }
}
