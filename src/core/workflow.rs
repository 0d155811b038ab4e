//! Publish workflow - applies an add or remove to the catalog, the page and
//! the asset directory, then commits and pushes the result.
//!
//! Validation and duplicate/not-found checks happen before anything is
//! written, as does the image download. From the first write on, every step
//! goes through a [`Saga`] so a failure is logged with the steps that were
//! already applied.

use crate::config::SiteConfig;
use crate::core::assets::{AssetStore, validate_asset_name};
use crate::core::catalog::{AddonRecord, CatalogStore};
use crate::core::page::{self, CardKey, CardSpec};
use crate::core::publish::{ChangeSet, PublishReport, Publisher};
use crate::core::saga::{Saga, Step};
use crate::errors::{Error, Result};
use std::sync::Arc;
use tracing::{info, instrument, warn};

/// Parameters of an add request.
#[derive(Debug, Clone)]
pub struct NewAddon {
    pub title: String,
    pub redirect: String,
    /// Where to download the image from
    pub image_url: String,
    /// File name to store the image under
    pub image_name: String,
}

/// Result of a successful add.
#[derive(Debug, Clone)]
pub struct AddedAddon {
    pub record: AddonRecord,
    pub image_bytes: u64,
    pub publish: PublishReport,
}

/// Result of a successful remove.
#[derive(Debug, Clone)]
pub struct RemovedAddon {
    pub title: String,
    /// Catalog records that were dropped
    pub records: Vec<AddonRecord>,
    pub cards_removed: usize,
    /// Image files that existed and were deleted
    pub deleted_images: Vec<String>,
    pub publish: PublishReport,
}

/// Owns the site stores and the publisher.
pub struct Marketplace {
    site: SiteConfig,
    catalog: CatalogStore,
    assets: AssetStore,
    publisher: Arc<dyn Publisher>,
}

impl std::fmt::Debug for Marketplace {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Marketplace")
            .field("site", &self.site)
            .finish_non_exhaustive()
    }
}

impl Marketplace {
    #[must_use]
    pub fn new(site: SiteConfig, http: reqwest::Client, publisher: Arc<dyn Publisher>) -> Self {
        let catalog = CatalogStore::new(site.catalog_path());
        let assets = AssetStore::new(site.assets_dir(), http);
        Self {
            site,
            catalog,
            assets,
            publisher,
        }
    }

    #[must_use]
    pub const fn site(&self) -> &SiteConfig {
        &self.site
    }

    #[must_use]
    pub const fn catalog(&self) -> &CatalogStore {
        &self.catalog
    }

    /// Adds an addon: image, catalog record, page card, commit.
    #[instrument(skip(self, request), fields(title = %request.title))]
    pub async fn add_addon(&self, request: NewAddon) -> Result<AddedAddon> {
        let NewAddon {
            title,
            redirect,
            image_url,
            image_name,
        } = request;
        let title = title.trim().to_string();
        let redirect = redirect.trim().to_string();
        if title.is_empty() || redirect.is_empty() || image_url.trim().is_empty() || image_name.is_empty()
        {
            return Err(Error::MissingFields);
        }
        validate_asset_name(&image_name)?;

        info!("Reading existing page...");
        let page_path = self.site.page_path();
        let html = page::read_page(&page_path).await?;
        let mut catalog = self.catalog.load().await;
        if catalog.find_conflict(&title).is_some()
            || page::contains_addon(&html, &CardKey::titled(&title))?
        {
            return Err(Error::AddonExists { title });
        }
        let slug = catalog.unique_slug(&title, &page::card_ids(&html)?);

        let bytes = self.assets.fetch(&image_url).await?;

        let mut saga = Saga::new("add", title.clone());
        let image_bytes = saga
            .step(Step::WriteAsset, self.assets.write(&image_name, &bytes))
            .await?;

        let record = AddonRecord::new(title.clone(), redirect.clone(), image_name.clone())
            .with_slug(slug.clone());
        catalog.push(record.clone());
        saga.step(Step::SaveCatalog, self.catalog.save(&catalog))
            .await?;

        let updated = page::with_card_added(
            &html,
            &CardSpec {
                title: &title,
                slug: &slug,
                redirect: &redirect,
                image: &image_name,
            },
        )?;
        saga.step(Step::WritePage, page::write_page(&page_path, &updated))
            .await?;

        let change = ChangeSet {
            message: format!("Add addon: {title}"),
            paths: vec![
                self.site.page.clone(),
                self.site.asset_repo_path(&image_name),
                self.site.catalog.clone(),
            ],
        };
        let publish = saga
            .step(Step::Publish, self.publisher.publish(&change))
            .await?;
        info!("Addon committed to version control.");

        Ok(AddedAddon {
            record,
            image_bytes,
            publish,
        })
    }

    /// Removes an addon: catalog records, page cards, image files, commit.
    ///
    /// The title is matched exactly. Keyed cards are found through the keys of
    /// the removed records. Image files to delete come from those records only;
    /// images named by cards alone are logged and left in place.
    #[instrument(skip(self))]
    pub async fn remove_addon(&self, title: &str) -> Result<RemovedAddon> {
        let title = title.trim().to_string();
        if title.is_empty() {
            return Err(Error::MissingFields);
        }

        info!("Reading existing page...");
        let page_path = self.site.page_path();
        let html = page::read_page(&page_path).await?;
        let mut catalog = self.catalog.load().await;
        let records = catalog.remove_matching(&title);
        let ids: Vec<String> = records.iter().map(|r| r.slug.clone()).collect();
        let foreign_ids = catalog.slugs();
        let key = CardKey {
            title: &title,
            ids: &ids,
            foreign_ids: &foreign_ids,
        };
        let (updated, removed_cards) = page::with_cards_removed(&html, &key)?;
        if removed_cards.is_empty() && records.is_empty() {
            return Err(Error::AddonNotFound { title });
        }

        let images: Vec<String> = records.iter().map(|r| r.image.clone()).collect();
        for card in &removed_cards {
            if let Some(image) = card.image.as_ref().filter(|image| !images.contains(image)) {
                warn!(
                    card = %card.title,
                    image = %image,
                    "Card image has no catalog record, leaving it in place"
                );
            }
        }

        let mut saga = Saga::new("remove", title.clone());
        saga.step(Step::SaveCatalog, self.catalog.save(&catalog))
            .await?;
        saga.step(Step::WritePage, page::write_page(&page_path, &updated))
            .await?;

        let deleted_images = saga
            .step(Step::DeleteAssets, self.delete_images(&images))
            .await?;

        let mut paths = vec![self.site.page.clone(), self.site.catalog.clone()];
        paths.extend(images.iter().map(|image| self.site.asset_repo_path(image)));
        let change = ChangeSet {
            message: format!("Remove addon: {title}"),
            paths,
        };
        let publish = saga
            .step(Step::Publish, self.publisher.publish(&change))
            .await?;
        info!("Addon {title:?} removed and committed.");

        Ok(RemovedAddon {
            title,
            records,
            cards_removed: removed_cards.len(),
            deleted_images,
            publish,
        })
    }

    async fn delete_images(&self, images: &[String]) -> Result<Vec<String>> {
        let mut deleted = Vec::new();
        for image in images {
            if self.assets.delete_if_exists(image).await? {
                deleted.push(image.clone());
            }
        }
        Ok(deleted)
    }
}
