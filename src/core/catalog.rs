//! Catalog store - the JSON sidecar listing every addon on the page.
//!
//! The document is small, so every operation loads it fully, mutates it in
//! memory and rewrites the whole file. A missing or unreadable catalog is
//! treated as empty.

use crate::errors::Result;
use chrono::{DateTime, NaiveDate, NaiveDateTime, Utc};
use serde::{Deserialize, Deserializer, Serialize};
use serde_json::Value;
use std::path::{Path, PathBuf};
use tracing::{debug, warn};

/// One addon listed on the marketplace.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AddonRecord {
    /// Exact, case-sensitive key of the addon
    pub title: String,
    pub redirect: String,
    /// Image file name, relative to the asset directory
    pub image: String,
    /// When the addon was added; `None` when the stored value is absent or unreadable
    #[serde(
        default,
        deserialize_with = "lenient_timestamp",
        skip_serializing_if = "Option::is_none"
    )]
    pub added: Option<DateTime<Utc>>,
    /// Card key, unique within the catalog and stored on the page card
    #[serde(default)]
    pub slug: String,
}

impl AddonRecord {
    /// Creates a record stamped with the current time.
    ///
    /// The slug is the plain [`slugify`] form of the title; use
    /// [`CatalogDocument::unique_slug`] and [`AddonRecord::with_slug`] when the
    /// record joins an existing catalog.
    #[must_use]
    pub fn new(title: String, redirect: String, image: String) -> Self {
        let slug = slugify(&title);
        Self {
            title,
            redirect,
            image,
            added: Some(Utc::now()),
            slug,
        }
    }

    #[must_use]
    pub fn with_slug(mut self, slug: String) -> Self {
        self.slug = slug;
        self
    }
}

/// Accepts RFC 3339, a naive `YYYY-MM-DDTHH:MM:SS`, a bare date or epoch
/// milliseconds. Anything else reads as `None` instead of failing the record.
fn lenient_timestamp<'de, D>(deserializer: D) -> std::result::Result<Option<DateTime<Utc>>, D::Error>
where
    D: Deserializer<'de>,
{
    let raw = Option::<Value>::deserialize(deserializer)?;
    Ok(raw.as_ref().and_then(parse_timestamp))
}

fn parse_timestamp(value: &Value) -> Option<DateTime<Utc>> {
    let parsed = match value {
        Value::String(text) => DateTime::parse_from_rfc3339(text)
            .map(|t| t.with_timezone(&Utc))
            .ok()
            .or_else(|| {
                NaiveDateTime::parse_from_str(text, "%Y-%m-%dT%H:%M:%S%.f")
                    .ok()
                    .map(|t| t.and_utc())
            })
            .or_else(|| {
                NaiveDate::parse_from_str(text, "%Y-%m-%d")
                    .ok()
                    .and_then(|d| d.and_hms_opt(0, 0, 0))
                    .map(|t| t.and_utc())
            }),
        Value::Number(millis) => millis.as_i64().and_then(DateTime::from_timestamp_millis),
        _ => None,
    };
    if parsed.is_none() && !value.is_null() {
        warn!("Unreadable `added` value {value}, keeping the record without it");
    }
    parsed
}

/// The whole catalog file.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CatalogDocument {
    pub addons: Vec<AddonRecord>,
    /// Entries that are not valid records; written back untouched
    unreadable: Vec<Value>,
}

#[derive(Deserialize)]
struct CatalogFile {
    #[serde(default)]
    addons: Vec<Value>,
}

#[derive(Serialize)]
struct CatalogFileRef<'a> {
    addons: Vec<CatalogEntryRef<'a>>,
}

#[derive(Serialize)]
#[serde(untagged)]
enum CatalogEntryRef<'a> {
    Record(&'a AddonRecord),
    Raw(&'a Value),
}

impl CatalogDocument {
    /// Parses catalog JSON record by record.
    ///
    /// Only a file that is not JSON at all is an error. Entries that do not
    /// read as records are logged and kept aside so a save does not drop them.
    pub fn from_json(contents: &str) -> serde_json::Result<Self> {
        let file: CatalogFile = serde_json::from_str(contents)?;
        let mut document = Self::default();
        for entry in file.addons {
            match serde_json::from_value::<AddonRecord>(entry.clone()) {
                Ok(record) => document.addons.push(record),
                Err(e) => {
                    warn!("Unreadable catalog entry kept as is ({e}): {entry}");
                    document.unreadable.push(entry);
                }
            }
        }
        document.fill_missing_slugs();
        Ok(document)
    }

    /// Pretty-printed catalog JSON: records first, then unreadable entries.
    pub fn to_json_pretty(&self) -> serde_json::Result<String> {
        let addons = self
            .addons
            .iter()
            .map(CatalogEntryRef::Record)
            .chain(self.unreadable.iter().map(CatalogEntryRef::Raw))
            .collect();
        serde_json::to_string_pretty(&CatalogFileRef { addons })
    }

    /// The record whose title is exactly `title`.
    #[must_use]
    pub fn find_conflict(&self, title: &str) -> Option<&AddonRecord> {
        self.addons.iter().find(|addon| addon.title == title)
    }

    pub fn push(&mut self, record: AddonRecord) {
        self.addons.push(record);
    }

    /// Removes and returns every record titled exactly `title`.
    pub fn remove_matching(&mut self, title: &str) -> Vec<AddonRecord> {
        let (removed, kept): (Vec<_>, Vec<_>) = std::mem::take(&mut self.addons)
            .into_iter()
            .partition(|addon| addon.title == title);
        self.addons = kept;
        removed
    }

    /// Card keys of all records.
    #[must_use]
    pub fn slugs(&self) -> Vec<String> {
        self.addons.iter().map(|addon| addon.slug.clone()).collect()
    }

    /// A card key for `title` not used by any record nor listed in `taken`.
    ///
    /// Titles that slugify alike ("C", "C++") get `-2`, `-3`, ... suffixes.
    #[must_use]
    pub fn unique_slug(&self, title: &str, taken: &[String]) -> String {
        let base = slugify(title);
        let in_use = |candidate: &str| {
            self.addons.iter().any(|addon| addon.slug == candidate)
                || taken.iter().any(|slug| slug == candidate)
        };
        if !in_use(&base) {
            return base;
        }
        (2_u32..)
            .map(|n| format!("{base}-{n}"))
            .find(|candidate| !in_use(candidate))
            .unwrap_or_else(|| base.clone())
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.addons.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.addons.is_empty()
    }

    fn fill_missing_slugs(&mut self) {
        for index in 0..self.addons.len() {
            if self.addons[index].slug.is_empty() {
                let slug = self.unique_slug(&self.addons[index].title, &[]);
                self.addons[index].slug = slug;
            }
        }
    }
}

/// Derives the base card key of an addon from its title.
///
/// Alphanumeric runs are lower-cased and joined with `-`. A title without any
/// alphanumeric character falls back to the hex encoding of its bytes. Distinct
/// titles can share a base key, so it never identifies an addon on its own.
#[must_use]
pub fn slugify(title: &str) -> String {
    let slug = title
        .split(|c: char| !c.is_alphanumeric())
        .filter(|word| !word.is_empty())
        .map(str::to_lowercase)
        .collect::<Vec<_>>()
        .join("-");
    if !slug.is_empty() {
        return slug;
    }
    let hex: String = title.bytes().map(|b| format!("{b:02x}")).collect();
    format!("addon-{hex}")
}

/// Reads and rewrites the catalog file.
#[derive(Debug, Clone)]
pub struct CatalogStore {
    path: PathBuf,
}

impl CatalogStore {
    #[must_use]
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    #[must_use]
    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Loads the catalog. Never fails: absence or a file that is not JSON
    /// yields an empty document.
    pub async fn load(&self) -> CatalogDocument {
        let contents = match tokio::fs::read_to_string(&self.path).await {
            Ok(contents) => contents,
            Err(e) => {
                debug!("Catalog {:?} not readable ({e}), starting empty", self.path);
                return CatalogDocument::default();
            }
        };
        match CatalogDocument::from_json(&contents) {
            Ok(document) => document,
            Err(e) => {
                warn!("Catalog {:?} is malformed ({e}), starting empty", self.path);
                CatalogDocument::default()
            }
        }
    }

    /// Rewrites the catalog as pretty-printed JSON.
    ///
    /// The document goes to a sibling temp file first and is renamed over the
    /// catalog, so readers never observe a half-written file.
    pub async fn save(&self, document: &CatalogDocument) -> Result<()> {
        let json = document.to_json_pretty()?;
        if let Some(parent) = self.path.parent().filter(|p| !p.as_os_str().is_empty()) {
            tokio::fs::create_dir_all(parent).await?;
        }
        let tmp = self.path.with_extension("json.tmp");
        tokio::fs::write(&tmp, json).await?;
        tokio::fs::rename(&tmp, &self.path).await?;
        debug!(
            "Saved catalog {:?} with {} addon(s)",
            self.path,
            document.len()
        );
        Ok(())
    }
}
