//! Autocomplete handlers for Discord slash command parameters.

use crate::{bot::BotData, core::catalog::CatalogDocument, errors::Error};

/// Discord shows at most this many suggestions.
const MAX_SUGGESTIONS: usize = 25;

/// Suggests catalog titles for `/remove`.
///
/// Titles are already public on the marketplace page, so suggestions are
/// offered to every caller; the command itself is still operator-only.
pub async fn autocomplete_addon_title(
    ctx: poise::Context<'_, BotData, Error>,
    partial: &str,
) -> Vec<String> {
    let catalog = ctx.data().marketplace.catalog().load().await;
    matching_titles(&catalog, partial)
}

/// Titles containing `partial` (case-insensitive), sorted, capped at 25.
#[must_use]
pub fn matching_titles(catalog: &CatalogDocument, partial: &str) -> Vec<String> {
    let partial_lower = partial.to_lowercase();
    let mut matching: Vec<String> = catalog
        .addons
        .iter()
        .filter(|addon| addon.title.to_lowercase().contains(&partial_lower))
        .map(|addon| addon.title.clone())
        .take(MAX_SUGGESTIONS)
        .collect();
    matching.sort();
    matching
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::catalog::AddonRecord;

    fn catalog(titles: &[&str]) -> CatalogDocument {
        let mut doc = CatalogDocument::default();
        for title in titles {
            doc.push(AddonRecord::new(
                (*title).to_string(),
                "https://example.com".to_string(),
                "x.png".to_string(),
            ));
        }
        doc
    }

    #[test]
    fn test_matching_is_case_insensitive_and_sorted() {
        let doc = catalog(&["Sky Theme", "Forest Pack", "Skyline"]);
        assert_eq!(matching_titles(&doc, "sky"), ["Sky Theme", "Skyline"]);
        assert_eq!(
            matching_titles(&doc, ""),
            ["Forest Pack", "Sky Theme", "Skyline"]
        );
        assert!(matching_titles(&doc, "ocean").is_empty());
    }

    #[test]
    fn test_suggestions_are_capped() {
        let titles: Vec<String> = (0..40).map(|i| format!("Theme {i:02}")).collect();
        let refs: Vec<&str> = titles.iter().map(String::as_str).collect();
        assert_eq!(matching_titles(&catalog(&refs), "theme").len(), 25);
    }
}
