//! Page renderer - finds, adds and removes addon cards in the marketplace page.
//!
//! The page is parsed into a `kuchikiki` DOM and serialized back in full, so
//! formatting of unrelated markup may shift on every save. A card looks like:
//!
//! ```html
//! <div class="card" data-addon-id="sky-theme">
//!   <h2 class="glow-text">Sky Theme</h2>
//!   <a href="#" class="redirect-link" data-redirect="https://example.com/sky">
//!     <img src="sky.png" alt="Sky Theme">
//!   </a>
//! </div>
//! ```
//!
//! The DOM is `!Send`, so it never outlives one synchronous call: the
//! workflow hands markup in and gets markup back.

use crate::errors::{Error, Result};
use kuchikiki::traits::TendrilSink;
use kuchikiki::{ElementData, NodeDataRef, NodeRef};
use once_cell::sync::Lazy;
use regex::Regex;
use std::path::Path;

pub const CARD_SELECTOR: &str = ".card";
pub const LABEL_SELECTOR: &str = ".glow-text";
pub const CONTAINER_SELECTOR: &str = ".grid";
pub const LINK_SELECTOR: &str = ".redirect-link";
/// Attribute holding the addon's stable key on its card.
pub const ADDON_ID_ATTR: &str = "data-addon-id";

const CARD_TEMPLATE: &str = r##"<div class="card">
          <h2 class="glow-text"></h2>
          <a href="#" class="redirect-link">
            <img>
          </a>
        </div>"##;

#[allow(clippy::expect_used)] // Literal patterns, checked by the tests below
static BLANK_LINES: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"\n\s*\n").expect("blank line pattern is valid"));

#[allow(clippy::expect_used)]
static CONTAINER_OPEN: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r#"(<div class="grid"[^>]*>)\s*"#).expect("container pattern is valid")
});

/// Data needed to render a new card.
#[derive(Debug, Clone, Copy)]
pub struct CardSpec<'a> {
    pub title: &'a str,
    pub slug: &'a str,
    pub redirect: &'a str,
    pub image: &'a str,
}

/// Which cards belong to one addon.
///
/// A card carrying a key owned by the addon's own catalog records matches on
/// it. Every other card (no key, or a key no record owns) matches only on the
/// exact trimmed text of its label, and a card keyed to some other record
/// never matches.
#[derive(Debug, Clone, Copy)]
pub struct CardKey<'a> {
    pub title: &'a str,
    /// Keys of the addon's catalog records
    pub ids: &'a [String],
    /// Keys of every other catalog record
    pub foreign_ids: &'a [String],
}

impl<'a> CardKey<'a> {
    /// Matches cards by label alone.
    #[must_use]
    pub const fn titled(title: &'a str) -> Self {
        Self {
            title,
            ids: &[],
            foreign_ids: &[],
        }
    }

    fn matches(&self, card: &NodeDataRef<ElementData>) -> bool {
        if let Some(id) = card_id(card) {
            if self.ids.contains(&id) {
                return true;
            }
            if self.foreign_ids.contains(&id) {
                return false;
            }
        }
        card_label(card).is_some_and(|label| label == self.title)
    }
}

/// What a removed card referenced.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RemovedCard {
    pub title: String,
    pub image: Option<String>,
}

/// A parsed marketplace page.
pub struct PageDocument {
    document: NodeRef,
}

impl PageDocument {
    #[must_use]
    pub fn parse(html: &str) -> Self {
        Self {
            document: kuchikiki::parse_html().one(html),
        }
    }

    fn cards(&self) -> Result<Vec<NodeDataRef<ElementData>>> {
        Ok(self
            .document
            .select(CARD_SELECTOR)
            .map_err(|()| selector_error(CARD_SELECTOR))?
            .collect())
    }

    /// Cards belonging to the addon described by `key`.
    pub fn find_cards(&self, key: &CardKey<'_>) -> Result<Vec<NodeDataRef<ElementData>>> {
        Ok(self
            .cards()?
            .into_iter()
            .filter(|card| key.matches(card))
            .collect())
    }

    pub fn contains(&self, key: &CardKey<'_>) -> Result<bool> {
        Ok(!self.find_cards(key)?.is_empty())
    }

    /// Keys carried by the cards, in document order.
    pub fn card_ids(&self) -> Result<Vec<String>> {
        Ok(self.cards()?.iter().filter_map(card_id).collect())
    }

    /// Labels of all cards, in document order.
    pub fn card_titles(&self) -> Result<Vec<String>> {
        Ok(self.cards()?.iter().filter_map(card_label).collect())
    }

    /// Appends a card to the container. Uniqueness is the caller's business.
    pub fn add_card(&self, spec: &CardSpec<'_>) -> Result<()> {
        let container = self
            .document
            .select_first(CONTAINER_SELECTOR)
            .map_err(|()| Error::Page {
                message: format!("page has no `{CONTAINER_SELECTOR}` container"),
            })?;

        let template = kuchikiki::parse_html().one(CARD_TEMPLATE);
        let card = select_in(&template, CARD_SELECTOR)?;
        card.attributes
            .borrow_mut()
            .insert(ADDON_ID_ATTR, spec.slug.to_string());

        select_in(card.as_node(), LABEL_SELECTOR)?
            .as_node()
            .append(NodeRef::new_text(spec.title));

        select_in(card.as_node(), LINK_SELECTOR)?
            .attributes
            .borrow_mut()
            .insert("data-redirect", spec.redirect.to_string());

        let img = select_in(card.as_node(), "img")?;
        {
            let mut attributes = img.attributes.borrow_mut();
            attributes.insert("src", spec.image.to_string());
            attributes.insert("alt", spec.title.to_string());
        }

        let node = card.as_node().clone();
        node.detach();
        container.as_node().append(NodeRef::new_text("\n        "));
        container.as_node().append(node);
        container.as_node().append(NodeRef::new_text("\n"));
        Ok(())
    }

    /// Deletes every card of the addon and reports what they referenced.
    pub fn remove_cards(&self, key: &CardKey<'_>) -> Result<Vec<RemovedCard>> {
        let matched = self.find_cards(key)?;
        let removed = matched
            .iter()
            .map(|card| RemovedCard {
                title: card_label(card).unwrap_or_default(),
                image: card_image(card),
            })
            .collect();
        for card in matched {
            card.as_node().detach();
        }
        Ok(removed)
    }

    /// Renders the page back to markup with whitespace normalized.
    #[must_use]
    pub fn serialize(&self) -> String {
        normalize_whitespace(&self.document.to_string())
    }
}

/// Collapses blank-line runs and puts exactly one newline after the
/// container's opening tag.
#[must_use]
pub fn normalize_whitespace(html: &str) -> String {
    let collapsed = BLANK_LINES.replace_all(html, "\n");
    CONTAINER_OPEN
        .replacen(&collapsed, 1, "${1}\n")
        .into_owned()
}

/// Whether the page markup already shows the addon.
pub fn contains_addon(html: &str, key: &CardKey<'_>) -> Result<bool> {
    PageDocument::parse(html).contains(key)
}

/// Keys carried by the cards of the page markup.
pub fn card_ids(html: &str) -> Result<Vec<String>> {
    PageDocument::parse(html).card_ids()
}

/// Page markup with a new card appended.
pub fn with_card_added(html: &str, spec: &CardSpec<'_>) -> Result<String> {
    let page = PageDocument::parse(html);
    page.add_card(spec)?;
    Ok(page.serialize())
}

/// Page markup without the addon's cards, plus what the cards referenced.
pub fn with_cards_removed(html: &str, key: &CardKey<'_>) -> Result<(String, Vec<RemovedCard>)> {
    let page = PageDocument::parse(html);
    let removed = page.remove_cards(key)?;
    Ok((page.serialize(), removed))
}

pub async fn read_page(path: &Path) -> Result<String> {
    Ok(tokio::fs::read_to_string(path).await?)
}

pub async fn write_page(path: &Path, html: &str) -> Result<()> {
    Ok(tokio::fs::write(path, html).await?)
}

fn card_id(card: &NodeDataRef<ElementData>) -> Option<String> {
    card.attributes
        .borrow()
        .get(ADDON_ID_ATTR)
        .map(ToString::to_string)
}

fn card_label(card: &NodeDataRef<ElementData>) -> Option<String> {
    card.as_node()
        .select_first(LABEL_SELECTOR)
        .ok()
        .map(|label| label.as_node().text_contents().trim().to_string())
}

fn card_image(card: &NodeDataRef<ElementData>) -> Option<String> {
    let img = card.as_node().select_first("img").ok()?;
    let attributes = img.attributes.borrow();
    attributes.get("src").map(ToString::to_string)
}

fn select_in(node: &NodeRef, selector: &str) -> Result<NodeDataRef<ElementData>> {
    node.select_first(selector).map_err(|()| Error::Page {
        message: format!("card template has no `{selector}` element"),
    })
}

fn selector_error(selector: &str) -> Error {
    Error::Page {
        message: format!("invalid selector `{selector}`"),
    }
}

#[cfg(test)]
mod tests {
    #![allow(clippy::unwrap_used)]
    use super::*;
    use crate::test_utils::SAMPLE_PAGE;

    const SKY: CardSpec<'static> = CardSpec {
        title: "Sky Theme",
        slug: "sky-theme",
        redirect: "https://example.com/sky",
        image: "sky.png",
    };

    #[test]
    fn test_finds_legacy_cards_by_trimmed_label() -> Result<()> {
        let page = PageDocument::parse(SAMPLE_PAGE);
        assert_eq!(page.card_titles()?, ["Forest Pack"]);
        assert!(page.contains(&CardKey::titled("Forest Pack"))?);
        // Legacy cards match the label exactly, case included.
        assert!(!page.contains(&CardKey::titled("forest pack"))?);
        assert!(!page.contains(&CardKey::titled("Sky Theme"))?);
        Ok(())
    }

    #[test]
    fn test_add_card_renders_all_fields() -> Result<()> {
        let html = with_card_added(SAMPLE_PAGE, &SKY)?;
        let page = PageDocument::parse(&html);

        assert_eq!(page.card_titles()?, ["Forest Pack", "Sky Theme"]);
        let cards = page.find_cards(&CardKey::titled("Sky Theme"))?;
        assert_eq!(cards.len(), 1);
        assert_eq!(card_image(&cards[0]).as_deref(), Some("sky.png"));
        assert!(html.contains(r#"data-addon-id="sky-theme""#));
        assert!(html.contains(r#"data-redirect="https://example.com/sky""#));
        assert!(html.contains(r#"alt="Sky Theme""#));
        Ok(())
    }

    #[test]
    fn test_keyed_cards_match_only_their_own_records() -> Result<()> {
        let cpp = CardSpec {
            title: "C++",
            slug: "c",
            redirect: "https://example.com/cpp",
            image: "cpp.png",
        };
        let html = with_card_added(SAMPLE_PAGE, &cpp)?;
        let page = PageDocument::parse(&html);
        assert_eq!(page.card_ids()?, ["c"]);

        let owned = ["c".to_string()];
        let by_key = CardKey {
            title: "C++",
            ids: &owned,
            foreign_ids: &[],
        };
        assert!(page.contains(&by_key)?);

        // "C" shares the base key but owns no record with it.
        let other = CardKey {
            title: "C",
            ids: &[],
            foreign_ids: &owned,
        };
        assert!(!page.contains(&other)?);
        assert!(!page.contains(&CardKey::titled("C"))?);
        Ok(())
    }

    #[test]
    fn test_orphan_keyed_card_matches_by_label() -> Result<()> {
        let html = with_card_added(SAMPLE_PAGE, &SKY)?;
        let page = PageDocument::parse(&html);
        assert!(page.contains(&CardKey::titled("Sky Theme"))?);
        assert!(!page.contains(&CardKey::titled("sky theme"))?);
        Ok(())
    }

    #[test]
    fn test_titles_are_escaped_not_spliced() -> Result<()> {
        let spec = CardSpec {
            title: "<b>Bold</b> & Co",
            slug: "b-bold-b-co",
            redirect: "https://example.com/?a=1&b=\"2\"",
            image: "bold.png",
        };
        let html = with_card_added(SAMPLE_PAGE, &spec)?;
        assert!(!html.contains("<b>Bold</b>"));
        let page = PageDocument::parse(&html);
        assert!(page.card_titles()?.contains(&"<b>Bold</b> & Co".to_string()));
        Ok(())
    }

    #[test]
    fn test_remove_cards_reports_images() -> Result<()> {
        let (html, removed) = with_cards_removed(SAMPLE_PAGE, &CardKey::titled("Forest Pack"))?;
        assert_eq!(
            removed,
            [RemovedCard {
                title: "Forest Pack".to_string(),
                image: Some("forest.png".to_string()),
            }]
        );
        assert!(PageDocument::parse(&html).card_titles()?.is_empty());

        let (_, removed) = with_cards_removed(SAMPLE_PAGE, &CardKey::titled("Missing"))?;
        assert!(removed.is_empty());
        Ok(())
    }

    #[test]
    fn test_remove_deletes_every_duplicate() -> Result<()> {
        let legacy = r#"<div class="card"><h2 class="glow-text">Sky Theme</h2><img src="sky.png"></div>"#;
        let html = SAMPLE_PAGE.replace(
            r#"<div class="grid">"#,
            &format!(r#"<div class="grid">{legacy}{legacy}"#),
        );
        let (html, removed) = with_cards_removed(&html, &CardKey::titled("Sky Theme"))?;
        assert_eq!(removed.len(), 2);
        assert_eq!(PageDocument::parse(&html).card_titles()?, ["Forest Pack"]);
        Ok(())
    }

    #[test]
    fn test_add_without_container_fails() {
        let page = PageDocument::parse("<html><body><p>nothing here</p></body></html>");
        assert!(matches!(page.add_card(&SKY), Err(Error::Page { .. })));
    }

    #[test]
    fn test_normalize_whitespace() {
        let html = "<body>\n\n   \n<div class=\"grid\">   \n\n  <div class=\"card\"></div>\n\n</div></body>";
        assert_eq!(
            normalize_whitespace(html),
            "<body>\n<div class=\"grid\">\n<div class=\"card\"></div>\n</div></body>"
        );
        let empty = "<div class=\"grid\"></div>";
        assert_eq!(normalize_whitespace(empty), "<div class=\"grid\">\n</div>");
    }

    #[test]
    fn test_serialize_is_idempotent_after_first_pass() {
        let once = PageDocument::parse(SAMPLE_PAGE).serialize();
        let twice = PageDocument::parse(&once).serialize();
        assert_eq!(once, twice);

        let added = with_card_added(SAMPLE_PAGE, &SKY).unwrap();
        assert_eq!(PageDocument::parse(&added).serialize(), added);
    }
}
