//! Stylesheet Discoverer
//!
//! Finds the stylesheets a document depends on: `<link rel="stylesheet">` and
//! `<link rel="preload" as="style">`, minus print-only links and links with
//! no href. A caller-supplied list replaces discovery entirely.

use lazy_static::lazy_static;
use scraper::{Html, Selector};

use crate::utils::dedupe_preserving_order;

lazy_static! {
    // Hardcoded and valid; a parse failure here is a bug in this file.
    static ref LINK_SELECTOR: Selector =
        Selector::parse("link[rel]").expect("BUG: hardcoded selector 'link[rel]' is invalid");
}

/// Where a stylesheet reference came from, which decides how it resolves
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum StylesheetReference {
    /// Found in the document; resolves against the document's location
    Document(String),
    /// Supplied by the caller; resolves against the base directory
    Explicit(String),
}

impl StylesheetReference {
    #[must_use]
    pub fn as_str(&self) -> &str {
        match self {
            Self::Document(href) | Self::Explicit(href) => href,
        }
    }
}

impl std::fmt::Display for StylesheetReference {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A stylesheet-like `<link>` as written in the document
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StylesheetLink {
    pub href: String,
    pub media: Option<String>,
}

/// Every stylesheet and style-preload link in document order
#[must_use]
pub fn stylesheet_links(html: &str) -> Vec<StylesheetLink> {
    let document = Html::parse_document(html);
    document
        .select(&LINK_SELECTOR)
        .filter_map(|element| {
            let link = element.value();
            let rel = link.attr("rel").unwrap_or_default();
            let has_rel = |wanted: &str| rel.split_ascii_whitespace().any(|t| t.eq_ignore_ascii_case(wanted));
            let is_stylesheet = has_rel("stylesheet");
            let is_style_preload = has_rel("preload")
                && link.attr("as").is_some_and(|kind| kind.trim().eq_ignore_ascii_case("style"));
            if !(is_stylesheet || is_style_preload) {
                return None;
            }
            Some(StylesheetLink {
                href: link.attr("href").unwrap_or_default().trim().to_string(),
                media: link.attr("media").map(str::to_string),
            })
        })
        .collect()
}

/// Ordered, deduplicated stylesheet references for `html`
///
/// A non-empty `explicit` list is returned as given, in order and with any
/// duplicates, without looking at the document.
#[must_use]
pub fn discover(html: &str, explicit: &[String]) -> Vec<StylesheetReference> {
    if !explicit.is_empty() {
        return explicit
            .iter()
            .map(|entry| StylesheetReference::Explicit(entry.clone()))
            .collect();
    }

    let hrefs: Vec<String> = stylesheet_links(html)
        .into_iter()
        .filter(|link| !is_print_only(link.media.as_deref()))
        .filter(|link| !link.href.is_empty())
        .map(|link| link.href)
        .collect();

    let references: Vec<StylesheetReference> = dedupe_preserving_order(hrefs)
        .into_iter()
        .map(StylesheetReference::Document)
        .collect();
    log::debug!("Discovered {} stylesheet(s)", references.len());
    references
}

fn is_print_only(media: Option<&str>) -> bool {
    media.is_some_and(|media| media.trim().eq_ignore_ascii_case("print"))
}
