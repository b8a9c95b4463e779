//! Stylesheet Aggregator
//!
//! Resolves every discovered reference, runs the image inliner and the asset
//! path rewriter over it, and joins the results in discovery order. References
//! are processed concurrently; the first resolution failure aborts the whole
//! aggregate and no partial CSS is returned.

use futures::future::try_join_all;

use crate::config::CriticalConfig;
use crate::discover::StylesheetReference;
use crate::error::CriticalResult;
use crate::inline_css::{inline_images, search_paths};
use crate::link_rewriter::rewrite_asset_paths;
use crate::resource::{Resource, ResourceLocator};

/// Build the aggregate CSS of `document` from `references`
pub async fn aggregate(
    document: &Resource,
    references: &[StylesheetReference],
    config: &CriticalConfig,
    locator: &ResourceLocator,
) -> CriticalResult<String> {
    let stylesheets = references
        .iter()
        .map(|reference| process_stylesheet(reference, document, config, locator));
    let texts = try_join_all(stylesheets).await?;
    log::debug!("Aggregated {} stylesheet(s) for {}", texts.len(), document.location);
    Ok(texts.join("\n"))
}

async fn process_stylesheet(
    reference: &StylesheetReference,
    document: &Resource,
    config: &CriticalConfig,
    locator: &ResourceLocator,
) -> CriticalResult<String> {
    let mut stylesheet = match reference {
        StylesheetReference::Explicit(entry) => locator.resolve_override(entry).await?,
        StylesheetReference::Document(href) => locator.resolve_stylesheet(href, document).await?,
    };

    // Inline first so only references that stayed URLs get re-anchored
    if config.inline_images() {
        let paths = search_paths(&stylesheet, document, locator.root(), config.asset_paths());
        stylesheet = inline_images(stylesheet, &paths, config.max_image_file_size(), locator).await;
    }
    let stylesheet = rewrite_asset_paths(stylesheet, document, locator.root());
    Ok(stylesheet.contents)
}
