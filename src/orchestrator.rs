//! Generation pipeline
//!
//! One invocation fans out into an independent sub-pipeline per viewport
//! dimension. Each sub-pipeline resolves the document, discovers and
//! aggregates its stylesheets, makes the document reachable and runs the
//! extractor. All of them must finish before the fragments are merged,
//! filtered and minified.

use futures::future::try_join_all;

use crate::aggregator::aggregate;
use crate::config::{CriticalConfig, Dimension};
use crate::css::minify;
use crate::discover::discover;
use crate::error::{CriticalError, CriticalResult};
use crate::extractor::{
    ChromeExtractor, CriticalExtractor, ExtractionRequest, LocationProvider, with_timeout,
};
use crate::merge::{filter_css, merge};
use crate::resource::ResourceLocator;

/// Generate critical CSS for `config` using `extractor`
///
/// # Errors
///
/// Returns the first fatal failure of any dimension:
/// - `InvalidInput` / `Config` before any work starts
/// - `NoStylesheetsFound` when discovery comes up empty
/// - `Resolution` when the document or a stylesheet cannot be loaded
/// - `Extraction` when the extractor fails or times out
///
/// A page that unloads during extraction yields an empty fragment for that
/// dimension instead of an error.
pub async fn generate<E: CriticalExtractor>(
    config: &CriticalConfig,
    extractor: &E,
) -> CriticalResult<String> {
    config.validate()?;
    if config.source().is_none() {
        return Err(CriticalError::InvalidInput(
            "set either `src` (path or URL) or `html` (literal content)".to_string(),
        ));
    }

    let locator = ResourceLocator::new(config)?;
    let dimensions = config.dimensions();
    log::info!(
        "Generating critical CSS for {} dimension(s): {}",
        dimensions.len(),
        dimensions
            .iter()
            .map(ToString::to_string)
            .collect::<Vec<_>>()
            .join(", ")
    );

    let fragments = try_join_all(
        dimensions
            .into_iter()
            .map(|dimension| generate_dimension(config, extractor, &locator, dimension)),
    )
    .await?;

    let merged = merge(&fragments);
    let filtered = filter_css(&merged, config.ignore(), config.ignore_options());
    Ok(minify(&filtered))
}

/// Generate critical CSS with a headless Chrome that lives for this call only
///
/// # Errors
///
/// See [`generate`].
pub async fn generate_with_chrome(config: &CriticalConfig) -> CriticalResult<String> {
    let extractor = ChromeExtractor::new();
    let result = generate(config, &extractor).await;
    if let Err(e) = extractor.shutdown().await {
        log::warn!("Failed to shut down extraction browser: {e:#}");
    }
    result
}

async fn generate_dimension<E: CriticalExtractor>(
    config: &CriticalConfig,
    extractor: &E,
    locator: &ResourceLocator,
    dimension: Dimension,
) -> CriticalResult<String> {
    let source = config
        .source()
        .ok_or_else(|| CriticalError::InvalidInput("no source configured".to_string()))?;
    let document = locator.resolve(source).await?;

    let references = discover(&document.contents, config.css());
    if references.is_empty() {
        return Err(CriticalError::NoStylesheetsFound);
    }
    let css = aggregate(&document, &references, config, locator).await?;

    // Held until extraction ends so a local server outlives the request
    let location = LocationProvider::new(locator.root().map(Into::into))
        .reachable_url(&document)
        .await?;
    log::debug!("Extracting {dimension} from {}", location.url());

    let request = ExtractionRequest {
        url: location.url().to_string(),
        css,
        dimension,
        user_agent: config.user_agent().map(str::to_string),
        authorization: config.authorization(),
        options: config.penthouse().clone(),
    };
    let result = with_timeout(
        extractor.extract(request),
        config.extraction_timeout(),
        "Critical extraction",
    )
    .await;
    drop(location);

    match result {
        Ok(fragment) => Ok(fragment),
        Err(e) if e.is_page_unloaded() => {
            log::warn!("Page unloaded while extracting {dimension}; using empty result: {e}");
            Ok(String::new())
        }
        Err(e) => Err(e),
    }
}
