//! Critical-path extraction boundary
//!
//! The pipeline hands one [`ExtractionRequest`] per viewport to a
//! [`CriticalExtractor`]. [`ChromeExtractor`] is the browser-backed
//! implementation; tests and embedders can supply their own.
//!
//! Extractors need a URL they can navigate to. [`LocationProvider`] turns a
//! resolved document into one, serving local documents from a short-lived
//! [`LocalServer`].

pub mod browser;
pub mod js_scripts;
pub mod location;
pub mod server;
pub mod timeout;

use serde::{Deserialize, Serialize};
use std::future::Future;

use crate::config::Dimension;
use crate::error::CriticalResult;

pub use browser::ChromeExtractor;
pub use location::{LocationProvider, ReachableLocation};
pub use server::LocalServer;
pub use timeout::with_timeout;

/// Options forwarded to the extractor untouched by the pipeline
///
/// Keys the browser extractor does not know are kept in `extra` so a custom
/// extractor can read them.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct ExtractorOptions {
    /// Navigation timeout in milliseconds
    pub timeout_ms: Option<u64>,
    /// Extra wait after load before the page is inspected, in milliseconds
    pub render_wait_time: Option<u64>,
    /// Selectors kept even when nothing they match is above the fold
    pub force_include: Vec<String>,
    /// Keep `@media` blocks whose minimum width exceeds the viewport
    pub keep_larger_media_queries: bool,
    /// Property name patterns stripped from the result
    pub properties_to_remove: Vec<String>,
    #[serde(flatten)]
    pub extra: serde_json::Map<String, serde_json::Value>,
}

/// Everything an extractor needs for one viewport
#[derive(Debug, Clone)]
pub struct ExtractionRequest {
    /// Address the extractor can navigate to
    pub url: String,
    /// Aggregate CSS of the document
    pub css: String,
    pub dimension: Dimension,
    pub user_agent: Option<String>,
    /// Complete `Authorization` header value, e.g. `Basic dXNlcjpwYXNz`
    pub authorization: Option<String>,
    pub options: ExtractorOptions,
}

/// Computes the critical CSS of a page for one viewport
///
/// An error whose message starts with
/// [`PAGE_UNLOADED_DURING_EXECUTION`](crate::error::PAGE_UNLOADED_DURING_EXECUTION)
/// is treated by the pipeline as an empty result for that viewport.
pub trait CriticalExtractor: Send + Sync {
    fn extract(
        &self,
        request: ExtractionRequest,
    ) -> impl Future<Output = CriticalResult<String>> + Send;
}
