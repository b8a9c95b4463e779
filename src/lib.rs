pub mod aggregator;
pub mod browser_setup;
pub mod config;
pub mod css;
pub mod discover;
pub mod error;
pub mod extractor;
pub mod inline_css;
pub mod link_rewriter;
pub mod merge;
pub mod orchestrator;
pub mod resource;
pub mod utils;

pub use browser_setup::{browser_executable, download_managed_browser, launch_browser};
pub use config::{CriticalConfig, CriticalConfigBuilder, Dimension, Source};
pub use discover::{StylesheetReference, discover};
pub use error::{CriticalError, CriticalResult, PAGE_UNLOADED_DURING_EXECUTION};
pub use extractor::{
    ChromeExtractor, CriticalExtractor, ExtractionRequest, ExtractorOptions, LocalServer,
    LocationProvider, ReachableLocation,
};
pub use merge::{IgnoreOptions, IgnoreRule, filter_css, merge};
pub use orchestrator::{generate, generate_with_chrome};
pub use resource::{Location, Resource, ResourceLocator};
