//! Error types for critical CSS generation
//!
//! Every fatal condition of a generation run surfaces as exactly one
//! `CriticalError`. Tolerated conditions (a single image that cannot be
//! inlined, a page that unloads while the extractor is running) never reach
//! the caller as errors.

use thiserror::Error;

/// Message prefix the extraction engine uses when the page unloaded while the
/// critical-path script was still running.
pub const PAGE_UNLOADED_DURING_EXECUTION: &str = "PAGE_UNLOADED_DURING_EXECUTION";

/// Result type alias for critical CSS operations
pub type CriticalResult<T> = Result<T, CriticalError>;

/// Error types for critical CSS generation
#[derive(Debug, Error)]
pub enum CriticalError {
    /// Neither a source path/URL nor literal HTML was supplied
    #[error("A valid source is required: {0}")]
    InvalidInput(String),

    /// Discovery found no usable stylesheet and no override was given
    #[error(
        "No usable stylesheets found in html source. Try to specify the stylesheets manually."
    )]
    NoStylesheetsFound,

    /// A stylesheet or the source document could not be read or fetched
    #[error("Failed to resolve {location}: {message}")]
    Resolution { location: String, message: String },

    /// The extraction engine failed for a reason other than a page unload
    #[error("Critical extraction failed: {0}")]
    Extraction(String),

    /// Configuration could not be parsed or validated
    #[error("Invalid configuration: {0}")]
    Config(String),
}

impl CriticalError {
    /// Build a resolution error for `location` from any displayable cause
    pub fn resolution(location: impl Into<String>, cause: impl std::fmt::Display) -> Self {
        Self::Resolution {
            location: location.into(),
            message: format!("{cause:#}"),
        }
    }

    /// Whether this is the recoverable "page unloaded" extraction failure
    #[must_use]
    pub fn is_page_unloaded(&self) -> bool {
        matches!(self, Self::Extraction(msg) if msg.starts_with(PAGE_UNLOADED_DURING_EXECUTION))
    }
}

impl From<anyhow::Error> for CriticalError {
    fn from(err: anyhow::Error) -> Self {
        // {:#} keeps the whole context chain
        Self::Extraction(format!("{err:#}"))
    }
}

impl From<serde_json::Error> for CriticalError {
    fn from(err: serde_json::Error) -> Self {
        Self::Config(err.to_string())
    }
}
