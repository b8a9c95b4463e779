//! Core configuration types for critical CSS generation
//!
//! This module contains the `CriticalConfig` struct and the small value types
//! it is built from. Field names serialize in camelCase so a JSON options
//! document uses the same keys as the command line help.

use serde::{Deserialize, Deserializer, Serialize};
use std::path::PathBuf;

use crate::extractor::ExtractorOptions;
use crate::merge::{IgnoreOptions, IgnoreRule};
use crate::utils::{DEFAULT_HEIGHT, DEFAULT_WIDTH};

/// A viewport size in CSS pixels
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Dimension {
    pub width: u32,
    pub height: u32,
}

impl Dimension {
    #[must_use]
    pub const fn new(width: u32, height: u32) -> Self {
        Self { width, height }
    }
}

impl Default for Dimension {
    fn default() -> Self {
        Self::new(DEFAULT_WIDTH, DEFAULT_HEIGHT)
    }
}

impl std::fmt::Display for Dimension {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}x{}", self.width, self.height)
    }
}

impl std::str::FromStr for Dimension {
    type Err = String;

    /// Parse `WIDTHxHEIGHT`, e.g. `1300x900`
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let (w, h) = s
            .trim()
            .split_once(['x', 'X'])
            .ok_or_else(|| format!("expected WIDTHxHEIGHT, got '{s}'"))?;
        let width = w
            .trim()
            .parse()
            .map_err(|e| format!("invalid width '{w}': {e}"))?;
        let height = h
            .trim()
            .parse()
            .map_err(|e| format!("invalid height '{h}': {e}"))?;
        Ok(Self::new(width, height))
    }
}

/// Where the HTML document comes from
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Source<'a> {
    /// Literal HTML content
    Html(&'a str),
    /// Filesystem path or remote URL
    Location(&'a str),
}

/// Main configuration struct for a critical CSS generation run
///
/// Immutable once built; every invocation of [`crate::generate`] is fully
/// parameterized by one of these.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct CriticalConfig {
    /// Path or URL of the HTML document
    pub(crate) src: Option<String>,
    /// Literal HTML content (takes precedence over `src`)
    pub(crate) html: Option<String>,
    /// Base directory for resolving relative references
    pub(crate) base: Option<PathBuf>,

    /// Single-dimension shorthand, used only when `dimensions` is absent
    pub(crate) width: Option<u32>,
    pub(crate) height: Option<u32>,
    pub(crate) dimensions: Option<Vec<Dimension>>,

    /// Explicit stylesheets; replaces discovery entirely when non-empty
    #[serde(deserialize_with = "one_or_many")]
    pub(crate) css: Vec<String>,

    pub(crate) inline_images: bool,
    /// Largest image, in bytes, that is still embedded as a data URI
    pub(crate) max_image_file_size: Option<u64>,
    /// Directories or URL prefixes searched for images, in order
    pub(crate) asset_paths: Vec<String>,

    /// Rules removed from the final CSS
    pub(crate) ignore: Vec<IgnoreRule>,
    pub(crate) ignore_options: IgnoreOptions,

    /// Basic-auth credentials for protected resources
    pub(crate) user: Option<String>,
    pub(crate) pass: Option<String>,
    pub(crate) user_agent: Option<String>,

    /// Pass-through configuration for the extraction engine
    pub(crate) penthouse: ExtractorOptions,

    /// Timeout in seconds for each document, stylesheet or image fetch
    ///
    /// Default: 30 seconds
    pub(crate) fetch_timeout_secs: Option<u64>,

    /// Timeout in seconds for one extraction call (one dimension)
    ///
    /// Default: 60 seconds
    pub(crate) extraction_timeout_secs: Option<u64>,
}

/// Accept either a single string or a list of strings
fn one_or_many<'de, D>(deserializer: D) -> Result<Vec<String>, D::Error>
where
    D: Deserializer<'de>,
{
    #[derive(Deserialize)]
    #[serde(untagged)]
    enum OneOrMany {
        One(String),
        Many(Vec<String>),
    }

    Ok(match Option::<OneOrMany>::deserialize(deserializer)? {
        None => Vec::new(),
        Some(OneOrMany::One(s)) => vec![s],
        Some(OneOrMany::Many(v)) => v,
    })
}
