//! Shared configuration constants
//!
//! Default values used throughout the pipeline so that the config getters,
//! the builder and the command line agree on them.

/// Default viewport width in CSS pixels
pub const DEFAULT_WIDTH: u32 = 1300;

/// Default viewport height in CSS pixels
pub const DEFAULT_HEIGHT: u32 = 900;

/// Largest image inlined as a data URI when nothing else is configured: 10 KiB
pub const DEFAULT_MAX_IMAGE_FILE_SIZE: u64 = 10_240;

/// Timeout for a single document, stylesheet or image fetch
pub const DEFAULT_FETCH_TIMEOUT_SECS: u64 = 30;

/// Timeout for a single extraction call (one viewport)
pub const DEFAULT_EXTRACTION_TIMEOUT_SECS: u64 = 60;

/// Maximum size accepted for a downloaded document or stylesheet: 10 MiB
pub const MAX_TEXT_RESOURCE_SIZE: usize = 10 * 1024 * 1024;

/// Chrome user agent string used when the caller does not set one
///
/// Updated: 2025-01-29 to Chrome 132 (current stable)
pub const CHROME_USER_AGENT: &str = "Mozilla/5.0 (Windows NT 10.0; Win64; x64) AppleWebKit/537.36 (KHTML, like Gecko) Chrome/132.0.6834.160 Safari/537.36";
