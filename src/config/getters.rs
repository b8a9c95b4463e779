//! Getter methods for `CriticalConfig`
//!
//! This module provides the accessor methods for retrieving configuration
//! values, with every optional field resolved to its documented default.

use std::path::Path;
use std::time::Duration;

use super::types::{CriticalConfig, Dimension, Source};
use crate::extractor::ExtractorOptions;
use crate::merge::{IgnoreOptions, IgnoreRule};
use crate::utils::{
    CHROME_USER_AGENT, DEFAULT_EXTRACTION_TIMEOUT_SECS, DEFAULT_FETCH_TIMEOUT_SECS,
    DEFAULT_HEIGHT, DEFAULT_MAX_IMAGE_FILE_SIZE, DEFAULT_WIDTH, basic_auth_token,
};

impl CriticalConfig {
    /// The document source; literal HTML wins over `src`, blank values count as unset
    #[must_use]
    pub fn source(&self) -> Option<Source<'_>> {
        if let Some(html) = self.html.as_deref().filter(|h| !h.trim().is_empty()) {
            return Some(Source::Html(html));
        }
        self.src.as_deref().filter(|s| !s.trim().is_empty()).map(Source::Location)
    }

    #[must_use]
    pub fn src(&self) -> Option<&str> {
        self.src.as_deref()
    }

    #[must_use]
    pub fn html(&self) -> Option<&str> {
        self.html.as_deref()
    }

    #[must_use]
    pub fn base(&self) -> Option<&Path> {
        self.base.as_deref()
    }

    /// Ordered viewport list for this run
    ///
    /// Falls back to a single `width`x`height` entry (1300x900 unless the
    /// shorthand fields are set) when no explicit list was configured.
    #[must_use]
    pub fn dimensions(&self) -> Vec<Dimension> {
        match &self.dimensions {
            Some(dims) if !dims.is_empty() => dims.clone(),
            _ => vec![Dimension::new(
                self.width.unwrap_or(DEFAULT_WIDTH),
                self.height.unwrap_or(DEFAULT_HEIGHT),
            )],
        }
    }

    #[must_use]
    pub fn css(&self) -> &[String] {
        &self.css
    }

    #[must_use]
    pub fn inline_images(&self) -> bool {
        self.inline_images
    }

    #[must_use]
    pub fn max_image_file_size(&self) -> u64 {
        self.max_image_file_size
            .unwrap_or(DEFAULT_MAX_IMAGE_FILE_SIZE)
    }

    #[must_use]
    pub fn asset_paths(&self) -> &[String] {
        &self.asset_paths
    }

    #[must_use]
    pub fn ignore(&self) -> &[IgnoreRule] {
        &self.ignore
    }

    #[must_use]
    pub fn ignore_options(&self) -> &IgnoreOptions {
        &self.ignore_options
    }

    #[must_use]
    pub fn user(&self) -> Option<&str> {
        self.user.as_deref()
    }

    #[must_use]
    pub fn pass(&self) -> Option<&str> {
        self.pass.as_deref()
    }

    /// `Authorization` header value when both credentials are present
    #[must_use]
    pub fn authorization(&self) -> Option<String> {
        match (self.user.as_deref(), self.pass.as_deref()) {
            (Some(user), Some(pass)) => Some(format!("Basic {}", basic_auth_token(user, pass))),
            _ => None,
        }
    }

    /// User agent explicitly configured by the caller, if any
    #[must_use]
    pub fn user_agent(&self) -> Option<&str> {
        self.user_agent.as_deref()
    }

    /// User agent used for our own HTTP fetches
    #[must_use]
    pub fn fetch_user_agent(&self) -> &str {
        self.user_agent.as_deref().unwrap_or(CHROME_USER_AGENT)
    }

    #[must_use]
    pub fn penthouse(&self) -> &ExtractorOptions {
        &self.penthouse
    }

    #[must_use]
    pub fn fetch_timeout(&self) -> Duration {
        Duration::from_secs(
            self.fetch_timeout_secs
                .unwrap_or(DEFAULT_FETCH_TIMEOUT_SECS),
        )
    }

    #[must_use]
    pub fn extraction_timeout(&self) -> Duration {
        Duration::from_secs(
            self.extraction_timeout_secs
                .unwrap_or(DEFAULT_EXTRACTION_TIMEOUT_SECS),
        )
    }
}
