//! Type-safe builder for `CriticalConfig` using the typestate pattern
//!
//! A document source (`src` or `html`) must be chosen before `build()` is
//! available, so the "no source" input error can only come from configs
//! deserialized at runtime.

use std::marker::PhantomData;
use std::path::PathBuf;

use super::types::{CriticalConfig, Dimension};
use crate::error::CriticalResult;
use crate::extractor::ExtractorOptions;
use crate::merge::{IgnoreOptions, IgnoreRule};

// Type states for the builder
pub struct WithSource;

pub struct CriticalConfigBuilder<State = ()> {
    config: CriticalConfig,
    _phantom: PhantomData<State>,
}

impl Default for CriticalConfigBuilder<()> {
    fn default() -> Self {
        Self {
            config: CriticalConfig::default(),
            _phantom: PhantomData,
        }
    }
}

impl CriticalConfig {
    /// Create a builder for configuring a `CriticalConfig` with a fluent interface
    #[must_use]
    pub fn builder() -> CriticalConfigBuilder<()> {
        CriticalConfigBuilder::default()
    }
}

impl CriticalConfigBuilder<()> {
    /// Read the document from a filesystem path or remote URL
    pub fn src(mut self, src: impl Into<String>) -> CriticalConfigBuilder<WithSource> {
        self.config.src = Some(src.into());
        CriticalConfigBuilder {
            config: self.config,
            _phantom: PhantomData,
        }
    }

    /// Use literal HTML content as the document
    pub fn html(mut self, html: impl Into<String>) -> CriticalConfigBuilder<WithSource> {
        self.config.html = Some(html.into());
        CriticalConfigBuilder {
            config: self.config,
            _phantom: PhantomData,
        }
    }
}

// Build method only available when a source is set
impl CriticalConfigBuilder<WithSource> {
    pub fn build(self) -> CriticalResult<CriticalConfig> {
        self.config.validate()?;
        Ok(self.config)
    }
}

// Builder methods available at any state
impl<State> CriticalConfigBuilder<State> {
    #[must_use]
    pub fn base(mut self, base: impl Into<PathBuf>) -> Self {
        self.config.base = Some(base.into());
        self
    }

    /// Single-dimension shorthand; ignored once `dimensions` is set
    #[must_use]
    pub fn width(mut self, width: u32) -> Self {
        self.config.width = Some(width);
        self
    }

    #[must_use]
    pub fn height(mut self, height: u32) -> Self {
        self.config.height = Some(height);
        self
    }

    #[must_use]
    pub fn dimensions(mut self, dimensions: impl IntoIterator<Item = Dimension>) -> Self {
        self.config.dimensions = Some(dimensions.into_iter().collect());
        self
    }

    /// Explicit stylesheets, bypassing discovery
    #[must_use]
    pub fn css<I, S>(mut self, css: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.config.css = css.into_iter().map(Into::into).collect();
        self
    }

    #[must_use]
    pub fn inline_images(mut self, enabled: bool) -> Self {
        self.config.inline_images = enabled;
        self
    }

    #[must_use]
    pub fn max_image_file_size(mut self, bytes: u64) -> Self {
        self.config.max_image_file_size = Some(bytes);
        self
    }

    #[must_use]
    pub fn asset_paths<I, S>(mut self, paths: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.config.asset_paths = paths.into_iter().map(Into::into).collect();
        self
    }

    #[must_use]
    pub fn ignore(mut self, rules: impl IntoIterator<Item = IgnoreRule>) -> Self {
        self.config.ignore = rules.into_iter().collect();
        self
    }

    #[must_use]
    pub fn ignore_options(mut self, options: IgnoreOptions) -> Self {
        self.config.ignore_options = options;
        self
    }

    /// Basic-auth credentials used for every fetch and by the extractor
    #[must_use]
    pub fn credentials(mut self, user: impl Into<String>, pass: impl Into<String>) -> Self {
        self.config.user = Some(user.into());
        self.config.pass = Some(pass.into());
        self
    }

    #[must_use]
    pub fn user_agent(mut self, user_agent: impl Into<String>) -> Self {
        self.config.user_agent = Some(user_agent.into());
        self
    }

    #[must_use]
    pub fn penthouse(mut self, options: ExtractorOptions) -> Self {
        self.config.penthouse = options;
        self
    }

    #[must_use]
    pub fn fetch_timeout_secs(mut self, secs: u64) -> Self {
        self.config.fetch_timeout_secs = Some(secs);
        self
    }

    #[must_use]
    pub fn extraction_timeout_secs(mut self, secs: u64) -> Self {
        self.config.extraction_timeout_secs = Some(secs);
        self
    }
}
