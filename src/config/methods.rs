//! Validation and loading for `CriticalConfig`

use super::types::CriticalConfig;
use crate::error::{CriticalError, CriticalResult};

impl CriticalConfig {
    /// Check the configuration once, before any work starts
    ///
    /// # Errors
    ///
    /// - `InvalidInput` when neither `src` nor `html` is set to something non-blank
    /// - `Config` when a dimension has a zero width or height
    pub fn validate(&self) -> CriticalResult<()> {
        if self.source().is_none() {
            return Err(CriticalError::InvalidInput(
                "set either `src` (path or URL) or `html` (literal content)".to_string(),
            ));
        }

        for dim in self.dimensions() {
            if dim.width == 0 || dim.height == 0 {
                return Err(CriticalError::Config(format!(
                    "dimension {dim} must have a positive width and height"
                )));
            }
        }

        if self.user.is_some() != self.pass.is_some() {
            log::warn!("Only one of `user`/`pass` is set; requests will not be authenticated");
        }

        Ok(())
    }

    /// Load options from a JSON document
    ///
    /// # Errors
    ///
    /// Returns `Config` for malformed JSON or invalid ignore patterns, and the
    /// errors of [`CriticalConfig::validate`].
    pub fn from_json_str(json: &str) -> CriticalResult<Self> {
        let config: Self = serde_json::from_str(json)?;
        config.validate()?;
        Ok(config)
    }
}
