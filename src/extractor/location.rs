//! Navigable addresses for resolved documents

use std::path::{Path, PathBuf};

use crate::error::{CriticalError, CriticalResult};
use crate::resource::{Location, Resource};

use super::server::LocalServer;

/// A URL the extractor can navigate to
///
/// Holds the local server alive for local documents; dropping the value tears
/// the server down.
pub struct ReachableLocation {
    url: String,
    server: Option<LocalServer>,
}

impl ReachableLocation {
    #[must_use]
    pub fn url(&self) -> &str {
        &self.url
    }

    /// Whether a local server backs this location
    #[must_use]
    pub fn is_served(&self) -> bool {
        self.server.is_some()
    }
}

impl std::fmt::Debug for ReachableLocation {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ReachableLocation")
            .field("url", &self.url)
            .field("served", &self.server.is_some())
            .finish()
    }
}

/// Produces a [`ReachableLocation`] for a document
#[derive(Debug, Clone, Default)]
pub struct LocationProvider {
    root: Option<PathBuf>,
}

impl LocationProvider {
    /// `root` bounds the files a local server exposes; defaults to the
    /// document's own directory
    #[must_use]
    pub fn new(root: Option<PathBuf>) -> Self {
        Self { root }
    }

    /// Reuse remote URLs directly, serve everything else locally
    pub async fn reachable_url(&self, document: &Resource) -> CriticalResult<ReachableLocation> {
        if let Location::Remote(url) = &document.location {
            return Ok(ReachableLocation {
                url: url.to_string(),
                server: None,
            });
        }

        let dir = document
            .base_dir()
            .map_or_else(|| PathBuf::from("/"), Path::to_path_buf);
        let root = self.root.clone().unwrap_or_else(|| dir.clone());
        let server = LocalServer::start(&root, &dir, document.contents.clone())
            .await
            .map_err(|e| CriticalError::resolution(document.location.to_string(), e))?;

        Ok(ReachableLocation {
            url: server.url(),
            server: Some(server),
        })
    }
}
