//! Turning paths, URLs and literal content into [`Resource`]s

use std::path::{Path, PathBuf};

use reqwest::Client;
use url::Url;

use super::downloaders::{Downloaded, FetchOptions, download_bytes, download_text};
use super::types::{Location, Resource};
use crate::config::{CriticalConfig, Source};
use crate::error::{CriticalError, CriticalResult};
use crate::utils::{MAX_TEXT_RESOURCE_SIZE, is_external, normalize_path, resolve_url, split_url_suffix};

const DOCUMENT_ACCEPT: &str = "text/html,application/xhtml+xml,*/*;q=0.8";
const STYLESHEET_ACCEPT: &str = "text/css,*/*;q=0.1";
const IMAGE_ACCEPT: &str = "image/avif,image/webp,image/apng,image/*,*/*;q=0.8";

/// Resolves documents, stylesheets and assets for one generation run
///
/// Cheap to clone; clones share the HTTP connection pool.
#[derive(Debug, Clone)]
pub struct ResourceLocator {
    client: Client,
    fetch: FetchOptions,
    root: Option<PathBuf>,
    cwd: PathBuf,
}

impl ResourceLocator {
    pub fn new(config: &CriticalConfig) -> CriticalResult<Self> {
        let fetch = FetchOptions {
            timeout: config.fetch_timeout(),
            user_agent: config.fetch_user_agent().to_string(),
            authorization: config.authorization(),
        };
        let client = Client::builder()
            .timeout(fetch.timeout)
            .build()
            .map_err(|e| CriticalError::Config(format!("Failed to build HTTP client: {e}")))?;
        Self::with_client(client, fetch, config.base())
    }

    /// Locator over an existing client; `base` may be relative to the cwd
    pub fn with_client(client: Client, fetch: FetchOptions, base: Option<&Path>) -> CriticalResult<Self> {
        let cwd = std::env::current_dir()
            .map_err(|e| CriticalError::resolution("current directory", e))?;
        let root = base.map(|base| normalize_path(&cwd.join(base)));
        Ok(Self {
            client,
            fetch,
            root,
            cwd,
        })
    }

    /// Absolute base directory, when one was configured
    #[must_use]
    pub fn root(&self) -> Option<&Path> {
        self.root.as_deref()
    }

    #[must_use]
    pub fn client(&self) -> &Client {
        &self.client
    }

    /// Materialize the source document
    pub async fn resolve(&self, source: Source<'_>) -> CriticalResult<Resource> {
        match source {
            Source::Html(html) => Ok(Resource::inline(
                html,
                self.root.clone().unwrap_or_else(|| self.cwd.clone()),
            )),
            Source::Location(location) => self.load(self.locate(location).await?, DOCUMENT_ACCEPT).await,
        }
    }

    /// Materialize a stylesheet referenced from `document`
    pub async fn resolve_stylesheet(&self, reference: &str, document: &Resource) -> CriticalResult<Resource> {
        let location = self.locate_reference(reference, document)?;
        self.load(location, STYLESHEET_ACCEPT).await
    }

    /// Materialize a stylesheet given directly by the caller
    pub async fn resolve_override(&self, entry: &str) -> CriticalResult<Resource> {
        self.load(self.locate(entry).await?, STYLESHEET_ACCEPT).await
    }

    /// Where a caller-supplied path or URL points
    ///
    /// Relative paths prefer the base directory when the file exists there
    /// and fall back to the current directory.
    pub async fn locate(&self, location: &str) -> CriticalResult<Location> {
        let location = location.trim();
        if location.is_empty() {
            return Err(CriticalError::resolution("<empty>", "empty location"));
        }
        if let Some(rest) = location.strip_prefix("//") {
            return parse_remote(&format!("https://{rest}"));
        }
        if is_external(location) {
            return parse_remote(location);
        }
        if location.starts_with("file:") {
            return file_url_path(location).map(Location::File);
        }

        let (path, _) = split_url_suffix(location);
        let path = Path::new(path);
        let resolved = if path.is_absolute() {
            let mut resolved = path.to_path_buf();
            if let Some(root) = &self.root
                && !exists(path).await
            {
                let candidate = root.join(path.strip_prefix("/").unwrap_or(path));
                if exists(&candidate).await {
                    resolved = candidate;
                }
            }
            resolved
        } else {
            let under_root = self.root.as_ref().map(|root| root.join(path));
            match under_root {
                Some(candidate) if exists(&candidate).await => candidate,
                _ => self.cwd.join(path),
            }
        };
        Ok(Location::File(normalize_path(&resolved)))
    }

    /// Where a reference found inside `document` points
    pub fn locate_reference(&self, reference: &str, document: &Resource) -> CriticalResult<Location> {
        let reference = reference.trim();
        if reference.is_empty() {
            return Err(CriticalError::resolution(document.location.to_string(), "empty stylesheet reference"));
        }

        if let Some(rest) = reference.strip_prefix("//") {
            let scheme = match &document.location {
                Location::Remote(url) => url.scheme(),
                _ => "https",
            };
            return parse_remote(&format!("{scheme}://{rest}"));
        }
        if is_external(reference) {
            return parse_remote(reference);
        }
        if reference.starts_with("file:") {
            return file_url_path(reference).map(Location::File);
        }

        if let Location::Remote(url) = &document.location {
            let joined = resolve_url(url.as_str(), reference)
                .map_err(|e| CriticalError::resolution(reference, e))?;
            return parse_remote(&joined);
        }

        let dir = document.base_dir().unwrap_or(&self.cwd);
        let (path, _) = split_url_suffix(reference);
        let resolved = match path.strip_prefix('/') {
            Some(rooted) => self.root.as_deref().unwrap_or(dir).join(rooted),
            None => dir.join(path),
        };
        Ok(Location::File(normalize_path(&resolved)))
    }

    async fn load(&self, location: Location, accept: &str) -> CriticalResult<Resource> {
        match location {
            Location::File(path) => {
                log::debug!("Reading {}", path.display());
                let contents = tokio::fs::read_to_string(&path)
                    .await
                    .map_err(|e| CriticalError::resolution(path.display().to_string(), e))?;
                Ok(Resource::from_file(contents, path))
            }
            Location::Remote(url) => {
                log::debug!("Fetching {url}");
                let contents = download_text(&self.client, url.as_str(), accept, &self.fetch, MAX_TEXT_RESOURCE_SIZE)
                    .await
                    .map_err(|e| CriticalError::resolution(url.as_str(), e))?;
                Ok(Resource::from_url(contents, url))
            }
            Location::Inline => Err(CriticalError::resolution("<inline>", "inline content has no location to load")),
        }
    }

    /// Download an image no larger than `max_size` bytes
    pub async fn fetch_image(&self, url: &Url, max_size: usize) -> anyhow::Result<Downloaded> {
        download_bytes(&self.client, url.as_str(), IMAGE_ACCEPT, &self.fetch, max_size).await
    }
}

async fn exists(path: &Path) -> bool {
    tokio::fs::try_exists(path).await.unwrap_or(false)
}

fn parse_remote(location: &str) -> CriticalResult<Location> {
    Url::parse(location)
        .map(Location::Remote)
        .map_err(|e| CriticalError::resolution(location, e))
}

fn file_url_path(location: &str) -> CriticalResult<PathBuf> {
    Url::parse(location)
        .ok()
        .and_then(|url| url.to_file_path().ok())
        .ok_or_else(|| CriticalError::resolution(location, "invalid file URL"))
}
