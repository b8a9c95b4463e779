//! Resource records produced by the locator

use std::path::{Path, PathBuf};
use url::Url;

use crate::utils::url_directory;

/// Where a resource was materialized from
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum Location {
    /// Read from the local filesystem
    File(PathBuf),
    /// Fetched over http(s)
    Remote(Url),
    /// Literal content supplied by the caller
    Inline,
}

impl std::fmt::Display for Location {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::File(path) => write!(f, "{}", path.display()),
            Self::Remote(url) => write!(f, "{url}"),
            Self::Inline => write!(f, "<inline>"),
        }
    }
}

/// Directory against which relative references inside a resource resolve
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum ResourceBase {
    Dir(PathBuf),
    Url(Url),
}

impl std::fmt::Display for ResourceBase {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Dir(path) => write!(f, "{}", path.display()),
            Self::Url(url) => write!(f, "{url}"),
        }
    }
}

/// A materialized document or stylesheet
///
/// `contents` is replaced in place as the stylesheet moves through the
/// inline and rewrite stages; `location` and `base` never change.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Resource {
    pub contents: String,
    pub location: Location,
    pub base: ResourceBase,
}

impl Resource {
    /// Wrap literal content, resolving relative references against `base_dir`
    #[must_use]
    pub fn inline(contents: impl Into<String>, base_dir: impl Into<PathBuf>) -> Self {
        Self {
            contents: contents.into(),
            location: Location::Inline,
            base: ResourceBase::Dir(base_dir.into()),
        }
    }

    #[must_use]
    pub fn from_file(contents: impl Into<String>, path: PathBuf) -> Self {
        let dir = path
            .parent()
            .map_or_else(|| PathBuf::from("/"), Path::to_path_buf);
        Self {
            contents: contents.into(),
            location: Location::File(path),
            base: ResourceBase::Dir(dir),
        }
    }

    #[must_use]
    pub fn from_url(contents: impl Into<String>, url: Url) -> Self {
        let dir = url_directory(&url);
        Self {
            contents: contents.into(),
            location: Location::Remote(url),
            base: ResourceBase::Url(dir),
        }
    }

    #[must_use]
    pub fn is_remote(&self) -> bool {
        matches!(self.location, Location::Remote(_))
    }

    /// Local directory base, if this resource lives on disk or inline
    #[must_use]
    pub fn base_dir(&self) -> Option<&Path> {
        match &self.base {
            ResourceBase::Dir(dir) => Some(dir),
            ResourceBase::Url(_) => None,
        }
    }

    /// Remote directory base, if this resource was fetched
    #[must_use]
    pub fn base_url(&self) -> Option<&Url> {
        match &self.base {
            ResourceBase::Url(url) => Some(url),
            ResourceBase::Dir(_) => None,
        }
    }
}
