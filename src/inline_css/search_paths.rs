//! Where the image inliner looks for assets

use std::path::{Path, PathBuf};
use url::Url;

use crate::resource::{Location, Resource, ResourceBase};
use crate::utils::{dedupe_preserving_order, is_external, url_directory};

/// One place an asset reference may be found
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum SearchPath {
    Dir(PathBuf),
    /// Always ends in `/` so relative joins stay inside it
    Url(Url),
}

impl SearchPath {
    /// Parse a caller-supplied entry: URLs stay remote, anything else is a directory
    #[must_use]
    pub fn parse(entry: &str) -> Option<Self> {
        let entry = entry.trim();
        if entry.is_empty() {
            return None;
        }
        if is_external(entry) {
            let entry = match entry.strip_prefix("//") {
                Some(rest) => format!("https://{rest}"),
                None => entry.to_string(),
            };
            let mut url = Url::parse(&entry).ok()?;
            if !url.path().ends_with('/') {
                let path = format!("{}/", url.path());
                url.set_path(&path);
            }
            return Some(Self::Url(url));
        }
        Some(Self::Dir(PathBuf::from(entry)))
    }
}

impl std::fmt::Display for SearchPath {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Dir(dir) => write!(f, "{}", dir.display()),
            Self::Url(url) => write!(f, "{url}"),
        }
    }
}

/// Ordered, deduplicated search paths for one stylesheet
///
/// Caller-supplied entries replace the defaults entirely. Without them the
/// stylesheet's own directory comes first, then (for a remote document) its
/// origin and directory, then `base`.
#[must_use]
pub fn search_paths(
    stylesheet: &Resource,
    document: &Resource,
    base: Option<&Path>,
    extra: &[String],
) -> Vec<SearchPath> {
    let supplied: Vec<SearchPath> = extra.iter().filter_map(|entry| SearchPath::parse(entry)).collect();
    if !supplied.is_empty() {
        return dedupe_preserving_order(supplied);
    }

    let mut paths = vec![match &stylesheet.base {
        ResourceBase::Dir(dir) => SearchPath::Dir(dir.clone()),
        ResourceBase::Url(url) => SearchPath::Url(url.clone()),
    }];

    if let Location::Remote(url) = &document.location {
        if let Ok(origin) = Url::parse(&format!("{}/", url.origin().ascii_serialization())) {
            paths.push(SearchPath::Url(origin));
        }
        paths.push(SearchPath::Url(url_directory(url)));
    }

    if let Some(base) = base {
        paths.push(SearchPath::Dir(base.to_path_buf()));
    }

    dedupe_preserving_order(paths)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn remote_document_adds_origin_and_directory() {
        let stylesheet = Resource::from_file("", PathBuf::from("/site/css/a.css"));
        let document = Resource::from_url("", Url::parse("https://example.com/blog/post.html").unwrap());
        let paths = search_paths(&stylesheet, &document, Some(Path::new("/site")), &[]);
        assert_eq!(
            paths,
            vec![
                SearchPath::Dir(PathBuf::from("/site/css")),
                SearchPath::Url(Url::parse("https://example.com/").unwrap()),
                SearchPath::Url(Url::parse("https://example.com/blog/").unwrap()),
                SearchPath::Dir(PathBuf::from("/site")),
            ]
        );
    }

    #[test]
    fn supplied_paths_replace_the_defaults() {
        let stylesheet = Resource::from_file("", PathBuf::from("/site/css/a.css"));
        let document = Resource::from_url("", Url::parse("https://example.com/index.html").unwrap());
        let extra = vec![
            "/assets".to_string(),
            "//cdn.example.com/img".to_string(),
            "/assets".to_string(),
        ];
        let paths = search_paths(&stylesheet, &document, Some(Path::new("/site")), &extra);
        assert_eq!(
            paths,
            vec![
                SearchPath::Dir(PathBuf::from("/assets")),
                SearchPath::Url(Url::parse("https://cdn.example.com/img/").unwrap()),
            ]
        );
    }

    #[test]
    fn blank_supplied_entries_fall_back_to_defaults() {
        let stylesheet = Resource::from_file("", PathBuf::from("/site/a.css"));
        let document = Resource::from_file("", PathBuf::from("/site/index.html"));
        let paths = search_paths(&stylesheet, &document, Some(Path::new("/site")), &["  ".to_string()]);
        assert_eq!(paths, vec![SearchPath::Dir(PathBuf::from("/site"))]);
    }
}
