//! URL and path manipulation utilities.
//!
//! This module provides the helpers shared by the resource locator, the image
//! inliner and the asset path rewriter for telling remote locations from local
//! ones and for resolving references against either.

use anyhow::{Context, Result};
use base64::Engine;
use std::collections::HashSet;
use std::hash::Hash;
use std::path::{Component, Path, PathBuf};
use url::Url;

/// Whether `location` points at a remote http(s) resource
///
/// Protocol-relative references (`//cdn.example.com/a.css`) count as remote.
#[must_use]
pub fn is_external(location: &str) -> bool {
    let location = location.trim();
    if location.starts_with("//") {
        return true;
    }
    match Url::parse(location) {
        Ok(parsed) => matches!(parsed.scheme(), "http" | "https"),
        Err(_) => false,
    }
}

/// Resolve a potentially relative URL against a base URL
///
/// Query strings are re-encoded because references lifted out of HTML often
/// carry unencoded special characters (e.g. Google Fonts URLs with `:` and `,`).
pub fn resolve_url(base_url: &str, url: &str) -> Result<String> {
    let base = Url::parse(base_url).context("Invalid base URL")?;
    let mut resolved = base.join(url.trim()).context("Failed to resolve URL")?;

    if resolved.query().is_some() {
        let query_pairs: Vec<(String, String)> = resolved
            .query_pairs()
            .map(|(k, v)| (k.into_owned(), v.into_owned()))
            .collect();

        resolved.query_pairs_mut().clear();
        for (key, value) in query_pairs {
            resolved.query_pairs_mut().append_pair(&key, &value);
        }
    }

    Ok(resolved.to_string())
}

/// Directory component of a URL, always ending in `/`
///
/// `https://example.com/css/site.css?v=2` becomes `https://example.com/css/`.
#[must_use]
pub fn url_directory(url: &Url) -> Url {
    let mut dir = url.clone();
    dir.set_query(None);
    dir.set_fragment(None);
    if !dir.path().ends_with('/') {
        let path = dir.path();
        let cut = path.rfind('/').map_or(0, |i| i + 1);
        let parent = path[..cut].to_string();
        dir.set_path(if parent.is_empty() { "/" } else { &parent });
    }
    dir
}

/// Split `a/b.png?x=1#frag` into (`a/b.png`, `?x=1#frag`)
#[must_use]
pub fn split_url_suffix(reference: &str) -> (&str, &str) {
    match reference.find(['?', '#']) {
        Some(idx) => reference.split_at(idx),
        None => (reference, ""),
    }
}

/// Lexically normalize a path, folding `.` and `..` without touching the disk
#[must_use]
pub fn normalize_path(path: &Path) -> PathBuf {
    let mut out = PathBuf::new();
    for component in path.components() {
        match component {
            Component::CurDir => {}
            Component::ParentDir => {
                let popped = matches!(out.components().next_back(), Some(Component::Normal(_)))
                    && out.pop();
                if !popped && !out.has_root() {
                    out.push("..");
                }
            }
            other => out.push(other.as_os_str()),
        }
    }
    out
}

/// Base64 token for an HTTP Basic `Authorization` header
#[must_use]
pub fn basic_auth_token(user: &str, pass: &str) -> String {
    base64::engine::general_purpose::STANDARD.encode(format!("{user}:{pass}"))
}

/// Deduplicate a list while preserving the order of first occurrence
#[must_use]
pub fn dedupe_preserving_order<T: Eq + Hash + Clone>(mut items: Vec<T>) -> Vec<T> {
    let mut seen: HashSet<T> = HashSet::with_capacity(items.len());
    items.retain(|item| seen.insert(item.clone()));
    items
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn external_detection() {
        assert!(is_external("https://example.com/a.css"));
        assert!(is_external("http://example.com"));
        assert!(is_external("//cdn.example.com/a.css"));
        assert!(!is_external("css/a.css"));
        assert!(!is_external("/abs/a.css"));
        assert!(!is_external("data:image/png;base64,AAAA"));
        assert!(!is_external("file:///tmp/a.css"));
    }

    #[test]
    fn url_directory_strips_file_and_query() {
        let url = Url::parse("https://example.com/css/site.css?v=2").unwrap();
        assert_eq!(url_directory(&url).as_str(), "https://example.com/css/");

        let root = Url::parse("https://example.com").unwrap();
        assert_eq!(url_directory(&root).as_str(), "https://example.com/");
    }

    #[test]
    fn normalize_folds_parent_segments() {
        assert_eq!(
            normalize_path(Path::new("/site/css/../img/./a.png")),
            PathBuf::from("/site/img/a.png")
        );
        assert_eq!(
            normalize_path(Path::new("../../img/a.png")),
            PathBuf::from("../../img/a.png")
        );
        assert_eq!(normalize_path(Path::new("/../a")), PathBuf::from("/a"));
    }

    #[test]
    fn suffix_split_keeps_query_and_fragment() {
        assert_eq!(split_url_suffix("a.svg#icon"), ("a.svg", "#icon"));
        assert_eq!(split_url_suffix("a.woff?v=1#x"), ("a.woff", "?v=1#x"));
        assert_eq!(split_url_suffix("plain.png"), ("plain.png", ""));
    }

    #[test]
    fn basic_auth_matches_rfc_example() {
        assert_eq!(basic_auth_token("Aladdin", "open sesame"), "QWxhZGRpbjpvcGVuIHNlc2FtZQ==");
    }

    #[test]
    fn dedupe_keeps_first_occurrence() {
        let items = vec!["b", "a", "b", "c", "a"];
        assert_eq!(dedupe_preserving_order(items), vec!["b", "a", "c"]);
    }
}
