//! Asset Path Rewriter
//!
//! Stylesheets are concatenated into one aggregate that conceptually lives at
//! the document's location. A relative `url(...)` inside a stylesheet from
//! another directory or host would then point at the wrong place, so each one
//! is re-anchored:
//!
//! - stylesheet fetched remotely: the reference becomes an absolute URL
//! - local stylesheet, local document: a path relative to the document
//! - local stylesheet, remote document: a root-relative path when the asset
//!   lies under the base directory
//!
//! Absolute, root-relative, fragment-only and `data:` references are already
//! location independent and are never touched.

use std::path::{Component, Path};

use url::Url;

use crate::css::map_css_urls;
use crate::resource::{Location, Resource};
use crate::utils::{normalize_path, split_url_suffix};

/// Re-anchor the relative asset references of `stylesheet` at `document`
#[must_use]
pub fn rewrite_asset_paths(mut stylesheet: Resource, document: &Resource, root: Option<&Path>) -> Resource {
    let rewritten = match &stylesheet.location {
        Location::Inline => None,
        Location::Remote(url) => Some(map_css_urls(&stylesheet.contents, |reference| {
            needs_rewrite(reference)
                .then(|| url.join(reference).ok())
                .flatten()
                .map(String::from)
        })),
        Location::File(_) => stylesheet.base_dir().map(|stylesheet_dir| {
            map_css_urls(&stylesheet.contents, |reference| {
                if !needs_rewrite(reference) {
                    return None;
                }
                let (path, suffix) = split_url_suffix(reference);
                let asset = normalize_path(&stylesheet_dir.join(path));
                let anchored = match (&document.location, document.base_dir()) {
                    (Location::Remote(_), _) => root_relative(&asset, root?)?,
                    (_, Some(document_dir)) => {
                        if normalize_path(document_dir) == normalize_path(stylesheet_dir) {
                            return None;
                        }
                        to_url_path(&pathdiff::diff_paths(&asset, document_dir)?)
                    }
                    (_, None) => return None,
                };
                Some(format!("{anchored}{suffix}"))
            })
        }),
    };
    if let Some(contents) = rewritten {
        stylesheet.contents = contents;
    }
    stylesheet
}

/// Only relative paths depend on where the stylesheet lives
fn needs_rewrite(reference: &str) -> bool {
    let reference = reference.trim();
    !(reference.is_empty()
        || reference.starts_with('#')
        || reference.starts_with('/')
        || reference.starts_with("data:")
        || Url::parse(reference).is_ok())
}

fn root_relative(asset: &Path, root: &Path) -> Option<String> {
    let relative = asset.strip_prefix(normalize_path(root)).ok()?;
    Some(format!("/{}", to_url_path(relative)))
}

fn to_url_path(path: &Path) -> String {
    path.components()
        .filter_map(|component| match component {
            Component::ParentDir => Some("..".into()),
            Component::Normal(part) => Some(part.to_string_lossy()),
            _ => None,
        })
        .collect::<Vec<_>>()
        .join("/")
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::path::PathBuf;

    fn local_sheet(path: &str, css: &str) -> Resource {
        Resource::from_file(css, PathBuf::from(path))
    }

    #[test]
    fn remote_stylesheets_get_absolute_urls() {
        let sheet = Resource::from_url(
            "a{background:url(../img/a.png)}b{background:url(/abs.png)}",
            Url::parse("https://cdn.example.com/css/site.css").unwrap(),
        );
        let doc = Resource::from_file("", PathBuf::from("/site/index.html"));
        let out = rewrite_asset_paths(sheet, &doc, None);
        assert_eq!(
            out.contents,
            r#"a{background:url("https://cdn.example.com/img/a.png")}b{background:url(/abs.png)}"#
        );
    }

    #[test]
    fn local_stylesheets_become_relative_to_the_document() {
        let sheet = local_sheet(
            "/site/assets/css/main.css",
            "a{background:url(../img/a.png?v=2)}b{background:url(data:image/png;base64,AA)}c{background:url(#frag)}",
        );
        let doc = Resource::from_file("", PathBuf::from("/site/index.html"));
        let out = rewrite_asset_paths(sheet, &doc, None);
        assert_eq!(
            out.contents,
            r#"a{background:url("assets/img/a.png?v=2")}b{background:url(data:image/png;base64,AA)}c{background:url(#frag)}"#
        );
    }

    #[test]
    fn same_directory_is_untouched() {
        let css = "a{background:url(img/a.png)}";
        let sheet = local_sheet("/site/main.css", css);
        let doc = Resource::inline("<html></html>", "/site");
        assert_eq!(rewrite_asset_paths(sheet, &doc, None).contents, css);
    }

    #[test]
    fn remote_documents_use_root_relative_paths_under_base() {
        let sheet = local_sheet("/site/css/main.css", "a{background:url(../img/a.png)}b{background:url(../../x.png)}");
        let doc = Resource::from_url("", Url::parse("https://example.com/page").unwrap());
        let out = rewrite_asset_paths(sheet, &doc, Some(Path::new("/site")));
        assert_eq!(out.contents, r#"a{background:url("/img/a.png")}b{background:url(../../x.png)}"#);
    }

    #[test]
    fn paths_above_the_document_use_parent_segments() {
        let sheet = local_sheet("/site/css/main.css", "a{background:url(img/a.png)}");
        let doc = Resource::from_file("", PathBuf::from("/site/blog/post/index.html"));
        let out = rewrite_asset_paths(sheet, &doc, None);
        assert_eq!(out.contents, r#"a{background:url("../../css/img/a.png")}"#);
    }
}
