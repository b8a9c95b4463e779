//! Image Inliner
//!
//! Replaces `url(...)` references to small images with base64 data URIs.
//! Each reference is looked up in the search paths in order and the first
//! location that has the asset decides: it is inlined when its size is at
//! most the ceiling and left alone otherwise. Assets that cannot be found or
//! read are skipped; they never fail the stylesheet.

use std::collections::HashMap;
use std::path::Path;

use base64::Engine;
use futures::future::join_all;
use url::Url;

use super::search_paths::SearchPath;
use crate::css::{collect_css_urls, map_css_urls};
use crate::resource::{Resource, ResourceLocator, TooLarge};
use crate::utils::{dedupe_preserving_order, image_content_type, is_external, normalize_path, split_url_suffix};

/// Inline every qualifying image reference of `stylesheet`
pub async fn inline_images(
    mut stylesheet: Resource,
    search_paths: &[SearchPath],
    max_size: u64,
    locator: &ResourceLocator,
) -> Resource {
    let candidates: Vec<String> = collect_css_urls(&stylesheet.contents)
        .into_iter()
        .filter(|url| !url.trim_start().starts_with("data:"))
        .filter(|url| image_content_type(url).is_some())
        .collect();
    let candidates = dedupe_preserving_order(candidates);
    if candidates.is_empty() {
        return stylesheet;
    }

    let lookups = candidates.into_iter().map(|reference| async move {
        let data_uri = find_and_encode(&reference, search_paths, max_size, locator).await;
        (reference, data_uri)
    });
    let replacements: HashMap<String, String> = join_all(lookups)
        .await
        .into_iter()
        .filter_map(|(reference, data_uri)| data_uri.map(|uri| (reference, uri)))
        .collect();

    log::debug!(
        "Inlined {} image(s) into {}",
        replacements.len(),
        stylesheet.location
    );
    if !replacements.is_empty() {
        stylesheet.contents = map_css_urls(&stylesheet.contents, |url| replacements.get(url).cloned());
    }
    stylesheet
}

async fn find_and_encode(
    reference: &str,
    search_paths: &[SearchPath],
    max_size: u64,
    locator: &ResourceLocator,
) -> Option<String> {
    let mime = image_content_type(reference)?;
    let limit = usize::try_from(max_size).unwrap_or(usize::MAX);

    if is_external(reference) {
        let absolute = match reference.strip_prefix("//") {
            Some(rest) => format!("https://{rest}"),
            None => reference.to_string(),
        };
        let url = Url::parse(&absolute).ok()?;
        return fetch_remote(&url, mime, limit, locator).await.flatten();
    }

    let (path, _) = split_url_suffix(reference);
    for search_path in search_paths {
        match search_path {
            SearchPath::Dir(dir) => {
                let candidate = normalize_path(&dir.join(path.trim_start_matches('/')));
                if let Some(found) = read_local(&candidate, mime, max_size).await {
                    return found;
                }
            }
            SearchPath::Url(base) => {
                let Ok(url) = base.join(path) else { continue };
                if let Some(found) = fetch_remote(&url, mime, limit, locator).await {
                    return found;
                }
            }
        }
    }
    log::debug!("Image {reference} not found in any search path");
    None
}

/// `None` when the file is absent; `Some(None)` when it exists but is not inlined
async fn read_local(path: &Path, mime: &str, max_size: u64) -> Option<Option<String>> {
    let metadata = tokio::fs::metadata(path).await.ok()?;
    if !metadata.is_file() {
        return None;
    }
    if metadata.len() > max_size {
        log::debug!(
            "Image {} is {} bytes, above the {max_size} byte limit",
            path.display(),
            metadata.len()
        );
        return Some(None);
    }
    match tokio::fs::read(path).await {
        Ok(bytes) => Some(Some(data_uri(mime, &bytes))),
        Err(e) => {
            log::warn!("Failed to read image {}: {e}", path.display());
            Some(None)
        }
    }
}

/// Same contract as [`read_local`]: an oversized image still stops the search
async fn fetch_remote(url: &Url, mime: &str, limit: usize, locator: &ResourceLocator) -> Option<Option<String>> {
    match locator.fetch_image(url, limit).await {
        Ok(downloaded) => {
            let mime = downloaded
                .content_type
                .as_deref()
                .filter(|ct| ct.starts_with("image/"))
                .map_or(mime, |ct| ct.split(';').next().unwrap_or(ct).trim());
            Some(Some(data_uri(mime, &downloaded.bytes)))
        }
        Err(e) if e.is::<TooLarge>() => {
            log::debug!("Image {url} not inlined: {e}");
            Some(None)
        }
        Err(e) => {
            log::warn!("Skipping image {url}: {e:#}");
            None
        }
    }
}

fn data_uri(mime: &str, bytes: &[u8]) -> String {
    let mut encoded = String::with_capacity(bytes.len() * 4 / 3 + mime.len() + 16);
    encoded.push_str("data:");
    encoded.push_str(mime);
    encoded.push_str(";base64,");
    base64::engine::general_purpose::STANDARD.encode_string(bytes, &mut encoded);
    encoded
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn data_uri_uses_standard_base64() {
        assert_eq!(data_uri("image/png", b"abc"), "data:image/png;base64,YWJj");
    }
}
