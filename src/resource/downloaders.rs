//! HTTP downloads for documents, stylesheets and images
//!
//! Every download streams the body and enforces a size limit twice: once from
//! `Content-Length` before reading, and again while chunks arrive, since the
//! header may be absent or wrong.

use anyhow::{Context, Result};
use futures::StreamExt;
use reqwest::Client;
use std::time::Duration;

/// Per-request settings shared by all downloads of a run
#[derive(Debug, Clone)]
pub struct FetchOptions {
    pub timeout: Duration,
    pub user_agent: String,
    /// Full `Authorization` header value
    pub authorization: Option<String>,
}

/// A downloaded body and its declared content type
#[derive(Debug, Clone)]
pub struct Downloaded {
    pub bytes: Vec<u8>,
    pub content_type: Option<String>,
}

/// The resource exists but is larger than the caller accepts
#[derive(Debug, thiserror::Error)]
#[error("Resource too large: {size} bytes exceeds limit of {limit} bytes")]
pub struct TooLarge {
    pub size: u64,
    pub limit: usize,
}

/// Download `url`, failing on non-2xx status or with [`TooLarge`] when the
/// body exceeds `max_size`
pub async fn download_bytes(
    client: &Client,
    url: &str,
    accept: &str,
    options: &FetchOptions,
    max_size: usize,
) -> Result<Downloaded> {
    let mut request = client
        .get(url)
        .timeout(options.timeout)
        .header("User-Agent", &options.user_agent)
        .header("Accept", accept);
    if let Some(authorization) = &options.authorization {
        request = request.header("Authorization", authorization);
    }

    let response = request.send().await.context("Request failed")?;

    if !response.status().is_success() {
        return Err(anyhow::anyhow!(
            "Download failed with status: {}",
            response.status()
        ));
    }

    let content_type = response
        .headers()
        .get("content-type")
        .and_then(|v| v.to_str().ok())
        .map(str::to_string);

    let expected_size = response.content_length().unwrap_or(0);
    if expected_size > max_size as u64 {
        return Err(TooLarge {
            size: expected_size,
            limit: max_size,
        }
        .into());
    }

    let mut buffer = Vec::with_capacity(usize::try_from(expected_size).unwrap_or(0));
    let mut stream = response.bytes_stream();

    while let Some(chunk_result) = stream.next().await {
        let chunk = chunk_result.context("Failed to read response chunk")?;

        let new_total = buffer.len() + chunk.len();
        if new_total > max_size {
            return Err(TooLarge {
                size: new_total as u64,
                limit: max_size,
            }
            .into());
        }
        buffer.extend_from_slice(&chunk);
    }

    Ok(Downloaded {
        bytes: buffer,
        content_type,
    })
}

/// Download a UTF-8 text resource (HTML or CSS)
pub async fn download_text(
    client: &Client,
    url: &str,
    accept: &str,
    options: &FetchOptions,
    max_size: usize,
) -> Result<String> {
    let downloaded = download_bytes(client, url, accept, options, max_size).await?;
    String::from_utf8(downloaded.bytes).context("Content is not valid UTF-8")
}

#[cfg(test)]
mod tests {
    use super::*;

    fn options() -> FetchOptions {
        FetchOptions {
            timeout: Duration::from_secs(5),
            user_agent: "critical-test".to_string(),
            authorization: Some("Basic dXNlcjpwYXNz".to_string()),
        }
    }

    #[tokio::test]
    async fn sends_headers_and_reads_body() {
        let mut server = mockito::Server::new_async().await;
        let mock = server
            .mock("GET", "/a.css")
            .match_header("user-agent", "critical-test")
            .match_header("authorization", "Basic dXNlcjpwYXNz")
            .with_header("content-type", "text/css")
            .with_body("a{color:red}")
            .create_async()
            .await;

        let url = format!("{}/a.css", server.url());
        let text = download_text(&Client::new(), &url, "text/css", &options(), 1024)
            .await
            .unwrap();
        assert_eq!(text, "a{color:red}");
        mock.assert_async().await;
    }

    #[tokio::test]
    async fn rejects_errors_and_oversized_bodies() {
        let mut server = mockito::Server::new_async().await;
        server.mock("GET", "/missing").with_status(404).create_async().await;
        server
            .mock("GET", "/big")
            .with_body("x".repeat(64))
            .create_async()
            .await;

        let client = Client::new();
        let missing = download_bytes(&client, &format!("{}/missing", server.url()), "*/*", &options(), 1024).await;
        assert!(missing.unwrap_err().to_string().contains("404"));

        let big = download_bytes(&client, &format!("{}/big", server.url()), "*/*", &options(), 63).await;
        assert!(big.unwrap_err().is::<TooLarge>());
        let fits = download_bytes(&client, &format!("{}/big", server.url()), "*/*", &options(), 64).await;
        assert_eq!(fits.unwrap().bytes.len(), 64);
    }
}
