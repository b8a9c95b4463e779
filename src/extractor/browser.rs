//! Chromium-backed critical CSS extraction
//!
//! One browser is launched lazily and shared by every viewport of a run; each
//! extraction gets its own page, so dimensions can be computed concurrently.

use std::path::PathBuf;
use std::time::{Duration, Instant};

use anyhow::{Context, Result};
use chromiumoxide::browser::Browser;
use chromiumoxide::cdp::browser_protocol::emulation::SetDeviceMetricsOverrideParams;
use chromiumoxide::cdp::browser_protocol::network::{
    EnableParams, Headers, SetExtraHttpHeadersParams, SetUserAgentOverrideParams,
};
use chromiumoxide::page::Page;
use tokio::sync::Mutex;
use tokio::task::JoinHandle;
use tracing::{debug, info, warn};

use super::js_scripts::{CriticalCssPayload, READY_STATE_SCRIPT, critical_css_call};
use super::{CriticalExtractor, ExtractionRequest, with_timeout};
use crate::error::{CriticalError, CriticalResult, PAGE_UNLOADED_DURING_EXECUTION};

const DEFAULT_NAVIGATION_TIMEOUT_MS: u64 = 30_000;
const READY_POLL_INTERVAL: Duration = Duration::from_millis(100);

/// CDP failures that mean the document went away under the script
const UNLOAD_MARKERS: &[&str] = &[
    "Execution context was destroyed",
    "Cannot find context with specified id",
    "Inspected target navigated or closed",
    "Target closed",
];

/// Browser plus its CDP handler task
///
/// The handler must be aborted or it keeps running after the browser closes.
struct BrowserWrapper {
    browser: Browser,
    handler: JoinHandle<()>,
    user_data_dir: Option<PathBuf>,
}

impl BrowserWrapper {
    /// Remove the profile directory; only safe after the browser exited
    fn cleanup_temp_dir(&mut self) {
        if let Some(path) = self.user_data_dir.take() {
            debug!("Cleaning up browser profile: {}", path.display());
            if let Err(e) = std::fs::remove_dir_all(&path) {
                warn!(
                    "Failed to clean up browser profile {}: {}. Manual cleanup may be required.",
                    path.display(),
                    e
                );
            }
        }
    }
}

impl Drop for BrowserWrapper {
    fn drop(&mut self) {
        self.handler.abort();
        if self.user_data_dir.is_some() {
            warn!("Browser dropped without shutdown - removing profile in Drop");
            self.cleanup_temp_dir();
        }
    }
}

/// [`CriticalExtractor`] driving a local Chrome/Chromium over CDP
pub struct ChromeExtractor {
    headless: bool,
    browser: Mutex<Option<BrowserWrapper>>,
}

impl Default for ChromeExtractor {
    fn default() -> Self {
        Self::new()
    }
}

impl ChromeExtractor {
    /// Headless extractor; the browser starts on first use
    #[must_use]
    pub fn new() -> Self {
        Self {
            headless: true,
            browser: Mutex::new(None),
        }
    }

    #[must_use]
    pub fn headless(mut self, headless: bool) -> Self {
        self.headless = headless;
        self
    }

    /// Close the browser if it was started
    ///
    /// Dropping the extractor only aborts the handler; call this to let Chrome
    /// exit cleanly and remove its profile.
    pub async fn shutdown(&self) -> Result<()> {
        let mut guard = self.browser.lock().await;
        if let Some(mut wrapper) = guard.take() {
            info!("Shutting down extraction browser");
            if let Err(e) = wrapper.browser.close().await {
                warn!("Failed to close browser cleanly: {}", e);
            }
            if let Err(e) = wrapper.browser.wait().await {
                warn!("Failed to wait for browser exit: {}", e);
            }
            wrapper.cleanup_temp_dir();
        }
        Ok(())
    }

    async fn new_page(&self) -> Result<Page> {
        let mut guard = self.browser.lock().await;
        if guard.is_none() {
            let (browser, handler, user_data_dir) =
                crate::browser_setup::launch_browser(self.headless).await?;
            *guard = Some(BrowserWrapper {
                browser,
                handler,
                user_data_dir: Some(user_data_dir),
            });
        }
        let wrapper = guard.as_ref().context("browser missing after launch")?;
        wrapper
            .browser
            .new_page("about:blank")
            .await
            .context("Failed to open page")
    }

    async fn prepare(&self, page: &Page, request: &ExtractionRequest) -> Result<()> {
        page.execute(
            SetDeviceMetricsOverrideParams::builder()
                .width(i64::from(request.dimension.width))
                .height(i64::from(request.dimension.height))
                .device_scale_factor(1.0)
                .mobile(false)
                .build()
                .map_err(anyhow::Error::msg)?,
        )
        .await
        .context("Failed to set viewport")?;

        if let Some(user_agent) = &request.user_agent {
            page.execute(SetUserAgentOverrideParams::new(user_agent.clone()))
                .await
                .context("Failed to set user agent")?;
        }

        if let Some(authorization) = &request.authorization {
            page.execute(EnableParams::default())
                .await
                .context("Failed to enable network domain")?;
            page.execute(SetExtraHttpHeadersParams::new(Headers::new(
                serde_json::json!({ "Authorization": authorization }),
            )))
            .await
            .context("Failed to set authorization header")?;
        }
        Ok(())
    }

    async fn navigate(&self, page: &Page, request: &ExtractionRequest) -> CriticalResult<()> {
        let limit = Duration::from_millis(
            request
                .options
                .timeout_ms
                .unwrap_or(DEFAULT_NAVIGATION_TIMEOUT_MS),
        );
        with_timeout(
            async {
                page.goto(request.url.as_str())
                    .await
                    .map_err(|e| {
                        CriticalError::Extraction(format!("Navigation to {} failed: {e}", request.url))
                    })?;
                wait_for_ready(page, limit).await;
                Ok(())
            },
            limit,
            "Page navigation",
        )
        .await?;

        if let Some(wait) = request.options.render_wait_time {
            tokio::time::sleep(Duration::from_millis(wait)).await;
        }
        Ok(())
    }

    async fn run(&self, page: &Page, request: &ExtractionRequest) -> CriticalResult<String> {
        self.prepare(page, request).await?;
        self.navigate(page, request).await?;

        let call = critical_css_call(&CriticalCssPayload {
            css: &request.css,
            width: request.dimension.width,
            height: request.dimension.height,
            force_include: &request.options.force_include,
            keep_larger_media_queries: request.options.keep_larger_media_queries,
            properties_to_remove: &request.options.properties_to_remove,
        })
        .map_err(|e| CriticalError::Extraction(format!("Failed to encode script payload: {e}")))?;

        let value: serde_json::Value = page
            .evaluate(call)
            .await
            .map_err(|e| classify_script_error(&e))?
            .into_value()
            .map_err(|e| classify_script_error(&e))?;

        if let Some(error) = value.get("error").and_then(|v| v.as_str()) {
            return Err(CriticalError::Extraction(error.to_string()));
        }
        value
            .get("css")
            .and_then(|v| v.as_str())
            .map(str::to_string)
            .ok_or_else(|| CriticalError::Extraction("script returned no css".to_string()))
    }
}

impl CriticalExtractor for ChromeExtractor {
    async fn extract(&self, request: ExtractionRequest) -> CriticalResult<String> {
        let page = self.new_page().await?;
        debug!(
            "Extracting critical CSS for {} at {}",
            request.url, request.dimension
        );
        let result = self.run(&page, &request).await;
        if let Err(e) = page.close().await {
            debug!("Failed to close page: {}", e);
        }
        result
    }
}

/// Poll until the document reports `complete`, giving up silently at `limit`
async fn wait_for_ready(page: &Page, limit: Duration) {
    let start = Instant::now();
    while start.elapsed() < limit {
        if let Ok(result) = page.evaluate(READY_STATE_SCRIPT).await
            && let Ok(value) = result.into_value::<serde_json::Value>()
        {
            let complete = value.get("readyState").and_then(|v| v.as_str()) == Some("complete");
            let body = value.get("bodyExists").and_then(|v| v.as_bool()).unwrap_or(false);
            if complete && body {
                debug!("Page ready after {:.2}s", start.elapsed().as_secs_f64());
                return;
            }
        }
        tokio::time::sleep(READY_POLL_INTERVAL).await;
    }
    warn!("Page not ready after {}s, extracting anyway", limit.as_secs());
}

fn classify_script_error(err: &dyn std::fmt::Display) -> CriticalError {
    let message = err.to_string();
    if UNLOAD_MARKERS.iter().any(|marker| message.contains(marker)) {
        CriticalError::Extraction(format!("{PAGE_UNLOADED_DURING_EXECUTION}: {message}"))
    } else {
        CriticalError::Extraction(message)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn context_loss_is_an_unload() {
        let err = classify_script_error(&"Execution context was destroyed, most likely because of a navigation");
        assert!(err.is_page_unloaded());

        let err = classify_script_error(&"SyntaxError: Unexpected token");
        assert!(!err.is_page_unloaded());
    }
}
