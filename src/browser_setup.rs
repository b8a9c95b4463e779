//! Locating and launching the Chromium used for critical extraction
//!
//! `CHROMIUM_PATH` wins when it names an existing file. Otherwise the first
//! Chromium-like binary on `PATH` is used, and failing that a managed copy is
//! downloaded once into the user cache directory.

use anyhow::{Context, Result};
use chromiumoxide::browser::{Browser, BrowserConfigBuilder, HeadlessMode};
use chromiumoxide::fetcher::{BrowserFetcher, BrowserFetcherOptions};
use futures::StreamExt;
use std::ffi::OsStr;
use std::path::PathBuf;
use std::time::Duration;
use tokio::task::JoinHandle;
use tracing::{debug, info, warn};
use uuid::Uuid;

const BINARY_NAMES: &[&str] = &[
    "chromium",
    "chromium-browser",
    "google-chrome",
    "google-chrome-stable",
    "chrome",
    "chrome.exe",
];

/// Path of the Chromium binary to launch, downloading one if needed
pub async fn browser_executable() -> Result<PathBuf> {
    if let Some(path) = std::env::var_os("CHROMIUM_PATH").map(PathBuf::from) {
        if tokio::fs::try_exists(&path).await.unwrap_or(false) {
            info!("Using browser from CHROMIUM_PATH: {}", path.display());
            return Ok(path);
        }
        warn!("CHROMIUM_PATH points to a missing file: {}", path.display());
    }

    if let Some(path) = std::env::var_os("PATH").and_then(|dirs| find_on_path(&dirs)) {
        info!("Using browser found on PATH: {}", path.display());
        return Ok(path);
    }

    download_managed_browser().await
}

fn find_on_path(dirs: &OsStr) -> Option<PathBuf> {
    std::env::split_paths(dirs)
        .flat_map(|dir| BINARY_NAMES.iter().map(move |name| dir.join(name)))
        .find(|candidate| candidate.is_file())
}

/// Fetch the pinned Chromium revision into the cache directory
pub async fn download_managed_browser() -> Result<PathBuf> {
    let cache_dir = dirs::cache_dir()
        .unwrap_or_else(std::env::temp_dir)
        .join("kodegen")
        .join("chromium");
    tokio::fs::create_dir_all(&cache_dir)
        .await
        .with_context(|| format!("Failed to create {}", cache_dir.display()))?;

    info!("No local browser found, fetching Chromium into {}", cache_dir.display());
    let options = BrowserFetcherOptions::builder()
        .with_path(&cache_dir)
        .build()
        .context("Failed to build fetcher options")?;
    let revision = BrowserFetcher::new(options)
        .fetch()
        .await
        .context("Failed to fetch Chromium")?;
    Ok(revision.executable_path)
}

/// Launch Chromium with a throwaway profile
///
/// Returns the browser, its CDP handler task and the profile directory. The
/// caller aborts the handler and removes the directory once Chrome has exited.
pub async fn launch_browser(headless: bool) -> Result<(Browser, JoinHandle<()>, PathBuf)> {
    let executable = browser_executable().await?;

    let profile = std::env::temp_dir().join(format!("kodegen_critical_{}", Uuid::new_v4()));
    tokio::fs::create_dir(&profile)
        .await
        .with_context(|| format!("Failed to create profile directory {}", profile.display()))?;

    let builder = BrowserConfigBuilder::default()
        .request_timeout(Duration::from_secs(30))
        .user_data_dir(profile.clone())
        .chrome_executable(executable);
    let builder = if headless {
        builder.headless_mode(HeadlessMode::default())
    } else {
        builder.with_head()
    };
    let config = builder
        .args([
            "--no-first-run",
            "--no-default-browser-check",
            "--no-sandbox",
            "--disable-extensions",
            "--disable-background-networking",
            "--hide-scrollbars",
            "--mute-audio",
        ])
        .build()
        .map_err(|e| anyhow::anyhow!("Failed to build browser config: {e}"))?;

    let (browser, mut handler) = Browser::launch(config)
        .await
        .context("Failed to launch browser")?;

    // Unknown CDP events surface as handler errors; none of them end the session
    let handler_task = tokio::spawn(async move {
        while let Some(event) = handler.next().await {
            if let Err(e) = event {
                debug!("CDP handler: {e}");
            }
        }
    });

    Ok((browser, handler_task, profile))
}
