//! Test utilities shared by the critical CSS test suite

use std::collections::HashMap;
use std::path::Path;
use std::sync::Mutex;

use anyhow::Result;
use kodegen_tools_critical::{
    CriticalError, CriticalExtractor, CriticalResult, Dimension, ExtractionRequest,
    PAGE_UNLOADED_DURING_EXECUTION,
};
use tempfile::TempDir;

/// Creates a temporary directory for test fixtures
#[allow(dead_code)]
pub fn create_test_dir() -> Result<TempDir> {
    Ok(TempDir::new()?)
}

/// Writes `contents` to `dir/relative`, creating parent directories
#[allow(dead_code)]
pub fn write_fixture(dir: &Path, relative: &str, contents: impl AsRef<[u8]>) -> Result<()> {
    let path = dir.join(relative);
    if let Some(parent) = path.parent() {
        std::fs::create_dir_all(parent)?;
    }
    std::fs::write(path, contents)?;
    Ok(())
}

/// Creates an HTML document whose head holds `head`
#[allow(dead_code)]
pub fn create_test_html(head: &str, body: &str) -> String {
    format!(
        r#"<!DOCTYPE html>
<html lang="en">
<head>
    <meta charset="UTF-8">
    {head}
</head>
<body>
    {body}
</body>
</html>"#
    )
}

/// What the fake extractor does for one viewport
#[allow(dead_code)]
#[derive(Debug, Clone)]
pub enum FakeOutcome {
    /// Return this CSS
    Css(String),
    /// Return the aggregate CSS it was given
    Echo,
    /// Fail as if the page unloaded mid-run
    Unloaded,
    /// Fail with a non-recoverable error
    Fail(String),
}

/// In-memory extractor that records every request it receives
#[allow(dead_code)]
pub struct FakeExtractor {
    default: FakeOutcome,
    per_dimension: HashMap<Dimension, FakeOutcome>,
    pub requests: Mutex<Vec<ExtractionRequest>>,
}

#[allow(dead_code)]
impl FakeExtractor {
    pub fn new(default: FakeOutcome) -> Self {
        Self {
            default,
            per_dimension: HashMap::new(),
            requests: Mutex::new(Vec::new()),
        }
    }

    pub fn returning(css: &str) -> Self {
        Self::new(FakeOutcome::Css(css.to_string()))
    }

    pub fn with(mut self, dimension: Dimension, outcome: FakeOutcome) -> Self {
        self.per_dimension.insert(dimension, outcome);
        self
    }

    pub fn recorded(&self) -> Vec<ExtractionRequest> {
        self.requests.lock().unwrap().clone()
    }
}

impl CriticalExtractor for FakeExtractor {
    async fn extract(&self, request: ExtractionRequest) -> CriticalResult<String> {
        let outcome = self
            .per_dimension
            .get(&request.dimension)
            .unwrap_or(&self.default)
            .clone();
        let css = request.css.clone();
        self.requests.lock().unwrap().push(request);
        match outcome {
            FakeOutcome::Css(css) => Ok(css),
            FakeOutcome::Echo => Ok(css),
            FakeOutcome::Unloaded => Err(CriticalError::Extraction(format!(
                "{PAGE_UNLOADED_DURING_EXECUTION}: Execution context was destroyed"
            ))),
            FakeOutcome::Fail(message) => Err(CriticalError::Extraction(message)),
        }
    }
}
