//! Timeout wrapper for extraction and browser operations

use std::future::Future;
use std::time::Duration;

use crate::error::{CriticalError, CriticalResult};

/// Run `operation` bounded by `limit`
///
/// A timeout is reported as an extraction error naming the operation.
pub async fn with_timeout<F, T>(operation: F, limit: Duration, operation_name: &str) -> CriticalResult<T>
where
    F: Future<Output = CriticalResult<T>>,
{
    match tokio::time::timeout(limit, operation).await {
        Ok(result) => result,
        Err(_) => Err(CriticalError::Extraction(format!(
            "{operation_name} timeout after {} seconds",
            limit.as_secs_f64()
        ))),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn reports_elapsed_limit() {
        let result: CriticalResult<()> = with_timeout(
            async {
                tokio::time::sleep(Duration::from_secs(5)).await;
                Ok(())
            },
            Duration::from_millis(10),
            "Extraction",
        )
        .await;
        let err = result.unwrap_err().to_string();
        assert!(err.contains("Extraction timeout"), "{err}");
    }

    #[tokio::test]
    async fn passes_through_results() {
        let value = with_timeout(async { Ok(7) }, Duration::from_secs(1), "noop").await.unwrap();
        assert_eq!(value, 7);
    }
}
