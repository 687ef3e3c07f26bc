//! Per-tool configuration and timeout handling for remote calls
//!
//! Remote calls are never retried. Each call is bounded by
//! [`ToolConfig::timeout`]; hitting it yields [`SearchError::Timeout`].

use crate::error::SearchError;
use crate::normalize::DEFAULT_TRUNCATE_LIMIT;
use std::fmt::Display;
use std::future::Future;
use std::time::Duration;

/// Default bound on a single remote call
pub const DEFAULT_TIMEOUT: Duration = Duration::from_secs(30);

/// Tool configuration shared by every invocation of a tool
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ToolConfig {
    /// Maximum time a remote call may take
    pub timeout: Duration,
    /// Character limit for free-text fields when truncation is requested
    pub truncate_limit: usize,
}

impl Default for ToolConfig {
    fn default() -> Self {
        Self {
            timeout: DEFAULT_TIMEOUT,
            truncate_limit: DEFAULT_TRUNCATE_LIMIT,
        }
    }
}

impl ToolConfig {
    /// Set timeout duration
    #[must_use]
    pub const fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    /// Set the truncation limit
    #[must_use]
    pub const fn with_truncate_limit(mut self, truncate_limit: usize) -> Self {
        self.truncate_limit = truncate_limit;
        self
    }
}

/// Run one remote call under the configured timeout
///
/// ## Example
///
/// ```ignore
/// let config = ToolConfig::default().with_timeout(Duration::from_secs(5));
/// let resources = execute_with_timeout(&config, source.list_resources("rg-1", None)).await?;
/// ```
///
/// # Errors
///
/// Returns `SearchError::Timeout` if the call outlives the timeout, and
/// `SearchError::Remote` if it fails
pub async fn execute_with_timeout<T, E, Fut>(
    config: &ToolConfig,
    call: Fut,
) -> Result<T, SearchError>
where
    Fut: Future<Output = Result<T, E>>,
    E: Display,
{
    match tokio::time::timeout(config.timeout, call).await {
        Ok(Ok(value)) => Ok(value),
        Ok(Err(e)) => {
            tracing::warn!(error = %e, "remote call failed");
            Err(SearchError::remote(e))
        }
        Err(_) => {
            tracing::warn!(timeout = ?config.timeout, "remote call timed out");
            Err(SearchError::Timeout(config.timeout))
        }
    }
}

#[cfg(test)]
#[allow(clippy::expect_used)] // Test code can use expect
mod tests {
    use super::*;
    use cloudtools_core::ToolError;
    use std::sync::atomic::{AtomicU32, Ordering};
    use std::sync::Arc;

    #[test]
    fn test_tool_config_default() {
        let config = ToolConfig::default();
        assert_eq!(config.timeout, Duration::from_secs(30));
        assert_eq!(config.truncate_limit, 150);
    }

    #[test]
    fn test_tool_config_builders() {
        let config = ToolConfig::default()
            .with_timeout(Duration::from_secs(60))
            .with_truncate_limit(40);
        assert_eq!(config.timeout, Duration::from_secs(60));
        assert_eq!(config.truncate_limit, 40);
    }

    #[tokio::test]
    async fn test_execute_success() {
        let config = ToolConfig::default();
        let result = execute_with_timeout(&config, async { Ok::<_, String>(7) }).await;
        assert_eq!(result, Ok(7));
    }

    #[tokio::test]
    async fn test_execute_failure_is_not_retried() {
        let config = ToolConfig::default();
        let counter = Arc::new(AtomicU32::new(0));
        let calls = Arc::clone(&counter);

        let result = execute_with_timeout(&config, async move {
            calls.fetch_add(1, Ordering::SeqCst);
            Err::<(), _>("service unavailable")
        })
        .await;

        assert_eq!(result, Err(SearchError::Remote("service unavailable".to_string())));
        assert_eq!(counter.load(Ordering::SeqCst), 1);
    }

    #[tokio::test(start_paused = true)]
    async fn test_execute_timeout() {
        let config = ToolConfig::default().with_timeout(Duration::from_millis(50));

        let result = execute_with_timeout(&config, async {
            tokio::time::sleep(Duration::from_secs(10)).await;
            Ok::<_, String>("too late")
        })
        .await;

        assert_eq!(result, Err(SearchError::Timeout(Duration::from_millis(50))));
        assert!(
            ToolError::from(result.expect_err("should time out"))
                .message
                .contains("timed out")
        );
    }
}
