//! Error types for the search tools

use crate::schema::ValidationError;
use cloudtools_core::ToolError;
use std::time::Duration;
use thiserror::Error;

/// Why a search tool invocation failed
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum SearchError {
    /// Input rejected before any remote call
    #[error(transparent)]
    Validation(#[from] ValidationError),

    /// The remote service (or its credential) failed
    #[error("Remote call failed: {0}")]
    Remote(String),

    /// The remote call did not finish in time
    #[error("Remote call timed out after {0:?}")]
    Timeout(Duration),

    /// The normalized records could not be serialized
    #[error("Failed to serialize results: {0}")]
    Serialization(String),
}

impl SearchError {
    /// Wrap any remote client error
    pub fn remote(error: impl std::fmt::Display) -> Self {
        Self::Remote(error.to_string())
    }
}

impl From<SearchError> for ToolError {
    fn from(error: SearchError) -> Self {
        Self::new(error.to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_into_tool_error() {
        let err: ToolError = SearchError::from(ValidationError::EmptyField("query")).into();
        assert_eq!(err.message, "'query' must not be empty");

        let err: ToolError = SearchError::remote("Unauthorized: token expired").into();
        assert_eq!(err.message, "Remote call failed: Unauthorized: token expired");

        let err: ToolError = SearchError::Timeout(Duration::from_secs(30)).into();
        assert_eq!(err.message, "Remote call timed out after 30s");
    }
}
