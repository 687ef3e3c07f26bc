//! Error types for the Graph client

use cloudtools_azure::CredentialError;
use thiserror::Error;

/// Errors that can occur when calling Microsoft Graph
#[derive(Debug, Error)]
pub enum GraphError {
    /// No access token could be obtained
    #[error("Authentication failed: {0}")]
    Credential(#[from] CredentialError),

    /// HTTP request failed before a response arrived
    #[error("Request failed: {0}")]
    RequestFailed(String),

    /// Response parsing failed
    #[error("Response parsing failed: {0}")]
    ResponseParseFailed(String),

    /// Unauthorized or forbidden
    #[error("Unauthorized: {0}")]
    Unauthorized(String),

    /// Throttled - too many requests
    #[error("Rate limited - too many requests")]
    RateLimited,

    /// API returned an error
    #[error("API error (status {status}): {message}")]
    ApiError {
        /// HTTP status code
        status: u16,
        /// Error message from API
        message: String,
    },
}
