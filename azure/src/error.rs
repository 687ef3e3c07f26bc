//! Error types for the Azure client

use thiserror::Error;

/// Errors raised while acquiring an access token
#[derive(Debug, Clone, Error)]
pub enum CredentialError {
    /// The Azure CLI could not be started (not installed, not on `PATH`)
    #[error("Azure CLI not available: {0}")]
    CliUnavailable(String),

    /// The Azure CLI ran but reported a failure (typically: not logged in)
    #[error("Azure CLI failed (exit code {code:?}): {stderr}")]
    CliFailed {
        /// Process exit code, if the process exited normally
        code: Option<i32>,
        /// Captured standard error
        stderr: String,
    },

    /// The Azure CLI output could not be understood
    #[error("Unexpected Azure CLI output: {0}")]
    InvalidOutput(String),
}

/// Errors that can occur when calling Azure Resource Manager
#[derive(Debug, Error)]
pub enum AzureError {
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

    /// The addressed scope or resource does not exist
    #[error("Not found: {0}")]
    NotFound(String),

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
