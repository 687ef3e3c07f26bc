//! Construction-time configuration errors and environment lookups
//!
//! Clients are configured from explicit structs. Each config type offers a
//! `from_env()` constructor for convenience and a `from_lookup()` constructor
//! taking any `Fn(&str) -> Option<String>`, so tests inject values without
//! touching the process environment.

use thiserror::Error;

/// Required configuration is missing or malformed
///
/// Raised while building a client or tool, before any invocation. Callers are
/// expected to surface it rather than swallow it.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ConfigurationError {
    /// A required environment variable is not set (or is blank)
    #[error("The '{0}' environment variable is not set")]
    MissingEnv(String),

    /// A variable is set but its value is unusable
    #[error("Invalid value for '{name}': {reason}")]
    Invalid {
        /// Variable or setting name
        name: String,
        /// Why the value was rejected
        reason: String,
    },
}

/// Read a required value, treating blank strings as missing
///
/// # Errors
///
/// Returns [`ConfigurationError::MissingEnv`] when the lookup yields nothing
/// or only whitespace.
pub fn required<F>(lookup: &F, name: &str) -> Result<String, ConfigurationError>
where
    F: Fn(&str) -> Option<String>,
{
    optional(lookup, name).ok_or_else(|| ConfigurationError::MissingEnv(name.to_string()))
}

/// Read an optional value, treating blank strings as absent
pub fn optional<F>(lookup: &F, name: &str) -> Option<String>
where
    F: Fn(&str) -> Option<String>,
{
    lookup(name)
        .map(|value| value.trim().to_string())
        .filter(|value| !value.is_empty())
}

/// Lookup backed by the process environment
#[must_use]
pub fn env_lookup(name: &str) -> Option<String> {
    std::env::var(name).ok()
}
