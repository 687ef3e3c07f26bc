//! Azure client configuration

use cloudtools_core::config::{env_lookup, optional, required};
use cloudtools_core::ConfigurationError;
use reqwest::Url;

/// Environment variable holding the subscription id
pub const SUBSCRIPTION_ID_ENV: &str = "AZURE_SUBSCRIPTION_ID";

/// Environment variable overriding the Resource Manager endpoint
pub const ENDPOINT_ENV: &str = "AZURE_RESOURCE_MANAGER_ENDPOINT";

/// Public-cloud Resource Manager endpoint
pub const DEFAULT_ENDPOINT: &str = "https://management.azure.com";

/// Configuration for [`ResourceManagementClient`](crate::ResourceManagementClient)
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AzureConfig {
    /// Subscription the client operates in
    pub subscription_id: String,
    /// Resource Manager endpoint (public cloud unless overridden)
    pub endpoint: Url,
}

impl AzureConfig {
    /// Create a config for the public cloud
    ///
    /// # Errors
    ///
    /// Returns `ConfigurationError::MissingEnv` if the subscription id is blank
    pub fn new(subscription_id: impl Into<String>) -> Result<Self, ConfigurationError> {
        let subscription_id = subscription_id.into().trim().to_string();
        if subscription_id.is_empty() {
            return Err(ConfigurationError::MissingEnv(SUBSCRIPTION_ID_ENV.to_string()));
        }
        Ok(Self {
            subscription_id,
            endpoint: parse_endpoint(DEFAULT_ENDPOINT)?,
        })
    }

    /// Read the config from the process environment
    ///
    /// # Errors
    ///
    /// Returns `ConfigurationError` if `AZURE_SUBSCRIPTION_ID` is not set or
    /// the endpoint override is not an http(s) URL
    pub fn from_env() -> Result<Self, ConfigurationError> {
        Self::from_lookup(env_lookup)
    }

    /// Read the config through an arbitrary lookup
    ///
    /// # Errors
    ///
    /// Same as [`AzureConfig::from_env`]
    pub fn from_lookup<F>(lookup: F) -> Result<Self, ConfigurationError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let subscription_id = required(&lookup, SUBSCRIPTION_ID_ENV)?;
        let endpoint =
            optional(&lookup, ENDPOINT_ENV).unwrap_or_else(|| DEFAULT_ENDPOINT.to_string());

        Ok(Self {
            subscription_id,
            endpoint: parse_endpoint(&endpoint)?,
        })
    }

    /// Override the Resource Manager endpoint
    ///
    /// # Errors
    ///
    /// Returns `ConfigurationError::Invalid` if `endpoint` is not an http(s) URL
    pub fn with_endpoint(mut self, endpoint: &str) -> Result<Self, ConfigurationError> {
        self.endpoint = parse_endpoint(endpoint)?;
        Ok(self)
    }

    /// Audience to request tokens for
    #[must_use]
    pub fn token_resource(&self) -> String {
        format!("{}/", self.endpoint.as_str().trim_end_matches('/'))
    }
}

fn parse_endpoint(endpoint: &str) -> Result<Url, ConfigurationError> {
    let invalid = |reason: String| ConfigurationError::Invalid {
        name: ENDPOINT_ENV.to_string(),
        reason,
    };

    let url = Url::parse(endpoint).map_err(|e| invalid(e.to_string()))?;
    if url.scheme() != "https" && url.scheme() != "http" {
        return Err(invalid(format!("unsupported scheme '{}'", url.scheme())));
    }
    Ok(url)
}

#[cfg(test)]
#[allow(clippy::expect_used)] // Test code can use expect
mod tests {
    use super::*;

    #[test]
    fn test_from_lookup() {
        let config = AzureConfig::from_lookup(|name| {
            (name == SUBSCRIPTION_ID_ENV).then(|| "sub-123".to_string())
        })
        .expect("config");

        assert_eq!(config.subscription_id, "sub-123");
        assert_eq!(config.endpoint.as_str(), "https://management.azure.com/");
        assert_eq!(config.token_resource(), "https://management.azure.com/");
    }

    #[test]
    fn test_missing_subscription_id() {
        let err = AzureConfig::from_lookup(|_| None).expect_err("should fail");
        assert_eq!(
            err,
            ConfigurationError::MissingEnv("AZURE_SUBSCRIPTION_ID".to_string())
        );
    }

    #[test]
    fn test_endpoint_override() {
        let config = AzureConfig::from_lookup(|name| match name {
            SUBSCRIPTION_ID_ENV => Some("sub".to_string()),
            ENDPOINT_ENV => Some("https://management.usgovcloudapi.net".to_string()),
            _ => None,
        })
        .expect("config");

        assert_eq!(config.token_resource(), "https://management.usgovcloudapi.net/");
    }

    #[test]
    fn test_invalid_endpoint() {
        let err = AzureConfig::new("sub")
            .expect("config")
            .with_endpoint("ftp://example.com")
            .expect_err("should fail");
        assert!(matches!(err, ConfigurationError::Invalid { .. }));
    }

    #[test]
    fn test_new_rejects_blank() {
        assert!(AzureConfig::new("  ").is_err());
    }
}
