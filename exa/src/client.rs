//! Exa API client implementation

use crate::{
    error::ExaError,
    types::{FindSimilarRequest, SearchRequest, SearchResponse},
};
use cloudtools_core::config::{env_lookup, optional, required};
use cloudtools_core::ConfigurationError;
use reqwest::{Client, StatusCode, Url};
use serde::Serialize;

/// Environment variable holding the API key
pub const API_KEY_ENV: &str = "EXA_API_KEY";

/// Environment variable overriding the API endpoint
pub const ENDPOINT_ENV: &str = "EXA_API_URL";

/// Public Exa endpoint
pub const DEFAULT_ENDPOINT: &str = "https://api.exa.ai";

/// Exa API client
#[derive(Clone)]
pub struct ExaClient {
    client: Client,
    api_key: String,
    api_url: String,
}

impl std::fmt::Debug for ExaClient {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ExaClient")
            .field("api_url", &self.api_url)
            .finish_non_exhaustive()
    }
}

impl ExaClient {
    /// Create a new client with API key from environment
    ///
    /// # Errors
    ///
    /// Returns `ConfigurationError::MissingEnv` if `EXA_API_KEY` is not set
    pub fn from_env() -> Result<Self, ConfigurationError> {
        Self::from_lookup(env_lookup)
    }

    /// Create a client through an arbitrary lookup
    ///
    /// # Errors
    ///
    /// Same as [`ExaClient::from_env`], plus `ConfigurationError::Invalid` for
    /// an unusable endpoint override
    pub fn from_lookup<F>(lookup: F) -> Result<Self, ConfigurationError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let api_key = required(&lookup, API_KEY_ENV)?;
        let client = Self::new(api_key);
        match optional(&lookup, ENDPOINT_ENV) {
            Some(endpoint) => client.with_api_url(&endpoint),
            None => Ok(client),
        }
    }

    /// Create a new client with explicit API key
    #[must_use]
    pub fn new(api_key: String) -> Self {
        Self {
            client: Client::new(),
            api_key,
            api_url: DEFAULT_ENDPOINT.to_string(),
        }
    }

    /// Point the client at another endpoint
    ///
    /// # Errors
    ///
    /// Returns `ConfigurationError::Invalid` if `api_url` is not an http(s) URL
    pub fn with_api_url(mut self, api_url: &str) -> Result<Self, ConfigurationError> {
        let invalid = |reason: String| ConfigurationError::Invalid {
            name: ENDPOINT_ENV.to_string(),
            reason,
        };
        let url = Url::parse(api_url).map_err(|e| invalid(e.to_string()))?;
        if url.scheme() != "https" && url.scheme() != "http" {
            return Err(invalid(format!("unsupported scheme '{}'", url.scheme())));
        }
        self.api_url = api_url.trim_end_matches('/').to_string();
        Ok(self)
    }

    /// Search and fetch contents for the results
    ///
    /// # Errors
    ///
    /// Returns errors for network failures, API errors, or parsing failures
    pub async fn search_and_contents(
        &self,
        request: &SearchRequest,
    ) -> Result<SearchResponse, ExaError> {
        self.post("search", request).await
    }

    /// Find pages similar to a URL and fetch their contents
    ///
    /// # Errors
    ///
    /// Returns errors for network failures, API errors, or parsing failures
    pub async fn find_similar_and_contents(
        &self,
        request: &FindSimilarRequest,
    ) -> Result<SearchResponse, ExaError> {
        self.post("findSimilar", request).await
    }

    async fn post<B: Serialize + Sync>(
        &self,
        operation: &str,
        body: &B,
    ) -> Result<SearchResponse, ExaError> {
        tracing::debug!(operation, "POST Exa");

        let response = self
            .client
            .post(format!("{}/{operation}", self.api_url))
            .header("x-api-key", &self.api_key)
            .header("content-type", "application/json")
            .json(body)
            .send()
            .await
            .map_err(|e| ExaError::RequestFailed(e.to_string()))?;

        match response.status() {
            StatusCode::OK => response
                .json::<SearchResponse>()
                .await
                .map_err(|e| ExaError::ResponseParseFailed(e.to_string())),
            StatusCode::TOO_MANY_REQUESTS => Err(ExaError::RateLimited),
            StatusCode::UNAUTHORIZED | StatusCode::FORBIDDEN => Err(ExaError::Unauthorized),
            status => {
                let message = response.text().await.unwrap_or_default();
                tracing::warn!(status = status.as_u16(), %message, "Exa request failed");
                Err(ExaError::ApiError {
                    status: status.as_u16(),
                    message,
                })
            }
        }
    }
}
