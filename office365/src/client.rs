//! Microsoft Graph client implementation

use crate::{
    error::GraphError,
    types::{Collection, ErrorEnvelope, Event, GraphEvent},
};
use chrono::{DateTime, SecondsFormat, Utc};
use cloudtools_azure::{AzureCliCredential, TokenCredential};
use cloudtools_core::config::{env_lookup, optional};
use cloudtools_core::ConfigurationError;
use reqwest::{Client, StatusCode, Url};
use std::sync::Arc;

/// Environment variable overriding the Graph endpoint
pub const ENDPOINT_ENV: &str = "GRAPH_ENDPOINT";

/// Environment variable selecting a mailbox other than the signed-in user's
pub const USER_ENV: &str = "O365_USER_ID";

/// Public-cloud Graph endpoint
pub const DEFAULT_ENDPOINT: &str = "https://graph.microsoft.com/v1.0";

/// Configuration for [`GraphClient`]
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GraphConfig {
    /// Graph endpoint including the version segment
    pub endpoint: Url,
    /// Mailbox to query; `None` means the signed-in user (`/me`)
    pub user: Option<String>,
}

impl Default for GraphConfig {
    #[allow(clippy::expect_used)]
    fn default() -> Self {
        Self {
            endpoint: Url::parse(DEFAULT_ENDPOINT).expect("default Graph endpoint is a valid URL"),
            user: None,
        }
    }
}

impl GraphConfig {
    /// Read the config from the process environment
    ///
    /// `GRAPH_ENDPOINT` overrides the endpoint and `O365_USER_ID` selects the
    /// mailbox (`/users/{id}` instead of `/me`); both are optional.
    ///
    /// # Errors
    ///
    /// Returns `ConfigurationError::Invalid` if `GRAPH_ENDPOINT` is not an
    /// http(s) URL
    pub fn from_env() -> Result<Self, ConfigurationError> {
        Self::from_lookup(env_lookup)
    }

    /// Read the config through an arbitrary lookup
    ///
    /// # Errors
    ///
    /// Same as [`GraphConfig::from_env`]
    pub fn from_lookup<F>(lookup: F) -> Result<Self, ConfigurationError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let mut config = Self {
            user: optional(&lookup, USER_ENV),
            ..Self::default()
        };
        if let Some(endpoint) = optional(&lookup, ENDPOINT_ENV) {
            config = config.with_endpoint(&endpoint)?;
        }
        Ok(config)
    }

    /// Override the Graph endpoint
    ///
    /// # Errors
    ///
    /// Returns `ConfigurationError::Invalid` if `endpoint` is not an http(s) URL
    pub fn with_endpoint(mut self, endpoint: &str) -> Result<Self, ConfigurationError> {
        let invalid = |reason: String| ConfigurationError::Invalid {
            name: ENDPOINT_ENV.to_string(),
            reason,
        };
        let url = Url::parse(endpoint).map_err(|e| invalid(e.to_string()))?;
        if url.scheme() != "https" && url.scheme() != "http" {
            return Err(invalid(format!("unsupported scheme '{}'", url.scheme())));
        }
        self.endpoint = url;
        Ok(self)
    }

    /// Audience to request tokens for
    #[must_use]
    pub fn token_resource(&self) -> String {
        format!("{}/", self.endpoint.origin().ascii_serialization())
    }
}

/// Build a Graph client using the Azure CLI login
#[must_use]
pub fn authenticate(config: &GraphConfig) -> GraphClient<AzureCliCredential> {
    GraphClient::new(config, AzureCliCredential::new())
}

/// Microsoft Graph client (calendar subset)
pub struct GraphClient<C = AzureCliCredential> {
    http: Client,
    credential: Arc<C>,
    endpoint: Url,
    user: Option<String>,
    token_resource: String,
}

impl<C> Clone for GraphClient<C> {
    fn clone(&self) -> Self {
        Self {
            http: self.http.clone(),
            credential: Arc::clone(&self.credential),
            endpoint: self.endpoint.clone(),
            user: self.user.clone(),
            token_resource: self.token_resource.clone(),
        }
    }
}

impl<C> std::fmt::Debug for GraphClient<C> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("GraphClient")
            .field("endpoint", &self.endpoint.as_str())
            .field("user", &self.user)
            .finish_non_exhaustive()
    }
}

impl<C: TokenCredential> GraphClient<C> {
    /// Create a client with an explicit credential
    #[must_use]
    pub fn new(config: &GraphConfig, credential: C) -> Self {
        Self {
            http: Client::new(),
            credential: Arc::new(credential),
            endpoint: config.endpoint.clone(),
            user: config.user.clone(),
            token_resource: config.token_resource(),
        }
    }

    /// Events overlapping `[start, end)`, ordered by start time
    ///
    /// Graph is asked to express event times in UTC. At most `top` events
    /// (the first page) are returned.
    ///
    /// # Errors
    ///
    /// Returns errors for credential, network, API, or parsing failures
    pub async fn calendar_view(
        &self,
        start: DateTime<Utc>,
        end: DateTime<Utc>,
        top: u32,
    ) -> Result<Vec<Event>, GraphError> {
        let url = self.url(&["calendarView"])?;
        let token = self.credential.get_token(&self.token_resource).await?;

        tracing::debug!(url = %url, %start, %end, top, "GET calendar view");

        let response = self
            .http
            .get(url)
            .query(&[
                ("startDateTime", start.to_rfc3339_opts(SecondsFormat::Secs, true)),
                ("endDateTime", end.to_rfc3339_opts(SecondsFormat::Secs, true)),
                ("$top", top.to_string()),
                ("$orderby", "start/dateTime".to_string()),
            ])
            .bearer_auth(&token.token)
            .header("prefer", "outlook.timezone=\"UTC\"")
            .header("accept", "application/json")
            .send()
            .await
            .map_err(|e| GraphError::RequestFailed(e.to_string()))?;

        match response.status() {
            StatusCode::OK => {
                let collection = response
                    .json::<Collection<GraphEvent>>()
                    .await
                    .map_err(|e| GraphError::ResponseParseFailed(e.to_string()))?;
                collection.value.into_iter().map(Event::try_from).collect()
            }
            StatusCode::TOO_MANY_REQUESTS => Err(GraphError::RateLimited),
            status => {
                let body = response.text().await.unwrap_or_default();
                let message = error_message(&body);
                tracing::warn!(status = status.as_u16(), %message, "Graph request failed");

                Err(match status {
                    StatusCode::UNAUTHORIZED | StatusCode::FORBIDDEN => {
                        GraphError::Unauthorized(message)
                    }
                    _ => GraphError::ApiError {
                        status: status.as_u16(),
                        message,
                    },
                })
            }
        }
    }

    fn url(&self, segments: &[&str]) -> Result<Url, GraphError> {
        let mut url = self.endpoint.clone();
        {
            let mut path = url
                .path_segments_mut()
                .map_err(|()| {
                    GraphError::RequestFailed("endpoint cannot be a base URL".to_string())
                })?;
            path.pop_if_empty();
            match &self.user {
                Some(user) => path.extend(["users", user.as_str()]),
                None => path.push("me"),
            };
            path.extend(segments);
        }
        Ok(url)
    }
}

fn error_message(body: &str) -> String {
    match serde_json::from_str::<ErrorEnvelope>(body) {
        Ok(envelope) if !envelope.error.code.is_empty() => {
            format!("{}: {}", envelope.error.code, envelope.error.message)
        }
        Ok(envelope) => envelope.error.message,
        Err(_) => body.to_string(),
    }
}

#[cfg(test)]
#[allow(clippy::expect_used)] // Test code can use expect
mod tests {
    use super::*;
    use chrono::TimeZone;
    use cloudtools_azure::StaticTokenCredential;
    use serde_json::json;
    use wiremock::matchers::{header, method, path, query_param};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    fn client_for(server: &MockServer, user: Option<&str>) -> GraphClient<StaticTokenCredential> {
        let config = GraphConfig {
            user: user.map(str::to_string),
            ..GraphConfig::default()
        }
        .with_endpoint(&server.uri())
        .expect("endpoint");
        GraphClient::new(&config, StaticTokenCredential::new("graph-token"))
    }

    fn window() -> (DateTime<Utc>, DateTime<Utc>) {
        (
            Utc.with_ymd_and_hms(2024, 5, 1, 0, 0, 0).single().expect("start"),
            Utc.with_ymd_and_hms(2024, 5, 8, 0, 0, 0).single().expect("end"),
        )
    }

    #[test]
    fn test_config_defaults() {
        let config = GraphConfig::from_lookup(|_| None).expect("config");
        assert_eq!(config.endpoint.as_str(), "https://graph.microsoft.com/v1.0");
        assert_eq!(config.token_resource(), "https://graph.microsoft.com/");
        assert!(config.user.is_none());
    }

    #[test]
    fn test_config_user_from_lookup() {
        let config = GraphConfig::from_lookup(|name| {
            (name == USER_ENV).then(|| " ada@example.com ".to_string())
        })
        .expect("config");
        assert_eq!(config.user.as_deref(), Some("ada@example.com"));

        let client = GraphClient::new(&config, StaticTokenCredential::new("t"));
        assert_eq!(
            client.url(&["calendarView"]).expect("url").as_str(),
            "https://graph.microsoft.com/v1.0/users/ada@example.com/calendarView"
        );
    }

    #[test]
    fn test_config_invalid_endpoint() {
        let err = GraphConfig::from_lookup(|name| {
            (name == ENDPOINT_ENV).then(|| "not a url".to_string())
        })
        .expect_err("should fail");
        assert!(matches!(err, ConfigurationError::Invalid { .. }));
    }

    #[test]
    fn test_url_for_default_endpoint() {
        let client = GraphClient::new(&GraphConfig::default(), StaticTokenCredential::new("t"));
        assert_eq!(
            client.url(&["calendarView"]).expect("url").as_str(),
            "https://graph.microsoft.com/v1.0/me/calendarView"
        );
    }

    #[tokio::test]
    async fn test_calendar_view() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/me/calendarView"))
            .and(query_param("startDateTime", "2024-05-01T00:00:00Z"))
            .and(query_param("endDateTime", "2024-05-08T00:00:00Z"))
            .and(query_param("$top", "3"))
            .and(header("authorization", "Bearer graph-token"))
            .and(header("prefer", "outlook.timezone=\"UTC\""))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({
                "value": [{
                    "id": "AAMk1",
                    "subject": "Standup",
                    "body": {"contentType": "html", "content": "<div>Daily</div>"},
                    "start": {"dateTime": "2024-05-02T09:00:00.0000000", "timeZone": "UTC"},
                    "end": {"dateTime": "2024-05-02T09:15:00.0000000", "timeZone": "UTC"},
                    "organizer": {
                        "emailAddress": {"name": "Grace", "address": "grace@example.com"}
                    },
                    "lastModifiedDateTime": "2024-04-30T10:00:00Z"
                }]
            })))
            .expect(1)
            .mount(&server)
            .await;

        let (start, end) = window();
        let events = client_for(&server, None)
            .calendar_view(start, end, 3)
            .await
            .expect("events");
        assert_eq!(events.len(), 1);
        assert_eq!(events[0].subject, "Standup");
        assert_eq!(events[0].organizer, "Grace <grace@example.com>");
    }

    #[tokio::test]
    async fn test_calendar_view_for_user() {
        let server = MockServer::start().await;
        Mock::given(path("/users/ada@example.com/calendarView"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({"value": []})))
            .expect(1)
            .mount(&server)
            .await;

        let (start, end) = window();
        let events = client_for(&server, Some("ada@example.com"))
            .calendar_view(start, end, 10)
            .await
            .expect("events");
        assert!(events.is_empty());
    }

    #[tokio::test]
    async fn test_calendar_view_unauthorized() {
        let server = MockServer::start().await;
        Mock::given(path("/me/calendarView"))
            .respond_with(ResponseTemplate::new(401).set_body_json(json!({
                "error": {"code": "InvalidAuthenticationToken", "message": "Access token is empty."}
            })))
            .mount(&server)
            .await;

        let (start, end) = window();
        let err = client_for(&server, None)
            .calendar_view(start, end, 10)
            .await
            .expect_err("should fail");
        assert!(matches!(
            err,
            GraphError::Unauthorized(ref m) if m.starts_with("InvalidAuthenticationToken")
        ));
    }
}
