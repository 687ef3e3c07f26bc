//! Resource Manager client implementation

use crate::{
    config::AzureConfig,
    credential::{AzureCliCredential, TokenCredential},
    error::AzureError,
    types::{ErrorEnvelope, GenericResource, Page, ResourceGroup, Workflow},
};
use reqwest::{Client, StatusCode, Url};
use serde::de::DeserializeOwned;
use std::sync::Arc;

/// API version for resource groups and generic resources
pub const RESOURCES_API_VERSION: &str = "2021-04-01";

/// API version for Logic Apps workflows
pub const LOGIC_API_VERSION: &str = "2019-05-01";

/// Build a client for the configured subscription using the Azure CLI login
///
/// No process is started and no request is sent until the first call.
#[must_use]
pub fn authenticate(config: &AzureConfig) -> ResourceManagementClient<AzureCliCredential> {
    ResourceManagementClient::new(config, AzureCliCredential::new())
}

/// Azure Resource Manager client
///
/// Cloning is cheap; clones share the HTTP connection pool and the credential
/// (and therefore its token cache).
pub struct ResourceManagementClient<C = AzureCliCredential> {
    http: Client,
    credential: Arc<C>,
    subscription_id: String,
    endpoint: Url,
    token_resource: String,
}

impl<C> Clone for ResourceManagementClient<C> {
    fn clone(&self) -> Self {
        Self {
            http: self.http.clone(),
            credential: Arc::clone(&self.credential),
            subscription_id: self.subscription_id.clone(),
            endpoint: self.endpoint.clone(),
            token_resource: self.token_resource.clone(),
        }
    }
}

impl<C> std::fmt::Debug for ResourceManagementClient<C> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ResourceManagementClient")
            .field("subscription_id", &self.subscription_id)
            .field("endpoint", &self.endpoint.as_str())
            .finish_non_exhaustive()
    }
}

impl<C: TokenCredential> ResourceManagementClient<C> {
    /// Create a client with an explicit credential
    #[must_use]
    pub fn new(config: &AzureConfig, credential: C) -> Self {
        Self {
            http: Client::new(),
            credential: Arc::new(credential),
            subscription_id: config.subscription_id.clone(),
            endpoint: config.endpoint.clone(),
            token_resource: config.token_resource(),
        }
    }

    /// Subscription this client operates in
    #[must_use]
    pub fn subscription_id(&self) -> &str {
        &self.subscription_id
    }

    /// Get a resource group by name
    ///
    /// # Errors
    ///
    /// Returns `AzureError::NotFound` if the group does not exist, or other
    /// errors for credential, network, API, or parsing failures
    pub async fn get_resource_group(&self, name: &str) -> Result<ResourceGroup, AzureError> {
        let url = self.url(&["resourcegroups", name])?;
        self.get_json(url, &[("api-version", RESOURCES_API_VERSION.to_string())])
            .await
    }

    /// List the resources in a resource group
    ///
    /// Creation and change times are requested so they can be reported. Only
    /// the first page is returned.
    ///
    /// # Errors
    ///
    /// Returns errors for credential, network, API, or parsing failures
    pub async fn list_resources_by_group(
        &self,
        resource_group: &str,
        top: Option<u32>,
    ) -> Result<Vec<GenericResource>, AzureError> {
        let url = self.url(&["resourceGroups", resource_group, "resources"])?;
        let mut query = vec![
            ("api-version", RESOURCES_API_VERSION.to_string()),
            ("$expand", "createdTime,changedTime".to_string()),
        ];
        if let Some(top) = top {
            query.push(("$top", top.to_string()));
        }

        let page: Page<GenericResource> = self.get_json(url, &query).await?;
        Ok(page.value)
    }

    /// List the Logic Apps workflows in a resource group
    ///
    /// # Errors
    ///
    /// Returns errors for credential, network, API, or parsing failures
    pub async fn list_workflows(
        &self,
        resource_group: &str,
        top: Option<u32>,
    ) -> Result<Vec<Workflow>, AzureError> {
        let url = self.url(&[
            "resourceGroups",
            resource_group,
            "providers",
            "Microsoft.Logic",
            "workflows",
        ])?;
        let mut query = vec![("api-version", LOGIC_API_VERSION.to_string())];
        if let Some(top) = top {
            query.push(("$top", top.to_string()));
        }

        let page: Page<Workflow> = self.get_json(url, &query).await?;
        Ok(page.value)
    }

    /// Subscription-scoped URL with percent-encoded path segments
    fn url(&self, segments: &[&str]) -> Result<Url, AzureError> {
        let mut url = self.endpoint.clone();
        url.path_segments_mut()
            .map_err(|()| AzureError::RequestFailed("endpoint cannot be a base URL".to_string()))?
            .pop_if_empty()
            .extend(["subscriptions", self.subscription_id.as_str()])
            .extend(segments);
        Ok(url)
    }

    async fn get_json<T: DeserializeOwned>(
        &self,
        url: Url,
        query: &[(&str, String)],
    ) -> Result<T, AzureError> {
        let token = self.credential.get_token(&self.token_resource).await?;

        tracing::debug!(url = %url, "GET Resource Manager");

        let response = self
            .http
            .get(url)
            .query(query)
            .bearer_auth(&token.token)
            .header("accept", "application/json")
            .send()
            .await
            .map_err(|e| AzureError::RequestFailed(e.to_string()))?;

        match response.status() {
            StatusCode::OK => response
                .json::<T>()
                .await
                .map_err(|e| AzureError::ResponseParseFailed(e.to_string())),
            StatusCode::TOO_MANY_REQUESTS => Err(AzureError::RateLimited),
            status => {
                let body = response.text().await.unwrap_or_default();
                let message = error_message(&body);
                tracing::warn!(
                    status = status.as_u16(),
                    %message,
                    "Resource Manager request failed"
                );

                Err(match status {
                    StatusCode::UNAUTHORIZED | StatusCode::FORBIDDEN => {
                        AzureError::Unauthorized(message)
                    }
                    StatusCode::NOT_FOUND => AzureError::NotFound(message),
                    _ => AzureError::ApiError {
                        status: status.as_u16(),
                        message,
                    },
                })
            }
        }
    }
}

/// Prefer the structured `{"error": {"code", "message"}}` body when present
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
    use crate::credential::StaticTokenCredential;
    use serde_json::json;
    use wiremock::matchers::{header, method, path, query_param};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    async fn client_for(server: &MockServer) -> ResourceManagementClient<StaticTokenCredential> {
        let config = AzureConfig::new("sub-1")
            .expect("config")
            .with_endpoint(&server.uri())
            .expect("endpoint");
        ResourceManagementClient::new(&config, StaticTokenCredential::new("token-1"))
    }

    #[test]
    fn test_authenticate_is_lazy() {
        let config = AzureConfig::new("sub-1").expect("config");
        let client = authenticate(&config);
        assert_eq!(client.subscription_id(), "sub-1");
    }

    #[test]
    fn test_url_encodes_segments() {
        let config = AzureConfig::new("sub-1").expect("config");
        let client = ResourceManagementClient::new(&config, StaticTokenCredential::new("t"));

        let url = client.url(&["resourcegroups", "rg (test)"]).expect("url");
        assert_eq!(
            url.as_str(),
            "https://management.azure.com/subscriptions/sub-1/resourcegroups/rg%20(test)"
        );
    }

    #[test]
    fn test_error_message() {
        let body = r#"{"error": {
            "code": "ResourceGroupNotFound",
            "message": "Resource group 'x' could not be found."
        }}"#;
        assert_eq!(
            error_message(body),
            "ResourceGroupNotFound: Resource group 'x' could not be found."
        );
        assert_eq!(error_message("plain text"), "plain text");
    }

    #[tokio::test]
    async fn test_get_resource_group() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/subscriptions/sub-1/resourcegroups/rg-1"))
            .and(query_param("api-version", RESOURCES_API_VERSION))
            .and(header("authorization", "Bearer token-1"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({
                "id": "/subscriptions/sub-1/resourceGroups/rg-1",
                "name": "rg-1",
                "location": "westeurope"
            })))
            .expect(1)
            .mount(&server)
            .await;

        let group = client_for(&server)
            .await
            .get_resource_group("rg-1")
            .await
            .expect("group");
        assert_eq!(group.name, "rg-1");
        assert_eq!(group.location, "westeurope");
    }

    #[tokio::test]
    async fn test_get_resource_group_not_found() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/subscriptions/sub-1/resourcegroups/missing"))
            .respond_with(ResponseTemplate::new(404).set_body_json(json!({
                "error": {"code": "ResourceGroupNotFound", "message": "not found"}
            })))
            .mount(&server)
            .await;

        let err = client_for(&server)
            .await
            .get_resource_group("missing")
            .await
            .expect_err("should fail");
        assert!(matches!(err, AzureError::NotFound(ref m) if m.contains("ResourceGroupNotFound")));
    }

    #[tokio::test]
    async fn test_list_resources_by_group() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/subscriptions/sub-1/resourceGroups/rg-1/resources"))
            .and(query_param("api-version", RESOURCES_API_VERSION))
            .and(query_param("$expand", "createdTime,changedTime"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({
                "value": [
                    {
                        "id": "/subscriptions/sub-1/resourceGroups/rg-1/providers/Microsoft.Logic/workflows/a",
                        "name": "a",
                        "type": "Microsoft.Logic/workflows",
                        "location": "westeurope",
                        "createdTime": "2024-03-01T08:00:00Z"
                    },
                    {
                        "id": "/subscriptions/sub-1/resourceGroups/rg-1/providers/Microsoft.Web/sites/b",
                        "name": "b",
                        "type": "Microsoft.Web/sites"
                    }
                ]
            })))
            .mount(&server)
            .await;

        let resources = client_for(&server)
            .await
            .list_resources_by_group("rg-1", None)
            .await
            .expect("resources");
        assert_eq!(resources.len(), 2);
        assert_eq!(resources[0].resource_type, "Microsoft.Logic/workflows");
        assert!(resources[1].created_time.is_none());
    }

    #[tokio::test]
    async fn test_list_workflows_with_top() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path(
                "/subscriptions/sub-1/resourceGroups/rg-1/providers/Microsoft.Logic/workflows",
            ))
            .and(query_param("api-version", LOGIC_API_VERSION))
            .and(query_param("$top", "5"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({
                "value": [{
                    "id": "/subscriptions/sub-1/resourceGroups/rg-1/providers/Microsoft.Logic/workflows/wf",
                    "name": "wf",
                    "location": "westeurope",
                    "properties": {"state": "Enabled", "version": "08585"}
                }]
            })))
            .mount(&server)
            .await;

        let workflows = client_for(&server)
            .await
            .list_workflows("rg-1", Some(5))
            .await
            .expect("workflows");
        assert_eq!(workflows.len(), 1);
        assert_eq!(workflows[0].properties.version.as_deref(), Some("08585"));
    }

    #[tokio::test]
    async fn test_status_mapping() {
        let server = MockServer::start().await;
        Mock::given(path("/subscriptions/sub-1/resourcegroups/throttled"))
            .respond_with(ResponseTemplate::new(429))
            .mount(&server)
            .await;
        Mock::given(path("/subscriptions/sub-1/resourcegroups/forbidden"))
            .respond_with(ResponseTemplate::new(403).set_body_string("denied"))
            .mount(&server)
            .await;
        Mock::given(path("/subscriptions/sub-1/resourcegroups/broken"))
            .respond_with(ResponseTemplate::new(500).set_body_string("boom"))
            .mount(&server)
            .await;

        let client = client_for(&server).await;

        let throttled = client.get_resource_group("throttled").await.expect_err("429");
        assert!(matches!(throttled, AzureError::RateLimited));

        let forbidden = client.get_resource_group("forbidden").await.expect_err("403");
        assert!(matches!(forbidden, AzureError::Unauthorized(ref m) if m == "denied"));

        let broken = client.get_resource_group("broken").await.expect_err("500");
        assert!(matches!(broken, AzureError::ApiError { status: 500, .. }));
    }

    #[tokio::test]
    async fn test_malformed_body() {
        let server = MockServer::start().await;
        Mock::given(path("/subscriptions/sub-1/resourcegroups/rg-1"))
            .respond_with(ResponseTemplate::new(200).set_body_string("not json"))
            .mount(&server)
            .await;

        let err = client_for(&server)
            .await
            .get_resource_group("rg-1")
            .await
            .expect_err("should fail");
        assert!(matches!(err, AzureError::ResponseParseFailed(_)));
    }
}
