//! Remote capabilities the search tools depend on
//!
//! Each tool is generic over the narrow capability it needs rather than over a
//! concrete client, so the same tool runs against the real clients from the
//! `cloudtools-*` crates and against the in-memory sources in [`crate::mock`].
//!
//! **Edition 2024**: Uses RPITIT (Return Position Impl Trait In Traits)

use chrono::{DateTime, Utc};
use cloudtools_azure::{
    AzureError, GenericResource, ResourceGroup, ResourceManagementClient, TokenCredential,
    Workflow,
};
use cloudtools_exa::{ExaClient, ExaError, FindSimilarRequest, SearchRequest, SearchResponse};
use cloudtools_office365::{Event, GraphClient, GraphError};
use std::fmt::Display;
use std::future::Future;

/// Resource groups and the generic resources inside them
pub trait ResourceSource: Send + Sync {
    /// Error reported by the remote service
    type Error: Display + Send;

    /// Look up a resource group by name
    fn resource_group(
        &self,
        name: &str,
    ) -> impl Future<Output = Result<ResourceGroup, Self::Error>> + Send;

    /// List the resources in a resource group, in service order
    fn list_resources(
        &self,
        resource_group: &str,
    ) -> impl Future<Output = Result<Vec<GenericResource>, Self::Error>> + Send;
}

/// Logic Apps workflows
pub trait WorkflowSource: Send + Sync {
    /// Error reported by the remote service
    type Error: Display + Send;

    /// List the workflows in a resource group; `top` caps the page size
    fn list_workflows(
        &self,
        resource_group: &str,
        top: Option<u32>,
    ) -> impl Future<Output = Result<Vec<Workflow>, Self::Error>> + Send;
}

/// Calendar events
pub trait EventSource: Send + Sync {
    /// Error reported by the remote service
    type Error: Display + Send;

    /// Events overlapping `[start, end)`, ordered by start, at most `top`
    fn calendar_view(
        &self,
        start: DateTime<Utc>,
        end: DateTime<Utc>,
        top: u32,
    ) -> impl Future<Output = Result<Vec<Event>, Self::Error>> + Send;
}

/// Exa web search
pub trait ExaSource: Send + Sync {
    /// Error reported by the remote service
    type Error: Display + Send;

    /// Search by query
    fn search(
        &self,
        request: &SearchRequest,
    ) -> impl Future<Output = Result<SearchResponse, Self::Error>> + Send;

    /// Find pages similar to a URL
    fn find_similar(
        &self,
        request: &FindSimilarRequest,
    ) -> impl Future<Output = Result<SearchResponse, Self::Error>> + Send;
}

impl<C: TokenCredential> ResourceSource for ResourceManagementClient<C> {
    type Error = AzureError;

    fn resource_group(
        &self,
        name: &str,
    ) -> impl Future<Output = Result<ResourceGroup, Self::Error>> + Send {
        self.get_resource_group(name)
    }

    fn list_resources(
        &self,
        resource_group: &str,
    ) -> impl Future<Output = Result<Vec<GenericResource>, Self::Error>> + Send {
        self.list_resources_by_group(resource_group, None)
    }
}

impl<C: TokenCredential> WorkflowSource for ResourceManagementClient<C> {
    type Error = AzureError;

    fn list_workflows(
        &self,
        resource_group: &str,
        top: Option<u32>,
    ) -> impl Future<Output = Result<Vec<Workflow>, Self::Error>> + Send {
        ResourceManagementClient::list_workflows(self, resource_group, top)
    }
}

impl<C: TokenCredential> EventSource for GraphClient<C> {
    type Error = GraphError;

    fn calendar_view(
        &self,
        start: DateTime<Utc>,
        end: DateTime<Utc>,
        top: u32,
    ) -> impl Future<Output = Result<Vec<Event>, Self::Error>> + Send {
        GraphClient::calendar_view(self, start, end, top)
    }
}

impl ExaSource for ExaClient {
    type Error = ExaError;

    fn search(
        &self,
        request: &SearchRequest,
    ) -> impl Future<Output = Result<SearchResponse, Self::Error>> + Send {
        self.search_and_contents(request)
    }

    fn find_similar(
        &self,
        request: &FindSimilarRequest,
    ) -> impl Future<Output = Result<SearchResponse, Self::Error>> + Send {
        self.find_similar_and_contents(request)
    }
}
