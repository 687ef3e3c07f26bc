//! In-memory sources for testing and demonstration
//!
//! These implement the capability traits in [`crate::source`] without any
//! network access:
//! - [`InMemoryAzure`]: resource groups, resources and workflows
//! - [`InMemoryCalendar`]: calendar events
//! - [`InMemoryExa`]: canned search results
//! - [`FailingSource`]: every call fails with a fixed message
//! - [`StalledSource`]: every call hangs forever (for timeout tests)
//!
//! Each in-memory source counts the calls it receives, so tests can assert
//! that rejected input never reached the remote side.

use crate::source::{EventSource, ExaSource, ResourceSource, WorkflowSource};
use chrono::{DateTime, TimeDelta, Utc};
use cloudtools_azure::{GenericResource, ResourceGroup, Workflow, WorkflowProperties};
use cloudtools_exa::{ExaResult, FindSimilarRequest, SearchRequest, SearchResponse};
use cloudtools_office365::Event;
use serde_json::json;
use std::collections::HashMap;
use std::future::{pending, ready, Future};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Mutex;
use thiserror::Error;

/// Subscription used in generated resource ids
pub const MOCK_SUBSCRIPTION_ID: &str = "00000000-0000-0000-0000-000000000000";

/// 2024-03-01T08:00:00Z
const BASE_TIMESTAMP: i64 = 1_709_280_000;

/// Errors produced by the mock sources
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum MockError {
    /// Unknown resource group
    #[error("ResourceGroupNotFound: Resource group '{0}' could not be found.")]
    GroupNotFound(String),

    /// Injected failure
    #[error("{0}")]
    Failed(String),
}

fn base_time() -> DateTime<Utc> {
    DateTime::from_timestamp(BASE_TIMESTAMP, 0).unwrap_or_default()
}

/// Build a generic resource with deterministic ids and timestamps
#[must_use]
pub fn generic_resource(group: &str, name: &str, resource_type: &str) -> GenericResource {
    GenericResource {
        id: format!(
            "/subscriptions/{MOCK_SUBSCRIPTION_ID}/resourceGroups/{group}/providers/{resource_type}/{name}"
        ),
        name: name.to_string(),
        resource_type: resource_type.to_string(),
        location: Some("westeurope".to_string()),
        kind: None,
        tags: HashMap::new(),
        created_time: Some(base_time()),
        changed_time: Some(base_time() + TimeDelta::days(14)),
    }
}

/// Build an enabled Logic Apps workflow
#[must_use]
pub fn workflow(group: &str, name: &str) -> Workflow {
    Workflow {
        id: format!(
            "/subscriptions/{MOCK_SUBSCRIPTION_ID}/resourceGroups/{group}/providers/Microsoft.Logic/workflows/{name}"
        ),
        name: name.to_string(),
        location: Some("westeurope".to_string()),
        tags: HashMap::new(),
        properties: WorkflowProperties {
            state: Some("Enabled".to_string()),
            version: Some("08584799999999999999".to_string()),
            created_time: Some(base_time()),
            changed_time: Some(base_time() + TimeDelta::hours(36)),
            definition: None,
        },
    }
}

/// Build a calendar event with an empty body
#[must_use]
pub fn event(subject: &str, start: DateTime<Utc>, end: DateTime<Utc>) -> Event {
    Event {
        id: format!("AAMk-{}", subject.to_lowercase().replace(' ', "-")),
        organizer: "Ada Lovelace <ada@example.com>".to_string(),
        subject: subject.to_string(),
        body: String::new(),
        start,
        end,
        modified: start - TimeDelta::days(1),
    }
}

/// Build an Exa result for `url`
#[must_use]
pub fn exa_result(url: &str) -> ExaResult {
    ExaResult {
        id: url.to_string(),
        url: url.to_string(),
        title: Some(format!("Page at {url}")),
        score: Some(0.5),
        published_date: Some("2024-02-01".to_string()),
        author: None,
        text: Some(format!("Text of {url}")),
        highlights: Vec::new(),
        highlight_scores: Vec::new(),
    }
}

/// Attach a free-text description to a fixture
pub trait WithDescription {
    /// Set the description the tools will clean and truncate
    #[must_use]
    fn with_description(self, description: &str) -> Self;
}

impl WithDescription for GenericResource {
    fn with_description(mut self, description: &str) -> Self {
        self.tags
            .insert("description".to_string(), description.to_string());
        self
    }
}

impl WithDescription for Workflow {
    fn with_description(mut self, description: &str) -> Self {
        self.properties.definition = Some(json!({
            "$schema": "https://schema.management.azure.com/providers/Microsoft.Logic/schemas/2016-06-01/workflowdefinition.json#",
            "description": description,
            "triggers": {},
            "actions": {}
        }));
        self
    }
}

impl WithDescription for Event {
    fn with_description(mut self, description: &str) -> Self {
        self.body = description.to_string();
        self
    }
}

/// In-memory Resource Manager
#[derive(Debug, Default)]
pub struct InMemoryAzure {
    groups: Vec<ResourceGroup>,
    resources: HashMap<String, Vec<GenericResource>>,
    workflows: HashMap<String, Vec<Workflow>>,
    calls: AtomicUsize,
    last_top: Mutex<Option<u32>>,
}

impl InMemoryAzure {
    /// Create an empty subscription
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// A small subscription used by the demo runner
    #[must_use]
    pub fn sample() -> Self {
        Self::new()
            .with_group("rg-integration")
            .with_resource(
                "rg-integration",
                generic_resource(
                    "rg-integration",
                    "la-order-processor",
                    "Microsoft.Logic/workflows",
                )
                .with_description("<p>Routes <b>new orders</b> to the ERP.</p>"),
            )
            .with_resource(
                "rg-integration",
                generic_resource(
                    "rg-integration",
                    "stintegration",
                    "Microsoft.Storage/storageAccounts",
                ),
            )
            .with_resource(
                "rg-integration",
                generic_resource("rg-integration", "la-invoice-sync", "Microsoft.Logic/workflows"),
            )
            .with_workflow(
                "rg-integration",
                workflow("rg-integration", "la-order-processor")
                    .with_description("Routes new orders to the ERP"),
            )
            .with_workflow("rg-integration", workflow("rg-integration", "la-invoice-sync"))
    }

    /// Add an empty resource group
    #[must_use]
    pub fn with_group(mut self, name: &str) -> Self {
        self.groups.push(ResourceGroup {
            id: format!("/subscriptions/{MOCK_SUBSCRIPTION_ID}/resourceGroups/{name}"),
            name: name.to_string(),
            location: "westeurope".to_string(),
            tags: HashMap::new(),
        });
        self
    }

    /// Add a resource to a group
    #[must_use]
    pub fn with_resource(mut self, group: &str, resource: GenericResource) -> Self {
        self.resources
            .entry(group.to_lowercase())
            .or_default()
            .push(resource);
        self
    }

    /// Add a workflow to a group
    #[must_use]
    pub fn with_workflow(mut self, group: &str, workflow: Workflow) -> Self {
        self.workflows
            .entry(group.to_lowercase())
            .or_default()
            .push(workflow);
        self
    }

    /// Number of remote calls received
    #[must_use]
    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }

    /// Page size requested by the last workflow listing
    #[must_use]
    pub fn last_top(&self) -> Option<u32> {
        self.last_top.lock().ok().and_then(|top| *top)
    }

    fn group(&self, name: &str) -> Result<&ResourceGroup, MockError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        self.groups
            .iter()
            .find(|g| g.name.eq_ignore_ascii_case(name))
            .ok_or_else(|| MockError::GroupNotFound(name.to_string()))
    }
}

impl ResourceSource for InMemoryAzure {
    type Error = MockError;

    fn resource_group(
        &self,
        name: &str,
    ) -> impl Future<Output = Result<ResourceGroup, Self::Error>> + Send {
        ready(self.group(name).cloned())
    }

    fn list_resources(
        &self,
        resource_group: &str,
    ) -> impl Future<Output = Result<Vec<GenericResource>, Self::Error>> + Send {
        let result = self.group(resource_group).map(|group| {
            self.resources
                .get(&group.name.to_lowercase())
                .cloned()
                .unwrap_or_default()
        });
        ready(result)
    }
}

impl WorkflowSource for InMemoryAzure {
    type Error = MockError;

    fn list_workflows(
        &self,
        resource_group: &str,
        top: Option<u32>,
    ) -> impl Future<Output = Result<Vec<Workflow>, Self::Error>> + Send {
        if let Ok(mut last) = self.last_top.lock() {
            *last = top;
        }
        let result = self.group(resource_group).map(|group| {
            let workflows = self
                .workflows
                .get(&group.name.to_lowercase())
                .cloned()
                .unwrap_or_default();
            match top {
                Some(top) => workflows.into_iter().take(top as usize).collect(),
                None => workflows,
            }
        });
        ready(result)
    }
}

/// In-memory calendar
#[derive(Debug, Default)]
pub struct InMemoryCalendar {
    events: Vec<Event>,
    calls: AtomicUsize,
}

impl InMemoryCalendar {
    /// Create a calendar holding `events`
    #[must_use]
    pub fn new(events: Vec<Event>) -> Self {
        Self {
            events,
            calls: AtomicUsize::new(0),
        }
    }

    /// A week of meetings starting at 2024-03-04, used by the demo runner
    #[must_use]
    pub fn sample() -> Self {
        let monday = base_time() + TimeDelta::days(3) + TimeDelta::hours(1);
        Self::new(vec![
            event("Standup", monday, monday + TimeDelta::minutes(15))
                .with_description("<div>Daily sync.<br>Bring blockers.</div>"),
            event(
                "Architecture review",
                monday + TimeDelta::days(1) + TimeDelta::hours(5),
                monday + TimeDelta::days(1) + TimeDelta::hours(6),
            )
            .with_description("<p>Agenda:</p><ul><li>Token caching</li><li>Timeouts</li></ul>"),
            event(
                "Retro",
                monday + TimeDelta::days(4) + TimeDelta::hours(7),
                monday + TimeDelta::days(4) + TimeDelta::hours(8),
            ),
        ])
    }

    /// Number of remote calls received
    #[must_use]
    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }
}

impl EventSource for InMemoryCalendar {
    type Error = MockError;

    fn calendar_view(
        &self,
        start: DateTime<Utc>,
        end: DateTime<Utc>,
        top: u32,
    ) -> impl Future<Output = Result<Vec<Event>, Self::Error>> + Send {
        self.calls.fetch_add(1, Ordering::SeqCst);
        let mut events: Vec<Event> = self
            .events
            .iter()
            .filter(|e| e.start < end && e.end > start)
            .cloned()
            .collect();
        events.sort_by_key(|e| e.start);
        events.truncate(top as usize);
        ready(Ok(events))
    }
}

/// Canned Exa results
///
/// Every call returns all stored results regardless of `num_results`, so the
/// tools' own cap is what tests observe.
#[derive(Debug, Default)]
pub struct InMemoryExa {
    results: Vec<ExaResult>,
    calls: AtomicUsize,
}

impl InMemoryExa {
    /// Create a source returning `results`
    #[must_use]
    pub fn new(results: Vec<ExaResult>) -> Self {
        Self {
            results,
            calls: AtomicUsize::new(0),
        }
    }

    /// A few results used by the demo runner
    #[must_use]
    pub fn sample() -> Self {
        Self::new(vec![
            exa_result("https://tokio.rs/tokio/tutorial"),
            exa_result("https://docs.rs/reqwest"),
            exa_result("https://serde.rs"),
        ])
    }

    /// Number of remote calls received
    #[must_use]
    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }

    fn respond(&self) -> std::future::Ready<Result<SearchResponse, MockError>> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        ready(Ok(SearchResponse {
            results: self.results.clone(),
            autoprompt_string: None,
        }))
    }
}

impl ExaSource for InMemoryExa {
    type Error = MockError;

    fn search(
        &self,
        _request: &SearchRequest,
    ) -> impl Future<Output = Result<SearchResponse, Self::Error>> + Send {
        self.respond()
    }

    fn find_similar(
        &self,
        _request: &FindSimilarRequest,
    ) -> impl Future<Output = Result<SearchResponse, Self::Error>> + Send {
        self.respond()
    }
}

/// Source whose every call fails with the same message
#[derive(Debug, Clone)]
pub struct FailingSource {
    message: String,
}

impl FailingSource {
    /// Create a source failing with `message`
    #[must_use]
    pub fn new(message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
        }
    }

    fn fail<T>(&self) -> std::future::Ready<Result<T, MockError>> {
        tracing::debug!(message = %self.message, "injected failure");
        ready(Err(MockError::Failed(self.message.clone())))
    }
}

impl ResourceSource for FailingSource {
    type Error = MockError;

    fn resource_group(
        &self,
        _name: &str,
    ) -> impl Future<Output = Result<ResourceGroup, Self::Error>> + Send {
        self.fail()
    }

    fn list_resources(
        &self,
        _resource_group: &str,
    ) -> impl Future<Output = Result<Vec<GenericResource>, Self::Error>> + Send {
        self.fail()
    }
}

impl WorkflowSource for FailingSource {
    type Error = MockError;

    fn list_workflows(
        &self,
        _resource_group: &str,
        _top: Option<u32>,
    ) -> impl Future<Output = Result<Vec<Workflow>, Self::Error>> + Send {
        self.fail()
    }
}

impl EventSource for FailingSource {
    type Error = MockError;

    fn calendar_view(
        &self,
        _start: DateTime<Utc>,
        _end: DateTime<Utc>,
        _top: u32,
    ) -> impl Future<Output = Result<Vec<Event>, Self::Error>> + Send {
        self.fail()
    }
}

impl ExaSource for FailingSource {
    type Error = MockError;

    fn search(
        &self,
        _request: &SearchRequest,
    ) -> impl Future<Output = Result<SearchResponse, Self::Error>> + Send {
        self.fail()
    }

    fn find_similar(
        &self,
        _request: &FindSimilarRequest,
    ) -> impl Future<Output = Result<SearchResponse, Self::Error>> + Send {
        self.fail()
    }
}

/// Source whose every call never completes
#[derive(Debug, Clone, Copy, Default)]
pub struct StalledSource;

impl ResourceSource for StalledSource {
    type Error = MockError;

    fn resource_group(
        &self,
        _name: &str,
    ) -> impl Future<Output = Result<ResourceGroup, Self::Error>> + Send {
        pending()
    }

    fn list_resources(
        &self,
        _resource_group: &str,
    ) -> impl Future<Output = Result<Vec<GenericResource>, Self::Error>> + Send {
        pending()
    }
}

impl WorkflowSource for StalledSource {
    type Error = MockError;

    fn list_workflows(
        &self,
        _resource_group: &str,
        _top: Option<u32>,
    ) -> impl Future<Output = Result<Vec<Workflow>, Self::Error>> + Send {
        pending()
    }
}

impl EventSource for StalledSource {
    type Error = MockError;

    fn calendar_view(
        &self,
        _start: DateTime<Utc>,
        _end: DateTime<Utc>,
        _top: u32,
    ) -> impl Future<Output = Result<Vec<Event>, Self::Error>> + Send {
        pending()
    }
}

impl ExaSource for StalledSource {
    type Error = MockError;

    fn search(
        &self,
        _request: &SearchRequest,
    ) -> impl Future<Output = Result<SearchResponse, Self::Error>> + Send {
        pending()
    }

    fn find_similar(
        &self,
        _request: &FindSimilarRequest,
    ) -> impl Future<Output = Result<SearchResponse, Self::Error>> + Send {
        pending()
    }
}
