//! `logic_app_search`: Logic Apps workflows in a resource group

use crate::error::SearchError;
use crate::normalize::{fuzzy_matches, to_json, Normalizer, QueryZone};
use crate::schema::{self, parse_input, ValidationError};
use crate::source::WorkflowSource;
use crate::timeout::{execute_with_timeout, ToolConfig};
use cloudtools_azure::Workflow;
use cloudtools_core::{Tool, ToolError, ToolExecutorFn, ToolFuture};
use serde::{Deserialize, Serialize};
use serde_json::json;
use std::sync::Arc;

/// Tool name
pub const NAME: &str = "logic_app_search";

/// Largest accepted `max_results`
pub const MAX_RESULTS_LIMIT: u32 = 1000;

#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
struct Input {
    resource_group_name: String,
    #[serde(default)]
    workflow_name: String,
    #[serde(default = "default_max_results")]
    max_results: i64,
    #[serde(default = "default_truncate")]
    truncate: bool,
    #[serde(default)]
    time_zone: Option<String>,
}

const fn default_max_results() -> i64 {
    10
}

const fn default_truncate() -> bool {
    true
}

/// A validated workflow search
#[derive(Debug, Clone, PartialEq)]
pub struct WorkflowSearchRequest {
    /// Resource group to search
    pub resource_group_name: String,
    /// Fuzzy name filter; empty matches every workflow
    pub workflow_name: String,
    /// Upper bound on returned records
    pub max_results: u32,
    /// How records are normalized
    pub normalizer: Normalizer,
}

impl WorkflowSearchRequest {
    /// Parse and validate tool input
    ///
    /// # Errors
    ///
    /// Returns `ValidationError` for malformed input, unknown fields, an
    /// invalid resource group name, `max_results` out of range or an unknown
    /// time zone
    pub fn parse(input: &str, config: &ToolConfig) -> Result<Self, ValidationError> {
        let input: Input = parse_input(input)?;

        schema::resource_group_name(&input.resource_group_name)?;
        let max_results =
            schema::result_count("max_results", input.max_results, MAX_RESULTS_LIMIT)?;
        let zone = match input.time_zone.as_deref() {
            Some(name) => QueryZone::Named(schema::time_zone(name)?),
            None => QueryZone::default(),
        };

        Ok(Self {
            resource_group_name: input.resource_group_name,
            workflow_name: input.workflow_name,
            max_results,
            normalizer: Normalizer::new(input.truncate, config.truncate_limit, zone),
        })
    }
}

/// One normalized workflow
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct WorkflowRecord {
    /// Fully qualified workflow id
    pub id: String,
    /// Workflow name
    pub name: String,
    /// Azure region
    pub location: Option<String>,
    /// `Enabled`, `Disabled`, ...
    pub state: Option<String>,
    /// Workflow version id
    pub version: Option<String>,
    /// Cleaned definition description
    pub description: Option<String>,
    /// Creation time in the query zone
    pub created_time: Option<String>,
    /// Last change time in the query zone
    pub changed_time: Option<String>,
}

impl WorkflowRecord {
    /// Normalize a raw workflow
    #[must_use]
    pub fn from_workflow(workflow: &Workflow, normalizer: &Normalizer) -> Self {
        let properties = &workflow.properties;
        Self {
            id: workflow.id.clone(),
            name: workflow.name.clone(),
            location: workflow.location.clone(),
            state: properties.state.clone(),
            version: properties.version.clone(),
            description: normalizer.optional_text(properties.description()),
            created_time: normalizer.optional_timestamp(properties.created_time),
            changed_time: normalizer.optional_timestamp(properties.changed_time),
        }
    }
}

/// Run a validated search against `source`
///
/// Without a name filter the page size is capped at `max_results`; with one,
/// the full first page is fetched and filtered locally.
///
/// # Errors
///
/// Returns `SearchError::Remote` if the listing fails and
/// `SearchError::Timeout` if it outlives `config.timeout`
#[tracing::instrument(
    skip_all,
    name = "logic_app_search",
    fields(group = %request.resource_group_name)
)]
pub async fn search_workflows<S: WorkflowSource>(
    source: &S,
    request: &WorkflowSearchRequest,
    config: &ToolConfig,
) -> Result<Vec<WorkflowRecord>, SearchError> {
    let top = request
        .workflow_name
        .trim()
        .is_empty()
        .then_some(request.max_results);
    let workflows = execute_with_timeout(
        config,
        source.list_workflows(&request.resource_group_name, top),
    )
    .await?;

    let records: Vec<WorkflowRecord> = workflows
        .iter()
        .filter(|w| fuzzy_matches(&w.name, &request.workflow_name))
        .take(request.max_results as usize)
        .map(|w| WorkflowRecord::from_workflow(w, &request.normalizer))
        .collect();

    tracing::debug!(listed = workflows.len(), returned = records.len(), "workflow search complete");
    Ok(records)
}

/// Create the `logic_app_search` tool
#[must_use]
pub fn logic_app_search_tool<S>(source: Arc<S>, config: ToolConfig) -> (Tool, ToolExecutorFn)
where
    S: WorkflowSource + 'static,
{
    let tool = Tool::new(
        NAME,
        "List the Logic Apps workflows of an Azure resource group, optionally filtered by a fuzzy workflow name",
        json!({
            "type": "object",
            "properties": {
                "resource_group_name": {
                    "type": "string",
                    "description": "Resource group to search",
                    "minLength": 1,
                    "maxLength": 90,
                    "pattern": "^[-\\w._()]*[-\\w_()]$"
                },
                "workflow_name": {
                    "type": "string",
                    "description": "Optional fuzzy filter on the workflow name",
                    "default": ""
                },
                "max_results": {
                    "type": "integer",
                    "description": "Maximum number of workflows to return",
                    "minimum": 1,
                    "maximum": MAX_RESULTS_LIMIT,
                    "default": 10
                },
                "truncate": {
                    "type": "boolean",
                    "description": "Truncate descriptions",
                    "default": true
                },
                "time_zone": {
                    "type": "string",
                    "description": "IANA time zone for timestamps (default UTC)"
                }
            },
            "required": ["resource_group_name"],
            "additionalProperties": false
        }),
    );

    let executor = Arc::new(move |input: String| {
        let source = Arc::clone(&source);
        Box::pin(async move {
            run(source.as_ref(), &input, &config)
                .await
                .map_err(ToolError::from)
        }) as ToolFuture
    }) as ToolExecutorFn;

    (tool, executor)
}

async fn run<S: WorkflowSource>(
    source: &S,
    input: &str,
    config: &ToolConfig,
) -> Result<String, SearchError> {
    let request = WorkflowSearchRequest::parse(input, config)?;
    let records = search_workflows(source, &request, config).await?;
    to_json(&records)
}
