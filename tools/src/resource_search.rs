//! `resource_search`: generic Azure resources in a resource group
//!
//! Resolves the resource group, lists its resources, keeps those of the
//! requested type (or provider namespace) whose name matches the optional
//! fuzzy filter, and returns at most `max_results` normalized records.

use crate::error::SearchError;
use crate::normalize::{fuzzy_matches, to_json, Normalizer, QueryZone};
use crate::schema::{self, parse_input, ValidationError};
use crate::source::ResourceSource;
use crate::timeout::{execute_with_timeout, ToolConfig};
use cloudtools_azure::GenericResource;
use cloudtools_core::{Tool, ToolError, ToolExecutorFn, ToolFuture};
use serde::{Deserialize, Serialize};
use serde_json::json;
use std::sync::Arc;

/// Tool name
pub const NAME: &str = "resource_search";

/// Largest accepted `max_results`
pub const MAX_RESULTS_LIMIT: u32 = 1000;

/// Tag holding a resource's free-text description
pub const DESCRIPTION_TAG: &str = "description";

#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
struct Input {
    resource_type: String,
    resource_group_name: String,
    #[serde(default)]
    resource_name: String,
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

/// A validated resource search
#[derive(Debug, Clone, PartialEq)]
pub struct ResourceSearchRequest {
    /// Full type or provider namespace, e.g. `Microsoft.Logic`
    pub resource_type: String,
    /// Resource group to search
    pub resource_group_name: String,
    /// Fuzzy name filter; empty matches every name
    pub resource_name: String,
    /// Upper bound on returned records
    pub max_results: u32,
    /// How records are normalized
    pub normalizer: Normalizer,
}

impl ResourceSearchRequest {
    /// Parse and validate tool input
    ///
    /// # Errors
    ///
    /// Returns `ValidationError` for malformed input, unknown fields, an
    /// invalid resource group name, `max_results` outside `1..=1000` or an
    /// unknown time zone
    pub fn parse(input: &str, config: &ToolConfig) -> Result<Self, ValidationError> {
        let input: Input = parse_input(input)?;

        let resource_type = schema::non_empty("resource_type", &input.resource_type)?.to_string();
        schema::resource_group_name(&input.resource_group_name)?;
        let max_results =
            schema::result_count("max_results", input.max_results, MAX_RESULTS_LIMIT)?;
        let zone = match input.time_zone.as_deref() {
            Some(name) => QueryZone::Named(schema::time_zone(name)?),
            None => QueryZone::default(),
        };

        Ok(Self {
            resource_type,
            resource_group_name: input.resource_group_name,
            resource_name: input.resource_name,
            max_results,
            normalizer: Normalizer::new(input.truncate, config.truncate_limit, zone),
        })
    }
}

/// One normalized resource
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct ResourceRecord {
    /// Fully qualified resource id
    pub id: String,
    /// Resource name
    pub name: String,
    /// `Provider.Namespace/type`
    pub resource_type: String,
    /// Azure region
    pub location: Option<String>,
    /// Provider-specific kind
    pub kind: Option<String>,
    /// Cleaned `description` tag
    pub description: Option<String>,
    /// Creation time in the query zone
    pub created_time: Option<String>,
    /// Last change time in the query zone
    pub changed_time: Option<String>,
}

impl ResourceRecord {
    /// Normalize a raw resource
    #[must_use]
    pub fn from_resource(resource: &GenericResource, normalizer: &Normalizer) -> Self {
        let description = resource
            .tags
            .iter()
            .find(|(key, _)| key.eq_ignore_ascii_case(DESCRIPTION_TAG))
            .map(|(_, value)| value.as_str());

        Self {
            id: resource.id.clone(),
            name: resource.name.clone(),
            resource_type: resource.resource_type.clone(),
            location: resource.location.clone(),
            kind: resource.kind.clone(),
            description: normalizer.optional_text(description),
            created_time: normalizer.optional_timestamp(resource.created_time),
            changed_time: normalizer.optional_timestamp(resource.changed_time),
        }
    }
}

/// Run a validated search against `source`
///
/// # Errors
///
/// Returns `SearchError::Remote` if the group lookup or listing fails and
/// `SearchError::Timeout` if either outlives `config.timeout`
#[tracing::instrument(
    skip_all,
    name = "resource_search",
    fields(group = %request.resource_group_name, resource_type = %request.resource_type)
)]
pub async fn search_resources<S: ResourceSource>(
    source: &S,
    request: &ResourceSearchRequest,
    config: &ToolConfig,
) -> Result<Vec<ResourceRecord>, SearchError> {
    let group =
        execute_with_timeout(config, source.resource_group(&request.resource_group_name)).await?;
    let resources = execute_with_timeout(config, source.list_resources(&group.name)).await?;
    let listed = resources.len();

    let records: Vec<ResourceRecord> = resources
        .iter()
        .filter(|r| r.matches_type(&request.resource_type))
        .filter(|r| fuzzy_matches(&r.name, &request.resource_name))
        .take(request.max_results as usize)
        .map(|r| ResourceRecord::from_resource(r, &request.normalizer))
        .collect();

    tracing::debug!(listed, returned = records.len(), "resource search complete");
    Ok(records)
}

/// Create the `resource_search` tool
///
/// Returns a JSON array of [`ResourceRecord`]s:
/// ```json
/// [
///   {
///     "id": "/subscriptions/.../providers/Microsoft.Logic/workflows/la-billing",
///     "name": "la-billing",
///     "resource_type": "Microsoft.Logic/workflows",
///     "location": "westeurope",
///     "kind": null,
///     "description": "Nightly invoice export",
///     "created_time": "2024-03-01T08:00:00+0000",
///     "changed_time": "2024-04-12T16:45:10+0000"
///   }
/// ]
/// ```
#[must_use]
pub fn resource_search_tool<S>(source: Arc<S>, config: ToolConfig) -> (Tool, ToolExecutorFn)
where
    S: ResourceSource + 'static,
{
    let tool = Tool::new(
        NAME,
        "Search the resources of an Azure resource group by resource type (full type or \
         provider namespace such as 'Microsoft.Logic') and optional fuzzy resource name",
        json!({
            "type": "object",
            "properties": {
                "resource_type": {
                    "type": "string",
                    "description": "Resource type or provider namespace, e.g. 'Microsoft.Logic/workflows' or 'Microsoft.Logic'"
                },
                "resource_group_name": {
                    "type": "string",
                    "description": "Resource group to search",
                    "minLength": 1,
                    "maxLength": 90,
                    "pattern": "^[-\\w._()]*[-\\w_()]$"
                },
                "resource_name": {
                    "type": "string",
                    "description": "Optional fuzzy filter on the resource name",
                    "default": ""
                },
                "max_results": {
                    "type": "integer",
                    "description": "Maximum number of resources to return",
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
            "required": ["resource_type", "resource_group_name"],
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

async fn run<S: ResourceSource>(
    source: &S,
    input: &str,
    config: &ToolConfig,
) -> Result<String, SearchError> {
    let request = ResourceSearchRequest::parse(input, config)?;
    let records = search_resources(source, &request, config).await?;
    to_json(&records)
}
