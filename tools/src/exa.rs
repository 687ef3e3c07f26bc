//! Exa search tools
//!
//! - `exa_search_results_json`: search the web by query
//! - `exa_find_similar_results_json`: find pages similar to a URL
//!
//! Both return the raw Exa results (page text and optional highlights) as a
//! JSON array, never more than `num_results` entries.

use crate::error::SearchError;
use crate::normalize::to_json;
use crate::schema::{self, parse_input, ValidationError};
use crate::source::ExaSource;
use crate::timeout::{execute_with_timeout, ToolConfig};
use chrono::NaiveDate;
use cloudtools_core::{Tool, ToolError, ToolExecutorFn, ToolFuture};
use cloudtools_exa::{
    ContentsOptions, ExaResult, FindSimilarRequest, HighlightsOptions, SearchFilters,
    SearchRequest,
};
use serde::Deserialize;
use serde_json::{json, Value};
use std::sync::Arc;

/// Search tool name
pub const SEARCH_NAME: &str = "exa_search_results_json";

/// Find-similar tool name
pub const FIND_SIMILAR_NAME: &str = "exa_find_similar_results_json";

/// Largest accepted `num_results`
pub const MAX_RESULTS_LIMIT: u32 = 100;

/// `highlights` may be a flag or a settings object
#[derive(Debug, Deserialize)]
#[serde(untagged)]
enum HighlightsInput {
    Enabled(bool),
    Settings(HighlightsSettings),
}

#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
struct HighlightsSettings {
    #[serde(default)]
    num_sentences: Option<u32>,
    #[serde(default)]
    highlights_per_url: Option<u32>,
    #[serde(default)]
    query: Option<String>,
}

/// Filter fields shared by both inputs
///
/// Repeated in each input struct because serde cannot combine `flatten`
/// with `deny_unknown_fields`.
#[derive(Debug)]
struct FilterInput {
    include_domains: Option<Vec<String>>,
    exclude_domains: Option<Vec<String>>,
    start_crawl_date: Option<String>,
    end_crawl_date: Option<String>,
    start_published_date: Option<String>,
    end_published_date: Option<String>,
}

macro_rules! filter_input {
    ($input:expr) => {
        FilterInput {
            include_domains: $input.include_domains,
            exclude_domains: $input.exclude_domains,
            start_crawl_date: $input.start_crawl_date,
            end_crawl_date: $input.end_crawl_date,
            start_published_date: $input.start_published_date,
            end_published_date: $input.end_published_date,
        }
    };
}

#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
struct SearchInput {
    query: String,
    #[serde(default = "default_num_results")]
    num_results: i64,
    #[serde(default)]
    highlights: Option<HighlightsInput>,
    #[serde(default)]
    use_autoprompt: Option<bool>,
    #[serde(default)]
    include_domains: Option<Vec<String>>,
    #[serde(default)]
    exclude_domains: Option<Vec<String>>,
    #[serde(default)]
    start_crawl_date: Option<String>,
    #[serde(default)]
    end_crawl_date: Option<String>,
    #[serde(default)]
    start_published_date: Option<String>,
    #[serde(default)]
    end_published_date: Option<String>,
}

#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
struct FindSimilarInput {
    url: String,
    #[serde(default = "default_num_results")]
    num_results: i64,
    #[serde(default)]
    highlights: Option<HighlightsInput>,
    #[serde(default)]
    exclude_source_domain: Option<bool>,
    #[serde(default)]
    include_domains: Option<Vec<String>>,
    #[serde(default)]
    exclude_domains: Option<Vec<String>>,
    #[serde(default)]
    start_crawl_date: Option<String>,
    #[serde(default)]
    end_crawl_date: Option<String>,
    #[serde(default)]
    start_published_date: Option<String>,
    #[serde(default)]
    end_published_date: Option<String>,
}

const fn default_num_results() -> i64 {
    10
}

fn contents(highlights: Option<HighlightsInput>) -> ContentsOptions {
    let highlights = match highlights {
        None | Some(HighlightsInput::Enabled(false)) => None,
        Some(HighlightsInput::Enabled(true)) => Some(HighlightsOptions::default()),
        Some(HighlightsInput::Settings(settings)) => Some(HighlightsOptions {
            num_sentences: settings.num_sentences,
            highlights_per_url: settings.highlights_per_url,
            query: settings.query,
        }),
    };
    ContentsOptions {
        text: true,
        highlights,
    }
}

/// Accept `YYYY-MM-DD` or a full RFC 3339 timestamp
fn iso_date(field: &'static str, value: Option<String>) -> Result<Option<String>, ValidationError> {
    let Some(value) = value else {
        return Ok(None);
    };
    let trimmed = value.trim();
    if NaiveDate::parse_from_str(trimmed, "%Y-%m-%d").is_ok() {
        return Ok(Some(trimmed.to_string()));
    }
    schema::date_time(field, trimmed).map(|_| Some(trimmed.to_string()))
}

fn domains(list: Option<Vec<String>>) -> Option<Vec<String>> {
    let list: Vec<String> = list?
        .into_iter()
        .map(|d| d.trim().to_string())
        .filter(|d| !d.is_empty())
        .collect();
    (!list.is_empty()).then_some(list)
}

impl FilterInput {
    fn validate(self) -> Result<SearchFilters, ValidationError> {
        Ok(SearchFilters {
            include_domains: domains(self.include_domains),
            exclude_domains: domains(self.exclude_domains),
            start_crawl_date: iso_date("start_crawl_date", self.start_crawl_date)?,
            end_crawl_date: iso_date("end_crawl_date", self.end_crawl_date)?,
            start_published_date: iso_date("start_published_date", self.start_published_date)?,
            end_published_date: iso_date("end_published_date", self.end_published_date)?,
        })
    }
}

/// Parse and validate `exa_search_results_json` input
///
/// # Errors
///
/// Returns `ValidationError` for malformed input, unknown fields, an empty
/// query, `num_results` outside `1..=100` or unparseable dates
pub fn parse_search(input: &str) -> Result<SearchRequest, ValidationError> {
    let input: SearchInput = parse_input(input)?;
    let query = schema::non_empty("query", &input.query)?;
    let num_results = schema::result_count("num_results", input.num_results, MAX_RESULTS_LIMIT)?;

    let mut request = SearchRequest::new(query, num_results);
    request.use_autoprompt = input.use_autoprompt;
    request.contents = contents(input.highlights);
    request.filters = filter_input!(input).validate()?;
    Ok(request)
}

/// Parse and validate `exa_find_similar_results_json` input
///
/// # Errors
///
/// Returns `ValidationError` for malformed input, unknown fields, an empty
/// URL, `num_results` outside `1..=100` or unparseable dates
pub fn parse_find_similar(input: &str) -> Result<FindSimilarRequest, ValidationError> {
    let input: FindSimilarInput = parse_input(input)?;
    let url = schema::non_empty("url", &input.url)?;
    let num_results = schema::result_count("num_results", input.num_results, MAX_RESULTS_LIMIT)?;

    let mut request = FindSimilarRequest::new(url, num_results);
    request.exclude_source_domain = input.exclude_source_domain;
    request.contents = contents(input.highlights);
    request.filters = filter_input!(input).validate()?;
    Ok(request)
}

/// Run a validated search against `source`
///
/// # Errors
///
/// Returns `SearchError::Remote` if Exa fails and `SearchError::Timeout` if
/// the call outlives `config.timeout`
#[tracing::instrument(skip_all, name = "exa_search", fields(query = %request.query))]
pub async fn search<S: ExaSource>(
    source: &S,
    request: &SearchRequest,
    config: &ToolConfig,
) -> Result<Vec<ExaResult>, SearchError> {
    let response = execute_with_timeout(config, source.search(request)).await?;
    if let Some(autoprompt) = &response.autoprompt_string {
        tracing::debug!(%autoprompt, "query rewritten by autoprompt");
    }
    Ok(capped(response.results, request.num_results))
}

/// Run a validated find-similar against `source`
///
/// # Errors
///
/// Returns `SearchError::Remote` if Exa fails and `SearchError::Timeout` if
/// the call outlives `config.timeout`
#[tracing::instrument(skip_all, name = "exa_find_similar", fields(url = %request.url))]
pub async fn find_similar<S: ExaSource>(
    source: &S,
    request: &FindSimilarRequest,
    config: &ToolConfig,
) -> Result<Vec<ExaResult>, SearchError> {
    let response = execute_with_timeout(config, source.find_similar(request)).await?;
    Ok(capped(response.results, request.num_results))
}

fn capped(mut results: Vec<ExaResult>, num_results: u32) -> Vec<ExaResult> {
    results.truncate(num_results as usize);
    tracing::debug!(returned = results.len(), "exa results");
    results
}

fn filter_properties() -> Value {
    json!({
        "include_domains": {
            "type": "array",
            "items": {"type": "string"},
            "description": "Only return results from these domains"
        },
        "exclude_domains": {
            "type": "array",
            "items": {"type": "string"},
            "description": "Never return results from these domains"
        },
        "start_crawl_date": {
            "type": "string",
            "description": "Only pages crawled on or after this date (YYYY-MM-DD or RFC 3339)"
        },
        "end_crawl_date": {
            "type": "string",
            "description": "Only pages crawled on or before this date"
        },
        "start_published_date": {
            "type": "string",
            "description": "Only pages published on or after this date"
        },
        "end_published_date": {
            "type": "string",
            "description": "Only pages published on or before this date"
        },
        "num_results": {
            "type": "integer",
            "description": "Number of results to return",
            "minimum": 1,
            "maximum": MAX_RESULTS_LIMIT,
            "default": 10
        },
        "highlights": {
            "description": "Include highlights: true, or {num_sentences, highlights_per_url, query}",
            "oneOf": [
                {"type": "boolean"},
                {
                    "type": "object",
                    "properties": {
                        "num_sentences": {"type": "integer", "minimum": 1},
                        "highlights_per_url": {"type": "integer", "minimum": 1},
                        "query": {"type": "string"}
                    },
                    "additionalProperties": false
                }
            ]
        }
    })
}

fn schema_with(extra: Value, required: &str) -> Value {
    let mut properties = filter_properties();
    if let (Some(properties), Value::Object(extra)) = (properties.as_object_mut(), extra) {
        properties.extend(extra);
    }
    json!({
        "type": "object",
        "properties": properties,
        "required": [required],
        "additionalProperties": false
    })
}

/// Create the `exa_search_results_json` tool
#[must_use]
pub fn exa_search_tool<S>(source: Arc<S>, config: ToolConfig) -> (Tool, ToolExecutorFn)
where
    S: ExaSource + 'static,
{
    let tool = Tool::new(
        SEARCH_NAME,
        "Search the web with Exa and return the results (url, title, text, highlights) as JSON",
        schema_with(
            json!({
                "query": {"type": "string", "description": "Search query"},
                "use_autoprompt": {"type": "boolean", "description": "Let Exa rewrite the query"}
            }),
            "query",
        ),
    );

    let executor = Arc::new(move |input: String| {
        let source = Arc::clone(&source);
        Box::pin(async move {
            run_search(source.as_ref(), &input, &config)
                .await
                .map_err(ToolError::from)
        }) as ToolFuture
    }) as ToolExecutorFn;

    (tool, executor)
}

/// Create the `exa_find_similar_results_json` tool
#[must_use]
pub fn exa_find_similar_tool<S>(source: Arc<S>, config: ToolConfig) -> (Tool, ToolExecutorFn)
where
    S: ExaSource + 'static,
{
    let tool = Tool::new(
        FIND_SIMILAR_NAME,
        "Find pages similar to a URL with Exa and return the results as JSON",
        schema_with(
            json!({
                "url": {"type": "string", "description": "Page to find similar pages for"},
                "exclude_source_domain": {
                    "type": "boolean",
                    "description": "Drop results from the source page's domain"
                }
            }),
            "url",
        ),
    );

    let executor = Arc::new(move |input: String| {
        let source = Arc::clone(&source);
        Box::pin(async move {
            run_find_similar(source.as_ref(), &input, &config)
                .await
                .map_err(ToolError::from)
        }) as ToolFuture
    }) as ToolExecutorFn;

    (tool, executor)
}

async fn run_search<S: ExaSource>(
    source: &S,
    input: &str,
    config: &ToolConfig,
) -> Result<String, SearchError> {
    let request = parse_search(input)?;
    let results = search(source, &request, config).await?;
    to_json(&results)
}

async fn run_find_similar<S: ExaSource>(
    source: &S,
    input: &str,
    config: &ToolConfig,
) -> Result<String, SearchError> {
    let request = parse_find_similar(input)?;
    let results = find_similar(source, &request, config).await?;
    to_json(&results)
}

#[cfg(test)]
#[allow(clippy::expect_used)] // Test code can use expect
mod tests {
    use super::*;
    use crate::mock::{exa_result, FailingSource, InMemoryExa};
    use cloudtools_exa::ExaClient;
    use wiremock::matchers::{body_partial_json, header, method, path};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    fn five_results() -> InMemoryExa {
        InMemoryExa::new((1..=5).map(|i| exa_result(&format!("https://example.com/{i}"))).collect())
    }

    #[test]
    fn test_parse_search_defaults() {
        let request = parse_search(r#"{"query": "  rust tracing  "}"#).expect("valid");
        assert_eq!(request.query, "rust tracing");
        assert_eq!(request.num_results, 10);
        assert_eq!(request.contents, ContentsOptions::default());
        assert_eq!(request.filters, SearchFilters::default());
    }

    #[test]
    fn test_parse_search_highlights_and_filters() {
        let request = parse_search(
            &json!({
                "query": "q",
                "num_results": 3,
                "highlights": {"num_sentences": 2},
                "include_domains": ["docs.rs", " "],
                "start_published_date": "2024-01-01",
                "end_published_date": "2024-06-30T23:59:59Z"
            })
            .to_string(),
        )
        .expect("valid");

        assert_eq!(
            request.contents.highlights,
            Some(HighlightsOptions {
                num_sentences: Some(2),
                ..HighlightsOptions::default()
            })
        );
        assert_eq!(request.filters.include_domains, Some(vec!["docs.rs".to_string()]));
        assert_eq!(request.filters.start_published_date.as_deref(), Some("2024-01-01"));

        let flag = parse_search(r#"{"query": "q", "highlights": true}"#).expect("valid");
        assert_eq!(flag.contents.highlights, Some(HighlightsOptions::default()));
    }

    #[test]
    fn test_parse_rejects_bad_input() {
        assert!(parse_search(r#"{"query": ""}"#).is_err());
        assert!(parse_search(r#"{"query": "q", "num_results": 0}"#).is_err());
        assert!(parse_search(r#"{"query": "q", "num_results": 101}"#).is_err());
        assert!(parse_search(r#"{"query": "q", "start_crawl_date": "last week"}"#).is_err());
        assert!(parse_search(r#"{"query": "q", "url": "https://x"}"#).is_err());
        assert!(parse_search(r#"{"query": "q", "highlights": {"colour": "red"}}"#).is_err());
        assert!(parse_find_similar(r#"{"url": "https://x", "query": "q"}"#).is_err());
    }

    #[tokio::test]
    async fn test_search_tool_caps_results() {
        let source = Arc::new(five_results());
        let (tool, executor) = exa_search_tool(Arc::clone(&source), ToolConfig::default());
        assert_eq!(tool.name, "exa_search_results_json");
        assert!(tool.is_strict());
        assert!(tool.property_names().contains(&"use_autoprompt".to_string()));

        let result = executor(json!({"query": "rust", "num_results": 2}).to_string())
            .await
            .expect("should succeed");
        let results: Vec<Value> = serde_json::from_str(&result).expect("valid JSON");
        assert_eq!(results.len(), 2);
        assert_eq!(results[0]["url"], "https://example.com/1");
        assert_eq!(source.calls(), 1);
    }

    #[tokio::test]
    async fn test_find_similar_tool() {
        let (tool, executor) =
            exa_find_similar_tool(Arc::new(five_results()), ToolConfig::default());
        assert_eq!(tool.name, "exa_find_similar_results_json");
        assert!(tool.property_names().contains(&"exclude_source_domain".to_string()));

        let result = executor(json!({"url": "https://tokio.rs", "num_results": 4}).to_string())
            .await
            .expect("should succeed");
        let results: Vec<Value> = serde_json::from_str(&result).expect("valid JSON");
        assert_eq!(results.len(), 4);
    }

    #[tokio::test]
    async fn test_remote_failure() {
        let (_tool, executor) =
            exa_search_tool(Arc::new(FailingSource::new("quota exceeded")), ToolConfig::default());
        let err = executor(json!({"query": "rust"}).to_string())
            .await
            .expect_err("should fail");
        assert_eq!(err.message, "Remote call failed: quota exceeded");
    }

    #[tokio::test]
    async fn test_against_exa_client() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/search"))
            .and(header("x-api-key", "k"))
            .and(body_partial_json(json!({
                "query": "axum middleware",
                "numResults": 1,
                "includeDomains": ["docs.rs"],
                "contents": {"text": true, "highlights": {"highlightsPerUrl": 2}}
            })))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({
                "results": [
                    {
                        "id": "a",
                        "url": "https://docs.rs/axum",
                        "title": "axum",
                        "text": "Ergonomic",
                        "highlights": ["tower"]
                    },
                    {"id": "b", "url": "https://docs.rs/tower", "title": "tower"}
                ]
            })))
            .expect(1)
            .mount(&server)
            .await;

        let client = ExaClient::new("k".to_string())
            .with_api_url(&server.uri())
            .expect("endpoint");
        let (_tool, executor) = exa_search_tool(Arc::new(client), ToolConfig::default());

        let result = executor(
            json!({
                "query": "axum middleware",
                "num_results": 1,
                "include_domains": ["docs.rs"],
                "highlights": {"highlights_per_url": 2}
            })
            .to_string(),
        )
        .await
        .expect("should succeed");

        let results: Vec<Value> = serde_json::from_str(&result).expect("valid JSON");
        assert_eq!(results.len(), 1);
        assert_eq!(results[0]["title"], "axum");
        assert_eq!(results[0]["highlights"], json!(["tower"]));
    }
}
