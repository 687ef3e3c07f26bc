//! Exa request and response types

use serde::{Deserialize, Serialize};

/// Which contents to fetch alongside each result
#[derive(Clone, Debug, Serialize, PartialEq, Eq)]
pub struct ContentsOptions {
    /// Include the page text
    pub text: bool,
    /// Include highlights
    #[serde(skip_serializing_if = "Option::is_none")]
    pub highlights: Option<HighlightsOptions>,
}

impl Default for ContentsOptions {
    fn default() -> Self {
        Self {
            text: true,
            highlights: None,
        }
    }
}

/// Highlight extraction settings (empty means Exa's defaults)
#[derive(Clone, Debug, Default, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct HighlightsOptions {
    /// Sentences per highlight
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub num_sentences: Option<u32>,
    /// Highlights per result
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub highlights_per_url: Option<u32>,
    /// Query used to pick highlights, if different from the search query
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub query: Option<String>,
}

/// Filters shared by search and find-similar
#[derive(Clone, Debug, Default, Serialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct SearchFilters {
    /// Only return results from these domains
    #[serde(skip_serializing_if = "Option::is_none")]
    pub include_domains: Option<Vec<String>>,
    /// Never return results from these domains
    #[serde(skip_serializing_if = "Option::is_none")]
    pub exclude_domains: Option<Vec<String>>,
    /// Crawled on or after (ISO 8601)
    #[serde(skip_serializing_if = "Option::is_none")]
    pub start_crawl_date: Option<String>,
    /// Crawled on or before (ISO 8601)
    #[serde(skip_serializing_if = "Option::is_none")]
    pub end_crawl_date: Option<String>,
    /// Published on or after (ISO 8601)
    #[serde(skip_serializing_if = "Option::is_none")]
    pub start_published_date: Option<String>,
    /// Published on or before (ISO 8601)
    #[serde(skip_serializing_if = "Option::is_none")]
    pub end_published_date: Option<String>,
}

/// Body of `POST /search`
#[derive(Clone, Debug, Serialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct SearchRequest {
    /// Search query
    pub query: String,
    /// Number of results to return
    pub num_results: u32,
    /// Let Exa rewrite the query
    #[serde(skip_serializing_if = "Option::is_none")]
    pub use_autoprompt: Option<bool>,
    /// Domain and date filters
    #[serde(flatten)]
    pub filters: SearchFilters,
    /// Contents to fetch
    pub contents: ContentsOptions,
}

impl SearchRequest {
    /// Create a request with default filters and text contents
    #[must_use]
    pub fn new(query: impl Into<String>, num_results: u32) -> Self {
        Self {
            query: query.into(),
            num_results,
            use_autoprompt: None,
            filters: SearchFilters::default(),
            contents: ContentsOptions::default(),
        }
    }
}

/// Body of `POST /findSimilar`
#[derive(Clone, Debug, Serialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct FindSimilarRequest {
    /// Page to find neighbours of
    pub url: String,
    /// Number of results to return
    pub num_results: u32,
    /// Drop results from the source page's domain
    #[serde(skip_serializing_if = "Option::is_none")]
    pub exclude_source_domain: Option<bool>,
    /// Domain and date filters
    #[serde(flatten)]
    pub filters: SearchFilters,
    /// Contents to fetch
    pub contents: ContentsOptions,
}

impl FindSimilarRequest {
    /// Create a request with default filters and text contents
    #[must_use]
    pub fn new(url: impl Into<String>, num_results: u32) -> Self {
        Self {
            url: url.into(),
            num_results,
            exclude_source_domain: None,
            filters: SearchFilters::default(),
            contents: ContentsOptions::default(),
        }
    }
}

/// Response of search and find-similar
#[derive(Clone, Debug, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct SearchResponse {
    /// Results in rank order
    #[serde(default)]
    pub results: Vec<ExaResult>,
    /// Rewritten query, when autoprompt was used
    #[serde(default)]
    pub autoprompt_string: Option<String>,
}

/// One search result
///
/// Deserialized from Exa's camelCase payload, serialized in snake case.
#[derive(Clone, Debug, Serialize, Deserialize, PartialEq)]
#[serde(rename_all(deserialize = "camelCase"))]
pub struct ExaResult {
    /// Exa document id
    pub id: String,
    /// Page URL
    pub url: String,
    /// Page title
    #[serde(default)]
    pub title: Option<String>,
    /// Relevance score
    #[serde(default)]
    pub score: Option<f64>,
    /// Publication date, when known
    #[serde(default)]
    pub published_date: Option<String>,
    /// Author, when known
    #[serde(default)]
    pub author: Option<String>,
    /// Page text (when requested)
    #[serde(default)]
    pub text: Option<String>,
    /// Highlights (when requested)
    #[serde(default)]
    pub highlights: Vec<String>,
    /// Score per highlight
    #[serde(default)]
    pub highlight_scores: Vec<f64>,
}

#[cfg(test)]
#[allow(clippy::expect_used)] // Test code can use expect
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_search_request_serialization() {
        let mut request = SearchRequest::new("rust async", 3);
        request.filters.include_domains = Some(vec!["docs.rs".to_string()]);
        request.contents.highlights = Some(HighlightsOptions::default());

        let value = serde_json::to_value(&request).expect("serializes");
        assert_eq!(
            value,
            json!({
                "query": "rust async",
                "numResults": 3,
                "includeDomains": ["docs.rs"],
                "contents": {"text": true, "highlights": {}}
            })
        );
    }

    #[test]
    fn test_find_similar_serialization() {
        let mut request = FindSimilarRequest::new("https://tokio.rs", 2);
        request.exclude_source_domain = Some(true);
        request.filters.start_published_date = Some("2024-01-01".to_string());

        let value = serde_json::to_value(&request).expect("serializes");
        assert_eq!(value["url"], "https://tokio.rs");
        assert_eq!(value["excludeSourceDomain"], true);
        assert_eq!(value["startPublishedDate"], "2024-01-01");
        assert!(value.get("endPublishedDate").is_none());
    }

    #[test]
    fn test_result_casing() {
        let result: ExaResult = serde_json::from_value(json!({
            "id": "doc-1",
            "url": "https://example.com",
            "title": "Example",
            "publishedDate": "2024-02-03",
            "highlightScores": [0.5]
        }))
        .expect("deserializes");

        assert_eq!(result.published_date.as_deref(), Some("2024-02-03"));
        assert_eq!(result.highlight_scores, vec![0.5]);

        let value = serde_json::to_value(&result).expect("serializes");
        assert_eq!(value["published_date"], "2024-02-03");
        assert!(value.get("publishedDate").is_none());
    }
}
