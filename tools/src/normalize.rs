//! Result normalization shared by the search tools
//!
//! Each raw record is reshaped the same way: free text is cleaned and
//! optionally truncated, and timestamps are rendered in the query's time zone
//! as `%Y-%m-%dT%H:%M:%S%z` (e.g. `2024-05-02T16:00:00+0200`).

use crate::clean::clean;
use crate::error::SearchError;
use chrono::{DateTime, FixedOffset, Utc};
use chrono_tz::Tz;
use serde::Serialize;

/// Timestamp format of every record field
pub const TIMESTAMP_FORMAT: &str = "%Y-%m-%dT%H:%M:%S%z";

/// Default limit for truncated free-text fields, in characters
pub const DEFAULT_TRUNCATE_LIMIT: usize = 150;

/// Time zone timestamps are reported in
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum QueryZone {
    /// IANA zone, offset resolved per timestamp (DST aware)
    Named(Tz),
    /// Fixed UTC offset, e.g. the offset an RFC 3339 input carried
    Fixed(FixedOffset),
}

impl Default for QueryZone {
    fn default() -> Self {
        Self::Named(Tz::UTC)
    }
}

impl QueryZone {
    /// Render `at` in this zone
    #[must_use]
    pub fn format(&self, at: DateTime<Utc>) -> String {
        match self {
            Self::Named(tz) => at.with_timezone(tz).format(TIMESTAMP_FORMAT).to_string(),
            Self::Fixed(offset) => at.with_timezone(offset).format(TIMESTAMP_FORMAT).to_string(),
        }
    }
}

/// Per-request normalization settings
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Normalizer {
    truncate: bool,
    truncate_limit: usize,
    zone: QueryZone,
}

impl Normalizer {
    /// Create a normalizer
    #[must_use]
    pub const fn new(truncate: bool, truncate_limit: usize, zone: QueryZone) -> Self {
        Self {
            truncate,
            truncate_limit,
            zone,
        }
    }

    /// Clean `raw`, then cut it to the limit when truncation is on
    #[must_use]
    pub fn text(&self, raw: &str) -> String {
        let cleaned = clean(raw);
        if !self.truncate || cleaned.chars().count() <= self.truncate_limit {
            return cleaned;
        }

        let cut: String = cleaned.chars().take(self.truncate_limit).collect();
        cut.trim_end().to_string()
    }

    /// Like [`Normalizer::text`] for optional fields; absent stays absent
    #[must_use]
    pub fn optional_text(&self, raw: Option<&str>) -> Option<String> {
        raw.map(|raw| self.text(raw))
    }

    /// Format a timestamp in the query zone
    #[must_use]
    pub fn timestamp(&self, at: DateTime<Utc>) -> String {
        self.zone.format(at)
    }

    /// Like [`Normalizer::timestamp`] for optional fields
    #[must_use]
    pub fn optional_timestamp(&self, at: Option<DateTime<Utc>>) -> Option<String> {
        at.map(|at| self.timestamp(at))
    }
}

impl Default for Normalizer {
    fn default() -> Self {
        Self::new(true, DEFAULT_TRUNCATE_LIMIT, QueryZone::default())
    }
}

/// Loose name match used by the optional name filters
///
/// Case-insensitive substring match that ignores everything but letters and
/// digits, so `order proc` finds `Order-Processor`. An empty needle matches
/// everything.
#[must_use]
pub fn fuzzy_matches(candidate: &str, needle: &str) -> bool {
    fn fold(s: &str) -> String {
        s.chars()
            .filter(|c| c.is_alphanumeric())
            .flat_map(char::to_lowercase)
            .collect()
    }

    let needle = fold(needle);
    needle.is_empty() || fold(candidate).contains(&needle)
}

/// Serialize normalized records as the tool's JSON result
pub(crate) fn to_json<T: Serialize>(records: &[T]) -> Result<String, SearchError> {
    serde_json::to_string(records).map_err(|e| SearchError::Serialization(e.to_string()))
}
