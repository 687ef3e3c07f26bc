//! `events_search`: Office 365 calendar events in a time window
//!
//! Timestamps are reported in the offset carried by `start_datetime`, so a
//! caller asking for `2024-05-01T00:00:00+02:00` gets `+0200` timestamps back.

use crate::error::SearchError;
use crate::normalize::{to_json, Normalizer, QueryZone};
use crate::schema::{self, parse_input, ValidationError};
use crate::source::EventSource;
use crate::timeout::{execute_with_timeout, ToolConfig};
use chrono::{DateTime, Utc};
use cloudtools_core::{Tool, ToolError, ToolExecutorFn, ToolFuture};
use cloudtools_office365::Event;
use serde::{Deserialize, Serialize};
use serde_json::json;
use std::sync::Arc;

/// Tool name
pub const NAME: &str = "events_search";

/// Largest accepted `max_results` (Graph's page size limit)
pub const MAX_RESULTS_LIMIT: u32 = 1000;

#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
struct Input {
    start_datetime: String,
    end_datetime: String,
    #[serde(default = "default_max_results")]
    max_results: i64,
    #[serde(default = "default_truncate")]
    truncate: bool,
}

const fn default_max_results() -> i64 {
    10
}

const fn default_truncate() -> bool {
    true
}

/// A validated events search
#[derive(Debug, Clone, PartialEq)]
pub struct EventsSearchRequest {
    /// Window start
    pub start: DateTime<Utc>,
    /// Window end
    pub end: DateTime<Utc>,
    /// Upper bound on returned records
    pub max_results: u32,
    /// How records are normalized (zone taken from `start_datetime`)
    pub normalizer: Normalizer,
}

impl EventsSearchRequest {
    /// Parse and validate tool input
    ///
    /// # Errors
    ///
    /// Returns `ValidationError` for malformed input, unknown fields,
    /// timestamps without an offset, a window whose start is after its end or
    /// `max_results` out of range
    pub fn parse(input: &str, config: &ToolConfig) -> Result<Self, ValidationError> {
        let input: Input = parse_input(input)?;

        let start = schema::date_time("start_datetime", &input.start_datetime)?;
        let end = schema::date_time("end_datetime", &input.end_datetime)?;
        if start > end {
            return Err(ValidationError::InvalidRange {
                start: input.start_datetime,
                end: input.end_datetime,
            });
        }
        let max_results =
            schema::result_count("max_results", input.max_results, MAX_RESULTS_LIMIT)?;

        Ok(Self {
            start: start.with_timezone(&Utc),
            end: end.with_timezone(&Utc),
            max_results,
            normalizer: Normalizer::new(
                input.truncate,
                config.truncate_limit,
                QueryZone::Fixed(*start.offset()),
            ),
        })
    }
}

/// One normalized calendar event
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct OutputRecord {
    /// `Name <address>` of the organizer
    pub organizer: String,
    /// Subject line
    pub subject: String,
    /// Cleaned (and possibly truncated) body
    pub body: String,
    /// Event start in the query zone
    pub start_datetime: String,
    /// Event end in the query zone
    pub end_datetime: String,
    /// Last modification in the query zone
    pub modified_date: String,
}

impl OutputRecord {
    /// Normalize a raw event
    #[must_use]
    pub fn from_event(event: &Event, normalizer: &Normalizer) -> Self {
        Self {
            organizer: event.organizer.clone(),
            subject: event.subject.clone(),
            body: normalizer.text(&event.body),
            start_datetime: normalizer.timestamp(event.start),
            end_datetime: normalizer.timestamp(event.end),
            modified_date: normalizer.timestamp(event.modified),
        }
    }
}

/// Run a validated search against `source`
///
/// # Errors
///
/// Returns `SearchError::Remote` if the calendar query fails and
/// `SearchError::Timeout` if it outlives `config.timeout`
#[tracing::instrument(
    skip_all,
    name = "events_search",
    fields(start = %request.start, end = %request.end)
)]
pub async fn search_events<S: EventSource>(
    source: &S,
    request: &EventsSearchRequest,
    config: &ToolConfig,
) -> Result<Vec<OutputRecord>, SearchError> {
    let events = execute_with_timeout(
        config,
        source.calendar_view(request.start, request.end, request.max_results),
    )
    .await?;

    let records: Vec<OutputRecord> = events
        .iter()
        .take(request.max_results as usize)
        .map(|e| OutputRecord::from_event(e, &request.normalizer))
        .collect();

    tracing::debug!(listed = events.len(), returned = records.len(), "events search complete");
    Ok(records)
}

/// Create the `events_search` tool
///
/// Returns a JSON array of [`OutputRecord`]s:
/// ```json
/// [
///   {
///     "organizer": "Ada Lovelace <ada@example.com>",
///     "subject": "Quarterly review",
///     "body": "Agenda: numbers, roadmap, hiring",
///     "start_datetime": "2024-05-02T16:00:00+0200",
///     "end_datetime": "2024-05-02T17:30:00+0200",
///     "modified_date": "2024-04-30T12:11:12+0200"
///   }
/// ]
/// ```
#[must_use]
pub fn events_search_tool<S>(source: Arc<S>, config: ToolConfig) -> (Tool, ToolExecutorFn)
where
    S: EventSource + 'static,
{
    let tool = Tool::new(
        NAME,
        "Search Office 365 calendar events overlapping a time window. Times in the \
         result use the UTC offset of start_datetime",
        json!({
            "type": "object",
            "properties": {
                "start_datetime": {
                    "type": "string",
                    "format": "date-time",
                    "description": "Window start, RFC 3339 with offset (e.g. '2024-05-01T00:00:00+02:00')"
                },
                "end_datetime": {
                    "type": "string",
                    "format": "date-time",
                    "description": "Window end, RFC 3339 with offset; not before start_datetime"
                },
                "max_results": {
                    "type": "integer",
                    "description": "Maximum number of events to return",
                    "minimum": 1,
                    "maximum": MAX_RESULTS_LIMIT,
                    "default": 10
                },
                "truncate": {
                    "type": "boolean",
                    "description": "Truncate event bodies",
                    "default": true
                }
            },
            "required": ["start_datetime", "end_datetime"],
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

async fn run<S: EventSource>(
    source: &S,
    input: &str,
    config: &ToolConfig,
) -> Result<String, SearchError> {
    let request = EventsSearchRequest::parse(input, config)?;
    let records = search_events(source, &request, config).await?;
    to_json(&records)
}
