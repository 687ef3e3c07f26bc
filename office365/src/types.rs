//! Graph calendar payload types

use crate::error::GraphError;
use chrono::{DateTime, NaiveDateTime, Utc};
use serde::{Deserialize, Serialize};

/// A calendar event with its timestamps resolved to UTC
#[derive(Clone, Debug, Serialize, Deserialize, PartialEq)]
pub struct Event {
    /// Graph event id
    pub id: String,
    /// Display form of the organizer (`Name <address>`)
    pub organizer: String,
    /// Subject line
    pub subject: String,
    /// Raw body content (usually HTML)
    pub body: String,
    /// Start of the event
    pub start: DateTime<Utc>,
    /// End of the event
    pub end: DateTime<Utc>,
    /// Last modification
    pub modified: DateTime<Utc>,
}

/// Event as returned on the wire
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub(crate) struct GraphEvent {
    pub id: String,
    #[serde(default)]
    pub subject: Option<String>,
    #[serde(default)]
    pub body: Option<ItemBody>,
    pub start: DateTimeTimeZone,
    pub end: DateTimeTimeZone,
    #[serde(default)]
    pub organizer: Option<Recipient>,
    pub last_modified_date_time: DateTime<Utc>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub(crate) struct ItemBody {
    #[serde(default)]
    pub content: String,
}

/// Wall-clock time plus the zone it is expressed in
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub(crate) struct DateTimeTimeZone {
    pub date_time: String,
    pub time_zone: String,
}

impl DateTimeTimeZone {
    /// Resolve to UTC; the client asks Graph for UTC, so any other zone is
    /// reported as a parse failure
    fn to_utc(&self) -> Result<DateTime<Utc>, GraphError> {
        if !matches!(self.time_zone.as_str(), "UTC" | "Etc/UTC" | "tzone://Microsoft/Utc") {
            return Err(GraphError::ResponseParseFailed(format!(
                "expected UTC timestamps, got time zone '{}'",
                self.time_zone
            )));
        }

        NaiveDateTime::parse_from_str(&self.date_time, "%Y-%m-%dT%H:%M:%S%.f")
            .map(|naive| naive.and_utc())
            .map_err(|e| {
                GraphError::ResponseParseFailed(format!("bad dateTime '{}': {e}", self.date_time))
            })
    }
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub(crate) struct Recipient {
    pub email_address: EmailAddress,
}

#[derive(Debug, Deserialize)]
pub(crate) struct EmailAddress {
    #[serde(default)]
    pub name: Option<String>,
    #[serde(default)]
    pub address: Option<String>,
}

impl EmailAddress {
    fn display(&self) -> String {
        let name = self.name.as_deref().map(str::trim).filter(|s| !s.is_empty());
        let address = self.address.as_deref().map(str::trim).filter(|s| !s.is_empty());
        match (name, address) {
            (Some(name), Some(address)) if name != address => format!("{name} <{address}>"),
            (Some(name), _) => name.to_string(),
            (None, Some(address)) => address.to_string(),
            (None, None) => String::new(),
        }
    }
}

impl TryFrom<GraphEvent> for Event {
    type Error = GraphError;

    fn try_from(raw: GraphEvent) -> Result<Self, Self::Error> {
        Ok(Self {
            organizer: raw
                .organizer
                .map(|o| o.email_address.display())
                .unwrap_or_default(),
            subject: raw.subject.unwrap_or_default(),
            body: raw.body.map(|b| b.content).unwrap_or_default(),
            start: raw.start.to_utc()?,
            end: raw.end.to_utc()?,
            modified: raw.last_modified_date_time,
            id: raw.id,
        })
    }
}

/// Graph collection response
#[derive(Debug, Deserialize)]
pub(crate) struct Collection<T> {
    #[serde(default = "Vec::new")]
    pub value: Vec<T>,
}

/// Graph error envelope
#[derive(Debug, Deserialize)]
pub(crate) struct ErrorEnvelope {
    pub error: ErrorBody,
}

#[derive(Debug, Deserialize)]
pub(crate) struct ErrorBody {
    #[serde(default)]
    pub code: String,
    #[serde(default)]
    pub message: String,
}

#[cfg(test)]
#[allow(clippy::expect_used)] // Test code can use expect
mod tests {
    use super::*;
    use serde_json::json;

    fn raw_event() -> serde_json::Value {
        json!({
            "id": "AAMk1",
            "subject": "Quarterly review",
            "body": {"contentType": "html", "content": "<p>Agenda</p>"},
            "start": {"dateTime": "2024-05-02T14:00:00.0000000", "timeZone": "UTC"},
            "end": {"dateTime": "2024-05-02T15:30:00.0000000", "timeZone": "UTC"},
            "organizer": {"emailAddress": {"name": "Ada Lovelace", "address": "ada@example.com"}},
            "lastModifiedDateTime": "2024-04-30T10:11:12.345Z"
        })
    }

    #[test]
    fn test_event_conversion() {
        let raw: GraphEvent = serde_json::from_value(raw_event()).expect("deserializes");
        let event = Event::try_from(raw).expect("converts");

        assert_eq!(event.organizer, "Ada Lovelace <ada@example.com>");
        assert_eq!(event.subject, "Quarterly review");
        assert_eq!(event.body, "<p>Agenda</p>");
        assert_eq!(event.start.to_rfc3339(), "2024-05-02T14:00:00+00:00");
        assert_eq!(event.end.to_rfc3339(), "2024-05-02T15:30:00+00:00");
    }

    #[test]
    fn test_event_rejects_non_utc() {
        let mut value = raw_event();
        value["start"]["timeZone"] = json!("Pacific Standard Time");

        let raw: GraphEvent = serde_json::from_value(value).expect("deserializes");
        let err = Event::try_from(raw).expect_err("should fail");
        assert!(matches!(err, GraphError::ResponseParseFailed(_)));
    }

    #[test]
    fn test_event_optional_fields() {
        let mut value = raw_event();
        let object = value.as_object_mut().expect("object");
        object.remove("subject");
        object.remove("body");
        object.remove("organizer");

        let raw: GraphEvent = serde_json::from_value(value).expect("deserializes");
        let event = Event::try_from(raw).expect("converts");
        assert_eq!(event.subject, "");
        assert_eq!(event.body, "");
        assert_eq!(event.organizer, "");
    }

    #[test]
    fn test_email_display() {
        let only_address = EmailAddress {
            name: None,
            address: Some("bob@example.com".to_string()),
        };
        assert_eq!(only_address.display(), "bob@example.com");

        let same = EmailAddress {
            name: Some("bob@example.com".to_string()),
            address: Some("bob@example.com".to_string()),
        };
        assert_eq!(same.display(), "bob@example.com");
    }
}
