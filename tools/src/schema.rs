//! Input validation for the search tools
//!
//! Tool inputs are parsed into `deny_unknown_fields` structs (type checks and
//! strictness come from serde) and then range-checked with the helpers here.
//! Every failure is a [`ValidationError`] raised before any remote call.

use chrono::{DateTime, FixedOffset};
use chrono_tz::Tz;
use regex::Regex;
use serde::de::DeserializeOwned;
use std::sync::LazyLock;
use thiserror::Error;

/// Input rejected before reaching the remote service
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ValidationError {
    /// Not JSON, wrong types, missing or unknown fields
    #[error("Invalid input: {0}")]
    InvalidInput(String),

    /// A required string was blank
    #[error("'{0}' must not be empty")]
    EmptyField(&'static str),

    /// A number outside its allowed range
    #[error("'{field}' must be between {min} and {max}, got {value}")]
    OutOfRange {
        /// Field name
        field: &'static str,
        /// Offending value
        value: i64,
        /// Smallest allowed value
        min: i64,
        /// Largest allowed value
        max: i64,
    },

    /// Not a valid Azure resource group name
    #[error(
        "Invalid resource group name '{0}': use 1-90 letters, digits, periods, underscores, hyphens or parentheses, not ending in a period"
    )]
    InvalidResourceGroupName(String),

    /// Unknown IANA time zone
    #[error("Invalid time zone '{0}'")]
    InvalidTimeZone(String),

    /// Not an RFC 3339 timestamp with offset
    #[error("'{field}' is not an RFC 3339 date-time: {value}")]
    InvalidDateTime {
        /// Field name
        field: &'static str,
        /// Offending value
        value: String,
    },

    /// Window whose start is after its end
    #[error("'start_datetime' ({start}) is after 'end_datetime' ({end})")]
    InvalidRange {
        /// Window start as given
        start: String,
        /// Window end as given
        end: String,
    },
}

/// Longest accepted resource group name
pub const RESOURCE_GROUP_NAME_MAX: usize = 90;

#[allow(clippy::expect_used)]
static RESOURCE_GROUP_NAME: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"^[\p{L}\p{N}._()\-]+$").expect("valid resource group regex")
});

/// Parse tool input JSON into its request type
///
/// # Errors
///
/// Returns `ValidationError::InvalidInput` for malformed JSON, wrong types,
/// missing required fields and undeclared fields
pub fn parse_input<T: DeserializeOwned>(input: &str) -> Result<T, ValidationError> {
    serde_json::from_str(input).map_err(|e| ValidationError::InvalidInput(e.to_string()))
}

/// Check an Azure resource group name
///
/// # Errors
///
/// Returns `ValidationError::InvalidResourceGroupName` unless the name is 1 to
/// 90 letters, digits, periods, underscores, hyphens or parentheses and does
/// not end in a period
pub fn resource_group_name(name: &str) -> Result<(), ValidationError> {
    let valid = (1..=RESOURCE_GROUP_NAME_MAX).contains(&name.chars().count())
        && RESOURCE_GROUP_NAME.is_match(name)
        && !name.ends_with('.');
    if valid {
        Ok(())
    } else {
        Err(ValidationError::InvalidResourceGroupName(name.to_string()))
    }
}

/// Check that a result count is within `1..=max`
///
/// # Errors
///
/// Returns `ValidationError::OutOfRange` otherwise
pub fn result_count(field: &'static str, value: i64, max: u32) -> Result<u32, ValidationError> {
    let out_of_range = || ValidationError::OutOfRange {
        field,
        value,
        min: 1,
        max: i64::from(max),
    };
    let count = u32::try_from(value).map_err(|_| out_of_range())?;
    if (1..=max).contains(&count) {
        Ok(count)
    } else {
        Err(out_of_range())
    }
}

/// Check that a required string is not blank
///
/// # Errors
///
/// Returns `ValidationError::EmptyField` for empty or whitespace-only values
pub fn non_empty<'a>(field: &'static str, value: &'a str) -> Result<&'a str, ValidationError> {
    let trimmed = value.trim();
    if trimmed.is_empty() {
        Err(ValidationError::EmptyField(field))
    } else {
        Ok(trimmed)
    }
}

/// Parse an IANA time zone name
///
/// # Errors
///
/// Returns `ValidationError::InvalidTimeZone` for unknown names
pub fn time_zone(name: &str) -> Result<Tz, ValidationError> {
    name.trim()
        .parse::<Tz>()
        .map_err(|_| ValidationError::InvalidTimeZone(name.to_string()))
}

/// Parse an RFC 3339 timestamp, keeping its offset
///
/// # Errors
///
/// Returns `ValidationError::InvalidDateTime` when the value is not RFC 3339
/// (a UTC offset or `Z` is required)
pub fn date_time(
    field: &'static str,
    value: &str,
) -> Result<DateTime<FixedOffset>, ValidationError> {
    DateTime::parse_from_rfc3339(value.trim()).map_err(|_| ValidationError::InvalidDateTime {
        field,
        value: value.to_string(),
    })
}
