//! Conversion of raw form input into typed values.

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

use super::ValidationError;

/// Date format used by form fields and the backend.
pub const DATE_FORMAT: &str = "%Y-%m-%d";

/// A numeric form field as it arrives from the caller: HTML inputs send
/// strings, stored payloads send numbers.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum FieldValue {
    #[default]
    Empty,
    Number(f64),
    Text(String),
}

impl FieldValue {
    /// True when nothing has been entered.
    pub fn is_empty(&self) -> bool {
        match self {
            Self::Empty => true,
            Self::Number(_) => false,
            Self::Text(s) => s.trim().is_empty(),
        }
    }

    /// Parse as a number. Empty input yields `Ok(None)`.
    pub fn parse_number(&self) -> Result<Option<f64>, ValidationError> {
        let value = match self {
            Self::Empty => return Ok(None),
            Self::Number(n) => *n,
            Self::Text(s) => {
                let trimmed = s.trim();
                if trimmed.is_empty() {
                    return Ok(None);
                }
                trimmed
                    .parse::<f64>()
                    .map_err(|_| ValidationError::NotANumber { input: s.clone() })?
            }
        };

        // "NaN" and "inf" parse as f64 but are not usable field values
        if value.is_finite() {
            Ok(Some(value))
        } else {
            Err(ValidationError::NotANumber {
                input: value.to_string(),
            })
        }
    }
}

impl From<&str> for FieldValue {
    fn from(s: &str) -> Self {
        Self::Text(s.to_string())
    }
}

impl From<String> for FieldValue {
    fn from(s: String) -> Self {
        Self::Text(s)
    }
}

impl From<&String> for FieldValue {
    fn from(s: &String) -> Self {
        Self::Text(s.clone())
    }
}

impl From<f64> for FieldValue {
    fn from(n: f64) -> Self {
        Self::Number(n)
    }
}

impl From<i64> for FieldValue {
    fn from(n: i64) -> Self {
        Self::Number(n as f64)
    }
}

impl From<i32> for FieldValue {
    fn from(n: i32) -> Self {
        Self::Number(f64::from(n))
    }
}

impl From<u32> for FieldValue {
    fn from(n: u32) -> Self {
        Self::Number(f64::from(n))
    }
}

impl<T: Into<FieldValue>> From<Option<T>> for FieldValue {
    fn from(value: Option<T>) -> Self {
        value.map(Into::into).unwrap_or(Self::Empty)
    }
}

/// Parse an ISO-8601 date field. Blank input means "not yet specified".
///
/// Full timestamps (`2024-01-05T10:00:00Z`) are accepted and truncated to
/// their date part, since the backend returns either form.
pub fn parse_date_field(input: &str) -> Result<Option<NaiveDate>, ValidationError> {
    let trimmed = input.trim();
    if trimmed.is_empty() {
        return Ok(None);
    }

    let date_part = match trimmed.split_once('T') {
        Some((date, _)) => date,
        None => trimmed,
    };

    NaiveDate::parse_from_str(date_part, DATE_FORMAT)
        .map(Some)
        .map_err(|_| ValidationError::InvalidDate {
            input: input.to_string(),
        })
}

/// Format a date for a form field.
pub fn format_date_field(date: Option<NaiveDate>) -> String {
    date.map(|d| d.format(DATE_FORMAT).to_string())
        .unwrap_or_default()
}
