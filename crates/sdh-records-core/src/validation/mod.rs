//! Date/age cross-field validation and derived-field computation.
//!
//! Every check is a pure function of its inputs. The current date is never
//! read implicitly: a [`Validator`] carries the `today` it was built with,
//! so the same inputs always give the same answer.
//!
//! Validators do not fail. They return a [`Check`] or [`DateCheck`] record
//! whose `error` is `None` when the value is acceptable; forms show the
//! error inline and block submission until it clears.

mod age;
mod input;
mod numeric;
mod range;

pub use age::*;
pub use input::*;
pub use numeric::*;
pub use range::*;

use chrono::{NaiveDate, Utc};
use serde::ser::SerializeStruct;
use serde::{Serialize, Serializer};
use thiserror::Error;

use crate::config::ClinicalLimits;

/// Why a field value was rejected.
#[derive(Error, Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "kind")]
pub enum ValidationError {
    #[error("Date is too far in the past: patient would have been {age} years old")]
    NegativeAge { age: i64 },

    #[error("Date implies an age of {age}, above the maximum of {max} years")]
    AgeOutOfRange { age: i64, max: i64 },

    #[error("End date {end} is before start date {start}")]
    InvalidRange { start: NaiveDate, end: NaiveDate },

    #[error("'{input}' is not a number")]
    NotANumber { input: String },

    #[error("Value cannot be negative ({value})")]
    NegativeValue { value: f64 },

    #[error("{days} days exceeds the patient's lifetime of {max_days} days")]
    ExceedsPatientLifetime { days: f64, max_days: i64 },

    #[error("Date must be on or after {bound}")]
    BeforeLowerBound { bound: NaiveDate },

    #[error("Date must be on or before {bound}")]
    AfterUpperBound { bound: NaiveDate },

    #[error("'{input}' is not a valid date (expected YYYY-MM-DD)")]
    InvalidDate { input: String },

    #[error("This field is required")]
    Required,

    #[error("Value {value} must be between {min} and {max}")]
    OutOfRange { value: f64, min: f64, max: f64 },

    #[error("Date {date} is in the future")]
    InFuture { date: NaiveDate },

    #[error("'{input}' is not one of the available options")]
    InvalidChoice { input: String },

    #[error("No onset to count from for antecedent '{antecedent}'")]
    NoOnset { antecedent: String },
}

impl ValidationError {
    /// Short kind name, stable across message changes.
    pub fn kind(&self) -> &'static str {
        match self {
            Self::NegativeAge { .. } => "NegativeAge",
            Self::AgeOutOfRange { .. } => "AgeOutOfRange",
            Self::InvalidRange { .. } => "InvalidRange",
            Self::NotANumber { .. } => "NotANumber",
            Self::NegativeValue { .. } => "NegativeValue",
            Self::ExceedsPatientLifetime { .. } => "ExceedsPatientLifetime",
            Self::BeforeLowerBound { .. } => "BeforeLowerBound",
            Self::AfterUpperBound { .. } => "AfterUpperBound",
            Self::InvalidDate { .. } => "InvalidDate",
            Self::Required => "Required",
            Self::OutOfRange { .. } => "OutOfRange",
            Self::InFuture { .. } => "InFuture",
            Self::InvalidChoice { .. } => "InvalidChoice",
            Self::NoOnset { .. } => "NoOnset",
        }
    }
}

/// Outcome of a single-field check.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Check {
    pub error: Option<ValidationError>,
}

impl Check {
    pub fn valid() -> Self {
        Self { error: None }
    }

    pub fn invalid(error: ValidationError) -> Self {
        Self { error: Some(error) }
    }

    pub fn is_valid(&self) -> bool {
        self.error.is_none()
    }

    /// Inline message for the field, if any.
    pub fn message(&self) -> Option<String> {
        self.error.as_ref().map(ToString::to_string)
    }

    pub fn into_result(self) -> Result<(), ValidationError> {
        match self.error {
            None => Ok(()),
            Some(e) => Err(e),
        }
    }
}

impl From<Result<(), ValidationError>> for Check {
    fn from(result: Result<(), ValidationError>) -> Self {
        Self { error: result.err() }
    }
}

impl Serialize for Check {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let mut s = serializer.serialize_struct("Check", 3)?;
        s.serialize_field("isValid", &self.is_valid())?;
        s.serialize_field("error", &self.message())?;
        s.serialize_field("errorKind", &self.error.as_ref().map(ValidationError::kind))?;
        s.end()
    }
}

/// Outcome of a date check that also derives the patient's age on that date.
#[derive(Debug, Clone, PartialEq)]
pub struct DateCheck {
    pub age_at_date: i64,
    pub error: Option<ValidationError>,
}

impl DateCheck {
    pub fn is_valid(&self) -> bool {
        self.error.is_none()
    }

    pub fn message(&self) -> Option<String> {
        self.error.as_ref().map(ToString::to_string)
    }

    /// Drop the derived age, keeping only the verdict.
    pub fn check(&self) -> Check {
        Check {
            error: self.error.clone(),
        }
    }
}

impl Serialize for DateCheck {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let mut s = serializer.serialize_struct("DateCheck", 4)?;
        s.serialize_field("isValid", &self.is_valid())?;
        s.serialize_field("error", &self.message())?;
        s.serialize_field("errorKind", &self.error.as_ref().map(ValidationError::kind))?;
        s.serialize_field("ageAtDate", &self.age_at_date)?;
        s.end()
    }
}

/// Validation entry point: configured limits plus a fixed "today".
#[derive(Debug, Clone, PartialEq)]
pub struct Validator {
    limits: ClinicalLimits,
    today: NaiveDate,
}

impl Validator {
    /// Create a validator anchored at an explicit date.
    pub fn new(limits: ClinicalLimits, today: NaiveDate) -> Self {
        Self { limits, today }
    }

    /// Create a validator anchored at the current UTC date.
    pub fn for_today(limits: ClinicalLimits) -> Self {
        Self::new(limits, Utc::now().date_naive())
    }

    pub fn limits(&self) -> &ClinicalLimits {
        &self.limits
    }

    pub fn today(&self) -> NaiveDate {
        self.today
    }
}

impl Default for Validator {
    fn default() -> Self {
        Self::for_today(ClinicalLimits::default())
    }
}
