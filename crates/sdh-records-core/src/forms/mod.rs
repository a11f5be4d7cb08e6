//! Form state controllers.
//!
//! A controller is created when an edit modal opens. It keeps the raw text
//! of every field, re-validates a field (and the fields that depend on it)
//! on each change, and converts the text into a typed payload on submit.
//! Submission is refused while any field carries an error.

mod episode;
mod hematoma;
mod operative;
mod post_operative;

pub use episode::*;
pub use hematoma::*;
pub use operative::*;
pub use post_operative::*;

use std::collections::BTreeMap;
use std::fmt::Debug;
use std::str::FromStr;

use chrono::NaiveDate;
use serde::Serialize;
use thiserror::Error;
use tracing::debug;

use crate::models::UnknownCode;
use crate::validation::{parse_date_field, Check, FieldValue, ValidationError};

/// A named field of one form.
pub trait FormField: Copy + Ord + Debug + 'static {
    /// Every field, in display order.
    const ALL: &'static [Self];

    /// Form field name, as used by the HTML input.
    fn name(&self) -> &'static str;

    fn from_name(name: &str) -> Option<Self> {
        Self::ALL.iter().copied().find(|f| f.name() == name)
    }
}

/// Field-level errors that blocked a submission.
#[derive(Error, Debug, Clone, PartialEq, Default, Serialize)]
#[error("{} field(s) failed validation", .errors.len())]
pub struct FormErrors {
    pub errors: BTreeMap<&'static str, ValidationError>,
}

impl FormErrors {
    pub fn single<F: FormField>(field: F, error: ValidationError) -> Self {
        let mut errors = BTreeMap::new();
        errors.insert(field.name(), error);
        Self { errors }
    }

    pub fn get(&self, name: &str) -> Option<&ValidationError> {
        self.errors.get(name)
    }

    pub fn is_empty(&self) -> bool {
        self.errors.is_empty()
    }
}

/// Date span of the records already stored under a parent.
///
/// Editing the parent must keep every child inside its window: the
/// parent cannot start after `earliest` or end before `latest`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ChildDates {
    pub earliest: NaiveDate,
    pub latest: NaiveDate,
}

impl ChildDates {
    /// None when there are no children.
    pub fn from_dates(dates: impl IntoIterator<Item = NaiveDate>) -> Option<Self> {
        dates.into_iter().fold(None, |span, date| {
            Some(match span {
                None => ChildDates {
                    earliest: date,
                    latest: date,
                },
                Some(span) => ChildDates {
                    earliest: span.earliest.min(date),
                    latest: span.latest.max(date),
                },
            })
        })
    }

    /// The parent's start may not pass its earliest child.
    pub fn check_start(&self, start: NaiveDate) -> Check {
        if start > self.earliest {
            return Check::invalid(ValidationError::AfterUpperBound {
                bound: self.earliest,
            });
        }
        Check::valid()
    }

    /// The parent's end, when set, may not precede its latest child.
    pub fn check_end(&self, end: Option<NaiveDate>) -> Check {
        match end {
            Some(end) if end < self.latest => Check::invalid(ValidationError::BeforeLowerBound {
                bound: self.latest,
            }),
            _ => Check::valid(),
        }
    }
}

/// Attach a field to a parse error.
pub trait AtField<T> {
    fn at<F: FormField>(self, field: F) -> Result<T, FormErrors>;
}

impl<T> AtField<T> for Result<T, ValidationError> {
    fn at<F: FormField>(self, field: F) -> Result<T, FormErrors> {
        self.map_err(|e| FormErrors::single(field, e))
    }
}

/// An unknown field name was addressed.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
#[error("Unknown form field: {0}")]
pub struct UnknownField(pub String);

/// Raw field text plus the current inline errors.
#[derive(Debug, Clone, PartialEq)]
pub struct FormState<F: FormField> {
    values: BTreeMap<F, String>,
    errors: BTreeMap<F, ValidationError>,
}

impl<F: FormField> Default for FormState<F> {
    fn default() -> Self {
        Self {
            values: BTreeMap::new(),
            errors: BTreeMap::new(),
        }
    }
}

impl<F: FormField> FormState<F> {
    pub fn get(&self, field: F) -> &str {
        self.values.get(&field).map(String::as_str).unwrap_or("")
    }

    pub fn set(&mut self, field: F, value: impl Into<String>) {
        self.values.insert(field, value.into());
    }

    pub fn error(&self, field: F) -> Option<&ValidationError> {
        self.errors.get(&field)
    }

    pub fn errors(&self) -> &BTreeMap<F, ValidationError> {
        &self.errors
    }

    pub fn has_errors(&self) -> bool {
        !self.errors.is_empty()
    }

    /// Store the outcome of a field check.
    pub fn record(&mut self, field: F, check: Check) {
        match check.error {
            Some(error) => {
                debug!(field = field.name(), kind = error.kind(), "field rejected");
                self.errors.insert(field, error);
            }
            None => {
                self.errors.remove(&field);
            }
        }
    }

    pub fn form_errors(&self) -> FormErrors {
        FormErrors {
            errors: self
                .errors
                .iter()
                .map(|(field, error)| (field.name(), error.clone()))
                .collect(),
        }
    }

    pub fn date(&self, field: F) -> Result<Option<NaiveDate>, ValidationError> {
        parse_date_field(self.get(field))
    }

    pub fn required_date(&self, field: F) -> Result<NaiveDate, ValidationError> {
        self.date(field)?.ok_or(ValidationError::Required)
    }

    pub fn number(&self, field: F) -> Result<Option<f64>, ValidationError> {
        self.field_value(field).parse_number()
    }

    pub fn required_number(&self, field: F) -> Result<f64, ValidationError> {
        self.number(field)?.ok_or(ValidationError::Required)
    }

    pub fn field_value(&self, field: F) -> FieldValue {
        FieldValue::from(self.get(field))
    }

    /// Parse a select box. Blank means the type's default choice.
    pub fn choice<T>(&self, field: F) -> Result<T, ValidationError>
    where
        T: FromStr<Err = UnknownCode> + Default,
    {
        let raw = self.get(field).trim();
        if raw.is_empty() {
            return Ok(T::default());
        }
        raw.parse().map_err(|_| ValidationError::InvalidChoice {
            input: raw.to_string(),
        })
    }

    /// Parse a checkbox.
    pub fn flag(&self, field: F) -> Result<bool, ValidationError> {
        match self.get(field).trim().to_lowercase().as_str() {
            "" | "false" | "off" | "no" | "0" => Ok(false),
            "true" | "on" | "yes" | "1" => Ok(true),
            other => Err(ValidationError::InvalidChoice {
                input: other.to_string(),
            }),
        }
    }

    /// Free text, trimmed; blank is `None`.
    pub fn text(&self, field: F) -> Option<String> {
        let trimmed = self.get(field).trim();
        (!trimmed.is_empty()).then(|| trimmed.to_string())
    }
}

/// Shared behavior of the per-entity form controllers.
pub trait FormController {
    type Field: FormField;
    type Payload;

    fn state(&self) -> &FormState<Self::Field>;

    fn state_mut(&mut self) -> &mut FormState<Self::Field>;

    /// Validate one field against the current values of the whole form.
    fn check_field(&self, field: Self::Field) -> Check;

    /// Fields whose validity depends on `field`.
    fn dependents(_field: Self::Field) -> &'static [Self::Field] {
        &[]
    }

    /// Convert the (valid) field text into the payload.
    fn build(&self) -> Result<Self::Payload, FormErrors>;

    /// Update a field and re-validate it and its dependents.
    fn set_field(&mut self, field: Self::Field, value: impl Into<String>) {
        self.state_mut().set(field, value);
        self.revalidate(field);
        for &dependent in Self::dependents(field) {
            self.revalidate(dependent);
        }
    }

    /// Update a field addressed by its form name.
    fn set_named(&mut self, name: &str, value: impl Into<String>) -> Result<(), UnknownField> {
        let field = Self::Field::from_name(name).ok_or_else(|| UnknownField(name.to_string()))?;
        self.set_field(field, value);
        Ok(())
    }

    fn revalidate(&mut self, field: Self::Field) {
        let check = self.check_field(field);
        self.state_mut().record(field, check);
    }

    fn value(&self, field: Self::Field) -> &str {
        self.state().get(field)
    }

    fn error(&self, field: Self::Field) -> Option<&ValidationError> {
        self.state().error(field)
    }

    /// Re-run every check. True when the form is clean.
    fn validate(&mut self) -> bool {
        for &field in Self::Field::ALL {
            self.revalidate(field);
        }
        !self.state().has_errors()
    }

    /// Validate everything and produce the payload, or every field error.
    fn submit(&mut self) -> Result<Self::Payload, FormErrors> {
        if !self.validate() {
            return Err(self.state().form_errors());
        }
        self.build()
    }

    /// Close the modal without saving.
    fn cancel(self)
    where
        Self: Sized,
    {
        debug!("form cancelled");
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
    enum TestField {
        When,
        Count,
        Flag,
    }

    impl FormField for TestField {
        const ALL: &'static [Self] = &[TestField::When, TestField::Count, TestField::Flag];

        fn name(&self) -> &'static str {
            match self {
                TestField::When => "when",
                TestField::Count => "count",
                TestField::Flag => "flag",
            }
        }
    }

    fn day(d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(2020, 6, d).unwrap()
    }

    #[test]
    fn test_child_dates_span() {
        assert_eq!(ChildDates::from_dates(std::iter::empty()), None);

        let span = ChildDates::from_dates([day(10), day(3), day(14)]).unwrap();
        assert_eq!(span.earliest, day(3));
        assert_eq!(span.latest, day(14));

        assert!(span.check_start(day(3)).is_valid());
        assert_eq!(
            span.check_start(day(4)).error,
            Some(ValidationError::AfterUpperBound { bound: day(3) })
        );
        assert!(span.check_end(None).is_valid());
        assert!(span.check_end(Some(day(14))).is_valid());
        assert_eq!(
            span.check_end(Some(day(13))).error,
            Some(ValidationError::BeforeLowerBound { bound: day(14) })
        );
    }

    #[test]
    fn test_field_lookup_by_name() {
        assert_eq!(TestField::from_name("count"), Some(TestField::Count));
        assert_eq!(TestField::from_name("other"), None);
    }

    #[test]
    fn test_state_parsers() {
        let mut state = FormState::<TestField>::default();
        assert_eq!(state.get(TestField::When), "");
        assert_eq!(state.date(TestField::When), Ok(None));
        assert_eq!(state.required_date(TestField::When), Err(ValidationError::Required));

        state.set(TestField::When, "2024-01-05");
        state.set(TestField::Count, "3");
        state.set(TestField::Flag, "on");
        assert!(state.required_date(TestField::When).is_ok());
        assert_eq!(state.required_number(TestField::Count), Ok(3.0));
        assert_eq!(state.flag(TestField::Flag), Ok(true));

        state.set(TestField::Flag, "maybe");
        assert!(state.flag(TestField::Flag).is_err());
    }

    #[test]
    fn test_record_and_clear_errors() {
        let mut state = FormState::<TestField>::default();
        state.record(TestField::Count, Check::invalid(ValidationError::Required));
        assert!(state.has_errors());
        assert_eq!(
            state.form_errors().get("count"),
            Some(&ValidationError::Required)
        );

        state.record(TestField::Count, Check::valid());
        assert!(!state.has_errors());
    }

    #[test]
    fn test_form_errors_display() {
        let errors = FormErrors::single(TestField::When, ValidationError::Required);
        assert_eq!(errors.to_string(), "1 field(s) failed validation");
        let result: Result<(), ValidationError> = Err(ValidationError::Required);
        assert_eq!(result.at(TestField::Flag).unwrap_err().errors.len(), 1);
    }
}
