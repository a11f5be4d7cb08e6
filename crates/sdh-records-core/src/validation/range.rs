//! Date ordering checks and day counts.

use chrono::NaiveDate;
use tracing::debug;

use super::{Check, DateCheck, ValidationError, Validator};

/// Discharge must not precede start. Only checked when both are set.
pub fn validate_discharge_after_start(start: Option<NaiveDate>, discharge: Option<NaiveDate>) -> Check {
    match (start, discharge) {
        (Some(start), Some(end)) if end < start => {
            Check::invalid(ValidationError::InvalidRange { start, end })
        }
        _ => Check::valid(),
    }
}

/// Whole days from `start` to `end`.
///
/// Returns 0 when either date is unset, and also when `end` precedes
/// `start`: this is a display value and an inverted range is reported by
/// the range validators instead. Use [`checked_days_between`] to get the
/// inversion as an error.
pub fn days_between(start: Option<NaiveDate>, end: Option<NaiveDate>) -> i64 {
    match (start, end) {
        (Some(start), Some(end)) => (end - start).num_days().max(0),
        _ => 0,
    }
}

/// Like [`days_between`] but an inverted range is an `InvalidRange` error.
pub fn checked_days_between(
    start: Option<NaiveDate>,
    end: Option<NaiveDate>,
) -> Result<i64, ValidationError> {
    match (start, end) {
        (Some(start), Some(end)) if end < start => Err(ValidationError::InvalidRange { start, end }),
        (Some(start), Some(end)) => Ok((end - start).num_days()),
        _ => Ok(0),
    }
}

impl Validator {
    /// Validate a date nested inside a parent window, e.g. an operation
    /// inside its episode or a follow-up after its operation.
    ///
    /// The age check runs first, so an implausible age is reported even when
    /// the date is also outside the window.
    pub fn validate_nested_date(
        &self,
        date: Option<NaiveDate>,
        lower: Option<NaiveDate>,
        upper: Option<NaiveDate>,
        current_age: u32,
    ) -> DateCheck {
        let mut check = self.validate_date_against_age(date, current_age);
        if !check.is_valid() {
            return check;
        }

        let Some(date) = date else {
            return check;
        };

        if let Some(bound) = lower.filter(|bound| date < *bound) {
            debug!(%date, %bound, "date before lower bound");
            check.error = Some(ValidationError::BeforeLowerBound { bound });
        } else if let Some(bound) = upper.filter(|bound| date > *bound) {
            debug!(%date, %bound, "date after upper bound");
            check.error = Some(ValidationError::AfterUpperBound { bound });
        }

        check
    }

    /// Reject dates after today.
    pub fn validate_not_future(&self, date: Option<NaiveDate>) -> Check {
        match date {
            Some(date) if date > self.today => Check::invalid(ValidationError::InFuture { date }),
            _ => Check::valid(),
        }
    }

    pub fn validate_discharge_after_start(
        &self,
        start: Option<NaiveDate>,
        discharge: Option<NaiveDate>,
    ) -> Check {
        validate_discharge_after_start(start, discharge)
    }

    pub fn days_between(&self, start: Option<NaiveDate>, end: Option<NaiveDate>) -> i64 {
        days_between(start, end)
    }
}
