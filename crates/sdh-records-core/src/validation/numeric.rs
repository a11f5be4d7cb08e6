//! Numeric field bounds.

use tracing::debug;

use super::{Check, FieldValue, ValidationError, Validator};

/// Parse a non-negative number. Empty input is `Ok(None)`.
fn parse_non_negative(value: FieldValue) -> Result<Option<f64>, ValidationError> {
    match value.parse_number()? {
        Some(v) if v < 0.0 => Err(ValidationError::NegativeValue { value: v }),
        parsed => Ok(parsed),
    }
}

/// Non-negative number, or empty.
pub fn validate_non_negative(value: impl Into<FieldValue>) -> Check {
    parse_non_negative(value.into()).map(|_| ()).into()
}

/// Number within `[min, max]`, or empty.
pub fn validate_in_range(value: impl Into<FieldValue>, min: f64, max: f64) -> Check {
    let result = value.into().parse_number().and_then(|parsed| match parsed {
        Some(v) if v < min || v > max => Err(ValidationError::OutOfRange { value: v, min, max }),
        _ => Ok(()),
    });
    result.into()
}

impl Validator {
    /// Days since the antecedent event: optional, non-negative and no longer
    /// than the patient has been alive (`floor(age * days_per_year)`).
    pub fn validate_antecedent_days(&self, days: impl Into<FieldValue>, current_age: u32) -> Check {
        let max_days = self.limits.lifetime_days(current_age);
        let result = parse_non_negative(days.into()).and_then(|parsed| match parsed {
            Some(days) if days > max_days as f64 => {
                Err(ValidationError::ExceedsPatientLifetime { days, max_days })
            }
            _ => Ok(()),
        });

        if let Err(err) = &result {
            debug!(kind = err.kind(), current_age, "antecedent days rejected");
        }
        result.into()
    }

    /// Modified Rankin scale score (0 to the configured maximum).
    pub fn validate_rankin(&self, value: impl Into<FieldValue>) -> Check {
        validate_in_range(value, 0.0, f64::from(self.limits.max_rankin))
    }

    /// Glasgow coma scale score.
    pub fn validate_gcs(&self, value: impl Into<FieldValue>) -> Check {
        validate_in_range(
            value,
            f64::from(self.limits.min_gcs),
            f64::from(self.limits.max_gcs),
        )
    }
}
