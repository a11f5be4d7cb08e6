//! Age-at-date estimation and date/age consistency.

use chrono::NaiveDate;
use tracing::debug;

use super::{DateCheck, ValidationError, Validator};

/// Round to the nearest integer with halves going up (-0.5 → 0, 2.5 → 3).
fn round_half_up(x: f64) -> i64 {
    (x + 0.5).floor() as i64
}

impl Validator {
    /// Approximate the patient's age on `target`, given their age today.
    ///
    /// Only the current age is known, not the birth date, so this is
    /// `current_age - (today - target) / days_per_year` rounded to the
    /// nearest year. Future dates give a larger age. An unset date returns
    /// `current_age`.
    pub fn age_at_date(&self, current_age: u32, target: Option<NaiveDate>) -> i64 {
        let Some(target) = target else {
            return i64::from(current_age);
        };

        let elapsed_days = (self.today - target).num_days() as f64;
        round_half_up(f64::from(current_age) - elapsed_days / self.limits.days_per_year)
    }

    /// Check that `date` implies a plausible age for the patient.
    pub fn validate_date_against_age(&self, date: Option<NaiveDate>, current_age: u32) -> DateCheck {
        let age = self.age_at_date(current_age, date);

        let error = if age < 0 {
            Some(ValidationError::NegativeAge { age })
        } else if age > self.limits.max_age_years {
            Some(ValidationError::AgeOutOfRange {
                age,
                max: self.limits.max_age_years,
            })
        } else {
            None
        };

        if let Some(err) = &error {
            debug!(kind = err.kind(), age, "date rejected against patient age");
        }

        DateCheck {
            age_at_date: age,
            error,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::ClinicalLimits;

    fn date(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).unwrap()
    }

    fn validator() -> Validator {
        Validator::new(ClinicalLimits::default(), date(2024, 6, 1))
    }

    #[test]
    fn test_unset_date_keeps_current_age() {
        assert_eq!(validator().age_at_date(45, None), 45);
        assert_eq!(validator().age_at_date(0, None), 0);
    }

    #[test]
    fn test_age_in_the_past() {
        let v = validator();
        assert_eq!(v.age_at_date(45, Some(date(2020, 6, 1))), 41);
        assert_eq!(v.age_at_date(45, Some(date(2024, 6, 1))), 45);
    }

    #[test]
    fn test_age_in_the_future() {
        assert_eq!(validator().age_at_date(45, Some(date(2026, 6, 1))), 47);
    }

    #[test]
    fn test_rounds_to_nearest_year() {
        let v = validator();
        // Seven months ago rounds to one year younger
        assert_eq!(v.age_at_date(10, Some(date(2023, 11, 1))), 9);
        // Four months ago rounds back to the current age
        assert_eq!(v.age_at_date(10, Some(date(2024, 2, 1))), 10);
    }

    #[test]
    fn test_half_rounds_up() {
        assert_eq!(round_half_up(-0.5), 0);
        assert_eq!(round_half_up(2.5), 3);
        assert_eq!(round_half_up(-1.2), -1);
    }

    #[test]
    fn test_date_before_birth_is_negative_age() {
        let check = validator().validate_date_against_age(Some(date(2010, 1, 1)), 5);
        assert!(!check.is_valid());
        assert!(matches!(check.error, Some(ValidationError::NegativeAge { .. })));
        assert!(check.age_at_date < 0);
    }

    #[test]
    fn test_age_above_maximum() {
        let check = validator().validate_date_against_age(Some(date(2030, 1, 1)), 120);
        assert!(matches!(
            check.error,
            Some(ValidationError::AgeOutOfRange { max: 121, .. })
        ));
    }

    #[test]
    fn test_unset_date_is_valid() {
        let check = validator().validate_date_against_age(None, 45);
        assert!(check.is_valid());
        assert_eq!(check.age_at_date, 45);
    }

    #[test]
    fn test_custom_max_age() {
        let limits = ClinicalLimits {
            max_age_years: 100,
            ..ClinicalLimits::default()
        };
        let v = Validator::new(limits, date(2024, 6, 1));
        assert!(!v.validate_date_against_age(None, 101).is_valid());
        assert!(v.validate_date_against_age(None, 100).is_valid());
    }
}
