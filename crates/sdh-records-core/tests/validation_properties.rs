//! Date/age validation properties.

use chrono::{Duration, NaiveDate};
use proptest::prelude::*;

use sdh_records_core::config::ClinicalLimits;
use sdh_records_core::validation::{
    checked_days_between, days_between, validate_discharge_after_start, FieldValue, ValidationError,
    Validator,
};

fn date(s: &str) -> NaiveDate {
    NaiveDate::parse_from_str(s, "%Y-%m-%d").unwrap()
}

fn validator() -> Validator {
    Validator::new(ClinicalLimits::default(), date("2024-06-01"))
}

fn kind(error: &Option<ValidationError>) -> Option<&'static str> {
    error.as_ref().map(ValidationError::kind)
}

#[test]
fn test_discharge_before_start_rejected() {
    let check = validate_discharge_after_start(Some(date("2024-01-10")), Some(date("2024-01-05")));
    assert!(!check.is_valid());
    assert_eq!(kind(&check.error), Some("InvalidRange"));
}

#[test]
fn test_discharge_after_start_accepted() {
    let check = validate_discharge_after_start(Some(date("2024-01-05")), Some(date("2024-01-10")));
    assert!(check.is_valid());
}

#[test]
fn test_antecedent_days_bounds() {
    let v = validator();

    let check = v.validate_antecedent_days(-1, 30);
    assert_eq!(kind(&check.error), Some("NegativeValue"));

    // floor(30 * 365.25) = 10957
    let check = v.validate_antecedent_days(20000, 30);
    assert_eq!(
        check.error,
        Some(ValidationError::ExceedsPatientLifetime {
            days: 20000.0,
            max_days: 10957
        })
    );
    assert!(v.validate_antecedent_days(10957, 30).is_valid());
    assert!(!v.validate_antecedent_days("10957.5", 30).is_valid());

    let check = v.validate_antecedent_days("soon", 30);
    assert_eq!(kind(&check.error), Some("NotANumber"));
    assert!(v.validate_antecedent_days("", 30).is_valid());
    assert!(v.validate_antecedent_days(FieldValue::Empty, 30).is_valid());
}

#[test]
fn test_days_between() {
    assert_eq!(days_between(Some(date("2024-01-01")), Some(date("2024-01-11"))), 10);
    assert_eq!(days_between(None, Some(date("2024-01-11"))), 0);
    assert_eq!(days_between(Some(date("2024-01-11")), Some(date("2024-01-01"))), 0);
    assert!(checked_days_between(Some(date("2024-01-11")), Some(date("2024-01-01"))).is_err());
}

#[test]
fn test_nested_operative_scenario() {
    let v = validator();
    let start = Some(date("2020-06-01"));
    let discharge = Some(date("2020-06-15"));

    let inside = v.validate_nested_date(Some(date("2020-06-10")), start, discharge, 45);
    assert!(inside.is_valid());
    assert_eq!(inside.error, None);

    let before = v.validate_nested_date(Some(date("2020-05-01")), start, discharge, 45);
    assert!(!before.is_valid());
    assert_eq!(
        before.error,
        Some(ValidationError::BeforeLowerBound {
            bound: date("2020-06-01")
        })
    );
}

#[test]
fn test_age_violation_reported_before_range() {
    // Age 2 today: a 2010 date is before birth and also before the window
    let v = validator();
    let check = v.validate_nested_date(
        Some(date("2010-01-01")),
        Some(date("2023-01-01")),
        None,
        2,
    );
    assert_eq!(kind(&check.error), Some("NegativeAge"));
}

#[test]
fn test_age_out_of_range() {
    let v = validator();
    let check = v.validate_date_against_age(Some(date("2030-06-01")), 120);
    assert_eq!(kind(&check.error), Some("AgeOutOfRange"));
    assert_eq!(check.age_at_date, 126);
}

proptest! {
    #[test]
    fn prop_absent_date_keeps_current_age(age in 0u32..=121) {
        prop_assert_eq!(validator().age_at_date(age, None), i64::from(age));
    }

    #[test]
    fn prop_negative_age_always_rejected(age in 0u32..=121, days_back in 0i64..80_000) {
        let v = validator();
        let target = v.today() - Duration::days(days_back);
        let derived = v.age_at_date(age, Some(target));
        let check = v.validate_date_against_age(Some(target), age);

        prop_assert_eq!(check.age_at_date, derived);
        if derived < 0 {
            prop_assert!(!check.is_valid());
            prop_assert_eq!(kind(&check.error), Some("NegativeAge"));
        } else {
            prop_assert!(check.is_valid());
        }
    }

    #[test]
    fn prop_validators_are_idempotent(
        age in 0u32..=121,
        offset in -20_000i64..20_000,
        span in -400i64..400,
        days in -5.0f64..50_000.0,
    ) {
        let v = validator();
        let d = v.today() + Duration::days(offset);
        let lower = Some(d - Duration::days(span));

        prop_assert_eq!(
            v.validate_nested_date(Some(d), lower, None, age),
            v.validate_nested_date(Some(d), lower, None, age)
        );
        prop_assert_eq!(
            v.validate_antecedent_days(days, age),
            v.validate_antecedent_days(days, age)
        );
        prop_assert_eq!(
            validate_discharge_after_start(lower, Some(d)),
            validate_discharge_after_start(lower, Some(d))
        );
    }

    #[test]
    fn prop_days_between_never_negative(a in -5_000i64..5_000, b in -5_000i64..5_000) {
        let base = date("2020-01-01");
        let start = Some(base + Duration::days(a));
        let end = Some(base + Duration::days(b));
        let days = days_between(start, end);

        prop_assert!(days >= 0);
        prop_assert_eq!(days, (b - a).max(0));
    }
}
