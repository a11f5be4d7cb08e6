//! Clinical limits used by the validators.

use std::path::Path;

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Oldest plausible patient age, in years.
pub const MAX_AGE_YEARS: i64 = 121;

/// Average year length used for every day/year conversion.
pub const DAYS_PER_YEAR: f64 = 365.25;

/// Configuration loading errors.
#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("Failed to read limits file: {0}")]
    Io(#[from] std::io::Error),

    #[error("Invalid limits file: {0}")]
    Json(#[from] serde_json::Error),

    #[error("Invalid limits: {0}")]
    Invalid(String),
}

/// Numeric bounds applied by the validators and form controllers.
///
/// Every field has a default, so a limits file only needs to name the
/// values it overrides:
///
/// ```json
/// { "max_age_years": 110 }
/// ```
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ClinicalLimits {
    /// Largest age a date may imply for the patient
    pub max_age_years: i64,
    /// Days per year for age and lifetime conversions
    pub days_per_year: f64,
    /// Highest modified Rankin scale score
    pub max_rankin: u8,
    /// Lowest Glasgow coma scale score
    pub min_gcs: u8,
    /// Highest Glasgow coma scale score
    pub max_gcs: u8,
}

impl Default for ClinicalLimits {
    fn default() -> Self {
        Self {
            max_age_years: MAX_AGE_YEARS,
            days_per_year: DAYS_PER_YEAR,
            max_rankin: 6,
            min_gcs: 3,
            max_gcs: 15,
        }
    }
}

impl ClinicalLimits {
    /// Parse limits from a JSON document.
    pub fn from_json(json: &str) -> Result<Self, ConfigError> {
        let limits: Self = serde_json::from_str(json)?;
        limits.check()?;
        Ok(limits)
    }

    /// Load limits from a JSON file.
    pub fn from_json_file<P: AsRef<Path>>(path: P) -> Result<Self, ConfigError> {
        let json = std::fs::read_to_string(path)?;
        Self::from_json(&json)
    }

    /// Lifetime of a patient of the given age, in whole days.
    pub fn lifetime_days(&self, age_years: u32) -> i64 {
        (f64::from(age_years) * self.days_per_year).floor() as i64
    }

    fn check(&self) -> Result<(), ConfigError> {
        if self.max_age_years < 0 {
            return Err(ConfigError::Invalid("max_age_years must be >= 0".into()));
        }
        if !(self.days_per_year.is_finite() && self.days_per_year > 0.0) {
            return Err(ConfigError::Invalid("days_per_year must be > 0".into()));
        }
        if self.min_gcs > self.max_gcs {
            return Err(ConfigError::Invalid("min_gcs must be <= max_gcs".into()));
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        let limits = ClinicalLimits::default();
        assert_eq!(limits.max_age_years, 121);
        assert_eq!(limits.days_per_year, 365.25);
        assert_eq!(limits.lifetime_days(30), 10957);
    }

    #[test]
    fn test_partial_override() {
        let limits = ClinicalLimits::from_json(r#"{"max_age_years": 110}"#).unwrap();
        assert_eq!(limits.max_age_years, 110);
        assert_eq!(limits.max_rankin, 6);
    }

    #[test]
    fn test_rejects_bad_values() {
        assert!(ClinicalLimits::from_json(r#"{"days_per_year": 0}"#).is_err());
        assert!(ClinicalLimits::from_json(r#"{"min_gcs": 16}"#).is_err());
        assert!(ClinicalLimits::from_json("not json").is_err());
    }

    #[test]
    fn test_from_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("limits.json");
        std::fs::write(&path, r#"{"max_rankin": 5}"#).unwrap();

        let limits = ClinicalLimits::from_json_file(&path).unwrap();
        assert_eq!(limits.max_rankin, 5);
    }
}
