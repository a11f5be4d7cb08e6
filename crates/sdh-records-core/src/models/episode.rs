//! Clinical episode models.

use std::str::FromStr;

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

use super::{new_local_id, now_timestamp, UnknownCode};

/// Event preceding the hematoma.
#[derive(Debug, Clone, Copy, Default, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum Antecedent {
    /// No known antecedent
    None,
    /// Fall from standing height or similar
    MinorTrauma,
    MajorTrauma,
    /// Spontaneous or iatrogenic (e.g. lumbar puncture)
    NonTraumatic,
    #[default]
    Unknown,
}

impl Antecedent {
    pub fn as_str(&self) -> &'static str {
        match self {
            Antecedent::None => "none",
            Antecedent::MinorTrauma => "minor_trauma",
            Antecedent::MajorTrauma => "major_trauma",
            Antecedent::NonTraumatic => "non_traumatic",
            Antecedent::Unknown => "unknown",
        }
    }

    /// Whether a "time since antecedent" makes sense for this antecedent.
    pub fn has_onset(&self) -> bool {
        !matches!(self, Antecedent::None | Antecedent::Unknown)
    }
}

impl FromStr for Antecedent {
    type Err = UnknownCode;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim() {
            "none" => Ok(Antecedent::None),
            "minor_trauma" => Ok(Antecedent::MinorTrauma),
            "major_trauma" => Ok(Antecedent::MajorTrauma),
            "non_traumatic" => Ok(Antecedent::NonTraumatic),
            "unknown" | "" => Ok(Antecedent::Unknown),
            _ => Err(UnknownCode::new("antecedent", s)),
        }
    }
}

/// A bounded clinical period for a patient.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Episode {
    pub local_id: String,
    pub server_id: Option<String>,
    /// Patient local ID
    pub patient_id: String,
    /// Admission date
    pub start_date: NaiveDate,
    /// Discharge date; open episode while unset
    pub discharge_date: Option<NaiveDate>,
    pub antecedent: Antecedent,
    /// Days between the antecedent event and admission
    pub time_since_antecedent_days: Option<u32>,
    /// Patient age on the start date, derived at submission
    pub age_at_episode: i64,
    /// Glasgow coma scale on admission
    pub gcs_on_admission: Option<u8>,
    pub notes: Option<String>,
    pub created_at: String,
    pub updated_at: String,
}

impl Episode {
    /// Create a new open episode.
    pub fn new(patient_id: String, start_date: NaiveDate, age_at_episode: i64) -> Self {
        let now = now_timestamp();
        Self {
            local_id: new_local_id(),
            server_id: None,
            patient_id,
            start_date,
            discharge_date: None,
            antecedent: Antecedent::Unknown,
            time_since_antecedent_days: None,
            age_at_episode,
            gcs_on_admission: None,
            notes: None,
            created_at: now.clone(),
            updated_at: now,
        }
    }

    pub fn is_open(&self) -> bool {
        self.discharge_date.is_none()
    }

    /// Last date a nested record may carry: the discharge date, or `today`
    /// while the episode is open.
    pub fn window_end(&self, today: NaiveDate) -> NaiveDate {
        self.discharge_date.unwrap_or(today)
    }

    /// Length of stay in days, once discharged.
    pub fn length_of_stay(&self) -> Option<i64> {
        self.discharge_date
            .map(|end| crate::validation::days_between(Some(self.start_date), Some(end)))
    }

    /// Touch the updated_at timestamp.
    pub fn touch(&mut self) {
        self.updated_at = now_timestamp();
    }
}
