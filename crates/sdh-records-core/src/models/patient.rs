//! Patient models.

use std::str::FromStr;

use serde::{Deserialize, Serialize};

use super::{new_local_id, now_timestamp, UnknownCode};

/// Administrative sex as recorded at admission.
#[derive(Debug, Clone, Copy, Default, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum Sex {
    Male,
    Female,
    #[default]
    Unknown,
}

impl Sex {
    pub fn as_str(&self) -> &'static str {
        match self {
            Sex::Male => "male",
            Sex::Female => "female",
            Sex::Unknown => "unknown",
        }
    }
}

impl FromStr for Sex {
    type Err = UnknownCode;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "male" | "m" => Ok(Sex::Male),
            "female" | "f" => Ok(Sex::Female),
            "unknown" | "" => Ok(Sex::Unknown),
            _ => Err(UnknownCode::new("sex", s)),
        }
    }
}

/// A patient record with dual-ID support: the backend id arrives after the
/// first successful save.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Patient {
    /// Local UUID - always present, generated locally
    pub local_id: String,
    /// Backend ID - null until first sync
    pub server_id: Option<String>,
    /// Patient name
    pub name: String,
    /// Current age in whole years (0-121)
    pub age_years: u32,
    pub sex: Sex,
    /// On anticoagulant therapy at admission
    pub anticoagulated: bool,
    /// On antiplatelet therapy at admission
    pub antiplatelet: bool,
    /// Additional notes
    pub notes: Option<String>,
    /// Creation timestamp
    pub created_at: String,
    /// Last update timestamp
    pub updated_at: String,
}

impl Patient {
    /// Create a new patient with required fields.
    pub fn new(name: String, age_years: u32) -> Self {
        let now = now_timestamp();
        Self {
            local_id: new_local_id(),
            server_id: None,
            name,
            age_years,
            sex: Sex::Unknown,
            anticoagulated: false,
            antiplatelet: false,
            notes: None,
            created_at: now.clone(),
            updated_at: now,
        }
    }

    /// Check if this patient has been synced to server.
    pub fn is_synced(&self) -> bool {
        self.server_id.is_some()
    }

    /// On any antithrombotic medication.
    pub fn on_antithrombotics(&self) -> bool {
        self.anticoagulated || self.antiplatelet
    }
}
