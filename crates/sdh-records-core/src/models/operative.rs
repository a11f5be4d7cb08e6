//! Operative (surgical) record models.

use std::str::FromStr;

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

use super::{new_local_id, now_timestamp, UnknownCode};

/// Surgical technique.
#[derive(Debug, Clone, Copy, Default, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum Procedure {
    #[default]
    BurrHole,
    TwistDrill,
    Craniotomy,
    /// Middle meningeal artery embolization
    MmaEmbolization,
    Other,
}

impl Procedure {
    pub fn as_str(&self) -> &'static str {
        match self {
            Procedure::BurrHole => "burr_hole",
            Procedure::TwistDrill => "twist_drill",
            Procedure::Craniotomy => "craniotomy",
            Procedure::MmaEmbolization => "mma_embolization",
            Procedure::Other => "other",
        }
    }
}

impl FromStr for Procedure {
    type Err = UnknownCode;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim() {
            "burr_hole" => Ok(Procedure::BurrHole),
            "twist_drill" => Ok(Procedure::TwistDrill),
            "craniotomy" => Ok(Procedure::Craniotomy),
            "mma_embolization" => Ok(Procedure::MmaEmbolization),
            "other" => Ok(Procedure::Other),
            _ => Err(UnknownCode::new("procedure", s)),
        }
    }
}

/// Hemisphere affected or operated on.
#[derive(Debug, Clone, Copy, Default, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum Side {
    #[default]
    Left,
    Right,
    Bilateral,
}

impl Side {
    pub fn as_str(&self) -> &'static str {
        match self {
            Side::Left => "left",
            Side::Right => "right",
            Side::Bilateral => "bilateral",
        }
    }
}

impl FromStr for Side {
    type Err = UnknownCode;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "left" | "l" => Ok(Side::Left),
            "right" | "r" => Ok(Side::Right),
            "bilateral" | "both" => Ok(Side::Bilateral),
            _ => Err(UnknownCode::new("side", s)),
        }
    }
}

/// A surgical intervention nested within an episode.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct OperativeRecord {
    pub local_id: String,
    pub server_id: Option<String>,
    /// Owning episode local ID
    pub episode_id: String,
    pub operation_date: NaiveDate,
    pub procedure: Procedure,
    pub side: Side,
    /// Subdural drain left in place
    pub drain_placed: bool,
    /// Patient age on the operation date, derived at submission
    pub age_at_operation: i64,
    /// Days from episode start to the operation
    pub days_from_admission: i64,
    pub notes: Option<String>,
    pub created_at: String,
    pub updated_at: String,
}

impl OperativeRecord {
    pub fn new(episode_id: String, operation_date: NaiveDate) -> Self {
        let now = now_timestamp();
        Self {
            local_id: new_local_id(),
            server_id: None,
            episode_id,
            operation_date,
            procedure: Procedure::default(),
            side: Side::default(),
            drain_placed: false,
            age_at_operation: 0,
            days_from_admission: 0,
            notes: None,
            created_at: now.clone(),
            updated_at: now,
        }
    }
}
