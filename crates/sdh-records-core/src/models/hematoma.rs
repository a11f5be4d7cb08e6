//! Hematoma measurement models.

use std::str::FromStr;

use serde::{Deserialize, Serialize};

use super::{new_local_id, now_timestamp, Side, UnknownCode};

/// CT density relative to brain parenchyma.
#[derive(Debug, Clone, Copy, Default, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum Density {
    Hypodense,
    Isodense,
    Hyperdense,
    #[default]
    Mixed,
}

impl Density {
    pub fn as_str(&self) -> &'static str {
        match self {
            Density::Hypodense => "hypodense",
            Density::Isodense => "isodense",
            Density::Hyperdense => "hyperdense",
            Density::Mixed => "mixed",
        }
    }
}

impl FromStr for Density {
    type Err = UnknownCode;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "hypodense" => Ok(Density::Hypodense),
            "isodense" => Ok(Density::Isodense),
            "hyperdense" => Ok(Density::Hyperdense),
            "mixed" => Ok(Density::Mixed),
            _ => Err(UnknownCode::new("density", s)),
        }
    }
}

/// One imaging measurement of a hematoma during an episode.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct HematomaMeasurement {
    pub local_id: String,
    pub server_id: Option<String>,
    /// Owning episode local ID
    pub episode_id: String,
    pub side: Side,
    /// Maximal thickness in millimetres
    pub thickness_mm: f64,
    pub midline_shift_mm: Option<f64>,
    pub volume_ml: Option<f64>,
    pub density: Density,
    pub created_at: String,
    pub updated_at: String,
}

impl HematomaMeasurement {
    pub fn new(episode_id: String, side: Side, thickness_mm: f64) -> Self {
        let now = now_timestamp();
        Self {
            local_id: new_local_id(),
            server_id: None,
            episode_id,
            side,
            thickness_mm,
            midline_shift_mm: None,
            volume_ml: None,
            density: Density::default(),
            created_at: now.clone(),
            updated_at: now,
        }
    }
}

/// Create/update/delete set for an episode's measurements, saved as one
/// unit.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
pub struct HematomaBatch {
    pub create: Vec<HematomaMeasurement>,
    pub update: Vec<HematomaMeasurement>,
    /// Local IDs to delete
    pub delete: Vec<String>,
}

impl HematomaBatch {
    pub fn is_empty(&self) -> bool {
        self.create.is_empty() && self.update.is_empty() && self.delete.is_empty()
    }

    /// Number of operations in the batch.
    pub fn len(&self) -> usize {
        self.create.len() + self.update.len() + self.delete.len()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_density_codes() {
        assert_eq!("Hyperdense".parse::<Density>().unwrap(), Density::Hyperdense);
        assert_eq!(Density::Isodense.as_str(), "isodense");
        assert!("bright".parse::<Density>().is_err());
    }

    #[test]
    fn test_new_measurement() {
        let m = HematomaMeasurement::new("episode-1".into(), Side::Right, 14.5);
        assert_eq!(m.side, Side::Right);
        assert_eq!(m.thickness_mm, 14.5);
        assert_eq!(m.density, Density::Mixed);
    }

    #[test]
    fn test_batch_len() {
        let mut batch = HematomaBatch::default();
        assert!(batch.is_empty());

        batch.create.push(HematomaMeasurement::new("e".into(), Side::Left, 10.0));
        batch.delete.push("old".into());
        assert_eq!(batch.len(), 2);
        assert!(!batch.is_empty());
    }
}
