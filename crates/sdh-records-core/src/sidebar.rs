//! Expand/collapse state of the clinical navigation tree.
//!
//! The tree is Patients → patient → episode → operative record. Each node
//! remembers whether it was expanded; a node is shown expanded only when it
//! and every ancestor are. Collapsing a node therefore hides its subtree
//! without forgetting how the subtree was laid out.

use std::collections::{BTreeSet, HashSet};

use serde::{Deserialize, Serialize};
use tracing::{debug, warn};

use crate::db::{Database, DbResult};

/// Storage key of the persisted sidebar state.
pub const SIDEBAR_STATE_KEY: &str = "sidebarState";

const PATIENTS_KEY: &str = "patients";

/// Address of a node in the navigation tree.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum NodePath {
    Patients,
    Patient {
        patient_id: String,
    },
    Episode {
        patient_id: String,
        episode_id: String,
    },
    OperativeRecord {
        patient_id: String,
        episode_id: String,
        operative_id: String,
    },
}

impl NodePath {
    pub fn patient(patient_id: impl Into<String>) -> Self {
        NodePath::Patient {
            patient_id: patient_id.into(),
        }
    }

    pub fn episode(patient_id: impl Into<String>, episode_id: impl Into<String>) -> Self {
        NodePath::Episode {
            patient_id: patient_id.into(),
            episode_id: episode_id.into(),
        }
    }

    pub fn operative(
        patient_id: impl Into<String>,
        episode_id: impl Into<String>,
        operative_id: impl Into<String>,
    ) -> Self {
        NodePath::OperativeRecord {
            patient_id: patient_id.into(),
            episode_id: episode_id.into(),
            operative_id: operative_id.into(),
        }
    }

    pub fn parent(&self) -> Option<NodePath> {
        match self {
            NodePath::Patients => None,
            NodePath::Patient { .. } => Some(NodePath::Patients),
            NodePath::Episode { patient_id, .. } => Some(NodePath::patient(patient_id.clone())),
            NodePath::OperativeRecord {
                patient_id,
                episode_id,
                ..
            } => Some(NodePath::episode(patient_id.clone(), episode_id.clone())),
        }
    }

    /// Stored key: level prefix plus the node's own id.
    fn key(&self) -> String {
        match self {
            NodePath::Patients => PATIENTS_KEY.to_string(),
            NodePath::Patient { patient_id } => format!("patient:{}", patient_id),
            NodePath::Episode { episode_id, .. } => format!("episode:{}", episode_id),
            NodePath::OperativeRecord { operative_id, .. } => format!("operative:{}", operative_id),
        }
    }
}

/// Record ids currently in the store, used to prune stale sidebar entries.
#[derive(Debug, Clone, Default)]
pub struct KnownIds {
    pub patients: HashSet<String>,
    pub episodes: HashSet<String>,
    pub operative_records: HashSet<String>,
}

impl KnownIds {
    /// Collect every patient, episode and operative record id in the store.
    pub fn load(db: &Database) -> DbResult<Self> {
        let mut known = KnownIds::default();
        for patient in db.list_patients()? {
            for episode in db.list_episodes_for_patient(&patient.local_id)? {
                for record in db.list_operative_records_for_episode(&episode.local_id)? {
                    known.operative_records.insert(record.local_id);
                }
                known.episodes.insert(episode.local_id);
            }
            known.patients.insert(patient.local_id);
        }
        Ok(known)
    }

    fn contains_key(&self, key: &str) -> bool {
        if key == PATIENTS_KEY {
            return true;
        }
        match key.split_once(':') {
            Some(("patient", id)) => self.patients.contains(id),
            Some(("episode", id)) => self.episodes.contains(id),
            Some(("operative", id)) => self.operative_records.contains(id),
            _ => false,
        }
    }
}

/// Remembered expansion flags, persisted as JSON.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct SidebarState {
    expanded: BTreeSet<String>,
}

impl SidebarState {
    /// Whether the node is shown expanded.
    pub fn is_expanded(&self, path: &NodePath) -> bool {
        let mut current = Some(path.clone());
        while let Some(node) = current {
            if !self.expanded.contains(&node.key()) {
                return false;
            }
            current = node.parent();
        }
        true
    }

    /// Expand a node and every ancestor so it becomes visible.
    pub fn expand(&mut self, path: &NodePath) {
        let mut current = Some(path.clone());
        while let Some(node) = current {
            self.expanded.insert(node.key());
            current = node.parent();
        }
    }

    /// Collapse a node. Descendants keep their remembered flags.
    pub fn collapse(&mut self, path: &NodePath) {
        self.expanded.remove(&path.key());
    }

    /// Flip the node's shown state; returns the new state.
    pub fn toggle(&mut self, path: &NodePath) -> bool {
        if self.is_expanded(path) {
            self.collapse(path);
            false
        } else {
            self.expand(path);
            true
        }
    }

    pub fn collapse_all(&mut self) {
        self.expanded.clear();
    }

    /// Forget nodes whose records no longer exist. Returns how many were
    /// dropped.
    pub fn retain_known(&mut self, known: &KnownIds) -> usize {
        let before = self.expanded.len();
        self.expanded.retain(|key| known.contains_key(key));
        before - self.expanded.len()
    }

    /// Load the persisted state. Missing or unreadable state yields the
    /// default (everything collapsed).
    pub fn load(db: &Database) -> DbResult<Self> {
        let Some(json) = db.load_state(SIDEBAR_STATE_KEY)? else {
            return Ok(Self::default());
        };
        match serde_json::from_str(&json) {
            Ok(state) => Ok(state),
            Err(e) => {
                warn!(error = %e, "discarding unreadable sidebar state");
                Ok(Self::default())
            }
        }
    }

    pub fn save(&self, db: &Database) -> DbResult<()> {
        let json = serde_json::to_string(self)?;
        db.save_state(SIDEBAR_STATE_KEY, &json)?;
        debug!(expanded = self.expanded.len(), "sidebar state saved");
        Ok(())
    }
}
