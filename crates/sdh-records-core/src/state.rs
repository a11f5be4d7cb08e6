//! Application state with an explicit load/save lifecycle.

use tracing::debug;

use crate::db::{Database, DbResult};
use crate::sidebar::{KnownIds, NodePath, SidebarState};

/// Storage key of the selected patient id.
pub const SELECTED_PATIENT_KEY: &str = "selectedPatient";

/// UI state that outlives a session.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct AppState {
    pub sidebar: SidebarState,
    pub selected_patient: Option<String>,
}

impl AppState {
    /// Load persisted state, dropping references to records that no longer
    /// exist.
    pub fn load(db: &Database) -> DbResult<Self> {
        let mut sidebar = SidebarState::load(db)?;
        let known = KnownIds::load(db)?;
        let pruned = sidebar.retain_known(&known);
        if pruned > 0 {
            debug!(pruned, "pruned stale sidebar entries");
        }

        let selected_patient = match db.load_state(SELECTED_PATIENT_KEY)? {
            Some(json) => serde_json::from_str::<Option<String>>(&json)
                .ok()
                .flatten()
                .filter(|id| known.patients.contains(id)),
            None => None,
        };

        Ok(Self {
            sidebar,
            selected_patient,
        })
    }

    pub fn save(&self, db: &Database) -> DbResult<()> {
        self.sidebar.save(db)?;
        db.save_state(
            SELECTED_PATIENT_KEY,
            &serde_json::to_string(&self.selected_patient)?,
        )
    }

    /// Select a patient and reveal it in the sidebar.
    pub fn select_patient(&mut self, patient_id: &str) {
        self.sidebar.expand(&NodePath::patient(patient_id));
        self.selected_patient = Some(patient_id.to_string());
    }

    pub fn clear_selection(&mut self) {
        self.selected_patient = None;
    }
}
