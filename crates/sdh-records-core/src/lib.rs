//! SDH Records Core Library
//!
//! Local record store and form logic for patients with chronic subdural
//! hematoma: episodes, operative records, post-operative follow-ups and
//! hematoma measurements.
//!
//! # Architecture
//!
//! ```text
//!  Edit modal opens ──► Form controller (raw field text)
//!                              │
//!                   set_field ─┤─► Validator (date/age, ranges, numbers)
//!                              │        │
//!                              │   inline errors
//!                              ▼
//!                       submit ──► typed payload ──► Command ──► Database
//!                                                                  │
//!                                           Sidebar / AppState ◄───┤
//!                                                Export (CSV/JSON) ◄┘
//! ```
//!
//! # Modules
//!
//! - [`validation`]: pure date/age and numeric checks
//! - [`forms`]: per-entity form controllers
//! - [`commands`]: submission boundary to the store
//! - [`db`]: SQLite record store
//! - [`sidebar`] and [`state`]: persisted navigation state
//! - [`export`]: CSV/JSON export

pub mod commands;
pub mod config;
pub mod db;
pub mod export;
pub mod forms;
pub mod models;
pub mod sidebar;
pub mod state;
pub mod validation;

// Re-export commonly used types
pub use commands::{apply, Command, CommandOutcome};
pub use config::ClinicalLimits;
pub use db::Database;
pub use forms::{FormController, FormErrors, RowErrors};
pub use models::{
    Antecedent, Episode, HematomaBatch, HematomaMeasurement, OperativeRecord, Patient,
    PostOperativeRecord, Sex,
};
pub use sidebar::{NodePath, SidebarState};
pub use state::AppState;
pub use validation::{Check, DateCheck, ValidationError, Validator};

use std::path::Path;
use std::sync::{Arc, Mutex};

use chrono::NaiveDate;
use tracing::info;

use export::{BatchRecordExport, PatientRecordExport, RecordExporter};
use forms::{ChildDates, EpisodeForm, HematomaListEditor, OperativeForm, PostOperativeForm};

// =========================================================================
// Error Type
// =========================================================================

#[derive(Debug, thiserror::Error)]
pub enum RecordsError {
    #[error("Database error: {0}")]
    Database(#[from] db::DbError),

    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    #[error("Form rejected: {0}")]
    Form(#[from] FormErrors),

    #[error("Measurements rejected: {0}")]
    Rows(#[from] RowErrors),

    #[error("Not found: {0}")]
    NotFound(String),

    #[error("Invalid input: {0}")]
    InvalidInput(String),

    #[error("Lock poisoned: {0}")]
    LockPoisoned(String),
}

impl<T> From<std::sync::PoisonError<T>> for RecordsError {
    fn from(e: std::sync::PoisonError<T>) -> Self {
        RecordsError::LockPoisoned(e.to_string())
    }
}

pub type RecordsResult<T> = Result<T, RecordsError>;

// =========================================================================
// Main API Object
// =========================================================================

/// Thread-safe entry point: the record store plus the clinical limits used
/// to validate forms.
pub struct ClinicalRecords {
    db: Arc<Mutex<Database>>,
    limits: ClinicalLimits,
    today: Option<NaiveDate>,
}

impl ClinicalRecords {
    /// Open or create a store at the given path.
    pub fn open<P: AsRef<Path>>(path: P, limits: ClinicalLimits) -> RecordsResult<Self> {
        Ok(Self::with_database(Database::open(path)?, limits))
    }

    /// Create an in-memory store (for testing).
    pub fn open_in_memory(limits: ClinicalLimits) -> RecordsResult<Self> {
        Ok(Self::with_database(Database::open_in_memory()?, limits))
    }

    fn with_database(db: Database, limits: ClinicalLimits) -> Self {
        Self {
            db: Arc::new(Mutex::new(db)),
            limits,
            today: None,
        }
    }

    /// Pin "today" instead of reading the clock.
    pub fn with_today(mut self, today: NaiveDate) -> Self {
        self.today = Some(today);
        self
    }

    pub fn limits(&self) -> &ClinicalLimits {
        &self.limits
    }

    /// Validator for a form opened now.
    pub fn validator(&self) -> Validator {
        match self.today {
            Some(today) => Validator::new(self.limits.clone(), today),
            None => Validator::for_today(self.limits.clone()),
        }
    }

    // =========================================================================
    // Patient Operations
    // =========================================================================

    /// Create a new patient.
    pub fn create_patient(&self, name: String, age_years: u32) -> RecordsResult<Patient> {
        if name.trim().is_empty() {
            return Err(RecordsError::InvalidInput("patient name is required".into()));
        }
        if i64::from(age_years) > self.limits.max_age_years {
            return Err(RecordsError::InvalidInput(format!(
                "age {} exceeds the maximum of {} years",
                age_years, self.limits.max_age_years
            )));
        }

        let db = self.db.lock()?;
        let patient = Patient::new(name.trim().to_string(), age_years);
        db.insert_patient(&patient)?;
        info!(patient_id = %patient.local_id, "patient created");
        Ok(patient)
    }

    /// Get a patient by local ID.
    pub fn get_patient(&self, local_id: &str) -> RecordsResult<Option<Patient>> {
        let db = self.db.lock()?;
        Ok(db.get_patient(local_id)?)
    }

    /// Search patients by name.
    pub fn search_patients(&self, query: &str, limit: usize) -> RecordsResult<Vec<Patient>> {
        let db = self.db.lock()?;
        Ok(db.search_patients(query, limit)?)
    }

    pub fn list_episodes(&self, patient_id: &str) -> RecordsResult<Vec<Episode>> {
        let db = self.db.lock()?;
        Ok(db.list_episodes_for_patient(patient_id)?)
    }

    pub fn list_operative_records(&self, episode_id: &str) -> RecordsResult<Vec<OperativeRecord>> {
        let db = self.db.lock()?;
        Ok(db.list_operative_records_for_episode(episode_id)?)
    }

    pub fn list_post_operative_records(
        &self,
        operative_record_id: &str,
    ) -> RecordsResult<Vec<PostOperativeRecord>> {
        let db = self.db.lock()?;
        Ok(db.list_post_operative_records(operative_record_id)?)
    }

    // =========================================================================
    // Form Operations
    // =========================================================================

    /// Blank episode form for a patient.
    pub fn episode_form(&self, patient_id: &str) -> RecordsResult<EpisodeForm> {
        let db = self.db.lock()?;
        let patient = require_patient(&db, patient_id)?;
        Ok(EpisodeForm::create(self.validator(), patient.local_id, patient.age_years))
    }

    /// Episode form pre-filled from the store. Its dates cannot be moved
    /// past the operations and follow-ups stored under it.
    pub fn edit_episode_form(&self, episode_id: &str) -> RecordsResult<EpisodeForm> {
        let db = self.db.lock()?;
        let episode = require_episode(&db, episode_id)?;
        let patient = require_patient(&db, &episode.patient_id)?;
        let children = ChildDates::from_dates(db.dates_within_episode(&episode.local_id)?);
        Ok(EpisodeForm::edit(self.validator(), patient.age_years, episode).with_children(children))
    }

    /// Blank operative record form within an episode.
    pub fn operative_form(&self, episode_id: &str) -> RecordsResult<OperativeForm> {
        let db = self.db.lock()?;
        let episode = require_episode(&db, episode_id)?;
        let patient = require_patient(&db, &episode.patient_id)?;
        Ok(OperativeForm::create(self.validator(), patient.age_years, &episode))
    }

    pub fn edit_operative_form(&self, record_id: &str) -> RecordsResult<OperativeForm> {
        let db = self.db.lock()?;
        let record = require_operative(&db, record_id)?;
        let episode = require_episode(&db, &record.episode_id)?;
        let patient = require_patient(&db, &episode.patient_id)?;
        let follow_ups = ChildDates::from_dates(db.follow_up_dates(&record.local_id)?);
        Ok(OperativeForm::edit(self.validator(), patient.age_years, &episode, record)
            .with_follow_ups(follow_ups))
    }

    /// Blank follow-up form under an operative record.
    pub fn post_operative_form(&self, operative_record_id: &str) -> RecordsResult<PostOperativeForm> {
        let db = self.db.lock()?;
        let operative = require_operative(&db, operative_record_id)?;
        let episode = require_episode(&db, &operative.episode_id)?;
        let patient = require_patient(&db, &episode.patient_id)?;
        Ok(PostOperativeForm::create(
            self.validator(),
            patient.age_years,
            &episode,
            &operative,
        ))
    }

    pub fn edit_post_operative_form(&self, record_id: &str) -> RecordsResult<PostOperativeForm> {
        let db = self.db.lock()?;
        let record = db
            .get_post_operative_record(record_id)?
            .ok_or_else(|| RecordsError::NotFound(format!("post-operative record {}", record_id)))?;
        let operative = require_operative(&db, &record.operative_record_id)?;
        let episode = require_episode(&db, &operative.episode_id)?;
        let patient = require_patient(&db, &episode.patient_id)?;
        Ok(PostOperativeForm::edit(
            self.validator(),
            patient.age_years,
            &episode,
            &operative,
            record,
        ))
    }

    /// Measurement list editor for an episode, loaded with stored rows.
    pub fn hematoma_editor(&self, episode_id: &str) -> RecordsResult<HematomaListEditor> {
        let db = self.db.lock()?;
        let episode = require_episode(&db, episode_id)?;
        let rows = db.list_hematomas_for_episode(&episode.local_id)?;
        Ok(HematomaListEditor::new(episode.local_id, rows))
    }

    /// Submit a form and persist its payload.
    pub fn submit<F>(&self, form: &mut F) -> RecordsResult<CommandOutcome>
    where
        F: FormController,
        F::Payload: Into<Command>,
    {
        let payload = form.submit()?;
        self.execute(payload.into())
    }

    /// Submit a measurement list as one batch.
    pub fn submit_hematomas(&self, editor: &mut HematomaListEditor) -> RecordsResult<CommandOutcome> {
        let batch = editor.submit()?;
        self.execute(Command::SyncHematomas(batch))
    }

    /// Apply a command to the store.
    pub fn execute(&self, command: Command) -> RecordsResult<CommandOutcome> {
        let mut db = self.db.lock()?;
        Ok(commands::apply(&mut db, command)?)
    }

    // =========================================================================
    // App State Operations
    // =========================================================================

    pub fn load_app_state(&self) -> RecordsResult<AppState> {
        let db = self.db.lock()?;
        Ok(AppState::load(&db)?)
    }

    pub fn save_app_state(&self, state: &AppState) -> RecordsResult<()> {
        let db = self.db.lock()?;
        Ok(state.save(&db)?)
    }

    // =========================================================================
    // Export Operations
    // =========================================================================

    pub fn export_patient(&self, patient_id: &str) -> RecordsResult<PatientRecordExport> {
        let db = self.db.lock()?;
        Ok(RecordExporter::new(&db).export_patient(patient_id)?)
    }

    pub fn export_all(&self) -> RecordsResult<BatchRecordExport> {
        let db = self.db.lock()?;
        Ok(RecordExporter::new(&db).export_all()?)
    }

    /// Export all records as CSV.
    pub fn export_csv(&self) -> RecordsResult<String> {
        Ok(self.export_all()?.to_csv())
    }

    /// Export all records as JSON.
    pub fn export_json(&self) -> RecordsResult<String> {
        Ok(self.export_all()?.to_json()?)
    }
}

fn require_patient(db: &Database, local_id: &str) -> RecordsResult<Patient> {
    db.get_patient(local_id)?
        .ok_or_else(|| RecordsError::NotFound(format!("patient {}", local_id)))
}

fn require_episode(db: &Database, local_id: &str) -> RecordsResult<Episode> {
    db.get_episode(local_id)?
        .ok_or_else(|| RecordsError::NotFound(format!("episode {}", local_id)))
}

fn require_operative(db: &Database, local_id: &str) -> RecordsResult<OperativeRecord> {
    db.get_operative_record(local_id)?
        .ok_or_else(|| RecordsError::NotFound(format!("operative record {}", local_id)))
}
