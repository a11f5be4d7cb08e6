//! Patient record export (CSV/JSON).

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

use super::escape_csv;
use crate::db::{Database, DbError, DbResult};
use crate::models::{Episode, OperativeRecord, Patient};

const CSV_HEADER: &str = "patient_id,name,age_years,sex,anticoagulated,antiplatelet,\
episode_id,start_date,discharge_date,length_of_stay,age_at_episode,antecedent,\
time_since_antecedent_days,operative_id,operation_date,procedure,side,age_at_operation,\
days_from_admission,follow_ups,last_rankin,recurrence,max_thickness_mm\n";

/// Patient demographics heading an export.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PatientSummary {
    pub patient_id: String,
    pub server_id: Option<String>,
    pub name: String,
    pub age_years: u32,
    pub sex: String,
    pub anticoagulated: bool,
    pub antiplatelet: bool,
}

/// One (episode, operative record) pair. Episodes without surgery get a
/// single row with the operative columns empty.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RecordRow {
    pub episode_id: String,
    pub start_date: NaiveDate,
    pub discharge_date: Option<NaiveDate>,
    pub length_of_stay: Option<i64>,
    pub age_at_episode: i64,
    pub antecedent: String,
    pub time_since_antecedent_days: Option<u32>,
    pub operative_id: Option<String>,
    pub operation_date: Option<NaiveDate>,
    pub procedure: Option<String>,
    pub side: Option<String>,
    pub age_at_operation: Option<i64>,
    pub days_from_admission: Option<i64>,
    /// Follow-up visits recorded for the operation
    pub follow_ups: usize,
    /// Rankin score at the latest scored follow-up
    pub last_rankin: Option<u8>,
    pub recurrence: bool,
    /// Thickest hematoma measured during the episode
    pub max_thickness_mm: Option<f64>,
}

impl RecordRow {
    fn episode_only(episode: &Episode, max_thickness_mm: Option<f64>) -> Self {
        Self {
            episode_id: episode.local_id.clone(),
            start_date: episode.start_date,
            discharge_date: episode.discharge_date,
            length_of_stay: episode.length_of_stay(),
            age_at_episode: episode.age_at_episode,
            antecedent: episode.antecedent.as_str().to_string(),
            time_since_antecedent_days: episode.time_since_antecedent_days,
            operative_id: None,
            operation_date: None,
            procedure: None,
            side: None,
            age_at_operation: None,
            days_from_admission: None,
            follow_ups: 0,
            last_rankin: None,
            recurrence: false,
            max_thickness_mm,
        }
    }

    fn with_operation(mut self, record: &OperativeRecord) -> Self {
        self.operative_id = Some(record.local_id.clone());
        self.operation_date = Some(record.operation_date);
        self.procedure = Some(record.procedure.as_str().to_string());
        self.side = Some(record.side.as_str().to_string());
        self.age_at_operation = Some(record.age_at_operation);
        self.days_from_admission = Some(record.days_from_admission);
        self
    }
}

/// Everything recorded for one patient.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PatientRecordExport {
    pub patient: PatientSummary,
    pub rows: Vec<RecordRow>,
    pub exported_at: String,
}

fn opt<T: ToString>(value: Option<T>) -> String {
    value.map(|v| v.to_string()).unwrap_or_default()
}

impl PatientRecordExport {
    /// Export to JSON.
    pub fn to_json(&self) -> Result<String, serde_json::Error> {
        serde_json::to_string_pretty(self)
    }

    /// Export to CSV format.
    pub fn to_csv(&self) -> String {
        let mut csv = String::from(CSV_HEADER);
        self.write_rows(&mut csv);
        csv
    }

    fn write_rows(&self, csv: &mut String) {
        let p = &self.patient;
        for row in &self.rows {
            csv.push_str(&format!(
                "{},{},{},{},{},{},{},{},{},{},{},{},{},{},{},{},{},{},{},{},{},{},{}\n",
                escape_csv(&p.patient_id),
                escape_csv(&p.name),
                p.age_years,
                p.sex,
                p.anticoagulated,
                p.antiplatelet,
                escape_csv(&row.episode_id),
                row.start_date,
                opt(row.discharge_date),
                opt(row.length_of_stay),
                row.age_at_episode,
                row.antecedent,
                opt(row.time_since_antecedent_days),
                escape_csv(row.operative_id.as_deref().unwrap_or("")),
                opt(row.operation_date),
                row.procedure.as_deref().unwrap_or(""),
                row.side.as_deref().unwrap_or(""),
                opt(row.age_at_operation),
                opt(row.days_from_admission),
                row.follow_ups,
                opt(row.last_rankin),
                row.recurrence,
                opt(row.max_thickness_mm),
            ));
        }
    }
}

/// Export of every patient in the store.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BatchRecordExport {
    pub exported_at: String,
    pub patients: Vec<PatientRecordExport>,
    pub total_rows: usize,
}

impl BatchRecordExport {
    pub fn to_json(&self) -> Result<String, serde_json::Error> {
        serde_json::to_string_pretty(self)
    }

    pub fn to_csv(&self) -> String {
        let mut csv = String::from(CSV_HEADER);
        for export in &self.patients {
            export.write_rows(&mut csv);
        }
        csv
    }
}

/// Builds exports from the record store.
pub struct RecordExporter<'a> {
    db: &'a Database,
}

impl<'a> RecordExporter<'a> {
    pub fn new(db: &'a Database) -> Self {
        Self { db }
    }

    /// Export one patient by local ID.
    pub fn export_patient(&self, patient_id: &str) -> DbResult<PatientRecordExport> {
        let patient = self
            .db
            .get_patient(patient_id)?
            .ok_or_else(|| DbError::NotFound(format!("patient {}", patient_id)))?;
        self.build(&patient)
    }

    /// Export every patient.
    pub fn export_all(&self) -> DbResult<BatchRecordExport> {
        let mut patients = Vec::new();
        let mut total_rows = 0;

        for patient in self.db.list_patients()? {
            let export = self.build(&patient)?;
            total_rows += export.rows.len();
            patients.push(export);
        }

        Ok(BatchRecordExport {
            exported_at: chrono::Utc::now().to_rfc3339(),
            patients,
            total_rows,
        })
    }

    fn build(&self, patient: &Patient) -> DbResult<PatientRecordExport> {
        let mut rows = Vec::new();

        for episode in self.db.list_episodes_for_patient(&patient.local_id)? {
            let max_thickness_mm = self
                .db
                .list_hematomas_for_episode(&episode.local_id)?
                .iter()
                .map(|m| m.thickness_mm)
                .reduce(f64::max);
            let base = RecordRow::episode_only(&episode, max_thickness_mm);

            let operations = self.db.list_operative_records_for_episode(&episode.local_id)?;
            if operations.is_empty() {
                rows.push(base);
                continue;
            }

            for record in &operations {
                let follow_ups = self.db.list_post_operative_records(&record.local_id)?;
                let mut row = base.clone().with_operation(record);
                row.follow_ups = follow_ups.len();
                row.last_rankin = follow_ups.iter().rev().find_map(|f| f.rankin_score);
                row.recurrence = follow_ups.iter().any(|f| f.recurrence);
                rows.push(row);
            }
        }

        Ok(PatientRecordExport {
            patient: PatientSummary {
                patient_id: patient.local_id.clone(),
                server_id: patient.server_id.clone(),
                name: patient.name.clone(),
                age_years: patient.age_years,
                sex: patient.sex.as_str().to_string(),
                anticoagulated: patient.anticoagulated,
                antiplatelet: patient.antiplatelet,
            },
            rows,
            exported_at: chrono::Utc::now().to_rfc3339(),
        })
    }
}
