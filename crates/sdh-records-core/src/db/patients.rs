//! Patient database operations.

use rusqlite::{params, OptionalExtension, Row};

use super::{code_column, Database, DbResult};
use crate::models::Patient;

const PATIENT_COLUMNS: &str = "local_id, server_id, name, age_years, sex, anticoagulated, \
                               antiplatelet, notes, created_at, updated_at";

fn patient_from_row(row: &Row<'_>) -> rusqlite::Result<Patient> {
    Ok(Patient {
        local_id: row.get(0)?,
        server_id: row.get(1)?,
        name: row.get(2)?,
        age_years: row.get(3)?,
        sex: code_column(row, 4)?,
        anticoagulated: row.get(5)?,
        antiplatelet: row.get(6)?,
        notes: row.get(7)?,
        created_at: row.get(8)?,
        updated_at: row.get(9)?,
    })
}

impl Database {
    /// Insert a new patient.
    pub fn insert_patient(&self, patient: &Patient) -> DbResult<()> {
        self.conn.execute(
            r#"
            INSERT INTO patients (
                local_id, server_id, name, age_years, sex, anticoagulated,
                antiplatelet, notes, created_at, updated_at
            ) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10)
            "#,
            params![
                patient.local_id,
                patient.server_id,
                patient.name,
                patient.age_years,
                patient.sex.as_str(),
                patient.anticoagulated,
                patient.antiplatelet,
                patient.notes,
                patient.created_at,
                patient.updated_at,
            ],
        )?;
        Ok(())
    }

    /// Update an existing patient.
    pub fn update_patient(&self, patient: &Patient) -> DbResult<bool> {
        let rows_affected = self.conn.execute(
            r#"
            UPDATE patients SET
                server_id = ?2,
                name = ?3,
                age_years = ?4,
                sex = ?5,
                anticoagulated = ?6,
                antiplatelet = ?7,
                notes = ?8,
                updated_at = datetime('now')
            WHERE local_id = ?1
            "#,
            params![
                patient.local_id,
                patient.server_id,
                patient.name,
                patient.age_years,
                patient.sex.as_str(),
                patient.anticoagulated,
                patient.antiplatelet,
                patient.notes,
            ],
        )?;
        Ok(rows_affected > 0)
    }

    /// Get a patient by local ID.
    pub fn get_patient(&self, local_id: &str) -> DbResult<Option<Patient>> {
        self.conn
            .query_row(
                &format!("SELECT {PATIENT_COLUMNS} FROM patients WHERE local_id = ?"),
                [local_id],
                patient_from_row,
            )
            .optional()
            .map_err(Into::into)
    }

    /// Get a patient by server ID.
    pub fn get_patient_by_server_id(&self, server_id: &str) -> DbResult<Option<Patient>> {
        self.conn
            .query_row(
                &format!("SELECT {PATIENT_COLUMNS} FROM patients WHERE server_id = ?"),
                [server_id],
                patient_from_row,
            )
            .optional()
            .map_err(Into::into)
    }

    /// Search patients by name (prefix match).
    pub fn search_patients(&self, query: &str, limit: usize) -> DbResult<Vec<Patient>> {
        let pattern = format!("{}%", query);
        let mut stmt = self.conn.prepare(&format!(
            "SELECT {PATIENT_COLUMNS} FROM patients WHERE name LIKE ? ORDER BY name LIMIT ?"
        ))?;

        let rows = stmt.query_map(params![pattern, limit as i64], patient_from_row)?;
        rows.collect::<Result<Vec<_>, _>>().map_err(Into::into)
    }

    /// List all patients.
    pub fn list_patients(&self) -> DbResult<Vec<Patient>> {
        let mut stmt = self
            .conn
            .prepare(&format!("SELECT {PATIENT_COLUMNS} FROM patients ORDER BY name"))?;

        let rows = stmt.query_map([], patient_from_row)?;
        rows.collect::<Result<Vec<_>, _>>().map_err(Into::into)
    }

    /// Delete a patient and, by cascade, all of their records.
    pub fn delete_patient(&self, local_id: &str) -> DbResult<bool> {
        let rows_affected = self
            .conn
            .execute("DELETE FROM patients WHERE local_id = ?", [local_id])?;
        Ok(rows_affected > 0)
    }

    /// Link local patient to server ID after first sync.
    pub fn link_patient_server_id(&self, local_id: &str, server_id: &str) -> DbResult<bool> {
        let rows_affected = self.conn.execute(
            "UPDATE patients SET server_id = ?, updated_at = datetime('now') WHERE local_id = ?",
            [server_id, local_id],
        )?;
        Ok(rows_affected > 0)
    }
}
