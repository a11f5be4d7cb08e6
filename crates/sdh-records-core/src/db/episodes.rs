//! Episode database operations.

use rusqlite::{params, OptionalExtension, Row};

use super::{code_column, foreign_key_error, Database, DbResult};
use crate::models::Episode;

const EPISODE_COLUMNS: &str = "local_id, server_id, patient_id, start_date, discharge_date, \
                               antecedent, time_since_antecedent_days, age_at_episode, \
                               gcs_on_admission, notes, created_at, updated_at";

fn episode_from_row(row: &Row<'_>) -> rusqlite::Result<Episode> {
    Ok(Episode {
        local_id: row.get(0)?,
        server_id: row.get(1)?,
        patient_id: row.get(2)?,
        start_date: row.get(3)?,
        discharge_date: row.get(4)?,
        antecedent: code_column(row, 5)?,
        time_since_antecedent_days: row.get(6)?,
        age_at_episode: row.get(7)?,
        gcs_on_admission: row.get(8)?,
        notes: row.get(9)?,
        created_at: row.get(10)?,
        updated_at: row.get(11)?,
    })
}

impl Database {
    /// Insert or update an episode.
    pub fn save_episode(&self, episode: &Episode) -> DbResult<()> {
        self.conn
            .execute(
                r#"
                INSERT INTO episodes (
                    local_id, server_id, patient_id, start_date, discharge_date,
                    antecedent, time_since_antecedent_days, age_at_episode,
                    gcs_on_admission, notes, created_at, updated_at
                ) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10, ?11, ?12)
                ON CONFLICT(local_id) DO UPDATE SET
                    server_id = excluded.server_id,
                    start_date = excluded.start_date,
                    discharge_date = excluded.discharge_date,
                    antecedent = excluded.antecedent,
                    time_since_antecedent_days = excluded.time_since_antecedent_days,
                    age_at_episode = excluded.age_at_episode,
                    gcs_on_admission = excluded.gcs_on_admission,
                    notes = excluded.notes,
                    updated_at = datetime('now')
                "#,
                params![
                    episode.local_id,
                    episode.server_id,
                    episode.patient_id,
                    episode.start_date,
                    episode.discharge_date,
                    episode.antecedent.as_str(),
                    episode.time_since_antecedent_days,
                    episode.age_at_episode,
                    episode.gcs_on_admission,
                    episode.notes,
                    episode.created_at,
                    episode.updated_at,
                ],
            )
            .map_err(|e| foreign_key_error(e, "patient", &episode.patient_id))?;
        Ok(())
    }

    /// Get an episode by local ID.
    pub fn get_episode(&self, local_id: &str) -> DbResult<Option<Episode>> {
        self.conn
            .query_row(
                &format!("SELECT {EPISODE_COLUMNS} FROM episodes WHERE local_id = ?"),
                [local_id],
                episode_from_row,
            )
            .optional()
            .map_err(Into::into)
    }

    /// List a patient's episodes, oldest first.
    pub fn list_episodes_for_patient(&self, patient_id: &str) -> DbResult<Vec<Episode>> {
        let mut stmt = self.conn.prepare(&format!(
            "SELECT {EPISODE_COLUMNS} FROM episodes WHERE patient_id = ? ORDER BY start_date, created_at"
        ))?;

        let rows = stmt.query_map([patient_id], episode_from_row)?;
        rows.collect::<Result<Vec<_>, _>>().map_err(Into::into)
    }

    /// Delete an episode and everything nested under it.
    pub fn delete_episode(&self, local_id: &str) -> DbResult<bool> {
        let rows_affected = self
            .conn
            .execute("DELETE FROM episodes WHERE local_id = ?", [local_id])?;
        Ok(rows_affected > 0)
    }
}
