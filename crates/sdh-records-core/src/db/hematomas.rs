//! Hematoma measurement database operations.

use rusqlite::{params, Connection, Row};
use serde::{Deserialize, Serialize};

use super::{code_column, foreign_key_error, Database, DbError, DbResult};
use crate::models::{HematomaBatch, HematomaMeasurement};

const HEMATOMA_COLUMNS: &str = "local_id, server_id, episode_id, side, thickness_mm, \
                                midline_shift_mm, volume_ml, density, created_at, updated_at";

/// Counts of rows touched by a hematoma batch.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct BatchSummary {
    pub created: usize,
    pub updated: usize,
    pub deleted: usize,
}

fn hematoma_from_row(row: &Row<'_>) -> rusqlite::Result<HematomaMeasurement> {
    Ok(HematomaMeasurement {
        local_id: row.get(0)?,
        server_id: row.get(1)?,
        episode_id: row.get(2)?,
        side: code_column(row, 3)?,
        thickness_mm: row.get(4)?,
        midline_shift_mm: row.get(5)?,
        volume_ml: row.get(6)?,
        density: code_column(row, 7)?,
        created_at: row.get(8)?,
        updated_at: row.get(9)?,
    })
}

fn insert_hematoma(conn: &Connection, m: &HematomaMeasurement) -> DbResult<()> {
    conn.execute(
        r#"
        INSERT INTO hematoma_measurements (
            local_id, server_id, episode_id, side, thickness_mm,
            midline_shift_mm, volume_ml, density, created_at, updated_at
        ) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10)
        "#,
        params![
            m.local_id,
            m.server_id,
            m.episode_id,
            m.side.as_str(),
            m.thickness_mm,
            m.midline_shift_mm,
            m.volume_ml,
            m.density.as_str(),
            m.created_at,
            m.updated_at,
        ],
    )
    .map_err(|e| foreign_key_error(e, "episode", &m.episode_id))?;
    Ok(())
}

fn update_hematoma(conn: &Connection, m: &HematomaMeasurement) -> DbResult<bool> {
    let rows_affected = conn.execute(
        r#"
        UPDATE hematoma_measurements SET
            server_id = ?2,
            side = ?3,
            thickness_mm = ?4,
            midline_shift_mm = ?5,
            volume_ml = ?6,
            density = ?7,
            updated_at = datetime('now')
        WHERE local_id = ?1
        "#,
        params![
            m.local_id,
            m.server_id,
            m.side.as_str(),
            m.thickness_mm,
            m.midline_shift_mm,
            m.volume_ml,
            m.density.as_str(),
        ],
    )?;
    Ok(rows_affected > 0)
}

fn delete_hematoma(conn: &Connection, local_id: &str) -> DbResult<bool> {
    let rows_affected = conn.execute(
        "DELETE FROM hematoma_measurements WHERE local_id = ?",
        [local_id],
    )?;
    Ok(rows_affected > 0)
}

impl Database {
    /// Insert a single measurement.
    pub fn insert_hematoma(&self, measurement: &HematomaMeasurement) -> DbResult<()> {
        insert_hematoma(&self.conn, measurement)
    }

    /// List an episode's measurements in entry order.
    pub fn list_hematomas_for_episode(&self, episode_id: &str) -> DbResult<Vec<HematomaMeasurement>> {
        let mut stmt = self.conn.prepare(&format!(
            "SELECT {HEMATOMA_COLUMNS} FROM hematoma_measurements WHERE episode_id = ? \
             ORDER BY created_at, rowid"
        ))?;

        let rows = stmt.query_map([episode_id], hematoma_from_row)?;
        rows.collect::<Result<Vec<_>, _>>().map_err(Into::into)
    }

    /// Apply creates, updates and deletes in one transaction.
    ///
    /// Any failure (unknown episode, missing row to update or delete) rolls
    /// the whole batch back.
    pub fn apply_hematoma_batch(&mut self, batch: &HematomaBatch) -> DbResult<BatchSummary> {
        let tx = self.transaction()?;
        let mut summary = BatchSummary::default();

        for m in &batch.create {
            insert_hematoma(&tx, m)?;
            summary.created += 1;
        }
        for m in &batch.update {
            if !update_hematoma(&tx, m)? {
                return Err(DbError::NotFound(format!("hematoma measurement {}", m.local_id)));
            }
            summary.updated += 1;
        }
        for local_id in &batch.delete {
            if !delete_hematoma(&tx, local_id)? {
                return Err(DbError::NotFound(format!("hematoma measurement {}", local_id)));
            }
            summary.deleted += 1;
        }

        tx.commit()?;
        Ok(summary)
    }
}
