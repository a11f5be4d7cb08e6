//! Key/value storage for persisted UI state.

use rusqlite::OptionalExtension;

use super::{Database, DbResult};

impl Database {
    /// Read the JSON stored under `key`.
    pub fn load_state(&self, key: &str) -> DbResult<Option<String>> {
        self.conn
            .query_row(
                "SELECT state_value FROM app_state WHERE state_key = ?",
                [key],
                |row| row.get(0),
            )
            .optional()
            .map_err(Into::into)
    }

    /// Store JSON under `key`, replacing any previous value.
    pub fn save_state(&self, key: &str, json: &str) -> DbResult<()> {
        self.conn.execute(
            r#"
            INSERT INTO app_state (state_key, state_value) VALUES (?1, ?2)
            ON CONFLICT(state_key) DO UPDATE SET
                state_value = excluded.state_value,
                updated_at = datetime('now')
            "#,
            [key, json],
        )?;
        Ok(())
    }

    /// Remove the value under `key`.
    pub fn clear_state(&self, key: &str) -> DbResult<bool> {
        let rows_affected = self
            .conn
            .execute("DELETE FROM app_state WHERE state_key = ?", [key])?;
        Ok(rows_affected > 0)
    }
}
