//! Local record store.
//!
//! Mirrors the backend's last-known state for patients and their nested
//! records, and holds small JSON blobs of UI state (see [`app_state`]).

mod app_state;
mod episodes;
mod hematomas;
mod operative;
mod patients;
mod schema;

pub use app_state::*;
#[allow(unused_imports)]
pub use episodes::*;
pub use hematomas::*;
#[allow(unused_imports)]
pub use operative::*;
#[allow(unused_imports)]
pub use patients::*;
pub use schema::*;

use std::path::Path;
use std::str::FromStr;

use rusqlite::types::Type;
use rusqlite::{Connection, Row};
use thiserror::Error;

use crate::models::UnknownCode;

/// Database errors.
#[derive(Error, Debug)]
pub enum DbError {
    #[error("SQLite error: {0}")]
    Sqlite(#[from] rusqlite::Error),

    #[error("JSON serialization error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("Record not found: {0}")]
    NotFound(String),

    #[error("Constraint violation: {0}")]
    Constraint(String),
}

pub type DbResult<T> = Result<T, DbError>;

/// Database connection wrapper.
pub struct Database {
    conn: Connection,
}

impl Database {
    /// Open database at path, creating if needed.
    pub fn open<P: AsRef<Path>>(path: P) -> DbResult<Self> {
        let conn = Connection::open(path)?;
        let db = Self { conn };
        db.initialize()?;
        Ok(db)
    }

    /// Create in-memory database (for testing).
    pub fn open_in_memory() -> DbResult<Self> {
        let conn = Connection::open_in_memory()?;
        let db = Self { conn };
        db.initialize()?;
        Ok(db)
    }

    /// Initialize schema.
    fn initialize(&self) -> DbResult<()> {
        self.conn.execute_batch(SCHEMA)?;
        Ok(())
    }

    /// Get raw connection (for advanced queries).
    pub fn conn(&self) -> &Connection {
        &self.conn
    }

    /// Begin a transaction.
    pub fn transaction(&mut self) -> DbResult<rusqlite::Transaction<'_>> {
        Ok(self.conn.transaction()?)
    }
}

/// Read a text column holding an enum code.
fn code_column<T>(row: &Row<'_>, idx: usize) -> rusqlite::Result<T>
where
    T: FromStr<Err = UnknownCode>,
{
    let code: String = row.get(idx)?;
    code.parse()
        .map_err(|e| rusqlite::Error::FromSqlConversionFailure(idx, Type::Text, Box::new(e)))
}

/// Map a foreign key failure to a readable constraint error.
fn foreign_key_error(err: rusqlite::Error, parent: &str, parent_id: &str) -> DbError {
    match err {
        rusqlite::Error::SqliteFailure(e, _)
            if e.extended_code == rusqlite::ffi::SQLITE_CONSTRAINT_FOREIGNKEY =>
        {
            DbError::Constraint(format!("Unknown {}: {}", parent, parent_id))
        }
        other => other.into(),
    }
}
