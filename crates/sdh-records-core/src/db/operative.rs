//! Operative and post-operative record database operations.

use chrono::NaiveDate;
use rusqlite::{params, OptionalExtension, Row};

use super::{code_column, foreign_key_error, Database, DbResult};
use crate::models::{OperativeRecord, PostOperativeRecord};

const OPERATIVE_COLUMNS: &str = "local_id, server_id, episode_id, operation_date, procedure, \
                                 side, drain_placed, age_at_operation, days_from_admission, \
                                 notes, created_at, updated_at";

const POST_OPERATIVE_COLUMNS: &str = "local_id, server_id, operative_record_id, follow_up_date, \
                                      days_after_surgery, rankin_score, recurrence, notes, \
                                      created_at, updated_at";

fn operative_from_row(row: &Row<'_>) -> rusqlite::Result<OperativeRecord> {
    Ok(OperativeRecord {
        local_id: row.get(0)?,
        server_id: row.get(1)?,
        episode_id: row.get(2)?,
        operation_date: row.get(3)?,
        procedure: code_column(row, 4)?,
        side: code_column(row, 5)?,
        drain_placed: row.get(6)?,
        age_at_operation: row.get(7)?,
        days_from_admission: row.get(8)?,
        notes: row.get(9)?,
        created_at: row.get(10)?,
        updated_at: row.get(11)?,
    })
}

fn post_operative_from_row(row: &Row<'_>) -> rusqlite::Result<PostOperativeRecord> {
    Ok(PostOperativeRecord {
        local_id: row.get(0)?,
        server_id: row.get(1)?,
        operative_record_id: row.get(2)?,
        follow_up_date: row.get(3)?,
        days_after_surgery: row.get(4)?,
        rankin_score: row.get(5)?,
        recurrence: row.get(6)?,
        notes: row.get(7)?,
        created_at: row.get(8)?,
        updated_at: row.get(9)?,
    })
}

impl Database {
    /// Insert or update an operative record.
    pub fn save_operative_record(&self, record: &OperativeRecord) -> DbResult<()> {
        self.conn
            .execute(
                r#"
                INSERT INTO operative_records (
                    local_id, server_id, episode_id, operation_date, procedure, side,
                    drain_placed, age_at_operation, days_from_admission, notes,
                    created_at, updated_at
                ) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10, ?11, ?12)
                ON CONFLICT(local_id) DO UPDATE SET
                    server_id = excluded.server_id,
                    operation_date = excluded.operation_date,
                    procedure = excluded.procedure,
                    side = excluded.side,
                    drain_placed = excluded.drain_placed,
                    age_at_operation = excluded.age_at_operation,
                    days_from_admission = excluded.days_from_admission,
                    notes = excluded.notes,
                    updated_at = datetime('now')
                "#,
                params![
                    record.local_id,
                    record.server_id,
                    record.episode_id,
                    record.operation_date,
                    record.procedure.as_str(),
                    record.side.as_str(),
                    record.drain_placed,
                    record.age_at_operation,
                    record.days_from_admission,
                    record.notes,
                    record.created_at,
                    record.updated_at,
                ],
            )
            .map_err(|e| foreign_key_error(e, "episode", &record.episode_id))?;
        Ok(())
    }

    /// Get an operative record by local ID.
    pub fn get_operative_record(&self, local_id: &str) -> DbResult<Option<OperativeRecord>> {
        self.conn
            .query_row(
                &format!("SELECT {OPERATIVE_COLUMNS} FROM operative_records WHERE local_id = ?"),
                [local_id],
                operative_from_row,
            )
            .optional()
            .map_err(Into::into)
    }

    /// List an episode's operative records by operation date.
    pub fn list_operative_records_for_episode(&self, episode_id: &str) -> DbResult<Vec<OperativeRecord>> {
        let mut stmt = self.conn.prepare(&format!(
            "SELECT {OPERATIVE_COLUMNS} FROM operative_records WHERE episode_id = ? \
             ORDER BY operation_date, created_at"
        ))?;

        let rows = stmt.query_map([episode_id], operative_from_row)?;
        rows.collect::<Result<Vec<_>, _>>().map_err(Into::into)
    }

    /// Delete an operative record and its follow-ups.
    pub fn delete_operative_record(&self, local_id: &str) -> DbResult<bool> {
        let rows_affected = self
            .conn
            .execute("DELETE FROM operative_records WHERE local_id = ?", [local_id])?;
        Ok(rows_affected > 0)
    }

    /// Insert or update a post-operative record.
    pub fn save_post_operative_record(&self, record: &PostOperativeRecord) -> DbResult<()> {
        self.conn
            .execute(
                r#"
                INSERT INTO post_operative_records (
                    local_id, server_id, operative_record_id, follow_up_date,
                    days_after_surgery, rankin_score, recurrence, notes,
                    created_at, updated_at
                ) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10)
                ON CONFLICT(local_id) DO UPDATE SET
                    server_id = excluded.server_id,
                    follow_up_date = excluded.follow_up_date,
                    days_after_surgery = excluded.days_after_surgery,
                    rankin_score = excluded.rankin_score,
                    recurrence = excluded.recurrence,
                    notes = excluded.notes,
                    updated_at = datetime('now')
                "#,
                params![
                    record.local_id,
                    record.server_id,
                    record.operative_record_id,
                    record.follow_up_date,
                    record.days_after_surgery,
                    record.rankin_score,
                    record.recurrence,
                    record.notes,
                    record.created_at,
                    record.updated_at,
                ],
            )
            .map_err(|e| foreign_key_error(e, "operative record", &record.operative_record_id))?;
        Ok(())
    }

    /// Get a post-operative record by local ID.
    pub fn get_post_operative_record(&self, local_id: &str) -> DbResult<Option<PostOperativeRecord>> {
        self.conn
            .query_row(
                &format!(
                    "SELECT {POST_OPERATIVE_COLUMNS} FROM post_operative_records WHERE local_id = ?"
                ),
                [local_id],
                post_operative_from_row,
            )
            .optional()
            .map_err(Into::into)
    }

    /// List follow-ups of an operative record by date.
    pub fn list_post_operative_records(&self, operative_record_id: &str) -> DbResult<Vec<PostOperativeRecord>> {
        let mut stmt = self.conn.prepare(&format!(
            "SELECT {POST_OPERATIVE_COLUMNS} FROM post_operative_records \
             WHERE operative_record_id = ? ORDER BY follow_up_date, created_at"
        ))?;

        let rows = stmt.query_map([operative_record_id], post_operative_from_row)?;
        rows.collect::<Result<Vec<_>, _>>().map_err(Into::into)
    }

    pub fn delete_post_operative_record(&self, local_id: &str) -> DbResult<bool> {
        let rows_affected = self
            .conn
            .execute("DELETE FROM post_operative_records WHERE local_id = ?", [local_id])?;
        Ok(rows_affected > 0)
    }

    /// Operation and follow-up dates stored under an episode.
    pub fn dates_within_episode(&self, episode_id: &str) -> DbResult<Vec<NaiveDate>> {
        let mut stmt = self.conn.prepare(
            r#"
            SELECT operation_date FROM operative_records WHERE episode_id = ?1
            UNION ALL
            SELECT p.follow_up_date FROM post_operative_records p
            JOIN operative_records o ON o.local_id = p.operative_record_id
            WHERE o.episode_id = ?1
            "#,
        )?;

        let rows = stmt.query_map([episode_id], |row| row.get(0))?;
        rows.collect::<Result<Vec<_>, _>>().map_err(Into::into)
    }

    /// Follow-up dates stored under an operative record.
    pub fn follow_up_dates(&self, operative_record_id: &str) -> DbResult<Vec<NaiveDate>> {
        let mut stmt = self
            .conn
            .prepare("SELECT follow_up_date FROM post_operative_records WHERE operative_record_id = ?")?;

        let rows = stmt.query_map([operative_record_id], |row| row.get(0))?;
        rows.collect::<Result<Vec<_>, _>>().map_err(Into::into)
    }

    /// Recompute `days_from_admission` for an episode's operations after
    /// its start date changed. Returns the number of rows touched.
    pub fn refresh_days_from_admission(&self, episode_id: &str, start_date: NaiveDate) -> DbResult<usize> {
        let updated = self.conn.execute(
            r#"
            UPDATE operative_records
            SET days_from_admission = MAX(0, CAST(julianday(operation_date) - julianday(?1) AS INTEGER))
            WHERE episode_id = ?2
            "#,
            params![start_date, episode_id],
        )?;
        Ok(updated)
    }

    /// Recompute `days_after_surgery` for an operation's follow-ups.
    pub fn refresh_days_after_surgery(
        &self,
        operative_record_id: &str,
        operation_date: NaiveDate,
    ) -> DbResult<usize> {
        let updated = self.conn.execute(
            r#"
            UPDATE post_operative_records
            SET days_after_surgery = MAX(0, CAST(julianday(follow_up_date) - julianday(?1) AS INTEGER))
            WHERE operative_record_id = ?2
            "#,
            params![operation_date, operative_record_id],
        )?;
        Ok(updated)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{Episode, Patient, Procedure, Side};
    use chrono::NaiveDate;

    fn date(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).unwrap()
    }

    fn setup() -> (Database, Episode) {
        let db = Database::open_in_memory().unwrap();
        let patient = Patient::new("Jane Roe".into(), 78);
        db.insert_patient(&patient).unwrap();
        let episode = Episode::new(patient.local_id, date(2020, 6, 1), 74);
        db.save_episode(&episode).unwrap();
        (db, episode)
    }

    #[test]
    fn test_operative_round_trip() {
        let (db, episode) = setup();

        let mut record = OperativeRecord::new(episode.local_id.clone(), date(2020, 6, 3));
        record.procedure = Procedure::Craniotomy;
        record.side = Side::Bilateral;
        record.drain_placed = true;
        record.days_from_admission = 2;
        db.save_operative_record(&record).unwrap();

        let retrieved = db.get_operative_record(&record.local_id).unwrap().unwrap();
        assert_eq!(retrieved.procedure, Procedure::Craniotomy);
        assert_eq!(retrieved.side, Side::Bilateral);
        assert!(retrieved.drain_placed);
        assert_eq!(retrieved.days_from_admission, 2);

        let listed = db.list_operative_records_for_episode(&episode.local_id).unwrap();
        assert_eq!(listed.len(), 1);
    }

    #[test]
    fn test_post_operative_round_trip() {
        let (db, episode) = setup();
        let record = OperativeRecord::new(episode.local_id.clone(), date(2020, 6, 3));
        db.save_operative_record(&record).unwrap();

        let mut follow_up = PostOperativeRecord::new(record.local_id.clone(), date(2020, 7, 3));
        follow_up.rankin_score = Some(1);
        follow_up.days_after_surgery = 30;
        db.save_post_operative_record(&follow_up).unwrap();

        let listed = db.list_post_operative_records(&record.local_id).unwrap();
        assert_eq!(listed.len(), 1);
        assert_eq!(listed[0].rankin_score, Some(1));
        assert_eq!(listed[0].days_after_surgery, 30);
    }

    #[test]
    fn test_deleting_episode_cascades_to_follow_ups() {
        let (db, episode) = setup();
        let record = OperativeRecord::new(episode.local_id.clone(), date(2020, 6, 3));
        db.save_operative_record(&record).unwrap();
        let follow_up = PostOperativeRecord::new(record.local_id.clone(), date(2020, 7, 3));
        db.save_post_operative_record(&follow_up).unwrap();

        db.delete_episode(&episode.local_id).unwrap();

        assert!(db.get_operative_record(&record.local_id).unwrap().is_none());
        assert!(db.get_post_operative_record(&follow_up.local_id).unwrap().is_none());
    }

    #[test]
    fn test_orphan_follow_up_rejected() {
        let (db, _) = setup();
        let follow_up = PostOperativeRecord::new("missing".into(), date(2020, 7, 3));
        assert!(db.save_post_operative_record(&follow_up).is_err());
    }

    #[test]
    fn test_child_dates_and_refresh() {
        let (db, episode) = setup();
        let mut record = OperativeRecord::new(episode.local_id.clone(), date(2020, 6, 10));
        record.days_from_admission = 9;
        db.save_operative_record(&record).unwrap();
        let mut follow_up = PostOperativeRecord::new(record.local_id.clone(), date(2020, 6, 14));
        follow_up.days_after_surgery = 4;
        db.save_post_operative_record(&follow_up).unwrap();

        let mut dates = db.dates_within_episode(&episode.local_id).unwrap();
        dates.sort();
        assert_eq!(dates, vec![date(2020, 6, 10), date(2020, 6, 14)]);
        assert_eq!(db.follow_up_dates(&record.local_id).unwrap(), vec![date(2020, 6, 14)]);

        assert_eq!(db.refresh_days_from_admission(&episode.local_id, date(2020, 6, 5)).unwrap(), 1);
        let stored = db.get_operative_record(&record.local_id).unwrap().unwrap();
        assert_eq!(stored.days_from_admission, 5);

        db.refresh_days_after_surgery(&record.local_id, date(2020, 6, 12)).unwrap();
        let stored = db.get_post_operative_record(&follow_up.local_id).unwrap().unwrap();
        assert_eq!(stored.days_after_surgery, 2);
    }
}
