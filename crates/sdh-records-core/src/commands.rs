//! Submission boundary between form controllers and the record store.
//!
//! Forms produce typed payloads; the effectful part of saving them lives
//! here, as a [`Command`] applied to a [`Database`].

use serde::{Deserialize, Serialize};
use tracing::{debug, info};

use crate::db::{BatchSummary, Database, DbError, DbResult};
use crate::models::{Episode, HematomaBatch, OperativeRecord, PostOperativeRecord};

/// A persistence request produced by a submitted form.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", content = "payload")]
pub enum Command {
    SaveEpisode(Episode),
    SaveOperativeRecord(OperativeRecord),
    SavePostOperativeRecord(PostOperativeRecord),
    SyncHematomas(HematomaBatch),
    /// Delete an episode and everything nested under it
    DeleteEpisode(String),
}

impl Command {
    pub fn name(&self) -> &'static str {
        match self {
            Command::SaveEpisode(_) => "save_episode",
            Command::SaveOperativeRecord(_) => "save_operative_record",
            Command::SavePostOperativeRecord(_) => "save_post_operative_record",
            Command::SyncHematomas(_) => "sync_hematomas",
            Command::DeleteEpisode(_) => "delete_episode",
        }
    }
}

impl From<Episode> for Command {
    fn from(episode: Episode) -> Self {
        Command::SaveEpisode(episode)
    }
}

impl From<OperativeRecord> for Command {
    fn from(record: OperativeRecord) -> Self {
        Command::SaveOperativeRecord(record)
    }
}

impl From<PostOperativeRecord> for Command {
    fn from(record: PostOperativeRecord) -> Self {
        Command::SavePostOperativeRecord(record)
    }
}

impl From<HematomaBatch> for Command {
    fn from(batch: HematomaBatch) -> Self {
        Command::SyncHematomas(batch)
    }
}

/// What a command changed.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum CommandOutcome {
    /// A record was inserted or updated
    Saved { local_id: String },
    Hematomas(BatchSummary),
    Deleted { local_id: String },
}

/// Persist a command.
pub fn apply(db: &mut Database, command: Command) -> DbResult<CommandOutcome> {
    let name = command.name();
    let outcome = match command {
        Command::SaveEpisode(episode) => {
            db.save_episode(&episode)?;
            let refreshed = db.refresh_days_from_admission(&episode.local_id, episode.start_date)?;
            debug!(episode_id = %episode.local_id, refreshed, "operation day counts refreshed");
            CommandOutcome::Saved {
                local_id: episode.local_id,
            }
        }
        Command::SaveOperativeRecord(record) => {
            db.save_operative_record(&record)?;
            let refreshed = db.refresh_days_after_surgery(&record.local_id, record.operation_date)?;
            debug!(operative_id = %record.local_id, refreshed, "follow-up day counts refreshed");
            CommandOutcome::Saved {
                local_id: record.local_id,
            }
        }
        Command::SavePostOperativeRecord(record) => {
            db.save_post_operative_record(&record)?;
            CommandOutcome::Saved {
                local_id: record.local_id,
            }
        }
        Command::SyncHematomas(batch) => CommandOutcome::Hematomas(db.apply_hematoma_batch(&batch)?),
        Command::DeleteEpisode(local_id) => {
            if !db.delete_episode(&local_id)? {
                return Err(DbError::NotFound(format!("episode {}", local_id)));
            }
            CommandOutcome::Deleted { local_id }
        }
    };

    info!(command = name, outcome = ?outcome, "command applied");
    Ok(outcome)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{HematomaMeasurement, Patient, Side};
    use chrono::NaiveDate;

    fn setup() -> (Database, Episode) {
        let db = Database::open_in_memory().unwrap();
        let patient = Patient::new("Test Patient".into(), 70);
        db.insert_patient(&patient).unwrap();
        let episode = Episode::new(
            patient.local_id.clone(),
            NaiveDate::from_ymd_opt(2023, 3, 1).unwrap(),
            69,
        );
        (db, episode)
    }

    #[test]
    fn test_save_and_delete_episode() {
        let (mut db, episode) = setup();
        let id = episode.local_id.clone();

        let outcome = apply(&mut db, Command::SaveEpisode(episode)).unwrap();
        assert_eq!(outcome, CommandOutcome::Saved { local_id: id.clone() });
        assert!(db.get_episode(&id).unwrap().is_some());

        let outcome = apply(&mut db, Command::DeleteEpisode(id.clone())).unwrap();
        assert_eq!(outcome, CommandOutcome::Deleted { local_id: id.clone() });
        assert!(db.get_episode(&id).unwrap().is_none());

        let err = apply(&mut db, Command::DeleteEpisode(id)).unwrap_err();
        assert!(matches!(err, DbError::NotFound(_)));
    }

    #[test]
    fn test_sync_hematomas() {
        let (mut db, episode) = setup();
        let episode_id = episode.local_id.clone();
        apply(&mut db, Command::SaveEpisode(episode)).unwrap();

        let batch = HematomaBatch {
            create: vec![
                HematomaMeasurement::new(episode_id.clone(), Side::Left, 12.0),
                HematomaMeasurement::new(episode_id.clone(), Side::Right, 7.0),
            ],
            ..HematomaBatch::default()
        };
        let outcome = apply(&mut db, Command::SyncHematomas(batch)).unwrap();
        assert_eq!(
            outcome,
            CommandOutcome::Hematomas(BatchSummary {
                created: 2,
                updated: 0,
                deleted: 0
            })
        );
        assert_eq!(db.list_hematomas_for_episode(&episode_id).unwrap().len(), 2);
    }

    #[test]
    fn test_operative_record_needs_episode() {
        let (mut db, _episode) = setup();
        let record = OperativeRecord::new(
            "missing-episode".into(),
            NaiveDate::from_ymd_opt(2023, 3, 2).unwrap(),
        );
        let err = apply(&mut db, Command::SaveOperativeRecord(record)).unwrap_err();
        assert!(matches!(err, DbError::Constraint(_)));
    }

    #[test]
    fn test_saving_parents_refreshes_day_counts() {
        let (mut db, mut episode) = setup();
        apply(&mut db, Command::SaveEpisode(episode.clone())).unwrap();

        let mut record = OperativeRecord::new(
            episode.local_id.clone(),
            NaiveDate::from_ymd_opt(2023, 3, 11).unwrap(),
        );
        record.days_from_admission = 10;
        apply(&mut db, Command::SaveOperativeRecord(record.clone())).unwrap();
        let mut follow_up = PostOperativeRecord::new(
            record.local_id.clone(),
            NaiveDate::from_ymd_opt(2023, 3, 21).unwrap(),
        );
        follow_up.days_after_surgery = 10;
        apply(&mut db, Command::SavePostOperativeRecord(follow_up.clone())).unwrap();

        episode.start_date = NaiveDate::from_ymd_opt(2023, 3, 6).unwrap();
        apply(&mut db, Command::SaveEpisode(episode)).unwrap();
        let stored = db.get_operative_record(&record.local_id).unwrap().unwrap();
        assert_eq!(stored.days_from_admission, 5);

        record.operation_date = NaiveDate::from_ymd_opt(2023, 3, 15).unwrap();
        apply(&mut db, Command::SaveOperativeRecord(record)).unwrap();
        let stored = db.get_post_operative_record(&follow_up.local_id).unwrap().unwrap();
        assert_eq!(stored.days_after_surgery, 6);
    }

    #[test]
    fn test_command_json_shape() {
        let json = serde_json::to_value(Command::DeleteEpisode("ep-1".into())).unwrap();
        assert_eq!(json["type"], "DeleteEpisode");
        assert_eq!(json["payload"], "ep-1");
    }
}
