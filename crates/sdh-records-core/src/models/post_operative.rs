//! Post-operative follow-up models.

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

use super::{new_local_id, now_timestamp};

/// A follow-up observation nested within an operative record.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct PostOperativeRecord {
    pub local_id: String,
    pub server_id: Option<String>,
    /// Owning operative record local ID
    pub operative_record_id: String,
    pub follow_up_date: NaiveDate,
    /// Days from the operation to this follow-up
    pub days_after_surgery: i64,
    /// Modified Rankin scale (0-6)
    pub rankin_score: Option<u8>,
    /// Hematoma recurred since the operation
    pub recurrence: bool,
    pub notes: Option<String>,
    pub created_at: String,
    pub updated_at: String,
}

impl PostOperativeRecord {
    pub fn new(operative_record_id: String, follow_up_date: NaiveDate) -> Self {
        let now = now_timestamp();
        Self {
            local_id: new_local_id(),
            server_id: None,
            operative_record_id,
            follow_up_date,
            days_after_surgery: 0,
            rankin_score: None,
            recurrence: false,
            notes: None,
            created_at: now.clone(),
            updated_at: now,
        }
    }

    /// Good functional outcome: modified Rankin 0-2.
    pub fn favorable_outcome(&self) -> Option<bool> {
        self.rankin_score.map(|score| score <= 2)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_favorable_outcome() {
        let date = NaiveDate::from_ymd_opt(2020, 7, 10).unwrap();
        let mut record = PostOperativeRecord::new("op-1".into(), date);
        assert_eq!(record.favorable_outcome(), None);

        record.rankin_score = Some(2);
        assert_eq!(record.favorable_outcome(), Some(true));

        record.rankin_score = Some(4);
        assert_eq!(record.favorable_outcome(), Some(false));
    }
}
