//! Post-operative follow-up form controller.

use chrono::NaiveDate;
use serde::Serialize;

use super::{AtField, FormController, FormErrors, FormField, FormState};
use crate::models::{Episode, OperativeRecord, PostOperativeRecord};
use crate::validation::{format_date_field, Check, Validator};

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub enum PostOperativeField {
    FollowUpDate,
    RankinScore,
    Recurrence,
    Notes,
}

impl FormField for PostOperativeField {
    const ALL: &'static [Self] = &[
        PostOperativeField::FollowUpDate,
        PostOperativeField::RankinScore,
        PostOperativeField::Recurrence,
        PostOperativeField::Notes,
    ];

    fn name(&self) -> &'static str {
        match self {
            PostOperativeField::FollowUpDate => "follow_up_date",
            PostOperativeField::RankinScore => "rankin_score",
            PostOperativeField::Recurrence => "recurrence",
            PostOperativeField::Notes => "notes",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct PostOperativeDerived {
    pub age_at_follow_up: i64,
    pub days_after_surgery: i64,
}

/// Create/edit form for a follow-up under an operative record.
///
/// Follow-ups fall between the operation and the episode's discharge. An
/// open episode leaves the upper end unbounded.
#[derive(Debug, Clone)]
pub struct PostOperativeForm {
    state: FormState<PostOperativeField>,
    validator: Validator,
    patient_age: u32,
    operative_record_id: String,
    operation_date: NaiveDate,
    discharge_date: Option<NaiveDate>,
    existing: Option<PostOperativeRecord>,
}

impl PostOperativeForm {
    pub fn create(
        validator: Validator,
        patient_age: u32,
        episode: &Episode,
        operative: &OperativeRecord,
    ) -> Self {
        Self {
            state: FormState::default(),
            validator,
            patient_age,
            operative_record_id: operative.local_id.clone(),
            operation_date: operative.operation_date,
            discharge_date: episode.discharge_date,
            existing: None,
        }
    }

    pub fn edit(
        validator: Validator,
        patient_age: u32,
        episode: &Episode,
        operative: &OperativeRecord,
        record: PostOperativeRecord,
    ) -> Self {
        let mut form = Self::create(validator, patient_age, episode, operative);
        let state = &mut form.state;
        state.set(PostOperativeField::FollowUpDate, format_date_field(Some(record.follow_up_date)));
        state.set(
            PostOperativeField::RankinScore,
            record.rankin_score.map(|r| r.to_string()).unwrap_or_default(),
        );
        state.set(PostOperativeField::Recurrence, record.recurrence.to_string());
        state.set(PostOperativeField::Notes, record.notes.clone().unwrap_or_default());
        form.existing = Some(record);
        form
    }

    pub fn derived(&self) -> PostOperativeDerived {
        let date = self.state.date(PostOperativeField::FollowUpDate).ok().flatten();
        PostOperativeDerived {
            age_at_follow_up: self.validator.age_at_date(self.patient_age, date),
            days_after_surgery: self.validator.days_between(Some(self.operation_date), date),
        }
    }
}

impl FormController for PostOperativeForm {
    type Field = PostOperativeField;
    type Payload = PostOperativeRecord;

    fn state(&self) -> &FormState<PostOperativeField> {
        &self.state
    }

    fn state_mut(&mut self) -> &mut FormState<PostOperativeField> {
        &mut self.state
    }

    fn check_field(&self, field: PostOperativeField) -> Check {
        let s = &self.state;
        match field {
            PostOperativeField::FollowUpDate => match s.required_date(field) {
                Ok(date) => self
                    .validator
                    .validate_nested_date(
                        Some(date),
                        Some(self.operation_date),
                        self.discharge_date,
                        self.patient_age,
                    )
                    .check(),
                Err(e) => Check::invalid(e),
            },
            PostOperativeField::RankinScore => self.validator.validate_rankin(s.field_value(field)),
            PostOperativeField::Recurrence => s.flag(field).map(|_| ()).into(),
            PostOperativeField::Notes => Check::valid(),
        }
    }

    fn build(&self) -> Result<PostOperativeRecord, FormErrors> {
        let s = &self.state;
        let follow_up_date = s
            .required_date(PostOperativeField::FollowUpDate)
            .at(PostOperativeField::FollowUpDate)?;
        let rankin_score = s
            .number(PostOperativeField::RankinScore)
            .at(PostOperativeField::RankinScore)?
            .map(|score| score.round() as u8);

        let mut record = match &self.existing {
            Some(existing) => {
                let mut record = existing.clone();
                record.follow_up_date = follow_up_date;
                record.updated_at = crate::models::now_timestamp();
                record
            }
            None => PostOperativeRecord::new(self.operative_record_id.clone(), follow_up_date),
        };
        record.rankin_score = rankin_score;
        record.recurrence = s.flag(PostOperativeField::Recurrence).at(PostOperativeField::Recurrence)?;
        record.notes = s.text(PostOperativeField::Notes);
        record.days_after_surgery = self.derived().days_after_surgery;

        Ok(record)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::ClinicalLimits;

    fn date(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).unwrap()
    }

    fn context() -> (Validator, Episode, OperativeRecord) {
        let validator = Validator::new(ClinicalLimits::default(), date(2024, 6, 1));
        let mut episode = Episode::new("patient-1".into(), date(2020, 6, 1), 41);
        episode.discharge_date = Some(date(2020, 7, 31));
        let operative = OperativeRecord::new(episode.local_id.clone(), date(2020, 6, 10));
        (validator, episode, operative)
    }

    #[test]
    fn test_follow_up_within_window() {
        let (validator, episode, operative) = context();
        let mut form = PostOperativeForm::create(validator, 45, &episode, &operative);
        form.set_field(PostOperativeField::FollowUpDate, "2020-07-10");
        form.set_field(PostOperativeField::RankinScore, "1");

        assert_eq!(form.derived().days_after_surgery, 30);
        let record = form.submit().unwrap();
        assert_eq!(record.operative_record_id, operative.local_id);
        assert_eq!(record.rankin_score, Some(1));
        assert_eq!(record.days_after_surgery, 30);
        assert!(!record.recurrence);
    }

    #[test]
    fn test_follow_up_before_operation() {
        let (validator, episode, operative) = context();
        let mut form = PostOperativeForm::create(validator, 45, &episode, &operative);
        form.set_field(PostOperativeField::FollowUpDate, "2020-06-09");
        assert_eq!(
            form.error(PostOperativeField::FollowUpDate).map(|e| e.kind()),
            Some("BeforeLowerBound")
        );
    }

    #[test]
    fn test_follow_up_after_discharge() {
        let (validator, episode, operative) = context();
        let mut form = PostOperativeForm::create(validator, 45, &episode, &operative);
        form.set_field(PostOperativeField::FollowUpDate, "2020-08-01");
        assert_eq!(
            form.error(PostOperativeField::FollowUpDate).map(|e| e.kind()),
            Some("AfterUpperBound")
        );
    }

    #[test]
    fn test_open_episode_has_no_upper_bound() {
        let (validator, mut episode, operative) = context();
        episode.discharge_date = None;
        let mut form = PostOperativeForm::create(validator, 45, &episode, &operative);
        form.set_field(PostOperativeField::FollowUpDate, "2021-03-01");
        assert!(form.error(PostOperativeField::FollowUpDate).is_none());
    }

    #[test]
    fn test_rankin_out_of_range() {
        let (validator, episode, operative) = context();
        let mut form = PostOperativeForm::create(validator, 45, &episode, &operative);
        form.set_field(PostOperativeField::FollowUpDate, "2020-07-10");
        form.set_field(PostOperativeField::RankinScore, "7");

        let errors = form.submit().unwrap_err();
        assert_eq!(errors.get("rankin_score").map(|e| e.kind()), Some("OutOfRange"));
    }

    #[test]
    fn test_edit_prefills_fields() {
        let (validator, episode, operative) = context();
        let mut record = PostOperativeRecord::new(operative.local_id.clone(), date(2020, 7, 1));
        record.rankin_score = Some(3);
        record.recurrence = true;

        let mut form = PostOperativeForm::edit(validator, 45, &episode, &operative, record.clone());
        assert_eq!(form.value(PostOperativeField::FollowUpDate), "2020-07-01");
        assert_eq!(form.value(PostOperativeField::RankinScore), "3");

        let updated = form.submit().unwrap();
        assert_eq!(updated.local_id, record.local_id);
        assert!(updated.recurrence);
        assert_eq!(updated.days_after_surgery, 21);
    }
}
