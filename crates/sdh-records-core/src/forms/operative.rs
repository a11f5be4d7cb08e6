//! Operative record form controller.

use chrono::NaiveDate;
use serde::Serialize;

use super::{AtField, ChildDates, FormController, FormErrors, FormField, FormState};
use crate::models::{Episode, OperativeRecord, Procedure, Side};
use crate::validation::{format_date_field, Check, Validator};

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub enum OperativeField {
    OperationDate,
    Procedure,
    Side,
    DrainPlaced,
    Notes,
}

impl FormField for OperativeField {
    const ALL: &'static [Self] = &[
        OperativeField::OperationDate,
        OperativeField::Procedure,
        OperativeField::Side,
        OperativeField::DrainPlaced,
        OperativeField::Notes,
    ];

    fn name(&self) -> &'static str {
        match self {
            OperativeField::OperationDate => "operation_date",
            OperativeField::Procedure => "procedure",
            OperativeField::Side => "side",
            OperativeField::DrainPlaced => "drain_placed",
            OperativeField::Notes => "notes",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct OperativeDerived {
    pub age_at_operation: i64,
    pub days_from_admission: i64,
}

/// Create/edit form for a surgical record inside an episode.
///
/// The operation must fall within the episode: on or after its start and
/// no later than its discharge (today while the episode is still open).
#[derive(Debug, Clone)]
pub struct OperativeForm {
    state: FormState<OperativeField>,
    validator: Validator,
    patient_age: u32,
    episode_id: String,
    episode_start: NaiveDate,
    window_end: NaiveDate,
    existing: Option<OperativeRecord>,
    follow_ups: Option<ChildDates>,
}

impl OperativeForm {
    pub fn create(validator: Validator, patient_age: u32, episode: &Episode) -> Self {
        let window_end = episode.window_end(validator.today());
        Self {
            state: FormState::default(),
            validator,
            patient_age,
            episode_id: episode.local_id.clone(),
            episode_start: episode.start_date,
            window_end,
            existing: None,
            follow_ups: None,
        }
    }

    pub fn edit(validator: Validator, patient_age: u32, episode: &Episode, record: OperativeRecord) -> Self {
        let mut form = Self::create(validator, patient_age, episode);
        let state = &mut form.state;
        state.set(OperativeField::OperationDate, format_date_field(Some(record.operation_date)));
        state.set(OperativeField::Procedure, record.procedure.as_str());
        state.set(OperativeField::Side, record.side.as_str());
        state.set(OperativeField::DrainPlaced, record.drain_placed.to_string());
        state.set(OperativeField::Notes, record.notes.clone().unwrap_or_default());
        form.existing = Some(record);
        form
    }

    /// Keep the operation on or before its stored follow-ups.
    pub fn with_follow_ups(mut self, follow_ups: Option<ChildDates>) -> Self {
        self.follow_ups = follow_ups;
        self
    }

    pub fn derived(&self) -> OperativeDerived {
        let date = self.state.date(OperativeField::OperationDate).ok().flatten();
        OperativeDerived {
            age_at_operation: self.validator.age_at_date(self.patient_age, date),
            days_from_admission: self.validator.days_between(Some(self.episode_start), date),
        }
    }
}

impl FormController for OperativeForm {
    type Field = OperativeField;
    type Payload = OperativeRecord;

    fn state(&self) -> &FormState<OperativeField> {
        &self.state
    }

    fn state_mut(&mut self) -> &mut FormState<OperativeField> {
        &mut self.state
    }

    fn check_field(&self, field: OperativeField) -> Check {
        let s = &self.state;
        match field {
            OperativeField::OperationDate => {
                let date = match s.required_date(field) {
                    Ok(date) => date,
                    Err(e) => return Check::invalid(e),
                };
                let nested = self
                    .validator
                    .validate_nested_date(
                        Some(date),
                        Some(self.episode_start),
                        Some(self.window_end),
                        self.patient_age,
                    )
                    .check();
                match &self.follow_ups {
                    Some(follow_ups) if nested.is_valid() => follow_ups.check_start(date),
                    _ => nested,
                }
            }
            OperativeField::Procedure => s.choice::<Procedure>(field).map(|_| ()).into(),
            OperativeField::Side => s.choice::<Side>(field).map(|_| ()).into(),
            OperativeField::DrainPlaced => s.flag(field).map(|_| ()).into(),
            OperativeField::Notes => Check::valid(),
        }
    }

    fn build(&self) -> Result<OperativeRecord, FormErrors> {
        let s = &self.state;
        let operation_date = s
            .required_date(OperativeField::OperationDate)
            .at(OperativeField::OperationDate)?;

        let mut record = match &self.existing {
            Some(existing) => {
                let mut record = existing.clone();
                record.operation_date = operation_date;
                record.updated_at = crate::models::now_timestamp();
                record
            }
            None => OperativeRecord::new(self.episode_id.clone(), operation_date),
        };
        record.procedure = s.choice(OperativeField::Procedure).at(OperativeField::Procedure)?;
        record.side = s.choice(OperativeField::Side).at(OperativeField::Side)?;
        record.drain_placed = s.flag(OperativeField::DrainPlaced).at(OperativeField::DrainPlaced)?;
        record.notes = s.text(OperativeField::Notes);

        let derived = self.derived();
        record.age_at_operation = derived.age_at_operation;
        record.days_from_admission = derived.days_from_admission;

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

    fn validator() -> Validator {
        Validator::new(ClinicalLimits::default(), date(2024, 6, 1))
    }

    fn discharged_episode() -> Episode {
        let mut episode = Episode::new("patient-1".into(), date(2020, 6, 1), 41);
        episode.discharge_date = Some(date(2020, 6, 15));
        episode
    }

    #[test]
    fn test_operation_inside_episode() {
        let episode = discharged_episode();
        let mut form = OperativeForm::create(validator(), 45, &episode);
        form.set_field(OperativeField::OperationDate, "2020-06-10");
        form.set_field(OperativeField::Procedure, "burr_hole");
        form.set_field(OperativeField::Side, "right");
        form.set_field(OperativeField::DrainPlaced, "true");

        let record = form.submit().unwrap();
        assert_eq!(record.episode_id, episode.local_id);
        assert_eq!(record.side, Side::Right);
        assert!(record.drain_placed);
        assert_eq!(record.age_at_operation, 41);
        assert_eq!(record.days_from_admission, 9);
    }

    #[test]
    fn test_operation_before_episode() {
        let mut form = OperativeForm::create(validator(), 45, &discharged_episode());
        form.set_field(OperativeField::OperationDate, "2020-05-01");
        assert_eq!(
            form.error(OperativeField::OperationDate).map(|e| e.kind()),
            Some("BeforeLowerBound")
        );
        assert!(form.submit().is_err());
    }

    #[test]
    fn test_operation_after_discharge() {
        let mut form = OperativeForm::create(validator(), 45, &discharged_episode());
        form.set_field(OperativeField::OperationDate, "2020-06-16");
        assert_eq!(
            form.error(OperativeField::OperationDate).map(|e| e.kind()),
            Some("AfterUpperBound")
        );
    }

    #[test]
    fn test_open_episode_bounded_by_today() {
        let episode = Episode::new("patient-1".into(), date(2024, 5, 20), 45);
        let mut form = OperativeForm::create(validator(), 45, &episode);

        form.set_field(OperativeField::OperationDate, "2024-06-01");
        assert!(form.error(OperativeField::OperationDate).is_none());

        form.set_field(OperativeField::OperationDate, "2024-06-02");
        assert_eq!(
            form.error(OperativeField::OperationDate).map(|e| e.kind()),
            Some("AfterUpperBound")
        );
    }

    #[test]
    fn test_operation_date_required() {
        let mut form = OperativeForm::create(validator(), 45, &discharged_episode());
        let errors = form.submit().unwrap_err();
        assert_eq!(errors.get("operation_date").map(|e| e.kind()), Some("Required"));
    }

    #[test]
    fn test_edit_round_trip() {
        let episode = discharged_episode();
        let mut record = OperativeRecord::new(episode.local_id.clone(), date(2020, 6, 3));
        record.procedure = Procedure::Craniotomy;

        let mut form = OperativeForm::edit(validator(), 45, &episode, record.clone());
        assert_eq!(form.value(OperativeField::Procedure), "craniotomy");
        assert_eq!(form.value(OperativeField::DrainPlaced), "false");

        form.set_field(OperativeField::OperationDate, "2020-06-04");
        let updated = form.submit().unwrap();
        assert_eq!(updated.local_id, record.local_id);
        assert_eq!(updated.procedure, Procedure::Craniotomy);
        assert_eq!(updated.days_from_admission, 3);
    }

    #[test]
    fn test_edit_cannot_pass_follow_ups() {
        let episode = discharged_episode();
        let record = OperativeRecord::new(episode.local_id.clone(), date(2020, 6, 3));
        let follow_ups = ChildDates::from_dates([date(2020, 6, 8), date(2020, 6, 12)]);
        let mut form =
            OperativeForm::edit(validator(), 45, &episode, record).with_follow_ups(follow_ups);

        form.set_field(OperativeField::OperationDate, "2020-06-09");
        assert_eq!(
            form.error(OperativeField::OperationDate),
            Some(&crate::validation::ValidationError::AfterUpperBound {
                bound: date(2020, 6, 8)
            })
        );

        form.set_field(OperativeField::OperationDate, "2020-06-08");
        assert!(form.submit().is_ok());
    }
}
