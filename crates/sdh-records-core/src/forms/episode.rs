//! Episode form controller.

use serde::Serialize;

use super::{AtField, ChildDates, FormController, FormErrors, FormField, FormState};
use crate::models::{Antecedent, Episode};
use crate::validation::{
    format_date_field, validate_discharge_after_start, Check, ValidationError, Validator,
};

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub enum EpisodeField {
    StartDate,
    DischargeDate,
    Antecedent,
    TimeSinceAntecedent,
    GcsOnAdmission,
    Notes,
}

impl FormField for EpisodeField {
    const ALL: &'static [Self] = &[
        EpisodeField::StartDate,
        EpisodeField::DischargeDate,
        EpisodeField::Antecedent,
        EpisodeField::TimeSinceAntecedent,
        EpisodeField::GcsOnAdmission,
        EpisodeField::Notes,
    ];

    fn name(&self) -> &'static str {
        match self {
            EpisodeField::StartDate => "start_date",
            EpisodeField::DischargeDate => "discharge_date",
            EpisodeField::Antecedent => "antecedent",
            EpisodeField::TimeSinceAntecedent => "time_since_antecedent",
            EpisodeField::GcsOnAdmission => "gcs_on_admission",
            EpisodeField::Notes => "notes",
        }
    }
}

/// Values computed from the current field text for display.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct EpisodeDerived {
    pub age_at_episode: i64,
    /// Days between start and discharge, 0 until both are set
    pub length_of_stay: i64,
}

/// Create/edit form for a patient's episode.
#[derive(Debug, Clone)]
pub struct EpisodeForm {
    state: FormState<EpisodeField>,
    validator: Validator,
    patient_id: String,
    patient_age: u32,
    existing: Option<Episode>,
    /// Dates of the operations and follow-ups already stored under the episode
    children: Option<ChildDates>,
}

impl EpisodeForm {
    /// Blank form for a new episode.
    pub fn create(validator: Validator, patient_id: String, patient_age: u32) -> Self {
        Self {
            state: FormState::default(),
            validator,
            patient_id,
            patient_age,
            existing: None,
            children: None,
        }
    }

    /// Form pre-filled from a stored episode.
    pub fn edit(validator: Validator, patient_age: u32, episode: Episode) -> Self {
        let mut state = FormState::default();
        state.set(EpisodeField::StartDate, format_date_field(Some(episode.start_date)));
        state.set(EpisodeField::DischargeDate, format_date_field(episode.discharge_date));
        state.set(EpisodeField::Antecedent, episode.antecedent.as_str());
        state.set(
            EpisodeField::TimeSinceAntecedent,
            episode
                .time_since_antecedent_days
                .map(|d| d.to_string())
                .unwrap_or_default(),
        );
        state.set(
            EpisodeField::GcsOnAdmission,
            episode.gcs_on_admission.map(|g| g.to_string()).unwrap_or_default(),
        );
        state.set(EpisodeField::Notes, episode.notes.clone().unwrap_or_default());

        Self {
            state,
            validator,
            patient_id: episode.patient_id.clone(),
            patient_age,
            existing: Some(episode),
            children: None,
        }
    }

    /// Keep the edited window around the episode's stored records.
    pub fn with_children(mut self, children: Option<ChildDates>) -> Self {
        self.children = children;
        self
    }

    pub fn is_edit(&self) -> bool {
        self.existing.is_some()
    }

    pub fn derived(&self) -> EpisodeDerived {
        let start = self.state.date(EpisodeField::StartDate).ok().flatten();
        let discharge = self.state.date(EpisodeField::DischargeDate).ok().flatten();
        EpisodeDerived {
            age_at_episode: self.validator.age_at_date(self.patient_age, start),
            length_of_stay: self.validator.days_between(start, discharge),
        }
    }
}

impl FormController for EpisodeForm {
    type Field = EpisodeField;
    type Payload = Episode;

    fn state(&self) -> &FormState<EpisodeField> {
        &self.state
    }

    fn state_mut(&mut self) -> &mut FormState<EpisodeField> {
        &mut self.state
    }

    fn dependents(field: EpisodeField) -> &'static [EpisodeField] {
        match field {
            EpisodeField::StartDate => &[EpisodeField::DischargeDate],
            EpisodeField::Antecedent => &[EpisodeField::TimeSinceAntecedent],
            _ => &[],
        }
    }

    fn check_field(&self, field: EpisodeField) -> Check {
        let v = &self.validator;
        let s = &self.state;
        match field {
            EpisodeField::StartDate => {
                let start = match s.required_date(field) {
                    Ok(date) => date,
                    Err(e) => return Check::invalid(e),
                };
                let age = v.validate_date_against_age(Some(start), self.patient_age);
                if !age.is_valid() {
                    return age.check();
                }
                let future = v.validate_not_future(Some(start));
                match &self.children {
                    Some(children) if future.is_valid() => children.check_start(start),
                    _ => future,
                }
            }
            EpisodeField::DischargeDate => {
                let discharge = match s.date(field) {
                    Ok(date) => date,
                    Err(e) => return Check::invalid(e),
                };
                let age = v.validate_date_against_age(discharge, self.patient_age);
                if !age.is_valid() {
                    return age.check();
                }
                // An unparseable start is reported on the start field
                let start = s.date(EpisodeField::StartDate).ok().flatten();
                let order = validate_discharge_after_start(start, discharge);
                match &self.children {
                    Some(children) if order.is_valid() => children.check_end(discharge),
                    _ => order,
                }
            }
            EpisodeField::Antecedent => s.choice::<Antecedent>(field).map(|_| ()).into(),
            EpisodeField::TimeSinceAntecedent => {
                let value = s.field_value(field);
                let lifetime = v.validate_antecedent_days(value.clone(), self.patient_age);
                if !lifetime.is_valid() || value.is_empty() {
                    return lifetime;
                }
                match s.choice::<Antecedent>(EpisodeField::Antecedent) {
                    Ok(antecedent) if !antecedent.has_onset() => {
                        Check::invalid(ValidationError::NoOnset {
                            antecedent: antecedent.as_str().to_string(),
                        })
                    }
                    // A bad choice is reported on the antecedent field
                    _ => Check::valid(),
                }
            }
            EpisodeField::GcsOnAdmission => v.validate_gcs(s.field_value(field)),
            EpisodeField::Notes => Check::valid(),
        }
    }

    fn build(&self) -> Result<Episode, FormErrors> {
        let s = &self.state;
        let start_date = s.required_date(EpisodeField::StartDate).at(EpisodeField::StartDate)?;
        let discharge_date = s.date(EpisodeField::DischargeDate).at(EpisodeField::DischargeDate)?;
        let antecedent = s.choice(EpisodeField::Antecedent).at(EpisodeField::Antecedent)?;
        let time_since_antecedent_days = s
            .number(EpisodeField::TimeSinceAntecedent)
            .at(EpisodeField::TimeSinceAntecedent)?
            .map(|days| days.round() as u32);
        let gcs_on_admission = s
            .number(EpisodeField::GcsOnAdmission)
            .at(EpisodeField::GcsOnAdmission)?
            .map(|gcs| gcs.round() as u8);
        let age_at_episode = self.validator.age_at_date(self.patient_age, Some(start_date));

        let mut episode = match &self.existing {
            Some(existing) => {
                let mut episode = existing.clone();
                episode.start_date = start_date;
                episode.age_at_episode = age_at_episode;
                episode.touch();
                episode
            }
            None => Episode::new(self.patient_id.clone(), start_date, age_at_episode),
        };
        episode.discharge_date = discharge_date;
        episode.antecedent = antecedent;
        episode.time_since_antecedent_days = time_since_antecedent_days;
        episode.gcs_on_admission = gcs_on_admission;
        episode.notes = s.text(EpisodeField::Notes);

        Ok(episode)
    }
}
