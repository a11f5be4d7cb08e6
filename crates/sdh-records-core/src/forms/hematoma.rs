//! Hematoma measurement forms: one controller per row, plus the list editor
//! that turns row edits into a create/update/delete batch.

use std::collections::BTreeMap;

use thiserror::Error;
use tracing::debug;

use super::{AtField, FormController, FormErrors, FormField, FormState};
use crate::models::{Density, HematomaBatch, HematomaMeasurement, Side};
use crate::validation::{validate_non_negative, Check, ValidationError};

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub enum HematomaField {
    Side,
    Thickness,
    MidlineShift,
    Volume,
    Density,
}

impl FormField for HematomaField {
    const ALL: &'static [Self] = &[
        HematomaField::Side,
        HematomaField::Thickness,
        HematomaField::MidlineShift,
        HematomaField::Volume,
        HematomaField::Density,
    ];

    fn name(&self) -> &'static str {
        match self {
            HematomaField::Side => "side",
            HematomaField::Thickness => "thickness_mm",
            HematomaField::MidlineShift => "midline_shift_mm",
            HematomaField::Volume => "volume_ml",
            HematomaField::Density => "density",
        }
    }
}

fn optional_text(value: Option<f64>) -> String {
    value.map(|v| v.to_string()).unwrap_or_default()
}

/// One measurement row.
#[derive(Debug, Clone)]
pub struct HematomaForm {
    state: FormState<HematomaField>,
    episode_id: String,
    existing: Option<HematomaMeasurement>,
}

impl HematomaForm {
    pub fn create(episode_id: String) -> Self {
        Self {
            state: FormState::default(),
            episode_id,
            existing: None,
        }
    }

    pub fn edit(measurement: HematomaMeasurement) -> Self {
        let mut state = FormState::default();
        state.set(HematomaField::Side, measurement.side.as_str());
        state.set(HematomaField::Thickness, measurement.thickness_mm.to_string());
        state.set(HematomaField::MidlineShift, optional_text(measurement.midline_shift_mm));
        state.set(HematomaField::Volume, optional_text(measurement.volume_ml));
        state.set(HematomaField::Density, measurement.density.as_str());
        Self {
            state,
            episode_id: measurement.episode_id.clone(),
            existing: Some(measurement),
        }
    }

    /// The stored measurement this row was opened from, if any.
    pub fn existing(&self) -> Option<&HematomaMeasurement> {
        self.existing.as_ref()
    }
}

impl FormController for HematomaForm {
    type Field = HematomaField;
    type Payload = HematomaMeasurement;

    fn state(&self) -> &FormState<HematomaField> {
        &self.state
    }

    fn state_mut(&mut self) -> &mut FormState<HematomaField> {
        &mut self.state
    }

    fn check_field(&self, field: HematomaField) -> Check {
        let s = &self.state;
        match field {
            HematomaField::Side => s.choice::<Side>(field).map(|_| ()).into(),
            HematomaField::Thickness => {
                if s.get(field).trim().is_empty() {
                    return Check::invalid(ValidationError::Required);
                }
                validate_non_negative(s.field_value(field))
            }
            HematomaField::MidlineShift | HematomaField::Volume => {
                validate_non_negative(s.field_value(field))
            }
            HematomaField::Density => s.choice::<Density>(field).map(|_| ()).into(),
        }
    }

    fn build(&self) -> Result<HematomaMeasurement, FormErrors> {
        let s = &self.state;
        let side = s.choice(HematomaField::Side).at(HematomaField::Side)?;
        let thickness_mm = s
            .required_number(HematomaField::Thickness)
            .at(HematomaField::Thickness)?;

        let mut measurement = match &self.existing {
            Some(existing) => {
                let mut m = existing.clone();
                m.side = side;
                m.thickness_mm = thickness_mm;
                m
            }
            None => HematomaMeasurement::new(self.episode_id.clone(), side, thickness_mm),
        };
        measurement.midline_shift_mm = s
            .number(HematomaField::MidlineShift)
            .at(HematomaField::MidlineShift)?;
        measurement.volume_ml = s.number(HematomaField::Volume).at(HematomaField::Volume)?;
        measurement.density = s.choice(HematomaField::Density).at(HematomaField::Density)?;

        Ok(measurement)
    }
}

/// Rows that blocked a list submission, keyed by row index.
#[derive(Error, Debug, Clone, PartialEq, Default)]
#[error("{} measurement row(s) failed validation", .rows.len())]
pub struct RowErrors {
    pub rows: BTreeMap<usize, FormErrors>,
}

/// Editable list of an episode's measurements.
///
/// Rows opened from stored measurements become updates when changed and
/// deletes when removed; new rows become creates.
#[derive(Debug, Clone)]
pub struct HematomaListEditor {
    episode_id: String,
    rows: Vec<HematomaForm>,
    deleted: Vec<String>,
}

impl HematomaListEditor {
    pub fn new(episode_id: String, existing: Vec<HematomaMeasurement>) -> Self {
        Self {
            episode_id,
            rows: existing.into_iter().map(HematomaForm::edit).collect(),
            deleted: Vec::new(),
        }
    }

    pub fn len(&self) -> usize {
        self.rows.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    /// Append a blank row and return its index.
    pub fn add_row(&mut self) -> usize {
        self.rows.push(HematomaForm::create(self.episode_id.clone()));
        self.rows.len() - 1
    }

    pub fn row(&self, index: usize) -> Option<&HematomaForm> {
        self.rows.get(index)
    }

    pub fn row_mut(&mut self, index: usize) -> Option<&mut HematomaForm> {
        self.rows.get_mut(index)
    }

    /// Remove a row; a stored measurement is queued for deletion.
    pub fn remove_row(&mut self, index: usize) -> bool {
        if index >= self.rows.len() {
            return false;
        }
        let row = self.rows.remove(index);
        if let Some(existing) = row.existing {
            self.deleted.push(existing.local_id);
        }
        true
    }

    /// Validate every row and collect the changes into one batch.
    pub fn submit(&mut self) -> Result<HematomaBatch, RowErrors> {
        let mut batch = HematomaBatch {
            delete: self.deleted.clone(),
            ..HematomaBatch::default()
        };
        let mut errors = RowErrors::default();

        for (index, row) in self.rows.iter_mut().enumerate() {
            match row.submit() {
                Ok(measurement) => match row.existing() {
                    None => batch.create.push(measurement),
                    Some(original) if measurement != *original => batch.update.push(measurement),
                    Some(_) => {}
                },
                Err(e) => {
                    errors.rows.insert(index, e);
                }
            }
        }

        if !errors.rows.is_empty() {
            return Err(errors);
        }
        debug!(
            episode_id = %self.episode_id,
            create = batch.create.len(),
            update = batch.update.len(),
            delete = batch.delete.len(),
            "hematoma batch prepared"
        );
        Ok(batch)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn stored(thickness: f64) -> HematomaMeasurement {
        HematomaMeasurement::new("episode-1".into(), Side::Left, thickness)
    }

    #[test]
    fn test_row_requires_thickness() {
        let mut form = HematomaForm::create("episode-1".into());
        let errors = form.submit().unwrap_err();
        assert_eq!(errors.get("thickness_mm").map(|e| e.kind()), Some("Required"));
    }

    #[test]
    fn test_row_rejects_negative_values() {
        let mut form = HematomaForm::create("episode-1".into());
        form.set_field(HematomaField::Thickness, "12");
        form.set_field(HematomaField::MidlineShift, "-3");
        assert_eq!(
            form.error(HematomaField::MidlineShift).map(|e| e.kind()),
            Some("NegativeValue")
        );

        form.set_field(HematomaField::MidlineShift, "3.5");
        let m = form.submit().unwrap();
        assert_eq!(m.thickness_mm, 12.0);
        assert_eq!(m.midline_shift_mm, Some(3.5));
        assert_eq!(m.volume_ml, None);
    }

    #[test]
    fn test_list_editor_batches_changes() {
        let keep = stored(10.0);
        let change = stored(15.0);
        let drop = stored(8.0);
        let drop_id = drop.local_id.clone();
        let change_id = change.local_id.clone();

        let mut editor = HematomaListEditor::new("episode-1".into(), vec![keep, change, drop]);
        assert_eq!(editor.len(), 3);

        editor
            .row_mut(1)
            .unwrap()
            .set_field(HematomaField::Thickness, "18");
        assert!(editor.remove_row(2));

        let new_row = editor.add_row();
        let row = editor.row_mut(new_row).unwrap();
        row.set_field(HematomaField::Side, "right");
        row.set_field(HematomaField::Thickness, "9");
        row.set_field(HematomaField::Density, "hyperdense");

        let batch = editor.submit().unwrap();
        assert_eq!(batch.create.len(), 1);
        assert_eq!(batch.create[0].side, Side::Right);
        assert_eq!(batch.update.len(), 1);
        assert_eq!(batch.update[0].local_id, change_id);
        assert_eq!(batch.update[0].thickness_mm, 18.0);
        assert_eq!(batch.delete, vec![drop_id]);
    }

    #[test]
    fn test_list_editor_reports_row_errors() {
        let mut editor = HematomaListEditor::new("episode-1".into(), vec![stored(10.0)]);
        editor.add_row();

        let errors = editor.submit().unwrap_err();
        assert_eq!(errors.rows.len(), 1);
        assert!(errors.rows.contains_key(&1));
    }

    #[test]
    fn test_remove_row_out_of_range() {
        let mut editor = HematomaListEditor::new("episode-1".into(), Vec::new());
        assert!(editor.is_empty());
        assert!(!editor.remove_row(0));
    }
}
