//! Subcommand implementations.

use std::collections::BTreeMap;
use std::fs;

use anyhow::{bail, Context, Result};
use chrono::NaiveDate;
use serde::Serialize;
use serde_json::{json, Value};
use tracing::info;

use sdh_records_core::forms::{
    EpisodeField, EpisodeForm, FormController, FormField, FormState, OperativeField,
    OperativeForm, PostOperativeField, PostOperativeForm,
};
use sdh_records_core::validation::{checked_days_between, days_between, parse_date_field};
use sdh_records_core::{
    Check, ClinicalLimits, ClinicalRecords, Episode, OperativeRecord, Validator,
};

use crate::cli::{
    AgeArgs, Cli, Command, DaysArgs, EpisodeArgs, ExportArgs, ExportFormatArg, OperativeArgs,
    PostOpArgs,
};

/// Local id used for the throwaway parent records of a check.
const CHECK_ID: &str = "cli-check";

/// Result of a subcommand: what to print and whether it passed.
#[derive(Debug)]
pub struct Report {
    pub valid: bool,
    pub output: String,
}

impl Report {
    fn json(valid: bool, value: &impl Serialize) -> Result<Self> {
        Ok(Self {
            valid,
            output: serde_json::to_string_pretty(value)?,
        })
    }
}

/// Run the parsed command line.
pub fn run(cli: &Cli) -> Result<Report> {
    let limits = match &cli.limits {
        Some(path) => ClinicalLimits::from_json_file(path)
            .with_context(|| format!("loading limits from {}", path.display()))?,
        None => ClinicalLimits::default(),
    };
    let validator = match cli.today {
        Some(today) => Validator::new(limits.clone(), today),
        None => Validator::for_today(limits.clone()),
    };

    match &cli.command {
        Command::Age(args) => run_age(&validator, args),
        Command::CheckEpisode(args) => run_check_episode(validator, args),
        Command::CheckOperative(args) => run_check_operative(validator, args),
        Command::CheckPostOp(args) => run_check_post_op(validator, args),
        Command::Days(args) => run_days(args),
        Command::Export(args) => run_export(limits, args),
    }
}

fn run_age(validator: &Validator, args: &AgeArgs) -> Result<Report> {
    let date = match args.date.as_deref().map(parse_date_field).transpose() {
        Ok(date) => date.flatten(),
        Err(e) => {
            let check = Check::invalid(e);
            return Report::json(false, &check);
        }
    };
    let check = validator.validate_date_against_age(date, args.current_age);
    Report::json(check.is_valid(), &check)
}

/// Field errors of a validated form, keyed by form name.
fn field_errors<F: FormField>(state: &FormState<F>) -> BTreeMap<&'static str, Value> {
    state
        .errors()
        .iter()
        .map(|(field, error)| {
            (
                field.name(),
                json!({ "kind": error.kind(), "message": error.to_string() }),
            )
        })
        .collect()
}

fn form_report<C: FormController>(form: &mut C, derived: Value) -> Result<Report> {
    let valid = form.validate();
    Report::json(
        valid,
        &json!({
            "isValid": valid,
            "errors": field_errors(form.state()),
            "derived": derived,
        }),
    )
}

fn set_optional<C: FormController>(form: &mut C, field: C::Field, value: Option<&str>) {
    if let Some(value) = value {
        form.set_field(field, value);
    }
}

fn run_check_episode(validator: Validator, args: &EpisodeArgs) -> Result<Report> {
    let mut form = EpisodeForm::create(validator, CHECK_ID.to_string(), args.age);
    set_optional(&mut form, EpisodeField::StartDate, args.start.as_deref());
    set_optional(&mut form, EpisodeField::DischargeDate, args.discharge.as_deref());
    set_optional(&mut form, EpisodeField::Antecedent, args.antecedent.as_deref());
    set_optional(&mut form, EpisodeField::TimeSinceAntecedent, args.antecedent_days.as_deref());
    set_optional(&mut form, EpisodeField::GcsOnAdmission, args.gcs.as_deref());

    let derived = serde_json::to_value(form.derived())?;
    form_report(&mut form, derived)
}

fn parent_episode(
    validator: &Validator,
    age: u32,
    start: NaiveDate,
    discharge: Option<NaiveDate>,
) -> Episode {
    let mut episode = Episode::new(
        CHECK_ID.to_string(),
        start,
        validator.age_at_date(age, Some(start)),
    );
    episode.local_id = CHECK_ID.to_string();
    episode.discharge_date = discharge;
    episode
}

fn run_check_operative(validator: Validator, args: &OperativeArgs) -> Result<Report> {
    let episode = parent_episode(&validator, args.age, args.episode_start, args.episode_discharge);
    let mut form = OperativeForm::create(validator, args.age, &episode);
    set_optional(&mut form, OperativeField::OperationDate, args.date.as_deref());

    let derived = serde_json::to_value(form.derived())?;
    form_report(&mut form, derived)
}

fn run_check_post_op(validator: Validator, args: &PostOpArgs) -> Result<Report> {
    let episode = parent_episode(&validator, args.age, args.episode_start, args.episode_discharge);
    let operative = OperativeRecord::new(episode.local_id.clone(), args.operation_date);
    let mut form = PostOperativeForm::create(validator, args.age, &episode, &operative);
    set_optional(&mut form, PostOperativeField::FollowUpDate, args.date.as_deref());
    set_optional(&mut form, PostOperativeField::RankinScore, args.rankin.as_deref());

    let derived = serde_json::to_value(form.derived())?;
    form_report(&mut form, derived)
}

fn run_days(args: &DaysArgs) -> Result<Report> {
    let parse = |value: &Option<String>| -> Result<Option<NaiveDate>> {
        match value {
            Some(text) => Ok(parse_date_field(text)?),
            None => Ok(None),
        }
    };
    let start = parse(&args.start)?;
    let end = parse(&args.end)?;

    if args.strict {
        let days = checked_days_between(start, end)?;
        return Report::json(true, &json!({ "days": days }));
    }
    Report::json(true, &json!({ "days": days_between(start, end) }))
}

fn run_export(limits: ClinicalLimits, args: &ExportArgs) -> Result<Report> {
    if !args.db.exists() {
        bail!("record store not found: {}", args.db.display());
    }
    let records = ClinicalRecords::open(&args.db, limits)
        .with_context(|| format!("opening {}", args.db.display()))?;

    let output = match (&args.patient, args.format) {
        (Some(id), ExportFormatArg::Csv) => records.export_patient(id)?.to_csv(),
        (Some(id), ExportFormatArg::Json) => records.export_patient(id)?.to_json()?,
        (None, ExportFormatArg::Csv) => records.export_csv()?,
        (None, ExportFormatArg::Json) => records.export_json()?,
    };

    match &args.output {
        Some(path) => {
            fs::write(path, &output).with_context(|| format!("writing {}", path.display()))?;
            info!(path = %path.display(), bytes = output.len(), "export written");
            Ok(Report {
                valid: true,
                output: String::new(),
            })
        }
        None => Ok(Report { valid: true, output }),
    }
}
