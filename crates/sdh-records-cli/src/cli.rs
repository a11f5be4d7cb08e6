//! CLI argument definitions.

use std::path::PathBuf;

use chrono::NaiveDate;
use clap::{ArgAction, Args, Parser, Subcommand, ValueEnum};

#[derive(Debug, Parser)]
#[command(
    name = "sdh-records",
    version,
    about = "Subdural hematoma records: field validation and export",
    long_about = "Check episode, operative and follow-up dates against a patient's age \
                  and the enclosing record, compute derived ages and day counts, and \
                  export stored records.\n\n\
                  Check results are printed as JSON; the exit code is 1 when any field \
                  is invalid."
)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Command,

    /// More log output (-v info, -vv debug, -vvv trace).
    #[arg(short, long, action = ArgAction::Count, global = true)]
    pub verbose: u8,

    /// Only log errors.
    #[arg(short, long, global = true, conflicts_with = "verbose")]
    pub quiet: bool,

    /// Log output format.
    #[arg(long = "log-format", value_enum, default_value = "pretty", global = true)]
    pub log_format: LogFormatArg,

    /// Date to treat as today (YYYY-MM-DD). Defaults to the current UTC date.
    #[arg(long, value_name = "DATE", global = true)]
    pub today: Option<NaiveDate>,

    /// JSON file overriding the clinical limits.
    #[arg(long, value_name = "PATH", global = true)]
    pub limits: Option<PathBuf>,
}

#[derive(Debug, Subcommand)]
pub enum Command {
    /// Estimate the patient's age on a date and check it is plausible.
    Age(AgeArgs),

    /// Validate episode fields.
    CheckEpisode(EpisodeArgs),

    /// Validate an operative record date against its episode.
    CheckOperative(OperativeArgs),

    /// Validate a follow-up against its operation and episode.
    CheckPostOp(PostOpArgs),

    /// Whole days between two dates.
    Days(DaysArgs),

    /// Export stored records.
    Export(ExportArgs),
}

#[derive(Debug, Args)]
pub struct AgeArgs {
    /// Patient's current age in years.
    #[arg(long = "current-age")]
    pub current_age: u32,

    /// Date to evaluate; omitted means today.
    #[arg(long)]
    pub date: Option<String>,
}

#[derive(Debug, Args)]
pub struct EpisodeArgs {
    /// Patient's current age in years.
    #[arg(long)]
    pub age: u32,

    #[arg(long)]
    pub start: Option<String>,

    #[arg(long)]
    pub discharge: Option<String>,

    /// Antecedent event code (e.g. minor_trauma).
    #[arg(long)]
    pub antecedent: Option<String>,

    /// Days since the antecedent event.
    #[arg(long = "antecedent-days")]
    pub antecedent_days: Option<String>,

    /// Glasgow coma scale on admission.
    #[arg(long)]
    pub gcs: Option<String>,
}

#[derive(Debug, Args)]
pub struct OperativeArgs {
    #[arg(long)]
    pub age: u32,

    #[arg(long = "episode-start")]
    pub episode_start: NaiveDate,

    /// Episode discharge; omitted means the episode is still open.
    #[arg(long = "episode-discharge")]
    pub episode_discharge: Option<NaiveDate>,

    /// Operation date.
    #[arg(long)]
    pub date: Option<String>,
}

#[derive(Debug, Args)]
pub struct PostOpArgs {
    #[arg(long)]
    pub age: u32,

    #[arg(long = "episode-start")]
    pub episode_start: NaiveDate,

    #[arg(long = "episode-discharge")]
    pub episode_discharge: Option<NaiveDate>,

    #[arg(long = "operation-date")]
    pub operation_date: NaiveDate,

    /// Follow-up date.
    #[arg(long)]
    pub date: Option<String>,

    /// Modified Rankin scale score.
    #[arg(long)]
    pub rankin: Option<String>,
}

#[derive(Debug, Args)]
pub struct DaysArgs {
    pub start: Option<String>,

    pub end: Option<String>,

    /// Fail on an inverted range instead of reporting 0.
    #[arg(long)]
    pub strict: bool,
}

#[derive(Debug, Args)]
pub struct ExportArgs {
    /// Record store database.
    #[arg(long, value_name = "PATH")]
    pub db: PathBuf,

    #[arg(long, value_enum, default_value = "csv")]
    pub format: ExportFormatArg,

    /// Export a single patient by local ID.
    #[arg(long)]
    pub patient: Option<String>,

    /// Write to a file instead of stdout.
    #[arg(long, short, value_name = "PATH")]
    pub output: Option<PathBuf>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum ExportFormatArg {
    Csv,
    Json,
}

/// CLI log format choices.
#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum LogFormatArg {
    Pretty,
    Compact,
    Json,
}
