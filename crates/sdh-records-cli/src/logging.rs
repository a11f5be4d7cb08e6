//! Logging setup using `tracing` and `tracing-subscriber`.
//!
//! Logs go to stderr so that command results on stdout stay machine
//! readable. Patient names and free-text notes are never logged by the
//! core; record ids are.
//!
//! # Log Levels
//!
//! - `warn`: discarded persisted state, rejected commands
//! - `info`: applied commands, created patients
//! - `debug`: individual field rejections
//! - `trace`: everything else

use std::io;

use tracing::Level;
use tracing_subscriber::{fmt, layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

/// Log output format.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum LogFormat {
    /// Human-readable format with colors.
    #[default]
    Pretty,
    /// Compact single-line format.
    Compact,
    /// JSON format for machine parsing.
    Json,
}

/// Configuration for logging behavior.
#[derive(Debug, Clone)]
pub struct LogConfig {
    pub level: Level,
    pub format: LogFormat,
    pub with_ansi: bool,
    pub with_target: bool,
}

impl Default for LogConfig {
    fn default() -> Self {
        Self {
            level: Level::WARN,
            format: LogFormat::default(),
            with_ansi: true,
            with_target: false,
        }
    }
}

impl LogConfig {
    /// Level from `-v`/`-q` counts.
    ///
    /// - `-q`: errors only
    /// - none: warn
    /// - `-v`: info
    /// - `-vv`: debug
    /// - `-vvv` and up: trace
    #[must_use]
    pub fn from_verbosity(verbose: u8, quiet: bool) -> Self {
        let level = if quiet {
            Level::ERROR
        } else {
            match verbose {
                0 => Level::WARN,
                1 => Level::INFO,
                2 => Level::DEBUG,
                _ => Level::TRACE,
            }
        };
        Self {
            level,
            ..Default::default()
        }
    }

    #[must_use]
    pub fn with_format(mut self, format: LogFormat) -> Self {
        self.format = format;
        self
    }

    #[must_use]
    pub fn with_ansi(mut self, enable: bool) -> Self {
        self.with_ansi = enable;
        self
    }
}

/// Initialize the global tracing subscriber. Call once at startup.
pub fn init_logging(config: &LogConfig) {
    let filter = build_env_filter(config.level);

    match config.format {
        LogFormat::Json => {
            let layer = fmt::layer()
                .json()
                .with_writer(io::stderr)
                .with_target(config.with_target);
            tracing_subscriber::registry().with(filter).with(layer).init();
        }
        LogFormat::Compact => {
            let layer = fmt::layer()
                .compact()
                .with_writer(io::stderr)
                .with_ansi(config.with_ansi)
                .with_target(config.with_target)
                .without_time();
            tracing_subscriber::registry().with(filter).with(layer).init();
        }
        LogFormat::Pretty => {
            let layer = fmt::layer()
                .with_writer(io::stderr)
                .with_ansi(config.with_ansi)
                .with_target(config.with_target)
                .without_time();
            tracing_subscriber::registry().with(filter).with(layer).init();
        }
    }
}

/// Build an `EnvFilter` from the given level, respecting `RUST_LOG`.
fn build_env_filter(level: Level) -> EnvFilter {
    let level_str = level.as_str().to_lowercase();

    EnvFilter::try_from_default_env().unwrap_or_else(|_| {
        // Dependencies stay at warn
        EnvFilter::new(format!(
            "warn,sdh_records_core={level},sdh_records_cli={level}",
            level = level_str
        ))
    })
}
