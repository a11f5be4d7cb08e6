//! SDH Records CLI.

use std::io::{self, IsTerminal};

use clap::Parser;
use sdh_records_cli::cli::{Cli, LogFormatArg};
use sdh_records_cli::logging::{init_logging, LogConfig, LogFormat};
use sdh_records_cli::run;

fn main() {
    let cli = Cli::parse();
    init_logging(&log_config_from_cli(&cli));

    let exit_code = match run(&cli) {
        Ok(report) => {
            if !report.output.is_empty() {
                println!("{}", report.output);
            }
            if report.valid {
                0
            } else {
                1
            }
        }
        Err(error) => {
            eprintln!("error: {:#}", error);
            2
        }
    };
    std::process::exit(exit_code);
}

/// Build logging configuration from CLI flags.
fn log_config_from_cli(cli: &Cli) -> LogConfig {
    let format = match cli.log_format {
        LogFormatArg::Pretty => LogFormat::Pretty,
        LogFormatArg::Compact => LogFormat::Compact,
        LogFormatArg::Json => LogFormat::Json,
    };
    LogConfig::from_verbosity(cli.verbose, cli.quiet)
        .with_format(format)
        .with_ansi(io::stderr().is_terminal())
}
