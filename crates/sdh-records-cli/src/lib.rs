//! Command-line front end for the subdural hematoma records core.
//!
//! Exposes the field validators as one-shot checks with JSON output, plus
//! record export from a local store.

pub mod cli;
pub mod commands;
pub mod logging;

pub use commands::{run, Report};
