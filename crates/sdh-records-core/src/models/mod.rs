//! Domain models for subdural hematoma records.
//!
//! These are the typed persistence payloads. Forms hold raw strings and
//! convert into these types on submit; see [`crate::forms`].

mod episode;
mod hematoma;
mod operative;
mod patient;
mod post_operative;

pub use episode::*;
pub use hematoma::*;
pub use operative::*;
pub use patient::*;
pub use post_operative::*;

use thiserror::Error;

/// A stored or submitted code did not match any known variant.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
#[error("Unknown {kind} code: {code}")]
pub struct UnknownCode {
    pub kind: &'static str,
    pub code: String,
}

impl UnknownCode {
    pub(crate) fn new(kind: &'static str, code: &str) -> Self {
        Self {
            kind,
            code: code.to_string(),
        }
    }
}

/// Fresh local id for a new record.
pub(crate) fn new_local_id() -> String {
    uuid::Uuid::new_v4().to_string()
}

pub(crate) fn now_timestamp() -> String {
    chrono::Utc::now().to_rfc3339()
}
