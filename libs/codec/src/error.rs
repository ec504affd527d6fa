//! Reasons a record failed to decode
//!
//! These never cross the codec boundary as errors; [`crate::decode`] logs them and
//! degrades to `None`. They exist so the log line says which field was wrong.

use thiserror::Error;

#[derive(Debug, Error, Clone, PartialEq)]
pub enum DecodeError {
    /// Raw value was neither array-like nor object-like
    #[error("Unrecognized record shape: expected array or object, got {found}")]
    UnrecognizedShape { found: &'static str },

    /// Required field absent under both its name and its position
    #[error("Missing field '{field}' (position {position})")]
    MissingField { field: &'static str, position: usize },

    /// Field present but not coercible to its canonical type
    #[error("Invalid field '{field}': {reason}")]
    InvalidField { field: &'static str, reason: String },
}
