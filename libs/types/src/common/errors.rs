//! Error types for identifier and address validation

use thiserror::Error;

/// Errors that can occur while parsing addresses, hashes and typed ids
#[derive(Debug, Error, Clone, PartialEq)]
pub enum ValidationError {
    /// Address text is not 20 bytes of hex
    #[error("Invalid address '{input}': {reason}")]
    InvalidAddress { input: String, reason: String },

    /// Transaction hash text is not 32 bytes of hex
    #[error("Invalid transaction hash '{input}': {reason}")]
    InvalidHash { input: String, reason: String },

    /// Registry ids start at 1; zero is never assigned
    #[error("ID cannot be null/zero")]
    NullId,

    /// ID text is not a non-negative integer
    #[error("Invalid id '{input}' - expected a positive integer")]
    InvalidId { input: String },
}
