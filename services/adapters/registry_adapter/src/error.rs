//! Error types at the network boundary
//!
//! Read paths absorb these and return neutral values; write paths turn them into
//! a terminal [`crate::lifecycle::TxFailure`].

use thiserror::Error;

/// Failure of one call through a [`crate::transport::RegistryTransport`]
#[derive(Debug, Error, Clone, PartialEq)]
pub enum TransportError {
    /// Connection, HTTP or JSON-RPC level failure
    #[error("RPC request failed: {0}")]
    Network(String),

    /// The contract reverted the call
    #[error("Contract reverted: {0}")]
    Reverted(String),

    /// The signer refused to sign or the node refused the transaction
    #[error("Transaction rejected: {0}")]
    Rejected(String),

    /// The node answered but the payload could not be decoded
    #[error("Undecodable response: {0}")]
    Decode(String),

    #[error("Request timed out after {0}ms")]
    Timeout(u64),

    /// Writes need a signing key and none is configured
    #[error("No signer configured for writes")]
    NoSigner,
}

impl TransportError {
    /// Classify a provider error message.
    ///
    /// JSON-RPC nodes report reverts as plain error text, so this is the only
    /// signal available.
    pub fn from_rpc_message(message: String) -> Self {
        let lowered = message.to_ascii_lowercase();
        if lowered.contains("revert") {
            Self::Reverted(message)
        } else {
            Self::Network(message)
        }
    }
}

/// Failure of a directory lookup
#[derive(Debug, Error, Clone, PartialEq)]
pub enum ResolveError {
    #[error("Directory request failed: {0}")]
    Request(String),

    #[error("Directory returned HTTP {0}")]
    Status(u16),

    #[error("Directory response missing EVM address: {0}")]
    Decode(String),
}
