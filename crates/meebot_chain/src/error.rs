//! # Ledger Bridge Errors

use alloy_primitives::B256;
use thiserror::Error;

/// Failures reported by a [`Ledger`](crate::Ledger) implementation.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum LedgerError {
    /// The ledger refused the call (revert, bad nonce, insufficient funds).
    /// `reason` is the remote's human-readable explanation, passed through verbatim.
    #[error("{reason}")]
    Rejected {
        /// Remote-supplied reason.
        reason: String,
    },

    /// The transport failed before the ledger answered.
    #[error("transport error: {0}")]
    Transport(String),

    /// The transport gave up waiting.
    #[error("request timed out")]
    Timeout,

    /// The transaction was included but reverted.
    #[error("transaction {tx} reverted")]
    Reverted {
        /// Hash of the reverted transaction.
        tx: B256,
    },

    /// The ledger answered with bytes that do not match the interface.
    #[error("malformed response: {0}")]
    Decode(String),

    /// A subscription ended on the remote side.
    #[error("subscription closed")]
    Closed,
}

impl From<alloy_sol_types::Error> for LedgerError {
    fn from(e: alloy_sol_types::Error) -> Self {
        Self::Decode(e.to_string())
    }
}

/// Result type for ledger operations.
pub type LedgerResult<T> = Result<T, LedgerError>;

/// Per-notification decode failures. Never escalated past the normalizer.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum DecodeError {
    /// The first topic does not match any event this resource emits.
    #[error("unknown event signature {0:?}")]
    UnknownEvent(Option<B256>),

    /// Signature matched but topics/data do not fit the event shape.
    #[error("malformed {event} notification: {reason}")]
    Malformed {
        /// Event the notification claimed to be.
        event: &'static str,
        /// Decoder message.
        reason: String,
    },
}

/// Failures loading client configuration.
#[derive(Error, Debug)]
pub enum ConfigError {
    /// The config file could not be read.
    #[error("cannot read config {path}: {source}")]
    Io {
        /// Path that failed.
        path: String,
        /// Underlying error.
        #[source]
        source: std::io::Error,
    },

    /// The document is not valid TOML or has the wrong shape
    /// (including addresses that do not parse).
    #[error("invalid configuration: {0}")]
    Parse(#[from] toml::de::Error),
}
