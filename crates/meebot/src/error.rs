//! # Client Errors
//!
//! Failures surfaced to the caller of an action or a refresh. None of them
//! is retried here; retrying is the user's call.

use meebot_chain::{LedgerError, TxHash};
use thiserror::Error;

/// Why a mutating action did not complete.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum TxError {
    /// Identity, resource address or input missing or malformed.
    /// Raised before any remote call.
    #[error("{0}")]
    MissingPrecondition(String),

    /// The acting party lacks the approval or allowance the action needs.
    /// Run the matching approval action first.
    #[error("{0}")]
    NotAuthorized(String),

    /// The ledger refused the dry run. The remote reason is kept verbatim.
    #[error("{0}")]
    SimulationRejected(LedgerError),

    /// The ledger did not accept the submission.
    #[error("{0}")]
    SubmissionFailed(LedgerError),

    /// Submitted, but no terminal confirmation arrived in time.
    #[error("transaction {tx} was not confirmed in time")]
    ConfirmationTimedOut {
        /// Submitted transaction.
        tx: TxHash,
    },

    /// Submitted, and the terminal state is a failure.
    #[error("transaction {tx} failed: {reason}")]
    ConfirmationFailed {
        /// Submitted transaction.
        tx: TxHash,
        /// Remote reason.
        reason: String,
    },
}

impl TxError {
    /// Whether the action stopped before touching the ledger's write path.
    #[must_use]
    pub const fn is_precondition(&self) -> bool {
        matches!(self, Self::MissingPrecondition(_) | Self::NotAuthorized(_))
    }
}

/// Result type for actions.
pub type TxResult<T> = Result<T, TxError>;

/// A refresh batch failed; derived state was left as it was.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum RefreshError {
    /// One of the batch reads failed.
    #[error("Failed to refresh balances: {0}")]
    RefreshFailed(#[from] LedgerError),
}
