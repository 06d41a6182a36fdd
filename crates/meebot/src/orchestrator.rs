//! # Transaction Orchestrator
//!
//! Phases 2 and 3 of every mutating action:
//!
//! ```text
//! ContractCall ──▶ simulate ──▶ submit ──▶ await_confirmation ──▶ TxOutcome
//!                    │            │               │
//!                    ▼            ▼               ▼
//!          SimulationRejected  SubmissionFailed  ConfirmationTimedOut
//!                                                ConfirmationFailed
//! ```
//!
//! Phases run strictly in order. Nothing is retried. Once submitted, a
//! transaction cannot be cancelled from here. The caller holds the busy
//! guard for the whole run.

use std::sync::Arc;

use meebot_chain::{ContractCall, Ledger, LedgerError, TxHash, TxReceipt};

use crate::error::{TxError, TxResult};

/// A confirmed transaction.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct TxOutcome {
    /// Transaction hash.
    pub tx_hash: TxHash,
    /// Terminal confirmation.
    pub receipt: TxReceipt,
}

/// Runs calls through simulate, submit and confirm.
pub struct Orchestrator<L> {
    ledger: Arc<L>,
}

impl<L> Clone for Orchestrator<L> {
    fn clone(&self) -> Self {
        Self {
            ledger: Arc::clone(&self.ledger),
        }
    }
}

impl<L: Ledger> Orchestrator<L> {
    /// Creates an orchestrator.
    #[must_use]
    pub const fn new(ledger: Arc<L>) -> Self {
        Self { ledger }
    }

    /// Simulates `call`, submits the validated call and waits for a terminal
    /// confirmation.
    pub async fn execute(&self, call: ContractCall) -> TxResult<TxOutcome> {
        let method = call.method;

        let validated = self.ledger.simulate(&call).await.map_err(|e| {
            tracing::error!(method, error = %e, "simulation rejected");
            TxError::SimulationRejected(e)
        })?;

        let tx_hash = self.ledger.submit(&validated).await.map_err(|e| {
            tracing::error!(method, error = %e, "submission failed");
            TxError::SubmissionFailed(e)
        })?;
        tracing::info!(method, tx = %tx_hash, "transaction submitted");

        let receipt = match self.ledger.await_confirmation(tx_hash).await {
            Ok(receipt) if receipt.success => receipt,
            Ok(_) => {
                tracing::error!(method, tx = %tx_hash, "transaction reverted");
                return Err(TxError::ConfirmationFailed {
                    tx: tx_hash,
                    reason: LedgerError::Reverted { tx: tx_hash }.to_string(),
                });
            }
            Err(LedgerError::Timeout) => {
                tracing::error!(method, tx = %tx_hash, "confirmation timed out");
                return Err(TxError::ConfirmationTimedOut { tx: tx_hash });
            }
            Err(e) => {
                tracing::error!(method, tx = %tx_hash, error = %e, "confirmation failed");
                return Err(TxError::ConfirmationFailed {
                    tx: tx_hash,
                    reason: e.to_string(),
                });
            }
        };

        tracing::info!(
            method,
            tx = %tx_hash,
            block = receipt.block_number,
            "transaction confirmed"
        );
        Ok(TxOutcome { tx_hash, receipt })
    }
}
