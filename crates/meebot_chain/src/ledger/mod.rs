//! # The Ledger Seam
//!
//! The remote ledger is an opaque, queryable, subscribable service. This
//! module defines the verbs the client needs from it and the plain data
//! that crosses the boundary.
//!
//! Every verb is a suspension point. Nothing here blocks a thread.

use std::future::Future;

use alloy_primitives::{Address, Bytes, B256, U256};
use alloy_sol_types::SolCall;
use tokio::sync::mpsc;

use crate::error::LedgerResult;

/// Transaction hash.
pub type TxHash = B256;

/// An encoded contract call.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct ContractCall {
    /// Contract being called.
    pub to: Address,
    /// Sender, for state-changing calls and simulation.
    pub from: Option<Address>,
    /// ABI-encoded calldata.
    pub input: Bytes,
    /// Function name, for logs.
    pub method: &'static str,
}

impl ContractCall {
    /// Encodes a typed call against `to`.
    #[must_use]
    pub fn new<C: SolCall>(to: Address, call: &C) -> Self {
        Self {
            to,
            from: None,
            input: Bytes::from(call.abi_encode()),
            method: C::SIGNATURE,
        }
    }

    /// Sets the sender.
    #[must_use]
    pub fn from_account(mut self, account: Address) -> Self {
        self.from = Some(account);
        self
    }

    /// Four-byte selector of the call, if the input has one.
    #[must_use]
    pub fn selector(&self) -> Option<[u8; 4]> {
        self.input.get(..4).and_then(|s| s.try_into().ok())
    }
}

/// A call the ledger accepted in simulation, ready to submit.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct ValidatedCall {
    /// The call that was simulated.
    pub call: ContractCall,
    /// Return data of the dry run.
    pub return_data: Bytes,
    /// Gas the dry run consumed.
    pub gas_estimate: u64,
}

/// Terminal confirmation of a submitted transaction.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct TxReceipt {
    /// Transaction hash.
    pub tx_hash: TxHash,
    /// Block that included it.
    pub block_number: u64,
    /// `true` if execution succeeded.
    pub success: bool,
    /// Gas used.
    pub gas_used: u64,
}

/// Which notifications a subscription delivers.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct LogFilter {
    /// Emitting contract.
    pub address: Address,
    /// Event signature hash.
    pub topic0: B256,
    /// Event name, for logs.
    pub event_name: &'static str,
}

/// A raw notification as delivered by the ledger.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct RawLog {
    /// Emitting contract.
    pub address: Address,
    /// Indexed topics; topic 0 is the event signature.
    pub topics: Vec<B256>,
    /// Non-indexed data.
    pub data: Bytes,
    /// Transaction that emitted it.
    pub transaction_hash: TxHash,
    /// Block number, if mined.
    pub block_number: Option<u64>,
    /// Position within the block.
    pub log_index: Option<u64>,
}

/// The remote ledger, as the client sees it.
///
/// Implementations wrap a wallet-bound RPC client: `submit` signs with the
/// connected identity. Dropping the receiver returned by [`subscribe`]
/// cancels the remote subscription.
///
/// [`subscribe`]: Ledger::subscribe
pub trait Ledger: Send + Sync + 'static {
    /// Executes a read-only call and returns the raw return data.
    fn read(&self, call: &ContractCall) -> impl Future<Output = LedgerResult<Bytes>> + Send;

    /// Opens a live subscription to one notification kind.
    fn subscribe(
        &self,
        filter: LogFilter,
    ) -> impl Future<Output = LedgerResult<mpsc::UnboundedReceiver<RawLog>>> + Send;

    /// Dry-runs a state-changing call against current state.
    fn simulate(
        &self,
        call: &ContractCall,
    ) -> impl Future<Output = LedgerResult<ValidatedCall>> + Send;

    /// Submits a validated call. Returns as soon as the ledger has a hash.
    fn submit(&self, call: &ValidatedCall) -> impl Future<Output = LedgerResult<TxHash>> + Send;

    /// Suspends until `tx` reaches a terminal state.
    fn await_confirmation(
        &self,
        tx: TxHash,
    ) -> impl Future<Output = LedgerResult<TxReceipt>> + Send;

    /// Timestamp of the latest block, in seconds.
    fn latest_block_timestamp(&self) -> impl Future<Output = LedgerResult<u64>> + Send;

    /// Native currency balance of `account`.
    fn native_balance(&self, account: Address) -> impl Future<Output = LedgerResult<U256>> + Send;
}

/// Executes a typed read against `to` and decodes the return.
pub async fn read_call<L, C>(ledger: &L, to: Address, call: &C) -> LedgerResult<C::Return>
where
    L: Ledger,
    C: SolCall,
{
    let request = ContractCall::new(to, call);
    let raw = ledger.read(&request).await?;
    Ok(C::abi_decode_returns(&raw, true)?)
}
