//! # Simulated Ledger
//!
//! An in-memory [`Ledger`] for tests and the demo binary. Reads answer from
//! a script, every call is recorded, confirmations and reads can be held
//! open, and notifications are injected by hand.
//!
//! ```rust,ignore
//! let ledger = SimLedger::new();
//! ledger.respond(token, &IERC20::balanceOfCall { account }, U256::from(5u64));
//! ledger.hold_confirmations();
//! // ... start an action, observe the busy signal ...
//! ledger.release_confirmations();
//! ```

use std::collections::HashMap;

use alloy_primitives::{Address, Bytes, B256, U256};
use alloy_sol_types::{SolCall, SolValue};
use parking_lot::Mutex;
use tokio::sync::{mpsc, watch};

use meebot_chain::{
    ContractCall, Ledger, LedgerError, LedgerResult, LogFilter, RawLog, TxHash, TxReceipt,
    ValidatedCall,
};

/// Gas every simulated call reports.
pub const SIM_GAS: u64 = 21_000;

/// How submitted transactions end.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum ConfirmMode {
    /// Included and succeeded.
    #[default]
    Success,
    /// Included and reverted.
    Revert,
    /// The transport gave up.
    Timeout,
}

/// One recorded ledger call.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum RecordedCall {
    /// `read`.
    Read(ContractCall),
    /// `simulate`.
    Simulate(ContractCall),
    /// `submit`.
    Submit(ContractCall),
}

#[derive(Default)]
struct SimState {
    reads: HashMap<(Address, Bytes), LedgerResult<Bytes>>,
    simulation_rejections: HashMap<(Address, [u8; 4]), String>,
    submit_error: Option<LedgerError>,
    confirm_mode: ConfirmMode,
    subscriptions: Vec<(LogFilter, mpsc::UnboundedSender<RawLog>)>,
    calls: Vec<RecordedCall>,
    native: HashMap<Address, U256>,
    block_timestamp: u64,
    block_number: u64,
    next_tx: u64,
}

/// The simulated ledger.
pub struct SimLedger {
    state: Mutex<SimState>,
    reads_open: watch::Sender<bool>,
    confirmations_open: watch::Sender<bool>,
}

impl Default for SimLedger {
    fn default() -> Self {
        Self::new()
    }
}

impl SimLedger {
    /// Block time the ledger starts at.
    pub const GENESIS_TIMESTAMP: u64 = 1_700_000_000;

    /// Creates an empty ledger: no scripted reads, confirmations succeed.
    #[must_use]
    pub fn new() -> Self {
        let state = SimState {
            block_timestamp: Self::GENESIS_TIMESTAMP,
            block_number: 1,
            ..SimState::default()
        };
        Self {
            state: Mutex::new(state),
            reads_open: watch::channel(true).0,
            confirmations_open: watch::channel(true).0,
        }
    }

    // -------------------------------------------------------------------------
    // Scripting
    // -------------------------------------------------------------------------

    /// Answers `call` against `to` with `value`.
    pub fn respond<C, V>(&self, to: Address, call: &C, value: V)
    where
        C: SolCall,
        V: SolValue,
    {
        let key = (to, Bytes::from(call.abi_encode()));
        self.state.lock().reads.insert(key, Ok(Bytes::from(value.abi_encode())));
    }

    /// Fails `call` against `to` with `error`.
    pub fn fail_read<C: SolCall>(&self, to: Address, call: &C, error: LedgerError) {
        let key = (to, Bytes::from(call.abi_encode()));
        self.state.lock().reads.insert(key, Err(error));
    }

    /// Rejects every simulation of `C` against `to` with `reason`.
    pub fn reject_simulation<C: SolCall>(&self, to: Address, reason: impl Into<String>) {
        self.state
            .lock()
            .simulation_rejections
            .insert((to, C::SELECTOR), reason.into());
    }

    /// Stops rejecting simulations of `C` against `to`.
    pub fn accept_simulation<C: SolCall>(&self, to: Address) {
        self.state.lock().simulation_rejections.remove(&(to, C::SELECTOR));
    }

    /// Fails every submission with `error`.
    pub fn fail_submissions(&self, error: LedgerError) {
        self.state.lock().submit_error = Some(error);
    }

    /// Sets how later confirmations end.
    pub fn confirm_with(&self, mode: ConfirmMode) {
        self.state.lock().confirm_mode = mode;
    }

    /// Sets a native balance.
    pub fn set_native_balance(&self, account: Address, amount: U256) {
        self.state.lock().native.insert(account, amount);
    }

    /// Sets the latest block time.
    pub fn set_block_timestamp(&self, timestamp: u64) {
        self.state.lock().block_timestamp = timestamp;
    }

    /// Reads wait until [`release_reads`](Self::release_reads).
    pub fn hold_reads(&self) {
        self.reads_open.send_replace(false);
    }

    /// Lets held reads finish.
    pub fn release_reads(&self) {
        self.reads_open.send_replace(true);
    }

    /// Confirmations wait until [`release_confirmations`](Self::release_confirmations).
    pub fn hold_confirmations(&self) {
        self.confirmations_open.send_replace(false);
    }

    /// Lets held confirmations finish.
    pub fn release_confirmations(&self) {
        self.confirmations_open.send_replace(true);
    }

    // -------------------------------------------------------------------------
    // Notifications
    // -------------------------------------------------------------------------

    /// Delivers `log` to every live subscription on its address and first
    /// topic. Returns the number of deliveries.
    pub fn emit(&self, log: RawLog) -> usize {
        let mut state = self.state.lock();
        state.subscriptions.retain(|(_, tx)| !tx.is_closed());
        let topic0 = log.topics.first().copied();
        state
            .subscriptions
            .iter()
            .filter(|(filter, _)| filter.address == log.address && Some(filter.topic0) == topic0)
            .filter(|(_, tx)| tx.send(log.clone()).is_ok())
            .count()
    }

    /// Delivers `log` to the subscription for `event_name` at `address`,
    /// whatever its topics say.
    pub fn emit_as(&self, address: Address, event_name: &str, log: RawLog) -> usize {
        let state = self.state.lock();
        state
            .subscriptions
            .iter()
            .filter(|(filter, _)| filter.address == address && filter.event_name == event_name)
            .filter(|(_, tx)| tx.send(log.clone()).is_ok())
            .count()
    }

    /// Subscriptions whose receiver is still alive.
    #[must_use]
    pub fn live_subscriptions(&self) -> usize {
        self.state
            .lock()
            .subscriptions
            .iter()
            .filter(|(_, tx)| !tx.is_closed())
            .count()
    }

    // -------------------------------------------------------------------------
    // Inspection
    // -------------------------------------------------------------------------

    /// Every recorded call, in order.
    #[must_use]
    pub fn calls(&self) -> Vec<RecordedCall> {
        self.state.lock().calls.clone()
    }

    /// Simulated calls, in order.
    #[must_use]
    pub fn simulated(&self) -> Vec<ContractCall> {
        self.recorded(|c| match c {
            RecordedCall::Simulate(call) => Some(call.clone()),
            _ => None,
        })
    }

    /// Submitted calls, in order.
    #[must_use]
    pub fn submitted(&self) -> Vec<ContractCall> {
        self.recorded(|c| match c {
            RecordedCall::Submit(call) => Some(call.clone()),
            _ => None,
        })
    }

    /// Number of reads served (or failed).
    #[must_use]
    pub fn read_count(&self) -> usize {
        self.recorded(|c| matches!(c, RecordedCall::Read(_)).then_some(())).len()
    }

    fn recorded<T>(&self, pick: impl Fn(&RecordedCall) -> Option<T>) -> Vec<T> {
        self.state.lock().calls.iter().filter_map(pick).collect()
    }

    fn next_hash(&self) -> TxHash {
        let mut state = self.state.lock();
        state.next_tx += 1;
        B256::left_padding_from(&state.next_tx.to_be_bytes())
    }
}

impl Ledger for SimLedger {
    async fn read(&self, call: &ContractCall) -> LedgerResult<Bytes> {
        let result = {
            let mut state = self.state.lock();
            state.calls.push(RecordedCall::Read(call.clone()));
            state
                .reads
                .get(&(call.to, call.input.clone()))
                .cloned()
                .unwrap_or_else(|| {
                    Err(LedgerError::Rejected {
                        reason: format!("no response scripted for {} on {}", call.method, call.to),
                    })
                })
        };
        let mut gate = self.reads_open.subscribe();
        let _ = gate.wait_for(|open| *open).await;
        result
    }

    async fn subscribe(&self, filter: LogFilter) -> LedgerResult<mpsc::UnboundedReceiver<RawLog>> {
        let (tx, rx) = mpsc::unbounded_channel();
        self.state.lock().subscriptions.push((filter, tx));
        Ok(rx)
    }

    async fn simulate(&self, call: &ContractCall) -> LedgerResult<ValidatedCall> {
        let mut state = self.state.lock();
        state.calls.push(RecordedCall::Simulate(call.clone()));
        let rejection = call
            .selector()
            .and_then(|selector| state.simulation_rejections.get(&(call.to, selector)));
        if let Some(reason) = rejection {
            return Err(LedgerError::Rejected {
                reason: reason.clone(),
            });
        }
        Ok(ValidatedCall {
            call: call.clone(),
            return_data: Bytes::new(),
            gas_estimate: SIM_GAS,
        })
    }

    async fn submit(&self, call: &ValidatedCall) -> LedgerResult<TxHash> {
        {
            let mut state = self.state.lock();
            state.calls.push(RecordedCall::Submit(call.call.clone()));
            if let Some(err) = state.submit_error.clone() {
                return Err(err);
            }
        }
        Ok(self.next_hash())
    }

    async fn await_confirmation(&self, tx: TxHash) -> LedgerResult<TxReceipt> {
        let mut gate = self.confirmations_open.subscribe();
        let _ = gate.wait_for(|open| *open).await;

        let mut state = self.state.lock();
        match state.confirm_mode {
            ConfirmMode::Timeout => Err(LedgerError::Timeout),
            mode => {
                state.block_number += 1;
                state.block_timestamp += 12;
                Ok(TxReceipt {
                    tx_hash: tx,
                    block_number: state.block_number,
                    success: mode == ConfirmMode::Success,
                    gas_used: SIM_GAS,
                })
            }
        }
    }

    async fn latest_block_timestamp(&self) -> LedgerResult<u64> {
        Ok(self.state.lock().block_timestamp)
    }

    async fn native_balance(&self, account: Address) -> LedgerResult<U256> {
        Ok(self.state.lock().native.get(&account).copied().unwrap_or(U256::ZERO))
    }
}
