//! # Shared Application State
//!
//! One explicitly constructed container per session, handed to every
//! component that needs it. Observers subscribe through a `watch` channel
//! and see each mutation as a whole.
//!
//! ```text
//! ┌──────────────┐ set_connection ┌──────────────┐ subscribe ┌──────────┐
//! │ Connection   │ ─────────────▶ │              │ ────────▶ │  Views   │
//! │ Tracker      │                │    Store     │           └──────────┘
//! ├──────────────┤ apply_refresh  │ (AppState +  │
//! │ Refresher    │ ─────────────▶ │  BusySignal) │
//! ├──────────────┤ append_event   │              │
//! │ Event pump   │ ─────────────▶ │              │
//! └──────────────┘                └──────────────┘
//! ```

use std::sync::Arc;

use alloy_primitives::{Address, U256};
use serde::Serialize;
use tokio::sync::watch;

use meebot_shared::constants::{DEFAULT_TOKEN_DECIMALS, DEFAULT_TOKEN_SYMBOL};
use meebot_shared::CanonicalEvent;

use crate::busy::BusySignal;
use crate::event_log::EventLog;

/// Quantities derived from the ledger for the current account.
///
/// Amounts are exact decimal strings, already scaled by the token's decimals.
#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct DerivedBalances {
    /// Collectibles held.
    pub nft_balance: String,
    /// Fungible balance.
    pub token_balance: String,
    /// Number of staked collectibles.
    pub staking_balance: String,
    /// Staking reward rate.
    pub reward_rate: String,
    /// Claimable rewards.
    pub earned: String,
    /// Native currency balance.
    pub native_balance: String,
    /// Token allowance granted to the swap facility.
    pub swap_allowance: String,
    /// Token decimals the amounts were scaled with.
    pub token_decimals: u8,
    /// Token symbol.
    pub token_symbol: String,
    /// Ids of staked collectibles.
    pub staked_token_ids: Vec<U256>,
}

impl Default for DerivedBalances {
    fn default() -> Self {
        Self {
            nft_balance: "0".to_owned(),
            token_balance: "0".to_owned(),
            staking_balance: "0".to_owned(),
            reward_rate: "0".to_owned(),
            earned: "0".to_owned(),
            native_balance: "0".to_owned(),
            swap_allowance: "0".to_owned(),
            token_decimals: DEFAULT_TOKEN_DECIMALS,
            token_symbol: DEFAULT_TOKEN_SYMBOL.to_owned(),
            staked_token_ids: Vec::new(),
        }
    }
}

/// Snapshot of everything the client knows.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct AppState {
    /// Connected identity.
    pub account: Option<Address>,
    /// Whether the wallet reports a connection.
    pub is_connected: bool,
    /// Network name reported by the wallet.
    pub chain_name: Option<String>,
    /// Network id reported by the wallet.
    pub chain_id: Option<u64>,
    /// Derived quantities for `account`.
    pub balances: DerivedBalances,
    /// Event history, newest first.
    pub events: EventLog,
    /// Last error message.
    pub error: Option<String>,
}

/// Handle to the shared state. Cloning shares the same state.
#[derive(Clone, Debug)]
pub struct Store {
    state: Arc<watch::Sender<AppState>>,
    busy: BusySignal,
}

impl Default for Store {
    fn default() -> Self {
        Self::new()
    }
}

impl Store {
    /// Creates an empty store with the default event cap.
    #[must_use]
    pub fn new() -> Self {
        Self::with_event_capacity(meebot_shared::MAX_EVENTS)
    }

    /// Creates an empty store keeping at most `capacity` events.
    #[must_use]
    pub fn with_event_capacity(capacity: usize) -> Self {
        let initial = AppState {
            events: EventLog::with_capacity(capacity),
            ..AppState::default()
        };
        let (tx, _rx) = watch::channel(initial);
        Self {
            state: Arc::new(tx),
            busy: BusySignal::new(),
        }
    }

    /// Copy of the current state.
    #[must_use]
    pub fn snapshot(&self) -> AppState {
        self.state.borrow().clone()
    }

    /// Reads the current state without cloning it.
    pub fn read<R>(&self, f: impl FnOnce(&AppState) -> R) -> R {
        f(&self.state.borrow())
    }

    /// Observes state changes.
    #[must_use]
    pub fn subscribe(&self) -> watch::Receiver<AppState> {
        self.state.subscribe()
    }

    /// The busy signal.
    #[must_use]
    pub const fn busy(&self) -> &BusySignal {
        &self.busy
    }

    /// Derived `loading` flag.
    #[must_use]
    pub fn is_loading(&self) -> bool {
        self.busy.is_busy()
    }

    /// Current `loadingCount`.
    #[must_use]
    pub fn loading_count(&self) -> usize {
        self.busy.count()
    }

    /// Current account.
    #[must_use]
    pub fn account(&self) -> Option<Address> {
        self.state.borrow().account
    }

    /// Mirrors the wallet's account and network.
    ///
    /// Clearing the account (or changing it) resets every derived balance to
    /// its zero value in the same update. Returns `true` if the account changed.
    pub fn set_connection(
        &self,
        account: Option<Address>,
        chain_id: Option<u64>,
        chain_name: Option<String>,
    ) -> bool {
        let mut account_changed = false;
        self.state.send_modify(|state| {
            account_changed = state.account != account;
            if account_changed {
                state.balances = DerivedBalances::default();
            }
            state.account = account;
            state.is_connected = account.is_some();
            state.chain_id = chain_id;
            state.chain_name = chain_name;
        });
        if account_changed {
            tracing::info!(account = ?account, chain_id = ?chain_id, "account changed");
        }
        account_changed
    }

    /// Replaces the derived balances, but only if `account` is still the
    /// connected identity. A batch that finishes after a disconnect or an
    /// account switch is discarded. Returns whether it was applied.
    pub fn apply_refresh(&self, account: Address, balances: DerivedBalances) -> bool {
        self.state.send_if_modified(|state| {
            if state.account != Some(account) {
                tracing::debug!(%account, "discarding refresh for stale account");
                return false;
            }
            state.balances = balances;
            true
        })
    }

    /// Resets every derived balance to its zero value.
    pub fn reset_balances(&self) {
        self.state.send_modify(|state| state.balances = DerivedBalances::default());
    }

    /// Appends a record to the event log.
    pub fn append_event(&self, record: CanonicalEvent) {
        self.state.send_modify(|state| state.events.append(record));
    }

    /// Replaces the error message.
    pub fn set_error(&self, message: impl Into<String>) {
        let message = message.into();
        self.state.send_modify(|state| state.error = Some(message));
    }

    /// Clears the error message.
    pub fn clear_error(&self) {
        self.state.send_if_modified(|state| state.error.take().is_some());
    }

    /// Current error message.
    #[must_use]
    pub fn error(&self) -> Option<String> {
        self.state.borrow().error.clone()
    }

    /// Returns to the initial state: no identity, zero balances, empty log,
    /// no error. The busy signal is left alone; in-flight operations still
    /// release their own holds.
    pub fn reset(&self) {
        self.state.send_modify(|state| {
            let capacity = state.events.capacity();
            *state = AppState {
                events: EventLog::with_capacity(capacity),
                ..AppState::default()
            };
        });
        tracing::info!("state reset");
    }
}
