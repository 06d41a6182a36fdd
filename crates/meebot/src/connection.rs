//! # Connection/Network Tracker
//!
//! Mirrors what the wallet connector reports into the store and answers
//! "are we on the right chain".

use alloy_primitives::Address;

use meebot_chain::ChainConfig;
use meebot_state::{AppState, BusyGuard, Store};

/// One observation of the wallet connector.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct WalletStatus {
    /// Connected account.
    pub account: Option<Address>,
    /// Chain the wallet is on.
    pub chain_id: Option<u64>,
    /// Display name of that chain.
    pub chain_name: Option<String>,
    /// The connector is mid-handshake.
    pub connecting: bool,
}

impl WalletStatus {
    /// Connected to `account` on `chain_id`.
    #[must_use]
    pub fn connected(account: Address, chain_id: u64, chain_name: impl Into<String>) -> Self {
        Self {
            account: Some(account),
            chain_id: Some(chain_id),
            chain_name: Some(chain_name.into()),
            connecting: false,
        }
    }

    /// Handshake in progress.
    #[must_use]
    pub fn connecting() -> Self {
        Self {
            connecting: true,
            ..Self::default()
        }
    }

    /// Nothing connected.
    #[must_use]
    pub fn disconnected() -> Self {
        Self::default()
    }
}

/// What a status update changed.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct ConnectionChange {
    /// Account differs from the previous one.
    pub account_changed: bool,
    /// Chain differs from the previous one.
    pub chain_changed: bool,
}

impl ConnectionChange {
    /// Whether derived state has to be re-read (or reset).
    #[must_use]
    pub const fn needs_refresh(self) -> bool {
        self.account_changed || self.chain_changed
    }
}

/// Network banner shown above everything else.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum NetworkBanner {
    /// Connected to the required chain.
    Hidden,
    /// No wallet yet; prompt the user to connect one.
    Disconnected,
    /// Connected, but to the wrong chain.
    WrongNetwork {
        /// Chain the wallet is on.
        current: String,
        /// Chain the resources live on.
        required: String,
    },
}

/// Writes wallet status into the store.
#[derive(Clone, Debug)]
pub struct ConnectionTracker {
    store: Store,
    required: ChainConfig,
}

impl ConnectionTracker {
    /// Creates a tracker for `required`.
    #[must_use]
    pub const fn new(store: Store, required: ChainConfig) -> Self {
        Self { store, required }
    }

    /// Mirrors `status` into the store.
    pub fn apply(&self, status: &WalletStatus) -> ConnectionChange {
        let previous_chain = self.store.read(|s| s.chain_id);
        let account_changed =
            self.store
                .set_connection(status.account, status.chain_id, status.chain_name.clone());
        let change = ConnectionChange {
            account_changed,
            chain_changed: previous_chain != status.chain_id,
        };

        if change.chain_changed && self.is_wrong_network() {
            tracing::warn!(
                chain_id = ?status.chain_id,
                required = self.required.id,
                "wallet is on the wrong network"
            );
        }
        change
    }

    /// Connected and the chain id is not the required one.
    #[must_use]
    pub fn is_wrong_network(&self) -> bool {
        self.store.read(|state| is_wrong_network(state, self.required.id))
    }

    /// Whether reads and writes may go to the ledger now.
    #[must_use]
    pub fn is_ready(&self) -> bool {
        self.store
            .read(|state| state.account.is_some() && state.chain_id == Some(self.required.id))
    }

    /// Current banner.
    #[must_use]
    pub fn banner(&self) -> NetworkBanner {
        self.store.read(|state| {
            if !state.is_connected {
                return NetworkBanner::Disconnected;
            }
            if !is_wrong_network(state, self.required.id) {
                return NetworkBanner::Hidden;
            }
            let current = state
                .chain_name
                .clone()
                .or_else(|| state.chain_id.map(|id| format!("chain {id}")))
                .unwrap_or_else(|| "unknown".to_owned());
            NetworkBanner::WrongNetwork {
                current,
                required: self.required.name.clone(),
            }
        })
    }

    /// The chain this tracker requires.
    #[must_use]
    pub const fn required(&self) -> &ChainConfig {
        &self.required
    }
}

/// Connected and on a chain other than `required_id`.
#[must_use]
pub fn is_wrong_network(state: &AppState, required_id: u64) -> bool {
    state.is_connected && state.chain_id.is_some_and(|id| id != required_id)
}

/// Holds exactly one busy unit while the connector reports "connecting".
#[derive(Debug, Default)]
pub struct ConnectingBracket {
    held: Option<BusyGuard>,
}

impl ConnectingBracket {
    /// Acquires or releases to match `connecting`.
    pub fn update(&mut self, store: &Store, connecting: bool) {
        match (connecting, self.held.is_some()) {
            (true, false) => self.held = Some(store.busy().guard()),
            (false, true) => self.held = None,
            _ => {}
        }
    }

    /// Whether a unit is held.
    #[must_use]
    pub const fn is_held(&self) -> bool {
        self.held.is_some()
    }
}
