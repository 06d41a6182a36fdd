//! # MeeBot Client Core
//!
//! Keeps a local view of four ledger resources (collectible, token, staking,
//! swap) in sync for one wallet, and runs the user's mutations against them.
//!
//! ## Architecture
//!
//! ```text
//!            ┌───────────────────────── Session ─────────────────────────┐
//!  wallet ──▶│ ConnectionTracker ──▶ Store ◀── pump ◀── EventNormalizers │◀── notifications
//!            │        │                ▲                                 │
//!            │        ▼                │                                 │
//!            │    Refresher ───────────┤                                 │
//!            │        ▲                │                                 │
//!            │ ActionRunner ──▶ Orchestrator (simulate ▶ submit ▶ confirm)│──▶ ledger
//!            └───────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Rules
//!
//! 1. **One busy unit per remote operation** - taken by a guard, released on
//!    every exit path
//! 2. **Refresh is all or nothing** - a failed batch keeps the previous balances
//! 3. **Gated actions check fresh** - approval and allowance are read right
//!    before the write, never taken from the store
//!
//! ## Example
//!
//! ```rust,ignore
//! use meebot::{Session, SimLedger, WalletStatus};
//!
//! let (wallet, status) = tokio::sync::watch::channel(WalletStatus::disconnected());
//! let session = Session::start(Arc::new(SimLedger::new()), config, status).await;
//! wallet.send_replace(WalletStatus::connected(account, 31337, "Hardhat"));
//! session.actions().stake(U256::from(1u64)).await?;
//! ```

#![deny(missing_docs)]
#![deny(unsafe_code)]
#![warn(clippy::pedantic)]

pub mod actions;
pub mod connection;
pub mod error;
pub mod orchestrator;
pub mod refresher;
pub mod session;
pub mod sim;

pub use actions::{Action, ActionRunner, SwapRequest};
pub use connection::{
    is_wrong_network, ConnectingBracket, ConnectionChange, ConnectionTracker, NetworkBanner,
    WalletStatus,
};
pub use error::{RefreshError, TxError, TxResult};
pub use orchestrator::{Orchestrator, TxOutcome};
pub use refresher::{RefreshOutcome, Refresher};
pub use session::Session;
pub use sim::{ConfirmMode, RecordedCall, SimLedger};
