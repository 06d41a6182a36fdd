//! # MeeBot Ledger Bridge
//!
//! Everything that talks to the remote ledger, behind one trait.
//!
//! ## Architecture
//!
//! ```text
//! ┌─────────────────┐  Notifications  ┌──────────────────┐
//! │  Remote Ledger  │ ──────────────▶ │ EventNormalizer  │  (one per resource)
//! │  (RPC, opaque)  │                 │  decode + isolate│
//! └───────┬─────────┘                 └────────┬─────────┘
//!         │ read / simulate                    │ EventSink (fan-in)
//!         │ submit / confirm                   ▼
//!         ▼                           ┌──────────────────┐
//! ┌─────────────────┐                 │  EventSource     │ ──▶ Event Log Store
//! │ ContractReader  │                 └──────────────────┘
//! └─────────────────┘
//! ```
//!
//! The ledger itself is never implemented here. Callers hand in anything
//! that implements [`Ledger`]: an RPC client in production, the simulated
//! ledger in tests.

#![deny(missing_docs)]
#![deny(unsafe_code)]
#![warn(clippy::pedantic)]

pub mod config;
pub mod contracts;
pub mod error;
pub mod events;
pub mod ledger;
pub mod listener;
pub mod reads;

pub use config::{ChainConfig, ClientConfig, EventsConfig, ResourceRegistry, SwapConfig};
pub use error::{ConfigError, DecodeError, LedgerError, LedgerResult};
pub use events::decode_notification;
pub use ledger::{ContractCall, Ledger, LogFilter, RawLog, TxHash, TxReceipt, ValidatedCall};
pub use listener::{EventNormalizer, EventSink, EventSource, ListenerStats, NormalizerHandle};
pub use reads::{ContractReader, NftMetadata};
