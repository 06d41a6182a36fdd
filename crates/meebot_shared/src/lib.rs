//! # MeeBot Shared
//!
//! Common types used by the ledger bridge, the state store and the
//! transaction orchestrator.
//!
//! ## CRITICAL RULE
//!
//! On-chain quantities never pass through `f32`/`f64`. Anything that leaves
//! the ingestion boundary is either a `U256` or an exact decimal string.

#![deny(missing_docs)]
#![deny(unsafe_code)]

pub mod constants;
pub mod error;
pub mod events;
pub mod units;

pub use constants::{
    MAX_EVENTS, MAX_LISTED_NFTS, NATIVE_DECIMALS, REQUIRED_CHAIN_ID, REQUIRED_CHAIN_NAME,
    SWAP_DEADLINE_WINDOW_SECS,
};
pub use error::{UnitsError, UnitsResult};
pub use events::{now_timestamp, ArgValue, CanonicalEvent, EventArgs, ResourceKind};
pub use units::{format_units, min_output, parse_units, quote_output, Slippage};
