//! # MeeBot State
//!
//! The reactive side of the client: the busy signal, the shared application
//! state and the event log.
//!
//! Nothing here performs I/O. The session owns one [`Store`]; everything
//! else holds a clone of it.

#![deny(missing_docs)]
#![deny(unsafe_code)]

pub mod busy;
pub mod event_log;
pub mod store;

pub use busy::{BusyGuard, BusySignal};
pub use event_log::{export_file_name, export_json, EventLog, EventQuery};
pub use store::{AppState, DerivedBalances, Store};
