//! # Busy Signal
//!
//! A process-wide reference count of in-flight remote operations.
//!
//! The count is a `usize` and only ever lowered with saturating
//! subtraction, so it cannot go negative. `is_busy()` is computed from the
//! count on every call rather than stored, so the two can never disagree.
//!
//! Prefer [`BusySignal::guard`] over manual `increment`/`decrement`: the
//! guard releases on every exit path, including `?` and panics.

use std::sync::Arc;

use tokio::sync::watch;

/// Reference-counted "something is in flight" signal.
///
/// Cloning shares the same counter.
#[derive(Clone, Debug)]
pub struct BusySignal {
    count: Arc<watch::Sender<usize>>,
}

impl Default for BusySignal {
    fn default() -> Self {
        Self::new()
    }
}

impl BusySignal {
    /// Creates an idle signal.
    #[must_use]
    pub fn new() -> Self {
        let (tx, _rx) = watch::channel(0);
        Self { count: Arc::new(tx) }
    }

    /// Raises the count by one.
    pub fn increment(&self) {
        self.count.send_modify(|count| *count += 1);
    }

    /// Lowers the count by one, clamped at zero.
    pub fn decrement(&self) {
        self.count.send_modify(|count| {
            if *count == 0 {
                tracing::warn!("busy signal decremented while idle");
            }
            *count = count.saturating_sub(1);
        });
    }

    /// Current count.
    #[must_use]
    pub fn count(&self) -> usize {
        *self.count.borrow()
    }

    /// `true` iff the count is positive.
    #[must_use]
    pub fn is_busy(&self) -> bool {
        self.count() > 0
    }

    /// Observes the count.
    #[must_use]
    pub fn subscribe(&self) -> watch::Receiver<usize> {
        self.count.subscribe()
    }

    /// Increments now and decrements when the guard drops.
    #[must_use = "dropping the guard immediately releases the busy signal"]
    pub fn guard(&self) -> BusyGuard {
        self.increment();
        BusyGuard {
            signal: self.clone(),
        }
    }
}

/// Holds one unit of the busy count.
#[derive(Debug)]
pub struct BusyGuard {
    signal: BusySignal,
}

impl Drop for BusyGuard {
    fn drop(&mut self) {
        self.signal.decrement();
    }
}
