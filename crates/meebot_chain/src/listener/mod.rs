//! # Event Normalizer
//!
//! One normalizer per resource. Each owns one subscription task per
//! notification kind; every task decodes what arrives and pushes canonical
//! records into a shared [`EventSink`]. All normalizers share the same sink,
//! so the fan-in point is explicit.
//!
//! ```text
//! ┌──────────────┐     ┌──────────────┐
//! │ nft: Transfer│ ──▶ │              │
//! ├──────────────┤     │              │     ┌──────────────┐
//! │ nft: Approval│ ──▶ │  EventSink   │ ──▶ │ EventSource  │ ──▶ Event Log
//! ├──────────────┤     │  (mpsc)      │     └──────────────┘
//! │ staking: ... │ ──▶ │              │
//! └──────────────┘     └──────────────┘
//! ```
//!
//! Ordering is preserved per subscription. Nothing orders records across
//! subscriptions.

use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};
use std::sync::Arc;

use alloy_primitives::Address;
use parking_lot::Mutex;
use tokio::sync::mpsc;
use tokio::task::JoinHandle;

use meebot_shared::{CanonicalEvent, ResourceKind};

use crate::contracts::{watched_events, WatchedEvent};
use crate::events::decode_notification;
use crate::ledger::{Ledger, LogFilter, RawLog};

/// Counters shared by every task of one normalizer.
#[derive(Debug, Default)]
pub struct ListenerStats {
    /// Raw notifications received.
    pub received: AtomicU64,
    /// Records forwarded to the sink.
    pub forwarded: AtomicU64,
    /// Notifications dropped because they did not decode.
    pub decode_failures: AtomicU64,
}

/// Sending half of the fan-in channel. Cheap to clone.
#[derive(Clone, Debug)]
pub struct EventSink {
    sender: mpsc::UnboundedSender<CanonicalEvent>,
}

impl EventSink {
    /// Creates a connected sink/source pair.
    #[must_use]
    pub fn channel() -> (Self, EventSource) {
        let (sender, receiver) = mpsc::unbounded_channel();
        (Self { sender }, EventSource { receiver })
    }

    /// Forwards one record. Returns `false` if the consumer is gone.
    pub fn forward(&self, event: CanonicalEvent) -> bool {
        self.sender.send(event).is_ok()
    }
}

/// Receiving half of the fan-in channel.
#[derive(Debug)]
pub struct EventSource {
    receiver: mpsc::UnboundedReceiver<CanonicalEvent>,
}

impl EventSource {
    /// Waits for the next record. `None` once every sink is dropped.
    pub async fn recv(&mut self) -> Option<CanonicalEvent> {
        self.receiver.recv().await
    }

    /// Takes one record if one is ready.
    pub fn try_recv(&mut self) -> Option<CanonicalEvent> {
        self.receiver.try_recv().ok()
    }

    /// Takes every record that is ready, in arrival order.
    pub fn drain(&mut self) -> Vec<CanonicalEvent> {
        let mut events = Vec::new();
        while let Ok(event) = self.receiver.try_recv() {
            events.push(event);
        }
        events
    }
}

/// Starts normalizers.
pub struct EventNormalizer;

impl EventNormalizer {
    /// Subscribes to every notification kind of `kind` at `address`.
    ///
    /// With no address the normalizer is inert: no subscription is made and
    /// the returned handle's teardown does nothing. A kind whose subscription
    /// fails is logged and skipped; the other kinds still run.
    pub async fn start<L: Ledger>(
        ledger: &L,
        kind: ResourceKind,
        address: Option<Address>,
        sink: EventSink,
    ) -> NormalizerHandle {
        let Some(address) = address else {
            tracing::warn!(resource = %kind, "contract address not set, not watching events");
            return NormalizerHandle::inert(kind);
        };

        let handle = NormalizerHandle::new(kind);
        for watched in watched_events(kind) {
            let filter = LogFilter {
                address,
                topic0: watched.topic0,
                event_name: watched.name,
            };
            match ledger.subscribe(filter).await {
                Ok(receiver) => {
                    let task = tokio::spawn(run_subscription(
                        kind,
                        watched,
                        receiver,
                        sink.clone(),
                        Arc::clone(&handle.cancelled),
                        Arc::clone(&handle.stats),
                    ));
                    handle.tasks.lock().push(task);
                    tracing::info!(resource = %kind, event = watched.name, "subscribed");
                }
                Err(e) => {
                    tracing::error!(
                        resource = %kind,
                        event = watched.name,
                        error = %e,
                        "subscribe failed"
                    );
                }
            }
        }
        handle
    }
}

async fn run_subscription(
    kind: ResourceKind,
    watched: WatchedEvent,
    mut receiver: mpsc::UnboundedReceiver<RawLog>,
    sink: EventSink,
    cancelled: Arc<AtomicBool>,
    stats: Arc<ListenerStats>,
) {
    while let Some(log) = receiver.recv().await {
        if cancelled.load(Ordering::Acquire) {
            break;
        }
        stats.received.fetch_add(1, Ordering::Relaxed);

        match decode_notification(kind, &log) {
            Ok(record) => {
                tracing::debug!(
                    resource = %kind,
                    event = %record.event_name,
                    tx = %record.transaction_ref,
                    "notification"
                );
                if !sink.forward(record) {
                    tracing::debug!(resource = %kind, "sink closed, stopping");
                    break;
                }
                stats.forwarded.fetch_add(1, Ordering::Relaxed);
            }
            Err(e) => {
                stats.decode_failures.fetch_add(1, Ordering::Relaxed);
                tracing::error!(
                    resource = %kind,
                    event = watched.name,
                    tx = %log.transaction_hash,
                    error = %e,
                    "dropping undecodable notification"
                );
            }
        }
    }
}

/// Owns the subscription tasks of one normalizer.
#[derive(Debug)]
pub struct NormalizerHandle {
    kind: ResourceKind,
    tasks: Mutex<Vec<JoinHandle<()>>>,
    cancelled: Arc<AtomicBool>,
    stats: Arc<ListenerStats>,
}

impl NormalizerHandle {
    fn new(kind: ResourceKind) -> Self {
        Self {
            kind,
            tasks: Mutex::new(Vec::new()),
            cancelled: Arc::new(AtomicBool::new(false)),
            stats: Arc::new(ListenerStats::default()),
        }
    }

    fn inert(kind: ResourceKind) -> Self {
        Self::new(kind)
    }

    /// Resource this normalizer watches.
    #[must_use]
    pub const fn kind(&self) -> ResourceKind {
        self.kind
    }

    /// Number of live subscriptions (zero when inert or torn down).
    #[must_use]
    pub fn subscription_count(&self) -> usize {
        self.tasks.lock().len()
    }

    /// Whether [`teardown`](Self::teardown) has run.
    #[must_use]
    pub fn is_torn_down(&self) -> bool {
        self.cancelled.load(Ordering::Acquire)
    }

    /// Counters for this normalizer.
    #[must_use]
    pub fn stats(&self) -> Arc<ListenerStats> {
        Arc::clone(&self.stats)
    }

    /// Cancels every subscription. Safe to call any number of times.
    pub fn teardown(&self) {
        if self.cancelled.swap(true, Ordering::AcqRel) {
            return;
        }
        let tasks = std::mem::take(&mut *self.tasks.lock());
        let count = tasks.len();
        for task in tasks {
            task.abort();
        }
        if count > 0 {
            tracing::info!(resource = %self.kind, subscriptions = count, "normalizer torn down");
        }
    }
}

impl Drop for NormalizerHandle {
    fn drop(&mut self) {
        self.teardown();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use meebot_shared::EventArgs;
    use alloy_primitives::B256;

    #[test]
    fn test_sink_source_fan_in() {
        let (sink, mut source) = EventSink::channel();
        let second = sink.clone();

        for (i, s) in [&sink, &second, &sink].into_iter().enumerate() {
            let record = CanonicalEvent::now(
                ResourceKind::Token,
                format!("E{i}"),
                EventArgs::new(),
                B256::ZERO,
            );
            assert!(s.forward(record));
        }

        let names: Vec<_> = source.drain().into_iter().map(|e| e.event_name).collect();
        assert_eq!(names, ["E0", "E1", "E2"]);
        assert!(source.try_recv().is_none());
    }

    #[test]
    fn test_forward_after_source_dropped() {
        let (sink, source) = EventSink::channel();
        drop(source);
        assert!(!sink.forward(CanonicalEvent::now(
            ResourceKind::Nft,
            "Transfer",
            EventArgs::new(),
            B256::ZERO
        )));
    }

    #[test]
    fn test_inert_teardown_is_noop() {
        let handle = NormalizerHandle::inert(ResourceKind::Swap);
        assert_eq!(handle.subscription_count(), 0);
        handle.teardown();
        handle.teardown();
        assert!(handle.is_torn_down());
    }
}
