//! # Session
//!
//! Owns everything that lives as long as the client does: the store, one
//! normalizer per resource, the event pump and the wallet follower.
//!
//! ```text
//! wallet status ──▶ follower ──▶ ConnectionTracker ──▶ Store
//!                       │
//!                       └──▶ Refresher (on account/chain change)
//!
//! normalizers ──▶ EventSink ──▶ pump ──▶ Store.events
//! ```

use std::future::Future;
use std::sync::Arc;

use parking_lot::Mutex;
use tokio::sync::watch;
use tokio::task::JoinHandle;

use meebot_chain::{
    ClientConfig, ContractReader, EventNormalizer, EventSink, EventSource, Ledger,
    NormalizerHandle,
};
use meebot_shared::ResourceKind;
use meebot_state::Store;

use crate::actions::ActionRunner;
use crate::connection::{ConnectingBracket, ConnectionTracker, WalletStatus};
use crate::refresher::Refresher;

/// A running client.
pub struct Session<L: Ledger> {
    ledger: Arc<L>,
    config: ClientConfig,
    store: Store,
    tracker: ConnectionTracker,
    actions: ActionRunner<L>,
    normalizers: Vec<NormalizerHandle>,
    tasks: TaskSet,
}

impl<L: Ledger> Session<L> {
    /// Starts the normalizers and begins following `wallet`.
    ///
    /// The current wallet status is applied right away, so a wallet that is
    /// already connected triggers the first refresh.
    pub async fn start(
        ledger: Arc<L>,
        config: ClientConfig,
        wallet: watch::Receiver<WalletStatus>,
    ) -> Self {
        let store = Store::with_event_capacity(config.events.capacity);
        let tracker = ConnectionTracker::new(store.clone(), config.chain.clone());
        let actions = ActionRunner::new(Arc::clone(&ledger), &config, store.clone());

        let missing = config.resources.missing();
        if !missing.is_empty() {
            tracing::warn!(?missing, "starting with unconfigured resources");
        }

        let (sink, source) = EventSink::channel();
        let mut normalizers = Vec::with_capacity(ResourceKind::ALL.len());
        for kind in ResourceKind::ALL {
            let address = config.resources.address(kind);
            let handle = EventNormalizer::start(ledger.as_ref(), kind, address, sink.clone()).await;
            normalizers.push(handle);
        }
        drop(sink);

        let tasks = TaskSet::new();
        tasks.spawn(pump_events(source, store.clone()));
        tasks.spawn(follow_wallet(
            wallet,
            tracker.clone(),
            actions.refresher().clone(),
            store.clone(),
            tasks.clone(),
        ));

        let subscriptions: usize =
            normalizers.iter().map(NormalizerHandle::subscription_count).sum();
        tracing::info!(chain = %config.chain.name, subscriptions, "session started");

        Self {
            ledger,
            config,
            store,
            tracker,
            actions,
            normalizers,
            tasks,
        }
    }

    /// Shared state.
    #[must_use]
    pub const fn store(&self) -> &Store {
        &self.store
    }

    /// User actions.
    #[must_use]
    pub const fn actions(&self) -> &ActionRunner<L> {
        &self.actions
    }

    /// Balance refresher.
    #[must_use]
    pub const fn refresher(&self) -> &Refresher<L> {
        self.actions.refresher()
    }

    /// Connection and network state.
    #[must_use]
    pub const fn connection(&self) -> &ConnectionTracker {
        &self.tracker
    }

    /// Read access to the resources (collectible metadata, ownership).
    #[must_use]
    pub fn reader(&self) -> ContractReader<'_, L> {
        ContractReader::new(self.ledger.as_ref(), &self.config.resources)
    }

    /// The running normalizers, one per resource.
    #[must_use]
    pub fn normalizers(&self) -> &[NormalizerHandle] {
        &self.normalizers
    }

    /// Configuration the session was started with.
    #[must_use]
    pub const fn config(&self) -> &ClientConfig {
        &self.config
    }

    /// Clears state and the event log. Busy units in flight are untouched.
    pub fn reset(&self) {
        self.store.reset();
    }

    /// Stops every subscription and background task, including refreshes
    /// still in flight. Safe to call again.
    pub fn shutdown(&self) {
        let Some(aborted) = self.tasks.close() else {
            return;
        };
        for normalizer in &self.normalizers {
            normalizer.teardown();
        }
        tracing::info!(aborted, "session shut down");
    }

    /// Whether [`shutdown`](Self::shutdown) has run.
    #[must_use]
    pub fn is_shut_down(&self) -> bool {
        self.tasks.is_closed()
    }
}

impl<L: Ledger> Drop for Session<L> {
    fn drop(&mut self) {
        self.shutdown();
    }
}

/// Background tasks of one session. Once closed, nothing new is spawned.
#[derive(Clone, Debug)]
struct TaskSet(Arc<Mutex<Option<Vec<JoinHandle<()>>>>>);

impl TaskSet {
    fn new() -> Self {
        Self(Arc::new(Mutex::new(Some(Vec::new()))))
    }

    /// Spawns `task` unless the set is closed.
    fn spawn<F>(&self, task: F) -> bool
    where
        F: Future<Output = ()> + Send + 'static,
    {
        let mut tasks = self.0.lock();
        let Some(tasks) = tasks.as_mut() else {
            return false;
        };
        tasks.retain(|handle| !handle.is_finished());
        tasks.push(tokio::spawn(task));
        true
    }

    /// Aborts every task still running. `None` if already closed.
    fn close(&self) -> Option<usize> {
        let tasks = self.0.lock().take()?;
        let running = tasks.iter().filter(|handle| !handle.is_finished()).count();
        for handle in tasks {
            handle.abort();
        }
        Some(running)
    }

    fn is_closed(&self) -> bool {
        self.0.lock().is_none()
    }
}

async fn pump_events(mut source: EventSource, store: Store) {
    while let Some(event) = source.recv().await {
        tracing::debug!(resource = %event.resource, event = %event.event_name, "event received");
        store.append_event(event);
    }
}

async fn follow_wallet<L: Ledger>(
    mut wallet: watch::Receiver<WalletStatus>,
    tracker: ConnectionTracker,
    refresher: Refresher<L>,
    store: Store,
    tasks: TaskSet,
) {
    let mut bracket = ConnectingBracket::default();
    loop {
        let status = wallet.borrow_and_update().clone();
        bracket.update(&store, status.connecting);

        let change = tracker.apply(&status);
        if change.needs_refresh() {
            tracing::info!(
                account = ?status.account,
                chain_id = ?status.chain_id,
                "wallet changed"
            );
            let refresher = refresher.clone();
            let spawned = tasks.spawn(async move {
                if let Err(e) = refresher.refresh().await {
                    tracing::warn!(error = %e, "refresh after wallet change failed");
                }
            });
            if !spawned {
                break;
            }
        }

        if wallet.changed().await.is_err() {
            break;
        }
    }
}
