//! Canonical per-bond snapshot store.
//!
//! Single source of truth read by every display surface. Mutation happens
//! only through the crate-internal methods the sync engine calls; consumers
//! get clones out and subscribe to coarse-grained change events (a list
//! view re-renders whenever any constituent bond updates, so per-key
//! granularity buys nothing).

use std::collections::HashMap;
use std::sync::{Arc, RwLock};

use serde::Serialize;
use tokio::sync::broadcast;

use crate::metrics::DerivedBondMetrics;

const EVENT_CAPACITY: usize = 64;

/// Where a bond's most recent fetch attempt stands. Absence from the store
/// is the fourth state: never fetched.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum FetchStatus {
    Loading,
    Success,
    Failed,
}

/// Persisted record for one bond identifier.
///
/// `metrics` always reflects the last *successfully* completed fetch; a
/// failure flips `status` but leaves the previous value in place, so a
/// network drop yields stale-but-present data rather than a blank row.
#[derive(Debug, Clone, Serialize)]
pub struct BondState {
    pub status: FetchStatus,
    /// Generation of the last committed success. Commits with an older
    /// generation are rejected.
    pub generation: u64,
    pub metrics: Option<DerivedBondMetrics>,
}

/// Point-in-time copy of the whole store.
#[derive(Debug, Clone, Serialize)]
pub struct StoreSnapshot {
    pub bonds: HashMap<String, BondState>,
    /// True while a "refresh all" batch has fetches outstanding.
    pub batch_loading: bool,
}

/// Coarse-grained change notification. Consumers treat any event as "the
/// snapshot changed"; the payload exists for logging and tests.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case", tag = "type")]
pub enum StoreEvent {
    BondUpdated { key: String },
    BatchLoading { active: bool },
}

struct Inner {
    bonds: HashMap<String, BondState>,
    batch_loading: bool,
}

/// Shared bond state store. Clone-cheap via `Arc`; all reads copy data out
/// so no lock is held across an await point.
pub struct BondStore {
    inner: RwLock<Inner>,
    events: broadcast::Sender<StoreEvent>,
}

impl BondStore {
    pub fn new() -> Arc<Self> {
        let (events, _) = broadcast::channel(EVENT_CAPACITY);
        Arc::new(Self {
            inner: RwLock::new(Inner {
                bonds: HashMap::new(),
                batch_loading: false,
            }),
            events,
        })
    }

    /// Latest state for one bond, if it has ever been fetched.
    pub fn get(&self, key: &str) -> Option<BondState> {
        self.inner.read().unwrap().bonds.get(key).cloned()
    }

    /// Copy of the full snapshot.
    pub fn get_all(&self) -> StoreSnapshot {
        let inner = self.inner.read().unwrap();
        StoreSnapshot {
            bonds: inner.bonds.clone(),
            batch_loading: inner.batch_loading,
        }
    }

    /// Subscribe to change events. Slow subscribers may observe
    /// `RecvError::Lagged` and should re-read the snapshot.
    pub fn subscribe(&self) -> broadcast::Receiver<StoreEvent> {
        self.events.subscribe()
    }

    /// Create the record lazily and flag it as loading. Previous metrics
    /// and generation are preserved so the UI can keep showing the stale
    /// value during the refresh.
    pub(crate) fn mark_loading(&self, key: &str) {
        {
            let mut inner = self.inner.write().unwrap();
            let state = inner.bonds.entry(key.to_string()).or_insert(BondState {
                status: FetchStatus::Loading,
                generation: 0,
                metrics: None,
            });
            state.status = FetchStatus::Loading;
        }
        self.emit(StoreEvent::BondUpdated { key: key.to_string() });
    }

    /// Compare-and-commit: applied only when `generation` is at least the
    /// last committed one, so an older response arriving late can never
    /// regress the store. Returns whether the commit was applied.
    pub(crate) fn commit(&self, key: &str, generation: u64, metrics: DerivedBondMetrics) -> bool {
        {
            let mut inner = self.inner.write().unwrap();
            let state = inner.bonds.entry(key.to_string()).or_insert(BondState {
                status: FetchStatus::Loading,
                generation: 0,
                metrics: None,
            });
            if generation < state.generation {
                tracing::debug!(key, generation, latest = state.generation, "stale commit dropped");
                return false;
            }
            state.status = FetchStatus::Success;
            state.generation = generation;
            state.metrics = Some(metrics);
        }
        self.emit(StoreEvent::BondUpdated { key: key.to_string() });
        true
    }

    /// Record a settled failure: clears the loading flag without touching
    /// the last committed metrics. Ignored if a newer generation already
    /// committed.
    pub(crate) fn mark_failed(&self, key: &str, generation: u64) {
        {
            let mut inner = self.inner.write().unwrap();
            let state = inner.bonds.entry(key.to_string()).or_insert(BondState {
                status: FetchStatus::Loading,
                generation: 0,
                metrics: None,
            });
            if generation < state.generation {
                return;
            }
            state.status = FetchStatus::Failed;
        }
        self.emit(StoreEvent::BondUpdated { key: key.to_string() });
    }

    pub(crate) fn set_batch_loading(&self, active: bool) {
        {
            let mut inner = self.inner.write().unwrap();
            inner.batch_loading = active;
        }
        self.emit(StoreEvent::BatchLoading { active });
    }

    fn emit(&self, event: StoreEvent) {
        // send() errors only when nobody is subscribed.
        let _ = self.events.send(event);
    }
}
