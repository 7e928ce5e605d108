//! Fetch orchestration: one-shot and batch refreshes, in-flight request
//! deduplication, and generation-stamped commits into the store.
//!
//! Completion order is not arrival order — reads for different bonds (and
//! for the same bond across a network switch) interleave freely. Two
//! mechanisms keep the store consistent anyway: each fetch carries a
//! monotonically increasing generation that the store compare-and-commits
//! on, and a result that lands after the active network changed is
//! discarded as stale instead of committed.

use std::collections::HashMap;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use std::time::{Duration, SystemTime, UNIX_EPOCH};

use tokio::sync::{broadcast, Mutex};

use crate::catalog::{self, BondDescriptor, NetworkId};
use crate::chain::ChainReader;
use crate::error::{AggregateFetchError, FetchError};
use crate::metrics::{compute_metrics, DerivedBondMetrics};
use crate::store::BondStore;

type FetchOutcome = Result<DerivedBondMetrics, FetchError>;

/// Result of a batch refresh that was not a total failure. `failures` is
/// the non-fatal side list: those bonds keep their previous store value.
#[derive(Debug, Clone)]
pub struct BatchReport {
    pub committed: usize,
    pub failures: Vec<(String, FetchError)>,
}

/// Orchestrates chain reads and owns all writes into the [`BondStore`].
pub struct SyncEngine<R: ChainReader> {
    reader: R,
    store: Arc<BondStore>,
    active_network: AtomicU64,
    next_generation: AtomicU64,
    /// One entry per fetch currently on the wire, keyed by (bond, network).
    /// Late callers subscribe to the sender instead of issuing a duplicate
    /// read; the leader broadcasts the outcome when it settles.
    in_flight: Mutex<HashMap<(String, NetworkId), broadcast::Sender<FetchOutcome>>>,
}

enum Role {
    Leader(broadcast::Sender<FetchOutcome>),
    Follower(broadcast::Receiver<FetchOutcome>),
}

impl<R: ChainReader> SyncEngine<R> {
    pub fn new(reader: R, store: Arc<BondStore>, network: NetworkId) -> Arc<Self> {
        Arc::new(Self {
            reader,
            store,
            active_network: AtomicU64::new(network),
            next_generation: AtomicU64::new(1),
            in_flight: Mutex::new(HashMap::new()),
        })
    }

    pub fn store(&self) -> &Arc<BondStore> {
        &self.store
    }

    pub fn active_network(&self) -> NetworkId {
        self.active_network.load(Ordering::Relaxed)
    }

    /// Record a network switch. In-flight fetches for the old network keep
    /// running but their results are discarded as stale on arrival; there
    /// is no true cancellation.
    pub fn set_network(&self, network: NetworkId) {
        tracing::info!(network, "active network changed");
        self.active_network.store(network, Ordering::Relaxed);
    }

    /// Refresh a single bond and return its derived metrics.
    ///
    /// If a fetch for the same (bond, network) is already in flight, this
    /// call attaches to it rather than issuing a second chain read, and
    /// observes the same outcome.
    pub async fn fetch_one(&self, key: &str, network: NetworkId) -> FetchOutcome {
        let descriptor = catalog::describe(key)?;

        let flight_key = (key.to_string(), network);
        let role = {
            let mut in_flight = self.in_flight.lock().await;
            match in_flight.get(&flight_key) {
                Some(tx) => Role::Follower(tx.subscribe()),
                None => {
                    let (tx, _) = broadcast::channel(1);
                    in_flight.insert(flight_key.clone(), tx.clone());
                    Role::Leader(tx)
                }
            }
        };

        match role {
            Role::Follower(mut rx) => {
                tracing::debug!(key, network, "attached to in-flight fetch");
                match rx.recv().await {
                    Ok(outcome) => outcome,
                    // Leader dropped without settling (task cancelled).
                    Err(_) => Err(FetchError::Network("in-flight fetch abandoned".to_string())),
                }
            }
            Role::Leader(tx) => {
                let outcome = self.run_fetch(key, descriptor, network).await;
                self.in_flight.lock().await.remove(&flight_key);
                let _ = tx.send(outcome.clone());
                outcome
            }
        }
    }

    /// Refresh every bond the catalog lists for `network`.
    ///
    /// Individual failures are tolerated: successful results are committed
    /// and the failures reported on the [`BatchReport`]. The batch itself
    /// only errors when every constituent fetch failed. `batch_loading` is
    /// held true until all of them have settled.
    pub async fn fetch_all(&self, network: NetworkId) -> Result<BatchReport, AggregateFetchError> {
        let keys = catalog::list_keys(network);
        tracing::info!(network, bonds = keys.len(), "batch refresh started");

        self.store.set_batch_loading(true);
        let outcomes =
            futures::future::join_all(keys.iter().map(|key| self.fetch_one(key, network))).await;
        self.store.set_batch_loading(false);

        let mut committed = 0usize;
        let mut failures = Vec::new();
        for (key, outcome) in keys.iter().zip(outcomes) {
            match outcome {
                Ok(_) => committed += 1,
                Err(e) => failures.push((key.to_string(), e)),
            }
        }

        if committed == 0 && !failures.is_empty() {
            tracing::warn!(network, failed = failures.len(), "batch refresh failed entirely");
            return Err(AggregateFetchError { failures });
        }
        if !failures.is_empty() {
            tracing::warn!(
                network,
                ok = committed,
                failed = failures.len(),
                "batch refresh partially failed"
            );
        }
        Ok(BatchReport { committed, failures })
    }

    async fn run_fetch(
        &self,
        key: &str,
        descriptor: &'static BondDescriptor,
        network: NetworkId,
    ) -> FetchOutcome {
        let generation = self.next_generation.fetch_add(1, Ordering::Relaxed);
        self.store.mark_loading(key);
        tracing::debug!(key, network, generation, "issuing chain read");

        let raw = match self.reader.read_bond(key, network).await {
            Ok(raw) => raw,
            Err(e) => {
                tracing::warn!(key, network, %e, "chain read failed");
                self.store.mark_failed(key, generation);
                return Err(e);
            }
        };

        // The user may have switched chains while the read was on the
        // wire; a result for the old network must not reach the store.
        let active = self.active_network.load(Ordering::Relaxed);
        if active != network {
            tracing::debug!(key, requested = network, active, "result stale after network switch");
            self.store.mark_failed(key, generation);
            return Err(FetchError::StaleNetwork { requested: network, active });
        }

        let metrics = match compute_metrics(&raw, descriptor, unix_now()) {
            Ok(m) => m,
            Err(e) => {
                tracing::warn!(key, %e, "raw snapshot rejected");
                self.store.mark_failed(key, generation);
                return Err(e);
            }
        };

        self.store.commit(key, generation, metrics.clone());
        Ok(metrics)
    }
}

/// Background periodic refresh, the caller-owned retry loop: the engine
/// itself never retries a failed fetch.
pub fn spawn_refresh_poller<R: ChainReader>(
    engine: Arc<SyncEngine<R>>,
    poll: Duration,
) -> tokio::task::JoinHandle<()> {
    tokio::spawn(async move {
        let mut interval = tokio::time::interval(poll);
        loop {
            interval.tick().await;
            let network = engine.active_network();
            match engine.fetch_all(network).await {
                Ok(report) if report.failures.is_empty() => {}
                Ok(report) => {
                    tracing::debug!(failed = report.failures.len(), "periodic refresh partial")
                }
                Err(e) => tracing::debug!("periodic refresh failed: {e}"),
            }
        }
    })
}

fn unix_now() -> i64 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map(|d| d.as_secs() as i64)
        .unwrap_or(0)
}
