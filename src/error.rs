use crate::catalog::NetworkId;

/// Unified error type for bond fetch operations.
///
/// `Clone` because a deduplicated fetch fans one outcome out to every
/// attached caller.
#[derive(Debug, Clone, PartialEq)]
pub enum FetchError {
    /// Identifier is not in the catalog. Config/programmer error — fatal to
    /// the calling operation, never retried automatically.
    UnknownBond(String),
    /// The chain read failed. Transient; retry is a caller decision.
    Network(String),
    /// The result arrived after the active network changed. Discarded, not
    /// committed; not user-visible.
    StaleNetwork {
        requested: NetworkId,
        active: NetworkId,
    },
    /// Raw chain figures could not be turned into metrics (unparseable or
    /// non-finite values). Same class as `UnknownBond`: never coerced to
    /// zero, so the UI can't show a misleading figure.
    BadSnapshot(String),
}

impl std::fmt::Display for FetchError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::UnknownBond(key) => write!(f, "unknown_bond: {key}"),
            Self::Network(msg) => write!(f, "network_error: {msg}"),
            Self::StaleNetwork { requested, active } => {
                write!(f, "stale_network: requested {requested}, active {active}")
            }
            Self::BadSnapshot(msg) => write!(f, "bad_snapshot: {msg}"),
        }
    }
}

impl std::error::Error for FetchError {}

/// Batch-level failure: every constituent fetch of a `fetch_all` failed.
///
/// Partial failure is not an error — it surfaces as the non-fatal failure
/// list on the batch report instead.
#[derive(Debug, Clone)]
pub struct AggregateFetchError {
    pub failures: Vec<(String, FetchError)>,
}

impl std::fmt::Display for AggregateFetchError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "all {} bond fetches failed", self.failures.len())?;
        if let Some((key, first)) = self.failures.first() {
            write!(f, " (first: {key}: {first})")?;
        }
        Ok(())
    }
}

impl std::error::Error for AggregateFetchError {}
