//! Chain-reader capability: the engine's only view of the RPC transport.
//!
//! The transport itself (provider management, retries, backoff) lives with
//! the collaborator implementing [`ChainReader`]; any failure is terminal
//! for that fetch attempt.

use async_trait::async_trait;
use serde::{Deserialize, Serialize};

use crate::catalog::NetworkId;
use crate::error::FetchError;

/// User-specific position data, present only when a wallet session exists.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct UserPosition {
    /// Payout still owed to the user, in principal-token units.
    pub claimable: f64,
    /// Unix seconds at which the position is fully vested. `0` means no
    /// active position.
    pub maturation_ts: i64,
}

/// Raw on-chain figures for one bond, as returned by the contract reads.
///
/// `market_price` and `max_user_can_buy` arrive as decimal strings — they
/// come from external sources with more precision than the chain figures —
/// and are parsed by the metrics calculator, not here.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RawBondSnapshot {
    /// Discount as a fraction (0.05 = 5%). Negative when the bond trades
    /// at a premium.
    pub discount_rate: f64,
    pub debt_ratio: f64,
    /// Payout quote for the currently entered amount.
    pub quote: f64,
    /// Protocol-wide amount already purchased, in quote units.
    pub purchased: f64,
    /// Vesting term in seconds.
    pub vesting_term: u64,
    /// Protocol-quoted bond price.
    pub bond_price: f64,
    /// Externally supplied market price, decimal string.
    pub market_price: String,
    /// Largest single payout the protocol currently allows.
    pub max_payout: f64,
    /// Largest principal amount the user may deposit right now, decimal
    /// string.
    pub max_user_can_buy: String,
    pub position: Option<UserPosition>,
}

/// Read access to per-bond contract state on a given network.
///
/// Async and fallible; the engine treats any error as a terminal
/// [`FetchError::Network`] for that attempt and never retries on its own.
#[async_trait]
pub trait ChainReader: Send + Sync + 'static {
    async fn read_bond(&self, key: &str, network: NetworkId) -> Result<RawBondSnapshot, FetchError>;
}
