//! Engine configuration derived from environment variables.

use std::env;

use crate::catalog::{NetworkId, POLYGON_MAINNET};

/// Tunables for wiring the engine up at process start.
#[derive(Debug, Clone)]
pub struct EngineConfig {
    /// Network assumed active until the wallet layer reports otherwise.
    pub network: NetworkId,
    /// Period of the background batch refresh.
    pub poll_ms: u64,
}

impl EngineConfig {
    pub fn from_env() -> Self {
        Self {
            network: env_u64("BOND_NETWORK_ID", POLYGON_MAINNET),
            poll_ms: env_u64("BOND_POLL_MS", 30_000),
        }
    }
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            network: POLYGON_MAINNET,
            poll_ms: 30_000,
        }
    }
}

fn env_u64(name: &str, default: u64) -> u64 {
    env::var(name)
        .ok()
        .and_then(|s| s.trim().parse().ok())
        .unwrap_or(default)
}
