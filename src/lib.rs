//! Client-side bond data layer: chain-state synchronization and derived
//! financial metrics for fixed-discount bond instruments.
//!
//! The presentation layer triggers refreshes through [`engine::SyncEngine`]
//! and reads the resulting snapshot from [`store::BondStore`]; it never sees
//! raw chain figures.

pub mod catalog;
pub mod chain;
pub mod config;
pub mod engine;
pub mod error;
pub mod metrics;
pub mod store;
