//! Versioned cache of static application assets
//!
//! This module provides:
//! - Named cache generations on disk
//! - An install/activate lifecycle that evicts stale generations
//! - Network-first or cache-first fetching per resource

mod manager;
pub mod models;
mod network;
mod storage;

pub use manager::AssetCacheManager;
pub use models::*;
pub use network::{AssetNetwork, HttpAssetNetwork};
pub use storage::{AssetError, CacheStorage};

#[cfg(test)]
pub(crate) use manager::test_support;
