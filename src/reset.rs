//! Clearing progress, or the whole local state

use std::path::PathBuf;

use serde::Serialize;
use thiserror::Error;

use crate::assets::{AssetCacheManager, AssetError, AssetNetwork};
use crate::store::{ContentStore, StoreError};

#[derive(Error, Debug)]
pub enum ResetError {
    #[error("Store error: {0}")]
    Store(#[from] StoreError),

    #[error("Asset cache error: {0}")]
    Asset(#[from] AssetError),
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ResetReport {
    pub deleted_caches: Vec<String>,
    pub removed_databases: Vec<PathBuf>,
}

/// Forget every statistic but keep content and caches
pub fn clear_stats(store: &mut ContentStore) -> Result<(), ResetError> {
    store.clear_all_stats()?;
    log::info!("Cleared all statistics");
    Ok(())
}

/// Delete every cache generation, unregister the asset manager, then close
/// and delete each store.
pub fn clear_everything<N: AssetNetwork>(
    stores: Vec<ContentStore>,
    assets: &mut AssetCacheManager<N>,
) -> Result<ResetReport, ResetError> {
    let deleted_caches = assets.unregister()?;

    let mut removed_databases = Vec::new();
    for store in stores {
        let path = store.path().map(|p| p.to_path_buf());
        store.destroy()?;
        removed_databases.extend(path);
    }
    log::info!(
        "Cleared everything: {} cache(s), {} database(s)",
        deleted_caches.len(),
        removed_databases.len()
    );

    Ok(ResetReport {
        deleted_caches,
        removed_databases,
    })
}
