//! Reconciles the remote dataset with the local store.
//!
//! One fetch per call, no retries: the next application start is the retry
//! boundary. Any fetch failure leaves the store untouched and reports
//! [`SyncOutcome::Offline`]; callers always read content back from the store.

use serde::Serialize;
use thiserror::Error;

use crate::store::{ContentStore, DatasetVersion, StoreError};

use super::source::DatasetSource;

#[derive(Error, Debug)]
pub enum SyncError {
    #[error("Sync failed: {0}")]
    Failed(#[from] StoreError),
}

/// Result of one reconciliation attempt
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "outcome", rename_all = "camelCase")]
pub enum SyncOutcome {
    /// Local content was replaced with a different remote version
    Updated { version: DatasetVersion, items: usize },
    /// Remote and local versions match; nothing was written
    UpToDate { version: DatasetVersion },
    /// The remote dataset could not be used; local content is unchanged
    Offline { reason: String },
}

impl SyncOutcome {
    /// Short status text for the user
    pub fn status_message(&self) -> String {
        match self {
            Self::Updated { version, .. } => format!("✓ Verbs updated (version {})", version),
            Self::UpToDate { .. } => "✓ Verbs up to date".to_string(),
            Self::Offline { .. } => "Offline mode".to_string(),
        }
    }
}

pub struct DatasetSynchronizer<S: DatasetSource> {
    source: S,
}

impl<S: DatasetSource> DatasetSynchronizer<S> {
    pub fn new(source: S) -> Self {
        Self { source }
    }

    pub fn source(&self) -> &S {
        &self.source
    }

    pub async fn sync(&self, store: &mut ContentStore) -> Result<SyncOutcome, SyncError> {
        sync_dataset(&self.source, store).await
    }
}

/// Run one reconciliation of `source` against `store`.
pub async fn sync_dataset<S: DatasetSource + ?Sized>(
    source: &S,
    store: &mut ContentStore,
) -> Result<SyncOutcome, SyncError> {
    log::info!("Fetching dataset from {}", source.describe());

    let dataset = match source.fetch().await {
        Ok(dataset) => dataset,
        Err(e) => {
            log::warn!("Could not fetch dataset, using local content: {}", e);
            return Ok(SyncOutcome::Offline {
                reason: e.to_string(),
            });
        }
    };

    let current = store.stored_version()?;
    log::info!(
        "Remote version {}, local version {}",
        dataset.version,
        current
            .as_ref()
            .map(|v| v.to_string())
            .unwrap_or_else(|| "none".to_string())
    );

    if current.as_ref() == Some(&dataset.version) {
        return Ok(SyncOutcome::UpToDate {
            version: dataset.version,
        });
    }

    store.replace_all_content(&dataset.items, &dataset.version)?;
    log::info!("Stored {} items for version {}", dataset.items.len(), dataset.version);

    Ok(SyncOutcome::Updated {
        version: dataset.version,
        items: dataset.items.len(),
    })
}
