//! Remote dataset fetching and reconciliation with the local store

pub mod models;
pub mod source;
mod synchronizer;

pub use models::{Dataset, DatasetPayload, PhraseRecord, VerbRecord};
pub use source::{DatasetSource, FetchError, HttpDatasetSource};
pub use synchronizer::{sync_dataset, DatasetSynchronizer, SyncError, SyncOutcome};

#[cfg(test)]
pub(crate) use synchronizer::test_support;
