//! Local persistent store for practice content and statistics
//!
//! This module provides:
//! - Content items, replaced wholesale per dataset version
//! - Per-(item, context) statistics records
//! - Dataset metadata (the stored version)

mod content_store;
pub mod models;

pub use content_store::{ContentStore, StoreError, SCHEMA_VERSION, VERSION_KEY};
pub use models::*;
