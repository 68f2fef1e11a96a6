//! SQLite-backed store for practice content, statistics and metadata.
//!
//! Three tables, one per logical collection:
//! ```text
//! content  (key PK, item JSON)
//! stats    (content_key, tense, pronoun, counters..., PK over the three key columns)
//! metadata (key PK, value JSON)        -- "version" holds the dataset version
//! ```
//! Every multi-table write runs inside a single transaction.

use std::fs;
use std::path::{Path, PathBuf};

use chrono::{DateTime, Utc};
use rusqlite::types::Type;
use rusqlite::{params, Connection, OptionalExtension, Row};
use thiserror::Error;

use super::models::{ContentItem, ContextKey, DatasetVersion, StatKey, StatRecord};

/// Current schema version of the store
pub const SCHEMA_VERSION: u32 = 2;

/// Metadata key holding the dataset version
pub const VERSION_KEY: &str = "version";

#[derive(Error, Debug)]
pub enum StoreError {
    #[error("Storage unavailable: {0}")]
    Unavailable(String),

    #[error("SQLite error: {0}")]
    Sqlite(#[from] rusqlite::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Metadata key {0} is written only with the content")]
    ReservedKey(String),
}

pub type Result<T> = std::result::Result<T, StoreError>;

/// Handle to the local persistent store
pub struct ContentStore {
    conn: Connection,
    path: Option<PathBuf>,
    writes: u64,
}

impl ContentStore {
    /// Open the store at `path`, creating or upgrading the schema as needed.
    ///
    /// Idempotent. Existing data in tables untouched by an upgrade is preserved.
    pub fn open_or_create(path: &Path, schema_version: u32) -> Result<Self> {
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent).map_err(|e| {
                StoreError::Unavailable(format!("cannot create {}: {}", parent.display(), e))
            })?;
        }

        let conn = Connection::open(path)
            .map_err(|e| StoreError::Unavailable(format!("cannot open {}: {}", path.display(), e)))?;

        conn.pragma_update_and_check(None, "journal_mode", "WAL", |row| row.get::<_, String>(0))
            .map_err(|e| StoreError::Unavailable(format!("cannot enable WAL: {}", e)))?;

        Self::initialize(conn, Some(path.to_path_buf()), schema_version)
    }

    /// Open a throwaway store that lives only as long as the handle.
    pub fn open_in_memory(schema_version: u32) -> Result<Self> {
        let conn = Connection::open_in_memory()
            .map_err(|e| StoreError::Unavailable(e.to_string()))?;
        Self::initialize(conn, None, schema_version)
    }

    fn initialize(conn: Connection, path: Option<PathBuf>, schema_version: u32) -> Result<Self> {
        if schema_version == 0 {
            return Err(StoreError::Unavailable("schema version must be at least 1".to_string()));
        }

        let current: u32 = conn
            .pragma_query_value(None, "user_version", |row| row.get(0))
            .map_err(|e| StoreError::Unavailable(format!("cannot read schema version: {}", e)))?;

        if current > schema_version {
            return Err(StoreError::Unavailable(format!(
                "store has schema version {} but {} was requested",
                current, schema_version
            )));
        }

        if current < schema_version {
            log::info!("Upgrading store schema from {} to {}", current, schema_version);
            migrate(&conn, schema_version)
                .map_err(|e| StoreError::Unavailable(format!("schema upgrade failed: {}", e)))?;
        }

        Ok(Self {
            conn,
            path,
            writes: 0,
        })
    }

    /// Path of the database file, if the store is file-backed
    pub fn path(&self) -> Option<&Path> {
        self.path.as_deref()
    }

    /// Committed writes to content or metadata since this handle was opened
    pub fn write_count(&self) -> u64 {
        self.writes
    }

    // ==================== Content ====================

    pub fn get_all_content(&self) -> Result<Vec<ContentItem>> {
        let mut stmt = self.conn.prepare("SELECT item FROM content ORDER BY rowid")?;
        let rows = stmt
            .query_map([], |row| row.get::<_, String>(0))?
            .collect::<rusqlite::Result<Vec<_>>>()?;

        let mut items = Vec::with_capacity(rows.len());
        for json in rows {
            items.push(serde_json::from_str(&json)?);
        }
        Ok(items)
    }

    pub fn content_count(&self) -> Result<usize> {
        let count: i64 = self
            .conn
            .query_row("SELECT COUNT(*) FROM content", [], |row| row.get(0))?;
        Ok(count as usize)
    }

    /// Replace every content item and record `version`, all in one transaction.
    ///
    /// Items are inserted, not upserted: a duplicate key aborts the whole
    /// replacement and the previous content and version stay in place.
    pub fn replace_all_content(&mut self, items: &[ContentItem], version: &DatasetVersion) -> Result<()> {
        let version_json = serde_json::to_string(version)?;
        let tx = self.conn.transaction()?;

        tx.execute("DELETE FROM content", [])?;

        {
            let mut insert = tx.prepare("INSERT INTO content (key, item) VALUES (?1, ?2)")?;
            for item in items {
                insert.execute(params![item.key, serde_json::to_string(item)?])?;
            }
        }

        tx.execute(
            "INSERT OR REPLACE INTO metadata (key, value) VALUES (?1, ?2)",
            params![VERSION_KEY, version_json],
        )?;

        tx.commit()?;
        self.writes += 1;
        Ok(())
    }

    // ==================== Statistics ====================

    /// Get the record for `key`, or a fresh zeroed record if none was stored yet
    pub fn get_stat(&self, key: &StatKey) -> Result<StatRecord> {
        let record = self
            .conn
            .query_row(
                "SELECT content_key, tense, pronoun, correct_streak, incorrect_count, total_attempts, last_practiced
                 FROM stats WHERE content_key = ?1 AND tense = ?2 AND pronoun = ?3",
                params![key.content_key, tense_column(&key.context), key.context.pronoun],
                stat_from_row,
            )
            .optional()?;

        Ok(record.unwrap_or_else(|| StatRecord::new(key.clone())))
    }

    pub fn put_stat(&mut self, record: &StatRecord) -> Result<()> {
        self.conn.execute(
            "INSERT OR REPLACE INTO stats
                (content_key, tense, pronoun, correct_streak, incorrect_count, total_attempts, last_practiced)
             VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7)",
            params![
                record.key.content_key,
                tense_column(&record.key.context),
                record.key.context.pronoun,
                record.correct_streak,
                record.incorrect_count,
                record.total_attempts,
                record.last_practiced.map(|t| t.to_rfc3339()),
            ],
        )?;
        Ok(())
    }

    pub fn get_all_stats(&self) -> Result<Vec<StatRecord>> {
        let mut stmt = self.conn.prepare(
            "SELECT content_key, tense, pronoun, correct_streak, incorrect_count, total_attempts, last_practiced
             FROM stats",
        )?;
        let records = stmt
            .query_map([], stat_from_row)?
            .collect::<rusqlite::Result<Vec<_>>>()?;
        Ok(records)
    }

    pub fn clear_all_stats(&mut self) -> Result<()> {
        let removed = self.conn.execute("DELETE FROM stats", [])?;
        log::info!("Cleared {} stat records", removed);
        Ok(())
    }

    // ==================== Metadata ====================

    pub fn get_metadata(&self, key: &str) -> Result<Option<serde_json::Value>> {
        let value = self
            .conn
            .query_row(
                "SELECT value FROM metadata WHERE key = ?1",
                params![key],
                |row| row.get::<_, String>(0),
            )
            .optional()?;

        match value {
            Some(json) => Ok(Some(serde_json::from_str(&json)?)),
            None => Ok(None),
        }
    }

    /// Store an arbitrary metadata value. The dataset version is not one:
    /// it changes only together with the content in `replace_all_content`.
    pub fn put_metadata(&mut self, key: &str, value: &serde_json::Value) -> Result<()> {
        if key == VERSION_KEY {
            return Err(StoreError::ReservedKey(key.to_string()));
        }
        self.conn.execute(
            "INSERT OR REPLACE INTO metadata (key, value) VALUES (?1, ?2)",
            params![key, serde_json::to_string(value)?],
        )?;
        self.writes += 1;
        Ok(())
    }

    /// Dataset version recorded by the last successful replacement
    pub fn stored_version(&self) -> Result<Option<DatasetVersion>> {
        match self.get_metadata(VERSION_KEY)? {
            Some(value) => Ok(Some(serde_json::from_value(value)?)),
            None => Ok(None),
        }
    }

    // ==================== Lifecycle ====================

    /// Close the handle and delete the database file along with its WAL companions.
    pub fn destroy(self) -> Result<()> {
        let path = self.path.clone();
        self.conn
            .close()
            .map_err(|(_, e)| StoreError::Sqlite(e))?;

        if let Some(path) = path {
            remove_database_files(&path)?;
        }
        Ok(())
    }
}

fn remove_database_files(path: &Path) -> Result<()> {
    let mut candidates = vec![path.to_path_buf()];
    for suffix in ["-wal", "-shm"] {
        let mut name = path.as_os_str().to_os_string();
        name.push(suffix);
        candidates.push(PathBuf::from(name));
    }

    for candidate in candidates {
        if candidate.exists() {
            fs::remove_file(&candidate)?;
        }
    }
    Ok(())
}

fn migrate(conn: &Connection, target: u32) -> rusqlite::Result<()> {
    conn.execute_batch(
        r#"
        CREATE TABLE IF NOT EXISTS content (
            key TEXT PRIMARY KEY,
            item TEXT NOT NULL
        );

        CREATE TABLE IF NOT EXISTS metadata (
            key TEXT PRIMARY KEY,
            value TEXT NOT NULL
        );
        "#,
    )?;

    if target >= 2 {
        conn.execute_batch(
            r#"
        CREATE TABLE IF NOT EXISTS stats (
            content_key TEXT NOT NULL,
            tense TEXT NOT NULL DEFAULT '',
            pronoun TEXT NOT NULL,
            correct_streak INTEGER NOT NULL DEFAULT 0,
            incorrect_count INTEGER NOT NULL DEFAULT 0,
            total_attempts INTEGER NOT NULL DEFAULT 0,
            last_practiced TEXT,
            PRIMARY KEY (content_key, tense, pronoun)
        );
        "#,
        )?;
    }

    conn.pragma_update(None, "user_version", target)?;
    Ok(())
}

fn tense_column(context: &ContextKey) -> &str {
    context.tense.as_deref().unwrap_or("")
}

fn stat_from_row(row: &Row<'_>) -> rusqlite::Result<StatRecord> {
    let tense: String = row.get(1)?;
    let context = ContextKey {
        tense: if tense.is_empty() { None } else { Some(tense) },
        pronoun: row.get(2)?,
    };

    let last_practiced = row
        .get::<_, Option<String>>(6)?
        .map(|s| {
            DateTime::parse_from_rfc3339(&s)
                .map(|t| t.with_timezone(&Utc))
                .map_err(|e| rusqlite::Error::FromSqlConversionFailure(6, Type::Text, Box::new(e)))
        })
        .transpose()?;

    Ok(StatRecord {
        key: StatKey {
            content_key: row.get(0)?,
            context,
        },
        correct_streak: row.get(3)?,
        incorrect_count: row.get(4)?,
        total_attempts: row.get(5)?,
        last_practiced,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    fn verb(key: &str) -> ContentItem {
        ContentItem::new(key)
            .with_answer(ContextKey::pronoun("je"), format!("{}-je", key))
            .with_answer(ContextKey::pronoun("tu"), format!("{}-tu", key))
    }

    fn create_test_store() -> (ContentStore, TempDir) {
        let temp_dir = TempDir::new().unwrap();
        let store = ContentStore::open_or_create(&temp_dir.path().join("verbcard.db"), SCHEMA_VERSION).unwrap();
        (store, temp_dir)
    }

    #[test]
    fn test_open_is_idempotent_and_keeps_data() {
        let temp_dir = TempDir::new().unwrap();
        let path = temp_dir.path().join("nested").join("verbcard.db");

        {
            let mut store = ContentStore::open_or_create(&path, SCHEMA_VERSION).unwrap();
            store.replace_all_content(&[verb("aller")], &"1".into()).unwrap();
        }

        let store = ContentStore::open_or_create(&path, SCHEMA_VERSION).unwrap();
        assert_eq!(store.content_count().unwrap(), 1);
        assert_eq!(store.stored_version().unwrap(), Some("1".into()));
    }

    #[test]
    fn test_upgrade_preserves_existing_collections() {
        let temp_dir = TempDir::new().unwrap();
        let path = temp_dir.path().join("verbcard.db");

        {
            let mut store = ContentStore::open_or_create(&path, 1).unwrap();
            store.replace_all_content(&[verb("aller")], &3u64.into()).unwrap();
            // Statistics arrive with version 2
            assert!(store.get_all_stats().is_err());
        }

        let store = ContentStore::open_or_create(&path, 2).unwrap();
        assert_eq!(store.get_all_content().unwrap(), vec![verb("aller")]);
        assert!(store.get_all_stats().unwrap().is_empty());
    }

    #[test]
    fn test_newer_schema_is_unavailable() {
        let temp_dir = TempDir::new().unwrap();
        let path = temp_dir.path().join("verbcard.db");
        ContentStore::open_or_create(&path, 5).unwrap();

        let result = ContentStore::open_or_create(&path, SCHEMA_VERSION);
        assert!(matches!(result, Err(StoreError::Unavailable(_))));
    }

    #[test]
    fn test_replace_swaps_content_and_version() {
        let (mut store, _temp) = create_test_store();

        store.replace_all_content(&[verb("aller"), verb("avoir")], &"1".into()).unwrap();
        store.replace_all_content(&[verb("être")], &"2".into()).unwrap();

        let keys: Vec<String> = store.get_all_content().unwrap().into_iter().map(|i| i.key).collect();
        assert_eq!(keys, vec!["être".to_string()]);
        assert_eq!(store.stored_version().unwrap(), Some("2".into()));
        assert_eq!(store.write_count(), 2);
    }

    #[test]
    fn test_failed_replace_rolls_back() {
        let (mut store, _temp) = create_test_store();
        store.replace_all_content(&[verb("aller"), verb("avoir")], &"1".into()).unwrap();

        // The duplicate key fails halfway through the bulk insert
        let broken = vec![verb("faire"), verb("dire"), verb("faire")];
        let result = store.replace_all_content(&broken, &"2".into());
        assert!(result.is_err());

        let keys: Vec<String> = store.get_all_content().unwrap().into_iter().map(|i| i.key).collect();
        assert_eq!(keys, vec!["aller".to_string(), "avoir".to_string()]);
        assert_eq!(store.stored_version().unwrap(), Some("1".into()));
        assert_eq!(store.write_count(), 1);
    }

    #[test]
    fn test_stat_defaults_and_roundtrip() {
        let (mut store, _temp) = create_test_store();
        let key = StatKey::new("aller", ContextKey::tensed("futur", "nous"));

        let fresh = store.get_stat(&key).unwrap();
        assert_eq!(fresh, StatRecord::new(key.clone()));

        let mut record = fresh;
        record.apply_outcome(true, Utc::now());
        store.put_stat(&record).unwrap();

        let loaded = store.get_stat(&key).unwrap();
        assert_eq!(loaded.correct_streak, 1);
        assert_eq!(loaded.total_attempts, 1);
        assert_eq!(
            loaded.last_practiced.map(|t| t.timestamp()),
            record.last_practiced.map(|t| t.timestamp())
        );
    }

    #[test]
    fn test_composite_keys_do_not_collide() {
        let (mut store, _temp) = create_test_store();

        // With a "_"-joined key these two would both be "a_b_c"
        let first = StatKey::new("a_b", ContextKey::pronoun("c"));
        let second = StatKey::new("a", ContextKey::pronoun("b_c"));

        let mut record = StatRecord::new(first.clone());
        record.apply_outcome(true, Utc::now());
        store.put_stat(&record).unwrap();

        assert_eq!(store.get_stat(&first).unwrap().correct_streak, 1);
        assert_eq!(store.get_stat(&second).unwrap().correct_streak, 0);
        assert_eq!(store.get_all_stats().unwrap().len(), 1);
    }

    #[test]
    fn test_clear_stats_leaves_content() {
        let (mut store, _temp) = create_test_store();
        store.replace_all_content(&[verb("aller")], &"1".into()).unwrap();

        let mut record = StatRecord::new(StatKey::new("aller", ContextKey::pronoun("je")));
        record.apply_outcome(false, Utc::now());
        store.put_stat(&record).unwrap();

        store.clear_all_stats().unwrap();
        assert!(store.get_all_stats().unwrap().is_empty());
        assert_eq!(store.content_count().unwrap(), 1);
    }

    #[test]
    fn test_metadata_roundtrip_keeps_version_with_content() {
        let (mut store, _temp) = create_test_store();
        store.replace_all_content(&[verb("aller")], &"1".into()).unwrap();

        let value = serde_json::json!({ "lastSync": "2026-10-16" });
        store.put_metadata("client", &value).unwrap();
        assert_eq!(store.get_metadata("client").unwrap(), Some(value));
        assert_eq!(store.get_metadata("missing").unwrap(), None);

        let result = store.put_metadata(VERSION_KEY, &serde_json::json!("2"));
        assert!(matches!(result, Err(StoreError::ReservedKey(_))));
        assert_eq!(store.stored_version().unwrap(), Some("1".into()));
    }

    #[test]
    fn test_destroy_removes_file() {
        let (store, temp) = create_test_store();
        let path = temp.path().join("verbcard.db");
        assert!(path.exists());

        store.destroy().unwrap();
        assert!(!path.exists());
    }
}
