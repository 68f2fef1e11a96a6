//! On-disk cache generations
//!
//! Layout: `{root}/{cache_name}/index.json` plus `{root}/{cache_name}/entries/`
//! holding one body file per resource, named by the SHA-256 of its path.

use std::collections::BTreeMap;
use std::fs;
use std::path::{Path, PathBuf};

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};
use thiserror::Error;

use super::models::{AssetResponse, GenerationState, ResponseOrigin};

const INDEX_FILE: &str = "index.json";
const ENTRIES_DIR: &str = "entries";

#[derive(Error, Debug)]
pub enum AssetError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    #[error("Network unavailable: {0}")]
    Unreachable(String),

    #[error("Invalid URL: {0}")]
    InvalidUrl(String),

    #[error("Invalid cache name: {0}")]
    InvalidCacheName(String),

    #[error("Invalid lifecycle transition: {0}")]
    InvalidState(String),
}

pub type Result<T> = std::result::Result<T, AssetError>;

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
struct CachedEntry {
    file: String,
    status: u16,
    content_type: Option<String>,
    origin: ResponseOrigin,
    stored_at: DateTime<Utc>,
}

#[derive(Debug, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
struct CacheIndex {
    /// Absent until an install has completed
    #[serde(default)]
    state: Option<GenerationState>,
    #[serde(default)]
    state_changed_at: Option<DateTime<Utc>>,
    entries: BTreeMap<String, CachedEntry>,
}

/// Named cache generations stored under one root directory
pub struct CacheStorage {
    root: PathBuf,
}

impl CacheStorage {
    pub fn new(root: PathBuf) -> Self {
        Self { root }
    }

    fn cache_dir(&self, name: &str) -> Result<PathBuf> {
        if name.is_empty()
            || name == "."
            || name == ".."
            || name.contains(['/', '\\'])
        {
            return Err(AssetError::InvalidCacheName(name.to_string()));
        }
        Ok(self.root.join(name))
    }

    fn entry_file(path: &str) -> String {
        hex::encode(Sha256::digest(path.as_bytes()))
    }

    fn read_index(dir: &Path) -> Result<CacheIndex> {
        let index_path = dir.join(INDEX_FILE);
        if !index_path.exists() {
            return Ok(CacheIndex::default());
        }
        let content = fs::read_to_string(index_path)?;
        Ok(serde_json::from_str(&content)?)
    }

    fn write_index(dir: &Path, index: &CacheIndex) -> Result<()> {
        let path = dir.join(INDEX_FILE);
        let tmp_path = path.with_extension("json.tmp");
        let content = serde_json::to_string_pretty(index)?;
        fs::write(&tmp_path, content)?;
        fs::rename(&tmp_path, &path)?;
        Ok(())
    }

    /// Names of every generation present, sorted
    pub fn keys(&self) -> Result<Vec<String>> {
        if !self.root.exists() {
            return Ok(Vec::new());
        }

        let mut names = Vec::new();
        for entry in fs::read_dir(&self.root)? {
            let entry = entry?;
            if entry.file_type()?.is_dir() {
                if let Some(name) = entry.file_name().to_str() {
                    names.push(name.to_string());
                }
            }
        }
        names.sort();
        Ok(names)
    }

    /// Create the generation if it doesn't exist yet
    pub fn open(&self, name: &str) -> Result<()> {
        let dir = self.cache_dir(name)?;
        fs::create_dir_all(dir.join(ENTRIES_DIR))?;
        if !dir.join(INDEX_FILE).exists() {
            Self::write_index(&dir, &CacheIndex::default())?;
        }
        Ok(())
    }

    pub fn has(&self, name: &str) -> Result<bool> {
        Ok(self.cache_dir(name)?.is_dir())
    }

    /// Remove a generation; returns false if it didn't exist
    pub fn delete(&self, name: &str) -> Result<bool> {
        let dir = self.cache_dir(name)?;
        if !dir.exists() {
            return Ok(false);
        }
        fs::remove_dir_all(dir)?;
        Ok(true)
    }

    /// Remove every generation, returning the names deleted
    pub fn delete_all(&self) -> Result<Vec<String>> {
        let names = self.keys()?;
        for name in &names {
            self.delete(name)?;
        }
        Ok(names)
    }

    /// Lifecycle recorded for a generation: `None` if it doesn't exist,
    /// `Installing` if no install has completed yet
    pub fn state(&self, name: &str) -> Result<Option<GenerationState>> {
        let dir = self.cache_dir(name)?;
        if !dir.is_dir() {
            return Ok(None);
        }
        let index = Self::read_index(&dir)?;
        Ok(Some(index.state.unwrap_or(GenerationState::Installing)))
    }

    /// Record the lifecycle of an existing generation
    pub fn set_state(&self, name: &str, state: GenerationState) -> Result<()> {
        let dir = self.cache_dir(name)?;
        if !dir.is_dir() {
            return Err(AssetError::InvalidState(format!("cache {} does not exist", name)));
        }
        let mut index = Self::read_index(&dir)?;
        index.state = Some(state);
        index.state_changed_at = Some(Utc::now());
        Self::write_index(&dir, &index)
    }

    /// Store a response under `path`, replacing any previous entry
    pub fn put(&self, name: &str, path: &str, response: &AssetResponse) -> Result<()> {
        self.open(name)?;
        let dir = self.cache_dir(name)?;

        let file = Self::entry_file(path);
        fs::write(dir.join(ENTRIES_DIR).join(&file), &response.body)?;

        let mut index = Self::read_index(&dir)?;
        index.entries.insert(
            path.to_string(),
            CachedEntry {
                file,
                status: response.status,
                content_type: response.content_type.clone(),
                origin: response.origin,
                stored_at: Utc::now(),
            },
        );
        Self::write_index(&dir, &index)
    }

    /// Look up a cached response by resource path
    pub fn match_entry(&self, name: &str, path: &str) -> Result<Option<AssetResponse>> {
        let dir = self.cache_dir(name)?;
        if !dir.exists() {
            return Ok(None);
        }

        let index = Self::read_index(&dir)?;
        let Some(entry) = index.entries.get(path) else {
            return Ok(None);
        };

        let body_path = dir.join(ENTRIES_DIR).join(&entry.file);
        if !body_path.exists() {
            log::warn!("Cache {} lists {} but its body is missing", name, path);
            return Ok(None);
        }

        Ok(Some(AssetResponse {
            status: entry.status,
            body: fs::read(body_path)?,
            content_type: entry.content_type.clone(),
            origin: entry.origin,
        }))
    }

    /// Cached resource paths in a generation
    pub fn entries(&self, name: &str) -> Result<Vec<String>> {
        let dir = self.cache_dir(name)?;
        if !dir.exists() {
            return Ok(Vec::new());
        }
        Ok(Self::read_index(&dir)?.entries.into_keys().collect())
    }
}
