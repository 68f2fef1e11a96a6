//! Configuration loaded from a TOML file

use std::fs;
use std::path::{Path, PathBuf};
use std::time::Duration;

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::assets::{CacheManifest, RoutingTable, DEFAULT_MANIFEST, DEFAULT_NETWORK_FIRST};
use crate::mastery::MASTERY_THRESHOLD;
use crate::practice::{parse_tenses, PracticeError, Tense};

const DATABASE_FILE: &str = "verbcard.db";
const PHRASES_DATABASE_FILE: &str = "phrases.db";
const CACHES_DIR: &str = "caches";

#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Invalid config file: {0}")]
    Parse(#[from] toml::de::Error),

    #[error("Data directory not found")]
    DataDirNotFound,

    #[error("Invalid practice settings: {0}")]
    Practice(#[from] PracticeError),
}

pub type Result<T> = std::result::Result<T, ConfigError>;

/// Default data directory, e.g. `~/.local/share/verbcard`
pub fn default_data_dir() -> Result<PathBuf> {
    dirs::data_local_dir()
        .map(|p| p.join("verbcard"))
        .ok_or(ConfigError::DataDirNotFound)
}

/// Default config file location, e.g. `~/.config/verbcard/config.toml`
pub fn default_config_path() -> Option<PathBuf> {
    dirs::config_dir().map(|p| p.join("verbcard").join("config.toml"))
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct AppConfig {
    /// Where the database and asset caches live; platform default if unset
    pub data_dir: Option<PathBuf>,
    pub dataset: DatasetConfig,
    pub assets: AssetsConfig,
    pub practice: PracticeConfig,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct DatasetConfig {
    /// Verb conjugation dataset
    pub url: String,
    /// Phrase dataset used by tense practice
    pub phrases_url: String,
    pub timeout_secs: u64,
}

impl Default for DatasetConfig {
    fn default() -> Self {
        Self {
            url: "http://localhost:8000/words.json".to_string(),
            phrases_url: "http://localhost:8000/tense-practice-words.json".to_string(),
            timeout_secs: 30,
        }
    }
}

impl DatasetConfig {
    pub fn timeout(&self) -> Duration {
        Duration::from_secs(self.timeout_secs.max(1))
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct AssetsConfig {
    pub base_url: String,
    pub cache_prefix: String,
    pub version: String,
    pub manifest: Vec<String>,
    /// Path suffixes fetched network-first
    pub network_first: Vec<String>,
}

impl Default for AssetsConfig {
    fn default() -> Self {
        Self {
            base_url: "http://localhost:8000/".to_string(),
            cache_prefix: "french-conjugation".to_string(),
            version: "v21".to_string(),
            manifest: DEFAULT_MANIFEST.iter().map(|s| s.to_string()).collect(),
            network_first: DEFAULT_NETWORK_FIRST.iter().map(|s| s.to_string()).collect(),
        }
    }
}

impl AssetsConfig {
    pub fn cache_manifest(&self) -> CacheManifest {
        CacheManifest::new(&self.cache_prefix, &self.version, self.manifest.clone())
    }

    pub fn routing_table(&self) -> RoutingTable {
        RoutingTable::new(self.network_first.clone())
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct PracticeConfig {
    pub mastery_threshold: u32,
    /// Comma-separated tense keys used when `--tenses` is not given
    pub default_tenses: String,
}

impl Default for PracticeConfig {
    fn default() -> Self {
        Self {
            mastery_threshold: MASTERY_THRESHOLD,
            default_tenses: "present,passe_compose,futur".to_string(),
        }
    }
}

impl PracticeConfig {
    pub fn tenses(&self) -> Result<Vec<Tense>> {
        Ok(parse_tenses(&self.default_tenses)?)
    }
}

impl AppConfig {
    /// Read `path`; a missing file yields the defaults
    pub fn load(path: &Path) -> Result<Self> {
        if !path.exists() {
            log::debug!("No config at {}, using defaults", path.display());
            return Ok(Self::default());
        }
        let content = fs::read_to_string(path)?;
        Self::from_toml(&content)
    }

    pub fn from_toml(content: &str) -> Result<Self> {
        Ok(toml::from_str(content)?)
    }

    pub fn data_dir(&self) -> Result<PathBuf> {
        match &self.data_dir {
            Some(dir) => Ok(dir.clone()),
            None => default_data_dir(),
        }
    }

    pub fn database_path(&self) -> Result<PathBuf> {
        Ok(self.data_dir()?.join(DATABASE_FILE))
    }

    /// Phrases live in their own store so switching modes never evicts verbs
    pub fn phrases_database_path(&self) -> Result<PathBuf> {
        Ok(self.data_dir()?.join(PHRASES_DATABASE_FILE))
    }

    pub fn caches_dir(&self) -> Result<PathBuf> {
        Ok(self.data_dir()?.join(CACHES_DIR))
    }
}
