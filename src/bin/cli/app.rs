use std::path::{Path, PathBuf};

use anyhow::{Context, Result};

use verbcard_lib::assets::{AssetCacheManager, CacheStorage, HttpAssetNetwork};
use verbcard_lib::config::{default_config_path, AppConfig};
use verbcard_lib::dataset::HttpDatasetSource;
use verbcard_lib::mastery::MasteryTracker;
use verbcard_lib::practice::{parse_tenses, PracticeMode};
use verbcard_lib::store::{ContentStore, SCHEMA_VERSION};

/// Shared application state for CLI commands
pub struct App {
    pub config: AppConfig,
    pub data_dir: PathBuf,
}

impl App {
    /// Load the config file and resolve the data directory
    pub fn new(config_path: Option<&Path>, data_dir: Option<&Path>) -> Result<Self> {
        let mut config = match config_path.map(Path::to_path_buf).or_else(default_config_path) {
            Some(path) => AppConfig::load(&path)
                .with_context(|| format!("Failed to load config from {}", path.display()))?,
            None => AppConfig::default(),
        };
        if let Some(dir) = data_dir {
            config.data_dir = Some(dir.to_path_buf());
        }

        let data_dir = config.data_dir().context("Failed to get data directory")?;
        log::debug!("Using data directory {}", data_dir.display());

        Ok(Self { config, data_dir })
    }

    /// `--tenses` absent means conjugation; present but empty means the
    /// configured default tenses.
    pub fn practice_mode(&self, tenses: Option<&str>) -> Result<PracticeMode> {
        match tenses {
            None => Ok(PracticeMode::Conjugation),
            Some(list) if list.trim().is_empty() => Ok(PracticeMode::Tenses(
                self.config
                    .practice
                    .tenses()
                    .context("Invalid default_tenses in config")?,
            )),
            Some(list) => Ok(PracticeMode::Tenses(parse_tenses(list)?)),
        }
    }

    pub fn store_path(&self, mode: &PracticeMode) -> Result<PathBuf> {
        let path = match mode {
            PracticeMode::Conjugation => self.config.database_path(),
            PracticeMode::Tenses(_) => self.config.phrases_database_path(),
        };
        Ok(path?)
    }

    pub fn store_paths(&self) -> Result<Vec<PathBuf>> {
        Ok(vec![
            self.config.database_path()?,
            self.config.phrases_database_path()?,
        ])
    }

    pub fn open_store(&self, mode: &PracticeMode) -> Result<ContentStore> {
        let path = self.store_path(mode)?;
        ContentStore::open_or_create(&path, SCHEMA_VERSION)
            .with_context(|| format!("Failed to open store at {}", path.display()))
    }

    pub fn dataset_source(&self, mode: &PracticeMode) -> Result<HttpDatasetSource> {
        let url = match mode {
            PracticeMode::Conjugation => &self.config.dataset.url,
            PracticeMode::Tenses(_) => &self.config.dataset.phrases_url,
        };
        HttpDatasetSource::new(url.as_str(), self.config.dataset.timeout())
            .with_context(|| format!("Invalid dataset URL {}", url))
    }

    pub fn tracker(&self) -> MasteryTracker {
        MasteryTracker::new(self.config.practice.mastery_threshold)
    }

    pub fn asset_manager(&self) -> Result<AssetCacheManager<HttpAssetNetwork>> {
        let assets = &self.config.assets;
        let network = HttpAssetNetwork::new(&assets.base_url, self.config.dataset.timeout())
            .with_context(|| format!("Invalid asset base URL {}", assets.base_url))?;
        let storage = CacheStorage::new(self.config.caches_dir()?);

        AssetCacheManager::new(
            storage,
            assets.cache_manifest(),
            assets.routing_table(),
            network,
        )
        .context("Failed to read asset caches")
    }
}
