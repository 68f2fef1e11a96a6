//! Cache generation lifecycle and per-resource fetch strategy

use std::collections::BTreeSet;

use futures_util::future::join_all;
use uuid::Uuid;

use super::models::{
    ActivationReport, AssetResponse, CacheManifest, FailedAsset, GenerationState, InstallReport,
    ResourceClass, RoutingTable, Served, ServedFrom,
};
use super::network::AssetNetwork;
use super::storage::{AssetError, CacheStorage, Result};

/// Owns the current cache generation and answers resource requests
pub struct AssetCacheManager<N: AssetNetwork> {
    storage: CacheStorage,
    manifest: CacheManifest,
    routes: RoutingTable,
    network: N,
    state: Option<GenerationState>,
    clients: BTreeSet<Uuid>,
    controlled: BTreeSet<Uuid>,
}

impl<N: AssetNetwork> AssetCacheManager<N> {
    /// Picks up where a previous run left off, using the lifecycle recorded
    /// on disk. A generation whose install never completed starts over.
    pub fn new(
        storage: CacheStorage,
        manifest: CacheManifest,
        routes: RoutingTable,
        network: N,
    ) -> Result<Self> {
        let state = match storage.state(&manifest.cache_name())? {
            Some(GenerationState::Installed) => Some(GenerationState::Installed),
            Some(GenerationState::Active) => Some(GenerationState::Active),
            _ => None,
        };

        Ok(Self {
            storage,
            manifest,
            routes,
            network,
            state,
            clients: BTreeSet::new(),
            controlled: BTreeSet::new(),
        })
    }

    pub fn cache_name(&self) -> String {
        self.manifest.cache_name()
    }

    pub fn manifest(&self) -> &CacheManifest {
        &self.manifest
    }

    pub fn storage(&self) -> &CacheStorage {
        &self.storage
    }

    /// `None` until the current generation is installed
    pub fn state(&self) -> Option<GenerationState> {
        self.state
    }

    /// Every generation on disk with its lifecycle state
    pub fn generations(&self) -> Result<Vec<(String, GenerationState)>> {
        let current = self.cache_name();
        Ok(self
            .storage
            .keys()?
            .into_iter()
            .map(|name| {
                let state = if name == current {
                    self.state.unwrap_or(GenerationState::Installing)
                } else {
                    GenerationState::Superseded
                };
                (name, state)
            })
            .collect())
    }

    /// Fetch every manifest entry into the current generation.
    ///
    /// Entries are fetched concurrently and independently; one failing entry
    /// never prevents the others from being cached.
    pub async fn install(&mut self) -> Result<InstallReport> {
        let name = self.cache_name();
        let was_active = self.state == Some(GenerationState::Active);
        self.state = Some(GenerationState::Installing);
        log::info!("Installing cache {}", name);

        self.storage.open(&name)?;

        let network = &self.network;
        let fetches = self.manifest.assets.iter().map(|path| async move {
            let result = network.fetch(path).await;
            (path.clone(), result)
        });
        let results = join_all(fetches).await;

        let mut report = InstallReport {
            cache_name: name.clone(),
            cached: Vec::new(),
            failed: Vec::new(),
        };

        for (path, result) in results {
            let failure = match result {
                Ok(response) if response.is_success() => {
                    match self.storage.put(&name, &path, &response) {
                        Ok(()) => None,
                        Err(e) => Some(e.to_string()),
                    }
                }
                Ok(response) => Some(format!("server returned status {}", response.status)),
                Err(e) => Some(e.to_string()),
            };

            match failure {
                None => report.cached.push(path),
                Some(error) => {
                    log::warn!("Failed to cache {}: {}", path, error);
                    report.failed.push(FailedAsset { path, error });
                }
            }
        }

        // Reinstalling the active generation refreshes it in place
        let state = if was_active {
            GenerationState::Active
        } else {
            GenerationState::Installed
        };
        self.storage.set_state(&name, state)?;
        self.state = Some(state);
        log::info!(
            "Installed cache {} ({} cached, {} failed)",
            name,
            report.cached.len(),
            report.failed.len()
        );
        Ok(report)
    }

    /// Delete every other generation, then take control of all client views
    pub fn activate(&mut self) -> Result<ActivationReport> {
        match self.state {
            Some(GenerationState::Installed) | Some(GenerationState::Active) => {}
            other => {
                return Err(AssetError::InvalidState(format!(
                    "cannot activate from {:?}; install first",
                    other
                )))
            }
        }

        let name = self.cache_name();
        let mut purged = Vec::new();
        for key in self.storage.keys()? {
            if key != name {
                log::info!("Deleting old cache {}", key);
                self.storage.delete(&key)?;
                purged.push(key);
            }
        }

        self.storage.set_state(&name, GenerationState::Active)?;
        self.state = Some(GenerationState::Active);
        self.controlled = self.clients.clone();
        log::info!(
            "Cache {} active, claimed {} client(s)",
            name,
            self.controlled.len()
        );

        Ok(ActivationReport {
            cache_name: name,
            purged,
            claimed_clients: self.controlled.len(),
        })
    }

    /// A client view opened after activation is controlled straight away
    pub fn register_client(&mut self) -> Uuid {
        let id = Uuid::new_v4();
        self.clients.insert(id);
        if self.state == Some(GenerationState::Active) {
            self.controlled.insert(id);
        }
        id
    }

    pub fn release_client(&mut self, id: &Uuid) {
        self.clients.remove(id);
        self.controlled.remove(id);
    }

    pub fn is_controlled(&self, id: &Uuid) -> bool {
        self.controlled.contains(id)
    }

    /// Delete every generation and give up control
    pub fn unregister(&mut self) -> Result<Vec<String>> {
        let deleted = self.storage.delete_all()?;
        self.state = Some(GenerationState::Superseded);
        self.controlled.clear();
        log::info!("Unregistered asset cache, deleted {} generation(s)", deleted.len());
        Ok(deleted)
    }

    /// Answer a request for `path` with the strategy its class calls for
    pub async fn fetch(&self, path: &str) -> Result<Served> {
        let class = self.routes.classify(path);
        log::debug!("{} is {:?}", path, class);
        match class {
            ResourceClass::NetworkFirst => self.network_first(path).await,
            ResourceClass::CacheFirst => self.cache_first(path).await,
        }
    }

    async fn network_first(&self, path: &str) -> Result<Served> {
        match self.network.fetch(path).await {
            Ok(response) if response.is_success() => {
                self.store_copy(path, &response);
                Ok(Served {
                    response,
                    from: ServedFrom::Network,
                })
            }
            Ok(response) => match self.cached(path) {
                Some(cached) => {
                    log::warn!(
                        "{} returned status {}, serving cached copy",
                        path,
                        response.status
                    );
                    Ok(from_cache(cached))
                }
                None => Ok(Served {
                    response,
                    from: ServedFrom::Network,
                }),
            },
            Err(e) => match self.cached(path) {
                Some(cached) => {
                    log::warn!("{} unreachable ({}), serving cached copy", path, e);
                    Ok(from_cache(cached))
                }
                None => Err(e),
            },
        }
    }

    async fn cache_first(&self, path: &str) -> Result<Served> {
        if let Some(cached) = self.cached(path) {
            return Ok(from_cache(cached));
        }

        match self.network.fetch(path).await {
            Ok(response) => {
                if response.is_cacheable() {
                    self.store_copy(path, &response);
                }
                Ok(Served {
                    response,
                    from: ServedFrom::Network,
                })
            }
            Err(e) => match self.cached(path) {
                Some(cached) => Ok(from_cache(cached)),
                None => Err(e),
            },
        }
    }

    /// Generation that answers requests: the current one once it is active,
    /// before that whichever older generation is still active
    fn serving_cache(&self) -> Option<String> {
        match self.state {
            Some(GenerationState::Active) => Some(self.cache_name()),
            Some(GenerationState::Superseded) => None,
            _ => match self.previous_active() {
                Ok(found) => found,
                Err(e) => {
                    log::warn!("Cannot read cache generations: {}", e);
                    None
                }
            },
        }
    }

    fn previous_active(&self) -> Result<Option<String>> {
        let current = self.cache_name();
        let mut found = None;
        for key in self.storage.keys()? {
            if key != current && self.storage.state(&key)? == Some(GenerationState::Active) {
                found = Some(key);
            }
        }
        Ok(found)
    }

    fn cached(&self, path: &str) -> Option<AssetResponse> {
        let name = self.serving_cache()?;
        match self.storage.match_entry(&name, path) {
            Ok(found) => found,
            Err(e) => {
                log::warn!("Cache lookup for {} failed: {}", path, e);
                None
            }
        }
    }

    /// Only the active generation takes writes from the request path
    fn store_copy(&self, path: &str, response: &AssetResponse) {
        if self.state != Some(GenerationState::Active) {
            log::debug!("Not caching {}: {} is not active", path, self.cache_name());
            return;
        }
        if let Err(e) = self.storage.put(&self.cache_name(), path, response) {
            log::warn!("Failed to cache {}: {}", path, e);
        }
    }
}

fn from_cache(response: AssetResponse) -> Served {
    Served {
        response,
        from: ServedFrom::Cache,
    }
}

#[cfg(test)]
pub(crate) mod test_support {
    use std::collections::HashMap;
    use std::sync::atomic::{AtomicBool, Ordering};
    use std::sync::Mutex;

    use async_trait::async_trait;

    use crate::assets::models::AssetResponse;
    use crate::assets::network::AssetNetwork;
    use crate::assets::storage::{AssetError, Result};

    /// In-memory network with canned responses; unknown paths are 404
    #[derive(Default)]
    pub struct FakeNetwork {
        responses: Mutex<HashMap<String, AssetResponse>>,
        unreachable: Mutex<Vec<String>>,
        offline: AtomicBool,
        requests: Mutex<Vec<String>>,
    }

    impl FakeNetwork {
        pub fn serving(paths: &[(&str, &str)]) -> Self {
            let network = Self::default();
            for (path, body) in paths {
                network.respond(path, AssetResponse::ok(*body));
            }
            network
        }

        pub fn respond(&self, path: &str, response: AssetResponse) {
            self.responses
                .lock()
                .unwrap()
                .insert(path.to_string(), response);
        }

        /// Make a single path fail at the transport level
        pub fn break_path(&self, path: &str) {
            self.unreachable.lock().unwrap().push(path.to_string());
        }

        pub fn set_offline(&self, offline: bool) {
            self.offline.store(offline, Ordering::SeqCst);
        }

        pub fn request_count(&self, path: &str) -> usize {
            self.requests
                .lock()
                .unwrap()
                .iter()
                .filter(|p| p.as_str() == path)
                .count()
        }
    }

    #[async_trait]
    impl AssetNetwork for FakeNetwork {
        async fn fetch(&self, path: &str) -> Result<AssetResponse> {
            self.requests.lock().unwrap().push(path.to_string());
            if self.offline.load(Ordering::SeqCst)
                || self.unreachable.lock().unwrap().iter().any(|p| p == path)
            {
                return Err(AssetError::Unreachable(path.to_string()));
            }
            Ok(self
                .responses
                .lock()
                .unwrap()
                .get(path)
                .cloned()
                .unwrap_or_else(|| AssetResponse::ok(Vec::new()).with_status(404)))
        }
    }
}
