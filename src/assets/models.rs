//! Data models for the asset cache

use serde::{Deserialize, Serialize};

/// Shell files cached for offline use
pub const DEFAULT_MANIFEST: &[&str] = &[
    "./",
    "./index.html",
    "./conjugation.html",
    "./tenses.html",
    "./tenses-practice.html",
    "./settings.html",
    "./app.js",
    "./shared.js",
    "./tenses-practice.js",
    "./settings.js",
    "./styles.css",
    "./shared.css",
    "./tenses-practice.css",
    "./settings.css",
    "./words.json",
    "./tense-practice-words.json",
    "./manifest.json",
    "./icons/manifest-icon-192.maskable.png",
    "./icons/manifest-icon-512.maskable.png",
    "./icons/apple-icon-180.png",
    "./icons/favicon-196.png",
];

/// Resources that must stay fresh: markup, scripts, stylesheets and datasets
pub const DEFAULT_NETWORK_FIRST: &[&str] = &[
    "words.json",
    "tense-practice-words.json",
    "index.html",
    "conjugation.html",
    "tenses.html",
    "tenses-practice.html",
    "settings.html",
    "app.js",
    "shared.js",
    "tenses-practice.js",
    "settings.js",
    "styles.css",
    "shared.css",
    "tenses-practice.css",
    "settings.css",
];

/// Whether a response came from the application's own origin
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum ResponseOrigin {
    SameOrigin,
    CrossOrigin,
}

/// A fetched or cached resource
#[derive(Debug, Clone, PartialEq)]
pub struct AssetResponse {
    pub status: u16,
    pub body: Vec<u8>,
    pub content_type: Option<String>,
    pub origin: ResponseOrigin,
}

impl AssetResponse {
    pub fn ok(body: impl Into<Vec<u8>>) -> Self {
        Self {
            status: 200,
            body: body.into(),
            content_type: None,
            origin: ResponseOrigin::SameOrigin,
        }
    }

    pub fn with_status(mut self, status: u16) -> Self {
        self.status = status;
        self
    }

    pub fn is_success(&self) -> bool {
        (200..300).contains(&self.status)
    }

    /// Complete, successful, same-origin responses are the only ones a
    /// cache-first lookup will store.
    pub fn is_cacheable(&self) -> bool {
        self.status == 200 && self.origin == ResponseOrigin::SameOrigin
    }
}

/// Fetch strategy for a resource
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum ResourceClass {
    /// Try the network, fall back to the cache
    NetworkFirst,
    /// Serve from the cache, fill it from the network on a miss
    CacheFirst,
}

/// Static table mapping resource paths to a fetch strategy
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RoutingTable {
    network_first: Vec<String>,
}

impl Default for RoutingTable {
    fn default() -> Self {
        Self::new(DEFAULT_NETWORK_FIRST.iter().map(|s| s.to_string()).collect())
    }
}

impl RoutingTable {
    /// `network_first` holds path suffixes; anything else is cache-first
    pub fn new(network_first: Vec<String>) -> Self {
        Self { network_first }
    }

    pub fn classify(&self, path: &str) -> ResourceClass {
        let path = path.split(['?', '#']).next().unwrap_or(path);
        if self.network_first.iter().any(|suffix| path.ends_with(suffix.as_str())) {
            ResourceClass::NetworkFirst
        } else {
            ResourceClass::CacheFirst
        }
    }
}

/// The resources belonging to one cache generation
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CacheManifest {
    pub prefix: String,
    pub version: String,
    pub assets: Vec<String>,
}

impl CacheManifest {
    pub fn new(prefix: impl Into<String>, version: impl Into<String>, assets: Vec<String>) -> Self {
        Self {
            prefix: prefix.into(),
            version: version.into(),
            assets,
        }
    }

    /// Name of the generation, embedding the version token
    pub fn cache_name(&self) -> String {
        if self.prefix.is_empty() {
            self.version.clone()
        } else {
            format!("{}-{}", self.prefix, self.version)
        }
    }
}

/// Lifecycle of a cache generation
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum GenerationState {
    Installing,
    Installed,
    Active,
    Superseded,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct FailedAsset {
    pub path: String,
    pub error: String,
}

/// What an install managed to cache
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct InstallReport {
    pub cache_name: String,
    pub cached: Vec<String>,
    pub failed: Vec<FailedAsset>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ActivationReport {
    pub cache_name: String,
    pub purged: Vec<String>,
    pub claimed_clients: usize,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub enum ServedFrom {
    Network,
    Cache,
}

/// A response along with where it was served from
#[derive(Debug, Clone, PartialEq)]
pub struct Served {
    pub response: AssetResponse,
    pub from: ServedFrom,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_routing_table() {
        let routes = RoutingTable::default();
        assert_eq!(routes.classify("./words.json"), ResourceClass::NetworkFirst);
        assert_eq!(routes.classify("/app/index.html?v=3"), ResourceClass::NetworkFirst);
        assert_eq!(routes.classify("./icons/favicon-196.png"), ResourceClass::CacheFirst);
        assert_eq!(routes.classify("./manifest.json"), ResourceClass::CacheFirst);
    }

    #[test]
    fn test_cacheable_requires_complete_same_origin() {
        assert!(AssetResponse::ok("x").is_cacheable());
        assert!(!AssetResponse::ok("x").with_status(206).is_cacheable());
        assert!(AssetResponse::ok("x").with_status(206).is_success());

        let mut foreign = AssetResponse::ok("x");
        foreign.origin = ResponseOrigin::CrossOrigin;
        assert!(!foreign.is_cacheable());
    }

    #[test]
    fn test_cache_name_embeds_version() {
        let manifest = CacheManifest::new("french-conjugation", "v21", Vec::new());
        assert_eq!(manifest.cache_name(), "french-conjugation-v21");
    }
}
