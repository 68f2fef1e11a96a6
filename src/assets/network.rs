use std::time::Duration;

use async_trait::async_trait;
use reqwest::header::CONTENT_TYPE;
use reqwest::{Client, Url};

use super::models::{AssetResponse, ResponseOrigin};
use super::storage::{AssetError, Result};

/// Where application assets come from when the cache can't answer
#[async_trait]
pub trait AssetNetwork: Send + Sync {
    /// Fetch a resource by its manifest-relative path. A non-success status is
    /// still `Ok`; only transport failures are errors.
    async fn fetch(&self, path: &str) -> Result<AssetResponse>;
}

/// Fetches assets relative to a base URL
pub struct HttpAssetNetwork {
    client: Client,
    base: Url,
}

impl HttpAssetNetwork {
    pub fn new(base_url: &str, timeout: Duration) -> Result<Self> {
        let client = Client::builder()
            .timeout(timeout)
            .connect_timeout(timeout.min(Duration::from_secs(30)))
            .build()?;
        Self::with_client(client, base_url)
    }

    pub fn with_client(client: Client, base_url: &str) -> Result<Self> {
        // Relative joins need a trailing slash to keep the last segment
        let normalized = if base_url.ends_with('/') {
            base_url.to_string()
        } else {
            format!("{}/", base_url)
        };
        let base = Url::parse(&normalized)
            .map_err(|e| AssetError::InvalidUrl(format!("{}: {}", base_url, e)))?;
        if !matches!(base.scheme(), "http" | "https") {
            return Err(AssetError::InvalidUrl(format!(
                "asset base URL must be http or https, got {}",
                base_url
            )));
        }
        Ok(Self { client, base })
    }

    fn resolve(&self, path: &str) -> Result<Url> {
        self.base
            .join(path)
            .map_err(|e| AssetError::InvalidUrl(format!("{}: {}", path, e)))
    }
}

#[async_trait]
impl AssetNetwork for HttpAssetNetwork {
    async fn fetch(&self, path: &str) -> Result<AssetResponse> {
        let url = self.resolve(path)?;
        log::debug!("Fetching asset {}", url);

        let response = self.client.get(url).send().await?;

        // Redirects can land elsewhere; only the final URL counts
        let origin = if response.url().origin() == self.base.origin() {
            ResponseOrigin::SameOrigin
        } else {
            ResponseOrigin::CrossOrigin
        };
        let status = response.status().as_u16();
        let content_type = response
            .headers()
            .get(CONTENT_TYPE)
            .and_then(|v| v.to_str().ok())
            .map(|s| s.to_string());
        let body = response.bytes().await?.to_vec();

        Ok(AssetResponse {
            status,
            body,
            content_type,
            origin,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::dataset::source::test_support::{local_client, serve_once};

    #[test]
    fn test_resolve_relative_paths() {
        let network =
            HttpAssetNetwork::with_client(Client::new(), "https://example.com/app").unwrap();
        assert_eq!(
            network.resolve("./index.html").unwrap().as_str(),
            "https://example.com/app/index.html"
        );
        assert_eq!(
            network.resolve("./").unwrap().as_str(),
            "https://example.com/app/"
        );
    }

    #[test]
    fn test_rejects_non_http_base() {
        assert!(matches!(
            HttpAssetNetwork::with_client(Client::new(), "file:///tmp/app"),
            Err(AssetError::InvalidUrl(_))
        ));
    }

    #[tokio::test]
    async fn test_fetch_same_origin() {
        let addr = serve_once("200 OK", "{\"name\":\"app\"}").await;
        let network =
            HttpAssetNetwork::with_client(local_client(), &format!("http://{}/", addr)).unwrap();

        let response = network.fetch("./manifest.json").await.unwrap();
        assert_eq!(response.status, 200);
        assert_eq!(response.origin, ResponseOrigin::SameOrigin);
        assert_eq!(response.content_type.as_deref(), Some("application/json"));
        assert!(response.is_cacheable());
    }

    #[tokio::test]
    async fn test_error_status_is_not_a_transport_error() {
        let addr = serve_once("404 Not Found", "").await;
        let network =
            HttpAssetNetwork::with_client(local_client(), &format!("http://{}/", addr)).unwrap();

        let response = network.fetch("./missing.png").await.unwrap();
        assert_eq!(response.status, 404);
        assert!(!response.is_success());
    }
}
