use std::time::Duration;

use async_trait::async_trait;
use reqwest::header::{CACHE_CONTROL, PRAGMA};
use reqwest::{Client, Url};
use thiserror::Error;

use super::models::Dataset;

/// Why a dataset could not be obtained from the remote source
#[derive(Error, Debug)]
pub enum FetchError {
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    #[error("Server returned status {0}")]
    Status(u16),

    #[error("Network unavailable: {0}")]
    Unreachable(String),

    #[error("Malformed dataset: {0}")]
    Malformed(String),

    #[error("Invalid dataset URL: {0}")]
    InvalidUrl(String),
}

impl FetchError {
    /// The payload arrived but failed shape validation
    pub fn is_malformed(&self) -> bool {
        matches!(self, Self::Malformed(_))
    }

    /// The payload never arrived
    pub fn is_network(&self) -> bool {
        matches!(self, Self::Http(_) | Self::Status(_) | Self::Unreachable(_))
    }
}

/// Remote provider of the versioned practice dataset
#[async_trait]
pub trait DatasetSource: Send + Sync {
    async fn fetch(&self) -> Result<Dataset, FetchError>;

    /// Human-readable location, for logging
    fn describe(&self) -> String;
}

/// Fetches the dataset over HTTP, bypassing intermediate caches
pub struct HttpDatasetSource {
    client: Client,
    url: String,
}

impl HttpDatasetSource {
    pub fn new(url: impl Into<String>, timeout: Duration) -> Result<Self, FetchError> {
        let url = url.into();
        let parsed = Url::parse(&url).map_err(|e| FetchError::InvalidUrl(format!("{}: {}", url, e)))?;
        if !matches!(parsed.scheme(), "http" | "https") {
            return Err(FetchError::InvalidUrl(format!(
                "dataset URL must be http or https, got {}",
                url
            )));
        }

        let client = Client::builder()
            .timeout(timeout)
            .connect_timeout(timeout.min(Duration::from_secs(30)))
            .build()?;

        Ok(Self { client, url })
    }

    /// Use a preconfigured client
    pub fn with_client(client: Client, url: impl Into<String>) -> Self {
        Self {
            client,
            url: url.into(),
        }
    }
}

#[async_trait]
impl DatasetSource for HttpDatasetSource {
    async fn fetch(&self) -> Result<Dataset, FetchError> {
        let response = self
            .client
            .get(&self.url)
            .header(CACHE_CONTROL, "no-cache")
            .header(PRAGMA, "no-cache")
            .send()
            .await?;

        let status = response.status();
        if !status.is_success() {
            return Err(FetchError::Status(status.as_u16()));
        }

        let body = response.bytes().await?;
        Dataset::from_slice(&body)
    }

    fn describe(&self) -> String {
        self.url.clone()
    }
}


#[cfg(test)]
mod tests {
    use super::test_support::{local_client, serve_once};
    use super::*;

    #[tokio::test]
    async fn test_fetch_success() {
        let addr = serve_once(
            "200 OK",
            r#"{"version": "7", "verbs": [{"infinitive": "aller", "conjugations": {"je": "vais"}}]}"#,
        )
        .await;

        let source = HttpDatasetSource::with_client(local_client(), format!("http://{}/words.json", addr));
        let dataset = source.fetch().await.unwrap();
        assert_eq!(dataset.version, "7".into());
        assert_eq!(dataset.items.len(), 1);
    }

    #[tokio::test]
    async fn test_fetch_server_error() {
        let addr = serve_once("500 Internal Server Error", "").await;

        let source = HttpDatasetSource::with_client(local_client(), format!("http://{}/words.json", addr));
        let err = source.fetch().await.unwrap_err();
        assert!(matches!(err, FetchError::Status(500)));
        assert!(err.is_network());
    }

    #[tokio::test]
    async fn test_fetch_malformed_body() {
        let addr = serve_once("200 OK", r#"{"verbs": "nope"}"#).await;

        let source = HttpDatasetSource::with_client(local_client(), format!("http://{}/words.json", addr));
        assert!(source.fetch().await.unwrap_err().is_malformed());
    }

    #[test]
    fn test_rejects_non_http_url() {
        let result = HttpDatasetSource::new("ftp://example.com/words.json", Duration::from_secs(5));
        let err = result.err().unwrap();
        assert!(matches!(err, FetchError::InvalidUrl(_)));
        assert!(!err.is_network());

        let result = HttpDatasetSource::new("words.json", Duration::from_secs(5));
        assert!(matches!(result, Err(FetchError::InvalidUrl(_))));
    }
}
