//! Object storage access for generated files
//!
//! Only the single operation the gateway needs is modelled: copy one object
//! into a local file. Bucket management and multipart transfers live
//! elsewhere.

use async_trait::async_trait;
use futures::StreamExt;
use secrecy::{ExposeSecret, SecretString};
use serde::Deserialize;
use std::path::Path;
use std::time::Duration;
use tokio::fs::File;
use tokio::io::AsyncWriteExt;
use tracing::{debug, instrument};
use url::Url;

use crate::error::{BackendError, StorageError};

/// Blob store holding one bucket of files
#[async_trait]
pub trait ObjectStorage: Send + Sync {
    /// Copy object `key` into `dest`, returning the number of bytes written
    async fn fetch_to_file(&self, key: &str, dest: &Path) -> Result<u64, StorageError>;
}

/// Connection settings for one bucket
#[derive(Debug, Clone, Deserialize)]
pub struct StorageBucketConfig {
    /// Base URL of the S3-compatible endpoint
    pub endpoint: String,

    /// Bucket name
    pub bucket: String,

    /// Region label, informational for path-style endpoints
    #[serde(default)]
    pub region: String,

    /// Access key id, sent as basic-auth user when set
    #[serde(default)]
    pub access_key_id: String,

    /// Secret access key
    #[serde(default = "empty_secret")]
    pub secret_access_key: SecretString,

    /// Per-object transfer timeout in seconds
    #[serde(default = "default_timeout_secs")]
    pub timeout_secs: u64,
}

fn empty_secret() -> SecretString {
    SecretString::new(String::new())
}

fn default_timeout_secs() -> u64 {
    300
}

impl StorageBucketConfig {
    pub fn new(endpoint: impl Into<String>, bucket: impl Into<String>) -> Self {
        Self {
            endpoint: endpoint.into(),
            bucket: bucket.into(),
            region: String::new(),
            access_key_id: String::new(),
            secret_access_key: empty_secret(),
            timeout_secs: default_timeout_secs(),
        }
    }
}

/// Path-style HTTP GET against an S3-compatible endpoint
#[derive(Debug, Clone)]
pub struct HttpObjectStorage {
    client: reqwest::Client,
    base: Url,
    bucket: String,
    access_key_id: String,
    secret_access_key: SecretString,
}

impl HttpObjectStorage {
    pub fn new(config: &StorageBucketConfig) -> Result<Self, BackendError> {
        let base = Url::parse(&config.endpoint).map_err(|e| {
            BackendError::StorageConfiguration(format!(
                "invalid endpoint '{}': {}",
                config.endpoint, e
            ))
        })?;

        if base.cannot_be_a_base() {
            return Err(BackendError::StorageConfiguration(format!(
                "endpoint '{}' cannot be used as a base URL",
                config.endpoint
            )));
        }

        if config.bucket.is_empty() {
            return Err(BackendError::StorageConfiguration(
                "bucket name is empty".to_string(),
            ));
        }

        let client = reqwest::Client::builder()
            .timeout(Duration::from_secs(config.timeout_secs))
            .build()
            .map_err(|e| BackendError::StorageConfiguration(e.to_string()))?;

        Ok(Self {
            client,
            base,
            bucket: config.bucket.clone(),
            access_key_id: config.access_key_id.clone(),
            secret_access_key: config.secret_access_key.clone(),
        })
    }

    /// Bucket this client reads from
    pub fn bucket(&self) -> &str {
        &self.bucket
    }

    fn object_url(&self, key: &str) -> Result<Url, StorageError> {
        if key.is_empty() {
            return Err(StorageError::InvalidKey(key.to_string()));
        }

        let mut url = self.base.clone();
        {
            let mut segments = url
                .path_segments_mut()
                .map_err(|_| StorageError::InvalidKey(key.to_string()))?;
            segments.pop_if_empty().push(&self.bucket);
            for segment in key.split('/') {
                segments.push(segment);
            }
        }

        Ok(url)
    }
}

#[async_trait]
impl ObjectStorage for HttpObjectStorage {
    #[instrument(skip(self, dest), fields(bucket = %self.bucket))]
    async fn fetch_to_file(&self, key: &str, dest: &Path) -> Result<u64, StorageError> {
        let url = self.object_url(key)?;

        let mut request = self.client.get(url);
        if !self.access_key_id.is_empty() {
            request = request.basic_auth(
                &self.access_key_id,
                Some(self.secret_access_key.expose_secret()),
            );
        }

        let response = request.send().await?;
        if !response.status().is_success() {
            return Err(StorageError::UnexpectedStatus {
                status: response.status().as_u16(),
                key: key.to_string(),
            });
        }

        let mut file = File::create(dest).await?;
        let mut written = 0u64;
        let mut stream = response.bytes_stream();

        while let Some(chunk) = stream.next().await {
            let chunk = chunk?;
            file.write_all(&chunk).await?;
            written += chunk.len() as u64;
        }

        file.flush().await?;
        debug!(key, bytes = written, "Fetched object");

        Ok(written)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use wiremock::matchers::{header_exists, method, path};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    fn storage_for(server: &MockServer) -> HttpObjectStorage {
        HttpObjectStorage::new(&StorageBucketConfig::new(server.uri(), "reports")).unwrap()
    }

    #[tokio::test]
    async fn test_fetch_writes_object_to_file() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/reports/abc.csv"))
            .respond_with(ResponseTemplate::new(200).set_body_bytes(b"a,b\n1,2\n".to_vec()))
            .mount(&server)
            .await;

        let dir = tempfile::tempdir().unwrap();
        let dest = dir.path().join("abc.csv");

        let written = storage_for(&server)
            .fetch_to_file("abc.csv", &dest)
            .await
            .unwrap();

        assert_eq!(written, 8);
        assert_eq!(std::fs::read(&dest).unwrap(), b"a,b\n1,2\n");
    }

    #[tokio::test]
    async fn test_missing_object_is_an_error() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .respond_with(ResponseTemplate::new(404))
            .mount(&server)
            .await;

        let dir = tempfile::tempdir().unwrap();
        let dest = dir.path().join("missing.pdf");

        let err = storage_for(&server)
            .fetch_to_file("missing.pdf", &dest)
            .await
            .unwrap_err();

        assert!(matches!(
            err,
            StorageError::UnexpectedStatus { status: 404, .. }
        ));
        assert!(!dest.exists());
    }

    #[tokio::test]
    async fn test_credentials_sent_when_configured() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/reports/doc.pdf"))
            .and(header_exists("authorization"))
            .respond_with(ResponseTemplate::new(200).set_body_bytes(b"%PDF".to_vec()))
            .mount(&server)
            .await;

        let mut config = StorageBucketConfig::new(server.uri(), "reports");
        config.access_key_id = "AKIA".to_string();
        config.secret_access_key = SecretString::new("secret".to_string());
        let storage = HttpObjectStorage::new(&config).unwrap();

        let dir = tempfile::tempdir().unwrap();
        let written = storage
            .fetch_to_file("doc.pdf", &dir.path().join("doc.pdf"))
            .await
            .unwrap();

        assert_eq!(written, 4);
    }

    #[test]
    fn test_object_url_is_path_style() {
        let storage =
            HttpObjectStorage::new(&StorageBucketConfig::new("http://minio:9000/", "agreements"))
                .unwrap();

        let url = storage.object_url("merchant/42 doc.pdf").unwrap();
        assert_eq!(
            url.as_str(),
            "http://minio:9000/agreements/merchant/42%20doc.pdf"
        );
    }

    #[test]
    fn test_invalid_configuration_rejected() {
        let bad_endpoint = StorageBucketConfig::new("not a url", "b");
        let no_bucket = StorageBucketConfig::new("http://minio:9000", "");

        assert!(HttpObjectStorage::new(&bad_endpoint).is_err());
        assert!(HttpObjectStorage::new(&no_bucket).is_err());
    }
}
