//! Object storage
//!
//! Every artifact the pipeline reads or writes goes through the
//! [`ObjectStore`] trait: a directory-rooted local backend for development
//! and tests, and a Google Cloud Storage backend for production. Keys are
//! slash-separated paths relative to the store root; batch folders exist
//! implicitly once a key under them is written.

use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use serde::Deserialize;
use tracing::{debug, warn};

use crate::config::AppConfig;
use crate::error::{Error, Result};

/// Trait for object storage backends
#[async_trait]
pub trait ObjectStore: Send + Sync {
    /// Read an object's bytes
    async fn get(&self, key: &str) -> Result<Vec<u8>>;

    /// Write an object, creating its folder implicitly
    async fn put(&self, key: &str, bytes: Vec<u8>, content_type: &str) -> Result<()>;

    /// Keys starting with `prefix`, sorted
    async fn list(&self, prefix: &str) -> Result<Vec<String>>;

    /// Publicly shareable URL for an object
    fn public_url(&self, key: &str) -> String;

    /// Get the backend name
    fn name(&self) -> &str;
}

/// Build the configured storage backend
pub fn store_from_config(config: &AppConfig) -> Result<Arc<dyn ObjectStore>> {
    match config.storage.backend.as_str() {
        "local" => Ok(Arc::new(LocalStore::new(&config.storage.root))),
        "gcs" => Ok(Arc::new(
            GcsStore::new(&config.storage.bucket).with_token(config.storage_token()),
        )),
        other => Err(Error::Config(format!(
            "unknown storage backend '{}'",
            other
        ))),
    }
}

/// Content type for an artifact key, by extension
pub fn content_type_for(key: &str) -> &'static str {
    match key.rsplit('.').next() {
        Some("csv") => "text/csv",
        Some("svg") => "image/svg+xml",
        Some("json") => "application/json",
        _ => "application/octet-stream",
    }
}

/// Percent-encode a key for use in URLs
///
/// With `keep_slash` the key stays a path ('/' literal, for public URLs);
/// without it the whole key becomes one path segment ('/' as %2F, as the
/// JSON API's object resource path requires).
fn percent_encode(key: &str, keep_slash: bool) -> String {
    let mut out = String::with_capacity(key.len());
    for byte in key.bytes() {
        let keep = byte.is_ascii_alphanumeric()
            || matches!(byte, b'-' | b'_' | b'.' | b'~')
            || (keep_slash && byte == b'/');
        if keep {
            out.push(byte as char);
        } else {
            out.push_str(&format!("%{:02X}", byte));
        }
    }
    out
}

/// Filesystem-backed store rooted at a directory
pub struct LocalStore {
    root: PathBuf,
}

impl LocalStore {
    pub fn new(root: impl AsRef<Path>) -> Self {
        Self {
            root: root.as_ref().to_path_buf(),
        }
    }

    fn path_for(&self, key: &str) -> PathBuf {
        let mut path = self.root.clone();
        for part in key.split('/').filter(|p| !p.is_empty() && *p != "..") {
            path.push(part);
        }
        path
    }

    fn key_for(&self, path: &Path) -> Option<String> {
        let rel = path.strip_prefix(&self.root).ok()?;
        let parts: Vec<String> = rel
            .components()
            .map(|c| c.as_os_str().to_string_lossy().into_owned())
            .collect();
        Some(parts.join("/"))
    }
}

#[async_trait]
impl ObjectStore for LocalStore {
    async fn get(&self, key: &str) -> Result<Vec<u8>> {
        match tokio::fs::read(self.path_for(key)).await {
            Ok(bytes) => Ok(bytes),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                Err(Error::NotFound(key.to_string()))
            }
            Err(e) => Err(e.into()),
        }
    }

    async fn put(&self, key: &str, bytes: Vec<u8>, _content_type: &str) -> Result<()> {
        let path = self.path_for(key);
        if let Some(parent) = path.parent() {
            tokio::fs::create_dir_all(parent).await?;
        }
        tokio::fs::write(&path, bytes).await?;
        debug!(key, "wrote local object");
        Ok(())
    }

    async fn list(&self, prefix: &str) -> Result<Vec<String>> {
        // walk the deepest directory the prefix fully names, then filter
        let dir_part = match prefix.rfind('/') {
            Some(idx) => &prefix[..idx],
            None => "",
        };
        let mut stack = vec![self.path_for(dir_part)];
        let mut keys = Vec::new();

        while let Some(dir) = stack.pop() {
            let mut entries = match tokio::fs::read_dir(&dir).await {
                Ok(entries) => entries,
                Err(e) if e.kind() == std::io::ErrorKind::NotFound => continue,
                Err(e) => return Err(e.into()),
            };
            while let Some(entry) = entries.next_entry().await? {
                let path = entry.path();
                if entry.file_type().await?.is_dir() {
                    stack.push(path);
                } else if let Some(key) = self.key_for(&path) {
                    if key.starts_with(prefix) {
                        keys.push(key);
                    }
                }
            }
        }

        keys.sort();
        Ok(keys)
    }

    fn public_url(&self, key: &str) -> String {
        format!(
            "file://{}/{}",
            self.root.display(),
            percent_encode(key, true)
        )
    }

    fn name(&self) -> &str {
        "local"
    }
}

/// Google Cloud Storage backend over the JSON API
pub struct GcsStore {
    bucket: String,
    token: Option<String>,
    client: reqwest::Client,
    base_url: String,
    max_retries: u32,
}

const RETRY_BASE_MS: u64 = 500;

#[derive(Debug, Deserialize)]
struct ListResponse {
    #[serde(default)]
    items: Vec<ListItem>,
    #[serde(rename = "nextPageToken")]
    next_page_token: Option<String>,
}

#[derive(Debug, Deserialize)]
struct ListItem {
    name: String,
}

impl GcsStore {
    pub fn new(bucket: &str) -> Self {
        Self {
            bucket: bucket.to_string(),
            token: None,
            client: reqwest::Client::new(),
            base_url: "https://storage.googleapis.com".to_string(),
            max_retries: 3,
        }
    }

    /// Set the bearer token; public buckets work without one
    pub fn with_token(mut self, token: Option<String>) -> Self {
        self.token = token;
        self
    }

    /// Point at a different API host, e.g. a storage emulator
    pub fn with_base_url(mut self, base_url: &str) -> Self {
        self.base_url = base_url.trim_end_matches('/').to_string();
        self
    }

    pub fn with_max_retries(mut self, max_retries: u32) -> Self {
        self.max_retries = max_retries.max(1);
        self
    }

    fn object_url(&self, key: &str) -> String {
        format!(
            "{}/storage/v1/b/{}/o/{}",
            self.base_url,
            self.bucket,
            percent_encode(key, false)
        )
    }

    fn list_url(&self) -> String {
        format!("{}/storage/v1/b/{}/o", self.base_url, self.bucket)
    }

    fn upload_url(&self) -> String {
        format!(
            "{}/upload/storage/v1/b/{}/o",
            self.base_url, self.bucket
        )
    }

    fn authorize(&self, request: reqwest::RequestBuilder) -> reqwest::RequestBuilder {
        match &self.token {
            Some(token) => request.header("Authorization", format!("Bearer {}", token)),
            None => request,
        }
    }

    /// Map an unsuccessful response to an error, classifying retryability
    async fn api_error(key: &str, response: reqwest::Response) -> Error {
        let status = response.status();
        if status.as_u16() == 404 {
            return Error::NotFound(key.to_string());
        }
        if status.as_u16() == 429 {
            return Error::RateLimit {
                retry_after_secs: 5,
            };
        }
        if status.is_server_error() {
            return Error::Storage(format!("{} for '{}'", status, key));
        }
        let body = response.text().await.unwrap_or_default();
        Error::Api(format!("{} for '{}': {}", status, key, body))
    }

    async fn with_retry<T, F, Fut>(&self, operation: F) -> Result<T>
    where
        F: Fn() -> Fut,
        Fut: std::future::Future<Output = Result<T>>,
    {
        let mut attempt = 0;
        loop {
            match operation().await {
                Ok(value) => return Ok(value),
                Err(e) if e.is_retryable() && attempt + 1 < self.max_retries => {
                    let backoff = Duration::from_millis(RETRY_BASE_MS << attempt);
                    warn!(attempt, error = %e, "storage request failed, retrying");
                    tokio::time::sleep(backoff).await;
                    attempt += 1;
                }
                Err(e) => return Err(e),
            }
        }
    }
}

#[async_trait]
impl ObjectStore for GcsStore {
    async fn get(&self, key: &str) -> Result<Vec<u8>> {
        self.with_retry(|| async move {
            let response = self
                .authorize(self.client.get(self.object_url(key)))
                .query(&[("alt", "media")])
                .send()
                .await?;
            if !response.status().is_success() {
                return Err(Self::api_error(key, response).await);
            }
            Ok(response.bytes().await?.to_vec())
        })
        .await
    }

    async fn put(&self, key: &str, bytes: Vec<u8>, content_type: &str) -> Result<()> {
        self.with_retry(|| {
            let bytes = bytes.clone();
            async move {
                let response = self
                    .authorize(self.client.post(self.upload_url()))
                    .query(&[("uploadType", "media"), ("name", key)])
                    .header("Content-Type", content_type)
                    .body(bytes)
                    .send()
                    .await?;
                if !response.status().is_success() {
                    return Err(Self::api_error(key, response).await);
                }
                debug!(key, "uploaded object");
                Ok(())
            }
        })
        .await
    }

    async fn list(&self, prefix: &str) -> Result<Vec<String>> {
        let mut keys = Vec::new();
        let mut page_token: Option<String> = None;

        loop {
            let token = page_token.clone();
            let page: ListResponse = self
                .with_retry(|| {
                    let token = token.clone();
                    async move {
                        let mut query = vec![("prefix".to_string(), prefix.to_string())];
                        if let Some(t) = token {
                            query.push(("pageToken".to_string(), t));
                        }
                        let response = self
                            .authorize(self.client.get(self.list_url()))
                            .query(&query)
                            .send()
                            .await?;
                        if !response.status().is_success() {
                            return Err(Self::api_error(prefix, response).await);
                        }
                        Ok(response.json().await?)
                    }
                })
                .await?;

            keys.extend(page.items.into_iter().map(|i| i.name));
            match page.next_page_token {
                Some(token) => page_token = Some(token),
                None => break,
            }
        }

        keys.sort();
        Ok(keys)
    }

    fn public_url(&self, key: &str) -> String {
        format!(
            "https://storage.googleapis.com/{}/{}",
            self.bucket,
            percent_encode(key, true)
        )
    }

    fn name(&self) -> &str {
        "gcs"
    }
}
