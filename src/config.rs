//! Application configuration
//!
//! Settings are loaded from a TOML or JSON file (chosen by extension) and
//! every field has a default, so a missing or partial file still yields a
//! usable configuration. Secrets are never stored in the file itself; the
//! config names the environment variables that hold them.

use std::env;
use std::fs;
use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::error::{Error, Result};
use crate::text::DEFAULT_CHUNK_SIZE;

/// Top-level application configuration
#[derive(Debug, Clone, Serialize, Deserialize, Default)]
#[serde(default)]
pub struct AppConfig {
    pub storage: StorageConfig,
    pub classifier: ClassifierConfig,
    pub pipeline: PipelineConfig,
    pub server: ServerConfig,
}

/// Object storage settings
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct StorageConfig {
    /// Storage backend: "local" or "gcs"
    pub backend: String,
    /// Bucket name for the gcs backend
    pub bucket: String,
    /// Root directory for the local backend
    pub root: String,
    /// Prefix for uploaded source tables
    pub input_prefix: String,
    /// Prefix for batch output folders
    pub output_prefix: String,
    /// Key of the keyword reference table, relative to `input_prefix`
    pub keywords_file: String,
    /// Environment variable holding the storage bearer token
    pub token_env: String,
}

impl Default for StorageConfig {
    fn default() -> Self {
        Self {
            backend: "local".to_string(),
            bucket: String::new(),
            root: "./data".to_string(),
            input_prefix: "for_processing".to_string(),
            output_prefix: "scores_magnitude".to_string(),
            keywords_file: "keywords.csv".to_string(),
            token_env: "STORAGE_TOKEN".to_string(),
        }
    }
}

/// Remote sentiment classifier settings
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ClassifierConfig {
    /// Inference endpoint URL
    pub endpoint: String,
    /// Environment variable holding the API token
    pub token_env: String,
    /// Request timeout in seconds
    pub timeout_secs: u64,
    /// Maximum retry attempts for retryable failures
    pub max_retries: u32,
}

impl Default for ClassifierConfig {
    fn default() -> Self {
        Self {
            endpoint: "http://localhost:8500/v1/classify".to_string(),
            token_env: "CLASSIFIER_TOKEN".to_string(),
            timeout_secs: 30,
            max_retries: 3,
        }
    }
}

/// Pipeline settings
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct PipelineConfig {
    /// Chunk size in characters for splitting matched paragraphs
    pub chunk_size: usize,
}

impl Default for PipelineConfig {
    fn default() -> Self {
        Self {
            chunk_size: DEFAULT_CHUNK_SIZE,
        }
    }
}

/// Web server settings
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ServerConfig {
    pub host: String,
    pub port: u16,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: "127.0.0.1".to_string(),
            port: 8080,
        }
    }
}

impl AppConfig {
    /// Load configuration from a TOML or JSON file, chosen by extension
    pub fn load(path: &Path) -> Result<Self> {
        let content = fs::read_to_string(path)
            .map_err(|e| Error::Config(format!("cannot read {}: {}", path.display(), e)))?;

        let config: AppConfig = match path.extension().and_then(|e| e.to_str()) {
            Some("toml") => toml::from_str(&content)
                .map_err(|e| Error::Config(format!("invalid TOML in {}: {}", path.display(), e)))?,
            Some("json") => serde_json::from_str(&content)
                .map_err(|e| Error::Config(format!("invalid JSON in {}: {}", path.display(), e)))?,
            other => {
                return Err(Error::Config(format!(
                    "unsupported config extension {:?} for {}",
                    other,
                    path.display()
                )))
            }
        };

        config.validate()?;
        Ok(config)
    }

    /// Check settings that a default-filled file can still get wrong
    pub fn validate(&self) -> Result<()> {
        if self.pipeline.chunk_size == 0 {
            return Err(Error::Config("pipeline.chunk_size must be positive".into()));
        }
        match self.storage.backend.as_str() {
            "local" => {}
            "gcs" => {
                if self.storage.bucket.is_empty() {
                    return Err(Error::Config(
                        "storage.bucket is required for the gcs backend".into(),
                    ));
                }
            }
            other => {
                return Err(Error::Config(format!(
                    "unknown storage backend '{}', expected 'local' or 'gcs'",
                    other
                )))
            }
        }
        Ok(())
    }

    /// Resolve the classifier API token from the configured env var
    pub fn classifier_token(&self) -> Option<String> {
        env::var(&self.classifier.token_env).ok()
    }

    /// Resolve the storage bearer token from the configured env var
    pub fn storage_token(&self) -> Option<String> {
        env::var(&self.storage.token_env).ok()
    }

    /// Key of the keyword reference table in storage
    pub fn keywords_key(&self) -> String {
        format!("{}/{}", self.storage.input_prefix, self.storage.keywords_file)
    }

    /// Key of a batch's source table in storage
    pub fn input_key(&self, batch: &str) -> String {
        format!("{}/{}.csv", self.storage.input_prefix, batch)
    }

    /// Storage prefix of a batch's output folder
    pub fn batch_prefix(&self, batch: &str) -> String {
        format!("{}/{}", self.storage.output_prefix, batch)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    #[test]
    fn test_default_config_is_valid() {
        let config = AppConfig::default();
        assert!(config.validate().is_ok());
        assert_eq!(config.pipeline.chunk_size, DEFAULT_CHUNK_SIZE);
        assert_eq!(config.pipeline.chunk_size, 1024);
        assert_eq!(config.storage.output_prefix, "scores_magnitude");
    }

    #[test]
    fn test_load_toml() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("config.toml");
        let mut file = fs::File::create(&path).unwrap();
        writeln!(
            file,
            r#"
[storage]
backend = "gcs"
bucket = "earnings-reports"

[pipeline]
chunk_size = 512
"#
        )
        .unwrap();

        let config = AppConfig::load(&path).unwrap();
        assert_eq!(config.storage.backend, "gcs");
        assert_eq!(config.storage.bucket, "earnings-reports");
        assert_eq!(config.pipeline.chunk_size, 512);
        // untouched sections keep their defaults
        assert_eq!(config.server.port, 8080);
    }

    #[test]
    fn test_load_json() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("config.json");
        fs::write(&path, r#"{"server": {"port": 9000}}"#).unwrap();

        let config = AppConfig::load(&path).unwrap();
        assert_eq!(config.server.port, 9000);
        assert_eq!(config.storage.backend, "local");
    }

    #[test]
    fn test_rejects_unknown_extension() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("config.yaml");
        fs::write(&path, "storage: {}").unwrap();
        assert!(AppConfig::load(&path).is_err());
    }

    #[test]
    fn test_validate_rejects_zero_chunk_size() {
        let mut config = AppConfig::default();
        config.pipeline.chunk_size = 0;
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_validate_requires_bucket_for_gcs() {
        let mut config = AppConfig::default();
        config.storage.backend = "gcs".to_string();
        assert!(config.validate().is_err());
        config.storage.bucket = "reports".to_string();
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_key_helpers() {
        let config = AppConfig::default();
        assert_eq!(config.keywords_key(), "for_processing/keywords.csv");
        assert_eq!(config.input_key("q1_calls"), "for_processing/q1_calls.csv");
        assert_eq!(config.batch_prefix("q1_calls"), "scores_magnitude/q1_calls");
    }
}
