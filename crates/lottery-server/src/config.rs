//! Configuration for the intake service.

use anyhow::{bail, Context, Result};
use serde::Deserialize;
use std::net::{IpAddr, SocketAddr};
use std::path::PathBuf;
use submission_store::Storage;

/// Service configuration.
#[derive(Debug, Clone, Deserialize)]
pub struct Config {
    /// Server configuration
    #[serde(default)]
    pub server: ServerConfig,

    /// Upload storage configuration
    #[serde(default)]
    pub storage: StorageConfig,

    /// Receipt and ledger configuration
    #[serde(default)]
    pub submissions: SubmissionsConfig,

    /// Upload limits
    #[serde(default)]
    pub limits: LimitsConfig,

    /// Logging configuration
    #[serde(default)]
    pub log: LogConfig,
}

#[derive(Debug, Clone, Deserialize)]
pub struct ServerConfig {
    /// Server listen address
    #[serde(default = "default_listen_addr")]
    pub listen_addr: String,

    /// Server port
    #[serde(default = "default_port")]
    pub port: u16,

    /// Base URL clients reach this server under; used to build the
    /// absolute file links embedded in receipts.
    #[serde(default = "default_public_base_url")]
    pub public_base_url: String,
}

impl ServerConfig {
    /// Socket address to bind, from the configured listen address and port.
    pub fn socket_addr(&self) -> Result<SocketAddr> {
        let ip: IpAddr = self
            .listen_addr
            .parse()
            .with_context(|| format!("Invalid listen address: {}", self.listen_addr))?;
        Ok(SocketAddr::new(ip, self.port))
    }
}

/// Which upload storage backend to use.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum StorageBackend {
    Local,
    Remote,
}

#[derive(Debug, Clone, Deserialize)]
pub struct StorageConfig {
    /// Backend selection
    #[serde(default = "default_backend")]
    pub backend: StorageBackend,

    /// Directory uploads are written to (local backend)
    #[serde(default = "default_uploads_dir")]
    pub uploads_dir: PathBuf,

    /// Object store endpoint uploads are PUT to (remote backend)
    #[serde(default)]
    pub remote_endpoint: Option<String>,

    /// Public URL stored objects are reachable under (remote backend);
    /// defaults to the endpoint itself
    #[serde(default)]
    pub remote_public_url: Option<String>,

    /// Bearer token for the object store (remote backend)
    #[serde(default)]
    pub remote_token: Option<String>,
}

impl StorageConfig {
    /// Construct the configured storage backend.
    pub fn build(&self) -> Result<Storage> {
        match self.backend {
            StorageBackend::Local => Ok(Storage::local(self.uploads_dir.clone(), "/uploads")),
            StorageBackend::Remote => {
                let Some(endpoint) = self.remote_endpoint.clone() else {
                    bail!("storage.remote_endpoint is required for the remote backend");
                };
                let public_url = self
                    .remote_public_url
                    .clone()
                    .unwrap_or_else(|| endpoint.clone());
                Ok(Storage::remote(
                    endpoint,
                    public_url,
                    self.remote_token.clone(),
                ))
            }
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
pub struct SubmissionsConfig {
    /// Directory generated receipt PDFs are written to
    #[serde(default = "default_submissions_dir")]
    pub dir: PathBuf,

    /// Path to the CSV ledger
    #[serde(default = "default_ledger_path")]
    pub ledger_path: PathBuf,
}

#[derive(Debug, Clone, Deserialize)]
pub struct LimitsConfig {
    /// Maximum size of a single uploaded file, in bytes
    #[serde(default = "default_max_upload_bytes")]
    pub max_upload_bytes: usize,
}

#[derive(Debug, Clone, Deserialize)]
pub struct LogConfig {
    /// Log level
    #[serde(default = "default_log_level")]
    pub level: String,
}

// Default implementations
impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            listen_addr: default_listen_addr(),
            port: default_port(),
            public_base_url: default_public_base_url(),
        }
    }
}

impl Default for StorageConfig {
    fn default() -> Self {
        Self {
            backend: default_backend(),
            uploads_dir: default_uploads_dir(),
            remote_endpoint: None,
            remote_public_url: None,
            remote_token: None,
        }
    }
}

impl Default for SubmissionsConfig {
    fn default() -> Self {
        Self {
            dir: default_submissions_dir(),
            ledger_path: default_ledger_path(),
        }
    }
}

impl Default for LimitsConfig {
    fn default() -> Self {
        Self {
            max_upload_bytes: default_max_upload_bytes(),
        }
    }
}

impl Default for LogConfig {
    fn default() -> Self {
        Self {
            level: default_log_level(),
        }
    }
}

// Default value functions
fn default_listen_addr() -> String {
    "0.0.0.0".into()
}

fn default_port() -> u16 {
    4000
}

fn default_public_base_url() -> String {
    "http://localhost:4000".into()
}

fn default_backend() -> StorageBackend {
    StorageBackend::Local
}

fn default_uploads_dir() -> PathBuf {
    PathBuf::from("data/uploads")
}

fn default_submissions_dir() -> PathBuf {
    PathBuf::from("data/submissions")
}

fn default_ledger_path() -> PathBuf {
    PathBuf::from("data/submissions.csv")
}

fn default_max_upload_bytes() -> usize {
    5 * 1024 * 1024
}

fn default_log_level() -> String {
    "info".into()
}

impl Config {
    /// Load configuration from environment variables.
    pub fn load() -> Result<Self> {
        // Load .env file if present
        dotenvy::dotenv().ok();

        let config = config::Config::builder()
            .add_source(
                config::Environment::default()
                    .separator("__")
                    .try_parsing(false),
            )
            .build()
            .context("Failed to build configuration")?;

        config
            .try_deserialize()
            .context("Failed to deserialize configuration")
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        let config: Config = serde_json::from_str("{}").unwrap();
        assert_eq!(config.server.port, 4000);
        assert_eq!(config.storage.backend, StorageBackend::Local);
        assert_eq!(config.limits.max_upload_bytes, 5 * 1024 * 1024);
        assert_eq!(
            config.submissions.ledger_path,
            PathBuf::from("data/submissions.csv")
        );
    }

    #[test]
    fn test_socket_addr_from_listen_addr_and_port() {
        let server = ServerConfig {
            listen_addr: "127.0.0.1".into(),
            ..ServerConfig::default()
        };
        assert_eq!(
            server.socket_addr().unwrap(),
            "127.0.0.1:4000".parse().unwrap()
        );
    }

    #[test]
    fn test_malformed_listen_addr_rejected() {
        let server = ServerConfig {
            listen_addr: "not-an-address".into(),
            ..ServerConfig::default()
        };
        let err = server.socket_addr().unwrap_err();
        assert!(err.to_string().contains("not-an-address"));
    }

    #[test]
    fn test_remote_backend_requires_endpoint() {
        let storage = StorageConfig {
            backend: StorageBackend::Remote,
            ..StorageConfig::default()
        };
        assert!(storage.build().is_err());
    }

    #[test]
    fn test_remote_backend_with_endpoint() {
        let storage = StorageConfig {
            backend: StorageBackend::Remote,
            remote_endpoint: Some("http://store:9000/bucket".into()),
            ..StorageConfig::default()
        };
        let built = storage.build().unwrap();
        assert!(built.local_dir().is_none());
    }
}
