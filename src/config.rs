//! Process configuration from command-line flags and `LFS_BATCH_*` variables.

use clap::{Parser, ValueEnum};
use std::net::SocketAddr;
use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;
use url::Url;

use crate::backends::{GcsIssuer, LocalIssuer};
use crate::issuer::UrlIssuer;
use crate::{Error, Result};

/// Git LFS batch API server
#[derive(Parser, Debug, Clone)]
#[command(name = "lfs-batchd")]
#[command(version, about, long_about = None)]
pub struct Config {
    /// Address to listen on
    #[arg(long, env = "LFS_BATCH_BIND", default_value = "0.0.0.0:3000")]
    pub bind: SocketAddr,

    /// Storage backend issuing transfer URLs
    #[arg(long, env = "LFS_BATCH_BACKEND", value_enum, default_value_t = BackendKind::Gcs)]
    pub backend: BackendKind,

    /// GCS bucket holding LFS objects
    #[arg(long, env = "LFS_BATCH_BUCKET", default_value = "git-lfs")]
    pub bucket: String,

    /// Path prefix for objects within the bucket
    #[arg(long, env = "LFS_BATCH_PREFIX", default_value = "")]
    pub prefix: String,

    /// Probe the bucket before issuing download URLs
    #[arg(long, env = "LFS_BATCH_VERIFY_EXISTS")]
    pub verify_exists: bool,

    /// Object root directory (local backend)
    #[arg(long, env = "LFS_BATCH_ROOT")]
    pub root: Option<PathBuf>,

    /// Public URL the object root is served from (local backend)
    #[arg(long, env = "LFS_BATCH_BASE_URL")]
    pub base_url: Option<Url>,

    /// Key for signing URLs (local backend)
    #[arg(long, env = "LFS_BATCH_SIGNING_KEY", hide_env_values = true)]
    pub signing_key: Option<String>,

    /// Lifetime of issued URLs in seconds
    #[arg(long, env = "LFS_BATCH_URL_TTL_SECS", default_value_t = 86400)]
    pub url_ttl_secs: u64,

    /// Log output format
    #[arg(long, env = "LFS_BATCH_LOG_FORMAT", value_enum, default_value_t = LogFormat::Text)]
    pub log_format: LogFormat,
}

#[derive(ValueEnum, Debug, Clone, Copy, PartialEq, Eq)]
pub enum BackendKind {
    /// Google Cloud Storage bucket
    Gcs,
    /// Local directory with HMAC-signed URLs
    Local,
}

#[derive(ValueEnum, Debug, Clone, Copy, PartialEq, Eq)]
pub enum LogFormat {
    Text,
    Json,
}

impl Config {
    pub fn url_ttl(&self) -> Duration {
        Duration::from_secs(self.url_ttl_secs)
    }

    /// Build the configured URL issuer.
    pub fn build_issuer(&self) -> Result<Arc<dyn UrlIssuer>> {
        if self.url_ttl_secs == 0 {
            return Err(Error::Config("URL TTL must be positive".into()));
        }

        match self.backend {
            BackendKind::Gcs => {
                let mut issuer = GcsIssuer::new(&self.bucket)?
                    .with_prefix(&self.prefix)
                    .with_ttl(self.url_ttl());
                if self.verify_exists {
                    issuer = issuer.with_existence_probe();
                }
                Ok(Arc::new(issuer))
            }
            BackendKind::Local => {
                let root = self
                    .root
                    .as_ref()
                    .ok_or_else(|| Error::Config("local backend requires --root".into()))?;
                let base_url = self
                    .base_url
                    .clone()
                    .ok_or_else(|| Error::Config("local backend requires --base-url".into()))?;
                let key = self
                    .signing_key
                    .as_ref()
                    .ok_or_else(|| Error::Config("local backend requires --signing-key".into()))?;

                let issuer = LocalIssuer::new(root, base_url, key.as_bytes(), self.url_ttl())?;
                Ok(Arc::new(issuer))
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        let config = Config::try_parse_from(["lfs-batchd"]).unwrap();

        assert_eq!(config.bind, "0.0.0.0:3000".parse::<SocketAddr>().unwrap());
        assert_eq!(config.backend, BackendKind::Gcs);
        assert_eq!(config.bucket, "git-lfs");
        assert_eq!(config.url_ttl(), Duration::from_secs(86400));
        assert_eq!(config.log_format, LogFormat::Text);
        assert!(!config.verify_exists);
        assert!(config.build_issuer().is_ok());
    }

    #[test]
    fn test_local_backend() {
        let config = Config::try_parse_from([
            "lfs-batchd",
            "--backend",
            "local",
            "--root",
            "/srv/lfs",
            "--base-url",
            "https://lfs.example.com/",
            "--signing-key",
            "secret",
        ])
        .unwrap();

        assert_eq!(config.backend, BackendKind::Local);
        assert!(config.build_issuer().is_ok());
    }

    #[test]
    fn test_local_backend_requires_settings() {
        let config =
            Config::try_parse_from(["lfs-batchd", "--backend", "local", "--root", "/srv/lfs"]).unwrap();

        match config.build_issuer() {
            Err(Error::Config(msg)) => assert!(msg.contains("--base-url")),
            Err(other) => panic!("unexpected error: {}", other),
            Ok(_) => panic!("expected configuration error"),
        }
    }

    #[test]
    fn test_zero_ttl_rejected() {
        let config = Config::try_parse_from(["lfs-batchd", "--url-ttl-secs", "0"]).unwrap();
        assert!(matches!(config.build_issuer(), Err(Error::Config(_))));
    }

    #[test]
    fn test_invalid_base_url() {
        assert!(Config::try_parse_from(["lfs-batchd", "--base-url", "not a url"]).is_err());
    }
}
