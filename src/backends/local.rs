//! Local-disk backend issuing HMAC-signed URLs.
//!
//! Objects live under a root directory in the git-lfs standard layout:
//! `<root>/<oid[0:2]>/<oid[2:4]>/<oid>`. Issued URLs point at whatever file
//! server fronts that directory, which checks them with [`LocalIssuer::verify`].

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use hmac::{Hmac, Mac};
use sha2::Sha256;
use std::io;
use std::path::{Path, PathBuf};
use std::time::Duration;
use url::Url;

use crate::batch::{AuthenticatedUrl, Operation};
use crate::issuer::UrlIssuer;
use crate::{Error, Oid, Result};

type HmacSha256 = Hmac<Sha256>;

/// Issuer for objects stored on the local filesystem.
pub struct LocalIssuer {
    root: PathBuf,
    base_url: Url,
    key: Vec<u8>,
    ttl: Duration,
}

impl LocalIssuer {
    /// Create an issuer for objects under `root`, served from `base_url`.
    pub fn new<P: AsRef<Path>>(root: P, base_url: Url, key: &[u8], ttl: Duration) -> Result<Self> {
        if key.is_empty() {
            return Err(Error::Config("signing key must not be empty".into()));
        }
        if base_url.cannot_be_a_base() {
            return Err(Error::Config(format!("base URL {} cannot be a base", base_url)));
        }

        // Joining relative paths onto the base needs a trailing slash.
        let mut base_url = base_url;
        if !base_url.path().ends_with('/') {
            let path = format!("{}/", base_url.path());
            base_url.set_path(&path);
        }

        Ok(LocalIssuer {
            root: root.as_ref().to_path_buf(),
            base_url,
            key: key.to_vec(),
            ttl,
        })
    }

    /// Get the path where an object with the given OID would be stored.
    pub fn object_path(&self, oid: &Oid) -> PathBuf {
        self.root.join(oid.shard_path())
    }

    /// Sign a URL for `operation` on `oid`, valid for the configured TTL from `now`.
    pub fn sign_at(&self, operation: Operation, oid: &Oid, now: DateTime<Utc>) -> Result<AuthenticatedUrl> {
        let ttl = chrono::Duration::from_std(self.ttl)
            .map_err(|e| Error::Config(format!("URL TTL out of range: {}", e)))?;
        let expires_at = now + ttl;
        let expires = expires_at.timestamp();
        let signature = hex::encode(self.mac(operation, oid, expires)?.finalize().into_bytes());

        let mut href = self.base_url.join(&format!("objects/{}", oid))?;
        href.query_pairs_mut()
            .append_pair("op", operation.as_str())
            .append_pair("expires", &expires.to_string())
            .append_pair("signature", &signature);

        Ok(AuthenticatedUrl::new(href, expires_at))
    }

    /// Check a signature presented with a previously issued URL.
    pub fn verify(
        &self,
        operation: Operation,
        oid: &Oid,
        expires: i64,
        signature: &str,
        now: DateTime<Utc>,
    ) -> bool {
        if now.timestamp() > expires {
            return false;
        }
        let Ok(signature) = hex::decode(signature) else {
            return false;
        };
        match self.mac(operation, oid, expires) {
            Ok(mac) => mac.verify_slice(&signature).is_ok(),
            Err(_) => false,
        }
    }

    /// MAC over `"<op>\n<oid>\n<expires>"`, ready to finalize or verify.
    fn mac(&self, operation: Operation, oid: &Oid, expires: i64) -> Result<HmacSha256> {
        let mut mac = HmacSha256::new_from_slice(&self.key)
            .map_err(|e| Error::Config(format!("invalid signing key: {}", e)))?;
        mac.update(format!("{}\n{}\n{}", operation, oid, expires).as_bytes());
        Ok(mac)
    }
}

#[async_trait]
impl UrlIssuer for LocalIssuer {
    async fn get_download_url(&self, oid: &str) -> Result<Option<AuthenticatedUrl>> {
        // A non-hex OID cannot name anything on disk.
        let Ok(oid) = Oid::from_hex(oid) else {
            return Ok(None);
        };

        match tokio::fs::metadata(self.object_path(&oid)).await {
            Ok(meta) if meta.is_file() => {
                Ok(Some(self.sign_at(Operation::Download, &oid, Utc::now())?))
            }
            Ok(_) => Ok(None),
            Err(e) if e.kind() == io::ErrorKind::NotFound => Ok(None),
            Err(e) => Err(Error::Io(e)),
        }
    }

    async fn get_upload_url(&self, oid: &str) -> Result<AuthenticatedUrl> {
        let oid = Oid::from_hex(oid)?;
        self.sign_at(Operation::Upload, &oid, Utc::now())
    }

    /// Only canonical SHA-256 OIDs map onto the on-disk layout.
    fn accepts_oid(&self, oid: &str) -> bool {
        Oid::from_hex(oid).is_ok()
    }
}
