//! Google Cloud Storage backend.
//!
//! Issues object URLs on a public bucket. Downloads resolve unconditionally
//! unless existence probing is enabled, in which case a `HEAD` on the object
//! decides between a URL and a 404 result.

use async_trait::async_trait;
use chrono::Utc;
use std::time::Duration;
use url::Url;

use crate::batch::AuthenticatedUrl;
use crate::issuer::UrlIssuer;
use crate::{Error, Result};

use super::DEFAULT_URL_TTL;

/// Public endpoint for GCS object URLs.
pub const GCS_ENDPOINT: &str = "https://storage.googleapis.com/";

const PROBE_TIMEOUT: Duration = Duration::from_secs(10);

/// Issuer for objects in a GCS bucket.
#[derive(Clone)]
pub struct GcsIssuer {
    endpoint: Url,
    bucket: String,
    prefix: String,
    ttl: Duration,
    /// HTTP agent for existence probes, if enabled.
    probe: Option<ureq::Agent>,
}

impl GcsIssuer {
    /// Create an issuer for `bucket` with a 24 hour URL lifetime and no probing.
    pub fn new(bucket: &str) -> Result<Self> {
        if bucket.is_empty() || bucket.contains('/') {
            return Err(Error::Config(format!("invalid bucket name: {:?}", bucket)));
        }
        Ok(GcsIssuer {
            endpoint: Url::parse(GCS_ENDPOINT)?,
            bucket: bucket.to_string(),
            prefix: String::new(),
            ttl: DEFAULT_URL_TTL,
            probe: None,
        })
    }

    /// Use a different storage endpoint (emulators, proxies).
    pub fn with_endpoint(mut self, endpoint: Url) -> Result<Self> {
        if endpoint.cannot_be_a_base() {
            return Err(Error::Config(format!("endpoint {} cannot be a base", endpoint)));
        }
        self.endpoint = endpoint;
        Ok(self)
    }

    /// Store objects under `prefix` within the bucket (e.g., "lfs/objects").
    pub fn with_prefix(mut self, prefix: &str) -> Self {
        self.prefix = prefix.trim_matches('/').to_string();
        self
    }

    pub fn with_ttl(mut self, ttl: Duration) -> Self {
        self.ttl = ttl;
        self
    }

    /// Check that objects exist before issuing download URLs.
    pub fn with_existence_probe(mut self) -> Self {
        self.probe = Some(ureq::AgentBuilder::new().timeout(PROBE_TIMEOUT).build());
        self
    }

    /// URL of the object named by `oid`. The OID is percent-encoded as a
    /// single path segment.
    pub fn object_url(&self, oid: &str) -> Result<Url> {
        let mut url = self.endpoint.clone();
        {
            let mut segments = url
                .path_segments_mut()
                .map_err(|_| Error::Config(format!("endpoint {} cannot be a base", self.endpoint)))?;
            segments.pop_if_empty().push(&self.bucket);
            segments.extend(self.prefix.split('/').filter(|s| !s.is_empty()));
            segments.push(oid);
        }
        Ok(url)
    }

    fn authenticated(&self, url: Url) -> Result<AuthenticatedUrl> {
        let ttl = chrono::Duration::from_std(self.ttl)
            .map_err(|e| Error::Config(format!("URL TTL out of range: {}", e)))?;
        Ok(AuthenticatedUrl::new(url, Utc::now() + ttl))
    }

    async fn exists(&self, agent: &ureq::Agent, url: &Url) -> Result<bool> {
        let agent = agent.clone();
        let target = url.to_string();

        tokio::task::spawn_blocking(move || match agent.head(&target).call() {
            Ok(_) => Ok(true),
            Err(ureq::Error::Status(404, _)) => Ok(false),
            Err(e) => Err(Error::from(e)),
        })
        .await
        .map_err(|e| Error::Backend(format!("existence probe did not complete: {}", e)))?
    }
}

#[async_trait]
impl UrlIssuer for GcsIssuer {
    async fn get_download_url(&self, oid: &str) -> Result<Option<AuthenticatedUrl>> {
        let url = self.object_url(oid)?;

        if let Some(agent) = &self.probe {
            if !self.exists(agent, &url).await? {
                return Ok(None);
            }
        }

        self.authenticated(url).map(Some)
    }

    async fn get_upload_url(&self, oid: &str) -> Result<AuthenticatedUrl> {
        let url = self.object_url(oid)?;
        self.authenticated(url)
    }
}
