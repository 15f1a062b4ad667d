//! Shared helpers for HTTP-level tests.
//!
//! Each test binary compiles this module separately and uses a subset of it.
#![allow(dead_code)]

use async_trait::async_trait;
use axum::body::Body;
use axum::http::{Request, StatusCode};
use chrono::{DateTime, Utc};
use lfs_batch_server::{create_router, AppState, AuthenticatedUrl, Error, Result, UrlIssuer};
use serde_json::Value;
use std::collections::HashMap;
use std::sync::{Arc, Mutex};
use tower::ServiceExt;

pub fn at(rfc3339: &str) -> DateTime<Utc> {
    DateTime::parse_from_rfc3339(rfc3339)
        .unwrap()
        .with_timezone(&Utc)
}

/// Which issuer method was called, and with what OID.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Call {
    Download(String),
    Upload(String),
}

/// Issuer answering from fixed tables and recording every call.
///
/// Download OIDs without an entry resolve to "not found"; upload OIDs without
/// an entry, and any OID in `failing`, produce a backend error.
#[derive(Default)]
pub struct MockIssuer {
    downloads: HashMap<String, AuthenticatedUrl>,
    uploads: HashMap<String, AuthenticatedUrl>,
    failing: Vec<String>,
    calls: Mutex<Vec<Call>>,
}

impl MockIssuer {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn download(mut self, oid: &str, href: &str, expires_at: &str) -> Self {
        self.downloads
            .insert(oid.to_string(), AuthenticatedUrl::new(href, at(expires_at)));
        self
    }

    pub fn upload(mut self, oid: &str, href: &str, expires_at: &str) -> Self {
        self.uploads
            .insert(oid.to_string(), AuthenticatedUrl::new(href, at(expires_at)));
        self
    }

    pub fn failing(mut self, oid: &str) -> Self {
        self.failing.push(oid.to_string());
        self
    }

    pub fn calls(&self) -> Vec<Call> {
        self.calls.lock().unwrap().clone()
    }

    fn check_failing(&self, oid: &str) -> Result<()> {
        if self.failing.iter().any(|f| f == oid) {
            return Err(Error::Http(format!("storage exploded on {}", oid)));
        }
        Ok(())
    }
}

#[async_trait]
impl UrlIssuer for MockIssuer {
    async fn get_download_url(&self, oid: &str) -> Result<Option<AuthenticatedUrl>> {
        self.calls.lock().unwrap().push(Call::Download(oid.to_string()));
        self.check_failing(oid)?;
        Ok(self.downloads.get(oid).cloned())
    }

    async fn get_upload_url(&self, oid: &str) -> Result<AuthenticatedUrl> {
        self.calls.lock().unwrap().push(Call::Upload(oid.to_string()));
        self.check_failing(oid)?;
        self.uploads
            .get(oid)
            .cloned()
            .ok_or_else(|| Error::Backend(format!("no upload scripted for {}", oid)))
    }
}

/// A router wired to a shared issuer.
pub struct TestServer<I> {
    pub router: axum::Router,
    pub issuer: Arc<I>,
}

impl<I: UrlIssuer + 'static> TestServer<I> {
    pub fn new(issuer: I) -> Self {
        let issuer = Arc::new(issuer);
        let router = create_router(AppState::new(issuer.clone()));
        TestServer { router, issuer }
    }

    /// POST `body` to `uri` with the given content type.
    pub async fn post(&self, uri: &str, content_type: &str, body: Vec<u8>) -> Response {
        let request = Request::builder()
            .method("POST")
            .uri(uri)
            .header("Content-Type", content_type)
            .header("Accept", "application/vnd.git-lfs+json")
            .body(Body::from(body))
            .unwrap();
        self.send(request).await
    }

    /// POST a JSON batch body to `/batch` the way git-lfs does.
    pub async fn batch(&self, body: Value) -> Response {
        self.post(
            "/batch",
            "application/vnd.git-lfs+json",
            serde_json::to_vec(&body).unwrap(),
        )
        .await
    }

    pub async fn send(&self, request: Request<Body>) -> Response {
        let response = self.router.clone().oneshot(request).await.unwrap();

        let status = response.status();
        let content_type = response
            .headers()
            .get("Content-Type")
            .map(|v| v.to_str().unwrap().to_string());
        let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
            .await
            .unwrap();

        Response {
            status,
            content_type,
            body: bytes.to_vec(),
        }
    }
}

pub struct Response {
    pub status: StatusCode,
    pub content_type: Option<String>,
    pub body: Vec<u8>,
}

impl Response {
    pub fn json(&self) -> Value {
        serde_json::from_slice(&self.body).unwrap()
    }
}
