//! The URL-issuing capability the batch resolver is generic over.

use async_trait::async_trait;

use crate::batch::AuthenticatedUrl;
use crate::Result;

/// Issues time-limited transfer URLs for objects.
///
/// Implementations own any connection pooling, timeouts and retries. The
/// resolver calls one method per object, concurrently, and never cancels a
/// call once started.
#[async_trait]
pub trait UrlIssuer: Send + Sync {
    /// URL for downloading `oid`, or `None` if the object does not exist.
    async fn get_download_url(&self, oid: &str) -> Result<Option<AuthenticatedUrl>>;

    /// URL for uploading `oid`. The target location may not exist yet.
    async fn get_upload_url(&self, oid: &str) -> Result<AuthenticatedUrl>;

    /// Whether `oid` can name an object in this store at all.
    ///
    /// The resolver never asks for a URL for a rejected OID; the object gets
    /// a per-object 422 result instead.
    fn accepts_oid(&self, _oid: &str) -> bool {
        true
    }
}
