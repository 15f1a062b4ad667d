//! Concrete [`UrlIssuer`](crate::UrlIssuer) backends.

pub mod gcs;
pub mod local;

pub use gcs::GcsIssuer;
pub use local::LocalIssuer;

use std::time::Duration;

/// Default lifetime of an issued URL.
pub const DEFAULT_URL_TTL: Duration = Duration::from_secs(60 * 60 * 24);
