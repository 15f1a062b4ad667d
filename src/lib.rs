//! # lfs-batch-server
//!
//! Server side of the Git LFS Batch API.
//!
//! This crate provides:
//! - Strict validation of batch request bodies
//! - Concurrent per-object URL resolution behind the [`UrlIssuer`] trait
//! - GCS and local-disk issuers
//! - An axum router exposing `POST /batch`
//!
//! ## Example
//!
//! ```no_run
//! use std::sync::Arc;
//! use lfs_batch_server::{create_router, AppState, GcsIssuer};
//!
//! # async fn run() -> Result<(), Box<dyn std::error::Error>> {
//! let issuer = GcsIssuer::new("git-lfs")?;
//! let app = create_router(AppState::new(Arc::new(issuer)));
//!
//! let listener = tokio::net::TcpListener::bind("0.0.0.0:3000").await?;
//! axum::serve(listener, app).await?;
//! # Ok(())
//! # }
//! ```

mod error;
mod oid;

pub mod backends;
pub mod batch;
pub mod config;
pub mod issuer;
pub mod resolve;
pub mod server;
pub mod validate;

pub use backends::{GcsIssuer, LocalIssuer};
pub use batch::{
    Action, AuthenticatedUrl, BatchRequest, BatchRequestObject, BatchResponse, HashAlgo,
    ObjectError, ObjectResult, Operation, RefInfo,
};
pub use config::Config;
pub use error::{Error, ErrorResponse, Result};
pub use issuer::UrlIssuer;
pub use oid::Oid;
pub use resolve::resolve;
pub use server::{create_router, AppState, LFS_MEDIA_TYPE};
pub use validate::validate;
