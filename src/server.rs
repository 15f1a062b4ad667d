//! HTTP surface for the batch API.

use axum::extract::State;
use axum::http::header;
use axum::response::IntoResponse;
use axum::routing::{get, post};
use axum::{Json, Router};
use serde_json::Value;
use std::sync::Arc;
use tower_http::trace::TraceLayer;

use crate::issuer::UrlIssuer;
use crate::{resolve, validate, Result};

/// Media type of Git LFS API payloads.
pub const LFS_MEDIA_TYPE: &str = "application/vnd.git-lfs+json";

/// Shared handler state.
#[derive(Clone)]
pub struct AppState {
    pub issuer: Arc<dyn UrlIssuer>,
}

impl AppState {
    pub fn new(issuer: Arc<dyn UrlIssuer>) -> Self {
        AppState { issuer }
    }
}

/// Create the application router.
///
/// `/objects/batch` is where Git LFS clients post when the server is
/// configured as `<remote>/info/lfs`; `/batch` serves clients pointed
/// directly at this service.
pub fn create_router(state: AppState) -> Router {
    Router::new()
        .route("/batch", post(batch))
        .route("/objects/batch", post(batch))
        .route("/health", get(health))
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}

/// `POST /batch`
///
/// Both `application/json` and `application/vnd.git-lfs+json` bodies are
/// accepted; the `Json` extractor takes any `+json` media type.
async fn batch(State(state): State<AppState>, Json(body): Json<Value>) -> Result<impl IntoResponse> {
    let request = validate(&body)?;
    let response = resolve(&request, state.issuer.as_ref()).await?;

    tracing::info!(
        operation = %request.operation,
        objects = response.objects.len(),
        "batch resolved"
    );

    Ok(([(header::CONTENT_TYPE, LFS_MEDIA_TYPE)], Json(response)))
}

async fn health() -> &'static str {
    "ok"
}
