//! Batch resolution: one issuer call per object, results in request order.

use futures::future::join_all;

use crate::batch::{BatchRequest, BatchRequestObject, BatchResponse, ObjectResult, Operation};
use crate::issuer::UrlIssuer;
use crate::{Error, Result};

/// Resolve every object in `request` against `issuer`.
///
/// Missing objects become per-object 404 results and OIDs the issuer cannot
/// store become per-object 422 results. Any issuer error fails the whole
/// batch as [`Error::Backend`]; sibling calls still run to completion.
pub async fn resolve(request: &BatchRequest, issuer: &dyn UrlIssuer) -> Result<BatchResponse> {
    tracing::debug!(
        operation = %request.operation,
        objects = request.objects.len(),
        "resolving batch"
    );

    let lookups = request
        .objects
        .iter()
        .map(|object| resolve_object(request.operation, object, issuer));

    let objects = join_all(lookups)
        .await
        .into_iter()
        .collect::<Result<Vec<_>>>()?;

    Ok(BatchResponse::basic(objects))
}

async fn resolve_object(
    operation: Operation,
    object: &BatchRequestObject,
    issuer: &dyn UrlIssuer,
) -> Result<ObjectResult> {
    if !issuer.accepts_oid(&object.oid) {
        tracing::debug!(oid = %object.oid, "object ID rejected by backend");
        return Ok(ObjectResult::invalid_oid(object));
    }

    let url = match operation {
        Operation::Download => issuer.get_download_url(&object.oid).await,
        Operation::Upload => issuer.get_upload_url(&object.oid).await.map(Some),
    }
    .map_err(|e| Error::Backend(format!("{} {}: {}", operation, object.oid, e)))?;

    Ok(match url {
        Some(url) => ObjectResult::ready(operation, object, url),
        None => {
            tracing::debug!(oid = %object.oid, "object not found");
            ObjectResult::not_found(object)
        }
    })
}
