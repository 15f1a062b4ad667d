//! LFS Batch API types.
//!
//! The Batch API is used to request upload/download URLs for LFS objects.
//! See: https://github.com/git-lfs/git-lfs/blob/main/docs/api/batch.md

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;

/// The only transfer adapter this server speaks.
pub const BASIC_TRANSFER: &str = "basic";

/// Operation type for batch requests.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Operation {
    /// Download objects from the server.
    Download,
    /// Upload objects to the server.
    Upload,
}

impl Operation {
    pub fn as_str(&self) -> &'static str {
        match self {
            Operation::Download => "download",
            Operation::Upload => "upload",
        }
    }

    /// Parse the wire name of an operation. Case-sensitive.
    pub fn from_wire(name: &str) -> Option<Self> {
        match name {
            "download" => Some(Operation::Download),
            "upload" => Some(Operation::Upload),
            _ => None,
        }
    }
}

impl fmt::Display for Operation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Hash algorithms the server accepts for OIDs.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum HashAlgo {
    #[default]
    Sha256,
}

impl HashAlgo {
    pub fn as_str(&self) -> &'static str {
        match self {
            HashAlgo::Sha256 => "sha256",
        }
    }

    pub fn from_wire(name: &str) -> Option<Self> {
        match name {
            "sha256" => Some(HashAlgo::Sha256),
            _ => None,
        }
    }
}

/// A validated batch request from an LFS client.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BatchRequest {
    /// The operation to perform.
    pub operation: Operation,
    /// The transfer adapters the client supports.
    pub transfers: Vec<String>,
    /// Reference information (branch, etc).
    pub r#ref: Option<RefInfo>,
    /// The objects to operate on.
    pub objects: Vec<BatchRequestObject>,
    /// Hash algorithm the OIDs were computed with.
    pub hash_algo: HashAlgo,
}

/// Reference information for a batch request.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RefInfo {
    /// The reference name (e.g., "refs/heads/main").
    pub name: String,
}

/// An object in a batch request.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct BatchRequestObject {
    /// The OID of the object, opaque to the batch layer.
    pub oid: String,
    /// The size of the object in bytes, as claimed by the client.
    pub size: u64,
}

impl BatchRequestObject {
    /// Create a new batch request object.
    pub fn new(oid: &str, size: u64) -> Self {
        BatchRequestObject {
            oid: oid.to_string(),
            size,
        }
    }
}

/// A time-limited URL granting direct access to one storage location.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AuthenticatedUrl {
    pub href: String,
    pub expires_at: DateTime<Utc>,
}

impl AuthenticatedUrl {
    pub fn new(href: impl Into<String>, expires_at: DateTime<Utc>) -> Self {
        AuthenticatedUrl {
            href: href.into(),
            expires_at,
        }
    }
}

/// A batch response to an LFS client.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct BatchResponse {
    /// The transfer adapter to use.
    pub transfer: String,
    /// The objects with their actions or errors, in request order.
    pub objects: Vec<ObjectResult>,
    pub hash_algo: HashAlgo,
}

impl BatchResponse {
    /// Wrap per-object results in the basic-transfer envelope.
    pub fn basic(objects: Vec<ObjectResult>) -> Self {
        BatchResponse {
            transfer: BASIC_TRANSFER.to_string(),
            objects,
            hash_algo: HashAlgo::Sha256,
        }
    }
}

/// Outcome for a single object: an action to perform, or an error.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum ObjectResult {
    Ready {
        oid: String,
        size: u64,
        authenticated: bool,
        actions: Actions,
    },
    Failed {
        oid: String,
        size: u64,
        error: ObjectError,
    },
}

impl ObjectResult {
    /// An authenticated action for `operation` on `object`.
    pub fn ready(operation: Operation, object: &BatchRequestObject, url: AuthenticatedUrl) -> Self {
        let action = Action {
            href: url.href,
            expires_at: url.expires_at,
        };
        let actions = match operation {
            Operation::Download => Actions {
                download: Some(action),
                upload: None,
            },
            Operation::Upload => Actions {
                download: None,
                upload: Some(action),
            },
        };
        ObjectResult::Ready {
            oid: object.oid.clone(),
            size: object.size,
            authenticated: true,
            actions,
        }
    }

    /// The 404 result for an object the backend does not have.
    pub fn not_found(object: &BatchRequestObject) -> Self {
        ObjectResult::Failed {
            oid: object.oid.clone(),
            size: object.size,
            error: ObjectError {
                code: 404,
                message: "Object not found".to_string(),
            },
        }
    }

    /// The 422 result for an OID the backend cannot store.
    pub fn invalid_oid(object: &BatchRequestObject) -> Self {
        ObjectResult::Failed {
            oid: object.oid.clone(),
            size: object.size,
            error: ObjectError {
                code: 422,
                message: "Invalid object ID".to_string(),
            },
        }
    }

    pub fn oid(&self) -> &str {
        match self {
            ObjectResult::Ready { oid, .. } | ObjectResult::Failed { oid, .. } => oid,
        }
    }

    /// Get the download action if available.
    pub fn download_action(&self) -> Option<&Action> {
        match self {
            ObjectResult::Ready { actions, .. } => actions.download.as_ref(),
            ObjectResult::Failed { .. } => None,
        }
    }

    /// Get the upload action if available.
    pub fn upload_action(&self) -> Option<&Action> {
        match self {
            ObjectResult::Ready { actions, .. } => actions.upload.as_ref(),
            ObjectResult::Failed { .. } => None,
        }
    }

    /// Get the error if the object could not be resolved.
    pub fn error(&self) -> Option<&ObjectError> {
        match self {
            ObjectResult::Failed { error, .. } => Some(error),
            ObjectResult::Ready { .. } => None,
        }
    }
}

/// Actions keyed by operation name. Exactly one is set.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Actions {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub download: Option<Action>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub upload: Option<Action>,
}

/// An action (upload/download URL) for an object.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Action {
    /// The URL for the action.
    pub href: String,
    /// Absolute expiration time.
    #[serde(with = "iso_millis")]
    pub expires_at: DateTime<Utc>,
}

/// Error information for a batch object.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ObjectError {
    /// HTTP status code.
    pub code: u16,
    /// Error message.
    pub message: String,
}

/// ISO-8601 UTC timestamps with exactly millisecond precision,
/// e.g. `2023-07-09T03:23:24.808Z`.
mod iso_millis {
    use chrono::{DateTime, SecondsFormat, Utc};
    use serde::{Deserialize, Deserializer, Serializer};

    pub fn serialize<S: Serializer>(value: &DateTime<Utc>, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(&value.to_rfc3339_opts(SecondsFormat::Millis, true))
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(deserializer: D) -> Result<DateTime<Utc>, D::Error> {
        let raw = String::deserialize(deserializer)?;
        DateTime::parse_from_rfc3339(&raw)
            .map(|ts| ts.with_timezone(&Utc))
            .map_err(serde::de::Error::custom)
    }
}
