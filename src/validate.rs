//! Batch request validation.
//!
//! Turns an untyped JSON body into a [`BatchRequest`]. Rules are checked in a
//! fixed order and the first violation is reported:
//!
//! 1. the body is an object
//! 2. `operation` is `download` or `upload`
//! 3. `transfers`, if present, is an array of strings
//! 4. `ref`, if present, is an object with a string `name`
//! 5. `objects` is an array of `{oid: string, size: integer}`
//! 6. `hash_algo`, if present, names a supported algorithm
//!
//! A key that is present with a `null` value counts as present.

use serde_json::{Map, Value};

use crate::batch::{BatchRequest, BatchRequestObject, HashAlgo, Operation, RefInfo, BASIC_TRANSFER};
use crate::{Error, Result};

/// Validate a raw batch request body.
pub fn validate(body: &Value) -> Result<BatchRequest> {
    let body = body
        .as_object()
        .ok_or_else(|| Error::InvalidBody("expected body to be an object".into()))?;

    Ok(BatchRequest {
        operation: operation(body)?,
        transfers: transfers(body)?,
        r#ref: ref_info(body)?,
        objects: objects(body)?,
        hash_algo: hash_algo(body)?,
    })
}

fn malformed(message: impl Into<String>) -> Error {
    Error::MalformedRequest(message.into())
}

fn operation(body: &Map<String, Value>) -> Result<Operation> {
    let value = body
        .get("operation")
        .ok_or_else(|| malformed("expected body to have an operation property"))?;

    value
        .as_str()
        .and_then(Operation::from_wire)
        .ok_or_else(|| malformed("expected operation to be either download or upload"))
}

fn transfers(body: &Map<String, Value>) -> Result<Vec<String>> {
    let Some(value) = body.get("transfers") else {
        return Ok(vec![BASIC_TRANSFER.to_string()]);
    };

    value
        .as_array()
        .and_then(|items| {
            items
                .iter()
                .map(|item| item.as_str().map(str::to_string))
                .collect::<Option<Vec<_>>>()
        })
        .ok_or_else(|| malformed("invalid transfers property"))
}

fn ref_info(body: &Map<String, Value>) -> Result<Option<RefInfo>> {
    let Some(value) = body.get("ref") else {
        return Ok(None);
    };

    let name = value
        .as_object()
        .and_then(|r| r.get("name"))
        .and_then(Value::as_str)
        .ok_or_else(|| malformed("invalid ref property"))?;

    Ok(Some(RefInfo {
        name: name.to_string(),
    }))
}

fn objects(body: &Map<String, Value>) -> Result<Vec<BatchRequestObject>> {
    let items = body
        .get("objects")
        .and_then(Value::as_array)
        .ok_or_else(|| malformed("expected objects property to be an array"))?;

    items
        .iter()
        .enumerate()
        .map(|(index, item)| object(index, item))
        .collect()
}

fn object(index: usize, item: &Value) -> Result<BatchRequestObject> {
    let item = item
        .as_object()
        .ok_or_else(|| malformed(format!("invalid object at index {}: expected an object", index)))?;

    let oid = item.get("oid").and_then(Value::as_str).ok_or_else(|| {
        malformed(format!("invalid object at index {}: oid must be a string", index))
    })?;
    if oid.is_empty() {
        return Err(malformed(format!(
            "invalid object at index {}: oid must not be empty",
            index
        )));
    }

    let size = item.get("size").and_then(Value::as_u64).ok_or_else(|| {
        malformed(format!(
            "invalid object at index {}: size must be a non-negative integer",
            index
        ))
    })?;

    Ok(BatchRequestObject::new(oid, size))
}

fn hash_algo(body: &Map<String, Value>) -> Result<HashAlgo> {
    let Some(value) = body.get("hash_algo") else {
        return Ok(HashAlgo::default());
    };

    let name = value
        .as_str()
        .ok_or_else(|| malformed("invalid hash_algo property"))?;

    HashAlgo::from_wire(name).ok_or_else(|| malformed("unknown hash_algo algorithm"))
}
