//! Trip documents as JSON objects, shared by the local backends.

use crate::error::PersistenceError;
use crate::types::{TripRecord, TripStatus, TripUpdate};
use chrono::{DateTime, Utc};
use serde_json::{Map, Value};

pub(crate) type Document = Map<String, Value>;

/// A new `PENDING` document.
pub(crate) fn pending_document() -> Document {
    let mut doc = Map::new();
    doc.insert(
        "status".into(),
        Value::String(TripStatus::Pending.as_str().into()),
    );
    doc
}

/// Apply `update` to `doc` in place. Fields not named by the update are left alone.
pub(crate) fn merge(doc: &mut Document, update: &TripUpdate, now: DateTime<Utc>) {
    for (key, value) in update.fields() {
        doc.insert(key, value);
    }
    doc.insert(
        update.timestamp_field().into(),
        Value::String(now.to_rfc3339()),
    );
}

pub(crate) fn to_record(trip_id: &str, doc: Document) -> Result<TripRecord, PersistenceError> {
    let mut record: TripRecord =
        serde_json::from_value(Value::Object(doc)).map_err(|e| PersistenceError::Corrupt {
            trip_id: trip_id.to_string(),
            reason: e.to_string(),
        })?;
    record.trip_id = trip_id.to_string();
    Ok(record)
}

pub(crate) fn decode(trip_id: &str, bytes: &[u8]) -> Result<Document, PersistenceError> {
    match serde_json::from_slice(bytes)? {
        Value::Object(doc) => Ok(doc),
        other => Err(PersistenceError::Corrupt {
            trip_id: trip_id.to_string(),
            reason: format!("expected object, found {}", type_name(&other)),
        }),
    }
}

fn type_name(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "bool",
        Value::Number(_) => "number",
        Value::String(_) => "string",
        Value::Array(_) => "array",
        Value::Object(_) => "object",
    }
}
