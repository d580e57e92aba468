//! Firestore REST backend.
//!
//! Merge-updates go through `documents:commit` with an update mask, an
//! `exists` precondition (so a missing trip is never created) and a
//! `REQUEST_TIME` transform, so the timestamp comes from Firestore's clock.

use super::document::{self, Document};
use crate::error::PersistenceError;
use crate::storage::traits::{Result, TripStore};
use crate::types::{TripRecord, TripStatus, TripUpdate};
use async_trait::async_trait;
use log::{debug, warn};
use reqwest::{Client, RequestBuilder, Response, StatusCode};
use serde_json::{json, Map, Value};
use std::time::Duration;

pub const DEFAULT_FIRESTORE_BASE_URL: &str = "https://firestore.googleapis.com";

#[derive(Debug, Clone)]
pub struct FirestoreConfig {
    pub project_id: String,
    pub database: String,
    pub collection: String,
    pub base_url: String,
    /// OAuth2 bearer token. `None` for the emulator.
    pub access_token: Option<String>,
    pub timeout: Duration,
}

impl FirestoreConfig {
    pub fn new(project_id: impl Into<String>) -> Self {
        Self {
            project_id: project_id.into(),
            database: "(default)".to_string(),
            collection: "trips".to_string(),
            base_url: DEFAULT_FIRESTORE_BASE_URL.to_string(),
            access_token: None,
            timeout: Duration::from_secs(30),
        }
    }

    /// Point at a local emulator (`host:port`), which needs no credentials.
    pub fn with_emulator(mut self, host: &str) -> Self {
        self.base_url = format!("http://{}", host);
        self.access_token = None;
        self
    }

    pub fn with_base_url(mut self, base_url: impl Into<String>) -> Self {
        self.base_url = base_url.into();
        self
    }

    pub fn with_access_token(mut self, token: impl Into<String>) -> Self {
        self.access_token = Some(token.into());
        self
    }

    pub fn with_collection(mut self, collection: impl Into<String>) -> Self {
        self.collection = collection.into();
        self
    }

    pub fn with_database(mut self, database: impl Into<String>) -> Self {
        self.database = database.into();
        self
    }

    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }
}

pub struct FirestoreTripStore {
    config: FirestoreConfig,
    http: Client,
}

impl FirestoreTripStore {
    pub fn new(config: FirestoreConfig) -> Result<Self> {
        let http = Client::builder().timeout(config.timeout).build()?;
        Ok(Self { config, http })
    }

    fn database_path(&self) -> String {
        format!(
            "projects/{}/databases/{}",
            self.config.project_id, self.config.database
        )
    }

    fn document_name(&self, trip_id: &str) -> String {
        format!(
            "{}/documents/{}/{}",
            self.database_path(),
            self.config.collection,
            trip_id
        )
    }

    fn url(&self, path: &str) -> String {
        format!("{}/v1/{}", self.config.base_url.trim_end_matches('/'), path)
    }

    fn authorized(&self, req: RequestBuilder) -> RequestBuilder {
        match &self.config.access_token {
            Some(token) => req.bearer_auth(token),
            None => req,
        }
    }

    fn commit_body(&self, trip_id: &str, update: &TripUpdate) -> Value {
        json!({
            "writes": [{
                "update": {
                    "name": self.document_name(trip_id),
                    "fields": encode_fields(&update.fields()),
                },
                "updateMask": { "fieldPaths": update.field_paths() },
                "updateTransforms": [{
                    "fieldPath": update.timestamp_field(),
                    "setToServerValue": "REQUEST_TIME",
                }],
                "currentDocument": { "exists": true },
            }]
        })
    }
}

/// Document ids are a single path segment.
fn check_trip_id(trip_id: &str) -> Result<()> {
    if trip_id.is_empty() || trip_id.contains('/') {
        return Err(PersistenceError::Rejected(format!(
            "invalid trip id {:?}: must be non-empty and contain no '/'",
            trip_id
        )));
    }
    Ok(())
}

/// Map a non-success Firestore response onto the persistence taxonomy.
async fn error_for(trip_id: &str, response: Response) -> PersistenceError {
    let status = response.status();
    let body = response.text().await.unwrap_or_default();
    let message = serde_json::from_str::<Value>(&body)
        .ok()
        .and_then(|v| v["error"]["message"].as_str().map(str::to_string))
        .unwrap_or(body);

    match status {
        StatusCode::NOT_FOUND => PersistenceError::NotFound(trip_id.to_string()),
        StatusCode::CONFLICT => PersistenceError::AlreadyExists(trip_id.to_string()),
        s if s.is_server_error() => {
            PersistenceError::Unavailable(format!("{}: {}", s.as_u16(), message))
        }
        s => PersistenceError::Rejected(format!("{}: {}", s.as_u16(), message)),
    }
}

#[async_trait]
impl TripStore for FirestoreTripStore {
    async fn apply(&self, trip_id: &str, update: &TripUpdate) -> Result<()> {
        check_trip_id(trip_id)?;
        debug!("apply: trip={} status={}", trip_id, update.status());
        let url = self.url(&format!("{}/documents:commit", self.database_path()));
        let response = self
            .authorized(self.http.post(url))
            .json(&self.commit_body(trip_id, update))
            .send()
            .await?;

        if !response.status().is_success() {
            let err = error_for(trip_id, response).await;
            warn!("apply: commit for trip {} failed: {}", trip_id, err);
            return Err(err);
        }
        Ok(())
    }

    async fn get(&self, trip_id: &str) -> Result<Option<TripRecord>> {
        check_trip_id(trip_id)?;
        let url = self.url(&format!(
            "{}/documents/{}/{}",
            self.database_path(),
            self.config.collection,
            urlencoding::encode(trip_id)
        ));
        let response = self.authorized(self.http.get(url)).send().await?;

        if response.status() == StatusCode::NOT_FOUND {
            return Ok(None);
        }
        if !response.status().is_success() {
            return Err(error_for(trip_id, response).await);
        }

        let body: Value = response.json().await?;
        let doc = decode_fields(&body["fields"]).map_err(|reason| PersistenceError::Corrupt {
            trip_id: trip_id.to_string(),
            reason,
        })?;
        document::to_record(trip_id, doc).map(Some)
    }

    async fn create(&self, trip_id: &str) -> Result<()> {
        check_trip_id(trip_id)?;
        let url = self.url(&format!(
            "{}/documents/{}",
            self.database_path(),
            self.config.collection
        ));
        let body = json!({
            "fields": { "status": { "stringValue": TripStatus::Pending.as_str() } }
        });
        let response = self
            .authorized(self.http.post(url))
            .query(&[("documentId", trip_id)])
            .json(&body)
            .send()
            .await?;

        if !response.status().is_success() {
            return Err(error_for(trip_id, response).await);
        }
        Ok(())
    }

    fn backend(&self) -> &'static str {
        "firestore"
    }
}

fn encode_fields(fields: &Map<String, Value>) -> Value {
    Value::Object(
        fields
            .iter()
            .map(|(k, v)| (k.clone(), encode_value(v)))
            .collect(),
    )
}

/// Encode a JSON value as a Firestore typed `Value`.
pub(crate) fn encode_value(value: &Value) -> Value {
    match value {
        Value::Null => json!({ "nullValue": null }),
        Value::Bool(b) => json!({ "booleanValue": b }),
        Value::Number(n) => match n.as_i64() {
            // int64 travels as a decimal string
            Some(i) => json!({ "integerValue": i.to_string() }),
            None => json!({ "doubleValue": n.as_f64() }),
        },
        Value::String(s) => json!({ "stringValue": s }),
        Value::Array(items) => json!({
            "arrayValue": { "values": items.iter().map(encode_value).collect::<Vec<_>>() }
        }),
        Value::Object(map) => json!({ "mapValue": { "fields": encode_fields(map) } }),
    }
}

fn decode_fields(fields: &Value) -> std::result::Result<Document, String> {
    match fields {
        Value::Null => Ok(Map::new()),
        Value::Object(map) => map
            .iter()
            .map(|(k, v)| decode_value(v).map(|v| (k.clone(), v)))
            .collect(),
        other => Err(format!("fields is not an object: {}", other)),
    }
}

/// Decode a Firestore typed `Value` into plain JSON.
pub(crate) fn decode_value(value: &Value) -> std::result::Result<Value, String> {
    let Some((kind, inner)) = value.as_object().and_then(|m| m.iter().next()) else {
        return Err(format!("not a Firestore value: {}", value));
    };
    match kind.as_str() {
        "nullValue" => Ok(Value::Null),
        "booleanValue" | "doubleValue" => Ok(inner.clone()),
        "integerValue" => match inner {
            Value::String(s) => s
                .parse::<i64>()
                .map(Value::from)
                .map_err(|e| format!("bad integerValue {:?}: {}", s, e)),
            Value::Number(_) => Ok(inner.clone()),
            other => Err(format!("bad integerValue: {}", other)),
        },
        "stringValue" | "timestampValue" | "referenceValue" | "bytesValue" => Ok(inner.clone()),
        "geoPointValue" => Ok(inner.clone()),
        "arrayValue" => {
            let values = match inner.get("values") {
                Some(Value::Array(items)) => items
                    .iter()
                    .map(decode_value)
                    .collect::<std::result::Result<Vec<_>, _>>()?,
                _ => Vec::new(),
            };
            Ok(Value::Array(values))
        }
        "mapValue" => decode_fields(inner.get("fields").unwrap_or(&Value::Null)).map(Value::Object),
        other => Err(format!("unsupported Firestore value type {}", other)),
    }
}
