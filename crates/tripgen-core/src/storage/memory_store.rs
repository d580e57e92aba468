use super::document::{self, Document};
use crate::error::PersistenceError;
use crate::storage::traits::{Result, TripStore};
use crate::types::{TripRecord, TripUpdate};
use async_trait::async_trait;
use chrono::Utc;
use serde_json::Value;
use std::collections::HashMap;
use tokio::sync::RwLock;

/// In-memory trip store for testing and local development.
///
/// Keeps an ordered log of every successfully applied update.
#[derive(Default)]
pub struct MemoryTripStore {
    docs: RwLock<HashMap<String, Document>>,
    applied: RwLock<Vec<(String, TripUpdate)>>,
}

impl MemoryTripStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Insert a raw document, replacing any existing one. Test seeding only.
    pub async fn insert_document(&self, trip_id: &str, doc: serde_json::Map<String, Value>) {
        self.docs.write().await.insert(trip_id.to_string(), doc);
    }

    /// Updates applied so far, oldest first.
    pub async fn applied_updates(&self) -> Vec<(String, TripUpdate)> {
        self.applied.read().await.clone()
    }
}

#[async_trait]
impl TripStore for MemoryTripStore {
    async fn apply(&self, trip_id: &str, update: &TripUpdate) -> Result<()> {
        let mut docs = self.docs.write().await;
        let doc = docs
            .get_mut(trip_id)
            .ok_or_else(|| PersistenceError::NotFound(trip_id.to_string()))?;
        document::merge(doc, update, Utc::now());
        self.applied
            .write()
            .await
            .push((trip_id.to_string(), update.clone()));
        Ok(())
    }

    async fn get(&self, trip_id: &str) -> Result<Option<TripRecord>> {
        let docs = self.docs.read().await;
        docs.get(trip_id)
            .cloned()
            .map(|doc| document::to_record(trip_id, doc))
            .transpose()
    }

    async fn create(&self, trip_id: &str) -> Result<()> {
        let mut docs = self.docs.write().await;
        if docs.contains_key(trip_id) {
            return Err(PersistenceError::AlreadyExists(trip_id.to_string()));
        }
        docs.insert(trip_id.to_string(), document::pending_document());
        Ok(())
    }

    fn backend(&self) -> &'static str {
        "memory"
    }
}
