use super::document;
use crate::error::PersistenceError;
use crate::storage::traits::{Result, TripStore};
use crate::types::{TripRecord, TripUpdate};
use async_trait::async_trait;
use chrono::Utc;
use log::debug;
use redb::{Database, ReadableTable, ReadableTableMetadata, TableDefinition};
use std::path::{Path, PathBuf};
use std::sync::Arc;

// Trip documents, JSON-encoded objects keyed by trip id
const TRIPS: TableDefinition<&str, &[u8]> = TableDefinition::new("trips");

const META: TableDefinition<&str, &[u8]> = TableDefinition::new("meta");

/// Current schema version.
/// v1 = JSON object documents in `trips`
pub const CURRENT_SCHEMA_VERSION: u32 = 1;
const SCHEMA_VERSION_KEY: &str = "schema_version";

/// Embedded trip store backed by redb.
///
/// Each merge-update is a read-modify-write inside a single write
/// transaction; redb serializes write transactions, so concurrent updates
/// to the same trip resolve last-write-wins.
#[derive(Clone)]
pub struct RedbTripStore {
    db: Arc<Database>,
    path: PathBuf,
}

impl RedbTripStore {
    /// Open or create a database at the given path
    pub fn open<P: AsRef<Path>>(path: P) -> Result<Self> {
        let path = path.as_ref().to_path_buf();

        if let Some(parent) = path.parent() {
            if !parent.as_os_str().is_empty() {
                std::fs::create_dir_all(parent)?;
            }
        }

        let is_new = !path.exists();
        let db = Database::create(&path)?;

        if is_new {
            let write_txn = db.begin_write()?;
            {
                let _ = write_txn.open_table(TRIPS)?;
                let mut meta = write_txn.open_table(META)?;
                meta.insert(
                    SCHEMA_VERSION_KEY,
                    CURRENT_SCHEMA_VERSION.to_string().as_bytes(),
                )?;
            }
            write_txn.commit()?;
        } else {
            Self::check_schema_version(&db)?;
            let write_txn = db.begin_write()?;
            {
                let _ = write_txn.open_table(TRIPS)?;
                let _ = write_txn.open_table(META)?;
            }
            write_txn.commit()?;
        }

        Ok(Self {
            db: Arc::new(db),
            path,
        })
    }

    fn check_schema_version(db: &Database) -> Result<()> {
        let read_txn = db.begin_read()?;
        let version = read_txn
            .open_table(META)
            .ok()
            .and_then(|t| {
                t.get(SCHEMA_VERSION_KEY).ok().flatten().and_then(|v| {
                    std::str::from_utf8(v.value())
                        .ok()
                        .and_then(|s| s.parse::<u32>().ok())
                })
            })
            .unwrap_or(CURRENT_SCHEMA_VERSION);

        if version != CURRENT_SCHEMA_VERSION {
            return Err(PersistenceError::Unavailable(format!(
                "Database schema v{} does not match this binary (v{})",
                version, CURRENT_SCHEMA_VERSION
            )));
        }
        Ok(())
    }

    /// Get the database file path
    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Number of stored trips.
    pub fn count(&self) -> Result<u64> {
        let read_txn = self.db.begin_read()?;
        let table = read_txn.open_table(TRIPS)?;
        Ok(table.len()?)
    }

    fn apply_blocking(db: &Database, trip_id: &str, update: &TripUpdate) -> Result<()> {
        let write_txn = db.begin_write()?;
        {
            let mut table = write_txn.open_table(TRIPS)?;
            let existing = table.get(trip_id)?.map(|v| v.value().to_vec());
            let Some(bytes) = existing else {
                return Err(PersistenceError::NotFound(trip_id.to_string()));
            };
            let mut doc = document::decode(trip_id, &bytes)?;
            document::merge(&mut doc, update, Utc::now());
            let encoded = serde_json::to_vec(&doc)?;
            table.insert(trip_id, encoded.as_slice())?;
        }
        write_txn.commit()?;
        Ok(())
    }

    fn get_blocking(db: &Database, trip_id: &str) -> Result<Option<TripRecord>> {
        let read_txn = db.begin_read()?;
        let table = read_txn.open_table(TRIPS)?;
        let Some(bytes) = table.get(trip_id)?.map(|v| v.value().to_vec()) else {
            return Ok(None);
        };
        let doc = document::decode(trip_id, &bytes)?;
        document::to_record(trip_id, doc).map(Some)
    }

    fn create_blocking(db: &Database, trip_id: &str) -> Result<()> {
        let write_txn = db.begin_write()?;
        {
            let mut table = write_txn.open_table(TRIPS)?;
            if table.get(trip_id)?.is_some() {
                return Err(PersistenceError::AlreadyExists(trip_id.to_string()));
            }
            let encoded = serde_json::to_vec(&document::pending_document())?;
            table.insert(trip_id, encoded.as_slice())?;
        }
        write_txn.commit()?;
        Ok(())
    }

    async fn run_blocking<T, F>(&self, f: F) -> Result<T>
    where
        T: Send + 'static,
        F: FnOnce(&Database) -> Result<T> + Send + 'static,
    {
        let db = self.db.clone();
        tokio::task::spawn_blocking(move || f(&db))
            .await
            .map_err(|e| PersistenceError::Unavailable(format!("storage task failed: {}", e)))?
    }
}

#[async_trait]
impl TripStore for RedbTripStore {
    async fn apply(&self, trip_id: &str, update: &TripUpdate) -> Result<()> {
        debug!("apply: trip={} status={}", trip_id, update.status());
        let id = trip_id.to_string();
        let update = update.clone();
        self.run_blocking(move |db| Self::apply_blocking(db, &id, &update))
            .await
    }

    async fn get(&self, trip_id: &str) -> Result<Option<TripRecord>> {
        let id = trip_id.to_string();
        self.run_blocking(move |db| Self::get_blocking(db, &id)).await
    }

    async fn create(&self, trip_id: &str) -> Result<()> {
        let id = trip_id.to_string();
        self.run_blocking(move |db| Self::create_blocking(db, &id))
            .await
    }

    fn backend(&self) -> &'static str {
        "redb"
    }
}
