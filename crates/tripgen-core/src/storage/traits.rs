use crate::error::PersistenceError;
use crate::types::{TripRecord, TripUpdate};
use async_trait::async_trait;

pub type Result<T> = std::result::Result<T, PersistenceError>;

/// Document store holding trip records, keyed by trip id.
#[async_trait]
pub trait TripStore: Send + Sync {
    /// Merge-update an existing trip.
    ///
    /// Writes only the fields named by the update plus its timestamp field,
    /// which the store assigns from its own clock. Fails with
    /// [`PersistenceError::NotFound`] when the trip does not exist; never
    /// creates a record.
    async fn apply(&self, trip_id: &str, update: &TripUpdate) -> Result<()>;

    /// Read a trip record.
    async fn get(&self, trip_id: &str) -> Result<Option<TripRecord>>;

    /// Create a `PENDING` trip record.
    async fn create(&self, trip_id: &str) -> Result<()>;

    /// Backend name for logs and health output.
    fn backend(&self) -> &'static str;
}
