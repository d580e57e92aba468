mod document;
mod firestore;
mod memory_store;
mod redb_store;
mod traits;

pub use firestore::{FirestoreConfig, FirestoreTripStore, DEFAULT_FIRESTORE_BASE_URL};
pub use memory_store::MemoryTripStore;
pub use redb_store::{RedbTripStore, CURRENT_SCHEMA_VERSION};
pub use traits::TripStore;
