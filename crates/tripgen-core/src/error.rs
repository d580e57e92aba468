use crate::types::TripId;
use std::time::Duration;
use thiserror::Error;

/// Failures talking to the text-generation service.
#[derive(Debug, Error)]
pub enum GenerationError {
    #[error("Network error: {0}")]
    Network(#[from] reqwest::Error),

    #[error("Generation timed out after {0:?}")]
    Timeout(Duration),

    #[error("Generation API error {status}: {message}")]
    Status { status: u16, message: String },

    #[error("Malformed generation response: {0}")]
    MalformedResponse(String),

    #[error("Generation response has no candidates{}", detail("blocked", .block_reason))]
    NoCandidates { block_reason: Option<String> },

    #[error("Generation candidate has no text content{}", detail("finish reason", .finish_reason))]
    EmptyContent { finish_reason: Option<String> },

    #[error("Generation client misconfigured: {0}")]
    Config(String),
}

fn detail(label: &str, value: &Option<String>) -> String {
    value
        .as_ref()
        .map(|v| format!(" ({}: {})", label, v))
        .unwrap_or_default()
}

impl GenerationError {
    pub fn is_timeout(&self) -> bool {
        matches!(self, GenerationError::Timeout(_))
    }
}

/// Model output could not be turned into an itinerary.
#[derive(Debug, Error)]
pub enum ExtractionError {
    #[error("Model output is empty")]
    Empty,

    #[error("Model output is not valid JSON: {0}")]
    InvalidJson(#[from] serde_json::Error),

    #[error("Model output is JSON null, not an itinerary")]
    NullItinerary,
}

/// Failures reading or writing trip documents.
#[derive(Debug, Error)]
pub enum PersistenceError {
    #[error("Trip not found: {0}")]
    NotFound(TripId),

    #[error("Trip already exists: {0}")]
    AlreadyExists(TripId),

    #[error("Write rejected by store: {0}")]
    Rejected(String),

    #[error("Store unavailable: {0}")]
    Unavailable(String),

    #[error("Corrupt trip document {trip_id}: {reason}")]
    Corrupt { trip_id: TripId, reason: String },

    #[error("Database error: {0}")]
    Database(#[from] redb::DatabaseError),

    #[error("Table error: {0}")]
    Table(#[from] redb::TableError),

    #[error("Transaction error: {0}")]
    Transaction(#[from] redb::TransactionError),

    #[error("Commit error: {0}")]
    Commit(#[from] redb::CommitError),

    #[error("Storage operation error: {0}")]
    StorageOperation(#[from] redb::StorageError),

    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

impl From<reqwest::Error> for PersistenceError {
    fn from(err: reqwest::Error) -> Self {
        PersistenceError::Unavailable(err.to_string())
    }
}
