//! Itinerary generation engine.
//!
//! Builds a prompt from a [`TripRequest`], asks a text-generation service for
//! an itinerary, extracts the JSON payload from the model output and writes
//! it back onto the stored trip with a single merge-update.

pub mod error;
pub mod extract;
pub mod generation;
pub mod pipeline;
pub mod prompt;
pub mod storage;
pub mod types;

pub use error::{ExtractionError, GenerationError, PersistenceError};
pub use extract::{extract_itinerary, strip_code_fence};
pub use generation::{GeminiClient, GeminiConfig, ItineraryGenerator};
pub use pipeline::{Pipeline, PipelineError, PipelineOptions, PipelineOutcome, PipelineStage};
pub use prompt::{build_prompt, GenerationPrompt};
pub use storage::{
    FirestoreConfig, FirestoreTripStore, MemoryTripStore, RedbTripStore, TripStore,
};
pub use types::*;
