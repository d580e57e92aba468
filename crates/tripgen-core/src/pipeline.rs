//! Single-pass itinerary pipeline: prompt → generate → extract → persist.

use crate::error::{ExtractionError, GenerationError, PersistenceError};
use crate::extract::extract_itinerary;
use crate::generation::ItineraryGenerator;
use crate::prompt::build_prompt;
use crate::storage::TripStore;
use crate::types::{TripId, TripRequest, TripStatus, TripUpdate};
use log::{debug, info, warn};
use std::fmt;
use std::sync::Arc;
use thiserror::Error;

/// Per-request pipeline stage. Any failure ends in `Failed`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PipelineStage {
    Received,
    Prompted,
    Generated,
    Extracted,
    Persisted,
    Responded,
    Failed,
}

impl fmt::Display for PipelineStage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            PipelineStage::Received => "RECEIVED",
            PipelineStage::Prompted => "PROMPTED",
            PipelineStage::Generated => "GENERATED",
            PipelineStage::Extracted => "EXTRACTED",
            PipelineStage::Persisted => "PERSISTED",
            PipelineStage::Responded => "RESPONDED",
            PipelineStage::Failed => "FAILED",
        };
        f.write_str(s)
    }
}

#[derive(Debug, Error)]
pub enum PipelineError {
    #[error(transparent)]
    Generation(#[from] GenerationError),

    #[error(transparent)]
    Extraction(#[from] ExtractionError),

    #[error(transparent)]
    Persistence(#[from] PersistenceError),
}

impl PipelineError {
    /// Taxonomy name reported to callers.
    pub fn kind(&self) -> &'static str {
        match self {
            PipelineError::Generation(_) => "GenerationError",
            PipelineError::Extraction(_) => "ExtractionError",
            PipelineError::Persistence(_) => "PersistenceError",
        }
    }

    /// Last stage reached before the failure.
    pub fn failed_stage(&self) -> PipelineStage {
        match self {
            PipelineError::Generation(_) => PipelineStage::Prompted,
            PipelineError::Extraction(_) => PipelineStage::Generated,
            PipelineError::Persistence(_) => PipelineStage::Extracted,
        }
    }
}

#[derive(Debug, Clone, Default)]
pub struct PipelineOptions {
    /// Write `status = FAILED` when generation or extraction fails, so the
    /// trip does not stay `PENDING`. Off by default: a failed request then
    /// leaves the stored trip untouched.
    pub record_failures: bool,
}

/// Result of a successful run.
#[derive(Debug, Clone, PartialEq)]
pub struct PipelineOutcome {
    pub trip_id: TripId,
    pub status: TripStatus,
}

/// Orchestrates one itinerary request. Holds no per-request state, so a
/// single instance is shared across concurrent requests.
#[derive(Clone)]
pub struct Pipeline {
    generator: Arc<dyn ItineraryGenerator>,
    store: Arc<dyn TripStore>,
    options: PipelineOptions,
}

impl Pipeline {
    pub fn new(generator: Arc<dyn ItineraryGenerator>, store: Arc<dyn TripStore>) -> Self {
        Self {
            generator,
            store,
            options: PipelineOptions::default(),
        }
    }

    pub fn with_options(mut self, options: PipelineOptions) -> Self {
        self.options = options;
        self
    }

    pub fn generator(&self) -> &Arc<dyn ItineraryGenerator> {
        &self.generator
    }

    pub fn store(&self) -> &Arc<dyn TripStore> {
        &self.store
    }

    pub fn options(&self) -> &PipelineOptions {
        &self.options
    }

    /// Run the pipeline for one request.
    ///
    /// Only the final stage writes to the store. On failure nothing is
    /// committed, apart from the optional failure-status write.
    pub async fn run(&self, req: &TripRequest) -> Result<PipelineOutcome, PipelineError> {
        let trip_id = req.trip_id.as_str();
        debug!("trip {}: {}", trip_id, PipelineStage::Received);

        let result = self.run_stages(req).await;
        match &result {
            Ok(_) => info!("trip {}: itinerary stored", trip_id),
            Err(e) => {
                warn!(
                    "trip {}: {} after {}: {}",
                    trip_id,
                    PipelineStage::Failed,
                    e.failed_stage(),
                    e
                );
                self.record_failure(trip_id, e).await;
            }
        }
        result
    }

    async fn run_stages(&self, req: &TripRequest) -> Result<PipelineOutcome, PipelineError> {
        let trip_id = req.trip_id.as_str();

        let prompt = build_prompt(req);
        debug!("trip {}: {}", trip_id, PipelineStage::Prompted);

        let raw = self.generator.generate(&prompt).await?;
        debug!(
            "trip {}: {} ({} bytes)",
            trip_id,
            PipelineStage::Generated,
            raw.len()
        );

        let itinerary = extract_itinerary(&raw)?;
        debug!("trip {}: {}", trip_id, PipelineStage::Extracted);

        let update = TripUpdate::ready(itinerary);
        self.store.apply(trip_id, &update).await?;
        debug!("trip {}: {}", trip_id, PipelineStage::Persisted);

        Ok(PipelineOutcome {
            trip_id: req.trip_id.clone(),
            status: update.status(),
        })
    }

    async fn record_failure(&self, trip_id: &str, err: &PipelineError) {
        if !self.options.record_failures {
            return;
        }
        // Nothing useful to write when the store itself failed.
        if matches!(err, PipelineError::Persistence(_)) {
            return;
        }
        let update = TripUpdate::failed(format!("{}: {}", err.kind(), err));
        if let Err(e) = self.store.apply(trip_id, &update).await {
            warn!("trip {}: could not record failure: {}", trip_id, e);
        }
    }
}
