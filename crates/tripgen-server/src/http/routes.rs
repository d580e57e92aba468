use super::{AppError, AppResult, AppState, JsonResponse};
use axum::{
    extract::{rejection::JsonRejection, Path, State},
    response::Json,
    routing::{get, post},
    Router,
};
use serde::Serialize;
use tower_http::{cors::CorsLayer, trace::TraceLayer};
use tracing::info;
use tripgen_core::{PipelineStage, TripRecord, TripRequest, TripStatus};

pub fn create_router(state: AppState) -> Router {
    Router::new()
        .route("/health", get(health))
        .route("/generate-itinerary", post(generate_itinerary))
        .route("/trips/:trip_id", get(get_trip))
        .layer(TraceLayer::new_for_http())
        .layer(CorsLayer::permissive())
        .with_state(state)
}

#[derive(Serialize)]
struct HealthResponse {
    healthy: bool,
    version: String,
    uptime_seconds: u64,
    generator: String,
    store: String,
}

async fn health(State(state): State<AppState>) -> Json<JsonResponse<HealthResponse>> {
    Json(JsonResponse::ok(HealthResponse {
        healthy: true,
        version: env!("CARGO_PKG_VERSION").to_string(),
        uptime_seconds: state.start_time.elapsed().as_secs(),
        generator: state.pipeline.generator().name().to_string(),
        store: state.pipeline.store().backend().to_string(),
    }))
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct GenerateResponse {
    trip_id: String,
    status: TripStatus,
}

/// POST /generate-itinerary: run the pipeline for one trip
async fn generate_itinerary(
    State(state): State<AppState>,
    payload: Result<Json<TripRequest>, JsonRejection>,
) -> AppResult<Json<JsonResponse<GenerateResponse>>> {
    let Json(req) = payload.map_err(|e| AppError::BadRequest(e.body_text()))?;

    let outcome = state.pipeline.run(&req).await?;

    info!(trip_id = %outcome.trip_id, stage = %PipelineStage::Responded, "itinerary ready");
    Ok(Json(JsonResponse::ok(GenerateResponse {
        trip_id: outcome.trip_id,
        status: outcome.status,
    })))
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct TripResponse {
    trip_id: String,
    #[serde(flatten)]
    record: TripRecord,
}

/// GET /trips/:trip_id: read the stored trip
async fn get_trip(
    State(state): State<AppState>,
    Path(trip_id): Path<String>,
) -> AppResult<Json<JsonResponse<TripResponse>>> {
    let record = state
        .pipeline
        .store()
        .get(&trip_id)
        .await?
        .ok_or_else(|| AppError::NotFound(format!("Trip not found: {}", trip_id)))?;

    Ok(Json(JsonResponse::ok(TripResponse {
        trip_id: record.trip_id.clone(),
        record,
    })))
}
