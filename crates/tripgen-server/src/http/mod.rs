mod routes;
#[cfg(test)]
mod tests;

pub use routes::create_router;

use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde::Serialize;
use tripgen_core::{GenerationError, PersistenceError, Pipeline, PipelineError};

/// Shared application state
#[derive(Clone)]
pub struct AppState {
    pub pipeline: Pipeline,
    pub start_time: std::time::Instant,
}

/// JSON response wrapper
#[derive(Serialize)]
pub struct JsonResponse<T> {
    pub success: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub data: Option<T>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
    /// Error taxonomy name, e.g. "ExtractionError"
    #[serde(skip_serializing_if = "Option::is_none")]
    pub kind: Option<&'static str>,
}

impl<T: Serialize> JsonResponse<T> {
    pub fn ok(data: T) -> Self {
        Self {
            success: true,
            data: Some(data),
            error: None,
            kind: None,
        }
    }

    pub fn err(kind: &'static str, msg: impl Into<String>) -> JsonResponse<()> {
        JsonResponse {
            success: false,
            data: None,
            error: Some(msg.into()),
            kind: Some(kind),
        }
    }
}

/// Error type for HTTP handlers
pub enum AppError {
    Pipeline(PipelineError),
    BadRequest(String),
    NotFound(String),
}

impl AppError {
    fn status(&self) -> StatusCode {
        match self {
            AppError::Pipeline(PipelineError::Generation(GenerationError::Timeout(_))) => {
                StatusCode::GATEWAY_TIMEOUT
            }
            AppError::Pipeline(PipelineError::Generation(_))
            | AppError::Pipeline(PipelineError::Extraction(_)) => StatusCode::BAD_GATEWAY,
            AppError::Pipeline(PipelineError::Persistence(PersistenceError::NotFound(_))) => {
                StatusCode::NOT_FOUND
            }
            AppError::Pipeline(PipelineError::Persistence(_)) => StatusCode::INTERNAL_SERVER_ERROR,
            AppError::BadRequest(_) => StatusCode::BAD_REQUEST,
            AppError::NotFound(_) => StatusCode::NOT_FOUND,
        }
    }

    fn kind(&self) -> &'static str {
        match self {
            AppError::Pipeline(e) => e.kind(),
            AppError::BadRequest(_) => "InvalidRequest",
            AppError::NotFound(_) => "NotFound",
        }
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let status = self.status();
        let kind = self.kind();
        let message = match self {
            AppError::Pipeline(e) => e.to_string(),
            AppError::BadRequest(msg) | AppError::NotFound(msg) => msg,
        };
        (status, Json(JsonResponse::<()>::err(kind, message))).into_response()
    }
}

impl From<PipelineError> for AppError {
    fn from(err: PipelineError) -> Self {
        AppError::Pipeline(err)
    }
}

impl From<PersistenceError> for AppError {
    fn from(err: PersistenceError) -> Self {
        AppError::Pipeline(PipelineError::Persistence(err))
    }
}

pub type AppResult<T> = Result<T, AppError>;
