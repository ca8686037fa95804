use std::sync::Arc;

use axum::{
    extract::State,
    http::StatusCode,
    response::{IntoResponse, Response},
    routing::{get, post},
    Router,
};
use serde::Serialize;
use serde_json::json;
use tracing::error;

use super::error::EngineError;
use crate::error::AppError;
use super::service::{
    CalibrationRequest, RecommendationRequest, RecommendationService, ScoreCalibrationRequest,
    WeightOptimizationRequest,
};

/// Router builder exposing recommendation and calibration endpoints.
pub fn career_router(service: Arc<RecommendationService>) -> Router {
    Router::new()
        .route("/api/v1/career/recommendations", post(recommend_handler))
        .route("/api/v1/career/calibration", get(calibration_handler))
        .route("/api/v1/career/calibrate", post(calibrate_handler))
        .route("/api/v1/career/optimize-weights", post(optimize_weights_handler))
        .route("/api/v1/career/calibrate-scores", post(calibrate_scores_handler))
        .with_state(service)
}

pub(crate) fn engine_status(error: &EngineError) -> StatusCode {
    match error {
        EngineError::EmptyProfile | EngineError::InsufficientOverlap { .. } => {
            StatusCode::BAD_REQUEST
        }
        EngineError::CalibrationDataInsufficient { .. } => StatusCode::UNPROCESSABLE_ENTITY,
        EngineError::DataUnavailable(_) => StatusCode::SERVICE_UNAVAILABLE,
    }
}

pub(crate) fn engine_error_response(error: &EngineError) -> Response {
    let payload = json!({
        "error": error.to_string(),
    });
    (engine_status(error), axum::Json(payload)).into_response()
}

/// Runs a service call on the blocking pool; table loads and calibration
/// searches are synchronous and CPU-bound.
async fn run_blocking<T, F>(service: Arc<RecommendationService>, work: F) -> Response
where
    T: Serialize + Send + 'static,
    F: FnOnce(&RecommendationService) -> Result<T, EngineError> + Send + 'static,
{
    match tokio::task::spawn_blocking(move || work(&service)).await {
        Ok(Ok(value)) => (StatusCode::OK, axum::Json(value)).into_response(),
        Ok(Err(error)) => engine_error_response(&error),
        Err(join_error) => {
            error!(%join_error, "scoring task did not complete");
            AppError::Io(std::io::Error::new(std::io::ErrorKind::Other, join_error))
                .into_response()
        }
    }
}

pub(crate) async fn recommend_handler(
    State(service): State<Arc<RecommendationService>>,
    axum::Json(request): axum::Json<RecommendationRequest>,
) -> Response {
    run_blocking(service, move |service| service.handle_request(&request)).await
}

pub(crate) async fn calibration_handler(
    State(service): State<Arc<RecommendationService>>,
) -> Response {
    (StatusCode::OK, axum::Json(service.calibration_snapshot())).into_response()
}

pub(crate) async fn calibrate_handler(
    State(service): State<Arc<RecommendationService>>,
    axum::Json(request): axum::Json<CalibrationRequest>,
) -> Response {
    run_blocking(service, move |service| service.calibrate(&request)).await
}

pub(crate) async fn optimize_weights_handler(
    State(service): State<Arc<RecommendationService>>,
    axum::Json(request): axum::Json<WeightOptimizationRequest>,
) -> Response {
    run_blocking(service, move |service| service.optimize_weights(&request)).await
}

pub(crate) async fn calibrate_scores_handler(
    State(service): State<Arc<RecommendationService>>,
    axum::Json(request): axum::Json<ScoreCalibrationRequest>,
) -> Response {
    run_blocking(service, move |service| service.calibrate_scores(&request)).await
}
