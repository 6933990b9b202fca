//! Stockwatch prediction API
//!
//! Serves probabilities from a single artifact bundle loaded at startup.
//! Handlers only read the shared [`Predictor`], so a failing request never
//! affects the next one.

use axum::{
    extract::State,
    http::StatusCode,
    response::{IntoResponse, Json, Response},
    routing::{get, post},
    Router,
};
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use stockwatch_core::{CoreError, Predictor, TransactionQuery};
use thiserror::Error;
use tower_http::trace::TraceLayer;
use tracing::{debug, warn};

/// Shared handler state
pub type SharedPredictor = Arc<Predictor>;

/// Scoring response
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PredictionResponse {
    pub probability: f64,
}

/// Liveness response, tagged with the served bundle
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct HealthResponse {
    pub status: String,
    pub bundle_id: String,
    pub version: String,
}

#[derive(Debug, Serialize)]
struct ErrorBody {
    error: String,
}

/// Request failures and their HTTP mapping
#[derive(Debug, Error)]
pub enum ApiError {
    #[error(transparent)]
    Core(#[from] CoreError),
}

impl ApiError {
    pub fn status(&self) -> StatusCode {
        match self {
            ApiError::Core(
                CoreError::UnseenCategory { .. } | CoreError::InputOrderMismatch { .. } | CoreError::InvalidRecord(_),
            ) => StatusCode::UNPROCESSABLE_ENTITY,
            ApiError::Core(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let status = self.status();
        warn!(%status, "prediction rejected: {}", self);
        (status, Json(ErrorBody { error: self.to_string() })).into_response()
    }
}

/// Create the API router
pub fn create_router(predictor: SharedPredictor) -> Router {
    Router::new()
        .route("/health", get(health))
        .route("/predict", post(predict))
        .layer(TraceLayer::new_for_http())
        .with_state(predictor)
}

async fn health(State(predictor): State<SharedPredictor>) -> Json<HealthResponse> {
    Json(HealthResponse {
        status: "ok".to_string(),
        bundle_id: predictor.bundle().bundle_id().to_string(),
        version: env!("CARGO_PKG_VERSION").to_string(),
    })
}

async fn predict(
    State(predictor): State<SharedPredictor>,
    Json(query): Json<TransactionQuery>,
) -> Result<Json<PredictionResponse>, ApiError> {
    debug!(ticker = %query.ticker, representative = %query.representative, "scoring request");
    let probability = predictor.predict(&query)?;
    Ok(Json(PredictionResponse { probability }))
}
