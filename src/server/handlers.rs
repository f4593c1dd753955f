//! HTTP request handlers

use std::sync::Arc;
use std::time::Instant;

use axum::{
    body::Bytes,
    extract::{rejection::BytesRejection, State},
    response::{IntoResponse, Response},
    Json,
};
use serde::{Deserialize, Serialize};
use tracing::info;

use crate::records;
use super::error::{Result, ServerError};
use super::state::AppState;

/// Body returned by the liveness route
pub const LIVENESS_MESSAGE: &str = "Now Run Successfully......";

/// Successful prediction body
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PredictResponse {
    #[serde(rename = "Prediction")]
    pub prediction: Vec<f64>,
}

pub async fn home() -> &'static str {
    LIVENESS_MESSAGE
}

pub async fn predict(
    State(state): State<Arc<AppState>>,
    body: std::result::Result<Bytes, BytesRejection>,
) -> Response {
    let policy = state.config.error_status;
    match run_prediction(state, body).await {
        Ok(prediction) => Json(PredictResponse { prediction }).into_response(),
        Err(err) => err.into_response_with(policy),
    }
}

async fn run_prediction(
    state: Arc<AppState>,
    body: std::result::Result<Bytes, BytesRejection>,
) -> Result<Vec<f64>> {
    let body = body?;
    let start = Instant::now();
    let pipeline = Arc::clone(&state.pipeline);

    let predictions = tokio::task::spawn_blocking(move || {
        let frame = records::parse_body(&body)?;
        pipeline.predict(&frame)
    })
    .await
    .map_err(|e| ServerError::Internal(format!("prediction task failed: {}", e)))??;

    info!(
        rows = predictions.len(),
        latency_ms = start.elapsed().as_secs_f64() * 1000.0,
        "Prediction served"
    );
    Ok(predictions)
}

pub async fn handle_404() -> ServerError {
    ServerError::NotFound("Visit / for the liveness check or POST /predict".to_string())
}

pub async fn handle_405() -> ServerError {
    ServerError::MethodNotAllowed
}
