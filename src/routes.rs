//! API route handlers.

use axum::{
    extract::State,
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use std::sync::Arc;

use crate::config::AppConfig;
use crate::predictor::resolve_batch;
use crate::types::{
    ErrorResponse, FailureReport, HealthResponse, ResolveRequest, ResolveResponse,
};

/// Application state shared across handlers.
pub struct AppState {
    pub config: AppConfig,
}

/// Error type for API handlers.
#[derive(Debug)]
pub struct ApiError {
    status: StatusCode,
    message: String,
}

impl ApiError {
    pub fn bad_request(msg: impl Into<String>) -> Self {
        Self {
            status: StatusCode::BAD_REQUEST,
            message: msg.into(),
        }
    }

    #[allow(dead_code)]
    pub fn internal(msg: impl Into<String>) -> Self {
        Self {
            status: StatusCode::INTERNAL_SERVER_ERROR,
            message: msg.into(),
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let body = Json(ErrorResponse {
            error: self.status.to_string(),
            message: self.message,
        });
        (self.status, body).into_response()
    }
}

/// Health check endpoint.
pub async fn health() -> Json<HealthResponse> {
    Json(HealthResponse {
        status: "ok".to_string(),
        version: env!("CARGO_PKG_VERSION").to_string(),
    })
}

/// Batch resolution endpoint.
///
/// Per-race failures are reported in the response body, not as an HTTP
/// error: one bad race never blocks the rest of the batch.
pub async fn resolve(
    State(state): State<Arc<AppState>>,
    Json(req): Json<ResolveRequest>,
) -> Result<Json<ResolveResponse>, ApiError> {
    if req.tickets.is_empty() {
        return Err(ApiError::bad_request("No betting tickets provided"));
    }

    let outcome = resolve_batch(&req.tickets, &req.races, &state.config.predictor);

    Ok(Json(ResolveResponse {
        records: outcome.records,
        failures: outcome
            .failures
            .into_iter()
            .map(|failure| FailureReport {
                race_id: failure.race_id,
                error: failure.error.to_string(),
            })
            .collect(),
    }))
}
