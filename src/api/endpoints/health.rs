//! Health check endpoints.

use axum::extract::State;
use axum::Json;
use serde::Serialize;

use crate::api::error::ApiError;
use crate::api::types::{ApiContext, StatusResponse};
use crate::prediction::ServicePhase;

#[derive(Serialize)]
pub struct HealthResponse {
    pub status: &'static str,
    pub version: &'static str,
    pub platform: &'static str,
    pub phase: ServicePhase,
    pub instance_id: String,
    pub started_at: String,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub missing_files: Vec<String>,
}

/// `GET /health`: file presence plus service phase.
///
/// Always 200; `status` reads `degraded` when a required file is gone
/// or the service is not serving.
pub async fn check(State(ctx): State<ApiContext>) -> Json<HealthResponse> {
    let missing_files: Vec<String> = ctx
        .settings
        .missing_files()
        .iter()
        .map(|p| p.display().to_string())
        .collect();
    let phase = ctx.service.phase();

    if !missing_files.is_empty() {
        tracing::warn!(missing = missing_files.len(), "Health check found missing files");
    }

    let status = if missing_files.is_empty() && phase == ServicePhase::Ready {
        "healthy"
    } else {
        "degraded"
    };

    Json(HealthResponse {
        status,
        version: crate::config::APP_VERSION,
        platform: std::env::consts::OS,
        phase,
        instance_id: ctx.instance_id.clone(),
        started_at: ctx.started_at.clone(),
        missing_files,
    })
}

/// `GET /health/ready`: 503 until the service is `Ready`.
pub async fn ready(State(ctx): State<ApiContext>) -> Result<Json<StatusResponse>, ApiError> {
    match ctx.service.unavailable_reason() {
        None => Ok(Json(StatusResponse { status: "ready" })),
        Some(reason) => Err(ApiError::ServiceUnavailable(reason.to_string())),
    }
}

/// `GET /health/live`
pub async fn live() -> Json<StatusResponse> {
    Json(StatusResponse { status: "alive" })
}

/// Unprefixed `GET /health` for load balancers.
pub async fn probe() -> Json<StatusResponse> {
    Json(StatusResponse { status: "ok" })
}
