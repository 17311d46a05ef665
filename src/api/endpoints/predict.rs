//! Prediction endpoints.
//!
//! - `POST /predict`: symptoms in, disease plus reference data out
//! - `GET /predict/symptoms`: symptom catalog
//! - `GET /predict/diseases`: disease catalog
//! - `GET /predict/disease/:name`: reference data for one disease
//! - `GET /predict/symptom/severity/:name`: severity weight of one symptom
//! - `GET /predict/health`: router probe

use axum::extract::rejection::JsonRejection;
use axum::extract::{Path, State};
use axum::Json;

use crate::api::error::ApiError;
use crate::api::types::{
    ApiContext, DiseasesResponse, StatusResponse, SymptomInput, SymptomsResponse,
};
use crate::catalog::SymptomSeverity;
use crate::prediction::{DiseaseInfo, PredictionError, PredictionResult};

/// `POST /predict`: run one prediction.
///
/// An empty symptom list is a client error here, although the facade would
/// classify the all-zero vector.
///
/// Inference is CPU-bound, so it runs on the blocking pool.
pub async fn predict(
    State(ctx): State<ApiContext>,
    payload: Result<Json<SymptomInput>, JsonRejection>,
) -> Result<Json<PredictionResult>, ApiError> {
    let Json(input) = payload.map_err(|e| ApiError::BadRequest(e.body_text()))?;
    if input.symptoms.is_empty() {
        return Err(PredictionError::EmptySymptoms.into());
    }

    tracing::debug!(symptoms = input.symptoms.len(), "Prediction requested");

    let service = ctx.service.clone();
    let result = tokio::task::spawn_blocking(move || service.predict_disease(&input.symptoms))
        .await
        .map_err(|e| ApiError::Internal(format!("prediction task failed: {e}")))??;

    Ok(Json(result))
}

/// `GET /predict/symptoms`
pub async fn symptoms(
    State(ctx): State<ApiContext>,
) -> Result<Json<SymptomsResponse>, ApiError> {
    Ok(Json(SymptomsResponse {
        symptoms: ctx.service.list_symptoms()?,
    }))
}

/// `GET /predict/diseases`
pub async fn diseases(
    State(ctx): State<ApiContext>,
) -> Result<Json<DiseasesResponse>, ApiError> {
    Ok(Json(DiseasesResponse {
        diseases: ctx.service.list_diseases()?,
    }))
}

/// `GET /predict/disease/:name`: unknown names still answer 200 with
/// fallback fields.
pub async fn disease_info(
    State(ctx): State<ApiContext>,
    Path(name): Path<String>,
) -> Result<Json<DiseaseInfo>, ApiError> {
    Ok(Json(ctx.service.disease_info(&name)?))
}

/// `GET /predict/symptom/severity/:name`
pub async fn symptom_severity(
    State(ctx): State<ApiContext>,
    Path(name): Path<String>,
) -> Result<Json<SymptomSeverity>, ApiError> {
    Ok(Json(ctx.service.symptom_severity(&name)?))
}

/// `GET /predict/health`
pub async fn health() -> Json<StatusResponse> {
    Json(StatusResponse { status: "healthy" })
}
