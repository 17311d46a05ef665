//! Shared types for the HTTP API layer.

use std::sync::Arc;

use serde::{Deserialize, Serialize};

use crate::catalog::CatalogEntry;
use crate::config::Settings;
use crate::prediction::ModelService;

/// Shared context for all API routes.
/// Wraps the prediction facade plus the settings it was loaded from.
#[derive(Clone)]
pub struct ApiContext {
    pub service: Arc<ModelService>,
    pub settings: Arc<Settings>,
    pub instance_id: String,
    pub started_at: String,
}

impl ApiContext {
    pub fn new(service: Arc<ModelService>, settings: Arc<Settings>) -> Self {
        Self {
            service,
            settings,
            instance_id: uuid::Uuid::new_v4().to_string(),
            started_at: chrono::Utc::now().to_rfc3339(),
        }
    }
}

/// Body of `POST /predict`.
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct SymptomInput {
    pub symptoms: Vec<String>,
}

#[derive(Debug, Serialize)]
pub struct SymptomsResponse {
    pub symptoms: Vec<CatalogEntry>,
}

#[derive(Debug, Serialize)]
pub struct DiseasesResponse {
    pub diseases: Vec<CatalogEntry>,
}

/// Generic `{"status": ...}` probe body.
#[derive(Debug, Serialize)]
pub struct StatusResponse {
    pub status: &'static str,
}
