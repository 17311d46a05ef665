//! Welcome endpoint.

use axum::extract::State;
use axum::Json;
use serde::Serialize;

use crate::api::types::ApiContext;

#[derive(Serialize)]
pub struct WelcomeResponse {
    pub message: String,
    pub docs: String,
    pub version: &'static str,
}

/// `GET /`
pub async fn welcome(State(ctx): State<ApiContext>) -> Json<WelcomeResponse> {
    Json(WelcomeResponse {
        message: format!("Welcome to {}", crate::config::APP_NAME),
        docs: format!("{}/predict/symptoms", ctx.settings.api_prefix),
        version: crate::config::APP_VERSION,
    })
}
