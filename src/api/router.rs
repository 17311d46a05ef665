//! HTTP router.
//!
//! Prediction and health routes live under `settings.api_prefix`; the
//! welcome route, the load-balancer probe and `/static` are unprefixed.
//!
//! Layer stack (outermost → innermost):
//! 1. CORS → 2. Trace → 3. Catch panic → Handler

use axum::extract::DefaultBodyLimit;
use axum::http::HeaderValue;
use axum::response::{IntoResponse, Response};
use axum::routing::{get, post};
use axum::Router;
use tower_http::catch_panic::CatchPanicLayer;
use tower_http::cors::{AllowHeaders, AllowMethods, AllowOrigin, Any, CorsLayer};
use tower_http::services::ServeDir;
use tower_http::trace::TraceLayer;

use crate::api::endpoints;
use crate::api::error::ApiError;
use crate::api::types::ApiContext;
use crate::config::Settings;

/// Maximum accepted `POST /predict` body.
pub const PREDICT_BODY_LIMIT: usize = 64 * 1024;

/// Build the full application router.
///
/// NOTE: Path params use `:param` syntax (matchit 0.7 / axum 0.7).
pub fn api_router(ctx: ApiContext) -> Router {
    let prefix = ctx.settings.api_prefix.clone();
    let cors = cors_layer(&ctx.settings);
    let static_dir = ctx.settings.static_dir.clone();

    let predict = post(endpoints::predict::predict).layer(DefaultBodyLimit::max(PREDICT_BODY_LIMIT));

    let mut router = Router::new()
        .route("/", get(endpoints::root::welcome))
        .route(&format!("{prefix}/predict"), predict.clone())
        .route(&format!("{prefix}/predict/"), predict)
        .route(
            &format!("{prefix}/predict/symptoms"),
            get(endpoints::predict::symptoms),
        )
        .route(
            &format!("{prefix}/predict/diseases"),
            get(endpoints::predict::diseases),
        )
        .route(
            &format!("{prefix}/predict/disease/:name"),
            get(endpoints::predict::disease_info),
        )
        .route(
            &format!("{prefix}/predict/symptom/severity/:name"),
            get(endpoints::predict::symptom_severity),
        )
        .route(
            &format!("{prefix}/predict/health"),
            get(endpoints::predict::health),
        )
        .route(&format!("{prefix}/health"), get(endpoints::health::check))
        .route(&format!("{prefix}/health/ready"), get(endpoints::health::ready))
        .route(&format!("{prefix}/health/live"), get(endpoints::health::live));

    // With an empty prefix the API health route already owns `/health`.
    if !prefix.is_empty() {
        router = router.route("/health", get(endpoints::health::probe));
    }

    router
        .with_state(ctx)
        .nest_service("/static", ServeDir::new(static_dir))
        .fallback(not_found)
        .layer(CatchPanicLayer::custom(panic_response))
        .layer(TraceLayer::new_for_http())
        .layer(cors)
}

fn cors_layer(settings: &Settings) -> CorsLayer {
    if settings.allows_any_origin() {
        return CorsLayer::new()
            .allow_origin(Any)
            .allow_methods(Any)
            .allow_headers(Any);
    }

    let origins: Vec<HeaderValue> = settings
        .cors_origins
        .iter()
        .filter_map(|origin| match HeaderValue::from_str(origin) {
            Ok(value) => Some(value),
            Err(_) => {
                tracing::warn!(origin = %origin, "Ignoring invalid CORS origin");
                None
            }
        })
        .collect();

    // Credentials forbid wildcards, so methods and headers mirror the request.
    CorsLayer::new()
        .allow_origin(AllowOrigin::list(origins))
        .allow_methods(AllowMethods::mirror_request())
        .allow_headers(AllowHeaders::mirror_request())
        .allow_credentials(true)
}

async fn not_found() -> ApiError {
    ApiError::NotFound("Route not found".into())
}

fn panic_response(err: Box<dyn std::any::Any + Send + 'static>) -> Response {
    let detail = if let Some(s) = err.downcast_ref::<String>() {
        s.clone()
    } else if let Some(s) = err.downcast_ref::<&str>() {
        (*s).to_string()
    } else {
        "unknown panic payload".to_string()
    };
    ApiError::Internal(format!("handler panicked: {detail}")).into_response()
}
