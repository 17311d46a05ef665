pub mod api;
pub mod catalog; // Symptom/disease catalogs + reference tables
pub mod config;
pub mod prediction; // Encoder, inference, aggregation, facade

use std::path::PathBuf;
use std::sync::Arc;

use crate::api::ApiContext;
use crate::config::Settings;
use crate::prediction::{ModelService, PredictionError};

/// Failures that stop the process before or while serving.
#[derive(Debug, thiserror::Error)]
pub enum StartupError {
    #[error("Configuration error: {0}")]
    Config(String),
    #[error("Missing required files: {}", format_paths(.0))]
    MissingFiles(Vec<PathBuf>),
    #[error(transparent)]
    Load(#[from] PredictionError),
    #[error("Service degraded: {0}")]
    Degraded(String),
    #[error("Failed to create static directory {path}: {source}")]
    StaticDir {
        path: PathBuf,
        source: std::io::Error,
    },
    #[error("Server error: {0}")]
    Server(String),
}

fn format_paths(paths: &[PathBuf]) -> String {
    paths
        .iter()
        .map(|p| p.display().to_string())
        .collect::<Vec<_>>()
        .join(", ")
}

/// Verify files, load everything, and apply the strict-startup policy.
///
/// Fails fast: no request is served until this returns `Ok`.
pub fn initialize(settings: &Settings) -> Result<ModelService, StartupError> {
    tracing::info!(
        base_dir = %settings.base_dir.display(),
        data_dir = %settings.data_dir.display(),
        model = %settings.model_path.display(),
        "Resolving data files"
    );

    let missing = settings.missing_files();
    if !missing.is_empty() {
        for path in &missing {
            tracing::error!(path = %path.display(), "Required file not found");
        }
        return Err(StartupError::MissingFiles(missing));
    }

    let service = ModelService::load(settings)?;

    if let Some(reason) = service.unavailable_reason() {
        if settings.strict_startup {
            return Err(StartupError::Degraded(reason.to_string()));
        }
        tracing::warn!(%reason, "Serving in degraded mode, strict startup disabled");
    }

    Ok(service)
}

/// Start serving and block until Ctrl-C or SIGTERM.
pub async fn run(settings: Settings) -> Result<(), StartupError> {
    tracing::info!("{} starting v{}", config::APP_NAME, config::APP_VERSION);

    let service = initialize(&settings)?;

    std::fs::create_dir_all(&settings.static_dir).map_err(|source| StartupError::StaticDir {
        path: settings.static_dir.clone(),
        source,
    })?;

    let addr = settings.bind_addr;
    let ctx = ApiContext::new(Arc::new(service), Arc::new(settings));
    let mut server = api::start_server(ctx, addr)
        .await
        .map_err(StartupError::Server)?;

    wait_for_shutdown_signal().await;
    tracing::info!("Shutdown signal received");

    server.shutdown();
    server.wait().await;
    Ok(())
}

/// `--check` mode: report every file and the resulting phase.
///
/// Returns `true` when the service would come up `Ready`.
pub fn run_check(settings: &Settings) -> bool {
    for path in settings.required_files() {
        if path.exists() {
            tracing::info!(path = %path.display(), "found");
        } else {
            tracing::error!(path = %path.display(), "missing");
        }
    }

    match initialize(settings) {
        Ok(service) => {
            tracing::info!(phase = ?service.phase(), "Check passed");
            service.is_ready()
        }
        Err(e) => {
            tracing::error!("Check failed: {e}");
            false
        }
    }
}

async fn wait_for_shutdown_signal() {
    #[cfg(unix)]
    {
        use tokio::signal::unix::{signal, SignalKind};
        match signal(SignalKind::terminate()) {
            Ok(mut sigterm) => {
                tokio::select! {
                    _ = sigterm.recv() => {}
                    _ = tokio::signal::ctrl_c() => {}
                }
            }
            Err(e) => {
                tracing::warn!("Cannot register SIGTERM handler: {e}");
                let _ = tokio::signal::ctrl_c().await;
            }
        }
    }
    #[cfg(not(unix))]
    {
        let _ = tokio::signal::ctrl_c().await;
    }
}
