use std::process::ExitCode;

use tracing_subscriber::EnvFilter;

use aidoctor::config::{self, Settings};

#[tokio::main]
async fn main() -> ExitCode {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| EnvFilter::new(config::default_log_filter())),
        )
        .init();

    let settings = match Settings::from_env() {
        Ok(settings) => settings,
        Err(e) => {
            tracing::error!("{}", aidoctor::StartupError::Config(e));
            return ExitCode::FAILURE;
        }
    };

    if std::env::args().skip(1).any(|arg| arg == "--check") {
        return if aidoctor::run_check(&settings) {
            ExitCode::SUCCESS
        } else {
            ExitCode::FAILURE
        };
    }

    match aidoctor::run(settings).await {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            tracing::error!("Startup failed: {e}");
            ExitCode::FAILURE
        }
    }
}
