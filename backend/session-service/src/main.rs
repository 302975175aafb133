/// Session Service Main Entry Point
///
/// Brings up:
/// - PostgreSQL connection pool and migrations
/// - Session service (login, refresh rotation, activation)
/// - Expired-token reaper (background task)
///
/// then idles until Ctrl+C or SIGTERM.
use anyhow::{Context, Result};
use session_service::{config::Settings, context::AppContext};
use tokio::signal;
use tracing::info;

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            std::env::var("RUST_LOG").unwrap_or_else(|_| "session_service=info,info".into()),
        )
        .with_target(false)
        .json()
        .init();

    info!("Starting Session Service");

    let settings = Settings::load().context("Failed to load configuration")?;
    info!("Configuration loaded successfully");

    let context = AppContext::init(&settings)
        .await
        .context("Failed to initialize session service")?;

    shutdown_signal().await;

    context.shutdown().await;
    info!("Session service shutdown complete");

    Ok(())
}

/// Wait for shutdown signal (Ctrl+C or SIGTERM)
async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(err) = signal::ctrl_c().await {
            tracing::error!("Failed to install Ctrl+C handler: {}", err);
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match signal::unix::signal(signal::unix::SignalKind::terminate()) {
            Ok(mut sigterm) => {
                sigterm.recv().await;
            }
            Err(err) => {
                tracing::error!("Failed to install SIGTERM handler: {}", err);
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {
            info!("Received Ctrl+C signal");
        },
        _ = terminate => {
            info!("Received SIGTERM signal");
        },
    }

    info!("Shutting down gracefully...");
}
