use anyhow::{Context, Result};
use std::time::Duration;
use tracing::info;

use autoshop_api::{app, config, jobs, middleware};

#[tokio::main]
async fn main() -> Result<()> {
    // Load .env file if present
    dotenvy::dotenv().ok();

    let config = config::Config::load().context("Failed to load configuration")?;
    config.validate()?;

    middleware::logging::init_logging(&config.logging).context("Failed to initialize logging")?;
    middleware::init_metrics().context("Failed to install Prometheus recorder")?;

    info!("Starting Auto Shop API v{}", env!("CARGO_PKG_VERSION"));

    let pool = persistence::db::create_pool(&(&config.database).into())
        .await
        .context("Failed to connect to database")?;

    let addr = config.socket_addr()?;
    let state = app::AppState::new(config, pool.clone()).context("Failed to build application")?;

    let mut scheduler = jobs::JobScheduler::new();
    scheduler.register(jobs::PoolMetricsJob::new(pool.clone()));
    scheduler.register(jobs::WebAuthnCleanupJob::new(pool));
    if let Some(limiter) = state.rate_limiter.clone() {
        scheduler.register(jobs::RateLimitPruneJob::new(limiter));
    }
    scheduler.start();

    let app = app::build_router(state);

    info!("Server listening on {}", addr);
    let listener = tokio::net::TcpListener::bind(addr).await?;
    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    info!("Server stopped, waiting for background jobs");
    scheduler.shutdown();
    scheduler.wait_for_shutdown(Duration::from_secs(10)).await;

    Ok(())
}

async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(e) = tokio::signal::ctrl_c().await {
            tracing::error!(error = %e, "Failed to listen for Ctrl+C");
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate()) {
            Ok(mut signal) => {
                signal.recv().await;
            }
            Err(e) => tracing::error!(error = %e, "Failed to listen for SIGTERM"),
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {},
        _ = terminate => {},
    }
    info!("Shutdown signal received");
}
