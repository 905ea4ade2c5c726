//! Pricing Engine - API Server Binary
//!
//! # Usage
//!
//! ```bash
//! PRICING_DATABASE_URL=postgres://... PRICING_DISTANCE_BASE_URL=https://... cargo run --bin pricing-api
//! ```
//!
//! # Environment Variables
//!
//! * `PRICING_HOST`, `PRICING_PORT` - bind address (default 0.0.0.0:8080)
//! * `PRICING_DATABASE_URL` - PostgreSQL connection string
//! * `PRICING_LOG_LEVEL` - fallback filter when `RUST_LOG` is unset (default: info)
//! * `PRICING_LOG_FORMAT` - `text` or `json`
//! * `PRICING_SNAPSHOT_TTL_SECS`, `PRICING_REFRESH_INTERVAL_SECS` - snapshot cache timing
//! * `PRICING_DISTANCE_BASE_URL`, `PRICING_DISTANCE_API_KEY`, `PRICING_DISTANCE_TIMEOUT_MS` - drive-time service
//! * `PRICING_CURRENCY` - reporting currency (default: USD)

use anyhow::Context;
use interface_api::config::{ApiConfig, LogFormat};
use interface_api::{create_router, AppState};
use infra_db::{create_pool, run_migrations, DatabaseConfig};
use tokio::net::TcpListener;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Load .env file if present (useful for local development)
    dotenvy::dotenv().ok();

    let config = ApiConfig::from_env().context("invalid PRICING_* configuration")?;
    init_tracing(&config);

    tracing::info!(
        host = %config.host,
        port = %config.port,
        snapshot_ttl_secs = config.snapshot_ttl_secs,
        "Starting pricing API server"
    );

    let pool = create_pool(DatabaseConfig::new(&config.database_url))
        .await
        .context("database connection failed")?;
    run_migrations(&pool).await.context("database migration failed")?;

    let state = AppState::from_pool(&config, pool)?;
    let refresher = state
        .service
        .snapshots()
        .clone()
        .spawn_refresher(config.refresh_interval());

    let listener = TcpListener::bind(config.server_addr())
        .await
        .with_context(|| format!("failed to bind {}", config.server_addr()))?;
    tracing::info!(addr = %config.server_addr(), "Listening");

    axum::serve(listener, create_router(state))
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    refresher.abort();
    tracing::info!("Server stopped");
    Ok(())
}

/// Initializes the tracing subscriber; `RUST_LOG` wins over the configured level
fn init_tracing(config: &ApiConfig) {
    let filter = EnvFilter::try_from_default_env()
        .or_else(|_| EnvFilter::try_new(&config.log_level))
        .unwrap_or_else(|_| EnvFilter::new("info"));

    let registry = tracing_subscriber::registry().with(filter);
    match config.log_format {
        LogFormat::Json => registry.with(tracing_subscriber::fmt::layer().json()).init(),
        LogFormat::Text => registry.with(tracing_subscriber::fmt::layer().with_target(true)).init(),
    }
}

/// Waits for Ctrl+C or SIGTERM
async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(e) = tokio::signal::ctrl_c().await {
            tracing::error!(error = %e, "Failed to listen for Ctrl+C");
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate()) {
            Ok(mut signal) => {
                signal.recv().await;
            }
            Err(e) => {
                tracing::error!(error = %e, "Failed to install SIGTERM handler");
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {
            tracing::info!("Received Ctrl+C, initiating graceful shutdown");
        }
        _ = terminate => {
            tracing::info!("Received SIGTERM, initiating graceful shutdown");
        }
    }
}
