//! HTTP API Layer
//!
//! REST surface of the pricing engine using Axum.
//!
//! # Architecture
//!
//! - **Handlers**: evaluation, snapshot inspection/refresh, health
//! - **Middleware**: request ids, tracing, request logging
//! - **DTOs**: request/response bodies with boundary validation
//! - **Error Handling**: consistent JSON error responses
//!
//! # Example
//!
//! ```rust,ignore
//! use interface_api::{create_router, AppState};
//!
//! let state = AppState::from_pool(&config, pool)?;
//! axum::serve(listener, create_router(state)).await?;
//! ```

pub mod config;
pub mod error;
pub mod middleware;
pub mod handlers;
pub mod dto;

use std::sync::Arc;

use axum::{
    middleware as axum_middleware,
    routing::{get, post},
    Router,
};
use sqlx::PgPool;
use tower_http::cors::{Any, CorsLayer};
use tower_http::request_id::{MakeRequestUuid, PropagateRequestIdLayer, SetRequestIdLayer};
use tower_http::trace::TraceLayer;

use core_kernel::HealthCheckable;
use domain_pricing::adapters::HttpDistanceService;
use domain_pricing::{EvaluationService, SnapshotLoader, SnapshotStore, UsageDispatcher};
use infra_db::{
    DatabaseHealth, PostgresPostalAdapter, PostgresRuleAdapter, PostgresUsageRecorder,
    PostgresZoneAdapter,
};

use crate::config::ApiConfig;
use crate::handlers::{evaluate, health, snapshot};
use crate::middleware::request_log;

/// Pending usage increments before new ones are dropped
const USAGE_QUEUE_CAPACITY: usize = 1024;

/// A dependency checked by the readiness probe
#[derive(Clone)]
pub struct Probe {
    pub check: Arc<dyn HealthCheckable>,
    pub required: bool,
}

/// Application state shared across handlers
#[derive(Clone)]
pub struct AppState {
    pub service: Arc<EvaluationService>,
    pub probes: Arc<Vec<Probe>>,
}

impl AppState {
    pub fn new(service: Arc<EvaluationService>, probes: Vec<Probe>) -> Self {
        Self {
            service,
            probes: Arc::new(probes),
        }
    }

    /// Wires the PostgreSQL adapters, the drive-time client and the usage
    /// writer behind an evaluation service. Must run inside a tokio runtime.
    pub fn from_pool(config: &ApiConfig, pool: PgPool) -> anyhow::Result<Self> {
        let loader = SnapshotLoader::new(
            Arc::new(PostgresRuleAdapter::new(pool.clone())),
            Arc::new(PostgresZoneAdapter::new(pool.clone())),
            Arc::new(PostgresPostalAdapter::new(pool.clone())),
        );
        let snapshots = Arc::new(SnapshotStore::new(loader, config.snapshot_ttl()));
        let distance = Arc::new(HttpDistanceService::new(config.drive_time_config())?);
        let (usage, _) = UsageDispatcher::spawn(
            Arc::new(PostgresUsageRecorder::new(pool.clone())),
            USAGE_QUEUE_CAPACITY,
        );

        let service = EvaluationService::new(snapshots, distance.clone(), usage, config.evaluation_config()?);
        let probes = vec![
            Probe {
                check: Arc::new(DatabaseHealth::new(pool)),
                required: true,
            },
            Probe {
                check: distance,
                required: false,
            },
        ];
        Ok(Self::new(Arc::new(service), probes))
    }
}

/// Creates the main API router
pub fn create_router(state: AppState) -> Router {
    let public_routes = Router::new()
        .route("/health", get(health::health_check))
        .route("/health/ready", get(health::readiness_check));

    let business_routes = Router::new()
        .route("/:business_id/evaluate", post(evaluate::evaluate))
        .route("/:business_id/snapshot", get(snapshot::get_snapshot))
        .route("/:business_id/snapshot/refresh", post(snapshot::refresh_snapshot));

    Router::new()
        .merge(public_routes)
        .nest("/api/v1/businesses", business_routes)
        .layer(axum_middleware::from_fn(request_log))
        .layer(TraceLayer::new_for_http())
        .layer(PropagateRequestIdLayer::x_request_id())
        .layer(SetRequestIdLayer::x_request_id(MakeRequestUuid))
        .layer(
            CorsLayer::new()
                .allow_origin(Any)
                .allow_methods(Any)
                .allow_headers(Any),
        )
        .with_state(state)
}
