//! HTTP Drive-Time Adapter
//!
//! Implements [`DistanceService`] against a routing API over HTTP:
//!
//! ```text
//! GET {base_url}/v1/drive-time?origin=34.05,-118.24&destination=34.1,-118.4
//! X-Api-Key: <key>
//!
//! 200 { "duration_seconds": 2040 }
//! ```
//!
//! # Error Handling
//!
//! Failures map to `PortError` variants:
//! - timeouts -> `PortError::Timeout`
//! - connection failures -> `PortError::Connection`
//! - 429 and 5xx -> `PortError::ServiceUnavailable`
//! - other 4xx -> `PortError::Validation`
//! - undecodable bodies -> `PortError::Transformation`
//!
//! A circuit breaker stops calling the API after repeated failures; the
//! engine then prices without zones until the breaker half-opens.

use async_trait::async_trait;
use serde::Deserialize;
use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};
use std::sync::Arc;
use std::time::{Duration, Instant};
use tokio::sync::RwLock;
use tracing::debug;

use core_kernel::{AdapterHealth, CircuitBreakerConfig, DomainPort, HealthCheckResult, HealthCheckable, PortError};

use crate::ports::DistanceService;
use crate::scenario::GeoPoint;

const ADAPTER_ID: &str = "http-drive-time";

/// Configuration for the HTTP drive-time adapter
#[derive(Debug, Clone)]
pub struct DriveTimeConfig {
    /// Base URL of the routing API (e.g., "https://routing.example.com")
    pub base_url: String,

    /// API key sent as `X-Api-Key`; omitted when empty
    pub api_key: String,

    /// Per-request timeout in milliseconds
    pub timeout_ms: u64,

    /// Circuit breaker configuration
    pub circuit_breaker: Option<CircuitBreakerConfig>,
}

impl Default for DriveTimeConfig {
    fn default() -> Self {
        Self {
            base_url: String::new(),
            api_key: String::new(),
            timeout_ms: 1500,
            circuit_breaker: Some(CircuitBreakerConfig {
                failure_threshold: 5,
                success_threshold: 2,
                reset_timeout_secs: 30,
            }),
        }
    }
}

/// Circuit breaker state for fault tolerance
#[derive(Debug)]
struct CircuitBreaker {
    config: CircuitBreakerConfig,
    failure_count: AtomicU64,
    success_count: AtomicU64,
    is_open: AtomicBool,
    opened_at: RwLock<Option<Instant>>,
}

impl CircuitBreaker {
    fn new(config: CircuitBreakerConfig) -> Self {
        Self {
            config,
            failure_count: AtomicU64::new(0),
            success_count: AtomicU64::new(0),
            is_open: AtomicBool::new(false),
            opened_at: RwLock::new(None),
        }
    }

    async fn is_available(&self) -> bool {
        if !self.is_open.load(Ordering::Relaxed) {
            return true;
        }

        // Half-open once the reset timeout has elapsed
        match *self.opened_at.read().await {
            Some(time) => time.elapsed() > Duration::from_secs(self.config.reset_timeout_secs),
            None => false,
        }
    }

    fn record_success(&self) {
        self.failure_count.store(0, Ordering::Relaxed);
        let success = self.success_count.fetch_add(1, Ordering::Relaxed) + 1;
        if success >= self.config.success_threshold as u64 {
            self.is_open.store(false, Ordering::Relaxed);
            self.success_count.store(0, Ordering::Relaxed);
        }
    }

    async fn record_failure(&self) {
        self.success_count.store(0, Ordering::Relaxed);
        let failures = self.failure_count.fetch_add(1, Ordering::Relaxed) + 1;
        // Any failure while half-open reopens immediately
        if self.is_open.load(Ordering::Relaxed) || failures >= self.config.failure_threshold as u64 {
            self.is_open.store(true, Ordering::Relaxed);
            *self.opened_at.write().await = Some(Instant::now());
        }
    }
}

#[derive(Debug, Deserialize)]
struct DriveTimeResponse {
    duration_seconds: u64,
}

/// Whole minutes, rounded up
fn minutes_from_seconds(seconds: u64) -> u32 {
    u32::try_from(seconds.div_ceil(60)).unwrap_or(u32::MAX)
}

fn map_request_error(err: reqwest::Error, timeout_ms: u64) -> PortError {
    if err.is_timeout() {
        PortError::Timeout {
            operation: "drive_time_minutes".to_string(),
            duration_ms: timeout_ms,
        }
    } else if err.is_connect() {
        PortError::Connection {
            message: format!("drive-time service unreachable: {}", err),
            source: Some(Box::new(err)),
        }
    } else if err.is_decode() {
        PortError::transformation(format!("unexpected drive-time response: {}", err))
    } else {
        PortError::Internal {
            message: format!("drive-time request failed: {}", err),
            source: Some(Box::new(err)),
        }
    }
}

/// Drive-time lookups over HTTP
#[derive(Debug)]
pub struct HttpDistanceService {
    config: DriveTimeConfig,
    client: reqwest::Client,
    circuit_breaker: Option<Arc<CircuitBreaker>>,
}

impl HttpDistanceService {
    pub fn new(config: DriveTimeConfig) -> Result<Self, PortError> {
        let client = reqwest::Client::builder()
            .timeout(Duration::from_millis(config.timeout_ms))
            .build()
            .map_err(|e| PortError::internal(format!("failed to build HTTP client: {}", e)))?;
        let circuit_breaker = config.circuit_breaker.clone().map(|cb| Arc::new(CircuitBreaker::new(cb)));

        Ok(Self {
            config,
            client,
            circuit_breaker,
        })
    }

    pub fn base_url(&self) -> &str {
        &self.config.base_url
    }

    /// Checks if the circuit breaker is open (blocking requests)
    pub async fn is_circuit_open(&self) -> bool {
        match &self.circuit_breaker {
            Some(cb) => !cb.is_available().await,
            None => false,
        }
    }

    fn url(&self, path: &str) -> String {
        format!("{}/{}", self.config.base_url.trim_end_matches('/'), path)
    }

    async fn request(&self, origin: GeoPoint, destination: GeoPoint) -> Result<u32, PortError> {
        let mut request = self
            .client
            .get(self.url("v1/drive-time"))
            .query(&[("origin", origin.to_string()), ("destination", destination.to_string())]);
        if !self.config.api_key.is_empty() {
            request = request.header("X-Api-Key", &self.config.api_key);
        }

        let response = request
            .send()
            .await
            .map_err(|e| map_request_error(e, self.config.timeout_ms))?;

        let status = response.status();
        if status.as_u16() == 429 || status.is_server_error() {
            return Err(PortError::ServiceUnavailable {
                service: format!("drive-time service returned {}", status),
            });
        }
        if status.is_client_error() {
            return Err(PortError::validation(format!("drive-time service rejected request: {}", status)));
        }

        let body: DriveTimeResponse = response
            .json()
            .await
            .map_err(|e| map_request_error(e, self.config.timeout_ms))?;
        Ok(minutes_from_seconds(body.duration_seconds))
    }
}

impl DomainPort for HttpDistanceService {}

#[async_trait]
impl HealthCheckable for HttpDistanceService {
    async fn health_check(&self) -> HealthCheckResult {
        let start = Instant::now();

        if self.is_circuit_open().await {
            return HealthCheckResult::with_status(ADAPTER_ID, AdapterHealth::Degraded, 0, "Circuit breaker is open");
        }

        let result = self.client.get(self.url("health")).send().await;
        let latency_ms = start.elapsed().as_millis() as u64;
        match result {
            Ok(response) if response.status().is_success() => HealthCheckResult::healthy(ADAPTER_ID, latency_ms),
            Ok(response) => HealthCheckResult::with_status(
                ADAPTER_ID,
                AdapterHealth::Degraded,
                latency_ms,
                format!("health endpoint returned {}", response.status()),
            ),
            Err(e) => HealthCheckResult::with_status(ADAPTER_ID, AdapterHealth::Unhealthy, latency_ms, e.to_string()),
        }
    }
}

#[async_trait]
impl DistanceService for HttpDistanceService {
    async fn drive_time_minutes(&self, origin: GeoPoint, destination: GeoPoint) -> Result<u32, PortError> {
        if let Some(cb) = &self.circuit_breaker {
            if !cb.is_available().await {
                return Err(PortError::ServiceUnavailable {
                    service: "drive-time circuit breaker is open".to_string(),
                });
            }
        }

        let result = self.request(origin, destination).await;

        if let Some(cb) = &self.circuit_breaker {
            match &result {
                Ok(_) => cb.record_success(),
                // Rejected input says nothing about the service's health
                Err(PortError::Validation { .. }) => {}
                Err(_) => cb.record_failure().await,
            }
        }
        if let Ok(minutes) = &result {
            debug!(minutes, %origin, %destination, "Drive time fetched");
        }
        result
    }
}
