//! Health Check Routes
//!
//! - `/health/live`: the process is up
//! - `/health/ready`: whether the cache is reachable, plus geo index counters
//!
//! The cache is optional for correctness, so readiness reports `degraded`
//! rather than failing when it is down.

use axum::{extract::State, http::StatusCode, response::IntoResponse, routing::get, Json, Router};
use serde::{Deserialize, Serialize};

use crate::state::AppState;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum HealthStatus {
    Healthy,
    Degraded,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CacheHealth {
    pub backend: String,
    pub reachable: bool,
    pub hits: u64,
    pub misses: u64,
    pub bypasses: u64,
    pub store_reads: u64,
    pub write_failures: u64,
    pub hit_rate: f64,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct HealthResponse {
    pub status: HealthStatus,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub message: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub cache: Option<CacheHealth>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub version: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub uptime_seconds: Option<u64>,
}

/// GET /health/live - Process liveness check
pub async fn liveness() -> impl IntoResponse {
    let response = HealthResponse {
        status: HealthStatus::Healthy,
        message: Some("Process is alive".to_string()),
        cache: None,
        version: None,
        uptime_seconds: None,
    };
    (StatusCode::OK, Json(response))
}

/// GET /health/ready - Readiness with cache reachability
pub async fn readiness(State(state): State<AppState>) -> impl IntoResponse {
    let reachable = state.index.is_reachable().await;
    let stats = state.index.stats();

    let response = HealthResponse {
        status: if reachable {
            HealthStatus::Healthy
        } else {
            HealthStatus::Degraded
        },
        message: (!reachable).then(|| "Cache unreachable, serving from store".to_string()),
        cache: Some(CacheHealth {
            backend: state.cache_kind.as_str().to_string(),
            reachable,
            hit_rate: stats.hit_rate(),
            hits: stats.hits,
            misses: stats.misses,
            bypasses: stats.bypasses,
            store_reads: stats.store_reads,
            write_failures: stats.write_failures,
        }),
        version: Some(env!("CARGO_PKG_VERSION").to_string()),
        uptime_seconds: Some(state.start_time.elapsed().as_secs()),
    };

    (StatusCode::OK, Json(response))
}

/// Create health check router
pub fn create_router() -> Router<AppState> {
    Router::new()
        .route("/live", get(liveness))
        .route("/ready", get(readiness))
}
