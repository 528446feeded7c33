//! QEats API Server Entry Point
//!
//! Loads configuration from the environment, wires the store and cache, and
//! starts the Axum HTTP server.

use axum::Router;
use qeats_api::telemetry::init_tracing;
use qeats_api::{create_api_router, ApiConfig, ApiError, ApiResult, AppState};

#[tokio::main]
async fn main() -> ApiResult<()> {
    let config = ApiConfig::from_env()?;
    init_tracing(config.log_format)?;

    let state = AppState::build(&config).await?;
    tracing::info!(
        cache = state.cache_kind.as_str(),
        cache_ttl_secs = config.core.cache.entry_ttl.as_secs(),
        peak_radius_km = config.core.serving.peak_radius_km,
        normal_radius_km = config.core.serving.normal_radius_km,
        "Application state ready"
    );

    let app: Router = create_api_router(state);

    let addr = config.bind_addr;
    tracing::info!(%addr, "Starting QEats API server");

    let listener = tokio::net::TcpListener::bind(addr)
        .await
        .map_err(|e| ApiError::internal_error(format!("Failed to bind {}: {}", addr, e)))?;

    let server = axum::serve(listener, app);
    tokio::select! {
        result = server => {
            result.map_err(|e| ApiError::internal_error(format!("Server error: {}", e)))?;
        }
        _ = tokio::signal::ctrl_c() => {
            tracing::info!("Shutdown signal received");
        }
    }

    Ok(())
}
