//! Operator routes.

use axum::{extract::State, http::StatusCode, routing::post, Router};
use tracing::info;

use crate::error::ApiResult;
use crate::state::AppState;

/// POST /qeats/v1/cache/flush - drop every cached geo bucket
pub async fn flush_cache(State(state): State<AppState>) -> ApiResult<StatusCode> {
    state.index.flush().await?;
    info!(cache = state.cache_kind.as_str(), "Geo index cache flushed by operator");
    Ok(StatusCode::NO_CONTENT)
}

pub fn create_router() -> Router<AppState> {
    Router::new().route("/cache/flush", post(flush_cache))
}
