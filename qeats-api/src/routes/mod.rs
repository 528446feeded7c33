//! REST API Routes Module
//!
//! - `/qeats/v1/restaurants`: nearby listing and search
//! - `/qeats/v1/cache/flush`: operator cache reset
//! - `/health/*`: liveness and readiness

pub mod admin;
pub mod health;
pub mod restaurants;

use axum::Router;
use tower_http::trace::TraceLayer;

use crate::state::AppState;

/// Base path of the public API.
pub const API_BASE: &str = "/qeats/v1";

/// Assemble the full application router.
pub fn create_api_router(state: AppState) -> Router {
    let api = Router::new()
        .merge(restaurants::create_router())
        .merge(admin::create_router());

    Router::new()
        .nest(API_BASE, api)
        .nest("/health", health::create_router())
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}
