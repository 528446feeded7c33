//! QEats API - HTTP surface for restaurant discovery
//!
//! Axum handlers over the proximity filter and search aggregator. State is
//! wired once at startup by [`AppState::build`] and shared by clone.

pub mod config;
pub mod error;
pub mod routes;
pub mod state;
pub mod telemetry;

pub use config::{ApiConfig, LogFormat};
pub use error::{ApiError, ApiResult, ErrorCode};
pub use routes::{create_api_router, API_BASE};
pub use state::{local_clock, AppState, CacheKind, Clock};
