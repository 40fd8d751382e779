//! Sunroom token server library logic.
//!
//! A small axum application: `POST /api/token` mints LiveKit join tokens and
//! `GET /health` reports liveness. The chat page is served elsewhere, so the
//! router allows cross-origin requests.

pub mod api;
pub mod config;
pub mod middleware;

use axum::{
    extract::DefaultBodyLimit,
    routing::{get, post},
    Extension, Json, Router,
};
use middleware::RateLimiter;
use serde_json::{json, Value};
use std::sync::Arc;
use sunroom_voice::TokenService;
use tower_http::cors::{Any, CorsLayer};
use tower_http::trace::TraceLayer;

/// Application state shared across all request handlers.
#[derive(Clone, Debug)]
pub struct AppState {
    /// Signs join tokens.
    pub token_service: Arc<TokenService>,
    /// Rate limiter state.
    pub rate_limiter: RateLimiter,
    /// Token requests allowed per client IP per minute.
    pub token_rate_limit: u32,
}

impl AppState {
    pub fn from_config(config: &config::Config) -> Self {
        Self {
            token_service: Arc::new(TokenService::new(config.livekit.clone())),
            rate_limiter: RateLimiter::new(),
            token_rate_limit: config.rate_limit.token_requests_per_minute,
        }
    }
}

/// Maximum request body size (64 KiB). A token request is two short strings.
const MAX_REQUEST_BODY_BYTES: usize = 64 * 1024;

/// Health check handler.
async fn health() -> Json<Value> {
    Json(json!({
        "status": "ok",
        "version": env!("CARGO_PKG_VERSION")
    }))
}

/// Builds the application router with all routes.
pub fn app(state: AppState) -> Router {
    let token_routes = Router::new()
        .route("/api/token", post(api::token_handler))
        .route_layer(axum::middleware::from_fn(middleware::rate_limit_middleware));

    Router::new()
        .route("/health", get(health))
        .merge(token_routes)
        .layer(DefaultBodyLimit::max(MAX_REQUEST_BODY_BYTES))
        .layer(TraceLayer::new_for_http())
        .layer(
            CorsLayer::new()
                .allow_origin(Any)
                .allow_methods(Any)
                .allow_headers(Any),
        )
        .layer(Extension(Arc::new(state)))
}
