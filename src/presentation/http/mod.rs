//! HTTP presentation layer: `AppState`, router assembly, handlers, middleware.

pub mod error_response;
pub mod handlers;
pub mod middleware;

use std::sync::Arc;

use axum::routing::{get, post};
use axum::Router;
use tower_http::trace::TraceLayer;

use crate::application::use_cases::{ControlUseCases, ResolvePlayable};
use crate::infrastructure::filesystem::PathResolver;

#[derive(Clone)]
pub struct AppState {
    pub path_resolver: Arc<PathResolver>,
    pub resolve_playable: Arc<ResolvePlayable>,
    pub control: Arc<ControlUseCases>,
}

pub fn router(state: AppState) -> Router {
    Router::new()
        .route("/stream/*path", get(handlers::stream_handler))
        .route(
            "/transcode-status/*path",
            get(handlers::transcode_status_handler),
        )
        .route("/transcode", post(handlers::prewarm_handler))
        .route("/cache/stats", get(handlers::cache_stats_handler))
        .route("/healthz", get(handlers::health_handler))
        .layer(axum::middleware::from_fn(middleware::logging_middleware))
        .layer(middleware::cors_layer())
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}
