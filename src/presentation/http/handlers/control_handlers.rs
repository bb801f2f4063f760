//! Control Endpoints (spec §4.8)

use axum::extract::{Path as AxumPath, State};
use axum::response::{IntoResponse, Json};
use serde::Deserialize;
use serde_json::json;

use crate::presentation::http::AppState;
use crate::shared::error::ApplicationError;

pub async fn transcode_status_handler(
    State(state): State<AppState>,
    AxumPath(path): AxumPath<String>,
) -> Result<impl IntoResponse, ApplicationError> {
    let src_abs = state.path_resolver.resolve(&path)?;
    let status = state.control.status(&src_abs).await?;
    Ok(Json(status))
}

#[derive(Debug, Deserialize)]
pub struct PrewarmRequest {
    pub path: String,
}

pub async fn prewarm_handler(
    State(state): State<AppState>,
    Json(body): Json<PrewarmRequest>,
) -> Result<impl IntoResponse, ApplicationError> {
    let src_abs = state.path_resolver.resolve(&body.path)?;
    let status = state.control.prewarm(&src_abs).await?;
    Ok(Json(json!({ "status": status })))
}

pub async fn cache_stats_handler(
    State(state): State<AppState>,
) -> Result<impl IntoResponse, ApplicationError> {
    let stats = state.control.cache_stats().await;
    Ok(Json(stats))
}

pub async fn health_handler() -> impl IntoResponse {
    Json(json!({ "status": "ok", "service": "transcode-streamd" }))
}
