//! Maps `ApplicationError` to the status codes and JSON body shape spec §7
//! requires (`{error, [message], [retry_after]}`), grounded on the teacher's
//! per-handler `map_error` functions but centralized into one
//! `IntoResponse` impl since every handler in this narrower surface needs
//! the same mapping.

use axum::http::StatusCode;
use axum::response::{IntoResponse, Json, Response};
use serde_json::json;

use crate::shared::error::{
    ApplicationError, CacheStoreError, PathResolutionError, ProbeError, RangeError, TranscodeError,
};

impl IntoResponse for ApplicationError {
    fn into_response(self) -> Response {
        let (status, message) = match &self {
            ApplicationError::PathResolution(PathResolutionError::Escape) => {
                (StatusCode::FORBIDDEN, "path escapes the media root".to_string())
            }
            ApplicationError::PathResolution(PathResolutionError::NotFound) => {
                (StatusCode::NOT_FOUND, "file not found".to_string())
            }
            ApplicationError::PathResolution(PathResolutionError::UnsupportedFormat) => {
                (StatusCode::UNSUPPORTED_MEDIA_TYPE, "unsupported file extension".to_string())
            }
            ApplicationError::PathResolution(PathResolutionError::Io(e)) => {
                (StatusCode::INTERNAL_SERVER_ERROR, e.to_string())
            }
            ApplicationError::Range(RangeError::Malformed) => {
                (StatusCode::BAD_REQUEST, "malformed Range header".to_string())
            }
            ApplicationError::Range(RangeError::Unsatisfiable) => {
                (StatusCode::RANGE_NOT_SATISFIABLE, "requested range not satisfiable".to_string())
            }
            ApplicationError::Probe(ProbeError::ToolNotFound) => {
                (StatusCode::SERVICE_UNAVAILABLE, "ffprobe not installed".to_string())
            }
            ApplicationError::Probe(e) => (StatusCode::INTERNAL_SERVER_ERROR, e.to_string()),
            ApplicationError::Transcode(TranscodeError::ToolNotFound) => {
                (StatusCode::SERVICE_UNAVAILABLE, "ffmpeg not installed".to_string())
            }
            ApplicationError::Transcode(e) => (StatusCode::INTERNAL_SERVER_ERROR, e.to_string()),
            ApplicationError::CacheStore(CacheStoreError::Io(e)) => {
                (StatusCode::INTERNAL_SERVER_ERROR, e.to_string())
            }
            ApplicationError::CacheStore(e) => (StatusCode::INTERNAL_SERVER_ERROR, e.to_string()),
            ApplicationError::Repository(e) => (StatusCode::INTERNAL_SERVER_ERROR, e.to_string()),
            ApplicationError::TranscoderUnavailable => {
                (StatusCode::SERVICE_UNAVAILABLE, "transcoder unavailable".to_string())
            }
            ApplicationError::Internal(msg) => (StatusCode::INTERNAL_SERVER_ERROR, msg.clone()),
        };

        if status.is_client_error() {
            tracing::debug!(%status, %message, "request rejected");
        } else {
            tracing::error!(%status, %message, "request failed");
        }

        (status, Json(json!({ "error": message }))).into_response()
    }
}
