//! Error taxonomy
//!
//! One `thiserror` enum per layer, aggregated into `ApplicationError`.
//! HTTP handlers match on `ApplicationError` to pick a status code.

use thiserror::Error;

/// Errors resolving an untrusted client path to a vetted file under the media root.
#[derive(Debug, Error)]
pub enum PathResolutionError {
    #[error("path escapes the media root")]
    Escape,
    #[error("file not found")]
    NotFound,
    #[error("unsupported file extension")]
    UnsupportedFormat,
    #[error("io error: {0}")]
    Io(#[from] std::io::Error),
}

/// Errors from the filesystem-backed cache store.
#[derive(Debug, Error)]
pub enum CacheStoreError {
    #[error("io error: {0}")]
    Io(#[from] std::io::Error),
    #[error("metadata serialization error: {0}")]
    Serde(#[from] serde_json::Error),
}

/// Errors invoking the external transcoder.
#[derive(Debug, Error)]
pub enum TranscodeError {
    #[error("io error: {0}")]
    Io(#[from] std::io::Error),
    #[error("ffmpeg not found on PATH")]
    ToolNotFound,
    #[error("ffmpeg exited with a non-zero status: {0}")]
    ExecutionFailed(String),
    #[error("transcode timed out after {0:?}")]
    Timeout(std::time::Duration),
}

/// Errors from the codec probe.
#[derive(Debug, Error)]
pub enum ProbeError {
    #[error("io error: {0}")]
    Io(#[from] std::io::Error),
    #[error("ffprobe not found on PATH")]
    ToolNotFound,
    #[error("ffprobe exited with a non-zero status")]
    ExecutionFailed,
    #[error("could not parse ffprobe output")]
    ParseError,
    #[error("probe timed out after {0:?}")]
    Timeout(std::time::Duration),
}

/// Errors from the durable job registry.
#[derive(Debug, Error)]
pub enum RepositoryError {
    #[error("database error: {0}")]
    Database(#[from] sqlx::Error),
    #[error("job not found")]
    NotFound,
}

/// Malformed `Range` headers or unsatisfiable ranges.
#[derive(Debug, Error)]
pub enum RangeError {
    #[error("malformed Range header")]
    Malformed,
    #[error("requested range not satisfiable")]
    Unsatisfiable,
}

/// Top-level error type HTTP handlers match on.
#[derive(Debug, Error)]
pub enum ApplicationError {
    #[error(transparent)]
    PathResolution(#[from] PathResolutionError),
    #[error(transparent)]
    CacheStore(#[from] CacheStoreError),
    #[error(transparent)]
    Transcode(#[from] TranscodeError),
    #[error(transparent)]
    Probe(#[from] ProbeError),
    #[error(transparent)]
    Repository(#[from] RepositoryError),
    #[error(transparent)]
    Range(#[from] RangeError),
    #[error("transcoder unavailable")]
    TranscoderUnavailable,
    #[error("internal error: {0}")]
    Internal(String),
}
