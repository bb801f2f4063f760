//! Infrastructure layer
//!
//! Adapters for external services (ffmpeg/ffprobe), the filesystem (path
//! resolution, the cache store), the database (the job registry), and the
//! worker actor that ties transcoding together.

pub mod cache;
pub mod database;
pub mod external;
pub mod filesystem;
pub mod jobs;
pub mod transcode_engine;
pub mod worker;

pub use cache::CacheStore;
pub use external::{FfmpegAdapter, FfprobeAdapter};
pub use filesystem::PathResolver;
pub use jobs::SqliteJobRegistry;
pub use transcode_engine::TranscodeEngine;
pub use worker::{Worker, WorkerHandle};
