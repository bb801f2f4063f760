//! External Service Adapters
//!
//! Adapters for the external media-probe and media-transcode CLIs.

pub mod ffmpeg;

pub use ffmpeg::{FfmpegAdapter, FfprobeAdapter};
