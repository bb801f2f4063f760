//! Transcoder port
//!
//! Invokes the external transcoder to produce a streamable MP4.

use async_trait::async_trait;
use std::path::Path;

use crate::shared::error::TranscodeError;

#[async_trait]
pub trait Transcoder: Send + Sync {
    /// Materializes `dst_abs` from `src_abs`: video H.264 (software, preset
    /// `fast`, CRF 23), audio AAC 192 kbps, MP4 container with `faststart`,
    /// overwrite on existence. Implementations must write to a `.tmp`
    /// sibling and atomically rename on success, and must leave no partial
    /// `.mp4` at `dst_abs` on any failure.
    async fn transcode(&self, src_abs: &Path, dst_abs: &Path) -> Result<(), TranscodeError>;
}
