//! CodecProbe port
//!
//! Inspects a source file and reports its video codec name.

use async_trait::async_trait;
use std::path::Path;

use crate::shared::error::ProbeError;

#[async_trait]
pub trait CodecProbe: Send + Sync {
    /// Returns the lowercase video codec identifier of the first video
    /// stream, or `None` on any failure (missing tool, unreadable file,
    /// timeout). Callers must treat `None` as "unknown, assume
    /// non-playable" — never assume playability on probe failure.
    async fn probe(&self, path: &Path) -> Option<String>;
}

/// `true` unless `codec` is one of the browser-native set.
pub fn needs_transcoding(codec: Option<&str>) -> bool {
    const BROWSER_COMPATIBLE: [&str; 3] = ["h264", "avc1", "avc"];
    match codec {
        Some(c) => !BROWSER_COMPATIBLE.contains(&c),
        None => true,
    }
}
