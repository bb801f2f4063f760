//! Path Resolver
//!
//! Maps an untrusted client path to a vetted absolute file path under a
//! fixed media root. Grounded on the teacher's `stream_media.rs` content-type
//! table and the original Python's `video_server.py` path-join pattern, with
//! the canonicalize/ancestor/symlink checks spec §4.2 and §8 property 1
//! require (not present in either source, added per the spec).

use std::path::{Path, PathBuf};

use crate::shared::error::PathResolutionError;

const ALLOWED_EXTENSIONS: [&str; 6] = ["mp4", "avi", "mov", "mkv", "wmv", "flv"];
const ALLOWED_EXTENSIONS_EXT: [&str; 1] = ["webm"];

pub struct PathResolver {
    media_root: PathBuf,
}

impl PathResolver {
    /// `media_root` must exist; it is canonicalized once at construction so
    /// every subsequent ancestor check compares against a stable value.
    pub fn new(media_root: PathBuf) -> std::io::Result<Self> {
        let media_root = media_root.canonicalize()?;
        Ok(Self { media_root })
    }

    pub fn media_root(&self) -> &Path {
        &self.media_root
    }

    /// 1. URL-decode and strip a leading `./`.
    /// 2. Join with the media root.
    /// 3. Canonicalize and require a proper descendant of the media root.
    /// 4. Require the file to exist and be a regular file.
    /// 5. Require an allowed extension.
    pub fn resolve(&self, client_path: &str) -> Result<PathBuf, PathResolutionError> {
        let decoded = percent_decode(client_path);
        let decoded = decoded.strip_prefix("./").unwrap_or(&decoded);

        if decoded.contains('\0') {
            return Err(PathResolutionError::Escape);
        }

        let candidate = self.media_root.join(decoded);

        let canonical = candidate
            .canonicalize()
            .map_err(|_| PathResolutionError::NotFound)?;

        if !canonical.starts_with(&self.media_root) {
            return Err(PathResolutionError::Escape);
        }

        let metadata = std::fs::metadata(&canonical).map_err(|_| PathResolutionError::NotFound)?;
        if !metadata.is_file() {
            return Err(PathResolutionError::NotFound);
        }

        let ext = canonical
            .extension()
            .and_then(|e| e.to_str())
            .map(|e| e.to_lowercase())
            .unwrap_or_default();

        if !ALLOWED_EXTENSIONS.contains(&ext.as_str())
            && !ALLOWED_EXTENSIONS_EXT.contains(&ext.as_str())
        {
            return Err(PathResolutionError::UnsupportedFormat);
        }

        Ok(canonical)
    }
}

/// Minimal percent-decoder for path segments — no external crate dependency
/// on the `url` family is needed for this one narrow use.
fn percent_decode(input: &str) -> String {
    let bytes = input.as_bytes();
    let mut out = Vec::with_capacity(bytes.len());
    let mut i = 0;
    while i < bytes.len() {
        if bytes[i] == b'%' && i + 2 < bytes.len() {
            if let Ok(hex) = std::str::from_utf8(&bytes[i + 1..i + 3]) {
                if let Ok(byte) = u8::from_str_radix(hex, 16) {
                    out.push(byte);
                    i += 3;
                    continue;
                }
            }
        }
        out.push(bytes[i]);
        i += 1;
    }
    String::from_utf8_lossy(&out).into_owned()
}

/// Content-type derived from the extension; `video/mp4` by default (§4.7 step 4).
pub fn content_type_for(path: &Path) -> &'static str {
    match path
        .extension()
        .and_then(|e| e.to_str())
        .map(|e| e.to_lowercase())
        .as_deref()
    {
        Some("mp4") => "video/mp4",
        Some("webm") => "video/webm",
        Some("mkv") => "video/x-matroska",
        Some("avi") => "video/x-msvideo",
        Some("mov") => "video/quicktime",
        Some("wmv") => "video/x-ms-wmv",
        Some("flv") => "video/x-flv",
        _ => "video/mp4",
    }
}
