//! FfmpegAdapter
//!
//! Invokes `ffmpeg` to materialize a browser-playable MP4. Grounded on the
//! teacher's `ffmpeg_adapter.rs` timeout-wrapped `Command` pattern and on
//! the original Python `transcode_to_h264`'s exact argument list and
//! `.tmp`-then-rename materialization.

use async_trait::async_trait;
use std::path::{Path, PathBuf};
use std::time::Duration;
use tokio::process::Command;
use tokio::time::timeout;
use tracing::{error, warn};

use crate::interfaces::external_services::Transcoder;
use crate::shared::error::TranscodeError;

pub struct FfmpegAdapter {
    timeout: Duration,
}

impl FfmpegAdapter {
    pub fn new(timeout: Duration) -> Self {
        Self { timeout }
    }

    fn tmp_path(dst_abs: &Path) -> PathBuf {
        let mut s = dst_abs.as_os_str().to_owned();
        s.push(".tmp");
        PathBuf::from(s)
    }

    fn build_args(src_abs: &Path, tmp_path: &Path) -> Vec<std::ffi::OsString> {
        vec![
            "-y".into(),
            "-i".into(),
            src_abs.as_os_str().to_owned(),
            "-c:v".into(),
            "libx264".into(),
            "-preset".into(),
            "fast".into(),
            "-crf".into(),
            "23".into(),
            "-c:a".into(),
            "aac".into(),
            "-b:a".into(),
            "192k".into(),
            "-movflags".into(),
            "+faststart".into(),
            "-f".into(),
            "mp4".into(),
            tmp_path.as_os_str().to_owned(),
        ]
    }
}

#[async_trait]
impl Transcoder for FfmpegAdapter {
    async fn transcode(&self, src_abs: &Path, dst_abs: &Path) -> Result<(), TranscodeError> {
        if let Some(parent) = dst_abs.parent() {
            tokio::fs::create_dir_all(parent).await?;
        }

        let tmp_path = Self::tmp_path(dst_abs);
        let args = Self::build_args(src_abs, &tmp_path);

        let result = timeout(self.timeout, Command::new("ffmpeg").args(&args).output()).await;

        let cleanup_tmp = || {
            let tmp_path = tmp_path.clone();
            async move {
                let _ = tokio::fs::remove_file(&tmp_path).await;
            }
        };

        let output = match result {
            Ok(Ok(output)) => output,
            Ok(Err(e)) => {
                cleanup_tmp().await;
                if e.kind() == std::io::ErrorKind::NotFound {
                    return Err(TranscodeError::ToolNotFound);
                }
                return Err(TranscodeError::Io(e));
            }
            Err(_) => {
                cleanup_tmp().await;
                warn!(?src_abs, "transcode timed out");
                return Err(TranscodeError::Timeout(self.timeout));
            }
        };

        if !output.status.success() {
            cleanup_tmp().await;
            let stderr = String::from_utf8_lossy(&output.stderr).to_string();
            error!(?src_abs, %stderr, "ffmpeg exited with failure");
            return Err(TranscodeError::ExecutionFailed(stderr));
        }

        tokio::fs::rename(&tmp_path, dst_abs).await?;
        Ok(())
    }
}
