//! FfprobeAdapter
//!
//! Shells out to `ffprobe` to read the codec of the first video stream.
//! Grounded on the teacher's `ffprobe_adapter.rs` timeout-wrapped
//! `tokio::process::Command` pattern, narrowed to the single field this
//! system needs.

use async_trait::async_trait;
use std::path::Path;
use std::time::Duration;
use tokio::process::Command;
use tokio::time::timeout;
use tracing::warn;

use crate::interfaces::external_services::CodecProbe;

pub struct FfprobeAdapter {
    timeout: Duration,
}

impl FfprobeAdapter {
    pub fn new(timeout: Duration) -> Self {
        Self { timeout }
    }

    async fn run(&self, path: &Path) -> Option<String> {
        let args = [
            "-v",
            "error",
            "-select_streams",
            "v:0",
            "-show_entries",
            "stream=codec_name",
            "-of",
            "csv=p=0",
        ];

        let output = timeout(
            self.timeout,
            Command::new("ffprobe").args(args).arg(path).output(),
        )
        .await;

        let output = match output {
            Ok(Ok(output)) => output,
            Ok(Err(e)) => {
                warn!(error = %e, "failed to spawn ffprobe");
                return None;
            }
            Err(_) => {
                warn!(?path, "ffprobe probe timed out");
                return None;
            }
        };

        if !output.status.success() {
            return None;
        }

        let stdout = String::from_utf8_lossy(&output.stdout);
        let codec = stdout.trim().to_lowercase();
        if codec.is_empty() {
            None
        } else {
            Some(codec)
        }
    }
}

#[async_trait]
impl CodecProbe for FfprobeAdapter {
    async fn probe(&self, path: &Path) -> Option<String> {
        self.run(path).await
    }
}
