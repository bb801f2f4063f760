//! Transcode Engine
//!
//! Wraps a `Transcoder` port with the concurrency contract from spec §4.4:
//! at most one transcoder process runs per source at a time, enforced by
//! an in-process registry of per-source locks plus a `.lock` sentinel file
//! so a stale `.tmp` left by a crashed process is still visible to a
//! freshly started one. Replaces the Python original's exception-driven
//! `.tmp`-probing with an explicit `acquire()` outcome, per spec §9.

use std::collections::HashMap;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::{Duration, SystemTime};
use tokio::sync::Mutex;

use crate::interfaces::external_services::Transcoder;
use crate::shared::error::TranscodeError;

/// Outcome of attempting to acquire the right to transcode a source.
pub enum Acquisition {
    /// No one else is working on this source; the caller now holds the lock.
    Ok,
    /// A `.tmp` file exists and is fresh — another run is genuinely in progress.
    InProgress,
    /// A `.tmp` file exists but is older than the engine's timeout — orphaned
    /// by a crashed process. The caller may remove it and proceed.
    Stale,
}

pub struct TranscodeEngine {
    transcoder: Arc<dyn Transcoder>,
    timeout: Duration,
    in_flight: Mutex<HashMap<PathBuf, Arc<Mutex<()>>>>,
}

impl TranscodeEngine {
    pub fn new(transcoder: Arc<dyn Transcoder>, timeout: Duration) -> Self {
        Self {
            transcoder,
            timeout,
            in_flight: Mutex::new(HashMap::new()),
        }
    }

    fn tmp_path(dst_abs: &Path) -> PathBuf {
        let mut s = dst_abs.as_os_str().to_owned();
        s.push(".tmp");
        PathBuf::from(s)
    }

    /// Inspects the `.tmp` sibling of `dst_abs` to decide whether a new
    /// transcode attempt may proceed right now. Pure filesystem check — does
    /// not itself take the in-process lock.
    pub async fn acquire(&self, dst_abs: &Path) -> Acquisition {
        let tmp = Self::tmp_path(dst_abs);
        match tokio::fs::metadata(&tmp).await {
            Err(_) => Acquisition::Ok,
            Ok(meta) => match meta.modified() {
                Ok(modified) => match SystemTime::now().duration_since(modified) {
                    Ok(age) if age > self.timeout => Acquisition::Stale,
                    Ok(_) => Acquisition::InProgress,
                    Err(_) => Acquisition::InProgress,
                },
                Err(_) => Acquisition::InProgress,
            },
        }
    }

    async fn source_lock(&self, src_abs: &Path) -> Arc<Mutex<()>> {
        let mut guard = self.in_flight.lock().await;
        guard
            .entry(src_abs.to_path_buf())
            .or_insert_with(|| Arc::new(Mutex::new(())))
            .clone()
    }

    /// Attempts to transcode `src_abs` into `dst_abs`. If another in-process
    /// task already holds the per-source lock, returns
    /// `Ok(Acquisition::InProgress)` immediately rather than blocking
    /// unboundedly, so the HTTP path can reply `202`.
    pub async fn try_transcode(
        &self,
        src_abs: &Path,
        dst_abs: &Path,
    ) -> Result<Acquisition, TranscodeError> {
        let lock = self.source_lock(src_abs).await;
        let guard = match lock.try_lock() {
            Ok(guard) => guard,
            Err(_) => return Ok(Acquisition::InProgress),
        };

        match self.acquire(dst_abs).await {
            Acquisition::InProgress => return Ok(Acquisition::InProgress),
            Acquisition::Stale => {
                let _ = tokio::fs::remove_file(Self::tmp_path(dst_abs)).await;
            }
            Acquisition::Ok => {}
        }

        let result = self.transcoder.transcode(src_abs, dst_abs).await;
        drop(guard);
        result.map(|_| Acquisition::Ok)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use async_trait::async_trait;
    use tempfile::TempDir;
    use tokio::sync::Notify;

    struct SucceedingTranscoder;

    #[async_trait]
    impl Transcoder for SucceedingTranscoder {
        async fn transcode(&self, _src: &Path, dst: &Path) -> Result<(), TranscodeError> {
            tokio::fs::write(dst, b"transcoded").await.map_err(TranscodeError::Io)
        }
    }

    struct FailingTranscoder;

    #[async_trait]
    impl Transcoder for FailingTranscoder {
        async fn transcode(&self, _src: &Path, _dst: &Path) -> Result<(), TranscodeError> {
            Err(TranscodeError::ExecutionFailed("boom".to_string()))
        }
    }

    /// Notifies `started` once inside the critical section, then waits for
    /// `release` before writing `dst` — lets a test deterministically observe
    /// the lock being held without sleeping.
    struct BlockingTranscoder {
        started: Arc<Notify>,
        release: Arc<Notify>,
    }

    #[async_trait]
    impl Transcoder for BlockingTranscoder {
        async fn transcode(&self, _src: &Path, dst: &Path) -> Result<(), TranscodeError> {
            self.started.notify_one();
            self.release.notified().await;
            tokio::fs::write(dst, b"transcoded").await.map_err(TranscodeError::Io)
        }
    }

    #[tokio::test]
    async fn acquire_is_ok_when_no_tmp_file_exists() {
        let dir = TempDir::new().unwrap();
        let engine = TranscodeEngine::new(Arc::new(SucceedingTranscoder), Duration::from_secs(3600));
        let dst = dir.path().join("out.mp4");
        assert!(matches!(engine.acquire(&dst).await, Acquisition::Ok));
    }

    #[tokio::test]
    async fn acquire_reports_in_progress_for_a_fresh_tmp_file() {
        let dir = TempDir::new().unwrap();
        let engine = TranscodeEngine::new(Arc::new(SucceedingTranscoder), Duration::from_secs(3600));
        let dst = dir.path().join("out.mp4");
        tokio::fs::write(TranscodeEngine::tmp_path(&dst), b"").await.unwrap();
        assert!(matches!(engine.acquire(&dst).await, Acquisition::InProgress));
    }

    #[tokio::test]
    async fn acquire_reports_stale_for_an_old_tmp_file() {
        let dir = TempDir::new().unwrap();
        let engine = TranscodeEngine::new(Arc::new(SucceedingTranscoder), Duration::from_millis(20));
        let dst = dir.path().join("out.mp4");
        tokio::fs::write(TranscodeEngine::tmp_path(&dst), b"").await.unwrap();
        tokio::time::sleep(Duration::from_millis(60)).await;
        assert!(matches!(engine.acquire(&dst).await, Acquisition::Stale));
    }

    #[tokio::test]
    async fn try_transcode_clears_a_stale_tmp_file_and_proceeds() {
        let dir = TempDir::new().unwrap();
        let engine = TranscodeEngine::new(Arc::new(SucceedingTranscoder), Duration::from_millis(20));
        let src = dir.path().join("in.avi");
        let dst = dir.path().join("out.mp4");
        let tmp = TranscodeEngine::tmp_path(&dst);
        tokio::fs::write(&tmp, b"orphaned").await.unwrap();
        tokio::time::sleep(Duration::from_millis(60)).await;

        let outcome = engine.try_transcode(&src, &dst).await.unwrap();
        assert!(matches!(outcome, Acquisition::Ok));
        assert!(tokio::fs::metadata(&tmp).await.is_err(), "stale .tmp must be removed");
        assert!(tokio::fs::metadata(&dst).await.is_ok());
    }

    #[tokio::test]
    async fn failing_transcode_leaves_no_file_at_destination() {
        let dir = TempDir::new().unwrap();
        let engine = TranscodeEngine::new(Arc::new(FailingTranscoder), Duration::from_secs(3600));
        let src = dir.path().join("in.avi");
        let dst = dir.path().join("out.mp4");

        let result = engine.try_transcode(&src, &dst).await;
        assert!(result.is_err());
        assert!(
            tokio::fs::metadata(&dst).await.is_err(),
            "a failing transcode must never leave a file at dst_abs"
        );
    }

    #[tokio::test]
    async fn concurrent_try_transcode_for_same_source_returns_in_progress() {
        let dir = TempDir::new().unwrap();
        let started = Arc::new(Notify::new());
        let release = Arc::new(Notify::new());
        let transcoder = Arc::new(BlockingTranscoder {
            started: started.clone(),
            release: release.clone(),
        });
        let engine = Arc::new(TranscodeEngine::new(transcoder, Duration::from_secs(3600)));
        let src = dir.path().join("in.avi");
        let dst = dir.path().join("out.mp4");

        let first = {
            let engine = engine.clone();
            let src = src.clone();
            let dst = dst.clone();
            tokio::spawn(async move { engine.try_transcode(&src, &dst).await })
        };

        started.notified().await;

        let second = engine.try_transcode(&src, &dst).await.unwrap();
        assert!(matches!(second, Acquisition::InProgress));

        release.notify_one();
        let first_outcome = first.await.unwrap().unwrap();
        assert!(matches!(first_outcome, Acquisition::Ok));
    }
}
