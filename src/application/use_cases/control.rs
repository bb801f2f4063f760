//! Control use cases backing §4.8's status/pre-warm/stats endpoints.

use std::path::Path;
use std::sync::Arc;
use std::time::Duration;

use serde::Serialize;

use crate::domain::job::{job_id_for, JobStatus};
use crate::domain::repositories::JobRegistry;
use crate::infrastructure::cache::{CacheStats, CacheStore};
use crate::infrastructure::worker::WorkerHandle;
use crate::interfaces::external_services::{needs_transcoding, CodecProbe};
use crate::shared::error::ApplicationError;

#[derive(Debug, Serialize)]
pub struct TranscodeStatus {
    pub needs_transcoding: bool,
    pub cache_exists: bool,
    pub transcoding_in_progress: bool,
    pub ready: bool,
    pub codec: Option<String>,
}

#[derive(Debug, Serialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum PrewarmStatus {
    NotNeeded,
    Cached,
    InProgress,
    Complete,
    Failed,
}

const PREWARM_POLL_INTERVAL: Duration = Duration::from_millis(200);
const PREWARM_POLL_BUDGET: Duration = Duration::from_secs(30);

pub struct ControlUseCases {
    probe: Arc<dyn CodecProbe>,
    cache_store: Arc<CacheStore>,
    job_registry: Arc<dyn JobRegistry>,
    worker: WorkerHandle,
}

impl ControlUseCases {
    pub fn new(
        probe: Arc<dyn CodecProbe>,
        cache_store: Arc<CacheStore>,
        job_registry: Arc<dyn JobRegistry>,
        worker: WorkerHandle,
    ) -> Self {
        Self {
            probe,
            cache_store,
            job_registry,
            worker,
        }
    }

    pub async fn status(&self, src_abs: &Path) -> Result<TranscodeStatus, ApplicationError> {
        let codec = self.probe.probe(src_abs).await;
        let needs = needs_transcoding(codec.as_deref());
        let cache_exists = self.cache_store.lookup(src_abs).await.is_some();

        let job_id = job_id_for(&src_abs.to_string_lossy());
        let job = self.job_registry.status(&job_id).await?;
        let transcoding_in_progress = matches!(
            job.map(|j| j.status),
            Some(JobStatus::Processing) | Some(JobStatus::Pending)
        );

        Ok(TranscodeStatus {
            needs_transcoding: needs,
            cache_exists,
            transcoding_in_progress,
            ready: !needs || cache_exists,
            codec,
        })
    }

    /// Kicks off transcoding for pre-warming. Never calls the Transcode
    /// Engine itself — only the Worker does that — so this can't race the
    /// Worker's own `finish` call for the same job. It enqueues (or finds
    /// the already-enqueued job) and polls the Job Registry for the
    /// terminal status the Worker eventually writes.
    pub async fn prewarm(&self, src_abs: &Path) -> Result<PrewarmStatus, ApplicationError> {
        let codec = self.probe.probe(src_abs).await;
        if !needs_transcoding(codec.as_deref()) {
            return Ok(PrewarmStatus::NotNeeded);
        }

        if self.cache_store.lookup(src_abs).await.is_some() {
            return Ok(PrewarmStatus::Cached);
        }

        let cache_path = self.cache_store.cache_path_for(src_abs);
        let (job, should_enqueue) = self
            .job_registry
            .create_or_get(&src_abs.to_string_lossy(), &cache_path.to_string_lossy())
            .await?;

        if should_enqueue {
            self.worker.signal_new_job();
        } else if job.status == JobStatus::Complete {
            return Ok(PrewarmStatus::Cached);
        }

        self.await_completion(&job.id).await
    }

    async fn await_completion(&self, job_id: &str) -> Result<PrewarmStatus, ApplicationError> {
        let deadline = tokio::time::Instant::now() + PREWARM_POLL_BUDGET;
        loop {
            let job = self.job_registry.status(job_id).await?;
            match job.map(|j| j.status) {
                Some(JobStatus::Complete) => return Ok(PrewarmStatus::Complete),
                Some(JobStatus::Failed) => return Ok(PrewarmStatus::Failed),
                _ => {
                    if tokio::time::Instant::now() >= deadline {
                        return Ok(PrewarmStatus::InProgress);
                    }
                    tokio::time::sleep(PREWARM_POLL_INTERVAL).await;
                }
            }
        }
    }

    pub async fn cache_stats(&self) -> CacheStats {
        self.cache_store.stats().await
    }
}
