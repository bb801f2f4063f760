//! ResolvePlayable use case
//!
//! Implements the decision step of spec §4.7 (Range Streamer, step 2):
//! serve the original if it's already browser-playable, else serve the
//! cached transcode, else register a job and tell the worker to pick it up.

use std::path::{Path, PathBuf};
use std::sync::Arc;

use crate::domain::repositories::JobRegistry;
use crate::infrastructure::cache::CacheStore;
use crate::infrastructure::worker::WorkerHandle;
use crate::interfaces::external_services::{needs_transcoding, CodecProbe};
use crate::shared::error::ApplicationError;

pub enum PlaybackDecision {
    ServeFile(PathBuf),
    Transcoding { job_id: String, retry_after_secs: u64 },
}

pub struct ResolvePlayable {
    probe: Arc<dyn CodecProbe>,
    cache_store: Arc<CacheStore>,
    job_registry: Arc<dyn JobRegistry>,
    worker: WorkerHandle,
}

impl ResolvePlayable {
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

    pub async fn decide(&self, src_abs: &Path) -> Result<PlaybackDecision, ApplicationError> {
        let codec = self.probe.probe(src_abs).await;
        if !needs_transcoding(codec.as_deref()) {
            return Ok(PlaybackDecision::ServeFile(src_abs.to_path_buf()));
        }

        if let Some(cached) = self.cache_store.lookup(src_abs).await {
            return Ok(PlaybackDecision::ServeFile(cached));
        }

        let cache_path = self.cache_store.cache_path_for(src_abs);
        let (job, should_enqueue) = self
            .job_registry
            .create_or_get(&src_abs.to_string_lossy(), &cache_path.to_string_lossy())
            .await?;

        if should_enqueue {
            self.worker.signal_new_job();
        }

        Ok(PlaybackDecision::Transcoding {
            job_id: job.id,
            retry_after_secs: 2,
        })
    }
}
