//! Worker
//!
//! A single cooperative actor running for the lifetime of the process,
//! draining the Job Registry and executing transcodes. Grounded on the
//! teacher's `main.rs` background `tokio::spawn` loop pattern and on the
//! original Python `_worker_loop`'s claim/process/finish shape and
//! `threading.Event`-based shutdown, translated to `tokio::sync::Notify`
//! plus an atomic shutdown flag (no OS threads or condition variables
//! needed under tokio).

use std::path::PathBuf;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::Notify;
use tracing::{error, info, warn};

use crate::domain::repositories::JobRegistry;
use crate::infrastructure::cache::CacheStore;
use crate::infrastructure::transcode_engine::{Acquisition, TranscodeEngine};

const POLL_INTERVAL: Duration = Duration::from_secs(1);

pub struct Worker {
    job_registry: Arc<dyn JobRegistry>,
    cache_store: Arc<CacheStore>,
    transcode_engine: Arc<TranscodeEngine>,
    notify: Arc<Notify>,
    shutdown: Arc<AtomicBool>,
}

impl Worker {
    pub fn new(
        job_registry: Arc<dyn JobRegistry>,
        cache_store: Arc<CacheStore>,
        transcode_engine: Arc<TranscodeEngine>,
    ) -> Self {
        Self {
            job_registry,
            cache_store,
            transcode_engine,
            notify: Arc::new(Notify::new()),
            shutdown: Arc::new(AtomicBool::new(false)),
        }
    }

    /// A cheap handle other components use to signal "a new job was
    /// enqueued" without waiting for the next poll tick.
    pub fn handle(&self) -> WorkerHandle {
        WorkerHandle {
            notify: self.notify.clone(),
            shutdown: self.shutdown.clone(),
        }
    }

    /// Runs the actor loop until shutdown is requested. Intended to be
    /// driven by a single `tokio::spawn`.
    pub async fn run(self) {
        info!("transcode worker started");
        loop {
            if self.shutdown.load(Ordering::Relaxed) {
                break;
            }

            match self.job_registry.claim_next().await {
                Ok(Some(job)) => {
                    self.process(job).await;
                }
                Ok(None) => {
                    let wait = self.notify.notified();
                    tokio::select! {
                        _ = wait => {}
                        _ = tokio::time::sleep(POLL_INTERVAL) => {}
                    }
                }
                Err(e) => {
                    error!(error = %e, "job registry poll failed");
                    tokio::time::sleep(POLL_INTERVAL).await;
                }
            }
        }
        info!("transcode worker shut down");
    }

    async fn process(&self, job: crate::domain::job::TranscodeJob) {
        let _ = self.job_registry.update_progress(&job.id, 0).await;

        // Cleanup is attempted before every transcode, not only on a
        // periodic schedule (§4.3, SPEC_FULL §10).
        if let Err(e) = self.cache_store.evict(false).await {
            warn!(error = %e, "pre-transcode cache eviction failed");
        }

        let src = PathBuf::from(&job.input_path);
        let dst = PathBuf::from(&job.output_path);

        let outcome = self.transcode_engine.try_transcode(&src, &dst).await;

        match outcome {
            Ok(Acquisition::Ok) => {
                if let Err(e) = self.cache_store.record(&dst, &src).await {
                    error!(error = %e, "failed to record cache entry after transcode");
                    let _ = self
                        .job_registry
                        .finish(&job.id, false, Some(e.to_string()))
                        .await;
                    return;
                }
                let _ = self.job_registry.finish(&job.id, true, None).await;
            }
            Ok(Acquisition::InProgress) | Ok(Acquisition::Stale) => {
                // Another caller already holds the per-source lock and is
                // the one actually running this transcode; it alone will
                // call `finish` for this job. Touching the job here would
                // race that caller's real outcome with a spurious failure.
                info!(job_id = %job.id, "transcode for this source already owned elsewhere; leaving outcome to that caller");
            }
            Err(e) => {
                warn!(job_id = %job.id, error = %e, "transcode failed");
                let _ = self.job_registry.finish(&job.id, false, Some(e.to_string())).await;
            }
        }
    }
}

/// Handle used by the HTTP path to wake a sleeping worker and to request
/// shutdown. Cloning is cheap — it only carries `Arc`s.
#[derive(Clone)]
pub struct WorkerHandle {
    notify: Arc<Notify>,
    shutdown: Arc<AtomicBool>,
}

impl WorkerHandle {
    pub fn signal_new_job(&self) {
        self.notify.notify_one();
    }

    pub fn shutdown(&self) {
        self.shutdown.store(true, Ordering::Relaxed);
        self.notify.notify_one();
    }
}
