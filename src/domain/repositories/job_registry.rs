//! JobRegistry trait
//!
//! Durable record of transcode jobs keyed by source fingerprint.

use async_trait::async_trait;

use crate::domain::job::TranscodeJob;
use crate::shared::error::RepositoryError;

#[async_trait]
pub trait JobRegistry: Send + Sync {
    /// Computes `id` from `input_path`. If absent, inserts a pending row and
    /// returns `(job, true)`. If present and `complete`/`processing`, returns
    /// `(job, false)`. If present and `failed`/`pending`, clears error fields,
    /// resets to `pending, progress=0` and returns `(job, true)`.
    async fn create_or_get(
        &self,
        input_path: &str,
        output_path: &str,
    ) -> Result<(TranscodeJob, bool), RepositoryError>;

    /// Transactionally selects the oldest pending job, sets it to
    /// `processing, started_at=now`, and returns it.
    async fn claim_next(&self) -> Result<Option<TranscodeJob>, RepositoryError>;

    /// Sets `status = complete|failed, completed_at=now`, conditional on the
    /// job's current status being `processing`: a caller that never claimed
    /// the job itself (and so never transitioned it to `processing`) cannot
    /// clobber a terminal outcome it didn't produce. A call that loses this
    /// race is a silent no-op.
    async fn finish(
        &self,
        job_id: &str,
        ok: bool,
        error_message: Option<String>,
    ) -> Result<(), RepositoryError>;

    async fn update_progress(&self, job_id: &str, progress: i32) -> Result<(), RepositoryError>;

    async fn status(&self, job_id: &str) -> Result<Option<TranscodeJob>, RepositoryError>;
}
