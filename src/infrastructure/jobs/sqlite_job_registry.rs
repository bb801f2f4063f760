//! SqliteJobRegistry
//!
//! Grounded on the teacher's `SqliteCacheRepository` sqlx-query style
//! (`query(...).bind(...).fetch_optional/execute(&pool)`) and on the
//! original Python `transcode_manager.py`'s `create_or_get_job` state
//! machine, which this mirrors exactly (spec §4.5).

use async_trait::async_trait;
use chrono::Utc;
use sqlx::{Pool, Row, Sqlite};

use crate::domain::job::{job_id_for, JobStatus, TranscodeJob};
use crate::domain::repositories::JobRegistry;
use crate::shared::error::RepositoryError;

pub struct SqliteJobRegistry {
    pool: Pool<Sqlite>,
}

impl SqliteJobRegistry {
    pub fn new(pool: Pool<Sqlite>) -> Self {
        Self { pool }
    }

    fn row_to_job(row: &sqlx::sqlite::SqliteRow) -> Result<TranscodeJob, RepositoryError> {
        let status_str: String = row.try_get("status").map_err(RepositoryError::Database)?;
        Ok(TranscodeJob {
            id: row.try_get("id").map_err(RepositoryError::Database)?,
            input_path: row.try_get("input_path").map_err(RepositoryError::Database)?,
            output_path: row
                .try_get("output_path")
                .map_err(RepositoryError::Database)?,
            status: JobStatus::from_str(&status_str).unwrap_or(JobStatus::Pending),
            progress: row.try_get("progress").map_err(RepositoryError::Database)?,
            error_message: row
                .try_get("error_message")
                .map_err(RepositoryError::Database)?,
            created_at: row.try_get("created_at").map_err(RepositoryError::Database)?,
            started_at: row.try_get("started_at").map_err(RepositoryError::Database)?,
            completed_at: row
                .try_get("completed_at")
                .map_err(RepositoryError::Database)?,
        })
    }
}

#[async_trait]
impl JobRegistry for SqliteJobRegistry {
    async fn create_or_get(
        &self,
        input_path: &str,
        output_path: &str,
    ) -> Result<(TranscodeJob, bool), RepositoryError> {
        let id = job_id_for(input_path);
        let mut tx = self.pool.begin().await?;

        let existing = sqlx::query("SELECT * FROM transcode_jobs WHERE id = ?")
            .bind(&id)
            .fetch_optional(&mut *tx)
            .await?;

        if let Some(row) = existing {
            let job = Self::row_to_job(&row)?;
            match job.status {
                JobStatus::Complete | JobStatus::Processing => {
                    tx.commit().await?;
                    return Ok((job, false));
                }
                JobStatus::Failed | JobStatus::Pending => {
                    sqlx::query(
                        "UPDATE transcode_jobs SET status = 'pending', progress = 0, \
                         error_message = NULL, started_at = NULL, completed_at = NULL \
                         WHERE id = ?",
                    )
                    .bind(&id)
                    .execute(&mut *tx)
                    .await?;
                    tx.commit().await?;
                    let job = self.status(&id).await?.ok_or(RepositoryError::NotFound)?;
                    return Ok((job, true));
                }
            }
        }

        let now = Utc::now();
        sqlx::query(
            "INSERT INTO transcode_jobs \
             (id, input_path, output_path, status, progress, created_at) \
             VALUES (?, ?, ?, 'pending', 0, ?)",
        )
        .bind(&id)
        .bind(input_path)
        .bind(output_path)
        .bind(now)
        .execute(&mut *tx)
        .await?;
        tx.commit().await?;

        Ok((
            TranscodeJob {
                id,
                input_path: input_path.to_string(),
                output_path: output_path.to_string(),
                status: JobStatus::Pending,
                progress: 0,
                error_message: None,
                created_at: now,
                started_at: None,
                completed_at: None,
            },
            true,
        ))
    }

    async fn claim_next(&self) -> Result<Option<TranscodeJob>, RepositoryError> {
        let mut tx = self.pool.begin().await?;

        let row = sqlx::query(
            "SELECT * FROM transcode_jobs WHERE status = 'pending' \
             ORDER BY created_at ASC LIMIT 1",
        )
        .fetch_optional(&mut *tx)
        .await?;

        let Some(row) = row else {
            tx.commit().await?;
            return Ok(None);
        };

        let job = Self::row_to_job(&row)?;
        let now = Utc::now();
        sqlx::query("UPDATE transcode_jobs SET status = 'processing', started_at = ? WHERE id = ?")
            .bind(now)
            .bind(&job.id)
            .execute(&mut *tx)
            .await?;
        tx.commit().await?;

        Ok(Some(TranscodeJob {
            status: JobStatus::Processing,
            started_at: Some(now),
            ..job
        }))
    }

    async fn finish(
        &self,
        job_id: &str,
        ok: bool,
        error_message: Option<String>,
    ) -> Result<(), RepositoryError> {
        // Conditional on `status = 'processing'` so a caller that never
        // claimed this job itself can't clobber the terminal outcome
        // written by whichever caller actually holds the per-source lock
        // (see Worker::process and ControlUseCases::prewarm).
        let status = if ok { "complete" } else { "failed" };
        if ok {
            sqlx::query(
                "UPDATE transcode_jobs SET status = ?, completed_at = ?, progress = 100, \
                 error_message = ? WHERE id = ? AND status = 'processing'",
            )
            .bind(status)
            .bind(Utc::now())
            .bind(error_message)
            .bind(job_id)
            .execute(&self.pool)
            .await?;
        } else {
            sqlx::query(
                "UPDATE transcode_jobs SET status = ?, completed_at = ?, error_message = ? \
                 WHERE id = ? AND status = 'processing'",
            )
            .bind(status)
            .bind(Utc::now())
            .bind(error_message)
            .bind(job_id)
            .execute(&self.pool)
            .await?;
        }
        Ok(())
    }

    async fn update_progress(&self, job_id: &str, progress: i32) -> Result<(), RepositoryError> {
        sqlx::query("UPDATE transcode_jobs SET progress = ? WHERE id = ?")
            .bind(progress)
            .bind(job_id)
            .execute(&self.pool)
            .await?;
        Ok(())
    }

    async fn status(&self, job_id: &str) -> Result<Option<TranscodeJob>, RepositoryError> {
        let row = sqlx::query("SELECT * FROM transcode_jobs WHERE id = ?")
            .bind(job_id)
            .fetch_optional(&self.pool)
            .await?;
        row.as_ref().map(Self::row_to_job).transpose()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::infrastructure::database::{initialize_schema};
    use sqlx::sqlite::SqlitePoolOptions;

    async fn registry() -> SqliteJobRegistry {
        let pool = SqlitePoolOptions::new()
            .connect("sqlite::memory:")
            .await
            .unwrap();
        initialize_schema(&pool).await.unwrap();
        SqliteJobRegistry::new(pool)
    }

    #[tokio::test]
    async fn create_or_get_inserts_pending_job_on_first_call() {
        let reg = registry().await;
        let (job, should_enqueue) = reg.create_or_get("/media/a.avi", "/cache/a.mp4").await.unwrap();
        assert!(should_enqueue);
        assert_eq!(job.status, JobStatus::Pending);
    }

    #[tokio::test]
    async fn create_or_get_coalesces_identical_input_once_processing() {
        let reg = registry().await;
        let (job1, _) = reg.create_or_get("/media/a.avi", "/cache/a.mp4").await.unwrap();
        reg.claim_next().await.unwrap();
        let (job2, should_enqueue) = reg.create_or_get("/media/a.avi", "/cache/a.mp4").await.unwrap();
        assert_eq!(job1.id, job2.id);
        assert!(!should_enqueue, "a processing job must not be enqueued a second time");
    }

    #[tokio::test]
    async fn claim_next_transitions_to_processing() {
        let reg = registry().await;
        reg.create_or_get("/media/a.avi", "/cache/a.mp4").await.unwrap();
        let claimed = reg.claim_next().await.unwrap().unwrap();
        assert_eq!(claimed.status, JobStatus::Processing);
        assert!(claimed.started_at.is_some());
    }

    #[tokio::test]
    async fn failed_job_resets_to_pending_on_retry() {
        let reg = registry().await;
        reg.create_or_get("/media/a.avi", "/cache/a.mp4").await.unwrap();
        let claimed = reg.claim_next().await.unwrap().unwrap();
        reg.finish(&claimed.id, false, Some("boom".into())).await.unwrap();

        let (job, should_enqueue) = reg.create_or_get("/media/a.avi", "/cache/a.mp4").await.unwrap();
        assert!(should_enqueue);
        assert_eq!(job.status, JobStatus::Pending);
        assert!(job.error_message.is_none());
    }

    #[tokio::test]
    async fn complete_job_is_not_requeued() {
        let reg = registry().await;
        reg.create_or_get("/media/a.avi", "/cache/a.mp4").await.unwrap();
        let claimed = reg.claim_next().await.unwrap().unwrap();
        reg.finish(&claimed.id, true, None).await.unwrap();

        let (job, should_enqueue) = reg.create_or_get("/media/a.avi", "/cache/a.mp4").await.unwrap();
        assert!(!should_enqueue);
        assert_eq!(job.status, JobStatus::Complete);
    }
}
