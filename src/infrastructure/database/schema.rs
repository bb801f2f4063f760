//! Schema initialization for the Job Registry.
//!
//! Grounded on the teacher's `schema.rs`: idempotent `CREATE TABLE IF NOT
//! EXISTS`, narrowed to the single table spec §6 names.

use sqlx::{Pool, Sqlite};

pub async fn initialize_schema(pool: &Pool<Sqlite>) -> Result<(), sqlx::Error> {
    sqlx::query(
        r#"
        CREATE TABLE IF NOT EXISTS transcode_jobs (
            id TEXT PRIMARY KEY,
            input_path TEXT NOT NULL,
            output_path TEXT NOT NULL,
            status TEXT NOT NULL,
            progress INTEGER NOT NULL DEFAULT 0,
            error_message TEXT,
            created_at TEXT NOT NULL,
            started_at TEXT,
            completed_at TEXT
        )
        "#,
    )
    .execute(pool)
    .await?;

    sqlx::query("CREATE INDEX IF NOT EXISTS idx_transcode_jobs_status ON transcode_jobs(status)")
        .execute(pool)
        .await?;

    Ok(())
}
