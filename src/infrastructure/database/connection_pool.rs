//! Connection pool setup for the Job Registry's SQLite backing store.
//!
//! Grounded on the teacher's `connection_pool.rs`: WAL journal mode, a
//! bounded pool, and the same pragma set, narrowed to what a single-table
//! job registry needs (dropping the teacher's configurable metrics/
//! maintenance surface, which had no remaining caller once the TMDB/series/
//! collection repositories it served were trimmed).

use sqlx::sqlite::{SqliteConnectOptions, SqlitePoolOptions};
use sqlx::{Pool, Sqlite};
use std::str::FromStr;
use std::time::Duration;

pub async fn connect(database_url: &str) -> Result<Pool<Sqlite>, sqlx::Error> {
    let options = SqliteConnectOptions::from_str(database_url)?
        .create_if_missing(true)
        .journal_mode(sqlx::sqlite::SqliteJournalMode::Wal)
        .synchronous(sqlx::sqlite::SqliteSynchronous::Normal);

    SqlitePoolOptions::new()
        .max_connections(8)
        .min_connections(1)
        .acquire_timeout(Duration::from_secs(10))
        .idle_timeout(Duration::from_secs(600))
        .connect_with(options)
        .await
}
