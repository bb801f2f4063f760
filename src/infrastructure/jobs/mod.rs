pub mod sqlite_job_registry;

pub use sqlite_job_registry::SqliteJobRegistry;
