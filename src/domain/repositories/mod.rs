//! Repository interfaces: abstractions for durable data access.

pub mod job_registry;

pub use job_registry::JobRegistry;
