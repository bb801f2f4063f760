//! Shared types and utilities used across the application

pub mod error;

pub use error::{
    ApplicationError, CacheStoreError, PathResolutionError, ProbeError, RangeError,
    RepositoryError, TranscodeError,
};
