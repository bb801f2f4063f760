//! On-demand video transcode cache and range-streaming server.
//!
//! Exposes the core modules for integration tests and as a library.

pub mod application;
pub mod config;
pub mod domain;
pub mod infrastructure;
pub mod interfaces;
pub mod presentation;
pub mod shared;
