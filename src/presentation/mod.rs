//! Presentation layer: HTTP surface.

pub mod http;
