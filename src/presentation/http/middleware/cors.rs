//! CORS middleware
//!
//! Grounded on the teacher's `cors.rs`. This server backs a single private
//! fitness-app frontend with no authenticated session to protect, so all
//! origins are allowed — but `Range` stays in the allow-list since every
//! request this server serves is range-aware.

use axum::http::{header, Method};
use std::time::Duration;
use tower_http::cors::{AllowOrigin, CorsLayer};

pub fn cors_layer() -> CorsLayer {
    CorsLayer::new()
        .allow_origin(AllowOrigin::predicate(move |_, _| true))
        .allow_methods([Method::GET, Method::POST, Method::OPTIONS])
        .allow_headers([header::CONTENT_TYPE, header::RANGE, header::ACCEPT])
        .max_age(Duration::from_secs(3600))
}
