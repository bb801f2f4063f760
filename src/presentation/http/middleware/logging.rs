//! Logging middleware
//!
//! Grounded on the teacher's `logging.rs`: a request span plus a single
//! structured log line per request with method/uri/status/duration.

use axum::extract::Request;
use axum::middleware::Next;
use axum::response::Response;
use std::time::Instant;
use tracing::info_span;

pub async fn logging_middleware(req: Request, next: Next) -> Response {
    let method = req.method().clone();
    let uri = req.uri().clone();
    let span = info_span!("request", %method, %uri);
    let _enter = span.enter();

    let start = Instant::now();
    let response = next.run(req).await;
    let duration = start.elapsed();

    tracing::info!(
        method = %method,
        uri = %uri,
        status = %response.status(),
        duration = ?duration,
        "request processed"
    );

    response
}
