//! End-to-end scenarios from spec §8, driven through the real `axum::Router`
//! via `tower::ServiceExt::oneshot` against fake `CodecProbe`/`Transcoder`
//! adapters (hand-rolled rather than `mockall`-generated, since these two
//! ports are narrow enough that a macro buys nothing here) so no real
//! `ffmpeg`/`ffprobe` binary is required to exercise the HTTP surface.

use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::Duration;

use axum::body::Body;
use axum::http::{Request, StatusCode};
use tower::ServiceExt;

use transcode_streamd::application::use_cases::{ControlUseCases, ResolvePlayable};
use transcode_streamd::infrastructure::cache::CacheStore;
use transcode_streamd::infrastructure::filesystem::PathResolver;
use transcode_streamd::infrastructure::jobs::SqliteJobRegistry;
use transcode_streamd::infrastructure::transcode_engine::TranscodeEngine;
use transcode_streamd::infrastructure::worker::Worker;
use transcode_streamd::interfaces::external_services::{CodecProbe, Transcoder};
use transcode_streamd::presentation::http::{router, AppState};
use transcode_streamd::shared::error::TranscodeError;

struct FakeProbe {
    codec: Option<String>,
}

#[async_trait::async_trait]
impl CodecProbe for FakeProbe {
    async fn probe(&self, _path: &Path) -> Option<String> {
        self.codec.clone()
    }
}

struct NeverFinishingTranscoder;

#[async_trait::async_trait]
impl Transcoder for NeverFinishingTranscoder {
    async fn transcode(&self, _src: &Path, _dst: &Path) -> Result<(), TranscodeError> {
        // A real worker would eventually call this; the tests below only
        // assert on the synchronous HTTP response before that would finish,
        // so this is never actually awaited to completion.
        std::future::pending::<()>().await;
        Ok(())
    }
}

async fn build_state(
    media_root: &Path,
    cache_dir: PathBuf,
    codec: Option<&str>,
) -> AppState {
    let path_resolver = Arc::new(PathResolver::new(media_root.to_path_buf()).unwrap());
    let cache_store = Arc::new(
        CacheStore::new(cache_dir, 10 * 1024 * 1024 * 1024, Duration::from_secs(2_592_000))
            .await
            .unwrap(),
    );

    let pool = sqlx::sqlite::SqlitePoolOptions::new()
        .connect("sqlite::memory:")
        .await
        .unwrap();
    transcode_streamd::infrastructure::database::initialize_schema(&pool)
        .await
        .unwrap();
    let job_registry = Arc::new(SqliteJobRegistry::new(pool));

    let probe: Arc<dyn CodecProbe> = Arc::new(FakeProbe {
        codec: codec.map(|c| c.to_string()),
    });
    let transcoder: Arc<dyn Transcoder> = Arc::new(NeverFinishingTranscoder);
    let transcode_engine = Arc::new(TranscodeEngine::new(transcoder, Duration::from_secs(3600)));

    let worker = Worker::new(job_registry.clone(), cache_store.clone(), transcode_engine.clone());
    let worker_handle = worker.handle();

    let resolve_playable = Arc::new(ResolvePlayable::new(
        probe.clone(),
        cache_store.clone(),
        job_registry.clone(),
        worker_handle.clone(),
    ));
    let control = Arc::new(ControlUseCases::new(probe, cache_store, job_registry, worker_handle));

    AppState {
        path_resolver,
        resolve_playable,
        control,
    }
}

#[tokio::test]
async fn scenario_a_h264_passthrough_serves_original_with_no_range() {
    let dir = tempfile::TempDir::new().unwrap();
    std::fs::write(dir.path().join("clip.mp4"), b"already-h264-bytes").unwrap();
    let cache_dir = tempfile::TempDir::new().unwrap();

    let state = build_state(dir.path(), cache_dir.path().to_path_buf(), Some("h264")).await;
    let app = router(state);

    let response = app
        .oneshot(
            Request::builder()
                .uri("/stream/clip.mp4")
                .body(Body::empty())
                .unwrap(),
        )
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::OK);
    assert_eq!(
        response.headers().get("accept-ranges").unwrap(),
        "bytes"
    );

    let body = axum::body::to_bytes(response.into_body(), usize::MAX)
        .await
        .unwrap();
    assert_eq!(&body[..], b"already-h264-bytes");
}

#[tokio::test]
async fn scenario_b_non_h264_source_responds_202_with_retry_after() {
    let dir = tempfile::TempDir::new().unwrap();
    std::fs::write(dir.path().join("walk.avi"), b"mpeg4-bytes").unwrap();
    let cache_dir = tempfile::TempDir::new().unwrap();

    let state = build_state(dir.path(), cache_dir.path().to_path_buf(), Some("mpeg4")).await;
    let app = router(state);

    let response = app
        .oneshot(
            Request::builder()
                .uri("/stream/walk.avi")
                .body(Body::empty())
                .unwrap(),
        )
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::ACCEPTED);
    assert!(response.headers().get("retry-after").is_some());
}

#[tokio::test]
async fn scenario_h_path_escape_is_rejected() {
    let dir = tempfile::TempDir::new().unwrap();
    std::fs::write(dir.path().join("clip.mp4"), b"data").unwrap();
    let cache_dir = tempfile::TempDir::new().unwrap();

    let state = build_state(dir.path(), cache_dir.path().to_path_buf(), Some("h264")).await;
    let app = router(state);

    let response = app
        .oneshot(
            Request::builder()
                .uri("/stream/..%2F..%2F..%2Fetc%2Fpasswd")
                .body(Body::empty())
                .unwrap(),
        )
        .await
        .unwrap();

    assert!(
        response.status() == StatusCode::FORBIDDEN || response.status() == StatusCode::NOT_FOUND
    );
}

#[tokio::test]
async fn scenario_d_range_request_returns_partial_content() {
    let dir = tempfile::TempDir::new().unwrap();
    let body_bytes: Vec<u8> = (0..1_000_000u32).map(|i| (i % 256) as u8).collect();
    std::fs::write(dir.path().join("clip.mp4"), &body_bytes).unwrap();
    let cache_dir = tempfile::TempDir::new().unwrap();

    let state = build_state(dir.path(), cache_dir.path().to_path_buf(), Some("h264")).await;
    let app = router(state);

    let response = app
        .oneshot(
            Request::builder()
                .uri("/stream/clip.mp4")
                .header("range", "bytes=500000-600000")
                .body(Body::empty())
                .unwrap(),
        )
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::PARTIAL_CONTENT);
    assert_eq!(
        response.headers().get("content-range").unwrap(),
        "bytes 500000-600000/1000000"
    );
    assert_eq!(response.headers().get("content-length").unwrap(), "100001");

    let body = axum::body::to_bytes(response.into_body(), usize::MAX)
        .await
        .unwrap();
    assert_eq!(body.len(), 100001);
    assert_eq!(&body[..], &body_bytes[500000..=600000]);
}

#[tokio::test]
async fn scenario_e_malformed_range_is_rejected() {
    let dir = tempfile::TempDir::new().unwrap();
    std::fs::write(dir.path().join("clip.mp4"), vec![0u8; 1_000_000]).unwrap();
    let cache_dir = tempfile::TempDir::new().unwrap();

    let state = build_state(dir.path(), cache_dir.path().to_path_buf(), Some("h264")).await;
    let app = router(state);

    let response = app
        .oneshot(
            Request::builder()
                .uri("/stream/clip.mp4")
                .header("range", "bytes=2000000-3000000")
                .body(Body::empty())
                .unwrap(),
        )
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::RANGE_NOT_SATISFIABLE);
}

#[tokio::test]
async fn cache_stats_endpoint_reports_an_empty_cache() {
    let dir = tempfile::TempDir::new().unwrap();
    std::fs::write(dir.path().join("clip.mp4"), b"data").unwrap();
    let cache_dir = tempfile::TempDir::new().unwrap();

    let state = build_state(dir.path(), cache_dir.path().to_path_buf(), Some("h264")).await;
    let app = router(state);

    let response = app
        .oneshot(
            Request::builder()
                .uri("/cache/stats")
                .body(Body::empty())
                .unwrap(),
        )
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::OK);
    let body = axum::body::to_bytes(response.into_body(), usize::MAX)
        .await
        .unwrap();
    let json: serde_json::Value = serde_json::from_slice(&body).unwrap();
    assert_eq!(json["total_files"], 0);
}

#[tokio::test]
async fn scenario_c_ten_concurrent_requests_coalesce_onto_one_job() {
    let dir = tempfile::TempDir::new().unwrap();
    std::fs::write(dir.path().join("big.mkv"), b"mpeg4-bytes").unwrap();
    let cache_dir = tempfile::TempDir::new().unwrap();
    let src = Arc::new(dir.path().join("big.mkv"));

    let state = build_state(dir.path(), cache_dir.path().to_path_buf(), Some("mpeg4")).await;

    // Each task owns a clone of the `Arc<ResolvePlayable>`/`Arc<PathBuf>` so
    // the futures are `'static` and genuinely run as separate tokio tasks,
    // exercising the same interleaving ten concurrent request handlers would.
    let handles: Vec<_> = (0..10)
        .map(|_| {
            let resolve_playable = state.resolve_playable.clone();
            let src = src.clone();
            tokio::spawn(async move { resolve_playable.decide(src.as_path()).await })
        })
        .collect();

    let mut job_ids = std::collections::HashSet::new();
    for handle in handles {
        match handle.await.unwrap().unwrap() {
            transcode_streamd::application::use_cases::PlaybackDecision::Transcoding {
                job_id,
                ..
            } => {
                job_ids.insert(job_id);
            }
            transcode_streamd::application::use_cases::PlaybackDecision::ServeFile(_) => {
                panic!("expected a transcoding decision for an uncached non-h264 source")
            }
        }
    }

    assert_eq!(job_ids.len(), 1, "all ten requests must coalesce onto the same job id");

    let status = state.control.status(src.as_path()).await.unwrap();
    assert!(status.transcoding_in_progress);
}
