mod application;
mod config;
mod domain;
mod infrastructure;
mod interfaces;
mod presentation;
mod shared;

use std::sync::Arc;
use std::time::Duration;

use tokio::net::TcpListener;
use tracing::info;
use tracing_subscriber::EnvFilter;

use crate::application::use_cases::{ControlUseCases, ResolvePlayable};
use crate::config::Config;
use crate::infrastructure::cache::CacheStore;
use crate::infrastructure::database;
use crate::infrastructure::external::{FfmpegAdapter, FfprobeAdapter};
use crate::infrastructure::filesystem::PathResolver;
use crate::infrastructure::jobs::SqliteJobRegistry;
use crate::infrastructure::transcode_engine::TranscodeEngine;
use crate::infrastructure::worker::Worker;
use crate::presentation::http::{router, AppState};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .init();

    let config = Config::from_env()?;
    info!(media_root = ?config.media_root, cache_dir = ?config.cache_dir, "starting up");

    let pool = database::connect(&config.database_url).await?;
    database::initialize_schema(&pool).await?;

    let path_resolver = Arc::new(PathResolver::new(config.media_root.clone())?);
    let cache_store = Arc::new(
        CacheStore::new(config.cache_dir.clone(), config.cache_size_limit, config.cache_ttl).await?,
    );
    if let Err(e) = cache_store.rescan().await {
        tracing::warn!(error = %e, "startup cache rescan failed; continuing with metadata as loaded");
    }
    let job_registry = Arc::new(SqliteJobRegistry::new(pool));
    let probe: Arc<dyn interfaces::external_services::CodecProbe> =
        Arc::new(FfprobeAdapter::new(Duration::from_secs(10)));
    let transcoder = Arc::new(FfmpegAdapter::new(config.transcode_timeout));
    let transcode_engine = Arc::new(TranscodeEngine::new(transcoder, config.transcode_timeout));

    let worker = Worker::new(
        job_registry.clone(),
        cache_store.clone(),
        transcode_engine.clone(),
    );
    let worker_handle = worker.handle();
    let shutdown_worker_handle = worker_handle.clone();
    let worker_join = tokio::spawn(worker.run());

    spawn_periodic_eviction(cache_store.clone(), config.cache_eviction_interval);

    let resolve_playable = Arc::new(ResolvePlayable::new(
        probe.clone(),
        cache_store.clone(),
        job_registry.clone(),
        worker_handle.clone(),
    ));
    let control = Arc::new(ControlUseCases::new(
        probe,
        cache_store,
        job_registry,
        worker_handle,
    ));

    let state = AppState {
        path_resolver,
        resolve_playable,
        control,
    };

    let app = router(state);
    let listener = TcpListener::bind(&config.bind_addr).await?;
    info!(addr = %config.bind_addr, "listening");

    axum::serve(listener, app)
        .with_graceful_shutdown(async move {
            let _ = tokio::signal::ctrl_c().await;
            info!("shutdown signal received");
            shutdown_worker_handle.shutdown();
        })
        .await?;

    // The worker finishes its current job (or is cut short by the
    // transcoder's own wall-clock timeout) rather than dying mid-transcode;
    // `join` is bounded so a wedged worker can never hang process exit.
    if tokio::time::timeout(Duration::from_secs(30), worker_join)
        .await
        .is_err()
    {
        tracing::warn!("worker did not shut down within the grace period");
    }

    Ok(())
}

/// Periodic eviction sweep, in addition to the pre-transcode evict the
/// worker already performs (SPEC_FULL §10).
fn spawn_periodic_eviction(cache_store: Arc<CacheStore>, interval: Duration) {
    tokio::spawn(async move {
        let mut ticker = tokio::time::interval(interval);
        loop {
            ticker.tick().await;
            if let Err(e) = cache_store.evict(false).await {
                tracing::warn!(error = %e, "periodic cache eviction failed");
            }
        }
    });
}
