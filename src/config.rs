//! Startup configuration, assembled once from the environment.
//!
//! Per the redesign flag in spec §9: no module-level path constants or other
//! global mutable state — every component that needs configuration receives
//! a clone of this struct (or a field of it) explicitly at construction.

use std::path::PathBuf;
use std::time::Duration;

const GIB: u64 = 1024 * 1024 * 1024;
const DAY_SECS: u64 = 24 * 60 * 60;

#[derive(Debug, Clone)]
pub struct Config {
    pub media_root: PathBuf,
    pub cache_dir: PathBuf,
    pub cache_size_limit: u64,
    pub cache_ttl: Duration,
    pub transcode_timeout: Duration,
    pub database_url: String,
    pub cache_eviction_interval: Duration,
    pub bind_addr: String,
}

impl Config {
    pub fn from_env() -> anyhow::Result<Self> {
        let media_root = std::env::var("MEDIA_ROOT")
            .map_err(|_| anyhow::anyhow!("MEDIA_ROOT must be set"))?;
        let media_root = PathBuf::from(media_root);

        let cache_dir = std::env::var("TRANSCODE_CACHE_DIR")
            .map(PathBuf::from)
            .unwrap_or_else(|_| std::env::temp_dir().join("transcode_cache"));

        let cache_size_limit = std::env::var("TRANSCODE_CACHE_SIZE_LIMIT")
            .ok()
            .and_then(|v| v.parse().ok())
            .unwrap_or(10 * GIB);

        let cache_ttl = std::env::var("TRANSCODE_CACHE_TTL")
            .ok()
            .and_then(|v| v.parse().ok())
            .map(Duration::from_secs)
            .unwrap_or(Duration::from_secs(30 * DAY_SECS));

        let transcode_timeout = std::env::var("TRANSCODE_TIMEOUT")
            .ok()
            .and_then(|v| v.parse().ok())
            .map(Duration::from_secs)
            .unwrap_or(Duration::from_secs(3600));

        let database_url = std::env::var("DATABASE_URL")
            .unwrap_or_else(|_| "sqlite:transcode_jobs.db?mode=rwc".to_string());

        let cache_eviction_interval = std::env::var("CACHE_EVICTION_INTERVAL_SECS")
            .ok()
            .and_then(|v| v.parse().ok())
            .map(Duration::from_secs)
            .unwrap_or(Duration::from_secs(3600));

        let bind_addr = std::env::var("BIND_ADDR").unwrap_or_else(|_| "0.0.0.0:3000".to_string());

        Ok(Self {
            media_root,
            cache_dir,
            cache_size_limit,
            cache_ttl,
            transcode_timeout,
            database_url,
            cache_eviction_interval,
            bind_addr,
        })
    }
}
