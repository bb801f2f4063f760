pub mod control_handlers;
pub mod streaming_handlers;

pub use control_handlers::{
    cache_stats_handler, health_handler, prewarm_handler, transcode_status_handler,
};
pub use streaming_handlers::stream_handler;
