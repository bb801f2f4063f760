pub mod control;
pub mod resolve_playable;

pub use control::{ControlUseCases, PrewarmStatus, TranscodeStatus};
pub use resolve_playable::{PlaybackDecision, ResolvePlayable};
