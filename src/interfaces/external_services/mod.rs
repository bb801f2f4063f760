pub mod codec_probe;
pub mod transcoder;

pub use codec_probe::{needs_transcoding, CodecProbe};
pub use transcoder::Transcoder;
