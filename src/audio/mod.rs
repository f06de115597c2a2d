//! Audio duration lookup for timestamping scan windows.

mod duration;

pub use duration::{resolve_duration, sidecar_audio_path, wav_duration_secs};
