//! Sound playback
//!
//! Registry-driven playback of short UI and assistant sounds.
//!
//! # Architecture
//!
//! - [`SoundDefinition`] describes volume, category, debounce and preload
//!   behaviour of one sound id
//! - [`SoundRegistry`] maps ids to definitions
//! - [`PlaybackBackend`] is the audio output seam; [`NullBackend`] plays
//!   nothing, [`RecordingBackend`] records requests for tests and the
//!   `rodio` feature adds a real output device
//! - [`SoundEngine`] owns handles, debounce state and the mute flag

pub mod backend;
pub mod definition;
pub mod engine;
pub mod null;
pub mod recording;
pub mod registry;
#[cfg(feature = "rodio")]
pub mod rodio_backend;

pub use backend::{HandleId, PlaybackBackend, PlaybackError};
pub use definition::{SoundDefinition, SoundError, SoundResult};
pub use engine::{PlayOutcome, SoundEngine, SoundOptions};
pub use null::NullBackend;
pub use recording::{PlayRecord, RecordingBackend};
pub use registry::SoundRegistry;
#[cfg(feature = "rodio")]
pub use rodio_backend::RodioBackend;

/// Sound ids the assistant plays on lifecycle transitions
pub mod cues {
    pub const APPEAR: &str = "imp.appear";
    pub const TIP: &str = "imp.tip";
    pub const FAREWELL: &str = "imp.farewell";
    pub const MISCHIEF: &str = "imp.mischief";
}
