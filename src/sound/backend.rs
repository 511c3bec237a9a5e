//! Playback backend interface
//!
//! The engine talks to audio output through [`PlaybackBackend`]. A backend
//! owns playable resources behind opaque [`HandleId`]s; the engine decides
//! when and how loud to play them.

use std::fmt;

use thiserror::Error;

/// Opaque reference to a backend-owned playable resource
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct HandleId(pub u32);

impl fmt::Display for HandleId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "#{}", self.0)
    }
}

/// Error type for playback operations
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum PlaybackError {
    /// Output refused to start before any user interaction
    #[error("playback blocked until user interaction")]
    AutoplayBlocked,
    #[error("backend error: {0}")]
    Backend(String),
    #[error("unknown playback handle {0}")]
    UnknownHandle(HandleId),
}

/// Audio output used by the sound engine
pub trait PlaybackBackend: Send {
    /// Backend name for diagnostics
    fn name(&self) -> &'static str;

    /// Create a handle for `resource_ref`. Called once per sound id.
    fn create_handle(&mut self, resource_ref: &str) -> Result<HandleId, PlaybackError>;

    /// Warm whatever cache backs `handle`
    fn preload(&mut self, handle: HandleId) -> Result<(), PlaybackError>;

    fn set_volume(&mut self, handle: HandleId, volume: f32) -> Result<(), PlaybackError>;

    /// Move the playback position back to the start
    fn rewind(&mut self, handle: HandleId) -> Result<(), PlaybackError>;

    fn start(&mut self, handle: HandleId) -> Result<(), PlaybackError>;

    /// Halt playback. Stopping a handle that is not playing does nothing.
    fn stop(&mut self, handle: HandleId);

    /// Handles whose playback ended on its own since the last call
    fn drain_finished(&mut self) -> Vec<HandleId>;

    /// Release every handle. No call other than `shutdown` follows.
    fn shutdown(&mut self);
}
