//! Sound definitions
//!
//! Static metadata describing how one sound id is played.

use std::time::Duration;

use thiserror::Error;

/// Error type for sound configuration
#[derive(Debug, Clone, PartialEq, Error)]
pub enum SoundError {
    #[error("unknown sound id {0:?}")]
    UnknownSound(String),
    #[error("volume {volume} of {id:?} is outside 0.0..=1.0")]
    InvalidVolume { id: String, volume: f32 },
    #[error("sound id {0:?} registered twice")]
    DuplicateSound(String),
}

/// Result type for sound configuration
pub type SoundResult<T> = Result<T, SoundError>;

/// Playback metadata for one sound id
#[derive(Debug, Clone, PartialEq)]
pub struct SoundDefinition {
    category: String,
    volume: f32,
    priority_rank: i32,
    debounce_ms: u32,
    preload: bool,
    resource_ref: String,
}

impl SoundDefinition {
    /// Create a definition, rejecting a volume outside `0.0..=1.0`
    pub fn new(id: &str, category: &str, resource_ref: &str, volume: f32) -> SoundResult<Self> {
        if !volume.is_finite() || !(0.0..=1.0).contains(&volume) {
            return Err(SoundError::InvalidVolume {
                id: id.to_string(),
                volume,
            });
        }
        Ok(Self {
            category: category.to_string(),
            volume,
            priority_rank: 0,
            debounce_ms: 0,
            preload: false,
            resource_ref: resource_ref.to_string(),
        })
    }

    pub fn with_priority(mut self, rank: i32) -> Self {
        self.priority_rank = rank;
        self
    }

    pub fn with_debounce_ms(mut self, ms: u32) -> Self {
        self.debounce_ms = ms;
        self
    }

    /// Mark the sound for preloading at engine startup
    pub fn preloaded(mut self) -> Self {
        self.preload = true;
        self
    }

    pub fn category(&self) -> &str {
        &self.category
    }

    /// Default playback volume
    pub fn volume(&self) -> f32 {
        self.volume
    }

    /// Relative importance. Carried for callers; playback never preempts on it.
    pub fn priority_rank(&self) -> i32 {
        self.priority_rank
    }

    pub fn debounce(&self) -> Duration {
        Duration::from_millis(u64::from(self.debounce_ms))
    }

    pub fn preload(&self) -> bool {
        self.preload
    }

    pub fn resource_ref(&self) -> &str {
        &self.resource_ref
    }
}
