//! Core types for sprite animation

use std::time::Duration;

use thiserror::Error;

/// Error type for animation configuration and lookup
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum AnimationError {
    /// No catalog registered under this sprite name
    #[error("unknown sprite: {0}")]
    UnknownSprite(String),
    /// Sprite exists but has no animation with this name
    #[error("unknown animation {animation} for sprite {sprite}")]
    UnknownAnimation { sprite: String, animation: String },
    /// A definition must contain at least one frame
    #[error("animation {0} has no frames")]
    EmptyFrames(String),
    /// The catalog's fallback animation is not one of its animations
    #[error("default animation {0} is not defined")]
    MissingDefault(String),
}

/// Result type for animation operations
pub type AnimationResult<T> = Result<T, AnimationError>;

/// One still image from a sprite sheet.
///
/// Offsets locate the frame within the sheet; the presentation layer turns
/// them into pixels.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct Frame {
    pub offset_x: i32,
    pub offset_y: i32,
    /// Display time in milliseconds
    pub duration_ms: u32,
}

impl Frame {
    pub const fn new(offset_x: i32, offset_y: i32, duration_ms: u32) -> Self {
        Self {
            offset_x,
            offset_y,
            duration_ms,
        }
    }

    /// Display time of this frame
    pub fn duration(&self) -> Duration {
        Duration::from_millis(u64::from(self.duration_ms))
    }
}

/// An ordered, possibly looping sequence of frames
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AnimationDefinition {
    frames: Vec<Frame>,
    loopable: bool,
}

impl AnimationDefinition {
    /// Build a definition. Returns `None` for an empty frame list.
    pub fn new(frames: Vec<Frame>, loopable: bool) -> Option<Self> {
        if frames.is_empty() {
            return None;
        }
        Some(Self { frames, loopable })
    }

    /// All frames in play order
    pub fn frames(&self) -> &[Frame] {
        &self.frames
    }

    /// The frame shown first (and the only one under reduced motion)
    pub fn first_frame(&self) -> Frame {
        self.frames[0]
    }

    /// Whether playback wraps to frame 0 after the last frame
    pub fn loopable(&self) -> bool {
        self.loopable
    }

    /// Number of frames
    pub fn frame_count(&self) -> usize {
        self.frames.len()
    }

    /// Sum of every frame's display time
    pub fn total_duration(&self) -> Duration {
        let total: u64 = self.frames.iter().map(|f| u64::from(f.duration_ms)).sum();
        Duration::from_millis(total)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_animation_error_display() {
        assert_eq!(
            AnimationError::UnknownSprite("Rover".into()).to_string(),
            "unknown sprite: Rover"
        );
        assert_eq!(
            AnimationError::UnknownAnimation {
                sprite: "Imp".into(),
                animation: "Dance".into()
            }
            .to_string(),
            "unknown animation Dance for sprite Imp"
        );
    }

    #[test]
    fn test_definition_rejects_empty_frames() {
        assert!(AnimationDefinition::new(Vec::new(), false).is_none());
    }

    #[test]
    fn test_definition_total_duration() {
        let def = AnimationDefinition::new(
            vec![Frame::new(0, 0, 100), Frame::new(124, 0, 0), Frame::new(248, 0, 250)],
            false,
        )
        .unwrap();

        assert_eq!(def.frame_count(), 3);
        assert_eq!(def.total_duration(), Duration::from_millis(350));
        assert_eq!(def.first_frame(), Frame::new(0, 0, 100));
        assert!(!def.loopable());
    }

    #[test]
    fn test_frame_duration() {
        assert_eq!(Frame::new(1, 2, 40).duration(), Duration::from_millis(40));
    }
}
