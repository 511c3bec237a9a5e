//! Lazy frame streams
//!
//! A [`Timeline`] walks an animation definition and yields each frame with
//! the offset (from the start of playback) at which it should appear. It is
//! finite for non-looping animations and endless for looping ones; the
//! scheduler paces it against real or virtual time.

use std::sync::Arc;
use std::time::Duration;

use super::types::{AnimationDefinition, Frame};

/// A frame positioned on the playback timeline
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TimedFrame {
    /// Index into the definition's frame list
    pub index: usize,
    /// Offset from the start of playback at which the frame appears
    pub at: Duration,
    pub frame: Frame,
}

impl TimedFrame {
    /// Offset at which this frame stops being shown
    pub fn until(&self) -> Duration {
        self.at + self.frame.duration()
    }
}

/// Iterator over the frames of one playback
#[derive(Debug, Clone)]
pub struct Timeline {
    definition: Arc<AnimationDefinition>,
    index: usize,
    at: Duration,
    reduced_motion: bool,
    wraps: bool,
    done: bool,
}

impl Timeline {
    /// Start a timeline at offset zero.
    ///
    /// Under `reduced_motion` only the first frame is produced. A looping
    /// definition whose frames all last zero milliseconds is played once,
    /// since wrapping it would never let time advance.
    pub fn new(definition: Arc<AnimationDefinition>, reduced_motion: bool) -> Self {
        let wraps = definition.loopable() && !definition.total_duration().is_zero();
        Self {
            definition,
            index: 0,
            at: Duration::ZERO,
            reduced_motion,
            wraps,
            done: false,
        }
    }

    pub fn definition(&self) -> &Arc<AnimationDefinition> {
        &self.definition
    }

    /// Whether the stream is endless
    pub fn is_infinite(&self) -> bool {
        self.wraps && !self.reduced_motion
    }
}

impl Iterator for Timeline {
    type Item = TimedFrame;

    fn next(&mut self) -> Option<TimedFrame> {
        if self.done {
            return None;
        }

        let frame = self.definition.frames()[self.index];
        let item = TimedFrame {
            index: self.index,
            at: self.at,
            frame,
        };

        if self.reduced_motion {
            self.done = true;
            return Some(item);
        }

        self.at += frame.duration();
        self.index += 1;
        if self.index == self.definition.frame_count() {
            if self.wraps {
                self.index = 0;
            } else {
                self.done = true;
            }
        }

        Some(item)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn def(durations: &[u32], loopable: bool) -> Arc<AnimationDefinition> {
        let frames = durations
            .iter()
            .enumerate()
            .map(|(i, d)| Frame::new(i as i32, 0, *d))
            .collect();
        Arc::new(AnimationDefinition::new(frames, loopable).unwrap())
    }

    fn ms(v: u64) -> Duration {
        Duration::from_millis(v)
    }

    #[test]
    fn test_finite_timeline() {
        let frames: Vec<_> = Timeline::new(def(&[100, 50, 200], false), false).collect();

        assert_eq!(frames.len(), 3);
        assert_eq!(frames[0].at, ms(0));
        assert_eq!(frames[1].at, ms(100));
        assert_eq!(frames[2].at, ms(150));
        assert_eq!(frames[2].until(), ms(350));
    }

    #[test]
    fn test_looping_timeline_wraps() {
        let mut timeline = Timeline::new(def(&[100, 100], true), false);
        assert!(timeline.is_infinite());

        let indices: Vec<_> = timeline.by_ref().take(5).map(|f| f.index).collect();
        assert_eq!(indices, vec![0, 1, 0, 1, 0]);
        assert_eq!(timeline.next().unwrap().at, ms(500));
    }

    #[test]
    fn test_reduced_motion_yields_first_frame_only() {
        let mut timeline = Timeline::new(def(&[100, 100], true), true);
        assert!(!timeline.is_infinite());

        let first = timeline.next().unwrap();
        assert_eq!(first.index, 0);
        assert!(timeline.next().is_none());
    }

    #[test]
    fn test_zero_length_loop_plays_once() {
        let timeline = Timeline::new(def(&[0, 0, 0], true), false);
        assert!(!timeline.is_infinite());
        assert_eq!(timeline.count(), 3);
    }
}
