//! Frame-accurate animation scheduling
//!
//! Plays one animation at a time, advancing through its frames according to
//! each frame's own duration. Every scheduled advance carries the generation
//! of the playback that issued it; when it fires, the generation is compared
//! against the playback that is current *at fire time*, so an advance left
//! over from a replaced definition can never move the new one.

use std::sync::Arc;
use std::time::Duration;

use super::catalog::AnimationLibrary;
use super::timeline::{TimedFrame, Timeline};
use super::types::{AnimationDefinition, Frame};
use crate::time::{CancellableSchedule, FiredTimer, TimerQueue};

/// Playback options
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct PlayOptions {
    /// Show only the first frame and schedule nothing
    pub reduced_motion: bool,
}

/// Animation state
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum AnimState {
    #[default]
    Stopped,
    Playing,
    Paused,
    /// The last frame of a non-looping animation is being held
    Finished,
}

/// A frame becoming visible
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FrameChange {
    /// Clock reading at which the frame appears
    pub at: Duration,
    pub sprite: String,
    pub animation: String,
    pub index: usize,
    pub frame: Frame,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Step {
    Advance { generation: u64 },
    Finish { generation: u64 },
}

#[derive(Debug)]
struct Playback {
    generation: u64,
    sprite: String,
    animation: String,
    /// Clock reading corresponding to timeline offset zero
    origin: Duration,
    timeline: Timeline,
    current: TimedFrame,
    next: Option<TimedFrame>,
    reduced_motion: bool,
    paused_remaining: Option<Duration>,
}

impl Playback {
    fn deadline(&self) -> Duration {
        self.origin + self.current.until()
    }

    fn change(&self) -> FrameChange {
        FrameChange {
            at: self.origin + self.current.at,
            sprite: self.sprite.clone(),
            animation: self.animation.clone(),
            index: self.current.index,
            frame: self.current.frame,
        }
    }
}

/// Time-paced player for a single animation slot
#[derive(Debug, Default)]
pub struct AnimationScheduler {
    timers: TimerQueue<Step>,
    step: CancellableSchedule,
    playback: Option<Playback>,
    generation: u64,
    state: AnimState,
}

impl AnimationScheduler {
    /// Create an idle scheduler
    pub fn new() -> Self {
        Self::default()
    }

    /// Start playing `definition` at clock reading `now`, replacing whatever
    /// was playing. Returns the first frame.
    pub fn play(
        &mut self,
        now: Duration,
        sprite: &str,
        animation: &str,
        definition: Arc<AnimationDefinition>,
        options: PlayOptions,
    ) -> Option<FrameChange> {
        self.step.cancel(&mut self.timers);
        self.generation += 1;

        let mut timeline = Timeline::new(definition, options.reduced_motion);
        let Some(current) = timeline.next() else {
            self.playback = None;
            self.state = AnimState::Stopped;
            return None;
        };
        let next = timeline.next();

        let playback = Playback {
            generation: self.generation,
            sprite: sprite.to_string(),
            animation: animation.to_string(),
            origin: now,
            timeline,
            current,
            next,
            reduced_motion: options.reduced_motion,
            paused_remaining: None,
        };
        let change = playback.change();
        self.playback = Some(playback);
        self.state = AnimState::Playing;
        self.arm(now);

        log::trace!("playing {}/{}", sprite, animation);
        Some(change)
    }

    /// Resolve `sprite`/`animation` in `library` and play it.
    ///
    /// An unknown sprite stops playback and produces no frames. An unknown
    /// animation falls back to the sprite's default animation.
    pub fn play_named(
        &mut self,
        now: Duration,
        library: &AnimationLibrary,
        sprite: &str,
        animation: &str,
        options: PlayOptions,
    ) -> Option<FrameChange> {
        let catalog = match library.sprite(sprite) {
            Ok(catalog) => Arc::clone(catalog),
            Err(err) => {
                log::warn!("cannot play {:?}: {}", animation, err);
                self.stop();
                return None;
            }
        };
        let (resolved, definition) = catalog.lookup(animation);
        self.play(now, sprite, resolved, Arc::clone(definition), options)
    }

    /// Stop playback and drop any scheduled advance
    pub fn stop(&mut self) {
        self.step.cancel(&mut self.timers);
        self.generation += 1;
        self.playback = None;
        self.state = AnimState::Stopped;
    }

    /// Freeze on the current frame, remembering how long it had left
    pub fn pause(&mut self, now: Duration) {
        if self.state != AnimState::Playing {
            return;
        }
        if let Some(playback) = self.playback.as_mut() {
            playback.paused_remaining = Some(playback.deadline().saturating_sub(now));
        }
        self.step.cancel(&mut self.timers);
        self.state = AnimState::Paused;
    }

    /// Continue after [`pause`](Self::pause); the current frame gets the
    /// remainder of its display time
    pub fn resume(&mut self, now: Duration) {
        if self.state != AnimState::Paused {
            return;
        }
        if let Some(playback) = self.playback.as_mut() {
            let remaining = playback.paused_remaining.take().unwrap_or_default();
            let deadline = now + remaining;
            playback.origin = deadline.saturating_sub(playback.current.until());
        }
        self.state = AnimState::Playing;
        self.arm(now);
    }

    /// Fire every advance due at or before `now`, returning the frames that
    /// became visible in order
    pub fn advance_to(&mut self, now: Duration) -> Vec<FrameChange> {
        let mut changes = Vec::new();
        while let Some(fired) = self.timers.pop_due(now) {
            self.step.complete(fired.id);
            if let Some(change) = self.fire(fired) {
                changes.push(change);
            }
        }
        changes
    }

    /// Deadline of the next scheduled advance
    pub fn next_deadline(&self) -> Option<Duration> {
        self.timers.next_deadline()
    }

    pub fn state(&self) -> AnimState {
        self.state
    }

    pub fn current_frame(&self) -> Option<Frame> {
        self.playback.as_ref().map(|p| p.current.frame)
    }

    pub fn current_index(&self) -> Option<usize> {
        self.playback.as_ref().map(|p| p.current.index)
    }

    pub fn current_animation(&self) -> Option<&str> {
        self.playback.as_ref().map(|p| p.animation.as_str())
    }

    pub fn current_sprite(&self) -> Option<&str> {
        self.playback.as_ref().map(|p| p.sprite.as_str())
    }

    /// Number of outstanding scheduled advances (zero or one)
    pub fn pending_steps(&self) -> usize {
        self.timers.len()
    }

    fn arm(&mut self, now: Duration) {
        let Some(playback) = self.playback.as_ref() else {
            return;
        };
        let generation = playback.generation;
        let delay = playback.deadline().saturating_sub(now);

        if playback.next.is_some() {
            self.step
                .schedule(&mut self.timers, now, delay, Step::Advance { generation });
        } else if playback.reduced_motion {
            self.state = AnimState::Finished;
        } else {
            self.step
                .schedule(&mut self.timers, now, delay, Step::Finish { generation });
        }
    }

    fn fire(&mut self, fired: FiredTimer<Step>) -> Option<FrameChange> {
        let (generation, finish) = match fired.event {
            Step::Advance { generation } => (generation, false),
            Step::Finish { generation } => (generation, true),
        };

        let current_generation = self.playback.as_ref().map(|p| p.generation);
        if current_generation != Some(generation) || self.state != AnimState::Playing {
            log::trace!(
                "dropping stale frame step (generation {}, current {:?})",
                generation,
                current_generation
            );
            return None;
        }

        if finish {
            self.state = AnimState::Finished;
            return None;
        }

        let playback = self.playback.as_mut()?;
        let next = playback.next.take()?;
        playback.current = next;
        playback.next = playback.timeline.next();
        let change = playback.change();
        self.arm(fired.at);
        Some(change)
    }
}
