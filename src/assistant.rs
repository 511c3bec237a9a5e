//! The assistant service object
//!
//! [`Assistant`] is constructed once at startup and handed to whatever
//! drives it. It loads preferences, owns the lifecycle machine, the
//! animation scheduler and the sound engine, and routes the lifecycle's
//! effects to the other two. Time only moves inside [`Assistant::advance`],
//! which fires due timers of every component in global deadline order.

use std::sync::Arc;
use std::time::Duration;

use thiserror::Error;

use crate::animation::imp::IMP_SPRITE;
use crate::animation::{
    AnimState, AnimationError, AnimationLibrary, AnimationScheduler, Frame, FrameChange,
    PlayOptions,
};
use crate::config::Options;
use crate::lifecycle::{LifecycleEffect, LifecycleState, LifecycleStateMachine, Tip};
use crate::prefs::{PreferenceStore, PreferenceWriter, Preferences};
use crate::sound::{
    PlayOutcome, PlaybackBackend, SoundEngine, SoundError, SoundOptions, SoundRegistry,
};
use crate::time::Clock;

/// Error type for assembling an assistant
#[derive(Debug, Error)]
pub enum AssistantError {
    #[error("animation data: {0}")]
    Animation(#[from] AnimationError),
    #[error("sound data: {0}")]
    Sound(#[from] SoundError),
}

/// Everything the presentation layer needs to draw the assistant
#[derive(Debug, Clone, PartialEq)]
pub struct PresentationState {
    pub lifecycle_state: LifecycleState,
    pub is_visible: bool,
    pub is_minimized: bool,
    pub is_dormant: bool,
    pub current_tip: Option<Tip>,
    pub current_animation: String,
    /// Frame on screen, or `None` while nothing is playing
    pub current_frame: Option<Frame>,
    pub seen_tip_ids: Vec<String>,
    pub is_first_visit: bool,
    pub audio_enabled: bool,
}

/// Mounted assistant
pub struct Assistant {
    clock: Arc<dyn Clock>,
    library: AnimationLibrary,
    sprite: String,
    lifecycle: LifecycleStateMachine,
    scheduler: AnimationScheduler,
    sound: SoundEngine,
    reduced_motion: bool,
    frames: Vec<FrameChange>,
    mounted: bool,
}

impl Assistant {
    /// Mount with the built-in imp animations and sounds
    pub fn mount(
        options: &Options,
        store: Arc<dyn PreferenceStore>,
        backend: Box<dyn PlaybackBackend>,
        clock: Arc<dyn Clock>,
    ) -> Result<Self, AssistantError> {
        Self::mount_with(
            options,
            AnimationLibrary::builtin()?,
            SoundRegistry::builtin()?,
            store,
            backend,
            clock,
        )
    }

    /// Mount with custom animation and sound data. `library` must contain
    /// the imp sprite.
    pub fn mount_with(
        options: &Options,
        library: AnimationLibrary,
        registry: SoundRegistry,
        store: Arc<dyn PreferenceStore>,
        backend: Box<dyn PlaybackBackend>,
        clock: Arc<dyn Clock>,
    ) -> Result<Self, AssistantError> {
        let catalog = Arc::clone(library.sprite(IMP_SPRITE)?);

        let defaults = Preferences {
            audio_enabled: options.audio_default,
            ..Preferences::default()
        };
        let preferences = Preferences::load_with_defaults(store.as_ref(), defaults);
        let writer = PreferenceWriter::new(store);

        let lifecycle = LifecycleStateMachine::mount(
            catalog,
            options.timings(),
            &preferences,
            writer.clone(),
            Arc::clone(&clock),
        );
        let sound = SoundEngine::new(
            registry,
            backend,
            Arc::clone(&clock),
            preferences.audio_enabled,
            writer,
        );

        let mut assistant = Self {
            clock,
            library,
            sprite: IMP_SPRITE.to_string(),
            lifecycle,
            scheduler: AnimationScheduler::new(),
            sound,
            reduced_motion: options.reduced_motion,
            frames: Vec::new(),
            mounted: true,
        };
        let now = assistant.clock.now();
        assistant.route_effects(now);
        log::info!(
            "assistant mounted: state={} minimized={} audio={}",
            assistant.lifecycle.state(),
            assistant.lifecycle.is_minimized(),
            assistant.sound.is_enabled()
        );
        Ok(assistant)
    }

    /// Cancel every timer and release audio
    pub fn unmount(&mut self) {
        if !self.mounted {
            return;
        }
        self.lifecycle.unmount();
        self.scheduler.stop();
        self.sound.shutdown();
        self.mounted = false;
        log::info!("assistant unmounted");
    }

    /// Fire everything due up to the current clock reading
    pub fn advance(&mut self) {
        let now = self.clock.now();
        loop {
            let lifecycle_due = self.lifecycle.next_deadline().filter(|d| *d <= now);
            let frame_due = self.scheduler.next_deadline().filter(|d| *d <= now);

            match (lifecycle_due, frame_due) {
                (Some(l), Some(f)) if f < l => self.advance_frames(f),
                (Some(_), _) => {
                    if let Some(at) = self.lifecycle.fire_next(now) {
                        self.route_effects(at);
                    }
                }
                (None, Some(f)) => self.advance_frames(f),
                (None, None) => break,
            }
        }
        self.sound.pump();
    }

    /// Earliest pending deadline across all components
    pub fn next_deadline(&self) -> Option<Duration> {
        match (self.lifecycle.next_deadline(), self.scheduler.next_deadline()) {
            (Some(a), Some(b)) => Some(a.min(b)),
            (a, b) => a.or(b),
        }
    }

    // ------------------------------------------------------------------
    // Lifecycle operations
    // ------------------------------------------------------------------

    pub fn wake_up(&mut self) {
        self.lifecycle.wake_up();
        self.route_now();
    }

    pub fn go_to_dormant(&mut self) {
        self.lifecycle.go_to_dormant();
        self.route_now();
    }

    pub fn show_tip(&mut self, tip: Tip) {
        self.lifecycle.show_tip(tip);
        self.route_now();
    }

    pub fn dismiss_tip(&mut self) {
        self.lifecycle.dismiss_tip();
        self.route_now();
    }

    pub fn close_balloon(&mut self) {
        self.lifecycle.close_balloon();
        self.route_now();
    }

    pub fn show_imp(&mut self) {
        self.lifecycle.show_imp();
        self.route_now();
    }

    pub fn hide_imp(&mut self) {
        self.lifecycle.hide_imp();
        self.route_now();
    }

    pub fn play_mischief(&mut self) {
        self.lifecycle.play_mischief();
        self.route_now();
    }

    pub fn reset_inactivity_timer(&mut self) {
        self.lifecycle.reset_inactivity_timer();
    }

    pub fn clear_seen_tips(&mut self) {
        self.lifecycle.clear_seen_tips();
    }

    // ------------------------------------------------------------------
    // Sound operations
    // ------------------------------------------------------------------

    pub fn play_sound(&mut self, id: &str, options: SoundOptions) -> PlayOutcome {
        self.sound.play_sound(id, options)
    }

    pub fn stop_sound(&mut self, id: &str) -> bool {
        self.sound.stop_sound(id)
    }

    pub fn stop_all_sounds(&mut self) -> usize {
        self.sound.stop_all_sounds()
    }

    pub fn toggle_audio(&mut self) -> bool {
        self.sound.toggle_audio()
    }

    pub fn enable_audio(&mut self) {
        self.sound.enable_audio();
    }

    pub fn disable_audio(&mut self) {
        self.sound.disable_audio();
    }

    pub fn preload_sound(&mut self, id: &str) -> bool {
        self.sound.preload_sound(id)
    }

    // ------------------------------------------------------------------
    // Animation control
    // ------------------------------------------------------------------

    /// Switch reduced motion on or off, restarting the current animation
    /// in the new mode
    pub fn set_reduced_motion(&mut self, reduced: bool) {
        if self.reduced_motion == reduced {
            return;
        }
        self.reduced_motion = reduced;
        if self.scheduler.state() != AnimState::Stopped {
            let now = self.clock.now();
            let animation = self.lifecycle.current_animation().to_string();
            self.play_animation(now, &animation);
        }
    }

    pub fn pause_animation(&mut self) {
        let now = self.clock.now();
        self.scheduler.pause(now);
    }

    pub fn resume_animation(&mut self) {
        let now = self.clock.now();
        self.scheduler.resume(now);
    }

    /// Take the frames that became visible since the last call
    pub fn drain_frame_changes(&mut self) -> Vec<FrameChange> {
        std::mem::take(&mut self.frames)
    }

    // ------------------------------------------------------------------
    // Queries
    // ------------------------------------------------------------------

    pub fn snapshot(&self) -> PresentationState {
        PresentationState {
            lifecycle_state: self.lifecycle.state(),
            is_visible: self.lifecycle.is_visible(),
            is_minimized: self.lifecycle.is_minimized(),
            is_dormant: self.lifecycle.is_dormant(),
            current_tip: self.lifecycle.current_tip().cloned(),
            current_animation: self.lifecycle.current_animation().to_string(),
            current_frame: self.scheduler.current_frame(),
            seen_tip_ids: self.lifecycle.seen_tip_ids().to_vec(),
            is_first_visit: self.lifecycle.is_first_visit(),
            audio_enabled: self.sound.is_enabled(),
        }
    }

    pub fn lifecycle(&self) -> &LifecycleStateMachine {
        &self.lifecycle
    }

    pub fn scheduler(&self) -> &AnimationScheduler {
        &self.scheduler
    }

    pub fn sound(&self) -> &SoundEngine {
        &self.sound
    }

    pub fn library(&self) -> &AnimationLibrary {
        &self.library
    }

    pub fn reduced_motion(&self) -> bool {
        self.reduced_motion
    }

    fn route_now(&mut self) {
        let now = self.clock.now();
        self.route_effects(now);
    }

    fn route_effects(&mut self, at: Duration) {
        for effect in self.lifecycle.drain_effects() {
            match effect {
                LifecycleEffect::StateChanged { from, to } => {
                    log::info!("imp: {} -> {}", from, to);
                }
                LifecycleEffect::AnimationChanged(name) => self.play_animation(at, &name),
                LifecycleEffect::PlaySound(id) => {
                    self.sound.play_sound(id, SoundOptions::default());
                }
                LifecycleEffect::VisibilityChanged(visible) => {
                    log::debug!("imp visible: {}", visible);
                    if !visible {
                        self.scheduler.stop();
                    }
                }
            }
        }
    }

    fn play_animation(&mut self, at: Duration, name: &str) {
        let options = PlayOptions {
            reduced_motion: self.reduced_motion,
        };
        if let Some(change) =
            self.scheduler
                .play_named(at, &self.library, &self.sprite, name, options)
        {
            self.frames.push(change);
        }
    }

    fn advance_frames(&mut self, up_to: Duration) {
        let changes = self.scheduler.advance_to(up_to);
        self.frames.extend(changes);
    }
}

impl Drop for Assistant {
    fn drop(&mut self) {
        self.unmount();
    }
}

impl std::fmt::Debug for Assistant {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Assistant")
            .field("lifecycle", &self.lifecycle)
            .field("animation", &self.scheduler.current_animation())
            .field("sound", &self.sound)
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::animation::imp::{imp_catalog, EXPLAIN, GET_TECHY, GOODBYE, REST_POSE};
    use crate::prefs::{keys, MemoryPreferenceStore};
    use crate::sound::RecordingBackend;
    use crate::time::ManualClock;

    struct Fixture {
        assistant: Assistant,
        clock: ManualClock,
        recorder: RecordingBackend,
        store: Arc<MemoryPreferenceStore>,
    }

    fn fixture(options: Options) -> Fixture {
        let clock = ManualClock::new();
        let recorder = RecordingBackend::new();
        let store = Arc::new(MemoryPreferenceStore::new());
        let assistant = Assistant::mount(
            &options,
            store.clone(),
            Box::new(recorder.clone()),
            Arc::new(clock.clone()),
        )
        .unwrap();
        Fixture {
            assistant,
            clock,
            recorder,
            store,
        }
    }

    fn ms(v: u64) -> Duration {
        Duration::from_millis(v)
    }

    #[test]
    fn test_mount_shows_rest_pose() {
        let mut f = fixture(Options::default());
        let frames = f.assistant.drain_frame_changes();

        assert_eq!(frames.len(), 1);
        assert_eq!(frames[0].animation, REST_POSE);
        assert_eq!(frames[0].at, ms(0));
        assert_eq!(f.assistant.snapshot().current_animation, REST_POSE);
        assert!(f.assistant.snapshot().current_frame.is_some());
    }

    #[test]
    fn test_late_pump_starts_animation_at_timer_deadline() {
        let mut f = fixture(Options::default());
        f.assistant.drain_frame_changes();

        f.clock.advance_ms(5100);
        f.assistant.advance();

        let frames = f.assistant.drain_frame_changes();
        let first_mischief = frames
            .iter()
            .find(|c| c.animation == GET_TECHY)
            .unwrap();
        assert_eq!(first_mischief.at, ms(5000));
        assert!(frames.windows(2).all(|w| w[0].at <= w[1].at));
    }

    #[test]
    fn test_effects_reach_sound_engine() {
        let mut f = fixture(Options::default());

        f.assistant.show_tip(Tip::new("t1", "hello"));
        assert_eq!(f.recorder.play_count("sounds/imp/tip.ogg"), 1);

        f.assistant.dismiss_tip();
        assert_eq!(f.recorder.play_count("sounds/imp/farewell.ogg"), 1);
        assert_eq!(f.assistant.snapshot().current_animation, GOODBYE);
    }

    #[test]
    fn test_dormant_stops_frames() {
        let mut f = fixture(Options::default());
        f.assistant.go_to_dormant();

        let goodbye = imp_catalog().unwrap().get_duration(GOODBYE);
        f.clock.advance(goodbye);
        f.assistant.advance();

        let state = f.assistant.snapshot();
        assert!(state.is_dormant);
        assert!(!state.is_visible);
        assert_eq!(state.current_frame, None);
        assert_eq!(f.assistant.next_deadline(), None);
    }

    #[test]
    fn test_audio_preference_defaults_from_options() {
        let options = Options {
            audio_default: false,
            ..Options::default()
        };
        let mut f = fixture(options);
        assert!(!f.assistant.snapshot().audio_enabled);

        f.assistant.show_tip(Tip::new("t1", "hello"));
        assert!(f.recorder.plays().is_empty());

        assert!(f.assistant.toggle_audio());
        assert_eq!(f.store.value(keys::AUDIO_ENABLED), Some("true".into()));
    }

    #[test]
    fn test_reduced_motion_holds_first_frame() {
        let options = Options {
            reduced_motion: true,
            ..Options::default()
        };
        let mut f = fixture(options);
        f.assistant.show_tip(Tip::new("t1", "hello").with_animation(EXPLAIN));
        f.assistant.drain_frame_changes();

        f.clock.advance_ms(1000);
        f.assistant.advance();
        assert!(f.assistant.drain_frame_changes().is_empty());
        assert_eq!(f.assistant.scheduler().current_index(), Some(0));
    }

    #[test]
    fn test_toggle_reduced_motion_restarts_animation() {
        let mut f = fixture(Options::default());
        f.assistant.drain_frame_changes();

        f.assistant.set_reduced_motion(true);
        let frames = f.assistant.drain_frame_changes();
        assert_eq!(frames.len(), 1);
        assert_eq!(f.assistant.scheduler().pending_steps(), 0);
    }

    #[test]
    fn test_unmount_is_final() {
        let mut f = fixture(Options::default());
        f.assistant.unmount();

        assert_eq!(f.assistant.next_deadline(), None);
        assert!(f.recorder.is_shut_down());
        f.clock.advance_ms(60_000);
        f.assistant.advance();
        assert_eq!(f.assistant.snapshot().lifecycle_state, LifecycleState::Idle);
        assert_eq!(
            f.assistant.play_sound("ui.click", SoundOptions::default()),
            PlayOutcome::Closed
        );
    }
}
