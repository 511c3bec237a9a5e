//! Registry-driven sound playback
//!
//! The engine resolves sound ids through a [`SoundRegistry`], keeps one
//! reusable backend handle per id, enforces per-id debounce against the
//! injected clock and owns the global mute flag. No operation returns an
//! error: unknown ids, blocked autoplay and backend failures are logged and
//! reported through [`PlayOutcome`].

use std::collections::HashMap;
use std::sync::Arc;
use std::time::Duration;

use super::backend::{HandleId, PlaybackBackend, PlaybackError};
use super::registry::SoundRegistry;
use crate::prefs::{keys, PreferenceWriter};
use crate::time::Clock;

/// Per-call playback options
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct SoundOptions {
    /// Volume for this play instead of the definition's default
    pub volume: Option<f32>,
    /// Ignore the debounce window
    pub force: bool,
}

impl SoundOptions {
    pub fn forced() -> Self {
        Self {
            force: true,
            ..Self::default()
        }
    }

    pub fn with_volume(volume: f32) -> Self {
        Self {
            volume: Some(volume),
            ..Self::default()
        }
    }
}

/// What a [`SoundEngine::play_sound`] call did
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PlayOutcome {
    Played,
    /// Audio is globally disabled
    Muted,
    /// Still inside the sound's debounce window
    Debounced,
    UnknownSound,
    /// The platform refused to start before user interaction
    Blocked,
    /// The backend failed; the error was logged
    Failed,
    /// The engine was shut down
    Closed,
}

impl PlayOutcome {
    pub fn is_played(self) -> bool {
        self == PlayOutcome::Played
    }
}

/// Sound playback engine
pub struct SoundEngine {
    registry: SoundRegistry,
    backend: Box<dyn PlaybackBackend>,
    clock: Arc<dyn Clock>,
    prefs: PreferenceWriter,
    enabled: bool,
    handles: HashMap<String, HandleId>,
    last_played: HashMap<String, Duration>,
    playing: HashMap<String, HandleId>,
    closed: bool,
}

impl SoundEngine {
    /// Create the engine and preload every sound flagged for it
    pub fn new(
        registry: SoundRegistry,
        backend: Box<dyn PlaybackBackend>,
        clock: Arc<dyn Clock>,
        enabled: bool,
        prefs: PreferenceWriter,
    ) -> Self {
        let mut engine = Self {
            registry,
            backend,
            clock,
            prefs,
            enabled,
            handles: HashMap::new(),
            last_played: HashMap::new(),
            playing: HashMap::new(),
            closed: false,
        };

        let preload: Vec<String> = engine
            .registry
            .preload_ids()
            .into_iter()
            .map(str::to_string)
            .collect();
        for id in &preload {
            engine.preload_sound(id);
        }
        log::debug!(
            "sound engine ready: backend={} sounds={} preloaded={}",
            engine.backend.name(),
            engine.registry.len(),
            preload.len()
        );

        engine
    }

    /// Play `id` unless muted, unknown or debounced
    pub fn play_sound(&mut self, id: &str, options: SoundOptions) -> PlayOutcome {
        if self.closed {
            return PlayOutcome::Closed;
        }
        if !self.enabled {
            return PlayOutcome::Muted;
        }
        let Some(definition) = self.registry.get(id) else {
            log::warn!("unknown sound id {:?}", id);
            return PlayOutcome::UnknownSound;
        };

        let now = self.clock.now();
        if !options.force {
            if let Some(last) = self.last_played.get(id) {
                if now.saturating_sub(*last) < definition.debounce() {
                    log::trace!("sound {} debounced", id);
                    return PlayOutcome::Debounced;
                }
            }
        }

        let volume = match options.volume {
            Some(v) if v.is_finite() => v.clamp(0.0, 1.0),
            _ => definition.volume(),
        };
        let resource_ref = definition.resource_ref().to_string();

        let result = self
            .handle_for(id, &resource_ref)
            .and_then(|handle| self.start_playback(handle, volume).map(|()| handle));

        match result {
            Ok(handle) => {
                self.last_played.insert(id.to_string(), now);
                self.playing.insert(id.to_string(), handle);
                PlayOutcome::Played
            }
            Err(PlaybackError::AutoplayBlocked) => {
                log::debug!("sound {} blocked until user interaction", id);
                PlayOutcome::Blocked
            }
            Err(err) => {
                log::error!("sound {} failed to play: {}", id, err);
                PlayOutcome::Failed
            }
        }
    }

    /// Stop `id` if it is playing. Returns true if it was.
    pub fn stop_sound(&mut self, id: &str) -> bool {
        match self.playing.remove(id) {
            Some(handle) => {
                self.backend.stop(handle);
                true
            }
            None => false,
        }
    }

    /// Stop everything that is playing. Returns the number of sounds halted.
    pub fn stop_all_sounds(&mut self) -> usize {
        let count = self.playing.len();
        for (_, handle) in self.playing.drain() {
            self.backend.stop(handle);
        }
        count
    }

    /// Flip the mute flag. Returns the new enabled state.
    pub fn toggle_audio(&mut self) -> bool {
        if self.enabled {
            self.disable_audio();
        } else {
            self.enable_audio();
        }
        self.enabled
    }

    pub fn enable_audio(&mut self) {
        self.enabled = true;
        self.prefs.write_bool(keys::AUDIO_ENABLED, true);
    }

    /// Stop all sounds, then mute
    pub fn disable_audio(&mut self) {
        self.stop_all_sounds();
        self.enabled = false;
        self.prefs.write_bool(keys::AUDIO_ENABLED, false);
    }

    /// Create and warm the handle for `id`. Returns false if the id is
    /// unknown or already has a handle.
    pub fn preload_sound(&mut self, id: &str) -> bool {
        if self.closed || self.handles.contains_key(id) {
            return false;
        }
        let Some(definition) = self.registry.get(id) else {
            log::warn!("cannot preload unknown sound id {:?}", id);
            return false;
        };
        let resource_ref = definition.resource_ref().to_string();

        let result = self
            .handle_for(id, &resource_ref)
            .and_then(|handle| self.backend.preload(handle));
        match result {
            Ok(()) => true,
            Err(err) => {
                log::warn!("preloading {} failed: {}", id, err);
                false
            }
        }
    }

    /// Forget sounds whose playback ended on its own
    pub fn pump(&mut self) {
        let finished = self.backend.drain_finished();
        if finished.is_empty() {
            return;
        }
        self.playing.retain(|_, handle| !finished.contains(handle));
    }

    pub fn is_enabled(&self) -> bool {
        self.enabled
    }

    pub fn is_playing(&self, id: &str) -> bool {
        self.playing.contains_key(id)
    }

    /// Ids currently playing, sorted
    pub fn currently_playing(&self) -> Vec<&str> {
        let mut ids: Vec<&str> = self.playing.keys().map(String::as_str).collect();
        ids.sort_unstable();
        ids
    }

    pub fn registry(&self) -> &SoundRegistry {
        &self.registry
    }

    /// Stop everything and release the backend. Later plays report
    /// [`PlayOutcome::Closed`].
    pub fn shutdown(&mut self) {
        if self.closed {
            return;
        }
        self.stop_all_sounds();
        self.backend.shutdown();
        self.handles.clear();
        self.closed = true;
    }

    fn handle_for(&mut self, id: &str, resource_ref: &str) -> Result<HandleId, PlaybackError> {
        if let Some(handle) = self.handles.get(id) {
            return Ok(*handle);
        }
        let handle = self.backend.create_handle(resource_ref)?;
        self.handles.insert(id.to_string(), handle);
        Ok(handle)
    }

    fn start_playback(&mut self, handle: HandleId, volume: f32) -> Result<(), PlaybackError> {
        self.backend.set_volume(handle, volume)?;
        self.backend.rewind(handle)?;
        self.backend.start(handle)
    }
}

impl Drop for SoundEngine {
    fn drop(&mut self) {
        self.shutdown();
    }
}

impl std::fmt::Debug for SoundEngine {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SoundEngine")
            .field("backend", &self.backend.name())
            .field("enabled", &self.enabled)
            .field("playing", &self.currently_playing())
            .field("closed", &self.closed)
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::prefs::MemoryPreferenceStore;
    use crate::sound::recording::RecordingBackend;
    use crate::sound::SoundDefinition;
    use crate::time::ManualClock;

    struct Fixture {
        engine: SoundEngine,
        recorder: RecordingBackend,
        clock: ManualClock,
        store: Arc<MemoryPreferenceStore>,
    }

    fn fixture(enabled: bool) -> Fixture {
        let recorder = RecordingBackend::new();
        let clock = ManualClock::new();
        let store = Arc::new(MemoryPreferenceStore::new());
        let engine = SoundEngine::new(
            SoundRegistry::builtin().unwrap(),
            Box::new(recorder.clone()),
            Arc::new(clock.clone()),
            enabled,
            PreferenceWriter::new(store.clone()),
        );
        Fixture {
            engine,
            recorder,
            clock,
            store,
        }
    }

    #[test]
    fn test_preloads_flagged_sounds_at_startup() {
        let f = fixture(true);
        assert_eq!(
            f.recorder.preloads(),
            vec![
                "sounds/imp/appear.ogg".to_string(),
                "sounds/imp/farewell.ogg".to_string()
            ]
        );
    }

    #[test]
    fn test_debounce_window() {
        let mut f = fixture(true);

        assert_eq!(f.engine.play_sound("ui.click", SoundOptions::default()), PlayOutcome::Played);
        f.clock.advance_ms(10);
        assert_eq!(f.engine.play_sound("ui.click", SoundOptions::default()), PlayOutcome::Debounced);
        f.clock.advance_ms(50);
        assert_eq!(f.engine.play_sound("ui.click", SoundOptions::default()), PlayOutcome::Played);

        assert_eq!(f.recorder.play_count("sounds/ui/click.wav"), 2);
    }

    #[test]
    fn test_debounce_boundary_is_inclusive() {
        let mut f = fixture(true);
        f.engine.play_sound("ui.click", SoundOptions::default());
        f.clock.advance_ms(50);
        assert!(f.engine.play_sound("ui.click", SoundOptions::default()).is_played());
    }

    #[test]
    fn test_force_bypasses_debounce() {
        let mut f = fixture(true);
        f.engine.play_sound("ui.click", SoundOptions::default());
        assert_eq!(f.engine.play_sound("ui.click", SoundOptions::forced()), PlayOutcome::Played);
        assert_eq!(f.recorder.play_count("sounds/ui/click.wav"), 2);
    }

    #[test]
    fn test_handle_reused_and_rewound() {
        let mut f = fixture(true);
        let before = f.recorder.handle_count();

        f.engine.play_sound("ui.toggle", SoundOptions::forced());
        f.engine.play_sound("ui.toggle", SoundOptions::forced());

        assert_eq!(f.recorder.handle_count(), before + 1);
        assert_eq!(f.recorder.rewind_count(), 2);
    }

    #[test]
    fn test_volume_override() {
        let mut f = fixture(true);
        f.engine.play_sound("ui.click", SoundOptions::with_volume(0.9));
        f.engine.play_sound("ui.hover", SoundOptions::with_volume(3.0));
        f.engine.play_sound("ui.toggle", SoundOptions::default());

        let volumes: Vec<f32> = f.recorder.plays().iter().map(|p| p.volume).collect();
        assert_eq!(volumes, vec![0.9, 1.0, 0.5]);
    }

    #[test]
    fn test_unknown_sound_is_a_no_op() {
        let mut f = fixture(true);
        assert_eq!(f.engine.play_sound("nope", SoundOptions::default()), PlayOutcome::UnknownSound);
        assert!(f.recorder.plays().is_empty());
    }

    #[test]
    fn test_mute_halts_and_silences() {
        let mut f = fixture(true);
        f.engine.play_sound("imp.tip", SoundOptions::default());
        assert!(f.recorder.is_playing("sounds/imp/tip.ogg"));

        f.engine.disable_audio();
        assert!(!f.recorder.is_playing("sounds/imp/tip.ogg"));
        assert!(f.engine.currently_playing().is_empty());
        assert_eq!(f.store.value(keys::AUDIO_ENABLED), Some("false".into()));

        f.clock.advance_ms(1000);
        assert_eq!(f.engine.play_sound("ui.click", SoundOptions::forced()), PlayOutcome::Muted);
        assert_eq!(f.recorder.plays().len(), 1);

        f.engine.enable_audio();
        assert_eq!(f.store.value(keys::AUDIO_ENABLED), Some("true".into()));
        assert!(f.engine.play_sound("ui.click", SoundOptions::default()).is_played());
    }

    #[test]
    fn test_toggle_audio() {
        let mut f = fixture(true);
        f.engine.play_sound("imp.tip", SoundOptions::default());

        assert!(!f.engine.toggle_audio());
        assert_eq!(f.recorder.stops(), vec!["sounds/imp/tip.ogg".to_string()]);
        assert!(f.engine.toggle_audio());
        assert!(f.engine.is_enabled());
    }

    #[test]
    fn test_stop_all_is_idempotent() {
        let mut f = fixture(true);
        assert_eq!(f.engine.stop_all_sounds(), 0);

        f.engine.play_sound("ui.click", SoundOptions::default());
        f.engine.play_sound("imp.tip", SoundOptions::default());
        assert_eq!(f.engine.currently_playing(), vec!["imp.tip", "ui.click"]);

        assert_eq!(f.engine.stop_all_sounds(), 2);
        assert_eq!(f.engine.stop_all_sounds(), 0);
        assert_eq!(f.recorder.playing_count(), 0);
    }

    #[test]
    fn test_stop_sound() {
        let mut f = fixture(true);
        f.engine.play_sound("ui.click", SoundOptions::default());
        assert!(f.engine.stop_sound("ui.click"));
        assert!(!f.engine.stop_sound("ui.click"));
        assert!(!f.engine.is_playing("ui.click"));
    }

    #[test]
    fn test_natural_end_clears_playing() {
        let mut f = fixture(true);
        f.engine.play_sound("imp.tip", SoundOptions::default());
        assert!(f.engine.is_playing("imp.tip"));

        f.recorder.finish("sounds/imp/tip.ogg");
        f.engine.pump();
        assert!(!f.engine.is_playing("imp.tip"));
    }

    #[test]
    fn test_replay_before_pump_stays_stoppable() {
        let mut f = fixture(true);
        f.engine.play_sound("imp.tip", SoundOptions::default());
        f.recorder.finish("sounds/imp/tip.ogg");

        f.clock.advance_ms(300);
        assert_eq!(f.engine.play_sound("imp.tip", SoundOptions::default()), PlayOutcome::Played);
        f.engine.pump();
        assert!(f.engine.is_playing("imp.tip"));

        f.engine.disable_audio();
        assert!(!f.recorder.is_playing("sounds/imp/tip.ogg"));
        assert_eq!(f.recorder.playing_count(), 0);
    }

    #[test]
    fn test_autoplay_block_is_swallowed() {
        let mut f = fixture(true);
        f.recorder.set_block_autoplay(true);

        assert_eq!(f.engine.play_sound("ui.click", SoundOptions::default()), PlayOutcome::Blocked);
        assert!(!f.engine.is_playing("ui.click"));

        f.recorder.set_block_autoplay(false);
        assert_eq!(f.engine.play_sound("ui.click", SoundOptions::default()), PlayOutcome::Played);
    }

    #[test]
    fn test_backend_failure_does_not_update_debounce() {
        let mut f = fixture(true);
        f.recorder.fail_next_start("device lost");

        assert_eq!(f.engine.play_sound("ui.click", SoundOptions::default()), PlayOutcome::Failed);
        assert_eq!(f.engine.play_sound("ui.click", SoundOptions::default()), PlayOutcome::Played);
    }

    #[test]
    fn test_preload_is_a_no_op_when_cached() {
        let mut f = fixture(true);
        assert!(!f.engine.preload_sound("imp.appear"));
        assert!(f.engine.preload_sound("ui.click"));
        assert!(!f.engine.preload_sound("ui.click"));
        assert!(!f.engine.preload_sound("nope"));
        assert_eq!(f.recorder.preloads().len(), 3);
    }

    #[test]
    fn test_priority_never_preempts() {
        let mut f = fixture(true);
        f.engine.play_sound("ui.hover", SoundOptions::default());
        f.engine.play_sound("notification.error", SoundOptions::default());
        assert!(f.engine.is_playing("ui.hover"));
        assert!(f.engine.is_playing("notification.error"));
    }

    #[test]
    fn test_custom_registry() {
        let mut registry = SoundRegistry::new();
        registry
            .register(
                "beep",
                SoundDefinition::new("beep", "ui", "beep.wav", 0.2).unwrap(),
            )
            .unwrap();
        let recorder = RecordingBackend::new();
        let mut engine = SoundEngine::new(
            registry,
            Box::new(recorder.clone()),
            Arc::new(ManualClock::new()),
            true,
            PreferenceWriter::new(Arc::new(MemoryPreferenceStore::new())),
        );

        assert!(engine.play_sound("beep", SoundOptions::default()).is_played());
        assert!(engine.play_sound("beep", SoundOptions::default()).is_played());
        assert_eq!(recorder.play_count("beep.wav"), 2);
    }

    #[test]
    fn test_shutdown() {
        let mut f = fixture(true);
        f.engine.play_sound("imp.tip", SoundOptions::default());

        f.engine.shutdown();
        f.engine.shutdown();

        assert!(f.recorder.is_shut_down());
        assert_eq!(f.engine.play_sound("ui.click", SoundOptions::default()), PlayOutcome::Closed);
    }

    #[test]
    fn test_drop_shuts_down_backend() {
        let f = fixture(true);
        let recorder = f.recorder.clone();
        drop(f);
        assert!(recorder.is_shut_down());
    }
}
