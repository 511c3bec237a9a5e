// Recording playback backend
// In-memory backend that records every request, with fault injection

use std::sync::Arc;

use parking_lot::Mutex;

use super::backend::{HandleId, PlaybackBackend, PlaybackError};

/// One started playback
#[derive(Debug, Clone, PartialEq)]
pub struct PlayRecord {
    pub resource_ref: String,
    pub volume: f32,
}

#[derive(Debug, Default)]
struct RecordingState {
    /// Resource of each handle, indexed by `HandleId - 1`
    resources: Vec<String>,
    volumes: Vec<f32>,
    playing: Vec<HandleId>,
    finished: Vec<HandleId>,
    plays: Vec<PlayRecord>,
    stops: Vec<String>,
    preloads: Vec<String>,
    rewinds: usize,
    block_autoplay: bool,
    fail_next_start: Option<String>,
    shut_down: bool,
}

impl RecordingState {
    fn index(&self, handle: HandleId) -> Result<usize, PlaybackError> {
        let index = (handle.0 as usize).wrapping_sub(1);
        if index < self.resources.len() {
            Ok(index)
        } else {
            Err(PlaybackError::UnknownHandle(handle))
        }
    }

    fn handle_of(&self, resource_ref: &str) -> Option<HandleId> {
        self.resources
            .iter()
            .position(|r| r == resource_ref)
            .map(|i| HandleId(i as u32 + 1))
    }
}

/// Backend that plays nothing but remembers everything.
///
/// Clones share state, so a test can keep one clone while the engine owns
/// another.
#[derive(Debug, Clone, Default)]
pub struct RecordingBackend {
    state: Arc<Mutex<RecordingState>>,
}

impl RecordingBackend {
    pub fn new() -> Self {
        Self::default()
    }

    /// Every started playback, in order
    pub fn plays(&self) -> Vec<PlayRecord> {
        self.state.lock().plays.clone()
    }

    /// Number of started playbacks of `resource_ref`
    pub fn play_count(&self, resource_ref: &str) -> usize {
        self.state
            .lock()
            .plays
            .iter()
            .filter(|p| p.resource_ref == resource_ref)
            .count()
    }

    /// Resources that were explicitly stopped while playing, in order
    pub fn stops(&self) -> Vec<String> {
        self.state.lock().stops.clone()
    }

    pub fn preloads(&self) -> Vec<String> {
        self.state.lock().preloads.clone()
    }

    /// Number of handles created so far
    pub fn handle_count(&self) -> usize {
        self.state.lock().resources.len()
    }

    pub fn rewind_count(&self) -> usize {
        self.state.lock().rewinds
    }

    /// Whether `resource_ref` is audible right now
    pub fn is_playing(&self, resource_ref: &str) -> bool {
        let state = self.state.lock();
        state
            .handle_of(resource_ref)
            .is_some_and(|h| state.playing.contains(&h))
    }

    /// Number of handles audible right now
    pub fn playing_count(&self) -> usize {
        self.state.lock().playing.len()
    }

    /// Reject every start with [`PlaybackError::AutoplayBlocked`]
    pub fn set_block_autoplay(&self, block: bool) {
        self.state.lock().block_autoplay = block;
    }

    /// Reject the next start with a backend error
    pub fn fail_next_start(&self, message: &str) {
        self.state.lock().fail_next_start = Some(message.to_string());
    }

    /// End the playback of `resource_ref` as if it ran out
    pub fn finish(&self, resource_ref: &str) -> bool {
        let mut state = self.state.lock();
        let Some(handle) = state.handle_of(resource_ref) else {
            return false;
        };
        let before = state.playing.len();
        state.playing.retain(|h| *h != handle);
        if state.playing.len() == before {
            return false;
        }
        state.finished.push(handle);
        true
    }

    pub fn is_shut_down(&self) -> bool {
        self.state.lock().shut_down
    }
}

impl PlaybackBackend for RecordingBackend {
    fn name(&self) -> &'static str {
        "Recording"
    }

    fn create_handle(&mut self, resource_ref: &str) -> Result<HandleId, PlaybackError> {
        let mut state = self.state.lock();
        state.resources.push(resource_ref.to_string());
        state.volumes.push(1.0);
        Ok(HandleId(state.resources.len() as u32))
    }

    fn preload(&mut self, handle: HandleId) -> Result<(), PlaybackError> {
        let mut state = self.state.lock();
        let index = state.index(handle)?;
        let resource = state.resources[index].clone();
        state.preloads.push(resource);
        Ok(())
    }

    fn set_volume(&mut self, handle: HandleId, volume: f32) -> Result<(), PlaybackError> {
        let mut state = self.state.lock();
        let index = state.index(handle)?;
        state.volumes[index] = volume;
        Ok(())
    }

    fn rewind(&mut self, handle: HandleId) -> Result<(), PlaybackError> {
        let mut state = self.state.lock();
        state.index(handle)?;
        state.rewinds += 1;
        Ok(())
    }

    fn start(&mut self, handle: HandleId) -> Result<(), PlaybackError> {
        let mut state = self.state.lock();
        let index = state.index(handle)?;
        if state.block_autoplay {
            return Err(PlaybackError::AutoplayBlocked);
        }
        if let Some(message) = state.fail_next_start.take() {
            return Err(PlaybackError::Backend(message));
        }

        let record = PlayRecord {
            resource_ref: state.resources[index].clone(),
            volume: state.volumes[index],
        };
        state.plays.push(record);
        // A queued end report belongs to the previous play
        state.finished.retain(|h| *h != handle);
        if !state.playing.contains(&handle) {
            state.playing.push(handle);
        }
        Ok(())
    }

    fn stop(&mut self, handle: HandleId) {
        let mut state = self.state.lock();
        let Ok(index) = state.index(handle) else {
            return;
        };
        let before = state.playing.len();
        state.playing.retain(|h| *h != handle);
        if state.playing.len() != before {
            let resource = state.resources[index].clone();
            state.stops.push(resource);
        }
    }

    fn drain_finished(&mut self) -> Vec<HandleId> {
        std::mem::take(&mut self.state.lock().finished)
    }

    fn shutdown(&mut self) {
        let mut state = self.state.lock();
        state.playing.clear();
        state.finished.clear();
        state.shut_down = true;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_records_plays_and_stops() {
        let recorder = RecordingBackend::new();
        let mut backend = recorder.clone();

        let handle = backend.create_handle("a.wav").unwrap();
        backend.set_volume(handle, 0.25).unwrap();
        backend.start(handle).unwrap();
        assert!(recorder.is_playing("a.wav"));

        backend.stop(handle);
        backend.stop(handle);

        assert_eq!(
            recorder.plays(),
            vec![PlayRecord {
                resource_ref: "a.wav".into(),
                volume: 0.25
            }]
        );
        assert_eq!(recorder.stops(), vec!["a.wav".to_string()]);
        assert!(!recorder.is_playing("a.wav"));
    }

    #[test]
    fn test_fault_injection() {
        let recorder = RecordingBackend::new();
        let mut backend = recorder.clone();
        let handle = backend.create_handle("a.wav").unwrap();

        recorder.set_block_autoplay(true);
        assert_eq!(backend.start(handle), Err(PlaybackError::AutoplayBlocked));
        recorder.set_block_autoplay(false);

        recorder.fail_next_start("device lost");
        assert_eq!(
            backend.start(handle),
            Err(PlaybackError::Backend("device lost".into()))
        );
        assert!(backend.start(handle).is_ok());
        assert_eq!(recorder.play_count("a.wav"), 1);
    }

    #[test]
    fn test_finish_reports_through_drain() {
        let recorder = RecordingBackend::new();
        let mut backend = recorder.clone();
        let handle = backend.create_handle("a.wav").unwrap();
        backend.start(handle).unwrap();

        assert!(recorder.finish("a.wav"));
        assert!(!recorder.finish("a.wav"));
        assert_eq!(backend.drain_finished(), vec![handle]);
        assert_eq!(recorder.playing_count(), 0);
    }

    #[test]
    fn test_restart_drops_queued_finish() {
        let recorder = RecordingBackend::new();
        let mut backend = recorder.clone();
        let handle = backend.create_handle("a.wav").unwrap();
        backend.start(handle).unwrap();

        assert!(recorder.finish("a.wav"));
        backend.start(handle).unwrap();
        assert!(backend.drain_finished().is_empty());
        assert!(recorder.is_playing("a.wav"));
    }
}
