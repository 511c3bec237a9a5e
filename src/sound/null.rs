//! Null (silent) playback backend
//!
//! Accepts every request and produces no sound. Each started handle is
//! reported as finished on the next drain, as if the sound were zero
//! seconds long. Used when no audio output is available.

use std::collections::HashSet;

use super::backend::{HandleId, PlaybackBackend, PlaybackError};

/// Backend that plays nothing
#[derive(Debug, Default)]
pub struct NullBackend {
    next_handle: u32,
    handles: HashSet<HandleId>,
    finished: Vec<HandleId>,
}

impl NullBackend {
    pub fn new() -> Self {
        Self::default()
    }

    fn check(&self, handle: HandleId) -> Result<(), PlaybackError> {
        if self.handles.contains(&handle) {
            Ok(())
        } else {
            Err(PlaybackError::UnknownHandle(handle))
        }
    }
}

impl PlaybackBackend for NullBackend {
    fn name(&self) -> &'static str {
        "Null"
    }

    fn create_handle(&mut self, _resource_ref: &str) -> Result<HandleId, PlaybackError> {
        self.next_handle += 1;
        let handle = HandleId(self.next_handle);
        self.handles.insert(handle);
        Ok(handle)
    }

    fn preload(&mut self, handle: HandleId) -> Result<(), PlaybackError> {
        self.check(handle)
    }

    fn set_volume(&mut self, handle: HandleId, _volume: f32) -> Result<(), PlaybackError> {
        self.check(handle)
    }

    fn rewind(&mut self, handle: HandleId) -> Result<(), PlaybackError> {
        self.check(handle)
    }

    fn start(&mut self, handle: HandleId) -> Result<(), PlaybackError> {
        self.check(handle)?;
        if !self.finished.contains(&handle) {
            self.finished.push(handle);
        }
        Ok(())
    }

    fn stop(&mut self, handle: HandleId) {
        self.finished.retain(|h| *h != handle);
    }

    fn drain_finished(&mut self) -> Vec<HandleId> {
        std::mem::take(&mut self.finished)
    }

    fn shutdown(&mut self) {
        self.handles.clear();
        self.finished.clear();
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_null_backend_finishes_immediately() {
        let mut backend = NullBackend::new();
        let handle = backend.create_handle("a.wav").unwrap();

        backend.set_volume(handle, 0.5).unwrap();
        backend.rewind(handle).unwrap();
        backend.start(handle).unwrap();

        assert_eq!(backend.drain_finished(), vec![handle]);
        assert!(backend.drain_finished().is_empty());
    }

    #[test]
    fn test_null_backend_unknown_handle() {
        let mut backend = NullBackend::new();
        assert_eq!(
            backend.start(HandleId(7)),
            Err(PlaybackError::UnknownHandle(HandleId(7)))
        );
    }

    #[test]
    fn test_stop_cancels_finish_report() {
        let mut backend = NullBackend::new();
        let handle = backend.create_handle("a.wav").unwrap();
        backend.start(handle).unwrap();
        backend.stop(handle);
        assert!(backend.drain_finished().is_empty());
    }
}
