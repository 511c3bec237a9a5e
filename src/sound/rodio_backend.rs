//! Rodio playback backend
//!
//! Audio runs on a dedicated thread since rodio's `OutputStream` is not
//! `Send`. The backend posts commands over a channel; the thread owns one
//! `Sink` per playing handle and reports sinks that ran dry back through a
//! second channel, tagged with the play they belong to so a report that
//! arrives after the handle was restarted is dropped. Resource bytes are read through an [`AssetResolver`] and
//! kept in a small LRU cache so repeated plays skip the filesystem.

use std::collections::HashMap;
use std::fs;
use std::io::Cursor;
use std::num::NonZeroUsize;
use std::sync::Arc;
use std::thread::{self, JoinHandle};
use std::time::Duration;

use crossbeam::channel::{self, Receiver, RecvTimeoutError, Sender};
use lru::LruCache;
use rodio::{Decoder, OutputStream, OutputStreamHandle, Sink};

use super::backend::{HandleId, PlaybackBackend, PlaybackError};
use crate::assets::AssetResolver;

const CACHE_CAPACITY: NonZeroUsize = match NonZeroUsize::new(32) {
    Some(n) => n,
    None => NonZeroUsize::MIN,
};

/// How often the audio thread checks for sinks that ran dry
const POLL_INTERVAL: Duration = Duration::from_millis(20);

/// Commands sent to the audio thread
enum AudioCmd {
    /// Decode and play bytes on a fresh sink, replacing the handle's old one
    Play(HandleId, u64, Arc<Vec<u8>>, f32, Sender<Result<(), String>>),
    Stop(HandleId),
    SetVolume(HandleId, f32),
    Shutdown,
}

struct Resource {
    resource_ref: String,
    volume: f32,
}

/// Backend that plays through the default output device
pub struct RodioBackend {
    assets: Arc<dyn AssetResolver>,
    cache: LruCache<String, Arc<Vec<u8>>>,
    resources: HashMap<HandleId, Resource>,
    next_handle: u32,
    next_play: u64,
    /// Play sequence of the sink currently owned by each handle
    current_play: HashMap<HandleId, u64>,
    commands: Sender<AudioCmd>,
    finished: Receiver<(HandleId, u64)>,
    thread: Option<JoinHandle<()>>,
}

impl RodioBackend {
    /// Spawn the audio thread and open the default output device
    pub fn new(assets: Arc<dyn AssetResolver>) -> Result<Self, PlaybackError> {
        let (cmd_tx, cmd_rx) = channel::unbounded();
        let (done_tx, done_rx) = channel::unbounded();
        let (ready_tx, ready_rx) = channel::bounded(1);

        let thread = thread::Builder::new()
            .name("imp-audio".into())
            .spawn(move || audio_thread_main(cmd_rx, done_tx, ready_tx))
            .map_err(|e| PlaybackError::Backend(format!("cannot spawn audio thread: {}", e)))?;

        match ready_rx.recv() {
            Ok(Ok(())) => {}
            Ok(Err(message)) => {
                let _ = thread.join();
                return Err(PlaybackError::Backend(message));
            }
            Err(_) => {
                let _ = thread.join();
                return Err(PlaybackError::Backend("audio thread exited".into()));
            }
        }

        Ok(Self {
            assets,
            cache: LruCache::new(CACHE_CAPACITY),
            resources: HashMap::new(),
            next_handle: 0,
            next_play: 0,
            current_play: HashMap::new(),
            commands: cmd_tx,
            finished: done_rx,
            thread: Some(thread),
        })
    }

    fn resource(&self, handle: HandleId) -> Result<&Resource, PlaybackError> {
        self.resources
            .get(&handle)
            .ok_or(PlaybackError::UnknownHandle(handle))
    }

    fn bytes(&mut self, resource_ref: &str) -> Result<Arc<Vec<u8>>, PlaybackError> {
        if let Some(bytes) = self.cache.get(resource_ref) {
            return Ok(Arc::clone(bytes));
        }
        let path = self.assets.sound_resource(resource_ref).ok_or_else(|| {
            PlaybackError::Backend(format!("sound resource {:?} not found", resource_ref))
        })?;
        let bytes = fs::read(&path)
            .map(Arc::new)
            .map_err(|e| PlaybackError::Backend(format!("reading {}: {}", path.display(), e)))?;
        self.cache.put(resource_ref.to_string(), Arc::clone(&bytes));
        Ok(bytes)
    }

    fn send(&self, cmd: AudioCmd) -> Result<(), PlaybackError> {
        self.commands
            .send(cmd)
            .map_err(|_| PlaybackError::Backend("audio thread is gone".into()))
    }
}

impl PlaybackBackend for RodioBackend {
    fn name(&self) -> &'static str {
        "Rodio"
    }

    fn create_handle(&mut self, resource_ref: &str) -> Result<HandleId, PlaybackError> {
        self.next_handle += 1;
        let handle = HandleId(self.next_handle);
        self.resources.insert(
            handle,
            Resource {
                resource_ref: resource_ref.to_string(),
                volume: 1.0,
            },
        );
        Ok(handle)
    }

    fn preload(&mut self, handle: HandleId) -> Result<(), PlaybackError> {
        let resource_ref = self.resource(handle)?.resource_ref.clone();
        self.bytes(&resource_ref).map(|_| ())
    }

    fn set_volume(&mut self, handle: HandleId, volume: f32) -> Result<(), PlaybackError> {
        let resource = self
            .resources
            .get_mut(&handle)
            .ok_or(PlaybackError::UnknownHandle(handle))?;
        resource.volume = volume.clamp(0.0, 1.0);
        let volume = resource.volume;
        self.send(AudioCmd::SetVolume(handle, volume))
    }

    fn rewind(&mut self, handle: HandleId) -> Result<(), PlaybackError> {
        // Every start decodes from the first sample
        self.resource(handle).map(|_| ())
    }

    fn start(&mut self, handle: HandleId) -> Result<(), PlaybackError> {
        let (resource_ref, volume) = {
            let resource = self.resource(handle)?;
            (resource.resource_ref.clone(), resource.volume)
        };
        let bytes = self.bytes(&resource_ref)?;

        self.next_play += 1;
        let play = self.next_play;
        let (reply_tx, reply_rx) = channel::bounded(1);
        self.send(AudioCmd::Play(handle, play, bytes, volume, reply_tx))?;
        match reply_rx.recv() {
            Ok(Ok(())) => {
                self.current_play.insert(handle, play);
                Ok(())
            }
            Ok(Err(message)) => {
                self.current_play.remove(&handle);
                Err(PlaybackError::Backend(message))
            }
            Err(_) => Err(PlaybackError::Backend("audio thread is gone".into())),
        }
    }

    fn stop(&mut self, handle: HandleId) {
        self.current_play.remove(&handle);
        let _ = self.send(AudioCmd::Stop(handle));
    }

    fn drain_finished(&mut self) -> Vec<HandleId> {
        let reports: Vec<(HandleId, u64)> = self.finished.try_iter().collect();
        current_endings(&mut self.current_play, reports)
    }

    fn shutdown(&mut self) {
        let _ = self.send(AudioCmd::Shutdown);
        if let Some(thread) = self.thread.take() {
            let _ = thread.join();
        }
        self.resources.clear();
        self.current_play.clear();
        self.cache.clear();
    }
}

impl Drop for RodioBackend {
    fn drop(&mut self) {
        if self.thread.is_some() {
            self.shutdown();
        }
    }
}

fn audio_thread_main(
    commands: Receiver<AudioCmd>,
    finished: Sender<(HandleId, u64)>,
    ready: Sender<Result<(), String>>,
) {
    let (_stream, stream_handle) = match OutputStream::try_default() {
        Ok(s) => s,
        Err(e) => {
            let _ = ready.send(Err(format!("cannot open audio output: {}", e)));
            return;
        }
    };
    let _ = ready.send(Ok(()));
    log::debug!("audio thread: output stream opened");

    let mut sinks: HashMap<HandleId, (u64, Sink)> = HashMap::new();

    loop {
        match commands.recv_timeout(POLL_INTERVAL) {
            Ok(AudioCmd::Play(handle, play, bytes, volume, reply)) => {
                if let Some((_, old)) = sinks.remove(&handle) {
                    old.stop();
                }
                let result = play_bytes(&stream_handle, &bytes, volume).map(|sink| {
                    sinks.insert(handle, (play, sink));
                });
                let _ = reply.send(result);
            }
            Ok(AudioCmd::Stop(handle)) => {
                if let Some((_, sink)) = sinks.remove(&handle) {
                    sink.stop();
                }
            }
            Ok(AudioCmd::SetVolume(handle, volume)) => {
                if let Some((_, sink)) = sinks.get(&handle) {
                    sink.set_volume(volume);
                }
            }
            Ok(AudioCmd::Shutdown) | Err(RecvTimeoutError::Disconnected) => {
                for (_, (_, sink)) in sinks.drain() {
                    sink.stop();
                }
                break;
            }
            Err(RecvTimeoutError::Timeout) => {}
        }

        sinks.retain(|handle, (play, sink)| {
            if sink.empty() {
                let _ = finished.send((*handle, *play));
                false
            } else {
                true
            }
        });
    }

    log::debug!("audio thread: exited");
}

/// Keep the end reports that belong to each handle's latest play, forgetting
/// those plays
fn current_endings(
    current_play: &mut HashMap<HandleId, u64>,
    reports: Vec<(HandleId, u64)>,
) -> Vec<HandleId> {
    reports
        .into_iter()
        .filter(|(handle, play)| {
            if current_play.get(handle) == Some(play) {
                current_play.remove(handle);
                true
            } else {
                log::trace!("dropping stale end report for {} (play {})", handle, play);
                false
            }
        })
        .map(|(handle, _)| handle)
        .collect()
}

fn play_bytes(stream: &OutputStreamHandle, bytes: &[u8], volume: f32) -> Result<Sink, String> {
    let source = Decoder::new(Cursor::new(bytes.to_vec())).map_err(|e| format!("decode error: {}", e))?;
    let sink = Sink::try_new(stream).map_err(|e| format!("sink error: {}", e))?;
    sink.set_volume(volume);
    sink.append(source);
    Ok(sink)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_stale_end_report_is_dropped() {
        let mut current = HashMap::from([(HandleId(1), 2), (HandleId(2), 5)]);

        let ended = current_endings(&mut current, vec![(HandleId(1), 1), (HandleId(2), 5)]);

        assert_eq!(ended, vec![HandleId(2)]);
        assert_eq!(current.get(&HandleId(1)), Some(&2));
        assert!(!current.contains_key(&HandleId(2)));
    }

    #[test]
    fn test_end_report_after_stop_is_dropped() {
        let mut current = HashMap::new();
        assert!(current_endings(&mut current, vec![(HandleId(3), 7)]).is_empty());
    }
}
