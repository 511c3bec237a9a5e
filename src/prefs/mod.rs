//! Persisted preferences
//!
//! Four primitive preferences survive restarts: whether audio is enabled,
//! whether the imp is minimized, whether the first visit has happened, and
//! which tips have been seen. They are loaded once when the assistant is
//! mounted and written synchronously on every change. Store failures never
//! reach the caller: reads fall back to defaults and writes are logged and
//! dropped.

pub mod file;
pub mod store;

use std::fmt;
use std::sync::Arc;

pub use file::FilePreferenceStore;
pub use store::{MemoryPreferenceStore, PreferenceStore, StoreError};

/// Persisted key names
pub mod keys {
    pub const SEEN_TIP_IDS: &str = "imp.seenTipIds";
    pub const IMP_MINIMIZED: &str = "imp.minimized";
    pub const FIRST_VISIT_DONE: &str = "imp.firstVisitDone";
    pub const AUDIO_ENABLED: &str = "audio.enabled";
}

/// Snapshot of the persisted preferences
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Preferences {
    pub audio_enabled: bool,
    pub imp_minimized: bool,
    pub first_visit_done: bool,
    pub seen_tip_ids: Vec<String>,
}

impl Default for Preferences {
    fn default() -> Self {
        Self {
            audio_enabled: true,
            imp_minimized: false,
            first_visit_done: false,
            seen_tip_ids: Vec::new(),
        }
    }
}

impl Preferences {
    /// Read every preference, using [`Preferences::default`] for anything
    /// missing, unreadable or malformed
    pub fn load(store: &dyn PreferenceStore) -> Self {
        Self::load_with_defaults(store, Self::default())
    }

    /// Read every preference, using `defaults` for anything missing,
    /// unreadable or malformed
    pub fn load_with_defaults(store: &dyn PreferenceStore, defaults: Preferences) -> Self {
        Self {
            audio_enabled: read_bool(store, keys::AUDIO_ENABLED, defaults.audio_enabled),
            imp_minimized: read_bool(store, keys::IMP_MINIMIZED, defaults.imp_minimized),
            first_visit_done: read_bool(store, keys::FIRST_VISIT_DONE, defaults.first_visit_done),
            seen_tip_ids: read_list(store, keys::SEEN_TIP_IDS, defaults.seen_tip_ids),
        }
    }
}

fn read_raw(store: &dyn PreferenceStore, key: &str) -> Option<String> {
    match store.get(key) {
        Ok(value) => value,
        Err(err) => {
            log::warn!("preferences: reading {} failed: {}", key, err);
            None
        }
    }
}

fn read_bool(store: &dyn PreferenceStore, key: &str, default: bool) -> bool {
    match read_raw(store, key).as_deref() {
        None => default,
        Some("true") => true,
        Some("false") => false,
        Some(other) => {
            log::warn!("preferences: {} has non-boolean value {:?}", key, other);
            default
        }
    }
}

fn read_list(store: &dyn PreferenceStore, key: &str, default: Vec<String>) -> Vec<String> {
    let Some(raw) = read_raw(store, key) else {
        return default;
    };
    match serde_json::from_str::<Vec<String>>(&raw) {
        Ok(list) => list,
        Err(err) => {
            log::warn!("preferences: {} is not a string list: {}", key, err);
            default
        }
    }
}

/// Fail-soft writer shared by the lifecycle machine and the sound engine
#[derive(Clone)]
pub struct PreferenceWriter {
    store: Arc<dyn PreferenceStore>,
}

impl PreferenceWriter {
    pub fn new(store: Arc<dyn PreferenceStore>) -> Self {
        Self { store }
    }

    /// The underlying store
    pub fn store(&self) -> &dyn PreferenceStore {
        self.store.as_ref()
    }

    /// Persist a boolean. Returns false if the write was dropped.
    pub fn write_bool(&self, key: &str, value: bool) -> bool {
        self.write_raw(key, if value { "true" } else { "false" })
    }

    /// Persist a string list. Returns false if the write was dropped.
    pub fn write_list(&self, key: &str, values: &[String]) -> bool {
        match serde_json::to_string(values) {
            Ok(encoded) => self.write_raw(key, &encoded),
            Err(err) => {
                log::warn!("preferences: cannot encode {}: {}", key, err);
                false
            }
        }
    }

    fn write_raw(&self, key: &str, value: &str) -> bool {
        match self.store.set(key, value) {
            Ok(()) => true,
            Err(err) => {
                log::warn!("preferences: writing {} failed: {}", key, err);
                false
            }
        }
    }
}

impl fmt::Debug for PreferenceWriter {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("PreferenceWriter").finish_non_exhaustive()
    }
}
