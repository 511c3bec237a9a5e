//! File-backed preference store
//!
//! Preferences live in a property file (`key = value` per line). Every `set`
//! rewrites the file before returning.

use std::path::{Path, PathBuf};

use parking_lot::Mutex;

use super::store::{PreferenceStore, StoreError};
use crate::propfile::{PropertyError, PropertyFile};

/// Preference store persisted to a property file
#[derive(Debug)]
pub struct FilePreferenceStore {
    path: PathBuf,
    contents: Mutex<PropertyFile>,
}

impl FilePreferenceStore {
    /// Open the store at `path`. A missing file is an empty store; it is
    /// created on the first write.
    pub fn open<P: AsRef<Path>>(path: P) -> Result<Self, StoreError> {
        let path = path.as_ref().to_path_buf();
        let contents = match PropertyFile::load(&path) {
            Ok(contents) => contents,
            Err(PropertyError::FileNotFound) => PropertyFile::default(),
            Err(err) => return Err(err.into()),
        };
        log::debug!("preferences: {} keys loaded from {:?}", contents.len(), path);
        Ok(Self {
            path,
            contents: Mutex::new(contents),
        })
    }

    /// Open the store at `path`, starting empty if the file cannot be read.
    ///
    /// Writes still go to `path`; if they fail too, they fail per key.
    pub fn open_or_empty<P: AsRef<Path>>(path: P) -> Self {
        let path = path.as_ref();
        match Self::open(path) {
            Ok(store) => store,
            Err(err) => {
                log::warn!("preferences: cannot read {:?}, using defaults: {}", path, err);
                Self {
                    path: path.to_path_buf(),
                    contents: Mutex::new(PropertyFile::default()),
                }
            }
        }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }
}

impl PreferenceStore for FilePreferenceStore {
    fn get(&self, key: &str) -> Result<Option<String>, StoreError> {
        Ok(self.contents.lock().get(key).map(str::to_string))
    }

    fn set(&self, key: &str, value: &str) -> Result<(), StoreError> {
        let mut contents = self.contents.lock();
        contents.set(key, value);
        contents.save(&self.path)?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_missing_file_is_empty_store() {
        let dir = tempfile::tempdir().unwrap();
        let store = FilePreferenceStore::open(dir.path().join("imp.properties")).unwrap();
        assert_eq!(store.get("audio.enabled").unwrap(), None);
    }

    #[test]
    fn test_set_writes_through_to_disk() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("imp.properties");

        let store = FilePreferenceStore::open(&path).unwrap();
        store.set("imp.minimized", "true").unwrap();
        store.set("imp.seenTipIds", r#"["a","b#c"]"#).unwrap();

        let reopened = FilePreferenceStore::open(&path).unwrap();
        assert_eq!(reopened.get("imp.minimized").unwrap(), Some("true".into()));
        assert_eq!(
            reopened.get("imp.seenTipIds").unwrap(),
            Some(r#"["a","b#c"]"#.into())
        );
    }

    #[test]
    fn test_unreadable_file_starts_empty() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("imp.properties");
        std::fs::write(&path, b"\xff\xfe bad").unwrap();

        assert!(FilePreferenceStore::open(&path).is_err());
        let store = FilePreferenceStore::open_or_empty(&path);
        assert_eq!(store.get("imp.minimized").unwrap(), None);

        store.set("imp.minimized", "true").unwrap();
        let reopened = FilePreferenceStore::open(&path).unwrap();
        assert_eq!(reopened.get("imp.minimized").unwrap(), Some("true".into()));
    }

    #[test]
    fn test_directory_path_degrades_to_failing_writes() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("imp.properties");
        std::fs::create_dir(&path).unwrap();

        let store = FilePreferenceStore::open_or_empty(&path);
        assert_eq!(store.get("audio.enabled").unwrap(), None);
        assert!(store.set("audio.enabled", "false").is_err());
        assert!(!dir.path().join("imp.tmp").exists());
    }

    #[test]
    fn test_set_into_missing_directory_fails() {
        let dir = tempfile::tempdir().unwrap();
        let store = FilePreferenceStore::open(dir.path().join("gone/imp.properties")).unwrap();
        assert!(store.set("imp.minimized", "true").is_err());
    }
}
