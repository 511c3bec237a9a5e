//! Asset resolution
//!
//! Maps sprite sheet references and sound resource references to files.

use std::path::{Component, Path, PathBuf};

/// Resolves asset references to playable or drawable files
pub trait AssetResolver: Send + Sync {
    /// Location of a sprite sheet, if it exists
    fn sprite_sheet(&self, sheet: &str) -> Option<PathBuf>;

    /// Location of a sound resource, if it exists
    fn sound_resource(&self, resource_ref: &str) -> Option<PathBuf>;
}

/// Resolves references as relative paths beneath a base directory
#[derive(Debug, Clone)]
pub struct DirectoryAssets {
    root: PathBuf,
}

impl DirectoryAssets {
    pub fn new<P: AsRef<Path>>(root: P) -> Self {
        Self {
            root: root.as_ref().to_path_buf(),
        }
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    fn resolve(&self, reference: &str) -> Option<PathBuf> {
        let relative = Path::new(reference);
        let escapes = relative
            .components()
            .any(|c| !matches!(c, Component::Normal(_) | Component::CurDir));
        if reference.is_empty() || escapes {
            log::warn!("asset reference {:?} is not a relative path", reference);
            return None;
        }

        let path = self.root.join(relative);
        if path.is_file() {
            Some(path)
        } else {
            log::warn!("asset {:?} not found under {}", reference, self.root.display());
            None
        }
    }
}

impl AssetResolver for DirectoryAssets {
    fn sprite_sheet(&self, sheet: &str) -> Option<PathBuf> {
        self.resolve(sheet)
    }

    fn sound_resource(&self, resource_ref: &str) -> Option<PathBuf> {
        self.resolve(resource_ref)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;

    #[test]
    fn test_resolves_existing_files() {
        let dir = tempfile::tempdir().unwrap();
        fs::create_dir_all(dir.path().join("imp")).unwrap();
        fs::write(dir.path().join("imp/map.png"), b"png").unwrap();

        let assets = DirectoryAssets::new(dir.path());
        assert_eq!(
            assets.sprite_sheet("imp/map.png"),
            Some(dir.path().join("imp/map.png"))
        );
        assert_eq!(assets.sound_resource("sounds/ui/click.wav"), None);
    }

    #[test]
    fn test_rejects_escaping_references() {
        let dir = tempfile::tempdir().unwrap();
        let assets = DirectoryAssets::new(dir.path().join("assets"));

        assert_eq!(assets.sound_resource("../secret.wav"), None);
        assert_eq!(assets.sound_resource("/etc/passwd"), None);
        assert_eq!(assets.sound_resource(""), None);
    }
}
