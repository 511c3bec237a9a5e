//! Animation catalogs
//!
//! A catalog is the static, read-only animation data of one sprite. The
//! library maps sprite names to catalogs so any iconography can share the
//! scheduler, not just the imp.

use std::collections::HashMap;
use std::sync::Arc;
use std::time::Duration;

use super::imp;
use super::types::{AnimationDefinition, AnimationError, AnimationResult, Frame};

/// Named animations of one sprite sheet
#[derive(Debug, Clone)]
pub struct AnimationCatalog {
    sprite: String,
    sheet: String,
    frame_width: u32,
    frame_height: u32,
    default_name: String,
    default_def: Arc<AnimationDefinition>,
    animations: HashMap<String, Arc<AnimationDefinition>>,
}

impl AnimationCatalog {
    /// Start building a catalog for `sprite`, drawn from `sheet`
    pub fn builder(sprite: &str, sheet: &str) -> CatalogBuilder {
        CatalogBuilder {
            sprite: sprite.to_string(),
            sheet: sheet.to_string(),
            frame_width: 0,
            frame_height: 0,
            default_name: None,
            animations: Vec::new(),
        }
    }

    pub fn sprite(&self) -> &str {
        &self.sprite
    }

    /// Sheet reference for the asset resolver
    pub fn sheet(&self) -> &str {
        &self.sheet
    }

    /// Cell size in pixels
    pub fn frame_size(&self) -> (u32, u32) {
        (self.frame_width, self.frame_height)
    }

    /// Rest pose used when a requested animation does not exist
    pub fn default_animation(&self) -> &str {
        &self.default_name
    }

    pub fn get(&self, name: &str) -> Option<&Arc<AnimationDefinition>> {
        self.animations.get(name)
    }

    pub fn contains(&self, name: &str) -> bool {
        self.animations.contains_key(name)
    }

    /// Strict lookup
    pub fn try_get(&self, name: &str) -> AnimationResult<&Arc<AnimationDefinition>> {
        self.animations
            .get(name)
            .ok_or_else(|| AnimationError::UnknownAnimation {
                sprite: self.sprite.clone(),
                animation: name.to_string(),
            })
    }

    /// Lookup with fallback to the default animation.
    ///
    /// Returns the name actually resolved alongside the definition.
    pub fn lookup<'a>(&'a self, name: &'a str) -> (&'a str, &'a Arc<AnimationDefinition>) {
        match self.animations.get(name) {
            Some(def) => (name, def),
            None => {
                log::warn!(
                    "sprite {}: unknown animation {:?}, falling back to {}",
                    self.sprite,
                    name,
                    self.default_name
                );
                (&self.default_name, &self.default_def)
            }
        }
    }

    /// Total duration of `name`, or `None` if it does not exist
    pub fn duration(&self, name: &str) -> Option<Duration> {
        self.animations.get(name).map(|def| def.total_duration())
    }

    /// Sum of the frame durations of `name`.
    ///
    /// Unknown names resolve through [`lookup`](Self::lookup), so the result
    /// is the default animation's duration.
    pub fn get_duration(&self, name: &str) -> Duration {
        self.lookup(name).1.total_duration()
    }

    /// Animation names, in no particular order
    pub fn names(&self) -> impl Iterator<Item = &str> {
        self.animations.keys().map(String::as_str)
    }

    pub fn len(&self) -> usize {
        self.animations.len()
    }

    pub fn is_empty(&self) -> bool {
        self.animations.is_empty()
    }
}

/// Builder for [`AnimationCatalog`]
#[derive(Debug)]
pub struct CatalogBuilder {
    sprite: String,
    sheet: String,
    frame_width: u32,
    frame_height: u32,
    default_name: Option<String>,
    animations: Vec<(String, Vec<Frame>, bool)>,
}

impl CatalogBuilder {
    pub fn frame_size(mut self, width: u32, height: u32) -> Self {
        self.frame_width = width;
        self.frame_height = height;
        self
    }

    /// Animation to fall back to. Defaults to the first one added.
    pub fn default_animation(mut self, name: &str) -> Self {
        self.default_name = Some(name.to_string());
        self
    }

    /// Add an animation. A later animation with the same name replaces it.
    pub fn animation(mut self, name: &str, frames: &[Frame], loopable: bool) -> Self {
        self.animations
            .push((name.to_string(), frames.to_vec(), loopable));
        self
    }

    pub fn build(self) -> AnimationResult<AnimationCatalog> {
        let default_name = match self.default_name {
            Some(name) => name,
            None => match self.animations.first() {
                Some((name, _, _)) => name.clone(),
                None => return Err(AnimationError::MissingDefault(String::new())),
            },
        };

        let mut animations = HashMap::with_capacity(self.animations.len());
        for (name, frames, loopable) in self.animations {
            let def = AnimationDefinition::new(frames, loopable)
                .ok_or_else(|| AnimationError::EmptyFrames(name.clone()))?;
            animations.insert(name, Arc::new(def));
        }

        let default_def = animations
            .get(&default_name)
            .cloned()
            .ok_or_else(|| AnimationError::MissingDefault(default_name.clone()))?;

        Ok(AnimationCatalog {
            sprite: self.sprite,
            sheet: self.sheet,
            frame_width: self.frame_width,
            frame_height: self.frame_height,
            default_name,
            default_def,
            animations,
        })
    }
}

/// Sprite name to catalog registry
#[derive(Debug, Clone, Default)]
pub struct AnimationLibrary {
    sprites: HashMap<String, Arc<AnimationCatalog>>,
}

impl AnimationLibrary {
    /// Create an empty library
    pub fn new() -> Self {
        Self::default()
    }

    /// Library holding the built-in imp catalog
    pub fn builtin() -> AnimationResult<Self> {
        let mut library = Self::new();
        library.insert(Arc::new(imp::imp_catalog()?));
        Ok(library)
    }

    /// Register a catalog under its sprite name, returning any it replaced
    pub fn insert(&mut self, catalog: Arc<AnimationCatalog>) -> Option<Arc<AnimationCatalog>> {
        self.sprites.insert(catalog.sprite().to_string(), catalog)
    }

    pub fn sprite(&self, name: &str) -> AnimationResult<&Arc<AnimationCatalog>> {
        self.sprites
            .get(name)
            .ok_or_else(|| AnimationError::UnknownSprite(name.to_string()))
    }

    pub fn sprite_names(&self) -> impl Iterator<Item = &str> {
        self.sprites.keys().map(String::as_str)
    }
}
