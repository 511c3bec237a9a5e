// Sound registry
// Maps sound ids to their playback metadata

use std::collections::HashMap;

use super::definition::{SoundDefinition, SoundError, SoundResult};

/// Sound id to definition map
#[derive(Debug, Clone, Default)]
pub struct SoundRegistry {
    sounds: HashMap<String, SoundDefinition>,
}

impl SoundRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// The sounds shipped with the assistant
    pub fn builtin() -> SoundResult<Self> {
        let mut registry = Self::new();

        registry.register(
            "ui.click",
            SoundDefinition::new("ui.click", "ui", "sounds/ui/click.wav", 0.5)?
                .with_priority(1)
                .with_debounce_ms(50),
        )?;
        registry.register(
            "ui.hover",
            SoundDefinition::new("ui.hover", "ui", "sounds/ui/hover.wav", 0.3)?
                .with_debounce_ms(30),
        )?;
        registry.register(
            "ui.toggle",
            SoundDefinition::new("ui.toggle", "ui", "sounds/ui/toggle.wav", 0.5)?
                .with_priority(1)
                .with_debounce_ms(50),
        )?;

        registry.register(
            "imp.appear",
            SoundDefinition::new("imp.appear", "imp", "sounds/imp/appear.ogg", 0.7)?
                .with_priority(3)
                .with_debounce_ms(500)
                .preloaded(),
        )?;
        registry.register(
            "imp.farewell",
            SoundDefinition::new("imp.farewell", "imp", "sounds/imp/farewell.ogg", 0.7)?
                .with_priority(3)
                .with_debounce_ms(500)
                .preloaded(),
        )?;
        registry.register(
            "imp.tip",
            SoundDefinition::new("imp.tip", "imp", "sounds/imp/tip.ogg", 0.6)?
                .with_priority(2)
                .with_debounce_ms(250),
        )?;
        registry.register(
            "imp.mischief",
            SoundDefinition::new("imp.mischief", "imp", "sounds/imp/mischief.ogg", 0.4)?
                .with_priority(2)
                .with_debounce_ms(1000),
        )?;

        registry.register(
            "notification.success",
            SoundDefinition::new("notification.success", "notification", "sounds/notify/success.wav", 0.6)?
                .with_priority(4),
        )?;
        registry.register(
            "notification.warning",
            SoundDefinition::new("notification.warning", "notification", "sounds/notify/warning.wav", 0.6)?
                .with_priority(4),
        )?;
        registry.register(
            "notification.error",
            SoundDefinition::new("notification.error", "notification", "sounds/notify/error.wav", 0.7)?
                .with_priority(5),
        )?;

        Ok(registry)
    }

    /// Add a sound. An id can only be registered once.
    pub fn register(&mut self, id: &str, definition: SoundDefinition) -> SoundResult<()> {
        if self.sounds.contains_key(id) {
            return Err(SoundError::DuplicateSound(id.to_string()));
        }
        self.sounds.insert(id.to_string(), definition);
        Ok(())
    }

    pub fn get(&self, id: &str) -> Option<&SoundDefinition> {
        self.sounds.get(id)
    }

    /// Like [`get`](Self::get), as a `Result`
    pub fn try_get(&self, id: &str) -> SoundResult<&SoundDefinition> {
        self.get(id)
            .ok_or_else(|| SoundError::UnknownSound(id.to_string()))
    }

    /// Registered ids, sorted
    pub fn ids(&self) -> Vec<&str> {
        let mut ids: Vec<&str> = self.sounds.keys().map(String::as_str).collect();
        ids.sort_unstable();
        ids
    }

    /// Ids flagged for preloading, sorted
    pub fn preload_ids(&self) -> Vec<&str> {
        let mut ids: Vec<&str> = self
            .sounds
            .iter()
            .filter(|(_, def)| def.preload())
            .map(|(id, _)| id.as_str())
            .collect();
        ids.sort_unstable();
        ids
    }

    pub fn len(&self) -> usize {
        self.sounds.len()
    }

    pub fn is_empty(&self) -> bool {
        self.sounds.is_empty()
    }
}
