// Lifecycle state types

use std::fmt;

/// Engagement phase of the assistant. Exactly one holds at a time.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum LifecycleState {
    /// Hidden, waiting to be woken
    Dormant,
    /// Playing the greeting on the way to `Idle`
    Awakening,
    #[default]
    Idle,
    /// Presenting a tip
    Active,
    /// Playing a mischief animation after a short spell of inactivity
    Mischief,
    /// Playing the farewell on the way to `Dormant` or a minimized `Idle`
    Departing,
}

impl LifecycleState {
    pub fn as_str(self) -> &'static str {
        match self {
            LifecycleState::Dormant => "dormant",
            LifecycleState::Awakening => "awakening",
            LifecycleState::Idle => "idle",
            LifecycleState::Active => "active",
            LifecycleState::Mischief => "mischief",
            LifecycleState::Departing => "departing",
        }
    }
}

impl fmt::Display for LifecycleState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A unit of content the assistant presents. The engine never looks at
/// `content`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Tip {
    pub id: String,
    pub animation_name: Option<String>,
    pub content: String,
}

impl Tip {
    pub fn new(id: &str, content: &str) -> Self {
        Self {
            id: id.to_string(),
            animation_name: None,
            content: content.to_string(),
        }
    }

    pub fn with_animation(mut self, name: &str) -> Self {
        self.animation_name = Some(name.to_string());
        self
    }
}

/// Ids of tips already shown, in first-seen order, without duplicates
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SeenTips {
    ids: Vec<String>,
}

impl SeenTips {
    pub fn new() -> Self {
        Self::default()
    }

    /// Record `id`. Returns false if it was already present.
    pub fn insert(&mut self, id: &str) -> bool {
        if self.contains(id) {
            return false;
        }
        self.ids.push(id.to_string());
        true
    }

    pub fn contains(&self, id: &str) -> bool {
        self.ids.iter().any(|seen| seen == id)
    }

    pub fn clear(&mut self) {
        self.ids.clear();
    }

    pub fn as_slice(&self) -> &[String] {
        &self.ids
    }

    pub fn len(&self) -> usize {
        self.ids.len()
    }

    pub fn is_empty(&self) -> bool {
        self.ids.is_empty()
    }
}

impl<S: AsRef<str>> FromIterator<S> for SeenTips {
    fn from_iter<I: IntoIterator<Item = S>>(iter: I) -> Self {
        let mut seen = SeenTips::new();
        for id in iter {
            seen.insert(id.as_ref());
        }
        seen
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_state_is_idle() {
        assert_eq!(LifecycleState::default(), LifecycleState::Idle);
        assert_eq!(LifecycleState::Departing.to_string(), "departing");
    }

    #[test]
    fn test_seen_tips_deduplicate() {
        let mut seen = SeenTips::new();
        assert!(seen.insert("t1"));
        assert!(!seen.insert("t1"));
        assert!(seen.insert("t2"));
        assert_eq!(seen.as_slice(), ["t1".to_string(), "t2".to_string()]);

        seen.clear();
        assert!(seen.is_empty());
    }

    #[test]
    fn test_seen_tips_from_persisted_list() {
        let seen: SeenTips = ["a", "b", "a"].into_iter().collect();
        assert_eq!(seen.len(), 2);
        assert!(seen.contains("b"));
    }

    #[test]
    fn test_tip_builder() {
        let tip = Tip::new("t1", "Upload a CSV").with_animation("Explain");
        assert_eq!(tip.animation_name.as_deref(), Some("Explain"));
    }
}
