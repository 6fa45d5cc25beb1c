use crate::core::preference::PreferenceStore;
use std::collections::HashMap;
use std::sync::RwLock;
use tracing::debug;

/// Process-local preferences, lost on exit.
#[derive(Default)]
pub struct MemoryPreferences {
    inner: RwLock<HashMap<String, String>>,
}

impl MemoryPreferences {
    pub fn new() -> Self {
        Self::default()
    }
}

impl PreferenceStore for MemoryPreferences {
    fn get(&self, key: &str) -> Option<String> {
        let value = self.inner.read().ok()?.get(key).cloned();
        debug!(key, found = value.is_some(), "Preference GET");
        value
    }

    fn set(&self, key: &str, value: &str) {
        if let Ok(mut map) = self.inner.write() {
            map.insert(key.to_string(), value.to_string());
            debug!(key, value, "Preference SET");
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_get_set() {
        let prefs = MemoryPreferences::new();

        // Initially, store is empty
        assert!(prefs.get("theme").is_none());

        prefs.set("theme", "dark");
        assert_eq!(prefs.get("theme").as_deref(), Some("dark"));

        // Overwrite
        prefs.set("theme", "light");
        assert_eq!(prefs.get("theme").as_deref(), Some("light"));

        assert!(prefs.get("other").is_none());
    }
}
