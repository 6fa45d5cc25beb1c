use crate::core::preference::PreferenceStore;
use crate::store::memory::MemoryPreferences;
use anyhow::{Context, Result};
use fjall::{Config, Keyspace, PartitionCreateOptions, PartitionHandle, PersistMode};
use std::path::Path;
use std::sync::Arc;
use tracing::{debug, warn};

const PARTITION: &str = "preferences";

/// Preferences kept in a fjall keyspace so they survive restarts.
pub struct DiskPreferences {
    keyspace: Keyspace,
    partition: PartitionHandle,
}

impl DiskPreferences {
    pub fn open(path: &Path) -> Result<Self> {
        std::fs::create_dir_all(path)
            .with_context(|| format!("Failed to create directory: {}", path.display()))?;
        let keyspace = Config::new(path)
            .open()
            .with_context(|| format!("Failed to open preference store at {}", path.display()))?;
        let partition = keyspace
            .open_partition(PARTITION, PartitionCreateOptions::default())
            .context("Failed to open preferences partition")?;
        debug!(path = %path.display(), "Opened preference store");
        Ok(Self {
            keyspace,
            partition,
        })
    }

    /// Opens the disk store, or falls back to an in-memory one so that a
    /// broken data directory never stops the dashboard.
    pub fn open_or_memory(path: &Path) -> Arc<dyn PreferenceStore> {
        match Self::open(path) {
            Ok(store) => Arc::new(store),
            Err(e) => {
                warn!(error = %e, "Preference store unavailable, preferences will not persist");
                Arc::new(MemoryPreferences::new())
            }
        }
    }

    fn try_set(&self, key: &str, value: &str) -> Result<()> {
        self.partition.insert(key, value)?;
        self.keyspace.persist(PersistMode::SyncAll)?;
        Ok(())
    }
}

impl PreferenceStore for DiskPreferences {
    fn get(&self, key: &str) -> Option<String> {
        match self.partition.get(key) {
            Ok(Some(bytes)) => match String::from_utf8(bytes.to_vec()) {
                Ok(value) => Some(value),
                Err(e) => {
                    debug!(key, error = %e, "Ignoring non UTF-8 preference");
                    None
                }
            },
            Ok(None) => None,
            Err(e) => {
                debug!(key, error = %e, "Preference read failed");
                None
            }
        }
    }

    fn set(&self, key: &str, value: &str) {
        match self.try_set(key, value) {
            Ok(()) => debug!(key, value, "Preference persisted"),
            Err(e) => warn!(key, error = %e, "Failed to persist preference"),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;

    #[test]
    fn test_disk_get_set() {
        let dir = tempdir().unwrap();
        let prefs = DiskPreferences::open(dir.path()).unwrap();

        assert!(prefs.get("theme").is_none());

        prefs.set("theme", "dark");
        assert_eq!(prefs.get("theme").as_deref(), Some("dark"));
    }

    #[test]
    fn test_disk_value_survives_reopen() {
        let dir = tempdir().unwrap();
        {
            let prefs = DiskPreferences::open(dir.path()).unwrap();
            prefs.set("theme", "dark");
        }

        let reopened = DiskPreferences::open(dir.path()).unwrap();
        assert_eq!(reopened.get("theme").as_deref(), Some("dark"));
    }

    #[test]
    fn test_open_or_memory_falls_back() {
        let dir = tempdir().unwrap();
        // A plain file where the keyspace directory should be
        let blocker = dir.path().join("not-a-dir");
        std::fs::write(&blocker, "x").unwrap();

        let prefs = DiskPreferences::open_or_memory(&blocker);
        prefs.set("theme", "dark");
        assert_eq!(prefs.get("theme").as_deref(), Some("dark"));
    }
}
