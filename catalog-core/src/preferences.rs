//! Small string key/value preference storage.
//!
//! Holds the preferred catalog source, favorite sources and the selected
//! latency field. Views receive a store explicitly; there is no shared
//! global instance.

use crate::error::{CoreError, Result};
use std::collections::BTreeMap;
use std::io;
use std::path::{Path, PathBuf};

/// Well-known preference keys.
pub mod keys {
    pub const PREFERRED_SOURCE: &str = "preferredSource";
    pub const FAVORITE_SOURCES: &str = "favoriteSources";
    pub const LATENCY_FIELD: &str = "latencyField";
}

pub trait PreferenceStore {
    fn get(&self, key: &str) -> Option<String>;
    fn set(&mut self, key: &str, value: &str) -> Result<()>;
    fn remove(&mut self, key: &str) -> Result<()>;
}

/// Volatile store, one per session.
#[derive(Debug, Clone, Default)]
pub struct InMemoryPreferences {
    values: BTreeMap<String, String>,
}

impl PreferenceStore for InMemoryPreferences {
    fn get(&self, key: &str) -> Option<String> {
        self.values.get(key).cloned()
    }

    fn set(&mut self, key: &str, value: &str) -> Result<()> {
        self.values.insert(key.to_string(), value.to_string());
        Ok(())
    }

    fn remove(&mut self, key: &str) -> Result<()> {
        self.values.remove(key);
        Ok(())
    }
}

/// JSON-file backed store. Every write replaces the file atomically.
#[derive(Debug, Clone)]
pub struct FilePreferences {
    path: PathBuf,
    values: BTreeMap<String, String>,
}

impl FilePreferences {
    /// Open the store at `path`; a missing file is an empty store.
    pub fn open(path: impl Into<PathBuf>) -> Result<Self> {
        let path = path.into();
        let values = if path.exists() {
            let raw = std::fs::read_to_string(&path)?;
            serde_json::from_str(&raw).map_err(|e| CoreError::CorruptPreferences {
                path: path.clone(),
                message: e.to_string(),
            })?
        } else {
            BTreeMap::new()
        };
        Ok(Self { path, values })
    }

    /// `<data dir>/preferences.json` for the current user.
    pub fn default_path() -> Option<PathBuf> {
        directories::ProjectDirs::from("dev", "catalog-console", "catalog-console")
            .map(|d| d.data_dir().join("preferences.json"))
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    fn save(&self) -> Result<()> {
        let json = serde_json::to_string_pretty(&self.values)?;
        atomic_write(&self.path, json.as_bytes())?;
        Ok(())
    }
}

impl PreferenceStore for FilePreferences {
    fn get(&self, key: &str) -> Option<String> {
        self.values.get(key).cloned()
    }

    fn set(&mut self, key: &str, value: &str) -> Result<()> {
        self.values.insert(key.to_string(), value.to_string());
        self.save()
    }

    fn remove(&mut self, key: &str) -> Result<()> {
        if self.values.remove(key).is_some() {
            self.save()?;
        }
        Ok(())
    }
}

/// Write to a `.tmp` sibling, then rename over the target.
fn atomic_write(path: &Path, data: &[u8]) -> io::Result<()> {
    if let Some(parent) = path.parent() {
        std::fs::create_dir_all(parent)?;
    }
    let tmp = path.with_extension("tmp");
    std::fs::write(&tmp, data)?;
    std::fs::rename(&tmp, path)?;
    Ok(())
}

/// Favorite source ids, stored as a JSON array. Unreadable values read as
/// no favorites.
pub fn favorite_sources(prefs: &dyn PreferenceStore) -> Vec<String> {
    prefs
        .get(keys::FAVORITE_SOURCES)
        .and_then(|raw| serde_json::from_str(&raw).ok())
        .unwrap_or_default()
}

/// Add or remove `source_id` from the favorites. Returns whether it is a
/// favorite afterwards.
pub fn toggle_favorite_source(prefs: &mut dyn PreferenceStore, source_id: &str) -> Result<bool> {
    let mut favorites = favorite_sources(prefs);
    let now_favorite = if let Some(pos) = favorites.iter().position(|f| f == source_id) {
        favorites.remove(pos);
        false
    } else {
        favorites.push(source_id.to_string());
        true
    };
    prefs.set(keys::FAVORITE_SOURCES, &serde_json::to_string(&favorites)?)?;
    Ok(now_favorite)
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn test_in_memory_roundtrip() {
        let mut prefs = InMemoryPreferences::default();
        prefs.set(keys::PREFERRED_SOURCE, "redhat_ai").unwrap();
        assert_eq!(prefs.get(keys::PREFERRED_SOURCE).as_deref(), Some("redhat_ai"));
        prefs.remove(keys::PREFERRED_SOURCE).unwrap();
        assert_eq!(prefs.get(keys::PREFERRED_SOURCE), None);
    }

    #[test]
    fn test_file_store_survives_reopen() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("nested").join("preferences.json");

        let mut prefs = FilePreferences::open(&path).unwrap();
        assert_eq!(prefs.get(keys::LATENCY_FIELD), None);
        prefs.set(keys::LATENCY_FIELD, "itl_p95").unwrap();
        assert!(path.exists());
        assert!(!path.with_extension("tmp").exists());

        let reopened = FilePreferences::open(&path).unwrap();
        assert_eq!(reopened.get(keys::LATENCY_FIELD).as_deref(), Some("itl_p95"));
        assert_eq!(reopened.path(), path.as_path());
    }

    #[test]
    fn test_corrupt_file_is_an_error() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("preferences.json");
        std::fs::write(&path, "not json").unwrap();
        let err = FilePreferences::open(&path).unwrap_err();
        assert!(matches!(err, CoreError::CorruptPreferences { .. }));
    }

    #[test]
    fn test_favorites_toggle() {
        let mut prefs = InMemoryPreferences::default();
        assert!(favorite_sources(&prefs).is_empty());
        assert!(toggle_favorite_source(&mut prefs, "hf").unwrap());
        assert!(toggle_favorite_source(&mut prefs, "redhat_ai").unwrap());
        assert_eq!(favorite_sources(&prefs), vec!["hf", "redhat_ai"]);
        assert!(!toggle_favorite_source(&mut prefs, "hf").unwrap());
        assert_eq!(favorite_sources(&prefs), vec!["redhat_ai"]);
    }

    #[test]
    fn test_garbage_favorites_read_as_empty() {
        let mut prefs = InMemoryPreferences::default();
        prefs.set(keys::FAVORITE_SOURCES, "{oops").unwrap();
        assert!(favorite_sources(&prefs).is_empty());
    }
}
