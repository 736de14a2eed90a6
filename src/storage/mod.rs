/// File-backed key-value store for dashboard state.
///
/// Plays the role browser local storage plays for a web front end: flat
/// string keys mapped to string values, persisted in
/// `~/.ozon-dash/storage.json`. Every mutation rewrites the whole file, so
/// two processes sharing the file follow last-writer-wins.
///
/// A missing or malformed file loads as an empty store.
use std::collections::BTreeMap;
use std::fs;
use std::path::{Path, PathBuf};

use anyhow::{Context, Result};

/// Encoded credentials bundle.
pub const KEY_ENCRYPTED_TOKENS: &str = "encryptedTokens";
/// Plain backend API key sent as `X-API-Key`.
pub const KEY_API_KEY: &str = "apiKey";
/// `"true"` / `"false"` theme preference.
pub const KEY_DARK_THEME: &str = "darkTheme";
/// JSON array of cost overrides.
pub const KEY_PRODUCT_COSTS: &str = "productCosts";
/// Telegram user id used for identity handoff.
pub const KEY_TELEGRAM_USER_ID: &str = "telegramUserId";

/// String key-value store with optional file persistence.
#[derive(Debug, Clone, Default)]
pub struct LocalStorage {
    path: Option<PathBuf>,
    entries: BTreeMap<String, String>,
}

impl LocalStorage {
    /// Open the store at the default location (`~/.ozon-dash/storage.json`).
    ///
    /// Falls back to an in-memory store when no home directory is available.
    pub fn open_default() -> Self {
        match default_storage_path() {
            Some(path) => Self::at(path),
            None => Self::in_memory(),
        }
    }

    /// Open (or lazily create) a store backed by the given file.
    pub fn at(path: impl Into<PathBuf>) -> Self {
        let path = path.into();
        let entries = load_entries(&path).unwrap_or_default();
        Self {
            path: Some(path),
            entries,
        }
    }

    /// A store that never touches the filesystem.
    pub fn in_memory() -> Self {
        Self::default()
    }

    pub fn get(&self, key: &str) -> Option<&str> {
        self.entries.get(key).map(String::as_str)
    }

    /// Set a key and persist the store.
    pub fn set(&mut self, key: &str, value: impl Into<String>) -> Result<()> {
        self.entries.insert(key.to_string(), value.into());
        self.persist()
    }

    /// Remove a key (no-op when absent) and persist the store.
    pub fn remove(&mut self, key: &str) -> Result<()> {
        if self.entries.remove(key).is_some() {
            self.persist()?;
        }
        Ok(())
    }

    /// Backing file, if any.
    pub fn path(&self) -> Option<&Path> {
        self.path.as_deref()
    }

    /// Re-read the backing file, picking up writes made by other processes.
    pub fn reload(&mut self) {
        if let Some(path) = &self.path {
            self.entries = load_entries(path).unwrap_or_default();
        }
    }

    fn persist(&self) -> Result<()> {
        let Some(path) = &self.path else {
            return Ok(());
        };
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent)
                .with_context(|| format!("failed to create {}", parent.display()))?;
        }
        let json = serde_json::to_string_pretty(&self.entries)
            .context("failed to serialize local storage")?;
        fs::write(path, json).with_context(|| format!("failed to write {}", path.display()))
    }
}

fn load_entries(path: &Path) -> Option<BTreeMap<String, String>> {
    let content = fs::read_to_string(path).ok()?;
    serde_json::from_str(&content).ok()
}

/// Default storage file: `~/.ozon-dash/storage.json`.
pub fn default_storage_path() -> Option<PathBuf> {
    dirs::home_dir().map(|home| home.join(".ozon-dash").join("storage.json"))
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn in_memory_set_get_remove() {
        let mut store = LocalStorage::in_memory();
        assert_eq!(store.get(KEY_API_KEY), None);
        store.set(KEY_API_KEY, "abc").unwrap();
        assert_eq!(store.get(KEY_API_KEY), Some("abc"));
        store.remove(KEY_API_KEY).unwrap();
        assert_eq!(store.get(KEY_API_KEY), None);
        assert!(store.path().is_none());
    }

    #[test]
    fn file_store_persists_across_opens() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("nested").join("storage.json");

        let mut store = LocalStorage::at(&path);
        store.set(KEY_DARK_THEME, "true").unwrap();

        let reopened = LocalStorage::at(&path);
        assert_eq!(reopened.get(KEY_DARK_THEME), Some("true"));
    }

    #[test]
    fn malformed_file_loads_empty() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("storage.json");
        fs::write(&path, "{not json").unwrap();
        let store = LocalStorage::at(&path);
        assert_eq!(store.get(KEY_API_KEY), None);
    }

    #[test]
    fn reload_sees_other_writer() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("storage.json");
        let mut a = LocalStorage::at(&path);
        let mut b = LocalStorage::at(&path);
        a.set(KEY_API_KEY, "from-a").unwrap();
        assert_eq!(b.get(KEY_API_KEY), None);
        b.reload();
        assert_eq!(b.get(KEY_API_KEY), Some("from-a"));
    }
}
