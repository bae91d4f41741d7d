//! Persisted name → string maps: aliases and bookmarks.
//!
//! Every mutation writes the whole map back to its JSON document. A failed
//! write is returned to the caller; the in-memory change is kept.

use crate::error::{Result, ShellError};
use std::collections::BTreeMap;
use std::fs;
use std::path::{Path, PathBuf};

/// A flat name → value map backed by a JSON object on disk.
#[derive(Debug, Clone, Default)]
pub struct NamedStore {
    path: Option<PathBuf>,
    entries: BTreeMap<String, String>,
}

impl NamedStore {
    /// A store that never touches the filesystem.
    pub fn in_memory() -> Self {
        Self::default()
    }

    /// Read the store at `path`.
    pub fn load(path: &Path) -> Result<Self> {
        let text = fs::read_to_string(path).map_err(|source| ShellError::StoreRead {
            path: path.to_path_buf(),
            source,
        })?;
        let entries = serde_json::from_str(&text).map_err(|source| ShellError::StoreFormat {
            path: path.to_path_buf(),
            source,
        })?;
        Ok(Self {
            path: Some(path.to_path_buf()),
            entries,
        })
    }

    /// Read the store at `path`, falling back to an empty map.
    ///
    /// The fallback store still persists to `path`, so the next mutation
    /// replaces a corrupt document.
    pub fn open(path: &Path) -> Self {
        if !path.exists() {
            return Self::empty_at(path);
        }
        Self::load(path).unwrap_or_else(|e| {
            log::warn!("{e}; starting with an empty store");
            Self::empty_at(path)
        })
    }

    fn empty_at(path: &Path) -> Self {
        Self {
            path: Some(path.to_path_buf()),
            entries: BTreeMap::new(),
        }
    }

    /// All entries, ordered by name.
    pub fn list(&self) -> &BTreeMap<String, String> {
        &self.entries
    }

    pub fn names(&self) -> impl Iterator<Item = &str> {
        self.entries.keys().map(String::as_str)
    }

    pub fn get(&self, name: &str) -> Option<&str> {
        self.entries.get(name).map(String::as_str)
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Insert or overwrite `name`, then persist.
    pub fn set(&mut self, name: impl Into<String>, value: impl Into<String>) -> Result<()> {
        self.entries.insert(name.into(), value.into());
        self.save()
    }

    /// Remove `name`. Returns `Ok(false)` when it was not present.
    pub fn remove(&mut self, name: &str) -> Result<bool> {
        if self.entries.remove(name).is_none() {
            return Ok(false);
        }
        self.save().map(|()| true)
    }

    /// Write the full map to the backing document.
    pub fn save(&self) -> Result<()> {
        let Some(path) = &self.path else {
            return Ok(());
        };
        let text =
            serde_json::to_string_pretty(&self.entries).map_err(|source| ShellError::StoreFormat {
                path: path.clone(),
                source,
            })?;
        fs::write(path, text).map_err(|source| ShellError::StoreWrite {
            path: path.clone(),
            source,
        })
    }
}

/// Command aliases: `name` expands to a raw command string.
#[derive(Debug, Clone, Default)]
pub struct AliasStore(NamedStore);

impl AliasStore {
    pub fn new(store: NamedStore) -> Self {
        Self(store)
    }

    pub fn open(path: &Path) -> Self {
        Self(NamedStore::open(path))
    }

    pub fn list(&self) -> &BTreeMap<String, String> {
        self.0.list()
    }

    pub fn names(&self) -> impl Iterator<Item = &str> {
        self.0.names()
    }

    pub fn get(&self, name: &str) -> Option<&str> {
        self.0.get(name)
    }

    pub fn set(&mut self, name: impl Into<String>, expansion: impl Into<String>) -> Result<()> {
        self.0.set(name, expansion)
    }

    pub fn remove(&mut self, name: &str) -> Result<bool> {
        self.0.remove(name)
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    /// Case-insensitive lookup used by the router; an exact match wins.
    pub fn expansion_for(&self, name: &str) -> Option<&str> {
        self.0.get(name).or_else(|| {
            self.0
                .list()
                .iter()
                .find(|(k, _)| k.eq_ignore_ascii_case(name))
                .map(|(_, v)| v.as_str())
        })
    }
}

/// Directory bookmarks: `name` is bound to an absolute directory path.
#[derive(Debug, Clone, Default)]
pub struct BookmarkStore(NamedStore);

impl BookmarkStore {
    pub fn new(store: NamedStore) -> Self {
        Self(store)
    }

    pub fn open(path: &Path) -> Self {
        Self(NamedStore::open(path))
    }

    pub fn list(&self) -> &BTreeMap<String, String> {
        self.0.list()
    }

    pub fn names(&self) -> impl Iterator<Item = &str> {
        self.0.names()
    }

    /// The stored path. It is not re-validated and may no longer exist.
    pub fn get(&self, name: &str) -> Option<&str> {
        self.0.get(name)
    }

    /// Bookmark `path`, which must be an absolute path to an existing
    /// directory right now.
    pub fn set(&mut self, name: impl Into<String>, path: &Path) -> Result<()> {
        if !path.is_absolute() || !path.is_dir() {
            return Err(ShellError::NotADirectory(path.to_path_buf()));
        }
        self.0.set(name, path.to_string_lossy())
    }

    pub fn remove(&mut self, name: &str) -> Result<bool> {
        self.0.remove(name)
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn round_trip_preserves_entries() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("aliases.json");

        let mut store = AliasStore::open(&path);
        store.set("ll", "ls -la").unwrap();
        store.set("gs", "git status").unwrap();
        store.set("up", "cd ..").unwrap();

        let reloaded = AliasStore::open(&path);
        assert_eq!(reloaded.list(), store.list());
        assert_eq!(reloaded.list().len(), 3);
    }

    #[test]
    fn load_ignores_on_disk_order() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("aliases.json");
        fs::write(&path, r#"{"zz": "echo z", "aa": "echo a"}"#).unwrap();

        let store = NamedStore::load(&path).unwrap();
        let names: Vec<_> = store.names().collect();
        assert_eq!(names, ["aa", "zz"]);
    }

    #[test]
    fn missing_or_corrupt_file_yields_empty_store() {
        let dir = tempfile::tempdir().unwrap();
        let missing = dir.path().join("missing.json");
        assert!(NamedStore::open(&missing).is_empty());

        let corrupt = dir.path().join("corrupt.json");
        fs::write(&corrupt, "[1, 2").unwrap();
        assert!(NamedStore::load(&corrupt).is_err());

        let mut store = NamedStore::open(&corrupt);
        assert!(store.is_empty());
        store.set("a", "b").unwrap();
        assert_eq!(NamedStore::load(&corrupt).unwrap().get("a"), Some("b"));
    }

    #[test]
    fn failed_write_keeps_memory_state() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("no_such_dir").join("aliases.json");

        let mut store = NamedStore::open(&path);
        assert!(store.set("ll", "ls -la").is_err());
        assert_eq!(store.get("ll"), Some("ls -la"));
    }

    #[test]
    fn remove_reports_absence() {
        let mut store = NamedStore::in_memory();
        store.set("a", "1").unwrap();
        assert!(store.remove("a").unwrap());
        assert!(!store.remove("a").unwrap());
        assert_eq!(store.get("a"), None);
    }

    #[test]
    fn alias_lookup_ignores_case() {
        let mut aliases = AliasStore::default();
        aliases.set("GS", "git status").unwrap();
        assert_eq!(aliases.expansion_for("gs"), Some("git status"));
        assert_eq!(aliases.expansion_for("GS"), Some("git status"));
        assert_eq!(aliases.expansion_for("gx"), None);
    }

    #[test]
    fn bookmark_set_get_remove() {
        let dir = tempfile::tempdir().unwrap();
        let target = fs::canonicalize(dir.path()).unwrap();
        let mut bookmarks = BookmarkStore::default();

        bookmarks.set("proj", &target).unwrap();
        bookmarks.set("proj", &target).unwrap();
        assert_eq!(bookmarks.get("proj"), Some(target.to_string_lossy().as_ref()));

        assert!(bookmarks.remove("proj").unwrap());
        assert_eq!(bookmarks.get("proj"), None);
    }

    #[test]
    fn bookmark_rejects_files_and_relative_paths() {
        let dir = tempfile::tempdir().unwrap();
        let file = dir.path().join("notes.txt");
        fs::write(&file, "x").unwrap();
        let mut bookmarks = BookmarkStore::default();

        assert!(matches!(
            bookmarks.set("notes", &file),
            Err(ShellError::NotADirectory(_))
        ));
        assert!(bookmarks.set("rel", Path::new("src")).is_err());
        assert!(bookmarks.is_empty());
    }
}
