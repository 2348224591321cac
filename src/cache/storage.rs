//! Storage backends for the headline cache
//!
//! The cache persists a single JSON record under a string key. The [`Storage`]
//! trait keeps the cache itself backend-agnostic so tests can run against an
//! in-memory map while the application uses JSON files in an XDG-compliant
//! cache directory.

use std::collections::HashMap;
use std::fs;
use std::io;
use std::path::PathBuf;
use std::sync::Mutex;

use directories::ProjectDirs;

/// String-keyed durable key-value store.
///
/// Reads are infallible by design: any backend failure reads as "no value",
/// matching the policy that an unreadable cache is an absent cache.
pub trait Storage: Send + Sync {
    /// Returns the value stored under `key`, or `None` if absent or unreadable.
    fn get(&self, key: &str) -> Option<String>;

    /// Replaces the value stored under `key`.
    fn set(&self, key: &str, value: &str) -> io::Result<()>;

    /// Deletes the value stored under `key`. Removing an absent key is a no-op.
    fn remove(&self, key: &str) -> io::Result<()>;
}

/// Storage backed by JSON files in a cache directory.
///
/// Uses `~/.cache/coinpulse/` on Linux, or the equivalent XDG path on other
/// platforms. Each key maps to its own `<key>.json` file.
#[derive(Debug, Clone)]
pub struct FileStorage {
    dir: PathBuf,
}

impl FileStorage {
    /// Creates a store rooted in the XDG-compliant cache directory.
    ///
    /// Returns `None` if the cache directory cannot be determined (e.g., no
    /// home directory).
    pub fn new() -> Option<Self> {
        let project_dirs = ProjectDirs::from("", "", "coinpulse")?;
        Some(Self {
            dir: project_dirs.cache_dir().to_path_buf(),
        })
    }

    /// Creates a store rooted in a custom directory.
    ///
    /// Useful for testing or when a specific cache location is needed.
    pub fn with_dir(dir: PathBuf) -> Self {
        Self { dir }
    }

    fn path(&self, key: &str) -> PathBuf {
        self.dir.join(format!("{}.json", key))
    }
}

impl Storage for FileStorage {
    fn get(&self, key: &str) -> Option<String> {
        fs::read_to_string(self.path(key)).ok()
    }

    fn set(&self, key: &str, value: &str) -> io::Result<()> {
        fs::create_dir_all(&self.dir)?;
        let path = self.path(key);
        // Write to a sibling file and rename so a concurrent reader never
        // observes a partially written entry.
        let tmp = path.with_extension("json.tmp");
        fs::write(&tmp, value)?;
        fs::rename(&tmp, &path)
    }

    fn remove(&self, key: &str) -> io::Result<()> {
        match fs::remove_file(self.path(key)) {
            Err(err) if err.kind() != io::ErrorKind::NotFound => Err(err),
            _ => Ok(()),
        }
    }
}

/// Storage backed by an in-process map.
///
/// Used by tests and as a fallback when no cache directory is available.
#[derive(Debug, Default)]
pub struct MemoryStorage {
    entries: Mutex<HashMap<String, String>>,
}

impl MemoryStorage {
    pub fn new() -> Self {
        Self::default()
    }
}

impl Storage for MemoryStorage {
    fn get(&self, key: &str) -> Option<String> {
        self.entries.lock().ok()?.get(key).cloned()
    }

    fn set(&self, key: &str, value: &str) -> io::Result<()> {
        let mut entries = self
            .entries
            .lock()
            .map_err(|_| io::Error::new(io::ErrorKind::Other, "storage lock poisoned"))?;
        entries.insert(key.to_string(), value.to_string());
        Ok(())
    }

    fn remove(&self, key: &str) -> io::Result<()> {
        let mut entries = self
            .entries
            .lock()
            .map_err(|_| io::Error::new(io::ErrorKind::Other, "storage lock poisoned"))?;
        entries.remove(key);
        Ok(())
    }
}
