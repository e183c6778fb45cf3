//! Pluggable cache backends. [`InMemoryCacheStore`] is used by tests and
//! the one-shot `generate` command; [`FileCacheStore`] persists across
//! runs for `generate:optimized` and the watch daemon.

use std::collections::HashMap;
use std::path::{Path, PathBuf};
use std::sync::{Arc, Mutex};

use serde::{Deserialize, Serialize};

use crate::errors::Error;

/// A single cached computation result plus the file-content hashes it was
/// computed against.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CacheEntry {
    pub key: String,
    pub data: serde_json::Value,
    pub dependencies: Vec<Dependency>,
    pub created_at_unix: u64,
    pub ttl_secs: Option<u64>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Dependency {
    pub file_path: PathBuf,
    pub content_hash: String,
}

/// A key-value store for [`CacheEntry`] values. Implementations need not
/// be transactional; the cache layer above tolerates a lost write as a
/// cache miss on the next run.
pub trait CacheStore: Send + Sync {
    fn get(&self, key: &str) -> Option<CacheEntry>;
    fn set(&self, entry: CacheEntry) -> Result<(), Error>;
    fn remove(&self, key: &str);
    fn clear(&self);
    fn keys(&self) -> Vec<String>;
}

/// Process-local store, lost on exit. Default for `generate` (non-optimized)
/// and all tests.
#[derive(Debug, Default)]
pub struct InMemoryCacheStore {
    entries: Mutex<HashMap<String, CacheEntry>>,
}

impl CacheStore for InMemoryCacheStore {
    fn get(&self, key: &str) -> Option<CacheEntry> {
        self.entries.lock().unwrap().get(key).cloned()
    }

    fn set(&self, entry: CacheEntry) -> Result<(), Error> {
        self.entries.lock().unwrap().insert(entry.key.clone(), entry);
        Ok(())
    }

    fn remove(&self, key: &str) {
        self.entries.lock().unwrap().remove(key);
    }

    fn clear(&self) {
        self.entries.lock().unwrap().clear();
    }

    fn keys(&self) -> Vec<String> {
        self.entries.lock().unwrap().keys().cloned().collect()
    }
}

/// One JSON file per key under `base_dir`. Keys are flattened to a
/// filesystem-safe name (`/`, `:` → `_`). A per-key in-process mutex
/// serializes concurrent writers from the same run; it does not protect
/// against a second OS process writing the same cache directory.
#[derive(Debug)]
pub struct FileCacheStore {
    base_dir: PathBuf,
    locks: Mutex<HashMap<String, Arc<Mutex<()>>>>,
}

impl FileCacheStore {
    pub fn new(base_dir: impl Into<PathBuf>) -> Result<Self, Error> {
        let base_dir = base_dir.into();
        std::fs::create_dir_all(&base_dir)?;
        Ok(Self { base_dir, locks: Mutex::new(HashMap::new()) })
    }

    fn path_for(&self, key: &str) -> PathBuf {
        let safe = key.replace(['/', ':'], "_");
        self.base_dir.join(format!("{safe}.json"))
    }

    fn lock_for(&self, key: &str) -> Arc<Mutex<()>> {
        self.locks.lock().unwrap().entry(key.to_string()).or_default().clone()
    }
}

impl CacheStore for FileCacheStore {
    fn get(&self, key: &str) -> Option<CacheEntry> {
        let _guard = self.lock_for(key);
        let path = self.path_for(key);
        let bytes = std::fs::read(path).ok()?;
        serde_json::from_slice(&bytes).ok()
    }

    fn set(&self, entry: CacheEntry) -> Result<(), Error> {
        let guard = self.lock_for(&entry.key);
        let _guard = guard.lock().unwrap();
        let path = self.path_for(&entry.key);
        let bytes = serde_json::to_vec_pretty(&entry)?;
        std::fs::write(path, bytes)?;
        Ok(())
    }

    fn remove(&self, key: &str) {
        let _ = std::fs::remove_file(self.path_for(key));
    }

    fn clear(&self) {
        if let Ok(entries) = std::fs::read_dir(&self.base_dir) {
            for entry in entries.flatten() {
                let _ = std::fs::remove_file(entry.path());
            }
        }
    }

    fn keys(&self) -> Vec<String> {
        std::fs::read_dir(&self.base_dir)
            .into_iter()
            .flatten()
            .flatten()
            .filter_map(|e| e.path().file_stem().map(|s| s.to_string_lossy().into_owned()))
            .collect()
    }
}

/// `sha256(content) ⊕ mtime_unix_nanos`, hex-encoded. Combining the
/// content hash with mtime means a file rewritten with byte-identical
/// content still invalidates (mtime moved), matching the documented
/// invariant that a cache entry only survives an *unchanged* file.
pub fn file_fingerprint(path: &Path) -> Result<String, Error> {
    use sha2::{Digest, Sha256};
    let bytes = std::fs::read(path)?;
    let mtime_nanos = std::fs::metadata(path)?
        .modified()
        .ok()
        .and_then(|t| t.duration_since(std::time::UNIX_EPOCH).ok())
        .map(|d| d.as_nanos())
        .unwrap_or(0);

    let mut hasher = Sha256::new();
    hasher.update(&bytes);
    let content_digest = hasher.finalize();

    let mut combined = [0u8; 32];
    for (i, byte) in content_digest.iter().enumerate() {
        combined[i] = byte ^ mtime_nanos.to_le_bytes()[i % 16];
    }
    Ok(hex_encode(&combined))
}

fn hex_encode(bytes: &[u8]) -> String {
    bytes.iter().map(|b| format!("{b:02x}")).collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn entry(key: &str) -> CacheEntry {
        CacheEntry {
            key: key.to_string(),
            data: serde_json::json!({"ok": true}),
            dependencies: vec![],
            created_at_unix: 0,
            ttl_secs: None,
        }
    }

    #[test]
    fn in_memory_round_trips() {
        let store = InMemoryCacheStore::default();
        store.set(entry("route:123")).unwrap();
        assert!(store.get("route:123").is_some());
        store.remove("route:123");
        assert!(store.get("route:123").is_none());
    }

    #[test]
    fn file_store_round_trips() {
        let dir = tempfile::tempdir().unwrap();
        let store = FileCacheStore::new(dir.path()).unwrap();
        store.set(entry("resource:UserResource")).unwrap();
        let loaded = store.get("resource:UserResource").unwrap();
        assert_eq!(loaded.data, serde_json::json!({"ok": true}));
    }

    #[test]
    fn file_store_clear_removes_all_keys() {
        let dir = tempfile::tempdir().unwrap();
        let store = FileCacheStore::new(dir.path()).unwrap();
        store.set(entry("a")).unwrap();
        store.set(entry("b")).unwrap();
        store.clear();
        assert!(store.keys().is_empty());
    }

    #[test]
    fn fingerprint_changes_when_content_changes() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("f.rs");
        std::fs::write(&path, "a").unwrap();
        let h1 = file_fingerprint(&path).unwrap();
        std::thread::sleep(std::time::Duration::from_millis(5));
        std::fs::write(&path, "b").unwrap();
        let h2 = file_fingerprint(&path).unwrap();
        assert_ne!(h1, h2);
    }
}
