//! Content-hash-keyed caching with cascading invalidation.

pub mod dependency_graph;
pub mod store;

use std::path::Path;
use std::time::{SystemTime, UNIX_EPOCH};

pub use dependency_graph::DependencyGraph;
pub use store::{CacheEntry, CacheStore, Dependency, FileCacheStore, InMemoryCacheStore};

use crate::errors::Error;

/// Category prefixes used to namespace cache keys (`route:`, `formrequest:`,
/// `resource:`, `controller_method:`, `openapi:`).
pub mod category {
    pub const ROUTE: &str = "route";
    pub const FORM_REQUEST: &str = "formrequest";
    pub const RESOURCE: &str = "resource";
    pub const CONTROLLER_METHOD: &str = "controller_method";
    pub const OPENAPI: &str = "openapi";
}

pub fn cache_key(category: &str, identifier: &str) -> String {
    format!("{category}:{identifier}")
}

/// The cache façade analyzers and generators are handed. Wraps a
/// [`CacheStore`] plus a [`DependencyGraph`] for cascading invalidation.
pub struct DocumentationCache {
    store: Box<dyn CacheStore>,
    graph: DependencyGraph,
}

impl DocumentationCache {
    #[must_use]
    pub fn new(store: Box<dyn CacheStore>) -> Self {
        Self { store, graph: DependencyGraph::new() }
    }

    /// `remember(key, fn, deps)`: returns the cached value if every
    /// dependency's current content hash still matches what was recorded,
    /// otherwise recomputes via `fn`, invalidates transitively, and
    /// re-stores.
    pub fn remember<F>(
        &self,
        key: &str,
        deps: &[std::path::PathBuf],
        compute: F,
    ) -> Result<serde_json::Value, Error>
    where
        F: FnOnce() -> Result<serde_json::Value, Error>,
    {
        if let Some(entry) = self.store.get(key) {
            if self.dependencies_still_valid(&entry)? {
                return Ok(entry.data);
            }
            self.invalidate(key);
        }

        let data = compute()?;
        let dependencies = deps
            .iter()
            .map(|p| Ok(Dependency { file_path: p.clone(), content_hash: store::file_fingerprint(p)? }))
            .collect::<Result<Vec<_>, Error>>()?;

        for dep in &dependencies {
            self.graph.add_edge(key, &dep.file_path.to_string_lossy());
        }

        self.store.set(CacheEntry {
            key: key.to_string(),
            data: data.clone(),
            dependencies,
            created_at_unix: now_unix(),
            ttl_secs: None,
        })?;

        Ok(data)
    }

    fn dependencies_still_valid(&self, entry: &CacheEntry) -> Result<bool, Error> {
        for dep in &entry.dependencies {
            if !dep.file_path.exists() {
                return Ok(false);
            }
            let current = store::file_fingerprint(&dep.file_path)?;
            if current != dep.content_hash {
                return Ok(false);
            }
        }
        Ok(true)
    }

    /// Invalidate `key` and cascade to every entry transitively depending
    /// on it via the dependency graph.
    pub fn invalidate(&self, key: &str) {
        for affected in self.graph.transitive_dependents(key) {
            self.store.remove(&affected);
            self.graph.remove_entry(&affected);
        }
    }

    /// Invalidate every cache entry that recorded `changed_file` as a
    /// dependency — called by the watch daemon on a filesystem event.
    pub fn invalidate_for_file(&self, changed_file: &Path) {
        self.invalidate(&changed_file.to_string_lossy());
    }

    pub fn clear(&self) {
        self.store.clear();
    }

    #[must_use]
    pub fn stats(&self) -> CacheStats {
        CacheStats { entry_count: self.store.keys().len() }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CacheStats {
    pub entry_count: usize,
}

fn now_unix() -> u64 {
    SystemTime::now().duration_since(UNIX_EPOCH).map(|d| d.as_secs()).unwrap_or(0)
}
