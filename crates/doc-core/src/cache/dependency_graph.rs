//! Tracks which cache entries depend on the validity of other cache
//! entries, so invalidating one entry cascades transitively to every
//! entry that (directly or indirectly) depends on it.

use std::collections::{HashMap, HashSet, VecDeque};
use std::sync::Mutex;

/// `entry -> {entries that depend on it}`. Edges run from a dependency to
/// its dependents so invalidation can walk forward from the changed node.
#[derive(Debug, Default)]
pub struct DependencyGraph {
    dependents: Mutex<HashMap<String, HashSet<String>>>,
}

impl DependencyGraph {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Record that `dependent` additionally depends on the validity of
    /// `depends_on`.
    pub fn add_edge(&self, dependent: &str, depends_on: &str) {
        self.dependents
            .lock()
            .unwrap()
            .entry(depends_on.to_string())
            .or_default()
            .insert(dependent.to_string());
    }

    /// Every entry transitively invalidated by invalidating `key`,
    /// including `key` itself.
    #[must_use]
    pub fn transitive_dependents(&self, key: &str) -> Vec<String> {
        let graph = self.dependents.lock().unwrap();
        let mut visited = HashSet::new();
        let mut queue = VecDeque::from([key.to_string()]);
        visited.insert(key.to_string());

        while let Some(current) = queue.pop_front() {
            if let Some(deps) = graph.get(&current) {
                for d in deps {
                    if visited.insert(d.clone()) {
                        queue.push_back(d.clone());
                    }
                }
            }
        }

        visited.into_iter().collect()
    }

    pub fn remove_entry(&self, key: &str) {
        let mut graph = self.dependents.lock().unwrap();
        graph.remove(key);
        for deps in graph.values_mut() {
            deps.remove(key);
        }
    }
}
