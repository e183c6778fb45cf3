//! Splits a large route set into memory-bounded chunks so a run over a
//! thousand-route application doesn't hold every parsed `syn::File` in
//! memory at once.

use sysinfo::System;

/// Polls total process memory via `sysinfo` and decides whether another
/// chunk can be started.
pub struct MemoryManager {
    budget_bytes: u64,
    system: System,
}

impl MemoryManager {
    #[must_use]
    pub fn new(budget_bytes: u64) -> Self {
        Self { budget_bytes, system: System::new() }
    }

    /// A conservative default: half of total system memory, or 512MiB if
    /// that can't be determined.
    #[must_use]
    pub fn with_default_budget() -> Self {
        let mut system = System::new();
        system.refresh_memory();
        let total = system.total_memory();
        let budget = if total > 0 { total / 2 } else { 512 * 1024 * 1024 };
        Self { budget_bytes: budget, system }
    }

    #[must_use]
    pub fn current_usage_bytes(&mut self) -> u64 {
        self.system.refresh_memory();
        self.system.used_memory()
    }

    #[must_use]
    pub fn over_budget(&mut self) -> bool {
        self.current_usage_bytes() > self.budget_bytes
    }
}

/// Splits `items` into chunks of `chunk_size`, driving each through `f`
/// sequentially so [`MemoryManager`] has a chance to observe usage between
/// chunks. Each chunk's own items may still be processed in parallel by
/// `f` (e.g. via [`super::parallel::ParallelProcessor`]).
pub struct ChunkProcessor {
    chunk_size: usize,
}

impl ChunkProcessor {
    #[must_use]
    pub fn new(chunk_size: usize) -> Self {
        Self { chunk_size: chunk_size.max(1) }
    }

    pub fn process<T, R, F>(&self, items: Vec<T>, mut f: F) -> Vec<R>
    where
        F: FnMut(Vec<T>) -> Vec<R>,
    {
        let mut out = Vec::with_capacity(items.len());
        let mut iter = items.into_iter().peekable();
        while iter.peek().is_some() {
            let chunk: Vec<T> = iter.by_ref().take(self.chunk_size).collect();
            out.extend(f(chunk));
        }
        out
    }
}
