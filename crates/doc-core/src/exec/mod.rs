//! Execution strategy: worker-pool fan-out and memory-bounded chunking for
//! large route sets.

pub mod chunk;
pub mod parallel;

pub use chunk::{ChunkProcessor, MemoryManager};
pub use parallel::{ParallelProcessor, WorkerPolicy};

/// Parallelism only pays for itself past a minimum batch size; below this,
/// spinning up a thread pool costs more than it saves.
pub const PARALLEL_ACTIVATION_THRESHOLD: usize = 50;

/// CLI-configurable execution knobs for `generate:optimized`
/// (`--parallel --chunk-size --workers --memory-limit --incremental`),
/// translated into [`ParallelProcessor`]/[`ChunkProcessor`]/[`MemoryManager`]
/// policy. The plain `generate` subcommand runs with [`Self::sequential`].
#[derive(Debug, Clone)]
pub struct ExecutionOptions {
    pub parallel: bool,
    pub chunk_size: usize,
    pub workers: Option<usize>,
    pub memory_limit_bytes: Option<u64>,
    /// Whether a cache hit with unchanged dependencies should be reused.
    /// When `false`, a caller backed by a cache still force-recomputes and
    /// re-stores the result (so later incremental runs benefit).
    pub incremental: bool,
}

impl Default for ExecutionOptions {
    fn default() -> Self {
        Self { parallel: false, chunk_size: 200, workers: None, memory_limit_bytes: None, incremental: false }
    }
}

impl ExecutionOptions {
    /// What the plain `generate` subcommand runs with: no parallel fan-out,
    /// one chunk.
    #[must_use]
    pub fn sequential() -> Self {
        Self::default()
    }

    fn worker_policy(&self) -> WorkerPolicy {
        match self.workers {
            Some(n) => {
                let n = n.max(1);
                WorkerPolicy { min_workers: n, max_workers: n, multiplier: 1 }
            }
            None => WorkerPolicy::default(),
        }
    }

    /// Per spec.md §4.13's activation rule: parallel only once `item_count`
    /// clears [`PARALLEL_ACTIVATION_THRESHOLD`], otherwise degrade to
    /// sequential regardless of the `--parallel` flag.
    pub(crate) fn processor(&self, item_count: usize) -> ParallelProcessor {
        if self.parallel && item_count >= PARALLEL_ACTIVATION_THRESHOLD {
            ParallelProcessor::new(self.worker_policy())
        } else {
            ParallelProcessor::sequential()
        }
    }

    pub(crate) fn memory_manager(&self) -> MemoryManager {
        match self.memory_limit_bytes {
            Some(bytes) => MemoryManager::new(bytes),
            None => MemoryManager::with_default_budget(),
        }
    }
}
