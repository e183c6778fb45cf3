//! Fans work across a bounded worker pool via `rayon`, with a deterministic
//! sequential fallback when the pool can't be built (e.g. a single-core
//! sandbox) or the caller explicitly disables parallelism.

use rayon::prelude::*;

/// Worker-count policy: `clamp(cores * multiplier, [min_workers, max_workers])`.
#[derive(Debug, Clone, Copy)]
pub struct WorkerPolicy {
    pub min_workers: usize,
    pub max_workers: usize,
    pub multiplier: usize,
}

impl Default for WorkerPolicy {
    fn default() -> Self {
        Self { min_workers: 2, max_workers: 16, multiplier: 2 }
    }
}

impl WorkerPolicy {
    #[must_use]
    pub fn worker_count(&self, cores: usize) -> usize {
        (cores * self.multiplier).clamp(self.min_workers, self.max_workers)
    }
}

pub struct ParallelProcessor {
    policy: WorkerPolicy,
    sequential: bool,
}

impl ParallelProcessor {
    #[must_use]
    pub fn new(policy: WorkerPolicy) -> Self {
        Self { policy, sequential: false }
    }

    /// Force single-threaded execution (`--no-parallel`, or a single-item
    /// batch where spinning up a pool isn't worth it).
    #[must_use]
    pub fn sequential() -> Self {
        Self { policy: WorkerPolicy::default(), sequential: true }
    }

    #[must_use]
    pub fn worker_count(&self) -> usize {
        if self.sequential {
            1
        } else {
            self.policy.worker_count(num_cpus::get())
        }
    }

    /// Map `items` through `f`, degrading to a plain sequential iterator
    /// when `sequential()` was requested or the pool fails to build.
    pub fn map<T, R, F>(&self, items: Vec<T>, f: F) -> Vec<R>
    where
        T: Send,
        R: Send,
        F: Fn(T) -> R + Send + Sync,
    {
        if self.sequential {
            return items.into_iter().map(f).collect();
        }

        match rayon::ThreadPoolBuilder::new().num_threads(self.worker_count()).build() {
            Ok(pool) => pool.install(|| items.into_par_iter().map(f).collect()),
            Err(_) => items.into_iter().map(f).collect(),
        }
    }
}
