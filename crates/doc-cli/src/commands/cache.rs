//! `cache {stats,clear,warm}`: inspect and manage the on-disk cache used
//! by `generate:optimized` and `watch`.

use doc_core::cache::{DocumentationCache, FileCacheStore};
use doc_core::exec::ExecutionOptions;

use crate::config::ProjectConfig;

pub fn stats(config: &ProjectConfig) -> anyhow::Result<()> {
    let cache = DocumentationCache::new(Box::new(FileCacheStore::new(&config.cache_dir)?));
    let stats = cache.stats();
    println!("cache dir:    {}", config.cache_dir.display());
    println!("entry count:  {}", stats.entry_count);
    Ok(())
}

pub fn clear(config: &ProjectConfig) -> anyhow::Result<()> {
    let cache = DocumentationCache::new(Box::new(FileCacheStore::new(&config.cache_dir)?));
    cache.clear();
    println!("cache cleared: {}", config.cache_dir.display());
    Ok(())
}

/// Pre-populates the cache by running the full pipeline once with it
/// attached, so the next `generate:optimized`/`watch` run starts warm.
pub fn warm(config: &ProjectConfig) -> anyhow::Result<()> {
    let exec = ExecutionOptions { incremental: true, ..ExecutionOptions::default() };
    super::generate::run_optimized(config, &exec)?;
    println!("cache warmed: {}", config.cache_dir.display());
    Ok(())
}
