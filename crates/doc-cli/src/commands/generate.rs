//! `generate` / `generate:optimized`: one-shot pipeline runs.

use std::path::Path;

use anyhow::Context;
use doc_core::cache::{DocumentationCache, FileCacheStore};
use doc_core::errors::ErrorCollector;
use doc_core::exec::ExecutionOptions;
use doc_core::schema::examples::{ExampleProvider, FakerValueProvider, StaticValueProvider};
use doc_core::Pipeline;

use crate::config::{OutputFormatConfig, ProjectConfig};
use crate::scanner::{self, ParsedProject};

/// Runs the pipeline once and writes the result. Backed by the on-disk
/// cache unless `no_cache` is set (`--no-cache`).
pub fn run(config: &ProjectConfig, no_cache: bool) -> anyhow::Result<()> {
    let document = if no_cache {
        build_document(config, None, &ExecutionOptions::sequential())?
    } else {
        let cache = DocumentationCache::new(Box::new(FileCacheStore::new(&config.cache_dir)?));
        build_document(config, Some(&cache), &ExecutionOptions::sequential())?
    };
    write_document(config, &document)
}

/// Assembles the `OpenAPI` document without writing it anywhere — shared by
/// `export:postman`/`export:insomnia`/`mock`, which all need the spec as a
/// value rather than a file on disk.
pub fn build_document_for_export(config: &ProjectConfig) -> anyhow::Result<serde_json::Value> {
    build_document(config, None, &ExecutionOptions::sequential())
}

/// Runs the pipeline behind a persistent [`FileCacheStore`], with the
/// parallel/chunked execution engine (`--parallel --chunk-size --workers
/// --memory-limit --incremental`) driving the per-route analysis fan-out.
/// Unless `exec.incremental` is set, a prior cache entry for this run is
/// invalidated first, so the spec is always freshly assembled even though
/// per-entity analyzer results underneath may still be reused — the cache
/// pays off on repeated `watch` iterations and CI runs that opt into
/// `--incremental`, where most source files don't change between runs.
pub fn run_optimized(config: &ProjectConfig, exec: &ExecutionOptions) -> anyhow::Result<()> {
    let cache = DocumentationCache::new(Box::new(FileCacheStore::new(&config.cache_dir)?));
    let document = build_document(config, Some(&cache), exec)?;
    write_document(config, &document)
}

fn build_document(
    config: &ProjectConfig,
    cache: Option<&DocumentationCache>,
    exec: &ExecutionOptions,
) -> anyhow::Result<serde_json::Value> {
    let routes = scanner::load_routes(&config.routes_file)
        .with_context(|| format!("failed to load route table: {}", config.routes_file.display()))?;
    let enums_path = config.source_dir.join("enums.json");
    let enums = scanner::load_enums(&enums_path)?;

    let project = ParsedProject::load(&config.source_dir)
        .with_context(|| format!("failed to scan source tree: {}", config.source_dir.display()))?;
    let registry = project.build_registry();

    let mut errors = ErrorCollector::new();
    let pipeline = Pipeline::new(config.route_config(), enums);

    let info = config.info_value();
    let servers = config.servers_value();
    let version = config.spec_version();

    let mut provider = provider_for(config);
    let document = if let Some(cache) = cache {
        let key = doc_core::cache::cache_key(doc_core::cache::category::OPENAPI, "spec");
        let deps = project.dependency_paths();
        if !exec.incremental {
            cache.invalidate(&key);
        }
        cache.remember(&key, &deps, || {
            Ok(pipeline.generate(
                &routes,
                &registry,
                &mut errors,
                info.clone(),
                servers.clone(),
                provider.as_mut(),
                version,
                exec,
            ))
        })?
    } else {
        pipeline.generate(&routes, &registry, &mut errors, info, servers, provider.as_mut(), version, exec)
    };

    report_errors(&errors);
    Ok(document)
}

fn provider_for(config: &ProjectConfig) -> Box<dyn ExampleProvider> {
    match config.seed {
        Some(seed) => Box::new(FakerValueProvider::new(seed)),
        None => Box::new(StaticValueProvider::default()),
    }
}

fn report_errors(errors: &ErrorCollector) {
    for error in errors.errors() {
        tracing::warn!(kind = %error.kind, message = %error.message, "analysis fault");
    }
    if !errors.errors().is_empty() {
        tracing::info!(count = errors.errors().len(), "analysis faults recorded");
    }
}

fn write_document(config: &ProjectConfig, document: &serde_json::Value) -> anyhow::Result<()> {
    let rendered = match config.output_format() {
        OutputFormatConfig::Json => serde_json::to_string_pretty(document)?,
        OutputFormatConfig::Yaml => serde_yaml_ng::to_string(document)?,
    };
    write_output(&config.output, &rendered)
}

fn write_output(path: &Path, rendered: &str) -> anyhow::Result<()> {
    if let Some(parent) = path.parent() {
        if !parent.as_os_str().is_empty() {
            std::fs::create_dir_all(parent)?;
        }
    }
    std::fs::write(path, rendered)
        .with_context(|| format!("failed to write spec to {}", path.display()))?;
    eprintln!("OpenAPI spec written to {}", path.display());
    Ok(())
}
