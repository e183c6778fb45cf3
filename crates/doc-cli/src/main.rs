//! CLI for the zero-annotation `OpenAPI` documentation generator.
//!
//! # Subcommands
//!
//! ```text
//! doc-spectrum generate --config doc-spectrum.yaml
//! doc-spectrum generate:optimized --config doc-spectrum.yaml
//! doc-spectrum cache stats --config doc-spectrum.yaml
//! doc-spectrum cache clear --config doc-spectrum.yaml
//! doc-spectrum cache warm --config doc-spectrum.yaml
//! doc-spectrum watch --config doc-spectrum.yaml
//! doc-spectrum export:postman --config doc-spectrum.yaml --output collection.json
//! doc-spectrum export:insomnia --config doc-spectrum.yaml --output export.json
//! doc-spectrum mock --config doc-spectrum.yaml
//! ```

#![forbid(unsafe_code)]

mod commands;
mod config;
mod scanner;

use std::path::PathBuf;

use clap::{Parser, Subcommand};
use doc_core::exec::ExecutionOptions;

use config::{OutputFormatConfig, ProjectConfig};

/// Zero-annotation `OpenAPI` 3.0.x/3.1.0 generator: statically analyzes a
/// route table and its source tree without requiring developer annotations.
#[derive(Parser)]
#[command(name = "doc-spectrum", version, about)]
struct Cli {
    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Run the pipeline once and write the assembled spec.
    Generate(GenerateArgs),

    /// Like `generate`, but with the parallel/chunked execution engine
    /// driving the per-route analysis fan-out.
    #[command(name = "generate:optimized")]
    GenerateOptimized(GenerateOptimizedArgs),

    /// Inspect or manage the on-disk cache.
    Cache {
        #[command(subcommand)]
        action: CacheAction,
    },

    /// Serve the spec over HTTP, regenerating and pushing updates over a
    /// WebSocket whenever a watched source file changes.
    Watch(ConfigArgs),

    /// Export the assembled spec as a Postman v2.1 collection.
    #[command(name = "export:postman")]
    ExportPostman(ExportArgs),

    /// Export the assembled spec as an Insomnia v4 collection.
    #[command(name = "export:insomnia")]
    ExportInsomnia(ExportArgs),

    /// Serve canned example responses over the same route table.
    Mock(ConfigArgs),
}

#[derive(Subcommand)]
enum CacheAction {
    Stats(ConfigArgs),
    Clear(ConfigArgs),
    Warm(ConfigArgs),
}

#[derive(Parser)]
struct ConfigArgs {
    /// Path to the project config YAML. Defaults applied if omitted.
    #[arg(short, long)]
    config: Option<PathBuf>,
}

#[derive(Parser)]
struct ExportArgs {
    #[command(flatten)]
    config_args: ConfigArgs,

    /// Path to write the exported collection to.
    #[arg(short, long)]
    output: PathBuf,
}

#[derive(Parser)]
struct GenerateArgs {
    #[command(flatten)]
    config_args: ConfigArgs,

    /// Override the config's output format.
    #[arg(long)]
    format: Option<OutputFormatConfig>,

    /// Override the config's output path.
    #[arg(short, long)]
    output: Option<PathBuf>,

    /// Bypass the on-disk cache for this run.
    #[arg(long)]
    no_cache: bool,

    /// Override the config's `OpenAPI` version (e.g. `3.0.0`, `3.1.0`).
    #[arg(long)]
    openapi_version: Option<String>,
}

#[derive(Parser)]
struct GenerateOptimizedArgs {
    #[command(flatten)]
    config_args: ConfigArgs,

    #[arg(long)]
    format: Option<OutputFormatConfig>,

    #[arg(short, long)]
    output: Option<PathBuf>,

    #[arg(long)]
    openapi_version: Option<String>,

    /// Fan per-route analysis across a worker pool once the route count
    /// clears the activation threshold.
    #[arg(long)]
    parallel: bool,

    /// Route batch size `ChunkProcessor` keeps resident at once.
    #[arg(long)]
    chunk_size: Option<usize>,

    /// Force an exact worker count instead of `clamp(cores * 2, [2, 16])`.
    #[arg(long)]
    workers: Option<usize>,

    /// `MemoryManager` budget in bytes; defaults to half of total system memory.
    #[arg(long)]
    memory_limit: Option<u64>,

    /// Reuse a cached spec when its dependencies are unchanged, instead of
    /// always forcing a fresh run.
    #[arg(long)]
    incremental: bool,
}

impl GenerateOptimizedArgs {
    fn execution_options(&self) -> ExecutionOptions {
        ExecutionOptions {
            parallel: self.parallel,
            chunk_size: self.chunk_size.unwrap_or_else(|| ExecutionOptions::default().chunk_size),
            workers: self.workers,
            memory_limit_bytes: self.memory_limit,
            incremental: self.incremental,
        }
    }
}

fn load_config(args: &ConfigArgs) -> anyhow::Result<ProjectConfig> {
    match &args.config {
        Some(path) => ProjectConfig::load(path),
        None => Ok(ProjectConfig::default()),
    }
}

/// Applies CLI overrides for `output`/`format`/`openapi_version` onto a
/// loaded config — the config file supplies defaults, flags win.
fn apply_overrides(
    mut config: ProjectConfig,
    format: Option<OutputFormatConfig>,
    output: Option<PathBuf>,
    openapi_version: Option<String>,
) -> ProjectConfig {
    if let Some(format) = format {
        config.output_format = Some(format);
    }
    if let Some(output) = output {
        config.output = output;
    }
    if let Some(version) = openapi_version {
        config.openapi_version = version;
    }
    config
}

fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
        .init();

    let cli = Cli::parse();

    match cli.command {
        Command::Generate(args) => {
            let config = load_config(&args.config_args)?;
            let config = apply_overrides(config, args.format, args.output, args.openapi_version);
            commands::generate::run(&config, args.no_cache)
        }
        Command::GenerateOptimized(args) => {
            let exec = args.execution_options();
            let config = load_config(&args.config_args)?;
            let config = apply_overrides(config, args.format, args.output, args.openapi_version);
            commands::generate::run_optimized(&config, &exec)
        }
        Command::Cache { action } => run_cache_action(action),
        Command::Watch(args) => run_async(commands::watch::run(load_config(&args)?)),
        Command::ExportPostman(args) => {
            let config = load_config(&args.config_args)?;
            commands::export::postman(&config, &args.output)
        }
        Command::ExportInsomnia(args) => {
            let config = load_config(&args.config_args)?;
            commands::export::insomnia(&config, &args.output)
        }
        Command::Mock(args) => run_async(commands::mock::run(load_config(&args)?)),
    }
}

fn run_cache_action(action: CacheAction) -> anyhow::Result<()> {
    match action {
        CacheAction::Stats(args) => commands::cache::stats(&load_config(&args)?),
        CacheAction::Clear(args) => commands::cache::clear(&load_config(&args)?),
        CacheAction::Warm(args) => commands::cache::warm(&load_config(&args)?),
    }
}

fn run_async<F: std::future::Future<Output = anyhow::Result<()>>>(future: F) -> anyhow::Result<()> {
    tokio::runtime::Builder::new_multi_thread()
        .enable_all()
        .build()?
        .block_on(future)
}
