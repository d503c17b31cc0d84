//! Disk LRU cache CLI
//!
//! Puts, reads and inspects files in a disk LRU cache directory, and can
//! fill it with random demo files to watch eviction at work.

mod commands;
mod config;
mod demo;
mod error;

use crate::commands::Command;
use crate::config::load_config;
use crate::error::Result;
use clap::Parser;
use disk_lru_cache::AsyncDiskLruCache;
use std::path::PathBuf;
use tracing::info;
use tracing_subscriber::{prelude::*, EnvFilter};

#[derive(Debug, Parser)]
#[command(author, version, about)]
struct Cli {
    /// Cache directory, overrides CACHE_DIR
    #[arg(long)]
    cache_dir: Option<PathBuf>,

    /// Cache budget in bytes, overrides CACHE_SIZE
    #[arg(long)]
    cache_size: Option<u64>,

    /// Log debug events
    #[arg(short, long)]
    verbose: bool,

    #[command(subcommand)]
    command: Command,
}

#[tokio::main]
async fn main() {
    if let Err(e) = run().await {
        eprintln!("{}", e);
        std::process::exit(1);
    }
}

async fn run() -> Result<()> {
    let cli = Cli::parse();

    // Load configuration from environment
    let mut config = load_config()?;
    if let Some(cache_dir) = cli.cache_dir {
        config.cache_dir = cache_dir;
    }
    if let Some(cache_size) = cli.cache_size {
        config.cache_size = cache_size;
    }

    // Initialize logging
    let level = if cli.verbose { "debug" } else { "info" };
    let env_filter = EnvFilter::from_default_env()
        .add_directive(format!("disk_lru_cache={}", level).parse()?)
        .add_directive(format!("disk_lru_cache_cli={}", level).parse()?);

    // stdout carries command output, logs go to stderr
    if config.json_logs {
        tracing_subscriber::registry()
            .with(env_filter)
            .with(tracing_stackdriver::layer().with_writer(std::io::stderr))
            .init();
    } else {
        tracing_subscriber::fmt()
            .with_env_filter(env_filter)
            .with_writer(std::io::stderr)
            .init();
    };

    info!("Cache dir: {:?}", config.cache_dir);
    info!("Cache size: {} bytes", config.cache_size);

    let cache = AsyncDiskLruCache::create(config.cache_dir, config.cache_size).await?;
    commands::run(&cache, cli.command).await
}
