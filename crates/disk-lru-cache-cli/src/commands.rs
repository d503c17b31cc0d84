//! CLI subcommands

use crate::demo::{create_random_file, random_key, KEY_LENGTH};
use crate::error::{CliError, Result};
use clap::Subcommand;
use disk_lru_cache::{
    AsyncDiskLruCache, CacheError, CacheStats, HealthLevel, Priority, RecordInfo,
};
use serde::Serialize;
use std::fs;
use std::path::PathBuf;
use tracing::{info, warn};

#[derive(Debug, Subcommand)]
pub enum Command {
    /// Move FILE into the cache under KEY
    Put {
        key: String,
        file: PathBuf,
        /// Copy the file instead of moving it
        #[arg(long)]
        copy: bool,
    },
    /// Print the cached path for KEY
    Get { key: String },
    /// Remove KEY and its file
    Delete { key: String },
    /// Remove every entry
    Clear,
    /// Print all keys
    Keys,
    /// Print all records as JSON, most recently used first
    List,
    /// Print cache statistics as JSON
    Stats,
    /// Put randomly generated files under random keys
    Fill {
        #[arg(short, long, default_value_t = 10)]
        count: usize,
    },
}

/// A record with its retention priority
#[derive(Debug, Serialize)]
pub struct ListedRecord {
    #[serde(flatten)]
    pub info: RecordInfo,
    pub priority: Priority,
}

#[derive(Debug, Serialize)]
pub struct StatsReport {
    #[serde(flatten)]
    pub stats: CacheStats,
    pub usage_percent: f64,
    pub health: HealthLevel,
}

pub fn list_records(records: Vec<RecordInfo>) -> Vec<ListedRecord> {
    let count = records.len();
    records
        .into_iter()
        .enumerate()
        .map(|(index, info)| ListedRecord {
            info,
            priority: Priority::for_position(index, count),
        })
        .collect()
}

pub fn stats_report(stats: CacheStats) -> StatsReport {
    StatsReport {
        usage_percent: stats.usage_percent(),
        health: stats.health(),
        stats,
    }
}

pub async fn run(cache: &AsyncDiskLruCache, command: Command) -> Result<()> {
    match command {
        Command::Put { key, file, copy } => {
            let path = if copy {
                // Stage a copy with the same file name so the extension survives
                let staging = tempfile::tempdir()?;
                let file_name = file
                    .file_name()
                    .ok_or_else(|| CliError::Config(format!("not a file: {:?}", file)))?;
                let staged = staging.path().join(file_name);
                fs::copy(&file, &staged)?;
                cache.put(key, staged).await?
            } else {
                cache.put(key, file).await?
            };
            println!("{}", path.display());
        }
        Command::Get { key } => match cache.get(key.clone()).await? {
            Some(path) => println!("{}", path.display()),
            None => return Err(CliError::NotCached(key)),
        },
        Command::Delete { key } => {
            cache.delete(key).await?;
        }
        Command::Clear => {
            cache.clear().await?;
        }
        Command::Keys => {
            let mut keys: Vec<String> = cache.key_set().await?.into_iter().collect();
            keys.sort();
            for key in keys {
                println!("{}", key);
            }
        }
        Command::List => {
            let records = list_records(cache.records_info().await?);
            println!("{}", serde_json::to_string_pretty(&records)?);
        }
        Command::Stats => {
            let report = stats_report(cache.stats().await?);
            println!("{}", serde_json::to_string_pretty(&report)?);
        }
        Command::Fill { count } => fill(cache, count).await?,
    }
    Ok(())
}

async fn fill(cache: &AsyncDiskLruCache, count: usize) -> Result<()> {
    let staging = tempfile::tempdir()?;

    for _ in 0..count {
        let dir = staging.path().to_path_buf();
        let (key, file) = tokio::task::spawn_blocking(move || {
            let mut rng = rand::rng();
            create_random_file(&mut rng, &dir).map(|file| (random_key(&mut rng, KEY_LENGTH), file))
        })
        .await??;

        match cache.put(key.clone(), file).await {
            Ok(path) => info!(key = %key, path = ?path, "Added demo file"),
            Err(CacheError::ExceedsCacheSize { size, cache_size }) => {
                warn!(key = %key, size, cache_size, "Demo file does not fit, skipping");
            }
            Err(e) => return Err(e.into()),
        }
    }

    let stats = cache.stats().await?;
    info!(
        entries = stats.entries,
        used_space = stats.used_space,
        free_space = stats.free_space,
        "Fill complete"
    );
    Ok(())
}
