//! Configuration loaded from the environment

use crate::error::{CliError, Result};
use std::path::PathBuf;
use std::str::FromStr;

/// Configuration for the cache CLI
#[derive(Debug, Clone, PartialEq)]
pub struct CliConfig {
    pub cache_dir: PathBuf,
    pub cache_size: u64,
    pub json_logs: bool,
}

impl Default for CliConfig {
    fn default() -> Self {
        Self {
            cache_dir: PathBuf::from("./cache/files"),
            cache_size: 10 * 1024 * 1024, // 10MB
            json_logs: false,
        }
    }
}

pub fn load_config() -> Result<CliConfig> {
    config_from(|name| std::env::var(name).ok())
}

fn config_from<F>(lookup: F) -> Result<CliConfig>
where
    F: Fn(&str) -> Option<String>,
{
    let defaults = CliConfig::default();

    let cache_dir = lookup("CACHE_DIR")
        .map(PathBuf::from)
        .unwrap_or(defaults.cache_dir);

    let cache_size = parse_var(&lookup, "CACHE_SIZE")?.unwrap_or(defaults.cache_size);

    // Use JSON format for GCP Cloud Logging when LOG_FORMAT=json
    let json_logs = lookup("LOG_FORMAT").map(|v| v == "json").unwrap_or(false);

    Ok(CliConfig {
        cache_dir,
        cache_size,
        json_logs,
    })
}

fn parse_var<F, T>(lookup: &F, name: &str) -> Result<Option<T>>
where
    F: Fn(&str) -> Option<String>,
    T: FromStr,
{
    match lookup(name) {
        Some(raw) => raw
            .trim()
            .parse::<T>()
            .map(Some)
            .map_err(|_| CliError::Config(format!("invalid {}: {:?}", name, raw))),
        None => Ok(None),
    }
}
