//! Error types for the cache CLI

use disk_lru_cache::CacheError;
use std::fmt;

#[derive(Debug)]
pub enum CliError {
    Cache(CacheError),
    Io(Box<std::io::Error>),
    Json(serde_json::Error),
    Config(String),
    NotCached(String),
}

impl fmt::Display for CliError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            CliError::Cache(err) => write!(f, "Cache error: {}", err),
            CliError::Io(err) => write!(f, "IO error: {}", err),
            CliError::Json(err) => write!(f, "JSON error: {}", err),
            CliError::Config(msg) => write!(f, "Configuration error: {}", msg),
            CliError::NotCached(key) => write!(f, "No cached file for key {}", key),
        }
    }
}

impl std::error::Error for CliError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            CliError::Cache(err) => Some(err),
            CliError::Io(err) => Some(err.as_ref()),
            CliError::Json(err) => Some(err),
            _ => None,
        }
    }
}

impl From<CacheError> for CliError {
    fn from(err: CacheError) -> Self {
        CliError::Cache(err)
    }
}

impl From<std::io::Error> for CliError {
    fn from(err: std::io::Error) -> Self {
        CliError::Io(Box::new(err))
    }
}

impl From<serde_json::Error> for CliError {
    fn from(err: serde_json::Error) -> Self {
        CliError::Json(err)
    }
}

impl From<tokio::task::JoinError> for CliError {
    fn from(err: tokio::task::JoinError) -> Self {
        CliError::Cache(CacheError::from(err))
    }
}

impl From<tracing_subscriber::filter::ParseError> for CliError {
    fn from(err: tracing_subscriber::filter::ParseError) -> Self {
        CliError::Config(err.to_string())
    }
}

pub type Result<T> = std::result::Result<T, CliError>;
