//! Error types for the disk LRU cache

use std::fmt;

#[derive(Debug)]
pub enum CacheError {
    InvalidArgument(String),
    RecordNotFound(String),
    ExceedsCacheSize { size: u64, cache_size: u64 },
    Io(Box<std::io::Error>),
    Background(String),
}

impl fmt::Display for CacheError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            CacheError::InvalidArgument(msg) => write!(f, "Invalid argument: {}", msg),
            CacheError::RecordNotFound(key) => write!(f, "Record not found: {}", key),
            CacheError::ExceedsCacheSize { size, cache_size } => write!(
                f,
                "File size {} bytes exceeds cache size {} bytes",
                size, cache_size
            ),
            CacheError::Io(err) => write!(f, "IO error: {}", err),
            CacheError::Background(msg) => write!(f, "Background task error: {}", msg),
        }
    }
}

impl std::error::Error for CacheError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            CacheError::Io(err) => Some(err.as_ref()),
            _ => None,
        }
    }
}

impl From<std::io::Error> for CacheError {
    fn from(err: std::io::Error) -> Self {
        CacheError::Io(Box::new(err))
    }
}

impl From<tokio::task::JoinError> for CacheError {
    fn from(err: tokio::task::JoinError) -> Self {
        CacheError::Background(err.to_string())
    }
}

pub type Result<T> = std::result::Result<T, CacheError>;
