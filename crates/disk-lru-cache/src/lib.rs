//! Disk-backed LRU cache for files
//!
//! Files are moved into a flat cache directory under a name derived from
//! their key. An in-memory index tracks size and last access of every entry
//! and evicts the least recently used files once the byte budget is
//! exceeded. The index is mirrored to a binary journal so it survives
//! restarts; an unreadable journal starts the cache empty.

mod cache;
pub mod codec;
mod error;
mod handle;
pub mod journal;
pub mod naming;
pub mod storage;
mod types;

pub use cache::DiskLruCache;
pub use error::{CacheError, Result};
pub use handle::{AsyncDiskLruCache, DEFAULT_MAX_IN_FLIGHT};
pub use journal::Journal;
pub use storage::{DirStorage, Storage, JOURNAL_FILE_NAME};
pub use types::{
    most_recent_first, sort_most_recent_first, CacheStats, HealthLevel, Priority, Record,
    RecordInfo,
};
