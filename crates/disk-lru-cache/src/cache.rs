//! Disk LRU cache facade
//!
//! Every operation runs under one lock that covers both the journal access
//! and the journal flush, so callers never observe the in-memory index and
//! the journal file out of step.

use crate::codec::MAX_STRING_LEN;
use crate::error::{CacheError, Result};
use crate::journal::{now_millis, Journal};
use crate::naming::storage_name;
use crate::storage::{DirStorage, Storage};
use crate::types::{CacheStats, Record, RecordInfo};
use parking_lot::Mutex;
use std::collections::HashSet;
use std::fs;
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicU64, Ordering};
use tracing::{debug, info, warn};

/// A size-bounded file cache that evicts least recently used entries
pub struct DiskLruCache {
    storage: Box<dyn Storage>,
    journal: Mutex<Journal>,
    /// Maximum total size of cached files in bytes
    cache_size: u64,
    hits: AtomicU64,
    misses: AtomicU64,
}

impl DiskLruCache {
    /// Open the cache rooted at `root`, creating the directory if needed and
    /// restoring the index from its journal.
    pub fn create(root: impl Into<PathBuf>, cache_size: u64) -> Result<Self> {
        Self::with_storage(DirStorage::new(root), cache_size)
    }

    pub fn with_storage<S: Storage + 'static>(storage: S, cache_size: u64) -> Result<Self> {
        if cache_size == 0 {
            return Err(CacheError::InvalidArgument(
                "cache size must be positive".to_string(),
            ));
        }
        storage.prepare()?;
        let journal = Journal::read(&storage);
        info!(
            journal = ?journal.path(),
            entries = journal.len(),
            used_space = journal.total_size(),
            cache_size,
            "Cache opened"
        );

        Ok(Self {
            storage: Box::new(storage),
            journal: Mutex::new(journal),
            cache_size,
            hits: AtomicU64::new(0),
            misses: AtomicU64::new(0),
        })
    }

    /// Move `source` into the cache under `key` and return its new path.
    ///
    /// The source file is consumed on success. If the file cannot be moved
    /// into storage the key is not added, but entries evicted to make room
    /// for it stay evicted.
    pub fn put(&self, key: &str, source: impl AsRef<Path>) -> Result<PathBuf> {
        validate_key(key)?;
        let source = source.as_ref();
        let metadata = fs::metadata(source)?;
        if !metadata.is_file() {
            return Err(CacheError::InvalidArgument(format!(
                "{} is not a regular file",
                source.display()
            )));
        }
        let size = metadata.len();
        if size > self.cache_size {
            return Err(CacheError::ExceedsCacheSize {
                size,
                cache_size: self.cache_size,
            });
        }

        let name = storage_name(key, source);
        let record = Record::new(key, name.clone(), now_millis(), size);

        let mut journal = self.journal.lock();

        // The old file may live under another name if the extension changed
        if let Some(old) = journal.delete(key) {
            debug!(key, name = %old.name, "Replacing cached file");
            if let Err(e) = self.storage.delete(&old.name) {
                return Err(self.abort(&journal, e.into()));
            }
        }

        if let Err(e) = journal.put(record, self.cache_size, self.storage.as_ref()) {
            return Err(self.abort(&journal, e));
        }

        let path = match self.storage.accept(source, &name) {
            Ok(path) => path,
            Err(e) => {
                journal.delete(key);
                return Err(self.abort(&journal, e.into()));
            }
        };

        journal.write()?;
        Ok(path)
    }

    /// Path of the file cached under `key`, marking it as just used.
    ///
    /// Returns `None` both for unknown keys and for entries whose file was
    /// removed behind the cache's back; the latter are dropped from the index.
    pub fn get(&self, key: &str) -> Result<Option<PathBuf>> {
        validate_key(key)?;
        let mut journal = self.journal.lock();

        let path = match journal.get(key) {
            Some(record) if self.storage.exists(&record.name) => {
                self.hits.fetch_add(1, Ordering::Relaxed);
                Some(self.storage.resolve(&record.name))
            }
            Some(record) => {
                warn!(key, name = %record.name, "Cached file is missing, removing entry");
                journal.delete(key);
                self.misses.fetch_add(1, Ordering::Relaxed);
                None
            }
            None => {
                debug!(key, "No requested file in cache");
                self.misses.fetch_add(1, Ordering::Relaxed);
                None
            }
        };

        journal.write()?;
        Ok(path)
    }

    pub fn delete(&self, key: &str) -> Result<()> {
        let mut journal = self.journal.lock();
        let record = journal
            .delete(key)
            .ok_or_else(|| CacheError::RecordNotFound(key.to_string()))?;
        journal.write()?;
        self.storage.delete(&record.name)?;
        debug!(key, size = record.size, "Deleted record");
        Ok(())
    }

    /// Remove every entry and its file
    pub fn clear(&self) -> Result<()> {
        let mut journal = self.journal.lock();
        for key in journal.keys() {
            let Some(record) = journal.delete(&key) else {
                continue;
            };
            if let Err(e) = self.storage.delete(&record.name) {
                return Err(self.abort(&journal, e.into()));
            }
        }
        journal.write()?;
        info!("Cache cleared");
        Ok(())
    }

    pub fn key_set(&self) -> HashSet<String> {
        self.journal.lock().keys()
    }

    pub fn cache_size(&self) -> u64 {
        self.cache_size
    }

    pub fn used_space(&self) -> u64 {
        self.journal.lock().total_size()
    }

    pub fn free_space(&self) -> u64 {
        self.cache_size.saturating_sub(self.used_space())
    }

    pub fn journal_size(&self) -> u64 {
        self.journal.lock().journal_size()
    }

    /// Snapshot of one record. Does not count as an access.
    pub fn record_info(&self, key: &str) -> Option<RecordInfo> {
        self.journal.lock().peek(key).map(RecordInfo::from)
    }

    /// All records, most recently used first. Does not count as an access.
    pub fn records_info(&self) -> Vec<RecordInfo> {
        self.journal
            .lock()
            .records()
            .iter()
            .map(RecordInfo::from)
            .collect()
    }

    pub fn stats(&self) -> CacheStats {
        let journal = self.journal.lock();
        let used_space = journal.total_size();
        CacheStats {
            entries: journal.len(),
            cache_size: self.cache_size,
            used_space,
            free_space: self.cache_size.saturating_sub(used_space),
            journal_size: journal.journal_size(),
            hits: self.hits.load(Ordering::Relaxed),
            misses: self.misses.load(Ordering::Relaxed),
        }
    }

    /// Persist whatever state a failed operation left behind, then hand back
    /// the original error.
    fn abort(&self, journal: &Journal, err: CacheError) -> CacheError {
        if let Err(e) = journal.write() {
            warn!(error = %e, "Failed to write journal");
        }
        err
    }
}

fn validate_key(key: &str) -> Result<()> {
    if key.is_empty() {
        return Err(CacheError::InvalidArgument(
            "key must not be empty".to_string(),
        ));
    }
    if key.len() > MAX_STRING_LEN {
        return Err(CacheError::InvalidArgument(format!(
            "key is {} bytes, at most {} allowed",
            key.len(),
            MAX_STRING_LEN
        )));
    }
    Ok(())
}
