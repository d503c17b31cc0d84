//! In-memory index of cached files and its binary mirror on disk
//!
//! The [`Journal`] is the only source of truth for what the cache holds.
//! The journal file is a snapshot taken at the last [`Journal::write`] and is
//! used solely to rebuild the index on startup.

use crate::codec;
use crate::error::{CacheError, Result};
use crate::storage::Storage;
use crate::types::{sort_most_recent_first, Record};
use chrono::Utc;
use std::collections::{HashMap, HashSet};
use std::fs::{self, File};
use std::io::{self, BufReader, BufWriter, Write};
use std::path::{Path, PathBuf};
use tracing::{debug, info, warn};

pub(crate) fn now_millis() -> i64 {
    Utc::now().timestamp_millis()
}

#[derive(Debug)]
pub struct Journal {
    path: PathBuf,
    records: HashMap<String, Record>,
    /// Sum of the sizes of all records in the map
    total_size: u64,
}

impl Journal {
    pub fn empty(path: impl Into<PathBuf>) -> Self {
        Self {
            path: path.into(),
            records: HashMap::new(),
            total_size: 0,
        }
    }

    /// Rebuild the index from the storage's journal file.
    ///
    /// A missing file is the normal first run. A corrupt file or a format
    /// version mismatch also yields an empty journal instead of an error.
    pub fn read(storage: &dyn Storage) -> Self {
        let path = storage.journal_path();
        let mut journal = Self::empty(&path);

        let file = match File::open(&path) {
            Ok(file) => file,
            Err(e) if e.kind() == io::ErrorKind::NotFound => {
                info!(journal = ?path, "Journal not found and will be created");
                return journal;
            }
            Err(e) => {
                warn!(journal = ?path, error = %e, "Failed to open journal, starting empty");
                return journal;
            }
        };

        match codec::read_journal(&mut BufReader::new(file)) {
            Ok(records) => {
                let sum = records
                    .iter()
                    .try_fold(0u64, |sum, record| sum.checked_add(record.size));
                if sum.is_none() {
                    warn!(journal = ?path, "Journal sizes overflow, starting empty");
                    return journal;
                }
                for record in records {
                    journal.insert(record);
                }
                info!(
                    entries = journal.len(),
                    total_size = journal.total_size,
                    "Journal read"
                );
            }
            Err(e) => {
                warn!(journal = ?path, error = %e, "Failed to read journal, starting empty");
            }
        }

        journal
    }

    /// Persist the full index, replacing the previous journal file.
    pub fn write(&self) -> io::Result<()> {
        let tmp_path = self.tmp_path();
        {
            let mut writer = BufWriter::new(File::create(&tmp_path)?);
            codec::write_journal(&mut writer, self.records.values())?;
            writer.flush()?;
        }
        fs::rename(&tmp_path, &self.path)?;
        debug!(entries = self.len(), "Journal written");
        Ok(())
    }

    /// Insert `record`, evicting least recently used entries until it fits
    /// into `cache_size`.
    ///
    /// A record already stored under the same key is replaced; its backing
    /// file is left to the caller.
    pub fn put(&mut self, record: Record, cache_size: u64, storage: &dyn Storage) -> Result<()> {
        if record.size > cache_size {
            return Err(CacheError::ExceedsCacheSize {
                size: record.size,
                cache_size,
            });
        }
        if let Some(old) = self.records.remove(&record.key) {
            self.total_size -= old.size;
        }
        self.make_room(record.size, cache_size, storage)?;
        self.insert(record);
        Ok(())
    }

    /// Look up `key` and mark it as just used. Returns the refreshed record.
    pub fn get(&mut self, key: &str) -> Option<Record> {
        let record = self.records.get_mut(key)?;
        *record = record.touched(now_millis());
        debug!(key, size = record.size, "Updated access time");
        Some(record.clone())
    }

    /// Look up `key` without touching its access time
    pub fn peek(&self, key: &str) -> Option<&Record> {
        self.records.get(key)
    }

    pub fn delete(&mut self, key: &str) -> Option<Record> {
        let record = self.records.remove(key)?;
        self.total_size -= record.size;
        Some(record)
    }

    pub fn keys(&self) -> HashSet<String> {
        self.records.keys().cloned().collect()
    }

    /// All records, most recently used first
    pub fn records(&self) -> Vec<Record> {
        let mut records: Vec<Record> = self.records.values().cloned().collect();
        sort_most_recent_first(&mut records);
        records
    }

    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    pub fn total_size(&self) -> u64 {
        self.total_size
    }

    /// Current length of the journal file, 0 if it was never written
    pub fn journal_size(&self) -> u64 {
        fs::metadata(&self.path).map(|m| m.len()).unwrap_or(0)
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    fn insert(&mut self, record: Record) {
        self.total_size += record.size;
        debug!(
            key = %record.key,
            size = record.size,
            total_size = self.total_size,
            "Put record"
        );
        if let Some(old) = self.records.insert(record.key.clone(), record) {
            self.total_size -= old.size;
        }
    }

    fn make_room(&mut self, size: u64, cache_size: u64, storage: &dyn Storage) -> Result<()> {
        if self.total_size.saturating_add(size) <= cache_size {
            return Ok(());
        }
        debug!(
            size,
            total_size = self.total_size,
            cache_size,
            "File does not fit, evicting"
        );

        let mut candidates: Vec<Record> = self.records.values().cloned().collect();
        sort_most_recent_first(&mut candidates);

        while self.total_size.saturating_add(size) > cache_size {
            let Some(record) = candidates.pop() else {
                break;
            };
            storage.delete(&record.name)?;
            self.records.remove(&record.key);
            self.total_size -= record.size;
            debug!(
                key = %record.key,
                time = record.time,
                size = record.size,
                total_size = self.total_size,
                "Evicted record"
            );
        }
        Ok(())
    }

    fn tmp_path(&self) -> PathBuf {
        let mut path = self.path.clone().into_os_string();
        path.push(".tmp");
        PathBuf::from(path)
    }
}
