//! Cache types

use chrono::{DateTime, TimeZone, Utc};
use serde::{Deserialize, Serialize};
use std::cmp::Ordering;

/// One cache entry as tracked by the journal.
///
/// Records are never mutated in place: an access produces a new record
/// with the same key, name and size and a fresh `time`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Record {
    pub key: String,
    /// Storage name of the backing file inside the cache root
    pub name: String,
    /// Last access time in epoch milliseconds
    pub time: i64,
    pub size: u64,
}

impl Record {
    pub fn new(key: impl Into<String>, name: impl Into<String>, time: i64, size: u64) -> Self {
        Self {
            key: key.into(),
            name: name.into(),
            time,
            size,
        }
    }

    /// Copy of this record with a new access time
    pub fn touched(&self, time: i64) -> Self {
        Self {
            time,
            ..self.clone()
        }
    }
}

/// Orders records by descending access time, most recently used first.
pub fn most_recent_first(a: &Record, b: &Record) -> Ordering {
    b.time.cmp(&a.time)
}

/// Stable sort into eviction order; the least recently used record ends up last.
pub fn sort_most_recent_first(records: &mut [Record]) {
    records.sort_by(most_recent_first);
}

/// Public snapshot of a cached record
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RecordInfo {
    pub key: String,
    /// Actual file name inside the cache directory
    pub file_name: String,
    pub size: u64,
    /// Epoch millis of the last put or get. Older entries are evicted first.
    pub last_accessed: i64,
}

impl RecordInfo {
    pub fn last_accessed_at(&self) -> Option<DateTime<Utc>> {
        Utc.timestamp_millis_opt(self.last_accessed).single()
    }
}

impl From<&Record> for RecordInfo {
    fn from(record: &Record) -> Self {
        Self {
            key: record.key.clone(),
            file_name: record.name.clone(),
            size: record.size,
            last_accessed: record.time,
        }
    }
}

/// Retention priority of a record, derived from its position in LRU order
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Priority {
    High,
    Medium,
    Low,
}

impl Priority {
    /// Splits `count` records in most-recently-used order into thirds.
    pub fn for_position(index: usize, count: usize) -> Self {
        if count <= 1 || index < count / 3 {
            Priority::High
        } else if index < count * 2 / 3 {
            Priority::Medium
        } else {
            Priority::Low
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum HealthLevel {
    Healthy,
    Warning,
    Critical,
}

/// Statistics about the cache
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct CacheStats {
    pub entries: usize,
    pub cache_size: u64,
    pub used_space: u64,
    pub free_space: u64,
    pub journal_size: u64,
    pub hits: u64,
    pub misses: u64,
}

impl CacheStats {
    pub fn usage_percent(&self) -> f64 {
        if self.cache_size == 0 {
            return 0.0;
        }
        self.used_space as f64 / self.cache_size as f64 * 100.0
    }

    pub fn health(&self) -> HealthLevel {
        let usage = self.usage_percent();
        if usage < 70.0 {
            HealthLevel::Healthy
        } else if usage <= 90.0 {
            HealthLevel::Warning
        } else {
            HealthLevel::Critical
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_most_recent_first_ordering() {
        let older = Record::new("a", "a.txt", 1000, 10);
        let newer = Record::new("b", "b.txt", 2000, 10);

        assert_eq!(most_recent_first(&newer, &older), Ordering::Less);
        assert_eq!(most_recent_first(&older, &newer), Ordering::Greater);
        assert_eq!(
            most_recent_first(&older, &older.touched(1000)),
            Ordering::Equal
        );
    }

    #[test]
    fn test_sort_puts_least_recent_last() {
        let mut records = vec![
            Record::new("mid", "m", 2000, 1),
            Record::new("old", "o", 1000, 1),
            Record::new("new", "n", 3000, 1),
        ];
        sort_most_recent_first(&mut records);

        let keys: Vec<&str> = records.iter().map(|r| r.key.as_str()).collect();
        assert_eq!(keys, vec!["new", "mid", "old"]);
    }

    #[test]
    fn test_touched_keeps_identity() {
        let record = Record::new("key", "abc.jpg", 1000, 42);
        let touched = record.touched(5000);

        assert_eq!(touched.key, "key");
        assert_eq!(touched.name, "abc.jpg");
        assert_eq!(touched.size, 42);
        assert_eq!(touched.time, 5000);
        assert_eq!(record.time, 1000);
    }

    #[test]
    fn test_record_info_from_record() {
        let record = Record::new("key", "abc.jpg", 1_700_000_000_000, 42);
        let info = RecordInfo::from(&record);

        assert_eq!(info.file_name, "abc.jpg");
        assert_eq!(info.last_accessed, 1_700_000_000_000);
        assert_eq!(
            info.last_accessed_at().map(|t| t.timestamp()),
            Some(1_700_000_000)
        );
    }

    #[test]
    fn test_record_info_serialization() {
        let info = RecordInfo {
            key: "photo".to_string(),
            file_name: "deadbeef.png".to_string(),
            size: 12345,
            last_accessed: 99,
        };

        let json = serde_json::to_string(&info).unwrap();
        assert!(json.contains("deadbeef.png"));
        assert!(json.contains("12345"));

        let deserialized: RecordInfo = serde_json::from_str(&json).unwrap();
        assert_eq!(deserialized, info);
    }

    #[test]
    fn test_priority_tiers() {
        assert_eq!(Priority::for_position(0, 1), Priority::High);
        assert_eq!(Priority::for_position(0, 6), Priority::High);
        assert_eq!(Priority::for_position(2, 6), Priority::Medium);
        assert_eq!(Priority::for_position(5, 6), Priority::Low);
    }

    #[test]
    fn test_cache_stats_default() {
        let stats = CacheStats::default();
        assert_eq!(stats.entries, 0);
        assert_eq!(stats.used_space, 0);
        assert_eq!(stats.hits, 0);
        assert_eq!(stats.misses, 0);
        assert_eq!(stats.usage_percent(), 0.0);
    }

    #[test]
    fn test_cache_stats_health() {
        let mut stats = CacheStats {
            cache_size: 100,
            used_space: 50,
            ..Default::default()
        };
        assert_eq!(stats.health(), HealthLevel::Healthy);

        stats.used_space = 80;
        assert_eq!(stats.health(), HealthLevel::Warning);

        stats.used_space = 95;
        assert_eq!(stats.health(), HealthLevel::Critical);
    }
}
