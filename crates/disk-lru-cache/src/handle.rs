//! Async access to a [`DiskLruCache`]
//!
//! All cache operations block on filesystem I/O. This handle runs them on
//! tokio's blocking pool so async callers never stall their executor, and
//! caps the number of operations queued there at once.

use crate::cache::DiskLruCache;
use crate::error::{CacheError, Result};
use crate::types::{CacheStats, RecordInfo};
use std::collections::HashSet;
use std::path::PathBuf;
use std::sync::Arc;
use tokio::sync::Semaphore;

pub const DEFAULT_MAX_IN_FLIGHT: usize = 4;

#[derive(Clone)]
pub struct AsyncDiskLruCache {
    inner: Arc<DiskLruCache>,
    permits: Arc<Semaphore>,
}

impl AsyncDiskLruCache {
    pub fn new(cache: DiskLruCache) -> Self {
        Self::with_max_in_flight(cache, DEFAULT_MAX_IN_FLIGHT)
    }

    pub fn with_max_in_flight(cache: DiskLruCache, max_in_flight: usize) -> Self {
        Self {
            inner: Arc::new(cache),
            permits: Arc::new(Semaphore::new(max_in_flight.max(1))),
        }
    }

    /// Open a cache without blocking the calling task
    pub async fn create(root: impl Into<PathBuf>, cache_size: u64) -> Result<Self> {
        let root = root.into();
        let cache =
            tokio::task::spawn_blocking(move || DiskLruCache::create(root, cache_size)).await??;
        Ok(Self::new(cache))
    }

    /// The underlying synchronous cache
    pub fn inner(&self) -> &Arc<DiskLruCache> {
        &self.inner
    }

    pub async fn put(&self, key: impl Into<String>, source: impl Into<PathBuf>) -> Result<PathBuf> {
        let key = key.into();
        let source = source.into();
        self.run(move |cache| cache.put(&key, source)).await
    }

    pub async fn get(&self, key: impl Into<String>) -> Result<Option<PathBuf>> {
        let key = key.into();
        self.run(move |cache| cache.get(&key)).await
    }

    pub async fn delete(&self, key: impl Into<String>) -> Result<()> {
        let key = key.into();
        self.run(move |cache| cache.delete(&key)).await
    }

    pub async fn clear(&self) -> Result<()> {
        self.run(|cache| cache.clear()).await
    }

    pub async fn key_set(&self) -> Result<HashSet<String>> {
        self.run(|cache| Ok(cache.key_set())).await
    }

    pub async fn records_info(&self) -> Result<Vec<RecordInfo>> {
        self.run(|cache| Ok(cache.records_info())).await
    }

    pub async fn stats(&self) -> Result<CacheStats> {
        self.run(|cache| Ok(cache.stats())).await
    }

    async fn run<T, F>(&self, op: F) -> Result<T>
    where
        T: Send + 'static,
        F: FnOnce(&DiskLruCache) -> Result<T> + Send + 'static,
    {
        let permit = Arc::clone(&self.permits)
            .acquire_owned()
            .await
            .map_err(|e| CacheError::Background(e.to_string()))?;
        let cache = Arc::clone(&self.inner);
        // The permit lives as long as the blocking work, even if the caller
        // stops waiting
        tokio::task::spawn_blocking(move || {
            let _permit = permit;
            op(&cache)
        })
        .await?
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;
    use tempfile::tempdir;

    #[tokio::test]
    async fn test_put_and_get() {
        let dir = tempdir().unwrap();
        let cache = AsyncDiskLruCache::create(dir.path().join("cache"), 1024)
            .await
            .unwrap();
        let source = dir.path().join("hello.txt");
        fs::write(&source, b"Hello, world!").unwrap();

        let stored = cache.put("greeting", &source).await.unwrap();
        let found = cache.get("greeting").await.unwrap();

        assert_eq!(found, Some(stored.clone()));
        assert_eq!(fs::read(stored).unwrap(), b"Hello, world!");
    }

    #[tokio::test]
    async fn test_miss_and_delete_errors() {
        let dir = tempdir().unwrap();
        let cache = AsyncDiskLruCache::create(dir.path(), 1024).await.unwrap();

        assert!(cache.get("missing").await.unwrap().is_none());
        assert!(matches!(
            cache.delete("missing").await,
            Err(CacheError::RecordNotFound(_))
        ));
    }

    #[tokio::test]
    async fn test_create_rejects_zero_size() {
        let dir = tempdir().unwrap();
        let result = AsyncDiskLruCache::create(dir.path(), 0).await;
        assert!(matches!(result, Err(CacheError::InvalidArgument(_))));
    }

    #[tokio::test]
    async fn test_parallel_puts_bounded() {
        let dir = tempdir().unwrap();
        let cache = AsyncDiskLruCache::with_max_in_flight(
            DiskLruCache::create(dir.path().join("cache"), 10_000).unwrap(),
            2,
        );

        let mut tasks = Vec::new();
        for i in 0..8 {
            let source = dir.path().join(format!("{}.bin", i));
            fs::write(&source, vec![0u8; 100]).unwrap();
            let cache = cache.clone();
            tasks.push(tokio::spawn(async move {
                cache.put(format!("key{}", i), source).await
            }));
        }
        for task in tasks {
            task.await.unwrap().unwrap();
        }

        let stats = cache.stats().await.unwrap();
        assert_eq!(stats.entries, 8);
        assert_eq!(stats.used_space, 800);
        assert_eq!(cache.key_set().await.unwrap().len(), 8);

        cache.clear().await.unwrap();
        assert!(cache.records_info().await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_permit_held_until_blocking_work_ends() {
        let dir = tempdir().unwrap();
        let cache = AsyncDiskLruCache::with_max_in_flight(
            DiskLruCache::create(dir.path(), 1024).unwrap(),
            1,
        );
        let (started_tx, started_rx) = std::sync::mpsc::channel();
        let (release_tx, release_rx) = std::sync::mpsc::channel::<()>();

        let pending = {
            let cache = cache.clone();
            tokio::spawn(async move {
                cache
                    .run(move |inner| {
                        started_tx.send(()).unwrap();
                        release_rx.recv().unwrap();
                        Ok(inner.cache_size())
                    })
                    .await
            })
        };
        tokio::task::spawn_blocking(move || started_rx.recv())
            .await
            .unwrap()
            .unwrap();

        // The caller gives up, but the blocking work is still running
        pending.abort();
        let _ = pending.await;
        assert_eq!(cache.permits.available_permits(), 0);

        release_tx.send(()).unwrap();
        drop(cache.permits.acquire().await.unwrap());
        assert_eq!(cache.permits.available_permits(), 1);
        assert!(cache.key_set().await.unwrap().is_empty());
    }
}
