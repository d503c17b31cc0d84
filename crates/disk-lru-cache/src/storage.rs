//! File storage for cache entries
//!
//! A [`Storage`] maps storage names to files under a single root directory.
//! It holds no state besides the root, so every call recomputes its paths.

use std::fs;
use std::io;
use std::path::{Path, PathBuf};
use tracing::{debug, warn};

/// Well-known name of the journal file inside the cache root
pub const JOURNAL_FILE_NAME: &str = "journal.bin";

pub trait Storage: Send + Sync {
    /// Path of the journal file
    fn journal_path(&self) -> PathBuf;

    /// Ensure the root directory exists
    fn prepare(&self) -> io::Result<()>;

    /// Path for a storage name. Does not touch the filesystem.
    fn resolve(&self, name: &str) -> PathBuf;

    /// Move `source` into storage under `name`, replacing any existing file.
    fn accept(&self, source: &Path, name: &str) -> io::Result<PathBuf>;

    fn exists(&self, name: &str) -> bool;

    /// Remove the file for `name`. Absent files are not an error.
    fn delete(&self, name: &str) -> io::Result<()>;
}

/// Flat directory storage
#[derive(Debug, Clone)]
pub struct DirStorage {
    root: PathBuf,
}

impl DirStorage {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    pub fn root(&self) -> &Path {
        &self.root
    }
}

impl Storage for DirStorage {
    fn journal_path(&self) -> PathBuf {
        self.root.join(JOURNAL_FILE_NAME)
    }

    fn prepare(&self) -> io::Result<()> {
        fs::create_dir_all(&self.root)
    }

    fn resolve(&self, name: &str) -> PathBuf {
        self.root.join(name)
    }

    fn accept(&self, source: &Path, name: &str) -> io::Result<PathBuf> {
        self.prepare()?;

        let target = self.resolve(name);
        if target.exists() {
            fs::remove_file(&target)?;
        }

        if let Err(e) = fs::rename(source, &target) {
            // Rename fails across filesystems; fall back to copy + delete
            debug!(source = ?source, error = %e, "Rename failed, copying instead");
            fs::copy(source, &target)?;
            if let Err(e) = fs::remove_file(source) {
                warn!(source = ?source, error = %e, "Failed to remove source after copy");
            }
        }

        Ok(target)
    }

    fn exists(&self, name: &str) -> bool {
        self.resolve(name).exists()
    }

    fn delete(&self, name: &str) -> io::Result<()> {
        match fs::remove_file(self.resolve(name)) {
            Ok(()) => Ok(()),
            Err(e) if e.kind() == io::ErrorKind::NotFound => Ok(()),
            Err(e) => Err(e),
        }
    }
}
