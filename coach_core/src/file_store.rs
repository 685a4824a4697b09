//! File-backed store with locking and atomic replacement.
//!
//! All tables live in one JSON document. A sidecar lock file serializes
//! writers for the whole read-modify-write span of a transaction, and the
//! document is replaced by renaming a fully written temp file over it, so an
//! aborted transaction leaves the previous document untouched.

use crate::store::{Store, Tables};
use crate::{Error, Result};
use fs2::FileExt;
use serde::Serialize;
use std::fs::{File, OpenOptions};
use std::io::{Read, Write};
use std::path::{Path, PathBuf};
use tempfile::NamedTempFile;

pub const STORE_FILE_NAME: &str = "store.json";

/// Store persisted as a JSON document on disk
#[derive(Clone, Debug)]
pub struct FileStore {
    path: PathBuf,
    lock_path: PathBuf,
}

impl FileStore {
    /// Create a store backed by the document at `path`
    pub fn new(path: impl Into<PathBuf>) -> Self {
        let path = path.into();
        let lock_path = path.with_extension("lock");
        Self { path, lock_path }
    }

    /// Create a store using the standard file name inside `data_dir`
    pub fn in_dir(data_dir: &Path) -> Self {
        Self::new(data_dir.join(STORE_FILE_NAME))
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    fn open_lock(&self) -> Result<File> {
        open_lock_file(&self.lock_path)
    }

    /// Load the tables; a missing document is an empty store
    ///
    /// A document that cannot be parsed is an error rather than a reset,
    /// since session history cannot be reconstructed.
    fn load_tables(&self) -> Result<Tables> {
        if !self.path.exists() {
            tracing::debug!("No store file at {:?}, starting empty", self.path);
            return Ok(Tables::default());
        }

        let mut contents = String::new();
        let mut reader = std::io::BufReader::new(File::open(&self.path)?);
        reader.read_to_string(&mut contents)?;

        serde_json::from_str::<Tables>(&contents).map_err(|e| {
            Error::Storage(format!("store file {:?} is corrupt: {}", self.path, e))
        })
    }

    fn save_tables(&self, tables: &Tables) -> Result<()> {
        write_json_atomic(&self.path, tables)?;
        tracing::debug!("Saved store to {:?}", self.path);
        Ok(())
    }
}

/// Open (creating if needed) a sidecar file used only for `fs2` locks
pub(crate) fn open_lock_file(lock_path: &Path) -> Result<File> {
    if let Some(parent) = lock_path.parent() {
        std::fs::create_dir_all(parent)?;
    }
    let file = OpenOptions::new()
        .create(true)
        .read(true)
        .write(true)
        .truncate(false)
        .open(lock_path)?;
    Ok(file)
}

/// Atomically replace the JSON document at `path`:
/// 1. Write to a temp file in the same directory
/// 2. Sync to disk
/// 3. Rename over the original
pub(crate) fn write_json_atomic<T: Serialize>(path: &Path, value: &T) -> Result<()> {
    let parent = path.parent().ok_or_else(|| {
        Error::Storage(format!("path {:?} has no parent directory", path))
    })?;
    std::fs::create_dir_all(parent)?;

    let temp = NamedTempFile::new_in(parent)?;
    {
        let mut writer = std::io::BufWriter::new(temp.as_file());
        serde_json::to_writer(&mut writer, value)?;
        writer.flush()?;
    }
    temp.as_file().sync_all()?;
    temp.persist(path).map_err(|e| Error::Io(e.error))?;
    Ok(())
}

impl Store for FileStore {
    type Repos = Tables;

    fn read<T, F>(&self, f: F) -> Result<T>
    where
        F: FnOnce(&Tables) -> Result<T>,
    {
        let lock = self.open_lock()?;
        lock.lock_shared()?;

        let tables = self.load_tables()?;
        let value = f(&tables)?;

        lock.unlock()?;
        Ok(value)
    }

    fn transaction<T, F>(&self, f: F) -> Result<T>
    where
        F: FnOnce(&mut Tables) -> Result<T>,
    {
        let lock = self.open_lock()?;
        lock.lock_exclusive()?;

        // On any early return the lock is released when `lock` is dropped
        // and the document on disk is left as it was.
        let mut tables = self.load_tables()?;
        let value = f(&mut tables)?;
        self.save_tables(&tables)?;

        lock.unlock()?;
        Ok(value)
    }
}
