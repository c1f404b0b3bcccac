//! Where an index lives.
//!
//! An index is either held in memory or stored in a directory on disk. Either way the
//! location hands out Tantivy directories and owns the storage-level housekeeping: checking
//! for an index, clearing a stale writer lock and removing every stored file.

use std::{
    fs,
    path::{Path, PathBuf},
};

use tantivy::{
    Index, TantivyError,
    directory::{
        Directory, INDEX_WRITER_LOCK, MmapDirectory, RamDirectory,
        error::{DeleteError, OpenReadError},
    },
};
use tracing::debug;

use crate::IndexError;

/// Files that make a directory look like an index.
const INDEX_MARKER_FILES: [&str; 2] = ["meta.json", MANAGED_FILE];

/// JSON list of every file the index created.
const MANAGED_FILE: &str = ".managed.json";

/// Storage location of an index.
#[derive(Debug, Clone)]
pub enum IndexLocation {
    /// Volatile storage shared by every clone of the location.
    InMemory(RamDirectory),
    /// A directory on disk.
    OnDisk(PathBuf),
}

impl IndexLocation {
    /// Creates an empty in-memory location.
    pub fn in_memory() -> Self {
        Self::InMemory(RamDirectory::create())
    }

    /// Creates a location backed by `path`.
    pub fn on_disk(path: impl Into<PathBuf>) -> Self {
        Self::OnDisk(path.into())
    }

    /// Path used in messages.
    pub fn display_path(&self) -> PathBuf {
        match self {
            Self::InMemory(_) => PathBuf::from("<memory>"),
            Self::OnDisk(path) => path.clone(),
        }
    }

    /// Opens the Tantivy directory, creating the on-disk folder when needed.
    pub fn directory(&self) -> Result<Box<dyn Directory>, IndexError> {
        match self {
            Self::InMemory(ram) => Ok(Box::new(ram.clone())),
            Self::OnDisk(path) => {
                fs::create_dir_all(path)?;
                let dir = MmapDirectory::open(path).map_err(|e| {
                    let err: TantivyError = e.into();
                    IndexError::open_index(path.clone(), &err)
                })?;
                Ok(Box::new(dir))
            }
        }
    }

    /// Returns true if an index has been created here.
    pub fn exists(&self) -> Result<bool, IndexError> {
        if let Self::OnDisk(path) = self
            && !path.is_dir()
        {
            return Ok(false);
        }
        let directory = self.directory()?;
        Index::exists(directory.as_ref()).map_err(|e| IndexError::Storage(e.to_string()))
    }

    /// Clears a writer lock left behind by a crashed writer.
    ///
    /// Acquires the lock and drops it immediately. Fails with [`IndexError::Locked`] when a
    /// live writer holds it.
    pub fn release_stale_lock(&self) -> Result<(), IndexError> {
        let directory = self.directory()?;
        let lock = directory
            .acquire_lock(&INDEX_WRITER_LOCK)
            .map_err(|e| IndexError::Locked(e.to_string()))?;
        drop(lock);
        debug!(location = %self.display_path().display(), "writer lock is free");
        Ok(())
    }

    /// Removes every stored file. The writer must be closed.
    pub fn purge(&self) -> Result<(), IndexError> {
        match self {
            Self::InMemory(ram) => {
                let mut files = managed_files(ram)?;
                files.extend(INDEX_MARKER_FILES.map(PathBuf::from));
                for file in &files {
                    match ram.delete(file) {
                        Ok(()) | Err(DeleteError::FileDoesNotExist(_)) => {}
                        Err(err) => return Err(IndexError::Storage(err.to_string())),
                    }
                }
                debug!(files = files.len(), "purged in-memory index");
                Ok(())
            }
            Self::OnDisk(path) => {
                if !path.is_dir() {
                    return Ok(());
                }
                for entry in fs::read_dir(path)? {
                    let entry = entry?;
                    if entry.file_type()?.is_dir() {
                        fs::remove_dir_all(entry.path())?;
                    } else {
                        fs::remove_file(entry.path())?;
                    }
                }
                Ok(())
            }
        }
    }
}

/// Reads the list of files the index created; empty when there is no list.
fn managed_files(directory: &dyn Directory) -> Result<Vec<PathBuf>, IndexError> {
    let bytes = match directory.atomic_read(Path::new(MANAGED_FILE)) {
        Ok(bytes) => bytes,
        Err(OpenReadError::FileDoesNotExist(_)) => return Ok(Vec::new()),
        Err(err) => return Err(IndexError::Storage(err.to_string())),
    };
    serde_json::from_slice(&bytes)
        .map_err(|e| IndexError::Storage(format!("failed to parse {MANAGED_FILE}: {e}")))
}

#[cfg(test)]
mod test {
    use tempfile::TempDir;

    use super::*;
    use crate::context::{IndexContext, OpenMode};

    #[test]
    fn missing_directory_is_not_an_index() {
        let temp = TempDir::new().unwrap();
        let location = IndexLocation::on_disk(temp.path().join("absent"));
        assert!(!location.exists().unwrap());
        assert!(!temp.path().join("absent").exists());
    }

    #[test]
    fn created_index_exists_until_purged() {
        let temp = TempDir::new().unwrap();
        let location = IndexLocation::on_disk(temp.path().join("index"));
        IndexContext::default()
            .open_index(&location, OpenMode::OpenOrCreate)
            .unwrap();
        assert!(location.exists().unwrap());

        location.purge().unwrap();
        assert!(!location.exists().unwrap());
        assert_eq!(fs::read_dir(temp.path().join("index")).unwrap().count(), 0);
    }

    #[test]
    fn in_memory_purge() {
        let location = IndexLocation::in_memory();
        assert!(!location.exists().unwrap());
        IndexContext::default()
            .open_index(&location, OpenMode::OpenOrCreate)
            .unwrap();
        assert!(location.clone().exists().unwrap());

        location.purge().unwrap();
        assert!(!location.exists().unwrap());
        location.purge().unwrap();
    }

    #[test]
    fn in_memory_purge_removes_segment_files() {
        let location = IndexLocation::in_memory();
        let context = IndexContext::default();
        let index = context
            .open_index(&location, OpenMode::OpenOrCreate)
            .unwrap();
        let mut writer: tantivy::IndexWriter = index.writer(15_000_000).unwrap();
        writer
            .add_document(tantivy::doc!(context.schema().file => "/core/a.rs"))
            .unwrap();
        writer.commit().unwrap();
        drop(writer);

        let IndexLocation::InMemory(ram) = &location else {
            panic!("expected an in-memory location");
        };
        let files = managed_files(ram).unwrap();
        assert!(files.iter().any(|file| file.extension().is_some_and(|ext| ext == "idx")));

        location.purge().unwrap();
        for file in &files {
            assert!(!ram.exists(file).unwrap(), "{} survived", file.display());
        }
        assert!(managed_files(ram).unwrap().is_empty());
    }

    #[test]
    fn stale_lock_file_is_released() {
        let temp = TempDir::new().unwrap();
        fs::write(temp.path().join(".tantivy-writer.lock"), b"").unwrap();
        let location = IndexLocation::on_disk(temp.path());
        location.release_stale_lock().unwrap();
    }

    #[test]
    fn held_lock_is_reported() {
        let location = IndexLocation::in_memory();
        let index = IndexContext::default()
            .open_index(&location, OpenMode::OpenOrCreate)
            .unwrap();
        let writer: tantivy::IndexWriter = index.writer(15_000_000).unwrap();

        let err = location.release_stale_lock().unwrap_err();
        assert!(matches!(err, IndexError::Locked(_)));

        drop(writer);
        location.release_stale_lock().unwrap();
    }
}
