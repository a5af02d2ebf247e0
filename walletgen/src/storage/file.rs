//! File-backed key-value store
//!
//! One file per key inside a base directory. Writes go through a temporary
//! file followed by a rename so a crash never leaves a half-written value.

use std::fs;
use std::io;
use std::path::{Path, PathBuf};

use tracing::{debug, info};

use crate::error::{Error, Result};
use super::KeyValueStore;

/// Key-value store rooted at a directory
#[derive(Debug, Clone)]
pub struct FileStore {
    root: PathBuf,
}

impl FileStore {
    /// Open (creating if needed) a store rooted at `root`
    pub fn open(root: impl Into<PathBuf>) -> Result<Self> {
        let root = root.into();
        fs::create_dir_all(&root).map_err(|e| {
            Error::Persistence(format!("Failed to create storage directory {}: {}", root.display(), e))
        })?;

        info!("Opened file store at {}", root.display());
        Ok(Self { root })
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    fn path_for(&self, key: &str) -> Result<PathBuf> {
        let valid = !key.is_empty()
            && key.chars().all(|c| c.is_ascii_alphanumeric() || c == '-' || c == '_');
        if !valid {
            return Err(Error::Persistence(format!("Invalid storage key: {:?}", key)));
        }
        Ok(self.root.join(key))
    }
}

impl KeyValueStore for FileStore {
    fn get(&self, key: &str) -> Result<Option<String>> {
        let path = self.path_for(key)?;
        match fs::read_to_string(&path) {
            Ok(value) => Ok(Some(value)),
            Err(e) if e.kind() == io::ErrorKind::NotFound => Ok(None),
            Err(e) => Err(Error::Persistence(format!("Failed to read {}: {}", key, e))),
        }
    }

    fn set(&self, key: &str, value: &str) -> Result<()> {
        let path = self.path_for(key)?;
        let tmp_path = path.with_extension("tmp");

        debug!("Writing storage key: {}", key);
        fs::write(&tmp_path, value.as_bytes())
            .map_err(|e| Error::Persistence(format!("Failed to write {}: {}", key, e)))?;
        fs::rename(&tmp_path, &path)
            .map_err(|e| Error::Persistence(format!("Failed to commit {}: {}", key, e)))
    }

    fn remove(&self, key: &str) -> Result<()> {
        let path = self.path_for(key)?;
        debug!("Removing storage key: {}", key);
        match fs::remove_file(&path) {
            Ok(()) => Ok(()),
            Err(e) if e.kind() == io::ErrorKind::NotFound => Ok(()),
            Err(e) => Err(Error::Persistence(format!("Failed to remove {}: {}", key, e))),
        }
    }
}
