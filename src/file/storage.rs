//! On-disk blob storage.
//!
//! Blobs live at `{root}/{folder_id}/{stored_name}`. Stored names are
//! opaque UUIDs with the original extension preserved, so original
//! filenames never appear on disk and collisions cannot occur.

use std::fs;
use std::path::{Path, PathBuf};

use tracing::warn;
use uuid::Uuid;

use crate::{CoveError, Result};

/// Stores file blobs under a root directory, one subdirectory per folder.
#[derive(Debug, Clone)]
pub struct FileStorage {
    root: PathBuf,
}

impl FileStorage {
    /// Create storage rooted at the given directory.
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    /// The storage root.
    pub fn root(&self) -> &Path {
        &self.root
    }

    /// Generate an opaque stored name, keeping the original extension.
    pub fn stored_name_for(original_name: &str) -> String {
        let id = Uuid::new_v4();
        match Path::new(original_name).extension().and_then(|e| e.to_str()) {
            Some(ext) if !ext.is_empty() => format!("{id}.{}", ext.to_lowercase()),
            _ => id.to_string(),
        }
    }

    /// Path of a blob.
    pub fn path_for(&self, folder_id: i64, stored_name: &str) -> PathBuf {
        self.root.join(folder_id.to_string()).join(stored_name)
    }

    /// Write a blob, creating the folder directory as needed.
    pub fn save(&self, folder_id: i64, stored_name: &str, data: &[u8]) -> Result<PathBuf> {
        let dir = self.root.join(folder_id.to_string());
        fs::create_dir_all(&dir)?;
        let path = dir.join(stored_name);
        fs::write(&path, data)?;
        Ok(path)
    }

    /// Read a blob.
    pub fn load(&self, folder_id: i64, stored_name: &str) -> Result<Vec<u8>> {
        let path = self.path_for(folder_id, stored_name);
        if !path.exists() {
            return Err(CoveError::NotFound("file blob".to_string()));
        }
        Ok(fs::read(path)?)
    }

    /// Delete a blob. Returns false if it was already gone.
    pub fn delete(&self, folder_id: i64, stored_name: &str) -> Result<bool> {
        let path = self.path_for(folder_id, stored_name);
        if !path.exists() {
            return Ok(false);
        }
        fs::remove_file(path)?;
        Ok(true)
    }

    /// Move a blob between folder directories.
    pub fn relocate(&self, from_folder: i64, to_folder: i64, stored_name: &str) -> Result<()> {
        let from = self.path_for(from_folder, stored_name);
        let dir = self.root.join(to_folder.to_string());
        fs::create_dir_all(&dir)?;
        fs::rename(from, dir.join(stored_name))?;
        Ok(())
    }

    /// Best-effort removal of a folder's directory.
    ///
    /// Only succeeds when the directory is empty; leftovers are logged and
    /// left in place.
    pub fn remove_folder_dir(&self, folder_id: i64) {
        let dir = self.root.join(folder_id.to_string());
        if !dir.exists() {
            return;
        }
        if let Err(e) = fs::remove_dir(&dir) {
            warn!(folder_id, error = %e, "could not remove folder directory");
        }
    }
}
