//! File-based BookStatusRepository implementation.

use std::fs;
use std::io::ErrorKind;
use std::path::{Path, PathBuf};

use store_core::BookShelf;

use crate::repository::{BookStatusRepository, Result};

/// File-based implementation of BookStatusRepository.
///
/// # File Format
///
/// The shelf is stored as a single JSON array of seven status tags:
///
/// ```text
/// ["active","active","inactive","locked","locked","locked","locked"]
/// ```
pub struct FileBookStatusRepository {
    path: PathBuf,
}

impl FileBookStatusRepository {
    /// Name of the save file inside the save directory.
    pub const FILE_NAME: &'static str = "SavedBookStatus";

    /// Repository backed by the file at `path`.
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    /// Repository backed by [`Self::FILE_NAME`] inside `dir`.
    pub fn in_dir(dir: impl AsRef<Path>) -> Self {
        Self::new(dir.as_ref().join(Self::FILE_NAME))
    }

    pub fn path(&self) -> &Path {
        &self.path
    }
}

impl BookStatusRepository for FileBookStatusRepository {
    fn save(&self, shelf: &BookShelf) -> Result<()> {
        if let Some(parent) = self.path.parent()
            && !parent.as_os_str().is_empty()
        {
            fs::create_dir_all(parent)?;
        }

        let bytes = serde_json::to_vec(shelf)?;

        // Write to temp file, then atomic rename
        let temp_path = self.path.with_extension("tmp");
        fs::write(&temp_path, bytes)?;
        fs::rename(&temp_path, &self.path)?;

        tracing::debug!("Saved book statuses to {}", self.path.display());

        Ok(())
    }

    fn load(&self) -> Result<Option<BookShelf>> {
        let bytes = match fs::read(&self.path) {
            Ok(bytes) => bytes,
            Err(err) if err.kind() == ErrorKind::NotFound => return Ok(None),
            Err(err) => return Err(err.into()),
        };

        let shelf: BookShelf = serde_json::from_slice(&bytes)?;

        tracing::debug!("Loaded book statuses from {}", self.path.display());

        Ok(Some(shelf))
    }
}
