//! In-memory BookStatusRepository implementation for tests and local runs.

use std::sync::RwLock;

use store_core::BookShelf;

use crate::repository::{BookStatusRepository, RepositoryError, Result};

/// In-memory implementation of BookStatusRepository.
#[derive(Default)]
pub struct InMemoryBookStatusRepo {
    shelf: RwLock<Option<BookShelf>>,
}

impl InMemoryBookStatusRepo {
    /// Create an empty repository (nothing saved yet).
    pub fn new() -> Self {
        Self::default()
    }

    /// Create a repository that already holds `shelf`.
    pub fn with_saved(shelf: BookShelf) -> Self {
        Self {
            shelf: RwLock::new(Some(shelf)),
        }
    }

    /// The currently saved shelf, if any.
    pub fn saved(&self) -> Option<BookShelf> {
        self.shelf.read().ok().and_then(|shelf| *shelf)
    }
}

impl BookStatusRepository for InMemoryBookStatusRepo {
    fn save(&self, shelf: &BookShelf) -> Result<()> {
        let mut saved = self
            .shelf
            .write()
            .map_err(|_| RepositoryError::LockPoisoned)?;
        *saved = Some(*shelf);
        Ok(())
    }

    fn load(&self) -> Result<Option<BookShelf>> {
        let saved = self
            .shelf
            .read()
            .map_err(|_| RepositoryError::LockPoisoned)?;
        Ok(*saved)
    }
}
