//! Repository contract for persisting book unlock state.

use store_core::BookShelf;

use super::error::Result;

/// Repository for the persisted [`BookShelf`].
///
/// A single writer owns the repository; implementations need no cross-process
/// coordination.
pub trait BookStatusRepository: Send + Sync {
    /// Overwrite the saved shelf.
    fn save(&self, shelf: &BookShelf) -> Result<()>;

    /// Load the saved shelf.
    ///
    /// Returns `Ok(None)` when nothing has been saved yet; corrupt data is an
    /// error.
    fn load(&self) -> Result<Option<BookShelf>>;
}
