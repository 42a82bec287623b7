//! Store configuration shared across the orchestrator and workers.

use std::path::PathBuf;

use store_core::ProductCatalog;

use crate::repository::FileBookStatusRepository;

/// Runtime configuration for a [`crate::Store`].
#[derive(Debug, Clone)]
pub struct StoreConfig {
    pub catalog: ProductCatalog,
    /// File the book shelf is saved to when no repository is injected.
    pub save_path: PathBuf,
    pub event_buffer_size: usize,
    /// Save the shelf whenever its unlock state changes (default: true)
    pub autosave: bool,
    /// Run one entitlement pass as soon as the listener starts (default: true)
    pub reconcile_on_start: bool,
}

impl StoreConfig {
    pub const DEFAULT_EVENT_BUFFER_SIZE: usize = 64;

    /// Default configuration saving into `dir`.
    pub fn in_dir(dir: impl Into<PathBuf>) -> Self {
        Self {
            save_path: dir.into().join(FileBookStatusRepository::FILE_NAME),
            ..Self::default()
        }
    }
}

impl Default for StoreConfig {
    fn default() -> Self {
        Self {
            catalog: ProductCatalog::standard(),
            save_path: PathBuf::from("save_data").join(FileBookStatusRepository::FILE_NAME),
            event_buffer_size: Self::DEFAULT_EVENT_BUFFER_SIZE,
            autosave: true,
            reconcile_on_start: true,
        }
    }
}
