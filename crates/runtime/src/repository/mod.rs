//! Repository layer for persisted store data.
//!
//! Only the book shelf is persisted. Ownership is never saved: it is
//! recomputed from the storefront on every entitlement check.

mod error;
mod file;
mod memory;
mod traits;

pub use error::{RepositoryError, Result};
pub use file::FileBookStatusRepository;
pub use memory::InMemoryBookStatusRepo;
pub use traits::BookStatusRepository;
