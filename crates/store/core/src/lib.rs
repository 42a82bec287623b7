//! Book unlock rules and product ownership shared across the store crates.
//!
//! `store-core` defines the seven-slot [`BookShelf`], the fixed
//! [`ProductCatalog`] of purchasable books, and the [`OwnershipLedger`] that
//! turns platform entitlement observations into owned products. Everything
//! here is synchronous and free of I/O; the runtime crate drives it.
pub mod book;
pub mod catalog;
pub mod error;
pub mod ownership;

pub use book::{BookShelf, BookStatus, SlotChange};
pub use catalog::{ProductCatalog, ProductId};
pub use error::{CatalogError, ShelfError};
pub use ownership::{
    EntitlementCheck, OwnedProducts, OwnershipLedger, OwnershipState, OwnershipTransition,
};
