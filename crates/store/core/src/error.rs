//! Error types raised by the shelf and catalog rules.

use thiserror::Error;

use crate::catalog::ProductId;

/// Errors surfaced when mutating a [`crate::BookShelf`].
#[derive(Clone, Debug, Error, PartialEq, Eq)]
pub enum ShelfError {
    #[error("slot {slot} is out of range (shelf holds {len} books)")]
    SlotOutOfRange { slot: usize, len: usize },

    #[error("book in slot {0} is locked")]
    Locked(usize),
}

/// Errors surfaced when constructing a [`crate::ProductCatalog`].
#[derive(Clone, Debug, Error, PartialEq, Eq)]
pub enum CatalogError {
    #[error("product {0} appears more than once in the catalog")]
    DuplicateProduct(ProductId),

    #[error("product identifier must not be empty")]
    EmptyIdentifier,
}
