//! State owned by a store instance.

use client_commerce_core::Product;
use store_core::{BookShelf, OwnedProducts, OwnershipLedger, ProductCatalog};

/// Mutable store state, guarded by a single lock in the store context.
#[derive(Debug, Clone)]
pub struct StoreState {
    pub books: BookShelf,
    pub products: Vec<Product>,
    pub ledger: OwnershipLedger,
}

impl StoreState {
    /// Factory state: default shelf, no products, nothing observed.
    pub fn new(catalog: &ProductCatalog) -> Self {
        Self {
            books: BookShelf::factory_default(),
            products: Vec::new(),
            ledger: OwnershipLedger::new(catalog),
        }
    }

    pub fn snapshot(&self) -> StoreSnapshot {
        StoreSnapshot {
            books: self.books,
            products: self.products.clone(),
            owned: self.ledger.owned(),
        }
    }
}

/// Point-in-time copy of the observable store state.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StoreSnapshot {
    pub books: BookShelf,
    pub products: Vec<Product>,
    pub owned: OwnedProducts,
}
