//! Event types for different topics.

use client_commerce_core::PurchaseOutcome;
use store_core::{BookShelf, OwnedProducts, OwnershipTransition, ProductId, SlotChange};

/// Events related to the product listing.
#[derive(Debug, Clone)]
pub enum CatalogEvent {
    /// Product metadata was fetched from the storefront.
    ProductsLoaded { products: Vec<ProductId> },

    /// Product listing failed; the previous listing is kept.
    ProductsUnavailable { error: String },
}

/// What caused an entitlement pass.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ReconcileTrigger {
    /// The listener started.
    Startup,
    /// The storefront pushed a transaction update.
    TransactionUpdate,
    /// Updates were dropped because the listener fell behind.
    Lagged,
    /// A caller asked for a refresh.
    Manual,
}

/// Events related to purchases and ownership.
#[derive(Debug, Clone)]
pub enum EntitlementEvent {
    /// A purchase call returned.
    PurchaseFinished {
        product_id: ProductId,
        outcome: PurchaseOutcome,
    },

    /// A product moved between ownership states.
    OwnershipChanged(OwnershipTransition),

    /// A full entitlement pass over every catalog product finished.
    Reconciled {
        trigger: ReconcileTrigger,
        owned: OwnedProducts,
    },
}

/// Events related to the book shelf.
#[derive(Debug, Clone)]
pub enum BooksEvent {
    /// Slots changed, either by ownership or by the player.
    Changed {
        books: BookShelf,
        changes: Vec<SlotChange>,
    },

    /// The shelf was written to the repository.
    Saved { books: BookShelf },

    /// A saved shelf replaced the in-memory one.
    Restored { books: BookShelf },
}
