//! Storefront abstraction layer for the trivia store.
//!
//! This crate is the only boundary between the store and the platform's
//! purchase and entitlement services.
//!
//! # Architecture
//!
//! ```text
//! Layer 2: Storefront (composite trait)
//!          ├── ProductDirectory
//!          ├── PurchaseGateway
//!          ├── EntitlementSource
//!          └── TransactionFeed
//! ```
//!
//! # Usage
//!
//! ```ignore
//! use client_commerce_core::{PurchaseOutcome, Storefront};
//!
//! async fn buy(storefront: &dyn Storefront, product: &Product) {
//!     let result = storefront.purchase(product).await?;
//!     if PurchaseOutcome::from(result).grants_entitlement() {
//!         // unlock
//!     }
//! }
//! ```

pub mod traits;
pub mod types;

// Re-export all traits
pub use traits::{
    CommerceError, EntitlementSource, ProductDirectory, PurchaseError, PurchaseGateway,
    Storefront, TransactionFeed, VerificationError,
};

// Re-export all types
pub use types::{
    Product, PurchaseOutcome, PurchaseResult, Revocation, RevocationReason, Transaction,
    TransactionId, TransactionUpdate, UpdateKind, VerificationResult,
};
