//! Storefront abstraction traits.
//!
//! This module defines a layered storefront abstraction:
//! - Layer 1: ProductDirectory, PurchaseGateway, EntitlementSource, TransactionFeed
//! - Layer 2: Storefront (composite trait)

use async_trait::async_trait;
use store_core::ProductId;
use tokio::sync::broadcast;

use crate::types::{Product, PurchaseResult, Transaction, TransactionUpdate, VerificationResult};

// ============================================================================
// Error Types
// ============================================================================

/// Product listing errors.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum CommerceError {
    #[error("Network error: {0}")]
    NetworkError(String),

    #[error("Storefront unavailable: {0}")]
    StoreUnavailable(String),

    #[error("Backend-specific error: {0}")]
    BackendError(String),
}

/// Purchase call errors.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum PurchaseError {
    #[error("Product not available for sale: {0}")]
    ProductUnavailable(ProductId),

    #[error("Purchases are not allowed on this device")]
    NotAllowed,

    #[error("Network error: {0}")]
    NetworkError(String),

    #[error("Backend-specific error: {0}")]
    BackendError(String),
}

/// A signed record was present but failed verification.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("verification failed: {reason}")]
pub struct VerificationError {
    pub reason: String,
}

impl VerificationError {
    pub fn new(reason: impl Into<String>) -> Self {
        Self {
            reason: reason.into(),
        }
    }
}

// ============================================================================
// Layer 1: Storefront Capabilities
// ============================================================================

/// Product metadata lookup.
#[async_trait]
pub trait ProductDirectory: Send + Sync {
    /// Fetch descriptors for the requested identifiers.
    ///
    /// Unknown identifiers are silently omitted by the platform.
    async fn products(&self, ids: &[ProductId]) -> Result<Vec<Product>, CommerceError>;
}

/// Purchase initiation.
#[async_trait]
pub trait PurchaseGateway: Send + Sync {
    /// Start a purchase flow and wait for its result.
    async fn purchase(&self, product: &Product) -> Result<PurchaseResult, PurchaseError>;
}

/// Current entitlement lookup.
#[async_trait]
pub trait EntitlementSource: Send + Sync {
    /// Latest transaction entitling the user to `product_id`.
    ///
    /// Returns `None` when the platform has no record.
    async fn current_entitlement(
        &self,
        product_id: &ProductId,
    ) -> Option<VerificationResult<Transaction>>;
}

/// Push notifications for out-of-band transaction changes.
pub trait TransactionFeed: Send + Sync {
    /// Subscribe to transaction updates.
    ///
    /// The receiver yields `Closed` once the platform stops publishing.
    fn transaction_updates(&self) -> broadcast::Receiver<TransactionUpdate>;
}

// ============================================================================
// Layer 2: Composite Trait
// ============================================================================

/// Complete storefront interface consumed by the store runtime.
pub trait Storefront:
    ProductDirectory + PurchaseGateway + EntitlementSource + TransactionFeed + Send + Sync
{
    /// Storefront name (e.g., "Sandbox", "App Store").
    fn name(&self) -> &str;

    /// Environment name (e.g., "sandbox", "production").
    fn environment(&self) -> &str;
}
