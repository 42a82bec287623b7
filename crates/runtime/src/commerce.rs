//! Adapter between the store and the storefront traits.
//!
//! The adapter owns the translation from platform records to store-level
//! results: purchases become a [`PurchaseOutcome`], entitlement records become
//! an [`EntitlementCheck`]. It never mutates store state.

use std::sync::Arc;

use client_commerce_core::{
    CommerceError, Product, PurchaseError, PurchaseOutcome, Storefront, TransactionUpdate,
    VerificationResult,
};
use store_core::{EntitlementCheck, ProductCatalog, ProductId};
use tokio::sync::broadcast;
use tracing::{debug, warn};

#[derive(Clone)]
pub struct CommerceAdapter {
    storefront: Arc<dyn Storefront>,
}

impl CommerceAdapter {
    pub fn new(storefront: Arc<dyn Storefront>) -> Self {
        Self { storefront }
    }

    pub fn storefront_name(&self) -> &str {
        self.storefront.name()
    }

    pub fn environment(&self) -> &str {
        self.storefront.environment()
    }

    /// Fetch descriptors for every catalog product.
    ///
    /// The result is limited to catalog ids, holds each id at most once and
    /// follows catalog order regardless of what the platform returned.
    pub async fn fetch_products(
        &self,
        catalog: &ProductCatalog,
    ) -> Result<Vec<Product>, CommerceError> {
        let mut listed = self.storefront.products(catalog.ids()).await?;

        let mut products = Vec::with_capacity(ProductCatalog::LEN);
        for id in catalog.iter() {
            if let Some(index) = listed.iter().position(|product| &product.id == id) {
                products.push(listed.swap_remove(index));
            } else {
                debug!(product = %id, "Storefront did not list catalog product");
            }
        }

        if !listed.is_empty() {
            debug!(
                extra = listed.len(),
                "Dropped duplicate or unrequested products from listing"
            );
        }

        Ok(products)
    }

    /// Run a purchase flow.
    pub async fn purchase(&self, product: &Product) -> Result<PurchaseOutcome, PurchaseError> {
        let outcome = PurchaseOutcome::from(self.storefront.purchase(product).await?);

        if let PurchaseOutcome::Unverified { product_id, reason } = &outcome {
            warn!(product = %product_id, %reason, "Purchase receipt failed verification");
        }

        Ok(outcome)
    }

    /// Query and classify the current entitlement for one product.
    pub async fn check_entitlement(&self, product_id: &ProductId) -> EntitlementCheck {
        match self.storefront.current_entitlement(product_id).await {
            None => EntitlementCheck::Missing,
            Some(VerificationResult::Verified(transaction)) => {
                if transaction.is_revoked() {
                    EntitlementCheck::Revoked
                } else {
                    EntitlementCheck::Active
                }
            }
            Some(VerificationResult::Unverified(transaction, reason)) => {
                warn!(
                    product = %product_id,
                    transaction = %transaction.id,
                    %reason,
                    "Ignoring unverified entitlement"
                );
                EntitlementCheck::Unverified
            }
        }
    }

    pub fn transaction_updates(&self) -> broadcast::Receiver<TransactionUpdate> {
        self.storefront.transaction_updates()
    }
}
