//! In-process storefront with scriptable purchases and entitlements.

use std::collections::{HashMap, VecDeque};
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

use async_trait::async_trait;
use chrono::Utc;
use client_commerce_core::{
    CommerceError, EntitlementSource, Product, ProductDirectory, PurchaseError, PurchaseGateway,
    PurchaseResult, Revocation, RevocationReason, Storefront, Transaction, TransactionFeed,
    TransactionId, TransactionUpdate, UpdateKind, VerificationError, VerificationResult,
};
use store_core::{ProductCatalog, ProductId};
use tokio::sync::broadcast;

/// Result the next purchase call should produce.
#[derive(Debug, Clone)]
pub enum ScriptedPurchase {
    /// Complete with a verified transaction.
    Approve,
    /// Complete with a transaction that fails verification.
    ApproveUnverified(String),
    Pending,
    Cancel,
    /// The purchase call itself fails.
    Fail(PurchaseError),
}

struct SandboxState {
    products: Vec<Product>,
    entitlements: HashMap<ProductId, VerificationResult<Transaction>>,
    scripted: VecDeque<ScriptedPurchase>,
    listing_failure: Option<CommerceError>,
    next_transaction: u64,
}

impl SandboxState {
    fn next_transaction(&mut self, product_id: &ProductId) -> Transaction {
        self.next_transaction += 1;
        Transaction {
            id: TransactionId(self.next_transaction),
            product_id: product_id.clone(),
            purchased_at: Utc::now(),
            revocation: None,
        }
    }
}

/// Storefront that runs entirely in memory.
///
/// Clones share state, so a test can keep one handle for driving entitlement
/// changes while the store holds another.
#[derive(Clone)]
pub struct SandboxStorefront {
    state: Arc<Mutex<SandboxState>>,
    updates: Arc<Mutex<Option<broadcast::Sender<TransactionUpdate>>>>,
}

impl SandboxStorefront {
    /// Capacity of the transaction update channel.
    pub const FEED_CAPACITY: usize = 32;

    /// Create a storefront listing the given products.
    pub fn new(products: Vec<Product>) -> Self {
        let (updates, _) = broadcast::channel(Self::FEED_CAPACITY);
        Self {
            state: Arc::new(Mutex::new(SandboxState {
                products,
                entitlements: HashMap::new(),
                scripted: VecDeque::new(),
                listing_failure: None,
                next_transaction: 0,
            })),
            updates: Arc::new(Mutex::new(Some(updates))),
        }
    }

    /// Create a storefront listing one product per catalog entry.
    pub fn with_catalog(catalog: &ProductCatalog) -> Self {
        let products = catalog
            .iter()
            .zip(ProductCatalog::FIRST_PURCHASABLE_SLOT..)
            .map(|(id, slot)| Product {
                id: id.clone(),
                display_name: format!("Book {}", slot + 1),
                description: format!("Unlocks trivia questions from book {}", slot + 1),
                display_price: "$2.99".to_string(),
            })
            .collect();
        Self::new(products)
    }

    /// Make product listing fail with `error` until [`Self::restore_listing`].
    pub fn fail_listing(&self, error: CommerceError) {
        self.lock_state().listing_failure = Some(error);
    }

    pub fn restore_listing(&self) {
        self.lock_state().listing_failure = None;
    }

    /// Queue the result of a future purchase call. Unscripted purchases approve.
    pub fn script_purchase(&self, outcome: ScriptedPurchase) {
        self.lock_state().scripted.push_back(outcome);
    }

    /// Grant a verified, unrevoked entitlement out of band.
    pub fn grant(&self, product_id: &ProductId) -> TransactionId {
        let transaction_id = {
            let mut state = self.lock_state();
            let transaction = state.next_transaction(product_id);
            let id = transaction.id;
            state
                .entitlements
                .insert(product_id.clone(), VerificationResult::Verified(transaction));
            id
        };
        self.publish(transaction_id, product_id, UpdateKind::Purchased);
        transaction_id
    }

    /// Attach a revocation marker to the current entitlement.
    ///
    /// Returns `false` when there is no entitlement to revoke.
    pub fn revoke(&self, product_id: &ProductId, reason: RevocationReason) -> bool {
        let transaction_id = {
            let mut state = self.lock_state();
            let Some(entry) = state.entitlements.get_mut(product_id) else {
                return false;
            };
            let transaction = match entry {
                VerificationResult::Verified(transaction)
                | VerificationResult::Unverified(transaction, _) => transaction,
            };
            transaction.revocation = Some(Revocation {
                reason,
                revoked_at: Utc::now(),
            });
            transaction.id
        };

        let kind = match reason {
            RevocationReason::Refunded => UpdateKind::Refunded,
            RevocationReason::FamilySharingRemoved => UpdateKind::FamilySharingChanged,
            RevocationReason::DeveloperIssue | RevocationReason::Other => UpdateKind::Revoked,
        };
        self.publish(transaction_id, product_id, kind);
        true
    }

    /// Replace the current entitlement with one that fails verification.
    pub fn corrupt_entitlement(&self, product_id: &ProductId, reason: &str) {
        let transaction_id = {
            let mut state = self.lock_state();
            let existing = state.entitlements.remove(product_id);
            let transaction = match existing {
                Some(VerificationResult::Verified(transaction))
                | Some(VerificationResult::Unverified(transaction, _)) => transaction,
                None => state.next_transaction(product_id),
            };
            let id = transaction.id;
            state.entitlements.insert(
                product_id.clone(),
                VerificationResult::Unverified(transaction, VerificationError::new(reason)),
            );
            id
        };
        self.publish(transaction_id, product_id, UpdateKind::Renewed);
    }

    /// Drop every record for `product_id`.
    pub fn clear_entitlement(&self, product_id: &ProductId) {
        let removed = self.lock_state().entitlements.remove(product_id);
        if let Some(record) = removed {
            self.publish(record.payload().id, product_id, UpdateKind::Revoked);
        }
    }

    /// Push an update without changing any entitlement.
    pub fn notify(&self, product_id: &ProductId, kind: UpdateKind) {
        let transaction_id = self
            .lock_state()
            .entitlements
            .get(product_id)
            .map(|record| record.payload().id)
            .unwrap_or(TransactionId(0));
        self.publish(transaction_id, product_id, kind);
    }

    /// Stop publishing; current subscribers observe the feed as closed.
    pub fn close_feed(&self) {
        self.lock_updates().take();
    }

    fn publish(&self, transaction_id: TransactionId, product_id: &ProductId, kind: UpdateKind) {
        let update = TransactionUpdate {
            transaction_id,
            product_id: product_id.clone(),
            kind,
        };

        match self.lock_updates().as_ref() {
            Some(tx) => {
                if tx.send(update).is_err() {
                    tracing::trace!("No subscribers for transaction update on {}", product_id);
                }
            }
            None => tracing::debug!("Transaction feed closed, dropping update for {}", product_id),
        }
    }

    fn lock_state(&self) -> MutexGuard<'_, SandboxState> {
        self.state.lock().unwrap_or_else(PoisonError::into_inner)
    }

    fn lock_updates(&self) -> MutexGuard<'_, Option<broadcast::Sender<TransactionUpdate>>> {
        self.updates.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

impl Default for SandboxStorefront {
    fn default() -> Self {
        Self::with_catalog(&ProductCatalog::standard())
    }
}

#[async_trait]
impl ProductDirectory for SandboxStorefront {
    async fn products(&self, ids: &[ProductId]) -> Result<Vec<Product>, CommerceError> {
        let state = self.lock_state();
        if let Some(error) = &state.listing_failure {
            return Err(error.clone());
        }

        Ok(state
            .products
            .iter()
            .filter(|product| ids.contains(&product.id))
            .cloned()
            .collect())
    }
}

#[async_trait]
impl PurchaseGateway for SandboxStorefront {
    async fn purchase(&self, product: &Product) -> Result<PurchaseResult, PurchaseError> {
        let mut state = self.lock_state();
        if !state.products.iter().any(|listed| listed.id == product.id) {
            return Err(PurchaseError::ProductUnavailable(product.id.clone()));
        }

        let script = state.scripted.pop_front().unwrap_or(ScriptedPurchase::Approve);
        tracing::debug!(product = %product.id, ?script, "Sandbox purchase");

        match script {
            ScriptedPurchase::Approve => {
                let transaction = state.next_transaction(&product.id);
                state.entitlements.insert(
                    product.id.clone(),
                    VerificationResult::Verified(transaction.clone()),
                );
                Ok(PurchaseResult::Success(VerificationResult::Verified(
                    transaction,
                )))
            }
            ScriptedPurchase::ApproveUnverified(reason) => {
                let transaction = state.next_transaction(&product.id);
                let error = VerificationError::new(reason);
                state.entitlements.insert(
                    product.id.clone(),
                    VerificationResult::Unverified(transaction.clone(), error.clone()),
                );
                Ok(PurchaseResult::Success(VerificationResult::Unverified(
                    transaction,
                    error,
                )))
            }
            ScriptedPurchase::Pending => Ok(PurchaseResult::Pending),
            ScriptedPurchase::Cancel => Ok(PurchaseResult::UserCancelled),
            ScriptedPurchase::Fail(error) => Err(error),
        }
    }
}

#[async_trait]
impl EntitlementSource for SandboxStorefront {
    async fn current_entitlement(
        &self,
        product_id: &ProductId,
    ) -> Option<VerificationResult<Transaction>> {
        self.lock_state().entitlements.get(product_id).cloned()
    }
}

impl TransactionFeed for SandboxStorefront {
    fn transaction_updates(&self) -> broadcast::Receiver<TransactionUpdate> {
        match self.lock_updates().as_ref() {
            Some(tx) => tx.subscribe(),
            None => {
                // Feed already closed: hand out a receiver whose sender is gone.
                let (_, rx) = broadcast::channel(1);
                rx
            }
        }
    }
}

impl Storefront for SandboxStorefront {
    fn name(&self) -> &str {
        "Sandbox"
    }

    fn environment(&self) -> &str {
        "sandbox"
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn ids(raw: &[&str]) -> Vec<ProductId> {
        raw.iter().copied().map(ProductId::from).collect()
    }

    #[tokio::test]
    async fn lists_only_requested_known_products() {
        let store = SandboxStorefront::default();

        let products = store.products(&ids(&["hp5", "hp9", "hp4"])).await.unwrap();
        let listed: Vec<_> = products.iter().map(|p| p.id.as_str()).collect();
        assert_eq!(listed, vec!["hp4", "hp5"]);
    }

    #[tokio::test]
    async fn listing_failure_is_reported_until_restored() {
        let store = SandboxStorefront::default();
        store.fail_listing(CommerceError::NetworkError("offline".into()));

        assert!(store.products(&ids(&["hp4"])).await.is_err());

        store.restore_listing();
        assert_eq!(store.products(&ids(&["hp4"])).await.unwrap().len(), 1);
    }

    #[tokio::test]
    async fn scripted_purchases_run_in_order() {
        let store = SandboxStorefront::default();
        let product = store.products(&ids(&["hp4"])).await.unwrap().remove(0);

        store.script_purchase(ScriptedPurchase::Cancel);
        store.script_purchase(ScriptedPurchase::Pending);

        assert_eq!(
            store.purchase(&product).await.unwrap(),
            PurchaseResult::UserCancelled
        );
        assert_eq!(store.purchase(&product).await.unwrap(), PurchaseResult::Pending);
        assert!(store.current_entitlement(&product.id).await.is_none());

        let approved = store.purchase(&product).await.unwrap();
        assert!(matches!(
            approved,
            PurchaseResult::Success(VerificationResult::Verified(_))
        ));
        assert!(store.current_entitlement(&product.id).await.is_some());
    }

    #[tokio::test]
    async fn unlisted_product_cannot_be_purchased() {
        let store = SandboxStorefront::default();
        let product = Product {
            id: "hp1".into(),
            display_name: String::new(),
            description: String::new(),
            display_price: String::new(),
        };

        assert_eq!(
            store.purchase(&product).await,
            Err(PurchaseError::ProductUnavailable("hp1".into()))
        );
    }

    #[tokio::test]
    async fn entitlement_controls_publish_updates() {
        let store = SandboxStorefront::default();
        let mut updates = store.transaction_updates();
        let hp6 = ProductId::from("hp6");

        store.grant(&hp6);
        assert_eq!(updates.recv().await.unwrap().kind, UpdateKind::Purchased);

        assert!(store.revoke(&hp6, RevocationReason::Refunded));
        assert_eq!(updates.recv().await.unwrap().kind, UpdateKind::Refunded);
        let record = store.current_entitlement(&hp6).await.unwrap();
        assert!(record.is_verified());
        assert!(record.payload().is_revoked());

        store.clear_entitlement(&hp6);
        assert_eq!(updates.recv().await.unwrap().kind, UpdateKind::Revoked);
        assert!(store.current_entitlement(&hp6).await.is_none());

        assert!(!store.revoke(&hp6, RevocationReason::Other));
    }

    #[tokio::test]
    async fn closing_the_feed_closes_receivers() {
        let store = SandboxStorefront::default();
        let mut before = store.transaction_updates();

        store.close_feed();

        assert!(matches!(
            before.recv().await,
            Err(broadcast::error::RecvError::Closed)
        ));
        let mut after = store.transaction_updates();
        assert!(matches!(
            after.recv().await,
            Err(broadcast::error::RecvError::Closed)
        ));
    }
}
