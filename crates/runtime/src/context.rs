//! Shared store context used by the public [`crate::Store`] API and the
//! reconciliation worker.
//!
//! Storefront calls always complete before the state lock is taken, so a slow
//! platform never blocks readers. Every mutation of the ledger is followed by
//! bringing the shelf in line with it.

use std::sync::Arc;

use client_commerce_core::{Product, PurchaseOutcome};
use store_core::{
    BookShelf, BookStatus, EntitlementCheck, OwnedProducts, OwnershipState, OwnershipTransition,
    ProductCatalog, ProductId, ShelfError, SlotChange,
};
use tokio::sync::RwLock;
use tracing::{debug, info, warn};

use crate::commerce::CommerceAdapter;
use crate::events::{
    BooksEvent, CatalogEvent, EntitlementEvent, Event, EventBus, ReconcileTrigger,
};
use crate::repository::BookStatusRepository;
use crate::state::{StoreSnapshot, StoreState};

pub(crate) struct StoreContext {
    catalog: ProductCatalog,
    state: RwLock<StoreState>,
    commerce: CommerceAdapter,
    repository: Arc<dyn BookStatusRepository>,
    events: EventBus,
    autosave: bool,
}

impl StoreContext {
    pub(crate) fn new(
        catalog: ProductCatalog,
        commerce: CommerceAdapter,
        repository: Arc<dyn BookStatusRepository>,
        events: EventBus,
        autosave: bool,
    ) -> Self {
        Self {
            state: RwLock::new(StoreState::new(&catalog)),
            catalog,
            commerce,
            repository,
            events,
            autosave,
        }
    }

    pub(crate) fn catalog(&self) -> &ProductCatalog {
        &self.catalog
    }

    pub(crate) fn commerce(&self) -> &CommerceAdapter {
        &self.commerce
    }

    pub(crate) fn events(&self) -> &EventBus {
        &self.events
    }

    // ========================================================================
    // Catalog
    // ========================================================================

    /// Fetch the product listing. Returns how many products are available
    /// afterwards; a failed fetch keeps the previous listing.
    pub(crate) async fn load_products(&self) -> usize {
        match self.commerce.fetch_products(&self.catalog).await {
            Ok(products) => {
                let ids: Vec<ProductId> = products.iter().map(|p| p.id.clone()).collect();
                let count = products.len();
                self.state.write().await.products = products;

                info!(count, "Loaded products from storefront");
                self.events
                    .publish(Event::Catalog(CatalogEvent::ProductsLoaded { products: ids }));
                count
            }
            Err(err) => {
                warn!(%err, "Failed to load products, keeping previous listing");
                self.events
                    .publish(Event::Catalog(CatalogEvent::ProductsUnavailable {
                        error: err.to_string(),
                    }));
                self.state.read().await.products.len()
            }
        }
    }

    // ========================================================================
    // Entitlements
    // ========================================================================

    /// Run the purchase flow for a loaded product.
    ///
    /// Returns `None` when the product has not been listed or the storefront
    /// call failed. Only a verified outcome grants ownership.
    pub(crate) async fn purchase(&self, product_id: &ProductId) -> Option<PurchaseOutcome> {
        let product = self.find_product(product_id).await;
        let Some(product) = product else {
            warn!(product = %product_id, "Product is not loaded, cannot purchase");
            return None;
        };

        let outcome = match self.commerce.purchase(&product).await {
            Ok(outcome) => outcome,
            Err(err) => {
                warn!(product = %product_id, %err, "Purchase failed");
                return None;
            }
        };

        match &outcome {
            PurchaseOutcome::Verified(granted) => self.grant(granted).await,
            PurchaseOutcome::Unverified { .. } => {}
            PurchaseOutcome::Pending => info!(product = %product_id, "Purchase is pending"),
            PurchaseOutcome::Cancelled => info!(product = %product_id, "Purchase cancelled"),
        }

        self.events
            .publish(Event::Entitlement(EntitlementEvent::PurchaseFinished {
                product_id: product_id.clone(),
                outcome: outcome.clone(),
            }));

        Some(outcome)
    }

    async fn find_product(&self, product_id: &ProductId) -> Option<Product> {
        self.state
            .read()
            .await
            .products
            .iter()
            .find(|product| &product.id == product_id)
            .cloned()
    }

    async fn grant(&self, product_id: &ProductId) {
        let (transition, books, changes) = {
            let mut state = self.state.write().await;
            let transition = state.ledger.record_verified_purchase(product_id);
            let changes = Self::apply_ownership(&self.catalog, &mut state);
            (transition, state.books, changes)
        };

        info!(product = %product_id, "Purchase verified");
        if let Some(transition) = transition {
            self.events
                .publish(Event::Entitlement(EntitlementEvent::OwnershipChanged(
                    transition,
                )));
        }
        self.books_changed(books, changes);
    }

    /// Re-derive ownership of every catalog product from the storefront.
    ///
    /// A product without a record counts as not owned and the pass moves on
    /// to the remaining products. Unverified records leave the product's
    /// previous state in place.
    pub(crate) async fn reconcile(&self, trigger: ReconcileTrigger) -> Vec<OwnershipTransition> {
        let mut checks: Vec<(ProductId, EntitlementCheck)> =
            Vec::with_capacity(ProductCatalog::LEN);
        for product_id in self.catalog.iter() {
            let check = self.commerce.check_entitlement(product_id).await;
            debug!(product = %product_id, ?check, "Checked entitlement");
            checks.push((product_id.clone(), check));
        }

        let (transitions, owned, books, changes) = {
            let mut state = self.state.write().await;
            let transitions: Vec<OwnershipTransition> = checks
                .iter()
                .filter_map(|(product_id, check)| state.ledger.record_check(product_id, *check))
                .collect();
            let changes = Self::apply_ownership(&self.catalog, &mut state);
            (transitions, state.ledger.owned(), state.books, changes)
        };

        for transition in &transitions {
            info!(
                product = %transition.product_id,
                from = %transition.from,
                to = %transition.to,
                "Ownership changed"
            );
            self.events
                .publish(Event::Entitlement(EntitlementEvent::OwnershipChanged(
                    transition.clone(),
                )));
        }
        self.books_changed(books, changes);

        debug!(?trigger, owned = owned.len(), "Entitlements reconciled");
        self.events
            .publish(Event::Entitlement(EntitlementEvent::Reconciled {
                trigger,
                owned,
            }));

        transitions
    }

    fn apply_ownership(catalog: &ProductCatalog, state: &mut StoreState) -> Vec<SlotChange> {
        let StoreState { books, ledger, .. } = state;
        books.apply_ownership(catalog, ledger)
    }

    // ========================================================================
    // Books
    // ========================================================================

    pub(crate) async fn toggle_book(&self, slot: usize) -> Result<BookStatus, ShelfError> {
        let (books, change) = {
            let mut state = self.state.write().await;
            let change = state.books.toggle(slot)?;
            (state.books, change)
        };

        let status = change.to;
        self.books_changed(books, vec![change]);
        Ok(status)
    }

    /// Write the current shelf to the repository.
    pub(crate) async fn save_status(&self) -> bool {
        let books = self.state.read().await.books;
        self.persist(books)
    }

    /// Replace the shelf with the saved one, if any.
    ///
    /// Ownership already observed this session is applied on top of the
    /// restored shelf. A missing or unreadable save keeps the current shelf.
    pub(crate) async fn load_status(&self) -> bool {
        let saved = match self.repository.load() {
            Ok(Some(saved)) => saved,
            Ok(None) => {
                debug!("No saved book statuses, keeping current shelf");
                return false;
            }
            Err(err) => {
                warn!(%err, "Failed to load book statuses, keeping current shelf");
                return false;
            }
        };

        let (books, changes) = {
            let mut state = self.state.write().await;
            state.books = saved;
            let changes = Self::apply_ownership(&self.catalog, &mut state);
            (state.books, changes)
        };

        info!("Restored saved book statuses");
        self.events
            .publish(Event::Books(BooksEvent::Restored { books: saved }));
        self.books_changed(books, changes);
        true
    }

    fn books_changed(&self, books: BookShelf, changes: Vec<SlotChange>) {
        if changes.is_empty() {
            return;
        }

        for change in &changes {
            debug!(
                slot = change.slot,
                from = %change.from,
                to = %change.to,
                "Book status changed"
            );
        }
        self.events
            .publish(Event::Books(BooksEvent::Changed { books, changes }));

        if self.autosave {
            self.persist(books);
        }
    }

    fn persist(&self, books: BookShelf) -> bool {
        match self.repository.save(&books) {
            Ok(()) => {
                debug!("Saved book statuses");
                self.events.publish(Event::Books(BooksEvent::Saved { books }));
                true
            }
            Err(err) => {
                warn!(%err, "Failed to save book statuses");
                false
            }
        }
    }

    // ========================================================================
    // Readers
    // ========================================================================

    pub(crate) async fn books(&self) -> BookShelf {
        self.state.read().await.books
    }

    pub(crate) async fn products(&self) -> Vec<Product> {
        self.state.read().await.products.clone()
    }

    pub(crate) async fn owned_products(&self) -> OwnedProducts {
        self.state.read().await.ledger.owned()
    }

    pub(crate) async fn ownership(&self, product_id: &ProductId) -> Option<OwnershipState> {
        self.state.read().await.ledger.state(product_id)
    }

    pub(crate) async fn snapshot(&self) -> StoreSnapshot {
        self.state.read().await.snapshot()
    }
}
