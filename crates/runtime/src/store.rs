//! High-level store orchestrator.
//!
//! The store owns the reconciliation worker, wires the storefront and the
//! book repository together, and exposes a builder-based API for the client.

use std::sync::Arc;

use client_commerce_core::{Product, PurchaseOutcome, Storefront};
use store_core::{
    BookShelf, BookStatus, OwnedProducts, OwnershipState, OwnershipTransition, ProductCatalog,
    ProductId, ShelfError,
};
use tokio::sync::{Notify, broadcast};
use tokio::task::JoinHandle;
use tracing::info;

use crate::commerce::CommerceAdapter;
use crate::config::StoreConfig;
use crate::context::StoreContext;
use crate::error::{Result, StoreError};
use crate::events::{Event, EventBus, ReconcileTrigger, Topic};
use crate::repository::{BookStatusRepository, FileBookStatusRepository};
use crate::state::StoreSnapshot;
use crate::workers::ReconciliationWorker;

/// Purchase and book-unlock orchestrator.
///
/// Every operation logs its own failures and leaves the previous state in
/// place, so callers only inspect return values when they care.
pub struct Store {
    context: Arc<StoreContext>,
    shutdown: Arc<Notify>,
    listener: Option<JoinHandle<()>>,
}

impl Store {
    /// Create a new store builder
    pub fn builder() -> StoreBuilder {
        StoreBuilder::new()
    }

    pub fn catalog(&self) -> &ProductCatalog {
        self.context.catalog()
    }

    /// Subscribe to store events on one topic
    pub fn subscribe(&self, topic: Topic) -> broadcast::Receiver<Event> {
        self.context.events().subscribe(topic)
    }

    /// Fetch product metadata for the catalog.
    ///
    /// Returns the number of listed products. On failure the previous listing
    /// is kept and its length returned.
    pub async fn load_products(&self) -> usize {
        self.context.load_products().await
    }

    /// Purchase a product that was listed by [`Store::load_products`].
    pub async fn purchase(&self, product_id: &ProductId) -> Option<PurchaseOutcome> {
        self.context.purchase(product_id).await
    }

    /// Run an entitlement pass now, outside of the listener.
    pub async fn refresh_entitlements(&self) -> Vec<OwnershipTransition> {
        self.context.reconcile(ReconcileTrigger::Manual).await
    }

    /// Toggle a book between active and inactive.
    pub async fn toggle_book(&self, slot: usize) -> std::result::Result<BookStatus, ShelfError> {
        self.context.toggle_book(slot).await
    }

    /// Persist the current shelf. Returns whether the write succeeded.
    pub async fn save_status(&self) -> bool {
        self.context.save_status().await
    }

    /// Restore the saved shelf. Returns whether a saved shelf was applied.
    pub async fn load_status(&self) -> bool {
        self.context.load_status().await
    }

    pub async fn books(&self) -> BookShelf {
        self.context.books().await
    }

    pub async fn products(&self) -> Vec<Product> {
        self.context.products().await
    }

    pub async fn owned_products(&self) -> OwnedProducts {
        self.context.owned_products().await
    }

    pub async fn is_owned(&self, product_id: &ProductId) -> bool {
        self.context.owned_products().await.contains(product_id)
    }

    pub async fn ownership(&self, product_id: &ProductId) -> Option<OwnershipState> {
        self.context.ownership(product_id).await
    }

    pub async fn snapshot(&self) -> StoreSnapshot {
        self.context.snapshot().await
    }

    /// Whether the transaction listener is still running.
    pub fn is_listening(&self) -> bool {
        self.listener
            .as_ref()
            .is_some_and(|handle| !handle.is_finished())
    }

    /// Stop the transaction listener and wait for it to finish.
    pub async fn shutdown(mut self) -> Result<()> {
        self.shutdown.notify_one();

        if let Some(listener) = self.listener.take() {
            listener.await.map_err(StoreError::WorkerJoin)?;
        }

        info!("Store shut down");
        Ok(())
    }
}

impl Drop for Store {
    fn drop(&mut self) {
        if self.listener.is_some() {
            self.shutdown.notify_one();
        }
    }
}

/// Builder for [`Store`].
pub struct StoreBuilder {
    config: StoreConfig,
    storefront: Option<Arc<dyn Storefront>>,
    repository: Option<Arc<dyn BookStatusRepository>>,
}

impl StoreBuilder {
    fn new() -> Self {
        Self {
            config: StoreConfig::default(),
            storefront: None,
            repository: None,
        }
    }

    /// Override store configuration
    pub fn config(mut self, config: StoreConfig) -> Self {
        self.config = config;
        self
    }

    /// Set the storefront (required)
    pub fn storefront(self, storefront: impl Storefront + 'static) -> Self {
        self.shared_storefront(Arc::new(storefront))
    }

    /// Set a storefront that is shared with other owners
    pub fn shared_storefront(mut self, storefront: Arc<dyn Storefront>) -> Self {
        self.storefront = Some(storefront);
        self
    }

    /// Replace the file repository at `config.save_path`
    pub fn repository(mut self, repository: impl BookStatusRepository + 'static) -> Self {
        self.repository = Some(Arc::new(repository));
        self
    }

    pub fn shared_repository(mut self, repository: Arc<dyn BookStatusRepository>) -> Self {
        self.repository = Some(repository);
        self
    }

    pub fn autosave(mut self, enable: bool) -> Self {
        self.config.autosave = enable;
        self
    }

    pub fn reconcile_on_start(mut self, enable: bool) -> Self {
        self.config.reconcile_on_start = enable;
        self
    }

    /// Build the store and start the transaction listener.
    ///
    /// The saved shelf is restored before the listener starts, so an early
    /// entitlement pass never autosaves over it. The listener subscribes to
    /// the storefront feed before this returns, so updates pushed right after
    /// building are not missed.
    pub async fn build(self) -> Result<Store> {
        let storefront = self.storefront.ok_or(StoreError::MissingStorefront)?;
        let repository = self.repository.unwrap_or_else(|| {
            Arc::new(FileBookStatusRepository::new(self.config.save_path.clone()))
        });

        let commerce = CommerceAdapter::new(storefront);
        info!(
            storefront = commerce.storefront_name(),
            environment = commerce.environment(),
            "Starting store"
        );

        let events = EventBus::with_capacity(self.config.event_buffer_size);
        let context = Arc::new(StoreContext::new(
            self.config.catalog,
            commerce,
            repository,
            events,
            self.config.autosave,
        ));

        let updates = context.commerce().transaction_updates();
        context.load_status().await;

        let shutdown = Arc::new(Notify::new());
        let worker = ReconciliationWorker::new(
            Arc::clone(&context),
            updates,
            Arc::clone(&shutdown),
            self.config.reconcile_on_start,
        );

        let listener = tokio::spawn(async move {
            worker.run().await;
        });

        Ok(Store {
            context,
            shutdown,
            listener: Some(listener),
        })
    }
}
