//! Background listener that keeps ownership in sync with the storefront.
//!
//! The worker subscribes to the storefront's transaction feed and runs a full
//! entitlement pass whenever something arrives. Update payloads are only a
//! wake-up signal: the pass re-queries every catalog product, so a missed or
//! reordered update cannot leave ownership stale.

use std::sync::Arc;

use client_commerce_core::TransactionUpdate;
use tokio::sync::{Notify, broadcast};
use tracing::{debug, info, warn};

use crate::context::StoreContext;
use crate::events::ReconcileTrigger;

pub(crate) struct ReconciliationWorker {
    context: Arc<StoreContext>,
    updates: broadcast::Receiver<TransactionUpdate>,
    shutdown: Arc<Notify>,
    reconcile_on_start: bool,
}

impl ReconciliationWorker {
    pub(crate) fn new(
        context: Arc<StoreContext>,
        updates: broadcast::Receiver<TransactionUpdate>,
        shutdown: Arc<Notify>,
        reconcile_on_start: bool,
    ) -> Self {
        Self {
            context,
            updates,
            shutdown,
            reconcile_on_start,
        }
    }

    /// Main worker loop.
    pub(crate) async fn run(mut self) {
        info!("ReconciliationWorker started");

        if self.reconcile_on_start {
            self.context.reconcile(ReconcileTrigger::Startup).await;
        }

        loop {
            tokio::select! {
                biased;

                _ = self.shutdown.notified() => {
                    debug!("Shutdown requested");
                    break;
                }

                update = self.updates.recv() => {
                    match update {
                        Ok(update) => {
                            debug!(
                                transaction = %update.transaction_id,
                                product = %update.product_id,
                                kind = ?update.kind,
                                "Transaction update received"
                            );
                            self.context.reconcile(ReconcileTrigger::TransactionUpdate).await;
                        }
                        Err(broadcast::error::RecvError::Lagged(skipped)) => {
                            warn!(skipped, "Transaction listener lagged, reconciling everything");
                            self.context.reconcile(ReconcileTrigger::Lagged).await;
                        }
                        Err(broadcast::error::RecvError::Closed) => {
                            info!("Transaction feed closed");
                            break;
                        }
                    }
                }
            }
        }

        info!("ReconciliationWorker stopped");
    }
}
