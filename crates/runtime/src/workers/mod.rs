//! Worker tasks that back the store.
//!
//! The reconciliation worker is the only long-lived task: it listens for
//! storefront transaction updates for the lifetime of the store.

mod reconciliation;

pub(crate) use reconciliation::ReconciliationWorker;
