//! Startup sequence run once the store is built.

use store_runtime::Store;
use tracing::info;

/// What the startup sequence managed to restore.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct StartupReport {
    /// Products listed by the storefront.
    pub products_loaded: usize,
    /// Whether a saved shelf replaced the factory default.
    pub statuses_restored: bool,
}

/// Fetch products and restore saved book statuses concurrently.
///
/// Neither step depends on the other, and a failure in one leaves the other
/// untouched. Entitlements are checked by the store's listener on its own.
pub async fn run_startup(store: &Store) -> StartupReport {
    let (products_loaded, statuses_restored) =
        tokio::join!(store.load_products(), store.load_status());

    let report = StartupReport {
        products_loaded,
        statuses_restored,
    };
    info!(
        products = report.products_loaded,
        restored = report.statuses_restored,
        "Startup finished"
    );
    report
}
