//! Trivia client binary.
//!
//! This binary is the composition root that assembles:
//! 1. Configuration and logging via `client-bootstrap`
//! 2. A storefront implementation
//! 3. The store (purchases, entitlements, book unlocks) via `StoreBuilder`
//!
//! The store runs until Ctrl-C, then saves the shelf and shuts down.

use anyhow::{Context, Result};
use client_bootstrap::{AppConfig, run_startup, setup_logging};
use client_commerce_sandbox::SandboxStorefront;
use store_core::ProductCatalog;
use store_runtime::Store;
use tracing::{info, warn};

#[tokio::main]
async fn main() -> Result<()> {
    // Load .env file if it exists (silently ignore if not found)
    let _ = dotenvy::dotenv();

    let config = AppConfig::from_env();
    let _guard = setup_logging(&config.log_dir)?;

    info!("Starting trivia client");
    info!("Save directory: {}", config.save_dir.display());
    info!("Autosave: {}", config.autosave);

    let store_config = config.store_config();
    let storefront = SandboxStorefront::with_catalog(&store_config.catalog);
    if config.storefront_env != "sandbox" {
        warn!(
            requested = %config.storefront_env,
            "Only the sandbox storefront is built into this client, using sandbox"
        );
    }

    let store = Store::builder()
        .config(store_config)
        .storefront(storefront)
        .build()
        .await
        .context("Failed to build store")?;

    run_startup(&store).await;
    log_shelf(&store).await;

    info!("Store running, press Ctrl-C to quit");
    tokio::signal::ctrl_c()
        .await
        .context("Failed to listen for Ctrl-C")?;

    if !store.save_status().await {
        warn!("Book statuses were not saved on exit");
    }
    store.shutdown().await?;

    info!("Client shutdown complete");
    Ok(())
}

async fn log_shelf(store: &Store) {
    let snapshot = store.snapshot().await;

    for (slot, status) in snapshot.books.iter().enumerate() {
        match store.catalog().product_at(slot) {
            Some(product_id) => info!(
                book = slot + 1,
                %status,
                product = %product_id,
                owned = snapshot.owned.contains(product_id),
                "Book"
            ),
            None => info!(book = slot + 1, %status, "Book"),
        }
    }

    if snapshot.products.len() < ProductCatalog::LEN {
        warn!(
            listed = snapshot.products.len(),
            "Not every book is available for purchase right now"
        );
    }
}
