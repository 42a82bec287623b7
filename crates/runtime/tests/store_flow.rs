use std::sync::Arc;
use std::time::Duration;

use client_commerce_core::{
    CommerceError, Product, PurchaseError, PurchaseOutcome, RevocationReason, UpdateKind,
};
use client_commerce_sandbox::{SandboxStorefront, ScriptedPurchase};
use store_core::{BookShelf, BookStatus, OwnedProducts, OwnershipState, ProductId};
use store_runtime::{
    BookStatusRepository, BooksEvent, EntitlementEvent, Event, FileBookStatusRepository,
    InMemoryBookStatusRepo, ReconcileTrigger, Store, StoreConfig, StoreError, Topic,
};
use tokio::sync::broadcast;
use tokio::time::timeout;

const WAIT: Duration = Duration::from_secs(5);

fn id(raw: &str) -> ProductId {
    ProductId::from(raw)
}

async fn build_store(
    sandbox: &SandboxStorefront,
    repository: &Arc<InMemoryBookStatusRepo>,
) -> Store {
    Store::builder()
        .storefront(sandbox.clone())
        .shared_repository(repository.clone())
        .reconcile_on_start(false)
        .build()
        .await
        .expect("store should build")
}

/// Wait for the next entitlement pass with the given trigger.
async fn next_reconciled(
    events: &mut broadcast::Receiver<Event>,
    expected: ReconcileTrigger,
) -> OwnedProducts {
    timeout(WAIT, async {
        loop {
            match events.recv().await {
                Ok(Event::Entitlement(EntitlementEvent::Reconciled { trigger, owned }))
                    if trigger == expected =>
                {
                    return owned;
                }
                Ok(_) | Err(broadcast::error::RecvError::Lagged(_)) => continue,
                Err(broadcast::error::RecvError::Closed) => panic!("event bus closed"),
            }
        }
    })
    .await
    .expect("reconciliation should finish")
}

// ============================================================================
// Product listing
// ============================================================================

#[tokio::test]
async fn loads_every_catalog_product_once() {
    let sandbox = SandboxStorefront::default();
    let repository = Arc::new(InMemoryBookStatusRepo::new());
    let store = build_store(&sandbox, &repository).await;

    assert_eq!(store.load_products().await, 4);

    let ids: Vec<ProductId> = store.products().await.into_iter().map(|p| p.id).collect();
    assert_eq!(ids, vec![id("hp4"), id("hp5"), id("hp6"), id("hp7")]);

    store.shutdown().await.expect("shutdown");
}

#[tokio::test]
async fn listing_drops_duplicates_and_foreign_products() {
    let product = |raw: &str| Product {
        id: id(raw),
        display_name: raw.to_uppercase(),
        description: String::new(),
        display_price: "$2.99".to_string(),
    };
    let sandbox = SandboxStorefront::new(vec![
        product("hp7"),
        product("hp5"),
        product("hp5"),
        product("hp9"),
        product("hp4"),
        product("hp6"),
    ]);
    let repository = Arc::new(InMemoryBookStatusRepo::new());
    let store = build_store(&sandbox, &repository).await;

    assert_eq!(store.load_products().await, 4);
    let ids: Vec<ProductId> = store.products().await.into_iter().map(|p| p.id).collect();
    assert_eq!(ids, vec![id("hp4"), id("hp5"), id("hp6"), id("hp7")]);

    store.shutdown().await.expect("shutdown");
}

#[tokio::test]
async fn failed_listing_keeps_previous_products() {
    let sandbox = SandboxStorefront::default();
    let repository = Arc::new(InMemoryBookStatusRepo::new());
    let store = build_store(&sandbox, &repository).await;

    assert_eq!(store.load_products().await, 4);

    sandbox.fail_listing(CommerceError::NetworkError("offline".into()));
    assert_eq!(store.load_products().await, 4);
    assert_eq!(store.products().await.len(), 4);

    store.shutdown().await.expect("shutdown");
}

// ============================================================================
// Purchases
// ============================================================================

#[tokio::test]
async fn verified_purchase_grants_ownership_and_unlocks_book() {
    let sandbox = SandboxStorefront::default();
    let repository = Arc::new(InMemoryBookStatusRepo::new());
    let store = build_store(&sandbox, &repository).await;
    let mut books = store.subscribe(Topic::Books);

    store.load_products().await;
    let outcome = store.purchase(&id("hp5")).await;

    assert_eq!(outcome, Some(PurchaseOutcome::Verified(id("hp5"))));
    assert!(store.is_owned(&id("hp5")).await);
    assert_eq!(store.books().await.get(4), Some(BookStatus::Inactive));
    assert_eq!(
        repository.saved().and_then(|shelf| shelf.get(4)),
        Some(BookStatus::Inactive)
    );

    let event = timeout(WAIT, books.recv())
        .await
        .expect("books event")
        .expect("bus open");
    assert!(matches!(event, Event::Books(BooksEvent::Changed { .. })));

    store.shutdown().await.expect("shutdown");
}

#[tokio::test]
async fn non_verified_outcomes_leave_ownership_unchanged() {
    let sandbox = SandboxStorefront::default();
    let repository = Arc::new(InMemoryBookStatusRepo::new());
    let store = build_store(&sandbox, &repository).await;
    store.load_products().await;

    sandbox.script_purchase(ScriptedPurchase::ApproveUnverified("bad signature".into()));
    let outcome = store.purchase(&id("hp4")).await;
    assert!(matches!(outcome, Some(PurchaseOutcome::Unverified { .. })));

    sandbox.script_purchase(ScriptedPurchase::Pending);
    assert_eq!(store.purchase(&id("hp4")).await, Some(PurchaseOutcome::Pending));

    sandbox.script_purchase(ScriptedPurchase::Cancel);
    assert_eq!(store.purchase(&id("hp4")).await, Some(PurchaseOutcome::Cancelled));

    sandbox.script_purchase(ScriptedPurchase::Fail(PurchaseError::NotAllowed));
    assert_eq!(store.purchase(&id("hp4")).await, None);

    assert!(store.owned_products().await.is_empty());
    assert_eq!(store.books().await, BookShelf::factory_default());
    assert_eq!(repository.saved(), None);

    store.shutdown().await.expect("shutdown");
}

#[tokio::test]
async fn non_verified_outcomes_keep_existing_ownership() {
    let sandbox = SandboxStorefront::default();
    let repository = Arc::new(InMemoryBookStatusRepo::new());
    let store = build_store(&sandbox, &repository).await;
    store.load_products().await;

    assert_eq!(
        store.purchase(&id("hp5")).await,
        Some(PurchaseOutcome::Verified(id("hp5")))
    );
    let books = store.books().await;

    for script in [
        ScriptedPurchase::ApproveUnverified("replayed receipt".into()),
        ScriptedPurchase::Pending,
        ScriptedPurchase::Cancel,
    ] {
        sandbox.script_purchase(script);
        let outcome = store
            .purchase(&id("hp5"))
            .await
            .expect("purchase call should return an outcome");

        assert!(!outcome.grants_entitlement());
        assert!(store.is_owned(&id("hp5")).await);
    }

    assert_eq!(store.owned_products().await.len(), 1);
    assert_eq!(store.books().await, books);

    store.shutdown().await.expect("shutdown");
}

#[tokio::test]
async fn purchase_requires_loaded_product() {
    let sandbox = SandboxStorefront::default();
    let repository = Arc::new(InMemoryBookStatusRepo::new());
    let store = build_store(&sandbox, &repository).await;

    assert_eq!(store.purchase(&id("hp6")).await, None);
    assert!(store.owned_products().await.is_empty());

    store.shutdown().await.expect("shutdown");
}

// ============================================================================
// Entitlement reconciliation
// ============================================================================

#[tokio::test]
async fn revoked_purchase_is_removed_by_listener() {
    let sandbox = SandboxStorefront::default();
    let repository = Arc::new(InMemoryBookStatusRepo::new());
    let store = build_store(&sandbox, &repository).await;
    let mut events = store.subscribe(Topic::Entitlements);

    store.load_products().await;
    store.purchase(&id("hp5")).await;
    assert!(store.is_owned(&id("hp5")).await);

    assert!(sandbox.revoke(&id("hp5"), RevocationReason::Refunded));
    let owned = next_reconciled(&mut events, ReconcileTrigger::TransactionUpdate).await;

    assert!(owned.is_empty());
    assert!(store.owned_products().await.is_empty());
    assert_eq!(
        store.ownership(&id("hp5")).await,
        Some(OwnershipState::NotOwned)
    );
    assert_eq!(store.books().await.get(4), Some(BookStatus::Locked));

    store.shutdown().await.expect("shutdown");
}

#[tokio::test]
async fn out_of_band_grant_is_picked_up() {
    let sandbox = SandboxStorefront::default();
    let repository = Arc::new(InMemoryBookStatusRepo::new());
    let store = build_store(&sandbox, &repository).await;
    let mut events = store.subscribe(Topic::Entitlements);

    sandbox.grant(&id("hp7"));
    let owned = next_reconciled(&mut events, ReconcileTrigger::TransactionUpdate).await;

    assert!(owned.contains(&id("hp7")));
    assert_eq!(store.books().await.get(6), Some(BookStatus::Inactive));

    store.shutdown().await.expect("shutdown");
}

#[tokio::test]
async fn missing_record_does_not_stop_the_pass() {
    let sandbox = SandboxStorefront::default();
    sandbox.grant(&id("hp6"));
    let repository = Arc::new(InMemoryBookStatusRepo::new());
    let store = build_store(&sandbox, &repository).await;

    // hp4 and hp5 have no record; hp6 is checked after them.
    let transitions = store.refresh_entitlements().await;

    assert_eq!(transitions.len(), 4);
    assert!(store.is_owned(&id("hp6")).await);
    assert_eq!(
        store.ownership(&id("hp4")).await,
        Some(OwnershipState::NotOwned)
    );

    store.shutdown().await.expect("shutdown");
}

#[tokio::test]
async fn unverified_entitlement_is_ignored() {
    let sandbox = SandboxStorefront::default();
    let repository = Arc::new(InMemoryBookStatusRepo::new());
    let store = build_store(&sandbox, &repository).await;

    sandbox.corrupt_entitlement(&id("hp4"), "tampered");
    store.refresh_entitlements().await;

    assert!(!store.is_owned(&id("hp4")).await);
    assert_eq!(store.ownership(&id("hp4")).await, Some(OwnershipState::Unknown));
    assert_eq!(store.books().await.get(3), Some(BookStatus::Locked));

    store.shutdown().await.expect("shutdown");
}

#[tokio::test]
async fn lagged_listener_reconciles_everything() {
    let sandbox = SandboxStorefront::default();
    let repository = Arc::new(InMemoryBookStatusRepo::new());
    let store = build_store(&sandbox, &repository).await;
    let mut events = store.subscribe(Topic::Entitlements);

    // Overflow the feed before the listener gets a chance to drain it.
    let catalog: Vec<ProductId> = store.catalog().iter().cloned().collect();
    for round in 0..SandboxStorefront::FEED_CAPACITY {
        sandbox.grant(&catalog[round % catalog.len()]);
    }
    assert!(sandbox.revoke(&id("hp6"), RevocationReason::Refunded));

    let owned = next_reconciled(&mut events, ReconcileTrigger::Lagged).await;

    let expected: Vec<ProductId> = vec![id("hp4"), id("hp5"), id("hp7")];
    assert_eq!(owned.iter().cloned().collect::<Vec<_>>(), expected);
    assert_eq!(
        store.ownership(&id("hp6")).await,
        Some(OwnershipState::NotOwned)
    );

    let books = store.books().await;
    assert_eq!(books.get(3), Some(BookStatus::Inactive));
    assert_eq!(books.get(4), Some(BookStatus::Inactive));
    assert_eq!(books.get(5), Some(BookStatus::Locked));
    assert_eq!(books.get(6), Some(BookStatus::Inactive));

    store.shutdown().await.expect("shutdown");
}

#[tokio::test]
async fn startup_pass_runs_when_enabled() {
    let sandbox = SandboxStorefront::default();
    sandbox.grant(&id("hp4"));

    let config = StoreConfig {
        autosave: false,
        ..StoreConfig::default()
    };
    let store = Store::builder()
        .config(config)
        .storefront(sandbox.clone())
        .repository(InMemoryBookStatusRepo::new())
        .build()
        .await
        .expect("store should build");

    // No update was pushed after building, so only the startup pass can
    // observe the grant.
    timeout(WAIT, async {
        while !store.is_owned(&id("hp4")).await {
            tokio::time::sleep(Duration::from_millis(10)).await;
        }
    })
    .await
    .expect("startup pass should observe the grant");

    assert_eq!(store.books().await.get(3), Some(BookStatus::Inactive));

    store.shutdown().await.expect("shutdown");
}

// ============================================================================
// Books and persistence
// ============================================================================

#[tokio::test]
async fn load_without_save_keeps_factory_default() {
    let sandbox = SandboxStorefront::default();
    let repository = Arc::new(InMemoryBookStatusRepo::new());
    let store = build_store(&sandbox, &repository).await;

    assert!(!store.load_status().await);
    assert_eq!(store.books().await, BookShelf::factory_default());

    store.shutdown().await.expect("shutdown");
}

#[tokio::test]
async fn restored_shelf_is_relocked_for_unowned_products() {
    let sandbox = SandboxStorefront::default();
    let saved = BookShelf::from_statuses([BookStatus::Active; BookShelf::SLOTS]);
    let repository = Arc::new(InMemoryBookStatusRepo::with_saved(saved));
    let store = build_store(&sandbox, &repository).await;

    // Nothing observed yet: the restored unlocks stand.
    assert!(store.load_status().await);
    assert_eq!(store.books().await, saved);

    store.refresh_entitlements().await;
    let books = store.books().await;
    assert!(books.as_slice()[..3].iter().all(|s| *s == BookStatus::Active));
    assert!(books.as_slice()[3..].iter().all(|s| *s == BookStatus::Locked));
    assert_eq!(repository.saved(), Some(books));

    store.shutdown().await.expect("shutdown");
}

#[tokio::test]
async fn toggle_updates_shelf_and_autosaves() {
    let sandbox = SandboxStorefront::default();
    let repository = Arc::new(InMemoryBookStatusRepo::new());
    let store = build_store(&sandbox, &repository).await;

    assert_eq!(store.toggle_book(2).await, Ok(BookStatus::Active));
    assert!(store.toggle_book(3).await.is_err());
    assert_eq!(
        repository.saved().and_then(|shelf| shelf.get(2)),
        Some(BookStatus::Active)
    );

    store.shutdown().await.expect("shutdown");
}

#[tokio::test]
async fn save_then_load_round_trips_through_file() {
    let dir = tempfile::tempdir().expect("tempdir");
    let sandbox = SandboxStorefront::default();

    let store = Store::builder()
        .config(StoreConfig::in_dir(dir.path()))
        .storefront(sandbox.clone())
        .autosave(false)
        .reconcile_on_start(false)
        .build()
        .await
        .expect("store should build");
    store.toggle_book(0).await.expect("toggle");
    assert!(store.save_status().await);
    let expected = store.books().await;
    store.shutdown().await.expect("shutdown");

    let reopened = Store::builder()
        .config(StoreConfig::in_dir(dir.path()))
        .storefront(sandbox)
        .reconcile_on_start(false)
        .build()
        .await
        .expect("store should build");
    assert!(reopened.load_status().await);
    assert_eq!(reopened.books().await, expected);

    reopened.shutdown().await.expect("shutdown");
}

#[tokio::test(flavor = "multi_thread", worker_threads = 2)]
async fn startup_pass_keeps_saved_selection() {
    let dir = tempfile::tempdir().expect("tempdir");
    let saved = BookShelf::from_statuses([
        BookStatus::Inactive,
        BookStatus::Active,
        BookStatus::Active,
        BookStatus::Active,
        BookStatus::Locked,
        BookStatus::Locked,
        BookStatus::Locked,
    ]);
    let file = FileBookStatusRepository::in_dir(dir.path());
    file.save(&saved).expect("seed save file");

    let sandbox = SandboxStorefront::default();
    sandbox.grant(&id("hp4"));

    let store = Store::builder()
        .config(StoreConfig::in_dir(dir.path()))
        .storefront(sandbox.clone())
        .build()
        .await
        .expect("store should build");

    timeout(WAIT, async {
        while !store.is_owned(&id("hp4")).await {
            tokio::time::sleep(Duration::from_millis(10)).await;
        }
    })
    .await
    .expect("startup pass should observe the grant");

    assert_eq!(store.books().await, saved);
    assert_eq!(file.load().expect("read save file"), Some(saved));

    let (_, restored) = tokio::join!(store.load_products(), store.load_status());
    assert!(restored);
    assert_eq!(store.books().await, saved);

    store.shutdown().await.expect("shutdown");
}

// ============================================================================
// Lifecycle
// ============================================================================

#[tokio::test]
async fn build_requires_storefront() {
    let result = Store::builder().build().await;
    assert!(matches!(result, Err(StoreError::MissingStorefront)));
}

#[tokio::test]
async fn closed_feed_stops_listener() {
    let sandbox = SandboxStorefront::default();
    let repository = Arc::new(InMemoryBookStatusRepo::new());
    let store = build_store(&sandbox, &repository).await;

    sandbox.close_feed();
    timeout(WAIT, async {
        while store.is_listening() {
            tokio::time::sleep(Duration::from_millis(10)).await;
        }
    })
    .await
    .expect("listener should stop");

    // The store keeps serving calls without a listener.
    assert_eq!(store.load_products().await, 4);
    store.shutdown().await.expect("shutdown");
}

#[tokio::test]
async fn shutdown_stops_listener_promptly() {
    let sandbox = SandboxStorefront::default();
    let repository = Arc::new(InMemoryBookStatusRepo::new());
    let store = build_store(&sandbox, &repository).await;
    assert!(store.is_listening());

    timeout(WAIT, store.shutdown())
        .await
        .expect("shutdown should not hang")
        .expect("worker should join");

    // Updates after shutdown have no listener and must not panic.
    sandbox.notify(&id("hp4"), UpdateKind::Renewed);
}
