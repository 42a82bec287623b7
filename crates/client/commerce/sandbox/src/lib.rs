//! Sandbox storefront for local runs and tests.
//!
//! [`SandboxStorefront`] implements the full [`client_commerce_core::Storefront`]
//! contract in memory. Purchase outcomes can be scripted ahead of time and
//! entitlements can be granted, revoked, corrupted or cleared out of band;
//! each out-of-band change is announced on the transaction feed the same way
//! a real platform would.

mod storefront;

pub use storefront::{SandboxStorefront, ScriptedPurchase};
