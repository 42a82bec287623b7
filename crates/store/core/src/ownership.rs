//! Per-product ownership state derived from platform entitlements.
//!
//! The ledger is the only place where ownership changes. Every transition is
//! driven by one of two inputs:
//! - a completed purchase whose receipt verified, or
//! - the result of a single entitlement query ([`EntitlementCheck`]).
//!
//! An unverified record never grants ownership, whichever path it arrives on.

use std::collections::{BTreeMap, BTreeSet};

use serde::{Deserialize, Serialize};

use crate::catalog::{ProductCatalog, ProductId};

/// Ownership of a single product as last observed.
#[derive(
    Clone,
    Copy,
    Debug,
    Default,
    PartialEq,
    Eq,
    Hash,
    Serialize,
    Deserialize,
    strum::Display,
    strum::AsRefStr,
)]
#[serde(rename_all = "snake_case")]
#[strum(serialize_all = "snake_case")]
pub enum OwnershipState {
    /// No entitlement has been observed yet this session.
    #[default]
    Unknown,
    Owned,
    NotOwned,
}

/// Platform-neutral outcome of one entitlement query.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, strum::Display)]
#[strum(serialize_all = "snake_case")]
pub enum EntitlementCheck {
    /// Verified record without a revocation marker.
    Active,
    /// Verified record carrying a revocation marker.
    Revoked,
    /// The platform has no record for the product.
    Missing,
    /// A record exists but failed verification.
    Unverified,
}

/// A state change recorded by the ledger.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct OwnershipTransition {
    pub product_id: ProductId,
    pub from: OwnershipState,
    pub to: OwnershipState,
}

/// Set of product identifiers currently entitled to the user.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct OwnedProducts(BTreeSet<ProductId>);

impl OwnedProducts {
    pub fn contains(&self, id: &ProductId) -> bool {
        self.0.contains(id)
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = &ProductId> {
        self.0.iter()
    }
}

impl FromIterator<ProductId> for OwnedProducts {
    fn from_iter<I: IntoIterator<Item = ProductId>>(iter: I) -> Self {
        Self(iter.into_iter().collect())
    }
}

/// Ownership state for every product of a catalog.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct OwnershipLedger {
    states: BTreeMap<ProductId, OwnershipState>,
}

impl OwnershipLedger {
    /// Start every catalog product in [`OwnershipState::Unknown`].
    pub fn new(catalog: &ProductCatalog) -> Self {
        Self {
            states: catalog
                .iter()
                .map(|id| (id.clone(), OwnershipState::Unknown))
                .collect(),
        }
    }

    /// Current state of `id`, or `None` if it is not tracked.
    pub fn state(&self, id: &ProductId) -> Option<OwnershipState> {
        self.states.get(id).copied()
    }

    /// Apply the result of an entitlement query.
    ///
    /// Returns the transition when the state actually changed.
    pub fn record_check(
        &mut self,
        id: &ProductId,
        check: EntitlementCheck,
    ) -> Option<OwnershipTransition> {
        let next = match check {
            EntitlementCheck::Active => OwnershipState::Owned,
            EntitlementCheck::Revoked | EntitlementCheck::Missing => OwnershipState::NotOwned,
            EntitlementCheck::Unverified => return None,
        };
        self.transition(id, next)
    }

    /// Apply a completed purchase whose receipt verified.
    pub fn record_verified_purchase(&mut self, id: &ProductId) -> Option<OwnershipTransition> {
        self.transition(id, OwnershipState::Owned)
    }

    /// Products currently in [`OwnershipState::Owned`].
    pub fn owned(&self) -> OwnedProducts {
        self.states
            .iter()
            .filter(|(_, state)| **state == OwnershipState::Owned)
            .map(|(id, _)| id.clone())
            .collect()
    }

    fn transition(&mut self, id: &ProductId, next: OwnershipState) -> Option<OwnershipTransition> {
        let state = self.states.get_mut(id)?;
        if *state == next {
            return None;
        }
        let from = std::mem::replace(state, next);
        Some(OwnershipTransition {
            product_id: id.clone(),
            from,
            to: next,
        })
    }
}
