//! Common types for storefront interactions.

use std::fmt;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use store_core::ProductId;

use crate::traits::VerificationError;

/// Product descriptor as listed by the storefront.
///
/// Pricing and copy are owned by the platform; the store only displays them.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Product {
    pub id: ProductId,
    pub display_name: String,
    pub description: String,
    /// Localized price string, e.g. `"$2.99"`.
    pub display_price: String,
}

/// Platform transaction identifier.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct TransactionId(pub u64);

impl fmt::Display for TransactionId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "txn-{}", self.0)
    }
}

/// Why the platform withdrew an entitlement.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RevocationReason {
    Refunded,
    FamilySharingRemoved,
    DeveloperIssue,
    Other,
}

/// Revocation marker attached to a transaction.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Revocation {
    pub reason: RevocationReason,
    pub revoked_at: DateTime<Utc>,
}

/// Signed purchase record for one product.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Transaction {
    pub id: TransactionId,
    pub product_id: ProductId,
    pub purchased_at: DateTime<Utc>,
    pub revocation: Option<Revocation>,
}

impl Transaction {
    pub fn is_revoked(&self) -> bool {
        self.revocation.is_some()
    }
}

/// Outcome of cryptographic verification of a signed record.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum VerificationResult<T> {
    Verified(T),
    Unverified(T, VerificationError),
}

impl<T> VerificationResult<T> {
    /// The payload regardless of verification outcome.
    pub fn payload(&self) -> &T {
        match self {
            Self::Verified(value) | Self::Unverified(value, _) => value,
        }
    }

    pub fn is_verified(&self) -> bool {
        matches!(self, Self::Verified(_))
    }
}

/// Raw result of a purchase call as reported by the platform.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PurchaseResult {
    /// The platform completed the purchase and returned a signed transaction.
    Success(VerificationResult<Transaction>),
    /// Waiting for approval (e.g. parental consent).
    Pending,
    /// The user cancelled, or a guardian declined the request.
    UserCancelled,
}

/// Store-level interpretation of a purchase.
///
/// Only [`PurchaseOutcome::Verified`] may grant an entitlement.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PurchaseOutcome {
    Verified(ProductId),
    Unverified {
        product_id: ProductId,
        reason: VerificationError,
    },
    Pending,
    Cancelled,
}

impl PurchaseOutcome {
    pub fn grants_entitlement(&self) -> bool {
        matches!(self, Self::Verified(_))
    }
}

impl From<PurchaseResult> for PurchaseOutcome {
    fn from(result: PurchaseResult) -> Self {
        match result {
            PurchaseResult::Success(VerificationResult::Verified(transaction)) => {
                Self::Verified(transaction.product_id)
            }
            PurchaseResult::Success(VerificationResult::Unverified(transaction, reason)) => {
                Self::Unverified {
                    product_id: transaction.product_id,
                    reason,
                }
            }
            PurchaseResult::Pending => Self::Pending,
            PurchaseResult::UserCancelled => Self::Cancelled,
        }
    }
}

/// Kind of out-of-band change announced on the transaction feed.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum UpdateKind {
    Purchased,
    Renewed,
    Revoked,
    Refunded,
    FamilySharingChanged,
}

/// Notification pushed by the platform whenever a transaction changes.
///
/// The payload is informational: consumers re-query entitlements rather than
/// trusting the update itself.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TransactionUpdate {
    pub transaction_id: TransactionId,
    pub product_id: ProductId,
    pub kind: UpdateKind,
}
