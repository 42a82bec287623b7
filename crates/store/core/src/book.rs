//! Unlock status of the seven trivia books.

use serde::{Deserialize, Serialize};

use crate::catalog::ProductCatalog;
use crate::error::ShelfError;
use crate::ownership::{OwnershipLedger, OwnershipState};

/// Unlock status of one book.
///
/// Serialized as `"active"`, `"inactive"` or `"locked"`.
#[derive(
    Clone,
    Copy,
    Debug,
    PartialEq,
    Eq,
    Hash,
    Serialize,
    Deserialize,
    strum::Display,
    strum::EnumString,
    strum::AsRefStr,
    strum::EnumIter,
)]
#[serde(rename_all = "lowercase")]
#[strum(serialize_all = "lowercase", ascii_case_insensitive)]
pub enum BookStatus {
    /// Unlocked and selected: questions are drawn from this book.
    Active,
    /// Unlocked but deselected.
    Inactive,
    /// Not available until the backing product is owned.
    Locked,
}

impl BookStatus {
    pub const fn is_unlocked(&self) -> bool {
        !matches!(self, Self::Locked)
    }
}

/// A slot whose status changed while applying ownership.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct SlotChange {
    pub slot: usize,
    pub from: BookStatus,
    pub to: BookStatus,
}

/// Positional status of every book; slot `i` is book `i + 1`.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct BookShelf([BookStatus; BookShelf::SLOTS]);

impl BookShelf {
    pub const SLOTS: usize = 7;

    /// Status of a fresh install: two free books selected, one free book
    /// deselected, the purchasable books locked.
    pub const FACTORY_DEFAULT: [BookStatus; Self::SLOTS] = [
        BookStatus::Active,
        BookStatus::Active,
        BookStatus::Inactive,
        BookStatus::Locked,
        BookStatus::Locked,
        BookStatus::Locked,
        BookStatus::Locked,
    ];

    pub const fn factory_default() -> Self {
        Self(Self::FACTORY_DEFAULT)
    }

    pub const fn from_statuses(statuses: [BookStatus; Self::SLOTS]) -> Self {
        Self(statuses)
    }

    pub fn get(&self, slot: usize) -> Option<BookStatus> {
        self.0.get(slot).copied()
    }

    pub fn as_slice(&self) -> &[BookStatus] {
        &self.0
    }

    pub fn iter(&self) -> impl Iterator<Item = BookStatus> + '_ {
        self.0.iter().copied()
    }

    /// Flip an unlocked book between active and inactive.
    pub fn toggle(&mut self, slot: usize) -> Result<SlotChange, ShelfError> {
        let status = self.slot_mut(slot)?;
        let from = *status;
        *status = match from {
            BookStatus::Active => BookStatus::Inactive,
            BookStatus::Inactive => BookStatus::Active,
            BookStatus::Locked => return Err(ShelfError::Locked(slot)),
        };
        Ok(SlotChange {
            slot,
            from,
            to: *status,
        })
    }

    /// Bring purchasable slots in line with the ledger.
    ///
    /// Owned products unlock their locked slot as inactive, products known
    /// not to be owned lock their slot again, unknown products are left alone.
    pub fn apply_ownership(
        &mut self,
        catalog: &ProductCatalog,
        ledger: &OwnershipLedger,
    ) -> Vec<SlotChange> {
        let mut changes = Vec::new();

        for (slot, status) in self.0.iter_mut().enumerate() {
            let Some(state) = catalog.product_at(slot).and_then(|id| ledger.state(id)) else {
                continue;
            };

            let next = match (state, *status) {
                (OwnershipState::Owned, BookStatus::Locked) => BookStatus::Inactive,
                (OwnershipState::NotOwned, current) if current.is_unlocked() => {
                    BookStatus::Locked
                }
                _ => continue,
            };

            changes.push(SlotChange {
                slot,
                from: *status,
                to: next,
            });
            *status = next;
        }

        changes
    }

    fn slot_mut(&mut self, slot: usize) -> Result<&mut BookStatus, ShelfError> {
        self.0.get_mut(slot).ok_or(ShelfError::SlotOutOfRange {
            slot,
            len: Self::SLOTS,
        })
    }
}

impl Default for BookShelf {
    fn default() -> Self {
        Self::factory_default()
    }
}
