//! Purchasable products and their mapping onto shelf slots.

use std::fmt;

use serde::{Deserialize, Serialize};

use crate::book::BookShelf;
use crate::error::CatalogError;

/// Platform identifier of a purchasable product (e.g. `"hp4"`).
#[derive(Clone, Debug, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ProductId(String);

impl ProductId {
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for ProductId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl AsRef<str> for ProductId {
    fn as_ref(&self) -> &str {
        &self.0
    }
}

impl From<&str> for ProductId {
    fn from(id: &str) -> Self {
        Self::new(id)
    }
}

impl From<String> for ProductId {
    fn from(id: String) -> Self {
        Self(id)
    }
}

/// Fixed, ordered list of purchasable products.
///
/// Product `i` unlocks shelf slot [`ProductCatalog::FIRST_PURCHASABLE_SLOT`]` + i`.
/// Slots before that are free content and never appear here.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct ProductCatalog {
    ids: [ProductId; ProductCatalog::LEN],
}

impl ProductCatalog {
    /// Number of purchasable products.
    pub const LEN: usize = 4;
    /// First shelf slot backed by a product.
    pub const FIRST_PURCHASABLE_SLOT: usize = BookShelf::SLOTS - Self::LEN;
    /// Identifiers shipped with the game.
    pub const STANDARD_IDS: [&'static str; Self::LEN] = ["hp4", "hp5", "hp6", "hp7"];

    /// Build a catalog from four distinct, non-empty identifiers.
    pub fn new(ids: [ProductId; Self::LEN]) -> Result<Self, CatalogError> {
        for (index, id) in ids.iter().enumerate() {
            if id.as_str().is_empty() {
                return Err(CatalogError::EmptyIdentifier);
            }
            if ids[..index].contains(id) {
                return Err(CatalogError::DuplicateProduct(id.clone()));
            }
        }
        Ok(Self { ids })
    }

    /// The catalog shipped with the game: `hp4` through `hp7`.
    pub fn standard() -> Self {
        Self {
            ids: Self::STANDARD_IDS.map(ProductId::from),
        }
    }

    pub fn ids(&self) -> &[ProductId] {
        &self.ids
    }

    pub fn iter(&self) -> impl Iterator<Item = &ProductId> {
        self.ids.iter()
    }

    pub fn contains(&self, id: &ProductId) -> bool {
        self.ids.contains(id)
    }

    /// Shelf slot unlocked by `id`, if it belongs to this catalog.
    pub fn slot_of(&self, id: &ProductId) -> Option<usize> {
        self.ids
            .iter()
            .position(|candidate| candidate == id)
            .map(|index| index + Self::FIRST_PURCHASABLE_SLOT)
    }

    /// Product backing `slot`, or `None` for free and out-of-range slots.
    pub fn product_at(&self, slot: usize) -> Option<&ProductId> {
        slot.checked_sub(Self::FIRST_PURCHASABLE_SLOT)
            .and_then(|index| self.ids.get(index))
    }
}

impl Default for ProductCatalog {
    fn default() -> Self {
        Self::standard()
    }
}
