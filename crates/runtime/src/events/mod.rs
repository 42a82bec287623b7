//! Topic-based event bus for store events.
//!
//! Events are published to specific topics, and consumers subscribe only to
//! the topics they need. This is the change-notification surface of the store.

mod bus;
mod types;

pub use bus::{Event, EventBus, Topic};
pub use types::{BooksEvent, CatalogEvent, EntitlementEvent, ReconcileTrigger};
