//! Topic-based event bus implementation.

use std::sync::Arc;

use tokio::sync::broadcast;

use super::types::{BooksEvent, CatalogEvent, EntitlementEvent};

/// Topics for event routing
#[derive(Debug, Clone, Copy, Hash, Eq, PartialEq)]
pub enum Topic {
    /// Product listing
    Catalog,
    /// Purchases and ownership changes
    Entitlements,
    /// Book unlock state and persistence
    Books,
}

/// Event wrapper that carries the topic and typed event
#[derive(Debug, Clone)]
pub enum Event {
    Catalog(CatalogEvent),
    Entitlement(EntitlementEvent),
    Books(BooksEvent),
}

impl Event {
    pub fn topic(&self) -> Topic {
        match self {
            Event::Catalog(_) => Topic::Catalog,
            Event::Entitlement(_) => Topic::Entitlements,
            Event::Books(_) => Topic::Books,
        }
    }
}

struct Channels {
    catalog: broadcast::Sender<Event>,
    entitlements: broadcast::Sender<Event>,
    books: broadcast::Sender<Event>,
}

/// Topic-based event bus
///
/// Consumers subscribe to the topics they care about. Publishing is
/// best-effort: an event with no subscribers is dropped.
#[derive(Clone)]
pub struct EventBus {
    channels: Arc<Channels>,
}

impl EventBus {
    /// Creates a new event bus with default capacity for each topic
    pub fn new() -> Self {
        Self::with_capacity(64)
    }

    /// Creates a new event bus with specified capacity per topic
    pub fn with_capacity(capacity: usize) -> Self {
        let capacity = capacity.max(1);
        Self {
            channels: Arc::new(Channels {
                catalog: broadcast::channel(capacity).0,
                entitlements: broadcast::channel(capacity).0,
                books: broadcast::channel(capacity).0,
            }),
        }
    }

    /// Publish an event to its corresponding topic
    pub fn publish(&self, event: Event) {
        let topic = event.topic();
        if self.sender(topic).send(event).is_err() {
            // No subscribers for this topic - this is normal, not an error
            tracing::trace!("No subscribers for topic {:?}", topic);
        }
    }

    /// Subscribe to a specific topic
    pub fn subscribe(&self, topic: Topic) -> broadcast::Receiver<Event> {
        self.sender(topic).subscribe()
    }

    fn sender(&self, topic: Topic) -> &broadcast::Sender<Event> {
        match topic {
            Topic::Catalog => &self.channels.catalog,
            Topic::Entitlements => &self.channels.entitlements,
            Topic::Books => &self.channels.books,
        }
    }
}

impl Default for EventBus {
    fn default() -> Self {
        Self::new()
    }
}
