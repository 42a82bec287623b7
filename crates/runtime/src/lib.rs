//! Store orchestration for book purchases and unlocks.
//!
//! This crate wires the storefront abstraction, the book repository, and the
//! transaction listener into a single [`Store`] API. Consumers build a store
//! with [`StoreBuilder`], drive purchases and book toggles through it, and
//! subscribe to events on the [`EventBus`] topics.
//!
//! Modules are organized by responsibility:
//! - [`store`] hosts the orchestrator and builder
//! - [`commerce`] translates storefront records into store-level results
//! - [`events`] provides the topic-based event bus
//! - [`repository`] persists the book shelf
//! - [`workers`] keeps the transaction listener internal to the crate
pub mod commerce;
pub mod config;
pub mod error;
pub mod events;
pub mod repository;
pub mod state;
pub mod store;

mod context;
mod workers;

pub use commerce::CommerceAdapter;
pub use config::StoreConfig;
pub use error::{Result, StoreError};
pub use events::{
    BooksEvent, CatalogEvent, EntitlementEvent, Event, EventBus, ReconcileTrigger, Topic,
};
pub use repository::{
    BookStatusRepository, FileBookStatusRepository, InMemoryBookStatusRepo, RepositoryError,
};
pub use state::{StoreSnapshot, StoreState};
pub use store::{Store, StoreBuilder};
