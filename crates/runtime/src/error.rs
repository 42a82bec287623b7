//! Errors surfaced by the store orchestrator itself.
//!
//! Storefront and repository failures never reach callers as errors: they are
//! logged where they happen and the previous state is kept. What remains here
//! are construction and lifecycle failures.

use thiserror::Error;

pub type Result<T> = std::result::Result<T, StoreError>;

#[derive(Debug, Error)]
pub enum StoreError {
    #[error("store requires a storefront to be configured before building")]
    MissingStorefront,

    #[error("reconciliation worker join failed")]
    WorkerJoin(#[source] tokio::task::JoinError),
}
