//! Shared error type for the record stores.
//!
//! The track, set and batch stores are seams the surrounding system plugs
//! its durable database into; the in-memory implementations shipped here
//! back tests and single-node deployments.

#[derive(Debug, Clone, thiserror::Error)]
pub enum StoreError {
    #[error("record not found: {0}")]
    NotFound(String),

    #[error("store backend error: {0}")]
    Backend(String),
}

pub type StoreResult<T> = Result<T, StoreError>;
