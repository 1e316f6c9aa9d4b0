//! Shared error surface for the document-store adapters.
//!
//! The managed store exposes conditional single-document writes; every
//! repository trait in this crate composes those, never multi-document
//! transactions.

/// Error enumeration for store adapter failures.
#[derive(Debug, thiserror::Error)]
pub enum RepositoryError {
    #[error("conditional write lost a concurrent race")]
    Conflict,
    #[error("record not found")]
    NotFound,
    #[error("store unavailable: {0}")]
    Unavailable(String),
}
