//! Core type definitions for AniShelf.
//!
//! This crate defines the identifiers shared by every other crate:
//! - [`EntryId`]: the remote-assigned key of a tracked entry
//! - [`IdentityId`]: the auth service's user id (UUID)
//!
//! Domain types (entries, statuses, sort preferences) live in `anishelf-model`.

mod ids;

pub use ids::{EntryId, IdentityId, GUEST_NAMESPACE};

/// Result type alias using the crate's error type.
pub type Result<T> = std::result::Result<T, Error>;

/// Errors that can occur when parsing identifiers.
#[derive(Debug, thiserror::Error)]
pub enum Error {
    #[error("invalid UUID: {0}")]
    InvalidUuid(#[from] uuid::Error),

    #[error("invalid entry id: {0}")]
    InvalidEntryId(String),
}
