//! Identifier types used throughout AniShelf.
//!
//! Entry ids are assigned by the remote database (a `bigint` identity column),
//! identity ids are the auth service's UUIDs.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use uuid::Uuid;

use crate::Error;

/// Namespace used for per-identity keys when nobody is signed in.
pub const GUEST_NAMESPACE: &str = "guest";

/// Unique identifier for a tracked entry.
///
/// Assigned by the remote collaborator at insertion and never changed.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct EntryId(i64);

impl EntryId {
    /// Wraps a remote-assigned key.
    #[must_use]
    pub const fn new(raw: i64) -> Self {
        Self(raw)
    }

    /// Returns the raw key.
    #[must_use]
    pub const fn get(&self) -> i64 {
        self.0
    }

    /// Parses an entry id from its decimal form.
    pub fn parse(s: &str) -> Result<Self, Error> {
        s.trim()
            .parse::<i64>()
            .map(Self)
            .map_err(|_| Error::InvalidEntryId(s.to_string()))
    }
}

impl From<i64> for EntryId {
    fn from(raw: i64) -> Self {
        Self(raw)
    }
}

impl fmt::Display for EntryId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl FromStr for EntryId {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::parse(s)
    }
}

/// Identifier of an authenticated user.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct IdentityId(Uuid);

impl IdentityId {
    /// Creates a random identity id. Real ids come from the auth service;
    /// this is for tests and local fixtures.
    #[must_use]
    pub fn new() -> Self {
        Self(Uuid::new_v4())
    }

    /// Creates an identity id from an existing UUID.
    #[must_use]
    pub const fn from_uuid(uuid: Uuid) -> Self {
        Self(uuid)
    }

    /// Returns the underlying UUID.
    #[must_use]
    pub const fn as_uuid(&self) -> Uuid {
        self.0
    }

    /// Parses an identity id from a string.
    pub fn parse(s: &str) -> Result<Self, uuid::Error> {
        Ok(Self(Uuid::parse_str(s)?))
    }

    /// Returns the first `n` characters of the hyphenated form.
    #[must_use]
    pub fn short(&self, n: usize) -> String {
        self.0.to_string().chars().take(n).collect()
    }

    /// Namespace string for per-identity keys, falling back to the guest
    /// namespace when no identity is present.
    #[must_use]
    pub fn namespace(identity: Option<&IdentityId>) -> String {
        match identity {
            Some(id) => id.to_string(),
            None => GUEST_NAMESPACE.to_string(),
        }
    }
}

impl Default for IdentityId {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Display for IdentityId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl FromStr for IdentityId {
    type Err = uuid::Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Ok(Self(Uuid::parse_str(s)?))
    }
}
