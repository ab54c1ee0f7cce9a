//! Auth session types shared by every backend.

use anishelf_types::IdentityId;
use chrono::{DateTime, Duration, Utc};
use serde::{Deserialize, Serialize};

/// An authenticated user as the auth service describes it.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct User {
    pub id: IdentityId,
    #[serde(default)]
    pub email: Option<String>,
    #[serde(default)]
    pub user_metadata: serde_json::Value,
}

impl User {
    /// The `username` recorded at sign-up, if any.
    pub fn username(&self) -> Option<&str> {
        self.user_metadata.get("username").and_then(|v| v.as_str())
    }
}

/// A signed-in session.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Session {
    pub access_token: String,
    #[serde(default)]
    pub refresh_token: Option<String>,
    #[serde(default)]
    pub expires_at: Option<DateTime<Utc>>,
    pub user: User,
}

impl Session {
    /// True once `now` is within `margin` of the expiry time. Sessions
    /// without an expiry never expire locally.
    pub fn is_expired(&self, now: DateTime<Utc>, margin: Duration) -> bool {
        self.expires_at.is_some_and(|exp| now + margin >= exp)
    }
}

/// Auth state transitions pushed to subscribers.
#[derive(Debug, Clone, PartialEq)]
pub enum AuthEvent {
    SignedIn(Session),
    SignedOut,
}

/// Reply to a sign-up. When the project requires email confirmation the
/// user exists but no session is issued yet.
#[derive(Debug, Clone, PartialEq)]
pub struct SignUpOutcome {
    pub user: Option<User>,
    pub session: Option<Session>,
}
