//! Remote collaborator abstraction.
//!
//! Defines the auth and table operations the rest of AniShelf consumes. The
//! client handle is constructed once and injected wherever it is needed.

use async_trait::async_trait;
use serde_json::Value;
use tokio::sync::broadcast;

use crate::error::RemoteResult;
use crate::session::{AuthEvent, Session, SignUpOutcome};

/// A conjunction of column equality constraints.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Filter {
    conditions: Vec<(String, String)>,
}

impl Filter {
    pub fn new() -> Self {
        Self::default()
    }

    /// Adds `column = value`.
    pub fn eq(mut self, column: impl Into<String>, value: impl ToString) -> Self {
        self.conditions.push((column.into(), value.to_string()));
        self
    }

    pub fn conditions(&self) -> &[(String, String)] {
        &self.conditions
    }

    pub fn is_empty(&self) -> bool {
        self.conditions.is_empty()
    }

    /// Evaluates the filter against a JSON row. Strings compare as-is, other
    /// scalars by their JSON text.
    pub fn matches(&self, row: &Value) -> bool {
        self.conditions.iter().all(|(column, expected)| match row.get(column) {
            Some(Value::String(s)) => s == expected,
            Some(Value::Null) | None => false,
            Some(other) => other.to_string() == *expected,
        })
    }
}

/// Sort order requested from the remote.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Order {
    pub column: String,
    pub ascending: bool,
}

impl Order {
    pub fn asc(column: impl Into<String>) -> Self {
        Self {
            column: column.into(),
            ascending: true,
        }
    }

    pub fn desc(column: impl Into<String>) -> Self {
        Self {
            column: column.into(),
            ascending: false,
        }
    }
}

/// The backend-as-a-service AniShelf talks to.
#[async_trait]
pub trait RemoteBackend: Send + Sync {
    /// Returns the name of the backend, for logs.
    fn provider_name(&self) -> &'static str;

    // ── Session ──────────────────────────────────────────────────

    /// Current session, refreshed first if it is about to expire.
    async fn get_session(&self) -> RemoteResult<Option<Session>>;

    /// Subscribes to sign-in / sign-out events.
    fn subscribe(&self) -> broadcast::Receiver<AuthEvent>;

    async fn sign_up(
        &self,
        email: &str,
        password: &str,
        metadata: Value,
    ) -> RemoteResult<SignUpOutcome>;

    async fn sign_in_with_password(&self, email: &str, password: &str) -> RemoteResult<Session>;

    async fn sign_out(&self) -> RemoteResult<()>;

    // ── Data ─────────────────────────────────────────────────────

    async fn select(
        &self,
        table: &str,
        filter: &Filter,
        order: Option<&Order>,
    ) -> RemoteResult<Vec<Value>>;

    /// Inserts one row and returns it as stored.
    async fn insert(&self, table: &str, record: Value) -> RemoteResult<Value>;

    /// Updates the row matching `filter` and returns it as stored.
    async fn update(&self, table: &str, filter: &Filter, patch: Value) -> RemoteResult<Value>;

    async fn delete(&self, table: &str, filter: &Filter) -> RemoteResult<()>;
}
