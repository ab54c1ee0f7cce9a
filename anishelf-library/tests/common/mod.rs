//! Shared test helpers for library tests: a scripted in-memory remote.

#![allow(dead_code)]

use anishelf_remote::{
    AuthEvent, Filter, Order, RemoteBackend, RemoteError, RemoteResult, Session, SignUpOutcome,
    User,
};
use anishelf_types::IdentityId;
use async_trait::async_trait;
use serde_json::{json, Value};
use std::collections::{HashMap, VecDeque};
use std::sync::atomic::{AtomicBool, AtomicI64, Ordering};
use std::sync::{Arc, Mutex};
use tokio::sync::{broadcast, oneshot};

pub const ENTRIES: &str = "animes";
pub const PROFILES: &str = "profiles";

/// A paused remote call. The call has started once `entered` resolves and
/// finishes once `release` is sent (or dropped).
pub struct Hold {
    pub entered: oneshot::Receiver<()>,
    pub release: oneshot::Sender<()>,
}

struct Account {
    password: String,
    user: User,
}

/// In-memory stand-in for the hosted backend.
pub struct MockRemote {
    tables: Mutex<HashMap<String, Vec<Value>>>,
    accounts: Mutex<HashMap<String, Account>>,
    session: Mutex<Option<Session>>,
    events: broadcast::Sender<AuthEvent>,
    next_id: AtomicI64,
    clock: AtomicI64,
    /// Sign-ups return no session, as with email confirmation enabled.
    pub confirm_email: AtomicBool,
    failures: Mutex<HashMap<&'static str, VecDeque<String>>>,
    holds: Mutex<HashMap<&'static str, VecDeque<(oneshot::Sender<()>, oneshot::Receiver<()>)>>>,
    calls: Mutex<Vec<(String, String, Vec<(String, String)>)>>,
}

impl Default for MockRemote {
    fn default() -> Self {
        let (events, _) = broadcast::channel(16);
        Self {
            tables: Mutex::new(HashMap::new()),
            accounts: Mutex::new(HashMap::new()),
            session: Mutex::new(None),
            events,
            next_id: AtomicI64::new(1),
            clock: AtomicI64::new(0),
            confirm_email: AtomicBool::new(false),
            failures: Mutex::new(HashMap::new()),
            holds: Mutex::new(HashMap::new()),
            calls: Mutex::new(Vec::new()),
        }
    }
}

impl MockRemote {
    pub fn new() -> Arc<Self> {
        Arc::new(Self::default())
    }

    // ── Scripting ────────────────────────────────────────────────

    /// Registers an account and its profile row.
    pub fn add_account(&self, email: &str, password: &str, username: &str) -> User {
        let user = User {
            id: IdentityId::new(),
            email: Some(email.to_string()),
            user_metadata: json!({ "username": username }),
        };
        self.accounts.lock().unwrap().insert(
            email.to_string(),
            Account {
                password: password.to_string(),
                user: user.clone(),
            },
        );
        self.seed(
            PROFILES,
            json!({
                "id": user.id.to_string(),
                "username": username,
                "email": email,
            }),
        );
        user
    }

    /// Installs a session without going through sign-in, as if restored
    /// from a previous run.
    pub fn restore_session(&self, user: &User) {
        *self.session.lock().unwrap() = Some(session_for(user));
    }

    /// Pushes an auth event as the backend would on its own.
    pub fn emit(&self, event: AuthEvent) {
        if matches!(event, AuthEvent::SignedOut) {
            *self.session.lock().unwrap() = None;
        }
        let _ = self.events.send(event);
    }

    /// Adds a raw row, as if written by someone else.
    pub fn seed(&self, table: &str, row: Value) {
        self.tables
            .lock()
            .unwrap()
            .entry(table.to_string())
            .or_default()
            .push(row);
    }

    pub fn rows(&self, table: &str) -> Vec<Value> {
        self.tables
            .lock()
            .unwrap()
            .get(table)
            .cloned()
            .unwrap_or_default()
    }

    /// Makes the next call to `op` fail with a 500.
    pub fn fail_next(&self, op: &'static str, message: &str) {
        self.failures
            .lock()
            .unwrap()
            .entry(op)
            .or_default()
            .push_back(message.to_string());
    }

    /// Pauses the next call to `op` until the returned hold is released.
    pub fn hold_next(&self, op: &'static str) -> Hold {
        let (entered_tx, entered_rx) = oneshot::channel();
        let (release_tx, release_rx) = oneshot::channel();
        self.holds
            .lock()
            .unwrap()
            .entry(op)
            .or_default()
            .push_back((entered_tx, release_rx));
        Hold {
            entered: entered_rx,
            release: release_tx,
        }
    }

    /// `(op, table, filter)` of every data call so far.
    pub fn calls(&self) -> Vec<(String, String, Vec<(String, String)>)> {
        self.calls.lock().unwrap().clone()
    }

    pub fn calls_to(&self, op: &str) -> usize {
        self.calls().iter().filter(|(o, _, _)| o == op).count()
    }

    // ── Internals ────────────────────────────────────────────────

    async fn enter(&self, op: &'static str) -> RemoteResult<()> {
        let hold = self
            .holds
            .lock()
            .unwrap()
            .get_mut(op)
            .and_then(VecDeque::pop_front);
        if let Some((entered, release)) = hold {
            let _ = entered.send(());
            let _ = release.await;
        }

        let failure = self
            .failures
            .lock()
            .unwrap()
            .get_mut(op)
            .and_then(VecDeque::pop_front);
        match failure {
            Some(message) => Err(RemoteError::Api {
                status: 500,
                message,
            }),
            None => Ok(()),
        }
    }

    fn record(&self, op: &str, table: &str, filter: &Filter) {
        self.calls.lock().unwrap().push((
            op.to_string(),
            table.to_string(),
            filter.conditions().to_vec(),
        ));
    }

    fn start_session(&self, user: &User) -> Session {
        let session = session_for(user);
        *self.session.lock().unwrap() = Some(session.clone());
        let _ = self.events.send(AuthEvent::SignedIn(session.clone()));
        session
    }

    fn timestamp(&self) -> String {
        let tick = self.clock.fetch_add(1, Ordering::SeqCst);
        format!("2024-01-01T00:{:02}:{:02}+00:00", tick / 60, tick % 60)
    }
}

fn session_for(user: &User) -> Session {
    Session {
        access_token: format!("token-{}", user.id),
        refresh_token: Some("refresh".to_string()),
        expires_at: None,
        user: user.clone(),
    }
}

#[async_trait]
impl RemoteBackend for MockRemote {
    fn provider_name(&self) -> &'static str {
        "Mock"
    }

    async fn get_session(&self) -> RemoteResult<Option<Session>> {
        self.enter("get_session").await?;
        Ok(self.session.lock().unwrap().clone())
    }

    fn subscribe(&self) -> broadcast::Receiver<AuthEvent> {
        self.events.subscribe()
    }

    async fn sign_up(
        &self,
        email: &str,
        password: &str,
        metadata: Value,
    ) -> RemoteResult<SignUpOutcome> {
        self.enter("sign_up").await?;
        if self.accounts.lock().unwrap().contains_key(email) {
            return Err(RemoteError::AuthFailed("User already registered".to_string()));
        }
        let username = metadata
            .get("username")
            .and_then(Value::as_str)
            .unwrap_or_default()
            .to_string();
        let user = self.add_account(email, password, &username);

        if self.confirm_email.load(Ordering::SeqCst) {
            return Ok(SignUpOutcome {
                user: Some(user),
                session: None,
            });
        }
        let session = self.start_session(&user);
        Ok(SignUpOutcome {
            user: Some(user),
            session: Some(session),
        })
    }

    async fn sign_in_with_password(&self, email: &str, password: &str) -> RemoteResult<Session> {
        self.enter("sign_in").await?;
        let user = {
            let accounts = self.accounts.lock().unwrap();
            match accounts.get(email) {
                Some(account) if account.password == password => account.user.clone(),
                _ => {
                    return Err(RemoteError::AuthFailed(
                        "Invalid login credentials".to_string(),
                    ))
                }
            }
        };
        Ok(self.start_session(&user))
    }

    async fn sign_out(&self) -> RemoteResult<()> {
        let had = self.session.lock().unwrap().take().is_some();
        if had {
            let _ = self.events.send(AuthEvent::SignedOut);
        }
        self.enter("sign_out").await
    }

    async fn select(
        &self,
        table: &str,
        filter: &Filter,
        order: Option<&Order>,
    ) -> RemoteResult<Vec<Value>> {
        self.record("select", table, filter);
        self.enter("select").await?;
        let mut rows: Vec<Value> = self
            .rows(table)
            .into_iter()
            .filter(|row| filter.matches(row))
            .collect();
        if let Some(order) = order {
            rows.sort_by(|a, b| {
                let a = a.get(&order.column).map(Value::to_string).unwrap_or_default();
                let b = b.get(&order.column).map(Value::to_string).unwrap_or_default();
                if order.ascending { a.cmp(&b) } else { b.cmp(&a) }
            });
        }
        Ok(rows)
    }

    async fn insert(&self, table: &str, mut record: Value) -> RemoteResult<Value> {
        self.record("insert", table, &Filter::new());
        self.enter("insert").await?;
        if let Some(obj) = record.as_object_mut() {
            obj.insert("id".into(), self.next_id.fetch_add(1, Ordering::SeqCst).into());
            obj.insert("created_at".into(), self.timestamp().into());
        }
        self.seed(table, record.clone());
        Ok(record)
    }

    async fn update(&self, table: &str, filter: &Filter, patch: Value) -> RemoteResult<Value> {
        self.record("update", table, filter);
        self.enter("update").await?;
        let mut tables = self.tables.lock().unwrap();
        let rows = tables.entry(table.to_string()).or_default();
        let mut updated = None;
        for row in rows.iter_mut().filter(|row| filter.matches(row)) {
            if let (Some(target), Some(changes)) = (row.as_object_mut(), patch.as_object()) {
                for (key, value) in changes {
                    target.insert(key.clone(), value.clone());
                }
            }
            updated.get_or_insert_with(|| row.clone());
        }
        updated.ok_or_else(|| RemoteError::NotFound(format!("update on {table} matched no rows")))
    }

    async fn delete(&self, table: &str, filter: &Filter) -> RemoteResult<()> {
        self.record("delete", table, filter);
        self.enter("delete").await?;
        self.tables
            .lock()
            .unwrap()
            .entry(table.to_string())
            .or_default()
            .retain(|row| !filter.matches(row));
        Ok(())
    }
}

/// A well-formed entry row.
pub fn entry_row(id: i64, owner: &IdentityId, title: &str, status: &str, rating: f64) -> Value {
    json!({
        "id": id,
        "user_id": owner.to_string(),
        "titulo": title,
        "portada": "",
        "descripcion": "",
        "generos": [],
        "estado": status,
        "rating": rating,
        "created_at": format!("2023-06-{:02}T12:00:00+00:00", id.clamp(1, 28)),
    })
}

/// Signed-in user for tests that don't care about the account.
pub fn signed_in(remote: &MockRemote) -> User {
    let user = remote.add_account("fern@example.com", "secret1", "fern");
    remote.restore_session(&user);
    user
}
