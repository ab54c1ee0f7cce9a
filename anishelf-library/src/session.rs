//! Session gate: who is signed in.
//!
//! The gate starts in [`IdentityState::Loading`] and leaves it exactly once,
//! when [`SessionGate::initialize`] resolves or its loading bound runs out.
//! A session fetch that outlives the bound keeps running and is applied when
//! it lands, unless the identity moved on in the meantime. The gate also
//! follows the remote's auth events and its own sign-in / sign-out calls,
//! publishing every change on a watch channel.

use anishelf_model::{display_name, SignInIdentifier, SignUpForm, UserProfile};
use anishelf_remote::{AuthEvent, Filter, RemoteBackend, RemoteResult, Session, User};
use anishelf_types::IdentityId;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::{broadcast, watch};
use tokio::task::{JoinError, JoinHandle};
use tracing::{debug, info, warn};

use crate::error::{AuthError, AuthResult};

/// Authentication state as the rest of the library sees it.
#[derive(Debug, Clone, Default, PartialEq)]
pub enum IdentityState {
    /// Waiting for the stored session to resolve.
    #[default]
    Loading,
    SignedOut,
    SignedIn(User),
}

impl IdentityState {
    pub fn is_loading(&self) -> bool {
        matches!(self, IdentityState::Loading)
    }

    pub fn user(&self) -> Option<&User> {
        match self {
            IdentityState::SignedIn(user) => Some(user),
            _ => None,
        }
    }

    pub fn identity(&self) -> Option<IdentityId> {
        self.user().map(|user| user.id)
    }
}

/// Tracks the signed-in identity.
pub struct SessionGate {
    remote: Arc<dyn RemoteBackend>,
    profiles_table: String,
    loading_timeout: Duration,
    state: watch::Sender<IdentityState>,
    /// Counts transitions, so a late session fetch can tell whether
    /// anything happened after it was started.
    transitions: AtomicU64,
}

impl SessionGate {
    pub fn new(
        remote: Arc<dyn RemoteBackend>,
        profiles_table: impl Into<String>,
        loading_timeout: Duration,
    ) -> Self {
        let (state, _) = watch::channel(IdentityState::Loading);
        Self {
            remote,
            profiles_table: profiles_table.into(),
            loading_timeout,
            state,
            transitions: AtomicU64::new(0),
        }
    }

    pub fn state(&self) -> IdentityState {
        self.state.borrow().clone()
    }

    pub fn identity(&self) -> Option<IdentityId> {
        self.state.borrow().identity()
    }

    pub fn watch(&self) -> watch::Receiver<IdentityState> {
        self.state.subscribe()
    }

    fn publish(&self, next: IdentityState) {
        self.transition(None, next);
    }

    /// Publishes `next` and returns the transition count it was recorded
    /// under. With `since` set, nothing is published when another
    /// transition happened after that count.
    fn transition(&self, since: Option<u64>, next: IdentityState) -> Option<u64> {
        let mut recorded = None;
        let changed = self.state.send_if_modified(|current| {
            let count = self.transitions.load(Ordering::SeqCst);
            if since.is_some_and(|mark| mark != count) {
                return false;
            }
            recorded = Some(self.transitions.fetch_add(1, Ordering::SeqCst) + 1);
            if *current == next {
                return false;
            }
            *current = next.clone();
            true
        });
        if changed {
            match &next {
                IdentityState::SignedIn(user) => info!("Identity is now {}", user.id),
                IdentityState::SignedOut => info!("Signed out"),
                IdentityState::Loading => {}
            }
        }
        recorded
    }

    /// Resolves the stored session. Leaves the loading state after at most
    /// the loading timeout; a fetch still running then is not cancelled and
    /// its result is published when it arrives, provided no sign-in,
    /// sign-out or auth event came first.
    pub async fn initialize(self: &Arc<Self>) -> IdentityState {
        debug!("Restoring session from {}", self.remote.provider_name());
        let started = self.transitions.load(Ordering::SeqCst);
        let remote = Arc::clone(&self.remote);
        let mut fetch = tokio::spawn(async move { remote.get_session().await });

        let outcome = tokio::time::timeout(self.loading_timeout, &mut fetch).await;
        match outcome {
            Ok(joined) => {
                let next = restored_state(joined);
                match self.transition(Some(started), next.clone()) {
                    Some(_) => next,
                    None => {
                        debug!("Identity changed while the session was resolving");
                        self.state()
                    }
                }
            }
            Err(_) => {
                warn!(
                    "Auth service did not answer within {:?}; continuing signed out",
                    self.loading_timeout
                );
                let Some(mark) = self.transition(Some(started), IdentityState::SignedOut) else {
                    debug!("Identity changed while the session was resolving");
                    return self.state();
                };
                let gate = Arc::clone(self);
                tokio::spawn(async move {
                    let next = restored_state(fetch.await);
                    if gate.transition(Some(mark), next).is_none() {
                        debug!("Dropping late session result; identity already changed");
                    }
                });
                IdentityState::SignedOut
            }
        }
    }

    /// Applies an auth event pushed by the remote.
    pub fn handle_event(&self, event: AuthEvent) {
        match event {
            AuthEvent::SignedIn(session) => self.publish(IdentityState::SignedIn(session.user)),
            AuthEvent::SignedOut => self.publish(IdentityState::SignedOut),
        }
    }

    /// Follows the remote's auth events until the remote goes away.
    ///
    /// Subscribes before returning, so no event sent after this call is
    /// missed.
    pub fn spawn_listener(self: &Arc<Self>) -> JoinHandle<()> {
        let mut events = self.remote.subscribe();
        let gate = Arc::clone(self);
        tokio::spawn(async move {
            loop {
                match events.recv().await {
                    Ok(event) => gate.handle_event(event),
                    Err(broadcast::error::RecvError::Lagged(skipped)) => {
                        warn!("Missed {} auth events", skipped);
                    }
                    Err(broadcast::error::RecvError::Closed) => break,
                }
            }
            debug!("Auth event listener stopped");
        })
    }

    // ── Auth operations ──────────────────────────────────────────

    /// Signs in with an email or a username.
    pub async fn sign_in(&self, identifier: &str, password: &str) -> AuthResult<User> {
        if identifier.trim().is_empty() || password.is_empty() {
            return Err(AuthError::InvalidForm(
                "enter your email or username and password".to_string(),
            ));
        }

        let email = match SignInIdentifier::parse(identifier) {
            SignInIdentifier::Email(email) => email.trim().to_string(),
            SignInIdentifier::Username(username) => self.email_for_username(&username).await?,
        };

        let session = self.remote.sign_in_with_password(&email, password).await?;
        self.publish(IdentityState::SignedIn(session.user.clone()));
        Ok(session.user)
    }

    /// Registers a new account. When the project requires email
    /// confirmation no session is issued and this returns
    /// [`AuthError::ConfirmationRequired`].
    pub async fn sign_up(&self, form: &SignUpForm) -> AuthResult<User> {
        form.validate()?;

        let outcome = self
            .remote
            .sign_up(form.email.trim(), &form.password, form.metadata())
            .await?;
        match outcome.session {
            Some(session) => {
                self.publish(IdentityState::SignedIn(session.user.clone()));
                Ok(session.user)
            }
            None => {
                info!("Account {} awaits email confirmation", form.email.trim());
                Err(AuthError::ConfirmationRequired)
            }
        }
    }

    /// Signs out. The local identity is cleared even if the remote call
    /// fails.
    pub async fn sign_out(&self) -> AuthResult<()> {
        let result = self.remote.sign_out().await;
        self.publish(IdentityState::SignedOut);
        result.map_err(AuthError::from)
    }

    async fn email_for_username(&self, username: &str) -> AuthResult<String> {
        let filter = Filter::new().eq("username", username);
        let rows = self
            .remote
            .select(&self.profiles_table, &filter, None)
            .await?;
        rows.into_iter()
            .find_map(|row| serde_json::from_value::<UserProfile>(row).ok())
            .map(|profile| profile.email)
            .filter(|email| !email.is_empty())
            .ok_or_else(|| AuthError::UserNotFound(username.to_string()))
    }

    /// Profile row of the signed-in identity, if it has one.
    pub async fn profile(&self) -> Option<UserProfile> {
        let identity = self.identity()?;
        let filter = Filter::new().eq("id", identity);
        match self.remote.select(&self.profiles_table, &filter, None).await {
            Ok(rows) => rows
                .into_iter()
                .find_map(|row| serde_json::from_value::<UserProfile>(row).ok()),
            Err(e) => {
                warn!("Failed to fetch profile for {}: {}", identity, e);
                None
            }
        }
    }

    /// Name to greet the current identity with.
    pub async fn display_name(&self) -> String {
        let state = self.state();
        let profile = self.profile().await;
        let user = state.user();
        display_name(
            profile.as_ref(),
            user.and_then(|u| u.email.as_deref()),
            user.map(|u| &u.id),
        )
    }
}

fn restored_state(joined: Result<RemoteResult<Option<Session>>, JoinError>) -> IdentityState {
    match joined {
        Ok(Ok(Some(session))) => IdentityState::SignedIn(session.user),
        Ok(Ok(None)) => IdentityState::SignedOut,
        Ok(Err(e)) => {
            warn!("Could not restore session: {}", e);
            IdentityState::SignedOut
        }
        Err(e) => {
            warn!("Session fetch task failed: {}", e);
            IdentityState::SignedOut
        }
    }
}
