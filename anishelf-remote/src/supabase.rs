//! Supabase implementation of [`RemoteBackend`].
//!
//! Auth goes through GoTrue (`/auth/v1`), table access through PostgREST
//! (`/rest/v1`). Both authenticate with the project's anon key; table calls
//! additionally carry the session's access token once someone signs in.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use reqwest::{Client, RequestBuilder, Response, StatusCode};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::{broadcast, RwLock};
use tracing::{debug, info, warn};

use crate::backend::{Filter, Order, RemoteBackend};
use crate::error::{RemoteError, RemoteResult};
use crate::session::{AuthEvent, Session, SignUpOutcome, User};

const EVENT_CAPACITY: usize = 16;

/// Supabase project configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SupabaseConfig {
    /// Project URL (e.g. `https://abcd.supabase.co`).
    pub project_url: String,
    /// Public anon key.
    pub anon_key: String,
    /// Per-request timeout.
    pub timeout_secs: u64,
    /// Sessions are refreshed this long before they expire.
    pub refresh_margin_secs: u64,
}

impl Default for SupabaseConfig {
    fn default() -> Self {
        Self {
            project_url: String::new(),
            anon_key: String::new(),
            timeout_secs: 30,
            refresh_margin_secs: 60,
        }
    }
}

/// GoTrue token grant / session response.
#[derive(Debug, Deserialize)]
struct TokenResponse {
    access_token: String,
    refresh_token: Option<String>,
    expires_in: Option<i64>,
    expires_at: Option<i64>,
    user: User,
}

impl TokenResponse {
    fn into_session(self) -> Session {
        let expires_at = self
            .expires_at
            .and_then(|secs| DateTime::<Utc>::from_timestamp(secs, 0))
            .or_else(|| {
                self.expires_in
                    .map(|secs| Utc::now() + chrono::Duration::seconds(secs))
            });
        Session {
            access_token: self.access_token,
            refresh_token: self.refresh_token,
            expires_at,
            user: self.user,
        }
    }
}

/// Error bodies from GoTrue and PostgREST use different keys.
#[derive(Debug, Default, Deserialize)]
struct ErrorBody {
    message: Option<String>,
    msg: Option<String>,
    error_description: Option<String>,
    error: Option<String>,
}

impl ErrorBody {
    fn into_message(self, fallback: String) -> String {
        self.message
            .or(self.msg)
            .or(self.error_description)
            .or(self.error)
            .unwrap_or(fallback)
    }
}

/// Supabase client.
pub struct SupabaseClient {
    config: SupabaseConfig,
    client: Client,
    session: Arc<RwLock<Option<Session>>>,
    events: broadcast::Sender<AuthEvent>,
}

impl SupabaseClient {
    /// Creates a client for the configured project.
    pub fn new(config: SupabaseConfig) -> RemoteResult<Self> {
        if config.project_url.trim().is_empty() {
            return Err(RemoteError::Config("missing Supabase project URL".to_string()));
        }
        if config.anon_key.trim().is_empty() {
            return Err(RemoteError::Config("missing Supabase anon key".to_string()));
        }

        let client = Client::builder()
            .timeout(Duration::from_secs(config.timeout_secs))
            .build()?;
        let (events, _) = broadcast::channel(EVENT_CAPACITY);

        Ok(Self {
            config,
            client,
            session: Arc::new(RwLock::new(None)),
            events,
        })
    }

    pub fn config(&self) -> &SupabaseConfig {
        &self.config
    }

    /// Installs an existing session (e.g. restored by the caller) and
    /// announces it to subscribers.
    pub async fn set_session(&self, session: Session) {
        *self.session.write().await = Some(session.clone());
        self.emit(AuthEvent::SignedIn(session));
    }

    /// The cached session, without refreshing it.
    pub async fn current_session(&self) -> Option<Session> {
        self.session.read().await.clone()
    }

    fn base(&self) -> &str {
        self.config.project_url.trim_end_matches('/')
    }

    fn auth_url(&self, path: &str) -> String {
        format!("{}/auth/v1/{}", self.base(), path)
    }

    fn rest_url(&self, table: &str) -> String {
        format!("{}/rest/v1/{}", self.base(), table)
    }

    fn emit(&self, event: AuthEvent) {
        // No receivers is fine; nobody is listening yet.
        let _ = self.events.send(event);
    }

    fn refresh_margin(&self) -> chrono::Duration {
        chrono::Duration::seconds(self.config.refresh_margin_secs as i64)
    }

    /// Attaches the anon key and the bearer token for a table request.
    async fn authorized(&self, request: RequestBuilder) -> RemoteResult<RequestBuilder> {
        let token = match self.get_session().await? {
            Some(session) => session.access_token,
            None => self.config.anon_key.clone(),
        };
        Ok(request
            .header("apikey", &self.config.anon_key)
            .bearer_auth(token))
    }

    async fn refresh_session(&self, refresh_token: &str) -> RemoteResult<Session> {
        debug!("Refreshing Supabase session");

        let response = self
            .client
            .post(self.auth_url("token"))
            .query(&[("grant_type", "refresh_token")])
            .header("apikey", &self.config.anon_key)
            .json(&serde_json::json!({ "refresh_token": refresh_token }))
            .send()
            .await?;
        let response = check_auth(response).await?;
        let token: TokenResponse = response.json().await?;
        Ok(token.into_session())
    }

    async fn clear_session(&self) -> bool {
        let had_session = self.session.write().await.take().is_some();
        if had_session {
            self.emit(AuthEvent::SignedOut);
        }
        had_session
    }
}

/// Maps a non-success auth response to [`RemoteError`].
async fn check_auth(response: Response) -> RemoteResult<Response> {
    let status = response.status();
    if status.is_success() {
        return Ok(response);
    }
    if status == StatusCode::TOO_MANY_REQUESTS {
        return Err(rate_limited(&response));
    }
    let message = error_message(response).await;
    Err(RemoteError::AuthFailed(message))
}

/// Maps a non-success table response to [`RemoteError`].
async fn check_data(response: Response) -> RemoteResult<Response> {
    let status = response.status();
    if status.is_success() {
        return Ok(response);
    }
    match status {
        StatusCode::TOO_MANY_REQUESTS => Err(rate_limited(&response)),
        StatusCode::UNAUTHORIZED => Err(RemoteError::AuthFailed(error_message(response).await)),
        StatusCode::NOT_FOUND => Err(RemoteError::NotFound(error_message(response).await)),
        _ => Err(RemoteError::Api {
            status: status.as_u16(),
            message: error_message(response).await,
        }),
    }
}

fn rate_limited(response: &Response) -> RemoteError {
    let retry_after_secs = response
        .headers()
        .get(reqwest::header::RETRY_AFTER)
        .and_then(|v| v.to_str().ok())
        .and_then(|v| v.parse().ok())
        .unwrap_or(1);
    RemoteError::RateLimited { retry_after_secs }
}

async fn error_message(response: Response) -> String {
    let status = response.status();
    let text = response.text().await.unwrap_or_default();
    serde_json::from_str::<ErrorBody>(&text)
        .unwrap_or_default()
        .into_message(if text.is_empty() { status.to_string() } else { text })
}

fn filter_query(filter: &Filter) -> Vec<(String, String)> {
    filter
        .conditions()
        .iter()
        .map(|(column, value)| (column.clone(), format!("eq.{value}")))
        .collect()
}

/// PostgREST answers writes with an array of affected rows.
fn first_row(body: Value, what: &str) -> RemoteResult<Value> {
    match body {
        Value::Array(rows) => rows
            .into_iter()
            .next()
            .ok_or_else(|| RemoteError::NotFound(format!("{what} matched no rows"))),
        Value::Object(_) => Ok(body),
        other => Err(RemoteError::UnexpectedResponse(format!(
            "{what} returned {other}"
        ))),
    }
}

#[async_trait]
impl RemoteBackend for SupabaseClient {
    fn provider_name(&self) -> &'static str {
        "Supabase"
    }

    async fn get_session(&self) -> RemoteResult<Option<Session>> {
        let (session, expired) = {
            let guard = self.session.read().await;
            let Some(session) = guard.as_ref() else {
                return Ok(None);
            };
            let expired = session.is_expired(Utc::now(), self.refresh_margin());
            (session.clone(), expired)
        }; // read lock dropped here

        if !expired {
            return Ok(Some(session));
        }

        let Some(refresh_token) = session.refresh_token.as_deref() else {
            warn!("Session expired without a refresh token");
            self.clear_session().await;
            return Ok(None);
        };

        match self.refresh_session(refresh_token).await {
            Ok(fresh) => {
                *self.session.write().await = Some(fresh.clone());
                Ok(Some(fresh))
            }
            Err(e) => {
                warn!("Session refresh failed: {}", e);
                self.clear_session().await;
                Err(e)
            }
        }
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
        debug!("Signing up {}", email);

        let response = self
            .client
            .post(self.auth_url("signup"))
            .header("apikey", &self.config.anon_key)
            .json(&serde_json::json!({
                "email": email,
                "password": password,
                "data": metadata,
            }))
            .send()
            .await?;
        let body: Value = check_auth(response).await?.json().await?;

        // Auto-confirmed projects return a full session; otherwise the bare
        // user (or `{ "user": ... }`) comes back and confirmation is pending.
        if body.get("access_token").is_some() {
            let session = serde_json::from_value::<TokenResponse>(body)?.into_session();
            *self.session.write().await = Some(session.clone());
            self.emit(AuthEvent::SignedIn(session.clone()));
            info!("Signed up and signed in {}", session.user.id);
            return Ok(SignUpOutcome {
                user: Some(session.user.clone()),
                session: Some(session),
            });
        }

        let user_value = body.get("user").cloned().unwrap_or(body);
        let user = if user_value.get("id").is_some() {
            Some(serde_json::from_value::<User>(user_value)?)
        } else {
            None
        };
        info!("Signed up {}, confirmation pending", email);
        Ok(SignUpOutcome {
            user,
            session: None,
        })
    }

    async fn sign_in_with_password(&self, email: &str, password: &str) -> RemoteResult<Session> {
        debug!("Signing in {}", email);

        let response = self
            .client
            .post(self.auth_url("token"))
            .query(&[("grant_type", "password")])
            .header("apikey", &self.config.anon_key)
            .json(&serde_json::json!({ "email": email, "password": password }))
            .send()
            .await?;
        let token: TokenResponse = check_auth(response).await?.json().await?;
        let session = token.into_session();

        *self.session.write().await = Some(session.clone());
        self.emit(AuthEvent::SignedIn(session.clone()));
        info!("Signed in {}", session.user.id);
        Ok(session)
    }

    async fn sign_out(&self) -> RemoteResult<()> {
        let token = self
            .session
            .read()
            .await
            .as_ref()
            .map(|s| s.access_token.clone());
        let Some(token) = token else {
            return Ok(());
        };

        // The local session goes away even if the server call fails.
        self.clear_session().await;

        let response = self
            .client
            .post(self.auth_url("logout"))
            .header("apikey", &self.config.anon_key)
            .bearer_auth(token)
            .send()
            .await?;
        let status = response.status();
        if status == StatusCode::UNAUTHORIZED || status == StatusCode::NOT_FOUND {
            // Token already revoked server-side.
            return Ok(());
        }
        check_auth(response).await?;
        info!("Signed out");
        Ok(())
    }

    async fn select(
        &self,
        table: &str,
        filter: &Filter,
        order: Option<&Order>,
    ) -> RemoteResult<Vec<Value>> {
        debug!("Selecting from {}", table);

        let mut query = vec![("select".to_string(), "*".to_string())];
        query.extend(filter_query(filter));
        if let Some(order) = order {
            let direction = if order.ascending { "asc" } else { "desc" };
            query.push(("order".to_string(), format!("{}.{}", order.column, direction)));
        }

        let request = self.client.get(self.rest_url(table)).query(&query);
        let response = self.authorized(request).await?.send().await?;
        let body: Value = check_data(response).await?.json().await?;
        match body {
            Value::Array(rows) => Ok(rows),
            other => Err(RemoteError::UnexpectedResponse(format!(
                "select on {table} returned {other}"
            ))),
        }
    }

    async fn insert(&self, table: &str, record: Value) -> RemoteResult<Value> {
        debug!("Inserting into {}", table);

        let request = self
            .client
            .post(self.rest_url(table))
            .query(&[("select", "*")])
            .header("Prefer", "return=representation")
            .json(&Value::Array(vec![record]));
        let response = self.authorized(request).await?.send().await?;
        let body: Value = check_data(response).await?.json().await?;
        first_row(body, &format!("insert into {table}"))
    }

    async fn update(&self, table: &str, filter: &Filter, patch: Value) -> RemoteResult<Value> {
        if filter.is_empty() {
            return Err(RemoteError::Config(format!(
                "refusing unfiltered update on {table}"
            )));
        }
        debug!("Updating {}", table);

        let mut query = vec![("select".to_string(), "*".to_string())];
        query.extend(filter_query(filter));
        let request = self
            .client
            .patch(self.rest_url(table))
            .query(&query)
            .header("Prefer", "return=representation")
            .json(&patch);
        let response = self.authorized(request).await?.send().await?;
        let body: Value = check_data(response).await?.json().await?;
        first_row(body, &format!("update on {table}"))
    }

    async fn delete(&self, table: &str, filter: &Filter) -> RemoteResult<()> {
        if filter.is_empty() {
            return Err(RemoteError::Config(format!(
                "refusing unfiltered delete on {table}"
            )));
        }
        debug!("Deleting from {}", table);

        let request = self
            .client
            .delete(self.rest_url(table))
            .query(&filter_query(filter));
        let response = self.authorized(request).await?.send().await?;
        check_data(response).await?;
        Ok(())
    }
}
