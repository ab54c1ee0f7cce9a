//! The library facade: session gate, entry store, sort preferences and the
//! current query/criterion, wired together.

use anishelf_model::{Entry, EntryDraft, EntryPatch, SignUpForm, SortPreference};
use anishelf_prefs::{PreferenceBackend, SortPreferences, SqliteBackend};
use anishelf_remote::{RemoteBackend, SupabaseClient, SupabaseConfig, User};
use anishelf_types::{EntryId, IdentityId};
use anishelf_view::derive_view;
use std::path::Path;
use std::sync::Arc;
use tokio::sync::{watch, RwLock};
use tokio::task::JoinHandle;
use tracing::{debug, info};

use crate::config::LibraryConfig;
use crate::error::{AuthResult, LibraryResult, StoreResult};
use crate::session::{IdentityState, SessionGate};
use crate::store::EntryStore;

#[derive(Debug, Clone)]
struct ViewState {
    query: String,
    criterion: SortPreference,
    /// Identity the criterion was read for; `None` inside means guest.
    synced: Option<Option<IdentityId>>,
}

/// Everything a front end needs to show and edit one user's list.
pub struct Library<B> {
    config: LibraryConfig,
    gate: Arc<SessionGate>,
    store: Arc<EntryStore>,
    prefs: SortPreferences<B>,
    view: RwLock<ViewState>,
}

impl Library<SqliteBackend> {
    /// Connects to a Supabase project and opens the preference database at
    /// `prefs_path` (in memory when `None`).
    pub fn open(
        supabase: SupabaseConfig,
        prefs_path: Option<&Path>,
        config: LibraryConfig,
    ) -> LibraryResult<Self> {
        let remote = Arc::new(SupabaseClient::new(supabase)?);
        let backend = match prefs_path {
            Some(path) => SqliteBackend::open(path)?,
            None => SqliteBackend::open_in_memory()?,
        };
        Ok(Self::new(remote, SortPreferences::new(backend), config))
    }
}

impl<B: PreferenceBackend> Library<B> {
    pub fn new(
        remote: Arc<dyn RemoteBackend>,
        prefs: SortPreferences<B>,
        config: LibraryConfig,
    ) -> Self {
        let gate = SessionGate::new(
            Arc::clone(&remote),
            config.profiles_table.clone(),
            config.loading_timeout(),
        );
        let store = EntryStore::new(remote, config.entries_table.clone());
        Self {
            view: RwLock::new(ViewState {
                query: String::new(),
                criterion: config.default_sort,
                synced: None,
            }),
            config,
            gate: Arc::new(gate),
            store: Arc::new(store),
            prefs,
        }
    }

    pub fn config(&self) -> &LibraryConfig {
        &self.config
    }

    pub fn gate(&self) -> &Arc<SessionGate> {
        &self.gate
    }

    pub fn store(&self) -> &Arc<EntryStore> {
        &self.store
    }

    pub fn prefs(&self) -> &SortPreferences<B> {
        &self.prefs
    }

    pub fn identity(&self) -> Option<IdentityId> {
        self.gate.identity()
    }

    /// Resolves the stored session and loads that identity's entries and
    /// sort preference.
    pub async fn start(&self) -> IdentityState {
        let state = self.gate.initialize().await;
        self.sync_identity().await;
        state
    }

    /// Brings the store and criterion in line with the gate's identity.
    /// Does nothing while they already match.
    pub async fn sync_identity(&self) {
        let state = self.gate.state();
        if state.is_loading() {
            return;
        }
        let identity = state.identity();
        if self.view.read().await.synced == Some(identity) {
            return;
        }

        let criterion = self
            .prefs
            .load(identity.as_ref())
            .unwrap_or(self.config.default_sort);
        {
            let mut view = self.view.write().await;
            view.criterion = criterion;
            view.synced = Some(identity);
        }
        debug!(
            "Sort criterion for {} is {}",
            IdentityId::namespace(identity.as_ref()),
            criterion
        );

        self.store.load(identity.as_ref()).await;
    }

    /// Re-fetches the current identity's entries.
    pub async fn refresh(&self) -> Vec<Entry> {
        self.store.load(self.identity().as_ref()).await
    }

    // ── Query & criterion ────────────────────────────────────────

    pub async fn query(&self) -> String {
        self.view.read().await.query.clone()
    }

    pub async fn set_query(&self, query: impl Into<String>) {
        self.view.write().await.query = query.into();
    }

    pub async fn criterion(&self) -> SortPreference {
        self.view.read().await.criterion
    }

    /// Changes the criterion and stores it for the current identity.
    pub async fn set_criterion(&self, criterion: SortPreference) {
        self.view.write().await.criterion = criterion;
        self.prefs.save(self.identity().as_ref(), criterion);
    }

    /// Empties the query and goes back to newest-first.
    pub async fn clear_filters(&self) {
        {
            let mut view = self.view.write().await;
            view.query.clear();
            view.criterion = SortPreference::NewestFirst;
        }
        self.prefs
            .save(self.identity().as_ref(), SortPreference::NewestFirst);
    }

    /// The filtered and ordered entries to show.
    pub async fn view(&self) -> Vec<Entry> {
        let (query, criterion) = {
            let view = self.view.read().await;
            (view.query.clone(), view.criterion)
        };
        let entries = self.store.entries().await;
        derive_view(&entries, &query, criterion)
    }

    /// Watches the store's revision; it changes whenever [`Self::view`]
    /// may return something new.
    pub fn subscribe(&self) -> watch::Receiver<u64> {
        self.store.subscribe()
    }

    // ── Entries ──────────────────────────────────────────────────

    pub async fn create(&self, draft: &EntryDraft) -> StoreResult<Entry> {
        self.store.create(draft).await
    }

    pub async fn update(&self, id: EntryId, patch: &EntryPatch) -> StoreResult<Entry> {
        self.store.update(id, patch).await
    }

    pub async fn delete(&self, id: EntryId) -> StoreResult<()> {
        self.store.delete(id).await
    }

    // ── Auth ─────────────────────────────────────────────────────

    pub async fn sign_in(&self, identifier: &str, password: &str) -> AuthResult<User> {
        let user = self.gate.sign_in(identifier, password).await?;
        self.sync_identity().await;
        Ok(user)
    }

    pub async fn sign_up(&self, form: &SignUpForm) -> AuthResult<User> {
        let user = self.gate.sign_up(form).await?;
        self.sync_identity().await;
        Ok(user)
    }

    pub async fn sign_out(&self) -> AuthResult<()> {
        let result = self.gate.sign_out().await;
        self.sync_identity().await;
        result
    }

    pub async fn display_name(&self) -> String {
        self.gate.display_name().await
    }
}

impl<B: PreferenceBackend + 'static> Library<B> {
    /// Follows auth events pushed by the remote (sign-out on a failed
    /// refresh, for instance) and re-syncs the store after each identity
    /// change.
    pub fn spawn_listeners(self: &Arc<Self>) -> (JoinHandle<()>, JoinHandle<()>) {
        let events = self.gate.spawn_listener();
        let mut changes = self.gate.watch();
        let library = Arc::clone(self);
        let sync = tokio::spawn(async move {
            while changes.changed().await.is_ok() {
                library.sync_identity().await;
            }
            info!("Identity watcher stopped");
        });
        (events, sync)
    }
}
