//! Entry store: the authoritative entry list for the current identity.
//!
//! Reads replace the whole list; writes go to the remote first and are only
//! applied locally once the remote has answered with the stored record.
//! Every local change bumps a revision on a watch channel so views know to
//! re-derive.

use anishelf_model::{Entry, EntryDraft, EntryPatch, EntryRecord};
use anishelf_remote::{Filter, Order, RemoteBackend, RemoteError};
use anishelf_types::{EntryId, IdentityId};
use serde_json::Value;
use std::collections::HashSet;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, Mutex, PoisonError};
use tokio::sync::{watch, RwLock};
use tracing::{debug, info, warn};

use crate::error::{StoreError, StoreResult, Submission};

/// A remote record that failed validation and was kept out of the store.
#[derive(Debug, Clone, PartialEq)]
pub struct Quarantined {
    pub record: Value,
    pub reason: String,
}

#[derive(Default)]
struct StoreState {
    identity: Option<IdentityId>,
    entries: Vec<Entry>,
    quarantined: Vec<Quarantined>,
}

/// Removes its submission from the in-flight set when dropped.
struct InFlight<'a> {
    set: &'a Mutex<HashSet<Submission>>,
    key: Submission,
}

impl Drop for InFlight<'_> {
    fn drop(&mut self) {
        self.set
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .remove(&self.key);
    }
}

/// Owns the entries of one identity at a time.
pub struct EntryStore {
    remote: Arc<dyn RemoteBackend>,
    table: String,
    state: Arc<RwLock<StoreState>>,
    /// Incremented by every `load`; only the newest load may apply.
    load_seq: AtomicU64,
    in_flight: Mutex<HashSet<Submission>>,
    revision: watch::Sender<u64>,
}

impl EntryStore {
    pub fn new(remote: Arc<dyn RemoteBackend>, table: impl Into<String>) -> Self {
        let (revision, _) = watch::channel(0);
        Self {
            remote,
            table: table.into(),
            state: Arc::new(RwLock::new(StoreState::default())),
            load_seq: AtomicU64::new(0),
            in_flight: Mutex::new(HashSet::new()),
            revision,
        }
    }

    pub fn table(&self) -> &str {
        &self.table
    }

    /// Snapshot of the current entries, newest insert first.
    pub async fn entries(&self) -> Vec<Entry> {
        self.state.read().await.entries.clone()
    }

    /// Identity whose entries are loaded.
    pub async fn identity(&self) -> Option<IdentityId> {
        self.state.read().await.identity
    }

    pub async fn len(&self) -> usize {
        self.state.read().await.entries.len()
    }

    pub async fn is_empty(&self) -> bool {
        self.state.read().await.entries.is_empty()
    }

    /// Records from the last load that failed validation.
    pub async fn quarantined(&self) -> Vec<Quarantined> {
        self.state.read().await.quarantined.clone()
    }

    pub fn revision(&self) -> u64 {
        *self.revision.borrow()
    }

    /// Watches the revision counter.
    pub fn subscribe(&self) -> watch::Receiver<u64> {
        self.revision.subscribe()
    }

    fn bump(&self) {
        self.revision.send_modify(|rev| *rev += 1);
    }

    // ── Reads ────────────────────────────────────────────────────

    /// Replaces the store with `identity`'s entries, newest first.
    ///
    /// Without an identity the store is emptied. A failed fetch is logged
    /// and also leaves the store empty. If another load starts before this
    /// one's response arrives, this response is discarded.
    pub async fn load(&self, identity: Option<&IdentityId>) -> Vec<Entry> {
        let seq = self.load_seq.fetch_add(1, Ordering::SeqCst) + 1;

        let Some(identity) = identity.copied() else {
            self.apply_load(seq, None, Vec::new(), Vec::new()).await;
            return Vec::new();
        };

        debug!("Loading entries for {}", identity);
        let filter = Filter::new().eq("user_id", identity);
        let result = self
            .remote
            .select(&self.table, &filter, Some(&Order::desc("created_at")))
            .await;

        let (entries, quarantined) = match result {
            Ok(rows) => validate_rows(rows, &identity),
            Err(e) => {
                warn!("Failed to load entries for {}: {}", identity, e);
                (Vec::new(), Vec::new())
            }
        };

        if self
            .apply_load(seq, Some(identity), entries.clone(), quarantined)
            .await
        {
            entries
        } else {
            self.entries().await
        }
    }

    async fn apply_load(
        &self,
        seq: u64,
        identity: Option<IdentityId>,
        entries: Vec<Entry>,
        quarantined: Vec<Quarantined>,
    ) -> bool {
        {
            let mut state = self.state.write().await;
            if self.load_seq.load(Ordering::SeqCst) != seq {
                debug!("Discarding superseded load #{}", seq);
                return false;
            }
            state.identity = identity;
            state.entries = entries;
            state.quarantined = quarantined;
        }
        self.bump();
        true
    }

    // ── Writes ───────────────────────────────────────────────────

    /// Creates an entry owned by the loaded identity and prepends it.
    pub async fn create(&self, draft: &EntryDraft) -> StoreResult<Entry> {
        draft.validate()?;
        let owner = self.require_identity().await?;
        let _guard = self.begin(Submission::Create)?;

        let row = self
            .remote
            .insert(&self.table, draft.to_record(&owner))
            .await
            .inspect_err(|e| warn!("Failed to create entry: {}", e))?;
        let entry = self.accept(row, &owner)?;

        self.apply(&owner, |entries| entries.insert(0, entry.clone()))
            .await;
        info!("Created entry {} ({})", entry.id, entry.title);
        Ok(entry)
    }

    /// Updates one of the loaded identity's entries.
    pub async fn update(&self, id: EntryId, patch: &EntryPatch) -> StoreResult<Entry> {
        patch.validate()?;
        let owner = self.require_identity().await?;
        let _guard = self.begin(Submission::Update(id))?;

        let row = self
            .remote
            .update(&self.table, &owned_row(id, &owner), patch.to_record())
            .await
            .map_err(|e| not_found_as(id, e))
            .inspect_err(|e| warn!("Failed to update entry {}: {}", id, e))?;
        let entry = self.accept(row, &owner)?;

        self.apply(&owner, |entries| {
            if let Some(slot) = entries.iter_mut().find(|e| e.id == id) {
                *slot = entry.clone();
            }
        })
        .await;
        info!("Updated entry {}", id);
        Ok(entry)
    }

    /// Deletes one of the loaded identity's entries.
    pub async fn delete(&self, id: EntryId) -> StoreResult<()> {
        let owner = self.require_identity().await?;
        let _guard = self.begin(Submission::Delete(id))?;

        self.remote
            .delete(&self.table, &owned_row(id, &owner))
            .await
            .map_err(|e| not_found_as(id, e))
            .inspect_err(|e| warn!("Failed to delete entry {}: {}", id, e))?;

        self.apply(&owner, |entries| entries.retain(|e| e.id != id))
            .await;
        info!("Deleted entry {}", id);
        Ok(())
    }

    async fn require_identity(&self) -> StoreResult<IdentityId> {
        self.identity().await.ok_or(StoreError::NotSignedIn)
    }

    fn begin(&self, key: Submission) -> StoreResult<InFlight<'_>> {
        let mut set = self
            .in_flight
            .lock()
            .unwrap_or_else(PoisonError::into_inner);
        if !set.insert(key) {
            warn!("Rejected duplicate {}", key);
            return Err(StoreError::SubmissionInFlight(key));
        }
        Ok(InFlight {
            set: &self.in_flight,
            key,
        })
    }

    fn accept(&self, row: Value, owner: &IdentityId) -> StoreResult<Entry> {
        let entry = EntryRecord::from_value(row)
            .and_then(|record| record.into_entry(Some(owner)))
            .inspect_err(|e| warn!("Remote returned an unusable entry: {}", e))?;
        Ok(entry)
    }

    /// Applies a local change if `owner` is still the loaded identity.
    async fn apply(&self, owner: &IdentityId, change: impl FnOnce(&mut Vec<Entry>)) {
        {
            let mut state = self.state.write().await;
            if state.identity.as_ref() != Some(owner) {
                debug!("Identity changed during write; skipping local update");
                return;
            }
            change(&mut state.entries);
        }
        self.bump();
    }
}

fn owned_row(id: EntryId, owner: &IdentityId) -> Filter {
    Filter::new().eq("id", id).eq("user_id", owner)
}

fn not_found_as(id: EntryId, e: RemoteError) -> StoreError {
    match e {
        RemoteError::NotFound(_) => StoreError::NotFound(id),
        other => StoreError::Remote(other),
    }
}

/// Splits fetched rows into valid entries and quarantined records.
fn validate_rows(rows: Vec<Value>, owner: &IdentityId) -> (Vec<Entry>, Vec<Quarantined>) {
    let mut entries = Vec::with_capacity(rows.len());
    let mut quarantined = Vec::new();
    let mut seen = HashSet::new();

    for row in rows {
        let result = EntryRecord::from_value(row.clone())
            .and_then(|record| record.into_entry(Some(owner)));
        match result {
            Ok(entry) if !seen.insert(entry.id) => {
                quarantined.push(Quarantined {
                    record: row,
                    reason: format!("duplicate id {}", entry.id),
                });
            }
            Ok(entry) => entries.push(entry),
            Err(e) => quarantined.push(Quarantined {
                record: row,
                reason: e.to_string(),
            }),
        }
    }

    if !quarantined.is_empty() {
        warn!(
            "Quarantined {} of {} records for {}",
            quarantined.len(),
            quarantined.len() + entries.len(),
            owner
        );
    }
    (entries, quarantined)
}
