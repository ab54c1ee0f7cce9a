//! Sort preference persistence for AniShelf.
//!
//! Each identity (or the guest namespace when nobody is signed in) keeps its
//! own [`SortPreference`] under `<namespace>_animeSortCriteria`. Reads and
//! writes are best-effort: a failing backend is logged and otherwise ignored,
//! because losing a sort preference never affects correctness.

mod backend;
mod error;

pub use backend::{MemoryBackend, PreferenceBackend, SqliteBackend};
pub use error::{PrefsError, PrefsResult};

use anishelf_model::SortPreference;
use anishelf_types::IdentityId;
use tracing::{debug, warn};

/// Suffix of every sort preference key.
pub const SORT_KEY: &str = "animeSortCriteria";

/// Storage key for `identity`'s sort preference.
pub fn storage_key(identity: Option<&IdentityId>) -> String {
    format!("{}_{SORT_KEY}", IdentityId::namespace(identity))
}

/// Best-effort sort preference store.
pub struct SortPreferences<B> {
    backend: B,
}

impl<B: PreferenceBackend> SortPreferences<B> {
    pub fn new(backend: B) -> Self {
        Self { backend }
    }

    pub fn backend(&self) -> &B {
        &self.backend
    }

    /// Reads `identity`'s preference. Missing, unreadable and unrecognized
    /// values all come back as `None`.
    pub fn load(&self, identity: Option<&IdentityId>) -> Option<SortPreference> {
        let key = storage_key(identity);
        let raw = match self.backend.get(&key) {
            Ok(raw) => raw?,
            Err(e) => {
                warn!("Failed to read sort preference {}: {}", key, e);
                return None;
            }
        };
        let parsed = SortPreference::parse(&raw);
        if parsed.is_none() {
            debug!("Ignoring unrecognized sort preference {:?} under {}", raw, key);
        }
        parsed
    }

    /// Writes `identity`'s preference, logging and swallowing any failure.
    pub fn save(&self, identity: Option<&IdentityId>, value: SortPreference) {
        let key = storage_key(identity);
        if let Err(e) = self.backend.set(&key, value.storage_token()) {
            warn!("Failed to save sort preference {}: {}", key, e);
        }
    }
}
