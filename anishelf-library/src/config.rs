use anishelf_model::SortPreference;
use serde::{Deserialize, Serialize};
use std::time::Duration;

/// Configuration for the library facade.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct LibraryConfig {
    /// How long start-up waits for the auth service before continuing
    /// signed out (ms).
    pub loading_timeout_ms: u64,
    /// Criterion used when an identity has no stored preference.
    pub default_sort: SortPreference,
    /// Remote table holding entries.
    pub entries_table: String,
    /// Remote table holding user profiles.
    pub profiles_table: String,
}

impl Default for LibraryConfig {
    fn default() -> Self {
        Self {
            loading_timeout_ms: 5_000,
            default_sort: SortPreference::NewestFirst,
            entries_table: "animes".to_string(),
            profiles_table: "profiles".to_string(),
        }
    }
}

impl LibraryConfig {
    pub fn loading_timeout(&self) -> Duration {
        Duration::from_millis(self.loading_timeout_ms)
    }
}
