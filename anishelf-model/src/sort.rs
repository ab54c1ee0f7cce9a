use serde::{Deserialize, Serialize};
use std::fmt;

/// Ordering criterion for the entry view, persisted per identity.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SortPreference {
    ByTitle,
    #[default]
    NewestFirst,
    OldestFirst,
    FavoritesFirst,
    ByRatingDesc,
}

impl SortPreference {
    pub const ALL: [SortPreference; 5] = [
        SortPreference::NewestFirst,
        SortPreference::OldestFirst,
        SortPreference::ByTitle,
        SortPreference::FavoritesFirst,
        SortPreference::ByRatingDesc,
    ];

    /// Token written to preference storage. These are the values the web
    /// client has always stored, so older saved preferences keep loading.
    pub const fn storage_token(&self) -> &'static str {
        match self {
            SortPreference::ByTitle => "nombre",
            SortPreference::NewestFirst => "fecha",
            SortPreference::OldestFirst => "fecha2",
            SortPreference::FavoritesFirst => "favorito",
            SortPreference::ByRatingDesc => "rating",
        }
    }

    /// Snake-case name, as used on the command line and in serde.
    pub const fn name(&self) -> &'static str {
        match self {
            SortPreference::ByTitle => "by_title",
            SortPreference::NewestFirst => "newest_first",
            SortPreference::OldestFirst => "oldest_first",
            SortPreference::FavoritesFirst => "favorites_first",
            SortPreference::ByRatingDesc => "by_rating_desc",
        }
    }

    pub const fn label(&self) -> &'static str {
        match self {
            SortPreference::ByTitle => "Title (A-Z)",
            SortPreference::NewestFirst => "Newest first",
            SortPreference::OldestFirst => "Oldest first",
            SortPreference::FavoritesFirst => "Favorites first",
            SortPreference::ByRatingDesc => "Highest rating first",
        }
    }

    /// Accepts a storage token or a snake-case name. Anything else is `None`.
    pub fn parse(s: &str) -> Option<Self> {
        Self::ALL
            .into_iter()
            .find(|pref| pref.storage_token() == s || pref.name() == s)
    }
}

impl fmt::Display for SortPreference {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}
