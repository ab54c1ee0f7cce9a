use anishelf_types::{EntryId, IdentityId};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

use crate::ModelError;

/// Watch state of an entry.
///
/// Serialized with the strings the remote `animes.estado` column stores.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub enum EntryStatus {
    #[default]
    #[serde(rename = "Visto")]
    Seen,
    #[serde(rename = "Viéndolo")]
    Watching,
    #[serde(rename = "Por ver")]
    ToWatch,
    #[serde(rename = "Favorito")]
    Favorite,
    #[serde(rename = "Dropped")]
    Dropped,
}

impl EntryStatus {
    pub const ALL: [EntryStatus; 5] = [
        EntryStatus::Seen,
        EntryStatus::Watching,
        EntryStatus::ToWatch,
        EntryStatus::Favorite,
        EntryStatus::Dropped,
    ];

    /// The string stored in the remote column.
    pub const fn as_wire(&self) -> &'static str {
        match self {
            EntryStatus::Seen => "Visto",
            EntryStatus::Watching => "Viéndolo",
            EntryStatus::ToWatch => "Por ver",
            EntryStatus::Favorite => "Favorito",
            EntryStatus::Dropped => "Dropped",
        }
    }

    /// Parses either the wire string or the snake-case variant name.
    pub fn parse(s: &str) -> Option<Self> {
        let trimmed = s.trim();
        Self::ALL
            .into_iter()
            .find(|status| status.as_wire() == trimmed)
            .or_else(|| match trimmed.to_ascii_lowercase().as_str() {
                "seen" => Some(EntryStatus::Seen),
                "watching" => Some(EntryStatus::Watching),
                "to_watch" | "towatch" => Some(EntryStatus::ToWatch),
                "favorite" => Some(EntryStatus::Favorite),
                "dropped" => Some(EntryStatus::Dropped),
                _ => None,
            })
    }

    pub const fn is_favorite(&self) -> bool {
        matches!(self, EntryStatus::Favorite)
    }
}

impl fmt::Display for EntryStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_wire())
    }
}

impl FromStr for EntryStatus {
    type Err = ModelError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::parse(s).ok_or_else(|| ModelError::InvalidField {
            field: "estado",
            reason: format!("unknown status {s:?}"),
        })
    }
}

/// One tracked media item.
///
/// Entries are only ever built from validated remote records, so every
/// instance has an id and an owner.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Entry {
    pub id: EntryId,
    pub owner_id: IdentityId,
    pub title: String,
    pub cover_url: String,
    pub synopsis: String,
    pub genres: Vec<String>,
    pub status: EntryStatus,
    /// Expected 0–10 in steps of 0.5. Not clamped.
    pub rating: f64,
    /// Free-form "watched on" text, stored as the user's client rendered it.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub watched_on: Option<String>,
    /// Absent on records that never round-tripped through the remote.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub created_at: Option<DateTime<Utc>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub updated_at: Option<DateTime<Utc>>,
}

impl Entry {
    /// First `max_chars` characters of the synopsis, with an ellipsis when cut.
    pub fn synopsis_preview(&self, max_chars: usize) -> String {
        let mut chars = self.synopsis.chars();
        let head: String = chars.by_ref().take(max_chars).collect();
        if chars.next().is_some() {
            format!("{head}...")
        } else {
            head
        }
    }

    /// The first `shown` genres plus the count of the ones left out.
    pub fn genre_preview(&self, shown: usize) -> (&[String], usize) {
        let cut = self.genres.len().min(shown);
        (&self.genres[..cut], self.genres.len() - cut)
    }
}

/// Payload of the create form.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EntryDraft {
    pub title: String,
    #[serde(default)]
    pub cover_url: String,
    #[serde(default)]
    pub synopsis: String,
    #[serde(default)]
    pub genres: Vec<String>,
    #[serde(default)]
    pub status: EntryStatus,
    #[serde(default)]
    pub rating: f64,
}

impl Default for EntryDraft {
    fn default() -> Self {
        Self {
            title: String::new(),
            cover_url: String::new(),
            synopsis: String::new(),
            genres: Vec::new(),
            status: EntryStatus::Seen,
            rating: 0.0,
        }
    }
}

impl EntryDraft {
    pub fn new(title: impl Into<String>) -> Self {
        Self {
            title: title.into(),
            ..Default::default()
        }
    }

    /// Rejects drafts the remote would store without a usable title.
    pub fn validate(&self) -> Result<(), ModelError> {
        if self.title.trim().is_empty() {
            return Err(ModelError::Validation("title is required".to_string()));
        }
        Ok(())
    }

    /// Wire record for an insert, owned by `owner`.
    pub fn to_record(&self, owner: &IdentityId) -> serde_json::Value {
        serde_json::json!({
            "user_id": owner.to_string(),
            "titulo": self.title,
            "portada": self.cover_url,
            "descripcion": self.synopsis,
            "generos": self.genres,
            "estado": self.status.as_wire(),
            "rating": self.rating,
        })
    }
}

/// Payload of the edit form. Absent fields are left untouched remotely.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct EntryPatch {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub title: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub cover_url: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub synopsis: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub genres: Option<Vec<String>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub status: Option<EntryStatus>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub rating: Option<f64>,
}

impl EntryPatch {
    pub fn is_empty(&self) -> bool {
        self.title.is_none()
            && self.cover_url.is_none()
            && self.synopsis.is_none()
            && self.genres.is_none()
            && self.status.is_none()
            && self.rating.is_none()
    }

    pub fn validate(&self) -> Result<(), ModelError> {
        if self.is_empty() {
            return Err(ModelError::Validation("nothing to update".to_string()));
        }
        if self.title.as_deref().is_some_and(|t| t.trim().is_empty()) {
            return Err(ModelError::Validation("title is required".to_string()));
        }
        Ok(())
    }

    /// Wire object holding only the fields present in the patch.
    pub fn to_record(&self) -> serde_json::Value {
        let mut map = serde_json::Map::new();
        if let Some(title) = &self.title {
            map.insert("titulo".into(), title.clone().into());
        }
        if let Some(cover) = &self.cover_url {
            map.insert("portada".into(), cover.clone().into());
        }
        if let Some(synopsis) = &self.synopsis {
            map.insert("descripcion".into(), synopsis.clone().into());
        }
        if let Some(genres) = &self.genres {
            map.insert("generos".into(), genres.clone().into());
        }
        if let Some(status) = &self.status {
            map.insert("estado".into(), status.as_wire().into());
        }
        if let Some(rating) = self.rating {
            map.insert("rating".into(), rating.into());
        }
        serde_json::Value::Object(map)
    }
}

/// Splits a comma-separated genre list, trimming each tag and dropping
/// empty ones.
pub fn parse_genres(input: &str) -> Vec<String> {
    input
        .split(',')
        .map(str::trim)
        .filter(|tag| !tag.is_empty())
        .map(String::from)
        .collect()
}
