use anishelf_types::{EntryId, IdentityId};
use chrono::{DateTime, NaiveDateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::{Entry, EntryStatus, ModelError, ModelResult};

/// A row of the `animes` table as the remote returns it.
///
/// Every column is optional here; [`EntryRecord::into_entry`] decides which
/// gaps are fatal and which have a sensible default.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct EntryRecord {
    #[serde(default)]
    pub id: Option<i64>,
    #[serde(default)]
    pub user_id: Option<String>,
    #[serde(default)]
    pub titulo: Option<String>,
    #[serde(default)]
    pub portada: Option<String>,
    #[serde(default)]
    pub descripcion: Option<String>,
    #[serde(default)]
    pub generos: Option<Vec<String>>,
    #[serde(default)]
    pub estado: Option<String>,
    #[serde(default)]
    pub rating: Option<f64>,
    #[serde(default)]
    pub fecha_visto: Option<String>,
    #[serde(default)]
    pub created_at: Option<String>,
    #[serde(default)]
    pub updated_at: Option<String>,
}

impl EntryRecord {
    /// Deserializes a raw JSON row.
    pub fn from_value(value: serde_json::Value) -> ModelResult<Self> {
        if !value.is_object() {
            return Err(ModelError::NotAnObject);
        }
        Ok(serde_json::from_value(value)?)
    }

    /// Validates the row into an [`Entry`].
    ///
    /// When `expected_owner` is given, rows owned by anyone else are rejected.
    pub fn into_entry(self, expected_owner: Option<&IdentityId>) -> ModelResult<Entry> {
        let id = self.id.ok_or(ModelError::MissingField("id"))?;

        let raw_owner = self.user_id.ok_or(ModelError::MissingField("user_id"))?;
        let owner_id = IdentityId::parse(&raw_owner).map_err(|e| ModelError::InvalidField {
            field: "user_id",
            reason: e.to_string(),
        })?;
        if let Some(expected) = expected_owner {
            if *expected != owner_id {
                return Err(ModelError::OwnerMismatch {
                    expected: expected.to_string(),
                    found: owner_id.to_string(),
                });
            }
        }

        let title = self.titulo.ok_or(ModelError::MissingField("titulo"))?;
        if title.trim().is_empty() {
            return Err(ModelError::InvalidField {
                field: "titulo",
                reason: "blank".to_string(),
            });
        }

        let raw_status = self.estado.ok_or(ModelError::MissingField("estado"))?;
        let status: EntryStatus = raw_status.parse()?;

        Ok(Entry {
            id: EntryId::new(id),
            owner_id,
            title,
            cover_url: self.portada.unwrap_or_default(),
            synopsis: self.descripcion.unwrap_or_default(),
            genres: self.generos.unwrap_or_default(),
            status,
            rating: self.rating.unwrap_or(0.0),
            watched_on: self.fecha_visto.filter(|s| !s.trim().is_empty()),
            created_at: parse_timestamp("created_at", self.created_at.as_deref())?,
            updated_at: parse_timestamp("updated_at", self.updated_at.as_deref())?,
        })
    }
}

/// Parses a `timestamptz` (RFC 3339) or a zone-less `timestamp` column,
/// the latter read as UTC.
fn parse_timestamp(field: &'static str, raw: Option<&str>) -> ModelResult<Option<DateTime<Utc>>> {
    let Some(raw) = raw.map(str::trim).filter(|s| !s.is_empty()) else {
        return Ok(None);
    };
    if let Ok(dt) = DateTime::parse_from_rfc3339(raw) {
        return Ok(Some(dt.with_timezone(&Utc)));
    }
    NaiveDateTime::parse_from_str(raw, "%Y-%m-%dT%H:%M:%S%.f")
        .or_else(|_| NaiveDateTime::parse_from_str(raw, "%Y-%m-%d %H:%M:%S%.f"))
        .map(|naive| Some(naive.and_utc()))
        .map_err(|e| ModelError::InvalidField {
            field,
            reason: format!("{raw:?}: {e}"),
        })
}
