//! Entry model for AniShelf.
//!
//! Defines the types every other crate agrees on:
//! - [`Entry`]: one tracked media item, strongly typed
//! - [`EntryStatus`]: the closed set of watch states
//! - [`EntryDraft`] / [`EntryPatch`]: create and edit payloads
//! - [`EntryRecord`]: the loose wire shape, validated into an [`Entry`]
//!   at the store boundary
//! - [`SortPreference`]: the persisted ordering criterion
//! - [`UserProfile`], [`SignUpForm`], [`SignInIdentifier`]: auth-side data

mod entry;
mod error;
mod forms;
mod profile;
mod record;
mod sort;

pub use entry::{parse_genres, Entry, EntryDraft, EntryPatch, EntryStatus};
pub use error::{ModelError, ModelResult};
pub use forms::{SignInIdentifier, SignUpForm, MIN_PASSWORD_LEN};
pub use profile::{display_name, UserProfile};
pub use record::EntryRecord;
pub use sort::SortPreference;
