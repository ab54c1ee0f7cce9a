//! Filter/sort engine for AniShelf.
//!
//! Derives the displayed view-sequence from the entry store, a free-text
//! query and a [`SortPreference`]. Everything here is synchronous and pure:
//! the input slice is never touched and every call returns a fresh `Vec`.
//!
//! # Example
//!
//! ```
//! use anishelf_model::SortPreference;
//! use anishelf_view::derive_view;
//!
//! let view = derive_view(&[], "pelicula", SortPreference::ByTitle);
//! assert!(view.is_empty());
//! ```

mod collate;
mod filter;
mod normalize;
mod order;

pub use collate::{compare_titles, CollationKey};
pub use filter::SearchQuery;
pub use normalize::fold;
pub use order::sort_entries;

use anishelf_model::{Entry, SortPreference};
use tracing::trace;

/// Filters `entries` by `query` and orders the survivors by `criterion`.
pub fn derive_view(entries: &[Entry], query: &str, criterion: SortPreference) -> Vec<Entry> {
    let mut view = filter_entries(entries, query);
    sort_entries(&mut view, criterion);
    trace!(total = entries.len(), shown = view.len(), %criterion, "derived view");
    view
}

/// Like [`derive_view`] but takes the criterion as a raw token (storage token
/// or snake-case name). An unrecognized token leaves the filtered entries in
/// their given order.
pub fn derive_view_with(entries: &[Entry], query: &str, criterion: &str) -> Vec<Entry> {
    match SortPreference::parse(criterion) {
        Some(criterion) => derive_view(entries, query, criterion),
        None => {
            trace!(criterion, "unrecognized sort criterion, keeping given order");
            filter_entries(entries, query)
        }
    }
}

/// Entries matching `query`, in their given order.
pub fn filter_entries(entries: &[Entry], query: &str) -> Vec<Entry> {
    let query = SearchQuery::new(query);
    entries
        .iter()
        .filter(|entry| query.matches(entry))
        .cloned()
        .collect()
}
