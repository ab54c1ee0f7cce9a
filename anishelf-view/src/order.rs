use anishelf_model::{Entry, SortPreference};

use crate::collate::CollationKey;

/// Sorts `entries` in place by `criterion`. Every branch is a stable sort, so
/// ties keep their prior relative order.
pub fn sort_entries(entries: &mut [Entry], criterion: SortPreference) {
    match criterion {
        SortPreference::ByTitle => entries.sort_by_cached_key(|e| CollationKey::new(&e.title)),
        // `None < Some(_)`, so a missing timestamp is the oldest value.
        SortPreference::NewestFirst => entries.sort_by(|a, b| b.created_at.cmp(&a.created_at)),
        SortPreference::OldestFirst => entries.sort_by(|a, b| a.created_at.cmp(&b.created_at)),
        SortPreference::FavoritesFirst => entries.sort_by_key(|e| !e.status.is_favorite()),
        SortPreference::ByRatingDesc => {
            entries.sort_by(|a, b| rating_key(b.rating).total_cmp(&rating_key(a.rating)))
        }
    }
}

// NaN ranks with the lowest ratings; -0.0 ties with 0.0.
fn rating_key(rating: f64) -> f64 {
    if rating.is_nan() {
        f64::NEG_INFINITY
    } else if rating == 0.0 {
        0.0
    } else {
        rating
    }
}
