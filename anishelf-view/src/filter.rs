use anishelf_model::Entry;

use crate::normalize::fold;

/// A folded free-text query.
///
/// An entry matches when the folded query occurs in its folded title or in
/// any folded genre tag. The empty query matches everything.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SearchQuery {
    needle: String,
}

impl SearchQuery {
    pub fn new(query: &str) -> Self {
        Self { needle: fold(query) }
    }

    pub fn is_empty(&self) -> bool {
        self.needle.is_empty()
    }

    pub fn as_str(&self) -> &str {
        &self.needle
    }

    pub fn matches(&self, entry: &Entry) -> bool {
        if self.is_empty() {
            return true;
        }
        fold(&entry.title).contains(&self.needle)
            || entry.genres.iter().any(|genre| fold(genre).contains(&self.needle))
    }
}
