//! Locale-style title collation.
//!
//! Approximates the root collation order used by browsers' `localeCompare`:
//! letters compare without regard to accents or case first, then unaccented
//! before accented, then lowercase before uppercase. The raw string breaks
//! any remaining tie so the order is total.

use std::cmp::Ordering;

use unicode_normalization::UnicodeNormalization;

use crate::normalize::{fold, fold_case};

/// Precomputed sort key for one title.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord)]
pub struct CollationKey {
    primary: String,
    secondary: String,
    tertiary: Vec<bool>,
    raw: String,
}

impl CollationKey {
    pub fn new(text: &str) -> Self {
        Self {
            primary: fold(text),
            secondary: fold_case(text),
            tertiary: text.nfd().map(char::is_uppercase).collect(),
            raw: text.to_string(),
        }
    }
}

/// Compares two titles the way [`CollationKey`] orders them.
pub fn compare_titles(a: &str, b: &str) -> Ordering {
    CollationKey::new(a).cmp(&CollationKey::new(b))
}
