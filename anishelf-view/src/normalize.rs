//! Accent- and case-folding for search.

use unicode_normalization::UnicodeNormalization;

/// The Combining Diacritical Marks block. Only these are stripped, so marks
/// outside it (kana voicing marks, for instance) still distinguish text.
const DIACRITICS: std::ops::RangeInclusive<char> = '\u{0300}'..='\u{036F}';

/// Canonically decomposes `text`, drops combining diacritics and lowercases
/// the rest. `"Películas"` becomes `"peliculas"`.
pub fn fold(text: &str) -> String {
    text.nfd()
        .filter(|c| !DIACRITICS.contains(c))
        .flat_map(char::to_lowercase)
        .collect()
}

/// Lowercases after decomposition but keeps the diacritics, so accented and
/// unaccented spellings stay distinct. Used as the secondary collation level.
pub(crate) fn fold_case(text: &str) -> String {
    text.nfd().flat_map(char::to_lowercase).collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn strips_accents_and_case() {
        assert_eq!(fold("Películas"), "peliculas");
        assert_eq!(fold("ÁNGEL"), "angel");
        assert_eq!(fold("Über"), "uber");
    }

    #[test]
    fn precomposed_and_decomposed_agree() {
        assert_eq!(fold("e\u{0301}"), fold("\u{00E9}"));
    }

    #[test]
    fn keeps_marks_outside_the_diacritic_block() {
        // ガ decomposes to カ + U+3099, which must survive.
        assert_ne!(fold("ガ"), fold("カ"));
    }

    #[test]
    fn fold_case_keeps_accents() {
        assert_eq!(fold_case("Á"), "a\u{0301}");
    }
}
