//! Levenshtein-based similarity used to match near-duplicate group names.
//!
//! KNX names usually start with a room or zone typed by hand, with small
//! variations between addresses of the same function, and end with an exact
//! functional suffix. [`are_names_similar`] therefore compares the first
//! words fuzzily and everything after them exactly.

/// Minimum similarity for two names to be treated as the same function.
pub const SIMILARITY_THRESHOLD: f64 = 0.8;

/// Number of leading words compared fuzzily by [`are_names_similar`].
pub const FUZZY_PREFIX_WORDS: usize = 3;

/// Edit distance with unit cost for insertion, deletion and substitution.
///
/// Counted in `char`s, so accented room names cost one edit per letter.
pub fn levenshtein_distance(a: &str, b: &str) -> usize {
    strsim::levenshtein(a, b)
}

/// `1 - distance / max(len)`, in `[0, 1]`. Two empty strings are identical.
///
/// Characters are compared as-is; callers fold case when they need to.
pub fn calculate_similarity(a: &str, b: &str) -> f64 {
    let longest = a.chars().count().max(b.chars().count());
    if longest == 0 {
        return 1.0;
    }
    1.0 - levenshtein_distance(a, b) as f64 / longest as f64
}

/// Whether two group names describe the same function.
///
/// Names are split into lower-cased words on whitespace and `_`. They must
/// have the same number of words; the first [`FUZZY_PREFIX_WORDS`] words,
/// joined by single spaces, must reach [`SIMILARITY_THRESHOLD`]; all later
/// words must be equal.
pub fn are_names_similar(name1: &str, name2: &str) -> bool {
    let words1 = split_words(name1);
    let words2 = split_words(name2);
    if words1.is_empty() || words2.is_empty() || words1.len() != words2.len() {
        return false;
    }

    let fuzzy = words1.len().min(FUZZY_PREFIX_WORDS);
    let prefix1 = words1[..fuzzy].join(" ");
    let prefix2 = words2[..fuzzy].join(" ");
    if calculate_similarity(&prefix1, &prefix2) < SIMILARITY_THRESHOLD {
        return false;
    }

    words1[fuzzy..] == words2[fuzzy..]
}

pub(crate) fn split_words(name: &str) -> Vec<String> {
    name.split(|c: char| c.is_whitespace() || c == '_')
        .filter(|word| !word.is_empty())
        .map(|word| word.to_lowercase())
        .collect()
}
