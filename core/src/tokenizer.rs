use lazy_static::lazy_static;
use regex::Regex;
use unicode_normalization::UnicodeNormalization;

use std::collections::BTreeSet;

lazy_static! {
    static ref RE: Regex = Regex::new(r"(?u)[\p{Alphabetic}\p{N}]+").expect("valid regex");
}

/// Tokenize text into terms using NFKC normalization, lowercasing, and
/// splitting on every non-alphanumeric character.
///
/// Indexing and querying both go through this function; any change here
/// changes what matches.
pub fn tokenize(text: &str) -> Vec<String> {
    let normalized = text.nfkc().collect::<String>().to_lowercase();
    RE.find_iter(&normalized).map(|m| m.as_str().to_string()).collect()
}

/// Distinct terms of `text`, sorted.
pub fn unique_terms(text: &str) -> BTreeSet<String> {
    tokenize(text).into_iter().collect()
}
