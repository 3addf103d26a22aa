//! Text tokenization and stemming — the pure text-processing seam between
//! raw source text and the Inverted Index.
//!
//! `parse` and `stem` are deliberately minimal: a token is whatever remains
//! after splitting on non-letter/digit boundaries and lowercasing, and
//! stemming is English Snowball, unmodified. There is no stop-word list and
//! no case-splitting (CamelCase/snake_case) — both are explicit non-goals.

use rust_stemmers::{Algorithm, Stemmer};
use std::collections::BTreeSet;

/// Construct a fresh English Snowball stemmer.
///
/// Snowball stemmers are not guaranteed thread-safe, so each call site that
/// needs one (a builder worker, a crawl task) should own its instance rather
/// than share one across threads.
pub fn new_stemmer() -> Stemmer {
    Stemmer::create(Algorithm::English)
}

/// Split `text` into tokens by lowercasing and stripping everything that is
/// not a letter or digit, then splitting on whitespace runs. Token order is
/// preserved and duplicates are allowed — this is the raw token stream a
/// single Location produces, assigned 1-based positions by the caller.
pub fn parse(text: &str) -> Vec<String> {
    text.to_lowercase()
        .chars()
        .map(|c| if c.is_alphanumeric() { c } else { ' ' })
        .collect::<String>()
        .split_whitespace()
        .map(str::to_string)
        .filter(|token| !token.is_empty())
        .collect()
}

/// Stem a single token with the given stemmer.
pub fn stem(token: &str, stemmer: &Stemmer) -> String {
    stemmer.stem(token).into_owned()
}

/// Parse `line`, stem every token, deduplicate, and return the stems as a
/// case-insensitively sorted ordered set — the canonical form a query uses
/// both to memoize and to drive `search`.
pub fn unique_stems(line: &str, stemmer: &Stemmer) -> BTreeSet<String> {
    parse(line).into_iter().map(|t| stem(&t, stemmer)).collect()
}
