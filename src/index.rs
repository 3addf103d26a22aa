//! The Inverted Index: a sorted, multi-level mapping from token to location
//! to positions, with a per-location word-count side table, plus the
//! `search` algorithm (exact and prefix) and a concurrency-safe wrapper.
//!
//! `BTreeMap`/`BTreeSet` are used rather than hash maps because prefix search
//! needs an ordered tail-range scan (`range(stem..)`); an insertion-order
//! hash map cannot support that in better than linear time.

use crate::location::Location;
use crate::lock::RwGate;
use std::cmp::Ordering;
use std::collections::{BTreeMap, BTreeSet};

/// A single match: one Location bound to how many query tokens it matched
/// and the resulting score.
///
/// The denominator used to compute `score` is captured here at construction
/// time rather than read back from the index on demand, so `QueryResult` has
/// no back-reference to the enclosing index (see design notes).
#[derive(Debug, Clone, PartialEq, serde::Serialize)]
pub struct QueryResult {
    pub location: Location,
    pub matches: u32,
    pub score: f64,
}

/// The plain, lock-free Inverted Index.
///
/// Builder worker threads each own one of these to build a local index
/// without contending on a shared lock; `merge` then folds it into the
/// shared index in one write-locked step (see `builder.rs`).
#[derive(Debug, Clone, Default, serde::Serialize, serde::Deserialize)]
pub struct InvertedIndex {
    index: BTreeMap<String, BTreeMap<Location, BTreeSet<u32>>>,
    counts: BTreeMap<Location, u32>,
}

impl InvertedIndex {
    pub fn new() -> Self {
        Self::default()
    }

    /// Record one (token, location, position) observation. Idempotent: if
    /// this exact triple was already recorded, `counts` is not incremented
    /// again.
    pub fn add(&mut self, token: &str, location: &Location, position: u32) {
        let positions = self
            .index
            .entry(token.to_string())
            .or_default()
            .entry(location.clone())
            .or_default();

        if positions.insert(position) {
            *self.counts.entry(location.clone()).or_insert(0) += 1;
        }
    }

    /// Convenience: record `tokens` at consecutive positions starting at
    /// `start`.
    pub fn add_all(&mut self, tokens: &[String], location: &Location, start: u32) {
        for (offset, token) in tokens.iter().enumerate() {
            self.add(token, location, start + offset as u32);
        }
    }

    /// Union all triples from `other` into `self`.
    ///
    /// This assumes `other`'s locations are disjoint from `self`'s — the
    /// Builder and Crawler both uphold that (each file/page is indexed
    /// exactly once) — so `counts` can simply be summed per location rather
    /// than recomputed from cardinality. Violating that assumption would
    /// double-count; see the design notes' merge-overlap caveat.
    pub fn merge(&mut self, other: &InvertedIndex) {
        for (token, locations) in &other.index {
            let entry = self.index.entry(token.clone()).or_default();
            for (location, positions) in locations {
                entry
                    .entry(location.clone())
                    .or_default()
                    .extend(positions.iter().copied());
            }
        }
        for (location, count) in &other.counts {
            *self.counts.entry(location.clone()).or_insert(0) += count;
        }
    }

    pub fn contains_word(&self, token: &str) -> bool {
        self.index.contains_key(token)
    }

    pub fn contains_location(&self, token: &str, location: &Location) -> bool {
        self.index
            .get(token)
            .is_some_and(|locations| locations.contains_key(location))
    }

    pub fn contains_position(&self, token: &str, location: &Location, position: u32) -> bool {
        self.index
            .get(token)
            .and_then(|locations| locations.get(location))
            .is_some_and(|positions| positions.contains(&position))
    }

    pub fn contains_count(&self, location: &Location) -> bool {
        self.counts.contains_key(location)
    }

    pub fn num_words(&self) -> usize {
        self.index.len()
    }

    pub fn num_locations(&self, token: &str) -> usize {
        self.index.get(token).map_or(0, BTreeMap::len)
    }

    pub fn num_positions(&self, token: &str, location: &Location) -> usize {
        self.index
            .get(token)
            .and_then(|locations| locations.get(location))
            .map_or(0, BTreeSet::len)
    }

    pub fn num_counts(&self) -> usize {
        self.counts.len()
    }

    pub fn words(&self) -> impl Iterator<Item = &String> {
        self.index.keys()
    }

    pub fn locations(&self, token: &str) -> Vec<Location> {
        self.index
            .get(token)
            .map(|m| m.keys().cloned().collect())
            .unwrap_or_default()
    }

    pub fn positions(&self, token: &str, location: &Location) -> Vec<u32> {
        self.index
            .get(token)
            .and_then(|m| m.get(location))
            .map(|p| p.iter().copied().collect())
            .unwrap_or_default()
    }

    pub fn counts(&self) -> &BTreeMap<Location, u32> {
        &self.counts
    }

    pub fn count(&self, location: &Location) -> Option<u32> {
        self.counts.get(location).copied()
    }

    /// Search for `stems`, either by exact token equality or by treating each
    /// stem as a prefix of indexed tokens. `stems` must not contain the empty
    /// string in prefix mode — that would match every token and is a
    /// programmer error the caller (the Query Processor) avoids by
    /// construction.
    pub fn search(&self, stems: &BTreeSet<String>, prefix: bool) -> Vec<QueryResult> {
        let mut hits: BTreeMap<Location, usize> = BTreeMap::new();

        for stem in stems {
            if prefix {
                debug_assert!(!stem.is_empty(), "empty prefix stem would match every token");
                for (_token, locations) in self.index.range(stem.clone()..) {
                    if !_token.starts_with(stem.as_str()) {
                        break;
                    }
                    accumulate(&mut hits, locations);
                }
            } else if let Some(locations) = self.index.get(stem) {
                accumulate(&mut hits, locations);
            }
        }

        let mut results: Vec<QueryResult> = hits
            .into_iter()
            .map(|(location, matches)| {
                let total = self.counts.get(&location).copied().unwrap_or(0).max(1);
                QueryResult {
                    location,
                    matches: matches as u32,
                    score: matches as f64 / total as f64,
                }
            })
            .collect();

        results.sort_by(|a, b| {
            b.score
                .partial_cmp(&a.score)
                .unwrap_or(Ordering::Equal)
                .then_with(|| b.matches.cmp(&a.matches))
                .then_with(|| a.location.cmp_case_insensitive(&b.location))
        });

        results
    }
}

fn accumulate(hits: &mut BTreeMap<Location, usize>, locations: &BTreeMap<Location, BTreeSet<u32>>) {
    for (location, positions) in locations {
        *hits.entry(location.clone()).or_insert(0) += positions.len();
    }
}

/// The thread-safe wrapper: pairs a plain `InvertedIndex` with an `RwGate`
/// and exposes only the read/write contract spec.md §4.3 describes — no
/// caller can reach the unguarded `InvertedIndex` directly.
#[derive(Debug, Default)]
pub struct SharedIndex {
    gate: RwGate,
    index: std::cell::UnsafeCell<InvertedIndex>,
}

// SAFETY: every access to `index` goes through a method that first acquires
// the matching side of `gate`, which provides the necessary synchronization.
unsafe impl Sync for SharedIndex {}
unsafe impl Send for SharedIndex {}

impl SharedIndex {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn add(&self, token: &str, location: &Location, position: u32) {
        let _guard = self.gate.write_lock();
        unsafe { &mut *self.index.get() }.add(token, location, position);
    }

    pub fn add_all(&self, tokens: &[String], location: &Location, start: u32) {
        let _guard = self.gate.write_lock();
        unsafe { &mut *self.index.get() }.add_all(tokens, location, start);
    }

    /// Merge a local index into the shared one under the write lock. This is
    /// the only operation the Builder and Crawler need that touches the
    /// shared index directly; it holds the lock only for the set-union.
    pub fn merge(&self, other: &InvertedIndex) {
        let _guard = self.gate.write_lock();
        unsafe { &mut *self.index.get() }.merge(other);
    }

    /// Run `f` against a read-locked snapshot of the index. This is how all
    /// of the read-only queries below and `search` are implemented; `f`
    /// cannot leak a reference outside the lock's scope.
    fn with_read<T>(&self, f: impl FnOnce(&InvertedIndex) -> T) -> T {
        let _guard = self.gate.read_lock();
        f(unsafe { &*self.index.get() })
    }

    pub fn contains_word(&self, token: &str) -> bool {
        self.with_read(|i| i.contains_word(token))
    }

    pub fn contains_location(&self, token: &str, location: &Location) -> bool {
        self.with_read(|i| i.contains_location(token, location))
    }

    pub fn contains_position(&self, token: &str, location: &Location, position: u32) -> bool {
        self.with_read(|i| i.contains_position(token, location, position))
    }

    pub fn contains_count(&self, location: &Location) -> bool {
        self.with_read(|i| i.contains_count(location))
    }

    pub fn num_words(&self) -> usize {
        self.with_read(InvertedIndex::num_words)
    }

    pub fn num_locations(&self, token: &str) -> usize {
        self.with_read(|i| i.num_locations(token))
    }

    pub fn num_positions(&self, token: &str, location: &Location) -> usize {
        self.with_read(|i| i.num_positions(token, location))
    }

    pub fn num_counts(&self) -> usize {
        self.with_read(InvertedIndex::num_counts)
    }

    pub fn words(&self) -> Vec<String> {
        self.with_read(|i| i.words().cloned().collect())
    }

    pub fn locations(&self, token: &str) -> Vec<Location> {
        self.with_read(|i| i.locations(token))
    }

    pub fn positions(&self, token: &str, location: &Location) -> Vec<u32> {
        self.with_read(|i| i.positions(token, location))
    }

    pub fn counts(&self) -> BTreeMap<Location, u32> {
        self.with_read(|i| i.counts().clone())
    }

    pub fn count(&self, location: &Location) -> Option<u32> {
        self.with_read(|i| i.count(location))
    }

    pub fn search(&self, stems: &BTreeSet<String>, prefix: bool) -> Vec<QueryResult> {
        self.with_read(|i| i.search(stems, prefix))
    }

    /// Take a consistent read-locked clone of the underlying index, used by
    /// the JSON emitter.
    pub fn snapshot(&self) -> InvertedIndex {
        self.with_read(Clone::clone)
    }
}
