//! The Query Processor: normalizes and deduplicates query lines, memoizes
//! per-mode search results, and exposes the memo for JSON export.
//!
//! Memoization is per-mode (exact, prefix independently) and keyed by the
//! canonical query — the input's stems joined by single spaces in sorted
//! order — so that two differently-worded lines that stem to the same set of
//! words share one cache entry and one underlying `search` call.

use crate::index::{QueryResult, SharedIndex};
use crate::error::QueryError;
use crate::queue::WorkQueue;
use crate::tokenize::{new_stemmer, unique_stems};
use std::collections::BTreeMap;
use std::fs::File;
use std::io::{BufRead, BufReader};
use std::path::Path;
use std::sync::{Arc, Mutex};

/// Build the canonical query key: stems joined by single spaces, already in
/// sorted order because `unique_stems` returns a `BTreeSet`.
fn canonical_key(line: &str) -> String {
    let stemmer = new_stemmer();
    unique_stems(line, &stemmer)
        .into_iter()
        .collect::<Vec<_>>()
        .join(" ")
}

#[derive(Default)]
struct Memo {
    exact: Mutex<BTreeMap<String, Vec<QueryResult>>>,
    prefix: Mutex<BTreeMap<String, Vec<QueryResult>>>,
}

impl Memo {
    fn table(&self, prefix: bool) -> &Mutex<BTreeMap<String, Vec<QueryResult>>> {
        if prefix { &self.prefix } else { &self.exact }
    }
}

/// Normalizes, deduplicates, and memoizes queries against a `SharedIndex`.
pub struct QueryProcessor {
    index: Arc<SharedIndex>,
    memo: Memo,
}

impl QueryProcessor {
    pub fn new(index: Arc<SharedIndex>) -> Self {
        Self {
            index,
            memo: Memo::default(),
        }
    }

    /// Read `path` line by line, calling `process_line` on each.
    pub fn process_file(&self, path: &Path, prefix: bool) -> Result<(), QueryError> {
        let file = File::open(path).map_err(|e| QueryError::Io {
            path: path.to_path_buf(),
            reason: e.to_string(),
        })?;

        for line in BufReader::new(file).lines() {
            let line = line.map_err(|e| QueryError::Io {
                path: path.to_path_buf(),
                reason: e.to_string(),
            })?;
            self.process_line(&line, prefix);
        }

        Ok(())
    }

    /// Submit every line of `path` as a `WorkQueue` job, then block until the
    /// queue drains. This is the multi-threaded variant spec.md §4.5
    /// describes: tokenization, the memo check, the search, and the memo
    /// insert each briefly acquire the shared memo mutex, while the search
    /// itself is synchronized by the Index's own lock.
    pub fn process_file_threaded(
        self: &Arc<Self>,
        path: &Path,
        prefix: bool,
        queue: &WorkQueue,
    ) -> Result<(), QueryError> {
        let file = File::open(path).map_err(|e| QueryError::Io {
            path: path.to_path_buf(),
            reason: e.to_string(),
        })?;

        for line in BufReader::new(file).lines() {
            let line = line.map_err(|e| QueryError::Io {
                path: path.to_path_buf(),
                reason: e.to_string(),
            })?;
            let this = Arc::clone(self);
            queue.execute(move || this.process_line(&line, prefix));
        }

        queue.finish();
        Ok(())
    }

    /// Tokenize and stem `line` into a canonical query key; if the key is
    /// empty or already memoized for `prefix`, return without searching.
    /// Otherwise run `index.search` and memoize the result.
    pub fn process_line(&self, line: &str, prefix: bool) {
        let stemmer = new_stemmer();
        let stems = unique_stems(line, &stemmer);
        let key = stems.iter().cloned().collect::<Vec<_>>().join(" ");

        if key.is_empty() {
            return;
        }

        let table = self.memo.table(prefix);
        {
            let memo = table.lock().unwrap_or_else(|e| e.into_inner());
            if memo.contains_key(&key) {
                return;
            }
        }

        let results = self.index.search(&stems, prefix);

        let mut memo = table.lock().unwrap_or_else(|e| e.into_inner());
        memo.entry(key).or_insert(results);
    }

    /// The set of canonical query keys memoized under `prefix` mode so far.
    pub fn queries(&self, prefix: bool) -> Vec<String> {
        self.memo
            .table(prefix)
            .lock()
            .unwrap_or_else(|e| e.into_inner())
            .keys()
            .cloned()
            .collect()
    }

    /// The memoized results for `query` under `prefix` mode, re-canonicalized
    /// before lookup so callers may pass an unnormalized line.
    pub fn results(&self, query: &str, prefix: bool) -> Vec<QueryResult> {
        let key = canonical_key(query);
        self.memo
            .table(prefix)
            .lock()
            .unwrap_or_else(|e| e.into_inner())
            .get(&key)
            .cloned()
            .unwrap_or_default()
    }

    /// A snapshot of the entire per-mode memo, sorted by key ascending, for
    /// the JSON results writer.
    pub fn memo_snapshot(&self, prefix: bool) -> BTreeMap<String, Vec<QueryResult>> {
        self.memo
            .table(prefix)
            .lock()
            .unwrap_or_else(|e| e.into_inner())
            .clone()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::location::Location;
    use assert2::check;
    use std::io::Write;
    use tempfile::NamedTempFile;

    fn index_with_fixture() -> Arc<SharedIndex> {
        let index = Arc::new(SharedIndex::new());
        let loc = Location::new("a.txt");
        index.add_all(
            &["the", "quick", "brown", "fox"].map(String::from).to_vec(),
            &loc,
            1,
        );
        index
    }

    #[test]
    fn process_line_memoizes_per_mode_independently() {
        let processor = QueryProcessor::new(index_with_fixture());
        processor.process_line("quick fox", false);
        processor.process_line("quick fox", true);

        check!(processor.queries(false).len() == 1);
        check!(processor.queries(true).len() == 1);
    }

    #[test]
    fn empty_query_line_is_not_memoized() {
        let processor = QueryProcessor::new(index_with_fixture());
        processor.process_line("", false);
        processor.process_line("   ", false);
        check!(processor.queries(false).is_empty());
    }

    /// S6 — feeding the same line twice performs at most one underlying
    /// search (observed indirectly: the memoized result is stable and the
    /// query set doesn't grow).
    #[test]
    fn repeated_query_line_is_idempotent() {
        let processor = QueryProcessor::new(index_with_fixture());
        processor.process_line("quick fox", false);
        let first = processor.results("quick fox", false);
        processor.process_line("QUICK FOX", false);
        let second = processor.results("quick fox", false);

        check!(processor.queries(false).len() == 1);
        check!(first == second);
    }

    #[test]
    fn results_accessor_recanonicalizes_its_argument() {
        let processor = QueryProcessor::new(index_with_fixture());
        processor.process_line("fox quick", false);
        let results = processor.results("Quick Fox", false);
        check!(!results.is_empty());
    }

    #[test]
    fn process_file_reads_every_line() {
        let mut file = NamedTempFile::new().unwrap();
        writeln!(file, "quick fox").unwrap();
        writeln!(file, "brown").unwrap();

        let processor = QueryProcessor::new(index_with_fixture());
        processor.process_file(file.path(), false).unwrap();

        check!(processor.queries(false).len() == 2);
    }
}
