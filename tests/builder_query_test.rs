//! End-to-end: ingest a small tree of text files, then run exact and prefix
//! queries against the resulting index, using only the crate's public API.

use searchcore::query::QueryProcessor;
use searchcore::{builder, SharedIndex, WorkQueue};
use std::fs::{self, File};
use std::io::Write;
use std::sync::Arc;
use tempfile::tempdir;

fn write(dir: &std::path::Path, name: &str, contents: &str) {
    let path = dir.join(name);
    if let Some(parent) = path.parent() {
        fs::create_dir_all(parent).unwrap();
    }
    let mut file = File::create(path).unwrap();
    file.write_all(contents.as_bytes()).unwrap();
}

#[test]
fn multithreaded_ingest_then_exact_and_prefix_query() {
    let dir = tempdir().unwrap();
    write(dir.path(), "fox.txt", "the quick brown fox jumps");
    write(dir.path(), "dog.txt", "the lazy dog sleeps");
    write(dir.path(), "nested/extra.text", "foxes and foxholes everywhere");
    write(dir.path(), "ignored.md", "this file should never be indexed");

    let index = Arc::new(SharedIndex::new());
    let queue = WorkQueue::new(3);
    builder::build(dir.path(), Arc::clone(&index), &queue).unwrap();

    assert_eq!(index.num_counts(), 3);

    let processor = Arc::new(QueryProcessor::new(Arc::clone(&index)));
    processor.process_line("fox", false);
    let exact = processor.results("fox", false);
    assert_eq!(exact.len(), 1);

    processor.process_line("fox", true);
    let prefix = processor.results("fox", true);
    assert_eq!(prefix.len(), 2);

    let locations: Vec<_> = prefix.iter().map(|r| r.location.as_str().to_string()).collect();
    assert!(locations.iter().any(|l| l.ends_with("fox.txt")));
    assert!(locations.iter().any(|l| l.ends_with("extra.text")));
}

#[test]
fn single_threaded_ingest_matches_multithreaded_word_count() {
    let dir = tempdir().unwrap();
    write(dir.path(), "a.txt", "alpha beta gamma");
    write(dir.path(), "b.txt", "beta gamma delta");

    let mut plain = searchcore::InvertedIndex::new();
    builder::build_path(dir.path(), &mut plain).unwrap();
    assert_eq!(plain.num_counts(), 2);

    let shared = Arc::new(SharedIndex::new());
    let queue = WorkQueue::new(2);
    builder::build(dir.path(), Arc::clone(&shared), &queue).unwrap();
    assert_eq!(shared.num_counts(), 2);
}
