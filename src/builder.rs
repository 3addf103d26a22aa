//! The Index Builder: walks the local filesystem, tokenizes and stems text
//! files, and merges the result into a shared Inverted Index.
//!
//! Directory traversal happens on the caller's thread; when a `WorkQueue` is
//! supplied, file I/O and tokenization run on worker threads as a
//! local-then-merge pattern — each file gets its own lock-free
//! `InvertedIndex`, built without contention, then merged into the shared
//! index under a single write lock per file. This eliminates contention on
//! the shared index during the CPU-bound tokenization phase; since each file
//! has a unique Location, merge never needs to union positions for
//! overlapping (token, location) pairs contributed by two different builder
//! tasks.

use crate::error::IngestError;
use crate::index::{InvertedIndex, SharedIndex};
use crate::location::Location;
use crate::queue::WorkQueue;
use crate::tokenize::{new_stemmer, parse, stem};
use std::fs::File;
use std::io::{BufRead, BufReader};
use std::path::{Path, PathBuf};
use std::sync::Arc;

/// Recursively discover indexable files under `path` and merge them into
/// `index` on the caller's thread. Non-text siblings are skipped silently;
/// I/O errors on individual files are logged and skipped rather than
/// propagated.
pub fn build_path(path: &Path, index: &mut InvertedIndex) -> Result<(), IngestError> {
    if !path.exists() {
        return Err(IngestError::InputMissing {
            path: path.to_path_buf(),
        });
    }

    for file in discover_text_files(path) {
        if let Err(e) = build_file(&file, index) {
            tracing::warn!(path = %file.display(), error = %e, "skipping unreadable file");
        }
    }

    Ok(())
}

/// Read `path` as UTF-8, line by line, tokenize and stem each line, and
/// record the tokens at consecutive positions starting from 1. The file's
/// textual path is used as its Location.
pub fn build_file(path: &Path, index: &mut InvertedIndex) -> Result<(), IngestError> {
    let file = File::open(path).map_err(|e| IngestError::Io {
        path: path.to_path_buf(),
        reason: e.to_string(),
    })?;

    let location = Location::new(path.display().to_string());
    let stemmer = new_stemmer();
    let mut position = 1u32;

    for line in BufReader::new(file).lines() {
        let line = line.map_err(|e| IngestError::Io {
            path: path.to_path_buf(),
            reason: e.to_string(),
        })?;

        for token in parse(&line) {
            let stemmed = stem(&token, &stemmer);
            index.add(&stemmed, &location, position);
            position += 1;
        }
    }

    Ok(())
}

/// Walk `root`, enqueuing one build-and-merge task per discovered text file
/// onto `queue`. Returns after `queue.finish()`, guaranteeing every
/// discovered file has been merged into `index` by the time this returns.
pub fn build(root: &Path, index: Arc<SharedIndex>, queue: &WorkQueue) -> Result<(), IngestError> {
    if !root.exists() {
        return Err(IngestError::InputMissing {
            path: root.to_path_buf(),
        });
    }

    for file in discover_text_files(root) {
        let index = Arc::clone(&index);
        queue.execute(move || {
            let mut local = InvertedIndex::new();
            if let Err(e) = build_file(&file, &mut local) {
                tracing::warn!(path = %file.display(), error = %e, "skipping unreadable file");
                return;
            }
            index.merge(&local);
        });
    }

    queue.finish();
    Ok(())
}

/// Whether `name` (already lower-cased) looks like a plaintext file per
/// spec.md's `.txt`/`.text` suffix rule.
fn is_text_file(name: &str) -> bool {
    name.ends_with(".txt") || name.ends_with(".text")
}

fn discover_text_files(root: &Path) -> Vec<PathBuf> {
    let mut files = Vec::new();
    let mut stack = vec![root.to_path_buf()];

    while let Some(path) = stack.pop() {
        if path.is_dir() {
            let entries = match std::fs::read_dir(&path) {
                Ok(entries) => entries,
                Err(e) => {
                    tracing::warn!(path = %path.display(), error = %e, "skipping unreadable directory");
                    continue;
                }
            };
            for entry in entries.flatten() {
                stack.push(entry.path());
            }
        } else if let Some(name) = path.file_name().and_then(|n| n.to_str()) {
            if is_text_file(&name.to_lowercase()) {
                files.push(path);
            }
        }
    }

    // Sorted for deterministic test fixtures; ingestion order has no effect
    // on the final merged index's contents.
    files.sort();
    files
}

#[cfg(test)]
mod tests {
    use super::*;
    use assert2::check;
    use std::io::Write;
    use tempfile::tempdir;

    fn write_file(dir: &Path, name: &str, contents: &str) -> PathBuf {
        let path = dir.join(name);
        let mut file = File::create(&path).unwrap();
        file.write_all(contents.as_bytes()).unwrap();
        path
    }

    #[test]
    fn build_file_assigns_consecutive_positions() {
        let dir = tempdir().unwrap();
        let path = write_file(dir.path(), "a.txt", "the quick brown fox\njumps over");

        let mut index = InvertedIndex::new();
        build_file(&path, &mut index).unwrap();

        let location = Location::new(path.display().to_string());
        check!(index.count(&location) == Some(6));
    }

    #[test]
    fn build_path_skips_non_text_siblings() {
        let dir = tempdir().unwrap();
        write_file(dir.path(), "a.txt", "hello world");
        write_file(dir.path(), "notes.md", "should be ignored");

        let mut index = InvertedIndex::new();
        build_path(dir.path(), &mut index).unwrap();

        check!(index.num_counts() == 1);
    }

    #[test]
    fn build_path_recurses_into_subdirectories() {
        let dir = tempdir().unwrap();
        let sub = dir.path().join("nested");
        std::fs::create_dir(&sub).unwrap();
        write_file(&sub, "b.text", "nested content here");

        let mut index = InvertedIndex::new();
        build_path(dir.path(), &mut index).unwrap();

        check!(index.num_counts() == 1);
    }

    #[test]
    fn build_path_missing_root_is_an_error() {
        let mut index = InvertedIndex::new();
        let err = build_path(Path::new("/does/not/exist"), &mut index).unwrap_err();
        check!(matches!(err, IngestError::InputMissing { .. }));
    }

    #[test]
    fn multithreaded_build_merges_every_file() {
        let dir = tempdir().unwrap();
        for i in 0..8 {
            write_file(dir.path(), &format!("f{i}.txt"), &format!("word{i} shared"));
        }

        let index = Arc::new(SharedIndex::new());
        let queue = WorkQueue::new(4);
        build(dir.path(), Arc::clone(&index), &queue).unwrap();

        let shared_stem = stem("shared", &new_stemmer());
        check!(index.num_counts() == 8);
        check!(index.num_locations(&shared_stem) == 8);
    }
}
