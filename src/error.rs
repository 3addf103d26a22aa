//! Centralized error handling with typed error enums.
//!
//! This module provides structured error types for the ingestion, query, and
//! crawl paths. Errors are designed to:
//! - Provide detailed context via Debug for logging (`{:?}`)
//! - Provide user-friendly messages via Display for CLI output (`{}`)
//! - Enable pattern matching for programmatic error handling
//!
//! # Error Hierarchy
//!
//! ```text
//! DriverError (top-level)
//! ├── Ingest(IngestError)   - file/directory ingestion
//! ├── Crawl(CrawlError)     - web crawling
//! └── Query(QueryError)     - query processing
//! ```

use std::path::PathBuf;
use thiserror::Error;

/// A specialized Result type for searchcore operations.
///
/// This is an alias for `anyhow::Result` with context added via `.context()` and
/// `.with_context()` methods throughout the codebase.
pub type Result<T> = anyhow::Result<T>;

/// Top-level error type for the CLI driver.
#[derive(Debug, Error)]
pub enum DriverError {
    /// File/directory ingestion errors.
    #[error("{0}")]
    Ingest(#[from] IngestError),

    /// Web crawl errors.
    #[error("{0}")]
    Crawl(#[from] CrawlError),

    /// Query processing errors.
    #[error("{0}")]
    Query(#[from] QueryError),
}

/// Errors encountered while ingesting local files into the index.
///
/// Per the error handling design, `Io` failures are non-fatal at the
/// per-file level: `build_path`/`build_file` log and skip rather than
/// propagate. This enum exists for the cases that *do* abort the overall
/// ingestion (a missing root path), and for tests that want to assert on
/// the per-file failure path explicitly.
#[derive(Debug, Error)]
pub enum IngestError {
    /// The path passed to `-text` does not exist.
    #[error("input path does not exist: {path}")]
    InputMissing { path: PathBuf },

    /// A file could not be read as UTF-8 text.
    #[error("failed to read {path}: {reason}")]
    Io { path: PathBuf, reason: String },
}

/// Errors encountered while crawling web pages.
#[derive(Debug, Error)]
pub enum CrawlError {
    /// The seed URI (or a discovered link) could not be parsed.
    #[error("malformed URI: {uri}")]
    MalformedUri { uri: String },

    /// A fetch failed at the socket/HTTP layer. Per spec this is silently
    /// discarded by the crawl task; this variant exists for fetcher unit
    /// tests and for `-html` seed validation.
    #[error("failed to fetch {uri}: {reason}")]
    Io { uri: String, reason: String },
}

/// Errors encountered while reading or resolving a query file.
#[derive(Debug, Error)]
pub enum QueryError {
    /// The path passed to `-query` does not exist.
    #[error("query file does not exist: {path}")]
    InputMissing { path: PathBuf },

    /// The query file could not be read as UTF-8 text.
    #[error("failed to read {path}: {reason}")]
    Io { path: PathBuf, reason: String },
}
