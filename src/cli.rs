//! Command-line surface: flag parsing for the driver in `main.rs`.
//!
//! Flags mirror the project description's external interface exactly. The
//! HTTP servlet behind `-server` is out of scope for this crate's core; the
//! flag is still accepted and logged so the CLI surface matches what callers
//! expect, without pretending to implement the servlet itself.

use clap::Parser;
use std::path::PathBuf;

#[derive(Parser, Debug)]
#[command(name = "searchcore")]
#[command(about = "Single-node inverted-index search engine", long_about = None)]
pub struct Cli {
    /// Ingest every `.txt`/`.text` file found under this path (recursively).
    #[arg(long = "text")]
    pub text: Option<PathBuf>,

    /// Crawl starting from this seed URI.
    #[arg(long = "html")]
    pub html: Option<String>,

    /// Page budget for `-html`. Required when `-html` is given.
    #[arg(long = "crawl")]
    pub crawl: Option<usize>,

    /// Read one query per line from this file.
    #[arg(long = "query")]
    pub query: Option<PathBuf>,

    /// Use prefix matching instead of exact matching for `-query`.
    #[arg(long = "partial", default_value_t = false)]
    pub partial: bool,

    /// Enable multithreaded ingestion/query processing with this many
    /// worker threads (clamped to a minimum of 1). `--threads` with no value
    /// enables multithreading at the spec's default pool size of 5.
    #[arg(long = "threads", num_args = 0..=1, default_missing_value = "5")]
    pub threads: Option<usize>,

    /// Port for the HTTP servlet. Accepted and logged only; the servlet
    /// itself is not part of this crate.
    #[arg(long = "server")]
    pub server: Option<u16>,

    /// Write the per-location word counts to this path.
    #[arg(long = "counts", num_args = 0..=1, default_missing_value = "counts.json")]
    pub counts: Option<PathBuf>,

    /// Write the full inverted index to this path.
    #[arg(long = "index", num_args = 0..=1, default_missing_value = "index.json")]
    pub index: Option<PathBuf>,

    /// Write per-query results to this path.
    #[arg(long = "results", num_args = 0..=1, default_missing_value = "results.json")]
    pub results: Option<PathBuf>,
}

impl Cli {
    /// Worker thread count: `None` means single-threaded; `Some(n)` is
    /// clamped to at least 1.
    pub fn thread_count(&self) -> Option<usize> {
        self.threads.map(|n| n.max(1))
    }
}
