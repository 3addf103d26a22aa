#![warn(unreachable_pub)]
#![warn(dead_code)]

pub mod builder;
pub mod cli;
pub mod crawler;
pub mod error;
pub mod index;
pub mod json;
pub mod location;
pub mod lock;
pub mod logging;
pub mod query;
pub mod queue;
pub mod tokenize;

// Re-export common types
pub use crawler::{Crawler, Fetcher, HttpFetcher};
pub use error::{CrawlError, DriverError, IngestError, QueryError, Result};
pub use index::{InvertedIndex, QueryResult, SharedIndex};
pub use location::Location;
pub use lock::RwGate;
pub use query::QueryProcessor;
pub use queue::WorkQueue;
