use clap::Parser;
use searchcore::cli::Cli;
use searchcore::error::DriverError;
use searchcore::query::QueryProcessor;
use searchcore::{builder, json, logging};
use searchcore::{Crawler, HttpFetcher, SharedIndex, WorkQueue};
use std::fs::File;
use std::sync::Arc;

fn run(cli: Cli) -> Result<(), DriverError> {
    let index = Arc::new(SharedIndex::new());
    let queue = cli.thread_count().map(|n| Arc::new(WorkQueue::new(n)));

    if let Some(port) = cli.server {
        tracing::info!(port, "HTTP servlet requested but not started by this binary");
    }

    if let Some(text_path) = &cli.text {
        if let Some(queue) = &queue {
            builder::build(text_path, Arc::clone(&index), queue)?;
        } else {
            let mut local = searchcore::InvertedIndex::new();
            builder::build_path(text_path, &mut local)?;
            index.merge(&local);
        }
    }

    if let Some(seed) = &cli.html {
        let total = cli.crawl.unwrap_or(1);
        let crawl_queue = queue.clone().unwrap_or_else(|| Arc::new(WorkQueue::new(5)));
        let crawler = Crawler::new(
            Arc::clone(&index),
            total,
            Arc::new(HttpFetcher::new()),
            Arc::clone(&crawl_queue),
        );
        crawler.crawl(seed);
        crawl_queue.finish();
    }

    let processor = Arc::new(QueryProcessor::new(Arc::clone(&index)));
    if let Some(query_path) = &cli.query {
        if let Some(queue) = &queue {
            processor.process_file_threaded(query_path, cli.partial, queue)?;
        } else {
            processor.process_file(query_path, cli.partial)?;
        }
    }

    if let Some(path) = &cli.counts {
        let file = File::create(path).map_err(|e| {
            searchcore::error::IngestError::Io {
                path: path.clone(),
                reason: e.to_string(),
            }
        })?;
        json::write_counts(&index.counts(), file).map_err(|e| {
            searchcore::error::IngestError::Io {
                path: path.clone(),
                reason: e.to_string(),
            }
        })?;
    }

    if let Some(path) = &cli.index {
        let file = File::create(path).map_err(|e| searchcore::error::IngestError::Io {
            path: path.clone(),
            reason: e.to_string(),
        })?;
        json::write_index(&index.snapshot(), file).map_err(|e| {
            searchcore::error::IngestError::Io {
                path: path.clone(),
                reason: e.to_string(),
            }
        })?;
    }

    if let Some(path) = &cli.results {
        let file = File::create(path).map_err(|e| searchcore::error::QueryError::Io {
            path: path.clone(),
            reason: e.to_string(),
        })?;
        let memo = processor.memo_snapshot(cli.partial);
        json::write_results(&memo, file).map_err(|e| searchcore::error::QueryError::Io {
            path: path.clone(),
            reason: e.to_string(),
        })?;
    }

    Ok(())
}

fn main() {
    logging::init();
    let cli = Cli::parse();

    if let Err(e) = run(cli) {
        eprintln!("Error: {e}");
        std::process::exit(0);
    }
}
