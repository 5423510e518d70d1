//! # Feed Digest
//!
//! A scheduled batch job that fetches RSS/Atom feeds, keeps the articles
//! published inside a date window, runs lightweight text analysis on them and
//! stores one JSON file per article.
//!
//! ## Usage
//!
//! ```sh
//! feed_digest --feed https://example.com/rss.xml --storage-dir ./storage
//! ```
//!
//! ## Architecture
//!
//! Each invocation is one run of a linear pipeline:
//! 1. **Fetching**: download every configured feed (bounded concurrency)
//! 2. **Extracting**: parse feed documents into articles
//! 3. **Filtering**: keep dated articles inside the configured window
//! 4. **Analyzing**: word stats, keywords, summary, entities, sentiment
//! 5. **Storing**: `storage/raw_articles/` and `storage/processed_articles/`
//! 6. **Reporting**: per-feed counts and failures
//!
//! Per-feed and per-article failures never fail the run. The process exits
//! non-zero only when configuration is invalid or storage cannot be written;
//! whether a run produced anything is read from `processed_articles/`.

use chrono::Utc;
use clap::Parser;
use std::error::Error;
use tracing::{debug, error, info, instrument};
use tracing_subscriber::{EnvFilter, fmt as tfmt};

mod analyzer;
mod cli;
mod config;
mod error;
mod extractor;
mod fetcher;
mod filter;
mod models;
mod outputs;
mod pipeline;
mod report;
mod storage;
mod utils;

use cli::Cli;
use config::Config;
use fetcher::HttpFetcher;
use outputs::{json, markdown};
use pipeline::Pipeline;

#[tokio::main]
#[instrument]
async fn main() -> Result<(), Box<dyn Error>> {
    // --- Tracing init ---
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    tfmt()
        .with_env_filter(filter)
        .with_target(true)
        .with_file(false)
        .with_line_number(false)
        .with_timer(tracing_subscriber::fmt::time::UtcTime::rfc_3339())
        .init();

    let start_time = std::time::Instant::now();
    info!(version = env!("CARGO_PKG_VERSION"), "feed_digest starting up");

    let args = Cli::parse();
    debug!(?args, "Parsed CLI arguments");

    let config = match Config::load(&args, Utc::now()) {
        Ok(config) => config,
        Err(e) => {
            error!(error = %e, "Invalid configuration");
            return Err(e.into());
        }
    };

    let fetcher = HttpFetcher::new(&config.fetch)?;
    let pipeline = Pipeline::new(&config, fetcher);

    let report = match pipeline.run().await {
        Ok(report) => report,
        Err(e) => {
            error!(
                storage = %config.storage.root.display(),
                error = %e,
                "Storage is not writable; aborting run"
            );
            return Err(e.into());
        }
    };
    report.log();

    // Report files are informational; failing to write them does not fail the run.
    if let Some(path) = &args.report_json {
        if let Err(e) = json::write_report(&report, path).await {
            error!(path = %path.display(), error = %e, "Failed to write JSON run report");
        }
    }
    if let Some(path) = &args.summary_markdown {
        if let Err(e) = markdown::append_summary(&report, path).await {
            error!(path = %path.display(), error = %e, "Failed to append Markdown summary");
        }
    }

    let elapsed = start_time.elapsed();
    info!(
        ?elapsed,
        secs = elapsed.as_secs(),
        millis = elapsed.subsec_millis(),
        processed = report.processed(),
        had_output = report.had_output,
        "Execution complete"
    );

    Ok(())
}
