//! Command-line interface definitions for Feed Digest.
//!
//! Every option can also be provided through an environment variable, which
//! is how the scheduled CI job configures a run. Values given here override
//! the YAML config file; see [`crate::config`].

use clap::Parser;
use clap::builder::BoolishValueParser;
use std::path::PathBuf;

/// Command-line arguments for a single feed digest run.
///
/// # Examples
///
/// ```sh
/// # Defaults: built-in feed list, last 7 days, ./storage
/// feed_digest
///
/// # Explicit feeds and window
/// feed_digest --feed https://example.com/rss.xml --start-date 2024-01-01 --end-date 2024-01-31
///
/// # From a config file, appending a summary for the CI job page
/// feed_digest -c feeds.yaml --summary-markdown "$GITHUB_STEP_SUMMARY"
/// ```
#[derive(Parser, Debug, Default)]
#[command(author, version, about)]
pub struct Cli {
    /// Path to a YAML config file
    #[arg(short, long, env = "FEED_DIGEST_CONFIG")]
    pub config: Option<PathBuf>,

    /// Feed URL to fetch (repeatable or comma-separated); replaces the configured list
    #[arg(long = "feed", env = "RSS_FEEDS", value_delimiter = ',')]
    pub feeds: Vec<String>,

    /// Root directory for raw_articles/ and processed_articles/
    #[arg(long, env = "STORAGE_DIR")]
    pub storage_dir: Option<PathBuf>,

    /// Window start (RFC 3339 or YYYY-MM-DD, inclusive)
    #[arg(long)]
    pub start_date: Option<String>,

    /// Window end (RFC 3339 or YYYY-MM-DD, inclusive)
    #[arg(long)]
    pub end_date: Option<String>,

    /// Window length in days back from the end date (or now), used when no start date is given
    #[arg(long)]
    pub lookback_days: Option<u32>,

    /// Minimum number of words before keywords, summary, entities and sentiment are computed
    #[arg(long, env = "MIN_ARTICLE_LENGTH")]
    pub min_article_length: Option<usize>,

    /// Maximum number of articles stored per feed
    #[arg(long, env = "MAX_ARTICLES_PER_FEED")]
    pub max_articles_per_feed: Option<usize>,

    #[arg(long, env = "EXTRACT_KEYWORDS", value_parser = BoolishValueParser::new())]
    pub extract_keywords: Option<bool>,

    #[arg(long, env = "SUMMARIZE_CONTENT", value_parser = BoolishValueParser::new())]
    pub summarize_content: Option<bool>,

    #[arg(long, env = "EXTRACT_ENTITIES", value_parser = BoolishValueParser::new())]
    pub extract_entities: Option<bool>,

    #[arg(long, env = "SENTIMENT_ANALYSIS", value_parser = BoolishValueParser::new())]
    pub sentiment_analysis: Option<bool>,

    /// Do not write raw_articles/
    #[arg(long)]
    pub no_raw: bool,

    /// Maximum number of feeds fetched at once
    #[arg(long)]
    pub concurrency: Option<usize>,

    /// Per-request timeout in seconds
    #[arg(long)]
    pub timeout_secs: Option<u64>,

    /// Write the run report as JSON to this path
    #[arg(long)]
    pub report_json: Option<PathBuf>,

    /// Append a Markdown run summary to this path
    #[arg(long)]
    pub summary_markdown: Option<PathBuf>,
}
