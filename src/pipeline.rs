//! The fetch → extract → filter → analyze → store pipeline.
//!
//! One [`Pipeline::run`] is one scheduled run. Feeds are fetched
//! concurrently, then processed one after another in configuration order:
//!
//! 1. **Extract** entries from the feed document
//! 2. **Filter** by the published-date window (undated entries are dropped)
//! 3. **Dedup** on `(feed URL, link)` across the whole run
//! 4. **Cap** at `max_articles_per_feed` stored articles per feed
//! 5. **Analyze** and **store** raw and processed records
//!
//! Fetch, parse and analysis failures are counted in the [`RunReport`] and
//! the run carries on. Only a [`StorageError`] ends the run early.

use crate::analyzer::Analyzer;
use crate::config::Config;
use crate::error::{FetchError, StorageError};
use crate::extractor::extract;
use crate::fetcher::{FetchFeed, fetch_all};
use crate::filter::{DateWindow, Verdict};
use crate::models::{ArticleId, FeedSource};
use crate::report::{FeedReport, FeedStatus, RunReport};
use crate::storage::Storage;
use chrono::Utc;
use std::collections::HashSet;
use tracing::{debug, info, instrument, warn};

pub struct Pipeline<F> {
    fetcher: F,
    feeds: Vec<FeedSource>,
    window: DateWindow,
    concurrency: usize,
    max_articles_per_feed: usize,
    analyzer: Analyzer,
    storage: Storage,
}

impl<F: FetchFeed> Pipeline<F> {
    pub fn new(config: &Config, fetcher: F) -> Self {
        Pipeline {
            fetcher,
            feeds: config.feeds.clone(),
            window: config.window,
            concurrency: config.fetch.concurrency,
            max_articles_per_feed: config.analysis.max_articles_per_feed,
            analyzer: Analyzer::new(config.analysis.clone()),
            storage: Storage::new(config.storage.clone()),
        }
    }

    pub fn storage(&self) -> &Storage {
        &self.storage
    }

    /// Execute one complete run.
    #[instrument(level = "info", skip_all, fields(feeds = self.feeds.len()))]
    pub async fn run(&self) -> Result<RunReport, StorageError> {
        let started_at = Utc::now();
        self.storage.prepare().await?;

        let documents = fetch_all(&self.fetcher, &self.feeds, self.concurrency).await;

        let mut seen = HashSet::new();
        let mut feeds = Vec::with_capacity(documents.len());
        for (source, document) in documents {
            let report = self.process_feed(&source, document, &mut seen).await?;
            feeds.push(report);
        }

        let had_output = self.storage.has_output().await?;
        let report = RunReport {
            started_at,
            finished_at: Utc::now(),
            window: self.window,
            feeds,
            had_output,
        };
        info!(
            processed = report.processed(),
            had_output,
            degraded = report.degraded(),
            "Run complete"
        );
        Ok(report)
    }

    #[instrument(level = "info", skip_all, fields(feed = %source.display_name()))]
    async fn process_feed(
        &self,
        source: &FeedSource,
        document: Result<Vec<u8>, FetchError>,
        seen: &mut HashSet<ArticleId>,
    ) -> Result<FeedReport, StorageError> {
        let mut report = FeedReport::new(&source.url, source.display_name());

        let body = match document {
            Ok(body) => body,
            Err(e) => {
                report.status = FeedStatus::FetchFailed(e.to_string());
                return Ok(report);
            }
        };

        let entries = match extract(source, &body) {
            Ok(entries) => entries,
            Err(e) => {
                warn!(url = %source.url, error = %e, "Feed document could not be parsed");
                report.status = FeedStatus::ParseFailed(e.to_string());
                return Ok(report);
            }
        };

        for entry in entries {
            report.fetched += 1;

            let raw = match entry {
                Ok(raw) => raw,
                Err(e) => {
                    warn!(error = %e, "Skipping malformed entry");
                    report.malformed += 1;
                    continue;
                }
            };

            let published = match self.window.verdict(&raw) {
                Verdict::InWindow(at) => at,
                Verdict::OutOfWindow => {
                    report.out_of_window += 1;
                    continue;
                }
                Verdict::Undated => {
                    debug!(link = %raw.link, "Skipping entry without a published date");
                    report.undated += 1;
                    continue;
                }
            };
            report.in_window += 1;

            if !seen.insert(raw.id()) {
                debug!(link = %raw.link, "Skipping duplicate entry");
                report.duplicates += 1;
                continue;
            }
            if report.stored >= self.max_articles_per_feed {
                report.capped += 1;
                continue;
            }

            let article = self.analyzer.analyze(&raw, published);
            if article.analysis.error.is_some() {
                report.analysis_failed += 1;
            }

            self.storage.write_raw(&raw).await?;
            self.storage.write_processed(&article).await?;
            report.stored += 1;
        }

        info!(
            fetched = report.fetched,
            in_window = report.in_window,
            stored = report.stored,
            failed = report.failed(),
            "Processed feed"
        );
        Ok(report)
    }
}
