//! Run reporting.
//!
//! A [`RunReport`] is what the scheduler looks at after a run: how many
//! articles were stored, whether the processed directory has output, and
//! which feeds failed or degraded and why.

use crate::filter::DateWindow;
use chrono::{DateTime, Utc};
use serde::Serialize;
use tracing::{info, warn};

/// Feed-level outcome. Per-article failures are counted, not reported here.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "state", content = "reason", rename_all = "snake_case")]
pub enum FeedStatus {
    Ok,
    FetchFailed(String),
    ParseFailed(String),
}

/// Counters for one feed, filled in as its articles move through the pipeline.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct FeedReport {
    pub url: String,
    pub name: String,
    pub status: FeedStatus,
    /// Entries found in the document, malformed ones included.
    pub fetched: usize,
    pub malformed: usize,
    pub undated: usize,
    pub out_of_window: usize,
    pub in_window: usize,
    pub duplicates: usize,
    /// In-window articles dropped by `max_articles_per_feed`.
    pub capped: usize,
    pub analysis_failed: usize,
    pub stored: usize,
}

impl FeedReport {
    pub fn new(url: impl Into<String>, name: impl Into<String>) -> Self {
        FeedReport {
            url: url.into(),
            name: name.into(),
            status: FeedStatus::Ok,
            fetched: 0,
            malformed: 0,
            undated: 0,
            out_of_window: 0,
            in_window: 0,
            duplicates: 0,
            capped: 0,
            analysis_failed: 0,
            stored: 0,
        }
    }

    /// Per-article failures: malformed entries plus failed analyses.
    pub fn failed(&self) -> usize {
        self.malformed + self.analysis_failed
    }

    pub fn is_degraded(&self) -> bool {
        self.status != FeedStatus::Ok || self.failed() > 0
    }
}

/// Sums over all feeds.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct Totals {
    pub feeds: usize,
    pub feeds_failed: usize,
    pub fetched: usize,
    pub in_window: usize,
    pub stored: usize,
    pub failed: usize,
}

#[derive(Debug, Clone, Serialize)]
pub struct RunReport {
    pub started_at: DateTime<Utc>,
    pub finished_at: DateTime<Utc>,
    pub window: DateWindow,
    pub feeds: Vec<FeedReport>,
    /// Whether `processed_articles/` holds any file after the run.
    pub had_output: bool,
}

impl RunReport {
    /// Articles stored by this run.
    pub fn processed(&self) -> usize {
        self.feeds.iter().map(|f| f.stored).sum()
    }

    pub fn degraded(&self) -> bool {
        self.feeds.iter().any(FeedReport::is_degraded)
    }

    pub fn totals(&self) -> Totals {
        self.feeds.iter().fold(Totals::default(), |mut t, f| {
            t.feeds += 1;
            t.feeds_failed += usize::from(f.status != FeedStatus::Ok);
            t.fetched += f.fetched;
            t.in_window += f.in_window;
            t.stored += f.stored;
            t.failed += f.failed();
            t
        })
    }

    /// Emit one line per feed plus a run summary.
    pub fn log(&self) {
        for feed in &self.feeds {
            match &feed.status {
                FeedStatus::Ok if feed.failed() == 0 => info!(
                    feed = %feed.name,
                    fetched = feed.fetched,
                    in_window = feed.in_window,
                    stored = feed.stored,
                    "Feed processed"
                ),
                FeedStatus::Ok => warn!(
                    feed = %feed.name,
                    fetched = feed.fetched,
                    in_window = feed.in_window,
                    stored = feed.stored,
                    malformed = feed.malformed,
                    analysis_failed = feed.analysis_failed,
                    "Feed processed with failures"
                ),
                FeedStatus::FetchFailed(reason) | FeedStatus::ParseFailed(reason) => warn!(
                    feed = %feed.name,
                    url = %feed.url,
                    status = ?feed.status,
                    reason = %reason,
                    "Feed failed"
                ),
            }
        }

        let totals = self.totals();
        info!(
            feeds = totals.feeds,
            feeds_failed = totals.feeds_failed,
            fetched = totals.fetched,
            filtered = totals.in_window,
            stored = totals.stored,
            failed = totals.failed,
            had_output = self.had_output,
            degraded = self.degraded(),
            "Run summary"
        );
    }
}
