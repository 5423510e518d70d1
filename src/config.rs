//! Run configuration.
//!
//! Configuration is loaded once at startup and is immutable afterwards.
//! Sources, lowest precedence first:
//!
//! 1. Built-in defaults
//! 2. An optional YAML file (`--config`)
//! 3. Command-line flags and their environment variables (see [`Cli`])
//!
//! ```yaml
//! feeds:
//!   - https://www.rtvdrenthe.nl/rss/index.xml
//!   - url: https://example.com/atom.xml
//!     name: Example
//! window:
//!   start: 2024-01-01
//!   end: 2024-01-31
//! storage:
//!   root: storage
//!   write_raw: true
//! analysis:
//!   min_article_length: 100
//!   max_articles_per_feed: 50
//! fetch:
//!   timeout_secs: 30
//!   concurrency: 4
//! ```

use crate::cli::Cli;
use crate::error::ConfigError;
use crate::filter::DateWindow;
use crate::models::FeedSource;
use chrono::{DateTime, NaiveDate, TimeDelta, Utc};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use tracing::{debug, info, instrument};

pub const DEFAULT_FEED: &str = "https://www.rtvdrenthe.nl/rss/index.xml";
pub const RAW_ARTICLES_DIR: &str = "raw_articles";
pub const PROCESSED_ARTICLES_DIR: &str = "processed_articles";

/// Fully resolved, immutable configuration for one run.
#[derive(Debug, Clone)]
pub struct Config {
    pub feeds: Vec<FeedSource>,
    pub window: DateWindow,
    pub storage: StorageConfig,
    pub analysis: AnalysisConfig,
    pub fetch: FetchConfig,
}

/// Configuration as written in YAML, before CLI overrides and window resolution.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct Settings {
    pub feeds: Vec<FeedSource>,
    pub window: WindowSettings,
    pub storage: StorageConfig,
    pub analysis: AnalysisConfig,
    pub fetch: FetchConfig,
}

impl Default for Settings {
    fn default() -> Self {
        Settings {
            feeds: vec![FeedSource::new(DEFAULT_FEED)],
            window: WindowSettings::default(),
            storage: StorageConfig::default(),
            analysis: AnalysisConfig::default(),
            fetch: FetchConfig::default(),
        }
    }
}

/// Window bounds as configured. `start` wins over `lookback_days`.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct WindowSettings {
    pub start: Option<String>,
    pub end: Option<String>,
    pub lookback_days: Option<u32>,
}

impl Default for WindowSettings {
    fn default() -> Self {
        WindowSettings {
            start: None,
            end: None,
            lookback_days: Some(7),
        }
    }
}

#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct StorageConfig {
    pub root: PathBuf,
    pub write_raw: bool,
}

impl Default for StorageConfig {
    fn default() -> Self {
        StorageConfig {
            root: PathBuf::from("storage"),
            write_raw: true,
        }
    }
}

impl StorageConfig {
    pub fn raw_dir(&self) -> PathBuf {
        self.root.join(RAW_ARTICLES_DIR)
    }

    pub fn processed_dir(&self) -> PathBuf {
        self.root.join(PROCESSED_ARTICLES_DIR)
    }
}

#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct AnalysisConfig {
    /// Below this many words only basic stats are computed.
    pub min_article_length: usize,
    pub max_articles_per_feed: usize,
    pub extract_keywords: bool,
    pub max_keywords: usize,
    pub summarize_content: bool,
    pub summary_sentences: usize,
    pub extract_entities: bool,
    pub max_entities: usize,
    pub sentiment_analysis: bool,
}

impl Default for AnalysisConfig {
    fn default() -> Self {
        AnalysisConfig {
            min_article_length: 100,
            max_articles_per_feed: 50,
            extract_keywords: true,
            max_keywords: 10,
            summarize_content: true,
            summary_sentences: 3,
            extract_entities: true,
            max_entities: 10,
            sentiment_analysis: true,
        }
    }
}

#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct FetchConfig {
    pub timeout_secs: u64,
    pub concurrency: usize,
    /// Feed documents larger than this are rejected unread.
    pub max_body_bytes: usize,
    pub user_agent: String,
}

impl Default for FetchConfig {
    fn default() -> Self {
        FetchConfig {
            timeout_secs: 30,
            concurrency: 4,
            max_body_bytes: 10 * 1024 * 1024,
            user_agent: concat!(env!("CARGO_PKG_NAME"), "/", env!("CARGO_PKG_VERSION")).to_string(),
        }
    }
}

impl Config {
    /// Load the config file named by `cli` (if any), apply CLI overrides and
    /// resolve the date window against `now`.
    #[instrument(level = "info", skip_all)]
    pub fn load(cli: &Cli, now: DateTime<Utc>) -> Result<Config, ConfigError> {
        let mut settings = match &cli.config {
            Some(path) => Settings::from_file(path)?,
            None => Settings::default(),
        };
        settings.apply_cli(cli);
        let config = settings.resolve(now)?;
        info!(
            feeds = config.feeds.len(),
            start = ?config.window.start,
            end = ?config.window.end,
            storage = %config.storage.root.display(),
            "Loaded configuration"
        );
        Ok(config)
    }
}

impl Settings {
    pub fn from_file(path: &Path) -> Result<Settings, ConfigError> {
        let text = std::fs::read_to_string(path).map_err(|source| ConfigError::Read {
            path: path.to_path_buf(),
            source,
        })?;
        let settings = Settings::from_yaml(&text).map_err(|source| ConfigError::Yaml {
            path: path.to_path_buf(),
            source,
        })?;
        debug!(path = %path.display(), "Read config file");
        Ok(settings)
    }

    pub fn from_yaml(text: &str) -> Result<Settings, serde_yaml::Error> {
        // An empty document deserializes to unit, not to an empty map.
        if text.trim().is_empty() {
            return Ok(Settings::default());
        }
        serde_yaml::from_str(text)
    }

    pub fn apply_cli(&mut self, cli: &Cli) {
        if !cli.feeds.is_empty() {
            self.feeds = cli
                .feeds
                .iter()
                .map(|url| url.trim())
                .filter(|url| !url.is_empty())
                .map(FeedSource::new)
                .collect();
        }
        if let Some(root) = &cli.storage_dir {
            self.storage.root = root.clone();
        }
        if cli.no_raw {
            self.storage.write_raw = false;
        }
        if let Some(start) = &cli.start_date {
            self.window.start = Some(start.clone());
        }
        if let Some(end) = &cli.end_date {
            self.window.end = Some(end.clone());
        }
        if let Some(days) = cli.lookback_days {
            self.window.lookback_days = Some(days);
        }

        let analysis = &mut self.analysis;
        if let Some(n) = cli.min_article_length {
            analysis.min_article_length = n;
        }
        if let Some(n) = cli.max_articles_per_feed {
            analysis.max_articles_per_feed = n;
        }
        if let Some(on) = cli.extract_keywords {
            analysis.extract_keywords = on;
        }
        if let Some(on) = cli.summarize_content {
            analysis.summarize_content = on;
        }
        if let Some(on) = cli.extract_entities {
            analysis.extract_entities = on;
        }
        if let Some(on) = cli.sentiment_analysis {
            analysis.sentiment_analysis = on;
        }

        if let Some(n) = cli.concurrency {
            self.fetch.concurrency = n;
        }
        if let Some(secs) = cli.timeout_secs {
            self.fetch.timeout_secs = secs;
        }
    }

    /// Validate feed URLs and turn the window settings into a [`DateWindow`].
    pub fn resolve(self, now: DateTime<Utc>) -> Result<Config, ConfigError> {
        for feed in &self.feeds {
            url::Url::parse(&feed.url).map_err(|source| ConfigError::FeedUrl {
                url: feed.url.clone(),
                source,
            })?;
        }
        if self.fetch.concurrency == 0 {
            return Err(ConfigError::Concurrency);
        }

        let window = self.window.resolve(now)?;
        Ok(Config {
            feeds: self.feeds,
            window,
            storage: self.storage,
            analysis: self.analysis,
            fetch: self.fetch,
        })
    }
}

#[derive(Debug, Clone, Copy)]
enum Bound {
    Start,
    End,
}

impl WindowSettings {
    /// An explicit start wins. Otherwise `lookback_days` counts back from the
    /// explicit end, or from `now` (which then becomes the end). Everything
    /// else left out is unbounded.
    pub fn resolve(&self, now: DateTime<Utc>) -> Result<DateWindow, ConfigError> {
        let end = match &self.end {
            Some(end) => Some(parse_bound(end, Bound::End)?),
            None if self.start.is_none() && self.lookback_days.is_some() => Some(now),
            None => None,
        };
        let start = match (&self.start, self.lookback_days) {
            (Some(start), _) => Some(parse_bound(start, Bound::Start)?),
            (None, Some(days)) => Some(lookback(end.unwrap_or(now), days)?),
            (None, None) => None,
        };

        if let (Some(s), Some(e)) = (start, end) {
            if s > e {
                return Err(ConfigError::EmptyWindow {
                    start: s.to_rfc3339(),
                    end: e.to_rfc3339(),
                });
            }
        }
        Ok(DateWindow::new(start, end))
    }
}

fn lookback(anchor: DateTime<Utc>, days: u32) -> Result<DateTime<Utc>, ConfigError> {
    TimeDelta::try_days(i64::from(days))
        .and_then(|span| anchor.checked_sub_signed(span))
        .ok_or(ConfigError::Lookback { days })
}

/// Parse an RFC 3339 timestamp, or a bare date that expands to the first
/// (start bound) or last (end bound) instant of that UTC day.
fn parse_bound(value: &str, bound: Bound) -> Result<DateTime<Utc>, ConfigError> {
    let value = value.trim();
    if let Ok(ts) = DateTime::parse_from_rfc3339(value) {
        return Ok(ts.with_timezone(&Utc));
    }
    let invalid = || ConfigError::Date {
        value: value.to_string(),
    };
    let date = NaiveDate::parse_from_str(value, "%Y-%m-%d").map_err(|_| invalid())?;
    let naive = match bound {
        Bound::Start => date.and_hms_opt(0, 0, 0),
        Bound::End => date.and_hms_nano_opt(23, 59, 59, 999_999_999),
    }
    .ok_or_else(invalid)?;
    Ok(naive.and_utc())
}
