//! Data models for feeds, articles and their processed representations.
//!
//! - [`FeedSource`]: a configured feed URL with an optional display name
//! - [`ArticleId`]: the `(feed URL, link)` identity used for dedup and storage
//! - [`RawArticle`]: an article as extracted from a feed document
//! - [`ProcessedArticle`]: a raw article plus derived [`Analysis`] fields
//!
//! None of these carry run-time timestamps, so serializing the same article
//! twice yields identical bytes.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};

/// A feed to fetch, as configured.
///
/// In YAML a source is either a bare URL string or a map with `url` and an
/// optional `name`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(from = "FeedSourceRepr")]
pub struct FeedSource {
    pub url: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
}

#[derive(Deserialize)]
#[serde(untagged)]
enum FeedSourceRepr {
    Url(String),
    Full { url: String, name: Option<String> },
}

impl From<FeedSourceRepr> for FeedSource {
    fn from(repr: FeedSourceRepr) -> Self {
        match repr {
            FeedSourceRepr::Url(url) => FeedSource { url, name: None },
            FeedSourceRepr::Full { url, name } => FeedSource { url, name },
        }
    }
}

impl FeedSource {
    pub fn new(url: impl Into<String>) -> Self {
        FeedSource {
            url: url.into(),
            name: None,
        }
    }

    pub fn named(url: impl Into<String>, name: impl Into<String>) -> Self {
        FeedSource {
            url: url.into(),
            name: Some(name.into()),
        }
    }

    /// Name used in logs and reports: the configured name, else the URL host,
    /// else the URL itself.
    ///
    /// `"https://www.rtvdrenthe.nl/rss/index.xml"` -> `"www.rtvdrenthe.nl"`
    pub fn display_name(&self) -> String {
        if let Some(name) = &self.name {
            return name.clone();
        }
        url::Url::parse(&self.url)
            .ok()
            .and_then(|u| u.host_str().map(str::to_string))
            .unwrap_or_else(|| self.url.clone())
    }
}

/// Identity of an article within a run: the feed it came from plus its link.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct ArticleId {
    pub feed_url: String,
    pub link: String,
}

impl ArticleId {
    pub fn new(feed_url: impl Into<String>, link: impl Into<String>) -> Self {
        ArticleId {
            feed_url: feed_url.into(),
            link: link.into(),
        }
    }

    /// Stable storage key: lowercase hex SHA-256 of `feed_url + "\n" + link`.
    pub fn key(&self) -> String {
        let mut hasher = Sha256::new();
        hasher.update(self.feed_url.as_bytes());
        hasher.update(b"\n");
        hasher.update(self.link.as_bytes());
        hex::encode(hasher.finalize())
    }
}

/// An article as found in a feed, before any filtering or analysis.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RawArticle {
    pub feed_url: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub feed_name: Option<String>,
    pub title: String,
    pub link: String,
    pub published: Option<DateTime<Utc>>,
    /// Content exactly as the feed carried it, usually HTML.
    pub body: String,
}

impl RawArticle {
    pub fn id(&self) -> ArticleId {
        ArticleId::new(&self.feed_url, &self.link)
    }
}

/// A dated article with its cleaned text and derived analysis fields.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ProcessedArticle {
    /// Storage key, see [`ArticleId::key`].
    pub id: String,
    pub feed_url: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub feed_name: Option<String>,
    pub title: String,
    pub link: String,
    pub published: DateTime<Utc>,
    /// Plain text with markup stripped and whitespace collapsed.
    pub content: String,
    pub analysis: Analysis,
}

/// Fields derived from an article's text.
///
/// Optional fields are absent when the feature is disabled, when the text is
/// below the configured minimum length (`skipped` says so), or when analysis
/// failed (`error` says why).
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Analysis {
    pub basic_stats: BasicStats,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub keywords: Option<Vec<Keyword>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub summary: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub entities: Option<Vec<Entity>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub sentiment: Option<Sentiment>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub skipped: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct BasicStats {
    pub word_count: usize,
    pub sentence_count: usize,
    pub avg_words_per_sentence: f64,
    pub reading_time_minutes: usize,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Keyword {
    pub term: String,
    pub count: usize,
}

/// A capitalised name (person, place, organisation) seen in the text.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Entity {
    pub name: String,
    pub mentions: usize,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SentimentLabel {
    Positive,
    Negative,
    Neutral,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Sentiment {
    /// `(positive - negative) / (positive + negative)`, 0 when neither occurs.
    pub score: f64,
    pub label: SentimentLabel,
    pub positive_terms: usize,
    pub negative_terms: usize,
}
