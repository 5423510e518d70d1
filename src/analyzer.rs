//! Lightweight, deterministic content analysis.
//!
//! Every article gets [`BasicStats`]. Articles with at least
//! `min_article_length` words additionally get whichever of the following
//! are enabled in [`AnalysisConfig`]:
//!
//! - **keywords**: most frequent non-stopword terms
//! - **summary**: the leading sentences of the text
//! - **entities**: runs of capitalised words (names, places, organisations)
//! - **sentiment**: a lexicon score in `[-1, 1]` with a coarse label
//!
//! Stopwords and the sentiment lexicon cover English and Dutch.
//!
//! All orderings are total (count, then text), so the same input and
//! configuration always produce the same output.

use crate::config::AnalysisConfig;
use crate::error::AnalysisError;
use crate::models::{
    Analysis, BasicStats, Entity, Keyword, ProcessedArticle, RawArticle, Sentiment, SentimentLabel,
};
use crate::utils::{clean_html, truncate_for_log};
use chrono::{DateTime, Utc};
use itertools::Itertools;
use once_cell::sync::Lazy;
use regex::Regex;
use std::cmp::Reverse;
use std::collections::{BTreeMap, HashSet};
use tracing::{debug, instrument, warn};

const WORDS_PER_MINUTE: usize = 200;
const SENTIMENT_THRESHOLD: f64 = 0.2;

static SENTENCE_RE: Lazy<Regex> = Lazy::new(|| Regex::new(r"[^.!?]+[.!?]*").unwrap());
static WORD_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"[\p{L}\p{N}]+(?:['’][\p{L}\p{N}]+)*").unwrap());
static ENTITY_RE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"\p{Lu}[\p{L}\p{N}'’-]*(?:[ \t]+\p{Lu}[\p{L}\p{N}'’-]*)*").unwrap()
});

static STOPWORDS: Lazy<HashSet<&'static str>> = Lazy::new(|| {
    [
        // English
        "a", "about", "after", "again", "all", "also", "an", "and", "any", "are", "as", "at",
        "be", "because", "been", "before", "being", "between", "both", "but", "by", "can",
        "could", "did", "do", "does", "during", "each", "for", "from", "had", "has", "have",
        "he", "her", "here", "him", "his", "how", "i", "if", "in", "into", "is", "it", "its",
        "just", "more", "most", "new", "no", "not", "now", "of", "on", "one", "only", "or",
        "other", "our", "out", "over", "said", "says", "she", "so", "some", "than", "that",
        "the", "their", "them", "then", "there", "these", "they", "this", "those", "through",
        "to", "too", "two", "under", "up", "very", "was", "we", "were", "what", "when",
        "where", "which", "while", "who", "will", "with", "would", "you", "your",
        // Dutch
        "aan", "al", "alle", "als", "bij", "dan", "dat", "de", "deze", "die", "dit", "door",
        "een", "en", "er", "geen", "had", "heb", "hebben", "heeft", "het", "hij", "hoe",
        "hun", "ik", "in", "is", "je", "kan", "maar", "me", "meer", "met", "na", "naar",
        "niet", "nog", "nu", "of", "om", "omdat", "ons", "ook", "op", "over", "te", "tegen",
        "toe", "tot", "uit", "van", "veel", "voor", "was", "wat", "we", "wel", "werd",
        "worden", "wordt", "zal", "ze", "zei", "zich", "zij", "zijn", "zo", "zou",
    ]
    .into_iter()
    .collect()
});

static POSITIVE: Lazy<HashSet<&'static str>> = Lazy::new(|| {
    [
        "good", "great", "excellent", "positive", "success", "successful", "win", "wins",
        "won", "growth", "improve", "improved", "improvement", "benefit", "happy", "hope",
        "celebrate", "strong", "safe", "record", "best", "gain", "gains", "recovery",
        "support", "praised",
        "goed", "goede", "mooi", "mooie", "succes", "winst", "groei", "beter", "blij",
        "veilig", "feest", "trots", "sterk", "hoop", "steun",
    ]
    .into_iter()
    .collect()
});

static NEGATIVE: Lazy<HashSet<&'static str>> = Lazy::new(|| {
    [
        "bad", "poor", "negative", "fail", "failed", "failure", "loss", "losses", "crisis",
        "crash", "death", "dead", "killed", "injured", "attack", "war", "fire", "danger",
        "dangerous", "decline", "worst", "fear", "threat", "accident", "problem", "problems",
        "slecht", "slechte", "verlies", "ongeluk", "dood", "doden", "gewond", "brand",
        "gevaar", "gevaarlijk", "crisis", "probleem", "problemen", "angst", "aanval",
    ]
    .into_iter()
    .collect()
});

/// Computes [`ProcessedArticle`]s from raw articles under a fixed configuration.
#[derive(Debug, Clone)]
pub struct Analyzer {
    config: AnalysisConfig,
}

impl Analyzer {
    pub fn new(config: AnalysisConfig) -> Self {
        Analyzer { config }
    }

    /// Clean and analyze one article that passed the date filter.
    ///
    /// Never fails: an [`AnalysisError`] is recorded in `analysis.error` and
    /// the article is returned with empty derived fields.
    #[instrument(level = "debug", skip_all, fields(link = %raw.link))]
    pub fn analyze(&self, raw: &RawArticle, published: DateTime<Utc>) -> ProcessedArticle {
        let content = clean_html(&raw.body);
        let analysis = match self.analyze_text(&content) {
            Ok(analysis) => analysis,
            Err(e) => {
                warn!(
                    link = %raw.link,
                    title = %truncate_for_log(&raw.title, 80),
                    error = %e,
                    "Analysis failed; storing article without derived fields"
                );
                Analysis {
                    error: Some(e.to_string()),
                    ..Analysis::default()
                }
            }
        };

        ProcessedArticle {
            id: raw.id().key(),
            feed_url: raw.feed_url.clone(),
            feed_name: raw.feed_name.clone(),
            title: raw.title.clone(),
            link: raw.link.clone(),
            published,
            content,
            analysis,
        }
    }

    /// Analyze already-cleaned plain text.
    pub fn analyze_text(&self, text: &str) -> Result<Analysis, AnalysisError> {
        let words = tokenize(text);
        if words.is_empty() {
            return Err(AnalysisError::EmptyContent);
        }
        let sentences = split_sentences(text);

        let mut analysis = Analysis {
            basic_stats: basic_stats(words.len(), sentences.len()),
            ..Analysis::default()
        };

        let min = self.config.min_article_length;
        if words.len() < min {
            debug!(words = words.len(), min, "Below minimum length; basic stats only");
            analysis.skipped = Some(format!(
                "{} words, below the minimum of {}",
                words.len(),
                min
            ));
            return Ok(analysis);
        }

        if self.config.extract_keywords {
            analysis.keywords = Some(keywords(&words, self.config.max_keywords));
        }
        if self.config.summarize_content {
            analysis.summary = Some(summarize(&sentences, self.config.summary_sentences));
        }
        if self.config.extract_entities {
            analysis.entities = Some(entities(&sentences, self.config.max_entities));
        }
        if self.config.sentiment_analysis {
            analysis.sentiment = Some(sentiment(&words));
        }
        Ok(analysis)
    }
}

fn tokenize(text: &str) -> Vec<&str> {
    WORD_RE.find_iter(text).map(|m| m.as_str()).collect()
}

/// Sentences are maximal runs ending in `.`, `!` or `?` that contain a word.
fn split_sentences(text: &str) -> Vec<&str> {
    SENTENCE_RE
        .find_iter(text)
        .map(|m| m.as_str().trim())
        .filter(|s| WORD_RE.is_match(s))
        .collect()
}

fn is_stopword(lowercase: &str) -> bool {
    STOPWORDS.contains(lowercase)
}

fn basic_stats(word_count: usize, sentence_count: usize) -> BasicStats {
    let avg = if sentence_count == 0 {
        0.0
    } else {
        word_count as f64 / sentence_count as f64
    };
    BasicStats {
        word_count,
        sentence_count,
        avg_words_per_sentence: (avg * 100.0).round() / 100.0,
        reading_time_minutes: word_count.div_ceil(WORDS_PER_MINUTE),
    }
}

fn keywords(words: &[&str], max: usize) -> Vec<Keyword> {
    let mut counts: BTreeMap<String, usize> = BTreeMap::new();
    for word in words {
        let term = word.to_lowercase();
        if term.chars().count() < 3
            || term.chars().all(|c| c.is_numeric())
            || is_stopword(&term)
        {
            continue;
        }
        *counts.entry(term).or_default() += 1;
    }
    // BTreeMap yields terms alphabetically; the stable sort keeps that order for ties.
    counts
        .into_iter()
        .sorted_by_key(|(_, count)| Reverse(*count))
        .take(max)
        .map(|(term, count)| Keyword { term, count })
        .collect()
}

fn summarize(sentences: &[&str], n: usize) -> String {
    sentences.iter().take(n).join(" ")
}

fn entities(sentences: &[&str], max: usize) -> Vec<Entity> {
    let mut counts: BTreeMap<String, usize> = BTreeMap::new();
    for sentence in sentences {
        for m in ENTITY_RE.find_iter(sentence) {
            let all: Vec<&str> = m.as_str().split_whitespace().collect();
            let words: Vec<&str> = all
                .iter()
                .copied()
                .skip_while(|w| is_stopword(&w.to_lowercase()))
                .collect();
            // A lone capitalised word opening a sentence is just capitalisation.
            if words.is_empty() || (m.start() == 0 && all.len() == 1) {
                continue;
            }
            let name = words.join(" ");
            if name.chars().count() < 2 {
                continue;
            }
            *counts.entry(name).or_default() += 1;
        }
    }
    counts
        .into_iter()
        .sorted_by_key(|(_, mentions)| Reverse(*mentions))
        .take(max)
        .map(|(name, mentions)| Entity { name, mentions })
        .collect()
}

fn sentiment(words: &[&str]) -> Sentiment {
    let (mut positive, mut negative) = (0usize, 0usize);
    for word in words {
        let w = word.to_lowercase();
        if POSITIVE.contains(w.as_str()) {
            positive += 1;
        } else if NEGATIVE.contains(w.as_str()) {
            negative += 1;
        }
    }
    let total = positive + negative;
    let score = if total == 0 {
        0.0
    } else {
        (positive as f64 - negative as f64) / total as f64
    };
    let label = if score > SENTIMENT_THRESHOLD {
        SentimentLabel::Positive
    } else if score < -SENTIMENT_THRESHOLD {
        SentimentLabel::Negative
    } else {
        SentimentLabel::Neutral
    };
    Sentiment {
        score: (score * 1000.0).round() / 1000.0,
        label,
        positive_terms: positive,
        negative_terms: negative,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    const TEXT: &str = "The city council of Assen approved a new budget on Monday. \
        Mayor Marco Out said the budget is a great success for Assen. \
        Critics fear the plan will fail. The council meets again in March!";

    fn config() -> AnalysisConfig {
        AnalysisConfig {
            min_article_length: 10,
            ..AnalysisConfig::default()
        }
    }

    fn raw(body: &str) -> RawArticle {
        RawArticle {
            feed_url: "https://news.example/rss".into(),
            feed_name: None,
            title: "Budget approved".into(),
            link: "https://news.example/budget".into(),
            published: None,
            body: body.into(),
        }
    }

    fn published() -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2024, 1, 15, 10, 0, 0).unwrap()
    }

    #[test]
    fn test_basic_stats() {
        let analysis = Analyzer::new(config()).analyze_text(TEXT).unwrap();
        let stats = &analysis.basic_stats;
        assert_eq!(stats.sentence_count, 4);
        assert_eq!(stats.word_count, 35);
        assert_eq!(stats.avg_words_per_sentence, 8.75);
        assert_eq!(stats.reading_time_minutes, 1);
        assert!(analysis.skipped.is_none());
        assert!(analysis.error.is_none());
    }

    #[test]
    fn test_keywords_ranked_by_count_then_alphabetically() {
        let analysis = Analyzer::new(config()).analyze_text(TEXT).unwrap();
        let keywords = analysis.keywords.unwrap();
        let terms: Vec<_> = keywords.iter().map(|k| (k.term.as_str(), k.count)).collect();
        assert_eq!(&terms[..3], &[("assen", 2), ("budget", 2), ("council", 2)]);
        assert!(terms.iter().all(|(t, _)| !is_stopword(t)));
        assert_eq!(keywords.len(), 10);
    }

    #[test]
    fn test_summary_takes_leading_sentences() {
        let cfg = AnalysisConfig {
            summary_sentences: 2,
            ..config()
        };
        let summary = Analyzer::new(cfg).analyze_text(TEXT).unwrap().summary.unwrap();
        assert_eq!(
            summary,
            "The city council of Assen approved a new budget on Monday. \
             Mayor Marco Out said the budget is a great success for Assen."
        );
    }

    #[test]
    fn test_entities() {
        let entities = Analyzer::new(config()).analyze_text(TEXT).unwrap().entities.unwrap();
        let names: Vec<_> = entities.iter().map(|e| (e.name.as_str(), e.mentions)).collect();
        assert_eq!(names[0], ("Assen", 2));
        assert!(names.contains(&("Mayor Marco Out", 1)));
        assert!(names.contains(&("Monday", 1)));
        assert!(names.contains(&("March", 1)));
        // Sentence-initial capitalisation alone is not a name.
        assert!(!names.iter().any(|(n, _)| *n == "Critics" || *n == "The"));
    }

    #[test]
    fn test_sentiment() {
        let sentiment = Analyzer::new(config()).analyze_text(TEXT).unwrap().sentiment.unwrap();
        // great, success vs fear, fail
        assert_eq!(sentiment.positive_terms, 2);
        assert_eq!(sentiment.negative_terms, 2);
        assert_eq!(sentiment.score, 0.0);
        assert_eq!(sentiment.label, SentimentLabel::Neutral);

        let upbeat = sentiment_of("Een mooie dag met veel succes en groei.");
        assert_eq!(upbeat.label, SentimentLabel::Positive);
        assert_eq!(upbeat.score, 1.0);
    }

    fn sentiment_of(text: &str) -> Sentiment {
        sentiment(&tokenize(text))
    }

    #[test]
    fn test_short_text_gets_basic_stats_only() {
        let analyzer = Analyzer::new(AnalysisConfig::default());
        let analysis = analyzer.analyze_text("Only a handful of words here.").unwrap();
        assert_eq!(analysis.basic_stats.word_count, 6);
        assert!(analysis.keywords.is_none());
        assert!(analysis.summary.is_none());
        assert!(analysis.entities.is_none());
        assert!(analysis.sentiment.is_none());
        assert_eq!(
            analysis.skipped.as_deref(),
            Some("6 words, below the minimum of 100")
        );
    }

    #[test]
    fn test_disabled_features_are_omitted() {
        let cfg = AnalysisConfig {
            extract_keywords: false,
            summarize_content: false,
            extract_entities: false,
            sentiment_analysis: false,
            ..config()
        };
        let analysis = Analyzer::new(cfg).analyze_text(TEXT).unwrap();
        assert!(analysis.keywords.is_none());
        assert!(analysis.summary.is_none());
        assert!(analysis.entities.is_none());
        assert!(analysis.sentiment.is_none());
        assert!(analysis.skipped.is_none());
    }

    #[test]
    fn test_empty_content_degrades_gracefully() {
        let article = Analyzer::new(config()).analyze(&raw("<p> </p>"), published());
        assert_eq!(article.content, "");
        assert_eq!(article.analysis.error.as_deref(), Some("article has no text content"));
        assert_eq!(article.analysis.basic_stats, BasicStats::default());
        assert_eq!(article.title, "Budget approved");
    }

    #[test]
    fn test_analyze_cleans_html_and_sets_identity() {
        let article = Analyzer::new(config()).analyze(
            &raw("<p>The city council of <b>Assen</b> approved a budget.</p>"),
            published(),
        );
        assert_eq!(article.content, "The city council of Assen approved a budget.");
        assert_eq!(article.id, raw("").id().key());
        assert_eq!(article.published, published());
    }

    #[test]
    fn test_analysis_is_deterministic() {
        let analyzer = Analyzer::new(config());
        let a = serde_json::to_vec(&analyzer.analyze(&raw(TEXT), published())).unwrap();
        let b = serde_json::to_vec(&analyzer.analyze(&raw(TEXT), published())).unwrap();
        let c = serde_json::to_vec(&Analyzer::new(config()).analyze(&raw(TEXT), published())).unwrap();
        assert_eq!(a, b);
        assert_eq!(a, c);
    }

    #[test]
    fn test_split_sentences() {
        assert_eq!(
            split_sentences("One. Two!  Three? Four"),
            vec!["One.", "Two!", "Three?", "Four"]
        );
        assert!(split_sentences("...").is_empty());
    }
}
