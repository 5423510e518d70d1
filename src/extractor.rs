//! Article extraction from RSS and Atom documents.
//!
//! Wire-format parsing is delegated to `feed-rs`; this module maps its
//! entries onto [`RawArticle`] records.
//!
//! # Field mapping
//!
//! | RawArticle  | Source, in order of preference                   |
//! |-------------|--------------------------------------------------|
//! | `link`      | first `alternate` (or rel-less) link, else first |
//! | `body`      | full content, summary/description, else empty    |
//! | `published` | published date, else updated date                |
//! | `title`     | title, else empty                                |
//!
//! An entry without any link has no identity and is rejected with
//! [`ParseError::MissingLink`]; the caller skips and counts it.

use crate::error::ParseError;
use crate::models::{FeedSource, RawArticle};
use feed_rs::model::Entry;
use feed_rs::parser;
use tracing::{debug, instrument};

/// Parse a feed document and return its entries as a lazy sequence.
///
/// Fails only when the document as a whole cannot be parsed.
#[instrument(level = "debug", skip_all, fields(feed = %source.display_name(), bytes = body.len()))]
pub fn extract(source: &FeedSource, body: &[u8]) -> Result<Entries, ParseError> {
    let feed = parser::parse(body).map_err(|e| ParseError::Feed(e.to_string()))?;
    debug!(entries = feed.entries.len(), "Parsed feed document");
    Ok(Entries {
        source: source.clone(),
        inner: feed.entries.into_iter(),
    })
}

/// Entries of one feed in document order, converted on demand.
#[derive(Debug)]
pub struct Entries {
    source: FeedSource,
    inner: std::vec::IntoIter<Entry>,
}

impl Iterator for Entries {
    type Item = Result<RawArticle, ParseError>;

    fn next(&mut self) -> Option<Self::Item> {
        self.inner.next().map(|entry| to_raw_article(&self.source, entry))
    }

    fn size_hint(&self) -> (usize, Option<usize>) {
        self.inner.size_hint()
    }
}

fn to_raw_article(source: &FeedSource, entry: Entry) -> Result<RawArticle, ParseError> {
    let link = pick_link(&entry).ok_or_else(|| ParseError::MissingLink(entry.id.clone()))?;

    let title = entry
        .title
        .map(|t| t.content.trim().to_string())
        .unwrap_or_default();

    let body = entry
        .content
        .and_then(|c| c.body)
        .filter(|b| !b.trim().is_empty())
        .or_else(|| entry.summary.map(|s| s.content))
        .unwrap_or_default();

    Ok(RawArticle {
        feed_url: source.url.clone(),
        feed_name: source.name.clone(),
        title,
        link,
        published: entry.published.or(entry.updated),
        body,
    })
}

fn pick_link(entry: &Entry) -> Option<String> {
    let usable = |href: &str| !href.trim().is_empty();
    entry
        .links
        .iter()
        .find(|l| usable(&l.href) && l.rel.as_deref().is_none_or(|rel| rel == "alternate"))
        .or_else(|| entry.links.iter().find(|l| usable(&l.href)))
        .map(|l| l.href.trim().to_string())
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{TimeZone, Utc};

    const RSS: &str = r#"<?xml version="1.0" encoding="UTF-8"?>
<rss version="2.0" xmlns:content="http://purl.org/rss/1.0/modules/content/">
  <channel>
    <title>Example News</title>
    <link>https://news.example/</link>
    <description>Test feed</description>
    <item>
      <title>First story</title>
      <link>https://news.example/first</link>
      <pubDate>Mon, 15 Jan 2024 10:00:00 +0000</pubDate>
      <description>Short teaser.</description>
      <content:encoded><![CDATA[<p>The <b>full</b> story.</p>]]></content:encoded>
    </item>
    <item>
      <title>No link here</title>
      <description>Orphan entry.</description>
    </item>
    <item>
      <title>Undated story</title>
      <link>https://news.example/undated</link>
      <description>Only a description.</description>
    </item>
  </channel>
</rss>"#;

    const ATOM: &str = r#"<?xml version="1.0" encoding="utf-8"?>
<feed xmlns="http://www.w3.org/2005/Atom">
  <title>Atom Example</title>
  <id>urn:uuid:60a76c80-d399-11d9-b93C-0003939e0af6</id>
  <updated>2024-01-20T18:30:02Z</updated>
  <entry>
    <title>Atom entry</title>
    <id>urn:uuid:1225c695-cfb8-4ebb-aaaa-80da344efa6a</id>
    <link rel="related" href="https://atom.example/related"/>
    <link href="https://atom.example/entry"/>
    <updated>2024-01-20T18:30:02Z</updated>
    <summary>Atom summary.</summary>
  </entry>
</feed>"#;

    fn source() -> FeedSource {
        FeedSource::named("https://news.example/rss", "Example")
    }

    #[test]
    fn test_extract_rss_in_document_order() {
        let results: Vec<_> = extract(&source(), RSS.as_bytes()).unwrap().collect();
        assert_eq!(results.len(), 3);

        let first = results[0].as_ref().unwrap();
        assert_eq!(first.title, "First story");
        assert_eq!(first.link, "https://news.example/first");
        assert_eq!(first.feed_url, "https://news.example/rss");
        assert_eq!(first.feed_name.as_deref(), Some("Example"));
        assert_eq!(
            first.published,
            Some(Utc.with_ymd_and_hms(2024, 1, 15, 10, 0, 0).unwrap())
        );
        assert!(first.body.contains("<b>full</b>"));

        assert!(matches!(results[1], Err(ParseError::MissingLink(_))));

        let undated = results[2].as_ref().unwrap();
        assert_eq!(undated.published, None);
        assert_eq!(undated.body, "Only a description.");
    }

    #[test]
    fn test_extract_atom_uses_updated_and_alternate_link() {
        let src = FeedSource::new("https://atom.example/feed");
        let articles: Vec<_> = extract(&src, ATOM.as_bytes())
            .unwrap()
            .collect::<Result<_, _>>()
            .unwrap();
        assert_eq!(articles.len(), 1);
        assert_eq!(articles[0].link, "https://atom.example/entry");
        assert_eq!(articles[0].body, "Atom summary.");
        assert_eq!(
            articles[0].published,
            Some(Utc.with_ymd_and_hms(2024, 1, 20, 18, 30, 2).unwrap())
        );
    }

    #[test]
    fn test_extract_rejects_non_feed() {
        let err = extract(&source(), b"this is not a feed").unwrap_err();
        assert!(matches!(err, ParseError::Feed(_)));
    }

    #[test]
    fn test_entries_convert_one_at_a_time() {
        let mut entries = extract(&source(), RSS.as_bytes()).unwrap();
        assert_eq!(entries.size_hint(), (3, Some(3)));

        assert!(entries.next().unwrap().is_ok());
        assert_eq!(entries.size_hint(), (2, Some(2)));

        // The linkless entry only fails once it is reached.
        assert!(matches!(entries.next(), Some(Err(ParseError::MissingLink(_)))));
        assert_eq!(entries.next().unwrap().unwrap().link, "https://news.example/undated");
        assert!(entries.next().is_none());
    }
}
