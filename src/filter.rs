//! Published-date window filtering.
//!
//! An article passes when it has a published timestamp and that timestamp
//! lies inside the window, both bounds inclusive. Articles without a
//! published timestamp never pass: the run cannot tell whether they are new,
//! and storing them on every run would defeat the window entirely.

use crate::models::RawArticle;
use chrono::{DateTime, Utc};
use serde::Serialize;

/// Inclusive `[start, end]` window; a missing bound is unbounded.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct DateWindow {
    pub start: Option<DateTime<Utc>>,
    pub end: Option<DateTime<Utc>>,
}

/// Outcome of checking one article against a window.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Verdict {
    /// Carries the published timestamp that was checked.
    InWindow(DateTime<Utc>),
    OutOfWindow,
    Undated,
}

impl DateWindow {
    pub fn new(start: Option<DateTime<Utc>>, end: Option<DateTime<Utc>>) -> Self {
        DateWindow { start, end }
    }

    pub fn unbounded() -> Self {
        DateWindow::default()
    }

    pub fn contains_instant(&self, at: DateTime<Utc>) -> bool {
        self.start.is_none_or(|start| at >= start) && self.end.is_none_or(|end| at <= end)
    }

    pub fn verdict(&self, article: &RawArticle) -> Verdict {
        match article.published {
            None => Verdict::Undated,
            Some(at) if self.contains_instant(at) => Verdict::InWindow(at),
            Some(_) => Verdict::OutOfWindow,
        }
    }

    /// True iff the article is dated and inside the window.
    pub fn contains(&self, article: &RawArticle) -> bool {
        matches!(self.verdict(article), Verdict::InWindow(_))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    fn article(published: Option<DateTime<Utc>>) -> RawArticle {
        RawArticle {
            feed_url: "https://a.example/rss".into(),
            feed_name: None,
            title: "t".into(),
            link: "https://a.example/1".into(),
            published,
            body: String::new(),
        }
    }

    fn at(y: i32, m: u32, d: u32, h: u32) -> DateTime<Utc> {
        Utc.with_ymd_and_hms(y, m, d, h, 0, 0).unwrap()
    }

    #[test]
    fn test_bounds_are_inclusive() {
        let window = DateWindow::new(Some(at(2024, 1, 1, 0)), Some(at(2024, 1, 31, 0)));
        assert!(window.contains(&article(Some(at(2024, 1, 1, 0)))));
        assert!(window.contains(&article(Some(at(2024, 1, 31, 0)))));
        assert!(window.contains(&article(Some(at(2024, 1, 15, 12)))));
    }

    #[test]
    fn test_outside_window_is_rejected() {
        let window = DateWindow::new(Some(at(2024, 1, 1, 0)), Some(at(2024, 1, 31, 0)));
        assert_eq!(
            window.verdict(&article(Some(at(2023, 12, 31, 23)))),
            Verdict::OutOfWindow
        );
        assert_eq!(
            window.verdict(&article(Some(at(2024, 1, 31, 1)))),
            Verdict::OutOfWindow
        );
    }

    #[test]
    fn test_in_window_verdict_carries_timestamp() {
        let window = DateWindow::new(Some(at(2024, 1, 1, 0)), None);
        assert_eq!(
            window.verdict(&article(Some(at(2024, 1, 2, 3)))),
            Verdict::InWindow(at(2024, 1, 2, 3))
        );
    }

    #[test]
    fn test_missing_bounds_are_unbounded() {
        let open_start = DateWindow::new(None, Some(at(2024, 1, 31, 0)));
        assert!(open_start.contains(&article(Some(at(1999, 1, 1, 0)))));

        let open_end = DateWindow::new(Some(at(2024, 1, 1, 0)), None);
        assert!(open_end.contains(&article(Some(at(2099, 1, 1, 0)))));

        assert!(DateWindow::unbounded().contains(&article(Some(at(2024, 6, 1, 0)))));
    }

    #[test]
    fn test_undated_articles_are_excluded() {
        assert_eq!(DateWindow::unbounded().verdict(&article(None)), Verdict::Undated);
        assert!(!DateWindow::unbounded().contains(&article(None)));
    }
}
