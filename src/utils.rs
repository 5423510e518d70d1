//! Small text helpers shared by the extractor, analyzer and logging.
//!
//! - HTML-to-text cleaning of feed bodies
//! - String truncation for log fields

use scraper::Html;

/// Strip markup from an HTML fragment and collapse whitespace.
///
/// Text nodes are joined with a single space, so `<p>a</p><p>b</p>` becomes
/// `"a b"`. Plain text passes through with only whitespace normalised.
///
/// # Examples
///
/// ```ignore
/// assert_eq!(clean_html("<p>Hello <b>world</b></p>"), "Hello world");
/// ```
pub fn clean_html(fragment: &str) -> String {
    let document = Html::parse_fragment(fragment);
    let text = document.root_element().text().collect::<Vec<_>>().join(" ");
    collapse_whitespace(&text)
}

/// Replace every run of whitespace with a single space and trim the ends.
pub fn collapse_whitespace(s: &str) -> String {
    s.split_whitespace().collect::<Vec<_>>().join(" ")
}

/// Truncate a string for logging purposes.
///
/// Strings longer than `max` characters are cut at a character boundary and
/// get `"…(+N bytes)"` appended, where N counts the dropped bytes.
///
/// # Examples
///
/// ```ignore
/// assert_eq!(truncate_for_log("short", 100), "short");
/// assert_eq!(truncate_for_log(&"a".repeat(500), 10), "aaaaaaaaaa…(+490 bytes)");
/// ```
pub fn truncate_for_log(s: &str, max: usize) -> String {
    match s.char_indices().nth(max) {
        None => s.to_string(),
        Some((cut, _)) => format!("{}…(+{} bytes)", &s[..cut], s.len() - cut),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_truncate_for_log_short_string() {
        let s = "Hello, world!";
        assert_eq!(truncate_for_log(s, 100), "Hello, world!");
    }

    #[test]
    fn test_truncate_for_log_long_string() {
        let s = "a".repeat(500);
        let result = truncate_for_log(&s, 100);
        assert!(result.starts_with(&"a".repeat(100)));
        assert!(result.contains("…(+400 bytes)"));
    }

    #[test]
    fn test_truncate_for_log_multibyte() {
        let s = "ééééé";
        assert_eq!(truncate_for_log(s, 2), "éé…(+6 bytes)");
    }

    #[test]
    fn test_clean_html_strips_tags() {
        assert_eq!(clean_html("<p>Hello <b>world</b></p>"), "Hello world");
        assert_eq!(
            clean_html("<p>First paragraph.</p>\n\n<p>Second.</p>"),
            "First paragraph. Second."
        );
    }

    #[test]
    fn test_clean_html_plain_text_and_entities() {
        assert_eq!(clean_html("  plain   text\n"), "plain text");
        assert_eq!(clean_html("Fish &amp; chips"), "Fish & chips");
        assert_eq!(clean_html(""), "");
    }

    #[test]
    fn test_collapse_whitespace() {
        assert_eq!(collapse_whitespace(" a \t b\n\nc "), "a b c");
    }
}
