//! Markdown rendering of the run report.
//!
//! The summary is appended rather than written, so several runs (or other
//! steps of the same CI job) can share one summary file.

use crate::report::{FeedStatus, RunReport};
use std::error::Error;
use std::fmt::Write;
use std::path::Path;
use tokio::fs::OpenOptions;
use tokio::io::AsyncWriteExt;
use tracing::{info, instrument};

/// Render a heading, a totals line and one table row per feed.
pub fn report_to_markdown(report: &RunReport) -> String {
    let totals = report.totals();
    let mut md = String::new();

    writeln!(md, "## Feed digest run {}\n", report.started_at.format("%Y-%m-%d %H:%M UTC")).unwrap();
    let window = |bound: Option<chrono::DateTime<chrono::Utc>>| {
        bound.map_or_else(|| "unbounded".to_string(), |b| b.format("%Y-%m-%d %H:%M").to_string())
    };
    writeln!(
        md,
        "Window: {} → {}\n",
        window(report.window.start),
        window(report.window.end)
    )
    .unwrap();
    writeln!(
        md,
        "**{}** articles stored from {} feeds ({} failed). Output: {}{}\n",
        totals.stored,
        totals.feeds,
        totals.feeds_failed,
        if report.had_output { "yes" } else { "none" },
        if report.degraded() { " (degraded)" } else { "" }
    )
    .unwrap();

    if report.feeds.is_empty() {
        writeln!(md, "_No feeds configured._").unwrap();
        return md;
    }

    writeln!(md, "| Feed | Status | Fetched | In window | Stored | Failed |").unwrap();
    writeln!(md, "|------|--------|---------|-----------|--------|--------|").unwrap();
    for feed in &report.feeds {
        let status = match &feed.status {
            FeedStatus::Ok => "ok".to_string(),
            FeedStatus::FetchFailed(reason) => format!("fetch failed: {}", escape_cell(reason)),
            FeedStatus::ParseFailed(reason) => format!("parse failed: {}", escape_cell(reason)),
        };
        writeln!(
            md,
            "| [{}]({}) | {} | {} | {} | {} | {} |",
            escape_cell(&feed.name),
            feed.url,
            status,
            feed.fetched,
            feed.in_window,
            feed.stored,
            feed.failed()
        )
        .unwrap();
    }
    md
}

fn escape_cell(s: &str) -> String {
    s.replace('|', "\\|").replace('\n', " ")
}

/// Append the rendered summary to `path`, creating the file if needed.
#[instrument(level = "info", skip_all, fields(path = %path.display()))]
pub async fn append_summary(report: &RunReport, path: &Path) -> Result<(), Box<dyn Error>> {
    let md = report_to_markdown(report);
    let mut file = OpenOptions::new().create(true).append(true).open(path).await?;
    file.write_all(md.as_bytes()).await?;
    file.write_all(b"\n").await?;
    file.flush().await?;
    info!("Appended run summary");
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::filter::DateWindow;
    use crate::report::FeedReport;
    use chrono::{TimeZone, Utc};

    fn report(feeds: Vec<FeedReport>, had_output: bool) -> RunReport {
        let at = Utc.with_ymd_and_hms(2024, 2, 1, 6, 0, 0).unwrap();
        RunReport {
            started_at: at,
            finished_at: at,
            window: DateWindow::new(Some(Utc.with_ymd_and_hms(2024, 1, 1, 0, 0, 0).unwrap()), None),
            feeds,
            had_output,
        }
    }

    #[test]
    fn test_markdown_table() {
        let mut ok = FeedReport::new("https://a.example/rss", "A");
        ok.fetched = 5;
        ok.in_window = 3;
        ok.stored = 3;
        let mut broken = FeedReport::new("https://b.example/rss", "B|C");
        broken.status = FeedStatus::FetchFailed("HTTP status 500".into());

        let md = report_to_markdown(&report(vec![ok, broken], true));

        assert!(md.starts_with("## Feed digest run 2024-02-01 06:00 UTC"));
        assert!(md.contains("Window: 2024-01-01 00:00 → unbounded"));
        assert!(md.contains("**3** articles stored from 2 feeds (1 failed). Output: yes (degraded)"));
        assert!(md.contains("| [A](https://a.example/rss) | ok | 5 | 3 | 3 | 0 |"));
        assert!(md.contains("| [B\\|C](https://b.example/rss) | fetch failed: HTTP status 500 | 0 | 0 | 0 | 0 |"));
    }

    #[test]
    fn test_markdown_without_feeds() {
        let md = report_to_markdown(&report(Vec::new(), false));
        assert!(md.contains("Output: none\n"));
        assert!(md.contains("_No feeds configured._"));
        assert!(!md.contains("| Feed |"));
    }

    #[tokio::test]
    async fn test_append_summary() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("summary.md");
        std::fs::write(&path, "# Existing\n").unwrap();

        let run = report(Vec::new(), false);
        append_summary(&run, &path).await.unwrap();
        append_summary(&run, &path).await.unwrap();

        let text = std::fs::read_to_string(&path).unwrap();
        assert!(text.starts_with("# Existing\n"));
        assert_eq!(text.matches("## Feed digest run").count(), 2);
    }
}
