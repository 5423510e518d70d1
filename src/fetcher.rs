//! Feed document retrieval.
//!
//! # Architecture
//!
//! - [`FetchFeed`]: the seam between the pipeline and the network
//! - [`HttpFetcher`]: the `reqwest` implementation used in production
//! - [`fetch_all`]: fetches every configured feed with bounded concurrency
//!
//! Each feed gets exactly one attempt per run. A failed feed is reported as
//! a [`FetchError`] next to its source; the next scheduled run is the retry.

use crate::config::FetchConfig;
use crate::error::FetchError;
use crate::models::FeedSource;
use futures::stream::{self, StreamExt};
use std::time::{Duration, Instant};
use tracing::{debug, info, instrument, warn};

/// Retrieve the raw bytes of one feed document.
pub trait FetchFeed {
    async fn fetch(&self, source: &FeedSource) -> Result<Vec<u8>, FetchError>;
}

/// HTTP fetcher sharing one connection pool across all feeds of a run.
#[derive(Debug, Clone)]
pub struct HttpFetcher {
    client: reqwest::Client,
    timeout_secs: u64,
    max_body_bytes: usize,
}

impl HttpFetcher {
    pub fn new(config: &FetchConfig) -> Result<Self, reqwest::Error> {
        let client = reqwest::Client::builder()
            .user_agent(config.user_agent.clone())
            .timeout(Duration::from_secs(config.timeout_secs))
            .build()?;
        Ok(Self::with_client(client, config))
    }

    /// Use a preconfigured client. `config.timeout_secs` is then only used in
    /// error reports; the body size limit still applies.
    pub fn with_client(client: reqwest::Client, config: &FetchConfig) -> Self {
        HttpFetcher {
            client,
            timeout_secs: config.timeout_secs,
            max_body_bytes: config.max_body_bytes,
        }
    }

    fn classify(&self, e: reqwest::Error) -> FetchError {
        if e.is_timeout() {
            FetchError::Timeout(self.timeout_secs)
        } else if let Some(status) = e.status() {
            FetchError::Status(status.as_u16())
        } else {
            FetchError::Transport(e.to_string())
        }
    }
}

impl FetchFeed for HttpFetcher {
    #[instrument(level = "info", skip_all, fields(url = %source.url))]
    async fn fetch(&self, source: &FeedSource) -> Result<Vec<u8>, FetchError> {
        let t0 = Instant::now();
        let mut response = self
            .client
            .get(&source.url)
            .send()
            .await
            .map_err(|e| self.classify(e))?;

        let status = response.status();
        if !status.is_success() {
            return Err(FetchError::Status(status.as_u16()));
        }

        if response
            .content_length()
            .is_some_and(|len| len > self.max_body_bytes as u64)
        {
            return Err(FetchError::TooLarge(self.max_body_bytes));
        }
        let mut body = Vec::new();
        while let Some(chunk) = response.chunk().await.map_err(|e| self.classify(e))? {
            if body.len() + chunk.len() > self.max_body_bytes {
                return Err(FetchError::TooLarge(self.max_body_bytes));
            }
            body.extend_from_slice(&chunk);
        }
        if body.is_empty() {
            return Err(FetchError::EmptyBody);
        }

        debug!(
            bytes = body.len(),
            elapsed_ms = t0.elapsed().as_millis() as u64,
            "Fetched feed document"
        );
        Ok(body)
    }
}

/// Fetch every source, at most `concurrency` at a time.
///
/// Results come back in the same order as `sources`, one per source.
#[instrument(level = "info", skip_all, fields(feeds = sources.len(), concurrency = concurrency))]
pub async fn fetch_all<F: FetchFeed>(
    fetcher: &F,
    sources: &[FeedSource],
    concurrency: usize,
) -> Vec<(FeedSource, Result<Vec<u8>, FetchError>)> {
    let results: Vec<_> = stream::iter(sources.iter().cloned())
        .map(|source| async move {
            let result = fetcher.fetch(&source).await;
            match &result {
                Ok(body) => debug!(feed = %source.display_name(), bytes = body.len(), "Feed fetched"),
                Err(e) => warn!(feed = %source.display_name(), url = %source.url, error = %e, "Feed fetch failed"),
            }
            (source, result)
        })
        .buffered(concurrency.max(1))
        .collect()
        .await;

    let failed = results.iter().filter(|(_, r)| r.is_err()).count();
    info!(
        total = results.len(),
        succeeded = results.len() - failed,
        failed,
        "Fetched feed documents"
    );
    results
}
