//! Fetch → parse → transform → enhance → serialize, one call per request kind.
//!
//! The HTTP side here is deliberately thin: one GET per source with a size
//! cap, no retries. Anything that goes wrong with a merge source is logged and
//! that source contributes no items.

use std::time::Duration;

use futures::stream::{self, StreamExt};
use thiserror::Error;

use crate::config::Config;
use crate::content::{extract_metadata, Enhancer};
use crate::feed::{parse, ParseError};
use crate::model::ParsedFeed;
use crate::serialize::{serialize, OutputFormat, SerializeError};
use crate::transform::{filter, merge, sort, FilterOptions, MergeError, SortOptions};

/// Errors from downloading and parsing a single feed.
#[derive(Debug, Error)]
pub enum FetchError {
    /// Network-level error (DNS, connection, TLS, timeout)
    #[error("Request failed: {0}")]
    Network(#[from] reqwest::Error),
    /// HTTP response with non-2xx status code
    #[error("HTTP error: status {0}")]
    HttpStatus(u16),
    /// Response body exceeded the configured size limit
    #[error("Response too large (exceeds {0} bytes)")]
    ResponseTooLarge(usize),
    #[error("Invalid feed URL: {0:?}")]
    InvalidUrl(String),
    #[error("Invalid UTF-8 in response")]
    InvalidUtf8,
    /// Body was fetched but is not RSS or Atom
    #[error("Parse error: {0}")]
    Parse(#[from] ParseError),
}

#[derive(Debug, Error)]
pub enum PipelineError {
    #[error(transparent)]
    Fetch(#[from] FetchError),
    #[error(transparent)]
    Parse(#[from] ParseError),
    #[error(transparent)]
    Merge(#[from] MergeError),
    #[error(transparent)]
    Serialize(#[from] SerializeError),
}

/// A downloaded response body.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FetchedText {
    pub body: String,
    pub content_type: Option<String>,
}

/// Builds the shared HTTP client from configuration.
pub fn build_client(config: &Config) -> Result<reqwest::Client, FetchError> {
    let mut builder = reqwest::Client::builder().user_agent(config.user_agent.as_str());
    if config.request_timeout_secs > 0 {
        builder = builder.timeout(Duration::from_secs(config.request_timeout_secs));
    }
    Ok(builder.build()?)
}

/// GETs `url` and returns its body, refusing anything larger than `limit`.
pub async fn fetch_text(
    client: &reqwest::Client,
    url: &str,
    limit: usize,
) -> Result<FetchedText, FetchError> {
    let parsed = url::Url::parse(url).map_err(|_| FetchError::InvalidUrl(url.to_string()))?;
    if !matches!(parsed.scheme(), "http" | "https") {
        return Err(FetchError::InvalidUrl(url.to_string()));
    }

    let response = client.get(parsed).send().await?;
    if !response.status().is_success() {
        return Err(FetchError::HttpStatus(response.status().as_u16()));
    }

    let content_type = response
        .headers()
        .get(reqwest::header::CONTENT_TYPE)
        .and_then(|value| value.to_str().ok())
        .map(str::to_string);

    let bytes = read_limited_bytes(response, limit).await?;
    let body = String::from_utf8(bytes).map_err(|_| FetchError::InvalidUtf8)?;

    Ok(FetchedText { body, content_type })
}

/// Downloads and parses one feed.
pub async fn fetch_feed(
    client: &reqwest::Client,
    url: &str,
    limit: usize,
) -> Result<ParsedFeed, FetchError> {
    let fetched = fetch_text(client, url, limit).await?;
    tracing::debug!(
        url = %url,
        bytes = fetched.body.len(),
        content_type = fetched.content_type.as_deref().unwrap_or("-"),
        "Fetched feed"
    );
    Ok(parse(&fetched.body)?)
}

/// Downloads every URL concurrently.
///
/// The result has one entry per URL in input order. A source that fails is
/// logged and replaced by an empty feed so it adds nothing to a merge.
pub async fn fetch_feeds(client: &reqwest::Client, urls: &[String], limit: usize) -> Vec<ParsedFeed> {
    if urls.is_empty() {
        return Vec::new();
    }

    let mut finished: Vec<(usize, ParsedFeed)> = stream::iter(urls.iter().enumerate())
        .map(|(index, url)| async move {
            match fetch_feed(client, url, limit).await {
                Ok(feed) => (index, feed),
                Err(e) => {
                    tracing::warn!(url = %url, error = %e, "Feed source failed, skipping");
                    (index, ParsedFeed::default())
                }
            }
        })
        .buffer_unordered(urls.len())
        .collect()
        .await;

    finished.sort_by_key(|(index, _)| *index);
    finished.into_iter().map(|(_, feed)| feed).collect()
}

async fn read_limited_bytes(response: reqwest::Response, limit: usize) -> Result<Vec<u8>, FetchError> {
    // Fast path: check Content-Length header
    if let Some(len) = response.content_length() {
        if len > limit as u64 {
            return Err(FetchError::ResponseTooLarge(limit));
        }
    }

    let mut bytes = Vec::new();
    let mut stream = response.bytes_stream();

    while let Some(chunk) = stream.next().await {
        let chunk = chunk?;
        if bytes.len().saturating_add(chunk.len()) > limit {
            return Err(FetchError::ResponseTooLarge(limit));
        }
        bytes.extend_from_slice(&chunk);
    }

    Ok(bytes)
}

/// Post-processing shared by every request kind.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct OutputOptions {
    pub format: OutputFormat,
    /// Append reading-time estimates to each description.
    pub metadata: bool,
}

/// Runs requests against one HTTP client and configuration.
#[derive(Debug, Clone)]
pub struct Pipeline {
    client: reqwest::Client,
    config: Config,
}

impl Pipeline {
    pub fn new(config: Config) -> Result<Self, FetchError> {
        let client = build_client(&config)?;
        Ok(Self { client, config })
    }

    pub fn with_client(client: reqwest::Client, config: Config) -> Self {
        Self { client, config }
    }

    /// Single feed: filter, then optionally sort.
    pub async fn transform(
        &self,
        url: &str,
        filters: &FilterOptions,
        order: Option<&SortOptions>,
        output: OutputOptions,
    ) -> Result<String, PipelineError> {
        let feed = fetch_feed(&self.client, url, self.config.max_feed_size_bytes).await?;
        let feed = transform_feed(&feed, filters, order);
        render(&feed, output)
    }

    /// Several feeds combined into one, newest first.
    pub async fn merge(&self, urls: &[String], output: OutputOptions) -> Result<String, PipelineError> {
        let feeds = fetch_feeds(&self.client, urls, self.config.max_feed_size_bytes).await;
        let merged = merge(&feeds)?;
        tracing::info!(
            sources = urls.len(),
            items = merged.items.len(),
            "Merged feeds"
        );
        render(&merged, output)
    }

    /// Single feed with full article text scraped from each item's link.
    pub async fn enhance(&self, url: &str, output: OutputOptions) -> Result<String, PipelineError> {
        let feed = fetch_feed(&self.client, url, self.config.max_feed_size_bytes).await?;
        let enhancer = Enhancer::from_config(self.client.clone(), &self.config);
        let enhanced = enhancer.enhance_with_full_text(&feed).await;
        render(&enhanced, output)
    }
}

/// Local document: parse, filter, optionally sort, then render.
pub fn convert(
    raw: &str,
    filters: &FilterOptions,
    order: Option<&SortOptions>,
    output: OutputOptions,
) -> Result<String, PipelineError> {
    let feed = parse(raw)?;
    render(&transform_feed(&feed, filters, order), output)
}

fn transform_feed(feed: &ParsedFeed, filters: &FilterOptions, order: Option<&SortOptions>) -> ParsedFeed {
    let filtered = filter(feed, filters);
    match order {
        Some(options) => sort(&filtered, options),
        None => filtered,
    }
}

fn render(feed: &ParsedFeed, output: OutputOptions) -> Result<String, PipelineError> {
    if output.metadata {
        Ok(serialize(&extract_metadata(feed), output.format)?)
    } else {
        Ok(serialize(feed, output.format)?)
    }
}
