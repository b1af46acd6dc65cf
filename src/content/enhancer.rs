use futures::stream::{self, StreamExt};
use thiserror::Error;

use super::extract::{extract_main_content, MIN_CONTENT_LEN};
use crate::config::Config;
use crate::model::{FeedItem, ParsedFeed};

/// User-Agent sent with article page requests.
pub const DEFAULT_USER_AGENT: &str =
    "Mozilla/5.0 (compatible; feedshift/0.1; full-text feed enhancer)";

const DEFAULT_MAX_PAGE_SIZE: usize = 5 * 1024 * 1024; // 5MB

/// Why a single item could not be enhanced.
///
/// Never returned from [`Enhancer::enhance_with_full_text`]: each failure is
/// logged as a warning and the item is kept unchanged.
#[derive(Debug, Error)]
pub enum ContentError {
    #[error("Invalid article URL: {0:?}")]
    InvalidUrl(String),
    #[error("Network error: {0}")]
    Network(#[from] reqwest::Error),
    #[error("HTTP error: status {0}")]
    HttpStatus(u16),
    #[error("Response too large (exceeds {0} bytes)")]
    ResponseTooLarge(usize),
    #[error("Invalid UTF-8 in response")]
    InvalidUtf8,
    #[error("No extractable content in page")]
    NoContent,
}

/// Replaces short item content with the article text scraped from each
/// item's link.
#[derive(Debug, Clone)]
pub struct Enhancer {
    client: reqwest::Client,
    user_agent: String,
    max_page_size: usize,
    /// Fetches in flight at once; 0 means one per item.
    max_concurrent: usize,
}

impl Enhancer {
    pub fn new(client: reqwest::Client) -> Self {
        Self {
            client,
            user_agent: DEFAULT_USER_AGENT.to_string(),
            max_page_size: DEFAULT_MAX_PAGE_SIZE,
            max_concurrent: 0,
        }
    }

    pub fn from_config(client: reqwest::Client, config: &Config) -> Self {
        Self {
            client,
            user_agent: config.user_agent.clone(),
            max_page_size: config.max_page_size_bytes,
            max_concurrent: config.max_concurrent_fetches,
        }
    }

    pub fn with_max_concurrent(mut self, max_concurrent: usize) -> Self {
        self.max_concurrent = max_concurrent;
        self
    }

    pub fn with_max_page_size(mut self, bytes: usize) -> Self {
        self.max_page_size = bytes;
        self
    }

    /// Fetches full text for every item whose content is missing or short.
    ///
    /// All items are fetched concurrently and the result keeps the input
    /// order regardless of which fetch finishes first. A failed item is
    /// logged and carried over unchanged; it never affects other items.
    pub async fn enhance_with_full_text(&self, feed: &ParsedFeed) -> ParsedFeed {
        if feed.items.is_empty() {
            return feed.clone();
        }

        let slots = if self.max_concurrent == 0 {
            feed.items.len()
        } else {
            self.max_concurrent
        };

        let finished: Vec<(usize, FeedItem)> = stream::iter(feed.items.iter().enumerate())
            .map(|(index, item)| async move { (index, self.enhance_item(item).await) })
            .buffer_unordered(slots)
            .collect()
            .await;

        // Completion order is arbitrary; put each item back at its index.
        let mut items: Vec<Option<FeedItem>> = vec![None; feed.items.len()];
        for (index, item) in finished {
            items[index] = Some(item);
        }

        let items = items
            .into_iter()
            .zip(&feed.items)
            .map(|(enhanced, original)| enhanced.unwrap_or_else(|| original.clone()))
            .collect();

        feed.with_items(items)
    }

    async fn enhance_item(&self, item: &FeedItem) -> FeedItem {
        let has_full_content = item
            .content
            .as_deref()
            .is_some_and(|content| content.chars().count() > MIN_CONTENT_LEN);
        if has_full_content {
            return item.clone();
        }

        match self.fetch_full_text(&item.link).await {
            Ok(content) => {
                tracing::debug!(link = %item.link, len = content.len(), "Extracted full text");
                FeedItem {
                    content: Some(content),
                    ..item.clone()
                }
            }
            Err(e) => {
                tracing::warn!(
                    link = %item.link,
                    title = %item.title,
                    error = %e,
                    "Full-text extraction failed, keeping item unchanged"
                );
                item.clone()
            }
        }
    }

    async fn fetch_full_text(&self, link: &str) -> Result<String, ContentError> {
        let url = url::Url::parse(link).map_err(|_| ContentError::InvalidUrl(link.to_string()))?;
        if !matches!(url.scheme(), "http" | "https") {
            return Err(ContentError::InvalidUrl(link.to_string()));
        }

        let response = self
            .client
            .get(url)
            .header(reqwest::header::USER_AGENT, &self.user_agent)
            .send()
            .await?;

        if !response.status().is_success() {
            return Err(ContentError::HttpStatus(response.status().as_u16()));
        }

        let html = read_limited_text(response, self.max_page_size).await?;
        extract_main_content(&html).ok_or(ContentError::NoContent)
    }
}

async fn read_limited_text(
    response: reqwest::Response,
    limit: usize,
) -> Result<String, ContentError> {
    // Fast path: check Content-Length header
    if let Some(len) = response.content_length() {
        if len > limit as u64 {
            return Err(ContentError::ResponseTooLarge(limit));
        }
    }

    let mut bytes = Vec::new();
    let mut stream = response.bytes_stream();

    while let Some(chunk) = stream.next().await {
        let chunk = chunk?;
        if bytes.len().saturating_add(chunk.len()) > limit {
            return Err(ContentError::ResponseTooLarge(limit));
        }
        bytes.extend_from_slice(&chunk);
    }

    String::from_utf8(bytes).map_err(|_| ContentError::InvalidUtf8)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::time::Duration;
    use wiremock::matchers::{header, method, path};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    const ARTICLE_TEXT: &str = "Substantial article text that easily clears the two hundred \
        character threshold used to decide whether a container holds the real story. It keeps \
        going with more sentences so the extractor accepts it as the main content block.";

    fn article_page(marker: &str) -> String {
        format!(
            "<html><body><nav>menu</nav><article><p>{marker}</p><p>{ARTICLE_TEXT}</p></article></body></html>"
        )
    }

    fn item(title: &str, link: String, content: Option<String>) -> FeedItem {
        FeedItem {
            title: title.to_string(),
            link,
            description: "summary".to_string(),
            content,
            ..Default::default()
        }
    }

    #[tokio::test]
    async fn test_enhances_short_items() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/a"))
            .and(header("user-agent", DEFAULT_USER_AGENT))
            .respond_with(ResponseTemplate::new(200).set_body_string(article_page("marker-a")))
            .mount(&server)
            .await;

        let feed = ParsedFeed {
            items: vec![item("A", format!("{}/a", server.uri()), Some("short".into()))],
            ..Default::default()
        };

        let enhanced = Enhancer::new(reqwest::Client::new())
            .enhance_with_full_text(&feed)
            .await;
        let content = enhanced.items[0].content.as_deref().unwrap();
        assert!(content.contains("marker-a"));
        assert!(!content.contains("menu"));
        assert_eq!(feed.items[0].content.as_deref(), Some("short"));
    }

    #[tokio::test]
    async fn test_long_content_is_not_fetched() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .respond_with(ResponseTemplate::new(200).set_body_string(article_page("x")))
            .expect(0)
            .mount(&server)
            .await;

        let long = "y".repeat(MIN_CONTENT_LEN + 1);
        let feed = ParsedFeed {
            items: vec![item("A", format!("{}/a", server.uri()), Some(long.clone()))],
            ..Default::default()
        };

        let enhanced = Enhancer::new(reqwest::Client::new())
            .enhance_with_full_text(&feed)
            .await;
        assert_eq!(enhanced.items[0].content.as_deref(), Some(long.as_str()));
    }

    #[tokio::test]
    async fn test_failures_are_isolated() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/ok"))
            .respond_with(ResponseTemplate::new(200).set_body_string(article_page("fine")))
            .mount(&server)
            .await;
        Mock::given(method("GET"))
            .and(path("/missing"))
            .respond_with(ResponseTemplate::new(404))
            .mount(&server)
            .await;

        let feed = ParsedFeed {
            items: vec![
                item("Missing", format!("{}/missing", server.uri()), None),
                item("Ok", format!("{}/ok", server.uri()), None),
                item("No link", String::new(), None),
            ],
            ..Default::default()
        };

        let enhanced = Enhancer::new(reqwest::Client::new())
            .enhance_with_full_text(&feed)
            .await;
        assert_eq!(enhanced.items[0], feed.items[0]);
        assert!(enhanced.items[1]
            .content
            .as_deref()
            .unwrap()
            .contains("fine"));
        assert_eq!(enhanced.items[2], feed.items[2]);
    }

    #[tokio::test]
    async fn test_order_preserved_when_completion_differs() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/slow"))
            .respond_with(
                ResponseTemplate::new(200)
                    .set_body_string(article_page("slow-page"))
                    .set_delay(Duration::from_millis(200)),
            )
            .mount(&server)
            .await;
        Mock::given(method("GET"))
            .and(path("/fast"))
            .respond_with(ResponseTemplate::new(200).set_body_string(article_page("fast-page")))
            .mount(&server)
            .await;

        let feed = ParsedFeed {
            items: vec![
                item("Slow", format!("{}/slow", server.uri()), None),
                item("Fast", format!("{}/fast", server.uri()), None),
            ],
            ..Default::default()
        };

        let enhanced = Enhancer::new(reqwest::Client::new())
            .enhance_with_full_text(&feed)
            .await;
        assert_eq!(enhanced.items[0].title, "Slow");
        assert!(enhanced.items[0].content.as_deref().unwrap().contains("slow-page"));
        assert_eq!(enhanced.items[1].title, "Fast");
        assert!(enhanced.items[1].content.as_deref().unwrap().contains("fast-page"));
    }

    #[tokio::test]
    async fn test_oversized_page_left_unchanged() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .respond_with(ResponseTemplate::new(200).set_body_string(article_page("big")))
            .mount(&server)
            .await;

        let feed = ParsedFeed {
            items: vec![item("A", format!("{}/a", server.uri()), None)],
            ..Default::default()
        };

        let enhanced = Enhancer::new(reqwest::Client::new())
            .with_max_page_size(16)
            .enhance_with_full_text(&feed)
            .await;
        assert_eq!(enhanced.items[0], feed.items[0]);
    }

    #[tokio::test]
    async fn test_empty_feed() {
        let feed = ParsedFeed::default();
        let enhanced = Enhancer::new(reqwest::Client::new())
            .with_max_concurrent(4)
            .enhance_with_full_text(&feed)
            .await;
        assert!(enhanced.items.is_empty());
    }

    #[tokio::test]
    async fn test_non_http_link_rejected() {
        let enhancer = Enhancer::new(reqwest::Client::new());
        let result = enhancer.fetch_full_text("file:///etc/passwd").await;
        assert!(matches!(result, Err(ContentError::InvalidUrl(_))));
    }
}
