//! Main-content extraction from article pages.

use scraper::{Html, Selector};

/// Minimum length (in characters) for extracted HTML to count as an article
/// body. Items whose feed content already exceeds this are not fetched.
pub const MIN_CONTENT_LEN: usize = 200;

/// Elements that never carry article text.
const NOISE_SELECTOR: &str = "script, style, nav, footer, header, aside, \
     .ad, .ads, .advertisement, [class^=\"ad-\"], [id^=\"ad-\"]";

/// Content containers, most specific first.
const CONTENT_SELECTORS: &[&str] = &[
    "article",
    "[role=\"main\"]",
    "main",
    ".post-content",
    ".entry-content",
    ".article-content",
    ".content",
    "#content",
];

/// Extracts the main content of an HTML page as HTML.
///
/// Noise elements are removed first. Each content selector is tried in
/// order and the first match whose inner HTML is longer than
/// [`MIN_CONTENT_LEN`] wins; otherwise the whole `<body>` is returned.
/// Returns `None` only when the body is empty.
pub fn extract_main_content(html: &str) -> Option<String> {
    let mut document = Html::parse_document(html);
    strip_noise(&mut document);

    for selector_str in CONTENT_SELECTORS {
        let Ok(selector) = Selector::parse(selector_str) else {
            continue;
        };
        if let Some(element) = document.select(&selector).next() {
            let inner = element.inner_html();
            let inner = inner.trim();
            if inner.chars().count() > MIN_CONTENT_LEN {
                tracing::trace!(selector = selector_str, "Matched content container");
                return Some(inner.to_string());
            }
        }
    }

    let body_selector = Selector::parse("body").ok()?;
    let body = document.select(&body_selector).next()?;
    let inner = body.inner_html();
    let inner = inner.trim();
    if inner.is_empty() {
        None
    } else {
        Some(inner.to_string())
    }
}

fn strip_noise(document: &mut Html) {
    let Ok(selector) = Selector::parse(NOISE_SELECTOR) else {
        return;
    };

    let ids: Vec<_> = document.select(&selector).map(|el| el.id()).collect();
    for id in ids {
        if let Some(mut node) = document.tree.get_mut(id) {
            node.detach();
        }
    }
}
