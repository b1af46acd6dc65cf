//! Filter, sort and merge over canonical feeds.
//!
//! Every operation borrows its input and returns a fresh [`ParsedFeed`].
//! Chronological comparisons go through [`util::timestamp`], so empty or
//! unparseable dates behave as the Unix epoch.

use std::cmp::Ordering;

use chrono::{DateTime, Utc};
use serde::Deserialize;
use thiserror::Error;

use crate::model::{FeedItem, FeedType, ParsedFeed};
use crate::util::{self, contains_ignore_case, locale_cmp};

/// Title given to the result of [`merge`].
pub const MERGED_TITLE: &str = "Merged Feed";

#[derive(Debug, Error)]
pub enum MergeError {
    #[error("Cannot merge an empty list of feeds")]
    EmptyInput,
}

/// Item filters, combined with AND. Empty lists and `None` pass everything.
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
#[serde(default)]
pub struct FilterOptions {
    /// Keep items whose title or description contains any of these.
    pub keywords: Vec<String>,
    /// Drop items whose title or description contains any of these.
    pub exclude_keywords: Vec<String>,
    /// Inclusive lower bound on the item's publication date.
    pub from_date: Option<DateTime<Utc>>,
    /// Inclusive upper bound on the item's publication date.
    pub to_date: Option<DateTime<Utc>>,
    /// Keep items with a category containing any of these.
    pub categories: Vec<String>,
    /// Keep at most this many items, applied after every other filter.
    pub limit: Option<usize>,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Deserialize, clap::ValueEnum)]
#[serde(rename_all = "lowercase")]
pub enum SortBy {
    #[default]
    Date,
    Title,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Deserialize, clap::ValueEnum)]
#[serde(rename_all = "lowercase")]
pub enum SortOrder {
    Asc,
    #[default]
    Desc,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Deserialize)]
#[serde(default)]
pub struct SortOptions {
    pub by: SortBy,
    pub order: SortOrder,
}

/// Applies `options` to `feed`.
///
/// Stages run in a fixed order: keywords, excluded keywords, date range,
/// categories, then `limit`.
pub fn filter(feed: &ParsedFeed, options: &FilterOptions) -> ParsedFeed {
    let mut items: Vec<FeedItem> = feed
        .items
        .iter()
        .filter(|item| matches_keywords(item, &options.keywords))
        .filter(|item| !excluded(item, &options.exclude_keywords))
        .filter(|item| within_dates(item, options.from_date, options.to_date))
        .filter(|item| matches_categories(item, &options.categories))
        .cloned()
        .collect();

    if let Some(limit) = options.limit {
        items.truncate(limit);
    }

    tracing::debug!(
        before = feed.items.len(),
        after = items.len(),
        "Filtered feed items"
    );

    feed.with_items(items)
}

fn search_text(item: &FeedItem) -> String {
    format!("{} {}", item.title, item.description)
}

fn matches_keywords(item: &FeedItem, keywords: &[String]) -> bool {
    if keywords.is_empty() {
        return true;
    }
    let text = search_text(item);
    keywords.iter().any(|k| contains_ignore_case(&text, k))
}

fn excluded(item: &FeedItem, exclude: &[String]) -> bool {
    if exclude.is_empty() {
        return false;
    }
    let text = search_text(item);
    exclude.iter().any(|k| contains_ignore_case(&text, k))
}

fn within_dates(
    item: &FeedItem,
    from: Option<DateTime<Utc>>,
    to: Option<DateTime<Utc>>,
) -> bool {
    if from.is_none() && to.is_none() {
        return true;
    }

    // Items without a readable date never satisfy a date bound.
    let Some(published) = util::parse_date(&item.pub_date) else {
        return false;
    };

    from.map_or(true, |from| published >= from) && to.map_or(true, |to| published <= to)
}

fn matches_categories(item: &FeedItem, wanted: &[String]) -> bool {
    if wanted.is_empty() {
        return true;
    }
    wanted.iter().any(|want| {
        item.categories
            .iter()
            .any(|category| contains_ignore_case(category, want))
    })
}

/// Returns `feed` with its items reordered.
///
/// The sort is stable in both directions: items that compare equal keep
/// their input order.
pub fn sort(feed: &ParsedFeed, options: &SortOptions) -> ParsedFeed {
    let directed = |ordering: Ordering| match options.order {
        SortOrder::Asc => ordering,
        SortOrder::Desc => ordering.reverse(),
    };

    let mut keyed: Vec<(i64, &FeedItem)> = feed
        .items
        .iter()
        .map(|item| (util::timestamp(&item.pub_date), item))
        .collect();

    match options.by {
        SortBy::Date => keyed.sort_by(|(a, _), (b, _)| directed(a.cmp(b))),
        SortBy::Title => keyed.sort_by(|(_, a), (_, b)| directed(locale_cmp(&a.title, &b.title))),
    }

    feed.with_items(keyed.into_iter().map(|(_, item)| item.clone()).collect())
}

/// Concatenates every feed's items, newest first.
///
/// Items are not de-duplicated: the same story from two sources appears
/// twice.
///
/// # Errors
///
/// [`MergeError::EmptyInput`] when `feeds` is empty.
pub fn merge(feeds: &[ParsedFeed]) -> Result<ParsedFeed, MergeError> {
    if feeds.is_empty() {
        return Err(MergeError::EmptyInput);
    }

    let mut items: Vec<FeedItem> = feeds.iter().flat_map(|f| f.items.iter().cloned()).collect();
    items.sort_by_cached_key(|item| std::cmp::Reverse(util::timestamp(&item.pub_date)));

    tracing::debug!(sources = feeds.len(), items = items.len(), "Merged feeds");

    Ok(ParsedFeed {
        title: MERGED_TITLE.to_string(),
        description: format!("Merged feed from {} sources", feeds.len()),
        link: String::new(),
        language: None,
        feed_type: FeedType::Rss,
        items,
    })
}
