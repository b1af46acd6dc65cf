use crate::model::{FeedItem, ParsedFeed};
use crate::util::reading_minutes;

/// Appends a reading-time estimate to every item's description.
///
/// The estimate is computed over the item's content, or its description
/// when there is no content, with markup stripped: `"Intro (3 min read)"`.
pub fn extract_metadata(feed: &ParsedFeed) -> ParsedFeed {
    let items = feed
        .items
        .iter()
        .map(|item| {
            let minutes = reading_minutes(item.body());
            FeedItem {
                description: format!("{} ({} min read)", item.description, minutes),
                ..item.clone()
            }
        })
        .collect();

    feed.with_items(items)
}
