use serde::Serialize;

use super::SerializeError;
use crate::model::{FeedItem, ParsedFeed};
use crate::util::to_rfc3339;

pub const JSON_FEED_VERSION: &str = "https://jsonfeed.org/version/1.1";

#[derive(Serialize)]
struct JsonFeed<'a> {
    version: &'static str,
    title: &'a str,
    #[serde(skip_serializing_if = "is_empty")]
    home_page_url: &'a str,
    #[serde(skip_serializing_if = "is_empty")]
    description: &'a str,
    #[serde(skip_serializing_if = "Option::is_none")]
    language: Option<&'a str>,
    items: Vec<JsonItem<'a>>,
}

#[derive(Serialize)]
struct JsonItem<'a> {
    id: &'a str,
    #[serde(skip_serializing_if = "is_empty")]
    url: &'a str,
    title: &'a str,
    content_html: &'a str,
    #[serde(skip_serializing_if = "is_empty")]
    summary: &'a str,
    #[serde(skip_serializing_if = "Option::is_none")]
    date_published: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    authors: Option<Vec<JsonAuthor<'a>>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    tags: Option<&'a [String]>,
    #[serde(skip_serializing_if = "Option::is_none")]
    attachments: Option<Vec<JsonAttachment<'a>>>,
}

#[derive(Serialize)]
struct JsonAuthor<'a> {
    name: &'a str,
}

#[derive(Serialize)]
struct JsonAttachment<'a> {
    url: &'a str,
    mime_type: &'a str,
    #[serde(skip_serializing_if = "Option::is_none")]
    size_in_bytes: Option<u64>,
}

fn is_empty(s: &&str) -> bool {
    s.is_empty()
}

/// Renders `feed` as a JSON Feed 1.1 document.
///
/// Absent optional fields are omitted rather than written as `null`.
pub fn to_json(feed: &ParsedFeed) -> Result<String, SerializeError> {
    let document = JsonFeed {
        version: JSON_FEED_VERSION,
        title: &feed.title,
        home_page_url: &feed.link,
        description: &feed.description,
        language: feed.language.as_deref(),
        items: feed.items.iter().map(json_item).collect(),
    };

    Ok(serde_json::to_string_pretty(&document)?)
}

fn json_item(item: &FeedItem) -> JsonItem<'_> {
    JsonItem {
        id: item.guid.as_deref().unwrap_or(&item.link),
        url: &item.link,
        title: &item.title,
        content_html: item.body(),
        summary: &item.description,
        date_published: Some(&item.pub_date)
            .filter(|d| !d.is_empty())
            .map(|d| to_rfc3339(d)),
        authors: item
            .author
            .as_deref()
            .map(|name| vec![JsonAuthor { name }]),
        tags: Some(item.categories.as_slice()).filter(|tags| !tags.is_empty()),
        attachments: item.enclosure.as_ref().map(|enclosure| {
            vec![JsonAttachment {
                url: &enclosure.url,
                mime_type: &enclosure.mime_type,
                size_in_bytes: enclosure
                    .length
                    .as_deref()
                    .and_then(|len| len.trim().parse().ok()),
            }]
        }),
    }
}
