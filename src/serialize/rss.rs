use super::xml::XmlDoc;
use super::SerializeError;
use crate::model::{FeedItem, ParsedFeed};

const DC_NS: &str = "http://purl.org/dc/elements/1.1/";
const CONTENT_NS: &str = "http://purl.org/rss/1.0/modules/content/";

/// Renders `feed` as an RSS 2.0 document.
///
/// Authors are written as `dc:creator` and full content as a
/// `content:encoded` CDATA section. Optional fields are left out entirely
/// when absent.
pub fn to_rss(feed: &ParsedFeed) -> Result<String, SerializeError> {
    let mut doc = XmlDoc::new()?;

    doc.start(
        "rss",
        &[
            ("version", "2.0"),
            ("xmlns:dc", DC_NS),
            ("xmlns:content", CONTENT_NS),
        ],
    )?;
    doc.start("channel", &[])?;
    doc.text("title", &feed.title)?;
    doc.text("link", &feed.link)?;
    doc.text("description", &feed.description)?;
    if let Some(language) = &feed.language {
        doc.text("language", language)?;
    }

    for item in &feed.items {
        write_item(&mut doc, item)?;
    }

    doc.end("channel")?;
    doc.end("rss")?;
    doc.finish()
}

fn write_item(doc: &mut XmlDoc, item: &FeedItem) -> Result<(), SerializeError> {
    doc.start("item", &[])?;
    doc.text("title", &item.title)?;
    doc.text("link", &item.link)?;
    doc.text("description", &item.description)?;

    if !item.pub_date.is_empty() {
        doc.text("pubDate", &item.pub_date)?;
    }
    if let Some(author) = &item.author {
        doc.text("dc:creator", author)?;
    }
    if let Some(guid) = &item.guid {
        // Readers assume a guid is a permalink unless told otherwise.
        if guid.starts_with("http://") || guid.starts_with("https://") {
            doc.text("guid", guid)?;
        } else {
            doc.text_with("guid", &[("isPermaLink", "false")], guid)?;
        }
    }
    if let Some(content) = item.content.as_deref().filter(|c| !c.is_empty()) {
        doc.cdata_with("content:encoded", &[], content)?;
    }
    for category in &item.categories {
        doc.text("category", category)?;
    }
    if let Some(enclosure) = &item.enclosure {
        let mut attributes = vec![("url", enclosure.url.as_str())];
        if !enclosure.mime_type.is_empty() {
            attributes.push(("type", enclosure.mime_type.as_str()));
        }
        if let Some(length) = &enclosure.length {
            attributes.push(("length", length.as_str()));
        }
        doc.empty("enclosure", &attributes)?;
    }

    doc.end("item")
}
