use chrono::Utc;

use super::xml::XmlDoc;
use super::SerializeError;
use crate::model::{FeedItem, ParsedFeed};
use crate::util::to_rfc3339;

const ATOM_NS: &str = "http://www.w3.org/2005/Atom";

/// Renders `feed` as an Atom 1.0 document.
///
/// The feed's `updated` is the first item's date, or the current time when
/// the feed is empty or that item is undated. Dates are rewritten as
/// RFC 3339 when they can be parsed.
pub fn to_atom(feed: &ParsedFeed) -> Result<String, SerializeError> {
    let mut doc = XmlDoc::new()?;

    let mut root = vec![("xmlns", ATOM_NS)];
    if let Some(language) = &feed.language {
        root.push(("xml:lang", language.as_str()));
    }
    doc.start("feed", &root)?;

    let updated = feed
        .items
        .first()
        .filter(|item| !item.pub_date.is_empty())
        .map(|item| to_rfc3339(&item.pub_date))
        .unwrap_or_else(|| Utc::now().to_rfc3339());

    doc.text("title", &feed.title)?;
    doc.text("subtitle", &feed.description)?;
    doc.empty("link", &[("href", feed.link.as_str()), ("rel", "alternate")])?;
    doc.text("updated", &updated)?;
    doc.text("id", &feed.link)?;

    for item in &feed.items {
        write_entry(&mut doc, item)?;
    }

    doc.end("feed")?;
    doc.finish()
}

fn write_entry(doc: &mut XmlDoc, item: &FeedItem) -> Result<(), SerializeError> {
    doc.start("entry", &[])?;
    doc.text("title", &item.title)?;
    doc.empty("link", &[("href", item.link.as_str()), ("rel", "alternate")])?;
    doc.text("id", item.guid.as_deref().unwrap_or(&item.link))?;

    if !item.pub_date.is_empty() {
        let date = to_rfc3339(&item.pub_date);
        doc.text("published", &date)?;
        doc.text("updated", &date)?;
    }
    if let Some(author) = &item.author {
        doc.start("author", &[])?;
        doc.text("name", author)?;
        doc.end("author")?;
    }

    doc.text_with("summary", &[("type", "html")], &item.description)?;
    if let Some(content) = item.content.as_deref().filter(|c| !c.is_empty()) {
        doc.cdata_with("content", &[("type", "html")], content)?;
    }
    for category in &item.categories {
        doc.empty("category", &[("term", category.as_str())])?;
    }
    if let Some(enclosure) = &item.enclosure {
        let mut attributes = vec![("rel", "enclosure"), ("href", enclosure.url.as_str())];
        if !enclosure.mime_type.is_empty() {
            attributes.push(("type", enclosure.mime_type.as_str()));
        }
        if let Some(length) = &enclosure.length {
            attributes.push(("length", length.as_str()));
        }
        doc.empty("link", &attributes)?;
    }

    doc.end("entry")
}
