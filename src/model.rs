//! Canonical feed model shared by every parser, transform and serializer.
//!
//! Both source dialects (RSS 2.0 and Atom 1.0) are normalized into
//! [`ParsedFeed`] / [`FeedItem`]. The model carries plain strings only: all
//! singleton-vs-sequence and text-vs-node ambiguity is resolved by the parser
//! before a value of these types is built.

/// Source dialect a feed was parsed from. Provenance only.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum FeedType {
    #[default]
    Rss,
    Atom,
}

/// Media attached to a feed item.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Enclosure {
    pub url: String,
    /// MIME type, e.g. `audio/mpeg`. Empty when the source omitted it.
    pub mime_type: String,
    /// Byte length as a decimal string, exactly as found in the source.
    pub length: Option<String>,
}

/// A single item (RSS) or entry (Atom).
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct FeedItem {
    pub title: String,
    pub link: String,
    /// Summary text, possibly HTML.
    pub description: String,
    /// Publication date as found in the source (RFC 822 or ISO 8601).
    ///
    /// Never interpreted at the model level; see [`crate::util::timestamp`].
    pub pub_date: String,
    /// `None` stands for an empty author: an RSS item without `author` or
    /// `dc:creator`, or an Atom entry whose `<author>` has no `<name>`.
    /// Serializers omit the field rather than writing an empty name.
    pub author: Option<String>,
    pub categories: Vec<String>,
    /// Identity marker. Never used for de-duplication.
    pub guid: Option<String>,
    /// Full body, distinct from `description`.
    pub content: Option<String>,
    pub enclosure: Option<Enclosure>,
}

/// A whole feed in canonical form.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ParsedFeed {
    pub title: String,
    pub description: String,
    pub link: String,
    pub language: Option<String>,
    pub feed_type: FeedType,
    pub items: Vec<FeedItem>,
}

impl ParsedFeed {
    /// Returns a copy of this feed's channel metadata carrying `items`.
    pub fn with_items(&self, items: Vec<FeedItem>) -> Self {
        Self {
            title: self.title.clone(),
            description: self.description.clone(),
            link: self.link.clone(),
            language: self.language.clone(),
            feed_type: self.feed_type,
            items,
        }
    }
}

impl FeedItem {
    /// Body text used for reading-time estimates and JSON `content_html`:
    /// `content` when non-empty, otherwise `description`.
    pub fn body(&self) -> &str {
        match self.content.as_deref() {
            Some(content) if !content.is_empty() => content,
            _ => &self.description,
        }
    }
}
