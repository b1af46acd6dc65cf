use thiserror::Error;

use super::tree::Element;
use crate::model::{Enclosure, FeedItem, FeedType, ParsedFeed};

/// Errors that can occur while reading a feed document.
#[derive(Debug, Error)]
pub enum ParseError {
    /// Root element is neither `<rss>` nor `<feed>`.
    #[error("Unsupported feed format: root element <{0}> is neither RSS nor Atom")]
    UnsupportedFormat(String),

    /// Markup is not well-formed XML.
    #[error("XML parse error: {0}")]
    Xml(String),

    /// SEC-003: Document nesting exceeds the safety limit.
    #[error("Feed nesting depth exceeds maximum of {0} levels")]
    TooDeep(usize),
}

/// Parses RSS 2.0 or Atom 1.0 text into the canonical model.
///
/// The dialect is chosen from the root element. Missing structure never
/// fails: absent channels, items, links or dates fall back to empty values.
/// Items and entries without a title are dropped.
///
/// # Errors
///
/// - [`ParseError::UnsupportedFormat`] for any other root element, including
///   a namespace-prefixed `<atom:feed>`: children are looked up by their
///   unprefixed names, so such a document could not be read faithfully
/// - [`ParseError::Xml`] / [`ParseError::TooDeep`] for malformed markup
pub fn parse(raw: &str) -> Result<ParsedFeed, ParseError> {
    let root = Element::parse_document(raw)?;

    match root.name() {
        "rss" => Ok(parse_rss(&root)),
        "feed" => Ok(parse_atom(&root)),
        other => Err(ParseError::UnsupportedFormat(other.to_string())),
    }
}

// ============================================================================
// RSS 2.0
// ============================================================================

fn parse_rss(root: &Element) -> ParsedFeed {
    let Some(channel) = root.child("channel") else {
        tracing::debug!("RSS document has no <channel>, returning empty feed");
        return ParsedFeed {
            feed_type: FeedType::Rss,
            ..Default::default()
        };
    };

    let items: Vec<FeedItem> = channel.children("item").filter_map(parse_rss_item).collect();

    ParsedFeed {
        title: channel.child_text("title").unwrap_or_default(),
        description: channel.child_text("description").unwrap_or_default(),
        link: channel.child_text("link").unwrap_or_default(),
        language: channel.child_text("language"),
        feed_type: FeedType::Rss,
        items,
    }
}

fn parse_rss_item(item: &Element) -> Option<FeedItem> {
    let title = item.child_text("title")?;
    let description = item.child_text("description").unwrap_or_default();

    let content = item
        .child_text("content:encoded")
        .or_else(|| item.child_text("content"))
        .or_else(|| Some(description.clone()).filter(|d| !d.is_empty()));

    let enclosure = item.child("enclosure").map(|el| Enclosure {
        url: el.attr("url").unwrap_or_default().to_string(),
        mime_type: el.attr("type").unwrap_or_default().to_string(),
        length: el.attr("length").map(str::to_string),
    });

    Some(FeedItem {
        title,
        link: item.child_text("link").unwrap_or_default(),
        pub_date: item
            .child_text("pubDate")
            .or_else(|| item.child_text("dc:date"))
            .unwrap_or_default(),
        author: item
            .child_text("author")
            .or_else(|| item.child_text("dc:creator")),
        categories: item
            .children("category")
            .map(|el| el.text_value().into_text())
            .filter(|text| !text.is_empty())
            .collect(),
        guid: item.child_text("guid"),
        content,
        enclosure,
        description,
    })
}

// ============================================================================
// Atom 1.0
// ============================================================================

fn parse_atom(root: &Element) -> ParsedFeed {
    let items: Vec<FeedItem> = root.children("entry").filter_map(parse_atom_entry).collect();

    ParsedFeed {
        title: text_construct(root.child("title")),
        description: text_construct(root.child("subtitle")),
        link: primary_link(root),
        language: root
            .attr("xml:lang")
            .filter(|lang| !lang.is_empty())
            .map(str::to_string),
        feed_type: FeedType::Atom,
        items,
    }
}

fn parse_atom_entry(entry: &Element) -> Option<FeedItem> {
    let title = Some(text_construct(entry.child("title"))).filter(|t| !t.is_empty())?;

    let enclosure = entry
        .children("link")
        .find(|link| link.attr("rel") == Some("enclosure"))
        .map(|link| Enclosure {
            url: link.attr("href").unwrap_or_default().to_string(),
            mime_type: link.attr("type").unwrap_or_default().to_string(),
            length: link.attr("length").map(str::to_string),
        });

    let content = Some(text_construct(entry.child("content"))).filter(|c| !c.is_empty());

    Some(FeedItem {
        title,
        link: primary_link(entry),
        description: text_construct(entry.child("summary")),
        pub_date: entry
            .child_text("published")
            .or_else(|| entry.child_text("updated"))
            .unwrap_or_default(),
        author: entry
            .child("author")
            .and_then(|author| author.child_text("name")),
        categories: entry
            .children("category")
            .filter_map(|el| el.attr("term"))
            .filter(|term| !term.is_empty())
            .map(str::to_string)
            .collect(),
        guid: entry.child_text("id"),
        content,
        enclosure,
    })
}

/// Resolves an Atom text construct to plain text.
///
/// `type="xhtml"` content is kept as markup: the wrapping `<div>` is dropped
/// and its children are serialized back to XHTML.
fn text_construct(element: Option<&Element>) -> String {
    let Some(element) = element else {
        return String::new();
    };

    if element.attr("type") == Some("xhtml") {
        return match element.child("div") {
            Some(div) => div.inner_xml(),
            None => element.inner_xml(),
        };
    }

    element.text_value().into_text()
}

/// `rel="alternate"` link, else the first link, else empty.
fn primary_link(parent: &Element) -> String {
    parent
        .children("link")
        .find(|link| link.attr("rel") == Some("alternate"))
        .or_else(|| parent.child("link"))
        .and_then(|link| link.attr("href"))
        .unwrap_or_default()
        .to_string()
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    const RSS: &str = r#"<?xml version="1.0" encoding="UTF-8"?>
<rss version="2.0" xmlns:dc="http://purl.org/dc/elements/1.1/" xmlns:content="http://purl.org/rss/1.0/modules/content/">
  <channel>
    <title>Example Blog</title>
    <link>https://example.com</link>
    <description>Posts about things</description>
    <language>en-us</language>
    <item>
      <title>First post</title>
      <link>https://example.com/1</link>
      <description>Short &amp; sweet</description>
      <pubDate>Mon, 01 Jan 2024 10:00:00 GMT</pubDate>
      <dc:creator>Ada</dc:creator>
      <guid isPermaLink="false">post-1</guid>
      <content:encoded><![CDATA[<p>Full body</p>]]></content:encoded>
      <category>rust</category>
      <category domain="x">feeds</category>
      <enclosure url="https://example.com/a.mp3" type="audio/mpeg" length="1234"/>
      <enclosure url="https://example.com/b.mp3" type="audio/mpeg" length="99"/>
    </item>
    <item>
      <description>no title here</description>
    </item>
    <item>
      <title>Second post</title>
      <author>bob@example.com</author>
      <dc:creator>Bob</dc:creator>
      <description>Only a description</description>
    </item>
  </channel>
</rss>"#;

    const ATOM: &str = r#"<?xml version="1.0" encoding="utf-8"?>
<feed xmlns="http://www.w3.org/2005/Atom" xml:lang="en">
  <title type="text">Atom Site</title>
  <subtitle>All the news</subtitle>
  <link rel="self" href="https://atom.example.com/feed.xml"/>
  <link rel="alternate" href="https://atom.example.com/"/>
  <entry>
    <title>Episode</title>
    <link rel="alternate" href="https://atom.example.com/ep1"/>
    <link rel="enclosure" href="https://cdn.example.com/ep1.mp3" type="audio/mpeg" length="5000"/>
    <id>urn:uuid:1</id>
    <updated>2024-02-01T00:00:00Z</updated>
    <author><name>Grace</name></author>
    <summary type="html">&lt;b&gt;Sum&lt;/b&gt;</summary>
    <content type="html"><![CDATA[<p>Body</p>]]></content>
    <category term="podcast"/>
    <category term="tech" label="Technology"/>
  </entry>
  <entry>
    <summary>untitled entry</summary>
  </entry>
</feed>"#;

    #[test]
    fn test_rss_channel_fields() {
        let feed = parse(RSS).unwrap();
        assert_eq!(feed.feed_type, FeedType::Rss);
        assert_eq!(feed.title, "Example Blog");
        assert_eq!(feed.link, "https://example.com");
        assert_eq!(feed.description, "Posts about things");
        assert_eq!(feed.language.as_deref(), Some("en-us"));
    }

    #[test]
    fn test_rss_item_fields() {
        let feed = parse(RSS).unwrap();
        let item = &feed.items[0];
        assert_eq!(item.title, "First post");
        assert_eq!(item.description, "Short & sweet");
        assert_eq!(item.pub_date, "Mon, 01 Jan 2024 10:00:00 GMT");
        assert_eq!(item.author.as_deref(), Some("Ada"));
        assert_eq!(item.guid.as_deref(), Some("post-1"));
        assert_eq!(item.content.as_deref(), Some("<p>Full body</p>"));
        assert_eq!(item.categories, vec!["rust", "feeds"]);
        assert_eq!(
            item.enclosure,
            Some(Enclosure {
                url: "https://example.com/a.mp3".to_string(),
                mime_type: "audio/mpeg".to_string(),
                length: Some("1234".to_string()),
            })
        );
    }

    #[test]
    fn test_rss_untitled_items_dropped() {
        let feed = parse(RSS).unwrap();
        assert_eq!(feed.items.len(), 2);
        assert_eq!(feed.items[1].title, "Second post");
    }

    #[test]
    fn test_rss_author_precedence_and_content_fallback() {
        let feed = parse(RSS).unwrap();
        let item = &feed.items[1];
        assert_eq!(item.author.as_deref(), Some("bob@example.com"));
        assert_eq!(item.content.as_deref(), Some("Only a description"));
        assert_eq!(item.link, "");
        assert_eq!(item.pub_date, "");
        assert!(item.categories.is_empty());
        assert!(item.enclosure.is_none());
    }

    #[test]
    fn test_rss_single_item_and_no_items() {
        let single = parse(
            "<rss><channel><title>T</title><item><title>Only</title></item></channel></rss>",
        )
        .unwrap();
        assert_eq!(single.items.len(), 1);

        let none = parse("<rss><channel><title>T</title></channel></rss>").unwrap();
        assert!(none.items.is_empty());

        let no_channel = parse("<rss version=\"2.0\"/>").unwrap();
        assert!(no_channel.items.is_empty());
        assert_eq!(no_channel.title, "");
    }

    #[test]
    fn test_rss_plain_content_and_dc_date() {
        let feed = parse(
            "<rss><channel><item><title>T</title><content>inline</content>\
             <dc:date>2024-01-01T00:00:00Z</dc:date></item></channel></rss>",
        )
        .unwrap();
        assert_eq!(feed.items[0].content.as_deref(), Some("inline"));
        assert_eq!(feed.items[0].pub_date, "2024-01-01T00:00:00Z");
    }

    #[test]
    fn test_rss_ignores_atom_self_link() {
        let feed = parse(
            r#"<rss><channel><atom:link href="https://self" rel="self"/><link>https://site</link></channel></rss>"#,
        )
        .unwrap();
        assert_eq!(feed.link, "https://site");
    }

    #[test]
    fn test_atom_feed_fields() {
        let feed = parse(ATOM).unwrap();
        assert_eq!(feed.feed_type, FeedType::Atom);
        assert_eq!(feed.title, "Atom Site");
        assert_eq!(feed.description, "All the news");
        assert_eq!(feed.link, "https://atom.example.com/");
        assert_eq!(feed.language.as_deref(), Some("en"));
    }

    #[test]
    fn test_atom_entry_fields() {
        let feed = parse(ATOM).unwrap();
        assert_eq!(feed.items.len(), 1);
        let item = &feed.items[0];
        assert_eq!(item.title, "Episode");
        assert_eq!(item.link, "https://atom.example.com/ep1");
        assert_eq!(item.guid.as_deref(), Some("urn:uuid:1"));
        assert_eq!(item.pub_date, "2024-02-01T00:00:00Z");
        assert_eq!(item.author.as_deref(), Some("Grace"));
        assert_eq!(item.description, "<b>Sum</b>");
        assert_eq!(item.content.as_deref(), Some("<p>Body</p>"));
        assert_eq!(item.categories, vec!["podcast", "tech"]);
        let enclosure = item.enclosure.as_ref().unwrap();
        assert_eq!(enclosure.url, "https://cdn.example.com/ep1.mp3");
        assert_eq!(enclosure.mime_type, "audio/mpeg");
        assert_eq!(enclosure.length.as_deref(), Some("5000"));
    }

    #[test]
    fn test_atom_link_fallbacks() {
        let first_only = parse(
            r#"<feed><entry><title>A</title><link rel="related" href="https://first"/><link rel="via" href="https://second"/></entry></feed>"#,
        )
        .unwrap();
        assert_eq!(first_only.items[0].link, "https://first");
        assert!(first_only.items[0].enclosure.is_none());

        let no_link = parse("<feed><entry><title>A</title></entry></feed>").unwrap();
        assert_eq!(no_link.items[0].link, "");
        assert_eq!(no_link.link, "");
    }

    #[test]
    fn test_atom_published_preferred_over_updated() {
        let feed = parse(
            "<feed><entry><title>A</title><updated>2024-02-02T00:00:00Z</updated>\
             <published>2024-01-01T00:00:00Z</published></entry></feed>",
        )
        .unwrap();
        assert_eq!(feed.items[0].pub_date, "2024-01-01T00:00:00Z");
    }

    #[test]
    fn test_atom_author_without_name() {
        let feed = parse(
            "<feed><entry><title>A</title><author><email>a@b.c</email></author></entry></feed>",
        )
        .unwrap();
        assert_eq!(feed.items[0].author, None);
    }

    #[test]
    fn test_atom_xhtml_content() {
        let feed = parse(
            r#"<feed xmlns="http://www.w3.org/2005/Atom"><entry><title>X</title>
<content type="xhtml"><div xmlns="http://www.w3.org/1999/xhtml"><p>Hello <em>there</em></p></div></content>
</entry></feed>"#,
        )
        .unwrap();
        assert_eq!(
            feed.items[0].content.as_deref(),
            Some("<p>Hello <em>there</em></p>")
        );
    }

    #[test]
    fn test_unsupported_root() {
        let err = parse("<opml version=\"2.0\"><body/></opml>").unwrap_err();
        assert!(matches!(err, ParseError::UnsupportedFormat(ref root) if root == "opml"));
    }

    #[test]
    fn test_prefixed_atom_root_rejected() {
        let doc = r#"<atom:feed xmlns:atom="http://www.w3.org/2005/Atom">
  <atom:title>Prefixed</atom:title>
  <atom:entry><atom:title>Entry</atom:title></atom:entry>
</atom:feed>"#;
        let err = parse(doc).unwrap_err();
        assert!(matches!(err, ParseError::UnsupportedFormat(ref root) if root == "atom:feed"));
    }

    #[test]
    fn test_malformed_xml() {
        assert!(matches!(parse("<not valid xml"), Err(ParseError::Xml(_))));
        assert!(matches!(
            parse("<rss><channel><item></channel></rss>"),
            Err(ParseError::Xml(_))
        ));
    }
}
