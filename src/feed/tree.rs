//! Minimal element tree over `quick-xml` events.
//!
//! Feed dialects leave a lot to chance: an element that usually repeats may
//! appear once or not at all, and a text field may or may not carry
//! attributes. The tree keeps every child in document order so callers ask
//! for "the first `x`" or "every `x`" and never see that difference.
use std::borrow::Cow;

use quick_xml::escape::escape;
use quick_xml::events::{BytesStart, Event};
use quick_xml::Reader;

use super::parser::ParseError;

/// Maximum element nesting accepted before a document is rejected.
/// Guards the recursive helpers below against maliciously deep input.
pub const MAX_DEPTH: usize = 256;

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Node {
    Element(Element),
    Text(String),
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Element {
    name: String,
    attributes: Vec<(String, String)>,
    children: Vec<Node>,
}

/// A text-bearing field as it appeared in the source.
///
/// `<title>Hi</title>` is [`TextValue::Plain`]; `<guid isPermaLink="false">x</guid>`
/// or `<title type="html">..</title>` is [`TextValue::TextNode`]. Both
/// collapse to the same plain string.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TextValue {
    Plain(String),
    TextNode(String),
}

impl TextValue {
    pub fn into_text(self) -> String {
        match self {
            TextValue::Plain(text) | TextValue::TextNode(text) => text,
        }
    }
}

impl Element {
    /// Parses a whole document and returns its root element.
    ///
    /// # Errors
    ///
    /// [`ParseError::Xml`] for malformed markup (mismatched or unclosed tags,
    /// undefined entities, missing root) and [`ParseError::TooDeep`] when
    /// nesting exceeds [`MAX_DEPTH`].
    pub fn parse_document(raw: &str) -> Result<Element, ParseError> {
        // SEC-002: quick-xml (0.37) never expands <!ENTITY> declarations; only
        // the five predefined entities and character references unescape.
        let mut reader = Reader::from_str(raw);
        reader.config_mut().trim_text(false);

        let mut stack: Vec<Element> = Vec::new();
        let mut root: Option<Element> = None;
        let mut buf = Vec::new();

        loop {
            match reader.read_event_into(&mut buf) {
                Ok(Event::Start(e)) => {
                    let element = Element::from_start(&e, &reader)?;
                    stack.push(element);
                    if stack.len() > MAX_DEPTH {
                        return Err(ParseError::TooDeep(MAX_DEPTH));
                    }
                }
                Ok(Event::Empty(e)) => {
                    let element = Element::from_start(&e, &reader)?;
                    attach(&mut stack, &mut root, element)?;
                }
                Ok(Event::End(_)) => {
                    let element = stack
                        .pop()
                        .ok_or_else(|| ParseError::Xml("unexpected closing tag".to_string()))?;
                    attach(&mut stack, &mut root, element)?;
                }
                Ok(Event::Text(e)) => {
                    if let Some(parent) = stack.last_mut() {
                        let text = e
                            .unescape()
                            .map_err(|err| ParseError::Xml(err.to_string()))?;
                        parent.children.push(Node::Text(text.into_owned()));
                    }
                }
                Ok(Event::CData(e)) => {
                    if let Some(parent) = stack.last_mut() {
                        let text = reader
                            .decoder()
                            .decode(&e)
                            .map_err(|err| ParseError::Xml(err.to_string()))?;
                        parent.children.push(Node::Text(text.into_owned()));
                    }
                }
                Ok(Event::Eof) => break,
                Err(e) => {
                    return Err(ParseError::Xml(format!(
                        "{} at byte {}",
                        e,
                        reader.buffer_position()
                    )))
                }
                _ => {}
            }
            buf.clear();
        }

        if let Some(open) = stack.last() {
            return Err(ParseError::Xml(format!(
                "unexpected end of document: <{}> is not closed",
                open.name
            )));
        }

        root.ok_or_else(|| ParseError::Xml("document has no root element".to_string()))
    }

    fn from_start(e: &BytesStart<'_>, reader: &Reader<&[u8]>) -> Result<Element, ParseError> {
        let decoder = reader.decoder();
        let name = decoder
            .decode(e.name().as_ref())
            .map_err(|err| ParseError::Xml(err.to_string()))?
            .into_owned();

        let mut attributes = Vec::new();
        for attr_result in e.attributes() {
            let attr = attr_result.map_err(|err| ParseError::Xml(err.to_string()))?;
            let key = decoder
                .decode(attr.key.as_ref())
                .map_err(|err| ParseError::Xml(err.to_string()))?
                .into_owned();
            let value = attr
                .decode_and_unescape_value(decoder)
                .map_err(|err| ParseError::Xml(err.to_string()))?
                .into_owned();
            attributes.push((key, value));
        }

        Ok(Element {
            name,
            attributes,
            children: Vec::new(),
        })
    }

    /// Qualified name as written, e.g. `item` or `dc:creator`.
    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn attr(&self, name: &str) -> Option<&str> {
        self.attributes
            .iter()
            .find(|(key, _)| key == name)
            .map(|(_, value)| value.as_str())
    }

    /// First child element named `name`.
    pub fn child(&self, name: &str) -> Option<&Element> {
        self.elements().find(|el| el.name == name)
    }

    /// Every child element named `name`, in document order. Yields nothing
    /// when the element is absent, once for a singleton.
    pub fn children<'a>(&'a self, name: &'a str) -> impl Iterator<Item = &'a Element> + 'a {
        self.elements().filter(move |el| el.name == name)
    }

    fn elements(&self) -> impl Iterator<Item = &Element> {
        self.children.iter().filter_map(|node| match node {
            Node::Element(el) => Some(el),
            Node::Text(_) => None,
        })
    }

    /// Direct text content (text and CDATA children), trimmed.
    pub fn text(&self) -> String {
        let joined: String = self
            .children
            .iter()
            .filter_map(|node| match node {
                Node::Text(text) => Some(text.as_str()),
                Node::Element(_) => None,
            })
            .collect();
        joined.trim().to_string()
    }

    pub fn text_value(&self) -> TextValue {
        if self.attributes.is_empty() && self.elements().next().is_none() {
            TextValue::Plain(self.text())
        } else {
            TextValue::TextNode(self.text())
        }
    }

    /// Text of the first child named `name`, if present and non-empty.
    pub fn child_text(&self, name: &str) -> Option<String> {
        self.child(name)
            .map(|el| el.text_value().into_text())
            .filter(|text| !text.is_empty())
    }

    /// Serializes the children back to markup, escaping text.
    pub fn inner_xml(&self) -> String {
        let mut out = String::new();
        for node in &self.children {
            write_node(node, &mut out);
        }
        out.trim().to_string()
    }
}

fn write_node(node: &Node, out: &mut String) {
    match node {
        Node::Text(text) => out.push_str(&escape(text.as_str())),
        Node::Element(el) => {
            out.push('<');
            out.push_str(&el.name);
            for (key, value) in &el.attributes {
                let value: Cow<'_, str> = escape(value.as_str());
                out.push_str(&format!(" {}=\"{}\"", key, value));
            }
            if el.children.is_empty() {
                out.push_str("/>");
                return;
            }
            out.push('>');
            for child in &el.children {
                write_node(child, out);
            }
            out.push_str("</");
            out.push_str(&el.name);
            out.push('>');
        }
    }
}

fn attach(
    stack: &mut [Element],
    root: &mut Option<Element>,
    element: Element,
) -> Result<(), ParseError> {
    if let Some(parent) = stack.last_mut() {
        parent.children.push(Node::Element(element));
        return Ok(());
    }
    if root.is_some() {
        return Err(ParseError::Xml(format!(
            "unexpected second root element <{}>",
            element.name
        )));
    }
    *root = Some(element);
    Ok(())
}
