//! Thin helpers over `quick_xml::Writer` shared by the RSS and Atom writers.

use std::io::Cursor;

use quick_xml::events::{BytesCData, BytesDecl, BytesEnd, BytesStart, BytesText, Event};
use quick_xml::Writer;

use super::SerializeError;
use crate::util::xml_safe;

pub(super) struct XmlDoc {
    writer: Writer<Cursor<Vec<u8>>>,
}

impl XmlDoc {
    /// Starts a UTF-8 document with an XML declaration.
    pub fn new() -> Result<Self, SerializeError> {
        let mut doc = Self {
            writer: Writer::new_with_indent(Cursor::new(Vec::new()), b' ', 2),
        };
        doc.emit(Event::Decl(BytesDecl::new("1.0", Some("UTF-8"), None)))?;
        Ok(doc)
    }

    fn emit(&mut self, event: Event<'_>) -> Result<(), SerializeError> {
        self.writer
            .write_event(event)
            .map_err(|e| SerializeError::Xml(e.to_string()))
    }

    /// Opens `<name attr="..">`. Attribute values are escaped.
    pub fn start(&mut self, name: &str, attributes: &[(&str, &str)]) -> Result<(), SerializeError> {
        let element = element(name, attributes);
        self.emit(Event::Start(element))
    }

    pub fn end(&mut self, name: &str) -> Result<(), SerializeError> {
        self.emit(Event::End(BytesEnd::new(name)))
    }

    /// Writes `<name attr=".."/>`.
    pub fn empty(&mut self, name: &str, attributes: &[(&str, &str)]) -> Result<(), SerializeError> {
        let element = element(name, attributes);
        self.emit(Event::Empty(element))
    }

    /// Writes `<name>text</name>` with `& < > " '` escaped.
    pub fn text(&mut self, name: &str, text: &str) -> Result<(), SerializeError> {
        self.text_with(name, &[], text)
    }

    pub fn text_with(
        &mut self,
        name: &str,
        attributes: &[(&str, &str)],
        text: &str,
    ) -> Result<(), SerializeError> {
        self.start(name, attributes)?;
        let text = xml_safe(text);
        self.emit(Event::Text(BytesText::new(&text)))?;
        self.end(name)
    }

    /// Writes `<name><![CDATA[text]]></name>`.
    ///
    /// A `]]>` inside `text` would terminate the section early, so it is
    /// split across two adjacent CDATA sections.
    pub fn cdata_with(
        &mut self,
        name: &str,
        attributes: &[(&str, &str)],
        text: &str,
    ) -> Result<(), SerializeError> {
        self.start(name, attributes)?;
        let text = xml_safe(text).replace("]]>", "]]]]><![CDATA[>");
        self.emit(Event::CData(BytesCData::new(text.as_str())))?;
        self.end(name)
    }

    pub fn finish(self) -> Result<String, SerializeError> {
        let bytes = self.writer.into_inner().into_inner();
        String::from_utf8(bytes).map_err(|_| SerializeError::InvalidUtf8)
    }
}

fn element<'a>(name: &'a str, attributes: &[(&str, &str)]) -> BytesStart<'a> {
    let mut element = BytesStart::new(name);
    for &(key, value) in attributes {
        element.push_attribute((key, &*xml_safe(value)));
    }
    element
}
