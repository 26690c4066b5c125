//! A small ordered XML tree with a quick-xml writer and parser.
//!
//! Names are kept as written (`cbc:ID`), and namespace declarations are plain
//! `xmlns`/`xmlns:*` attributes. Namespace resolution happens only in
//! [`crate::canonical`].

use std::borrow::Cow;
use std::fmt::Display;
use std::io::Write;

use quick_xml::escape::unescape;
use quick_xml::events::{BytesDecl, BytesEnd, BytesStart, BytesText, Event};
use quick_xml::{Reader, Writer};

use crate::error::CoreError;

/// A child of an element.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Node {
    Element(Element),
    Text(String),
}

/// An element with ordered attributes and children.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct Element {
    pub name: String,
    pub attributes: Vec<(String, String)>,
    pub children: Vec<Node>,
}

impl Element {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            ..Default::default()
        }
    }

    /// An element holding a single text node.
    pub fn leaf(name: impl Into<String>, text: impl Into<String>) -> Self {
        Self::new(name).text(text)
    }

    pub fn attr(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.attributes.push((key.into(), value.into()));
        self
    }

    pub fn text(mut self, text: impl Into<String>) -> Self {
        self.children.push(Node::Text(text.into()));
        self
    }

    pub fn child(mut self, element: Element) -> Self {
        self.children.push(Node::Element(element));
        self
    }

    pub fn push(&mut self, element: Element) {
        self.children.push(Node::Element(element));
    }

    /// Value of an attribute by qualified name.
    pub fn attribute(&self, key: &str) -> Option<&str> {
        self.attributes
            .iter()
            .find(|(k, _)| k == key)
            .map(|(_, v)| v.as_str())
    }

    /// Child elements in document order.
    pub fn elements(&self) -> impl Iterator<Item = &Element> {
        self.children.iter().filter_map(|c| match c {
            Node::Element(e) => Some(e),
            Node::Text(_) => None,
        })
    }

    /// First child element with the given qualified name.
    pub fn find(&self, name: &str) -> Option<&Element> {
        self.elements().find(|e| e.name == name)
    }

    /// Follow a path of child names from this element.
    pub fn find_path(&self, path: &[&str]) -> Option<&Element> {
        path.iter().try_fold(self, |el, name| el.find(name))
    }

    /// Concatenated text of the direct text children.
    pub fn text_content(&self) -> String {
        self.children
            .iter()
            .filter_map(|c| match c {
                Node::Text(t) => Some(t.as_str()),
                Node::Element(_) => None,
            })
            .collect()
    }

    /// Encode with an XML declaration and two-space indentation.
    pub fn to_bytes(&self) -> Result<Vec<u8>, CoreError> {
        let mut writer = Writer::new_with_indent(Vec::new(), b' ', 2);
        write_document(&mut writer, self)?;
        Ok(writer.into_inner())
    }

    /// Encode with an XML declaration and no formatting whitespace.
    pub fn to_compact_bytes(&self) -> Result<Vec<u8>, CoreError> {
        let mut writer = Writer::new(Vec::new());
        write_document(&mut writer, self)?;
        Ok(writer.into_inner())
    }

    /// Parse a document into a tree.
    ///
    /// Comments, processing instructions, the declaration and DOCTYPE are
    /// discarded. Text, including whitespace-only text, is kept with line
    /// endings normalized to `\n`; CDATA becomes text.
    pub fn parse(bytes: &[u8]) -> Result<Element, CoreError> {
        let mut reader = Reader::from_reader(bytes);
        let mut buf = Vec::new();
        let mut stack: Vec<Element> = Vec::new();
        let mut root: Option<Element> = None;

        loop {
            match reader.read_event_into(&mut buf).map_err(xml)? {
                Event::Start(e) => stack.push(start_element(&e)?),
                Event::Empty(e) => {
                    let el = start_element(&e)?;
                    attach(&mut stack, &mut root, el)?;
                }
                Event::End(_) => {
                    let el = stack
                        .pop()
                        .ok_or_else(|| CoreError::MalformedXml("unexpected end tag".into()))?;
                    attach(&mut stack, &mut root, el)?;
                }
                Event::Text(t) => {
                    let raw = std::str::from_utf8(&t).map_err(xml)?;
                    let text = unescape(&normalize_newlines(raw)).map_err(xml)?.into_owned();
                    push_text(&mut stack, text)?;
                }
                Event::CData(c) => {
                    let raw = std::str::from_utf8(&c).map_err(xml)?;
                    push_text(&mut stack, normalize_newlines(raw).into_owned())?;
                }
                Event::Eof => break,
                _ => {}
            }
            buf.clear();
        }

        if let Some(open) = stack.last() {
            return Err(CoreError::MalformedXml(format!(
                "element {} is not closed",
                open.name
            )));
        }
        root.ok_or_else(|| CoreError::MalformedXml("document has no root element".into()))
    }
}

fn xml<E: Display>(e: E) -> CoreError {
    CoreError::MalformedXml(e.to_string())
}

fn write_document<W: Write>(writer: &mut Writer<W>, root: &Element) -> Result<(), CoreError> {
    writer
        .write_event(Event::Decl(BytesDecl::new("1.0", Some("UTF-8"), None)))
        .map_err(xml)?;
    write_element(writer, root).map_err(xml)
}

fn write_element<W: Write>(
    writer: &mut Writer<W>,
    el: &Element,
) -> Result<(), quick_xml::Error> {
    let start = BytesStart::new(el.name.as_str()).with_attributes(
        el.attributes
            .iter()
            .map(|(k, v)| (k.as_str(), v.as_str())),
    );

    if el.children.is_empty() {
        return writer.write_event(Event::Empty(start));
    }

    writer.write_event(Event::Start(start))?;
    for child in &el.children {
        match child {
            Node::Element(e) => write_element(writer, e)?,
            Node::Text(t) => writer.write_event(Event::Text(BytesText::new(t)))?,
        }
    }
    writer.write_event(Event::End(BytesEnd::new(el.name.as_str())))
}

fn start_element(e: &BytesStart<'_>) -> Result<Element, CoreError> {
    let name = std::str::from_utf8(e.name().as_ref()).map_err(xml)?.to_string();
    let mut el = Element::new(name);
    for attr in e.attributes() {
        let attr = attr.map_err(xml)?;
        let key = std::str::from_utf8(attr.key.as_ref()).map_err(xml)?.to_string();
        let value = attr.unescape_value().map_err(xml)?.into_owned();
        el.attributes.push((key, value));
    }
    Ok(el)
}

fn attach(
    stack: &mut [Element],
    root: &mut Option<Element>,
    el: Element,
) -> Result<(), CoreError> {
    match stack.last_mut() {
        Some(parent) => parent.push(el),
        None if root.is_none() => *root = Some(el),
        None => {
            return Err(CoreError::MalformedXml(format!(
                "second root element {}",
                el.name
            )))
        }
    }
    Ok(())
}

fn push_text(stack: &mut [Element], text: String) -> Result<(), CoreError> {
    let Some(parent) = stack.last_mut() else {
        if is_xml_whitespace(&text) {
            return Ok(());
        }
        return Err(CoreError::MalformedXml("text outside the root element".into()));
    };
    match parent.children.last_mut() {
        Some(Node::Text(prev)) => prev.push_str(&text),
        _ => parent.children.push(Node::Text(text)),
    }
    Ok(())
}

fn normalize_newlines(raw: &str) -> Cow<'_, str> {
    if raw.contains('\r') {
        Cow::Owned(raw.replace("\r\n", "\n").replace('\r', "\n"))
    } else {
        Cow::Borrowed(raw)
    }
}

/// Whether a string consists only of XML whitespace (space, tab, CR, LF).
pub fn is_xml_whitespace(s: &str) -> bool {
    s.chars().all(|c| matches!(c, ' ' | '\t' | '\r' | '\n'))
}
