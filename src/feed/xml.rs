//! Minimal element tree over `quick-xml` events.
//!
//! Feed documents are small, so the parser first builds a tree and then
//! queries it the way a DOM lookup would (`channel > item > title`). Building
//! the tree is also where well-formedness is enforced: quick-xml checks tag
//! syntax and end-name matching, and this module rejects documents with no
//! root, more than one root, stray text outside the root, or elements left
//! open at end of input.

use quick_xml::events::{BytesStart, Event};
use quick_xml::Reader;
use thiserror::Error;

/// Maximum element nesting depth accepted in a feed document.
const MAX_DEPTH: usize = 64;

#[derive(Debug, Error)]
pub enum XmlError {
    #[error("XML syntax error: {0}")]
    Syntax(#[from] quick_xml::Error),
    #[error("document has no root element")]
    NoRoot,
    #[error("document has more than one root element")]
    MultipleRoots,
    #[error("text outside of the root element")]
    StrayText,
    #[error("unexpected end of document: <{0}> is not closed")]
    Unclosed(String),
    #[error("nesting depth exceeds {0} levels")]
    TooDeep(usize),
}

#[derive(Debug, Clone, Default)]
pub struct Element {
    /// Local name, namespace prefix stripped.
    pub name: String,
    attrs: Vec<(String, String)>,
    children: Vec<Element>,
    text: String,
}

impl Element {
    /// Unescaped, concatenated text and CDATA content directly inside this
    /// element, trimmed.
    pub fn text(&self) -> &str {
        self.text.trim()
    }

    /// Attribute value by local name.
    pub fn attr(&self, name: &str) -> Option<&str> {
        self.attrs
            .iter()
            .find(|(k, _)| k == name)
            .map(|(_, v)| v.as_str())
    }

    /// First direct child with the given local name.
    pub fn child(&self, name: &str) -> Option<&Element> {
        self.children.iter().find(|c| c.name == name)
    }

    /// All direct children with the given local name, in document order.
    pub fn children<'a>(&'a self, name: &'a str) -> impl Iterator<Item = &'a Element> + 'a {
        self.children.iter().filter(move |c| c.name == name)
    }

    /// Text of the first direct child with the given name.
    pub fn child_text(&self, name: &str) -> Option<&str> {
        self.child(name).map(Element::text)
    }
}

/// Parses a complete document into its root element.
pub fn parse_document(content: &str) -> Result<Element, XmlError> {
    // quick-xml 0.37 never expands <!ENTITY> declarations: only the five
    // predefined entities and character references are resolved by unescape().
    // Text is not trimmed per event; `Element::text` trims the joined result.
    let mut reader = Reader::from_str(content);

    let mut stack: Vec<Element> = Vec::new();
    let mut root: Option<Element> = None;

    loop {
        match reader.read_event()? {
            Event::Start(e) => {
                if stack.is_empty() && root.is_some() {
                    return Err(XmlError::MultipleRoots);
                }
                if stack.len() >= MAX_DEPTH {
                    return Err(XmlError::TooDeep(MAX_DEPTH));
                }
                stack.push(open_element(&e, &reader)?);
            }
            Event::Empty(e) => {
                let element = open_element(&e, &reader)?;
                attach(&mut stack, &mut root, element)?;
            }
            Event::End(_) => {
                // End-name matching is checked by quick-xml itself.
                if let Some(element) = stack.pop() {
                    attach(&mut stack, &mut root, element)?;
                }
            }
            Event::Text(e) => {
                let text = e.unescape()?;
                match stack.last_mut() {
                    Some(parent) => parent.text.push_str(&text),
                    None if text.trim().is_empty() => {}
                    None => return Err(XmlError::StrayText),
                }
            }
            Event::CData(e) => match stack.last_mut() {
                Some(parent) => parent.text.push_str(&String::from_utf8_lossy(&e.into_inner())),
                None => return Err(XmlError::StrayText),
            },
            Event::Eof => break,
            // Declarations, comments, processing instructions and DOCTYPE carry no content.
            _ => {}
        }
    }

    if let Some(open) = stack.last() {
        return Err(XmlError::Unclosed(open.name.clone()));
    }
    root.ok_or(XmlError::NoRoot)
}

fn open_element(e: &BytesStart<'_>, reader: &Reader<&[u8]>) -> Result<Element, XmlError> {
    let name = String::from_utf8_lossy(e.local_name().as_ref()).into_owned();
    let mut attrs = Vec::new();
    for attr in e.attributes() {
        let attr = attr.map_err(quick_xml::Error::from)?;
        let key = String::from_utf8_lossy(attr.key.local_name().as_ref()).into_owned();
        let value = attr.decode_and_unescape_value(reader.decoder())?.into_owned();
        attrs.push((key, value));
    }
    Ok(Element {
        name,
        attrs,
        ..Element::default()
    })
}

fn attach(
    stack: &mut [Element],
    root: &mut Option<Element>,
    element: Element,
) -> Result<(), XmlError> {
    match stack.last_mut() {
        Some(parent) => parent.children.push(element),
        None if root.is_some() => return Err(XmlError::MultipleRoots),
        None => *root = Some(element),
    }
    Ok(())
}
