//! The XML sub-format carried inside feature, notes and trace-descriptor
//! payloads.
//!
//! Payloads are read into a small owned element tree. Typed decoders pull
//! the attributes and children they model out of the tree and keep the
//! rest, so re-encoding never drops markup it did not understand.

use quick_xml::events::{BytesEnd, BytesStart, BytesText, Event};
use quick_xml::{Reader, Writer};

use crate::error::{SnapError, SnapResult};

#[cfg(test)]
mod tests;

#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct Element {
    pub name: String,
    pub attrs: Vec<(String, String)>,
    pub children: Vec<Node>,
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub enum Node {
    Element(Element),
    Text(String),
}

/// A parsed payload: optional `<?xml ...?>` declaration plus the root.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct MarkupDoc {
    pub decl: Option<String>,
    pub root: Element,
}

impl Element {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            attrs: Vec::new(),
            children: Vec::new(),
        }
    }

    pub fn attr(&self, key: &str) -> Option<&str> {
        self.attrs
            .iter()
            .find(|(k, _)| k == key)
            .map(|(_, v)| v.as_str())
    }

    pub fn push_attr(&mut self, key: impl Into<String>, value: impl Into<String>) {
        self.attrs.push((key.into(), value.into()));
    }

    pub fn push_child(&mut self, child: Element) {
        self.children.push(Node::Element(child));
    }

    pub fn push_text(&mut self, text: impl Into<String>) {
        self.children.push(Node::Text(text.into()));
    }

    pub fn elements(&self) -> impl Iterator<Item = &Element> {
        self.children.iter().filter_map(|node| match node {
            Node::Element(el) => Some(el),
            Node::Text(_) => None,
        })
    }

    /// Concatenated text children, unescaped.
    pub fn text(&self) -> String {
        let mut out = String::new();
        for node in &self.children {
            if let Node::Text(text) = node {
                out.push_str(text);
            }
        }
        out
    }
}

pub fn parse(bytes: &[u8], segment: &'static str) -> SnapResult<MarkupDoc> {
    let mut reader = Reader::from_reader(bytes);
    let mut buf = Vec::new();
    let mut stack: Vec<Element> = Vec::new();
    let mut root: Option<Element> = None;
    let mut decl = None;

    loop {
        let event = reader
            .read_event_into(&mut buf)
            .map_err(|e| SnapError::markup(segment, e))?;
        match event {
            Event::Decl(d) => {
                let content =
                    std::str::from_utf8(&d).map_err(|e| SnapError::markup(segment, e))?;
                decl = Some(content.to_string());
            }
            Event::Start(start) => stack.push(open_element(&start, segment)?),
            Event::Empty(start) => {
                let el = open_element(&start, segment)?;
                attach(&mut stack, &mut root, el, segment)?;
            }
            Event::End(_) => {
                let el = stack
                    .pop()
                    .ok_or_else(|| SnapError::markup(segment, "unexpected closing tag"))?;
                attach(&mut stack, &mut root, el, segment)?;
            }
            Event::Text(text) => {
                let text = text
                    .unescape()
                    .map_err(|e| SnapError::markup(segment, e))?
                    .into_owned();
                push_text(&mut stack, text, segment)?;
            }
            Event::CData(data) => {
                let text = String::from_utf8(data.into_inner().into_owned())
                    .map_err(|e| SnapError::markup(segment, e))?;
                push_text(&mut stack, text, segment)?;
            }
            Event::Eof => break,
            _ => {}
        }
        buf.clear();
    }

    if !stack.is_empty() {
        return Err(SnapError::markup(segment, "unclosed element at end of input"));
    }
    let root = root.ok_or_else(|| SnapError::markup(segment, "no root element"))?;
    Ok(MarkupDoc { decl, root })
}

pub fn to_bytes(doc: &MarkupDoc) -> SnapResult<Vec<u8>> {
    let mut out = Vec::new();
    if let Some(decl) = &doc.decl {
        out.extend_from_slice(b"<?");
        out.extend_from_slice(decl.as_bytes());
        out.extend_from_slice(b"?>");
    }
    let mut writer = Writer::new(out);
    write_element(&mut writer, &doc.root)?;
    Ok(writer.into_inner())
}

fn open_element(start: &BytesStart<'_>, segment: &'static str) -> SnapResult<Element> {
    let name = std::str::from_utf8(start.name().as_ref())
        .map_err(|e| SnapError::markup(segment, e))?
        .to_string();
    let mut el = Element::new(name);
    for attr in start.attributes() {
        let attr = attr.map_err(|e| SnapError::markup(segment, e))?;
        let key = std::str::from_utf8(attr.key.as_ref())
            .map_err(|e| SnapError::markup(segment, e))?
            .to_string();
        let value = attr
            .unescape_value()
            .map_err(|e| SnapError::markup(segment, e))?
            .into_owned();
        el.attrs.push((key, value));
    }
    Ok(el)
}

fn attach(
    stack: &mut [Element],
    root: &mut Option<Element>,
    el: Element,
    segment: &'static str,
) -> SnapResult<()> {
    if let Some(parent) = stack.last_mut() {
        parent.push_child(el);
        return Ok(());
    }
    if root.is_some() {
        return Err(SnapError::markup(segment, "more than one root element"));
    }
    *root = Some(el);
    Ok(())
}

fn push_text(stack: &mut [Element], text: String, segment: &'static str) -> SnapResult<()> {
    match stack.last_mut() {
        Some(parent) => parent.push_text(text),
        None if text.trim().is_empty() => {}
        None => return Err(SnapError::markup(segment, "text outside the root element")),
    }
    Ok(())
}

fn emit(writer: &mut Writer<Vec<u8>>, event: Event<'_>) -> SnapResult<()> {
    writer
        .write_event(event)
        .map_err(|e| SnapError::markup("output", e))
}

fn write_element(writer: &mut Writer<Vec<u8>>, el: &Element) -> SnapResult<()> {
    let start = BytesStart::new(el.name.as_str())
        .with_attributes(el.attrs.iter().map(|(k, v)| (k.as_str(), v.as_str())));
    if el.children.is_empty() {
        return emit(writer, Event::Empty(start));
    }
    emit(writer, Event::Start(start))?;
    write_nodes(writer, &el.children)?;
    emit(writer, Event::End(BytesEnd::new(el.name.as_str())))
}

fn write_nodes(writer: &mut Writer<Vec<u8>>, nodes: &[Node]) -> SnapResult<()> {
    for node in nodes {
        match node {
            Node::Element(el) => write_element(writer, el)?,
            Node::Text(text) => emit(writer, Event::Text(BytesText::new(text)))?,
        }
    }
    Ok(())
}
