use std::fs;
use std::path::Path;

use quick_xml::events::{BytesDecl, BytesStart, Event};
use quick_xml::Reader;
use thiserror::Error;

use crate::tree::{
    Attribute, DocTypeInfo, NodeKind, NodeValue, QName, XmlDeclaration, XmlNode, XML_NS,
};

/// Errors that can occur while parsing XML into an [`XmlNode`] tree.
#[derive(Debug, Error)]
pub enum ParseError {
    /// Input XML could not be decoded or tokenized.
    #[error("failed to parse XML: {0}")]
    Xml(#[from] quick_xml::Error),
    /// Input bytes were not valid UTF-8 for tag/attribute/text extraction.
    #[error("invalid UTF-8 while parsing XML: {0}")]
    Utf8(#[from] std::str::Utf8Error),
    /// Failed to decode an attribute value.
    #[error("failed to decode XML text: {0}")]
    Escape(#[from] quick_xml::escape::EscapeError),
    /// Failed to read input file.
    #[error("failed to read XML file: {0}")]
    Io(#[from] std::io::Error),
    /// Structural issue in XML document.
    #[error("malformed XML: {0}")]
    Malformed(String),
}

/// Controls how the event stream is turned into a tree.
#[derive(Debug, Clone, Default)]
pub struct ParseOptions {
    /// Keep text nodes that consist only of whitespace.
    pub keep_whitespace: bool,
}

/// Parse XML bytes into a document [`XmlNode`].
pub fn parse(xml: &[u8]) -> Result<XmlNode, ParseError> {
    parse_with_options(xml, &ParseOptions::default())
}

/// Parse an XML file into a document [`XmlNode`].
pub fn parse_file(path: &Path) -> Result<XmlNode, ParseError> {
    let bytes = fs::read(path)?;
    parse(&bytes)
}

/// Parse XML bytes with explicit options.
pub fn parse_with_options(xml: &[u8], opts: &ParseOptions) -> Result<XmlNode, ParseError> {
    let mut reader = Reader::from_reader(xml);
    reader.config_mut().trim_text(false);

    let mut buf = Vec::new();
    let mut stack: Vec<XmlNode> = vec![XmlNode::document()];
    let mut scopes = NamespaceScopes::default();

    loop {
        match reader.read_event_into(&mut buf)? {
            Event::Start(e) => {
                let node = build_element(&e, &reader, &mut scopes)?;
                stack.push(node);
            }
            Event::Empty(e) => {
                let node = build_element(&e, &reader, &mut scopes)?;
                scopes.pop();
                attach(&mut stack, node)?;
            }
            Event::End(_) => {
                if stack.len() < 2 {
                    return Err(ParseError::Malformed(
                        "encountered closing tag without open tag".to_string(),
                    ));
                }
                let node = stack.pop().ok_or_else(|| {
                    ParseError::Malformed("encountered closing tag without open tag".to_string())
                })?;
                scopes.pop();
                attach(&mut stack, node)?;
            }
            Event::Text(e) => {
                if stack.len() < 2 {
                    // Character data outside the document element is insignificant.
                    buf.clear();
                    continue;
                }
                let value = match e.unescape() {
                    Ok(text) => {
                        if !opts.keep_whitespace && text.trim().is_empty() {
                            buf.clear();
                            continue;
                        }
                        NodeValue::Text(text.into_owned())
                    }
                    Err(err) => NodeValue::Unreadable(err.to_string()),
                };
                push_text(&mut stack, NodeKind::Text, value);
            }
            Event::CData(e) => {
                let text = std::str::from_utf8(&e)?.to_string();
                push_text(&mut stack, NodeKind::CData, NodeValue::Text(text));
            }
            Event::Comment(e) => {
                let text = std::str::from_utf8(&e)?;
                attach(&mut stack, XmlNode::comment(text))?;
            }
            Event::PI(e) => {
                let raw = std::str::from_utf8(&e)?;
                let (target, data) = split_processing_instruction(raw);
                attach(&mut stack, XmlNode::processing_instruction(target, data))?;
            }
            Event::Decl(e) => {
                let declaration = read_declaration(&e)?;
                if let Some(document) = stack.first_mut() {
                    document.declaration = Some(declaration);
                }
            }
            Event::DocType(e) => {
                let raw = std::str::from_utf8(&e)?;
                attach(&mut stack, parse_doctype(raw)?)?;
            }
            Event::Eof => break,
        }
        buf.clear();
    }

    if stack.len() != 1 {
        return Err(ParseError::Malformed(
            "unclosed element(s) at end of document".to_string(),
        ));
    }

    let document = stack
        .pop()
        .ok_or_else(|| ParseError::Malformed("no document node".to_string()))?;
    if document.root_element().is_none() {
        return Err(ParseError::Malformed("no root element found".to_string()));
    }
    Ok(document)
}

fn attach(stack: &mut [XmlNode], node: XmlNode) -> Result<(), ParseError> {
    let parent = stack
        .last_mut()
        .ok_or_else(|| ParseError::Malformed("node without parent".to_string()))?;
    if parent.kind == NodeKind::Document
        && node.kind == NodeKind::Element
        && parent.root_element().is_some()
    {
        return Err(ParseError::Malformed(
            "multiple top-level elements found".to_string(),
        ));
    }
    parent.children.push(node);
    Ok(())
}

/// Append character data, merging it into a preceding node of the same kind.
fn push_text(stack: &mut [XmlNode], kind: NodeKind, value: NodeValue) {
    let Some(parent) = stack.last_mut() else {
        return;
    };
    if let Some(last) = parent.children.last_mut() {
        if last.kind == kind {
            last.value = match (std::mem::replace(&mut last.value, NodeValue::Empty), value) {
                (NodeValue::Text(mut existing), NodeValue::Text(more)) => {
                    existing.push_str(&more);
                    NodeValue::Text(existing)
                }
                (NodeValue::Unreadable(reason), _) | (_, NodeValue::Unreadable(reason)) => {
                    NodeValue::Unreadable(reason)
                }
                (NodeValue::Empty, other) | (other, NodeValue::Empty) => other,
            };
            return;
        }
    }
    let mut node = match kind {
        NodeKind::CData => XmlNode::cdata(""),
        _ => XmlNode::text(""),
    };
    node.value = value;
    parent.children.push(node);
}

/// Prefix bindings of the currently open elements.
#[derive(Default)]
struct NamespaceScopes {
    scopes: Vec<Vec<(Option<String>, String)>>,
}

impl NamespaceScopes {
    fn push(&mut self, bindings: Vec<(Option<String>, String)>) {
        self.scopes.push(bindings);
    }

    fn pop(&mut self) {
        self.scopes.pop();
    }

    fn resolve(&self, prefix: Option<&str>) -> Option<&str> {
        if prefix == Some("xml") {
            return Some(XML_NS);
        }
        self.scopes
            .iter()
            .rev()
            .flat_map(|scope| scope.iter().rev())
            .find(|(bound, _)| bound.as_deref() == prefix)
            .map(|(_, uri)| uri.as_str())
            .filter(|uri| !uri.is_empty())
    }
}

fn build_element(
    e: &BytesStart<'_>,
    reader: &Reader<&[u8]>,
    scopes: &mut NamespaceScopes,
) -> Result<XmlNode, ParseError> {
    let mut bindings = Vec::new();
    let mut raw_attributes = Vec::new();

    for attr in e.attributes() {
        let attr = attr.map_err(quick_xml::Error::from)?;
        let key = std::str::from_utf8(attr.key.as_ref())?.to_string();
        let value = attr
            .decode_and_unescape_value(reader.decoder())?
            .into_owned();
        if key == "xmlns" {
            bindings.push((None, value));
        } else if let Some(prefix) = key.strip_prefix("xmlns:") {
            bindings.push((Some(prefix.to_string()), value));
        } else {
            raw_attributes.push((key, value));
        }
    }
    scopes.push(bindings);

    let tag = std::str::from_utf8(e.name().as_ref())?.to_string();
    let (prefix, local) = split_qname(&tag);
    let name = match scopes.resolve(prefix) {
        Some(uri) => QName::namespaced(local, uri, prefix),
        None if prefix.is_some() => {
            return Err(ParseError::Malformed(format!(
                "unbound namespace prefix in element '{tag}'"
            )))
        }
        None => QName::local(local),
    };

    let mut node = XmlNode::element(name);
    for (key, value) in raw_attributes {
        let (prefix, local) = split_qname(&key);
        let name = match prefix {
            None => QName::local(local),
            Some(p) => {
                let uri = scopes.resolve(Some(p)).ok_or_else(|| {
                    ParseError::Malformed(format!("unbound namespace prefix in attribute '{key}'"))
                })?;
                QName::namespaced(local, uri, Some(p))
            }
        };
        node.attributes.push(Attribute::new(name, value));
    }

    Ok(node)
}

fn split_qname(raw: &str) -> (Option<&str>, &str) {
    match raw.split_once(':') {
        Some((prefix, local)) => (Some(prefix), local),
        None => (None, raw),
    }
}

fn split_processing_instruction(raw: &str) -> (&str, &str) {
    let raw = raw.trim_start();
    match raw.find(char::is_whitespace) {
        Some(idx) => (&raw[..idx], raw[idx..].trim_start()),
        None => (raw, ""),
    }
}

fn read_declaration(e: &BytesDecl<'_>) -> Result<XmlDeclaration, ParseError> {
    let version = std::str::from_utf8(&e.version()?)?.to_string();
    let encoding = match e.encoding() {
        Some(raw) => Some(std::str::from_utf8(&raw?)?.to_string()),
        None => None,
    };
    let standalone = match e.standalone() {
        Some(raw) => Some(std::str::from_utf8(&raw?)? == "yes"),
        None => None,
    };
    Ok(XmlDeclaration {
        version: Some(version),
        encoding,
        standalone,
    })
}

/// Parse the body of `<!DOCTYPE ...>`: name and external identifiers.
fn parse_doctype(raw: &str) -> Result<XmlNode, ParseError> {
    // The internal subset carries no identifiers.
    let head = raw.split('[').next().unwrap_or_default().trim();
    let mut rest = head;

    let name_end = rest.find(char::is_whitespace).unwrap_or(rest.len());
    let name = &rest[..name_end];
    if name.is_empty() {
        return Err(ParseError::Malformed("doctype without name".to_string()));
    }
    rest = rest[name_end..].trim_start();

    let mut info = DocTypeInfo::default();
    if let Some(after) = rest.strip_prefix("PUBLIC") {
        let (public_id, after) = quoted(after)?;
        let (system_id, _) = quoted(after)?;
        info.public_id = Some(public_id.to_string());
        info.system_id = Some(system_id.to_string());
    } else if let Some(after) = rest.strip_prefix("SYSTEM") {
        let (system_id, _) = quoted(after)?;
        info.system_id = Some(system_id.to_string());
    }

    Ok(XmlNode::doctype(name, info))
}

fn quoted(input: &str) -> Result<(&str, &str), ParseError> {
    let input = input.trim_start();
    let quote = input
        .chars()
        .next()
        .filter(|c| *c == '"' || *c == '\'')
        .ok_or_else(|| ParseError::Malformed("expected quoted doctype identifier".to_string()))?;
    let body = &input[1..];
    let end = body
        .find(quote)
        .ok_or_else(|| ParseError::Malformed("unterminated doctype identifier".to_string()))?;
    Ok((&body[..end], &body[end + 1..]))
}
