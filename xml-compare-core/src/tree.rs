use std::fmt::{self, Display, Formatter};

use quick_xml::escape::{escape, partial_escape};
use serde::Serialize;
use thiserror::Error;

/// Namespace URI bound to the reserved `xml` prefix.
pub const XML_NS: &str = "http://www.w3.org/XML/1998/namespace";
/// Namespace URI of the `xsi` schema-instance attributes.
pub const XSI_NS: &str = "http://www.w3.org/2001/XMLSchema-instance";

/// Kind of an [`XmlNode`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum NodeKind {
    Document,
    DocumentType,
    Element,
    Text,
    CData,
    Comment,
    ProcessingInstruction,
}

impl NodeKind {
    /// Text and CDATA sections carry the same kind of character data.
    pub fn is_character_data(self) -> bool {
        matches!(self, NodeKind::Text | NodeKind::CData)
    }

    /// Whether nodes of this kind may have children.
    pub fn has_children(self) -> bool {
        matches!(self, NodeKind::Document | NodeKind::Element)
    }

    /// Whether two kinds can be paired against each other at all.
    pub fn is_compatible_with(self, other: NodeKind) -> bool {
        self == other || (self.is_character_data() && other.is_character_data())
    }
}

impl Display for NodeKind {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        let name = match self {
            NodeKind::Document => "document",
            NodeKind::DocumentType => "doctype",
            NodeKind::Element => "element",
            NodeKind::Text => "text",
            NodeKind::CData => "cdata",
            NodeKind::Comment => "comment",
            NodeKind::ProcessingInstruction => "processing instruction",
        };
        f.write_str(name)
    }
}

/// A namespace-qualified name.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize)]
pub struct QName {
    pub local: String,
    pub namespace: Option<String>,
    pub prefix: Option<String>,
}

impl QName {
    /// A name in no namespace.
    pub fn local(local: impl Into<String>) -> Self {
        Self {
            local: local.into(),
            namespace: None,
            prefix: None,
        }
    }

    /// A name bound to `namespace`, written with `prefix` (if any).
    pub fn namespaced(
        local: impl Into<String>,
        namespace: impl Into<String>,
        prefix: Option<&str>,
    ) -> Self {
        Self {
            local: local.into(),
            namespace: Some(namespace.into()),
            prefix: prefix.map(ToString::to_string),
        }
    }

    /// Identity of the name ignoring the prefix used to write it.
    pub fn same_expanded_name(&self, other: &QName) -> bool {
        self.local == other.local && self.namespace == other.namespace
    }
}

impl Display for QName {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        match &self.prefix {
            Some(prefix) => write!(f, "{prefix}:{}", self.local),
            None => f.write_str(&self.local),
        }
    }
}

/// One attribute of an element.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Attribute {
    pub name: QName,
    pub value: String,
}

impl Attribute {
    pub fn new(name: QName, value: impl Into<String>) -> Self {
        Self {
            name,
            value: value.into(),
        }
    }
}

/// Error raised when the value of a node cannot be read.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("node value is unreadable: {reason}")]
pub struct AccessError {
    pub reason: String,
}

/// Character content of a node.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "state", content = "value", rename_all = "snake_case")]
pub enum NodeValue {
    Empty,
    Text(String),
    /// The tree builder could not materialize the value.
    Unreadable(String),
}

/// Data from the `<?xml ...?>` declaration.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct XmlDeclaration {
    pub version: Option<String>,
    pub encoding: Option<String>,
    pub standalone: Option<bool>,
}

/// Identifiers of a `<!DOCTYPE>` node.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct DocTypeInfo {
    pub public_id: Option<String>,
    pub system_id: Option<String>,
}

/// A generic, read-only XML tree node.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct XmlNode {
    pub kind: NodeKind,
    /// Element name, processing-instruction target or doctype name.
    pub name: Option<QName>,
    pub value: NodeValue,
    /// Attributes in declaration order.
    pub attributes: Vec<Attribute>,
    pub children: Vec<XmlNode>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub declaration: Option<XmlDeclaration>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub doctype: Option<DocTypeInfo>,
}

impl XmlNode {
    fn bare(kind: NodeKind) -> Self {
        Self {
            kind,
            name: None,
            value: NodeValue::Empty,
            attributes: Vec::new(),
            children: Vec::new(),
            declaration: None,
            doctype: None,
        }
    }

    /// Create an empty document node.
    pub fn document() -> Self {
        Self::bare(NodeKind::Document)
    }

    /// Create an element with no namespace, attributes or children.
    pub fn new(tag: impl Into<String>) -> Self {
        Self::element(QName::local(tag))
    }

    /// Create an element with a fully qualified name.
    pub fn element(name: QName) -> Self {
        Self {
            name: Some(name),
            ..Self::bare(NodeKind::Element)
        }
    }

    pub fn text(text: impl Into<String>) -> Self {
        Self {
            value: NodeValue::Text(text.into()),
            ..Self::bare(NodeKind::Text)
        }
    }

    pub fn cdata(text: impl Into<String>) -> Self {
        Self {
            value: NodeValue::Text(text.into()),
            ..Self::bare(NodeKind::CData)
        }
    }

    pub fn comment(text: impl Into<String>) -> Self {
        Self {
            value: NodeValue::Text(text.into()),
            ..Self::bare(NodeKind::Comment)
        }
    }

    pub fn processing_instruction(target: impl Into<String>, data: impl Into<String>) -> Self {
        Self {
            name: Some(QName::local(target)),
            value: NodeValue::Text(data.into()),
            ..Self::bare(NodeKind::ProcessingInstruction)
        }
    }

    pub fn doctype(name: impl Into<String>, info: DocTypeInfo) -> Self {
        Self {
            name: Some(QName::local(name)),
            doctype: Some(info),
            ..Self::bare(NodeKind::DocumentType)
        }
    }

    /// Builder-style helper appending an attribute in no namespace.
    pub fn with_attribute(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        self.attributes.push(Attribute::new(QName::local(name), value));
        self
    }

    /// Builder-style helper appending a child node.
    pub fn with_child(mut self, child: XmlNode) -> Self {
        self.children.push(child);
        self
    }

    /// Builder-style helper appending a text child.
    pub fn with_text(self, text: impl Into<String>) -> Self {
        self.with_child(XmlNode::text(text))
    }

    /// Local name of the node, if it has one.
    pub fn local_name(&self) -> Option<&str> {
        self.name.as_ref().map(|name| name.local.as_str())
    }

    /// Read the character value of the node.
    pub fn value(&self) -> Result<Option<&str>, AccessError> {
        match &self.value {
            NodeValue::Empty => Ok(None),
            NodeValue::Text(text) => Ok(Some(text)),
            NodeValue::Unreadable(reason) => Err(AccessError {
                reason: reason.clone(),
            }),
        }
    }

    /// Return the attribute matching `name` by local name and namespace.
    pub fn attribute(&self, name: &QName) -> Option<&Attribute> {
        self.attributes
            .iter()
            .find(|attr| attr.name.same_expanded_name(name))
    }

    /// Return the value of an un-namespaced attribute.
    pub fn attribute_value(&self, local: &str) -> Option<&str> {
        self.attributes
            .iter()
            .find(|attr| attr.name.namespace.is_none() && attr.name.local == local)
            .map(|attr| attr.value.as_str())
    }

    /// The first element child, used as the document element of a document node.
    pub fn root_element(&self) -> Option<&XmlNode> {
        self.children
            .iter()
            .find(|child| child.kind == NodeKind::Element)
    }

    /// Return the first element child with the provided local name.
    pub fn get_child(&self, tag: &str) -> Option<&XmlNode> {
        self.children
            .iter()
            .find(|child| child.kind == NodeKind::Element && child.local_name() == Some(tag))
    }

    /// Return all element children with the provided local name.
    pub fn get_children(&self, tag: &str) -> Vec<&XmlNode> {
        self.children
            .iter()
            .filter(|child| child.kind == NodeKind::Element && child.local_name() == Some(tag))
            .collect()
    }

    /// Concatenated value of the direct text and CDATA children.
    pub fn merged_text(&self) -> Result<String, AccessError> {
        let mut out = String::new();
        for child in &self.children {
            if child.kind.is_character_data() {
                if let Some(text) = child.value()? {
                    out.push_str(text);
                }
            }
        }
        Ok(out)
    }

    /// The doctype child of a document node.
    pub fn doctype_node(&self) -> Option<&XmlNode> {
        self.children
            .iter()
            .find(|child| child.kind == NodeKind::DocumentType)
    }
}

impl Display for XmlNode {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        let value = match &self.value {
            NodeValue::Text(text) => text.as_str(),
            NodeValue::Empty | NodeValue::Unreadable(_) => "",
        };
        match self.kind {
            NodeKind::Document => {
                for child in &self.children {
                    write!(f, "{child}")?;
                }
                Ok(())
            }
            NodeKind::DocumentType => {
                write!(f, "<!DOCTYPE {}", self.name.as_ref().map_or("", |n| n.local.as_str()))?;
                if let Some(info) = &self.doctype {
                    match (&info.public_id, &info.system_id) {
                        (Some(public), Some(system)) => {
                            write!(f, " PUBLIC \"{public}\" \"{system}\"")?
                        }
                        (None, Some(system)) => write!(f, " SYSTEM \"{system}\"")?,
                        _ => {}
                    }
                }
                write!(f, ">")
            }
            NodeKind::Text => write!(f, "{}", partial_escape(value)),
            NodeKind::CData => write!(f, "<![CDATA[{value}]]>"),
            NodeKind::Comment => write!(f, "<!--{value}-->"),
            NodeKind::ProcessingInstruction => {
                let target = self.name.as_ref().map_or("", |n| n.local.as_str());
                if value.is_empty() {
                    write!(f, "<?{target}?>")
                } else {
                    write!(f, "<?{target} {value}?>")
                }
            }
            NodeKind::Element => {
                let tag = self.name.as_ref().map(ToString::to_string).unwrap_or_default();
                write!(f, "<{tag}")?;
                for attr in &self.attributes {
                    write!(f, " {}=\"{}\"", attr.name, escape(attr.value.as_str()))?;
                }
                if self.children.is_empty() {
                    return write!(f, "/>");
                }
                write!(f, ">")?;
                for child in &self.children {
                    write!(f, "{child}")?;
                }
                write!(f, "</{tag}>")
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::{NodeKind, NodeValue, QName, XmlNode};

    #[test]
    fn merged_text_joins_text_and_cdata_children() {
        let node = XmlNode::new("root")
            .with_text("a")
            .with_child(XmlNode::new("skip").with_text("x"))
            .with_child(XmlNode::cdata("b"));

        assert_eq!(node.merged_text().expect("readable"), "ab");
    }

    #[test]
    fn unreadable_value_surfaces_as_access_error() {
        let mut node = XmlNode::text("");
        node.value = NodeValue::Unreadable("unknown entity &foo;".to_string());

        let err = node.value().expect_err("value should not be readable");
        assert!(err.to_string().contains("&foo;"));
    }

    #[test]
    fn attribute_lookup_ignores_prefix() {
        let mut node = XmlNode::new("root");
        node.attributes.push(super::Attribute::new(
            QName::namespaced("lang", super::XML_NS, Some("xml")),
            "en",
        ));

        let lookup = QName::namespaced("lang", super::XML_NS, Some("other"));
        assert_eq!(node.attribute(&lookup).map(|a| a.value.as_str()), Some("en"));
    }

    #[test]
    fn display_renders_compact_markup() {
        let node = XmlNode::new("foo")
            .with_attribute("value", "1")
            .with_child(XmlNode::comment(" c "))
            .with_text("bar");

        assert_eq!(node.kind, NodeKind::Element);
        assert_eq!(node.to_string(), "<foo value=\"1\"><!-- c -->bar</foo>");
    }

    #[test]
    fn display_escapes_markup_in_values() {
        let node = XmlNode::new("f")
            .with_attribute("q", r#"a<b & "c""#)
            .with_text("1 < 2 & 3");

        assert_eq!(
            node.to_string(),
            r#"<f q="a&lt;b &amp; &quot;c&quot;">1 &lt; 2 &amp; 3</f>"#
        );
    }
}
