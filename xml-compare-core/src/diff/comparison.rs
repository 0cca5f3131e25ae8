use std::fmt::{self, Display, Formatter};

use serde::Serialize;

use crate::tree::{Attribute, NodeKind, QName, XmlNode};

/// Severity of a single comparison, ordered from harmless to fatal.
///
/// `Critical` only lives inside the per-node-pair chain: it stops the remaining
/// comparisons of that pair and is reported as `Different`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ComparisonResult {
    Equal,
    Similar,
    Different,
    Critical,
}

impl ComparisonResult {
    /// The value listeners and results see.
    pub fn reported(self) -> Self {
        match self {
            ComparisonResult::Critical => ComparisonResult::Different,
            other => other,
        }
    }

    pub fn is_critical(self) -> bool {
        self == ComparisonResult::Critical
    }
}

impl Display for ComparisonResult {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        let name = match self {
            ComparisonResult::Equal => "EQUAL",
            ComparisonResult::Similar => "SIMILAR",
            ComparisonResult::Different => "DIFFERENT",
            ComparisonResult::Critical => "CRITICAL",
        };
        f.write_str(name)
    }
}

/// Every atomic fact the engine checks.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum ComparisonKind {
    NodeType,
    ElementTagName,
    NamespaceUri,
    NamespacePrefix,
    ElementNumAttributes,
    /// An attribute present on only one side.
    AttributeNameLookup,
    AttributeValue,
    SchemaLocation,
    NoNamespaceSchemaLocation,
    TextValue,
    CdataValue,
    CommentValue,
    ProcessingInstructionTarget,
    ProcessingInstructionData,
    HasDoctypeDeclaration,
    DoctypeName,
    DoctypePublicId,
    DoctypeSystemId,
    XmlVersion,
    XmlStandalone,
    XmlEncoding,
    ChildNodeListLength,
    /// A child without counterpart on the other side.
    ChildLookup,
}

impl ComparisonKind {
    pub fn description(self) -> &'static str {
        match self {
            ComparisonKind::NodeType => "node type",
            ComparisonKind::ElementTagName => "element tag name",
            ComparisonKind::NamespaceUri => "namespace URI",
            ComparisonKind::NamespacePrefix => "namespace prefix",
            ComparisonKind::ElementNumAttributes => "number of attributes",
            ComparisonKind::AttributeNameLookup => "attribute name",
            ComparisonKind::AttributeValue => "attribute value",
            ComparisonKind::SchemaLocation => "schema location",
            ComparisonKind::NoNamespaceSchemaLocation => "no namespace schema location",
            ComparisonKind::TextValue => "text value",
            ComparisonKind::CdataValue => "CDATA section value",
            ComparisonKind::CommentValue => "comment value",
            ComparisonKind::ProcessingInstructionTarget => "processing instruction target",
            ComparisonKind::ProcessingInstructionData => "processing instruction data",
            ComparisonKind::HasDoctypeDeclaration => "doctype declaration",
            ComparisonKind::DoctypeName => "doctype name",
            ComparisonKind::DoctypePublicId => "doctype public id",
            ComparisonKind::DoctypeSystemId => "doctype system id",
            ComparisonKind::XmlVersion => "xml version",
            ComparisonKind::XmlStandalone => "xml standalone",
            ComparisonKind::XmlEncoding => "xml encoding",
            ComparisonKind::ChildNodeListLength => "child nodelist length",
            ComparisonKind::ChildLookup => "child",
        }
    }
}

impl Display for ComparisonKind {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        f.write_str(self.description())
    }
}

/// The value extracted on one side of a comparison.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "type", content = "value", rename_all = "snake_case")]
pub enum ComparisonValue {
    /// The compared thing does not exist on this side.
    Absent,
    Text(String),
    Name(QName),
    Kind(NodeKind),
    Count(usize),
    Flag(bool),
}

impl ComparisonValue {
    pub fn from_option(value: Option<&str>) -> Self {
        match value {
            Some(text) => ComparisonValue::Text(text.to_string()),
            None => ComparisonValue::Absent,
        }
    }

    pub fn as_text(&self) -> Option<&str> {
        match self {
            ComparisonValue::Text(text) => Some(text),
            _ => None,
        }
    }
}

impl Display for ComparisonValue {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        match self {
            ComparisonValue::Absent => f.write_str("<absent>"),
            ComparisonValue::Text(text) => write!(f, "'{text}'"),
            ComparisonValue::Name(name) => write!(f, "{name}"),
            ComparisonValue::Kind(kind) => write!(f, "{kind}"),
            ComparisonValue::Count(count) => write!(f, "{count}"),
            ComparisonValue::Flag(flag) => write!(f, "{flag}"),
        }
    }
}

/// The node or attribute a detail refers to.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Target<'a> {
    Node(&'a XmlNode),
    Attribute {
        owner: &'a XmlNode,
        attribute: &'a Attribute,
    },
}

/// One side of a [`Comparison`].
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Detail<'a> {
    pub position: Option<String>,
    pub parent_position: Option<String>,
    #[serde(skip)]
    pub target: Option<Target<'a>>,
    /// `None` when the value could not be read.
    pub value: Option<ComparisonValue>,
}

impl<'a> Detail<'a> {
    pub fn new(
        position: String,
        parent_position: String,
        target: Option<Target<'a>>,
        value: Option<ComparisonValue>,
    ) -> Self {
        Self {
            position: Some(position),
            parent_position: Some(parent_position),
            target,
            value,
        }
    }
}

/// One atomic fact checked between a control and a test node.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Comparison<'a> {
    pub kind: ComparisonKind,
    pub control: Detail<'a>,
    pub test: Detail<'a>,
}

impl<'a> Comparison<'a> {
    pub fn new(kind: ComparisonKind, control: Detail<'a>, test: Detail<'a>) -> Self {
        Self {
            kind,
            control,
            test,
        }
    }

    /// Outcome by plain equality; unreadable values never compare equal.
    pub fn initial_outcome(&self) -> ComparisonResult {
        match (&self.control.value, &self.test.value) {
            (Some(control), Some(test)) if control == test => ComparisonResult::Equal,
            _ => ComparisonResult::Different,
        }
    }

    /// Position of the control side, falling back to the test side.
    pub fn position(&self) -> &str {
        self.control
            .position
            .as_deref()
            .or(self.test.position.as_deref())
            .unwrap_or("/")
    }
}

fn describe_value(value: &Option<ComparisonValue>) -> String {
    match value {
        Some(value) => value.to_string(),
        None => "<unreadable>".to_string(),
    }
}

impl Display for Comparison<'_> {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "Expected {} {} but was {} - comparing {} to {}",
            self.kind,
            describe_value(&self.control.value),
            describe_value(&self.test.value),
            self.control
                .position
                .as_deref()
                .or(self.control.parent_position.as_deref())
                .unwrap_or("<none>"),
            self.test
                .position
                .as_deref()
                .or(self.test.parent_position.as_deref())
                .unwrap_or("<none>"),
        )
    }
}

#[cfg(test)]
mod tests {
    use super::{Comparison, ComparisonKind, ComparisonResult, ComparisonValue, Detail};

    fn detail(value: Option<ComparisonValue>) -> Detail<'static> {
        Detail::new("/foo[1]".to_string(), "/".to_string(), None, value)
    }

    #[test]
    fn critical_is_reported_as_different() {
        assert_eq!(
            ComparisonResult::Critical.reported(),
            ComparisonResult::Different
        );
        assert!(ComparisonResult::Equal < ComparisonResult::Similar);
        assert!(ComparisonResult::Similar < ComparisonResult::Different);
    }

    #[test]
    fn unreadable_values_are_never_equal() {
        let comparison = Comparison::new(ComparisonKind::TextValue, detail(None), detail(None));
        assert_eq!(comparison.initial_outcome(), ComparisonResult::Different);
    }

    #[test]
    fn display_mentions_kind_values_and_positions() {
        let comparison = Comparison::new(
            ComparisonKind::TextValue,
            detail(Some(ComparisonValue::Text("bar".to_string()))),
            detail(Some(ComparisonValue::Text("baz".to_string()))),
        );
        assert_eq!(
            comparison.to_string(),
            "Expected text value 'bar' but was 'baz' - comparing /foo[1] to /foo[1]"
        );
    }
}
