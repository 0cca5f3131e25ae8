//! A small relative path language for selecting representative values of an element.
//!
//! Supported steps, separated by `/`: `name` (child elements by local name), `*`
//! (any child element), `text()` (character data children) and a final `@name`
//! (attribute). A leading `.` or `./` refers to the element itself.

use thiserror::Error;

use crate::tree::{Attribute, NodeKind, XmlNode};

/// Errors raised when a path expression is malformed.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum PathError {
    #[error("path expression is empty")]
    Empty,
    #[error("empty step in path expression '{0}'")]
    EmptyStep(String),
    #[error("attribute step must be the last step in '{0}'")]
    AttributeNotLast(String),
    #[error("unsupported step '{step}' in path expression '{expr}'")]
    Unsupported { expr: String, step: String },
}

#[derive(Debug, Clone, PartialEq, Eq)]
enum Step {
    Child(String),
    AnyChild,
    Text,
    Attribute(String),
}

/// Item selected by a [`PathExpr`].
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Selected<'a> {
    Node(&'a XmlNode),
    Attribute(&'a Attribute),
}

/// A parsed relative path expression.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PathExpr {
    steps: Vec<Step>,
}

impl PathExpr {
    pub fn parse(expr: &str) -> Result<Self, PathError> {
        let trimmed = expr.trim();
        if trimmed.is_empty() {
            return Err(PathError::Empty);
        }
        let body = trimmed
            .strip_prefix("./")
            .or_else(|| (trimmed == ".").then_some(""))
            .unwrap_or(trimmed);

        let mut steps = Vec::new();
        if !body.is_empty() {
            let raw_steps: Vec<&str> = body.split('/').collect();
            for (idx, raw) in raw_steps.iter().enumerate() {
                let raw = raw.trim();
                let step = match raw {
                    "" => return Err(PathError::EmptyStep(trimmed.to_string())),
                    "*" => Step::AnyChild,
                    "text()" => Step::Text,
                    _ if raw.starts_with('@') => {
                        if idx + 1 != raw_steps.len() {
                            return Err(PathError::AttributeNotLast(trimmed.to_string()));
                        }
                        Step::Attribute(valid_name(trimmed, &raw[1..])?)
                    }
                    _ => Step::Child(valid_name(trimmed, raw)?),
                };
                steps.push(step);
            }
        }

        Ok(Self { steps })
    }

    /// Evaluate the expression with `node` as context, in document order.
    pub fn select<'a>(&self, node: &'a XmlNode) -> Vec<Selected<'a>> {
        let mut current = vec![Selected::Node(node)];
        for step in &self.steps {
            let mut next = Vec::new();
            for item in &current {
                let Selected::Node(context) = *item else {
                    continue;
                };
                match step {
                    Step::Child(name) => next.extend(
                        context
                            .children
                            .iter()
                            .filter(|child| {
                                child.kind == NodeKind::Element
                                    && child.local_name() == Some(name.as_str())
                            })
                            .map(Selected::Node),
                    ),
                    Step::AnyChild => next.extend(
                        context
                            .children
                            .iter()
                            .filter(|child| child.kind == NodeKind::Element)
                            .map(Selected::Node),
                    ),
                    Step::Text => next.extend(
                        context
                            .children
                            .iter()
                            .filter(|child| child.kind.is_character_data())
                            .map(Selected::Node),
                    ),
                    Step::Attribute(name) => next.extend(
                        context
                            .attributes
                            .iter()
                            .filter(|attr| attr.name.local == *name)
                            .map(Selected::Attribute),
                    ),
                }
            }
            current = next;
        }
        current
    }
}

fn valid_name(expr: &str, name: &str) -> Result<String, PathError> {
    let local = name.rsplit(':').next().unwrap_or(name);
    let ok = !local.is_empty()
        && local
            .chars()
            .all(|c| c.is_alphanumeric() || matches!(c, '_' | '-' | '.'));
    if ok {
        Ok(local.to_string())
    } else {
        Err(PathError::Unsupported {
            expr: expr.to_string(),
            step: name.to_string(),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::{PathError, PathExpr, Selected};
    use crate::tree::XmlNode;

    fn sample() -> XmlNode {
        XmlNode::new("b")
            .with_child(
                XmlNode::new("c")
                    .with_attribute("id", "1")
                    .with_text("foo"),
            )
            .with_child(XmlNode::new("d").with_text("bar"))
    }

    #[test]
    fn child_and_attribute_steps_select_in_document_order() {
        let node = sample();

        let c = PathExpr::parse("./c").expect("valid");
        assert_eq!(c.select(&node).len(), 1);

        let any = PathExpr::parse("*").expect("valid");
        assert_eq!(any.select(&node).len(), 2);

        let attr = PathExpr::parse("c/@id").expect("valid");
        match attr.select(&node).as_slice() {
            [Selected::Attribute(attr)] => assert_eq!(attr.value, "1"),
            other => panic!("unexpected selection: {other:?}"),
        }

        let text = PathExpr::parse("./d/text()").expect("valid");
        assert_eq!(text.select(&node).len(), 1);
    }

    #[test]
    fn self_reference_selects_context() {
        let node = sample();
        let expr = PathExpr::parse(".").expect("valid");
        assert_eq!(expr.select(&node), vec![Selected::Node(&node)]);
    }

    #[test]
    fn malformed_expressions_are_rejected() {
        assert_eq!(PathExpr::parse("  "), Err(PathError::Empty));
        assert!(matches!(
            PathExpr::parse("a//b"),
            Err(PathError::EmptyStep(_))
        ));
        assert!(matches!(
            PathExpr::parse("@id/c"),
            Err(PathError::AttributeNotLast(_))
        ));
        assert!(matches!(
            PathExpr::parse("c[1]"),
            Err(PathError::Unsupported { .. })
        ));
    }
}
