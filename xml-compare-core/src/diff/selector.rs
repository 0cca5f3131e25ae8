//! Element selectors decide whether a control element and a test element are
//! candidates for being compared with each other.

use std::sync::Arc;

use crate::diff::path::{PathError, PathExpr, Selected};
use crate::tree::{NodeKind, XmlNode};

/// Pure predicate over a (control, test) element pair.
pub trait ElementSelector: Send + Sync {
    fn can_be_compared(&self, control: &XmlNode, test: &XmlNode) -> bool;
}

impl<F> ElementSelector for F
where
    F: Fn(&XmlNode, &XmlNode) -> bool + Send + Sync,
{
    fn can_be_compared(&self, control: &XmlNode, test: &XmlNode) -> bool {
        self(control, test)
    }
}

fn same_name(control: &XmlNode, test: &XmlNode) -> bool {
    match (&control.name, &test.name) {
        (Some(control), Some(test)) => control.same_expanded_name(test),
        _ => false,
    }
}

/// Elements with the same local name and namespace.
#[derive(Debug, Clone, Copy, Default)]
pub struct ByName;

impl ElementSelector for ByName {
    fn can_be_compared(&self, control: &XmlNode, test: &XmlNode) -> bool {
        same_name(control, test)
    }
}

/// Elements with the same name and the same concatenated direct text.
#[derive(Debug, Clone, Copy, Default)]
pub struct ByNameAndText;

impl ElementSelector for ByNameAndText {
    fn can_be_compared(&self, control: &XmlNode, test: &XmlNode) -> bool {
        same_name(control, test)
            && matches!(
                (control.merged_text(), test.merged_text()),
                (Ok(c), Ok(t)) if c == t
            )
    }
}

/// Elements with the same name and equal values for the listed attributes.
#[derive(Debug, Clone, Default)]
pub struct ByNameAndAttributes {
    attributes: Vec<String>,
}

impl ElementSelector for ByNameAndAttributes {
    fn can_be_compared(&self, control: &XmlNode, test: &XmlNode) -> bool {
        same_name(control, test)
            && self
                .attributes
                .iter()
                .all(|name| control.attribute_value(name) == test.attribute_value(name))
    }
}

/// Elements with the same name and identical attribute sets.
#[derive(Debug, Clone, Copy, Default)]
pub struct ByNameAndAllAttributes;

impl ElementSelector for ByNameAndAllAttributes {
    fn can_be_compared(&self, control: &XmlNode, test: &XmlNode) -> bool {
        same_name(control, test)
            && control.attributes.len() == test.attributes.len()
            && control.attributes.iter().all(|attr| {
                test.attribute(&attr.name)
                    .is_some_and(|other| other.value == attr.value)
            })
    }
}

/// Elements whose whole subtrees agree on names and character data.
#[derive(Debug, Clone, Copy, Default)]
pub struct ByNameAndTextRec;

impl ByNameAndTextRec {
    fn matches(control: &XmlNode, test: &XmlNode) -> bool {
        if !same_name(control, test) {
            return false;
        }
        let control_children = significant_children(control);
        let test_children = significant_children(test);
        control_children.len() == test_children.len()
            && control_children
                .iter()
                .zip(&test_children)
                .all(|(c, t)| match (c.kind, t.kind) {
                    (NodeKind::Element, NodeKind::Element) => Self::matches(c, t),
                    (ck, tk) if ck.is_character_data() && tk.is_character_data() => {
                        matches!((c.value(), t.value()), (Ok(a), Ok(b)) if a == b)
                    }
                    _ => false,
                })
    }
}

fn significant_children(node: &XmlNode) -> Vec<&XmlNode> {
    node.children
        .iter()
        .filter(|child| child.kind == NodeKind::Element || child.kind.is_character_data())
        .collect()
}

impl ElementSelector for ByNameAndTextRec {
    fn can_be_compared(&self, control: &XmlNode, test: &XmlNode) -> bool {
        Self::matches(control, test)
    }
}

/// Elements with the same name whose path-selected sub-values pair up one-to-one.
///
/// Selected elements are paired with `inner`; selected text nodes and attributes
/// must have equal values.
#[derive(Clone)]
pub struct ByPath {
    expr: PathExpr,
    inner: Arc<dyn ElementSelector>,
}

impl ByPath {
    fn item_matches(&self, control: &Selected<'_>, test: &Selected<'_>) -> bool {
        match (control, test) {
            (Selected::Attribute(c), Selected::Attribute(t)) => c.value == t.value,
            (Selected::Node(c), Selected::Node(t)) => match (c.kind, t.kind) {
                (NodeKind::Element, NodeKind::Element) => self.inner.can_be_compared(c, t),
                (ck, tk) if ck.is_compatible_with(tk) => {
                    matches!((c.value(), t.value()), (Ok(a), Ok(b)) if a == b)
                }
                _ => false,
            },
            _ => false,
        }
    }
}

impl ElementSelector for ByPath {
    fn can_be_compared(&self, control: &XmlNode, test: &XmlNode) -> bool {
        if !same_name(control, test) {
            return false;
        }
        let control_items = self.expr.select(control);
        let test_items = self.expr.select(test);
        if control_items.len() != test_items.len() {
            return false;
        }
        let mut used = vec![false; test_items.len()];
        control_items.iter().all(|c| {
            let found = test_items
                .iter()
                .enumerate()
                .find(|(idx, t)| !used[*idx] && self.item_matches(c, t))
                .map(|(idx, _)| idx);
            match found {
                Some(idx) => {
                    used[idx] = true;
                    true
                }
                None => false,
            }
        })
    }
}

/// Applies `inner` only to control elements with the given local name.
#[derive(Clone)]
pub struct Conditional {
    element: String,
    inner: Arc<dyn ElementSelector>,
}

impl ElementSelector for Conditional {
    fn can_be_compared(&self, control: &XmlNode, test: &XmlNode) -> bool {
        control.local_name() == Some(self.element.as_str()) && self.inner.can_be_compared(control, test)
    }
}

/// Accepts a pair when any member accepts it.
#[derive(Clone, Default)]
pub struct Or {
    selectors: Vec<Arc<dyn ElementSelector>>,
}

impl Or {
    pub fn or<S: ElementSelector + 'static>(mut self, selector: S) -> Self {
        self.selectors.push(Arc::new(selector));
        self
    }
}

impl ElementSelector for Or {
    fn can_be_compared(&self, control: &XmlNode, test: &XmlNode) -> bool {
        self.selectors
            .iter()
            .any(|selector| selector.can_be_compared(control, test))
    }
}

/// Accepts a pair when every member accepts it.
#[derive(Clone, Default)]
pub struct And {
    selectors: Vec<Arc<dyn ElementSelector>>,
}

impl And {
    pub fn and<S: ElementSelector + 'static>(mut self, selector: S) -> Self {
        self.selectors.push(Arc::new(selector));
        self
    }
}

impl ElementSelector for And {
    fn can_be_compared(&self, control: &XmlNode, test: &XmlNode) -> bool {
        self.selectors
            .iter()
            .all(|selector| selector.can_be_compared(control, test))
    }
}

/// Inverts a selector.
#[derive(Clone)]
pub struct Not {
    inner: Arc<dyn ElementSelector>,
}

impl ElementSelector for Not {
    fn can_be_compared(&self, control: &XmlNode, test: &XmlNode) -> bool {
        !self.inner.can_be_compared(control, test)
    }
}

/// Per-element-name selector table with a fallback.
#[derive(Clone)]
pub struct ConditionalSelector {
    rules: Vec<(String, Arc<dyn ElementSelector>)>,
    fallback: Option<Arc<dyn ElementSelector>>,
}

impl ElementSelector for ConditionalSelector {
    fn can_be_compared(&self, control: &XmlNode, test: &XmlNode) -> bool {
        let rule = self
            .rules
            .iter()
            .find(|(name, _)| control.local_name() == Some(name.as_str()));
        match (rule, &self.fallback) {
            (Some((_, selector)), _) => selector.can_be_compared(control, test),
            (None, Some(fallback)) => fallback.can_be_compared(control, test),
            (None, None) => false,
        }
    }
}

/// Builder for [`ConditionalSelector`]: `when_element_is_named(..).then_use(..)`, repeated,
/// optionally finished by `else_use(..)`.
#[derive(Clone, Default)]
pub struct ConditionalBuilder {
    rules: Vec<(String, Arc<dyn ElementSelector>)>,
    fallback: Option<Arc<dyn ElementSelector>>,
}

/// A pending rule waiting for its selector.
pub struct WhenNamed {
    builder: ConditionalBuilder,
    element: String,
}

impl ConditionalBuilder {
    pub fn when_element_is_named(self, element: impl Into<String>) -> WhenNamed {
        WhenNamed {
            builder: self,
            element: element.into(),
        }
    }

    pub fn else_use<S: ElementSelector + 'static>(mut self, selector: S) -> Self {
        self.fallback = Some(Arc::new(selector));
        self
    }

    pub fn build(self) -> ConditionalSelector {
        ConditionalSelector {
            rules: self.rules,
            fallback: self.fallback,
        }
    }
}

impl WhenNamed {
    pub fn then_use<S: ElementSelector + 'static>(self, selector: S) -> ConditionalBuilder {
        let mut builder = self.builder;
        builder.rules.push((self.element, Arc::new(selector)));
        builder
    }
}

pub fn by_name() -> ByName {
    ByName
}

pub fn by_name_and_text() -> ByNameAndText {
    ByNameAndText
}

pub fn by_name_and_attributes(attributes: &[&str]) -> ByNameAndAttributes {
    ByNameAndAttributes {
        attributes: attributes.iter().map(ToString::to_string).collect(),
    }
}

pub fn by_name_and_all_attributes() -> ByNameAndAllAttributes {
    ByNameAndAllAttributes
}

pub fn by_name_and_text_rec() -> ByNameAndTextRec {
    ByNameAndTextRec
}

/// Compare elements through the values `expr` selects, pairing selected elements with `inner`.
pub fn by_path<S: ElementSelector + 'static>(expr: &str, inner: S) -> Result<ByPath, PathError> {
    Ok(ByPath {
        expr: PathExpr::parse(expr)?,
        inner: Arc::new(inner),
    })
}

pub fn conditional<S: ElementSelector + 'static>(element: impl Into<String>, inner: S) -> Conditional {
    Conditional {
        element: element.into(),
        inner: Arc::new(inner),
    }
}

pub fn conditional_builder() -> ConditionalBuilder {
    ConditionalBuilder::default()
}

pub fn or<A, B>(first: A, second: B) -> Or
where
    A: ElementSelector + 'static,
    B: ElementSelector + 'static,
{
    Or::default().or(first).or(second)
}

pub fn and<A, B>(first: A, second: B) -> And
where
    A: ElementSelector + 'static,
    B: ElementSelector + 'static,
{
    And::default().and(first).and(second)
}

pub fn not<S: ElementSelector + 'static>(inner: S) -> Not {
    Not {
        inner: Arc::new(inner),
    }
}
