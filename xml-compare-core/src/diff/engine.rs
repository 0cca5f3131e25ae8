use std::collections::BTreeMap;
use std::sync::Arc;

use crate::diff::comparison::{
    Comparison, ComparisonKind, ComparisonResult, ComparisonValue, Detail, Target,
};
use crate::diff::evaluator::{DifferenceEvaluator, Identity};
use crate::diff::listener::{ComparisonController, ComparisonListener, Listeners, NeverStop};
use crate::diff::matcher::{NodeMatcher, PositionalMatcher};
use crate::diff::result::Difference;
use crate::position::PositionTracker;
use crate::tree::{Attribute, NodeKind, XmlNode, XSI_NS};

type NodeFilter = Arc<dyn Fn(&XmlNode) -> bool + Send + Sync>;
type AttributeFilter = Arc<dyn Fn(&Attribute) -> bool + Send + Sync>;

/// Strategies fixed before a run starts.
#[derive(Clone)]
struct Strategies {
    node_matcher: Arc<dyn NodeMatcher>,
    evaluator: Arc<dyn DifferenceEvaluator>,
    controller: Arc<dyn ComparisonController>,
    node_filter: NodeFilter,
    attribute_filter: AttributeFilter,
    /// Prefix -> namespace URI, only used to render positions.
    namespaces: BTreeMap<String, String>,
}

impl Default for Strategies {
    fn default() -> Self {
        Self {
            node_matcher: Arc::new(PositionalMatcher),
            evaluator: Arc::new(Identity),
            controller: Arc::new(NeverStop),
            node_filter: Arc::new(|_: &XmlNode| true),
            attribute_filter: Arc::new(|_: &Attribute| true),
            namespaces: BTreeMap::new(),
        }
    }
}

/// Walks a control and a test tree in lockstep and reports every comparison.
///
/// Defaults: positional child pairing, identity evaluation, no listeners, never stop.
#[derive(Default)]
pub struct DifferenceEngine {
    strategies: Strategies,
    listeners: Listeners,
}

impl DifferenceEngine {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_node_matcher<M: NodeMatcher + 'static>(mut self, matcher: M) -> Self {
        self.strategies.node_matcher = Arc::new(matcher);
        self
    }

    pub fn with_difference_evaluator<E: DifferenceEvaluator + 'static>(mut self, evaluator: E) -> Self {
        self.strategies.evaluator = Arc::new(evaluator);
        self
    }

    pub fn with_comparison_controller<C: ComparisonController + 'static>(mut self, controller: C) -> Self {
        self.strategies.controller = Arc::new(controller);
        self
    }

    /// Restrict which child nodes take part in the comparison.
    ///
    /// Doctype children never take part; the document node compares them.
    pub fn with_node_filter<F>(mut self, filter: F) -> Self
    where
        F: Fn(&XmlNode) -> bool + Send + Sync + 'static,
    {
        self.strategies.node_filter = Arc::new(filter);
        self
    }

    /// Restrict which attributes take part in the comparison.
    pub fn with_attribute_filter<F>(mut self, filter: F) -> Self
    where
        F: Fn(&Attribute) -> bool + Send + Sync + 'static,
    {
        self.strategies.attribute_filter = Arc::new(filter);
        self
    }

    /// Prefix -> URI bindings used when rendering positions.
    pub fn with_namespace_context(mut self, namespaces: BTreeMap<String, String>) -> Self {
        self.strategies.namespaces = namespaces;
        self
    }

    pub fn add_comparison_listener<L: ComparisonListener + 'static>(&mut self, listener: L) {
        self.listeners.add_comparison_listener(listener);
    }

    pub fn add_difference_listener<L: ComparisonListener + 'static>(&mut self, listener: L) {
        self.listeners.add_difference_listener(listener);
    }

    pub fn add_match_listener<L: ComparisonListener + 'static>(&mut self, listener: L) {
        self.listeners.add_match_listener(listener);
    }

    /// Compare two trees, notifying listeners; returns the worst reported outcome.
    pub fn compare(&mut self, control: &XmlNode, test: &XmlNode) -> ComparisonResult {
        self.run(control, test, None)
    }

    /// Compare two trees and also collect every non-equal comparison.
    pub fn compare_collecting<'a>(
        &mut self,
        control: &'a XmlNode,
        test: &'a XmlNode,
    ) -> (ComparisonResult, Vec<Difference<'a>>) {
        let mut differences = Vec::new();
        let worst = self.run(control, test, Some(&mut differences));
        (worst, differences)
    }

    fn run<'a>(
        &mut self,
        control: &'a XmlNode,
        test: &'a XmlNode,
        sink: Option<&mut Vec<Difference<'a>>>,
    ) -> ComparisonResult {
        let mut run = Run {
            strategies: &self.strategies,
            listeners: &mut self.listeners,
            control_pos: PositionTracker::for_root(control, &self.strategies.namespaces),
            test_pos: PositionTracker::for_root(test, &self.strategies.namespaces),
            sink,
            worst: ComparisonResult::Equal,
            performed: 0,
            halted: false,
        };
        run.compare_nodes(control, test);
        tracing::debug!(
            comparisons = run.performed,
            worst = %run.worst,
            halted = run.halted,
            "comparison run finished"
        );
        run.worst
    }
}

/// Left-to-right fold over the comparisons of one node pair; a critical outcome finishes it.
#[derive(Debug, Clone, Copy, Default)]
struct Chain {
    finished: bool,
}

impl Chain {
    fn new() -> Self {
        Self::default()
    }

    fn is_open(&self) -> bool {
        !self.finished
    }

    fn record(&mut self, outcome: ComparisonResult) {
        self.finished = outcome.is_critical();
    }
}

/// Traversal state of one top-level comparison.
struct Run<'e, 'a, 's> {
    strategies: &'e Strategies,
    listeners: &'e mut Listeners,
    control_pos: PositionTracker,
    test_pos: PositionTracker,
    sink: Option<&'s mut Vec<Difference<'a>>>,
    worst: ComparisonResult,
    performed: usize,
    halted: bool,
}

#[derive(Clone, Copy)]
enum Side {
    Control,
    Test,
}

impl<'e, 'a, 's> Run<'e, 'a, 's> {
    fn tracker(&self, side: Side) -> &PositionTracker {
        match side {
            Side::Control => &self.control_pos,
            Side::Test => &self.test_pos,
        }
    }

    fn detail(&self, side: Side, target: Target<'a>, value: Option<ComparisonValue>) -> Detail<'a> {
        let tracker = self.tracker(side);
        Detail::new(tracker.current_path(), tracker.parent_path(), Some(target), value)
    }

    /// Detail for something that does not exist on `side`, located under the current node.
    fn absent(&self, side: Side) -> Detail<'a> {
        Detail {
            position: None,
            parent_position: Some(self.tracker(side).current_path()),
            target: None,
            value: Some(ComparisonValue::Absent),
        }
    }

    fn node_comparison(
        &self,
        kind: ComparisonKind,
        control: &'a XmlNode,
        control_value: Option<ComparisonValue>,
        test: &'a XmlNode,
        test_value: Option<ComparisonValue>,
    ) -> Comparison<'a> {
        Comparison::new(
            kind,
            self.detail(Side::Control, Target::Node(control), control_value),
            self.detail(Side::Test, Target::Node(test), test_value),
        )
    }

    /// Evaluate, dispatch and record one comparison unless the chain or the run stopped.
    fn step(&mut self, chain: &mut Chain, comparison: Comparison<'a>) {
        if !chain.is_open() || self.halted {
            return;
        }
        let initial = comparison.initial_outcome();
        let outcome = self.strategies.evaluator.evaluate(&comparison, initial);
        let reported = outcome.reported();
        self.performed += 1;
        tracing::trace!(
            kind = %comparison.kind,
            position = comparison.position(),
            outcome = %outcome,
            "compared"
        );

        self.listeners.dispatch(&comparison, outcome);
        chain.record(outcome);
        self.worst = self.worst.max(reported);

        if reported == ComparisonResult::Equal {
            return;
        }
        if self
            .strategies
            .controller
            .stop_diff_analysis(&comparison, reported)
        {
            tracing::debug!(position = comparison.position(), "comparison controller halted the run");
            self.halted = true;
        }
        if let Some(sink) = self.sink.as_mut() {
            sink.push(Difference {
                comparison,
                result: reported,
            });
        }
    }

    /// Compare a node pair; both trackers must already point at the pair.
    fn compare_nodes(&mut self, control: &'a XmlNode, test: &'a XmlNode) {
        let mut chain = Chain::new();

        let node_type = self.node_comparison(
            ComparisonKind::NodeType,
            control,
            Some(ComparisonValue::Kind(control.kind)),
            test,
            Some(ComparisonValue::Kind(test.kind)),
        );
        self.step(&mut chain, node_type);
        if !control.kind.is_compatible_with(test.kind) {
            return;
        }

        match control.kind {
            NodeKind::Element => {
                self.compare_element_name(&mut chain, control, test);
                self.compare_attributes(&mut chain, control, test);
            }
            NodeKind::Text | NodeKind::CData => {
                let kind = if control.kind == NodeKind::CData && test.kind == NodeKind::CData {
                    ComparisonKind::CdataValue
                } else {
                    ComparisonKind::TextValue
                };
                self.compare_value(&mut chain, kind, control, test);
            }
            NodeKind::Comment => {
                self.compare_value(&mut chain, ComparisonKind::CommentValue, control, test);
            }
            NodeKind::ProcessingInstruction => {
                let target = self.node_comparison(
                    ComparisonKind::ProcessingInstructionTarget,
                    control,
                    Some(name_value(control)),
                    test,
                    Some(name_value(test)),
                );
                self.step(&mut chain, target);
                self.compare_value(
                    &mut chain,
                    ComparisonKind::ProcessingInstructionData,
                    control,
                    test,
                );
            }
            NodeKind::Document => self.compare_document(&mut chain, control, test),
            NodeKind::DocumentType => self.compare_doctype(&mut chain, control, test),
        }

        if control.kind.has_children() && chain.is_open() && !self.halted {
            self.compare_children(&mut chain, control, test);
        }
    }

    fn compare_element_name(&mut self, chain: &mut Chain, control: &'a XmlNode, test: &'a XmlNode) {
        let (Some(control_name), Some(test_name)) = (&control.name, &test.name) else {
            return;
        };
        let facts = [
            (
                ComparisonKind::ElementTagName,
                ComparisonValue::Text(control_name.local.clone()),
                ComparisonValue::Text(test_name.local.clone()),
            ),
            (
                ComparisonKind::NamespaceUri,
                ComparisonValue::from_option(control_name.namespace.as_deref()),
                ComparisonValue::from_option(test_name.namespace.as_deref()),
            ),
            (
                ComparisonKind::NamespacePrefix,
                ComparisonValue::from_option(control_name.prefix.as_deref()),
                ComparisonValue::from_option(test_name.prefix.as_deref()),
            ),
        ];
        for (kind, control_value, test_value) in facts {
            let comparison =
                self.node_comparison(kind, control, Some(control_value), test, Some(test_value));
            self.step(chain, comparison);
        }
    }

    fn compare_value(
        &mut self,
        chain: &mut Chain,
        kind: ComparisonKind,
        control: &'a XmlNode,
        test: &'a XmlNode,
    ) {
        let comparison =
            self.node_comparison(kind, control, read_value(control), test, read_value(test));
        self.step(chain, comparison);
    }

    fn compare_attributes(&mut self, chain: &mut Chain, control: &'a XmlNode, test: &'a XmlNode) {
        let filter = &self.strategies.attribute_filter;
        let control_attrs: Vec<&'a Attribute> = control
            .attributes
            .iter()
            .filter(|attr| !is_schema_location(attr) && filter(attr))
            .collect();
        let test_attrs: Vec<&'a Attribute> = test
            .attributes
            .iter()
            .filter(|attr| !is_schema_location(attr) && filter(attr))
            .collect();

        let count = self.node_comparison(
            ComparisonKind::ElementNumAttributes,
            control,
            Some(ComparisonValue::Count(control_attrs.len())),
            test,
            Some(ComparisonValue::Count(test_attrs.len())),
        );
        self.step(chain, count);

        for &control_attr in &control_attrs {
            let partner = test_attrs
                .iter()
                .copied()
                .find(|test_attr| test_attr.name.same_expanded_name(&control_attr.name));
            match partner {
                Some(test_attr) => self.compare_attribute_pair(chain, control, control_attr, test, test_attr),
                None => {
                    self.control_pos.enter_attribute(&control_attr.name);
                    let comparison = Comparison::new(
                        ComparisonKind::AttributeNameLookup,
                        self.detail(
                            Side::Control,
                            Target::Attribute {
                                owner: control,
                                attribute: control_attr,
                            },
                            Some(ComparisonValue::Name(control_attr.name.clone())),
                        ),
                        self.absent(Side::Test),
                    );
                    self.step(chain, comparison);
                    self.control_pos.leave();
                }
            }
        }

        for &test_attr in &test_attrs {
            let known = control_attrs
                .iter()
                .any(|control_attr| control_attr.name.same_expanded_name(&test_attr.name));
            if known {
                continue;
            }
            self.test_pos.enter_attribute(&test_attr.name);
            let comparison = Comparison::new(
                ComparisonKind::AttributeNameLookup,
                self.absent(Side::Control),
                self.detail(
                    Side::Test,
                    Target::Attribute {
                        owner: test,
                        attribute: test_attr,
                    },
                    Some(ComparisonValue::Name(test_attr.name.clone())),
                ),
            );
            self.step(chain, comparison);
            self.test_pos.leave();
        }

        self.compare_schema_location(chain, control, test, ComparisonKind::SchemaLocation, "schemaLocation");
        self.compare_schema_location(
            chain,
            control,
            test,
            ComparisonKind::NoNamespaceSchemaLocation,
            "noNamespaceSchemaLocation",
        );
    }

    fn compare_attribute_pair(
        &mut self,
        chain: &mut Chain,
        control: &'a XmlNode,
        control_attr: &'a Attribute,
        test: &'a XmlNode,
        test_attr: &'a Attribute,
    ) {
        self.control_pos.enter_attribute(&control_attr.name);
        self.test_pos.enter_attribute(&test_attr.name);

        let control_target = Target::Attribute {
            owner: control,
            attribute: control_attr,
        };
        let test_target = Target::Attribute {
            owner: test,
            attribute: test_attr,
        };
        if control_attr.name.namespace.is_some() {
            let prefix = Comparison::new(
                ComparisonKind::NamespacePrefix,
                self.detail(
                    Side::Control,
                    control_target,
                    Some(ComparisonValue::from_option(control_attr.name.prefix.as_deref())),
                ),
                self.detail(
                    Side::Test,
                    test_target,
                    Some(ComparisonValue::from_option(test_attr.name.prefix.as_deref())),
                ),
            );
            self.step(chain, prefix);
        }
        let value = Comparison::new(
            ComparisonKind::AttributeValue,
            self.detail(
                Side::Control,
                control_target,
                Some(ComparisonValue::Text(control_attr.value.clone())),
            ),
            self.detail(
                Side::Test,
                test_target,
                Some(ComparisonValue::Text(test_attr.value.clone())),
            ),
        );
        self.step(chain, value);

        self.test_pos.leave();
        self.control_pos.leave();
    }

    fn compare_schema_location(
        &mut self,
        chain: &mut Chain,
        control: &'a XmlNode,
        test: &'a XmlNode,
        kind: ComparisonKind,
        local: &str,
    ) {
        let control_value = xsi_attribute(control, local);
        let test_value = xsi_attribute(test, local);
        if control_value.is_none() && test_value.is_none() {
            return;
        }
        let comparison = self.node_comparison(
            kind,
            control,
            Some(ComparisonValue::from_option(control_value)),
            test,
            Some(ComparisonValue::from_option(test_value)),
        );
        self.step(chain, comparison);
    }

    fn compare_document(&mut self, chain: &mut Chain, control: &'a XmlNode, test: &'a XmlNode) {
        let control_doctype = control.doctype_node();
        let test_doctype = test.doctype_node();
        let has_doctype = self.node_comparison(
            ComparisonKind::HasDoctypeDeclaration,
            control,
            Some(ComparisonValue::Flag(control_doctype.is_some())),
            test,
            Some(ComparisonValue::Flag(test_doctype.is_some())),
        );
        self.step(chain, has_doctype);

        let control_decl = control.declaration.clone().unwrap_or_default();
        let test_decl = test.declaration.clone().unwrap_or_default();
        let facts = [
            (
                ComparisonKind::XmlVersion,
                ComparisonValue::Text(control_decl.version.unwrap_or_else(|| "1.0".to_string())),
                ComparisonValue::Text(test_decl.version.unwrap_or_else(|| "1.0".to_string())),
            ),
            (
                ComparisonKind::XmlStandalone,
                ComparisonValue::Flag(control_decl.standalone.unwrap_or(false)),
                ComparisonValue::Flag(test_decl.standalone.unwrap_or(false)),
            ),
            (
                ComparisonKind::XmlEncoding,
                ComparisonValue::from_option(control_decl.encoding.as_deref()),
                ComparisonValue::from_option(test_decl.encoding.as_deref()),
            ),
        ];
        for (kind, control_value, test_value) in facts {
            let comparison =
                self.node_comparison(kind, control, Some(control_value), test, Some(test_value));
            self.step(chain, comparison);
        }

        if let (Some(control_doctype), Some(test_doctype)) = (control_doctype, test_doctype) {
            self.compare_doctype(chain, control_doctype, test_doctype);
        }
    }

    fn compare_doctype(&mut self, chain: &mut Chain, control: &'a XmlNode, test: &'a XmlNode) {
        let control_info = control.doctype.clone().unwrap_or_default();
        let test_info = test.doctype.clone().unwrap_or_default();
        let facts = [
            (ComparisonKind::DoctypeName, name_value(control), name_value(test)),
            (
                ComparisonKind::DoctypePublicId,
                ComparisonValue::from_option(control_info.public_id.as_deref()),
                ComparisonValue::from_option(test_info.public_id.as_deref()),
            ),
            (
                ComparisonKind::DoctypeSystemId,
                ComparisonValue::from_option(control_info.system_id.as_deref()),
                ComparisonValue::from_option(test_info.system_id.as_deref()),
            ),
        ];
        for (kind, control_value, test_value) in facts {
            let comparison =
                self.node_comparison(kind, control, Some(control_value), test, Some(test_value));
            self.step(chain, comparison);
        }
    }

    fn compare_children(&mut self, chain: &mut Chain, control: &'a XmlNode, test: &'a XmlNode) {
        let filter = &self.strategies.node_filter;
        let keep = |child: &&'a XmlNode| child.kind != NodeKind::DocumentType && filter(child);
        let control_children: Vec<&'a XmlNode> = control.children.iter().filter(keep).collect();
        let test_children: Vec<&'a XmlNode> = test.children.iter().filter(keep).collect();

        let length = self.node_comparison(
            ComparisonKind::ChildNodeListLength,
            control,
            Some(ComparisonValue::Count(control_children.len())),
            test,
            Some(ComparisonValue::Count(test_children.len())),
        );
        self.step(chain, length);
        if !chain.is_open() || self.halted {
            return;
        }

        self.control_pos.set_children(&control_children);
        self.test_pos.set_children(&test_children);
        let pairing = self
            .strategies
            .node_matcher
            .match_nodes(&control_children, &test_children);

        for &(control_idx, test_idx) in &pairing.pairs {
            if self.halted {
                return;
            }
            self.control_pos.enter_child(control_idx);
            self.test_pos.enter_child(test_idx);
            self.compare_nodes(control_children[control_idx], test_children[test_idx]);
            self.test_pos.leave();
            self.control_pos.leave();
        }

        for &control_idx in &pairing.unmatched_control {
            let child = control_children[control_idx];
            let comparison = Comparison::new(
                ComparisonKind::ChildLookup,
                Detail::new(
                    self.control_pos.child_path(control_idx),
                    self.control_pos.current_path(),
                    Some(Target::Node(child)),
                    Some(child_identity(child)),
                ),
                self.absent(Side::Test),
            );
            self.step(chain, comparison);
        }
        for &test_idx in &pairing.unmatched_test {
            let child = test_children[test_idx];
            let comparison = Comparison::new(
                ComparisonKind::ChildLookup,
                self.absent(Side::Control),
                Detail::new(
                    self.test_pos.child_path(test_idx),
                    self.test_pos.current_path(),
                    Some(Target::Node(child)),
                    Some(child_identity(child)),
                ),
            );
            self.step(chain, comparison);
        }
    }
}

/// The node value, or `None` when the tree cannot provide it.
fn read_value(node: &XmlNode) -> Option<ComparisonValue> {
    match node.value() {
        Ok(value) => Some(ComparisonValue::from_option(value)),
        Err(err) => {
            tracing::debug!(%err, kind = %node.kind, "node value could not be read");
            None
        }
    }
}

fn name_value(node: &XmlNode) -> ComparisonValue {
    ComparisonValue::from_option(node.local_name())
}

fn child_identity(node: &XmlNode) -> ComparisonValue {
    match (&node.name, node.kind) {
        (Some(name), NodeKind::Element) => ComparisonValue::Name(name.clone()),
        _ => ComparisonValue::Kind(node.kind),
    }
}

fn is_schema_location(attr: &Attribute) -> bool {
    attr.name.namespace.as_deref() == Some(XSI_NS)
        && matches!(
            attr.name.local.as_str(),
            "schemaLocation" | "noNamespaceSchemaLocation"
        )
}

fn xsi_attribute<'n>(node: &'n XmlNode, local: &str) -> Option<&'n str> {
    node.attributes
        .iter()
        .find(|attr| attr.name.namespace.as_deref() == Some(XSI_NS) && attr.name.local == local)
        .map(|attr| attr.value.as_str())
}

#[cfg(test)]
mod tests {
    use std::cell::RefCell;
    use std::rc::Rc;

    use super::DifferenceEngine;
    use crate::diff::comparison::{Comparison, ComparisonKind, ComparisonResult};
    use crate::diff::evaluator::upgrade_differences_to_critical;
    use crate::diff::listener::StopWhenDifferent;
    use crate::tree::{DocTypeInfo, NodeKind, NodeValue, XmlNode};

    type Log = Rc<RefCell<Vec<(ComparisonKind, ComparisonResult, String)>>>;

    fn recording(engine: &mut DifferenceEngine) -> Log {
        let log: Log = Rc::new(RefCell::new(Vec::new()));
        let sink = Rc::clone(&log);
        engine.add_comparison_listener(move |c: &Comparison<'_>, r: ComparisonResult| {
            sink.borrow_mut().push((c.kind, r, c.position().to_string()))
        });
        log
    }

    fn kinds(log: &Log) -> Vec<ComparisonKind> {
        log.borrow().iter().map(|(kind, _, _)| *kind).collect()
    }

    #[test]
    fn comparisons_follow_node_type_name_attributes_children_order() {
        let control = XmlNode::new("a").with_attribute("x", "1").with_text("t");
        let test = control.clone();

        let mut engine = DifferenceEngine::new();
        let log = recording(&mut engine);
        assert_eq!(engine.compare(&control, &test), ComparisonResult::Equal);

        assert_eq!(
            kinds(&log),
            vec![
                ComparisonKind::NodeType,
                ComparisonKind::ElementTagName,
                ComparisonKind::NamespaceUri,
                ComparisonKind::NamespacePrefix,
                ComparisonKind::ElementNumAttributes,
                ComparisonKind::AttributeValue,
                ComparisonKind::ChildNodeListLength,
                ComparisonKind::NodeType,
                ComparisonKind::TextValue,
            ]
        );
        let positions: Vec<String> = log.borrow().iter().map(|(_, _, p)| p.clone()).collect();
        assert_eq!(positions[5], "/a[1]/@x");
        assert_eq!(positions[8], "/a[1]/text()[1]");
    }

    #[test]
    fn node_type_mismatch_stops_the_pair_but_not_its_siblings() {
        let control = XmlNode::new("root")
            .with_child(XmlNode::new("a").with_attribute("x", "1"))
            .with_child(XmlNode::new("b").with_text("1"));
        let test = XmlNode::new("root")
            .with_child(XmlNode::comment("a"))
            .with_child(XmlNode::new("b").with_text("2"));

        let mut engine = DifferenceEngine::new();
        let log = recording(&mut engine);
        engine.compare(&control, &test);

        let log = log.borrow();
        let first_child: Vec<_> = log
            .iter()
            .filter(|(_, _, position)| position.starts_with("/root[1]/a[1]"))
            .collect();
        assert_eq!(first_child.len(), 1);
        assert_eq!(first_child[0].0, ComparisonKind::NodeType);
        assert!(log
            .iter()
            .any(|(kind, result, _)| *kind == ComparisonKind::TextValue
                && *result == ComparisonResult::Different));
    }

    #[test]
    fn critical_outcome_skips_rest_of_pair_only() {
        let control = XmlNode::new("root")
            .with_child(XmlNode::new("a").with_attribute("x", "1").with_text("t"))
            .with_child(XmlNode::new("b").with_text("1"));
        let test = XmlNode::new("root")
            .with_child(XmlNode::new("z").with_attribute("x", "2").with_text("u"))
            .with_child(XmlNode::new("b").with_text("2"));

        let mut engine = DifferenceEngine::new()
            .with_difference_evaluator(upgrade_differences_to_critical(&[ComparisonKind::ElementTagName]));
        let log = recording(&mut engine);
        let worst = engine.compare(&control, &test);

        assert_eq!(worst, ComparisonResult::Different);
        let log = log.borrow();
        let under_a: Vec<ComparisonKind> = log
            .iter()
            .filter(|(_, _, position)| position.starts_with("/root[1]/a[1]"))
            .map(|(kind, _, _)| *kind)
            .collect();
        assert_eq!(
            under_a,
            vec![ComparisonKind::NodeType, ComparisonKind::ElementTagName]
        );
        assert!(log
            .iter()
            .any(|(_, _, position)| position == "/root[1]/b[1]/text()[1]"));
    }

    #[test]
    fn unreadable_value_is_reported_different_and_traversal_continues() {
        let mut broken = XmlNode::text("");
        broken.value = NodeValue::Unreadable("entity".to_string());
        let control = XmlNode::new("root")
            .with_child(XmlNode::new("a").with_text("x"))
            .with_child(XmlNode::new("b").with_text("y"));
        let test = XmlNode::new("root")
            .with_child(XmlNode::new("a").with_child(broken))
            .with_child(XmlNode::new("b").with_text("y"));

        let mut engine = DifferenceEngine::new();
        let (worst, differences) = engine.compare_collecting(&control, &test);

        assert_eq!(worst, ComparisonResult::Different);
        assert_eq!(differences.len(), 1);
        assert_eq!(differences[0].comparison.kind, ComparisonKind::TextValue);
        assert_eq!(differences[0].comparison.test.value, None);
    }

    #[test]
    fn doctype_is_compared_once_under_a_custom_node_filter() {
        let doc = |system: &str| {
            XmlNode::document()
                .with_child(XmlNode::doctype(
                    "a",
                    DocTypeInfo {
                        public_id: None,
                        system_id: Some(system.to_string()),
                    },
                ))
                .with_child(XmlNode::new("a"))
        };
        let control = doc("a.dtd");
        let test = doc("b.dtd");

        let mut engine =
            DifferenceEngine::new().with_node_filter(|node| node.kind != NodeKind::Comment);
        let log = recording(&mut engine);
        let (_, differences) = engine.compare_collecting(&control, &test);

        assert_eq!(differences.len(), 1);
        assert_eq!(differences[0].comparison.kind, ComparisonKind::DoctypeSystemId);
        assert_eq!(differences[0].comparison.position(), "/");
        assert!(!log
            .borrow()
            .iter()
            .any(|(_, _, position)| position.contains("doctype()")));
    }

    #[test]
    fn controller_halts_the_whole_run() {
        let control = XmlNode::new("root")
            .with_child(XmlNode::new("a").with_text("1"))
            .with_child(XmlNode::new("b").with_text("1"));
        let test = XmlNode::new("root")
            .with_child(XmlNode::new("a").with_text("2"))
            .with_child(XmlNode::new("b").with_text("2"));

        let mut engine = DifferenceEngine::new().with_comparison_controller(StopWhenDifferent);
        let (_, differences) = engine.compare_collecting(&control, &test);

        assert_eq!(differences.len(), 1);
        assert_eq!(differences[0].comparison.position(), "/root[1]/a[1]/text()[1]");
    }
}
