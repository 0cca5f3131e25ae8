//! Fluent configuration of a single comparison.

use std::collections::BTreeMap;

use crate::diff::engine::DifferenceEngine;
use crate::diff::evaluator::DifferenceEvaluator;
use crate::diff::listener::{ComparisonController, ComparisonListener};
use crate::diff::matcher::NodeMatcher;
use crate::diff::result::Diff;
use crate::tree::{Attribute, XmlNode};

/// Collects strategies for comparing `control` with `test`, then runs once.
///
/// ```
/// use xml_compare_core::{parse, DiffBuilder};
///
/// let control = parse(b"<a><b>1</b></a>").unwrap();
/// let test = parse(b"<a><b>2</b></a>").unwrap();
/// let diff = DiffBuilder::compare(&control, &test).build();
/// assert!(diff.has_differences());
/// ```
pub struct DiffBuilder<'a> {
    control: &'a XmlNode,
    test: &'a XmlNode,
    engine: DifferenceEngine,
    identical: bool,
}

impl<'a> DiffBuilder<'a> {
    pub fn compare(control: &'a XmlNode, test: &'a XmlNode) -> Self {
        Self {
            control,
            test,
            engine: DifferenceEngine::new(),
            identical: false,
        }
    }

    pub fn with_node_matcher<M: NodeMatcher + 'static>(mut self, matcher: M) -> Self {
        self.engine = self.engine.with_node_matcher(matcher);
        self
    }

    pub fn with_difference_evaluator<E: DifferenceEvaluator + 'static>(mut self, evaluator: E) -> Self {
        self.engine = self.engine.with_difference_evaluator(evaluator);
        self
    }

    pub fn with_comparison_controller<C: ComparisonController + 'static>(mut self, controller: C) -> Self {
        self.engine = self.engine.with_comparison_controller(controller);
        self
    }

    /// Register a listener for every comparison; may be called repeatedly.
    pub fn with_comparison_listeners<L: ComparisonListener + 'static>(mut self, listener: L) -> Self {
        self.engine.add_comparison_listener(listener);
        self
    }

    /// Register a listener for non-equal comparisons; may be called repeatedly.
    pub fn with_difference_listeners<L: ComparisonListener + 'static>(mut self, listener: L) -> Self {
        self.engine.add_difference_listener(listener);
        self
    }

    /// Register a listener for equal comparisons; may be called repeatedly.
    pub fn with_match_listeners<L: ComparisonListener + 'static>(mut self, listener: L) -> Self {
        self.engine.add_match_listener(listener);
        self
    }

    pub fn with_namespace_context(mut self, namespaces: BTreeMap<String, String>) -> Self {
        self.engine = self.engine.with_namespace_context(namespaces);
        self
    }

    pub fn with_node_filter<F>(mut self, filter: F) -> Self
    where
        F: Fn(&XmlNode) -> bool + Send + Sync + 'static,
    {
        self.engine = self.engine.with_node_filter(filter);
        self
    }

    pub fn with_attribute_filter<F>(mut self, filter: F) -> Self
    where
        F: Fn(&Attribute) -> bool + Send + Sync + 'static,
    {
        self.engine = self.engine.with_attribute_filter(filter);
        self
    }

    /// Only `Different` outcomes make [`Diff::has_differences`] true (the default).
    pub fn check_for_similar(mut self) -> Self {
        self.identical = false;
        self
    }

    /// `Similar` outcomes also make [`Diff::has_differences`] true.
    pub fn check_for_identical(mut self) -> Self {
        self.identical = true;
        self
    }

    pub fn build(mut self) -> Diff<'a> {
        let (_, differences) = self.engine.compare_collecting(self.control, self.test);
        Diff::new(differences, self.identical)
    }
}

/// Compare two trees with default settings.
pub fn compare<'a>(control: &'a XmlNode, test: &'a XmlNode) -> Diff<'a> {
    DiffBuilder::compare(control, test).build()
}
