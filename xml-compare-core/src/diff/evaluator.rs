//! Difference evaluators: policies that may reclassify the raw outcome of a comparison.

use std::sync::Arc;

use crate::diff::comparison::{Comparison, ComparisonKind, ComparisonResult, ComparisonValue};

/// Decides the final outcome of a comparison given its raw outcome.
///
/// Implementations must not depend on mutable external state during a run.
pub trait DifferenceEvaluator: Send + Sync {
    fn evaluate(&self, comparison: &Comparison<'_>, outcome: ComparisonResult) -> ComparisonResult;
}

impl<F> DifferenceEvaluator for F
where
    F: Fn(&Comparison<'_>, ComparisonResult) -> ComparisonResult + Send + Sync,
{
    fn evaluate(&self, comparison: &Comparison<'_>, outcome: ComparisonResult) -> ComparisonResult {
        self(comparison, outcome)
    }
}

/// Returns the raw outcome unchanged.
#[derive(Debug, Clone, Copy, Default)]
pub struct Identity;

impl DifferenceEvaluator for Identity {
    fn evaluate(&self, _: &Comparison<'_>, outcome: ComparisonResult) -> ComparisonResult {
        outcome
    }
}

/// Runs evaluators left to right, each seeing the previous one's output.
#[derive(Clone, Default)]
pub struct Chain {
    evaluators: Vec<Arc<dyn DifferenceEvaluator>>,
}

impl Chain {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn then<E: DifferenceEvaluator + 'static>(mut self, evaluator: E) -> Self {
        self.evaluators.push(Arc::new(evaluator));
        self
    }
}

impl DifferenceEvaluator for Chain {
    fn evaluate(&self, comparison: &Comparison<'_>, outcome: ComparisonResult) -> ComparisonResult {
        self.evaluators
            .iter()
            .fold(outcome, |current, evaluator| {
                evaluator.evaluate(comparison, current)
            })
    }
}

/// Asks evaluators in order and keeps the first answer that differs from the raw outcome.
#[derive(Clone, Default)]
pub struct First {
    evaluators: Vec<Arc<dyn DifferenceEvaluator>>,
}

impl First {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn or<E: DifferenceEvaluator + 'static>(mut self, evaluator: E) -> Self {
        self.evaluators.push(Arc::new(evaluator));
        self
    }
}

impl DifferenceEvaluator for First {
    fn evaluate(&self, comparison: &Comparison<'_>, outcome: ComparisonResult) -> ComparisonResult {
        self.evaluators
            .iter()
            .map(|evaluator| evaluator.evaluate(comparison, outcome))
            .find(|evaluated| *evaluated != outcome)
            .unwrap_or(outcome)
    }
}

/// Applies `inner` to the listed kinds and forwards every other outcome unchanged.
#[derive(Clone)]
pub struct OnlyFor {
    kinds: Vec<ComparisonKind>,
    inner: Arc<dyn DifferenceEvaluator>,
}

impl OnlyFor {
    pub fn new<E: DifferenceEvaluator + 'static>(kinds: &[ComparisonKind], inner: E) -> Self {
        Self {
            kinds: kinds.to_vec(),
            inner: Arc::new(inner),
        }
    }
}

impl DifferenceEvaluator for OnlyFor {
    fn evaluate(&self, comparison: &Comparison<'_>, outcome: ComparisonResult) -> ComparisonResult {
        if self.kinds.contains(&comparison.kind) {
            self.inner.evaluate(comparison, outcome)
        } else {
            outcome
        }
    }
}

/// Rewrites `Different` outcomes of the listed kinds to a fixed result.
#[derive(Debug, Clone)]
pub struct Reclassify {
    kinds: Vec<ComparisonKind>,
    from: Vec<ComparisonResult>,
    to: ComparisonResult,
}

impl DifferenceEvaluator for Reclassify {
    fn evaluate(&self, comparison: &Comparison<'_>, outcome: ComparisonResult) -> ComparisonResult {
        if self.kinds.contains(&comparison.kind) && self.from.contains(&outcome) {
            self.to
        } else {
            outcome
        }
    }
}

/// Turn differences of the listed kinds into similarities.
pub fn downgrade_differences_to_similar(kinds: &[ComparisonKind]) -> Reclassify {
    Reclassify {
        kinds: kinds.to_vec(),
        from: vec![ComparisonResult::Different],
        to: ComparisonResult::Similar,
    }
}

/// Ignore differences of the listed kinds entirely.
pub fn downgrade_differences_to_equal(kinds: &[ComparisonKind]) -> Reclassify {
    Reclassify {
        kinds: kinds.to_vec(),
        from: vec![ComparisonResult::Similar, ComparisonResult::Different],
        to: ComparisonResult::Equal,
    }
}

/// Stop comparing the current node pair once one of the listed kinds differs.
pub fn upgrade_differences_to_critical(kinds: &[ComparisonKind]) -> Reclassify {
    Reclassify {
        kinds: kinds.to_vec(),
        from: vec![ComparisonResult::Similar, ComparisonResult::Different],
        to: ComparisonResult::Critical,
    }
}

/// Treats numeric attribute and text values within `tolerance` of each other as equal.
#[derive(Debug, Clone, Copy)]
pub struct NumericTolerance {
    tolerance: f64,
}

impl NumericTolerance {
    pub fn new(tolerance: f64) -> Self {
        Self {
            tolerance: tolerance.abs(),
        }
    }
}

impl DifferenceEvaluator for NumericTolerance {
    fn evaluate(&self, comparison: &Comparison<'_>, outcome: ComparisonResult) -> ComparisonResult {
        if outcome != ComparisonResult::Different {
            return outcome;
        }
        if !matches!(
            comparison.kind,
            ComparisonKind::AttributeValue | ComparisonKind::TextValue | ComparisonKind::CdataValue
        ) {
            return outcome;
        }
        match (parse_number(&comparison.control.value), parse_number(&comparison.test.value)) {
            (Some(control), Some(test)) if (control - test).abs() <= self.tolerance => {
                ComparisonResult::Equal
            }
            _ => outcome,
        }
    }
}

fn parse_number(value: &Option<ComparisonValue>) -> Option<f64> {
    value
        .as_ref()
        .and_then(ComparisonValue::as_text)
        .and_then(|text| text.trim().parse::<f64>().ok())
}

/// Downgrades the kinds that rarely change the meaning of a document to `Similar`:
/// namespace prefixes, schema locations, the declared encoding, presence of a
/// doctype and text written as CDATA.
#[derive(Debug, Clone, Copy, Default)]
pub struct DefaultSimilarity;

impl DifferenceEvaluator for DefaultSimilarity {
    fn evaluate(&self, comparison: &Comparison<'_>, outcome: ComparisonResult) -> ComparisonResult {
        if outcome != ComparisonResult::Different {
            return outcome;
        }
        match comparison.kind {
            ComparisonKind::NamespacePrefix
            | ComparisonKind::SchemaLocation
            | ComparisonKind::NoNamespaceSchemaLocation
            | ComparisonKind::XmlEncoding
            | ComparisonKind::HasDoctypeDeclaration => ComparisonResult::Similar,
            ComparisonKind::NodeType => match (&comparison.control.value, &comparison.test.value) {
                (Some(ComparisonValue::Kind(control)), Some(ComparisonValue::Kind(test)))
                    if control.is_character_data() && test.is_character_data() =>
                {
                    ComparisonResult::Similar
                }
                _ => outcome,
            },
            _ => outcome,
        }
    }
}
