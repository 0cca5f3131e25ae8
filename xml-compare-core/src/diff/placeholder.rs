//! Placeholder matching: control documents may use `${xmlcompare.<keyword>}` instead of a
//! literal value to accept a family of test values.
//!
//! Supported keywords:
//!
//! - `ignore`: any test value, including a missing text node or attribute
//! - `isNumber`: test value parses as a floating point number
//! - `matchesRegex(<re>)`: the whole test value matches `<re>`

use regex::Regex;
use thiserror::Error;

use crate::diff::comparison::{
    Comparison, ComparisonKind, ComparisonResult, ComparisonValue, Target,
};
use crate::diff::evaluator::DifferenceEvaluator;
use crate::tree::{NodeKind, XmlNode};

const DEFAULT_START: &str = "${";
const DEFAULT_END: &str = "}";

/// Errors raised while configuring a [`PlaceholderEvaluator`].
#[derive(Debug, Error)]
pub enum PlaceholderError {
    #[error("placeholder delimiters must not be empty")]
    EmptyDelimiter,
    #[error("invalid placeholder pattern: {0}")]
    Regex(#[from] regex::Error),
}

#[derive(Debug, Clone, PartialEq, Eq)]
enum Placeholder {
    Ignore,
    IsNumber,
    MatchesRegex(String),
    Unknown(String),
}

/// Resolves placeholder-bearing control values against test values.
#[derive(Debug, Clone)]
pub struct PlaceholderEvaluator {
    pattern: Regex,
}

impl PlaceholderEvaluator {
    /// Evaluator using the default `${` and `}` delimiters.
    pub fn new() -> Result<Self, PlaceholderError> {
        Self::with_delimiters(DEFAULT_START, DEFAULT_END)
    }

    pub fn with_delimiters(start: &str, end: &str) -> Result<Self, PlaceholderError> {
        if start.trim().is_empty() || end.trim().is_empty() {
            return Err(PlaceholderError::EmptyDelimiter);
        }
        let pattern = Regex::new(&format!(
            r"(?s)^\s*{}\s*xmlcompare\.(\w+)(?:\((.*)\))?\s*{}\s*$",
            regex::escape(start),
            regex::escape(end)
        ))?;
        Ok(Self { pattern })
    }

    fn placeholder(&self, value: &str) -> Option<Placeholder> {
        let captures = self.pattern.captures(value)?;
        let keyword = captures.get(1)?.as_str();
        let argument = captures.get(2).map(|m| m.as_str().to_string());
        Some(match (keyword, argument) {
            ("ignore", None) => Placeholder::Ignore,
            ("isNumber", None) => Placeholder::IsNumber,
            ("matchesRegex", Some(re)) => Placeholder::MatchesRegex(re),
            (other, _) => Placeholder::Unknown(other.to_string()),
        })
    }

    fn is_ignore(&self, value: &str) -> bool {
        self.placeholder(value) == Some(Placeholder::Ignore)
    }

    fn evaluate_value(&self, control: &str, test: Option<&str>, outcome: ComparisonResult) -> ComparisonResult {
        let Some(placeholder) = self.placeholder(control) else {
            return outcome;
        };
        let accepted = match placeholder {
            Placeholder::Ignore => true,
            Placeholder::IsNumber => test.is_some_and(|t| t.trim().parse::<f64>().is_ok()),
            Placeholder::MatchesRegex(re) => match Regex::new(&format!("^(?:{re})$")) {
                Ok(re) => test.is_some_and(|t| re.is_match(t)),
                Err(err) => {
                    tracing::debug!(%err, "placeholder regex does not compile");
                    false
                }
            },
            Placeholder::Unknown(keyword) => {
                tracing::debug!(%keyword, "unknown placeholder keyword");
                return outcome;
            }
        };
        if accepted {
            ComparisonResult::Equal
        } else {
            ComparisonResult::Different
        }
    }

    /// Count of control children/attributes that an ignore placeholder allows to be absent.
    fn ignorable_children(&self, node: &XmlNode) -> usize {
        node.children
            .iter()
            .filter(|child| child.kind.is_character_data())
            .filter(|child| matches!(child.value(), Ok(Some(text)) if self.is_ignore(text)))
            .count()
    }

    fn ignorable_attributes(&self, node: &XmlNode) -> usize {
        node.attributes
            .iter()
            .filter(|attr| self.is_ignore(&attr.value))
            .count()
    }
}

fn count(value: &Option<ComparisonValue>) -> Option<usize> {
    match value {
        Some(ComparisonValue::Count(count)) => Some(*count),
        _ => None,
    }
}

fn node_target<'a>(target: &Option<Target<'a>>) -> Option<&'a XmlNode> {
    match target {
        Some(Target::Node(node)) => Some(*node),
        _ => None,
    }
}

impl DifferenceEvaluator for PlaceholderEvaluator {
    fn evaluate(&self, comparison: &Comparison<'_>, outcome: ComparisonResult) -> ComparisonResult {
        if outcome == ComparisonResult::Equal {
            return outcome;
        }
        let control_text = comparison
            .control
            .value
            .as_ref()
            .and_then(ComparisonValue::as_text);
        let test_text = comparison.test.value.as_ref().and_then(ComparisonValue::as_text);

        match comparison.kind {
            ComparisonKind::TextValue | ComparisonKind::CdataValue | ComparisonKind::AttributeValue => {
                match control_text {
                    Some(control) => self.evaluate_value(control, test_text, outcome),
                    None => outcome,
                }
            }
            // A control attribute holding `ignore` may be missing on the test side.
            ComparisonKind::AttributeNameLookup => match comparison.control.target {
                Some(Target::Attribute { attribute, .. })
                    if comparison.test.value == Some(ComparisonValue::Absent)
                        && self.is_ignore(&attribute.value) =>
                {
                    ComparisonResult::Equal
                }
                _ => outcome,
            },
            // A control text child holding `ignore` may be missing on the test side.
            ComparisonKind::ChildLookup => match node_target(&comparison.control.target) {
                Some(node)
                    if node.kind.is_character_data()
                        && matches!(node.value(), Ok(Some(text)) if self.is_ignore(text)) =>
                {
                    ComparisonResult::Equal
                }
                _ => outcome,
            },
            ComparisonKind::ChildNodeListLength => {
                match (
                    node_target(&comparison.control.target),
                    count(&comparison.control.value),
                    count(&comparison.test.value),
                ) {
                    (Some(node), Some(control), Some(test))
                        if control.saturating_sub(self.ignorable_children(node)) == test =>
                    {
                        ComparisonResult::Equal
                    }
                    _ => outcome,
                }
            }
            ComparisonKind::ElementNumAttributes => {
                match (
                    node_target(&comparison.control.target),
                    count(&comparison.control.value),
                    count(&comparison.test.value),
                ) {
                    (Some(node), Some(control), Some(test))
                        if node.kind == NodeKind::Element
                            && control.saturating_sub(self.ignorable_attributes(node)) == test =>
                    {
                        ComparisonResult::Equal
                    }
                    _ => outcome,
                }
            }
            _ => outcome,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::{Placeholder, PlaceholderError, PlaceholderEvaluator};

    #[test]
    fn keywords_are_recognized_with_surrounding_whitespace() {
        let evaluator = PlaceholderEvaluator::new().expect("default delimiters");
        assert_eq!(
            evaluator.placeholder(" ${xmlcompare.ignore} "),
            Some(Placeholder::Ignore)
        );
        assert_eq!(
            evaluator.placeholder("${xmlcompare.matchesRegex([0-9]+)}"),
            Some(Placeholder::MatchesRegex("[0-9]+".to_string()))
        );
        assert_eq!(evaluator.placeholder("plain"), None);
    }

    #[test]
    fn custom_delimiters_replace_defaults() {
        let evaluator = PlaceholderEvaluator::with_delimiters("#[", "]").expect("delimiters");
        assert_eq!(
            evaluator.placeholder("#[xmlcompare.isNumber]"),
            Some(Placeholder::IsNumber)
        );
        assert_eq!(evaluator.placeholder("${xmlcompare.isNumber}"), None);
    }

    #[test]
    fn empty_delimiters_are_rejected() {
        assert!(matches!(
            PlaceholderEvaluator::with_delimiters("", "}"),
            Err(PlaceholderError::EmptyDelimiter)
        ));
    }
}
