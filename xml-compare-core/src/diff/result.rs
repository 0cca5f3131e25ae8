use std::fmt::{self, Display, Formatter};

use serde::Serialize;

use crate::diff::comparison::{Comparison, ComparisonResult};
use crate::format::format_text;

/// A comparison whose reported outcome was not `Equal`.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Difference<'a> {
    pub comparison: Comparison<'a>,
    /// Reported outcome, never `Critical`.
    pub result: ComparisonResult,
}

impl Display for Difference<'_> {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        write!(f, "{} ({})", self.comparison, self.result)
    }
}

/// Outcome of comparing two trees.
#[derive(Debug, Clone)]
pub struct Diff<'a> {
    differences: Vec<Difference<'a>>,
    identical: bool,
}

impl<'a> Diff<'a> {
    pub(crate) fn new(differences: Vec<Difference<'a>>, identical: bool) -> Self {
        Self {
            differences,
            identical,
        }
    }

    /// True when any difference is `Different`; with `check_for_identical`, `Similar` counts too.
    pub fn has_differences(&self) -> bool {
        let threshold = if self.identical {
            ComparisonResult::Similar
        } else {
            ComparisonResult::Different
        };
        self.differences.iter().any(|d| d.result >= threshold)
    }

    pub fn has_similar(&self) -> bool {
        self.differences
            .iter()
            .any(|d| d.result == ComparisonResult::Similar)
    }

    pub fn differences(&self) -> impl Iterator<Item = &Difference<'a>> {
        self.differences.iter()
    }

    pub fn as_slice(&self) -> &[Difference<'a>] {
        &self.differences
    }

    pub fn len(&self) -> usize {
        self.differences.len()
    }

    pub fn is_empty(&self) -> bool {
        self.differences.is_empty()
    }

    /// One line per difference.
    pub fn render(&self) -> String {
        format_text(&self.differences)
    }
}

impl Display for Diff<'_> {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        if self.differences.is_empty() {
            return f.write_str("[identical]");
        }
        f.write_str(&self.render())
    }
}
