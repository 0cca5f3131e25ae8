//! Structural comparison of two XML trees.

pub mod builder;
pub mod comparison;
pub mod engine;
pub mod evaluator;
pub mod listener;
pub mod matcher;
pub mod path;
pub mod placeholder;
pub mod result;
pub mod selector;

pub use builder::{compare, DiffBuilder};
pub use comparison::{Comparison, ComparisonKind, ComparisonResult, ComparisonValue, Detail, Target};
pub use engine::DifferenceEngine;
pub use evaluator::{DefaultSimilarity, DifferenceEvaluator, NumericTolerance};
pub use listener::{ComparisonController, ComparisonListener, NeverStop, StopWhenDifferent, StopWhenSimilar};
pub use matcher::{DefaultNodeMatcher, NodeMatcher, PositionalMatcher};
pub use placeholder::PlaceholderEvaluator;
pub use result::{Diff, Difference};
pub use selector::ElementSelector;
