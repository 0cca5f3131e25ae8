//! Structural comparison of XML trees: node pairing, severity classification and
//! pluggable evaluation, plus the parsing and formatting helpers around it.

pub mod diff;
pub mod format;
pub mod parser;
pub mod position;
pub mod tree;

pub use diff::{compare, Diff, DiffBuilder, Difference, DifferenceEngine};
pub use format::{format_json, format_summary, format_text};
pub use parser::{parse, parse_file, parse_with_options, ParseError, ParseOptions};
pub use position::PositionTracker;
pub use tree::{Attribute, NodeKind, QName, XmlNode};
