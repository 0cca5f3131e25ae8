use crate::diff::comparison::ComparisonResult;
use crate::diff::result::Difference;

/// One line per difference: result, kind, position and both values.
pub fn format_text(differences: &[Difference<'_>]) -> String {
    differences
        .iter()
        .map(|difference| {
            let marker = match difference.result {
                ComparisonResult::Similar => "~",
                _ => "!",
            };
            format!("{marker} {difference}")
        })
        .collect::<Vec<_>>()
        .join("\n")
}

/// Counts per reported result.
pub fn format_summary(differences: &[Difference<'_>]) -> String {
    let similar = differences
        .iter()
        .filter(|d| d.result == ComparisonResult::Similar)
        .count();
    let different = differences.len() - similar;
    format!(
        "differences={} different={different} similar={similar}",
        differences.len()
    )
}
