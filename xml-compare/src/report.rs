use colored::Colorize;
use xml_compare_core::diff::comparison::ComparisonResult;
use xml_compare_core::{format_summary, format_text, Difference};

/// Render differences for terminal output.
pub fn render_text(differences: &[Difference<'_>]) -> String {
    let raw = format_text(differences);
    let mut out = Vec::new();

    for line in raw.lines() {
        let colored = if line.starts_with('~') {
            line.yellow().to_string()
        } else if line.starts_with('!') {
            line.red().to_string()
        } else {
            line.to_string()
        };
        out.push(colored);
    }

    out.join("\n")
}

/// Render summary counts for terminal output.
pub fn render_summary(differences: &[Difference<'_>]) -> String {
    format_summary(differences).cyan().to_string()
}

/// One-word verdict for the whole comparison.
pub fn render_verdict(differences: &[Difference<'_>]) -> String {
    let worst = differences
        .iter()
        .map(|d| d.result)
        .max()
        .unwrap_or(ComparisonResult::Equal);
    match worst {
        ComparisonResult::Equal => "identical".green().to_string(),
        ComparisonResult::Similar => "similar".yellow().to_string(),
        ComparisonResult::Different | ComparisonResult::Critical => "different".red().to_string(),
    }
}

#[cfg(test)]
mod tests {
    use xml_compare_core::{compare, parse};

    use super::{render_summary, render_text, render_verdict};

    #[test]
    fn renders_plain_text_without_color() {
        colored::control::set_override(false);
        let control = parse(b"<a>1</a>").expect("parse");
        let test = parse(b"<a>2</a>").expect("parse");
        let diff = compare(&control, &test);

        assert!(render_text(diff.as_slice()).starts_with("! Expected text value '1' but was '2'"));
        assert_eq!(render_summary(diff.as_slice()), "differences=1 different=1 similar=0");
        assert_eq!(render_verdict(diff.as_slice()), "different");
        assert_eq!(render_verdict(&[]), "identical");
    }
}
