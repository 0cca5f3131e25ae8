use std::path::PathBuf;

use clap::{Parser, ValueEnum};
use xml_compare::config::Pairing;

#[derive(Parser, Debug)]
#[command(name = "xml-compare")]
#[command(about = "Compare and inspect XML documents structurally")]
pub struct Cli {
    /// Log engine decisions to stderr (overridden by RUST_LOG).
    #[arg(short, long, global = true)]
    pub verbose: bool,
    #[command(subcommand)]
    pub command: Command,
}

#[derive(clap::Subcommand, Debug)]
pub enum Command {
    /// Compare a control document with a test document.
    Diff(DiffArgs),
    /// Show the parsed tree of a single document with node positions.
    Inspect(InspectArgs),
}

#[derive(Parser, Debug)]
pub struct DiffArgs {
    pub control: PathBuf,
    pub test: PathBuf,
    /// Child pairing policy.
    #[arg(long, value_enum)]
    pub pairing: Option<Pairing>,
    /// Treat numeric values within this distance as equal.
    #[arg(long)]
    pub tolerance: Option<f64>,
    /// Downgrade cosmetic differences (prefixes, encoding, CDATA) to similar.
    #[arg(long)]
    pub similar: bool,
    /// Resolve ${xmlcompare.*} placeholders in the control document.
    #[arg(long)]
    pub placeholders: bool,
    /// Stop at the first difference.
    #[arg(long)]
    pub stop_on_first: bool,
    /// Similar differences also count as failures.
    #[arg(long)]
    pub identical: bool,
    #[arg(long, value_enum, default_value_t = OutputFormat::Text)]
    pub format: OutputFormat,
    /// Print counts only.
    #[arg(long)]
    pub summary: bool,
    /// Keep whitespace-only text nodes.
    #[arg(long)]
    pub keep_whitespace: bool,
    /// TOML file with comparison settings.
    #[arg(long)]
    pub config: Option<PathBuf>,
    /// Exit successfully even when differences are found.
    #[arg(long)]
    pub no_fail: bool,
}

#[derive(Parser, Debug)]
pub struct InspectArgs {
    pub file: PathBuf,
    #[arg(long, default_value_t = 8)]
    pub depth: usize,
    /// Keep whitespace-only text nodes.
    #[arg(long)]
    pub keep_whitespace: bool,
}

#[derive(Debug, Clone, Copy, ValueEnum)]
pub enum OutputFormat {
    Text,
    Json,
}
