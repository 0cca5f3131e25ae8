use std::collections::BTreeMap;
use std::fs;
use std::path::Path;
use std::process::ExitCode;

use anyhow::{Context, Result};
use clap::Parser;
use xml_compare::config::{load_config, CompareConfig};
use xml_compare::inspect::render_tree;
use xml_compare::report::{render_summary, render_text, render_verdict};
use xml_compare_core::diff::listener::StopWhenDifferent;
use xml_compare_core::{format_json, parse_with_options, DiffBuilder, NodeKind, ParseOptions, XmlNode};

mod cli;

use cli::{Cli, Command, DiffArgs, InspectArgs, OutputFormat};

fn main() -> ExitCode {
    let cli = Cli::parse();
    init_tracing(cli.verbose);

    let outcome = match cli.command {
        Command::Diff(args) => run_diff(args),
        Command::Inspect(args) => run_inspect(args).map(|()| ExitCode::SUCCESS),
    };
    match outcome {
        Ok(code) => code,
        Err(err) => {
            eprintln!("error: {err:#}");
            ExitCode::from(2)
        }
    }
}

fn init_tracing(verbose: bool) {
    use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

    let default = if verbose { "debug" } else { "warn" };
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default));

    tracing_subscriber::registry()
        .with(filter)
        .with(
            tracing_subscriber::fmt::layer()
                .with_writer(std::io::stderr)
                .with_target(false),
        )
        .init();
}

fn read_tree(path: &Path, keep_whitespace: bool) -> Result<XmlNode> {
    let bytes = fs::read(path).with_context(|| format!("failed to read {}", path.display()))?;
    parse_with_options(&bytes, &ParseOptions { keep_whitespace })
        .with_context(|| format!("failed to parse {}", path.display()))
}

/// File settings first, then command-line flags on top.
fn settings(args: &DiffArgs) -> Result<CompareConfig> {
    let mut config = match &args.config {
        Some(path) => load_config(path)?,
        None => CompareConfig::default(),
    };
    if args.pairing.is_some() {
        config.pairing = args.pairing;
    }
    if args.tolerance.is_some() {
        config.tolerance = args.tolerance;
    }
    config.similar |= args.similar;
    config.placeholders |= args.placeholders;
    config.validate()?;
    Ok(config)
}

fn run_diff(args: DiffArgs) -> Result<ExitCode> {
    let config = settings(&args)?;
    let control = read_tree(&args.control, args.keep_whitespace)?;
    let test = read_tree(&args.test, args.keep_whitespace)?;

    let ignore_comments = config.ignore_comments;
    let ignored_attributes = config.ignore_attributes.clone();
    let mut builder = DiffBuilder::compare(&control, &test)
        .with_node_matcher(config.node_matcher()?)
        .with_difference_evaluator(config.evaluator()?)
        .with_namespace_context(config.namespaces.clone())
        .with_node_filter(move |node| !(ignore_comments && node.kind == NodeKind::Comment))
        .with_attribute_filter(move |attr| !ignored_attributes.iter().any(|name| *name == attr.name.local));
    if args.stop_on_first {
        builder = builder.with_comparison_controller(StopWhenDifferent);
    }
    if args.identical {
        builder = builder.check_for_identical();
    }
    let diff = builder.build();
    tracing::debug!(differences = diff.len(), "comparison finished");

    if args.summary {
        println!("{}", render_summary(diff.as_slice()));
        println!("{}", render_verdict(diff.as_slice()));
    } else {
        match args.format {
            OutputFormat::Text => {
                if !diff.is_empty() {
                    println!("{}", render_text(diff.as_slice()));
                    println!();
                }
                println!("{}", render_verdict(diff.as_slice()));
            }
            OutputFormat::Json => println!("{}", format_json(diff.as_slice())),
        }
    }

    if diff.has_differences() && !args.no_fail {
        return Ok(ExitCode::from(1));
    }
    Ok(ExitCode::SUCCESS)
}

fn run_inspect(args: InspectArgs) -> Result<()> {
    let node = read_tree(&args.file, args.keep_whitespace)?;
    print!("{}", render_tree(&node, args.depth, &BTreeMap::new()));
    Ok(())
}
