//! Redirector CLI
//!
//! CLI tool for validating rule files, compiling static descriptors and
//! evaluating URLs against a rule set.

use std::fs;

use clap::{Parser, Subcommand};

use rdr_compiler::{compile_static, load_records, parse_rule_file};
use rdr_core::partition::PartitionedRuleSet;
use rdr_core::types::RequestKind;

#[derive(Parser)]
#[command(name = "rdr-cli")]
#[command(about = "Redirector rule file compiler and tools")]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Validate a rule file and report dropped rules
    Validate {
        /// Rule file (storage array or export format)
        #[arg(short, long)]
        input: String,
    },

    /// Compile static rule descriptors for declarative enforcement
    Compile {
        /// Rule file (storage array or export format)
        #[arg(short, long)]
        input: String,

        /// Output file; stdout when omitted
        #[arg(short, long)]
        output: Option<String>,
    },

    /// Evaluate a URL against a rule file
    Evaluate {
        /// Rule file (storage array or export format)
        #[arg(short, long)]
        input: String,

        /// Candidate URL
        #[arg(short, long)]
        url: String,

        /// Request kind
        #[arg(short, long, default_value = "main_frame")]
        kind: RequestKind,
    },
}

fn main() {
    env_logger::init();
    let cli = Cli::parse();

    let result = match cli.command {
        Commands::Validate { input } => cmd_validate(&input),
        Commands::Compile { input, output } => cmd_compile(&input, output.as_deref()),
        Commands::Evaluate { input, url, kind } => cmd_evaluate(&input, &url, kind),
    };

    if let Err(e) = result {
        eprintln!("Error: {e}");
        std::process::exit(1);
    }
}

fn load_rules(input: &str) -> Result<rdr_compiler::LoadReport, String> {
    let text = fs::read_to_string(input).map_err(|e| format!("cannot read {input}: {e}"))?;
    let records = parse_rule_file(&text).map_err(|e| e.to_string())?;
    Ok(load_records(records))
}

fn cmd_validate(input: &str) -> Result<(), String> {
    let report = load_rules(input)?;

    println!("{}: {} valid rules", input, report.rules.len());
    for skipped in &report.skipped {
        println!("  dropped `{}`: {}", skipped.description, skipped.error);
    }

    let static_count = compile_static(&report.rules).len();
    let dynamic_count = report
        .rules
        .iter()
        .filter(|r| !r.disabled() && r.has_placeholders())
        .count();
    println!("  {static_count} static descriptors, {dynamic_count} dynamic rules");

    let set = PartitionedRuleSet::build(report.rules);
    if set.is_empty() {
        println!("  no enabled rules");
        return Ok(());
    }

    // Bucket keys are unordered; sort for stable output.
    let mut kinds: Vec<RequestKind> = set.kinds().collect();
    kinds.sort_by(|a, b| a.as_str().cmp(b.as_str()));
    for kind in kinds {
        println!("  {}: {} rules", kind.as_str(), set.rules_for(kind).len());
    }

    Ok(())
}

fn cmd_compile(input: &str, output: Option<&str>) -> Result<(), String> {
    let report = load_rules(input)?;
    let descriptors = compile_static(&report.rules);

    let json = serde_json::to_string_pretty(&descriptors).map_err(|e| e.to_string())?;
    match output {
        Some(path) => {
            fs::write(path, json).map_err(|e| format!("cannot write {path}: {e}"))?;
            println!("Wrote {} descriptors to {path}", descriptors.len());
        }
        None => println!("{json}"),
    }

    Ok(())
}

fn cmd_evaluate(input: &str, url: &str, kind: RequestKind) -> Result<(), String> {
    let report = load_rules(input)?;
    let set = PartitionedRuleSet::build(report.rules);

    // First rule in authored order wins, same as the engine and the
    // enforcement mechanism.
    for rule in set.rules_for(kind) {
        let result = rule.evaluate(url);
        if let Some(destination) = result.redirect_to {
            let path = if kind.is_network() && !rule.has_placeholders() {
                "static"
            } else {
                "dynamic"
            };
            println!("{url} ===> {destination}");
            println!("  rule: {} ({path} path)", rule.description());
            return Ok(());
        }
    }

    println!("{url}: no match");
    Ok(())
}
