mod config;

use std::path::{Path, PathBuf};
use std::process;
use std::sync::Arc;

use clap::{Parser, Subcommand, ValueEnum};
use docket_eval::assemble::{assemble_facts, value_to_json};
use docket_eval::{RuleSet, TimeZoneDatabase};

/// Output format for CLI responses.
#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub(crate) enum OutputFormat {
    Text,
    Json,
}

/// Docket rule set evaluator.
#[derive(Parser)]
#[command(name = "docket", version, about = "Docket rule set evaluator")]
struct Cli {
    /// Output format (text or json)
    #[arg(long, global = true, default_value = "text", value_enum)]
    output: OutputFormat,

    /// Suppress non-essential output
    #[arg(long, global = true)]
    quiet: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Evaluate a rule set against a set of facts
    Eval {
        /// Path to the rule set interchange JSON file
        rules: PathBuf,
        /// Path to the facts JSON file
        #[arg(long)]
        facts: PathBuf,
        /// Path to a zones TOML file (UTC only when omitted)
        #[arg(long)]
        zones: Option<PathBuf>,
    },

    /// Load a rule set and report its shape without evaluating it
    Check {
        /// Path to the rule set interchange JSON file
        rules: PathBuf,
        /// Path to a zones TOML file (UTC only when omitted)
        #[arg(long)]
        zones: Option<PathBuf>,
    },
}

fn main() {
    init_tracing();
    let cli = Cli::parse();

    match cli.command {
        Commands::Eval {
            rules,
            facts,
            zones,
        } => {
            cmd_eval(&rules, &facts, zones.as_deref(), cli.output, cli.quiet);
        }
        Commands::Check { rules, zones } => {
            cmd_check(&rules, zones.as_deref(), cli.output, cli.quiet);
        }
    }
}

/// Log to stderr, filtered by `DOCKET_LOG` (default `warn`).
fn init_tracing() {
    use tracing_subscriber::{fmt, EnvFilter};

    let filter = EnvFilter::try_from_env("DOCKET_LOG").unwrap_or_else(|_| EnvFilter::new("warn"));

    fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .with_target(false)
        .init();
}

/// Read and parse a JSON file, exiting with an error report on failure.
fn read_json(path: &Path, what: &str, output: OutputFormat, quiet: bool) -> serde_json::Value {
    let text = match std::fs::read_to_string(path) {
        Ok(s) => s,
        Err(_) => {
            let msg = format!("error: {} file not found: {}", what, path.display());
            report_error(&msg, output, quiet);
            process::exit(1);
        }
    };
    match serde_json::from_str(&text) {
        Ok(v) => v,
        Err(e) => {
            let msg = format!("error: invalid JSON in {}: {}", path.display(), e);
            report_error(&msg, output, quiet);
            process::exit(1);
        }
    }
}

fn load_zones(path: Option<&Path>, output: OutputFormat, quiet: bool) -> Arc<dyn TimeZoneDatabase> {
    match config::load_zones(path) {
        Ok(zones) => zones,
        Err(e) => {
            report_error(&format!("error: {}", e), output, quiet);
            process::exit(1);
        }
    }
}

fn load_rule_set(
    rules_path: &Path,
    zones: Option<&Path>,
    output: OutputFormat,
    quiet: bool,
) -> RuleSet {
    let rules = read_json(rules_path, "rules", output, quiet);
    let zones = load_zones(zones, output, quiet);
    match RuleSet::from_interchange(&rules, zones) {
        Ok(rule_set) => rule_set,
        Err(e) => {
            let msg = format!("error: {}: {}", rules_path.display(), e);
            report_error(&msg, output, quiet);
            process::exit(1);
        }
    }
}

fn cmd_eval(
    rules_path: &Path,
    facts_path: &Path,
    zones: Option<&Path>,
    output: OutputFormat,
    quiet: bool,
) {
    let rule_set = load_rule_set(rules_path, zones, output, quiet);

    let facts_json = read_json(facts_path, "facts", output, quiet);
    let facts = match assemble_facts(&facts_json) {
        Ok(f) => f,
        Err(e) => {
            let msg = format!("error: {}: {}", facts_path.display(), e);
            report_error(&msg, output, quiet);
            process::exit(1);
        }
    };

    let value = match rule_set.call(facts) {
        Ok(v) => v,
        Err(e) => {
            let msg = format!("error: evaluation failed: {}", e);
            report_error(&msg, output, quiet);
            process::exit(1);
        }
    };

    if quiet {
        return;
    }
    match output {
        OutputFormat::Text => println!("{}", value),
        OutputFormat::Json => {
            let result = serde_json::json!({ "value": value_to_json(&value) });
            println!(
                "{}",
                serde_json::to_string_pretty(&result).unwrap_or_else(|_| result.to_string())
            );
        }
    }
}

fn cmd_check(rules_path: &Path, zones: Option<&Path>, output: OutputFormat, quiet: bool) {
    let rule_set = load_rule_set(rules_path, zones, output, quiet);

    if quiet {
        return;
    }
    let outcomes = rule_set.outcomes().len();
    let conditions = rule_set.tree().len();
    match output {
        OutputFormat::Text => {
            println!(
                "{}: {} outcome(s), {} condition node(s)",
                rules_path.display(),
                outcomes,
                conditions
            );
        }
        OutputFormat::Json => {
            let result = serde_json::json!({
                "rules": rules_path.display().to_string(),
                "outcomes": outcomes,
                "conditions": conditions,
                "fallback": value_to_json(rule_set.fallback()),
            });
            println!(
                "{}",
                serde_json::to_string_pretty(&result).unwrap_or_else(|_| result.to_string())
            );
        }
    }
}

pub(crate) fn report_error(msg: &str, output: OutputFormat, quiet: bool) {
    if quiet {
        return;
    }
    match output {
        OutputFormat::Text => eprintln!("{}", msg),
        OutputFormat::Json => eprintln!("{}", serde_json::json!({ "error": msg })),
    }
}
