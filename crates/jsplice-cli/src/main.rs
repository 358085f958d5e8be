//! jsplice CLI - rewrite JavaScript with declarative splicing rules
//!
//! Bundled rules:
//! - array_literal: Convert new Array() to []
//! - object_literal: Convert new Object() to {}
//! - guard_debug: Wrap debug('...') calls in a DEBUG guard
//! - strip_console: Replace console.log/info/debug calls with void 0
//!
//! More rules are loaded from YAML files given with `--rules` or listed in
//! `.jsplice.toml`.

mod config;
mod output;
mod process;

use anyhow::{Context, Result};
use clap::Parser;
use colored::*;
use rayon::prelude::*;
use std::collections::HashSet;
use std::path::{Path, PathBuf};
use std::process::ExitCode;
use tracing::debug;
use tracing_subscriber::EnvFilter;

use config::Config;
use jsplice_core::FormatOptions;
use jsplice_rules::{
    builtin_rules, load_rules_from_dir, load_rules_from_file, Applied, RuleSet, YamlRuleInterpreter,
};
use output::{OutputFormat, Reporter};
use process::{is_source_file, process_file, write_file, ProcessResult};

#[derive(Parser)]
#[command(name = "jsplice")]
#[command(version)]
#[command(about = "Rewrite JavaScript by splicing source snippets into its syntax tree")]
struct Cli {
    /// Files or directories to process
    #[arg(required_unless_present_any = ["list_rules", "test_rules"])]
    paths: Vec<PathBuf>,

    /// YAML rule file or directory (can be specified multiple times)
    #[arg(long = "rules", value_name = "PATH")]
    rule_paths: Vec<PathBuf>,

    /// Rules to run (can be specified multiple times). Overrides config file.
    #[arg(long, short = 'r', value_name = "RULE")]
    rule: Vec<String>,

    /// Check for rewrites without applying them (default mode)
    #[arg(long, conflicts_with = "fix")]
    check: bool,

    /// Apply rewrites to files
    #[arg(long, conflicts_with = "check")]
    fix: bool,

    /// Show changes without applying them (alias for --check)
    #[arg(long, short = 'n', conflicts_with = "fix")]
    dry_run: bool,

    /// Output format: text, json, diff
    #[arg(long, value_name = "FORMAT")]
    format: Option<String>,

    /// Shorthand for --format json
    #[arg(long, conflicts_with = "format")]
    json: bool,

    /// Path to config file (default: auto-detect .jsplice.toml)
    #[arg(long, value_name = "PATH")]
    config: Option<PathBuf>,

    /// Ignore config files
    #[arg(long)]
    no_config: bool,

    /// List available rules and exit
    #[arg(long)]
    list_rules: bool,

    /// Run the inline tests of every rule and exit
    #[arg(long)]
    test_rules: bool,

    /// Print rewritten files without optional whitespace
    #[arg(long)]
    compact: bool,

    /// Show verbose output
    #[arg(long, short = 'v')]
    verbose: bool,
}

fn main() -> ExitCode {
    match run() {
        Ok(code) => code,
        Err(e) => {
            eprintln!("{}: {:#}", "Error".red(), e);
            ExitCode::from(1)
        }
    }
}

fn init_tracing(verbose: bool) {
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(if verbose { "debug" } else { "warn" }));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .with_target(false)
        .init();
}

fn run() -> Result<ExitCode> {
    let cli = Cli::parse();
    init_tracing(cli.verbose);

    let config = load_config(&cli)?;

    // Determine output format
    let output_format = if cli.json {
        OutputFormat::Json
    } else {
        let format = cli
            .format
            .as_deref()
            .or(config.output.format.as_deref())
            .unwrap_or("text");
        OutputFormat::from_str(format).ok_or_else(|| {
            anyhow::anyhow!("Invalid output format '{}'. Valid options: text, json, diff", format)
        })?
    };

    let rules = load_rules(&cli.rule_paths, &config.rules.paths)?;

    if cli.test_rules {
        return test_rules(&rules, output_format);
    }

    let mut registry = RuleSet::new();
    registry.extend(rules);

    if cli.list_rules {
        println!("{}", "Available rules:".bold());
        for (name, description) in registry.list() {
            println!("  {} - {}", name.green(), description);
        }
        return Ok(ExitCode::SUCCESS);
    }

    let all_rules = registry.names();
    for rule in &cli.rule {
        if !registry.contains(rule) {
            eprintln!(
                "{}: Unknown rule '{}'. Use --list-rules to see available rules.",
                "Error".red(),
                rule
            );
            return Ok(ExitCode::from(1));
        }
    }

    let enabled_rules = config.effective_rules(&all_rules, &cli.rule);
    if enabled_rules.is_empty() {
        eprintln!("{}: No rules enabled", "Error".red());
        return Ok(ExitCode::from(1));
    }

    let format_options = if cli.compact {
        FormatOptions {
            compact: true,
            ..config.format.clone()
        }
    } else {
        config.format.clone()
    };

    // --check, --dry-run and the default all leave files untouched
    let check_mode = cli.check || cli.dry_run || !cli.fix;
    let fix_mode = !check_mode;

    if cli.verbose && output_format == OutputFormat::Text {
        println!("{}: {}", "Mode".bold(), if fix_mode { "fix" } else { "check" });
        let mut names: Vec<&String> = enabled_rules.iter().collect();
        names.sort();
        println!(
            "{}: {}",
            "Rules".bold(),
            names.iter().map(|s| s.as_str()).collect::<Vec<_>>().join(", ")
        );
        println!();
    }

    let (mut file_paths, missing_paths) = collect_files(&cli.paths, &config);
    file_paths.sort();
    debug!(files = file_paths.len(), "collected source files");

    // Process files in parallel, one tree per file
    let results: Vec<(PathBuf, FileResult)> = file_paths
        .into_par_iter()
        .map(|path| {
            let result = process_file_to_result(&path, &registry, &enabled_rules, &format_options);
            (path, result)
        })
        .collect();

    let mut reporter = Reporter::new(output_format, cli.verbose);

    if output_format != OutputFormat::Json {
        for path in &missing_paths {
            eprintln!("{}: Path does not exist: {}", "Warning".yellow(), path.display());
        }
    }

    for (path, result) in results {
        report_result(&path, result, fix_mode, &mut reporter)?;
    }

    let summary = reporter.summary();
    let exit_code = if summary.errors > 0 || !missing_paths.is_empty() {
        ExitCode::from(1)
    } else if check_mode && summary.files_with_changes > 0 {
        ExitCode::from(2)
    } else {
        ExitCode::SUCCESS
    };

    reporter.finish(check_mode)?;

    Ok(exit_code)
}

fn load_config(cli: &Cli) -> Result<Config> {
    if cli.no_config {
        return Ok(Config::default());
    }
    if let Some(config_path) = &cli.config {
        debug!(path = %config_path.display(), "using config");
        return Config::load_path(config_path);
    }
    match Config::load()? {
        Some((config, path)) => {
            debug!(path = %path.display(), "using config");
            Ok(config)
        }
        None => Ok(Config::default()),
    }
}

/// Bundled rules followed by rules from the command line and the config file
fn load_rules(cli_paths: &[PathBuf], config_paths: &[PathBuf]) -> Result<Vec<YamlRuleInterpreter>> {
    let mut rules = builtin_rules().context("Failed to load bundled rules")?;

    for path in cli_paths.iter().chain(config_paths) {
        let loaded = if path.is_dir() {
            load_rules_from_dir(path)
        } else {
            load_rules_from_file(path)
        }
        .with_context(|| format!("Failed to load rules from {}", path.display()))?;
        rules.extend(loaded);
    }

    Ok(rules)
}

fn test_rules(rules: &[YamlRuleInterpreter], output_format: OutputFormat) -> Result<ExitCode> {
    let results: Vec<_> = rules.iter().flat_map(|rule| rule.run_tests()).collect();
    let failed = results.iter().filter(|result| !result.passed).count();

    if output_format == OutputFormat::Json {
        println!("{}", serde_json::to_string_pretty(&results)?);
    } else {
        for result in &results {
            if result.passed {
                println!("{} {}: {}", "PASS".green(), result.rule, result.input);
                continue;
            }
            println!("{} {}: {}", "FAIL".red(), result.rule, result.input);
            if let Some(expected) = &result.expected {
                println!("  expected: {}", expected);
            }
            if let Some(actual) = &result.actual {
                println!("  actual:   {}", actual);
            }
            if let Some(error) = &result.error {
                println!("  {}", error.yellow());
            }
        }
        println!();
        println!("{} passed, {} failed", results.len() - failed, failed);
    }

    Ok(if failed > 0 {
        ExitCode::from(1)
    } else {
        ExitCode::SUCCESS
    })
}

/// Source files under `paths`, and the paths that do not exist
fn collect_files(paths: &[PathBuf], config: &Config) -> (Vec<PathBuf>, Vec<PathBuf>) {
    let mut file_paths = Vec::new();
    let mut missing_paths = Vec::new();

    for path in paths {
        if path.is_file() {
            file_paths.push(path.clone());
        } else if path.is_dir() {
            for entry in walkdir::WalkDir::new(path)
                .into_iter()
                .filter_map(|e| e.ok())
                .filter(|e| e.file_type().is_file() && is_source_file(e.path()))
            {
                let file_path = entry.path();
                if !config.should_exclude(file_path) {
                    file_paths.push(file_path.to_path_buf());
                }
            }
        } else {
            missing_paths.push(path.clone());
        }
    }

    (file_paths, missing_paths)
}

/// Result of processing a single file (for parallel processing)
enum FileResult {
    NoChanges,
    HasChanges {
        applied: Vec<Applied>,
        old_source: String,
        new_source: String,
    },
    ParseError(String),
    Error(String),
}

/// Process a file and return a result (no writes, suitable for parallel execution)
fn process_file_to_result(
    path: &Path,
    registry: &RuleSet,
    enabled_rules: &HashSet<String>,
    format: &FormatOptions,
) -> FileResult {
    match process_file(path, registry, enabled_rules, format) {
        Ok(ProcessResult::NoChanges) => FileResult::NoChanges,
        Ok(ProcessResult::Changed {
            applied,
            old_source,
            new_source,
        }) => FileResult::HasChanges {
            applied,
            old_source,
            new_source,
        },
        Ok(ProcessResult::ParseError(message)) => FileResult::ParseError(message),
        Err(e) => FileResult::Error(format!("{:#}", e)),
    }
}

/// Report a file result and optionally apply the rewrite
fn report_result(
    path: &Path,
    result: FileResult,
    fix_mode: bool,
    reporter: &mut Reporter,
) -> Result<()> {
    match result {
        FileResult::NoChanges => reporter.report_skipped(path),
        FileResult::HasChanges {
            applied,
            old_source,
            new_source,
        } => {
            if fix_mode {
                write_file(path, &new_source)?;
                reporter.report_fix(path, applied);
            } else {
                reporter.report_check(path, applied, &old_source, &new_source);
            }
        }
        FileResult::ParseError(message) => {
            reporter.report_error(path, &format!("Parse error, skipping: {}", message));
        }
        FileResult::Error(message) => reporter.report_error(path, &message),
    }
    Ok(())
}
