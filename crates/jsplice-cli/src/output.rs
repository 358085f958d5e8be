//! Output formatting for jsplice
//!
//! Supports text (colored terminal), JSON and unified diff output formats.

use anyhow::Result;
use colored::*;
use jsplice_rules::Applied;
use serde::Serialize;
use similar::{ChangeTag, TextDiff};
use std::path::Path;

/// Output format selection
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum OutputFormat {
    #[default]
    Text,
    Json,
    Diff,
}

impl OutputFormat {
    pub fn from_str(s: &str) -> Option<OutputFormat> {
        match s.to_lowercase().as_str() {
            "text" => Some(OutputFormat::Text),
            "json" => Some(OutputFormat::Json),
            "diff" => Some(OutputFormat::Diff),
            _ => None,
        }
    }
}

/// Result of processing a single file
#[derive(Debug, Clone, Serialize)]
pub struct FileResult {
    pub path: String,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub rewrites: Vec<Applied>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

impl FileResult {
    pub fn success(path: &Path, rewrites: Vec<Applied>) -> Self {
        Self {
            path: path.display().to_string(),
            rewrites,
            error: None,
        }
    }

    pub fn error(path: &Path, error: String) -> Self {
        Self {
            path: path.display().to_string(),
            rewrites: Vec::new(),
            error: Some(error),
        }
    }
}

/// Summary statistics
#[derive(Debug, Clone, Default, Serialize)]
pub struct Summary {
    pub files_processed: usize,
    pub files_with_changes: usize,
    pub total_rewrites: usize,
    pub errors: usize,
}

/// Full JSON output structure
#[derive(Debug, Serialize)]
pub struct JsonOutput {
    pub version: String,
    pub summary: Summary,
    pub files: Vec<FileResult>,
}

/// Reporter for accumulating and outputting results
pub struct Reporter {
    format: OutputFormat,
    verbose: bool,
    results: Vec<FileResult>,
    summary: Summary,
}

impl Reporter {
    pub fn new(format: OutputFormat, verbose: bool) -> Self {
        Self {
            format,
            verbose,
            results: Vec::new(),
            summary: Summary::default(),
        }
    }

    fn count_changes(&mut self, rewrites: &[Applied]) {
        self.summary.files_processed += 1;
        self.summary.files_with_changes += 1;
        self.summary.total_rewrites += rewrites.len();
    }

    /// Report a file with changes (in check mode - showing what would change)
    pub fn report_check(
        &mut self,
        path: &Path,
        rewrites: Vec<Applied>,
        old_source: &str,
        new_source: &str,
    ) {
        self.count_changes(&rewrites);

        match self.format {
            OutputFormat::Text => {
                println!("{}", path.display().to_string().bold());
                print_diff(old_source, new_source);
                println!();
                print_rewrites(&rewrites);
                println!();
            }
            OutputFormat::Diff => {
                print!("{}", unified_diff(path, old_source, new_source));
            }
            OutputFormat::Json => {
                // JSON output is handled in finish()
            }
        }

        self.results.push(FileResult::success(path, rewrites));
    }

    /// Report a file after applying fixes
    pub fn report_fix(&mut self, path: &Path, rewrites: Vec<Applied>) {
        self.count_changes(&rewrites);

        if self.format == OutputFormat::Text {
            println!("{}", path.display().to_string().bold());
            println!("  {} Applied {} rewrite(s)", "OK".green(), rewrites.len());
            if self.verbose {
                print_rewrites(&rewrites);
            }
            println!();
        }

        self.results.push(FileResult::success(path, rewrites));
    }

    /// Report a file that needed no changes
    pub fn report_skipped(&mut self, path: &Path) {
        self.summary.files_processed += 1;
        if self.verbose && self.format == OutputFormat::Text {
            println!("{}: No changes needed", path.display());
        }
        self.results.push(FileResult::success(path, vec![]));
    }

    /// Report an error processing a file
    pub fn report_error(&mut self, path: &Path, error: &str) {
        self.summary.files_processed += 1;
        self.summary.errors += 1;

        if self.format != OutputFormat::Json {
            eprintln!("{}: {} - {}", "Warning".yellow(), path.display(), error);
        }

        self.results.push(FileResult::error(path, error.to_string()));
    }

    /// Print final summary/output
    pub fn finish(self, check_mode: bool) -> Result<()> {
        match self.format {
            OutputFormat::Text => {
                println!();
                println!("{}", "Summary".bold().underline());
                println!("  Files processed: {}", self.summary.files_processed);
                println!("  Files with changes: {}", self.summary.files_with_changes);
                println!("  Total rewrites: {}", self.summary.total_rewrites);
                if self.summary.errors > 0 {
                    println!("  Errors: {}", self.summary.errors);
                }

                if check_mode && self.summary.total_rewrites > 0 {
                    println!();
                    println!("{}", "Run with --fix to apply changes".yellow());
                }
            }
            OutputFormat::Json => {
                let output = JsonOutput {
                    version: env!("CARGO_PKG_VERSION").to_string(),
                    summary: self.summary,
                    files: self.results,
                };
                println!("{}", serde_json::to_string_pretty(&output)?);
            }
            OutputFormat::Diff => {
                // Patch-compatible output has no summary
            }
        }
        Ok(())
    }

    /// Get summary for exit code determination
    pub fn summary(&self) -> &Summary {
        &self.summary
    }
}

fn print_rewrites(rewrites: &[Applied]) {
    for rewrite in rewrites {
        println!(
            "  {} {} ({} {}): {} {} {}",
            "->".green(),
            rewrite.rule.cyan(),
            rewrite.action,
            rewrite.kind,
            rewrite.before,
            "=>".dimmed(),
            rewrite.after
        );
    }
}

/// Print changed lines in color
fn print_diff(old: &str, new: &str) {
    let diff = TextDiff::from_lines(old, new);
    for change in diff.iter_all_changes() {
        let line = change.to_string_lossy();
        let line = line.trim_end_matches('\n');
        match change.tag() {
            ChangeTag::Delete => println!("  {}", format!("- {}", line).red()),
            ChangeTag::Insert => println!("  {}", format!("+ {}", line).green()),
            // Skip unchanged lines for cleaner output
            ChangeTag::Equal => {}
        }
    }
}

/// Render a unified diff (standard diff -u compatible)
pub fn unified_diff(path: &Path, old: &str, new: &str) -> String {
    let path_str = path.display().to_string();
    let diff = TextDiff::from_lines(old, new);
    let mut unified = diff.unified_diff();
    unified
        .context_radius(3)
        .header(&format!("a/{}", path_str), &format!("b/{}", path_str));
    unified.to_string()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn rewrite() -> Applied {
        Applied {
            rule: "guard_debug".to_string(),
            action: "wrap",
            kind: "CallExpression".to_string(),
            before: "debug('x')".to_string(),
            after: "DEBUG && debug('x')".to_string(),
        }
    }

    #[test]
    fn test_output_format_from_str() {
        assert_eq!(OutputFormat::from_str("text"), Some(OutputFormat::Text));
        assert_eq!(OutputFormat::from_str("JSON"), Some(OutputFormat::Json));
        assert_eq!(OutputFormat::from_str("diff"), Some(OutputFormat::Diff));
        assert_eq!(OutputFormat::from_str("xml"), None);
    }

    #[test]
    fn test_reporter_summary() {
        let mut reporter = Reporter::new(OutputFormat::Json, false);
        reporter.report_check(Path::new("a.js"), vec![rewrite(), rewrite()], "a\n", "b\n");
        reporter.report_skipped(Path::new("b.js"));
        reporter.report_error(Path::new("c.js"), "Unexpected token");

        let summary = reporter.summary();
        assert_eq!(summary.files_processed, 3);
        assert_eq!(summary.files_with_changes, 1);
        assert_eq!(summary.total_rewrites, 2);
        assert_eq!(summary.errors, 1);
    }

    #[test]
    fn test_json_serialization() {
        let output = JsonOutput {
            version: "0.1.0".to_string(),
            summary: Summary {
                files_processed: 2,
                files_with_changes: 1,
                total_rewrites: 1,
                errors: 0,
            },
            files: vec![
                FileResult::success(Path::new("app.js"), vec![rewrite()]),
                FileResult::success(Path::new("lib.js"), vec![]),
            ],
        };

        let json = serde_json::to_string(&output).unwrap();
        assert!(json.contains("\"version\":\"0.1.0\""));
        assert!(json.contains("\"files_processed\":2"));
        assert!(json.contains("\"rule\":\"guard_debug\""));
        assert!(json.contains("\"action\":\"wrap\""));
        assert!(!json.contains("\"error\""));
    }

    #[test]
    fn test_unified_diff() {
        let diff = unified_diff(Path::new("app.js"), "a();\nb();\n", "a();\nc();\n");
        assert!(diff.starts_with("--- a/app.js\n+++ b/app.js\n"));
        assert!(diff.contains("@@ -1,2 +1,2 @@"));
        assert!(diff.contains("-b();\n"));
        assert!(diff.contains("+c();\n"));
    }
}
