//! File processing logic for jsplice

use anyhow::{Context, Result};
use std::collections::HashSet;
use std::path::Path;
use tracing::debug;

use jsplice_core::{Ast, FormatOptions};
use jsplice_rules::{Applied, RuleSet};

/// Extensions of files picked up when walking directories
pub const SOURCE_EXTENSIONS: &[&str] = &["js", "mjs", "cjs"];

/// Outcome of processing a single file
#[derive(Debug)]
pub enum ProcessResult {
    /// No rule matched
    NoChanges,
    /// Rules rewrote the file
    Changed {
        applied: Vec<Applied>,
        old_source: String,
        new_source: String,
    },
    /// The file is not a program the parser accepts
    ParseError(String),
}

pub fn is_source_file(path: &Path) -> bool {
    path.extension()
        .and_then(|ext| ext.to_str())
        .is_some_and(|ext| SOURCE_EXTENSIONS.contains(&ext))
}

/// Process a single file and return the rewrites it would receive
pub fn process_file(
    path: &Path,
    registry: &RuleSet,
    enabled_rules: &HashSet<String>,
    format: &FormatOptions,
) -> Result<ProcessResult> {
    let source_code = std::fs::read_to_string(path)
        .with_context(|| format!("Failed to read file: {}", path.display()))?;
    process_source(&source_code, registry, enabled_rules, format)
        .with_context(|| format!("Failed to rewrite {}", path.display()))
}

/// Rewrite source text; the tree is only printed when a rule applied
pub fn process_source(
    source_code: &str,
    registry: &RuleSet,
    enabled_rules: &HashSet<String>,
    format: &FormatOptions,
) -> Result<ProcessResult> {
    let mut ast = match Ast::parse(source_code) {
        Ok(ast) => ast,
        Err(e) => return Ok(ProcessResult::ParseError(e.to_string())),
    };

    let applied = registry.apply(&mut ast, enabled_rules);
    if applied.is_empty() {
        return Ok(ProcessResult::NoChanges);
    }
    debug!(rewrites = applied.len(), "regenerating source");

    let mut new_source = ast.deparse_with(format)?;
    if source_code.ends_with('\n') && !new_source.ends_with('\n') {
        new_source.push('\n');
    }

    Ok(ProcessResult::Changed {
        applied,
        old_source: source_code.to_string(),
        new_source,
    })
}

/// Write the processed result to the file
pub fn write_file(path: &Path, content: &str) -> Result<()> {
    std::fs::write(path, content)
        .with_context(|| format!("Failed to write file: {}", path.display()))
}
