//! YAML rule loader
//!
//! Load YAML rules from files, directories, or strings.

use std::fs;
use std::path::Path;

use jsplice_core::TemplateError;
use thiserror::Error;
use tracing::{debug, warn};

use super::interpreter::YamlRuleInterpreter;
use super::schema::YamlRule;

/// Errors that can occur when loading YAML rules
#[derive(Debug, Error)]
pub enum LoadError {
    #[error("Failed to read file: {0}")]
    Io(#[from] std::io::Error),

    #[error("Failed to parse YAML: {0}")]
    Yaml(#[from] serde_yaml::Error),

    #[error("Invalid rule: {0}")]
    Validation(String),

    #[error("Invalid template: {0}")]
    Template(#[from] TemplateError),
}

/// Load one rule or a list of rules from a string
pub fn load_rules_from_string(yaml: &str) -> Result<Vec<YamlRuleInterpreter>, LoadError> {
    // Try to parse as a single rule first
    if let Ok(rule) = serde_yaml::from_str::<YamlRule>(yaml) {
        return Ok(vec![YamlRuleInterpreter::new(rule)?]);
    }

    let rules: Vec<YamlRule> = serde_yaml::from_str(yaml)?;
    rules.into_iter().map(YamlRuleInterpreter::new).collect()
}

/// Load YAML rules from a file
pub fn load_rules_from_file(path: &Path) -> Result<Vec<YamlRuleInterpreter>, LoadError> {
    let content = fs::read_to_string(path)?;
    let rules = load_rules_from_string(&content)?;
    debug!(path = %path.display(), count = rules.len(), "loaded rules");
    Ok(rules)
}

/// Load all YAML rules below a directory
///
/// Files that fail to load are skipped with a warning.
pub fn load_rules_from_dir(dir: &Path) -> Result<Vec<YamlRuleInterpreter>, LoadError> {
    if !dir.is_dir() {
        return Err(LoadError::Io(std::io::Error::new(
            std::io::ErrorKind::NotFound,
            format!("Directory not found: {}", dir.display()),
        )));
    }

    let mut all_rules = Vec::new();
    walk_dir(dir, &mut all_rules)?;
    Ok(all_rules)
}

fn walk_dir(dir: &Path, rules: &mut Vec<YamlRuleInterpreter>) -> Result<(), LoadError> {
    let mut entries = fs::read_dir(dir)?
        .map(|entry| entry.map(|e| e.path()))
        .collect::<Result<Vec<_>, _>>()?;
    entries.sort();

    for path in entries {
        if path.is_dir() {
            walk_dir(&path, rules)?;
        } else if let Some(ext) = path.extension() {
            if ext == "yaml" || ext == "yml" {
                match load_rules_from_file(&path) {
                    Ok(loaded) => rules.extend(loaded),
                    Err(e) => warn!("Failed to load {}: {}", path.display(), e),
                }
            }
        }
    }

    Ok(())
}

/// Validate a YAML rule without loading it
pub fn validate_rule_string(yaml: &str) -> Result<(), LoadError> {
    let rule: YamlRule = serde_yaml::from_str(yaml)?;
    rule.validate().map_err(LoadError::Validation)?;
    Ok(())
}

/// Information about a rule
#[derive(Debug, Clone)]
pub struct RuleInfo {
    pub name: String,
    pub description: String,
    pub node: String,
    pub action: &'static str,
    pub test_count: usize,
}

impl From<&YamlRule> for RuleInfo {
    fn from(rule: &YamlRule) -> Self {
        Self {
            name: rule.name.clone(),
            description: rule.description.clone(),
            node: rule.match_pattern.node.clone(),
            action: rule.action.as_str(),
            test_count: rule.tests.len(),
        }
    }
}

/// Get information about rules in a file without validating them
pub fn get_rule_info(path: &Path) -> Result<Vec<RuleInfo>, LoadError> {
    let content = fs::read_to_string(path)?;

    if let Ok(rule) = serde_yaml::from_str::<YamlRule>(&content) {
        return Ok(vec![RuleInfo::from(&rule)]);
    }

    let rules: Vec<YamlRule> = serde_yaml::from_str(&content)?;
    Ok(rules.iter().map(RuleInfo::from).collect())
}
