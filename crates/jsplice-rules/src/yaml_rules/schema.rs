//! YAML rule schema definitions
//!
//! Defines the structure of YAML-based rewrite rules using serde
//! for deserialization from YAML format.

use std::collections::BTreeMap;

use jsplice_core::{ClassificationTable, Template};
use regex::Regex;
use serde::{Deserialize, Serialize};

/// A complete YAML-defined rewrite rule
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct YamlRule {
    /// Unique rule identifier (e.g., "guard_debug")
    pub name: String,

    /// Human-readable description
    pub description: String,

    /// Pattern to match in the tree
    #[serde(rename = "match")]
    pub match_pattern: MatchPattern,

    /// Splicing operation applied to matching nodes
    pub action: Action,

    /// Snippet template; `<%= node %>` stands for the matched node's source
    pub template: String,

    /// Inline test cases
    #[serde(default)]
    pub tests: Vec<TestCase>,
}

/// Shape a node must have for the rule to apply
#[derive(Debug, Clone, Default, Deserialize, Serialize)]
pub struct MatchPattern {
    /// Node kind (e.g., CallExpression, Literal)
    pub node: String,

    /// Callee of a call or `new`: an identifier, a dotted path such as
    /// `console.log`, or a regex between slashes matched against the path
    #[serde(default)]
    pub callee: Option<String>,

    #[serde(default)]
    pub min_args: Option<usize>,

    #[serde(default)]
    pub max_args: Option<usize>,

    /// Required kinds of positional arguments
    #[serde(default)]
    pub arg_kinds: BTreeMap<usize, String>,
}

impl MatchPattern {
    /// Callee pattern when written as `/regex/`
    pub fn callee_regex(&self) -> Option<&str> {
        let callee = self.callee.as_deref()?;
        callee
            .strip_prefix('/')
            .and_then(|rest| rest.strip_suffix('/'))
            .filter(|pattern| !pattern.is_empty())
    }

    /// Whether the pattern inspects call-only fields
    pub fn needs_call(&self) -> bool {
        self.callee.is_some()
            || self.min_args.is_some()
            || self.max_args.is_some()
            || !self.arg_kinds.is_empty()
    }
}

/// Splicing operation performed on a match
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Action {
    Replace,
    Wrap,
    Prefix,
    Suffix,
}

impl Action {
    pub fn as_str(&self) -> &'static str {
        match self {
            Action::Replace => "replace",
            Action::Wrap => "wrap",
            Action::Prefix => "prefix",
            Action::Suffix => "suffix",
        }
    }
}

/// Test case for a rule
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct TestCase {
    /// Input program
    pub input: String,

    /// Expected output; absent when the rule should not match
    #[serde(default)]
    pub output: Option<String>,

    /// Skip this test case
    #[serde(default)]
    pub skip: bool,
}

const CALL_KINDS: &[&str] = &["CallExpression", "NewExpression"];

impl YamlRule {
    /// Validate the rule structure
    pub fn validate(&self) -> Result<(), String> {
        if self.name.is_empty() {
            return Err("Rule name is required".to_string());
        }
        if self.description.is_empty() {
            return Err("Rule description is required".to_string());
        }

        let table = ClassificationTable::shared();
        let pattern = &self.match_pattern;
        if !table.is_known(&pattern.node) {
            return Err(format!("Unknown node kind '{}'", pattern.node));
        }
        if pattern.needs_call() && !CALL_KINDS.contains(&pattern.node.as_str()) {
            return Err(format!(
                "callee and argument checks need CallExpression or NewExpression, not '{}'",
                pattern.node
            ));
        }
        if let (Some(min), Some(max)) = (pattern.min_args, pattern.max_args) {
            if min > max {
                return Err(format!("min_args ({}) is greater than max_args ({})", min, max));
            }
        }
        for (position, kind) in &pattern.arg_kinds {
            if !table.is_known(kind) {
                return Err(format!("Unknown node kind '{}' for argument {}", kind, position));
            }
            if pattern.max_args.is_some_and(|max| *position >= max) {
                return Err(format!("Argument {} is beyond max_args", position));
            }
        }
        if let Some(callee) = pattern.callee_regex() {
            Regex::new(callee).map_err(|e| format!("Invalid callee regex: {}", e))?;
        }

        if self.template.trim().is_empty() {
            return Err("Rule template is required".to_string());
        }
        let template = Template::compile(&self.template).map_err(|e| e.to_string())?;
        if self.action == Action::Wrap && template.slot_count() == 0 {
            return Err("A wrap template must contain <%= node %>".to_string());
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn parse(yaml: &str) -> YamlRule {
        serde_yaml::from_str(yaml).unwrap()
    }

    #[test]
    fn test_parse_simple_rule() {
        let yaml = r#"
name: guard_debug
description: Wrap debug() calls in a guard

match:
  node: CallExpression
  callee: debug
  min_args: 1
  arg_kinds: { 0: Literal }

action: wrap
template: "DEBUG && <%= node %>"

tests:
  - input: "debug('x')"
    output: "DEBUG && debug('x')"
  - input: "log('x')"
"#;
        let rule = parse(yaml);
        assert_eq!(rule.name, "guard_debug");
        assert_eq!(rule.action, Action::Wrap);
        assert_eq!(rule.match_pattern.callee.as_deref(), Some("debug"));
        assert_eq!(rule.match_pattern.min_args, Some(1));
        assert_eq!(rule.match_pattern.arg_kinds.get(&0).map(String::as_str), Some("Literal"));
        assert_eq!(rule.tests.len(), 2);
        assert!(rule.tests[1].output.is_none());
        assert!(rule.validate().is_ok());
    }

    #[test]
    fn test_callee_regex() {
        let pattern = MatchPattern {
            node: "CallExpression".to_string(),
            callee: Some("/^console\\./".to_string()),
            ..Default::default()
        };
        assert_eq!(pattern.callee_regex(), Some("^console\\."));

        let plain = MatchPattern {
            callee: Some("console.log".to_string()),
            ..pattern.clone()
        };
        assert_eq!(plain.callee_regex(), None);
    }

    // ==================== Validation ====================

    fn rule(node: &str, action: Action, template: &str) -> YamlRule {
        YamlRule {
            name: "test".to_string(),
            description: "Test".to_string(),
            match_pattern: MatchPattern {
                node: node.to_string(),
                ..Default::default()
            },
            action,
            template: template.to_string(),
            tests: Vec::new(),
        }
    }

    #[test]
    fn test_validate_unknown_node() {
        let err = rule("FuncCall", Action::Replace, "x").validate().unwrap_err();
        assert!(err.contains("FuncCall"));
    }

    #[test]
    fn test_validate_call_checks_on_other_kinds() {
        let mut invalid = rule("Identifier", Action::Replace, "x");
        invalid.match_pattern.min_args = Some(1);
        assert!(invalid.validate().is_err());
    }

    #[test]
    fn test_validate_argument_bounds() {
        let mut invalid = rule("CallExpression", Action::Replace, "x");
        invalid.match_pattern.min_args = Some(3);
        invalid.match_pattern.max_args = Some(1);
        assert!(invalid.validate().unwrap_err().contains("min_args"));

        let mut beyond = rule("CallExpression", Action::Replace, "x");
        beyond.match_pattern.max_args = Some(1);
        beyond.match_pattern.arg_kinds.insert(2, "Literal".to_string());
        assert!(beyond.validate().unwrap_err().contains("beyond"));
    }

    #[test]
    fn test_validate_template() {
        assert!(rule("Literal", Action::Replace, "").validate().is_err());
        assert!(rule("Literal", Action::Replace, "f(<%= node").validate().is_err());
        assert!(rule("Literal", Action::Replace, "f(<%= other %>)").validate().is_err());
        assert!(rule("Literal", Action::Wrap, "f()").validate().is_err());
        assert!(rule("Literal", Action::Wrap, "f(<%= node %>)").validate().is_ok());
        assert!(rule("Literal", Action::Prefix, "log()").validate().is_ok());
    }

    #[test]
    fn test_validate_bad_callee_regex() {
        let mut invalid = rule("CallExpression", Action::Replace, "x");
        invalid.match_pattern.callee = Some("/(/".to_string());
        assert!(invalid.validate().unwrap_err().contains("regex"));
    }
}
