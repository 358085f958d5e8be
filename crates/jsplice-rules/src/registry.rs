//! Rule trait and registry for jsplice rewrite rules

use std::collections::HashSet;

use jsplice_core::Ast;
use serde::Serialize;

use crate::yaml_rules::{load_rules_from_string, LoadError, YamlRuleInterpreter};

/// A rewrite rule that edits a tree in place
pub trait Rule: Send + Sync {
    /// The unique identifier for this rule (e.g., "guard_debug")
    fn name(&self) -> &str;

    /// A short description of what this rule does
    fn description(&self) -> &str;

    /// Rewrite every match in `ast`
    fn apply(&self, ast: &mut Ast) -> Vec<Applied>;
}

/// One rewrite performed by a rule
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Applied {
    pub rule: String,
    pub action: &'static str,
    /// Kind of the matched node
    pub kind: String,
    /// Source of the matched node
    pub before: String,
    /// Source of the node the action produced
    pub after: String,
}

const BUILTIN_RULES: &[(&str, &str)] = &[
    ("array_literal.yaml", include_str!("../rules/array_literal.yaml")),
    ("guard_debug.yaml", include_str!("../rules/guard_debug.yaml")),
    ("strip_console.yaml", include_str!("../rules/strip_console.yaml")),
];

/// Load the bundled YAML rules
pub fn builtin_rules() -> Result<Vec<YamlRuleInterpreter>, LoadError> {
    let mut rules = Vec::new();
    for (_, yaml) in BUILTIN_RULES {
        rules.extend(load_rules_from_string(yaml)?);
    }
    Ok(rules)
}

/// Registry of rewrite rules, applied in registration order
#[derive(Default)]
pub struct RuleSet {
    rules: Vec<Box<dyn Rule>>,
}

impl RuleSet {
    /// Create an empty registry
    pub fn new() -> Self {
        Self::default()
    }

    /// Create a registry holding the bundled YAML rules
    pub fn builtin() -> Result<Self, LoadError> {
        let mut registry = Self::new();
        registry.extend(builtin_rules()?);
        Ok(registry)
    }

    /// Register a new rule
    pub fn register(&mut self, rule: Box<dyn Rule>) {
        self.rules.push(rule);
    }

    /// Register loaded YAML rules
    pub fn extend(&mut self, rules: impl IntoIterator<Item = YamlRuleInterpreter>) {
        for rule in rules {
            self.register(Box::new(rule));
        }
    }

    pub fn len(&self) -> usize {
        self.rules.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rules.is_empty()
    }

    /// Get all rule names
    pub fn names(&self) -> Vec<&str> {
        self.rules.iter().map(|r| r.name()).collect()
    }

    pub fn contains(&self, name: &str) -> bool {
        self.rules.iter().any(|r| r.name() == name)
    }

    /// Get rules filtered by enabled names
    pub fn get_enabled(&self, enabled: &HashSet<String>) -> Vec<&dyn Rule> {
        self.rules
            .iter()
            .filter(|r| enabled.contains(r.name()))
            .map(|r| r.as_ref())
            .collect()
    }

    /// Get all rules with their descriptions (for --list-rules)
    pub fn list(&self) -> Vec<(&str, &str)> {
        self.rules
            .iter()
            .map(|r| (r.name(), r.description()))
            .collect()
    }

    /// Run all enabled rules on a tree, one after another
    pub fn apply(&self, ast: &mut Ast, enabled: &HashSet<String>) -> Vec<Applied> {
        let mut applied = Vec::new();
        for rule in self.get_enabled(enabled) {
            applied.extend(rule.apply(ast));
        }
        applied
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn enabled(names: &[&str]) -> HashSet<String> {
        names.iter().map(|name| name.to_string()).collect()
    }

    struct Rename;

    impl Rule for Rename {
        fn name(&self) -> &str {
            "rename"
        }

        fn description(&self) -> &str {
            "Rename a to b"
        }

        fn apply(&self, ast: &mut Ast) -> Vec<Applied> {
            let mut applied = Vec::new();
            ast.walk(|ast, id| {
                if ast.node(id).name() == Some("a") {
                    ast.node_mut(id).replace("b")?;
                    applied.push(Applied {
                        rule: "rename".to_string(),
                        action: "replace",
                        kind: "Identifier".to_string(),
                        before: "a".to_string(),
                        after: "b".to_string(),
                    });
                }
                Ok(())
            })
            .unwrap();
            applied
        }
    }

    #[test]
    fn test_builtin_rules() {
        let registry = RuleSet::builtin().unwrap();
        assert_eq!(
            registry.names(),
            vec!["array_literal", "object_literal", "guard_debug", "strip_console"]
        );
        assert!(registry.list().iter().all(|(_, description)| !description.is_empty()));
    }

    #[test]
    fn test_builtin_inline_tests_pass() {
        for (file, yaml) in BUILTIN_RULES {
            for rule in load_rules_from_string(yaml).unwrap() {
                for result in rule.run_tests() {
                    assert!(result.passed, "{}: {:?}", file, result);
                }
            }
        }
    }

    #[test]
    fn test_apply_only_enabled() {
        let mut registry = RuleSet::builtin().unwrap();
        registry.register(Box::new(Rename));
        assert!(registry.contains("rename"));

        let mut ast = Ast::parse("var x = new Array(); a(); debug('x');").unwrap();
        let applied = registry.apply(&mut ast, &enabled(&["array_literal", "rename"]));
        assert_eq!(applied.len(), 2);
        assert_eq!(applied[0].rule, "array_literal");
        assert_eq!(applied[1].rule, "rename");
        assert_eq!(ast.deparse().unwrap(), "var x = [];\nb();\ndebug('x')");
    }

    #[test]
    fn test_rules_run_in_registration_order() {
        let mut registry = RuleSet::new();
        registry.extend(
            load_rules_from_string(
                r#"
- name: first
  description: Wrap in f
  match: { node: Identifier }
  action: wrap
  template: "f(<%= node %>)"
- name: second
  description: Wrap calls in g
  match: { node: CallExpression, callee: f }
  action: wrap
  template: "g(<%= node %>)"
"#,
            )
            .unwrap(),
        );
        assert_eq!(registry.len(), 2);

        let mut ast = Ast::parse("x").unwrap();
        let applied = registry.apply(&mut ast, &enabled(&["first", "second"]));
        assert_eq!(applied.len(), 2);
        assert_eq!(ast.deparse().unwrap(), "g(f(x))");
    }

    #[test]
    fn test_empty_enabled_set() {
        let registry = RuleSet::builtin().unwrap();
        let mut ast = Ast::parse("new Array()").unwrap();
        assert!(registry.apply(&mut ast, &HashSet::new()).is_empty());
        assert_eq!(ast.deparse().unwrap(), "new Array()");
    }
}
