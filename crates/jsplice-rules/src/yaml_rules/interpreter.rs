//! YAML rule interpreter
//!
//! Executes YAML-defined rules against a wrapped tree. Implements the
//! `Rule` trait for integration with the registry.

use jsplice_core::{Ast, Flow, NodeId, SpliceError, Template, Visitor};
use serde::Serialize;
use tracing::{debug, warn};

use super::loader::LoadError;
use super::matcher::PatternMatcher;
use super::schema::{Action, TestCase, YamlRule};
use crate::registry::{Applied, Rule};

/// Interpreter for a single YAML rule
#[derive(Debug, Clone)]
pub struct YamlRuleInterpreter {
    rule: YamlRule,
    matcher: PatternMatcher,
    template: Template,
}

impl YamlRuleInterpreter {
    /// Validate a rule and compile its pattern and template
    pub fn new(rule: YamlRule) -> Result<Self, LoadError> {
        rule.validate().map_err(LoadError::Validation)?;
        let matcher = PatternMatcher::new(rule.match_pattern.clone())
            .map_err(|e| LoadError::Validation(e.to_string()))?;
        let template = Template::compile(&rule.template)?;
        Ok(Self {
            rule,
            matcher,
            template,
        })
    }

    /// Get a reference to the underlying rule
    pub fn rule(&self) -> &YamlRule {
        &self.rule
    }

    /// Run the rule over `ast`, returning one record per rewrite
    ///
    /// A rewrite that fails leaves its node untouched and is skipped.
    pub fn apply_to(&self, ast: &mut Ast) -> Vec<Applied> {
        let mut visitor = RuleVisitor {
            interpreter: self,
            applied: Vec::new(),
        };
        if let Err(err) = ast.accept(&mut visitor) {
            warn!(rule = %self.rule.name, "walk aborted: {}", err);
        }
        visitor.applied
    }

    fn splice(&self, ast: &mut Ast, id: NodeId) -> Result<Applied, SpliceError> {
        let node = ast.node(id);
        let kind = node.kind().to_string();
        let before = node.deparse()?;

        let target = match self.rule.action {
            Action::Replace => ast.node_mut(id).replace(&self.template.render(&before))?,
            Action::Wrap => ast.node_mut(id).wrap(&self.template)?,
            Action::Prefix => ast.node_mut(id).prefix(&self.template.render(&before))?,
            Action::Suffix => ast.node_mut(id).suffix(&self.template.render(&before))?,
        };
        let after = ast.node(target).deparse()?;

        Ok(Applied {
            rule: self.rule.name.clone(),
            action: self.rule.action.as_str(),
            kind,
            before,
            after,
        })
    }

    /// Run the test cases defined in the YAML rule
    pub fn run_tests(&self) -> Vec<TestResult> {
        self.rule
            .tests
            .iter()
            .filter(|t| !t.skip)
            .map(|test| self.run_single_test(test))
            .collect()
    }

    fn run_single_test(&self, test: &TestCase) -> TestResult {
        let mut result = TestResult {
            rule: self.rule.name.clone(),
            input: test.input.clone(),
            expected: test.output.clone(),
            actual: None,
            passed: false,
            error: None,
        };

        let mut ast = match Ast::parse(&test.input) {
            Ok(ast) => ast,
            Err(e) => {
                result.error = Some(format!("Failed to parse input: {}", e));
                return result;
            }
        };
        let applied = self.apply_to(&mut ast);
        match ast.deparse() {
            Ok(actual) => result.actual = Some(actual),
            Err(e) => {
                result.error = Some(format!("Failed to print output: {}", e));
                return result;
            }
        }

        match &test.output {
            Some(expected) if applied.is_empty() => {
                result.error = Some(format!("No rewrites produced, expected {}", expected));
            }
            Some(expected) => result.passed = result.actual.as_ref() == Some(expected),
            None if applied.is_empty() => result.passed = true,
            None => result.error = Some("Expected no match but rule matched".to_string()),
        }
        result
    }
}

impl Rule for YamlRuleInterpreter {
    fn name(&self) -> &str {
        &self.rule.name
    }

    fn description(&self) -> &str {
        &self.rule.description
    }

    fn apply(&self, ast: &mut Ast) -> Vec<Applied> {
        self.apply_to(ast)
    }
}

/// Result of running a single test case
#[derive(Debug, Clone, Serialize)]
pub struct TestResult {
    pub rule: String,
    pub input: String,
    pub expected: Option<String>,
    pub actual: Option<String>,
    pub passed: bool,
    pub error: Option<String>,
}

struct RuleVisitor<'r> {
    interpreter: &'r YamlRuleInterpreter,
    applied: Vec<Applied>,
}

impl Visitor for RuleVisitor<'_> {
    fn visit(&mut self, ast: &mut Ast, id: NodeId) -> Result<Flow, SpliceError> {
        if !self.interpreter.matcher.matches(ast.node(id)) {
            return Ok(Flow::Continue);
        }

        match self.interpreter.splice(ast, id) {
            Ok(applied) => {
                debug!(rule = %applied.rule, kind = %applied.kind, "applied rewrite");
                self.applied.push(applied);
                // Rewritten code is not matched again
                Ok(Flow::SkipChildren)
            }
            Err(err) => {
                warn!(
                    rule = %self.interpreter.rule.name,
                    node = %id,
                    "rewrite skipped: {}",
                    err
                );
                Ok(Flow::Continue)
            }
        }
    }
}
