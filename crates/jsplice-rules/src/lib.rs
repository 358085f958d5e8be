//! jsplice-rules: Declarative rewrite rules for JavaScript
//!
//! Rules are written in YAML. Each rule names a node kind to match, an
//! optional callee and argument shape, and a template applied through one
//! of the splicing operations of `jsplice-core`:
//! - replace: render the template around the node's source and replace it
//! - wrap: wrap the node in the template
//! - prefix / suffix: insert the rendered template as a sibling statement

pub mod registry;
pub mod yaml_rules;

pub use registry::{builtin_rules, Applied, Rule, RuleSet};
pub use yaml_rules::{
    load_rules_from_dir, load_rules_from_file, load_rules_from_string, LoadError, TestResult,
    YamlRule, YamlRuleInterpreter,
};
