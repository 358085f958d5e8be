//! YAML-based rule definitions
//!
//! Rules are declared in YAML and interpreted at runtime:
//!
//! ```yaml
//! name: guard_debug
//! description: Wrap debug() calls in a guard
//!
//! match:
//!   node: CallExpression
//!   callee: debug
//!   min_args: 1
//!   arg_kinds: { 0: Literal }
//!
//! action: wrap
//! template: "DEBUG && <%= node %>"
//!
//! tests:
//!   - input: "debug('x')"
//!     output: "DEBUG && debug('x')"
//! ```
//!
//! A file holds either one rule or a list of rules.

pub mod interpreter;
pub mod loader;
pub mod matcher;
pub mod schema;

pub use interpreter::{TestResult, YamlRuleInterpreter};
pub use loader::{
    get_rule_info, load_rules_from_dir, load_rules_from_file, load_rules_from_string,
    validate_rule_string, LoadError, RuleInfo,
};
pub use matcher::PatternMatcher;
pub use schema::{Action, MatchPattern, TestCase, YamlRule};
