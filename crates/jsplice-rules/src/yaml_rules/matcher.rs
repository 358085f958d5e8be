//! Pattern matching engine for YAML rules
//!
//! Matches a `MatchPattern` against wrapped nodes of an `Ast`.

use jsplice_core::Node;
use regex::Regex;

use super::schema::MatchPattern;

/// How the callee of a call is compared
#[derive(Debug, Clone)]
enum CalleeMatcher {
    Path(String),
    Regex(Regex),
}

impl CalleeMatcher {
    fn matches(&self, path: &str) -> bool {
        match self {
            CalleeMatcher::Path(expected) => path == expected,
            CalleeMatcher::Regex(regex) => regex.is_match(path),
        }
    }
}

/// Compiled form of a `MatchPattern`
#[derive(Debug, Clone)]
pub struct PatternMatcher {
    pattern: MatchPattern,
    callee: Option<CalleeMatcher>,
}

impl PatternMatcher {
    /// Compile a pattern; fails only on an invalid callee regex
    pub fn new(pattern: MatchPattern) -> Result<Self, regex::Error> {
        let callee = match (pattern.callee_regex(), &pattern.callee) {
            (Some(regex), _) => Some(CalleeMatcher::Regex(Regex::new(regex)?)),
            (None, Some(path)) => Some(CalleeMatcher::Path(path.clone())),
            (None, None) => None,
        };
        Ok(Self { pattern, callee })
    }

    pub fn pattern(&self) -> &MatchPattern {
        &self.pattern
    }

    /// Check whether `node` has the shape the pattern describes
    pub fn matches(&self, node: Node<'_>) -> bool {
        if !node.is_kind(&self.pattern.node) {
            return false;
        }

        if let Some(callee) = &self.callee {
            match node.callee_path() {
                Some(path) if callee.matches(&path) => {}
                _ => return false,
            }
        }

        if !self.pattern.needs_call() {
            return true;
        }
        let Some(arguments) = node.arguments() else {
            return false;
        };
        if self.pattern.min_args.is_some_and(|min| arguments.len() < min) {
            return false;
        }
        if self.pattern.max_args.is_some_and(|max| arguments.len() > max) {
            return false;
        }
        self.pattern
            .arg_kinds
            .iter()
            .all(|(position, kind)| arguments.get(*position).is_some_and(|arg| arg.is_kind(kind)))
    }
}
