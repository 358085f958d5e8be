//! Node kind classification
//!
//! Each known ESTree kind maps to at most one capability. The capability
//! decides how a snippet is extracted when the node is replaced and whether
//! the node can have siblings inserted next to it.

use std::collections::HashMap;
use std::fmt;
use std::sync::{Arc, OnceLock};

use crate::node::Node;

/// Editing behavior a node kind supports
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Capability {
    /// Replaced by the expression of a single expression statement
    Expression,
    /// Replaced by a single statement, and accepts sibling insertion
    Statement,
    /// A statement list; replaced by a function body
    BlockContainer,
}

impl Capability {
    pub fn as_str(&self) -> &'static str {
        match self {
            Capability::Expression => "expression",
            Capability::Statement => "statement",
            Capability::BlockContainer => "block container",
        }
    }
}

impl fmt::Display for Capability {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Declares the default kinds together with an `is_*` predicate for each
macro_rules! node_kinds {
    ($( $capability:expr => [ $( $kind:ident => $predicate:ident ),* $(,)? ] ),* $(,)?) => {
        const DEFAULT_KINDS: &[(&str, Option<Capability>)] = &[
            $( $( (stringify!($kind), $capability), )* )*
        ];

        impl<'a> Node<'a> {
            $( $(
                #[doc = concat!("True when this node is a `", stringify!($kind), "`")]
                pub fn $predicate(&self) -> bool {
                    self.kind() == stringify!($kind)
                }
            )* )*
        }
    };
}

node_kinds! {
    Some(Capability::BlockContainer) => [
        Program => is_program,
        BlockStatement => is_block_statement,
    ],
    Some(Capability::Statement) => [
        EmptyStatement => is_empty_statement,
        ExpressionStatement => is_expression_statement,
        IfStatement => is_if_statement,
        LabeledStatement => is_labeled_statement,
        BreakStatement => is_break_statement,
        ContinueStatement => is_continue_statement,
        WithStatement => is_with_statement,
        SwitchStatement => is_switch_statement,
        ReturnStatement => is_return_statement,
        ThrowStatement => is_throw_statement,
        TryStatement => is_try_statement,
        WhileStatement => is_while_statement,
        DoWhileStatement => is_do_while_statement,
        ForStatement => is_for_statement,
        ForInStatement => is_for_in_statement,
        ForOfStatement => is_for_of_statement,
        LetStatement => is_let_statement,
        DebuggerStatement => is_debugger_statement,
        FunctionDeclaration => is_function_declaration,
        VariableDeclaration => is_variable_declaration,
    ],
    Some(Capability::Expression) => [
        ThisExpression => is_this_expression,
        ArrayExpression => is_array_expression,
        ObjectExpression => is_object_expression,
        FunctionExpression => is_function_expression,
        ArrowExpression => is_arrow_expression,
        SequenceExpression => is_sequence_expression,
        UnaryExpression => is_unary_expression,
        BinaryExpression => is_binary_expression,
        AssignmentExpression => is_assignment_expression,
        UpdateExpression => is_update_expression,
        LogicalExpression => is_logical_expression,
        ConditionalExpression => is_conditional_expression,
        NewExpression => is_new_expression,
        CallExpression => is_call_expression,
        MemberExpression => is_member_expression,
        ComprehensionExpression => is_comprehension_expression,
        GeneratorExpression => is_generator_expression,
        GraphExpression => is_graph_expression,
        YieldExpression => is_yield_expression,
        GraphIndexExpression => is_graph_index_expression,
        LetExpression => is_let_expression,
        Literal => is_literal,
        Identifier => is_identifier,
    ],
    None => [
        VariableDeclarator => is_variable_declarator,
        Property => is_property,
        SwitchCase => is_switch_case,
        CatchClause => is_catch_clause,
    ],
}

/// Immutable mapping from node kind to capability
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ClassificationTable {
    kinds: HashMap<String, Option<Capability>>,
}

impl ClassificationTable {
    /// The ESTree kinds the parser produces, plus the historical
    /// SpiderMonkey extensions trees from other parsers may carry
    pub fn estree() -> Self {
        let kinds = DEFAULT_KINDS
            .iter()
            .map(|(kind, capability)| (kind.to_string(), *capability))
            .collect();
        Self { kinds }
    }

    /// The default table, built on first use and shared afterwards
    pub fn shared() -> Arc<Self> {
        static DEFAULT: OnceLock<Arc<ClassificationTable>> = OnceLock::new();
        DEFAULT
            .get_or_init(|| Arc::new(ClassificationTable::estree()))
            .clone()
    }

    /// Add or reclassify a kind
    pub fn with_kind(mut self, kind: impl Into<String>, capability: Option<Capability>) -> Self {
        self.kinds.insert(kind.into(), capability);
        self
    }

    /// Capability of `kind`; unknown kinds have none
    pub fn classify(&self, kind: &str) -> Option<Capability> {
        self.kinds.get(kind).copied().flatten()
    }

    pub fn is_known(&self, kind: &str) -> bool {
        self.kinds.contains_key(kind)
    }

    pub fn len(&self) -> usize {
        self.kinds.len()
    }

    pub fn is_empty(&self) -> bool {
        self.kinds.is_empty()
    }

    /// Known kinds in no particular order
    pub fn kinds(&self) -> impl Iterator<Item = &str> {
        self.kinds.keys().map(String::as_str)
    }
}

impl Default for ClassificationTable {
    fn default() -> Self {
        Self::estree()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::tree::Ast;

    #[test]
    fn test_classify_defaults() {
        let table = ClassificationTable::estree();
        assert_eq!(table.classify("Program"), Some(Capability::BlockContainer));
        assert_eq!(table.classify("BlockStatement"), Some(Capability::BlockContainer));
        assert_eq!(table.classify("IfStatement"), Some(Capability::Statement));
        assert_eq!(table.classify("FunctionDeclaration"), Some(Capability::Statement));
        assert_eq!(table.classify("Literal"), Some(Capability::Expression));
        assert_eq!(table.classify("Identifier"), Some(Capability::Expression));
    }

    #[test]
    fn test_known_kinds_without_capability() {
        let table = ClassificationTable::estree();
        for kind in ["VariableDeclarator", "Property", "SwitchCase", "CatchClause"] {
            assert!(table.is_known(kind), "{} should be known", kind);
            assert_eq!(table.classify(kind), None);
        }
    }

    #[test]
    fn test_unknown_kind() {
        let table = ClassificationTable::estree();
        assert!(!table.is_known("ClassDeclaration"));
        assert_eq!(table.classify("ClassDeclaration"), None);
    }

    #[test]
    fn test_with_kind_extends_table() {
        let table = ClassificationTable::estree()
            .with_kind("ClassDeclaration", Some(Capability::Statement));
        assert_eq!(table.classify("ClassDeclaration"), Some(Capability::Statement));
        assert_eq!(table.len(), ClassificationTable::estree().len() + 1);
    }

    #[test]
    fn test_shared_table_is_reused() {
        let a = ClassificationTable::shared();
        let b = ClassificationTable::shared();
        assert!(Arc::ptr_eq(&a, &b));
    }

    #[test]
    fn test_predicates_match_exact_kind() {
        let ast = Ast::parse("f(1)").unwrap();
        let program = ast.node(ast.root());
        assert!(program.is_program());
        assert!(!program.is_block_statement());

        let statement = program.body().unwrap()[0];
        assert!(statement.is_expression_statement());

        let call = statement.expression().unwrap();
        assert!(call.is_call_expression());
        assert!(!call.is_new_expression());
        assert!(call.arguments().unwrap()[0].is_literal());
    }
}
