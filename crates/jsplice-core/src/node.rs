//! Node views: `Node` reads, `NodeMut` edits
//!
//! Both are cheap cursors over an `Ast` and an id. Type-specific accessors
//! return `None` when the node is not of the kind they apply to.

use jsplice_syntax::{generate, CodegenError, FormatOptions, RawNode, Scalar};

use crate::classification::Capability;
use crate::error::SpliceError;
use crate::template::TemplateArg;
use crate::tree::{Ast, NodeId, Value};

/// Where `affix` inserts the new statement relative to the receiver
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Placement {
    Before,
    After,
}

/// Read-only view of one node
#[derive(Clone, Copy)]
pub struct Node<'a> {
    ast: &'a Ast,
    id: NodeId,
}

impl<'a> Node<'a> {
    pub(crate) fn new(ast: &'a Ast, id: NodeId) -> Self {
        Self { ast, id }
    }

    pub fn id(&self) -> NodeId {
        self.id
    }

    pub fn ast(&self) -> &'a Ast {
        self.ast
    }

    pub fn kind(&self) -> &'a str {
        &self.ast.record(self.id).kind
    }

    pub fn capability(&self) -> Option<Capability> {
        self.ast.record(self.id).capability
    }

    pub fn is_kind(&self, kind: &str) -> bool {
        self.kind() == kind
    }

    pub fn is_expression(&self) -> bool {
        self.capability() == Some(Capability::Expression)
    }

    pub fn is_statement(&self) -> bool {
        self.capability() == Some(Capability::Statement)
    }

    pub fn is_block_container(&self) -> bool {
        self.capability() == Some(Capability::BlockContainer)
    }

    pub fn parent(&self) -> Option<Node<'a>> {
        self.ast
            .record(self.id)
            .parent
            .map(|parent| Node::new(self.ast, parent))
    }

    pub fn parent_key(&self) -> Option<&'a str> {
        self.ast.record(self.id).parent_key.as_deref()
    }

    /// Position in the parent's sequence, if sequence-held
    pub fn parent_index(&self) -> Option<usize> {
        self.ast.record(self.id).parent_index
    }

    pub fn is_root(&self) -> bool {
        self.id == self.ast.root()
    }

    pub fn is_attached(&self) -> bool {
        self.ast.is_attached(self.id)
    }

    // ==================== Generic accessors ====================

    pub fn get(&self, key: &str) -> Option<&'a Value> {
        self.ast.record(self.id).get(key)
    }

    /// Node stored in the plain field `key`
    pub fn child(&self, key: &str) -> Option<Node<'a>> {
        self.get(key)
            .and_then(Value::as_node)
            .map(|id| Node::new(self.ast, id))
    }

    /// Nodes stored in the sequence `key`; holes are skipped
    pub fn children(&self, key: &str) -> Vec<Node<'a>> {
        self.get(key)
            .and_then(Value::as_list)
            .unwrap_or(&[])
            .iter()
            .filter_map(Value::as_node)
            .map(|id| Node::new(self.ast, id))
            .collect()
    }

    pub fn scalar(&self, key: &str) -> Option<&'a Scalar> {
        self.get(key).and_then(Value::as_scalar)
    }

    pub fn fields(&self) -> impl Iterator<Item = (&'a str, &'a Value)> {
        self.ast
            .record(self.id)
            .data
            .iter()
            .map(|(key, value)| (key.as_str(), value))
    }

    // ==================== Type-specific accessors ====================

    /// Statements of a `Program` or `BlockStatement`
    pub fn body(&self) -> Option<Vec<Node<'a>>> {
        matches!(self.kind(), "Program" | "BlockStatement").then(|| self.children("body"))
    }

    /// Expression of an `ExpressionStatement`
    pub fn expression(&self) -> Option<Node<'a>> {
        if self.kind() != "ExpressionStatement" {
            return None;
        }
        self.child("expression")
    }

    /// Name of a call or `new` target when it is a plain identifier
    pub fn callee_name(&self) -> Option<&'a str> {
        if !matches!(self.kind(), "CallExpression" | "NewExpression") {
            return None;
        }
        self.child("callee")?.name()
    }

    /// Dotted path of a call target such as `console.log`
    pub fn callee_path(&self) -> Option<String> {
        if !matches!(self.kind(), "CallExpression" | "NewExpression") {
            return None;
        }
        member_path(self.child("callee")?)
    }

    pub fn arguments(&self) -> Option<Vec<Node<'a>>> {
        matches!(self.kind(), "CallExpression" | "NewExpression")
            .then(|| self.children("arguments"))
    }

    /// Name of an `Identifier`
    pub fn name(&self) -> Option<&'a str> {
        if self.kind() != "Identifier" {
            return None;
        }
        self.scalar("name").and_then(Scalar::as_str)
    }

    /// Value of a `Literal`
    pub fn value(&self) -> Option<&'a Scalar> {
        if self.kind() != "Literal" {
            return None;
        }
        self.scalar("value")
    }

    // ==================== Printing ====================

    pub fn unwrap(&self) -> RawNode {
        self.ast.unwrap(self.id)
    }

    /// Print this subtree without terminal semicolons
    pub fn deparse(&self) -> Result<String, CodegenError> {
        self.deparse_with(&FormatOptions::without_semicolons())
    }

    pub fn deparse_with(&self, options: &FormatOptions) -> Result<String, CodegenError> {
        generate(&self.unwrap(), options)
    }
}

impl std::fmt::Debug for Node<'_> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Node")
            .field("id", &self.id)
            .field("kind", &self.kind())
            .finish()
    }
}

fn member_path(node: Node<'_>) -> Option<String> {
    match node.kind() {
        "Identifier" => node.name().map(str::to_string),
        "ThisExpression" => Some("this".to_string()),
        "MemberExpression"
            if !node.scalar("computed").and_then(Scalar::as_bool).unwrap_or(false) =>
        {
            let object = member_path(node.child("object")?)?;
            let property = node.child("property")?.name()?;
            Some(format!("{}.{}", object, property))
        }
        _ => None,
    }
}

/// Editing cursor for one node
pub struct NodeMut<'a> {
    ast: &'a mut Ast,
    id: NodeId,
}

impl<'a> NodeMut<'a> {
    pub(crate) fn new(ast: &'a mut Ast, id: NodeId) -> Self {
        Self { ast, id }
    }

    pub fn id(&self) -> NodeId {
        self.id
    }

    /// Read view of the same node
    pub fn as_node(&self) -> Node<'_> {
        self.ast.node(self.id)
    }

    /// Overwrite a scalar field
    pub fn set(&mut self, key: &str, value: impl Into<Scalar>) -> Result<(), SpliceError> {
        self.ast.set_scalar(self.id, key, value.into())
    }

    /// Overwrite the value of a `Literal`
    pub fn set_value(&mut self, value: impl Into<Scalar>) -> Result<(), SpliceError> {
        let kind = self.as_node().kind();
        if kind != "Literal" {
            return Err(SpliceError::MissingCapability {
                kind: kind.to_string(),
                operation: "set_value",
            });
        }
        self.set("value", value)
    }

    /// Replace this node with the node `snippet` parses to
    ///
    /// Returns the id of the node now occupying the slot.
    pub fn replace(self, snippet: &str) -> Result<NodeId, SpliceError> {
        self.ast.replace_node(self.id, snippet)
    }

    /// Insert the statement `snippet` parses to next to this node's statement
    ///
    /// Returns the id of the inserted statement.
    pub fn affix(self, snippet: &str, placement: Placement) -> Result<NodeId, SpliceError> {
        self.ast.affix_node(self.id, snippet, placement)
    }

    pub fn prefix(self, snippet: &str) -> Result<NodeId, SpliceError> {
        self.affix(snippet, Placement::Before)
    }

    pub fn suffix(self, snippet: &str) -> Result<NodeId, SpliceError> {
        self.affix(snippet, Placement::After)
    }

    /// Replace this node with a template rendered around its own source
    pub fn wrap<'t>(self, template: impl Into<TemplateArg<'t>>) -> Result<NodeId, SpliceError> {
        self.ast.wrap_template(self.id, template.into())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn first_expression(ast: &Ast) -> Node<'_> {
        ast.node(ast.root()).body().unwrap()[0].expression().unwrap()
    }

    // ==================== Accessors ====================

    #[test]
    fn test_call_accessors() {
        let ast = Ast::parse("f(1, 'a')").unwrap();
        let call = first_expression(&ast);
        assert_eq!(call.callee_name(), Some("f"));
        assert_eq!(call.callee_path().as_deref(), Some("f"));

        let arguments = call.arguments().unwrap();
        assert_eq!(arguments.len(), 2);
        assert_eq!(arguments[0].value(), Some(&Scalar::Number(1.0)));
        assert_eq!(arguments[1].value(), Some(&Scalar::String("a".to_string())));
    }

    #[test]
    fn test_member_callee() {
        let ast = Ast::parse("console.log(x)").unwrap();
        let call = first_expression(&ast);
        assert_eq!(call.callee_name(), None);
        assert_eq!(call.callee_path().as_deref(), Some("console.log"));

        let ast = Ast::parse("a[b](x)").unwrap();
        assert_eq!(first_expression(&ast).callee_path(), None);
    }

    #[test]
    fn test_accessors_reject_other_kinds() {
        let ast = Ast::parse("a").unwrap();
        let identifier = first_expression(&ast);
        assert_eq!(identifier.name(), Some("a"));
        assert!(identifier.value().is_none());
        assert!(identifier.arguments().is_none());
        assert!(identifier.body().is_none());
        assert!(identifier.expression().is_none());
    }

    #[test]
    fn test_fields_in_order() {
        let ast = Ast::parse("a = b").unwrap();
        let assignment = first_expression(&ast);
        let keys: Vec<&str> = assignment.fields().map(|(key, _)| key).collect();
        assert_eq!(keys, vec!["operator", "left", "right"]);
    }

    #[test]
    fn test_node_deparse() {
        let ast = Ast::parse("function f(a) { return a; }").unwrap();
        let function = ast.node(ast.root()).body().unwrap()[0];
        let body = function.child("body").unwrap();
        assert_eq!(body.deparse().unwrap(), "{\n    return a\n}");
    }

    // ==================== Setters ====================

    #[test]
    fn test_set_value() {
        let mut ast = Ast::parse("x = 1").unwrap();
        let id = first_expression(&ast).child("right").unwrap().id();
        ast.node_mut(id).set_value(42).unwrap();
        assert_eq!(ast.deparse().unwrap(), "x = 42");
    }

    #[test]
    fn test_set_value_requires_literal() {
        let mut ast = Ast::parse("x").unwrap();
        let id = first_expression(&ast).id();
        let err = ast.node_mut(id).set_value(1).unwrap_err();
        assert!(matches!(err, SpliceError::MissingCapability { operation: "set_value", .. }));
    }

    #[test]
    fn test_set_scalar_field() {
        let mut ast = Ast::parse("a + b").unwrap();
        let id = first_expression(&ast).id();
        ast.node_mut(id).set("operator", "*").unwrap();
        assert_eq!(ast.deparse().unwrap(), "a * b");
    }
}
