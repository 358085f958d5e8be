//! The owned tree: an arena of parent-aware node records
//!
//! Nodes are addressed by `NodeId`. A record owns its children through
//! `data` and points back to its parent by id, so the parent/child cycle
//! never involves shared ownership.

use std::collections::HashMap;
use std::fmt;
use std::sync::Arc;

use jsplice_syntax::{generate, parse_program, FormatOptions, RawNode, RawValue, Scalar};
use tracing::trace;

use crate::classification::{Capability, ClassificationTable};
use crate::error::SpliceError;
use crate::node::{Node, NodeMut};
use crate::template::Template;

/// Handle to a node in an `Ast`
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct NodeId(usize);

impl NodeId {
    pub fn index(self) -> usize {
        self.0
    }
}

impl fmt::Display for NodeId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "#{}", self.0)
    }
}

/// A field value of a wrapped node
#[derive(Debug, Clone, PartialEq)]
pub enum Value {
    /// Passthrough leaf, never walked into
    Scalar(Scalar),
    Node(NodeId),
    List(Vec<Value>),
}

impl Value {
    pub fn as_node(&self) -> Option<NodeId> {
        match self {
            Value::Node(id) => Some(*id),
            _ => None,
        }
    }

    pub fn as_list(&self) -> Option<&[Value]> {
        match self {
            Value::List(items) => Some(items),
            _ => None,
        }
    }

    pub fn as_scalar(&self) -> Option<&Scalar> {
        match self {
            Value::Scalar(scalar) => Some(scalar),
            _ => None,
        }
    }
}

#[derive(Debug, Clone)]
pub(crate) struct NodeRecord {
    pub(crate) kind: String,
    pub(crate) capability: Option<Capability>,
    pub(crate) parent: Option<NodeId>,
    pub(crate) parent_key: Option<String>,
    /// `None` when the node is held by a plain field
    pub(crate) parent_index: Option<usize>,
    pub(crate) data: Vec<(String, Value)>,
    pub(crate) orphaned: bool,
    /// The node that took this node's slot
    pub(crate) forward: Option<NodeId>,
}

impl NodeRecord {
    pub(crate) fn get(&self, key: &str) -> Option<&Value> {
        self.data.iter().find(|(k, _)| k == key).map(|(_, v)| v)
    }

    pub(crate) fn get_mut(&mut self, key: &str) -> Option<&mut Value> {
        self.data.iter_mut().find(|(k, _)| k == key).map(|(_, v)| v)
    }
}

/// Converts raw parser output into owned trees
#[derive(Debug, Clone)]
pub struct TreeBuilder {
    table: Arc<ClassificationTable>,
}

impl Default for TreeBuilder {
    fn default() -> Self {
        Self::new(ClassificationTable::shared())
    }
}

impl TreeBuilder {
    pub fn new(table: Arc<ClassificationTable>) -> Self {
        Self { table }
    }

    /// Builder with a custom classification table
    pub fn with_table(table: ClassificationTable) -> Self {
        Self::new(Arc::new(table))
    }

    pub fn table(&self) -> &ClassificationTable {
        &self.table
    }

    /// Parse source text and wrap the resulting program
    pub fn wrap_source(&self, source: &str) -> Result<Ast, SpliceError> {
        let raw = parse_program(source)?;
        Ok(self.wrap_raw(&raw))
    }

    /// Wrap an already parsed tree
    pub fn wrap_raw(&self, raw: &RawNode) -> Ast {
        let mut nodes = Vec::new();
        let root = self.wrap_node(&mut nodes, raw, None, None, None);
        trace!(kind = %raw.kind, nodes = nodes.len(), "wrapped tree");
        Ast {
            nodes,
            root,
            builder: self.clone(),
            templates: HashMap::new(),
        }
    }

    /// Append `raw` and its descendants to the arena
    ///
    /// The shell is pushed before its children so they can link to it.
    pub(crate) fn wrap_node(
        &self,
        nodes: &mut Vec<NodeRecord>,
        raw: &RawNode,
        parent: Option<NodeId>,
        parent_key: Option<&str>,
        parent_index: Option<usize>,
    ) -> NodeId {
        let id = NodeId(nodes.len());
        nodes.push(NodeRecord {
            kind: raw.kind.clone(),
            capability: self.table.classify(&raw.kind),
            parent,
            parent_key: parent_key.map(str::to_string),
            parent_index,
            data: Vec::new(),
            orphaned: false,
            forward: None,
        });

        let data = raw
            .fields
            .iter()
            .map(|(key, value)| (key.clone(), self.wrap_value(nodes, value, id, key, None)))
            .collect();
        nodes[id.0].data = data;
        id
    }

    fn wrap_value(
        &self,
        nodes: &mut Vec<NodeRecord>,
        value: &RawValue,
        parent: NodeId,
        key: &str,
        index: Option<usize>,
    ) -> Value {
        match value {
            RawValue::Scalar(scalar) => Value::Scalar(scalar.clone()),
            RawValue::Node(node) => {
                Value::Node(self.wrap_node(nodes, node, Some(parent), Some(key), index))
            }
            RawValue::List(items) => Value::List(
                items
                    .iter()
                    .enumerate()
                    .map(|(i, item)| self.wrap_value(nodes, item, parent, key, Some(i)))
                    .collect(),
            ),
        }
    }
}

/// A wrapped program
#[derive(Debug, Clone)]
pub struct Ast {
    pub(crate) nodes: Vec<NodeRecord>,
    pub(crate) root: NodeId,
    pub(crate) builder: TreeBuilder,
    /// Templates compiled from source strings, keyed by source
    pub(crate) templates: HashMap<String, Template>,
}

impl Ast {
    /// Parse and wrap with the default classification
    pub fn parse(source: &str) -> Result<Self, SpliceError> {
        TreeBuilder::default().wrap_source(source)
    }

    pub fn from_raw(raw: &RawNode) -> Self {
        TreeBuilder::default().wrap_raw(raw)
    }

    /// Wrap an ESTree JSON document
    pub fn from_json(json: &str) -> Result<Self, SpliceError> {
        let raw = RawNode::from_json_str(json)?;
        Ok(Self::from_raw(&raw))
    }

    pub fn root(&self) -> NodeId {
        self.root
    }

    pub fn builder(&self) -> &TreeBuilder {
        &self.builder
    }

    pub fn node(&self, id: NodeId) -> Node<'_> {
        Node::new(self, id)
    }

    pub fn node_mut(&mut self, id: NodeId) -> NodeMut<'_> {
        NodeMut::new(self, id)
    }

    /// Follow replacements from `id` to the node currently in its slot
    pub fn resolve(&self, id: NodeId) -> NodeId {
        let mut current = id;
        while let Some(next) = self.record(current).forward {
            current = next;
        }
        current
    }

    /// Whether `id` is still reachable from the root
    pub fn is_attached(&self, id: NodeId) -> bool {
        !self.record(id).orphaned
    }

    pub(crate) fn record(&self, id: NodeId) -> &NodeRecord {
        &self.nodes[id.0]
    }

    pub(crate) fn record_mut(&mut self, id: NodeId) -> &mut NodeRecord {
        &mut self.nodes[id.0]
    }

    /// Direct node children of `id` in field order, sequences flattened
    pub(crate) fn child_ids(&self, id: NodeId) -> Vec<NodeId> {
        fn collect(value: &Value, out: &mut Vec<NodeId>) {
            match value {
                Value::Node(child) => out.push(*child),
                Value::List(items) => items.iter().for_each(|item| collect(item, out)),
                Value::Scalar(_) => {}
            }
        }

        let mut out = Vec::new();
        for (_, value) in &self.record(id).data {
            collect(value, &mut out);
        }
        out
    }

    /// Mark `id` and everything below it as detached
    pub(crate) fn orphan_subtree(&mut self, id: NodeId) {
        let mut stack = vec![id];
        while let Some(current) = stack.pop() {
            self.record_mut(current).orphaned = true;
            stack.extend(self.child_ids(current));
        }
    }

    /// Project a subtree back into the raw shape the printer expects
    pub fn unwrap(&self, id: NodeId) -> RawNode {
        let record = self.record(id);
        RawNode {
            kind: record.kind.clone(),
            fields: record
                .data
                .iter()
                .map(|(key, value)| (key.clone(), self.unwrap_value(value)))
                .collect(),
        }
    }

    fn unwrap_value(&self, value: &Value) -> RawValue {
        match value {
            Value::Scalar(scalar) => RawValue::Scalar(scalar.clone()),
            Value::Node(id) => RawValue::Node(self.unwrap(*id)),
            Value::List(items) => {
                RawValue::List(items.iter().map(|v| self.unwrap_value(v)).collect())
            }
        }
    }

    /// Print the whole program without terminal semicolons
    pub fn deparse(&self) -> Result<String, SpliceError> {
        self.deparse_with(&FormatOptions::without_semicolons())
    }

    pub fn deparse_with(&self, options: &FormatOptions) -> Result<String, SpliceError> {
        Ok(generate(&self.unwrap(self.root), options)?)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    // ==================== Building ====================

    #[test]
    fn test_parent_links() {
        let ast = Ast::parse("a; b").unwrap();
        let root = ast.root();
        let body = ast.node(root).body().unwrap();
        assert_eq!(body.len(), 2);

        for (i, statement) in body.iter().enumerate() {
            assert_eq!(statement.parent().map(|p| p.id()), Some(root));
            assert_eq!(statement.parent_key(), Some("body"));
            assert_eq!(statement.parent_index(), Some(i));
        }
    }

    #[test]
    fn test_plain_field_has_no_index() {
        let ast = Ast::parse("a").unwrap();
        let statement = ast.node(ast.root()).body().unwrap()[0];
        let expression = statement.expression().unwrap();
        assert_eq!(expression.parent_key(), Some("expression"));
        assert_eq!(expression.parent_index(), None);
    }

    #[test]
    fn test_root_has_no_parent() {
        let ast = Ast::parse("1").unwrap();
        let root = ast.node(ast.root());
        assert!(root.parent().is_none());
        assert!(root.is_root());
    }

    #[test]
    fn test_capability_assigned_from_table() {
        let ast = Ast::parse("var a = 1").unwrap();
        let declaration = ast.node(ast.root()).body().unwrap()[0];
        assert_eq!(declaration.capability(), Some(Capability::Statement));
        let declarator = declaration.children("declarations")[0];
        assert_eq!(declarator.capability(), None);
        assert!(declarator.is_variable_declarator());
    }

    #[test]
    fn test_custom_table() {
        let table = ClassificationTable::estree().with_kind("Identifier", None);
        let ast = TreeBuilder::with_table(table).wrap_source("a").unwrap();
        let identifier = ast.node(ast.root()).body().unwrap()[0].expression().unwrap();
        assert_eq!(identifier.capability(), None);
    }

    #[test]
    fn test_scalars_pass_through() {
        let ast = Ast::parse("/ab+c/gi").unwrap();
        let literal = ast.node(ast.root()).body().unwrap()[0].expression().unwrap();
        match literal.value() {
            Some(Scalar::Regex(regex)) => {
                assert_eq!(regex.pattern, "ab+c");
                assert_eq!(regex.flags, "gi");
            }
            other => panic!("expected regex, got {:?}", other),
        }
    }

    // ==================== Unwrapping ====================

    #[test]
    fn test_unwrap_round_trip() {
        let raw = parse_program("if (a) { b(1, [2, , 3]); } else c = 'x';").unwrap();
        let ast = Ast::from_raw(&raw);
        assert_eq!(ast.unwrap(ast.root()), raw);
    }

    #[test]
    fn test_from_json() {
        let json = r#"{
            "type": "Program",
            "body": [{
                "type": "ExpressionStatement",
                "expression": { "type": "Literal", "value": 1, "raw": "1" }
            }]
        }"#;
        let ast = Ast::from_json(json).unwrap();
        assert_eq!(ast.deparse().unwrap(), "1");
    }

    #[test]
    fn test_from_json_rejects_non_node() {
        assert!(matches!(Ast::from_json("[1, 2]"), Err(SpliceError::Json(_))));
    }

    #[test]
    fn test_deparse_defaults_omit_last_semicolon() {
        let ast = Ast::parse("a(); b();").unwrap();
        assert_eq!(ast.deparse().unwrap(), "a();\nb()");
        assert_eq!(
            ast.deparse_with(&FormatOptions::compact()).unwrap(),
            "a();b();"
        );
    }
}
