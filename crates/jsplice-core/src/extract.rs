//! Turning a source snippet into the one node it stands for
//!
//! The snippet is parsed into a tree of its own. Nothing in the target tree
//! is touched here, so a failed extraction leaves the target unchanged.

use jsplice_syntax::RawNode;
use tracing::trace;

use crate::classification::Capability;
use crate::error::SpliceError;
use crate::node::Node;
use crate::tree::{Ast, NodeId, TreeBuilder};

/// Name of the function a block snippet is parsed inside
const CONTAINER: &str = "container";

/// The kind of node a snippet must produce
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Extraction {
    /// The expression of a single expression statement
    Expression,
    /// A single statement of any kind
    Statement,
    /// A function body; `parent_kind` is the kind of the node owning the block
    Block { parent_kind: String },
}

impl Extraction {
    /// Extraction matching the capability of `node`
    pub fn for_node(node: Node<'_>) -> Result<Self, SpliceError> {
        match node.capability() {
            Some(Capability::Expression) => Ok(Extraction::Expression),
            Some(Capability::Statement) => Ok(Extraction::Statement),
            Some(Capability::BlockContainer) => Ok(Extraction::Block {
                parent_kind: node
                    .parent()
                    .map(|parent| parent.kind().to_string())
                    .unwrap_or_default(),
            }),
            None => Err(SpliceError::MissingCapability {
                kind: node.kind().to_string(),
                operation: "replace",
            }),
        }
    }
}

/// A snippet tree together with the node chosen from it
#[derive(Debug)]
pub struct Extracted {
    tree: Ast,
    node: NodeId,
}

impl Extracted {
    pub fn tree(&self) -> &Ast {
        &self.tree
    }

    pub fn node(&self) -> Node<'_> {
        self.tree.node(self.node)
    }

    /// The chosen subtree, ready to be wrapped into another tree
    pub fn into_raw(self) -> RawNode {
        self.tree.unwrap(self.node)
    }
}

/// Parse `snippet` and pick out the node `extraction` asks for
pub fn extract(
    builder: &TreeBuilder,
    snippet: &str,
    extraction: &Extraction,
) -> Result<Extracted, SpliceError> {
    let (tree, node) = match extraction {
        Extraction::Expression => {
            let tree = builder.wrap_source(snippet)?;
            let statement = single_statement(&tree)?;
            let node = tree.node(statement);
            let expression = match node.expression() {
                Some(expression) => expression.id(),
                None => {
                    return Err(SpliceError::NotAnExpression {
                        found: node.kind().to_string(),
                    })
                }
            };
            (tree, expression)
        }
        Extraction::Statement => {
            let tree = builder.wrap_source(snippet)?;
            let statement = single_statement(&tree)?;
            (tree, statement)
        }
        Extraction::Block { parent_kind } => {
            if !matches!(parent_kind.as_str(), "FunctionDeclaration" | "FunctionExpression") {
                return Err(SpliceError::UnsupportedParent {
                    parent: parent_kind.clone(),
                });
            }
            let source = format!("function {}() {{\n{}\n}}", CONTAINER, snippet);
            let tree = builder.wrap_source(&source)?;
            let block = function_body(&tree)?;
            (tree, block)
        }
    };

    trace!(?extraction, kind = %tree.node(node).kind(), "extracted snippet");
    Ok(Extracted { tree, node })
}

fn single_statement(tree: &Ast) -> Result<NodeId, SpliceError> {
    let body = tree.node(tree.root()).children("body");
    match body.as_slice() {
        [] => Err(SpliceError::EmptySnippet),
        [statement] => Ok(statement.id()),
        many => Err(SpliceError::MultipleStatements { found: many.len() }),
    }
}

/// Body of the synthetic container, with one level of caller braces removed
fn function_body(tree: &Ast) -> Result<NodeId, SpliceError> {
    // A snippet closing the container early parses to several statements
    let function = single_statement(tree)?;
    let block = tree
        .node(function)
        .child("body")
        .ok_or(SpliceError::EmptySnippet)?;

    match block.children("body").as_slice() {
        [inner] if inner.is_block_statement() => Ok(inner.id()),
        _ => Ok(block.id()),
    }
}
