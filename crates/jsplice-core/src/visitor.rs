//! Depth-first traversal with in-place editing
//!
//! `walk` visits a node before its children, in field order. A visitor may
//! replace the node it is given, replace a later sibling, or insert siblings
//! next to it; traversal then continues into whatever occupies each slot.

use crate::error::SpliceError;
use crate::node::Node;
use crate::tree::{Ast, NodeId};

/// What `walk` does after visiting a node
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Flow {
    /// Descend into the node's children
    #[default]
    Continue,
    /// Move on to the next sibling
    SkipChildren,
}

/// Trait for visiting nodes of an `Ast`
///
/// The visitor receives the whole tree so it can edit it. Closures of the
/// form `FnMut(&mut Ast, NodeId) -> Result<(), SpliceError>` are visitors
/// that always continue.
pub trait Visitor {
    fn visit(&mut self, ast: &mut Ast, id: NodeId) -> Result<Flow, SpliceError>;
}

impl<F> Visitor for F
where
    F: FnMut(&mut Ast, NodeId) -> Result<(), SpliceError>,
{
    fn visit(&mut self, ast: &mut Ast, id: NodeId) -> Result<Flow, SpliceError> {
        self(ast, id)?;
        Ok(Flow::Continue)
    }
}

impl Ast {
    /// Walk the whole tree with a closure
    pub fn walk<F>(&mut self, mut visitor: F) -> Result<&mut Self, SpliceError>
    where
        F: FnMut(&mut Ast, NodeId) -> Result<(), SpliceError>,
    {
        self.accept(&mut visitor)
    }

    /// Walk the whole tree with a `Visitor`
    pub fn accept<V: Visitor + ?Sized>(
        &mut self,
        visitor: &mut V,
    ) -> Result<&mut Self, SpliceError> {
        let root = self.root;
        self.walk_node(root, visitor)?;
        Ok(self)
    }

    /// Walk the subtree at `id`; returns the node occupying its slot afterwards
    pub fn walk_from<V: Visitor + ?Sized>(
        &mut self,
        id: NodeId,
        visitor: &mut V,
    ) -> Result<NodeId, SpliceError> {
        self.walk_node(id, visitor)
    }

    fn walk_node<V: Visitor + ?Sized>(
        &mut self,
        id: NodeId,
        visitor: &mut V,
    ) -> Result<NodeId, SpliceError> {
        let flow = visitor.visit(self, id)?;

        // The visitor may have replaced this node
        let current = self.resolve(id);
        if flow == Flow::SkipChildren || !self.is_attached(current) {
            return Ok(current);
        }

        // Siblings inserted while visiting children are not visited
        for child in self.child_ids(current) {
            let child = self.resolve(child);
            if self.is_attached(child) {
                self.walk_node(child, visitor)?;
            }
        }
        Ok(current)
    }

    /// Walk, replacing every node for which `visitor` returns a non-empty snippet
    pub fn map<F>(&mut self, mut visitor: F) -> Result<&mut Self, SpliceError>
    where
        F: FnMut(Node<'_>) -> Option<String>,
    {
        self.walk(|ast, id| {
            match visitor(ast.node(id)) {
                Some(snippet) if !snippet.is_empty() => {
                    ast.node_mut(id).replace(&snippet)?;
                }
                _ => {}
            }
            Ok(())
        })
    }

    /// Fold over every node in walk order
    pub fn reduce<A, F>(&self, initial: A, mut visitor: F) -> A
    where
        F: FnMut(A, Node<'_>) -> A,
    {
        let mut accumulator = initial;
        let mut stack = vec![self.root];
        while let Some(id) = stack.pop() {
            accumulator = visitor(accumulator, self.node(id));
            let mut children = self.child_ids(id);
            children.reverse();
            stack.extend(children);
        }
        accumulator
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use jsplice_syntax::Scalar;

    // ==================== Walk ====================

    #[test]
    fn test_walk_visits_every_node() {
        let mut ast = Ast::parse("1 + 1").unwrap();
        let mut kinds = Vec::new();
        ast.walk(|ast, id| {
            kinds.push(ast.node(id).kind().to_string());
            Ok(())
        })
        .unwrap();
        assert_eq!(
            kinds,
            vec!["Program", "ExpressionStatement", "BinaryExpression", "Literal", "Literal"]
        );
    }

    #[test]
    fn test_walk_follows_replacement() {
        let mut ast = Ast::parse("f(a)").unwrap();
        let mut seen = Vec::new();
        ast.walk(|ast, id| {
            let node = ast.node(id);
            seen.push(node.kind().to_string());
            if node.is_call_expression() {
                ast.node_mut(id).replace("g(b, c)")?;
            }
            Ok(())
        })
        .unwrap();

        // The replacement's children are walked, the old callee is not
        let names: Vec<&str> = seen.iter().map(String::as_str).collect();
        assert_eq!(
            names,
            vec![
                "Program",
                "ExpressionStatement",
                "CallExpression",
                "Identifier",
                "Identifier",
                "Identifier",
            ]
        );
        assert_eq!(ast.deparse().unwrap(), "g(b, c)");
    }

    #[test]
    fn test_walk_skips_inserted_siblings() {
        let mut ast = Ast::parse("a()").unwrap();
        let mut visits = 0;
        ast.walk(|ast, id| {
            visits += 1;
            if ast.node(id).is_expression_statement() {
                ast.node_mut(id).prefix("b()")?;
                ast.node_mut(id).suffix("c()")?;
            }
            Ok(())
        })
        .unwrap();
        assert_eq!(visits, 4);
        assert_eq!(ast.deparse().unwrap(), "b();\na();\nc()");
    }

    #[test]
    fn test_walk_visits_replaced_later_sibling() {
        let mut ast = Ast::parse("a; b").unwrap();
        let mut names = Vec::new();
        ast.walk(|ast, id| {
            let node = ast.node(id);
            if let Some(name) = node.name() {
                names.push(name.to_string());
            }
            if node.is_expression_statement() && node.parent_index() == Some(0) {
                let second = ast.node(ast.root()).body().unwrap()[1].id();
                ast.node_mut(second).replace("c")?;
            }
            Ok(())
        })
        .unwrap();
        assert_eq!(names, vec!["a", "c"]);
        assert_eq!(ast.deparse().unwrap(), "a;\nc");
    }

    #[test]
    fn test_walk_skips_children_of_replaced_ancestor() {
        let mut ast = Ast::parse("f(a, b)").unwrap();
        let mut names = Vec::new();
        ast.walk(|ast, id| {
            let node = ast.node(id);
            if let Some(name) = node.name() {
                names.push(name.to_string());
                if name == "a" {
                    let statement = ast.node(ast.root()).body().unwrap()[0].id();
                    ast.node_mut(statement).replace("g()")?;
                }
            }
            Ok(())
        })
        .unwrap();
        // `b` was detached along with the old statement
        assert_eq!(names, vec!["f", "a"]);
        assert_eq!(ast.deparse().unwrap(), "g()");
    }

    #[test]
    fn test_walk_error_stops_traversal() {
        let mut ast = Ast::parse("a; b").unwrap();
        let mut visits = 0;
        let result = ast.walk(|ast, id| {
            visits += 1;
            if ast.node(id).is_identifier() {
                return Err(SpliceError::EmptySnippet);
            }
            Ok(())
        });
        assert!(result.is_err());
        assert_eq!(visits, 3);
    }

    struct SkipCalls {
        visited: Vec<String>,
    }

    impl Visitor for SkipCalls {
        fn visit(&mut self, ast: &mut Ast, id: NodeId) -> Result<Flow, SpliceError> {
            let node = ast.node(id);
            self.visited.push(node.kind().to_string());
            Ok(if node.is_call_expression() {
                Flow::SkipChildren
            } else {
                Flow::Continue
            })
        }
    }

    #[test]
    fn test_skip_children() {
        let mut ast = Ast::parse("f(a); b").unwrap();
        let mut visitor = SkipCalls { visited: Vec::new() };
        ast.accept(&mut visitor).unwrap();
        assert_eq!(
            visitor.visited,
            vec![
                "Program",
                "ExpressionStatement",
                "CallExpression",
                "ExpressionStatement",
                "Identifier",
            ]
        );
    }

    #[test]
    fn test_walk_from_subtree() {
        let mut ast = Ast::parse("f(a); g(b)").unwrap();
        let second = ast.node(ast.root()).body().unwrap()[1].id();
        let mut count = 0;
        let mut visitor = |_: &mut Ast, _: NodeId| -> Result<(), SpliceError> {
            count += 1;
            Ok(())
        };
        assert_eq!(ast.walk_from(second, &mut visitor).unwrap(), second);
        assert_eq!(count, 4);
    }

    // ==================== Map and reduce ====================

    #[test]
    fn test_map_replaces_truthy_results() {
        let mut ast = Ast::parse("a + b").unwrap();
        ast.map(|node| node.name().filter(|name| *name == "a").map(|_| "c".to_string()))
            .unwrap();
        assert_eq!(ast.deparse().unwrap(), "c + b");
    }

    #[test]
    fn test_map_empty_result_is_ignored() {
        let mut ast = Ast::parse("a + b").unwrap();
        let before = ast.node(ast.root()).body().unwrap()[0].id();
        ast.map(|_| Some(String::new())).unwrap();
        assert!(ast.is_attached(before));
        assert_eq!(ast.deparse().unwrap(), "a + b");
    }

    #[test]
    fn test_reduce_counts_literals() {
        let ast = Ast::parse("f(1, 2, [3, x])").unwrap();
        let total = ast.reduce(0.0, |sum, node| {
            sum + node.value().and_then(Scalar::as_number).unwrap_or(0.0)
        });
        assert_eq!(total, 6.0);
    }

    #[test]
    fn test_reduce_matches_walk_order() {
        let mut ast = Ast::parse("if (a) { b(c); } else d;").unwrap();
        let reduced = ast.reduce(Vec::new(), |mut kinds, node| {
            kinds.push(node.kind().to_string());
            kinds
        });

        let mut walked = Vec::new();
        ast.walk(|ast, id| {
            walked.push(ast.node(id).kind().to_string());
            Ok(())
        })
        .unwrap();
        assert_eq!(reduced, walked);
    }
}
