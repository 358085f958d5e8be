//! Slot writes: replace, sibling insertion, templated wrap and scalar setters
//!
//! Every operation finishes extraction and template rendering before it
//! writes a slot, so an error leaves the tree as it was.

use std::collections::hash_map::Entry;

use jsplice_syntax::{FormatOptions, Scalar};
use tracing::debug;

use crate::classification::Capability;
use crate::error::SpliceError;
use crate::extract::{extract, Extraction};
use crate::node::Placement;
use crate::template::{Template, TemplateArg};
use crate::tree::{Ast, NodeId, Value};

impl Ast {
    fn ensure_attached(&self, id: NodeId) -> Result<(), SpliceError> {
        if self.record(id).orphaned {
            return Err(SpliceError::Detached { id });
        }
        Ok(())
    }

    pub(crate) fn set_scalar(
        &mut self,
        id: NodeId,
        key: &str,
        value: Scalar,
    ) -> Result<(), SpliceError> {
        self.ensure_attached(id)?;

        let previous = match self.record_mut(id).get_mut(key) {
            Some(slot) => std::mem::replace(slot, Value::Scalar(value)),
            None => {
                self.record_mut(id)
                    .data
                    .push((key.to_string(), Value::Scalar(value)));
                return Ok(());
            }
        };

        // A scalar written over a child detaches that child
        let mut detached = Vec::new();
        collect_nodes(&previous, &mut detached);
        for child in detached {
            self.orphan_subtree(child);
        }
        Ok(())
    }

    pub(crate) fn replace_node(
        &mut self,
        id: NodeId,
        snippet: &str,
    ) -> Result<NodeId, SpliceError> {
        self.ensure_attached(id)?;
        let record = self.record(id);
        let parent = record.parent.ok_or(SpliceError::CannotReplaceRoot)?;
        let key = record.parent_key.clone().unwrap_or_default();
        let index = record.parent_index;

        let extraction = Extraction::for_node(self.node(id))?;
        let raw = extract(&self.builder, snippet, &extraction)?.into_raw();

        let builder = self.builder.clone();
        let new_id = builder.wrap_node(&mut self.nodes, &raw, Some(parent), Some(&key), index);
        if let Some(slot) = self.slot_mut(parent, &key, index) {
            *slot = Value::Node(new_id);
        }

        self.orphan_subtree(id);
        self.record_mut(id).forward = Some(new_id);
        debug!(
            old = %id,
            new = %new_id,
            kind = %self.record(new_id).kind,
            "replaced node"
        );
        Ok(new_id)
    }

    pub(crate) fn affix_node(
        &mut self,
        id: NodeId,
        snippet: &str,
        placement: Placement,
    ) -> Result<NodeId, SpliceError> {
        self.ensure_attached(id)?;
        let record = self.record(id);

        match record.capability {
            Some(Capability::Statement) => {}
            Some(Capability::Expression) => {
                let statement = self.statement_ancestor(id)?;
                return self.affix_node(statement, snippet, placement);
            }
            Some(Capability::BlockContainer) | None => {
                return Err(SpliceError::MissingCapability {
                    kind: record.kind.clone(),
                    operation: "affix",
                });
            }
        }

        let (Some(parent), Some(index)) = (record.parent, record.parent_index) else {
            return Err(SpliceError::NotInSequence {
                kind: record.kind.clone(),
            });
        };
        let key = record.parent_key.clone().unwrap_or_default();

        let raw = extract(&self.builder, snippet, &Extraction::Statement)?.into_raw();
        let position = match placement {
            Placement::Before => index,
            Placement::After => index + 1,
        };

        let builder = self.builder.clone();
        let new_id = builder.wrap_node(
            &mut self.nodes,
            &raw,
            Some(parent),
            Some(&key),
            Some(position),
        );

        let mut siblings = Vec::new();
        if let Some(Value::List(items)) = self.record_mut(parent).get_mut(&key) {
            let position = position.min(items.len());
            items.insert(position, Value::Node(new_id));
            siblings = items.iter().map(Value::as_node).collect();
        }

        // Every element after the insertion point moved by one
        for (i, sibling) in siblings.into_iter().enumerate() {
            if let Some(sibling) = sibling {
                self.record_mut(sibling).parent_index = Some(i);
            }
        }

        debug!(
            anchor = %id,
            new = %new_id,
            ?placement,
            "inserted statement"
        );
        Ok(new_id)
    }

    pub(crate) fn wrap_template(
        &mut self,
        id: NodeId,
        template: TemplateArg<'_>,
    ) -> Result<NodeId, SpliceError> {
        self.ensure_attached(id)?;

        let mut text = self
            .node(id)
            .deparse_with(&FormatOptions::without_semicolons())?;
        if self.record(id).capability == Some(Capability::BlockContainer) {
            text = strip_braces(&text).to_string();
        }

        let snippet = match template {
            TemplateArg::Compiled(template) => template.render(&text),
            TemplateArg::Source(source) => match self.templates.entry(source.into_owned()) {
                Entry::Occupied(entry) => entry.get().render(&text),
                Entry::Vacant(entry) => {
                    let compiled = Template::compile(entry.key())?;
                    entry.insert(compiled).render(&text)
                }
            },
        };

        self.replace_node(id, &snippet)
    }

    /// Nearest ancestor that can have siblings inserted next to it
    fn statement_ancestor(&self, id: NodeId) -> Result<NodeId, SpliceError> {
        let mut current = self.record(id).parent;
        while let Some(ancestor) = current {
            let record = self.record(ancestor);
            if record.capability == Some(Capability::Statement) {
                return Ok(ancestor);
            }
            current = record.parent;
        }
        Err(SpliceError::ReachedRoot {
            kind: self.record(id).kind.clone(),
        })
    }

    fn slot_mut(&mut self, parent: NodeId, key: &str, index: Option<usize>) -> Option<&mut Value> {
        let value = self.record_mut(parent).get_mut(key)?;
        match index {
            Some(i) => match value {
                Value::List(items) => items.get_mut(i),
                _ => None,
            },
            None => Some(value),
        }
    }
}

fn collect_nodes(value: &Value, out: &mut Vec<NodeId>) {
    match value {
        Value::Node(id) => out.push(*id),
        Value::List(items) => items.iter().for_each(|item| collect_nodes(item, out)),
        Value::Scalar(_) => {}
    }
}

/// Drop the outermost character on each side of a printed block
fn strip_braces(text: &str) -> &str {
    let mut chars = text.chars();
    chars.next();
    chars.next_back();
    chars.as_str()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::node::Node;

    fn statements(ast: &Ast) -> Vec<Node<'_>> {
        ast.node(ast.root()).body().unwrap()
    }

    fn assert_indices_consistent(ast: &Ast) {
        for (i, statement) in statements(ast).iter().enumerate() {
            assert_eq!(statement.parent_index(), Some(i), "statement {} misindexed", i);
        }
    }

    // ==================== Replace ====================

    #[test]
    fn test_replace_expression() {
        let mut ast = Ast::parse("a + b").unwrap();
        let left = statements(&ast)[0].expression().unwrap().child("left").unwrap().id();
        let new_id = ast.node_mut(left).replace("f(x)").unwrap();

        assert_eq!(ast.deparse().unwrap(), "f(x) + b");
        let new_node = ast.node(new_id);
        assert!(new_node.is_call_expression());
        assert_eq!(new_node.parent_key(), Some("left"));
        assert_eq!(new_node.parent().unwrap().kind(), "BinaryExpression");
    }

    #[test]
    fn test_replace_forwards_and_detaches() {
        let mut ast = Ast::parse("a(b)").unwrap();
        let call = statements(&ast)[0].expression().unwrap();
        let (call_id, argument_id) = (call.id(), call.arguments().unwrap()[0].id());

        let new_id = ast.node_mut(call_id).replace("c").unwrap();
        assert_eq!(ast.resolve(call_id), new_id);
        assert!(!ast.is_attached(call_id));
        assert!(!ast.is_attached(argument_id));
        assert!(ast.is_attached(new_id));
    }

    #[test]
    fn test_replace_detached_node_fails() {
        let mut ast = Ast::parse("a").unwrap();
        let id = statements(&ast)[0].expression().unwrap().id();
        ast.node_mut(id).replace("b").unwrap();

        let err = ast.node_mut(id).replace("c").unwrap_err();
        assert!(matches!(err, SpliceError::Detached { .. }));
        assert_eq!(ast.deparse().unwrap(), "b");
    }

    #[test]
    fn test_replace_root_fails() {
        let mut ast = Ast::parse("a").unwrap();
        let root = ast.root();
        assert!(matches!(
            ast.node_mut(root).replace("b"),
            Err(SpliceError::CannotReplaceRoot)
        ));
    }

    #[test]
    fn test_replace_without_capability() {
        let mut ast = Ast::parse("var a = 1").unwrap();
        let declarator = statements(&ast)[0].children("declarations")[0].id();
        assert!(matches!(
            ast.node_mut(declarator).replace("b = 2"),
            Err(SpliceError::MissingCapability { operation: "replace", .. })
        ));
    }

    #[test]
    fn test_replace_sequence_element_keeps_index() {
        let mut ast = Ast::parse("f(a, b, c)").unwrap();
        let b = statements(&ast)[0].expression().unwrap().arguments().unwrap()[1].id();
        let new_id = ast.node_mut(b).replace("x + y").unwrap();
        assert_eq!(ast.node(new_id).parent_index(), Some(1));
        assert_eq!(ast.deparse().unwrap(), "f(a, x + y, c)");
    }

    // ==================== Affix ====================

    #[test]
    fn test_prefix_and_suffix() {
        let mut ast = Ast::parse("a()").unwrap();
        let id = statements(&ast)[0].id();
        ast.node_mut(id).prefix("b()").unwrap();
        ast.node_mut(id).suffix("c()").unwrap();
        assert_eq!(ast.deparse().unwrap(), "b();\na();\nc()");
        assert_indices_consistent(&ast);
    }

    #[test]
    fn test_expression_affix_climbs_to_statement() {
        let mut ast = Ast::parse("var x = f(1);").unwrap();
        let call = statements(&ast)[0].children("declarations")[0]
            .child("init")
            .unwrap()
            .id();
        let new_id = ast.node_mut(call).prefix("g()").unwrap();
        assert_eq!(ast.node(new_id).parent_index(), Some(0));
        assert_eq!(ast.deparse().unwrap(), "g();\nvar x = f(1)");
    }

    #[test]
    fn test_affix_requires_sequence() {
        let mut ast = Ast::parse("if (a) b();").unwrap();
        let consequent = statements(&ast)[0].child("consequent").unwrap().id();
        let err = ast.node_mut(consequent).suffix("c()").unwrap_err();
        assert!(matches!(
            err,
            SpliceError::NotInSequence { ref kind } if kind == "ExpressionStatement"
        ));
    }

    #[test]
    fn test_affix_on_block_container() {
        let mut ast = Ast::parse("function f() {}").unwrap();
        let body = statements(&ast)[0].child("body").unwrap().id();
        assert!(matches!(
            ast.node_mut(body).prefix("a()"),
            Err(SpliceError::MissingCapability { operation: "affix", .. })
        ));
    }

    #[test]
    fn test_affix_expression_without_statement_ancestor() {
        let json = r#"{"type":"Program","body":[],"extra":{"type":"Identifier","name":"x"}}"#;
        let mut ast = Ast::from_json(json).unwrap();
        let identifier = ast.node(ast.root()).child("extra").unwrap().id();
        assert!(matches!(
            ast.node_mut(identifier).prefix("a()"),
            Err(SpliceError::ReachedRoot { .. })
        ));
    }

    #[test]
    fn test_affix_rejects_multiple_statements() {
        let mut ast = Ast::parse("a()").unwrap();
        let id = statements(&ast)[0].id();
        assert!(matches!(
            ast.node_mut(id).prefix("b(); c()"),
            Err(SpliceError::MultipleStatements { found: 2 })
        ));
        assert_eq!(ast.deparse().unwrap(), "a()");
    }

    // ==================== Wrap ====================

    #[test]
    fn test_wrap_expression() {
        let mut ast = Ast::parse("x = a").unwrap();
        let a = statements(&ast)[0].expression().unwrap().child("right").unwrap().id();
        ast.node_mut(a).wrap("(<%= node %> || {})").unwrap();
        assert_eq!(ast.deparse().unwrap(), "x = a || {}");
    }

    #[test]
    fn test_wrap_caches_source_templates() {
        let mut ast = Ast::parse("a; b").unwrap();
        let ids: Vec<NodeId> = statements(&ast)
            .iter()
            .map(|s| s.expression().unwrap().id())
            .collect();
        for id in ids {
            ast.node_mut(id).wrap("f(<%= node %>)").unwrap();
        }
        assert_eq!(ast.templates.len(), 1);
        assert_eq!(ast.deparse().unwrap(), "f(a);\nf(b)");
    }

    #[test]
    fn test_wrap_compiled_template() {
        let template = Template::compile("!<%= node %>").unwrap();
        let mut ast = Ast::parse("a").unwrap();
        let id = statements(&ast)[0].expression().unwrap().id();
        ast.node_mut(id).wrap(&template).unwrap();
        assert_eq!(ast.deparse().unwrap(), "!a");
        assert!(ast.templates.is_empty());
    }

    #[test]
    fn test_wrap_bad_template_leaves_tree() {
        let mut ast = Ast::parse("a").unwrap();
        let id = statements(&ast)[0].expression().unwrap().id();
        let err = ast.node_mut(id).wrap("f(<%= other %>)").unwrap_err();
        assert!(matches!(err, SpliceError::Template(_)));
        assert!(ast.is_attached(id));
        assert_eq!(ast.deparse().unwrap(), "a");
    }

    #[test]
    fn test_strip_braces() {
        assert_eq!(strip_braces("{\n    a\n}"), "\n    a\n");
        assert_eq!(strip_braces("{}"), "");
    }

    // ==================== Setters ====================

    #[test]
    fn test_set_over_child_detaches_it() {
        let mut ast = Ast::parse("f(a)").unwrap();
        let call = statements(&ast)[0].expression().unwrap();
        let (call_id, callee_id) = (call.id(), call.child("callee").unwrap().id());
        ast.node_mut(call_id).set("callee", Scalar::Null).unwrap();
        assert!(!ast.is_attached(callee_id));
    }
}
