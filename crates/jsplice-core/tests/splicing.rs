//! End-to-end behavior of wrapping, walking and splicing
//!
//! Each test parses a small program, edits it through the public API and
//! checks the printed result.

use jsplice_core::{Ast, FormatOptions, NodeId, Scalar, SpliceError};

fn statements(ast: &Ast) -> Vec<NodeId> {
    ast.node(ast.root())
        .body()
        .unwrap()
        .iter()
        .map(|node| node.id())
        .collect()
}

fn try_catch_body(ast: &mut Ast, parent_kind: &str) {
    ast.walk(|ast, id| {
        let node = ast.node(id);
        let under_function = node.parent().is_some_and(|parent| parent.is_kind(parent_kind));
        if node.is_block_statement() && under_function {
            ast.node_mut(id).wrap("{try{<%= node %>}catch(e){}}")?;
        }
        Ok(())
    })
    .unwrap();
}

// ==================== Round trip ====================

#[test]
fn test_deparse_number() {
    let ast = Ast::parse("1").unwrap();
    assert_eq!(ast.deparse().unwrap(), "1");
}

#[test]
fn test_deparse_regex() {
    let ast = Ast::parse("/(.[^.]+)$/g").unwrap();
    assert_eq!(ast.deparse().unwrap(), "/(.[^.]+)$/g");
}

#[test]
fn test_json_round_trip() {
    let raw = jsplice_syntax::parse_program("x = /a/g; y = [1, , 'b'];").unwrap();
    let json = raw.to_json().to_string();
    let ast = Ast::from_json(&json).unwrap();
    assert_eq!(ast.unwrap(ast.root()), raw);
}

// ==================== Walk ====================

#[test]
fn test_walk_visits_five_nodes() {
    let mut ast = Ast::parse("1 + 1").unwrap();
    let mut visits = 0;
    ast.walk(|_, _| {
        visits += 1;
        Ok(())
    })
    .unwrap();
    assert_eq!(visits, 5);
}

#[test]
fn test_setter_agrees_with_printer() {
    let mut ast = Ast::parse("1 + 1").unwrap();
    ast.walk(|ast, id| {
        if ast.node(id).value() == Some(&Scalar::Number(1.0)) {
            ast.node_mut(id).set_value(2)?;
        }
        Ok(())
    })
    .unwrap();
    assert_eq!(ast.deparse().unwrap(), "2 + 2");
}

#[test]
fn test_replace_agrees_with_setter() {
    let mut ast = Ast::parse("1 + 1").unwrap();
    ast.walk(|ast, id| {
        if ast.node(id).value() == Some(&Scalar::Number(1.0)) {
            ast.node_mut(id).replace("2")?;
        }
        Ok(())
    })
    .unwrap();
    assert_eq!(ast.deparse().unwrap(), "2 + 2");
}

#[test]
fn test_map_and_reduce_agree_with_walk() {
    let mut mapped = Ast::parse("1 + 1").unwrap();
    mapped
        .map(|node| (node.value() == Some(&Scalar::Number(1.0))).then(|| "2".to_string()))
        .unwrap();
    assert_eq!(mapped.deparse().unwrap(), "2 + 2");

    let count = mapped.reduce(0, |count, _| count + 1);
    assert_eq!(count, 5);
}

// ==================== Statements ====================

#[test]
fn test_replace_statement() {
    let mut ast = Ast::parse("1 + 1").unwrap();
    let statement = statements(&ast)[0];
    ast.node_mut(statement).replace("2 + 2").unwrap();
    assert_eq!(ast.deparse().unwrap(), "2 + 2");
}

#[test]
fn test_prefix_statement() {
    let mut ast = Ast::parse("1 + 1").unwrap();
    let statement = statements(&ast)[0];
    ast.node_mut(statement).prefix("2 + 2").unwrap();
    assert_eq!(ast.deparse().unwrap(), "2 + 2;\n1 + 1");
}

#[test]
fn test_suffix_statement() {
    let mut ast = Ast::parse("1 + 1").unwrap();
    let statement = statements(&ast)[0];
    ast.node_mut(statement).suffix("2 + 2").unwrap();
    assert_eq!(ast.deparse().unwrap(), "1 + 1;\n2 + 2");
}

#[test]
fn test_double_insert_keeps_siblings_replaceable() {
    let mut ast = Ast::parse("a(); b();").unwrap();
    let ids = statements(&ast);
    let (a, b) = (ids[0], ids[1]);

    let x = ast.node_mut(a).prefix("x()").unwrap();
    let y = ast.node_mut(a).suffix("y()").unwrap();
    assert_eq!(ast.deparse().unwrap(), "x();\na();\ny();\nb()");

    for (position, id) in [x, a, y, b].into_iter().enumerate() {
        assert_eq!(ast.node(id).parent_index(), Some(position));
    }

    ast.node_mut(b).replace("d()").unwrap();
    ast.node_mut(y).replace("z()").unwrap();
    ast.node_mut(x).replace("w()").unwrap();
    ast.node_mut(a).replace("c()").unwrap();
    assert_eq!(ast.deparse().unwrap(), "w();\nc();\nz();\nd()");
}

#[test]
fn test_insert_inside_function_body() {
    let mut ast = Ast::parse("function f() { a(); b(); }").unwrap();
    let function = statements(&ast)[0];
    let body = ast.node(function).child("body").unwrap();
    let b = body.body().unwrap()[1].id();

    ast.node_mut(b).prefix("log()").unwrap();
    assert_eq!(
        ast.deparse().unwrap(),
        "function f() {\n    a();\n    log();\n    b()\n}"
    );
}

// ==================== Templates ====================

#[test]
fn test_wrap_expression_in_call() {
    let mut ast = Ast::parse("1 + 2 + 5").unwrap();
    ast.walk(|ast, id| {
        if ast.node(id).value() == Some(&Scalar::Number(5.0)) {
            ast.node_mut(id).wrap("f(<%= node %>)")?;
        }
        Ok(())
    })
    .unwrap();
    assert_eq!(ast.deparse().unwrap(), "1 + 2 + f(5)");
}

#[test]
fn test_wrap_function_declaration_body() {
    let mut ast = Ast::parse("function f(a) { return a; }").unwrap();
    try_catch_body(&mut ast, "FunctionDeclaration");
    assert_eq!(
        ast.deparse_with(&FormatOptions::compact()).unwrap(),
        "function f(a){try{return a;}catch(e){}}"
    );
}

#[test]
fn test_wrap_function_expression_body() {
    let mut ast = Ast::parse("var x = function(a) { return a; };").unwrap();
    try_catch_body(&mut ast, "FunctionExpression");
    assert_eq!(
        ast.deparse_with(&FormatOptions::compact()).unwrap(),
        "var x=function(a){try{return a;}catch(e){}};"
    );
}

#[test]
fn test_wrap_block_without_caller_braces() {
    let mut ast = Ast::parse("function f(a) { return a; }").unwrap();
    let function = statements(&ast)[0];
    let body = ast.node(function).child("body").unwrap().id();
    ast.node_mut(body)
        .wrap("try{<%= node %>}finally{done()}")
        .unwrap();
    assert_eq!(
        ast.deparse_with(&FormatOptions::compact()).unwrap(),
        "function f(a){try{return a;}finally{done();}}"
    );
}

// ==================== Composite ====================

#[test]
fn test_prefix_calls_with_array_argument() {
    let mut ast = Ast::parse("f(); f(1, [1,2,3]);").unwrap();
    ast.walk(|ast, id| {
        let node = ast.node(id);
        if node.callee_name() != Some("f") {
            return Ok(());
        }
        let arguments = node.arguments().unwrap_or_default();
        if arguments.len() > 1 && arguments[1].is_array_expression() {
            let snippet = format!("g({})", arguments[1].deparse()?);
            ast.node_mut(id).prefix(&snippet)?;
        }
        Ok(())
    })
    .unwrap();
    assert_eq!(
        ast.deparse_with(&FormatOptions::compact()).unwrap(),
        "f();g([1,2,3]);f(1,[1,2,3]);"
    );
}

// ==================== Errors leave the tree unchanged ====================

fn assert_unchanged(ast: &Ast, before: &str) {
    assert_eq!(ast.deparse().unwrap(), before);
}

#[test]
fn test_failed_replace_leaves_tree() {
    let mut ast = Ast::parse("a + b").unwrap();
    let before = ast.deparse().unwrap();
    let statement = statements(&ast)[0];
    let expression = ast.node(statement).expression().unwrap().id();

    for snippet in ["", "c; d", "var c", "c +"] {
        let err = ast.node_mut(expression).replace(snippet).unwrap_err();
        assert!(
            err.is_arity_error() || matches!(err, SpliceError::Parse(_)),
            "unexpected error for {:?}: {}",
            snippet,
            err
        );
        assert_unchanged(&ast, &before);
        assert!(ast.is_attached(expression));
    }
}

#[test]
fn test_unsupported_parent_leaves_tree() {
    let mut ast = Ast::parse("function f(a) { try { return a; } catch (e) {} }").unwrap();
    let before = ast.deparse().unwrap();

    let mut errors = Vec::new();
    ast.walk(|ast, id| {
        let node = ast.node(id);
        let under_function = node
            .parent()
            .is_some_and(|parent| parent.is_function_declaration());
        if node.is_block_statement() && !under_function {
            if let Err(err) = ast.node_mut(id).wrap("{<%= node %>}") {
                errors.push(err);
            }
        }
        Ok(())
    })
    .unwrap();

    assert!(!errors.is_empty());
    assert!(errors
        .iter()
        .all(|err| matches!(err, SpliceError::UnsupportedParent { .. })));
    assert_unchanged(&ast, &before);
}

#[test]
fn test_structural_errors() {
    let mut ast = Ast::parse("x = 1").unwrap();
    let root = ast.root();
    assert!(matches!(
        ast.node_mut(root).replace("y"),
        Err(SpliceError::CannotReplaceRoot)
    ));

    let statement = statements(&ast)[0];
    let assignment = ast.node(statement).expression().unwrap();
    let right = assignment.child("right").unwrap().id();
    let inserted = ast.node_mut(right).suffix("y = 2").unwrap();
    assert_eq!(ast.node(inserted).parent_index(), Some(1));
    assert_eq!(ast.deparse().unwrap(), "x = 1;\ny = 2");
}

#[test]
fn test_stale_reference_is_rejected() {
    let mut ast = Ast::parse("a; b").unwrap();
    let first = statements(&ast)[0];
    let replacement = ast.node_mut(first).replace("c").unwrap();

    assert!(matches!(
        ast.node_mut(first).suffix("d"),
        Err(SpliceError::Detached { .. })
    ));
    assert_eq!(ast.resolve(first), replacement);
    ast.node_mut(ast.resolve(first)).suffix("d").unwrap();
    assert_eq!(ast.deparse().unwrap(), "c;\nd;\nb");
}
