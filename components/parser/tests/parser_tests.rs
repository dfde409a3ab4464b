//! Parser integration tests: totality, arena balance, scope bookkeeping.

use parser::{parse, EvalMode, NodeId, NodeKind};

fn count_reachable(ast: &parser::Ast, node: NodeId) -> usize {
    let mut total = 1;
    for child in ast.node(node).kind.children() {
        total += count_reachable(ast, child);
    }
    for comment in &ast.node(node).comments {
        total += count_reachable(ast, *comment);
    }
    total
}

#[test]
fn test_parse_returns_program_root() {
    let ast = parse("let x = 1; x + 2;", EvalMode::Program);
    assert!(!ast.is_error());
    assert!(matches!(ast.node(ast.root).kind, NodeKind::Program { .. }));
}

#[test]
fn test_parse_totality_on_malformed_input() {
    for source in [
        "let = ;",
        "if (",
        "function ( {",
        "a +",
        "{ unclosed",
        "\"unterminated",
        "do { } until (x)",
        "switch (x) { case }",
    ] {
        let ast = parse(source, EvalMode::Program);
        assert!(ast.is_error(), "expected error for {:?}", source);
        assert!(ast.error().is_some());
    }
}

#[test]
fn test_arena_balance_on_success() {
    let source = "let a = 1; /* note */ function f(x) { return x * a; } f(2);";
    let mut ast = parse(source, EvalMode::Program);
    assert!(!ast.is_error());
    let reachable = count_reachable(&ast, ast.root);
    assert_eq!(ast.arena.live(), reachable);
    let root = ast.root;
    ast.arena.dispose(root);
    assert_eq!(ast.arena.live(), 0);
}

#[test]
fn test_arena_balance_on_failure() {
    let ast = parse("let = ;", EvalMode::Program);
    assert!(ast.is_error());
    // Every partially built subtree was disposed along the failing
    // production; only the terminal error node survives.
    assert_eq!(ast.arena.live(), 1);
}

#[test]
fn test_var_hoists_through_blocks() {
    let source = "function f() { { var x = 1; } return x; }";
    let ast = parse(source, EvalMode::Program);
    assert!(!ast.is_error());
    let mut function_scope = None;
    let mut block_scopes = Vec::new();
    for id in 0..ast.arena.total_allocated() {
        let id = NodeId(id as u32);
        let Some(node) = ast.arena.get(id) else { continue };
        match &node.kind {
            NodeKind::Function { .. } => function_scope = node.scope,
            NodeKind::BlockStatement { .. } => block_scopes.extend(node.scope),
            _ => {}
        }
    }
    let function_scope = function_scope.expect("function scope");
    let names: Vec<&str> = ast
        .scopes
        .scope(function_scope)
        .declarations
        .iter()
        .map(|declaration| declaration.name.as_str())
        .collect();
    assert!(names.contains(&"x"), "var x must land in the lex scope");
    for block in block_scopes {
        let block_names: Vec<&str> = ast
            .scopes
            .scope(block)
            .declarations
            .iter()
            .map(|declaration| declaration.name.as_str())
            .collect();
        assert!(!block_names.contains(&"x"));
    }
}

#[test]
fn test_let_stays_in_block() {
    let source = "function f() { { let y = 1; } }";
    let ast = parse(source, EvalMode::Program);
    assert!(!ast.is_error());
    for id in 0..ast.arena.total_allocated() {
        let id = NodeId(id as u32);
        let Some(node) = ast.arena.get(id) else { continue };
        if let NodeKind::Function { .. } = node.kind {
            let scope = node.scope.expect("function scope");
            let names: Vec<&str> = ast
                .scopes
                .scope(scope)
                .declarations
                .iter()
                .map(|declaration| declaration.name.as_str())
                .collect();
            assert!(!names.contains(&"y"), "let must not hoist out of blocks");
        }
    }
}

#[test]
fn test_statement_families_parse() {
    let sources = [
        "debugger;",
        "a: while (true) { break a; }",
        "do { x(); } while (cond)",
        "for (let i = 0; i < 3; i = i + 1) { }",
        "for (k in obj) { }",
        "for (const v of list) { }",
        "switch (v) { case 1: break; default: }",
        "try { f(); } catch (e) { } finally { }",
        "throw new Error(\"boom\");",
        "let {a, b: c, ...rest} = obj;",
        "let [x, , y = 2, ...more] = list;",
        "class Point { constructor(x) { this.x = x; } get size() { return 1; } static origin() { return 0; } #secret; static { setup(); } }",
        "import def, { one as uno } from \"mod\" assert { type: \"json\" };",
        "export { a as b };",
        "export default function () { };",
        "export * as ns from \"mod\";",
        "const f = async (a, b = 1) => a + b;",
        "let t = `a ${1 + 2} b`;",
        "let r = /ab[c/]+/g;",
        "obj?.field?.[key]?.(arg);",
        "let big = 123n;",
        "function* gen() { yield 1; yield* rest; }",
        "new scene.Node(1, 2).child;",
    ];
    for source in sources {
        let ast = parse(source, EvalMode::Program);
        assert!(
            !ast.is_error(),
            "failed to parse {:?}: {:?}",
            source,
            ast.error()
        );
    }
}

#[test]
fn test_asi_accepts_newline_and_brace() {
    for source in ["let a = 1\nlet b = 2", "{ f() }", "let a = 1"] {
        let ast = parse(source, EvalMode::Program);
        assert!(!ast.is_error(), "expected {:?} to parse", source);
    }
    let ast = parse("let a = 1 let b = 2", EvalMode::Program);
    assert!(ast.is_error(), "missing terminator must fail");
}

#[test]
fn test_comments_attach_to_nodes() {
    let source = "// leading\nlet a = 1; /* inner */ let b = 2;";
    let ast = parse(source, EvalMode::Program);
    assert!(!ast.is_error());
    let mut comment_count = 0;
    for id in 0..ast.arena.total_allocated() {
        let id = NodeId(id as u32);
        if let Some(node) = ast.arena.get(id) {
            if matches!(
                node.kind,
                NodeKind::Comment | NodeKind::MultilineComment
            ) {
                comment_count += 1;
            }
        }
    }
    assert_eq!(comment_count, 2);
}

#[test]
fn test_interpreter_directive_only_in_program_mode() {
    let source = "#!/usr/bin/env vesper\nlet a = 1;";
    assert!(!parse(source, EvalMode::Program).is_error());
    assert!(parse(source, EvalMode::Function).is_error());
}

#[test]
fn test_spans_reslice_source_text() {
    let source = "let answer = 42;";
    let ast = parse(source, EvalMode::Program);
    assert!(!ast.is_error());
    let mut found = false;
    for id in 0..ast.arena.total_allocated() {
        let id = NodeId(id as u32);
        if let Some(node) = ast.arena.get(id) {
            if matches!(node.kind, NodeKind::NumberLiteral) {
                assert_eq!(node.span.slice(source), "42");
                found = true;
            }
        }
    }
    assert!(found);
}

#[test]
fn test_json_rendering() {
    let source = "let a = 1;";
    let ast = parse(source, EvalMode::Program);
    let json = ast.to_json(source);
    assert_eq!(json["type"], "PROGRAM");
    assert_eq!(json["source"], source);
}
