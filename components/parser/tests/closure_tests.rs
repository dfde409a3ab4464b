//! Closure resolution tests: capture sets and transitive propagation.

use parser::{parse, EvalMode, NodeId, NodeKind};

fn function_closure(ast: &parser::Ast, source: &str, name: &str) -> Vec<String> {
    for id in 0..ast.arena.total_allocated() {
        let id = NodeId(id as u32);
        let Some(node) = ast.arena.get(id) else { continue };
        if let NodeKind::Function {
            identifier: Some(identifier),
            ..
        } = node.kind
        {
            if ast.node(identifier).span.slice(source) == name {
                return node
                    .kind
                    .closure()
                    .map(|closure| closure.iter().cloned().collect())
                    .unwrap_or_default();
            }
        }
    }
    panic!("function {} not found", name);
}

#[test]
fn test_inner_function_captures_outer_binding() {
    let source = "function outer() { let a; function inner() { return a; } return inner; }";
    let ast = parse(source, EvalMode::Program);
    assert!(!ast.is_error());
    assert_eq!(function_closure(&ast, source, "inner"), ["a"]);
    assert!(function_closure(&ast, source, "outer").is_empty());
}

#[test]
fn test_capture_propagates_through_boundaries() {
    let source = "function wrapper() {\
                      let b;\
                      function outer() {\
                          let a;\
                          function inner() { return a + b; }\
                          return inner;\
                      }\
                  }";
    let ast = parse(source, EvalMode::Program);
    assert!(!ast.is_error());
    let inner = function_closure(&ast, source, "inner");
    assert!(inner.contains(&"a".to_string()));
    assert!(inner.contains(&"b".to_string()));
    // The transit through outer records b, but a is local to it.
    let outer = function_closure(&ast, source, "outer");
    assert!(outer.contains(&"b".to_string()));
    assert!(!outer.contains(&"a".to_string()));
}

#[test]
fn test_self_reference_does_not_capture() {
    let source = "function rec() { return rec; }";
    let ast = parse(source, EvalMode::Program);
    assert!(!ast.is_error());
    assert!(function_closure(&ast, source, "rec").is_empty());
}

#[test]
fn test_parameters_are_not_captured_by_their_own_function() {
    let source = "function f(p) { return p; }";
    let ast = parse(source, EvalMode::Program);
    assert!(!ast.is_error());
    assert!(function_closure(&ast, source, "f").is_empty());
}

#[test]
fn test_parameter_captured_by_nested_function() {
    let source = "function f(p) { function g() { return p; } return g; }";
    let ast = parse(source, EvalMode::Program);
    assert!(!ast.is_error());
    assert_eq!(function_closure(&ast, source, "g"), ["p"]);
}

#[test]
fn test_arrow_functions_capture() {
    let source = "function f() { let v = 1; let a = () => v; return a; }";
    let ast = parse(source, EvalMode::Program);
    assert!(!ast.is_error());
    let mut found = false;
    for id in 0..ast.arena.total_allocated() {
        let id = NodeId(id as u32);
        let Some(node) = ast.arena.get(id) else { continue };
        if let NodeKind::ArrowFunction { closure, .. } = &node.kind {
            assert!(closure.contains("v"));
            found = true;
        }
    }
    assert!(found, "arrow function not found");
}

#[test]
fn test_program_level_bindings_are_captured() {
    let source = "let shared = 1; function f() { return shared; }";
    let ast = parse(source, EvalMode::Program);
    assert!(!ast.is_error());
    // The program root is a lex scope outside the function boundary.
    assert_eq!(function_closure(&ast, source, "f"), ["shared"]);
}
