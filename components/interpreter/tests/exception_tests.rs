//! Exception propagation: try/catch/finally shapes and the diagnostic
//! call chain.

mod support;

use bytecode_system::Program;
use interpreter::{EvalContext, Host, VirtualMachine};
use parser::{parse, CodeGenerator, EvalMode};
use std::rc::Rc;
use support::{TestHost, Value};

fn run(source: &str) -> (Value, TestHost) {
    let ast = parse(source, EvalMode::Program);
    assert!(!ast.is_error(), "parse failed: {:?}", ast.error());
    let mut program = Program::new("scripts/app.vs");
    CodeGenerator::new()
        .resolve(source, &ast, &mut program)
        .expect("generation failed");
    let program = Rc::new(program);
    let mut host = TestHost::new(program.clone());
    let mut context = EvalContext::new();
    let result = VirtualMachine::new().eval(&mut host, &program, &mut context);
    (result, host)
}

#[test]
fn test_thrown_value_reaches_catch() {
    let (result, host) = run("let r = 0; try { throw 5; } catch (e) { r = e; } r");
    assert!(!host.is_exception(&result));
    assert_eq!(result.as_number(), Some(5.0));
}

#[test]
fn test_catch_skipped_without_throw() {
    let (result, host) = run("let r = 1; try { r = 2; } catch (e) { r = 3; } r");
    assert!(!host.is_exception(&result));
    assert_eq!(result.as_number(), Some(2.0));
}

#[test]
fn test_finally_runs_on_success() {
    let (result, _) = run("let r = 0; try { r = 1; } finally { r = r + 10; } r");
    assert_eq!(result.as_number(), Some(11.0));
}

#[test]
fn test_finally_runs_on_throw_and_exception_propagates() {
    let (result, mut host) = run("try { throw 1; } finally { }");
    assert!(host.is_exception(&result));
    let caught = host.caught(&result);
    assert_eq!(caught.as_number(), Some(1.0));
}

#[test]
fn test_catch_then_finally() {
    let (result, _) =
        run("let r = 0; try { throw 2; } catch (e) { r = e; } finally { r = r + 10; } r");
    assert_eq!(result.as_number(), Some(12.0));
}

#[test]
fn test_uncaught_exception_is_returned() {
    let (result, mut host) = run("throw \"fatal\";");
    assert!(host.is_exception(&result));
    assert_eq!(host.caught(&result).as_string().as_deref(), Some("fatal"));
}

#[test]
fn test_exception_unwinds_nested_calls() {
    let source = "function f() { return g(); } function g() { throw 9; } f()";
    let (result, mut host) = run(source);
    assert!(host.is_exception(&result));
    assert_eq!(host.caught(&result).as_number(), Some(9.0));
}

#[test]
fn test_exception_inside_call_is_catchable_outside() {
    let source = "function boom() { throw 3; } let r = 0; try { boom(); } catch (e) { r = e; } r";
    let (result, _) = run(source);
    assert_eq!(result.as_number(), Some(3.0));
}

#[test]
fn test_reference_error_carries_call_chain() {
    let source = "function f() { return g(); } function g() { return missing; } f()";
    let (result, host) = run(source);
    assert!(host.is_exception(&result));
    let names: Vec<Option<&str>> = host
        .error_stack
        .iter()
        .map(|frame| frame.function_name.as_deref())
        .collect();
    assert_eq!(names, vec![Some("f"), Some("g")]);
    assert_eq!(
        host.error_stack[0].filename.as_deref(),
        Some("scripts/app.vs")
    );
}

#[test]
fn test_call_frames_are_popped_after_return() {
    let source = "function ok() { return 1; } ok(); ok(); missing";
    let (result, host) = run(source);
    assert!(host.is_exception(&result));
    // Both calls completed, so the failing lookup sees an empty chain.
    assert!(host.error_stack.is_empty());
}

#[test]
fn test_break_out_of_try_runs_finalizer() {
    let source = "let r = 0; while (true) { try { break; } finally { r = 7; } } r";
    let (result, _) = run(source);
    assert_eq!(result.as_number(), Some(7.0));
}

#[test]
fn test_calling_a_non_function_is_exceptional() {
    let (result, host) = run("let x = 4; x();");
    assert!(host.is_exception(&result));
}

#[test]
fn test_const_reassignment_is_exceptional() {
    let (result, host) = run("const c = 1; c = 2;");
    assert!(host.is_exception(&result));
}
