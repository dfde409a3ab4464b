//! End-to-end evaluation tests: compile with the parser component, run
//! against the test host.

mod support;

use bytecode_system::Program;
use interpreter::{EvalContext, Host, VirtualMachine};
use parser::{parse, CodeGenerator, EvalMode};
use std::rc::Rc;
use support::{TestHost, Value};

fn run(source: &str) -> (Value, TestHost) {
    let ast = parse(source, EvalMode::Program);
    assert!(!ast.is_error(), "parse failed: {:?}", ast.error());
    let mut program = Program::new("test.vs");
    CodeGenerator::new()
        .resolve(source, &ast, &mut program)
        .expect("generation failed");
    let program = Rc::new(program);
    let mut host = TestHost::new(program.clone());
    let mut context = EvalContext::new();
    let result = VirtualMachine::new().eval(&mut host, &program, &mut context);
    (result, host)
}

fn eval_number(source: &str) -> f64 {
    let (result, host) = run(source);
    assert!(
        !host.is_exception(&result),
        "unexpected exception for {:?}",
        source
    );
    result
        .as_number()
        .unwrap_or_else(|| panic!("expected a number for {:?}", source))
}

fn eval_string(source: &str) -> String {
    let (result, _) = run(source);
    result
        .as_string()
        .unwrap_or_else(|| panic!("expected a string for {:?}", source))
}

fn eval_bool(source: &str) -> bool {
    let (result, _) = run(source);
    result
        .as_bool()
        .unwrap_or_else(|| panic!("expected a boolean for {:?}", source))
}

#[test]
fn test_arithmetic_precedence() {
    assert_eq!(eval_number("1+2*3"), 7.0);
    assert_eq!(eval_number("(1+2)*3"), 9.0);
    assert_eq!(eval_number("2**3"), 8.0);
    assert_eq!(eval_number("7%4"), 3.0);
    assert_eq!(eval_number("-5 + 1"), -4.0);
}

#[test]
fn test_comparisons_and_logic() {
    assert!(eval_bool("1 < 2"));
    assert!(eval_bool("2 <= 2"));
    assert!(!eval_bool("1 == 2"));
    assert!(eval_bool("1 != 2"));
    assert!(eval_bool("1 === 1"));
    assert!(eval_bool("1 !== \"1\""));
    assert!(eval_bool("!0"));
    assert_eq!(eval_number("0 || 7"), 7.0);
    assert_eq!(eval_number("1 && 2"), 2.0);
    assert_eq!(eval_number("null ?? 5"), 5.0);
}

#[test]
fn test_bitwise_operators() {
    assert_eq!(eval_number("6 & 3"), 2.0);
    assert_eq!(eval_number("6 | 3"), 7.0);
    assert_eq!(eval_number("6 ^ 3"), 5.0);
    assert_eq!(eval_number("1 << 4"), 16.0);
    assert_eq!(eval_number("16 >> 2"), 4.0);
    assert_eq!(eval_number("~0"), -1.0);
}

#[test]
fn test_variables_and_assignment() {
    assert_eq!(eval_number("let x = 5; x"), 5.0);
    assert_eq!(eval_number("let x = 1; x = x + 2; x"), 3.0);
    assert_eq!(eval_number("var a = 2; var b = 3; a * b"), 6.0);
    assert_eq!(eval_number("let x = 1; x += 4; x"), 5.0);
}

#[test]
fn test_update_expressions() {
    assert_eq!(eval_number("let i = 1; i++; i"), 2.0);
    assert_eq!(eval_number("let i = 1; let j = i++; j"), 1.0);
    assert_eq!(eval_number("let i = 1; let j = ++i; j"), 2.0);
    assert_eq!(eval_number("let i = 5; i--; i"), 4.0);
}

#[test]
fn test_conditionals() {
    assert_eq!(eval_number("true ? 1 : 2"), 1.0);
    assert_eq!(eval_number("false ? 1 : 2"), 2.0);
    assert_eq!(eval_number("let r = 0; if (1 < 2) { r = 10; } else { r = 20; } r"), 10.0);
    assert_eq!(eval_number("let r = 0; if (1 > 2) { r = 10; } else { r = 20; } r"), 20.0);
}

#[test]
fn test_while_loop_with_break_and_continue() {
    assert_eq!(
        eval_number("let i = 0; while (true) { if (i >= 3) { break; } i = i + 1; } i"),
        3.0
    );
    assert_eq!(
        eval_number(
            "let i = 0; let s = 0; while (i < 5) { i = i + 1; if (i == 2) { continue; } s = s + i; } s"
        ),
        13.0
    );
}

#[test]
fn test_do_while_loop() {
    assert_eq!(eval_number("let i = 0; do { i = i + 1; } while (i < 3) i"), 3.0);
}

#[test]
fn test_for_loop() {
    assert_eq!(
        eval_number("let s = 0; for (let i = 0; i < 5; i = i + 1) { s = s + i; } s"),
        10.0
    );
    assert_eq!(
        eval_number(
            "let s = 0; for (let i = 0; i < 5; i = i + 1) { if (i == 2) { continue; } s = s + i; } s"
        ),
        8.0
    );
}

#[test]
fn test_labeled_break_exits_outer_loop() {
    assert_eq!(
        eval_number("let n = 0; a: for (;;) { for (;;) { n = n + 1; break a; } } n"),
        1.0
    );
}

#[test]
fn test_switch_dispatch() {
    let source = "let x = 2; let r = 0; switch (x) { case 1: r = 10; break; case 2: r = 20; break; default: r = 30; } r";
    assert_eq!(eval_number(source), 20.0);
    let fallthrough =
        "let x = 9; let r = 0; switch (x) { case 1: r = 10; break; default: r = 30; } r";
    assert_eq!(eval_number(fallthrough), 30.0);
}

#[test]
fn test_functions_and_arguments() {
    assert_eq!(
        eval_number("function add(a, b) { return a + b; } add(2, 3)"),
        5.0
    );
    assert_eq!(
        eval_number("function twice(f, v) { return f(f(v)); } function inc(n) { return n + 1; } twice(inc, 5)"),
        7.0
    );
}

#[test]
fn test_default_parameters() {
    assert_eq!(
        eval_number("function f(a, b = 10) { return a + b; } f(1)"),
        11.0
    );
    assert_eq!(
        eval_number("function f(a, b = 10) { return a + b; } f(1, 2)"),
        3.0
    );
}

#[test]
fn test_hoisted_function_is_callable_before_definition() {
    assert_eq!(eval_number("let r = early(); function early() { return 4; } r"), 4.0);
}

#[test]
fn test_closures_capture_bindings() {
    let source = "function outer() { let a = 41; function inner() { return a + 1; } return inner; } outer()()";
    assert_eq!(eval_number(source), 42.0);
    let counter = "function make() { let n = 0; function next() { n = n + 1; return n; } return next; } let c = make(); c(); c(); c()";
    assert_eq!(eval_number(counter), 3.0);
}

#[test]
fn test_recursion() {
    assert_eq!(
        eval_number("function fib(n) { if (n < 2) { return n; } return fib(n - 1) + fib(n - 2); } fib(10)"),
        55.0
    );
}

#[test]
fn test_objects_and_member_access() {
    assert_eq!(eval_number("let o = { a: 1, b: 2 }; o.a + o.b"), 3.0);
    assert_eq!(eval_number("let o = { a: 1 }; o.a = 5; o.a"), 5.0);
    assert_eq!(eval_number("let o = { }; o[\"k\"] = 7; o[\"k\"]"), 7.0);
    assert_eq!(eval_number("let a = [10, 20, 30]; a[1]"), 20.0);
}

#[test]
fn test_method_call_binds_this() {
    let source =
        "let obj = { v: 6, read: function () { return this.v; } }; obj.read()";
    assert_eq!(eval_number(source), 6.0);
}

#[test]
fn test_constructor_call() {
    let source = "function Point(x, y) { this.x = x; this.y = y; } let p = new Point(3, 4); p.x + p.y";
    assert_eq!(eval_number(source), 7.0);
}

#[test]
fn test_string_operations() {
    assert_eq!(eval_string("\"foo\" + \"bar\""), "foobar");
    assert_eq!(eval_string("`a ${1 + 2} b`"), "a 3 b");
    assert_eq!(eval_string("typeof 1"), "number");
    assert_eq!(eval_string("typeof \"s\""), "string");
    assert_eq!(eval_string("typeof undefined"), "undefined");
}

#[test]
fn test_destructuring_assignment() {
    assert_eq!(
        eval_number("let o = { a: 1, b: 2 }; let x = 0; let y = 0; ({a: x, b: y} = o); x + y"),
        3.0
    );
    assert_eq!(
        eval_number("let o = { a: 9 }; let {a} = o; a"),
        9.0
    );
}

#[test]
fn test_shorthand_and_computed_properties() {
    assert_eq!(eval_number("let v = 3; let o = { v }; o.v"), 3.0);
    assert_eq!(eval_number("let k = \"key\"; let o = { [k]: 8 }; o.key"), 8.0);
}

#[test]
fn test_sequence_and_void() {
    assert_eq!(eval_number("(1, 2, 3)"), 3.0);
    assert_eq!(eval_string("typeof void 0"), "undefined");
}

#[test]
fn test_for_of_over_custom_iterator() {
    let source = "\
        function range(limit) {\
            let i = 0;\
            let iter = { };\
            iter.next = function () {\
                let done = i >= limit;\
                let out = { done: done, value: i };\
                i = i + 1;\
                return out;\
            };\
            let obj = { };\
            obj[\"@@iterator\"] = function () { return iter; };\
            return obj;\
        }\
        let s = 0;\
        for (let v of range(4)) { s = s + v; }\
        s";
    assert_eq!(eval_number(source), 6.0);
}

#[test]
fn test_fail_stop_on_unimplemented_opcode() {
    // DEBUGGER has no behavior: execution stops at it, so the second
    // statement never runs and the first value is the result.
    let (result, host) = run("1; debugger; 2;");
    assert!(!host.is_exception(&result));
    assert_eq!(result.as_number(), Some(1.0));
}

#[test]
fn test_generator_yield_produces_interrupt() {
    let source = "function* gen() { yield 7; } gen()";
    let (result, host) = run(source);
    assert!(host.is_interrupt(&result));
}
