//! Code generation tests: lowering shapes, jump well-formedness, and the
//! textual round trip over generated programs.

use bytecode_system::{assemble, disassemble, Opcode, Operand, Program};
use parser::{parse, CodeGenerator, EvalMode};

fn compile(source: &str) -> Program {
    let ast = parse(source, EvalMode::Program);
    assert!(!ast.is_error(), "parse failed: {:?}", ast.error());
    let mut program = Program::new("test.vs");
    CodeGenerator::new()
        .resolve(source, &ast, &mut program)
        .expect("generation failed");
    program
}

fn opcodes(program: &Program) -> Vec<Opcode> {
    program
        .instructions
        .iter()
        .map(|instruction| instruction.opcode)
        .collect()
}

#[test]
fn test_expression_orders_multiply_before_add() {
    let program = compile("1+2*3");
    let ops = opcodes(&program);
    let mul = ops.iter().position(|op| *op == Opcode::Mul).unwrap();
    let add = ops.iter().position(|op| *op == Opcode::Add).unwrap();
    assert!(mul < add);
    assert_eq!(ops.iter().filter(|op| **op == Opcode::Push).count(), 3);
}

#[test]
fn test_every_jump_lands_inside_the_stream() {
    let sources = [
        "if (a) { b(); } else { c(); }",
        "while (a) { if (b) { break; } continue; }",
        "a: for (let i = 0; i < 3; i = i + 1) { for (;;) { continue a; } }",
        "try { f(); } catch (e) { g(); } finally { h(); }",
        "switch (x) { case 1: one(); break; default: other(); }",
        "function f(a, b = 1) { return a + b; }",
        "let {a, b = 2, ...rest} = obj;",
        "let x = cond ? left() : right();",
        "let y = a && b || c ?? d;",
        "class Widget extends Base { draw() { } }",
    ];
    for source in sources {
        let program = compile(source);
        for instruction in &program.instructions {
            if let Operand::Address(target) = instruction.operand {
                assert!(
                    target <= program.len(),
                    "unpatched or escaping target {} in {:?}",
                    target,
                    source
                );
            }
        }
    }
}

#[test]
fn test_labeled_break_patches_past_label_end() {
    let program = compile("a: for(;;){ break a; }");
    let ops = opcodes(&program);
    let set_address = ops
        .iter()
        .position(|op| *op == Opcode::SetLabelAddress)
        .expect("break label frame");
    let last_label_end = ops
        .iter()
        .rposition(|op| *op == Opcode::LabelEnd)
        .expect("label end marker");
    let Operand::Address(target) = program.instructions[set_address].operand else {
        panic!("address operand expected");
    };
    assert_eq!(target, last_label_end + 1);
}

#[test]
fn test_try_catch_without_finally() {
    let program = compile("try { throw 1 } catch(e) { }");
    let ops = opcodes(&program);
    let try_end = ops.iter().position(|op| *op == Opcode::TryEnd).unwrap();
    assert!(!ops.contains(&Opcode::OnFinish));
    assert!(!ops.contains(&Opcode::Defer));
    // The handler body sits right after TRY_END and its skip jump.
    assert_eq!(ops[try_end + 1], Opcode::Jump);
    assert!(ops[try_end + 2..].contains(&Opcode::Begin));
}

#[test]
fn test_object_rest_pattern_order() {
    let program = compile("({a, ...rest} = obj);");
    let ops = opcodes(&program);
    let get_field = ops.iter().position(|op| *op == Opcode::GetField).unwrap();
    let spread = ops
        .iter()
        .position(|op| *op == Opcode::ObjectSpread)
        .unwrap();
    assert!(
        get_field < spread,
        "the consumed field must be read before the rest copy"
    );
}

#[test]
fn test_hoisted_function_binding_precedes_body() {
    let program = compile("function f() { return 1; } f();");
    let ops = opcodes(&program);
    let store = ops.iter().position(|op| *op == Opcode::Store).unwrap();
    let function = ops.iter().position(|op| *op == Opcode::Function).unwrap();
    let ret = ops.iter().position(|op| *op == Opcode::Ret).unwrap();
    assert!(function < store, "declare-and-bind comes first");
    assert!(store < ret, "the body is emitted at scope exit");
}

#[test]
fn test_closure_refs_follow_function_value() {
    let source = "function outer() { let a = 1; function inner() { return a; } return inner; }";
    let program = compile(source);
    let refs: Vec<&str> = program
        .instructions
        .iter()
        .filter(|instruction| instruction.opcode == Opcode::Ref)
        .map(|instruction| match instruction.operand {
            Operand::Constant(index) => program.constants[index as usize].as_str(),
            _ => "",
        })
        .collect();
    assert!(refs.contains(&"a"));
}

#[test]
fn test_scope_brackets_are_balanced() {
    let sources = [
        "{ let a = 1; { let b = 2; } }",
        "function f() { { } } f();",
        "for (let i of items) { use(i); }",
        "switch (x) { default: }",
    ];
    for source in sources {
        let program = compile(source);
        let ops = opcodes(&program);
        let begins = ops.iter().filter(|op| **op == Opcode::Begin).count();
        let ends = ops.iter().filter(|op| **op == Opcode::End).count();
        assert_eq!(begins, ends, "unbalanced scopes in {:?}", source);
    }
}

#[test]
fn test_directives_enable_features() {
    let program = compile("\"use strict\";\nlet a = 1;");
    let ops = opcodes(&program);
    assert_eq!(ops.iter().filter(|op| **op == Opcode::Enable).count(), 1);
}

#[test]
fn test_generated_programs_round_trip_through_text() {
    let sources = [
        "1+2*3",
        "let x = 0; while (x < 3) { x = x + 1; }",
        "function add(a, b) { return a + b; } add(1, 2);",
        "try { risky(); } catch (e) { log(e); } finally { done(); }",
        "let o = { key: \"value\", run() { return this.key; } };",
    ];
    for source in sources {
        let program = compile(source);
        let text = disassemble(&program);
        let reassembled = assemble(&text).expect("reassembly failed");
        assert_eq!(
            reassembled.to_words(),
            program.to_words(),
            "round trip drifted for {:?}",
            source
        );
    }
}

#[test]
fn test_constant_pool_is_deduplicated() {
    let program = compile("let aa = 1; aa = aa + aa; aa;");
    let occurrences = program
        .constants
        .iter()
        .filter(|constant| constant.as_str() == "aa")
        .count();
    assert_eq!(occurrences, 1);
}

#[test]
fn test_switch_lowering_tests_sequentially() {
    let program = compile("switch (v) { case 1: a(); case 2: b(); default: c(); }");
    let ops = opcodes(&program);
    assert_eq!(ops.iter().filter(|op| **op == Opcode::StrictEq).count(), 2);
    // One dispatch jump per matching test plus the default fallthrough.
    assert!(ops.iter().filter(|op| **op == Opcode::JumpIfTrue).count() >= 2);
}

#[test]
fn test_new_carries_argument_count() {
    let program = compile("new Point(1, 2, 3);");
    let new_instruction = program
        .instructions
        .iter()
        .find(|instruction| instruction.opcode == Opcode::New)
        .unwrap();
    assert_eq!(new_instruction.operand, Operand::Index(3));
}

#[test]
fn test_member_call_resolves_field_after_host() {
    let program = compile("scene.update(16);");
    let ops = opcodes(&program);
    let load = ops.iter().position(|op| *op == Opcode::Load).unwrap();
    let string = ops.iter().position(|op| *op == Opcode::Str).unwrap();
    let call = ops.iter().position(|op| *op == Opcode::MemberCall).unwrap();
    assert!(load < string && string < call);
    assert!(program.frames.contains_key(&call));
}
