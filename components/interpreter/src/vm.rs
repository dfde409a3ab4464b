//! The stack machine dispatch loop.
//!
//! A single loop fetches the instruction at the program counter, advances
//! past it, and branches to a per-opcode handler until the counter reaches
//! the end of the stream; the top of the operand stack (or undefined) is
//! the result. Handlers delegate all value semantics to the [`Host`].
//! Exceptional host values short-circuit: the handler pushes the value and
//! forces the counter to end-of-stream, where the try-frame unwinder takes
//! over. Opcodes without behavior force the counter to end-of-stream the
//! same way instead of silently continuing.

use crate::context::{EvalContext, LabelFrame, LabelKind, TryFrame};
use crate::host::Host;
use bytecode_system::{FrameSite, Instruction, Opcode, Operand, Program};
use core_types::{ErrorKind, StackFrame};

/// The bytecode interpreter.
#[derive(Debug, Default)]
pub struct VirtualMachine;

impl VirtualMachine {
    /// Create a VM.
    pub fn new() -> Self {
        Self
    }

    /// Execute `program` against `context`, delegating value semantics to
    /// `host`. The context may be saved and passed to a later `eval` to
    /// resume a suspended evaluation.
    pub fn eval<H: Host>(
        &self,
        host: &mut H,
        program: &Program,
        context: &mut EvalContext<H::Value>,
    ) -> H::Value {
        if context.this_value.is_none() {
            context.this_value = Some(host.undefined());
        }
        loop {
            if context.pc >= program.len() {
                match self.unwind(host, program, context) {
                    Some(result) => return result,
                    None => continue,
                }
            }
            let instruction = program.instructions[context.pc];
            context.pc += 1;
            self.step(host, program, context, instruction);
        }
    }

    /// End-of-stream: pop the result and walk the open try regions.
    /// Exceptional results enter a pending handler; pending finalizers run
    /// with the in-flight result parked in the context; interrupts pass
    /// outward untouched.
    fn unwind<H: Host>(
        &self,
        host: &mut H,
        program: &Program,
        context: &mut EvalContext<H::Value>,
    ) -> Option<H::Value> {
        let result = match context.stack.pop() {
            Some(value) => value,
            None => host.undefined(),
        };
        if host.is_interrupt(&result) {
            return Some(result);
        }
        loop {
            let Some(frame) = context.try_frames.last().cloned() else {
                break;
            };
            while host.scope_depth() > frame.scope_depth {
                host.pop_scope();
                if let Some(top) = context.frames.pop() {
                    context.stack.truncate(top);
                }
            }
            if host.is_exception(&result) && frame.on_error.is_some() {
                break;
            }
            if frame.on_finish.is_some() {
                break;
            }
            context.try_frames.pop();
        }
        let Some(frame) = context.try_frames.last_mut() else {
            return Some(result);
        };
        if host.is_exception(&result) && frame.on_error.is_some() {
            let handler = frame.on_error.take().expect("handler address");
            let keep_region = frame.on_finish.is_some();
            context.pc = handler;
            let caught = host.caught(&result);
            context.stack.push(caught);
            if !keep_region {
                context.try_frames.pop();
            }
        } else {
            let finalizer = frame.on_finish.expect("finalizer address");
            context.pc = finalizer;
            context.try_frames.pop();
            context.defer.push(program.len());
            context.result = Some(result);
        }
        None
    }

    fn step<H: Host>(
        &self,
        host: &mut H,
        program: &Program,
        context: &mut EvalContext<H::Value>,
        instruction: Instruction,
    ) {
        match instruction.opcode {
            Opcode::Begin => {
                host.push_scope();
                context.frames.push(context.stack.len());
            }
            Opcode::End => {
                let top = context.frames.pop().unwrap_or(0);
                context.stack.truncate(top);
                host.pop_scope();
            }
            Opcode::Push => {
                let value = host.number(number(&instruction));
                context.stack.push(value);
            }
            Opcode::Pop => {
                context.stack.pop();
            }
            Opcode::PushValue => {
                let depth = index(&instruction) as usize;
                let slot = context.stack.len() - 1 - depth;
                let value = context.stack[slot].clone();
                context.stack.push(value);
            }
            Opcode::Nil => {
                let value = host.null();
                context.stack.push(value);
            }
            Opcode::Undefined => {
                let value = host.undefined();
                context.stack.push(value);
            }
            Opcode::True => {
                let value = host.boolean(true);
                context.stack.push(value);
            }
            Opcode::False => {
                let value = host.boolean(false);
                context.stack.push(value);
            }
            Opcode::Bigint => {
                let value = host.bigint(constant(program, &instruction));
                self.push_checked(host, program, context, value);
            }
            Opcode::Str => {
                let value = host.string(constant(program, &instruction));
                context.stack.push(value);
            }
            Opcode::Load => self.run_load(host, program, context, &instruction),
            Opcode::Store => self.run_store(host, program, context, &instruction),
            Opcode::Ref => {
                let name = constant(program, &instruction);
                let Some(callee) = context.stack.last().cloned() else {
                    return;
                };
                let result = host.bind_closure(&callee, name);
                if host.is_exception(&result) {
                    context.stack.push(result);
                    context.pc = program.len();
                }
            }
            Opcode::Var => {
                let value = host.undefined();
                host.define(constant(program, &instruction), value);
            }
            Opcode::Let => {
                let value = host.uninitialized();
                host.define(constant(program, &instruction), value);
            }
            Opcode::Const => {
                let value = host.uninitialized();
                host.define_immutable(constant(program, &instruction), value);
            }
            Opcode::This => {
                let value = match context.this_value.clone() {
                    Some(value) => value,
                    None => host.undefined(),
                };
                context.stack.push(value);
            }
            Opcode::Object => {
                let value = host.object();
                context.stack.push(value);
            }
            Opcode::Array => {
                let value = host.array();
                context.stack.push(value);
            }
            Opcode::SetFunctionName => {
                let name = constant(program, &instruction);
                if let Some(callee) = context.stack.last().cloned() {
                    host.set_function_name(&callee, name);
                }
            }
            Opcode::Function => {
                let value = host.function(&program.path, address(&instruction));
                context.stack.push(value);
            }
            Opcode::Generator => {
                let value = host.generator_function(&program.path, address(&instruction));
                context.stack.push(value);
            }
            Opcode::Enable | Opcode::Disable => {}
            Opcode::GetField => {
                let object = self.pop(host, context);
                let field = self.pop(host, context);
                let result = host.get_field(object, field);
                self.push_checked(host, program, context, result);
            }
            Opcode::SetField | Opcode::SetMethod => {
                let object = self.pop(host, context);
                let field = self.pop(host, context);
                let value = self.pop(host, context);
                let result = host.set_field(object, field, value);
                self.push_checked(host, program, context, result);
            }
            Opcode::SetAccessorGetter | Opcode::SetAccessorSetter => {
                let getter = instruction.opcode == Opcode::SetAccessorGetter;
                let object = self.pop(host, context);
                let field = self.pop(host, context);
                let accessor = self.pop(host, context);
                let result = host.set_accessor(object, field, accessor, getter);
                self.push_checked(host, program, context, result);
            }
            Opcode::Call => self.run_call(host, program, context),
            Opcode::MemberCall => self.run_member_call(host, program, context),
            Opcode::New => self.run_new(host, program, context, &instruction),
            Opcode::Void => {
                self.pop(host, context);
                let value = host.undefined();
                context.stack.push(value);
            }
            Opcode::Typeof => {
                let value = self.pop(host, context);
                let name = host.type_name(&value);
                let result = host.string(&name);
                context.stack.push(result);
            }
            Opcode::Ret => {
                context.pc = program.len();
            }
            Opcode::Yield => {
                let value = self.pop(host, context);
                let snapshot = context.clone();
                let interrupt = host.interrupt(snapshot, value);
                context.stack.push(interrupt);
                context.pc = program.len();
            }
            Opcode::Throw => {
                let value = self.pop(host, context);
                let exception = host.throw(value);
                context.stack.push(exception);
                context.pc = program.len();
            }
            Opcode::Jump => {
                context.pc = address(&instruction);
            }
            Opcode::JumpIfTrue | Opcode::JumpIfFalse => {
                let value = match context.stack.last().cloned() {
                    Some(value) => value,
                    None => host.undefined(),
                };
                let condition = host.to_boolean(&value);
                if host.is_exception(&condition) {
                    context.stack.push(condition);
                    context.pc = program.len();
                    return;
                }
                let taken = host.boolean_value(&condition);
                let wanted = instruction.opcode == Opcode::JumpIfTrue;
                if taken == wanted {
                    context.pc = address(&instruction);
                }
            }
            Opcode::JumpIfNull | Opcode::JumpIfNotNull => {
                let value = match context.stack.last().cloned() {
                    Some(value) => value,
                    None => host.undefined(),
                };
                let null_ish = host.is_null(&value);
                let wanted = instruction.opcode == Opcode::JumpIfNull;
                if null_ish == wanted {
                    context.pc = address(&instruction);
                }
            }
            Opcode::UnaryPlus => self.run_unary(host, program, context, H::unary_plus),
            Opcode::UnaryNeg => self.run_unary(host, program, context, H::unary_neg),
            Opcode::Add => self.run_binary(host, program, context, H::add),
            Opcode::Sub => self.run_binary(host, program, context, H::sub),
            Opcode::Div => self.run_binary(host, program, context, H::div),
            Opcode::Mul => self.run_binary(host, program, context, H::mul),
            Opcode::Mod => self.run_binary(host, program, context, H::rem),
            Opcode::Pow => self.run_binary(host, program, context, H::pow),
            Opcode::And => self.run_binary(host, program, context, H::bit_and),
            Opcode::Or => self.run_binary(host, program, context, H::bit_or),
            Opcode::Xor => self.run_binary(host, program, context, H::bit_xor),
            Opcode::Not => self.run_unary(host, program, context, H::bit_not),
            Opcode::Shl => self.run_binary(host, program, context, H::shl),
            Opcode::Shr => self.run_binary(host, program, context, H::shr),
            Opcode::LogicalNot => {
                let value = self.pop(host, context);
                let condition = host.to_boolean(&value);
                if host.is_exception(&condition) {
                    context.stack.push(condition);
                    context.pc = program.len();
                    return;
                }
                let result = host.boolean(!host.boolean_value(&condition));
                context.stack.push(result);
            }
            Opcode::Eq => self.run_binary(host, program, context, H::equal),
            Opcode::StrictEq => {
                let right = self.pop(host, context);
                let left = self.pop(host, context);
                if host.same_kind(&left, &right) {
                    let result = host.equal(left, right);
                    self.push_checked(host, program, context, result);
                } else {
                    let result = host.boolean(false);
                    context.stack.push(result);
                }
            }
            Opcode::Ne => {
                let right = self.pop(host, context);
                let left = self.pop(host, context);
                let equal = host.equal(left, right);
                if host.is_exception(&equal) {
                    context.stack.push(equal);
                    context.pc = program.len();
                    return;
                }
                let result = host.boolean(!host.boolean_value(&equal));
                context.stack.push(result);
            }
            Opcode::StrictNe => {
                let right = self.pop(host, context);
                let left = self.pop(host, context);
                if !host.same_kind(&left, &right) {
                    let result = host.boolean(true);
                    context.stack.push(result);
                } else {
                    let equal = host.equal(left, right);
                    if host.is_exception(&equal) {
                        context.stack.push(equal);
                        context.pc = program.len();
                        return;
                    }
                    let result = host.boolean(!host.boolean_value(&equal));
                    context.stack.push(result);
                }
            }
            Opcode::Gt => self.run_binary(host, program, context, H::greater),
            Opcode::Lt => self.run_binary(host, program, context, H::less),
            Opcode::Ge => self.run_binary(host, program, context, H::greater_equal),
            Opcode::Le => self.run_binary(host, program, context, H::less_equal),
            Opcode::Inc => self.run_unary(host, program, context, H::inc),
            Opcode::Dec => self.run_unary(host, program, context, H::dec),
            Opcode::UpdateInc | Opcode::UpdateDec => {
                let value = self.pop(host, context);
                let saved = host.copy(&value);
                let updated = if instruction.opcode == Opcode::UpdateInc {
                    host.inc(value)
                } else {
                    host.dec(value)
                };
                if host.is_exception(&updated) {
                    context.stack.push(updated);
                    context.pc = program.len();
                    return;
                }
                context.stack.push(saved);
            }
            Opcode::Next => self.run_next(host, program, context),
            Opcode::Iterator => self.run_iterator(host, program, context),
            Opcode::ArraySpread => self.run_array_spread(host, program, context),
            Opcode::EmptyCheck => {
                if context.stack.is_empty() {
                    let value = host.undefined();
                    context.stack.push(value);
                }
            }
            Opcode::Halt => {
                if context.stack.is_empty() {
                    let value = host.undefined();
                    context.stack.push(value);
                }
                context.pc = program.len();
            }
            Opcode::TryBegin => {
                context.try_frames.push(TryFrame {
                    scope_depth: host.scope_depth(),
                    on_finish: None,
                    on_error: None,
                });
            }
            Opcode::TryEnd => {
                let frame = context.try_frames.pop().expect("try frame underflow");
                if let Some(finalizer) = frame.on_finish {
                    context.defer.push(context.pc);
                    context.pc = finalizer;
                }
            }
            Opcode::OnFinish => {
                let frame = context.try_frames.last_mut().expect("open try region");
                frame.on_finish = Some(address(&instruction));
            }
            Opcode::OnError => {
                let frame = context.try_frames.last_mut().expect("open try region");
                frame.on_error = Some(address(&instruction));
            }
            Opcode::Defer => {
                let value = match context.result.take() {
                    Some(value) => value,
                    None => host.undefined(),
                };
                context.stack.push(value);
                match context.defer.pop() {
                    Some(target) => context.pc = target,
                    None => context.pc = program.len(),
                }
            }
            Opcode::BreakLabelBegin | Opcode::ContinueLabelBegin => {
                let kind = if instruction.opcode == Opcode::BreakLabelBegin {
                    LabelKind::Break
                } else {
                    LabelKind::Continue
                };
                context.labels.push(LabelFrame {
                    kind,
                    label: constant(program, &instruction).to_string(),
                    address: 0,
                    scope_depth: host.scope_depth(),
                    try_depth: context.try_frames.len(),
                });
            }
            Opcode::SetLabelAddress => {
                let frame = context.labels.last_mut().expect("open label frame");
                frame.address = address(&instruction);
            }
            Opcode::LabelEnd => {
                context.labels.pop();
            }
            Opcode::Break => {
                let name = constant(program, &instruction).to_string();
                self.run_jump_to_label(host, program, context, LabelKind::Break, &name);
            }
            Opcode::Continue => {
                let name = constant(program, &instruction).to_string();
                self.run_jump_to_label(host, program, context, LabelKind::Continue, &name);
            }
            // The remaining surface is intentionally unimplemented; force
            // the counter to the end of the stream rather than no-op.
            Opcode::Regex
            | Opcode::Class
            | Opcode::SuperCall
            | Opcode::Arrow
            | Opcode::AsyncArrow
            | Opcode::AsyncFunction
            | Opcode::AsyncGenerator
            | Opcode::SetPropField
            | Opcode::SetPropMethod
            | Opcode::SetPropAccessorGetter
            | Opcode::SetPropAccessorSetter
            | Opcode::GetPrivateField
            | Opcode::SetPrivateField
            | Opcode::SetPrivateAccessorGetter
            | Opcode::SetPrivateAccessorSetter
            | Opcode::SetPrivateMethod
            | Opcode::SetPrivatePropField
            | Opcode::SetPrivatePropAccessorGetter
            | Opcode::SetPrivatePropAccessorSetter
            | Opcode::SetPrivatePropMethod
            | Opcode::GetKeys
            | Opcode::SetSuperField
            | Opcode::GetSuperField
            | Opcode::SetInitializer
            | Opcode::SetPrivateInitializer
            | Opcode::PrivateMemberCall
            | Opcode::Delete
            | Opcode::Await
            | Opcode::YieldDelegate
            | Opcode::AwaitNext
            | Opcode::Spread
            | Opcode::Merge
            | Opcode::ObjectSpread
            | Opcode::ArgumentSpread
            | Opcode::Ushr
            | Opcode::Debugger
            | Opcode::With
            | Opcode::Import
            | Opcode::Export
            | Opcode::ExportAll
            | Opcode::Assert => {
                context.pc = program.len();
            }
        }
    }

    fn pop<H: Host>(&self, host: &mut H, context: &mut EvalContext<H::Value>) -> H::Value {
        match context.stack.pop() {
            Some(value) => value,
            None => host.undefined(),
        }
    }

    fn push_checked<H: Host>(
        &self,
        host: &H,
        program: &Program,
        context: &mut EvalContext<H::Value>,
        value: H::Value,
    ) {
        if host.is_exception(&value) {
            context.pc = program.len();
        }
        context.stack.push(value);
    }

    fn run_unary<H: Host>(
        &self,
        host: &mut H,
        program: &Program,
        context: &mut EvalContext<H::Value>,
        operation: fn(&mut H, H::Value) -> H::Value,
    ) {
        let value = self.pop(host, context);
        let result = operation(host, value);
        self.push_checked(host, program, context, result);
    }

    fn run_binary<H: Host>(
        &self,
        host: &mut H,
        program: &Program,
        context: &mut EvalContext<H::Value>,
        operation: fn(&mut H, H::Value, H::Value) -> H::Value,
    ) {
        let right = self.pop(host, context);
        let left = self.pop(host, context);
        let result = operation(host, left, right);
        self.push_checked(host, program, context, result);
    }

    fn run_load<H: Host>(
        &self,
        host: &mut H,
        program: &Program,
        context: &mut EvalContext<H::Value>,
        instruction: &Instruction,
    ) {
        let name = constant(program, instruction);
        let value = match name {
            "NaN" => host.number(f64::NAN),
            "Infinity" => host.number(f64::INFINITY),
            _ => host.lookup(name),
        };
        self.push_checked(host, program, context, value);
    }

    fn run_store<H: Host>(
        &self,
        host: &mut H,
        program: &Program,
        context: &mut EvalContext<H::Value>,
        instruction: &Instruction,
    ) {
        let name = constant(program, instruction);
        let value = match context.stack.last().cloned() {
            Some(value) => value,
            None => host.undefined(),
        };
        let result = host.assign(name, value);
        if host.is_exception(&result) {
            context.stack.push(result);
            context.pc = program.len();
        }
    }

    fn diagnostic_frame(name: Option<String>, site: Option<&FrameSite>) -> StackFrame {
        StackFrame {
            function_name: name,
            filename: site.map(|site| site.filename.clone()),
            line: site.map(|site| site.position.line).unwrap_or(0),
            column: site.map(|site| site.position.column).unwrap_or(0),
        }
    }

    fn invoke<H: Host>(
        &self,
        host: &mut H,
        callee: H::Value,
        this: H::Value,
        arguments: Vec<H::Value>,
        name: Option<String>,
        site: Option<&FrameSite>,
    ) -> H::Value {
        host.push_call_frame(Self::diagnostic_frame(name, site));
        let result = host.call(callee, this, arguments);
        host.pop_call_frame();
        result
    }

    fn pop_arguments<H: Host>(
        &self,
        host: &mut H,
        context: &mut EvalContext<H::Value>,
    ) -> Vec<H::Value> {
        let count_value = self.pop(host, context);
        let count = host.number_value(&count_value) as usize;
        let mut arguments = Vec::with_capacity(count);
        for _ in 0..count {
            let argument = self.pop(host, context);
            arguments.push(argument);
        }
        arguments
    }

    fn run_call<H: Host>(
        &self,
        host: &mut H,
        program: &Program,
        context: &mut EvalContext<H::Value>,
    ) {
        let site = program.frames.get(&(context.pc - 1));
        let arguments = self.pop_arguments(host, context);
        let callee = self.pop(host, context);
        let name = host.function_name(&callee);
        let this = host.undefined();
        let result = self.invoke(host, callee, this, arguments, name, site);
        self.push_checked(host, program, context, result);
    }

    fn run_member_call<H: Host>(
        &self,
        host: &mut H,
        program: &Program,
        context: &mut EvalContext<H::Value>,
    ) {
        let site = program.frames.get(&(context.pc - 1));
        let arguments = self.pop_arguments(host, context);
        let field = self.pop(host, context);
        let object = self.pop(host, context);
        let callee = host.get_field(object.clone(), field);
        if host.is_exception(&callee) {
            context.stack.push(callee);
            context.pc = program.len();
            return;
        }
        let name = host.function_name(&callee);
        let result = self.invoke(host, callee, object, arguments, name, site);
        self.push_checked(host, program, context, result);
    }

    fn run_new<H: Host>(
        &self,
        host: &mut H,
        program: &Program,
        context: &mut EvalContext<H::Value>,
        instruction: &Instruction,
    ) {
        let site = program.frames.get(&(context.pc - 1)).cloned();
        let count = index(instruction) as usize;
        let mut arguments = Vec::with_capacity(count);
        for _ in 0..count {
            let argument = self.pop(host, context);
            arguments.push(argument);
        }
        let callee = self.pop(host, context);
        let name = host.function_name(&callee);
        host.push_call_frame(Self::diagnostic_frame(name, site.as_ref()));
        let result = host.construct(callee, arguments);
        host.pop_call_frame();
        self.push_checked(host, program, context, result);
    }

    fn run_next<H: Host>(
        &self,
        host: &mut H,
        program: &Program,
        context: &mut EvalContext<H::Value>,
    ) {
        let iterator = self.pop(host, context);
        let next_key = host.string("next");
        let next = host.get_field(iterator.clone(), next_key);
        if host.is_exception(&next) {
            context.stack.push(next);
            context.pc = program.len();
            return;
        }
        if !host.is_callable(&next) {
            let exception = host.exception(ErrorKind::TypeError, "variable is not iterable");
            context.stack.push(exception);
            context.pc = program.len();
            return;
        }
        let result = self.invoke(
            host,
            next,
            iterator,
            vec![],
            Some("next".to_string()),
            None,
        );
        if host.is_exception(&result) {
            context.stack.push(result);
            context.pc = program.len();
            return;
        }
        let value_key = host.string("value");
        let value = host.get_field(result.clone(), value_key);
        if host.is_exception(&value) {
            context.stack.push(value);
            context.pc = program.len();
            return;
        }
        let done_key = host.string("done");
        let done_raw = host.get_field(result, done_key);
        let done = host.to_boolean(&done_raw);
        if host.is_exception(&done) {
            context.stack.push(done);
            context.pc = program.len();
            return;
        }
        if host.boolean_value(&done) {
            let undefined = host.undefined();
            context.stack.push(undefined);
        } else {
            context.stack.push(value);
        }
        context.stack.push(done);
    }

    fn run_iterator<H: Host>(
        &self,
        host: &mut H,
        program: &Program,
        context: &mut EvalContext<H::Value>,
    ) {
        let value = self.pop(host, context);
        let key = host.iterator_key();
        let factory = host.get_field(value.clone(), key);
        if host.is_exception(&factory) {
            context.stack.push(factory);
            context.pc = program.len();
            return;
        }
        if !host.is_callable(&factory) {
            let exception = host.exception(ErrorKind::TypeError, "variable is not iterable");
            context.stack.push(exception);
            context.pc = program.len();
            return;
        }
        let name = host.function_name(&factory);
        let iterator = self.invoke(host, factory, value, vec![], name, None);
        self.push_checked(host, program, context, iterator);
    }

    fn run_array_spread<H: Host>(
        &self,
        host: &mut H,
        program: &Program,
        context: &mut EvalContext<H::Value>,
    ) {
        let iterator = self.pop(host, context);
        let array = host.array();
        let mut position = 0.0;
        loop {
            let next_key = host.string("next");
            let next = host.get_field(iterator.clone(), next_key);
            if host.is_exception(&next) {
                context.stack.push(next);
                context.pc = program.len();
                return;
            }
            let result = self.invoke(
                host,
                next,
                iterator.clone(),
                vec![],
                Some("next".to_string()),
                None,
            );
            if host.is_exception(&result) {
                context.stack.push(result);
                context.pc = program.len();
                return;
            }
            let done_key = host.string("done");
            let done_raw = host.get_field(result.clone(), done_key);
            let done = host.to_boolean(&done_raw);
            if host.boolean_value(&done) {
                break;
            }
            let value_key = host.string("value");
            let value = host.get_field(result, value_key);
            let slot = host.number(position);
            host.set_field(array.clone(), slot, value);
            position += 1.0;
        }
        context.stack.push(array);
    }

    /// Jump to the innermost matching label frame: unwind scopes and try
    /// regions opened inside it, scheduling pending finalizers through the
    /// defer stack, then transfer to the frame's patched address. A break
    /// pops its frame; a continue keeps it for the next iteration.
    fn run_jump_to_label<H: Host>(
        &self,
        host: &mut H,
        program: &Program,
        context: &mut EvalContext<H::Value>,
        kind: LabelKind,
        name: &str,
    ) {
        let position = context
            .labels
            .iter()
            .rposition(|frame| frame.kind == kind && (name.is_empty() || frame.label == name));
        let Some(position) = position else {
            let exception = host.exception(ErrorKind::SyntaxError, "Invalid label");
            context.stack.push(exception);
            context.pc = program.len();
            return;
        };
        let frame = context.labels[position].clone();
        let mut finalizers = Vec::new();
        while context.try_frames.len() > frame.try_depth {
            let region = context.try_frames.pop().expect("try frame");
            if let Some(address) = region.on_finish {
                finalizers.push(address);
            }
        }
        while host.scope_depth() > frame.scope_depth {
            host.pop_scope();
            if let Some(top) = context.frames.pop() {
                context.stack.truncate(top);
            }
        }
        let keep = if kind == LabelKind::Break {
            position
        } else {
            position + 1
        };
        context.labels.truncate(keep);
        if finalizers.is_empty() {
            context.pc = frame.address;
        } else {
            context.defer.push(frame.address);
            for address in finalizers[1..].iter().rev() {
                context.defer.push(*address);
            }
            context.pc = finalizers[0];
        }
    }
}

fn constant<'p>(program: &'p Program, instruction: &Instruction) -> &'p str {
    match instruction.operand {
        Operand::Constant(index) => &program.constants[index as usize],
        _ => "",
    }
}

fn address(instruction: &Instruction) -> usize {
    match instruction.operand {
        Operand::Address(address) => address,
        _ => 0,
    }
}

fn index(instruction: &Instruction) -> u32 {
    match instruction.operand {
        Operand::Index(index) => index,
        _ => 0,
    }
}

fn number(instruction: &Instruction) -> f64 {
    match instruction.operand {
        Operand::Number(value) => value,
        _ => 0.0,
    }
}
