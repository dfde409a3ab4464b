//! Tree-to-bytecode code generator.
//!
//! Lowers a closure-resolved tree into a [`Program`] by structural
//! recursion. Every emitted construct leaves exactly the values its
//! surrounding context expects on the operand stack. Forward jumps reserve
//! an address operand at emission time and are patched once the target
//! index is known; no unresolved backpatch escapes a completed construct.

use crate::ast::{AccessorKind, NodeId, NodeKind};
use crate::parser::Ast;
use bytecode_system::{Instruction, Opcode, Operand, Program};
use core_types::{ErrorKind, ScriptError, SourceSpan};
use crate::scope::DeclarationKind;

type GenResult = Result<(), ScriptError>;

struct LabelFrame {
    label: String,
    patch: usize,
}

/// The bytecode generator.
///
/// One generator lowers one tree; label frames and the pending statement
/// label are per-compilation state.
pub struct CodeGenerator {
    breaks: Vec<LabelFrame>,
    continues: Vec<LabelFrame>,
    label: String,
    lex_context: Option<NodeId>,
}

impl CodeGenerator {
    /// Create a generator.
    pub fn new() -> Self {
        Self {
            breaks: Vec::new(),
            continues: Vec::new(),
            label: String::new(),
            lex_context: None,
        }
    }

    /// Lower the tree into `program`.
    ///
    /// Returns a static semantic error (invalid assignment target, misuse
    /// of `super`/`yield`/`await`, rest-element-not-last, malformed loop
    /// heads) when the structurally valid tree cannot be compiled.
    pub fn resolve(&mut self, source: &str, ast: &Ast, program: &mut Program) -> GenResult {
        self.resolve_with_scope(source, ast, ast.root, program)
    }

    // ---- emission helpers ---------------------------------------------------

    fn emit(&mut self, program: &mut Program, opcode: Opcode) -> usize {
        program.emit(Instruction::plain(opcode))
    }

    fn emit_const(&mut self, program: &mut Program, opcode: Opcode, text: &str) -> usize {
        let index = program.resolve_constant(text);
        program.emit(Instruction::with_operand(opcode, Operand::Constant(index)))
    }

    fn emit_index(&mut self, program: &mut Program, opcode: Opcode, value: u32) -> usize {
        program.emit(Instruction::with_operand(opcode, Operand::Index(value)))
    }

    fn emit_number(&mut self, program: &mut Program, value: f64) -> usize {
        program.emit(Instruction::with_operand(
            Opcode::Push,
            Operand::Number(value),
        ))
    }

    fn emit_address(&mut self, program: &mut Program, opcode: Opcode) -> usize {
        program.emit(Instruction::with_operand(opcode, Operand::Address(0)))
    }

    fn emit_address_to(
        &mut self,
        program: &mut Program,
        opcode: Opcode,
        target: usize,
    ) -> usize {
        program.emit(Instruction::with_operand(opcode, Operand::Address(target)))
    }

    fn error(&self, message: impl Into<String>, span: SourceSpan) -> ScriptError {
        ScriptError::new(ErrorKind::SyntaxError, message).with_span(span)
    }

    fn unwrap(&self, ast: &Ast, node: NodeId) -> NodeId {
        let mut current = node;
        while let NodeKind::GroupExpression { expression } = ast.node(current).kind {
            current = expression;
        }
        current
    }

    fn text<'a>(&self, source: &'a str, ast: &Ast, node: NodeId) -> &'a str {
        ast.node(node).span.slice(source)
    }

    fn is_function_base(&self, ast: &Ast, node: NodeId) -> bool {
        matches!(
            ast.node(node).kind,
            NodeKind::Function { .. }
                | NodeKind::ArrowFunction { .. }
                | NodeKind::ObjectMethod { .. }
                | NodeKind::ObjectAccessor { .. }
                | NodeKind::ClassMethod { .. }
                | NodeKind::ClassAccessor { .. }
                | NodeKind::StaticBlock { .. }
        )
    }

    // ---- label frames -------------------------------------------------------

    fn push_break_frame(&mut self, program: &mut Program) -> String {
        let label = std::mem::take(&mut self.label);
        self.emit_const(program, Opcode::BreakLabelBegin, &label.clone());
        let patch = self.emit_address(program, Opcode::SetLabelAddress);
        self.breaks.push(LabelFrame {
            label: label.clone(),
            patch,
        });
        label
    }

    fn push_continue_frame(&mut self, program: &mut Program, label: &str) {
        self.emit_const(program, Opcode::ContinueLabelBegin, label);
        let patch = self.emit_address(program, Opcode::SetLabelAddress);
        self.continues.push(LabelFrame {
            label: label.to_string(),
            patch,
        });
    }

    fn pop_continue_frame(&mut self, program: &mut Program, target: usize) {
        let frame = self.continues.pop().expect("continue frame underflow");
        program.patch_address(frame.patch, target);
        self.emit(program, Opcode::LabelEnd);
    }

    /// Close the break frame: the patched target is the first instruction
    /// after the end-of-label marker.
    fn pop_break_frame(&mut self, program: &mut Program, label: String) {
        let frame = self.breaks.pop().expect("break frame underflow");
        self.emit(program, Opcode::LabelEnd);
        program.patch_address(frame.patch, program.len());
        self.label = label;
    }

    // ---- scope bracketing ---------------------------------------------------

    fn resolve_with_scope(
        &mut self,
        source: &str,
        ast: &Ast,
        node: NodeId,
        program: &mut Program,
    ) -> GenResult {
        let bracket = ast.node(node).scope.is_some()
            && !self.is_function_base(ast, node)
            && !matches!(
                ast.node(node).kind,
                NodeKind::Class { .. }
                    | NodeKind::ForInStatement { .. }
                    | NodeKind::ForOfStatement { .. }
                    | NodeKind::ForAwaitOfStatement { .. }
            );
        if !bracket {
            return self.resolve_node(source, ast, node, program);
        }
        let hoisted = self.begin_scope(source, ast, node, program)?;
        self.resolve_node(source, ast, node, program)?;
        self.end_scope(source, ast, program, hoisted)
    }

    /// Enter a lexical scope: declare its bindings, then declare-and-bind
    /// every hoisted function. Function bodies are emitted by
    /// [`Self::end_scope`] behind a skip jump; the entry address operands
    /// reserved here are returned for patching.
    fn begin_scope(
        &mut self,
        source: &str,
        ast: &Ast,
        node: NodeId,
        program: &mut Program,
    ) -> Result<Vec<(NodeId, usize)>, ScriptError> {
        self.emit(program, Opcode::Begin);
        let scope = ast.node(node).scope.expect("scope missing");
        let declarations = ast.scopes.scope(scope).declarations.clone();
        let mut functions = Vec::new();
        for declaration in &declarations {
            match declaration.kind {
                DeclarationKind::Var => {
                    self.emit_const(program, Opcode::Var, &declaration.name);
                }
                DeclarationKind::Const => {
                    self.emit_const(program, Opcode::Const, &declaration.name);
                }
                DeclarationKind::Let => {
                    self.emit_const(program, Opcode::Let, &declaration.name);
                }
                DeclarationKind::Function => {
                    self.emit_const(program, Opcode::Var, &declaration.name);
                    functions.push(declaration.clone());
                }
            }
        }
        let mut hoisted = Vec::new();
        for declaration in functions {
            let opcode = self.function_opcode(ast, declaration.node);
            let patch = self.emit_address(program, opcode);
            hoisted.push((declaration.node, patch));
            self.emit_const(program, Opcode::SetFunctionName, &declaration.name);
            if let Some(closure) = ast.node(declaration.node).kind.closure() {
                for name in closure {
                    self.emit_const(program, Opcode::Ref, name);
                }
            }
            self.emit_const(program, Opcode::Store, &declaration.name);
            self.emit(program, Opcode::Pop);
        }
        let _ = source;
        Ok(hoisted)
    }

    fn end_scope(
        &mut self,
        source: &str,
        ast: &Ast,
        program: &mut Program,
        hoisted: Vec<(NodeId, usize)>,
    ) -> GenResult {
        if !hoisted.is_empty() {
            let skip = self.emit_address(program, Opcode::Jump);
            for (function, patch) in hoisted {
                program.patch_address(patch, program.len());
                self.resolve_function_declaration(source, ast, function, program)?;
            }
            program.patch_address(skip, program.len());
        }
        self.emit(program, Opcode::End);
        Ok(())
    }

    fn function_opcode(&self, ast: &Ast, node: NodeId) -> Opcode {
        let (is_async, is_generator, is_arrow) = match &ast.node(node).kind {
            NodeKind::Function {
                is_async,
                is_generator,
                ..
            } => (*is_async, *is_generator, false),
            NodeKind::ObjectMethod {
                is_async,
                is_generator,
                ..
            } => (*is_async, *is_generator, false),
            NodeKind::ClassMethod {
                is_async,
                is_generator,
                ..
            } => (*is_async, *is_generator, false),
            NodeKind::ArrowFunction { is_async, .. } => (*is_async, false, true),
            _ => (false, false, false),
        };
        match (is_arrow, is_async, is_generator) {
            (true, true, _) => Opcode::AsyncArrow,
            (true, false, _) => Opcode::Arrow,
            (false, true, true) => Opcode::AsyncGenerator,
            (false, true, false) => Opcode::AsyncFunction,
            (false, false, true) => Opcode::Generator,
            (false, false, false) => Opcode::Function,
        }
    }

    /// Emit a function body in place: its own scope, argument binding with
    /// defaults and rest collection, then the body.
    fn resolve_function_declaration(
        &mut self,
        source: &str,
        ast: &Ast,
        node: NodeId,
        program: &mut Program,
    ) -> GenResult {
        let saved_context = self.lex_context;
        self.lex_context = Some(node);
        let hoisted = self.begin_scope(source, ast, node, program)?;
        let (arguments, body) = match &ast.node(node).kind {
            NodeKind::Function {
                arguments, body, ..
            }
            | NodeKind::ArrowFunction {
                arguments, body, ..
            }
            | NodeKind::ObjectMethod {
                arguments, body, ..
            }
            | NodeKind::ObjectAccessor {
                arguments, body, ..
            }
            | NodeKind::ClassMethod {
                arguments, body, ..
            }
            | NodeKind::ClassAccessor {
                arguments, body, ..
            } => (arguments.clone(), *body),
            other => {
                return Err(self.error(
                    format!("not a callable construct: {}", other.name()),
                    ast.node(node).span,
                ))
            }
        };
        for argument in arguments {
            let NodeKind::FunctionArgument { identifier, value } = ast.node(argument).kind else {
                continue;
            };
            if matches!(
                ast.node(identifier).kind,
                NodeKind::SpreadPatternItem { .. }
            ) {
                let NodeKind::SpreadPatternItem { value: target } = ast.node(identifier).kind
                else {
                    unreachable!()
                };
                self.emit(program, Opcode::ArgumentSpread);
                self.resolve_store(source, ast, target, program)?;
                self.emit(program, Opcode::Pop);
            } else {
                self.emit(program, Opcode::EmptyCheck);
                if let Some(default) = value {
                    let patch = self.emit_address(program, Opcode::JumpIfNotNull);
                    self.emit(program, Opcode::Pop);
                    self.resolve_with_scope(source, ast, default, program)?;
                    program.patch_address(patch, program.len());
                }
                self.resolve_store(source, ast, identifier, program)?;
                self.emit(program, Opcode::Pop);
            }
        }
        self.resolve_with_scope(source, ast, body, program)?;
        if !matches!(ast.node(body).kind, NodeKind::FunctionBody { .. }) {
            self.emit(program, Opcode::Ret);
        }
        self.end_scope(source, ast, program, hoisted)?;
        self.lex_context = saved_context;
        Ok(())
    }

    /// Emit a function value: opcode with a backpatched entry address,
    /// display name, closure references, and the body behind a skip jump.
    fn resolve_function_value(
        &mut self,
        source: &str,
        ast: &Ast,
        node: NodeId,
        name: Option<&str>,
        program: &mut Program,
    ) -> GenResult {
        let opcode = self.function_opcode(ast, node);
        let entry = self.emit_address(program, opcode);
        if let Some(name) = name {
            self.emit_const(program, Opcode::SetFunctionName, name);
        }
        if let Some(closure) = ast.node(node).kind.closure() {
            for captured in closure.clone() {
                self.emit_const(program, Opcode::Ref, &captured);
            }
        }
        let skip = self.emit_address(program, Opcode::Jump);
        program.patch_address(entry, program.len());
        self.resolve_function_declaration(source, ast, node, program)?;
        program.patch_address(skip, program.len());
        Ok(())
    }
}

// Statement lowering.
impl CodeGenerator {
    fn resolve_node(
        &mut self,
        source: &str,
        ast: &Ast,
        node: NodeId,
        program: &mut Program,
    ) -> GenResult {
        match &ast.node(node).kind {
            NodeKind::RegexLiteral => {
                let text = self.text(source, ast, node).to_string();
                self.emit_const(program, Opcode::Regex, &text);
                Ok(())
            }
            NodeKind::NullLiteral => {
                self.emit(program, Opcode::Nil);
                Ok(())
            }
            NodeKind::UndefinedLiteral => {
                self.emit(program, Opcode::Undefined);
                Ok(())
            }
            NodeKind::BooleanLiteral => {
                if self.text(source, ast, node) == "true" {
                    self.emit(program, Opcode::True);
                } else {
                    self.emit(program, Opcode::False);
                }
                Ok(())
            }
            NodeKind::StringLiteral => {
                let text = self.text(source, ast, node);
                let body = text[1..text.len() - 1].to_string();
                self.emit_const(program, Opcode::Str, &body);
                Ok(())
            }
            NodeKind::NumberLiteral => {
                let value = self.number_value(source, ast, node)?;
                self.emit_number(program, value);
                Ok(())
            }
            NodeKind::BigintLiteral => {
                let text = self.text(source, ast, node);
                let digits = text[..text.len() - 1].to_string();
                self.emit_const(program, Opcode::Bigint, &digits);
                Ok(())
            }
            NodeKind::Identifier => {
                let text = self.text(source, ast, node).to_string();
                self.emit_const(program, Opcode::Load, &text);
                Ok(())
            }
            NodeKind::ThisLiteral => {
                self.emit(program, Opcode::This);
                Ok(())
            }
            NodeKind::TemplateLiteral { .. } => {
                self.resolve_template_literal(source, ast, node, program)
            }
            NodeKind::Program { .. } => self.resolve_program(source, ast, node, program),
            NodeKind::BlockStatement { .. } => {
                self.resolve_block_statement(source, ast, node, program)
            }
            NodeKind::EmptyStatement | NodeKind::Directive | NodeKind::InterpreterDirective => {
                Ok(())
            }
            NodeKind::DebuggerStatement => {
                self.emit(program, Opcode::Debugger);
                Ok(())
            }
            NodeKind::ReturnStatement { value } => {
                match *value {
                    Some(value) => self.resolve_with_scope(source, ast, value, program)?,
                    None => {
                        self.emit(program, Opcode::Undefined);
                    }
                }
                self.emit(program, Opcode::Ret);
                Ok(())
            }
            NodeKind::LabelStatement { label, statement } => {
                let name = self.text(source, ast, *label).to_string();
                let saved = std::mem::replace(&mut self.label, name);
                self.resolve_with_scope(source, ast, *statement, program)?;
                self.label = saved;
                Ok(())
            }
            NodeKind::BreakStatement { label } => {
                let name = label
                    .map(|id| self.text(source, ast, id).to_string())
                    .unwrap_or_default();
                self.emit_const(program, Opcode::Break, &name);
                Ok(())
            }
            NodeKind::ContinueStatement { label } => {
                let name = label
                    .map(|id| self.text(source, ast, id).to_string())
                    .unwrap_or_default();
                self.emit_const(program, Opcode::Continue, &name);
                Ok(())
            }
            NodeKind::IfStatement { .. } => self.resolve_if_statement(source, ast, node, program),
            NodeKind::SwitchStatement { .. } => {
                self.resolve_switch_statement(source, ast, node, program)
            }
            NodeKind::SwitchCase { .. } => Ok(()),
            NodeKind::ThrowStatement { value } => {
                self.resolve_with_scope(source, ast, *value, program)?;
                self.emit(program, Opcode::Throw);
                Ok(())
            }
            NodeKind::TryStatement { .. } => {
                self.resolve_try_statement(source, ast, node, program)
            }
            NodeKind::TryCatchStatement { .. } => {
                self.resolve_try_catch_statement(source, ast, node, program)
            }
            NodeKind::WhileStatement { .. } => {
                self.resolve_while_statement(source, ast, node, program)
            }
            NodeKind::DoWhileStatement { .. } => {
                self.resolve_do_while_statement(source, ast, node, program)
            }
            NodeKind::ForStatement { .. } => {
                self.resolve_for_statement(source, ast, node, program)
            }
            NodeKind::ForInStatement { .. }
            | NodeKind::ForOfStatement { .. }
            | NodeKind::ForAwaitOfStatement { .. } => {
                self.resolve_for_iteration(source, ast, node, program)
            }
            NodeKind::ExpressionStatement { expression } => {
                self.resolve_with_scope(source, ast, *expression, program)
            }
            NodeKind::VariableDeclaration { declarations, .. } => {
                for declarator in declarations.clone() {
                    let NodeKind::VariableDeclarator {
                        identifier,
                        initializer,
                    } = ast.node(declarator).kind
                    else {
                        continue;
                    };
                    match initializer {
                        Some(initializer) => {
                            self.resolve_with_scope(source, ast, initializer, program)?
                        }
                        None => {
                            self.emit(program, Opcode::Undefined);
                        }
                    }
                    self.resolve_store(source, ast, identifier, program)?;
                    self.emit(program, Opcode::Pop);
                }
                Ok(())
            }
            NodeKind::Decorator { .. } => Ok(()),
            NodeKind::BinaryExpression { .. } => {
                self.resolve_binary_expression(source, ast, node, program)
            }
            NodeKind::MemberExpression { .. }
            | NodeKind::OptionalMemberExpression { .. }
            | NodeKind::ComputedMemberExpression { .. }
            | NodeKind::OptionalComputedMemberExpression { .. }
            | NodeKind::CallExpression { .. }
            | NodeKind::OptionalCallExpression { .. } => {
                let mut addresses = Vec::new();
                self.resolve_member_chain(source, ast, node, program, &mut addresses)?;
                for address in addresses {
                    program.patch_address(address, program.len());
                }
                Ok(())
            }
            NodeKind::ConditionExpression {
                condition,
                consequent,
                alternate,
            } => {
                let (condition, consequent, alternate) = (*condition, *consequent, *alternate);
                self.resolve_with_scope(source, ast, condition, program)?;
                let alternate_patch = self.emit_address(program, Opcode::JumpIfFalse);
                self.emit(program, Opcode::Pop);
                self.resolve_with_scope(source, ast, consequent, program)?;
                let end_patch = self.emit_address(program, Opcode::Jump);
                program.patch_address(alternate_patch, program.len());
                self.emit(program, Opcode::Pop);
                self.resolve_with_scope(source, ast, alternate, program)?;
                program.patch_address(end_patch, program.len());
                Ok(())
            }
            NodeKind::NewExpression { callee, arguments } => {
                let (callee, arguments) = (*callee, arguments.clone());
                self.resolve_with_scope(source, ast, callee, program)?;
                for argument in &arguments {
                    self.resolve_with_scope(source, ast, *argument, program)?;
                }
                let site = self.emit_index(program, Opcode::New, arguments.len() as u32);
                program.record_frame(site, ast.node(callee).span.end);
                Ok(())
            }
            NodeKind::DeleteExpression { value } => {
                self.resolve_with_scope(source, ast, *value, program)?;
                self.emit(program, Opcode::Delete);
                Ok(())
            }
            NodeKind::VoidExpression { value } => {
                self.resolve_with_scope(source, ast, *value, program)?;
                self.emit(program, Opcode::Void);
                Ok(())
            }
            NodeKind::TypeofExpression { value } => {
                self.resolve_with_scope(source, ast, *value, program)?;
                self.emit(program, Opcode::Typeof);
                Ok(())
            }
            NodeKind::YieldExpression { value } => {
                self.require_generator_context(ast, node)?;
                match *value {
                    Some(value) => self.resolve_with_scope(source, ast, value, program)?,
                    None => {
                        self.emit(program, Opcode::Undefined);
                    }
                }
                self.emit(program, Opcode::Yield);
                Ok(())
            }
            NodeKind::YieldDelegateExpression { value } => {
                self.require_generator_context(ast, node)?;
                self.resolve_with_scope(source, ast, *value, program)?;
                self.emit(program, Opcode::YieldDelegate);
                Ok(())
            }
            NodeKind::AwaitExpression { value } => {
                self.require_async_context(ast, node)?;
                self.resolve_with_scope(source, ast, *value, program)?;
                self.emit(program, Opcode::Await);
                Ok(())
            }
            NodeKind::GroupExpression { expression } => {
                self.resolve_with_scope(source, ast, *expression, program)
            }
            NodeKind::AssignmentExpression { .. } => {
                self.resolve_assignment_expression(source, ast, node, program)
            }
            NodeKind::ImportDeclaration { .. } => {
                self.resolve_import_declaration(source, ast, node, program)
            }
            NodeKind::ExportDeclaration { .. } => {
                self.resolve_export_declaration(source, ast, node, program)
            }
            NodeKind::ArrowFunction { .. } => {
                self.resolve_function_value(source, ast, node, None, program)
            }
            NodeKind::Function { identifier, .. } => {
                // Hoisting already bound declared functions to their name.
                match *identifier {
                    Some(identifier) => {
                        let name = self.text(source, ast, identifier).to_string();
                        self.emit_const(program, Opcode::Load, &name);
                        if let Some(closure) = ast.node(node).kind.closure() {
                            for captured in closure.clone() {
                                self.emit_const(program, Opcode::Ref, &captured);
                            }
                        }
                        Ok(())
                    }
                    None => self.resolve_function_value(source, ast, node, None, program),
                }
            }
            NodeKind::FunctionBody { .. } => {
                self.resolve_function_body(source, ast, node, program)
            }
            NodeKind::ObjectLiteral { .. } => {
                self.resolve_object_literal(source, ast, node, program)
            }
            NodeKind::ArrayLiteral { .. } => {
                self.resolve_array_literal(source, ast, node, program)
            }
            NodeKind::Class { .. } => self.resolve_class_declaration(source, ast, node, program),
            NodeKind::SuperLiteral => Err(self.error(
                "'super' keyword unexpected here",
                ast.node(node).span,
            )),
            _ => Ok(()),
        }
    }

    fn number_value(&self, source: &str, ast: &Ast, node: NodeId) -> Result<f64, ScriptError> {
        let text = self.text(source, ast, node);
        let parsed = if let Some(hex) = text.strip_prefix("0x").or_else(|| text.strip_prefix("0X"))
        {
            u64::from_str_radix(hex, 16).ok().map(|v| v as f64)
        } else if let Some(oct) = text.strip_prefix("0o").or_else(|| text.strip_prefix("0O")) {
            u64::from_str_radix(oct, 8).ok().map(|v| v as f64)
        } else if let Some(bin) = text.strip_prefix("0b").or_else(|| text.strip_prefix("0B")) {
            u64::from_str_radix(bin, 2).ok().map(|v| v as f64)
        } else {
            text.parse::<f64>().ok()
        };
        parsed.ok_or_else(|| self.error("Invalid number literal", ast.node(node).span))
    }

    fn context_flags(&self, ast: &Ast) -> (bool, bool) {
        match self.lex_context.map(|id| &ast.node(id).kind) {
            Some(NodeKind::Function {
                is_async,
                is_generator,
                ..
            }) => (*is_async, *is_generator),
            Some(NodeKind::ObjectMethod {
                is_async,
                is_generator,
                ..
            }) => (*is_async, *is_generator),
            Some(NodeKind::ClassMethod {
                is_async,
                is_generator,
                ..
            }) => (*is_async, *is_generator),
            Some(NodeKind::ArrowFunction { is_async, .. }) => (*is_async, false),
            _ => (false, false),
        }
    }

    fn require_generator_context(&self, ast: &Ast, node: NodeId) -> GenResult {
        let (_, is_generator) = self.context_flags(ast);
        if !is_generator {
            return Err(self.error(
                "yield expression must used in generator",
                ast.node(node).span,
            ));
        }
        Ok(())
    }

    fn require_async_context(&self, ast: &Ast, node: NodeId) -> GenResult {
        let (is_async, _) = self.context_flags(ast);
        if !is_async {
            return Err(self.error("await expression must used in async", ast.node(node).span));
        }
        Ok(())
    }

    fn resolve_program(
        &mut self,
        source: &str,
        ast: &Ast,
        node: NodeId,
        program: &mut Program,
    ) -> GenResult {
        let NodeKind::Program {
            directives,
            statements,
            ..
        } = ast.node(node).kind.clone()
        else {
            return Ok(());
        };
        for directive in directives {
            let text = self.text(source, ast, directive);
            let body = text[1..text.len() - 1].to_string();
            self.emit_const(program, Opcode::Enable, &body);
        }
        let saved_context = self.lex_context;
        self.lex_context = Some(node);
        for statement in statements {
            self.resolve_with_scope(source, ast, statement, program)?;
        }
        self.emit(program, Opcode::Halt);
        self.lex_context = saved_context;
        Ok(())
    }

    fn resolve_function_body(
        &mut self,
        source: &str,
        ast: &Ast,
        node: NodeId,
        program: &mut Program,
    ) -> GenResult {
        let NodeKind::FunctionBody {
            directives,
            statements,
        } = ast.node(node).kind.clone()
        else {
            return Ok(());
        };
        for directive in directives {
            let text = self.text(source, ast, directive);
            let body = text[1..text.len() - 1].to_string();
            self.emit_const(program, Opcode::Enable, &body);
        }
        for statement in statements {
            self.resolve_with_scope(source, ast, statement, program)?;
            if matches!(
                ast.node(self.unwrap(ast, statement)).kind,
                NodeKind::ExpressionStatement { .. }
            ) {
                self.emit(program, Opcode::Pop);
            }
        }
        self.emit(program, Opcode::Undefined);
        self.emit(program, Opcode::Ret);
        Ok(())
    }

    fn resolve_block_statement(
        &mut self,
        source: &str,
        ast: &Ast,
        node: NodeId,
        program: &mut Program,
    ) -> GenResult {
        let NodeKind::BlockStatement { statements } = ast.node(node).kind.clone() else {
            return Ok(());
        };
        let label = if self.label.is_empty() {
            None
        } else {
            Some(self.push_break_frame(program))
        };
        for statement in statements {
            self.resolve_with_scope(source, ast, statement, program)?;
        }
        if let Some(label) = label {
            self.pop_break_frame(program, label);
        }
        Ok(())
    }

    fn resolve_if_statement(
        &mut self,
        source: &str,
        ast: &Ast,
        node: NodeId,
        program: &mut Program,
    ) -> GenResult {
        let NodeKind::IfStatement {
            condition,
            consequent,
            alternate,
        } = ast.node(node).kind
        else {
            return Ok(());
        };
        let label = if self.label.is_empty() {
            None
        } else {
            Some(self.push_break_frame(program))
        };
        self.resolve_with_scope(source, ast, condition, program)?;
        let alternate_patch = self.emit_address(program, Opcode::JumpIfFalse);
        self.emit(program, Opcode::Pop);
        self.resolve_with_scope(source, ast, consequent, program)?;
        let end_patch = self.emit_address(program, Opcode::Jump);
        program.patch_address(alternate_patch, program.len());
        self.emit(program, Opcode::Pop);
        if let Some(alternate) = alternate {
            self.resolve_with_scope(source, ast, alternate, program)?;
        }
        program.patch_address(end_patch, program.len());
        if let Some(label) = label {
            self.pop_break_frame(program, label);
        }
        Ok(())
    }

    fn resolve_switch_statement(
        &mut self,
        source: &str,
        ast: &Ast,
        node: NodeId,
        program: &mut Program,
    ) -> GenResult {
        let NodeKind::SwitchStatement { condition, cases } = ast.node(node).kind.clone() else {
            return Ok(());
        };
        let label = self.push_break_frame(program);
        self.resolve_with_scope(source, ast, condition, program)?;
        let mut dispatch: Vec<(NodeId, Option<usize>)> = Vec::new();
        let mut default_case = None;
        for case in &cases {
            let NodeKind::SwitchCase { matcher, .. } = ast.node(*case).kind else {
                continue;
            };
            match matcher {
                Some(matcher) => {
                    self.emit_index(program, Opcode::PushValue, 0);
                    self.resolve_with_scope(source, ast, matcher, program)?;
                    self.emit(program, Opcode::StrictEq);
                    let patch = self.emit_address(program, Opcode::JumpIfTrue);
                    dispatch.push((*case, Some(patch)));
                    self.emit(program, Opcode::Pop);
                }
                None => {
                    dispatch.push((*case, None));
                    default_case = Some(*case);
                }
            }
        }
        self.emit(program, Opcode::Undefined);
        if let Some(default_case) = default_case {
            let patch = self.emit_address(program, Opcode::Jump);
            for entry in &mut dispatch {
                if entry.0 == default_case {
                    entry.1 = Some(patch);
                    break;
                }
            }
        }
        for (case, patch) in dispatch {
            if let Some(patch) = patch {
                program.patch_address(patch, program.len());
            }
            self.emit(program, Opcode::Pop);
            let NodeKind::SwitchCase { statements, .. } = ast.node(case).kind.clone() else {
                continue;
            };
            for statement in statements {
                self.resolve_with_scope(source, ast, statement, program)?;
            }
            self.emit(program, Opcode::Undefined);
        }
        self.emit(program, Opcode::Pop);
        self.pop_break_frame(program, label);
        Ok(())
    }

    fn resolve_try_catch_statement(
        &mut self,
        source: &str,
        ast: &Ast,
        node: NodeId,
        program: &mut Program,
    ) -> GenResult {
        let NodeKind::TryCatchStatement { identifier, body } = ast.node(node).kind else {
            return Ok(());
        };
        if let Some(identifier) = identifier {
            self.resolve_store(source, ast, identifier, program)?;
        }
        self.emit(program, Opcode::Pop);
        self.resolve_with_scope(source, ast, body, program)
    }

    fn resolve_try_statement(
        &mut self,
        source: &str,
        ast: &Ast,
        node: NodeId,
        program: &mut Program,
    ) -> GenResult {
        let NodeKind::TryStatement {
            body,
            on_error,
            on_finish,
        } = ast.node(node).kind
        else {
            return Ok(());
        };
        let label = if self.label.is_empty() {
            None
        } else {
            Some(self.push_break_frame(program))
        };
        self.emit(program, Opcode::TryBegin);
        let mut finish_patch = None;
        if on_finish.is_some() {
            finish_patch = Some(self.emit_address(program, Opcode::OnFinish));
        }
        let mut error_patch = None;
        if on_error.is_some() {
            error_patch = Some(self.emit_address(program, Opcode::OnError));
        }
        self.resolve_with_scope(source, ast, body, program)?;
        self.emit(program, Opcode::TryEnd);
        if let Some(on_error) = on_error {
            let skip = self.emit_address(program, Opcode::Jump);
            program.patch_address(error_patch.expect("handler patch"), program.len());
            self.resolve_with_scope(source, ast, on_error, program)?;
            program.patch_address(skip, program.len());
        }
        if let Some(on_finish) = on_finish {
            let skip = self.emit_address(program, Opcode::Jump);
            program.patch_address(finish_patch.expect("finalizer patch"), program.len());
            self.resolve_with_scope(source, ast, on_finish, program)?;
            self.emit(program, Opcode::Defer);
            program.patch_address(skip, program.len());
        }
        if let Some(label) = label {
            self.pop_break_frame(program, label);
        }
        Ok(())
    }

    fn resolve_while_statement(
        &mut self,
        source: &str,
        ast: &Ast,
        node: NodeId,
        program: &mut Program,
    ) -> GenResult {
        let NodeKind::WhileStatement { condition, body } = ast.node(node).kind else {
            return Ok(());
        };
        let label = self.push_break_frame(program);
        self.push_continue_frame(program, &label.clone());
        let start = program.len();
        self.resolve_with_scope(source, ast, condition, program)?;
        let end_patch = self.emit_address(program, Opcode::JumpIfFalse);
        self.emit(program, Opcode::Pop);
        self.resolve_with_scope(source, ast, body, program)?;
        self.emit_address_to(program, Opcode::Jump, start);
        program.patch_address(end_patch, program.len());
        self.emit(program, Opcode::Pop);
        self.pop_continue_frame(program, start);
        self.pop_break_frame(program, label);
        Ok(())
    }

    fn resolve_do_while_statement(
        &mut self,
        source: &str,
        ast: &Ast,
        node: NodeId,
        program: &mut Program,
    ) -> GenResult {
        let NodeKind::DoWhileStatement { body, condition } = ast.node(node).kind else {
            return Ok(());
        };
        let label = self.push_break_frame(program);
        self.push_continue_frame(program, &label.clone());
        self.emit(program, Opcode::Undefined);
        let start = program.len();
        self.emit(program, Opcode::Pop);
        self.resolve_with_scope(source, ast, body, program)?;
        self.resolve_with_scope(source, ast, condition, program)?;
        self.emit_address_to(program, Opcode::JumpIfTrue, start);
        self.emit(program, Opcode::Pop);
        self.pop_continue_frame(program, start);
        self.pop_break_frame(program, label);
        Ok(())
    }

    fn resolve_for_statement(
        &mut self,
        source: &str,
        ast: &Ast,
        node: NodeId,
        program: &mut Program,
    ) -> GenResult {
        let NodeKind::ForStatement {
            init,
            condition,
            update,
            body,
        } = ast.node(node).kind
        else {
            return Ok(());
        };
        let label = self.push_break_frame(program);
        self.push_continue_frame(program, &label.clone());
        if let Some(init) = init {
            self.resolve_with_scope(source, ast, init, program)?;
        }
        let start = program.len();
        let mut end_patch = None;
        if let Some(condition) = condition {
            self.resolve_with_scope(source, ast, condition, program)?;
            end_patch = Some(self.emit_address(program, Opcode::JumpIfFalse));
            self.emit(program, Opcode::Pop);
        }
        self.resolve_with_scope(source, ast, body, program)?;
        // Continue re-enters at the update clause, not the condition.
        let continue_target = program.len();
        if let Some(update) = update {
            self.resolve_with_scope(source, ast, update, program)?;
            self.emit(program, Opcode::Pop);
        }
        self.emit_address_to(program, Opcode::Jump, start);
        if let Some(end_patch) = end_patch {
            program.patch_address(end_patch, program.len());
            self.emit(program, Opcode::Pop);
        }
        self.pop_continue_frame(program, continue_target);
        self.pop_break_frame(program, label);
        Ok(())
    }

    /// Shared lowering for for-in / for-of / for-await-of: materialize the
    /// iterable, then loop on NEXT with the binding stored per iteration.
    fn resolve_for_iteration(
        &mut self,
        source: &str,
        ast: &Ast,
        node: NodeId,
        program: &mut Program,
    ) -> GenResult {
        let (left, right, body, keys, next) = match ast.node(node).kind {
            NodeKind::ForInStatement { left, right, body } => {
                (left, right, body, true, Opcode::Next)
            }
            NodeKind::ForOfStatement { left, right, body } => {
                (left, right, body, false, Opcode::Next)
            }
            NodeKind::ForAwaitOfStatement { left, right, body } => {
                (left, right, body, false, Opcode::AwaitNext)
            }
            _ => return Ok(()),
        };
        let label = self.push_break_frame(program);
        self.push_continue_frame(program, &label.clone());
        self.resolve_with_scope(source, ast, right, program)?;
        self.emit_index(program, Opcode::PushValue, 0);
        if keys {
            self.emit(program, Opcode::GetKeys);
        }
        self.emit(program, Opcode::Iterator);
        let start = program.len();
        self.emit(program, Opcode::Begin);
        // The loop head manages its scope itself: bindings re-enter on
        // every iteration.
        if let Some(scope) = ast.node(node).scope {
            for declaration in ast.scopes.scope(scope).declarations.clone() {
                match declaration.kind {
                    DeclarationKind::Let => {
                        self.emit_const(program, Opcode::Let, &declaration.name);
                    }
                    DeclarationKind::Const => {
                        self.emit_const(program, Opcode::Const, &declaration.name);
                    }
                    DeclarationKind::Var | DeclarationKind::Function => {}
                }
            }
        }
        self.emit_index(program, Opcode::PushValue, 0);
        self.emit(program, next);
        let end_patch = self.emit_address(program, Opcode::JumpIfTrue);
        self.emit(program, Opcode::Pop);
        let binding = self.iteration_binding(source, ast, left)?;
        self.resolve_store(source, ast, binding, program)?;
        self.emit(program, Opcode::Pop);
        self.resolve_with_scope(source, ast, body, program)?;
        self.emit_address_to(program, Opcode::Jump, start);
        program.patch_address(end_patch, program.len());
        self.emit(program, Opcode::Pop);
        self.emit(program, Opcode::Pop);
        self.emit(program, Opcode::End);
        self.pop_continue_frame(program, start);
        self.pop_break_frame(program, label);
        self.emit(program, Opcode::Pop);
        self.emit(program, Opcode::Pop);
        Ok(())
    }

    fn iteration_binding(
        &mut self,
        source: &str,
        ast: &Ast,
        left: NodeId,
    ) -> Result<NodeId, ScriptError> {
        let _ = source;
        if let NodeKind::VariableDeclaration { declarations, .. } = ast.node(left).kind.clone() {
            if declarations.len() != 1 {
                return Err(self.error(
                    "Invalid left-hand side in loop: Must have a single binding.",
                    ast.node(left).span,
                ));
            }
            let NodeKind::VariableDeclarator {
                identifier,
                initializer,
            } = ast.node(declarations[0]).kind
            else {
                return Err(self.error(
                    "Invalid left-hand side in loop: Must have a single binding.",
                    ast.node(left).span,
                ));
            };
            if let Some(initializer) = initializer {
                return Err(self.error(
                    "loop variable declaration may not have an initializer.",
                    ast.node(initializer).span,
                ));
            }
            return Ok(identifier);
        }
        Ok(left)
    }
}

// Expression lowering.
impl CodeGenerator {
    fn resolve_binary_expression(
        &mut self,
        source: &str,
        ast: &Ast,
        node: NodeId,
        program: &mut Program,
    ) -> GenResult {
        let NodeKind::BinaryExpression {
            left,
            operator,
            right,
        } = ast.node(node).kind
        else {
            return Ok(());
        };
        let operator_text = self.text(source, ast, operator).to_string();
        match operator_text.as_str() {
            "++" | "--" => {
                if let Some(right) = right {
                    self.resolve_with_scope(source, ast, right, program)?;
                    let opcode = if operator_text == "++" {
                        Opcode::Inc
                    } else {
                        Opcode::Dec
                    };
                    self.emit(program, opcode);
                } else if let Some(left) = left {
                    self.resolve_with_scope(source, ast, left, program)?;
                    let opcode = if operator_text == "++" {
                        Opcode::UpdateInc
                    } else {
                        Opcode::UpdateDec
                    };
                    self.emit(program, opcode);
                }
                Ok(())
            }
            "&&" | "||" | "??" => {
                let left = left.expect("logical operand");
                let right = right.expect("logical operand");
                self.resolve_with_scope(source, ast, left, program)?;
                let opcode = match operator_text.as_str() {
                    "&&" => Opcode::JumpIfFalse,
                    "||" => Opcode::JumpIfTrue,
                    _ => Opcode::JumpIfNotNull,
                };
                let patch = self.emit_address(program, opcode);
                self.emit(program, Opcode::Pop);
                self.resolve_with_scope(source, ast, right, program)?;
                program.patch_address(patch, program.len());
                Ok(())
            }
            "!" => {
                self.resolve_with_scope(source, ast, right.expect("unary operand"), program)?;
                self.emit(program, Opcode::LogicalNot);
                Ok(())
            }
            "~" => {
                self.resolve_with_scope(source, ast, right.expect("unary operand"), program)?;
                self.emit(program, Opcode::Not);
                Ok(())
            }
            "+" if left.is_none() => {
                self.resolve_with_scope(source, ast, right.expect("unary operand"), program)?;
                self.emit(program, Opcode::UnaryPlus);
                Ok(())
            }
            "-" if left.is_none() => {
                self.resolve_with_scope(source, ast, right.expect("unary operand"), program)?;
                self.emit(program, Opcode::UnaryNeg);
                Ok(())
            }
            "," => {
                self.resolve_with_scope(source, ast, left.expect("operand"), program)?;
                self.emit(program, Opcode::Pop);
                self.resolve_with_scope(source, ast, right.expect("operand"), program)
            }
            _ => {
                self.resolve_with_scope(source, ast, left.expect("operand"), program)?;
                self.resolve_with_scope(source, ast, right.expect("operand"), program)?;
                let opcode = match operator_text.as_str() {
                    "+" => Some(Opcode::Add),
                    "-" => Some(Opcode::Sub),
                    "**" => Some(Opcode::Pow),
                    "*" => Some(Opcode::Mul),
                    "/" => Some(Opcode::Div),
                    "%" => Some(Opcode::Mod),
                    "<<" => Some(Opcode::Shl),
                    ">>" => Some(Opcode::Shr),
                    ">>>" => Some(Opcode::Ushr),
                    "&" => Some(Opcode::And),
                    "|" => Some(Opcode::Or),
                    "^" => Some(Opcode::Xor),
                    ">" => Some(Opcode::Gt),
                    "<" => Some(Opcode::Lt),
                    ">=" => Some(Opcode::Ge),
                    "<=" => Some(Opcode::Le),
                    "==" => Some(Opcode::Eq),
                    "===" => Some(Opcode::StrictEq),
                    "!=" => Some(Opcode::Ne),
                    "!==" => Some(Opcode::StrictNe),
                    // instanceof / in have no operator in this machine;
                    // matches the reference generator.
                    _ => None,
                };
                if let Some(opcode) = opcode {
                    self.emit(program, opcode);
                }
                Ok(())
            }
        }
    }

    fn resolve_assignment_expression(
        &mut self,
        source: &str,
        ast: &Ast,
        node: NodeId,
        program: &mut Program,
    ) -> GenResult {
        let NodeKind::AssignmentExpression {
            left,
            operator,
            right,
        } = ast.node(node).kind
        else {
            return Ok(());
        };
        let operator_text = self.text(source, ast, operator).to_string();
        match operator_text.as_str() {
            "&&=" | "||=" | "??=" => {
                self.resolve_with_scope(source, ast, left, program)?;
                let opcode = match operator_text.as_str() {
                    "&&=" => Opcode::JumpIfFalse,
                    "||=" => Opcode::JumpIfTrue,
                    _ => Opcode::JumpIfNotNull,
                };
                let patch = self.emit_address(program, opcode);
                self.emit(program, Opcode::Pop);
                self.resolve_with_scope(source, ast, right, program)?;
                program.patch_address(patch, program.len());
            }
            "=" => {
                self.resolve_with_scope(source, ast, right, program)?;
            }
            _ => {
                self.resolve_with_scope(source, ast, left, program)?;
                self.resolve_with_scope(source, ast, right, program)?;
                let opcode = match operator_text.as_str() {
                    "+=" => Opcode::Add,
                    "-=" => Opcode::Sub,
                    "**=" => Opcode::Pow,
                    "*=" => Opcode::Mul,
                    "/=" => Opcode::Div,
                    "%=" => Opcode::Mod,
                    "<<=" => Opcode::Shl,
                    ">>=" => Opcode::Shr,
                    ">>>=" => Opcode::Ushr,
                    "&=" => Opcode::And,
                    "|=" => Opcode::Or,
                    "^=" => Opcode::Xor,
                    other => {
                        return Err(self.error(
                            format!("unsupported assignment operator '{}'", other),
                            ast.node(operator).span,
                        ))
                    }
                };
                self.emit(program, opcode);
            }
        }
        // The stored value stays on the stack as the expression result.
        self.resolve_store(source, ast, left, program)
    }

    fn in_constructor(&self, source: &str, ast: &Ast) -> bool {
        let Some(context) = self.lex_context else {
            return false;
        };
        match ast.node(context).kind {
            NodeKind::ClassMethod {
                identifier,
                computed,
                ..
            } => {
                !computed
                    && matches!(ast.node(identifier).kind, NodeKind::Identifier)
                    && self.text(source, ast, identifier) == "constructor"
            }
            _ => false,
        }
    }

    /// Lower a member/call chain; optional-chain short circuits collect
    /// their jump operand indices in `addresses` for the caller to patch
    /// past the whole chain.
    fn resolve_member_chain(
        &mut self,
        source: &str,
        ast: &Ast,
        node: NodeId,
        program: &mut Program,
        addresses: &mut Vec<usize>,
    ) -> GenResult {
        let node = self.unwrap(ast, node);
        match ast.node(node).kind.clone() {
            NodeKind::MemberExpression { host, field }
            | NodeKind::OptionalMemberExpression { host, field } => {
                let optional = matches!(
                    ast.node(node).kind,
                    NodeKind::OptionalMemberExpression { .. }
                );
                let field_text = self.text(source, ast, field).to_string();
                self.emit_const(program, Opcode::Str, &field_text);
                let super_host =
                    matches!(ast.node(self.unwrap(ast, host)).kind, NodeKind::SuperLiteral);
                if !super_host {
                    self.resolve_member_chain(source, ast, host, program, addresses)?;
                }
                if optional {
                    let patch = self.emit_address(program, Opcode::JumpIfNull);
                    addresses.push(patch);
                }
                if super_host {
                    self.emit(program, Opcode::GetSuperField);
                } else if matches!(ast.node(field).kind, NodeKind::PrivateName) {
                    self.emit(program, Opcode::GetPrivateField);
                } else {
                    self.emit(program, Opcode::GetField);
                }
                Ok(())
            }
            NodeKind::ComputedMemberExpression { host, field }
            | NodeKind::OptionalComputedMemberExpression { host, field } => {
                let optional = matches!(
                    ast.node(node).kind,
                    NodeKind::OptionalComputedMemberExpression { .. }
                );
                self.resolve_with_scope(source, ast, field, program)?;
                let super_host =
                    matches!(ast.node(self.unwrap(ast, host)).kind, NodeKind::SuperLiteral);
                if !super_host {
                    self.resolve_member_chain(source, ast, host, program, addresses)?;
                }
                if optional {
                    let patch = self.emit_address(program, Opcode::JumpIfNull);
                    addresses.push(patch);
                }
                if super_host {
                    self.emit(program, Opcode::GetSuperField);
                } else {
                    self.emit(program, Opcode::GetField);
                }
                Ok(())
            }
            NodeKind::CallExpression { callee, arguments }
            | NodeKind::OptionalCallExpression { callee, arguments } => {
                let optional_call = matches!(
                    ast.node(node).kind,
                    NodeKind::OptionalCallExpression { .. }
                );
                let callee = self.unwrap(ast, callee);
                let mut is_private = false;
                let mut opcode = Opcode::Call;
                match ast.node(callee).kind.clone() {
                    NodeKind::MemberExpression { host, field }
                    | NodeKind::OptionalMemberExpression { host, field } => {
                        self.resolve_member_chain(source, ast, host, program, addresses)?;
                        if matches!(
                            ast.node(callee).kind,
                            NodeKind::OptionalMemberExpression { .. }
                        ) {
                            let patch = self.emit_address(program, Opcode::JumpIfNull);
                            addresses.push(patch);
                        }
                        let field_text = self.text(source, ast, field).to_string();
                        self.emit_const(program, Opcode::Str, &field_text);
                        if matches!(ast.node(field).kind, NodeKind::PrivateName) {
                            is_private = true;
                        }
                        opcode = Opcode::MemberCall;
                    }
                    NodeKind::ComputedMemberExpression { host, field }
                    | NodeKind::OptionalComputedMemberExpression { host, field } => {
                        self.resolve_member_chain(source, ast, host, program, addresses)?;
                        if matches!(
                            ast.node(callee).kind,
                            NodeKind::OptionalComputedMemberExpression { .. }
                        ) {
                            let patch = self.emit_address(program, Opcode::JumpIfNull);
                            addresses.push(patch);
                        }
                        self.resolve_with_scope(source, ast, field, program)?;
                        opcode = Opcode::MemberCall;
                    }
                    NodeKind::SuperLiteral => {
                        if !self.in_constructor(source, ast) {
                            return Err(self.error(
                                "'super' keyword unexpected here",
                                ast.node(callee).span,
                            ));
                        }
                        opcode = Opcode::SuperCall;
                    }
                    _ => {
                        self.resolve_member_chain(source, ast, callee, program, addresses)?;
                    }
                }
                if optional_call {
                    let patch = self.emit_address(program, Opcode::JumpIfNull);
                    addresses.push(patch);
                }
                let mut count = 0usize;
                let mut spread = false;
                for argument in arguments {
                    if let NodeKind::SpreadExpression { value } = ast.node(argument).kind {
                        self.resolve_with_scope(source, ast, value, program)?;
                        self.emit_index(program, Opcode::Spread, count as u32);
                        spread = true;
                    } else {
                        self.resolve_with_scope(source, ast, argument, program)?;
                        count += 1;
                    }
                }
                if !spread {
                    self.emit_number(program, count as f64);
                }
                if is_private {
                    opcode = Opcode::PrivateMemberCall;
                }
                let site = self.emit(program, opcode);
                program.record_frame(site, ast.node(callee).span.end);
                Ok(())
            }
            _ => self.resolve_with_scope(source, ast, node, program),
        }
    }

    fn resolve_template_literal(
        &mut self,
        source: &str,
        ast: &Ast,
        node: NodeId,
        program: &mut Program,
    ) -> GenResult {
        let NodeKind::TemplateLiteral {
            tag,
            quasis,
            expressions,
        } = ast.node(node).kind.clone()
        else {
            return Ok(());
        };
        if let Some(tag) = tag {
            let tag = self.unwrap(ast, tag);
            let mut addresses = Vec::new();
            let mut opcode = Opcode::Call;
            match ast.node(tag).kind.clone() {
                NodeKind::MemberExpression { host, field } => {
                    self.resolve_member_chain(source, ast, host, program, &mut addresses)?;
                    let field_text = self.text(source, ast, field).to_string();
                    self.emit_const(program, Opcode::Str, &field_text);
                    if matches!(ast.node(field).kind, NodeKind::PrivateName) {
                        opcode = Opcode::PrivateMemberCall;
                    } else {
                        opcode = Opcode::MemberCall;
                    }
                }
                NodeKind::ComputedMemberExpression { host, field } => {
                    self.resolve_member_chain(source, ast, host, program, &mut addresses)?;
                    self.resolve_with_scope(source, ast, field, program)?;
                    opcode = Opcode::MemberCall;
                }
                NodeKind::SuperLiteral => {
                    if !self.in_constructor(source, ast) {
                        return Err(self.error(
                            "'super' keyword unexpected here",
                            ast.node(tag).span,
                        ));
                    }
                    opcode = Opcode::SuperCall;
                }
                _ => {
                    self.resolve_member_chain(source, ast, tag, program, &mut addresses)?;
                }
            }
            if !addresses.is_empty() {
                return Err(self.error(
                    "Invalid tagged template on optional chain",
                    ast.node(node).span,
                ));
            }
            for expression in expressions.iter().rev() {
                self.resolve_with_scope(source, ast, *expression, program)?;
            }
            self.emit(program, Opcode::Array);
            for (index, quasi) in quasis.iter().enumerate() {
                let text = self.text(source, ast, *quasi).to_string();
                self.emit_const(program, Opcode::Str, &text);
                self.emit_number(program, index as f64);
                self.emit_index(program, Opcode::PushValue, 2);
                self.emit(program, Opcode::SetField);
                self.emit(program, Opcode::Pop);
            }
            self.emit_number(program, (expressions.len() + 1) as f64);
            let site = self.emit(program, opcode);
            program.record_frame(site, ast.node(tag).span.end);
        } else {
            let head = self.text(source, ast, quasis[0]).to_string();
            self.emit_const(program, Opcode::Str, &head);
            for (index, expression) in expressions.iter().enumerate() {
                self.resolve_with_scope(source, ast, *expression, program)?;
                self.emit(program, Opcode::Add);
                let tail = self.text(source, ast, quasis[index + 1]).to_string();
                self.emit_const(program, Opcode::Str, &tail);
                self.emit(program, Opcode::Add);
            }
        }
        Ok(())
    }

    fn resolve_object_literal(
        &mut self,
        source: &str,
        ast: &Ast,
        node: NodeId,
        program: &mut Program,
    ) -> GenResult {
        let NodeKind::ObjectLiteral { properties } = ast.node(node).kind.clone() else {
            return Ok(());
        };
        self.emit(program, Opcode::Object);
        for property in properties {
            match ast.node(property).kind.clone() {
                NodeKind::ObjectProperty {
                    key,
                    value,
                    computed,
                } => {
                    match value {
                        Some(value) => self.resolve_with_scope(source, ast, value, program)?,
                        None => {
                            let name = self.text(source, ast, key).to_string();
                            self.emit_const(program, Opcode::Load, &name);
                        }
                    }
                    self.resolve_property_key(source, ast, key, computed, program)?;
                    self.emit_index(program, Opcode::PushValue, 2);
                    self.emit(program, Opcode::SetField);
                    self.emit(program, Opcode::Pop);
                }
                NodeKind::ObjectMethod {
                    identifier,
                    computed,
                    ..
                } => {
                    let name = self.text(source, ast, identifier).to_string();
                    self.resolve_function_value(source, ast, property, Some(&name), program)?;
                    self.resolve_property_key(source, ast, identifier, computed, program)?;
                    self.emit_index(program, Opcode::PushValue, 2);
                    self.emit(program, Opcode::SetMethod);
                    self.emit(program, Opcode::Pop);
                }
                NodeKind::ObjectAccessor {
                    kind,
                    identifier,
                    computed,
                    ..
                } => {
                    let name = self.text(source, ast, identifier).to_string();
                    self.resolve_function_value(source, ast, property, Some(&name), program)?;
                    self.resolve_property_key(source, ast, identifier, computed, program)?;
                    self.emit_index(program, Opcode::PushValue, 2);
                    let opcode = match kind {
                        AccessorKind::Get => Opcode::SetAccessorGetter,
                        AccessorKind::Set => Opcode::SetAccessorSetter,
                    };
                    self.emit(program, opcode);
                    self.emit(program, Opcode::Pop);
                }
                NodeKind::SpreadExpression { value } => {
                    self.resolve_with_scope(source, ast, value, program)?;
                    self.emit(program, Opcode::Merge);
                }
                _ => {}
            }
        }
        Ok(())
    }

    fn resolve_property_key(
        &mut self,
        source: &str,
        ast: &Ast,
        key: NodeId,
        computed: bool,
        program: &mut Program,
    ) -> GenResult {
        if computed {
            self.resolve_with_scope(source, ast, key, program)
        } else {
            let text = self.text(source, ast, key).to_string();
            self.emit_const(program, Opcode::Str, &text);
            Ok(())
        }
    }

    fn resolve_array_literal(
        &mut self,
        source: &str,
        ast: &Ast,
        node: NodeId,
        program: &mut Program,
    ) -> GenResult {
        let NodeKind::ArrayLiteral { items } = ast.node(node).kind.clone() else {
            return Ok(());
        };
        self.emit(program, Opcode::Array);
        let mut index = 0usize;
        for item in items {
            if let NodeKind::SpreadExpression { value } = ast.node(item).kind {
                self.resolve_with_scope(source, ast, value, program)?;
                self.emit(program, Opcode::Merge);
            } else {
                self.resolve_with_scope(source, ast, item, program)?;
                self.emit_number(program, index as f64);
                self.emit_index(program, Opcode::PushValue, 2);
                self.emit(program, Opcode::SetField);
                self.emit(program, Opcode::Pop);
                index += 1;
            }
        }
        Ok(())
    }
}

// Assignment targets and destructuring stores.
impl CodeGenerator {
    /// Store the value on top of the stack into a target: a named binding,
    /// a member expression, or a destructuring pattern. The stored value
    /// stays on the stack as the expression result.
    fn resolve_store(
        &mut self,
        source: &str,
        ast: &Ast,
        node: NodeId,
        program: &mut Program,
    ) -> GenResult {
        let node = self.unwrap(ast, node);
        match ast.node(node).kind.clone() {
            NodeKind::Identifier => {
                let name = self.text(source, ast, node).to_string();
                self.emit_const(program, Opcode::Store, &name);
                Ok(())
            }
            NodeKind::MemberExpression { host, field } => {
                self.emit_index(program, Opcode::PushValue, 0);
                let field_text = self.text(source, ast, field).to_string();
                self.emit_const(program, Opcode::Str, &field_text);
                let super_host =
                    matches!(ast.node(self.unwrap(ast, host)).kind, NodeKind::SuperLiteral);
                if !super_host {
                    self.resolve_with_scope(source, ast, host, program)?;
                    if matches!(ast.node(field).kind, NodeKind::PrivateName) {
                        self.emit(program, Opcode::SetPrivateField);
                    } else {
                        self.emit(program, Opcode::SetField);
                    }
                } else {
                    self.emit(program, Opcode::SetSuperField);
                }
                self.emit(program, Opcode::Pop);
                Ok(())
            }
            NodeKind::ComputedMemberExpression { host, field } => {
                self.emit_index(program, Opcode::PushValue, 0);
                self.resolve_with_scope(source, ast, field, program)?;
                let super_host =
                    matches!(ast.node(self.unwrap(ast, host)).kind, NodeKind::SuperLiteral);
                if !super_host {
                    self.resolve_with_scope(source, ast, host, program)?;
                    self.emit(program, Opcode::SetField);
                } else {
                    self.emit(program, Opcode::SetSuperField);
                }
                self.emit(program, Opcode::Pop);
                Ok(())
            }
            NodeKind::ObjectPattern { items } => {
                self.emit_index(program, Opcode::PushValue, 0);
                let has_rest = items.last().map_or(false, |last| {
                    matches!(
                        ast.node(*last).kind,
                        NodeKind::ObjectPatternItem { key, .. }
                            if matches!(ast.node(key).kind, NodeKind::SpreadPatternItem { .. })
                    )
                });
                let total = items.len();
                for (index, item) in items.into_iter().enumerate() {
                    let NodeKind::ObjectPatternItem {
                        key,
                        alias,
                        value,
                        computed,
                    } = ast.node(item).kind
                    else {
                        continue;
                    };
                    if let NodeKind::SpreadPatternItem { value: rest } = ast.node(key).kind {
                        if index != total - 1 {
                            return Err(self.error(
                                "Rest element must be last element",
                                ast.node(item).span,
                            ));
                        }
                        self.emit_index(program, Opcode::PushValue, index as u32);
                        self.emit_index(program, Opcode::ObjectSpread, index as u32);
                        self.resolve_store(source, ast, rest, program)?;
                        self.emit(program, Opcode::Pop);
                        break;
                    }
                    if computed {
                        self.resolve_with_scope(source, ast, key, program)?;
                    } else {
                        let key_text = self.text(source, ast, key).to_string();
                        self.emit_const(program, Opcode::Str, &key_text);
                    }
                    if has_rest {
                        // Keep every consumed key below the rest copy.
                        self.emit_index(program, Opcode::PushValue, 0);
                        self.emit_index(program, Opcode::PushValue, (index + 2) as u32);
                    } else {
                        self.emit_index(program, Opcode::PushValue, (index + 1) as u32);
                    }
                    self.emit(program, Opcode::GetField);
                    if let Some(default) = value {
                        let patch = self.emit_address(program, Opcode::JumpIfNotNull);
                        self.resolve_with_scope(source, ast, default, program)?;
                        program.patch_address(patch, program.len());
                    }
                    let target = alias.unwrap_or(key);
                    self.resolve_store(source, ast, target, program)?;
                    self.emit(program, Opcode::Pop);
                }
                self.emit(program, Opcode::Pop);
                Ok(())
            }
            NodeKind::ArrayPattern { items } => {
                self.emit_index(program, Opcode::PushValue, 0);
                self.emit(program, Opcode::Iterator);
                let total = items.len();
                for (index, item) in items.into_iter().enumerate() {
                    let NodeKind::ArrayPatternItem { alias, value } = ast.node(item).kind else {
                        continue;
                    };
                    if let Some(alias) = alias {
                        if matches!(ast.node(alias).kind, NodeKind::SpreadPatternItem { .. }) {
                            if index != total - 1 {
                                return Err(self.error(
                                    "Rest element must be last element",
                                    ast.node(item).span,
                                ));
                            }
                            let NodeKind::SpreadPatternItem { value: rest } =
                                ast.node(alias).kind
                            else {
                                unreachable!()
                            };
                            self.emit_index(program, Opcode::PushValue, 0);
                            self.emit(program, Opcode::ArraySpread);
                            self.resolve_store(source, ast, rest, program)?;
                            self.emit(program, Opcode::Pop);
                            break;
                        }
                        self.emit_index(program, Opcode::PushValue, 0);
                        self.emit(program, Opcode::Next);
                        self.emit(program, Opcode::Pop);
                        if let Some(default) = value {
                            let patch = self.emit_address(program, Opcode::JumpIfNotNull);
                            self.resolve_with_scope(source, ast, default, program)?;
                            program.patch_address(patch, program.len());
                        }
                        self.resolve_store(source, ast, alias, program)?;
                    }
                    self.emit(program, Opcode::Pop);
                }
                self.emit(program, Opcode::Pop);
                Ok(())
            }
            NodeKind::SpreadPatternItem { value } => {
                self.resolve_store(source, ast, value, program)
            }
            _ => Err(self.error(
                format!(
                    "Invalid left-handle assigment node: {}",
                    ast.node(node).kind.name()
                ),
                ast.node(node).span,
            )),
        }
    }
}

// Classes and module linkage.
impl CodeGenerator {
    fn resolve_class_declaration(
        &mut self,
        source: &str,
        ast: &Ast,
        node: NodeId,
        program: &mut Program,
    ) -> GenResult {
        let NodeKind::Class {
            identifier,
            extends,
            properties,
            ..
        } = ast.node(node).kind.clone()
        else {
            return Ok(());
        };
        match extends {
            Some(extends) => self.resolve_with_scope(source, ast, extends, program)?,
            None => {
                self.emit(program, Opcode::Undefined);
            }
        }
        self.emit(program, Opcode::Class);
        if let Some(identifier) = identifier {
            let name = self.text(source, ast, identifier).to_string();
            self.emit_const(program, Opcode::Store, &name);
        }
        let saved_context = self.lex_context;
        self.lex_context = Some(node);
        let hoisted = self.begin_scope(source, ast, node, program)?;
        self.emit_index(program, Opcode::PushValue, 0);
        self.emit(program, Opcode::With);
        for property in properties {
            match ast.node(property).kind.clone() {
                NodeKind::ClassMethod {
                    identifier,
                    computed,
                    is_static,
                    ..
                } => {
                    let name = self.text(source, ast, identifier).to_string();
                    self.resolve_function_value(source, ast, property, Some(&name), program)?;
                    self.resolve_property_key(source, ast, identifier, computed, program)?;
                    self.emit_index(program, Opcode::PushValue, 2);
                    let private = matches!(ast.node(identifier).kind, NodeKind::PrivateName);
                    let opcode = match (is_static, private) {
                        (true, true) => Opcode::SetPrivateMethod,
                        (true, false) => Opcode::SetMethod,
                        (false, true) => Opcode::SetPrivatePropMethod,
                        (false, false) => Opcode::SetPropMethod,
                    };
                    self.emit(program, opcode);
                    self.emit(program, Opcode::Pop);
                }
                NodeKind::ClassAccessor {
                    kind,
                    identifier,
                    computed,
                    is_static,
                    ..
                } => {
                    let name = self.text(source, ast, identifier).to_string();
                    self.resolve_function_value(source, ast, property, Some(&name), program)?;
                    self.resolve_property_key(source, ast, identifier, computed, program)?;
                    self.emit_index(program, Opcode::PushValue, 2);
                    let private = matches!(ast.node(identifier).kind, NodeKind::PrivateName);
                    let opcode = match (is_static, private, kind) {
                        (true, true, AccessorKind::Get) => Opcode::SetPrivateAccessorGetter,
                        (true, true, AccessorKind::Set) => Opcode::SetPrivateAccessorSetter,
                        (true, false, AccessorKind::Get) => Opcode::SetAccessorGetter,
                        (true, false, AccessorKind::Set) => Opcode::SetAccessorSetter,
                        (false, true, AccessorKind::Get) => Opcode::SetPrivatePropAccessorGetter,
                        (false, true, AccessorKind::Set) => Opcode::SetPrivatePropAccessorSetter,
                        (false, false, AccessorKind::Get) => Opcode::SetPropAccessorGetter,
                        (false, false, AccessorKind::Set) => Opcode::SetPropAccessorSetter,
                    };
                    self.emit(program, opcode);
                    self.emit(program, Opcode::Pop);
                }
                NodeKind::ClassProperty {
                    identifier,
                    computed,
                    is_static,
                    value,
                } => {
                    let private = matches!(ast.node(identifier).kind, NodeKind::PrivateName);
                    if is_static {
                        match value {
                            Some(value) => {
                                self.resolve_with_scope(source, ast, value, program)?
                            }
                            None => {
                                self.emit(program, Opcode::Undefined);
                            }
                        }
                        self.resolve_property_key(source, ast, identifier, computed, program)?;
                        self.emit_index(program, Opcode::PushValue, 2);
                        if private {
                            self.emit(program, Opcode::SetPrivateField);
                        } else {
                            self.emit(program, Opcode::SetField);
                        }
                        self.emit(program, Opcode::Pop);
                    } else {
                        // Instance fields run at construction; register the
                        // initializer body behind a skip jump.
                        self.resolve_property_key(source, ast, identifier, computed, program)?;
                        self.emit_index(program, Opcode::PushValue, 2);
                        let opcode = if private {
                            Opcode::SetPrivateInitializer
                        } else {
                            Opcode::SetInitializer
                        };
                        let entry = self.emit_address(program, opcode);
                        let skip = self.emit_address(program, Opcode::Jump);
                        program.patch_address(entry, program.len());
                        match value {
                            Some(value) => {
                                self.resolve_with_scope(source, ast, value, program)?
                            }
                            None => {
                                self.emit(program, Opcode::Undefined);
                            }
                        }
                        self.emit(program, Opcode::Ret);
                        program.patch_address(skip, program.len());
                    }
                }
                NodeKind::StaticBlock { statement, .. } => {
                    self.resolve_with_scope(source, ast, statement, program)?;
                }
                _ => {}
            }
        }
        self.end_scope(source, ast, program, hoisted)?;
        self.lex_context = saved_context;
        Ok(())
    }

    fn resolve_import_declaration(
        &mut self,
        source: &str,
        ast: &Ast,
        node: NodeId,
        program: &mut Program,
    ) -> GenResult {
        let NodeKind::ImportDeclaration {
            specifiers,
            source: module,
            attributes,
        } = ast.node(node).kind.clone()
        else {
            return Ok(());
        };
        let module_text = self.text(source, ast, module);
        let module_name = module_text[1..module_text.len() - 1].to_string();
        self.emit_const(program, Opcode::Import, &module_name);
        for attribute in attributes {
            let NodeKind::ImportAttribute { key, value } = ast.node(attribute).kind else {
                continue;
            };
            self.resolve_with_scope(source, ast, value, program)?;
            let key_text = self.text(source, ast, key).to_string();
            self.emit_const(program, Opcode::Assert, &key_text);
        }
        for specifier in specifiers {
            match ast.node(specifier).kind.clone() {
                NodeKind::ImportDefault { identifier } => {
                    self.emit_const(program, Opcode::Str, "default");
                    self.emit_index(program, Opcode::PushValue, 1);
                    self.emit(program, Opcode::GetField);
                    let name = self.text(source, ast, identifier).to_string();
                    self.emit_const(program, Opcode::Store, &name);
                }
                NodeKind::ImportNamespace { alias } => {
                    self.emit_index(program, Opcode::PushValue, 0);
                    let name = self.text(source, ast, alias).to_string();
                    self.emit_const(program, Opcode::Store, &name);
                }
                NodeKind::ImportSpecifier { identifier, alias } => {
                    let imported = self.text(source, ast, identifier).to_string();
                    self.emit_const(program, Opcode::Str, &imported);
                    self.emit_index(program, Opcode::PushValue, 1);
                    self.emit(program, Opcode::GetField);
                    let local = alias.unwrap_or(identifier);
                    let name = self.text(source, ast, local).to_string();
                    self.emit_const(program, Opcode::Store, &name);
                }
                _ => {}
            }
        }
        self.emit(program, Opcode::Pop);
        Ok(())
    }

    fn resolve_export_binding(
        &mut self,
        source: &str,
        ast: &Ast,
        node: NodeId,
        program: &mut Program,
    ) {
        match ast.node(node).kind.clone() {
            NodeKind::Identifier => {
                let name = self.text(source, ast, node).to_string();
                self.emit_const(program, Opcode::Load, &name);
                self.emit_const(program, Opcode::Export, &name);
                self.emit(program, Opcode::Pop);
            }
            NodeKind::ObjectPattern { items } => {
                for item in items {
                    let NodeKind::ObjectPatternItem { key, alias, .. } = ast.node(item).kind
                    else {
                        continue;
                    };
                    if let NodeKind::SpreadPatternItem { value } = ast.node(key).kind {
                        self.resolve_export_binding(source, ast, value, program);
                    } else {
                        self.resolve_export_binding(source, ast, alias.unwrap_or(key), program);
                    }
                }
            }
            NodeKind::ArrayPattern { items } => {
                for item in items {
                    let NodeKind::ArrayPatternItem { alias, .. } = ast.node(item).kind else {
                        continue;
                    };
                    if let Some(alias) = alias {
                        if let NodeKind::SpreadPatternItem { value } = ast.node(alias).kind {
                            self.resolve_export_binding(source, ast, value, program);
                        } else {
                            self.resolve_export_binding(source, ast, alias, program);
                        }
                    }
                }
            }
            _ => {}
        }
    }

    fn resolve_export_declaration(
        &mut self,
        source: &str,
        ast: &Ast,
        node: NodeId,
        program: &mut Program,
    ) -> GenResult {
        let NodeKind::ExportDeclaration {
            specifiers,
            source: module,
        } = ast.node(node).kind.clone()
        else {
            return Ok(());
        };
        if let Some(module) = module {
            let module_text = self.text(source, ast, module);
            let module_name = module_text[1..module_text.len() - 1].to_string();
            self.emit_const(program, Opcode::Import, &module_name);
            for specifier in specifiers {
                match ast.node(specifier).kind.clone() {
                    NodeKind::ExportNamespace { alias } => match alias {
                        Some(alias) => {
                            let name = self.text(source, ast, alias).to_string();
                            self.emit_const(program, Opcode::Export, &name);
                        }
                        None => {
                            self.emit(program, Opcode::ExportAll);
                        }
                    },
                    NodeKind::ExportSpecifier { identifier, alias } => {
                        let imported = self.text(source, ast, identifier).to_string();
                        self.emit_const(program, Opcode::Str, &imported);
                        self.emit_index(program, Opcode::PushValue, 1);
                        self.emit(program, Opcode::GetField);
                        let exported = alias.unwrap_or(identifier);
                        let name = self.text(source, ast, exported).to_string();
                        self.emit_const(program, Opcode::Export, &name);
                    }
                    _ => {}
                }
            }
            self.emit(program, Opcode::Pop);
            return Ok(());
        }
        for specifier in specifiers {
            match ast.node(specifier).kind.clone() {
                NodeKind::ExportDefault { expression } => {
                    self.resolve_with_scope(source, ast, expression, program)?;
                    self.emit_const(program, Opcode::Export, "default");
                }
                NodeKind::ExportSpecifier { identifier, alias } => {
                    let local = self.text(source, ast, identifier).to_string();
                    self.emit_const(program, Opcode::Load, &local);
                    let exported = alias.unwrap_or(identifier);
                    let name = self.text(source, ast, exported).to_string();
                    self.emit_const(program, Opcode::Export, &name);
                }
                _ => {
                    // `export <declaration>` runs the declaration, then
                    // exports the bindings it introduced.
                    self.resolve_with_scope(source, ast, specifier, program)?;
                    match ast.node(specifier).kind.clone() {
                        NodeKind::Class {
                            identifier: Some(identifier),
                            ..
                        }
                        | NodeKind::Function {
                            identifier: Some(identifier),
                            ..
                        } => {
                            let name = self.text(source, ast, identifier).to_string();
                            self.emit_const(program, Opcode::Load, &name);
                            self.emit_const(program, Opcode::Export, &name);
                        }
                        NodeKind::VariableDeclaration { declarations, .. } => {
                            for declarator in declarations {
                                let NodeKind::VariableDeclarator { identifier, .. } =
                                    ast.node(declarator).kind
                                else {
                                    continue;
                                };
                                self.resolve_export_binding(source, ast, identifier, program);
                            }
                        }
                        _ => {}
                    }
                }
            }
        }
        Ok(())
    }
}

impl Default for CodeGenerator {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::parser::{parse, EvalMode};

    fn compile(source: &str) -> Program {
        let ast = parse(source, EvalMode::Program);
        assert!(!ast.is_error(), "parse failed: {:?}", ast.error());
        let mut program = Program::new("test.vs");
        CodeGenerator::new()
            .resolve(source, &ast, &mut program)
            .unwrap();
        program
    }

    fn opcodes(program: &Program) -> Vec<Opcode> {
        program.instructions.iter().map(|i| i.opcode).collect()
    }

    #[test]
    fn test_arithmetic_orders_operands() {
        let program = compile("1+2*3");
        let ops = opcodes(&program);
        let mul = ops.iter().position(|o| *o == Opcode::Mul).unwrap();
        let add = ops.iter().position(|o| *o == Opcode::Add).unwrap();
        assert!(mul < add, "multiply must be emitted before add");
        let pushes = ops.iter().filter(|o| **o == Opcode::Push).count();
        assert_eq!(pushes, 3);
    }

    #[test]
    fn test_jumps_stay_in_bounds() {
        let program = compile(
            "let x = 0; a: for (;;) { if (x) { break a; } x = x + 1; } switch (x) { case 1: break; default: x = 2; }",
        );
        for instruction in &program.instructions {
            if let Operand::Address(target) = instruction.operand {
                assert!(target <= program.len(), "target {} escapes", target);
            }
        }
    }

    #[test]
    fn test_try_without_finally_omits_finalizer_pair() {
        let program = compile("try { throw 1; } catch (e) { }");
        let ops = opcodes(&program);
        assert!(ops.contains(&Opcode::TryBegin));
        assert!(ops.contains(&Opcode::OnError));
        assert!(ops.contains(&Opcode::TryEnd));
        assert!(!ops.contains(&Opcode::OnFinish));
        assert!(!ops.contains(&Opcode::Defer));
    }

    #[test]
    fn test_rest_element_must_be_last() {
        let source = "let o = {}; ({a, ...rest, b} = o);";
        let ast = parse(source, EvalMode::Program);
        assert!(!ast.is_error());
        let mut program = Program::new("test.vs");
        let error = CodeGenerator::new()
            .resolve(source, &ast, &mut program)
            .unwrap_err();
        assert!(error.message.contains("Rest element must be last"));
    }

    #[test]
    fn test_yield_outside_generator_is_rejected() {
        let source = "function f() { yield 1; }";
        let ast = parse(source, EvalMode::Program);
        assert!(!ast.is_error());
        let mut program = Program::new("test.vs");
        let error = CodeGenerator::new()
            .resolve(source, &ast, &mut program)
            .unwrap_err();
        assert!(error.message.contains("generator"));
    }

    #[test]
    fn test_call_records_frame_site() {
        let program = compile("f(1, 2);");
        let call = program
            .instructions
            .iter()
            .position(|i| i.opcode == Opcode::Call)
            .unwrap();
        assert!(program.frames.contains_key(&call));
        assert_eq!(program.frames[&call].filename, "test.vs");
    }
}
