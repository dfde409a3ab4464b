//! Abstract syntax tree: node kinds and the node arena.
//!
//! Nodes are allocated through a single arena and addressed by stable
//! [`NodeId`] indices. A node owns its children and its attached comments:
//! disposing a node disposes its entire subtree. Parent links are plain
//! indices, never ownership. The arena counts live allocations so leak and
//! double-free properties stay testable.

use crate::scope::{DeclarationKind, ScopeId};
use core_types::SourceSpan;
use std::collections::BTreeSet;

/// Stable index of a node inside its arena.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct NodeId(pub u32);

/// Accessor flavor for object and class accessors.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AccessorKind {
    /// `get name() {}`
    Get,
    /// `set name(value) {}`
    Set,
}

/// Kind tag plus kind-specific payload for one syntax node.
///
/// Node text (identifier names, literal bodies, operator tokens) is never
/// stored here; it is re-sliced from the original source buffer through the
/// node's span.
#[derive(Debug, Clone, PartialEq)]
pub enum NodeKind {
    /// Terminal parse or generation failure
    Error {
        /// Human-readable message
        message: String,
    },
    /// An operator or punctuation token
    Token,
    /// `#name` inside a class body
    PrivateName,
    /// `/pattern/flags`
    RegexLiteral,
    /// `null`
    NullLiteral,
    /// Quoted string literal
    StringLiteral,
    /// `true` or `false`
    BooleanLiteral,
    /// Numeric literal
    NumberLiteral,
    /// `// ...` comment
    Comment,
    /// `/* ... */` comment
    MultilineComment,
    /// `undefined`
    UndefinedLiteral,
    /// Identifier reference or name
    Identifier,
    /// Template literal with optional tag
    TemplateLiteral {
        /// Tag expression for tagged templates
        tag: Option<NodeId>,
        /// String fragments between interpolations
        quasis: Vec<NodeId>,
        /// Interpolated expressions
        expressions: Vec<NodeId>,
    },
    /// BigInt literal (`123n`)
    BigintLiteral,
    /// `this`
    ThisLiteral,
    /// `super`
    SuperLiteral,
    /// Whole-program root
    Program {
        /// `#!` interpreter directive
        interpreter: Option<NodeId>,
        /// Directive prologue strings
        directives: Vec<NodeId>,
        /// Top-level statements
        statements: Vec<NodeId>,
    },
    /// `;`
    EmptyStatement,
    /// `{ ... }`
    BlockStatement {
        /// Statements in source order
        statements: Vec<NodeId>,
    },
    /// `debugger;`
    DebuggerStatement,
    /// `return expr?;`
    ReturnStatement {
        /// Returned value
        value: Option<NodeId>,
    },
    /// `label: statement`
    LabelStatement {
        /// Label identifier
        label: NodeId,
        /// Labeled statement
        statement: NodeId,
    },
    /// `break label?;`
    BreakStatement {
        /// Optional target label
        label: Option<NodeId>,
    },
    /// `continue label?;`
    ContinueStatement {
        /// Optional target label
        label: Option<NodeId>,
    },
    /// `if (cond) consequent else alternate`
    IfStatement {
        /// Condition expression
        condition: NodeId,
        /// Taken branch
        consequent: NodeId,
        /// Else branch
        alternate: Option<NodeId>,
    },
    /// `switch (cond) { cases }`
    SwitchStatement {
        /// Discriminant expression
        condition: NodeId,
        /// Case clauses in source order
        cases: Vec<NodeId>,
    },
    /// `case expr:` or `default:`
    SwitchCase {
        /// Match expression, None for `default`
        matcher: Option<NodeId>,
        /// Clause statements
        statements: Vec<NodeId>,
    },
    /// `throw expr;`
    ThrowStatement {
        /// Thrown value
        value: NodeId,
    },
    /// `try { } catch { } finally { }`
    TryStatement {
        /// Protected block
        body: NodeId,
        /// Catch clause
        on_error: Option<NodeId>,
        /// Finally block
        on_finish: Option<NodeId>,
    },
    /// `catch (param)? { ... }`
    TryCatchStatement {
        /// Catch binding
        identifier: Option<NodeId>,
        /// Handler block
        body: NodeId,
    },
    /// `while (cond) body`
    WhileStatement {
        /// Loop condition
        condition: NodeId,
        /// Loop body
        body: NodeId,
    },
    /// `do body while (cond)`
    DoWhileStatement {
        /// Loop body
        body: NodeId,
        /// Loop condition
        condition: NodeId,
    },
    /// `for (init; cond; update) body`
    ForStatement {
        /// Initializer
        init: Option<NodeId>,
        /// Condition
        condition: Option<NodeId>,
        /// Update expression
        update: Option<NodeId>,
        /// Loop body
        body: NodeId,
    },
    /// `for (left in right) body`
    ForInStatement {
        /// Binding or target
        left: NodeId,
        /// Enumerated object
        right: NodeId,
        /// Loop body
        body: NodeId,
    },
    /// `for (left of right) body`
    ForOfStatement {
        /// Binding or target
        left: NodeId,
        /// Iterated value
        right: NodeId,
        /// Loop body
        body: NodeId,
    },
    /// `for await (left of right) body`
    ForAwaitOfStatement {
        /// Binding or target
        left: NodeId,
        /// Iterated value
        right: NodeId,
        /// Loop body
        body: NodeId,
    },
    /// Expression used as a statement
    ExpressionStatement {
        /// The expression
        expression: NodeId,
    },
    /// `var/let/const` declaration statement
    VariableDeclaration {
        /// Declaration keyword
        kind: DeclarationKind,
        /// Declarators
        declarations: Vec<NodeId>,
    },
    /// One `name = init` inside a variable declaration
    VariableDeclarator {
        /// Binding identifier or pattern
        identifier: NodeId,
        /// Initializer expression
        initializer: Option<NodeId>,
    },
    /// `@expr` before a class or member
    Decorator {
        /// Decorating expression
        expression: NodeId,
    },
    /// Directive prologue entry
    Directive,
    /// `#!...` first line
    InterpreterDirective,
    /// `key: value` in an object literal
    ObjectProperty {
        /// Property key
        key: NodeId,
        /// Value, None for shorthand
        value: Option<NodeId>,
        /// Computed `[key]`
        computed: bool,
    },
    /// Method in an object literal
    ObjectMethod {
        /// Method name
        identifier: NodeId,
        /// Computed `[name]`
        computed: bool,
        /// `async`
        is_async: bool,
        /// Generator `*`
        is_generator: bool,
        /// Parameters
        arguments: Vec<NodeId>,
        /// Function body
        body: NodeId,
        /// Captured outer bindings
        closure: BTreeSet<String>,
    },
    /// Accessor in an object literal
    ObjectAccessor {
        /// Getter or setter
        kind: AccessorKind,
        /// Accessor name
        identifier: NodeId,
        /// Computed `[name]`
        computed: bool,
        /// Parameters
        arguments: Vec<NodeId>,
        /// Function body
        body: NodeId,
        /// Captured outer bindings
        closure: BTreeSet<String>,
    },
    /// Binary (or unary/update, with one side absent) expression
    BinaryExpression {
        /// Left operand; None for prefix unary forms
        left: Option<NodeId>,
        /// Operator token
        operator: NodeId,
        /// Right operand; None for postfix update forms
        right: Option<NodeId>,
    },
    /// `host.field`
    MemberExpression {
        /// Receiver
        host: NodeId,
        /// Field name or private name
        field: NodeId,
    },
    /// `host?.field`
    OptionalMemberExpression {
        /// Receiver
        host: NodeId,
        /// Field name
        field: NodeId,
    },
    /// `host[field]`
    ComputedMemberExpression {
        /// Receiver
        host: NodeId,
        /// Field expression
        field: NodeId,
    },
    /// `host?.[field]`
    OptionalComputedMemberExpression {
        /// Receiver
        host: NodeId,
        /// Field expression
        field: NodeId,
    },
    /// `cond ? consequent : alternate`
    ConditionExpression {
        /// Condition
        condition: NodeId,
        /// Value when truthy
        consequent: NodeId,
        /// Value when falsy
        alternate: NodeId,
    },
    /// `callee(arguments)`
    CallExpression {
        /// Called expression
        callee: NodeId,
        /// Arguments in source order
        arguments: Vec<NodeId>,
    },
    /// `callee?.(arguments)`
    OptionalCallExpression {
        /// Called expression
        callee: NodeId,
        /// Arguments in source order
        arguments: Vec<NodeId>,
    },
    /// `new callee(arguments)`
    NewExpression {
        /// Constructed expression
        callee: NodeId,
        /// Arguments in source order
        arguments: Vec<NodeId>,
    },
    /// `delete expr`
    DeleteExpression {
        /// Deleted reference
        value: NodeId,
    },
    /// `await expr`
    AwaitExpression {
        /// Awaited value
        value: NodeId,
    },
    /// `yield expr?`
    YieldExpression {
        /// Yielded value
        value: Option<NodeId>,
    },
    /// `yield* expr`
    YieldDelegateExpression {
        /// Delegated iterable
        value: NodeId,
    },
    /// `void expr`
    VoidExpression {
        /// Discarded value
        value: NodeId,
    },
    /// `typeof expr`
    TypeofExpression {
        /// Inspected value
        value: NodeId,
    },
    /// `(expr)`
    GroupExpression {
        /// Wrapped expression
        expression: NodeId,
    },
    /// `left op right` assignment
    AssignmentExpression {
        /// Assignment target
        left: NodeId,
        /// Operator token
        operator: NodeId,
        /// Assigned value
        right: NodeId,
    },
    /// `...expr` in call arguments or literals
    SpreadExpression {
        /// Spread value
        value: NodeId,
    },
    /// `...target` in a pattern
    SpreadPatternItem {
        /// Rest binding
        value: NodeId,
    },
    /// `{ items }` destructuring pattern
    ObjectPattern {
        /// Pattern items
        items: Vec<NodeId>,
    },
    /// One entry of an object pattern
    ObjectPatternItem {
        /// Source key (or a nested rest item)
        key: NodeId,
        /// Binding alias, None when the key itself binds
        alias: Option<NodeId>,
        /// Default value
        value: Option<NodeId>,
        /// Computed `[key]`
        computed: bool,
    },
    /// `[ items ]` destructuring pattern
    ArrayPattern {
        /// Pattern items
        items: Vec<NodeId>,
    },
    /// One entry of an array pattern
    ArrayPatternItem {
        /// Binding target, None for a hole
        alias: Option<NodeId>,
        /// Default value
        value: Option<NodeId>,
    },
    /// Method in a class body
    ClassMethod {
        /// Method name
        identifier: NodeId,
        /// Computed `[name]`
        computed: bool,
        /// `static`
        is_static: bool,
        /// `async`
        is_async: bool,
        /// Generator `*`
        is_generator: bool,
        /// Parameters
        arguments: Vec<NodeId>,
        /// Function body
        body: NodeId,
        /// Captured outer bindings
        closure: BTreeSet<String>,
    },
    /// Field in a class body
    ClassProperty {
        /// Field name
        identifier: NodeId,
        /// Computed `[name]`
        computed: bool,
        /// `static`
        is_static: bool,
        /// Initializer
        value: Option<NodeId>,
    },
    /// Accessor in a class body
    ClassAccessor {
        /// Getter or setter
        kind: AccessorKind,
        /// Accessor name
        identifier: NodeId,
        /// Computed `[name]`
        computed: bool,
        /// `static`
        is_static: bool,
        /// Parameters
        arguments: Vec<NodeId>,
        /// Function body
        body: NodeId,
        /// Captured outer bindings
        closure: BTreeSet<String>,
    },
    /// `static { ... }` in a class body
    StaticBlock {
        /// Block statement
        statement: NodeId,
        /// Captured outer bindings
        closure: BTreeSet<String>,
    },
    /// `import ...` declaration
    ImportDeclaration {
        /// Default/namespace/named specifiers
        specifiers: Vec<NodeId>,
        /// Module source string
        source: NodeId,
        /// `assert { ... }` attributes
        attributes: Vec<NodeId>,
    },
    /// `{ name as alias }` import entry
    ImportSpecifier {
        /// Imported name
        identifier: NodeId,
        /// Local alias
        alias: Option<NodeId>,
    },
    /// Default import binding
    ImportDefault {
        /// Local binding
        identifier: NodeId,
    },
    /// `* as name` import
    ImportNamespace {
        /// Local binding
        alias: NodeId,
    },
    /// `key: value` inside `assert { ... }`
    ImportAttribute {
        /// Attribute key
        key: NodeId,
        /// Attribute value
        value: NodeId,
    },
    /// `export ...` declaration
    ExportDeclaration {
        /// Exported items
        specifiers: Vec<NodeId>,
        /// Re-export source
        source: Option<NodeId>,
    },
    /// `export default expr`
    ExportDefault {
        /// Exported expression
        expression: NodeId,
    },
    /// `{ name as alias }` export entry
    ExportSpecifier {
        /// Exported name
        identifier: NodeId,
        /// Alias
        alias: Option<NodeId>,
    },
    /// `* as alias` re-export
    ExportNamespace {
        /// Alias, None for bare `*`
        alias: Option<NodeId>,
    },
    /// One function parameter
    FunctionArgument {
        /// Binding identifier or pattern
        identifier: NodeId,
        /// Default value
        value: Option<NodeId>,
    },
    /// `(args) => body`
    ArrowFunction {
        /// `async`
        is_async: bool,
        /// Parameters
        arguments: Vec<NodeId>,
        /// Expression or function body
        body: NodeId,
        /// Captured outer bindings
        closure: BTreeSet<String>,
    },
    /// `function name(args) { ... }` declaration or expression
    Function {
        /// Function name
        identifier: Option<NodeId>,
        /// `async`
        is_async: bool,
        /// Generator `*`
        is_generator: bool,
        /// Parameters
        arguments: Vec<NodeId>,
        /// Function body
        body: NodeId,
        /// Captured outer bindings
        closure: BTreeSet<String>,
    },
    /// `{ directives statements }` body of a function
    FunctionBody {
        /// Directive prologue strings
        directives: Vec<NodeId>,
        /// Body statements
        statements: Vec<NodeId>,
    },
    /// `{ ... }` object literal
    ObjectLiteral {
        /// Properties, methods, accessors and spreads
        properties: Vec<NodeId>,
    },
    /// `[ ... ]` array literal
    ArrayLiteral {
        /// Elements and spreads
        items: Vec<NodeId>,
    },
    /// `class name extends base { ... }`
    Class {
        /// Class name
        identifier: Option<NodeId>,
        /// Heritage expression
        extends: Option<NodeId>,
        /// Members in source order
        properties: Vec<NodeId>,
        /// Decorators applied to the class
        decorators: Vec<NodeId>,
        /// Captured outer bindings
        closure: BTreeSet<String>,
    },
}

impl NodeKind {
    /// Short tag name used by the JSON rendering.
    pub fn name(&self) -> &'static str {
        match self {
            NodeKind::Error { .. } => "ERROR",
            NodeKind::Token => "TOKEN",
            NodeKind::PrivateName => "PRIVATE_NAME",
            NodeKind::RegexLiteral => "LITERAL_REGEX",
            NodeKind::NullLiteral => "LITERAL_NULL",
            NodeKind::StringLiteral => "LITERAL_STRING",
            NodeKind::BooleanLiteral => "LITERAL_BOOLEAN",
            NodeKind::NumberLiteral => "LITERAL_NUMBER",
            NodeKind::Comment => "LITERAL_COMMENT",
            NodeKind::MultilineComment => "LITERAL_MULTILINE_COMMENT",
            NodeKind::UndefinedLiteral => "LITERAL_UNDEFINED",
            NodeKind::Identifier => "LITERAL_IDENTITY",
            NodeKind::TemplateLiteral { .. } => "LITERAL_TEMPLATE",
            NodeKind::BigintLiteral => "LITERAL_BIGINT",
            NodeKind::ThisLiteral => "LITERAL_THIS",
            NodeKind::SuperLiteral => "LITERAL_SUPER",
            NodeKind::Program { .. } => "PROGRAM",
            NodeKind::EmptyStatement => "STATEMENT_EMPTY",
            NodeKind::BlockStatement { .. } => "STATEMENT_BLOCK",
            NodeKind::DebuggerStatement => "STATEMENT_DEBUGGER",
            NodeKind::ReturnStatement { .. } => "STATEMENT_RETURN",
            NodeKind::LabelStatement { .. } => "STATEMENT_LABEL",
            NodeKind::BreakStatement { .. } => "STATEMENT_BREAK",
            NodeKind::ContinueStatement { .. } => "STATEMENT_CONTINUE",
            NodeKind::IfStatement { .. } => "STATEMENT_IF",
            NodeKind::SwitchStatement { .. } => "STATEMENT_SWITCH",
            NodeKind::SwitchCase { .. } => "STATEMENT_SWITCH_CASE",
            NodeKind::ThrowStatement { .. } => "STATEMENT_THROW",
            NodeKind::TryStatement { .. } => "STATEMENT_TRY",
            NodeKind::TryCatchStatement { .. } => "STATEMENT_TRY_CATCH",
            NodeKind::WhileStatement { .. } => "STATEMENT_WHILE",
            NodeKind::DoWhileStatement { .. } => "STATEMENT_DO_WHILE",
            NodeKind::ForStatement { .. } => "STATEMENT_FOR",
            NodeKind::ForInStatement { .. } => "STATEMENT_FOR_IN",
            NodeKind::ForOfStatement { .. } => "STATEMENT_FOR_OF",
            NodeKind::ForAwaitOfStatement { .. } => "STATEMENT_FOR_AWAIT_OF",
            NodeKind::ExpressionStatement { .. } => "STATEMENT_EXPRESSION",
            NodeKind::VariableDeclaration { .. } => "DECLARATION_VARIABLE",
            NodeKind::VariableDeclarator { .. } => "VARIABLE_DECLARATOR",
            NodeKind::Decorator { .. } => "DECORATOR",
            NodeKind::Directive => "DIRECTIVE",
            NodeKind::InterpreterDirective => "INTERPRETER_DIRECTIVE",
            NodeKind::ObjectProperty { .. } => "OBJECT_PROPERTY",
            NodeKind::ObjectMethod { .. } => "OBJECT_METHOD",
            NodeKind::ObjectAccessor { .. } => "OBJECT_ACCESSOR",
            NodeKind::BinaryExpression { .. } => "EXPRESSION_BINARY",
            NodeKind::MemberExpression { .. } => "EXPRESSION_MEMBER",
            NodeKind::OptionalMemberExpression { .. } => "EXPRESSION_OPTIONAL_MEMBER",
            NodeKind::ComputedMemberExpression { .. } => "EXPRESSION_COMPUTED_MEMBER",
            NodeKind::OptionalComputedMemberExpression { .. } => {
                "EXPRESSION_OPTIONAL_COMPUTED_MEMBER"
            }
            NodeKind::ConditionExpression { .. } => "EXPRESSION_CONDITION",
            NodeKind::CallExpression { .. } => "EXPRESSION_CALL",
            NodeKind::OptionalCallExpression { .. } => "EXPRESSION_OPTIONAL_CALL",
            NodeKind::NewExpression { .. } => "EXPRESSION_NEW",
            NodeKind::DeleteExpression { .. } => "EXPRESSION_DELETE",
            NodeKind::AwaitExpression { .. } => "EXPRESSION_AWAIT",
            NodeKind::YieldExpression { .. } => "EXPRESSION_YIELD",
            NodeKind::YieldDelegateExpression { .. } => "EXPRESSION_YIELD_DELEGATE",
            NodeKind::VoidExpression { .. } => "EXPRESSION_VOID",
            NodeKind::TypeofExpression { .. } => "EXPRESSION_TYPEOF",
            NodeKind::GroupExpression { .. } => "EXPRESSION_GROUP",
            NodeKind::AssignmentExpression { .. } => "EXPRESSION_ASSIGMENT",
            NodeKind::SpreadExpression { .. } => "EXPRESSION_SPREAD",
            NodeKind::SpreadPatternItem { .. } => "PATTERN_SPREAD_ITEM",
            NodeKind::ObjectPattern { .. } => "PATTERN_OBJECT",
            NodeKind::ObjectPatternItem { .. } => "PATTERN_OBJECT_ITEM",
            NodeKind::ArrayPattern { .. } => "PATTERN_ARRAY",
            NodeKind::ArrayPatternItem { .. } => "PATTERN_ARRAY_ITEM",
            NodeKind::ClassMethod { .. } => "CLASS_METHOD",
            NodeKind::ClassProperty { .. } => "CLASS_PROPERTY",
            NodeKind::ClassAccessor { .. } => "CLASS_ACCESSOR",
            NodeKind::StaticBlock { .. } => "CLASS_STATIC_BLOCK",
            NodeKind::ImportDeclaration { .. } => "IMPORT_DECLARATION",
            NodeKind::ImportSpecifier { .. } => "IMPORT_SPECIFIER",
            NodeKind::ImportDefault { .. } => "IMPORT_DEFAULT",
            NodeKind::ImportNamespace { .. } => "IMPORT_NAMESPACE",
            NodeKind::ImportAttribute { .. } => "IMPORT_ATTRIBUTE",
            NodeKind::ExportDeclaration { .. } => "EXPORT_DECLARATION",
            NodeKind::ExportDefault { .. } => "EXPORT_DEFAULT",
            NodeKind::ExportSpecifier { .. } => "EXPORT_SPECIFIER",
            NodeKind::ExportNamespace { .. } => "EXPORT_NAMESPACE",
            NodeKind::FunctionArgument { .. } => "DECLARATION_FUNCTION_ARGUMENT",
            NodeKind::ArrowFunction { .. } => "DECLARATION_ARROW_FUNCTION",
            NodeKind::Function { .. } => "DECLARATION_FUNCTION",
            NodeKind::FunctionBody { .. } => "DECLARATION_FUNCTION_BODY",
            NodeKind::ObjectLiteral { .. } => "DECLARATION_OBJECT",
            NodeKind::ArrayLiteral { .. } => "DECLARATION_ARRAY",
            NodeKind::Class { .. } => "DECLARATION_CLASS",
        }
    }

    /// True for terminal error nodes.
    pub fn is_error(&self) -> bool {
        matches!(self, NodeKind::Error { .. })
    }

    /// The captured-variable set of function-like and class nodes.
    pub fn closure(&self) -> Option<&BTreeSet<String>> {
        match self {
            NodeKind::ObjectMethod { closure, .. }
            | NodeKind::ObjectAccessor { closure, .. }
            | NodeKind::ClassMethod { closure, .. }
            | NodeKind::ClassAccessor { closure, .. }
            | NodeKind::StaticBlock { closure, .. }
            | NodeKind::ArrowFunction { closure, .. }
            | NodeKind::Function { closure, .. }
            | NodeKind::Class { closure, .. } => Some(closure),
            _ => None,
        }
    }

    /// Mutable access to the captured-variable set.
    pub fn closure_mut(&mut self) -> Option<&mut BTreeSet<String>> {
        match self {
            NodeKind::ObjectMethod { closure, .. }
            | NodeKind::ObjectAccessor { closure, .. }
            | NodeKind::ClassMethod { closure, .. }
            | NodeKind::ClassAccessor { closure, .. }
            | NodeKind::StaticBlock { closure, .. }
            | NodeKind::ArrowFunction { closure, .. }
            | NodeKind::Function { closure, .. }
            | NodeKind::Class { closure, .. } => Some(closure),
            _ => None,
        }
    }

    /// Child node ids in source order.
    pub fn children(&self) -> Vec<NodeId> {
        fn push(out: &mut Vec<NodeId>, id: &Option<NodeId>) {
            if let Some(id) = id {
                out.push(*id);
            }
        }
        let mut out = Vec::new();
        match self {
            NodeKind::Error { .. }
            | NodeKind::Token
            | NodeKind::PrivateName
            | NodeKind::RegexLiteral
            | NodeKind::NullLiteral
            | NodeKind::StringLiteral
            | NodeKind::BooleanLiteral
            | NodeKind::NumberLiteral
            | NodeKind::Comment
            | NodeKind::MultilineComment
            | NodeKind::UndefinedLiteral
            | NodeKind::Identifier
            | NodeKind::BigintLiteral
            | NodeKind::ThisLiteral
            | NodeKind::SuperLiteral
            | NodeKind::EmptyStatement
            | NodeKind::DebuggerStatement
            | NodeKind::Directive
            | NodeKind::InterpreterDirective => {}
            NodeKind::TemplateLiteral {
                tag,
                quasis,
                expressions,
            } => {
                push(&mut out, tag);
                out.extend(quasis);
                out.extend(expressions);
            }
            NodeKind::Program {
                interpreter,
                directives,
                statements,
            } => {
                push(&mut out, interpreter);
                out.extend(directives);
                out.extend(statements);
            }
            NodeKind::BlockStatement { statements } => out.extend(statements),
            NodeKind::ReturnStatement { value } => push(&mut out, value),
            NodeKind::LabelStatement { label, statement } => {
                out.push(*label);
                out.push(*statement);
            }
            NodeKind::BreakStatement { label } | NodeKind::ContinueStatement { label } => {
                push(&mut out, label)
            }
            NodeKind::IfStatement {
                condition,
                consequent,
                alternate,
            } => {
                out.push(*condition);
                out.push(*consequent);
                push(&mut out, alternate);
            }
            NodeKind::SwitchStatement { condition, cases } => {
                out.push(*condition);
                out.extend(cases);
            }
            NodeKind::SwitchCase {
                matcher,
                statements,
            } => {
                push(&mut out, matcher);
                out.extend(statements);
            }
            NodeKind::ThrowStatement { value } => out.push(*value),
            NodeKind::TryStatement {
                body,
                on_error,
                on_finish,
            } => {
                out.push(*body);
                push(&mut out, on_error);
                push(&mut out, on_finish);
            }
            NodeKind::TryCatchStatement { identifier, body } => {
                push(&mut out, identifier);
                out.push(*body);
            }
            NodeKind::WhileStatement { condition, body } => {
                out.push(*condition);
                out.push(*body);
            }
            NodeKind::DoWhileStatement { body, condition } => {
                out.push(*body);
                out.push(*condition);
            }
            NodeKind::ForStatement {
                init,
                condition,
                update,
                body,
            } => {
                push(&mut out, init);
                push(&mut out, condition);
                push(&mut out, update);
                out.push(*body);
            }
            NodeKind::ForInStatement { left, right, body }
            | NodeKind::ForOfStatement { left, right, body }
            | NodeKind::ForAwaitOfStatement { left, right, body } => {
                out.push(*left);
                out.push(*right);
                out.push(*body);
            }
            NodeKind::ExpressionStatement { expression } => out.push(*expression),
            NodeKind::VariableDeclaration { declarations, .. } => out.extend(declarations),
            NodeKind::VariableDeclarator {
                identifier,
                initializer,
            } => {
                out.push(*identifier);
                push(&mut out, initializer);
            }
            NodeKind::Decorator { expression } => out.push(*expression),
            NodeKind::ObjectProperty { key, value, .. } => {
                out.push(*key);
                push(&mut out, value);
            }
            NodeKind::ObjectMethod {
                identifier,
                arguments,
                body,
                ..
            } => {
                out.push(*identifier);
                out.extend(arguments);
                out.push(*body);
            }
            NodeKind::ObjectAccessor {
                identifier,
                arguments,
                body,
                ..
            } => {
                out.push(*identifier);
                out.extend(arguments);
                out.push(*body);
            }
            NodeKind::BinaryExpression {
                left,
                operator,
                right,
            } => {
                push(&mut out, left);
                out.push(*operator);
                push(&mut out, right);
            }
            NodeKind::MemberExpression { host, field }
            | NodeKind::OptionalMemberExpression { host, field }
            | NodeKind::ComputedMemberExpression { host, field }
            | NodeKind::OptionalComputedMemberExpression { host, field } => {
                out.push(*host);
                out.push(*field);
            }
            NodeKind::ConditionExpression {
                condition,
                consequent,
                alternate,
            } => {
                out.push(*condition);
                out.push(*consequent);
                out.push(*alternate);
            }
            NodeKind::CallExpression { callee, arguments }
            | NodeKind::OptionalCallExpression { callee, arguments }
            | NodeKind::NewExpression { callee, arguments } => {
                out.push(*callee);
                out.extend(arguments);
            }
            NodeKind::DeleteExpression { value }
            | NodeKind::AwaitExpression { value }
            | NodeKind::YieldDelegateExpression { value }
            | NodeKind::VoidExpression { value }
            | NodeKind::TypeofExpression { value }
            | NodeKind::SpreadExpression { value }
            | NodeKind::SpreadPatternItem { value } => out.push(*value),
            NodeKind::YieldExpression { value } => push(&mut out, value),
            NodeKind::GroupExpression { expression } => out.push(*expression),
            NodeKind::AssignmentExpression {
                left,
                operator,
                right,
            } => {
                out.push(*left);
                out.push(*operator);
                out.push(*right);
            }
            NodeKind::ObjectPattern { items } | NodeKind::ArrayPattern { items } => {
                out.extend(items)
            }
            NodeKind::ObjectPatternItem {
                key, alias, value, ..
            } => {
                out.push(*key);
                push(&mut out, alias);
                push(&mut out, value);
            }
            NodeKind::ArrayPatternItem { alias, value } => {
                push(&mut out, alias);
                push(&mut out, value);
            }
            NodeKind::ClassMethod {
                identifier,
                arguments,
                body,
                ..
            } => {
                out.push(*identifier);
                out.extend(arguments);
                out.push(*body);
            }
            NodeKind::ClassProperty {
                identifier, value, ..
            } => {
                out.push(*identifier);
                push(&mut out, value);
            }
            NodeKind::ClassAccessor {
                identifier,
                arguments,
                body,
                ..
            } => {
                out.push(*identifier);
                out.extend(arguments);
                out.push(*body);
            }
            NodeKind::StaticBlock { statement, .. } => out.push(*statement),
            NodeKind::ImportDeclaration {
                specifiers,
                source,
                attributes,
            } => {
                out.extend(specifiers);
                out.push(*source);
                out.extend(attributes);
            }
            NodeKind::ImportSpecifier { identifier, alias } => {
                out.push(*identifier);
                push(&mut out, alias);
            }
            NodeKind::ImportDefault { identifier } => out.push(*identifier),
            NodeKind::ImportNamespace { alias } => out.push(*alias),
            NodeKind::ImportAttribute { key, value } => {
                out.push(*key);
                out.push(*value);
            }
            NodeKind::ExportDeclaration { specifiers, source } => {
                out.extend(specifiers);
                push(&mut out, source);
            }
            NodeKind::ExportDefault { expression } => out.push(*expression),
            NodeKind::ExportSpecifier { identifier, alias } => {
                out.push(*identifier);
                push(&mut out, alias);
            }
            NodeKind::ExportNamespace { alias } => push(&mut out, alias),
            NodeKind::FunctionArgument { identifier, value } => {
                out.push(*identifier);
                push(&mut out, value);
            }
            NodeKind::ArrowFunction {
                arguments, body, ..
            } => {
                out.extend(arguments);
                out.push(*body);
            }
            NodeKind::Function {
                identifier,
                arguments,
                body,
                ..
            } => {
                push(&mut out, identifier);
                out.extend(arguments);
                out.push(*body);
            }
            NodeKind::FunctionBody {
                directives,
                statements,
            } => {
                out.extend(directives);
                out.extend(statements);
            }
            NodeKind::ObjectLiteral { properties } => out.extend(properties),
            NodeKind::ArrayLiteral { items } => out.extend(items),
            NodeKind::Class {
                identifier,
                extends,
                properties,
                decorators,
                ..
            } => {
                out.extend(decorators);
                push(&mut out, identifier);
                push(&mut out, extends);
                out.extend(properties);
            }
        }
        out
    }
}

/// One syntax node.
#[derive(Debug, Clone, PartialEq)]
pub struct Node {
    /// Kind tag and payload
    pub kind: NodeKind,
    /// Covered source region
    pub span: SourceSpan,
    /// Parent node, plain back-reference
    pub parent: Option<NodeId>,
    /// Comments attached to this node
    pub comments: Vec<NodeId>,
    /// Scope record owned by this node
    pub scope: Option<ScopeId>,
}

impl Node {
    /// Create a node with no parent, comments or scope.
    pub fn new(kind: NodeKind, span: SourceSpan) -> Self {
        Self {
            kind,
            span,
            parent: None,
            comments: Vec::new(),
            scope: None,
        }
    }
}

/// Arena allocator for syntax nodes.
///
/// Slots are never reused within one tree; disposal clears the slot and
/// decrements the live counter, so a balance check is a comparison of
/// counters.
#[derive(Debug, Default)]
pub struct NodeArena {
    slots: Vec<Option<Node>>,
    live: usize,
}

impl NodeArena {
    /// Create an empty arena.
    pub fn new() -> Self {
        Self::default()
    }

    /// Allocate a node, returning its id.
    pub fn alloc(&mut self, node: Node) -> NodeId {
        let id = NodeId(self.slots.len() as u32);
        self.slots.push(Some(node));
        self.live += 1;
        id
    }

    /// Borrow a live node, None if the id was disposed.
    pub fn get(&self, id: NodeId) -> Option<&Node> {
        self.slots.get(id.0 as usize).and_then(|slot| slot.as_ref())
    }

    /// Borrow a live node.
    ///
    /// # Panics
    ///
    /// Panics on a disposed id; referencing freed nodes is a parser bug.
    pub fn node(&self, id: NodeId) -> &Node {
        self.get(id).expect("node disposed")
    }

    /// Mutably borrow a live node.
    ///
    /// # Panics
    ///
    /// Panics on a disposed id.
    pub fn node_mut(&mut self, id: NodeId) -> &mut Node {
        self.slots
            .get_mut(id.0 as usize)
            .and_then(|slot| slot.as_mut())
            .expect("node disposed")
    }

    /// Dispose a node and its entire subtree, comments included.
    ///
    /// # Panics
    ///
    /// Panics on a double free.
    pub fn dispose(&mut self, id: NodeId) {
        let node = self.slots[id.0 as usize].take().expect("node double free");
        self.live -= 1;
        for child in node.kind.children() {
            self.dispose(child);
        }
        for comment in node.comments {
            self.dispose(comment);
        }
    }

    /// Number of live nodes.
    pub fn live(&self) -> usize {
        self.live
    }

    /// Total allocations made through this arena.
    pub fn total_allocated(&self) -> usize {
        self.slots.len()
    }
}

/// Render a subtree as JSON for debugging and tooling.
pub fn to_json(arena: &NodeArena, id: NodeId, source: &str) -> serde_json::Value {
    let node = arena.node(id);
    let children: Vec<serde_json::Value> = node
        .kind
        .children()
        .into_iter()
        .map(|child| to_json(arena, child, source))
        .collect();
    let mut object = serde_json::Map::new();
    object.insert("type".to_string(), node.kind.name().into());
    object.insert("source".to_string(), node.span.slice(source).into());
    if let NodeKind::Error { message } = &node.kind {
        object.insert("message".to_string(), message.as_str().into());
    }
    if !children.is_empty() {
        object.insert("children".to_string(), children.into());
    }
    serde_json::Value::Object(object)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn leaf(arena: &mut NodeArena, kind: NodeKind) -> NodeId {
        arena.alloc(Node::new(kind, SourceSpan::default()))
    }

    #[test]
    fn test_alloc_and_dispose_balance() {
        let mut arena = NodeArena::new();
        let a = leaf(&mut arena, NodeKind::NumberLiteral);
        let op = leaf(&mut arena, NodeKind::Token);
        let b = leaf(&mut arena, NodeKind::NumberLiteral);
        let expr = arena.alloc(Node::new(
            NodeKind::BinaryExpression {
                left: Some(a),
                operator: op,
                right: Some(b),
            },
            SourceSpan::default(),
        ));
        assert_eq!(arena.live(), 4);
        arena.dispose(expr);
        assert_eq!(arena.live(), 0);
        assert!(arena.get(a).is_none());
        assert!(arena.get(expr).is_none());
    }

    #[test]
    #[should_panic]
    fn test_double_dispose_panics() {
        let mut arena = NodeArena::new();
        let id = leaf(&mut arena, NodeKind::NullLiteral);
        arena.dispose(id);
        arena.dispose(id);
    }

    #[test]
    fn test_dispose_covers_comments() {
        let mut arena = NodeArena::new();
        let comment = leaf(&mut arena, NodeKind::Comment);
        let stmt = leaf(&mut arena, NodeKind::EmptyStatement);
        arena.node_mut(stmt).comments.push(comment);
        arena.dispose(stmt);
        assert_eq!(arena.live(), 0);
    }

    #[test]
    fn test_children_order_matches_source_order() {
        let mut arena = NodeArena::new();
        let cond = leaf(&mut arena, NodeKind::Identifier);
        let cons = leaf(&mut arena, NodeKind::EmptyStatement);
        let alt = leaf(&mut arena, NodeKind::EmptyStatement);
        let kind = NodeKind::IfStatement {
            condition: cond,
            consequent: cons,
            alternate: Some(alt),
        };
        assert_eq!(kind.children(), vec![cond, cons, alt]);
    }

    #[test]
    fn test_to_json_carries_kind_and_source() {
        let mut arena = NodeArena::new();
        let source = "x";
        let mut node = Node::new(NodeKind::Identifier, SourceSpan::default());
        node.span.end.offset = 1;
        let id = arena.alloc(node);
        let json = to_json(&arena, id, source);
        assert_eq!(json["type"], "LITERAL_IDENTITY");
        assert_eq!(json["source"], "x");
    }
}
