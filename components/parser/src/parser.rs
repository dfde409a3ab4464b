//! Scannerless recursive descent parser.
//!
//! Tokenization is hand-rolled: productions read characters straight off
//! the source buffer, so every node's span re-slices the original text and
//! no separate token stream exists. Productions return `Ok(None)` when the
//! input does not start their construct, `Ok(Some(id))` on success, and
//! `Err(error_node)` on a malformed construct; a failed production disposes
//! its partially built subtree before propagating, so no partial tree
//! survives an error.

use crate::ast::{to_json, AccessorKind, Node, NodeArena, NodeId, NodeKind};
use crate::error::UNEXPECTED_TOKEN;
use crate::scope::{
    resolve_closures, Declaration, DeclarationKind, Scope, ScopeArena, ScopeId, ScopeKind,
};
use core_types::{ErrorKind, ScriptError, SourcePosition, SourceSpan};
use std::collections::BTreeSet;

/// What kind of compilation unit is being parsed.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EvalMode {
    /// A whole program; `#!` interpreter directives are allowed
    Program,
    /// Source for a dynamically built function body
    Function,
}

/// A parsed tree: the node arena, the scope records, and the root id.
///
/// The root may be an error node; callers must check before traversing.
#[derive(Debug)]
pub struct Ast {
    /// Node storage
    pub arena: NodeArena,
    /// Scope records built during the parse
    pub scopes: ScopeArena,
    /// Program root or terminal error node
    pub root: NodeId,
}

impl Ast {
    /// True when parsing failed and the root is an error node.
    pub fn is_error(&self) -> bool {
        self.arena.node(self.root).kind.is_error()
    }

    /// The terminal error as a [`ScriptError`], if parsing failed.
    pub fn error(&self) -> Option<ScriptError> {
        let node = self.arena.node(self.root);
        match &node.kind {
            NodeKind::Error { message } => Some(
                ScriptError::new(ErrorKind::SyntaxError, message.clone()).with_span(node.span),
            ),
            _ => None,
        }
    }

    /// Borrow a node by id.
    pub fn node(&self, id: NodeId) -> &Node {
        self.arena.node(id)
    }

    /// Render the tree as JSON for debugging.
    pub fn to_json(&self, source: &str) -> serde_json::Value {
        to_json(&self.arena, self.root, source)
    }
}

/// Parse source text into a tree and run closure resolution on it.
pub fn parse(source: &str, mode: EvalMode) -> Ast {
    let mut parser = Parser::new(mode);
    let mut position = SourcePosition::default();
    let root = match parser.read_program(source, &mut position) {
        Ok(root) => root,
        Err(error) => error,
    };
    let Parser { arena, scopes, .. } = parser;
    let mut ast = Ast { arena, scopes, root };
    if !ast.is_error() {
        resolve_closures(&mut ast.arena, &mut ast.scopes, root);
    }
    ast
}

type ReadResult = Result<Option<NodeId>, NodeId>;

// Longest match wins; every multi-character operator sorts before its
// prefixes.
const SYMBOLS: &[&str] = &[
    ">>>=", "...", "<<=", ">>>", "===", "!==", "**=", ">>=", "&&=", "||=", "??=", "**", "==",
    "!=", "<<", ">>", "<=", ">=", "&&", "||", "??", "++", "--", "+=", "-=", "*=", "/=", "%=",
    "&=", "^=", "|=", "=>", "?.", "=", "*", "/", "%", "+", "-", "<", ">", "&", "^", "|", ",",
    "!", "~", "(", ")", "[", "]", "{", "}", "@", "#", ".", "?", ":", ";",
];

const KEYWORDS: &[&str] = &[
    "break", "case", "catch", "class", "const", "continue", "debugger", "default", "delete",
    "do", "else", "export", "extends", "false", "finally", "for", "function", "if", "import",
    "in", "instanceof", "new", "null", "return", "super", "switch", "this", "throw", "true",
    "try", "typeof", "var", "void", "while", "with", "let", "static",
];

const ASSIGNMENT_OPERATORS: &[&str] = &[
    "=", "+=", "-=", "**=", "*=", "/=", "%=", "<<=", ">>=", ">>>=", "&=", "|=", "^=", "&&=",
    "||=", "??=",
];

fn is_line_terminator(ch: char) -> bool {
    matches!(ch, '\n' | '\r' | '\u{2028}' | '\u{2029}')
}

fn is_white_space(ch: char) -> bool {
    matches!(
        ch,
        '\t' | '\u{b}' | '\u{c}' | ' ' | '\u{a0}' | '\u{feff}'
    )
}

fn is_identifier_start(ch: char) -> bool {
    ch.is_alphabetic() || ch == '_' || ch == '$'
}

fn is_identifier_part(ch: char) -> bool {
    ch.is_alphanumeric() || ch == '_' || ch == '$'
}

fn peek(source: &str, position: &SourcePosition) -> Option<char> {
    source[position.offset..].chars().next()
}

fn advance(source: &str, position: &mut SourcePosition) {
    if let Some(ch) = peek(source, position) {
        position.offset += ch.len_utf8();
        if is_line_terminator(ch) && ch != '\r' {
            position.line += 1;
            position.column = 0;
        } else {
            position.column += 1;
        }
    }
}

fn is_keyword(text: &str) -> bool {
    KEYWORDS.contains(&text)
}

/// The recursive descent parser.
///
/// Owns the node and scope arenas while parsing; [`parse`] moves them into
/// the returned [`Ast`].
pub struct Parser {
    arena: NodeArena,
    scopes: ScopeArena,
    scope_stack: Vec<ScopeId>,
    mode: EvalMode,
}

impl Parser {
    /// Create a parser for the given mode.
    pub fn new(mode: EvalMode) -> Self {
        Self {
            arena: NodeArena::new(),
            scopes: ScopeArena::new(),
            scope_stack: Vec::new(),
            mode,
        }
    }

    fn push_scope(&mut self, kind: ScopeKind) -> ScopeId {
        let id = self.scopes.alloc(Scope {
            kind,
            parent: self.scope_stack.last().copied(),
            node: NodeId(u32::MAX),
            declarations: Vec::new(),
            refs: BTreeSet::new(),
        });
        self.scope_stack.push(id);
        id
    }

    fn pop_scope(&mut self) {
        self.scope_stack.pop();
    }

    fn current_scope(&self) -> ScopeId {
        *self.scope_stack.last().expect("no scope pushed")
    }

    fn attach_scope(&mut self, scope: ScopeId, node: NodeId) {
        self.scopes.scope_mut(scope).node = node;
        self.arena.node_mut(node).scope = Some(scope);
    }

    fn record_ref(&mut self, source: &str, span: SourceSpan) {
        let name = span.slice(source).to_string();
        let scope = self.current_scope();
        self.scopes.scope_mut(scope).refs.insert(name);
    }

    fn error(&mut self, message: impl Into<String>, at: SourcePosition) -> NodeId {
        self.arena.alloc(Node::new(
            NodeKind::Error {
                message: message.into(),
            },
            SourceSpan::point(at),
        ))
    }

    fn unexpected(&mut self, at: SourcePosition) -> NodeId {
        self.error(UNEXPECTED_TOKEN, at)
    }

    fn fail(&mut self, owned: Vec<NodeId>, comments: Vec<NodeId>, error: NodeId) -> NodeId {
        for id in owned {
            self.arena.dispose(id);
        }
        for id in comments {
            self.arena.dispose(id);
        }
        error
    }

    fn give_up(&mut self, owned: Vec<NodeId>, comments: Vec<NodeId>) {
        for id in owned {
            self.arena.dispose(id);
        }
        for id in comments {
            self.arena.dispose(id);
        }
    }

    fn finish(
        &mut self,
        kind: NodeKind,
        start: SourcePosition,
        end: SourcePosition,
        comments: Vec<NodeId>,
    ) -> NodeId {
        let id = self.arena.alloc(Node::new(kind, SourceSpan::new(start, end)));
        for child in self.arena.node(id).kind.children() {
            self.arena.node_mut(child).parent = Some(id);
        }
        self.arena.node_mut(id).comments = comments;
        id
    }

    fn leaf(&mut self, kind: NodeKind, start: SourcePosition, end: SourcePosition) -> NodeId {
        self.arena
            .alloc(Node::new(kind, SourceSpan::new(start, end)))
    }

    fn token(&mut self, span: SourceSpan) -> NodeId {
        self.arena.alloc(Node::new(NodeKind::Token, span))
    }

    // ---- low level scanning -------------------------------------------------

    fn scan_symbol(source: &str, cursor: &mut SourcePosition) -> Option<SourceSpan> {
        for symbol in SYMBOLS {
            if source[cursor.offset..].starts_with(symbol) {
                let start = *cursor;
                for _ in 0..symbol.chars().count() {
                    advance(source, cursor);
                }
                return Some(SourceSpan::new(start, *cursor));
            }
        }
        None
    }

    fn scan_identifier(source: &str, cursor: &mut SourcePosition) -> Option<SourceSpan> {
        let first = peek(source, cursor)?;
        if !is_identifier_start(first) {
            return None;
        }
        let start = *cursor;
        advance(source, cursor);
        while let Some(ch) = peek(source, cursor) {
            if !is_identifier_part(ch) {
                break;
            }
            advance(source, cursor);
        }
        Some(SourceSpan::new(start, *cursor))
    }

    fn check_symbol(
        &mut self,
        options: &[&str],
        source: &str,
        cursor: &mut SourcePosition,
    ) -> Option<SourceSpan> {
        let mut probe = *cursor;
        let span = Self::scan_symbol(source, &mut probe)?;
        let text = span.slice(source);
        if options.contains(&text) {
            *cursor = probe;
            return Some(span);
        }
        None
    }

    fn check_identifier(
        &mut self,
        options: &[&str],
        source: &str,
        cursor: &mut SourcePosition,
    ) -> Option<SourceSpan> {
        let mut probe = *cursor;
        let span = Self::scan_identifier(source, &mut probe)?;
        let text = span.slice(source);
        if options.contains(&text) {
            *cursor = probe;
            return Some(span);
        }
        None
    }

    // ---- trivia -------------------------------------------------------------

    fn read_comment(
        &mut self,
        source: &str,
        cursor: &mut SourcePosition,
        newline: &mut bool,
    ) -> ReadResult {
        if !source[cursor.offset..].starts_with('/') {
            return Ok(None);
        }
        let start = *cursor;
        if source[cursor.offset..].starts_with("//") {
            while let Some(ch) = peek(source, cursor) {
                if is_line_terminator(ch) {
                    break;
                }
                advance(source, cursor);
            }
            return Ok(Some(self.leaf(NodeKind::Comment, start, *cursor)));
        }
        if source[cursor.offset..].starts_with("/*") {
            advance(source, cursor);
            advance(source, cursor);
            loop {
                if source[cursor.offset..].starts_with("*/") {
                    advance(source, cursor);
                    advance(source, cursor);
                    break;
                }
                let Some(ch) = peek(source, cursor) else {
                    return Err(self.unexpected(*cursor));
                };
                if is_line_terminator(ch) {
                    *newline = true;
                }
                advance(source, cursor);
            }
            return Ok(Some(self.leaf(NodeKind::MultilineComment, start, *cursor)));
        }
        Ok(None)
    }

    /// Skip whitespace, line terminators and comments, attaching comment
    /// nodes to `comments`. Returns whether a line break was crossed. With
    /// `stop_at_newline`, consumption stops right after the first line
    /// break so statement termination can see it.
    fn skip_trivia(
        &mut self,
        source: &str,
        cursor: &mut SourcePosition,
        comments: &mut Vec<NodeId>,
        stop_at_newline: bool,
    ) -> Result<bool, NodeId> {
        let mut newline = false;
        loop {
            let Some(ch) = peek(source, cursor) else {
                break;
            };
            if is_white_space(ch) {
                advance(source, cursor);
                continue;
            }
            if is_line_terminator(ch) {
                advance(source, cursor);
                newline = true;
                if stop_at_newline {
                    break;
                }
                continue;
            }
            let mut comment_newline = false;
            match self.read_comment(source, cursor, &mut comment_newline)? {
                Some(comment) => {
                    comments.push(comment);
                    newline |= comment_newline;
                    if stop_at_newline && newline {
                        break;
                    }
                }
                None => break,
            }
        }
        Ok(newline)
    }

    fn trivia(
        &mut self,
        source: &str,
        cursor: &mut SourcePosition,
        comments: &mut Vec<NodeId>,
    ) -> Result<bool, NodeId> {
        self.skip_trivia(source, cursor, comments, false)
    }

    /// Speculative trivia skip for lookahead probes; a trivia-level error
    /// just means the probe fails.
    fn probe_trivia(
        &mut self,
        source: &str,
        cursor: &mut SourcePosition,
        comments: &mut Vec<NodeId>,
    ) -> bool {
        match self.skip_trivia(source, cursor, comments, false) {
            Ok(_) => true,
            Err(error) => {
                self.arena.dispose(error);
                false
            }
        }
    }

    /// Accept a statement terminator: an explicit `;` (consumed), a line
    /// break, a `}` lookahead, or end of input.
    fn read_statement_end(
        &mut self,
        source: &str,
        cursor: &mut SourcePosition,
        comments: &mut Vec<NodeId>,
    ) -> Result<bool, NodeId> {
        let newline = self.skip_trivia(source, cursor, comments, true)?;
        if self.check_symbol(&[";"], source, cursor).is_some() {
            return Ok(true);
        }
        if newline {
            return Ok(true);
        }
        if peek(source, cursor).is_none() {
            return Ok(true);
        }
        let mut probe = *cursor;
        if self.check_symbol(&["}"], source, &mut probe).is_some() {
            return Ok(true);
        }
        Ok(false)
    }

    // ---- declaration bookkeeping --------------------------------------------

    fn resolve_declarator(
        &mut self,
        kind: DeclarationKind,
        source: &str,
        identifier: NodeId,
        declaration: NodeId,
    ) -> Result<(), NodeId> {
        match self.arena.node(identifier).kind.clone() {
            NodeKind::Identifier => {
                let name = self.arena.node(identifier).span.slice(source).to_string();
                let mut scope = self.current_scope();
                if kind == DeclarationKind::Var {
                    while self.scopes.scope(scope).kind == ScopeKind::Block {
                        scope = self.scopes.scope(scope).parent.expect("missing lex scope");
                    }
                }
                self.scopes.scope_mut(scope).declarations.push(Declaration {
                    kind,
                    node: declaration,
                    name,
                });
                Ok(())
            }
            NodeKind::SpreadPatternItem { value } => {
                self.resolve_declarator(kind, source, value, declaration)
            }
            NodeKind::ArrayPattern { items } => {
                for item in items {
                    if let NodeKind::ArrayPatternItem {
                        alias: Some(alias), ..
                    } = self.arena.node(item).kind
                    {
                        self.resolve_declarator(kind, source, alias, declaration)?;
                    }
                }
                Ok(())
            }
            NodeKind::ObjectPattern { items } => {
                for item in items {
                    if let NodeKind::ObjectPatternItem { key, alias, .. } =
                        self.arena.node(item).kind
                    {
                        let target = alias.unwrap_or(key);
                        self.resolve_declarator(kind, source, target, declaration)?;
                    }
                }
                Ok(())
            }
            _ => {
                let at = self.arena.node(identifier).span.start;
                let text = self.arena.node(identifier).span.slice(source).to_string();
                Err(self.error(
                    format!("Invalid declaration identifier '{}'", text),
                    at,
                ))
            }
        }
    }

    fn declare_variable(
        &mut self,
        kind: DeclarationKind,
        source: &str,
        declaration: NodeId,
    ) -> Result<(), NodeId> {
        match self.arena.node(declaration).kind.clone() {
            NodeKind::VariableDeclarator { identifier, .. }
            | NodeKind::FunctionArgument { identifier, .. }
            | NodeKind::ImportDefault { identifier } => {
                self.resolve_declarator(kind, source, identifier, declaration)
            }
            NodeKind::Function {
                identifier: Some(identifier),
                ..
            }
            | NodeKind::Class {
                identifier: Some(identifier),
                ..
            } => self.resolve_declarator(kind, source, identifier, declaration),
            NodeKind::ImportNamespace { alias } => {
                self.resolve_declarator(kind, source, alias, declaration)
            }
            NodeKind::ImportSpecifier { identifier, alias } => {
                let target = alias.unwrap_or(identifier);
                self.resolve_declarator(kind, source, target, declaration)
            }
            _ => Ok(()),
        }
    }

    // ---- literals -----------------------------------------------------------

    fn read_identifier_literal(
        &mut self,
        source: &str,
        cursor: &mut SourcePosition,
    ) -> Option<NodeId> {
        let span = Self::scan_identifier(source, cursor)?;
        Some(self.arena.alloc(Node::new(NodeKind::Identifier, span)))
    }

    fn read_private_name(&mut self, source: &str, cursor: &mut SourcePosition) -> ReadResult {
        if !source[cursor.offset..].starts_with('#') {
            return Ok(None);
        }
        let start = *cursor;
        let mut probe = *cursor;
        advance(source, &mut probe);
        if Self::scan_identifier(source, &mut probe).is_none() {
            return Err(self.unexpected(probe));
        }
        *cursor = probe;
        Ok(Some(self.leaf(NodeKind::PrivateName, start, *cursor)))
    }

    fn read_string_literal(&mut self, source: &str, cursor: &mut SourcePosition) -> ReadResult {
        let Some(quote) = peek(source, cursor) else {
            return Ok(None);
        };
        if quote != '"' && quote != '\'' {
            return Ok(None);
        }
        let start = *cursor;
        advance(source, cursor);
        loop {
            let Some(ch) = peek(source, cursor) else {
                return Err(self.unexpected(*cursor));
            };
            if is_line_terminator(ch) {
                return Err(self.unexpected(*cursor));
            }
            if ch == '\\' {
                advance(source, cursor);
                if peek(source, cursor).is_none() {
                    return Err(self.unexpected(*cursor));
                }
                advance(source, cursor);
                continue;
            }
            advance(source, cursor);
            if ch == quote {
                break;
            }
        }
        Ok(Some(self.leaf(NodeKind::StringLiteral, start, *cursor)))
    }

    fn read_number_literal(&mut self, source: &str, cursor: &mut SourcePosition) -> ReadResult {
        let rest = &source[cursor.offset..];
        let first = match rest.chars().next() {
            Some(ch) => ch,
            None => return Ok(None),
        };
        let second = rest.chars().nth(1);
        if !first.is_ascii_digit() && !(first == '.' && second.map_or(false, |c| c.is_ascii_digit()))
        {
            return Ok(None);
        }
        let start = *cursor;
        if first == '0' && matches!(second, Some('x' | 'X' | 'o' | 'O' | 'b' | 'B')) {
            advance(source, cursor);
            advance(source, cursor);
            let digits = |ch: char| match second {
                Some('x' | 'X') => ch.is_ascii_hexdigit(),
                Some('o' | 'O') => ('0'..='7').contains(&ch),
                _ => ch == '0' || ch == '1',
            };
            if !peek(source, cursor).map_or(false, digits) {
                return Err(self.unexpected(*cursor));
            }
            while peek(source, cursor).map_or(false, digits) {
                advance(source, cursor);
            }
        } else {
            while peek(source, cursor).map_or(false, |c| c.is_ascii_digit()) {
                advance(source, cursor);
            }
            if peek(source, cursor) == Some('.') {
                advance(source, cursor);
                while peek(source, cursor).map_or(false, |c| c.is_ascii_digit()) {
                    advance(source, cursor);
                }
            }
            if matches!(peek(source, cursor), Some('e' | 'E')) {
                advance(source, cursor);
                if matches!(peek(source, cursor), Some('+' | '-')) {
                    advance(source, cursor);
                }
                if !peek(source, cursor).map_or(false, |c| c.is_ascii_digit()) {
                    return Err(self.unexpected(*cursor));
                }
                while peek(source, cursor).map_or(false, |c| c.is_ascii_digit()) {
                    advance(source, cursor);
                }
            }
        }
        if peek(source, cursor) == Some('n') {
            advance(source, cursor);
            return Ok(Some(self.leaf(NodeKind::BigintLiteral, start, *cursor)));
        }
        Ok(Some(self.leaf(NodeKind::NumberLiteral, start, *cursor)))
    }

    fn read_regexp_literal(&mut self, source: &str, cursor: &mut SourcePosition) -> ReadResult {
        if peek(source, cursor) != Some('/') || source[cursor.offset..].starts_with("//") {
            return Ok(None);
        }
        let start = *cursor;
        let mut probe = *cursor;
        advance(source, &mut probe);
        let mut in_class = false;
        loop {
            let Some(ch) = peek(source, &probe) else {
                return Ok(None);
            };
            if is_line_terminator(ch) {
                return Ok(None);
            }
            if ch == '\\' {
                advance(source, &mut probe);
                if peek(source, &probe).is_none() {
                    return Ok(None);
                }
                advance(source, &mut probe);
                continue;
            }
            advance(source, &mut probe);
            match ch {
                '[' => in_class = true,
                ']' => in_class = false,
                '/' if !in_class => break,
                _ => {}
            }
        }
        while peek(source, &probe).map_or(false, is_identifier_part) {
            advance(source, &mut probe);
        }
        *cursor = probe;
        Ok(Some(self.leaf(NodeKind::RegexLiteral, start, *cursor)))
    }

    fn read_keyword_literal(
        &mut self,
        keyword: &str,
        kind: NodeKind,
        source: &str,
        cursor: &mut SourcePosition,
    ) -> Option<NodeId> {
        let span = self.check_identifier(&[keyword], source, cursor)?;
        Some(self.arena.alloc(Node::new(kind, span)))
    }

    fn read_template_literal(
        &mut self,
        source: &str,
        cursor: &mut SourcePosition,
        tag: Option<NodeId>,
    ) -> ReadResult {
        if peek(source, cursor) != Some('`') {
            return Ok(None);
        }
        let start = *cursor;
        let mut current = *cursor;
        advance(source, &mut current);
        let mut quasis = Vec::new();
        let mut expressions = Vec::new();
        let mut comments = Vec::new();
        let mut quasi_start = current;
        loop {
            let Some(ch) = peek(source, &current) else {
                let mut owned = quasis;
                owned.extend(expressions);
                let error = self.unexpected(current);
                return Err(self.fail(owned, comments, error));
            };
            if ch == '`' {
                quasis.push(self.leaf(NodeKind::StringLiteral, quasi_start, current));
                advance(source, &mut current);
                break;
            }
            if ch == '\\' {
                advance(source, &mut current);
                if peek(source, &current).is_some() {
                    advance(source, &mut current);
                }
                continue;
            }
            if source[current.offset..].starts_with("${") {
                quasis.push(self.leaf(NodeKind::StringLiteral, quasi_start, current));
                advance(source, &mut current);
                advance(source, &mut current);
                let expression = match self.read_expression(source, &mut current) {
                    Ok(Some(id)) => id,
                    Ok(None) => {
                        let mut owned = quasis;
                        owned.extend(expressions);
                        let error = self.unexpected(current);
                        return Err(self.fail(owned, comments, error));
                    }
                    Err(error) => {
                        let mut owned = quasis;
                        owned.extend(expressions);
                        return Err(self.fail(owned, comments, error));
                    }
                };
                expressions.push(expression);
                if let Err(error) = self.trivia(source, &mut current, &mut comments) {
                    let mut owned = quasis;
                    owned.extend(expressions);
                    return Err(self.fail(owned, comments, error));
                }
                if peek(source, &current) != Some('}') {
                    let mut owned = quasis;
                    owned.extend(expressions);
                    let error = self.unexpected(current);
                    return Err(self.fail(owned, comments, error));
                }
                advance(source, &mut current);
                quasi_start = current;
                continue;
            }
            advance(source, &mut current);
        }
        *cursor = current;
        Ok(Some(self.finish(
            NodeKind::TemplateLiteral {
                tag,
                quasis,
                expressions,
            },
            tag.map_or(start, |id| self.arena.node(id).span.start),
            current,
            comments,
        )))
    }

    // ---- patterns -----------------------------------------------------------

    fn read_spread_pattern(&mut self, source: &str, cursor: &mut SourcePosition) -> ReadResult {
        let start = *cursor;
        let mut current = *cursor;
        if self.check_symbol(&["..."], source, &mut current).is_none() {
            return Ok(None);
        }
        let mut comments = Vec::new();
        if let Err(error) = self.trivia(source, &mut current, &mut comments) {
            return Err(self.fail(vec![], comments, error));
        }
        let value = match self.read_pattern(source, &mut current) {
            Ok(Some(id)) => id,
            Ok(None) => {
                let error = self.unexpected(current);
                return Err(self.fail(vec![], comments, error));
            }
            Err(error) => return Err(self.fail(vec![], comments, error)),
        };
        *cursor = current;
        Ok(Some(self.finish(
            NodeKind::SpreadPatternItem { value },
            start,
            current,
            comments,
        )))
    }

    fn read_object_pattern_item(
        &mut self,
        source: &str,
        cursor: &mut SourcePosition,
    ) -> ReadResult {
        let start = *cursor;
        let mut current = *cursor;
        let mut comments = Vec::new();
        let mut owned: Vec<NodeId> = Vec::new();
        let mut computed = false;
        let key = if let Some(spread) = self.read_spread_pattern(source, &mut current)? {
            spread
        } else if self.check_symbol(&["["], source, &mut current).is_some() {
            computed = true;
            if let Err(error) = self.trivia(source, &mut current, &mut comments) {
                return Err(self.fail(owned, comments, error));
            }
            let key = match self.read_expression2(source, &mut current) {
                Ok(Some(id)) => id,
                Ok(None) => {
                    let error = self.unexpected(current);
                    return Err(self.fail(owned, comments, error));
                }
                Err(error) => return Err(self.fail(owned, comments, error)),
            };
            owned.push(key);
            if let Err(error) = self.trivia(source, &mut current, &mut comments) {
                return Err(self.fail(owned, comments, error));
            }
            if self.check_symbol(&["]"], source, &mut current).is_none() {
                let error = self.unexpected(current);
                return Err(self.fail(owned, comments, error));
            }
            owned.pop();
            key
        } else if let Some(string) = self.read_string_literal(source, &mut current)? {
            string
        } else if let Some(number) = self.read_number_literal(source, &mut current)? {
            number
        } else if let Some(identifier) = self.read_identifier_literal(source, &mut current) {
            identifier
        } else {
            self.give_up(owned, comments);
            return Ok(None);
        };
        owned.push(key);
        if let Err(error) = self.trivia(source, &mut current, &mut comments) {
            return Err(self.fail(owned, comments, error));
        }
        let mut alias = None;
        if self.check_symbol(&[":"], source, &mut current).is_some() {
            if let Err(error) = self.trivia(source, &mut current, &mut comments) {
                return Err(self.fail(owned, comments, error));
            }
            let target = match self.read_part_pattern(source, &mut current) {
                Ok(Some(id)) => id,
                Ok(None) => {
                    let error = self.unexpected(current);
                    return Err(self.fail(owned, comments, error));
                }
                Err(error) => return Err(self.fail(owned, comments, error)),
            };
            owned.push(target);
            alias = Some(target);
        }
        if let Err(error) = self.trivia(source, &mut current, &mut comments) {
            return Err(self.fail(owned, comments, error));
        }
        let mut value = None;
        if self.check_symbol(&["="], source, &mut current).is_some() {
            if let Err(error) = self.trivia(source, &mut current, &mut comments) {
                return Err(self.fail(owned, comments, error));
            }
            let default = match self.read_expression2(source, &mut current) {
                Ok(Some(id)) => id,
                Ok(None) => {
                    let error = self.unexpected(current);
                    return Err(self.fail(owned, comments, error));
                }
                Err(error) => return Err(self.fail(owned, comments, error)),
            };
            owned.push(default);
            value = Some(default);
        }
        *cursor = current;
        Ok(Some(self.finish(
            NodeKind::ObjectPatternItem {
                key,
                alias,
                value,
                computed,
            },
            start,
            current,
            comments,
        )))
    }

    fn read_object_pattern(&mut self, source: &str, cursor: &mut SourcePosition) -> ReadResult {
        let start = *cursor;
        let mut current = *cursor;
        if self.check_symbol(&["{"], source, &mut current).is_none() {
            return Ok(None);
        }
        let mut comments = Vec::new();
        let mut items = Vec::new();
        loop {
            if let Err(error) = self.trivia(source, &mut current, &mut comments) {
                return Err(self.fail(items, comments, error));
            }
            match self.read_object_pattern_item(source, &mut current) {
                Ok(Some(item)) => items.push(item),
                Ok(None) => break,
                Err(error) => {
                    // An item that does not fit pattern shape means this
                    // brace block is not a pattern at all; let the object
                    // literal reader have it.
                    self.arena.dispose(error);
                    self.give_up(items, comments);
                    return Ok(None);
                }
            }
            if let Err(error) = self.trivia(source, &mut current, &mut comments) {
                return Err(self.fail(items, comments, error));
            }
            if self.check_symbol(&[","], source, &mut current).is_none() {
                break;
            }
        }
        if let Err(error) = self.trivia(source, &mut current, &mut comments) {
            return Err(self.fail(items, comments, error));
        }
        if self.check_symbol(&["}"], source, &mut current).is_none() {
            self.give_up(items, comments);
            return Ok(None);
        }
        *cursor = current;
        Ok(Some(self.finish(
            NodeKind::ObjectPattern { items },
            start,
            current,
            comments,
        )))
    }

    fn read_array_pattern(&mut self, source: &str, cursor: &mut SourcePosition) -> ReadResult {
        let start = *cursor;
        let mut current = *cursor;
        if self.check_symbol(&["["], source, &mut current).is_none() {
            return Ok(None);
        }
        let mut comments = Vec::new();
        let mut items = Vec::new();
        loop {
            if let Err(error) = self.trivia(source, &mut current, &mut comments) {
                return Err(self.fail(items, comments, error));
            }
            let item_start = current;
            if self.check_symbol(&["]"], source, &mut current.clone()).is_some() {
                break;
            }
            let mut alias = None;
            let mut value = None;
            if self.check_symbol(&[","], source, &mut current.clone()).is_none() {
                let target = match self.read_part_pattern(source, &mut current) {
                    Ok(Some(id)) => id,
                    Ok(None) => {
                        self.give_up(items, comments);
                        return Ok(None);
                    }
                    Err(error) => {
                        self.arena.dispose(error);
                        self.give_up(items, comments);
                        return Ok(None);
                    }
                };
                alias = Some(target);
                if let Err(error) = self.trivia(source, &mut current, &mut comments) {
                    let mut owned = items;
                    owned.push(target);
                    return Err(self.fail(owned, comments, error));
                }
                if self.check_symbol(&["="], source, &mut current).is_some() {
                    if let Err(error) = self.trivia(source, &mut current, &mut comments) {
                        let mut owned = items;
                        owned.push(target);
                        return Err(self.fail(owned, comments, error));
                    }
                    let default = match self.read_expression2(source, &mut current) {
                        Ok(Some(id)) => id,
                        Ok(None) => {
                            let mut owned = items;
                            owned.push(target);
                            let error = self.unexpected(current);
                            return Err(self.fail(owned, comments, error));
                        }
                        Err(error) => {
                            let mut owned = items;
                            owned.push(target);
                            return Err(self.fail(owned, comments, error));
                        }
                    };
                    value = Some(default);
                }
            }
            let item = self.finish(
                NodeKind::ArrayPatternItem { alias, value },
                item_start,
                current,
                Vec::new(),
            );
            items.push(item);
            if let Err(error) = self.trivia(source, &mut current, &mut comments) {
                return Err(self.fail(items, comments, error));
            }
            if self.check_symbol(&[","], source, &mut current).is_none() {
                break;
            }
        }
        if let Err(error) = self.trivia(source, &mut current, &mut comments) {
            return Err(self.fail(items, comments, error));
        }
        if self.check_symbol(&["]"], source, &mut current).is_none() {
            self.give_up(items, comments);
            return Ok(None);
        }
        *cursor = current;
        Ok(Some(self.finish(
            NodeKind::ArrayPattern { items },
            start,
            current,
            comments,
        )))
    }

    fn read_pattern(&mut self, source: &str, cursor: &mut SourcePosition) -> ReadResult {
        if let Some(node) = self.read_object_pattern(source, cursor)? {
            return Ok(Some(node));
        }
        if let Some(node) = self.read_array_pattern(source, cursor)? {
            return Ok(Some(node));
        }
        // Speculative member-chain parse; roll the current scope back if it
        // turns out not to be a valid target.
        let scope = self.current_scope();
        let backup_declarations = self.scopes.scope(scope).declarations.clone();
        let backup_refs = self.scopes.scope(scope).refs.clone();
        let mut current = *cursor;
        match self.read_expression17(source, &mut current)? {
            Some(node) => {
                let acceptable = matches!(
                    self.arena.node(node).kind,
                    NodeKind::Identifier
                        | NodeKind::StringLiteral
                        | NodeKind::NumberLiteral
                        | NodeKind::MemberExpression { .. }
                        | NodeKind::ComputedMemberExpression { .. }
                );
                if !acceptable {
                    self.arena.dispose(node);
                    let scope_record = self.scopes.scope_mut(scope);
                    scope_record.declarations = backup_declarations;
                    scope_record.refs = backup_refs;
                    return Ok(None);
                }
                *cursor = current;
                Ok(Some(node))
            }
            None => Ok(None),
        }
    }

    fn read_part_pattern(&mut self, source: &str, cursor: &mut SourcePosition) -> ReadResult {
        if let Some(node) = self.read_pattern(source, cursor)? {
            return Ok(Some(node));
        }
        self.read_spread_pattern(source, cursor)
    }
}

// Expression productions, lowest precedence first.
impl Parser {
    pub(crate) fn read_expression(
        &mut self,
        source: &str,
        cursor: &mut SourcePosition,
    ) -> ReadResult {
        self.read_expression1(source, cursor)
    }

    fn read_binary_level(
        &mut self,
        source: &str,
        cursor: &mut SourcePosition,
        symbols: &[&str],
        identifiers: &[&str],
        next: fn(&mut Self, &str, &mut SourcePosition) -> ReadResult,
        same: fn(&mut Self, &str, &mut SourcePosition) -> ReadResult,
    ) -> ReadResult {
        let start = *cursor;
        let Some(node) = next(self, source, cursor)? else {
            return Ok(None);
        };
        let mut current = *cursor;
        let mut comments = Vec::new();
        if let Err(error) = self.trivia(source, &mut current, &mut comments) {
            return Err(self.fail(vec![node], comments, error));
        }
        let operator = self
            .check_symbol(symbols, source, &mut current)
            .or_else(|| self.check_identifier(identifiers, source, &mut current));
        let Some(operator_span) = operator else {
            self.give_up(vec![], comments);
            return Ok(Some(node));
        };
        if let Err(error) = self.trivia(source, &mut current, &mut comments) {
            return Err(self.fail(vec![node], comments, error));
        }
        let right = match same(self, source, &mut current) {
            Ok(Some(id)) => id,
            Ok(None) => {
                let error = self.unexpected(current);
                return Err(self.fail(vec![node], comments, error));
            }
            Err(error) => return Err(self.fail(vec![node], comments, error)),
        };
        let operator = self.token(operator_span);
        *cursor = current;
        Ok(Some(self.finish(
            NodeKind::BinaryExpression {
                left: Some(node),
                operator,
                right: Some(right),
            },
            start,
            current,
            comments,
        )))
    }

    fn read_expression1(&mut self, source: &str, cursor: &mut SourcePosition) -> ReadResult {
        self.read_binary_level(
            source,
            cursor,
            &[","],
            &[],
            Self::read_expression2,
            Self::read_expression1,
        )
    }

    fn read_expression2(&mut self, source: &str, cursor: &mut SourcePosition) -> ReadResult {
        if let Some(node) = self.read_yield_expression(source, cursor)? {
            return Ok(Some(node));
        }
        if let Some(node) = self.read_arrow_function(source, cursor)? {
            return Ok(Some(node));
        }
        if let Some(node) = self.read_assignment_expression(source, cursor)? {
            return Ok(Some(node));
        }
        self.read_condition_expression(source, cursor)
    }

    fn read_yield_expression(&mut self, source: &str, cursor: &mut SourcePosition) -> ReadResult {
        let start = *cursor;
        let mut current = *cursor;
        if self
            .check_identifier(&["yield"], source, &mut current)
            .is_none()
        {
            return Ok(None);
        }
        let mut comments = Vec::new();
        if let Err(error) = self.trivia(source, &mut current, &mut comments) {
            return Err(self.fail(vec![], comments, error));
        }
        let delegate = self.check_symbol(&["*"], source, &mut current).is_some();
        if delegate {
            if let Err(error) = self.trivia(source, &mut current, &mut comments) {
                return Err(self.fail(vec![], comments, error));
            }
        }
        let value = match self.read_expression2(source, &mut current) {
            Ok(value) => value,
            Err(error) => return Err(self.fail(vec![], comments, error)),
        };
        let kind = if delegate {
            let Some(value) = value else {
                let error = self.unexpected(current);
                return Err(self.fail(vec![], comments, error));
            };
            NodeKind::YieldDelegateExpression { value }
        } else {
            NodeKind::YieldExpression { value }
        };
        *cursor = current;
        Ok(Some(self.finish(kind, start, current, comments)))
    }

    fn check_assignment_target(&mut self, source: &str, node: NodeId) -> Option<NodeId> {
        match self.arena.node(node).kind.clone() {
            NodeKind::GroupExpression { expression } => {
                self.check_assignment_target(source, expression)
            }
            NodeKind::Identifier
            | NodeKind::ObjectPattern { .. }
            | NodeKind::ArrayPattern { .. }
            | NodeKind::MemberExpression { .. }
            | NodeKind::ComputedMemberExpression { .. } => None,
            NodeKind::OptionalMemberExpression { .. }
            | NodeKind::OptionalComputedMemberExpression { .. }
            | NodeKind::OptionalCallExpression { .. } => {
                let at = self.arena.node(node).span.start;
                Some(self.error("Invalid left-hand side in assignment", at))
            }
            _ => {
                let at = self.arena.node(node).span.start;
                Some(self.error("Invalid left-hand side in assignment", at))
            }
        }
    }

    fn read_assignment_expression(
        &mut self,
        source: &str,
        cursor: &mut SourcePosition,
    ) -> ReadResult {
        let start = *cursor;
        let mut current = *cursor;
        // The target parse may register declarations from nested function
        // expressions; roll them back if no assignment operator follows.
        let scope = self.current_scope();
        let backup_declarations = self.scopes.scope(scope).declarations.clone();
        let backup_refs = self.scopes.scope(scope).refs.clone();
        let Some(left) = self.read_pattern(source, &mut current)? else {
            return Ok(None);
        };
        let mut comments = Vec::new();
        if let Err(error) = self.trivia(source, &mut current, &mut comments) {
            return Err(self.fail(vec![left], comments, error));
        }
        let Some(operator_span) = self.check_symbol(ASSIGNMENT_OPERATORS, source, &mut current)
        else {
            self.give_up(vec![left], comments);
            let scope_record = self.scopes.scope_mut(scope);
            scope_record.declarations = backup_declarations;
            scope_record.refs = backup_refs;
            return Ok(None);
        };
        if let Some(error) = self.check_assignment_target(source, left) {
            return Err(self.fail(vec![left], comments, error));
        }
        if let Err(error) = self.trivia(source, &mut current, &mut comments) {
            return Err(self.fail(vec![left], comments, error));
        }
        let right = match self.read_expression2(source, &mut current) {
            Ok(Some(id)) => id,
            Ok(None) => {
                let error = self.unexpected(current);
                return Err(self.fail(vec![left], comments, error));
            }
            Err(error) => return Err(self.fail(vec![left], comments, error)),
        };
        let operator = self.token(operator_span);
        *cursor = current;
        Ok(Some(self.finish(
            NodeKind::AssignmentExpression {
                left,
                operator,
                right,
            },
            start,
            current,
            comments,
        )))
    }

    fn read_condition_expression(
        &mut self,
        source: &str,
        cursor: &mut SourcePosition,
    ) -> ReadResult {
        let start = *cursor;
        let Some(condition) = self.read_expression3(source, cursor)? else {
            return Ok(None);
        };
        let mut current = *cursor;
        let mut comments = Vec::new();
        if let Err(error) = self.trivia(source, &mut current, &mut comments) {
            return Err(self.fail(vec![condition], comments, error));
        }
        if self.check_symbol(&["?"], source, &mut current).is_none() {
            self.give_up(vec![], comments);
            return Ok(Some(condition));
        }
        if let Err(error) = self.trivia(source, &mut current, &mut comments) {
            return Err(self.fail(vec![condition], comments, error));
        }
        let consequent = match self.read_expression2(source, &mut current) {
            Ok(Some(id)) => id,
            Ok(None) => {
                let error = self.unexpected(current);
                return Err(self.fail(vec![condition], comments, error));
            }
            Err(error) => return Err(self.fail(vec![condition], comments, error)),
        };
        if let Err(error) = self.trivia(source, &mut current, &mut comments) {
            return Err(self.fail(vec![condition, consequent], comments, error));
        }
        if self.check_symbol(&[":"], source, &mut current).is_none() {
            let error = self.unexpected(current);
            return Err(self.fail(vec![condition, consequent], comments, error));
        }
        if let Err(error) = self.trivia(source, &mut current, &mut comments) {
            return Err(self.fail(vec![condition, consequent], comments, error));
        }
        let alternate = match self.read_expression2(source, &mut current) {
            Ok(Some(id)) => id,
            Ok(None) => {
                let error = self.unexpected(current);
                return Err(self.fail(vec![condition, consequent], comments, error));
            }
            Err(error) => return Err(self.fail(vec![condition, consequent], comments, error)),
        };
        *cursor = current;
        Ok(Some(self.finish(
            NodeKind::ConditionExpression {
                condition,
                consequent,
                alternate,
            },
            start,
            current,
            comments,
        )))
    }

    fn read_expression3(&mut self, source: &str, cursor: &mut SourcePosition) -> ReadResult {
        self.read_binary_level(
            source,
            cursor,
            &["||", "??"],
            &[],
            Self::read_expression4,
            Self::read_expression3,
        )
    }

    fn read_expression4(&mut self, source: &str, cursor: &mut SourcePosition) -> ReadResult {
        self.read_binary_level(
            source,
            cursor,
            &["&&"],
            &[],
            Self::read_expression5,
            Self::read_expression4,
        )
    }

    fn read_expression5(&mut self, source: &str, cursor: &mut SourcePosition) -> ReadResult {
        self.read_binary_level(
            source,
            cursor,
            &["|"],
            &[],
            Self::read_expression6,
            Self::read_expression5,
        )
    }

    fn read_expression6(&mut self, source: &str, cursor: &mut SourcePosition) -> ReadResult {
        self.read_binary_level(
            source,
            cursor,
            &["^"],
            &[],
            Self::read_expression7,
            Self::read_expression6,
        )
    }

    fn read_expression7(&mut self, source: &str, cursor: &mut SourcePosition) -> ReadResult {
        self.read_binary_level(
            source,
            cursor,
            &["&"],
            &[],
            Self::read_expression8,
            Self::read_expression7,
        )
    }

    fn read_expression8(&mut self, source: &str, cursor: &mut SourcePosition) -> ReadResult {
        self.read_binary_level(
            source,
            cursor,
            &["===", "!==", "==", "!="],
            &[],
            Self::read_expression9,
            Self::read_expression8,
        )
    }

    fn read_expression9(&mut self, source: &str, cursor: &mut SourcePosition) -> ReadResult {
        self.read_binary_level(
            source,
            cursor,
            &["<=", ">=", "<", ">"],
            &["instanceof", "in"],
            Self::read_expression10,
            Self::read_expression9,
        )
    }

    fn read_expression10(&mut self, source: &str, cursor: &mut SourcePosition) -> ReadResult {
        self.read_binary_level(
            source,
            cursor,
            &["<<", ">>>", ">>"],
            &[],
            Self::read_expression11,
            Self::read_expression10,
        )
    }

    fn read_expression11(&mut self, source: &str, cursor: &mut SourcePosition) -> ReadResult {
        self.read_binary_level(
            source,
            cursor,
            &["+", "-"],
            &[],
            Self::read_expression12,
            Self::read_expression11,
        )
    }

    fn read_expression12(&mut self, source: &str, cursor: &mut SourcePosition) -> ReadResult {
        self.read_binary_level(
            source,
            cursor,
            &["*", "/", "%"],
            &[],
            Self::read_expression13,
            Self::read_expression12,
        )
    }

    fn read_expression13(&mut self, source: &str, cursor: &mut SourcePosition) -> ReadResult {
        self.read_binary_level(
            source,
            cursor,
            &["**"],
            &[],
            Self::read_expression14,
            Self::read_expression13,
        )
    }

    fn read_expression14(&mut self, source: &str, cursor: &mut SourcePosition) -> ReadResult {
        let start = *cursor;
        let mut current = *cursor;
        if let Some(operator_span) = self.check_symbol(&["!", "~", "+", "-"], source, &mut current)
        {
            let mut comments = Vec::new();
            if let Err(error) = self.trivia(source, &mut current, &mut comments) {
                return Err(self.fail(vec![], comments, error));
            }
            let right = match self.read_expression14(source, &mut current) {
                Ok(Some(id)) => id,
                Ok(None) => {
                    let error = self.unexpected(current);
                    return Err(self.fail(vec![], comments, error));
                }
                Err(error) => return Err(self.fail(vec![], comments, error)),
            };
            let operator = self.token(operator_span);
            *cursor = current;
            return Ok(Some(self.finish(
                NodeKind::BinaryExpression {
                    left: None,
                    operator,
                    right: Some(right),
                },
                start,
                current,
                comments,
            )));
        }
        if let Some(node) = self.read_typeof_expression(source, cursor)? {
            return Ok(Some(node));
        }
        if let Some(node) = self.read_void_expression(source, cursor)? {
            return Ok(Some(node));
        }
        if let Some(node) = self.read_delete_expression(source, cursor)? {
            return Ok(Some(node));
        }
        if let Some(node) = self.read_await_expression(source, cursor)? {
            return Ok(Some(node));
        }
        self.read_expression15(source, cursor)
    }

    fn read_unary_keyword(
        &mut self,
        keyword: &str,
        source: &str,
        cursor: &mut SourcePosition,
    ) -> Result<Option<(NodeId, SourcePosition, Vec<NodeId>)>, NodeId> {
        let mut current = *cursor;
        if self
            .check_identifier(&[keyword], source, &mut current)
            .is_none()
        {
            return Ok(None);
        }
        let mut comments = Vec::new();
        if let Err(error) = self.trivia(source, &mut current, &mut comments) {
            return Err(self.fail(vec![], comments, error));
        }
        let value = match self.read_expression14(source, &mut current) {
            Ok(Some(id)) => id,
            Ok(None) => {
                let error = self.unexpected(current);
                return Err(self.fail(vec![], comments, error));
            }
            Err(error) => return Err(self.fail(vec![], comments, error)),
        };
        Ok(Some((value, current, comments)))
    }

    fn read_typeof_expression(&mut self, source: &str, cursor: &mut SourcePosition) -> ReadResult {
        let start = *cursor;
        match self.read_unary_keyword("typeof", source, cursor)? {
            Some((value, end, comments)) => {
                *cursor = end;
                Ok(Some(self.finish(
                    NodeKind::TypeofExpression { value },
                    start,
                    end,
                    comments,
                )))
            }
            None => Ok(None),
        }
    }

    fn read_void_expression(&mut self, source: &str, cursor: &mut SourcePosition) -> ReadResult {
        let start = *cursor;
        match self.read_unary_keyword("void", source, cursor)? {
            Some((value, end, comments)) => {
                *cursor = end;
                Ok(Some(self.finish(
                    NodeKind::VoidExpression { value },
                    start,
                    end,
                    comments,
                )))
            }
            None => Ok(None),
        }
    }

    fn read_delete_expression(&mut self, source: &str, cursor: &mut SourcePosition) -> ReadResult {
        let start = *cursor;
        match self.read_unary_keyword("delete", source, cursor)? {
            Some((value, end, comments)) => {
                *cursor = end;
                Ok(Some(self.finish(
                    NodeKind::DeleteExpression { value },
                    start,
                    end,
                    comments,
                )))
            }
            None => Ok(None),
        }
    }

    fn read_await_expression(&mut self, source: &str, cursor: &mut SourcePosition) -> ReadResult {
        let start = *cursor;
        match self.read_unary_keyword("await", source, cursor)? {
            Some((value, end, comments)) => {
                *cursor = end;
                Ok(Some(self.finish(
                    NodeKind::AwaitExpression { value },
                    start,
                    end,
                    comments,
                )))
            }
            None => Ok(None),
        }
    }

    fn read_expression15(&mut self, source: &str, cursor: &mut SourcePosition) -> ReadResult {
        let start = *cursor;
        let mut current = *cursor;
        if let Some(operator_span) = self.check_symbol(&["++", "--"], source, &mut current) {
            let mut comments = Vec::new();
            if let Err(error) = self.trivia(source, &mut current, &mut comments) {
                return Err(self.fail(vec![], comments, error));
            }
            let right = match self.read_expression16(source, &mut current) {
                Ok(Some(id)) => id,
                Ok(None) => {
                    let error = self.unexpected(current);
                    return Err(self.fail(vec![], comments, error));
                }
                Err(error) => return Err(self.fail(vec![], comments, error)),
            };
            let operator = self.token(operator_span);
            *cursor = current;
            return Ok(Some(self.finish(
                NodeKind::BinaryExpression {
                    left: None,
                    operator,
                    right: Some(right),
                },
                start,
                current,
                comments,
            )));
        }
        self.read_expression16(source, cursor)
    }

    fn read_expression16(&mut self, source: &str, cursor: &mut SourcePosition) -> ReadResult {
        let start = *cursor;
        let Some(node) = self.read_expression17(source, cursor)? else {
            return Ok(None);
        };
        // Postfix update only binds on the same line.
        let mut current = *cursor;
        let mut comments = Vec::new();
        let newline = match self.skip_trivia(source, &mut current, &mut comments, true) {
            Ok(n) => n,
            Err(error) => return Err(self.fail(vec![node], comments, error)),
        };
        if newline {
            self.give_up(vec![], comments);
            return Ok(Some(node));
        }
        let Some(operator_span) = self.check_symbol(&["++", "--"], source, &mut current) else {
            self.give_up(vec![], comments);
            return Ok(Some(node));
        };
        let operator = self.token(operator_span);
        *cursor = current;
        Ok(Some(self.finish(
            NodeKind::BinaryExpression {
                left: Some(node),
                operator,
                right: None,
            },
            start,
            current,
            comments,
        )))
    }

    fn read_expression17(&mut self, source: &str, cursor: &mut SourcePosition) -> ReadResult {
        let mut node = match self.read_new_expression(source, cursor)? {
            Some(node) => node,
            None => match self.read_expression18(source, cursor)? {
                Some(node) => node,
                None => return Ok(None),
            },
        };
        if let NodeKind::Identifier = self.arena.node(node).kind {
            let span = self.arena.node(node).span;
            self.record_ref(source, span);
        }
        let start = self.arena.node(node).span.start;
        let mut optional = false;
        loop {
            let mut current = *cursor;
            let mut comments = Vec::new();
            if let Err(error) = self.trivia(source, &mut current, &mut comments) {
                return Err(self.fail(vec![node], comments, error));
            }
            let next = match self.read_member_or_call(source, &mut current, node, &mut optional) {
                Ok(next) => next,
                Err(error) => return Err(self.fail(vec![node], comments, error)),
            };
            match next {
                Some(next) => {
                    let end = current;
                    self.arena.node_mut(next).span = SourceSpan::new(start, end);
                    self.arena.node_mut(next).comments.append(&mut comments);
                    node = next;
                    *cursor = current;
                }
                None => {
                    self.give_up(vec![], comments);
                    return Ok(Some(node));
                }
            }
        }
    }

    fn read_member_or_call(
        &mut self,
        source: &str,
        cursor: &mut SourcePosition,
        host: NodeId,
        optional: &mut bool,
    ) -> Result<Option<NodeId>, NodeId> {
        let start = *cursor;
        if self.check_symbol(&["?."], source, cursor).is_some() {
            *optional = true;
            if self.check_symbol(&["("], source, &mut cursor.clone()).is_some() {
                self.check_symbol(&["("], source, cursor);
                let arguments = self.read_arguments(source, cursor)?;
                let node = self.leaf(
                    NodeKind::OptionalCallExpression {
                        callee: host,
                        arguments: arguments.clone(),
                    },
                    start,
                    *cursor,
                );
                for argument in arguments {
                    self.arena.node_mut(argument).parent = Some(node);
                }
                self.arena.node_mut(host).parent = Some(node);
                return Ok(Some(node));
            }
            if self.check_symbol(&["["], source, cursor).is_some() {
                let field = self.read_bracket_field(source, cursor)?;
                let node = self.leaf(
                    NodeKind::OptionalComputedMemberExpression { host, field },
                    start,
                    *cursor,
                );
                self.arena.node_mut(host).parent = Some(node);
                self.arena.node_mut(field).parent = Some(node);
                return Ok(Some(node));
            }
            let field = match self.read_private_name(source, cursor)? {
                Some(field) => field,
                None => match self.read_identifier_literal(source, cursor) {
                    Some(field) => field,
                    None => return Err(self.unexpected(*cursor)),
                },
            };
            let node = self.leaf(
                NodeKind::OptionalMemberExpression { host, field },
                start,
                *cursor,
            );
            self.arena.node_mut(host).parent = Some(node);
            self.arena.node_mut(field).parent = Some(node);
            return Ok(Some(node));
        }
        if self.check_symbol(&["."], source, cursor).is_some() {
            let field = match self.read_private_name(source, cursor)? {
                Some(field) => field,
                None => match self.read_identifier_literal(source, cursor) {
                    Some(field) => field,
                    None => return Err(self.unexpected(*cursor)),
                },
            };
            let node = self.leaf(NodeKind::MemberExpression { host, field }, start, *cursor);
            self.arena.node_mut(host).parent = Some(node);
            self.arena.node_mut(field).parent = Some(node);
            return Ok(Some(node));
        }
        if self.check_symbol(&["["], source, cursor).is_some() {
            let field = self.read_bracket_field(source, cursor)?;
            let node = self.leaf(
                NodeKind::ComputedMemberExpression { host, field },
                start,
                *cursor,
            );
            self.arena.node_mut(host).parent = Some(node);
            self.arena.node_mut(field).parent = Some(node);
            return Ok(Some(node));
        }
        if self.check_symbol(&["("], source, cursor).is_some() {
            let arguments = self.read_arguments(source, cursor)?;
            let node = self.leaf(
                NodeKind::CallExpression {
                    callee: host,
                    arguments: arguments.clone(),
                },
                start,
                *cursor,
            );
            for argument in arguments {
                self.arena.node_mut(argument).parent = Some(node);
            }
            self.arena.node_mut(host).parent = Some(node);
            return Ok(Some(node));
        }
        if peek(source, cursor) == Some('`') {
            if *optional {
                return Err(self.error("Invalid tagged template on optional chain", *cursor));
            }
            return self.read_template_literal(source, cursor, Some(host));
        }
        Ok(None)
    }

    fn read_bracket_field(
        &mut self,
        source: &str,
        cursor: &mut SourcePosition,
    ) -> Result<NodeId, NodeId> {
        let mut comments = Vec::new();
        if let Err(error) = self.trivia(source, cursor, &mut comments) {
            return Err(self.fail(vec![], comments, error));
        }
        let field = match self.read_expression(source, cursor) {
            Ok(Some(id)) => id,
            Ok(None) => {
                let error = self.unexpected(*cursor);
                return Err(self.fail(vec![], comments, error));
            }
            Err(error) => return Err(self.fail(vec![], comments, error)),
        };
        if let Err(error) = self.trivia(source, cursor, &mut comments) {
            return Err(self.fail(vec![field], comments, error));
        }
        if self.check_symbol(&["]"], source, cursor).is_none() {
            let error = self.unexpected(*cursor);
            return Err(self.fail(vec![field], comments, error));
        }
        self.give_up(vec![], comments);
        Ok(field)
    }

    fn read_arguments(
        &mut self,
        source: &str,
        cursor: &mut SourcePosition,
    ) -> Result<Vec<NodeId>, NodeId> {
        let mut arguments = Vec::new();
        let mut comments = Vec::new();
        loop {
            if let Err(error) = self.trivia(source, cursor, &mut comments) {
                return Err(self.fail(arguments, comments, error));
            }
            if self.check_symbol(&[")"], source, cursor).is_some() {
                break;
            }
            let argument = if let Some(spread) = {
                let result = self.read_spread_expression(source, cursor);
                match result {
                    Ok(spread) => spread,
                    Err(error) => return Err(self.fail(arguments, comments, error)),
                }
            } {
                spread
            } else {
                match self.read_expression2(source, cursor) {
                    Ok(Some(id)) => id,
                    Ok(None) => {
                        let error = self.unexpected(*cursor);
                        return Err(self.fail(arguments, comments, error));
                    }
                    Err(error) => return Err(self.fail(arguments, comments, error)),
                }
            };
            arguments.push(argument);
            if let Err(error) = self.trivia(source, cursor, &mut comments) {
                return Err(self.fail(arguments, comments, error));
            }
            if self.check_symbol(&[","], source, cursor).is_none() {
                if self.check_symbol(&[")"], source, cursor).is_none() {
                    let error = self.unexpected(*cursor);
                    return Err(self.fail(arguments, comments, error));
                }
                break;
            }
        }
        self.give_up(vec![], comments);
        Ok(arguments)
    }

    fn read_spread_expression(
        &mut self,
        source: &str,
        cursor: &mut SourcePosition,
    ) -> ReadResult {
        let start = *cursor;
        let mut current = *cursor;
        if self.check_symbol(&["..."], source, &mut current).is_none() {
            return Ok(None);
        }
        let mut comments = Vec::new();
        if let Err(error) = self.trivia(source, &mut current, &mut comments) {
            return Err(self.fail(vec![], comments, error));
        }
        let value = match self.read_expression2(source, &mut current) {
            Ok(Some(id)) => id,
            Ok(None) => {
                let error = self.unexpected(current);
                return Err(self.fail(vec![], comments, error));
            }
            Err(error) => return Err(self.fail(vec![], comments, error)),
        };
        *cursor = current;
        Ok(Some(self.finish(
            NodeKind::SpreadExpression { value },
            start,
            current,
            comments,
        )))
    }

    fn read_new_expression(&mut self, source: &str, cursor: &mut SourcePosition) -> ReadResult {
        let start = *cursor;
        let mut current = *cursor;
        if self
            .check_identifier(&["new"], source, &mut current)
            .is_none()
        {
            return Ok(None);
        }
        let mut comments = Vec::new();
        if let Err(error) = self.trivia(source, &mut current, &mut comments) {
            return Err(self.fail(vec![], comments, error));
        }
        let mut callee = match self.read_new_expression(source, &mut current) {
            Ok(Some(nested)) => nested,
            Ok(None) => match self.read_expression18(source, &mut current) {
                Ok(Some(id)) => id,
                Ok(None) => {
                    let error = self.unexpected(current);
                    return Err(self.fail(vec![], comments, error));
                }
                Err(error) => return Err(self.fail(vec![], comments, error)),
            },
            Err(error) => return Err(self.fail(vec![], comments, error)),
        };
        if let NodeKind::Identifier = self.arena.node(callee).kind {
            let span = self.arena.node(callee).span;
            self.record_ref(source, span);
        }
        // Member accesses bind tighter than the construction itself.
        loop {
            if let Err(error) = self.trivia(source, &mut current, &mut comments) {
                return Err(self.fail(vec![callee], comments, error));
            }
            let member_start = current;
            if self.check_symbol(&["."], source, &mut current).is_some() {
                let field = match self.read_identifier_literal(source, &mut current) {
                    Some(field) => field,
                    None => {
                        let error = self.unexpected(current);
                        return Err(self.fail(vec![callee], comments, error));
                    }
                };
                let node = self.leaf(
                    NodeKind::MemberExpression {
                        host: callee,
                        field,
                    },
                    start,
                    current,
                );
                self.arena.node_mut(callee).parent = Some(node);
                self.arena.node_mut(field).parent = Some(node);
                callee = node;
                continue;
            }
            if self.check_symbol(&["["], source, &mut current).is_some() {
                let field = match self.read_bracket_field(source, &mut current) {
                    Ok(field) => field,
                    Err(error) => return Err(self.fail(vec![callee], comments, error)),
                };
                let node = self.leaf(
                    NodeKind::ComputedMemberExpression {
                        host: callee,
                        field,
                    },
                    start,
                    current,
                );
                self.arena.node_mut(callee).parent = Some(node);
                self.arena.node_mut(field).parent = Some(node);
                callee = node;
                continue;
            }
            let _ = member_start;
            break;
        }
        let mut arguments = Vec::new();
        if self.check_symbol(&["("], source, &mut current).is_some() {
            arguments = match self.read_arguments(source, &mut current) {
                Ok(arguments) => arguments,
                Err(error) => return Err(self.fail(vec![callee], comments, error)),
            };
        }
        *cursor = current;
        Ok(Some(self.finish(
            NodeKind::NewExpression { callee, arguments },
            start,
            current,
            comments,
        )))
    }

    fn read_group_expression(&mut self, source: &str, cursor: &mut SourcePosition) -> ReadResult {
        let start = *cursor;
        let mut current = *cursor;
        if self.check_symbol(&["("], source, &mut current).is_none() {
            return Ok(None);
        }
        let mut comments = Vec::new();
        if let Err(error) = self.trivia(source, &mut current, &mut comments) {
            return Err(self.fail(vec![], comments, error));
        }
        let expression = match self.read_expression(source, &mut current) {
            Ok(Some(id)) => id,
            Ok(None) => {
                let error = self.unexpected(current);
                return Err(self.fail(vec![], comments, error));
            }
            Err(error) => return Err(self.fail(vec![], comments, error)),
        };
        if let Err(error) = self.trivia(source, &mut current, &mut comments) {
            return Err(self.fail(vec![expression], comments, error));
        }
        if self.check_symbol(&[")"], source, &mut current).is_none() {
            let error = self.unexpected(current);
            return Err(self.fail(vec![expression], comments, error));
        }
        *cursor = current;
        Ok(Some(self.finish(
            NodeKind::GroupExpression { expression },
            start,
            current,
            comments,
        )))
    }

    fn read_expression18(&mut self, source: &str, cursor: &mut SourcePosition) -> ReadResult {
        if let Some(node) = self.read_group_expression(source, cursor)? {
            return Ok(Some(node));
        }
        self.read_expression19(source, cursor)
    }

    fn read_expression19(&mut self, source: &str, cursor: &mut SourcePosition) -> ReadResult {
        if let Some(node) = self.read_string_literal(source, cursor)? {
            return Ok(Some(node));
        }
        if let Some(node) = self.read_number_literal(source, cursor)? {
            return Ok(Some(node));
        }
        if let Some(node) = self.read_private_name(source, cursor)? {
            return Ok(Some(node));
        }
        if let Some(node) = self.read_regexp_literal(source, cursor)? {
            return Ok(Some(node));
        }
        for (keyword, kind) in [
            ("true", NodeKind::BooleanLiteral),
            ("false", NodeKind::BooleanLiteral),
            ("null", NodeKind::NullLiteral),
            ("undefined", NodeKind::UndefinedLiteral),
            ("this", NodeKind::ThisLiteral),
            ("super", NodeKind::SuperLiteral),
        ] {
            if let Some(node) = self.read_keyword_literal(keyword, kind, source, cursor) {
                return Ok(Some(node));
            }
        }
        if let Some(node) = self.read_object_literal(source, cursor)? {
            return Ok(Some(node));
        }
        if let Some(node) = self.read_array_literal(source, cursor)? {
            return Ok(Some(node));
        }
        if let Some(node) = self.read_function_declaration(source, cursor)? {
            return Ok(Some(node));
        }
        if let Some(node) = self.read_class_declaration(source, cursor)? {
            return Ok(Some(node));
        }
        if let Some(node) = self.read_template_literal(source, cursor, None)? {
            return Ok(Some(node));
        }
        let mut current = *cursor;
        if let Some(node) = self.read_identifier_literal(source, &mut current) {
            let text = self.arena.node(node).span.slice(source);
            if is_keyword(text) {
                self.arena.dispose(node);
                return Ok(None);
            }
            *cursor = current;
            return Ok(Some(node));
        }
        Ok(None)
    }
}

// Statement productions.
impl Parser {
    fn read_program(
        &mut self,
        source: &str,
        position: &mut SourcePosition,
    ) -> Result<NodeId, NodeId> {
        let start = *position;
        let mut current = *position;
        let scope = self.push_scope(ScopeKind::Lex);
        let mut comments = Vec::new();
        let mut owned: Vec<NodeId> = Vec::new();
        let mut interpreter = None;
        if self.mode == EvalMode::Program {
            if let Some(node) = self.read_interpreter_directive(source, &mut current) {
                interpreter = Some(node);
                owned.push(node);
            }
        }
        let mut directives = Vec::new();
        loop {
            if let Err(error) = self.trivia(source, &mut current, &mut comments) {
                self.pop_scope();
                return Err(self.fail(owned, comments, error));
            }
            match self.read_directive(source, &mut current) {
                Ok(Some(directive)) => {
                    directives.push(directive);
                    owned.push(directive);
                }
                Ok(None) => break,
                Err(error) => {
                    self.pop_scope();
                    return Err(self.fail(owned, comments, error));
                }
            }
        }
        let mut statements = Vec::new();
        loop {
            if let Err(error) = self.trivia(source, &mut current, &mut comments) {
                self.pop_scope();
                return Err(self.fail(owned, comments, error));
            }
            match self.read_statement(source, &mut current) {
                Ok(Some(statement)) => {
                    statements.push(statement);
                    owned.push(statement);
                }
                Ok(None) => break,
                Err(error) => {
                    self.pop_scope();
                    return Err(self.fail(owned, comments, error));
                }
            }
        }
        if let Err(error) = self.trivia(source, &mut current, &mut comments) {
            self.pop_scope();
            return Err(self.fail(owned, comments, error));
        }
        if peek(source, &current).is_some() {
            self.pop_scope();
            let error = self.unexpected(current);
            return Err(self.fail(owned, comments, error));
        }
        self.pop_scope();
        let node = self.finish(
            NodeKind::Program {
                interpreter,
                directives,
                statements,
            },
            start,
            current,
            comments,
        );
        self.attach_scope(scope, node);
        *position = current;
        Ok(node)
    }

    fn read_interpreter_directive(
        &mut self,
        source: &str,
        cursor: &mut SourcePosition,
    ) -> Option<NodeId> {
        if !source[cursor.offset..].starts_with("#!") {
            return None;
        }
        let start = *cursor;
        while let Some(ch) = peek(source, cursor) {
            if is_line_terminator(ch) {
                break;
            }
            advance(source, cursor);
        }
        Some(self.leaf(NodeKind::InterpreterDirective, start, *cursor))
    }

    fn read_directive(&mut self, source: &str, cursor: &mut SourcePosition) -> ReadResult {
        let start = *cursor;
        let mut current = *cursor;
        let Some(string) = self.read_string_literal(source, &mut current)? else {
            return Ok(None);
        };
        let span = self.arena.node(string).span;
        self.arena.dispose(string);
        let mut comments = Vec::new();
        let terminated = match self.read_statement_end(source, &mut current, &mut comments) {
            Ok(terminated) => terminated,
            Err(error) => return Err(self.fail(vec![], comments, error)),
        };
        if !terminated {
            self.give_up(vec![], comments);
            return Ok(None);
        }
        let _ = start;
        let node = self.finish(NodeKind::Directive, span.start, span.end, comments);
        *cursor = current;
        Ok(Some(node))
    }

    fn read_statement(&mut self, source: &str, cursor: &mut SourcePosition) -> ReadResult {
        if let Some(node) = self.read_empty_statement(source, cursor)? {
            return Ok(Some(node));
        }
        if let Some(node) = self.read_variable_declaration_statement(source, cursor)? {
            return Ok(Some(node));
        }
        if let Some(node) = self.read_block_statement(source, cursor)? {
            return Ok(Some(node));
        }
        if let Some(node) = self.read_debugger_statement(source, cursor)? {
            return Ok(Some(node));
        }
        if let Some(node) = self.read_return_statement(source, cursor)? {
            return Ok(Some(node));
        }
        if let Some(node) = self.read_label_statement(source, cursor)? {
            return Ok(Some(node));
        }
        if let Some(node) = self.read_break_statement(source, cursor)? {
            return Ok(Some(node));
        }
        if let Some(node) = self.read_continue_statement(source, cursor)? {
            return Ok(Some(node));
        }
        if let Some(node) = self.read_if_statement(source, cursor)? {
            return Ok(Some(node));
        }
        if let Some(node) = self.read_switch_statement(source, cursor)? {
            return Ok(Some(node));
        }
        if let Some(node) = self.read_throw_statement(source, cursor)? {
            return Ok(Some(node));
        }
        if let Some(node) = self.read_try_statement(source, cursor)? {
            return Ok(Some(node));
        }
        if let Some(node) = self.read_while_statement(source, cursor)? {
            return Ok(Some(node));
        }
        if let Some(node) = self.read_do_while_statement(source, cursor)? {
            return Ok(Some(node));
        }
        if let Some(node) = self.read_for_await_of_statement(source, cursor)? {
            return Ok(Some(node));
        }
        if let Some(node) = self.read_for_in_statement(source, cursor)? {
            return Ok(Some(node));
        }
        if let Some(node) = self.read_for_of_statement(source, cursor)? {
            return Ok(Some(node));
        }
        if let Some(node) = self.read_for_statement(source, cursor)? {
            return Ok(Some(node));
        }
        if let Some(node) = self.read_import_declaration(source, cursor)? {
            return Ok(Some(node));
        }
        if let Some(node) = self.read_export_declaration(source, cursor)? {
            return Ok(Some(node));
        }
        if let Some(node) = self.read_function_statement(source, cursor)? {
            return Ok(Some(node));
        }
        if let Some(node) = self.read_class_statement(source, cursor)? {
            return Ok(Some(node));
        }
        self.read_expression_statement(source, cursor)
    }

    fn read_empty_statement(&mut self, source: &str, cursor: &mut SourcePosition) -> ReadResult {
        let start = *cursor;
        let mut current = *cursor;
        if self.check_symbol(&[";"], source, &mut current).is_none() {
            return Ok(None);
        }
        *cursor = current;
        Ok(Some(self.leaf(NodeKind::EmptyStatement, start, current)))
    }

    fn read_block_statement(&mut self, source: &str, cursor: &mut SourcePosition) -> ReadResult {
        let start = *cursor;
        let mut current = *cursor;
        if self.check_symbol(&["{"], source, &mut current).is_none() {
            return Ok(None);
        }
        let scope = self.push_scope(ScopeKind::Block);
        let mut comments = Vec::new();
        let mut statements = Vec::new();
        loop {
            if let Err(error) = self.trivia(source, &mut current, &mut comments) {
                self.pop_scope();
                return Err(self.fail(statements, comments, error));
            }
            match self.read_statement(source, &mut current) {
                Ok(Some(statement)) => statements.push(statement),
                Ok(None) => break,
                Err(error) => {
                    self.pop_scope();
                    return Err(self.fail(statements, comments, error));
                }
            }
        }
        if self.check_symbol(&["}"], source, &mut current).is_none() {
            self.pop_scope();
            let error = self.unexpected(current);
            return Err(self.fail(statements, comments, error));
        }
        self.pop_scope();
        let node = self.finish(
            NodeKind::BlockStatement { statements },
            start,
            current,
            comments,
        );
        self.attach_scope(scope, node);
        *cursor = current;
        Ok(Some(node))
    }

    fn read_debugger_statement(
        &mut self,
        source: &str,
        cursor: &mut SourcePosition,
    ) -> ReadResult {
        let start = *cursor;
        let mut current = *cursor;
        if self
            .check_identifier(&["debugger"], source, &mut current)
            .is_none()
        {
            return Ok(None);
        }
        let mut comments = Vec::new();
        let terminated = match self.read_statement_end(source, &mut current, &mut comments) {
            Ok(terminated) => terminated,
            Err(error) => return Err(self.fail(vec![], comments, error)),
        };
        if !terminated {
            let error = self.unexpected(current);
            return Err(self.fail(vec![], comments, error));
        }
        *cursor = current;
        Ok(Some(self.finish(
            NodeKind::DebuggerStatement,
            start,
            current,
            comments,
        )))
    }

    fn read_return_statement(&mut self, source: &str, cursor: &mut SourcePosition) -> ReadResult {
        let start = *cursor;
        let mut current = *cursor;
        if self
            .check_identifier(&["return"], source, &mut current)
            .is_none()
        {
            return Ok(None);
        }
        let mut comments = Vec::new();
        let terminated = match self.read_statement_end(source, &mut current, &mut comments) {
            Ok(terminated) => terminated,
            Err(error) => return Err(self.fail(vec![], comments, error)),
        };
        let mut value = None;
        if !terminated {
            let expression = match self.read_expression(source, &mut current) {
                Ok(Some(id)) => id,
                Ok(None) => {
                    let error = self.unexpected(current);
                    return Err(self.fail(vec![], comments, error));
                }
                Err(error) => return Err(self.fail(vec![], comments, error)),
            };
            value = Some(expression);
            let done = match self.read_statement_end(source, &mut current, &mut comments) {
                Ok(done) => done,
                Err(error) => return Err(self.fail(vec![expression], comments, error)),
            };
            if !done {
                let error = self.unexpected(current);
                return Err(self.fail(vec![expression], comments, error));
            }
        }
        *cursor = current;
        Ok(Some(self.finish(
            NodeKind::ReturnStatement { value },
            start,
            current,
            comments,
        )))
    }

    fn read_label_statement(&mut self, source: &str, cursor: &mut SourcePosition) -> ReadResult {
        let start = *cursor;
        let mut current = *cursor;
        let Some(label) = self.read_identifier_literal(source, &mut current) else {
            return Ok(None);
        };
        let text = self.arena.node(label).span.slice(source).to_string();
        if is_keyword(&text) {
            self.arena.dispose(label);
            return Ok(None);
        }
        let mut comments = Vec::new();
        if let Err(error) = self.trivia(source, &mut current, &mut comments) {
            return Err(self.fail(vec![label], comments, error));
        }
        if self.check_symbol(&[":"], source, &mut current).is_none() {
            self.give_up(vec![label], comments);
            return Ok(None);
        }
        if let Err(error) = self.trivia(source, &mut current, &mut comments) {
            return Err(self.fail(vec![label], comments, error));
        }
        let statement = match self.read_statement(source, &mut current) {
            Ok(Some(id)) => id,
            Ok(None) => {
                let error = self.unexpected(current);
                return Err(self.fail(vec![label], comments, error));
            }
            Err(error) => return Err(self.fail(vec![label], comments, error)),
        };
        *cursor = current;
        Ok(Some(self.finish(
            NodeKind::LabelStatement { label, statement },
            start,
            current,
            comments,
        )))
    }

    fn read_jump_statement(
        &mut self,
        keyword: &str,
        source: &str,
        cursor: &mut SourcePosition,
    ) -> Result<Option<(Option<NodeId>, SourcePosition, Vec<NodeId>)>, NodeId> {
        let mut current = *cursor;
        if self
            .check_identifier(&[keyword], source, &mut current)
            .is_none()
        {
            return Ok(None);
        }
        let mut comments = Vec::new();
        let terminated = match self.read_statement_end(source, &mut current, &mut comments) {
            Ok(terminated) => terminated,
            Err(error) => return Err(self.fail(vec![], comments, error)),
        };
        let mut label = None;
        if !terminated {
            let Some(identifier) = self.read_identifier_literal(source, &mut current) else {
                let error = self.unexpected(current);
                return Err(self.fail(vec![], comments, error));
            };
            let text = self.arena.node(identifier).span.slice(source).to_string();
            if is_keyword(&text) {
                let at = self.arena.node(identifier).span.start;
                let error = self.unexpected(at);
                return Err(self.fail(vec![identifier], comments, error));
            }
            label = Some(identifier);
            let done = match self.read_statement_end(source, &mut current, &mut comments) {
                Ok(done) => done,
                Err(error) => return Err(self.fail(vec![identifier], comments, error)),
            };
            if !done {
                let error = self.unexpected(current);
                return Err(self.fail(vec![identifier], comments, error));
            }
        }
        Ok(Some((label, current, comments)))
    }

    fn read_break_statement(&mut self, source: &str, cursor: &mut SourcePosition) -> ReadResult {
        let start = *cursor;
        match self.read_jump_statement("break", source, cursor)? {
            Some((label, end, comments)) => {
                *cursor = end;
                Ok(Some(self.finish(
                    NodeKind::BreakStatement { label },
                    start,
                    end,
                    comments,
                )))
            }
            None => Ok(None),
        }
    }

    fn read_continue_statement(
        &mut self,
        source: &str,
        cursor: &mut SourcePosition,
    ) -> ReadResult {
        let start = *cursor;
        match self.read_jump_statement("continue", source, cursor)? {
            Some((label, end, comments)) => {
                *cursor = end;
                Ok(Some(self.finish(
                    NodeKind::ContinueStatement { label },
                    start,
                    end,
                    comments,
                )))
            }
            None => Ok(None),
        }
    }

    fn read_parenthesized_expression(
        &mut self,
        source: &str,
        cursor: &mut SourcePosition,
        comments: &mut Vec<NodeId>,
    ) -> Result<NodeId, NodeId> {
        if let Err(error) = self.trivia(source, cursor, comments) {
            return Err(error);
        }
        if self.check_symbol(&["("], source, cursor).is_none() {
            return Err(self.unexpected(*cursor));
        }
        if let Err(error) = self.trivia(source, cursor, comments) {
            return Err(error);
        }
        let expression = match self.read_expression(source, cursor) {
            Ok(Some(id)) => id,
            Ok(None) => return Err(self.unexpected(*cursor)),
            Err(error) => return Err(error),
        };
        if let Err(error) = self.trivia(source, cursor, comments) {
            self.arena.dispose(expression);
            return Err(error);
        }
        if self.check_symbol(&[")"], source, cursor).is_none() {
            self.arena.dispose(expression);
            return Err(self.unexpected(*cursor));
        }
        Ok(expression)
    }

    fn read_if_statement(&mut self, source: &str, cursor: &mut SourcePosition) -> ReadResult {
        let start = *cursor;
        let mut current = *cursor;
        if self
            .check_identifier(&["if"], source, &mut current)
            .is_none()
        {
            return Ok(None);
        }
        let mut comments = Vec::new();
        let condition = match self.read_parenthesized_expression(source, &mut current, &mut comments)
        {
            Ok(id) => id,
            Err(error) => return Err(self.fail(vec![], comments, error)),
        };
        if let Err(error) = self.trivia(source, &mut current, &mut comments) {
            return Err(self.fail(vec![condition], comments, error));
        }
        let consequent = match self.read_statement(source, &mut current) {
            Ok(Some(id)) => id,
            Ok(None) => {
                let error = self.unexpected(current);
                return Err(self.fail(vec![condition], comments, error));
            }
            Err(error) => return Err(self.fail(vec![condition], comments, error)),
        };
        let mut alternate = None;
        let mut probe = current;
        let mut else_comments = Vec::new();
        if self.probe_trivia(source, &mut probe, &mut else_comments)
            && self
                .check_identifier(&["else"], source, &mut probe)
                .is_some()
        {
            comments.append(&mut else_comments);
            current = probe;
            if let Err(error) = self.trivia(source, &mut current, &mut comments) {
                return Err(self.fail(vec![condition, consequent], comments, error));
            }
            let branch = match self.read_statement(source, &mut current) {
                Ok(Some(id)) => id,
                Ok(None) => {
                    let error = self.unexpected(current);
                    return Err(self.fail(vec![condition, consequent], comments, error));
                }
                Err(error) => return Err(self.fail(vec![condition, consequent], comments, error)),
            };
            alternate = Some(branch);
        } else {
            self.give_up(vec![], else_comments);
        }
        *cursor = current;
        Ok(Some(self.finish(
            NodeKind::IfStatement {
                condition,
                consequent,
                alternate,
            },
            start,
            current,
            comments,
        )))
    }

    fn read_switch_case(&mut self, source: &str, cursor: &mut SourcePosition) -> ReadResult {
        let start = *cursor;
        let mut current = *cursor;
        let mut comments = Vec::new();
        let mut matcher = None;
        if self
            .check_identifier(&["case"], source, &mut current)
            .is_some()
        {
            if let Err(error) = self.trivia(source, &mut current, &mut comments) {
                return Err(self.fail(vec![], comments, error));
            }
            let expression = match self.read_expression(source, &mut current) {
                Ok(Some(id)) => id,
                Ok(None) => {
                    let error = self.unexpected(current);
                    return Err(self.fail(vec![], comments, error));
                }
                Err(error) => return Err(self.fail(vec![], comments, error)),
            };
            matcher = Some(expression);
        } else if self
            .check_identifier(&["default"], source, &mut current)
            .is_none()
        {
            self.give_up(vec![], comments);
            return Ok(None);
        }
        if let Err(error) = self.trivia(source, &mut current, &mut comments) {
            let owned: Vec<NodeId> = matcher.into_iter().collect();
            return Err(self.fail(owned, comments, error));
        }
        if self.check_symbol(&[":"], source, &mut current).is_none() {
            let owned: Vec<NodeId> = matcher.into_iter().collect();
            let error = self.unexpected(current);
            return Err(self.fail(owned, comments, error));
        }
        let mut statements = Vec::new();
        loop {
            if let Err(error) = self.trivia(source, &mut current, &mut comments) {
                let mut owned: Vec<NodeId> = matcher.into_iter().collect();
                owned.extend(statements);
                return Err(self.fail(owned, comments, error));
            }
            let mut probe = current;
            if self
                .check_identifier(&["case", "default"], source, &mut probe)
                .is_some()
            {
                break;
            }
            if self.check_symbol(&["}"], source, &mut probe).is_some() {
                break;
            }
            match self.read_statement(source, &mut current) {
                Ok(Some(statement)) => statements.push(statement),
                Ok(None) => break,
                Err(error) => {
                    let mut owned: Vec<NodeId> = matcher.into_iter().collect();
                    owned.extend(statements);
                    return Err(self.fail(owned, comments, error));
                }
            }
        }
        *cursor = current;
        Ok(Some(self.finish(
            NodeKind::SwitchCase {
                matcher,
                statements,
            },
            start,
            current,
            comments,
        )))
    }

    fn read_switch_statement(&mut self, source: &str, cursor: &mut SourcePosition) -> ReadResult {
        let start = *cursor;
        let mut current = *cursor;
        if self
            .check_identifier(&["switch"], source, &mut current)
            .is_none()
        {
            return Ok(None);
        }
        let mut comments = Vec::new();
        let condition = match self.read_parenthesized_expression(source, &mut current, &mut comments)
        {
            Ok(id) => id,
            Err(error) => return Err(self.fail(vec![], comments, error)),
        };
        let scope = self.push_scope(ScopeKind::Block);
        if let Err(error) = self.trivia(source, &mut current, &mut comments) {
            self.pop_scope();
            return Err(self.fail(vec![condition], comments, error));
        }
        if self.check_symbol(&["{"], source, &mut current).is_none() {
            self.pop_scope();
            let error = self.unexpected(current);
            return Err(self.fail(vec![condition], comments, error));
        }
        let mut cases = Vec::new();
        loop {
            if let Err(error) = self.trivia(source, &mut current, &mut comments) {
                self.pop_scope();
                let mut owned = vec![condition];
                owned.extend(cases);
                return Err(self.fail(owned, comments, error));
            }
            match self.read_switch_case(source, &mut current) {
                Ok(Some(case)) => cases.push(case),
                Ok(None) => break,
                Err(error) => {
                    self.pop_scope();
                    let mut owned = vec![condition];
                    owned.extend(cases);
                    return Err(self.fail(owned, comments, error));
                }
            }
        }
        if self.check_symbol(&["}"], source, &mut current).is_none() {
            self.pop_scope();
            let mut owned = vec![condition];
            owned.extend(cases);
            let error = self.unexpected(current);
            return Err(self.fail(owned, comments, error));
        }
        self.pop_scope();
        let node = self.finish(
            NodeKind::SwitchStatement { condition, cases },
            start,
            current,
            comments,
        );
        self.attach_scope(scope, node);
        *cursor = current;
        Ok(Some(node))
    }

    fn read_throw_statement(&mut self, source: &str, cursor: &mut SourcePosition) -> ReadResult {
        let start = *cursor;
        let mut current = *cursor;
        if self
            .check_identifier(&["throw"], source, &mut current)
            .is_none()
        {
            return Ok(None);
        }
        let mut comments = Vec::new();
        if let Err(error) = self.trivia(source, &mut current, &mut comments) {
            return Err(self.fail(vec![], comments, error));
        }
        let value = match self.read_expression(source, &mut current) {
            Ok(Some(id)) => id,
            Ok(None) => {
                let error = self.unexpected(current);
                return Err(self.fail(vec![], comments, error));
            }
            Err(error) => return Err(self.fail(vec![], comments, error)),
        };
        let terminated = match self.read_statement_end(source, &mut current, &mut comments) {
            Ok(terminated) => terminated,
            Err(error) => return Err(self.fail(vec![value], comments, error)),
        };
        if !terminated {
            let error = self.unexpected(current);
            return Err(self.fail(vec![value], comments, error));
        }
        *cursor = current;
        Ok(Some(self.finish(
            NodeKind::ThrowStatement { value },
            start,
            current,
            comments,
        )))
    }

    fn read_try_catch_statement(
        &mut self,
        source: &str,
        cursor: &mut SourcePosition,
    ) -> ReadResult {
        let start = *cursor;
        let mut current = *cursor;
        if self
            .check_identifier(&["catch"], source, &mut current)
            .is_none()
        {
            return Ok(None);
        }
        let scope = self.push_scope(ScopeKind::Block);
        let mut comments = Vec::new();
        if let Err(error) = self.trivia(source, &mut current, &mut comments) {
            self.pop_scope();
            return Err(self.fail(vec![], comments, error));
        }
        let mut identifier = None;
        if self.check_symbol(&["("], source, &mut current).is_some() {
            if let Err(error) = self.trivia(source, &mut current, &mut comments) {
                self.pop_scope();
                return Err(self.fail(vec![], comments, error));
            }
            let pattern = match self.read_pattern(source, &mut current) {
                Ok(Some(id)) => id,
                Ok(None) => {
                    self.pop_scope();
                    let error = self.unexpected(current);
                    return Err(self.fail(vec![], comments, error));
                }
                Err(error) => {
                    self.pop_scope();
                    return Err(self.fail(vec![], comments, error));
                }
            };
            if let Err(error) = self.resolve_declarator(DeclarationKind::Let, source, pattern, pattern)
            {
                self.pop_scope();
                return Err(self.fail(vec![pattern], comments, error));
            }
            if let Err(error) = self.trivia(source, &mut current, &mut comments) {
                self.pop_scope();
                return Err(self.fail(vec![pattern], comments, error));
            }
            if self.check_symbol(&[")"], source, &mut current).is_none() {
                self.pop_scope();
                let error = self.unexpected(current);
                return Err(self.fail(vec![pattern], comments, error));
            }
            identifier = Some(pattern);
        }
        if let Err(error) = self.trivia(source, &mut current, &mut comments) {
            self.pop_scope();
            let owned: Vec<NodeId> = identifier.into_iter().collect();
            return Err(self.fail(owned, comments, error));
        }
        let body = match self.read_block_statement(source, &mut current) {
            Ok(Some(id)) => id,
            Ok(None) => {
                self.pop_scope();
                let owned: Vec<NodeId> = identifier.into_iter().collect();
                let error = self.unexpected(current);
                return Err(self.fail(owned, comments, error));
            }
            Err(error) => {
                self.pop_scope();
                let owned: Vec<NodeId> = identifier.into_iter().collect();
                return Err(self.fail(owned, comments, error));
            }
        };
        self.pop_scope();
        let node = self.finish(
            NodeKind::TryCatchStatement { identifier, body },
            start,
            current,
            comments,
        );
        self.attach_scope(scope, node);
        *cursor = current;
        Ok(Some(node))
    }

    fn read_try_statement(&mut self, source: &str, cursor: &mut SourcePosition) -> ReadResult {
        let start = *cursor;
        let mut current = *cursor;
        if self
            .check_identifier(&["try"], source, &mut current)
            .is_none()
        {
            return Ok(None);
        }
        let mut comments = Vec::new();
        if let Err(error) = self.trivia(source, &mut current, &mut comments) {
            return Err(self.fail(vec![], comments, error));
        }
        let body = match self.read_block_statement(source, &mut current) {
            Ok(Some(id)) => id,
            Ok(None) => {
                let error = self.unexpected(current);
                return Err(self.fail(vec![], comments, error));
            }
            Err(error) => return Err(self.fail(vec![], comments, error)),
        };
        if let Err(error) = self.trivia(source, &mut current, &mut comments) {
            return Err(self.fail(vec![body], comments, error));
        }
        let on_error = match self.read_try_catch_statement(source, &mut current) {
            Ok(handler) => handler,
            Err(error) => return Err(self.fail(vec![body], comments, error)),
        };
        if let Err(error) = self.trivia(source, &mut current, &mut comments) {
            let mut owned = vec![body];
            owned.extend(on_error);
            return Err(self.fail(owned, comments, error));
        }
        let mut on_finish = None;
        if self
            .check_identifier(&["finally"], source, &mut current)
            .is_some()
        {
            if let Err(error) = self.trivia(source, &mut current, &mut comments) {
                let mut owned = vec![body];
                owned.extend(on_error);
                return Err(self.fail(owned, comments, error));
            }
            let finalizer = match self.read_block_statement(source, &mut current) {
                Ok(Some(id)) => id,
                Ok(None) => {
                    let mut owned = vec![body];
                    owned.extend(on_error);
                    let error = self.unexpected(current);
                    return Err(self.fail(owned, comments, error));
                }
                Err(error) => {
                    let mut owned = vec![body];
                    owned.extend(on_error);
                    return Err(self.fail(owned, comments, error));
                }
            };
            on_finish = Some(finalizer);
        }
        if on_error.is_none() && on_finish.is_none() {
            let error = self.error("Missing catch or finally after try", current);
            return Err(self.fail(vec![body], comments, error));
        }
        *cursor = current;
        Ok(Some(self.finish(
            NodeKind::TryStatement {
                body,
                on_error,
                on_finish,
            },
            start,
            current,
            comments,
        )))
    }

    fn read_while_statement(&mut self, source: &str, cursor: &mut SourcePosition) -> ReadResult {
        let start = *cursor;
        let mut current = *cursor;
        if self
            .check_identifier(&["while"], source, &mut current)
            .is_none()
        {
            return Ok(None);
        }
        let mut comments = Vec::new();
        let condition = match self.read_parenthesized_expression(source, &mut current, &mut comments)
        {
            Ok(id) => id,
            Err(error) => return Err(self.fail(vec![], comments, error)),
        };
        if let Err(error) = self.trivia(source, &mut current, &mut comments) {
            return Err(self.fail(vec![condition], comments, error));
        }
        let body = match self.read_statement(source, &mut current) {
            Ok(Some(id)) => id,
            Ok(None) => {
                let error = self.unexpected(current);
                return Err(self.fail(vec![condition], comments, error));
            }
            Err(error) => return Err(self.fail(vec![condition], comments, error)),
        };
        *cursor = current;
        Ok(Some(self.finish(
            NodeKind::WhileStatement { condition, body },
            start,
            current,
            comments,
        )))
    }

    fn read_do_while_statement(
        &mut self,
        source: &str,
        cursor: &mut SourcePosition,
    ) -> ReadResult {
        let start = *cursor;
        let mut current = *cursor;
        if self
            .check_identifier(&["do"], source, &mut current)
            .is_none()
        {
            return Ok(None);
        }
        let mut comments = Vec::new();
        if let Err(error) = self.trivia(source, &mut current, &mut comments) {
            return Err(self.fail(vec![], comments, error));
        }
        let body = match self.read_statement(source, &mut current) {
            Ok(Some(id)) => id,
            Ok(None) => {
                let error = self.unexpected(current);
                return Err(self.fail(vec![], comments, error));
            }
            Err(error) => return Err(self.fail(vec![], comments, error)),
        };
        if let Err(error) = self.trivia(source, &mut current, &mut comments) {
            return Err(self.fail(vec![body], comments, error));
        }
        if self
            .check_identifier(&["while"], source, &mut current)
            .is_none()
        {
            let error = self.unexpected(current);
            return Err(self.fail(vec![body], comments, error));
        }
        let condition = match self.read_parenthesized_expression(source, &mut current, &mut comments)
        {
            Ok(id) => id,
            Err(error) => return Err(self.fail(vec![body], comments, error)),
        };
        let terminated = match self.read_statement_end(source, &mut current, &mut comments) {
            Ok(terminated) => terminated,
            Err(error) => return Err(self.fail(vec![body, condition], comments, error)),
        };
        if !terminated {
            let error = self.unexpected(current);
            return Err(self.fail(vec![body, condition], comments, error));
        }
        *cursor = current;
        Ok(Some(self.finish(
            NodeKind::DoWhileStatement { body, condition },
            start,
            current,
            comments,
        )))
    }

    fn read_expression_statement(
        &mut self,
        source: &str,
        cursor: &mut SourcePosition,
    ) -> ReadResult {
        let start = *cursor;
        let mut current = *cursor;
        let Some(expression) = self.read_expression(source, &mut current)? else {
            return Ok(None);
        };
        let mut comments = Vec::new();
        let terminated = match self.read_statement_end(source, &mut current, &mut comments) {
            Ok(terminated) => terminated,
            Err(error) => return Err(self.fail(vec![expression], comments, error)),
        };
        if !terminated {
            let error = self.unexpected(current);
            return Err(self.fail(vec![expression], comments, error));
        }
        *cursor = current;
        Ok(Some(self.finish(
            NodeKind::ExpressionStatement { expression },
            start,
            current,
            comments,
        )))
    }
}

// Loop-head declarations, variable declarations, modules.
impl Parser {
    fn read_variable_declaration(
        &mut self,
        source: &str,
        cursor: &mut SourcePosition,
    ) -> ReadResult {
        let start = *cursor;
        let mut current = *cursor;
        let kind = if self
            .check_identifier(&["var"], source, &mut current)
            .is_some()
        {
            DeclarationKind::Var
        } else if self
            .check_identifier(&["let"], source, &mut current)
            .is_some()
        {
            DeclarationKind::Let
        } else if self
            .check_identifier(&["const"], source, &mut current)
            .is_some()
        {
            DeclarationKind::Const
        } else {
            return Ok(None);
        };
        let mut comments = Vec::new();
        let mut declarations = Vec::new();
        loop {
            if let Err(error) = self.trivia(source, &mut current, &mut comments) {
                return Err(self.fail(declarations, comments, error));
            }
            let declarator = match self.read_variable_declarator(source, &mut current) {
                Ok(Some(id)) => id,
                Ok(None) => {
                    let error = self.unexpected(current);
                    return Err(self.fail(declarations, comments, error));
                }
                Err(error) => return Err(self.fail(declarations, comments, error)),
            };
            declarations.push(declarator);
            if let Err(error) = self.declare_variable(kind, source, declarator) {
                return Err(self.fail(declarations, comments, error));
            }
            let mut probe = current;
            let mut probe_comments = Vec::new();
            let trivia_ok = self.probe_trivia(source, &mut probe, &mut probe_comments);
            if trivia_ok && self.check_symbol(&[","], source, &mut probe).is_some() {
                comments.append(&mut probe_comments);
                current = probe;
                continue;
            }
            self.give_up(vec![], probe_comments);
            break;
        }
        *cursor = current;
        Ok(Some(self.finish(
            NodeKind::VariableDeclaration { kind, declarations },
            start,
            current,
            comments,
        )))
    }

    fn read_variable_declarator(
        &mut self,
        source: &str,
        cursor: &mut SourcePosition,
    ) -> ReadResult {
        let start = *cursor;
        let mut current = *cursor;
        let Some(identifier) = self.read_pattern(source, &mut current)? else {
            return Ok(None);
        };
        let mut comments = Vec::new();
        let mut initializer = None;
        let mut probe = current;
        let mut probe_comments = Vec::new();
        let trivia_ok = self.probe_trivia(source, &mut probe, &mut probe_comments);
        if trivia_ok && self.check_symbol(&["="], source, &mut probe).is_some() {
            comments.append(&mut probe_comments);
            current = probe;
            if let Err(error) = self.trivia(source, &mut current, &mut comments) {
                return Err(self.fail(vec![identifier], comments, error));
            }
            let value = match self.read_expression2(source, &mut current) {
                Ok(Some(id)) => id,
                Ok(None) => {
                    let error = self.unexpected(current);
                    return Err(self.fail(vec![identifier], comments, error));
                }
                Err(error) => return Err(self.fail(vec![identifier], comments, error)),
            };
            initializer = Some(value);
        } else {
            self.give_up(vec![], probe_comments);
        }
        *cursor = current;
        Ok(Some(self.finish(
            NodeKind::VariableDeclarator {
                identifier,
                initializer,
            },
            start,
            current,
            comments,
        )))
    }

    fn read_variable_declaration_statement(
        &mut self,
        source: &str,
        cursor: &mut SourcePosition,
    ) -> ReadResult {
        let mut current = *cursor;
        let Some(node) = self.read_variable_declaration(source, &mut current)? else {
            return Ok(None);
        };
        let mut comments = Vec::new();
        let terminated = match self.read_statement_end(source, &mut current, &mut comments) {
            Ok(terminated) => terminated,
            Err(error) => return Err(self.fail(vec![node], comments, error)),
        };
        if !terminated {
            let error = self.unexpected(current);
            return Err(self.fail(vec![node], comments, error));
        }
        self.arena.node_mut(node).comments.append(&mut comments);
        self.arena.node_mut(node).span.end = current;
        *cursor = current;
        Ok(Some(node))
    }

    fn read_for_head(
        &mut self,
        source: &str,
        cursor: &mut SourcePosition,
        comments: &mut Vec<NodeId>,
    ) -> Result<Option<NodeId>, NodeId> {
        // Loop binding: a declaration, a pattern, or a member target.
        if let Some(declaration) = self.read_variable_declaration(source, cursor)? {
            return Ok(Some(declaration));
        }
        if let Err(error) = self.trivia(source, cursor, comments) {
            return Err(error);
        }
        self.read_pattern(source, cursor)
    }

    fn read_for_in_of(
        &mut self,
        keyword: &str,
        is_await: bool,
        source: &str,
        cursor: &mut SourcePosition,
    ) -> ReadResult {
        let start = *cursor;
        let mut current = *cursor;
        if self
            .check_identifier(&["for"], source, &mut current)
            .is_none()
        {
            return Ok(None);
        }
        let mut comments = Vec::new();
        if let Err(error) = self.trivia(source, &mut current, &mut comments) {
            return Err(self.fail(vec![], comments, error));
        }
        if is_await {
            if self
                .check_identifier(&["await"], source, &mut current)
                .is_none()
            {
                self.give_up(vec![], comments);
                return Ok(None);
            }
            if let Err(error) = self.trivia(source, &mut current, &mut comments) {
                return Err(self.fail(vec![], comments, error));
            }
        }
        if self.check_symbol(&["("], source, &mut current).is_none() {
            self.give_up(vec![], comments);
            return Ok(None);
        }
        let scope = self.push_scope(ScopeKind::Block);
        if let Err(error) = self.trivia(source, &mut current, &mut comments) {
            self.pop_scope();
            return Err(self.fail(vec![], comments, error));
        }
        let left = match self.read_for_head(source, &mut current, &mut comments) {
            Ok(Some(id)) => id,
            Ok(None) => {
                self.pop_scope();
                self.give_up(vec![], comments);
                return Ok(None);
            }
            Err(error) => {
                self.pop_scope();
                return Err(self.fail(vec![], comments, error));
            }
        };
        if let Err(error) = self.trivia(source, &mut current, &mut comments) {
            self.pop_scope();
            return Err(self.fail(vec![left], comments, error));
        }
        let matched = if keyword == "in" {
            self.check_identifier(&["in"], source, &mut current).is_some()
        } else {
            self.check_identifier(&["of"], source, &mut current).is_some()
        };
        if !matched {
            self.pop_scope();
            self.give_up(vec![left], comments);
            return Ok(None);
        }
        if let Err(error) = self.trivia(source, &mut current, &mut comments) {
            self.pop_scope();
            return Err(self.fail(vec![left], comments, error));
        }
        let right = match self.read_expression(source, &mut current) {
            Ok(Some(id)) => id,
            Ok(None) => {
                self.pop_scope();
                let error = self.unexpected(current);
                return Err(self.fail(vec![left], comments, error));
            }
            Err(error) => {
                self.pop_scope();
                return Err(self.fail(vec![left], comments, error));
            }
        };
        if let Err(error) = self.trivia(source, &mut current, &mut comments) {
            self.pop_scope();
            return Err(self.fail(vec![left, right], comments, error));
        }
        if self.check_symbol(&[")"], source, &mut current).is_none() {
            self.pop_scope();
            let error = self.unexpected(current);
            return Err(self.fail(vec![left, right], comments, error));
        }
        if let Err(error) = self.trivia(source, &mut current, &mut comments) {
            self.pop_scope();
            return Err(self.fail(vec![left, right], comments, error));
        }
        let body = match self.read_statement(source, &mut current) {
            Ok(Some(id)) => id,
            Ok(None) => {
                self.pop_scope();
                let error = self.unexpected(current);
                return Err(self.fail(vec![left, right], comments, error));
            }
            Err(error) => {
                self.pop_scope();
                return Err(self.fail(vec![left, right], comments, error));
            }
        };
        self.pop_scope();
        let kind = if is_await {
            NodeKind::ForAwaitOfStatement { left, right, body }
        } else if keyword == "in" {
            NodeKind::ForInStatement { left, right, body }
        } else {
            NodeKind::ForOfStatement { left, right, body }
        };
        let node = self.finish(kind, start, current, comments);
        self.attach_scope(scope, node);
        *cursor = current;
        Ok(Some(node))
    }

    fn read_for_await_of_statement(
        &mut self,
        source: &str,
        cursor: &mut SourcePosition,
    ) -> ReadResult {
        self.read_for_in_of("of", true, source, cursor)
    }

    fn read_for_in_statement(&mut self, source: &str, cursor: &mut SourcePosition) -> ReadResult {
        self.read_for_in_of("in", false, source, cursor)
    }

    fn read_for_of_statement(&mut self, source: &str, cursor: &mut SourcePosition) -> ReadResult {
        self.read_for_in_of("of", false, source, cursor)
    }

    fn read_for_statement(&mut self, source: &str, cursor: &mut SourcePosition) -> ReadResult {
        let start = *cursor;
        let mut current = *cursor;
        if self
            .check_identifier(&["for"], source, &mut current)
            .is_none()
        {
            return Ok(None);
        }
        let mut comments = Vec::new();
        if let Err(error) = self.trivia(source, &mut current, &mut comments) {
            return Err(self.fail(vec![], comments, error));
        }
        if self.check_symbol(&["("], source, &mut current).is_none() {
            let error = self.unexpected(current);
            return Err(self.fail(vec![], comments, error));
        }
        let scope = self.push_scope(ScopeKind::Block);
        let mut owned: Vec<NodeId> = Vec::new();
        if let Err(error) = self.trivia(source, &mut current, &mut comments) {
            self.pop_scope();
            return Err(self.fail(owned, comments, error));
        }
        let mut init = None;
        if self.check_symbol(&[";"], source, &mut current).is_none() {
            let head = match self.read_variable_declaration(source, &mut current) {
                Ok(Some(id)) => Some(id),
                Ok(None) => match self.read_expression(source, &mut current) {
                    Ok(head) => head,
                    Err(error) => {
                        self.pop_scope();
                        return Err(self.fail(owned, comments, error));
                    }
                },
                Err(error) => {
                    self.pop_scope();
                    return Err(self.fail(owned, comments, error));
                }
            };
            let Some(head) = head else {
                self.pop_scope();
                let error = self.unexpected(current);
                return Err(self.fail(owned, comments, error));
            };
            init = Some(head);
            owned.push(head);
            if let Err(error) = self.trivia(source, &mut current, &mut comments) {
                self.pop_scope();
                return Err(self.fail(owned, comments, error));
            }
            if self.check_symbol(&[";"], source, &mut current).is_none() {
                self.pop_scope();
                let error = self.unexpected(current);
                return Err(self.fail(owned, comments, error));
            }
        }
        if let Err(error) = self.trivia(source, &mut current, &mut comments) {
            self.pop_scope();
            return Err(self.fail(owned, comments, error));
        }
        let mut condition = None;
        if self.check_symbol(&[";"], source, &mut current).is_none() {
            let test = match self.read_expression(source, &mut current) {
                Ok(Some(id)) => id,
                Ok(None) => {
                    self.pop_scope();
                    let error = self.unexpected(current);
                    return Err(self.fail(owned, comments, error));
                }
                Err(error) => {
                    self.pop_scope();
                    return Err(self.fail(owned, comments, error));
                }
            };
            condition = Some(test);
            owned.push(test);
            if let Err(error) = self.trivia(source, &mut current, &mut comments) {
                self.pop_scope();
                return Err(self.fail(owned, comments, error));
            }
            if self.check_symbol(&[";"], source, &mut current).is_none() {
                self.pop_scope();
                let error = self.unexpected(current);
                return Err(self.fail(owned, comments, error));
            }
        }
        if let Err(error) = self.trivia(source, &mut current, &mut comments) {
            self.pop_scope();
            return Err(self.fail(owned, comments, error));
        }
        let mut update = None;
        if self.check_symbol(&[")"], source, &mut current).is_none() {
            let step = match self.read_expression(source, &mut current) {
                Ok(Some(id)) => id,
                Ok(None) => {
                    self.pop_scope();
                    let error = self.unexpected(current);
                    return Err(self.fail(owned, comments, error));
                }
                Err(error) => {
                    self.pop_scope();
                    return Err(self.fail(owned, comments, error));
                }
            };
            update = Some(step);
            owned.push(step);
            if let Err(error) = self.trivia(source, &mut current, &mut comments) {
                self.pop_scope();
                return Err(self.fail(owned, comments, error));
            }
            if self.check_symbol(&[")"], source, &mut current).is_none() {
                self.pop_scope();
                let error = self.unexpected(current);
                return Err(self.fail(owned, comments, error));
            }
        }
        if let Err(error) = self.trivia(source, &mut current, &mut comments) {
            self.pop_scope();
            return Err(self.fail(owned, comments, error));
        }
        let body = match self.read_statement(source, &mut current) {
            Ok(Some(id)) => id,
            Ok(None) => {
                self.pop_scope();
                let error = self.unexpected(current);
                return Err(self.fail(owned, comments, error));
            }
            Err(error) => {
                self.pop_scope();
                return Err(self.fail(owned, comments, error));
            }
        };
        self.pop_scope();
        let node = self.finish(
            NodeKind::ForStatement {
                init,
                condition,
                update,
                body,
            },
            start,
            current,
            comments,
        );
        self.attach_scope(scope, node);
        *cursor = current;
        Ok(Some(node))
    }

    fn read_import_declaration(
        &mut self,
        source: &str,
        cursor: &mut SourcePosition,
    ) -> ReadResult {
        let start = *cursor;
        let mut current = *cursor;
        if self
            .check_identifier(&["import"], source, &mut current)
            .is_none()
        {
            return Ok(None);
        }
        let mut comments = Vec::new();
        if let Err(error) = self.trivia(source, &mut current, &mut comments) {
            return Err(self.fail(vec![], comments, error));
        }
        let mut specifiers: Vec<NodeId> = Vec::new();
        // Bare `import "module"` has no specifiers at all.
        let bare = peek(source, &current) == Some('"') || peek(source, &current) == Some('\'');
        if !bare {
            let mut expect_from = false;
            if self.check_symbol(&["*"], source, &mut current).is_some() {
                let spec_start = current;
                if let Err(error) = self.trivia(source, &mut current, &mut comments) {
                    return Err(self.fail(specifiers, comments, error));
                }
                if self
                    .check_identifier(&["as"], source, &mut current)
                    .is_none()
                {
                    let error = self.unexpected(current);
                    return Err(self.fail(specifiers, comments, error));
                }
                if let Err(error) = self.trivia(source, &mut current, &mut comments) {
                    return Err(self.fail(specifiers, comments, error));
                }
                let Some(alias) = self.read_identifier_literal(source, &mut current) else {
                    let error = self.unexpected(current);
                    return Err(self.fail(specifiers, comments, error));
                };
                let namespace = self.finish(
                    NodeKind::ImportNamespace { alias },
                    spec_start,
                    current,
                    Vec::new(),
                );
                specifiers.push(namespace);
                expect_from = true;
            } else if let Some(default_identifier) =
                self.read_identifier_literal(source, &mut current)
            {
                let text = self
                    .arena
                    .node(default_identifier)
                    .span
                    .slice(source)
                    .to_string();
                if is_keyword(&text) {
                    let at = self.arena.node(default_identifier).span.start;
                    let error = self.unexpected(at);
                    return Err(self.fail(vec![default_identifier], comments, error));
                }
                let spec_start = self.arena.node(default_identifier).span.start;
                let default = self.finish(
                    NodeKind::ImportDefault {
                        identifier: default_identifier,
                    },
                    spec_start,
                    current,
                    Vec::new(),
                );
                specifiers.push(default);
                expect_from = true;
                let mut probe = current;
                let mut probe_comments = Vec::new();
                let trivia_ok = self.probe_trivia(source, &mut probe, &mut probe_comments);
                if trivia_ok && self.check_symbol(&[","], source, &mut probe).is_some() {
                    comments.append(&mut probe_comments);
                    current = probe;
                    if let Err(error) = self.trivia(source, &mut current, &mut comments) {
                        return Err(self.fail(specifiers, comments, error));
                    }
                    match self.read_import_specifiers(source, &mut current, &mut specifiers) {
                        Ok(()) => {}
                        Err(error) => return Err(self.fail(specifiers, comments, error)),
                    }
                } else {
                    self.give_up(vec![], probe_comments);
                }
            } else if peek(source, &current) == Some('{') {
                match self.read_import_specifiers(source, &mut current, &mut specifiers) {
                    Ok(()) => {}
                    Err(error) => return Err(self.fail(specifiers, comments, error)),
                }
                expect_from = true;
            } else {
                let error = self.unexpected(current);
                return Err(self.fail(specifiers, comments, error));
            }
            if expect_from {
                if let Err(error) = self.trivia(source, &mut current, &mut comments) {
                    return Err(self.fail(specifiers, comments, error));
                }
                if self
                    .check_identifier(&["from"], source, &mut current)
                    .is_none()
                {
                    let error = self.unexpected(current);
                    return Err(self.fail(specifiers, comments, error));
                }
                if let Err(error) = self.trivia(source, &mut current, &mut comments) {
                    return Err(self.fail(specifiers, comments, error));
                }
            }
        }
        let module = match self.read_string_literal(source, &mut current) {
            Ok(Some(id)) => id,
            Ok(None) => {
                let error = self.unexpected(current);
                return Err(self.fail(specifiers, comments, error));
            }
            Err(error) => return Err(self.fail(specifiers, comments, error)),
        };
        let mut attributes = Vec::new();
        let mut probe = current;
        let mut probe_comments = Vec::new();
        let trivia_ok = self.probe_trivia(source, &mut probe, &mut probe_comments);
        if trivia_ok
            && self
                .check_identifier(&["assert"], source, &mut probe)
                .is_some()
        {
            comments.append(&mut probe_comments);
            current = probe;
            match self.read_import_attributes(source, &mut current, &mut attributes) {
                Ok(()) => {}
                Err(error) => {
                    let mut owned = specifiers;
                    owned.push(module);
                    owned.extend(attributes);
                    return Err(self.fail(owned, comments, error));
                }
            }
        } else {
            self.give_up(vec![], probe_comments);
        }
        let terminated = match self.read_statement_end(source, &mut current, &mut comments) {
            Ok(terminated) => terminated,
            Err(error) => {
                let mut owned = specifiers;
                owned.push(module);
                owned.extend(attributes);
                return Err(self.fail(owned, comments, error));
            }
        };
        if !terminated {
            let mut owned = specifiers;
            owned.push(module);
            owned.extend(attributes);
            let error = self.unexpected(current);
            return Err(self.fail(owned, comments, error));
        }
        let node = self.finish(
            NodeKind::ImportDeclaration {
                specifiers: specifiers.clone(),
                source: module,
                attributes,
            },
            start,
            current,
            comments,
        );
        for specifier in specifiers {
            if let Err(error) = self.declare_variable(DeclarationKind::Const, source, specifier) {
                self.arena.dispose(node);
                return Err(error);
            }
        }
        *cursor = current;
        Ok(Some(node))
    }

    fn read_import_specifiers(
        &mut self,
        source: &str,
        cursor: &mut SourcePosition,
        specifiers: &mut Vec<NodeId>,
    ) -> Result<(), NodeId> {
        if self.check_symbol(&["{"], source, cursor).is_none() {
            return Err(self.unexpected(*cursor));
        }
        let mut comments = Vec::new();
        loop {
            if let Err(error) = self.trivia(source, cursor, &mut comments) {
                return Err(self.fail(vec![], comments, error));
            }
            if self.check_symbol(&["}"], source, cursor).is_some() {
                break;
            }
            let spec_start = *cursor;
            let identifier = match self.read_string_literal(source, cursor) {
                Ok(Some(id)) => id,
                Ok(None) => match self.read_identifier_literal(source, cursor) {
                    Some(id) => id,
                    None => {
                        let error = self.unexpected(*cursor);
                        return Err(self.fail(vec![], comments, error));
                    }
                },
                Err(error) => return Err(self.fail(vec![], comments, error)),
            };
            let mut alias = None;
            let mut probe = *cursor;
            let mut probe_comments = Vec::new();
            let trivia_ok = self.probe_trivia(source, &mut probe, &mut probe_comments);
            if trivia_ok
                && self
                    .check_identifier(&["as"], source, &mut probe)
                    .is_some()
            {
                comments.append(&mut probe_comments);
                *cursor = probe;
                if let Err(error) = self.trivia(source, cursor, &mut comments) {
                    return Err(self.fail(vec![identifier], comments, error));
                }
                let Some(name) = self.read_identifier_literal(source, cursor) else {
                    let error = self.unexpected(*cursor);
                    return Err(self.fail(vec![identifier], comments, error));
                };
                alias = Some(name);
            } else {
                self.give_up(vec![], probe_comments);
            }
            let specifier = self.finish(
                NodeKind::ImportSpecifier { identifier, alias },
                spec_start,
                *cursor,
                Vec::new(),
            );
            specifiers.push(specifier);
            if let Err(error) = self.trivia(source, cursor, &mut comments) {
                return Err(self.fail(vec![], comments, error));
            }
            if self.check_symbol(&[","], source, cursor).is_none() {
                if self.check_symbol(&["}"], source, cursor).is_none() {
                    let error = self.unexpected(*cursor);
                    return Err(self.fail(vec![], comments, error));
                }
                break;
            }
        }
        self.give_up(vec![], comments);
        Ok(())
    }

    fn read_import_attributes(
        &mut self,
        source: &str,
        cursor: &mut SourcePosition,
        attributes: &mut Vec<NodeId>,
    ) -> Result<(), NodeId> {
        let mut comments = Vec::new();
        if let Err(error) = self.trivia(source, cursor, &mut comments) {
            return Err(self.fail(vec![], comments, error));
        }
        if self.check_symbol(&["{"], source, cursor).is_none() {
            let error = self.unexpected(*cursor);
            return Err(self.fail(vec![], comments, error));
        }
        loop {
            if let Err(error) = self.trivia(source, cursor, &mut comments) {
                return Err(self.fail(vec![], comments, error));
            }
            if self.check_symbol(&["}"], source, cursor).is_some() {
                break;
            }
            let attribute_start = *cursor;
            let key = match self.read_string_literal(source, cursor) {
                Ok(Some(id)) => id,
                Ok(None) => match self.read_identifier_literal(source, cursor) {
                    Some(id) => id,
                    None => {
                        let error = self.unexpected(*cursor);
                        return Err(self.fail(vec![], comments, error));
                    }
                },
                Err(error) => return Err(self.fail(vec![], comments, error)),
            };
            if let Err(error) = self.trivia(source, cursor, &mut comments) {
                return Err(self.fail(vec![key], comments, error));
            }
            if self.check_symbol(&[":"], source, cursor).is_none() {
                let error = self.unexpected(*cursor);
                return Err(self.fail(vec![key], comments, error));
            }
            if let Err(error) = self.trivia(source, cursor, &mut comments) {
                return Err(self.fail(vec![key], comments, error));
            }
            let value = match self.read_string_literal(source, cursor) {
                Ok(Some(id)) => id,
                Ok(None) => {
                    let error = self.unexpected(*cursor);
                    return Err(self.fail(vec![key], comments, error));
                }
                Err(error) => return Err(self.fail(vec![key], comments, error)),
            };
            let attribute = self.finish(
                NodeKind::ImportAttribute { key, value },
                attribute_start,
                *cursor,
                Vec::new(),
            );
            attributes.push(attribute);
            if let Err(error) = self.trivia(source, cursor, &mut comments) {
                return Err(self.fail(vec![], comments, error));
            }
            if self.check_symbol(&[","], source, cursor).is_none() {
                if self.check_symbol(&["}"], source, cursor).is_none() {
                    let error = self.unexpected(*cursor);
                    return Err(self.fail(vec![], comments, error));
                }
                break;
            }
        }
        self.give_up(vec![], comments);
        Ok(())
    }

    fn read_export_declaration(
        &mut self,
        source: &str,
        cursor: &mut SourcePosition,
    ) -> ReadResult {
        let start = *cursor;
        let mut current = *cursor;
        if self
            .check_identifier(&["export"], source, &mut current)
            .is_none()
        {
            return Ok(None);
        }
        let mut comments = Vec::new();
        if let Err(error) = self.trivia(source, &mut current, &mut comments) {
            return Err(self.fail(vec![], comments, error));
        }
        let mut specifiers: Vec<NodeId> = Vec::new();
        let mut module = None;
        if self
            .check_identifier(&["default"], source, &mut current)
            .is_some()
        {
            if let Err(error) = self.trivia(source, &mut current, &mut comments) {
                return Err(self.fail(vec![], comments, error));
            }
            let default_start = current;
            let expression = match self.read_expression2(source, &mut current) {
                Ok(Some(id)) => id,
                Ok(None) => {
                    let error = self.unexpected(current);
                    return Err(self.fail(vec![], comments, error));
                }
                Err(error) => return Err(self.fail(vec![], comments, error)),
            };
            let default = self.finish(
                NodeKind::ExportDefault { expression },
                default_start,
                current,
                Vec::new(),
            );
            specifiers.push(default);
            let terminated = match self.read_statement_end(source, &mut current, &mut comments) {
                Ok(terminated) => terminated,
                Err(error) => return Err(self.fail(specifiers, comments, error)),
            };
            if !terminated {
                let error = self.unexpected(current);
                return Err(self.fail(specifiers, comments, error));
            }
        } else if self.check_symbol(&["*"], source, &mut current).is_some() {
            let namespace_start = current;
            let mut alias = None;
            if let Err(error) = self.trivia(source, &mut current, &mut comments) {
                return Err(self.fail(vec![], comments, error));
            }
            if self
                .check_identifier(&["as"], source, &mut current)
                .is_some()
            {
                if let Err(error) = self.trivia(source, &mut current, &mut comments) {
                    return Err(self.fail(vec![], comments, error));
                }
                let Some(name) = self.read_identifier_literal(source, &mut current) else {
                    let error = self.unexpected(current);
                    return Err(self.fail(vec![], comments, error));
                };
                alias = Some(name);
            }
            let namespace = self.finish(
                NodeKind::ExportNamespace { alias },
                namespace_start,
                current,
                Vec::new(),
            );
            specifiers.push(namespace);
            if let Err(error) = self.trivia(source, &mut current, &mut comments) {
                return Err(self.fail(specifiers, comments, error));
            }
            if self
                .check_identifier(&["from"], source, &mut current)
                .is_none()
            {
                let error = self.unexpected(current);
                return Err(self.fail(specifiers, comments, error));
            }
            if let Err(error) = self.trivia(source, &mut current, &mut comments) {
                return Err(self.fail(specifiers, comments, error));
            }
            let from = match self.read_string_literal(source, &mut current) {
                Ok(Some(id)) => id,
                Ok(None) => {
                    let error = self.unexpected(current);
                    return Err(self.fail(specifiers, comments, error));
                }
                Err(error) => return Err(self.fail(specifiers, comments, error)),
            };
            module = Some(from);
            let terminated = match self.read_statement_end(source, &mut current, &mut comments) {
                Ok(terminated) => terminated,
                Err(error) => {
                    specifiers.push(from);
                    return Err(self.fail(specifiers, comments, error));
                }
            };
            if !terminated {
                specifiers.push(from);
                let error = self.unexpected(current);
                return Err(self.fail(specifiers, comments, error));
            }
        } else if peek(source, &current) == Some('{') {
            match self.read_export_specifiers(source, &mut current, &mut specifiers) {
                Ok(()) => {}
                Err(error) => return Err(self.fail(specifiers, comments, error)),
            }
            let mut probe = current;
            let mut probe_comments = Vec::new();
            let trivia_ok = self.probe_trivia(source, &mut probe, &mut probe_comments);
            if trivia_ok
                && self
                    .check_identifier(&["from"], source, &mut probe)
                    .is_some()
            {
                comments.append(&mut probe_comments);
                current = probe;
                if let Err(error) = self.trivia(source, &mut current, &mut comments) {
                    return Err(self.fail(specifiers, comments, error));
                }
                let from = match self.read_string_literal(source, &mut current) {
                    Ok(Some(id)) => id,
                    Ok(None) => {
                        let error = self.unexpected(current);
                        return Err(self.fail(specifiers, comments, error));
                    }
                    Err(error) => return Err(self.fail(specifiers, comments, error)),
                };
                module = Some(from);
            } else {
                self.give_up(vec![], probe_comments);
            }
            let terminated = match self.read_statement_end(source, &mut current, &mut comments) {
                Ok(terminated) => terminated,
                Err(error) => {
                    specifiers.extend(module);
                    return Err(self.fail(specifiers, comments, error));
                }
            };
            if !terminated {
                specifiers.extend(module);
                let error = self.unexpected(current);
                return Err(self.fail(specifiers, comments, error));
            }
        } else {
            // `export <declaration>` re-exports the declared binding.
            let declaration = match self.read_statement(source, &mut current) {
                Ok(Some(id)) => id,
                Ok(None) => {
                    let error = self.unexpected(current);
                    return Err(self.fail(vec![], comments, error));
                }
                Err(error) => return Err(self.fail(vec![], comments, error)),
            };
            specifiers.push(declaration);
        }
        *cursor = current;
        Ok(Some(self.finish(
            NodeKind::ExportDeclaration { specifiers, source: module },
            start,
            current,
            comments,
        )))
    }

    fn read_export_specifiers(
        &mut self,
        source: &str,
        cursor: &mut SourcePosition,
        specifiers: &mut Vec<NodeId>,
    ) -> Result<(), NodeId> {
        if self.check_symbol(&["{"], source, cursor).is_none() {
            return Err(self.unexpected(*cursor));
        }
        let mut comments = Vec::new();
        loop {
            if let Err(error) = self.trivia(source, cursor, &mut comments) {
                return Err(self.fail(vec![], comments, error));
            }
            if self.check_symbol(&["}"], source, cursor).is_some() {
                break;
            }
            let spec_start = *cursor;
            let Some(identifier) = self.read_identifier_literal(source, cursor) else {
                let error = self.unexpected(*cursor);
                return Err(self.fail(vec![], comments, error));
            };
            let mut alias = None;
            let mut probe = *cursor;
            let mut probe_comments = Vec::new();
            let trivia_ok = self.probe_trivia(source, &mut probe, &mut probe_comments);
            if trivia_ok
                && self
                    .check_identifier(&["as"], source, &mut probe)
                    .is_some()
            {
                comments.append(&mut probe_comments);
                *cursor = probe;
                if let Err(error) = self.trivia(source, cursor, &mut comments) {
                    return Err(self.fail(vec![identifier], comments, error));
                }
                let Some(name) = self.read_identifier_literal(source, cursor) else {
                    let error = self.unexpected(*cursor);
                    return Err(self.fail(vec![identifier], comments, error));
                };
                alias = Some(name);
            } else {
                self.give_up(vec![], probe_comments);
            }
            let specifier = self.finish(
                NodeKind::ExportSpecifier { identifier, alias },
                spec_start,
                *cursor,
                Vec::new(),
            );
            specifiers.push(specifier);
            if let Err(error) = self.trivia(source, cursor, &mut comments) {
                return Err(self.fail(vec![], comments, error));
            }
            if self.check_symbol(&[","], source, cursor).is_none() {
                if self.check_symbol(&["}"], source, cursor).is_none() {
                    let error = self.unexpected(*cursor);
                    return Err(self.fail(vec![], comments, error));
                }
                break;
            }
        }
        self.give_up(vec![], comments);
        Ok(())
    }
}

// Object and array literals, functions, arrows, classes.
impl Parser {
    fn read_property_key(
        &mut self,
        source: &str,
        cursor: &mut SourcePosition,
        comments: &mut Vec<NodeId>,
    ) -> Result<Option<(NodeId, bool)>, NodeId> {
        if self.check_symbol(&["["], source, cursor).is_some() {
            if let Err(error) = self.trivia(source, cursor, comments) {
                return Err(error);
            }
            let key = match self.read_expression2(source, cursor) {
                Ok(Some(id)) => id,
                Ok(None) => return Err(self.unexpected(*cursor)),
                Err(error) => return Err(error),
            };
            if let Err(error) = self.trivia(source, cursor, comments) {
                self.arena.dispose(key);
                return Err(error);
            }
            if self.check_symbol(&["]"], source, cursor).is_none() {
                self.arena.dispose(key);
                return Err(self.unexpected(*cursor));
            }
            return Ok(Some((key, true)));
        }
        if let Some(key) = self.read_private_name(source, cursor)? {
            return Ok(Some((key, false)));
        }
        if let Some(key) = self.read_string_literal(source, cursor)? {
            return Ok(Some((key, false)));
        }
        if let Some(key) = self.read_number_literal(source, cursor)? {
            return Ok(Some((key, false)));
        }
        if let Some(key) = self.read_identifier_literal(source, cursor) {
            return Ok(Some((key, false)));
        }
        Ok(None)
    }

    fn read_function_argument(
        &mut self,
        source: &str,
        cursor: &mut SourcePosition,
    ) -> ReadResult {
        let start = *cursor;
        let mut current = *cursor;
        let Some(identifier) = self.read_part_pattern(source, &mut current)? else {
            return Ok(None);
        };
        let mut comments = Vec::new();
        if let Err(error) = self.trivia(source, &mut current, &mut comments) {
            return Err(self.fail(vec![identifier], comments, error));
        }
        let mut value = None;
        if self.check_symbol(&["="], source, &mut current).is_some() {
            if let Err(error) = self.trivia(source, &mut current, &mut comments) {
                return Err(self.fail(vec![identifier], comments, error));
            }
            let default = match self.read_expression3(source, &mut current) {
                Ok(Some(id)) => id,
                Ok(None) => {
                    let error = self.unexpected(current);
                    return Err(self.fail(vec![identifier], comments, error));
                }
                Err(error) => return Err(self.fail(vec![identifier], comments, error)),
            };
            value = Some(default);
        }
        *cursor = current;
        Ok(Some(self.finish(
            NodeKind::FunctionArgument { identifier, value },
            start,
            current,
            comments,
        )))
    }

    /// Parse `( arguments )`, declaring each argument as `let` in the
    /// current (function) scope. The opening parenthesis must already be
    /// consumed.
    fn read_function_arguments(
        &mut self,
        source: &str,
        cursor: &mut SourcePosition,
    ) -> Result<Vec<NodeId>, NodeId> {
        let mut arguments = Vec::new();
        let mut comments = Vec::new();
        loop {
            if let Err(error) = self.trivia(source, cursor, &mut comments) {
                return Err(self.fail(arguments, comments, error));
            }
            if self.check_symbol(&[")"], source, cursor).is_some() {
                break;
            }
            let argument = match self.read_function_argument(source, cursor) {
                Ok(Some(id)) => id,
                Ok(None) => {
                    let error = self.unexpected(*cursor);
                    return Err(self.fail(arguments, comments, error));
                }
                Err(error) => return Err(self.fail(arguments, comments, error)),
            };
            arguments.push(argument);
            if let Err(error) = self.declare_variable(DeclarationKind::Let, source, argument) {
                return Err(self.fail(arguments, comments, error));
            }
            if let Err(error) = self.trivia(source, cursor, &mut comments) {
                return Err(self.fail(arguments, comments, error));
            }
            if self.check_symbol(&[","], source, cursor).is_none() {
                if self.check_symbol(&[")"], source, cursor).is_none() {
                    let error = self.unexpected(*cursor);
                    return Err(self.fail(arguments, comments, error));
                }
                break;
            }
        }
        self.give_up(vec![], comments);
        Ok(arguments)
    }

    fn read_function_body(&mut self, source: &str, cursor: &mut SourcePosition) -> ReadResult {
        let start = *cursor;
        let mut current = *cursor;
        if self.check_symbol(&["{"], source, &mut current).is_none() {
            return Ok(None);
        }
        let scope = self.push_scope(ScopeKind::Block);
        let mut comments = Vec::new();
        let mut owned: Vec<NodeId> = Vec::new();
        let mut directives = Vec::new();
        loop {
            if let Err(error) = self.trivia(source, &mut current, &mut comments) {
                self.pop_scope();
                return Err(self.fail(owned, comments, error));
            }
            match self.read_directive(source, &mut current) {
                Ok(Some(directive)) => {
                    directives.push(directive);
                    owned.push(directive);
                }
                Ok(None) => break,
                Err(error) => {
                    self.pop_scope();
                    return Err(self.fail(owned, comments, error));
                }
            }
        }
        let mut statements = Vec::new();
        loop {
            if let Err(error) = self.trivia(source, &mut current, &mut comments) {
                self.pop_scope();
                return Err(self.fail(owned, comments, error));
            }
            match self.read_statement(source, &mut current) {
                Ok(Some(statement)) => {
                    statements.push(statement);
                    owned.push(statement);
                }
                Ok(None) => break,
                Err(error) => {
                    self.pop_scope();
                    return Err(self.fail(owned, comments, error));
                }
            }
        }
        if self.check_symbol(&["}"], source, &mut current).is_none() {
            self.pop_scope();
            let error = self.unexpected(current);
            return Err(self.fail(owned, comments, error));
        }
        self.pop_scope();
        let node = self.finish(
            NodeKind::FunctionBody {
                directives,
                statements,
            },
            start,
            current,
            comments,
        );
        self.attach_scope(scope, node);
        *cursor = current;
        Ok(Some(node))
    }

    fn read_function_declaration(
        &mut self,
        source: &str,
        cursor: &mut SourcePosition,
    ) -> ReadResult {
        let start = *cursor;
        let mut current = *cursor;
        let mut comments = Vec::new();
        let is_async = self
            .check_identifier(&["async"], source, &mut current)
            .is_some();
        if is_async {
            if let Err(error) = self.trivia(source, &mut current, &mut comments) {
                return Err(self.fail(vec![], comments, error));
            }
        }
        if self
            .check_identifier(&["function"], source, &mut current)
            .is_none()
        {
            self.give_up(vec![], comments);
            return Ok(None);
        }
        if let Err(error) = self.trivia(source, &mut current, &mut comments) {
            return Err(self.fail(vec![], comments, error));
        }
        let is_generator = self.check_symbol(&["*"], source, &mut current).is_some();
        if is_generator {
            if let Err(error) = self.trivia(source, &mut current, &mut comments) {
                return Err(self.fail(vec![], comments, error));
            }
        }
        let identifier = self.read_identifier_literal(source, &mut current);
        if let Some(identifier) = identifier {
            let text = self.arena.node(identifier).span.slice(source).to_string();
            if is_keyword(&text) {
                let error = self.unexpected(current);
                return Err(self.fail(vec![identifier], comments, error));
            }
        }
        if let Err(error) = self.trivia(source, &mut current, &mut comments) {
            let owned: Vec<NodeId> = identifier.into_iter().collect();
            return Err(self.fail(owned, comments, error));
        }
        if self.check_symbol(&["("], source, &mut current).is_none() {
            let owned: Vec<NodeId> = identifier.into_iter().collect();
            let error = self.unexpected(current);
            return Err(self.fail(owned, comments, error));
        }
        let scope = self.push_scope(ScopeKind::Lex);
        let arguments = match self.read_function_arguments(source, &mut current) {
            Ok(arguments) => arguments,
            Err(error) => {
                self.pop_scope();
                let owned: Vec<NodeId> = identifier.into_iter().collect();
                return Err(self.fail(owned, comments, error));
            }
        };
        if let Err(error) = self.trivia(source, &mut current, &mut comments) {
            self.pop_scope();
            let mut owned: Vec<NodeId> = identifier.into_iter().collect();
            owned.extend(arguments);
            return Err(self.fail(owned, comments, error));
        }
        let body = match self.read_function_body(source, &mut current) {
            Ok(Some(id)) => id,
            Ok(None) => {
                self.pop_scope();
                let mut owned: Vec<NodeId> = identifier.into_iter().collect();
                owned.extend(arguments);
                let error = self.unexpected(current);
                return Err(self.fail(owned, comments, error));
            }
            Err(error) => {
                self.pop_scope();
                let mut owned: Vec<NodeId> = identifier.into_iter().collect();
                owned.extend(arguments);
                return Err(self.fail(owned, comments, error));
            }
        };
        self.pop_scope();
        let node = self.finish(
            NodeKind::Function {
                identifier,
                is_async,
                is_generator,
                arguments,
                body,
                closure: BTreeSet::new(),
            },
            start,
            current,
            comments,
        );
        self.attach_scope(scope, node);
        if let Err(error) = self.declare_variable(DeclarationKind::Function, source, node) {
            self.arena.dispose(node);
            return Err(error);
        }
        *cursor = current;
        Ok(Some(node))
    }

    fn read_function_statement(
        &mut self,
        source: &str,
        cursor: &mut SourcePosition,
    ) -> ReadResult {
        self.read_function_declaration(source, cursor)
    }

    fn read_arrow_function(&mut self, source: &str, cursor: &mut SourcePosition) -> ReadResult {
        let start = *cursor;
        let mut current = *cursor;
        let mut comments = Vec::new();
        let is_async = self
            .check_identifier(&["async"], source, &mut current)
            .is_some();
        if is_async {
            if let Err(error) = self.trivia(source, &mut current, &mut comments) {
                return Err(self.fail(vec![], comments, error));
            }
        }
        let scope = self.push_scope(ScopeKind::Lex);
        let mut arguments = Vec::new();
        if self.check_symbol(&["("], source, &mut current).is_some() {
            arguments = match self.read_function_arguments(source, &mut current) {
                Ok(arguments) => arguments,
                Err(error) => {
                    self.arena.dispose(error);
                    self.pop_scope();
                    self.give_up(vec![], comments);
                    return Ok(None);
                }
            };
        } else {
            let Some(identifier) = self.read_identifier_literal(source, &mut current) else {
                self.pop_scope();
                self.give_up(vec![], comments);
                return Ok(None);
            };
            let text = self.arena.node(identifier).span.slice(source).to_string();
            if is_keyword(&text) {
                self.pop_scope();
                self.give_up(vec![identifier], comments);
                return Ok(None);
            }
            let argument_span = self.arena.node(identifier).span;
            let argument = self.finish(
                NodeKind::FunctionArgument {
                    identifier,
                    value: None,
                },
                argument_span.start,
                argument_span.end,
                Vec::new(),
            );
            if let Err(error) = self.declare_variable(DeclarationKind::Let, source, argument) {
                self.pop_scope();
                return Err(self.fail(vec![argument], comments, error));
            }
            arguments.push(argument);
        }
        let mut probe = current;
        let mut probe_comments = Vec::new();
        let trivia_ok = self.probe_trivia(source, &mut probe, &mut probe_comments);
        if !trivia_ok || self.check_symbol(&["=>"], source, &mut probe).is_none() {
            self.pop_scope();
            let mut owned = arguments;
            owned.extend(probe_comments);
            self.give_up(owned, comments);
            return Ok(None);
        }
        comments.append(&mut probe_comments);
        current = probe;
        if let Err(error) = self.trivia(source, &mut current, &mut comments) {
            self.pop_scope();
            return Err(self.fail(arguments, comments, error));
        }
        let body = match self.read_function_body(source, &mut current) {
            Ok(Some(id)) => Some(id),
            Ok(None) => None,
            Err(error) => {
                self.pop_scope();
                return Err(self.fail(arguments, comments, error));
            }
        };
        let body = match body {
            Some(body) => body,
            None => match self.read_expression2(source, &mut current) {
                Ok(Some(id)) => id,
                Ok(None) => {
                    self.pop_scope();
                    let error = self.unexpected(current);
                    return Err(self.fail(arguments, comments, error));
                }
                Err(error) => {
                    self.pop_scope();
                    return Err(self.fail(arguments, comments, error));
                }
            },
        };
        self.pop_scope();
        let node = self.finish(
            NodeKind::ArrowFunction {
                is_async,
                arguments,
                body,
                closure: BTreeSet::new(),
            },
            start,
            current,
            comments,
        );
        self.attach_scope(scope, node);
        *cursor = current;
        Ok(Some(node))
    }

    fn read_object_accessor(&mut self, source: &str, cursor: &mut SourcePosition) -> ReadResult {
        let start = *cursor;
        let mut current = *cursor;
        let kind = if self
            .check_identifier(&["get"], source, &mut current)
            .is_some()
        {
            AccessorKind::Get
        } else if self
            .check_identifier(&["set"], source, &mut current)
            .is_some()
        {
            AccessorKind::Set
        } else {
            return Ok(None);
        };
        let mut comments = Vec::new();
        if let Err(error) = self.trivia(source, &mut current, &mut comments) {
            return Err(self.fail(vec![], comments, error));
        }
        let Some((identifier, computed)) =
            self.read_property_key(source, &mut current, &mut comments)?
        else {
            // `get` / `set` used as a plain key or shorthand.
            self.give_up(vec![], comments);
            return Ok(None);
        };
        if let Err(error) = self.trivia(source, &mut current, &mut comments) {
            return Err(self.fail(vec![identifier], comments, error));
        }
        if self.check_symbol(&["("], source, &mut current).is_none() {
            self.give_up(vec![identifier], comments);
            return Ok(None);
        }
        let scope = self.push_scope(ScopeKind::Lex);
        let arguments = match self.read_function_arguments(source, &mut current) {
            Ok(arguments) => arguments,
            Err(error) => {
                self.pop_scope();
                return Err(self.fail(vec![identifier], comments, error));
            }
        };
        if let Err(error) = self.trivia(source, &mut current, &mut comments) {
            self.pop_scope();
            let mut owned = vec![identifier];
            owned.extend(arguments);
            return Err(self.fail(owned, comments, error));
        }
        let body = match self.read_function_body(source, &mut current) {
            Ok(Some(id)) => id,
            Ok(None) => {
                self.pop_scope();
                let mut owned = vec![identifier];
                owned.extend(arguments);
                let error = self.unexpected(current);
                return Err(self.fail(owned, comments, error));
            }
            Err(error) => {
                self.pop_scope();
                let mut owned = vec![identifier];
                owned.extend(arguments);
                return Err(self.fail(owned, comments, error));
            }
        };
        self.pop_scope();
        let node = self.finish(
            NodeKind::ObjectAccessor {
                kind,
                identifier,
                computed,
                arguments,
                body,
                closure: BTreeSet::new(),
            },
            start,
            current,
            comments,
        );
        self.attach_scope(scope, node);
        *cursor = current;
        Ok(Some(node))
    }

    fn read_object_method(&mut self, source: &str, cursor: &mut SourcePosition) -> ReadResult {
        let start = *cursor;
        let mut current = *cursor;
        let mut comments = Vec::new();
        let mut is_async = false;
        if self
            .check_identifier(&["async"], source, &mut current)
            .is_some()
        {
            // `async` may itself be the method name; decided below.
            let mut probe = current;
            let mut probe_comments = Vec::new();
            let trivia_ok = self.probe_trivia(source, &mut probe, &mut probe_comments);
            if trivia_ok && self.check_symbol(&["("], source, &mut probe).is_none() {
                is_async = true;
                comments.append(&mut probe_comments);
            } else {
                self.give_up(vec![], probe_comments);
                current = start;
            }
        }
        if is_async {
            if let Err(error) = self.trivia(source, &mut current, &mut comments) {
                return Err(self.fail(vec![], comments, error));
            }
        }
        let is_generator = self.check_symbol(&["*"], source, &mut current).is_some();
        if is_generator {
            if let Err(error) = self.trivia(source, &mut current, &mut comments) {
                return Err(self.fail(vec![], comments, error));
            }
        }
        let Some((identifier, computed)) =
            self.read_property_key(source, &mut current, &mut comments)?
        else {
            self.give_up(vec![], comments);
            return Ok(None);
        };
        let mut probe = current;
        let mut probe_comments = Vec::new();
        let trivia_ok = self.probe_trivia(source, &mut probe, &mut probe_comments);
        if !trivia_ok || self.check_symbol(&["("], source, &mut probe).is_none() {
            let mut owned = vec![identifier];
            owned.extend(probe_comments);
            self.give_up(owned, comments);
            return Ok(None);
        }
        comments.append(&mut probe_comments);
        current = probe;
        let scope = self.push_scope(ScopeKind::Lex);
        let arguments = match self.read_function_arguments(source, &mut current) {
            Ok(arguments) => arguments,
            Err(error) => {
                self.pop_scope();
                return Err(self.fail(vec![identifier], comments, error));
            }
        };
        if let Err(error) = self.trivia(source, &mut current, &mut comments) {
            self.pop_scope();
            let mut owned = vec![identifier];
            owned.extend(arguments);
            return Err(self.fail(owned, comments, error));
        }
        let body = match self.read_function_body(source, &mut current) {
            Ok(Some(id)) => id,
            Ok(None) => {
                self.pop_scope();
                let mut owned = vec![identifier];
                owned.extend(arguments);
                let error = self.unexpected(current);
                return Err(self.fail(owned, comments, error));
            }
            Err(error) => {
                self.pop_scope();
                let mut owned = vec![identifier];
                owned.extend(arguments);
                return Err(self.fail(owned, comments, error));
            }
        };
        self.pop_scope();
        let node = self.finish(
            NodeKind::ObjectMethod {
                identifier,
                computed,
                is_async,
                is_generator,
                arguments,
                body,
                closure: BTreeSet::new(),
            },
            start,
            current,
            comments,
        );
        self.attach_scope(scope, node);
        *cursor = current;
        Ok(Some(node))
    }

    fn read_object_property(&mut self, source: &str, cursor: &mut SourcePosition) -> ReadResult {
        let start = *cursor;
        let mut current = *cursor;
        if let Some(spread) = self.read_spread_expression(source, &mut current)? {
            *cursor = current;
            return Ok(Some(spread));
        }
        let mut comments = Vec::new();
        let Some((key, computed)) = self.read_property_key(source, &mut current, &mut comments)?
        else {
            self.give_up(vec![], comments);
            return Ok(None);
        };
        if let Err(error) = self.trivia(source, &mut current, &mut comments) {
            return Err(self.fail(vec![key], comments, error));
        }
        let mut value = None;
        if self.check_symbol(&[":"], source, &mut current).is_some() {
            if let Err(error) = self.trivia(source, &mut current, &mut comments) {
                return Err(self.fail(vec![key], comments, error));
            }
            let expression = match self.read_expression2(source, &mut current) {
                Ok(Some(id)) => id,
                Ok(None) => {
                    let error = self.unexpected(current);
                    return Err(self.fail(vec![key], comments, error));
                }
                Err(error) => return Err(self.fail(vec![key], comments, error)),
            };
            value = Some(expression);
        }
        *cursor = current;
        Ok(Some(self.finish(
            NodeKind::ObjectProperty {
                key,
                value,
                computed,
            },
            start,
            current,
            comments,
        )))
    }

    fn read_object_literal(&mut self, source: &str, cursor: &mut SourcePosition) -> ReadResult {
        let start = *cursor;
        let mut current = *cursor;
        if self.check_symbol(&["{"], source, &mut current).is_none() {
            return Ok(None);
        }
        let mut comments = Vec::new();
        let mut properties = Vec::new();
        loop {
            if let Err(error) = self.trivia(source, &mut current, &mut comments) {
                return Err(self.fail(properties, comments, error));
            }
            let member = match self.read_object_accessor(source, &mut current) {
                Ok(Some(id)) => Some(id),
                Ok(None) => match self.read_object_method(source, &mut current) {
                    Ok(Some(id)) => Some(id),
                    Ok(None) => match self.read_object_property(source, &mut current) {
                        Ok(member) => member,
                        Err(error) => return Err(self.fail(properties, comments, error)),
                    },
                    Err(error) => return Err(self.fail(properties, comments, error)),
                },
                Err(error) => return Err(self.fail(properties, comments, error)),
            };
            match member {
                Some(member) => properties.push(member),
                None => break,
            }
            if let Err(error) = self.trivia(source, &mut current, &mut comments) {
                return Err(self.fail(properties, comments, error));
            }
            if self.check_symbol(&[","], source, &mut current).is_none() {
                break;
            }
        }
        if let Err(error) = self.trivia(source, &mut current, &mut comments) {
            return Err(self.fail(properties, comments, error));
        }
        if self.check_symbol(&["}"], source, &mut current).is_none() {
            let error = self.unexpected(current);
            return Err(self.fail(properties, comments, error));
        }
        *cursor = current;
        Ok(Some(self.finish(
            NodeKind::ObjectLiteral { properties },
            start,
            current,
            comments,
        )))
    }

    fn read_array_literal(&mut self, source: &str, cursor: &mut SourcePosition) -> ReadResult {
        let start = *cursor;
        let mut current = *cursor;
        if self.check_symbol(&["["], source, &mut current).is_none() {
            return Ok(None);
        }
        let mut comments = Vec::new();
        let mut items = Vec::new();
        loop {
            if let Err(error) = self.trivia(source, &mut current, &mut comments) {
                return Err(self.fail(items, comments, error));
            }
            let mut probe = current;
            if self.check_symbol(&["]"], source, &mut probe).is_some() {
                break;
            }
            let hole = current;
            if self.check_symbol(&[","], source, &mut probe).is_some() {
                // An elision slot reads back as undefined.
                items.push(self.leaf(NodeKind::UndefinedLiteral, hole, hole));
                current = probe;
                continue;
            }
            let item = if let Some(spread) = {
                match self.read_spread_expression(source, &mut current) {
                    Ok(spread) => spread,
                    Err(error) => return Err(self.fail(items, comments, error)),
                }
            } {
                spread
            } else {
                match self.read_expression2(source, &mut current) {
                    Ok(Some(id)) => id,
                    Ok(None) => {
                        let error = self.unexpected(current);
                        return Err(self.fail(items, comments, error));
                    }
                    Err(error) => return Err(self.fail(items, comments, error)),
                }
            };
            items.push(item);
            if let Err(error) = self.trivia(source, &mut current, &mut comments) {
                return Err(self.fail(items, comments, error));
            }
            if self.check_symbol(&[","], source, &mut current).is_none() {
                break;
            }
        }
        if self.check_symbol(&["]"], source, &mut current).is_none() {
            let error = self.unexpected(current);
            return Err(self.fail(items, comments, error));
        }
        *cursor = current;
        Ok(Some(self.finish(
            NodeKind::ArrayLiteral { items },
            start,
            current,
            comments,
        )))
    }
}

// Class declarations and members.
impl Parser {
    fn read_decorators(
        &mut self,
        source: &str,
        cursor: &mut SourcePosition,
        comments: &mut Vec<NodeId>,
    ) -> Result<Vec<NodeId>, NodeId> {
        let mut decorators = Vec::new();
        loop {
            let mut probe = *cursor;
            if self.check_symbol(&["@"], source, &mut probe).is_none() {
                break;
            }
            let start = *cursor;
            *cursor = probe;
            let expression = match self.read_expression17(source, cursor) {
                Ok(Some(id)) => id,
                Ok(None) => {
                    let error = self.unexpected(*cursor);
                    return Err(self.fail(decorators, Vec::new(), error));
                }
                Err(error) => return Err(self.fail(decorators, Vec::new(), error)),
            };
            let decorator = self.finish(
                NodeKind::Decorator { expression },
                start,
                *cursor,
                Vec::new(),
            );
            decorators.push(decorator);
            if let Err(error) = self.trivia(source, cursor, comments) {
                return Err(self.fail(decorators, Vec::new(), error));
            }
        }
        Ok(decorators)
    }

    fn read_static_block(&mut self, source: &str, cursor: &mut SourcePosition) -> ReadResult {
        let start = *cursor;
        let mut current = *cursor;
        if self
            .check_identifier(&["static"], source, &mut current)
            .is_none()
        {
            return Ok(None);
        }
        let mut comments = Vec::new();
        if let Err(error) = self.trivia(source, &mut current, &mut comments) {
            return Err(self.fail(vec![], comments, error));
        }
        let mut probe = current;
        if self.check_symbol(&["{"], source, &mut probe).is_none() {
            self.give_up(vec![], comments);
            return Ok(None);
        }
        let scope = self.push_scope(ScopeKind::Block);
        let statement = match self.read_block_statement(source, &mut current) {
            Ok(Some(id)) => id,
            Ok(None) => {
                self.pop_scope();
                let error = self.unexpected(current);
                return Err(self.fail(vec![], comments, error));
            }
            Err(error) => {
                self.pop_scope();
                return Err(self.fail(vec![], comments, error));
            }
        };
        self.pop_scope();
        let node = self.finish(
            NodeKind::StaticBlock {
                statement,
                closure: BTreeSet::new(),
            },
            start,
            current,
            comments,
        );
        self.attach_scope(scope, node);
        *cursor = current;
        Ok(Some(node))
    }

    fn read_class_accessor(&mut self, source: &str, cursor: &mut SourcePosition) -> ReadResult {
        let start = *cursor;
        let mut current = *cursor;
        let mut comments = Vec::new();
        let is_static = self
            .check_identifier(&["static"], source, &mut current)
            .is_some();
        if is_static {
            if let Err(error) = self.trivia(source, &mut current, &mut comments) {
                return Err(self.fail(vec![], comments, error));
            }
        }
        let kind = if self
            .check_identifier(&["get"], source, &mut current)
            .is_some()
        {
            AccessorKind::Get
        } else if self
            .check_identifier(&["set"], source, &mut current)
            .is_some()
        {
            AccessorKind::Set
        } else {
            self.give_up(vec![], comments);
            return Ok(None);
        };
        if let Err(error) = self.trivia(source, &mut current, &mut comments) {
            return Err(self.fail(vec![], comments, error));
        }
        let Some((identifier, computed)) =
            self.read_property_key(source, &mut current, &mut comments)?
        else {
            self.give_up(vec![], comments);
            return Ok(None);
        };
        if let Err(error) = self.trivia(source, &mut current, &mut comments) {
            return Err(self.fail(vec![identifier], comments, error));
        }
        if self.check_symbol(&["("], source, &mut current).is_none() {
            self.give_up(vec![identifier], comments);
            return Ok(None);
        }
        let scope = self.push_scope(ScopeKind::Lex);
        let arguments = match self.read_function_arguments(source, &mut current) {
            Ok(arguments) => arguments,
            Err(error) => {
                self.pop_scope();
                return Err(self.fail(vec![identifier], comments, error));
            }
        };
        if let Err(error) = self.trivia(source, &mut current, &mut comments) {
            self.pop_scope();
            let mut owned = vec![identifier];
            owned.extend(arguments);
            return Err(self.fail(owned, comments, error));
        }
        let body = match self.read_function_body(source, &mut current) {
            Ok(Some(id)) => id,
            Ok(None) => {
                self.pop_scope();
                let mut owned = vec![identifier];
                owned.extend(arguments);
                let error = self.unexpected(current);
                return Err(self.fail(owned, comments, error));
            }
            Err(error) => {
                self.pop_scope();
                let mut owned = vec![identifier];
                owned.extend(arguments);
                return Err(self.fail(owned, comments, error));
            }
        };
        self.pop_scope();
        let node = self.finish(
            NodeKind::ClassAccessor {
                kind,
                identifier,
                computed,
                is_static,
                arguments,
                body,
                closure: BTreeSet::new(),
            },
            start,
            current,
            comments,
        );
        self.attach_scope(scope, node);
        *cursor = current;
        Ok(Some(node))
    }

    fn read_class_method(&mut self, source: &str, cursor: &mut SourcePosition) -> ReadResult {
        let start = *cursor;
        let mut current = *cursor;
        let mut comments = Vec::new();
        let is_static = self
            .check_identifier(&["static"], source, &mut current)
            .is_some();
        if is_static {
            if let Err(error) = self.trivia(source, &mut current, &mut comments) {
                return Err(self.fail(vec![], comments, error));
            }
        }
        let mut is_async = false;
        let async_backup = current;
        if self
            .check_identifier(&["async"], source, &mut current)
            .is_some()
        {
            let mut probe = current;
            let mut probe_comments = Vec::new();
            let trivia_ok = self.probe_trivia(source, &mut probe, &mut probe_comments);
            if trivia_ok && self.check_symbol(&["("], source, &mut probe).is_none() {
                is_async = true;
                comments.append(&mut probe_comments);
            } else {
                self.give_up(vec![], probe_comments);
                current = async_backup;
            }
        }
        if is_async {
            if let Err(error) = self.trivia(source, &mut current, &mut comments) {
                return Err(self.fail(vec![], comments, error));
            }
        }
        let is_generator = self.check_symbol(&["*"], source, &mut current).is_some();
        if is_generator {
            if let Err(error) = self.trivia(source, &mut current, &mut comments) {
                return Err(self.fail(vec![], comments, error));
            }
        }
        let Some((identifier, computed)) =
            self.read_property_key(source, &mut current, &mut comments)?
        else {
            self.give_up(vec![], comments);
            return Ok(None);
        };
        let mut probe = current;
        let mut probe_comments = Vec::new();
        let trivia_ok = self.probe_trivia(source, &mut probe, &mut probe_comments);
        if !trivia_ok || self.check_symbol(&["("], source, &mut probe).is_none() {
            let mut owned = vec![identifier];
            owned.extend(probe_comments);
            self.give_up(owned, comments);
            return Ok(None);
        }
        comments.append(&mut probe_comments);
        current = probe;
        let scope = self.push_scope(ScopeKind::Lex);
        let arguments = match self.read_function_arguments(source, &mut current) {
            Ok(arguments) => arguments,
            Err(error) => {
                self.pop_scope();
                return Err(self.fail(vec![identifier], comments, error));
            }
        };
        if let Err(error) = self.trivia(source, &mut current, &mut comments) {
            self.pop_scope();
            let mut owned = vec![identifier];
            owned.extend(arguments);
            return Err(self.fail(owned, comments, error));
        }
        let body = match self.read_function_body(source, &mut current) {
            Ok(Some(id)) => id,
            Ok(None) => {
                self.pop_scope();
                let mut owned = vec![identifier];
                owned.extend(arguments);
                let error = self.unexpected(current);
                return Err(self.fail(owned, comments, error));
            }
            Err(error) => {
                self.pop_scope();
                let mut owned = vec![identifier];
                owned.extend(arguments);
                return Err(self.fail(owned, comments, error));
            }
        };
        self.pop_scope();
        let node = self.finish(
            NodeKind::ClassMethod {
                identifier,
                computed,
                is_static,
                is_async,
                is_generator,
                arguments,
                body,
                closure: BTreeSet::new(),
            },
            start,
            current,
            comments,
        );
        self.attach_scope(scope, node);
        *cursor = current;
        Ok(Some(node))
    }

    fn read_class_property(&mut self, source: &str, cursor: &mut SourcePosition) -> ReadResult {
        let start = *cursor;
        let mut current = *cursor;
        let mut comments = Vec::new();
        let is_static = self
            .check_identifier(&["static"], source, &mut current)
            .is_some();
        if is_static {
            if let Err(error) = self.trivia(source, &mut current, &mut comments) {
                return Err(self.fail(vec![], comments, error));
            }
        }
        let Some((identifier, computed)) =
            self.read_property_key(source, &mut current, &mut comments)?
        else {
            self.give_up(vec![], comments);
            return Ok(None);
        };
        let mut value = None;
        let mut probe = current;
        let mut probe_comments = Vec::new();
        let trivia_ok = self.probe_trivia(source, &mut probe, &mut probe_comments);
        if trivia_ok && self.check_symbol(&["="], source, &mut probe).is_some() {
            comments.append(&mut probe_comments);
            current = probe;
            if let Err(error) = self.trivia(source, &mut current, &mut comments) {
                return Err(self.fail(vec![identifier], comments, error));
            }
            let expression = match self.read_expression2(source, &mut current) {
                Ok(Some(id)) => id,
                Ok(None) => {
                    let error = self.unexpected(current);
                    return Err(self.fail(vec![identifier], comments, error));
                }
                Err(error) => return Err(self.fail(vec![identifier], comments, error)),
            };
            value = Some(expression);
        } else {
            self.give_up(vec![], probe_comments);
        }
        let terminated = match self.read_statement_end(source, &mut current, &mut comments) {
            Ok(terminated) => terminated,
            Err(error) => {
                let mut owned = vec![identifier];
                owned.extend(value);
                return Err(self.fail(owned, comments, error));
            }
        };
        if !terminated {
            let mut owned = vec![identifier];
            owned.extend(value);
            let error = self.unexpected(current);
            return Err(self.fail(owned, comments, error));
        }
        *cursor = current;
        Ok(Some(self.finish(
            NodeKind::ClassProperty {
                identifier,
                computed,
                is_static,
                value,
            },
            start,
            current,
            comments,
        )))
    }

    fn read_class_item(&mut self, source: &str, cursor: &mut SourcePosition) -> ReadResult {
        if let Some(node) = self.read_empty_statement(source, cursor)? {
            return Ok(Some(node));
        }
        if let Some(node) = self.read_static_block(source, cursor)? {
            return Ok(Some(node));
        }
        if let Some(node) = self.read_class_accessor(source, cursor)? {
            return Ok(Some(node));
        }
        if let Some(node) = self.read_class_method(source, cursor)? {
            return Ok(Some(node));
        }
        self.read_class_property(source, cursor)
    }

    fn read_class_declaration(
        &mut self,
        source: &str,
        cursor: &mut SourcePosition,
    ) -> ReadResult {
        let start = *cursor;
        let mut current = *cursor;
        let mut comments = Vec::new();
        let decorators = match self.read_decorators(source, &mut current, &mut comments) {
            Ok(decorators) => decorators,
            Err(error) => return Err(self.fail(vec![], comments, error)),
        };
        if self
            .check_identifier(&["class"], source, &mut current)
            .is_none()
        {
            self.give_up(decorators, comments);
            return Ok(None);
        }
        let mut owned = decorators.clone();
        if let Err(error) = self.trivia(source, &mut current, &mut comments) {
            return Err(self.fail(owned, comments, error));
        }
        let identifier = self.read_identifier_literal(source, &mut current);
        if let Some(identifier) = identifier {
            let text = self.arena.node(identifier).span.slice(source).to_string();
            if is_keyword(&text) {
                owned.push(identifier);
                let error = self.unexpected(current);
                return Err(self.fail(owned, comments, error));
            }
            owned.push(identifier);
        }
        if let Err(error) = self.trivia(source, &mut current, &mut comments) {
            return Err(self.fail(owned, comments, error));
        }
        let mut extends = None;
        if self
            .check_identifier(&["extends"], source, &mut current)
            .is_some()
        {
            if let Err(error) = self.trivia(source, &mut current, &mut comments) {
                return Err(self.fail(owned, comments, error));
            }
            let heritage = match self.read_expression17(source, &mut current) {
                Ok(Some(id)) => id,
                Ok(None) => {
                    let error = self.unexpected(current);
                    return Err(self.fail(owned, comments, error));
                }
                Err(error) => return Err(self.fail(owned, comments, error)),
            };
            extends = Some(heritage);
            owned.push(heritage);
            if let Err(error) = self.trivia(source, &mut current, &mut comments) {
                return Err(self.fail(owned, comments, error));
            }
        }
        let scope = self.push_scope(ScopeKind::Lex);
        if self.check_symbol(&["{"], source, &mut current).is_none() {
            self.pop_scope();
            let error = self.unexpected(current);
            return Err(self.fail(owned, comments, error));
        }
        let mut properties = Vec::new();
        loop {
            if let Err(error) = self.trivia(source, &mut current, &mut comments) {
                self.pop_scope();
                owned.extend(properties);
                return Err(self.fail(owned, comments, error));
            }
            match self.read_class_item(source, &mut current) {
                Ok(Some(item)) => {
                    if matches!(self.arena.node(item).kind, NodeKind::EmptyStatement) {
                        self.arena.dispose(item);
                        continue;
                    }
                    properties.push(item);
                }
                Ok(None) => break,
                Err(error) => {
                    self.pop_scope();
                    owned.extend(properties);
                    return Err(self.fail(owned, comments, error));
                }
            }
        }
        if self.check_symbol(&["}"], source, &mut current).is_none() {
            self.pop_scope();
            owned.extend(properties);
            let error = self.unexpected(current);
            return Err(self.fail(owned, comments, error));
        }
        self.pop_scope();
        let node = self.finish(
            NodeKind::Class {
                identifier,
                extends,
                properties,
                decorators,
                closure: BTreeSet::new(),
            },
            start,
            current,
            comments,
        );
        self.attach_scope(scope, node);
        if let Err(error) = self.declare_variable(DeclarationKind::Const, source, node) {
            self.arena.dispose(node);
            return Err(error);
        }
        *cursor = current;
        Ok(Some(node))
    }

    fn read_class_statement(&mut self, source: &str, cursor: &mut SourcePosition) -> ReadResult {
        self.read_class_declaration(source, cursor)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_empty_program() {
        let ast = parse("", EvalMode::Program);
        assert!(!ast.is_error());
        assert!(matches!(
            ast.node(ast.root).kind,
            NodeKind::Program { .. }
        ));
    }

    #[test]
    fn test_parse_error_is_terminal() {
        let ast = parse("let = ;", EvalMode::Program);
        assert!(ast.is_error());
        assert!(ast.error().is_some());
    }

    #[test]
    fn test_scan_symbol_longest_match() {
        let source = "===x";
        let mut cursor = SourcePosition::default();
        let span = Parser::scan_symbol(source, &mut cursor).unwrap();
        assert_eq!(span.slice(source), "===");
    }

    #[test]
    fn test_keywords_never_parse_as_identifiers() {
        let ast = parse("typeof;", EvalMode::Program);
        assert!(ast.is_error());
    }
}
