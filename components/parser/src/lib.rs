//! Script Parser Component
//!
//! Provides the recursive descent parser, AST construction, lexical scope
//! analysis with closure resolution, and bytecode generation for the
//! engine's scripting language.
//!
//! # Overview
//!
//! - [`Parser`] / [`parse`] - Scannerless recursive descent parser
//! - [`NodeArena`] / [`NodeKind`] - Arena-allocated AST nodes
//! - [`ScopeArena`] - Parse-time lexical scope records
//! - [`resolve_closures`] - Post-parse closure capture analysis
//! - [`CodeGenerator`] - Lowers a resolved tree into a bytecode program
//!
//! # Example
//!
//! ```
//! use parser::{parse, CodeGenerator, EvalMode};
//! use bytecode_system::Program;
//!
//! let source = "let x = 42;";
//! let ast = parse(source, EvalMode::Program);
//! assert!(!ast.is_error());
//!
//! let mut program = Program::new("inline.vs");
//! CodeGenerator::new().resolve(source, &ast, &mut program).unwrap();
//! assert!(!program.is_empty());
//! ```

#![warn(missing_docs)]
#![warn(clippy::all)]

pub mod ast;
pub mod bytecode_gen;
pub mod error;
pub mod parser;
pub mod scope;

pub use ast::{to_json, AccessorKind, Node, NodeArena, NodeId, NodeKind};
pub use bytecode_gen::CodeGenerator;
pub use parser::{parse, Ast, EvalMode, Parser};
pub use scope::{resolve_closures, DeclarationKind, Scope, ScopeArena, ScopeId, ScopeKind};
