//! Script Compiler CLI Library
//!
//! Compiles script sources and renders diagnostics, AST dumps and
//! bytecode disassembly. Evaluation needs the embedding host and is not
//! wired into the standalone driver.

#![warn(missing_docs)]
#![warn(clippy::all)]

pub mod driver;
pub mod error;

pub use driver::{Driver, Rendering};
pub use error::{CliError, CliResult};
