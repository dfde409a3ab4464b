//! Virtual Machine Component
//!
//! The stack machine that executes compiled programs against an embedding
//! host. The VM owns fetch, dispatch and control transfer; all value,
//! scope and call semantics are delegated to the [`Host`] collaborator.
//!
//! # Overview
//!
//! - [`VirtualMachine`] - The fetch/dispatch loop
//! - [`EvalContext`] - Per-evaluation state, resumable across calls
//! - [`Host`] - The value/heap collaborator contract
//!
//! The dispatch loop is single-threaded and synchronous: nothing in it
//! suspends except by returning to the caller. Generator-style suspension
//! is implemented by the embedding: a yield returns an interrupt value
//! carrying the saved context, which a later `eval` call resumes.

#![warn(missing_docs)]
#![warn(clippy::all)]

pub mod context;
pub mod host;
pub mod vm;

pub use context::{EvalContext, LabelFrame, LabelKind, TryFrame};
pub use host::Host;
pub use vm::VirtualMachine;
