//! Qsp runtime: reader, evaluator and the builtin function set
//!
//! The runtime turns parse trees into heap values (`reader`), reduces
//! S-expressions against an environment (`eval`), and supplies the builtin
//! functions that give the language its semantics, one module per family.
//! All state lives in an `Interp`; there are no process-wide singletons.

#[macro_use]
mod macros;

pub mod arithmetic;
pub mod bindings;
pub mod cond;
pub mod eval;
pub mod interp;
pub mod io;
pub mod list_ops;
pub mod reader;

pub use interp::{BuiltinFn, Interp};
pub use reader::read;
