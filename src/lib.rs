//! A tree-walking interpreter for the Monkey language.
//!
//! Source text flows through a streaming lexer, a Pratt parser, and a
//! recursive evaluator with first-class closures, arrays, hashes, and a
//! small set of built-in functions.
//!
//! # Examples
//!
//! See [`crate::interpreter::Interpreter`].
//!
//! # Limitations
//!
//! - No bytecode compilation and no static type checking; programs are
//!   re-walked on every evaluation.
//! - Reference cycles created by storing a closure in its own defining
//!   scope are leaked.  Programs are short-lived, so this is accepted.

#![warn(rust_2018_idioms)]
#![warn(missing_debug_implementations)]

pub mod batch;
pub mod interpreter;
pub mod repl;

mod ast;
mod builtins;
mod environment;
mod eval;
mod lexer;
mod object;
mod parser;
mod token;

pub use object::{RuntimeError, Value};
