use std::collections::HashMap;
use std::error::Error;
use std::fmt;
use std::io;
use std::rc::Rc;

use crate::ast::{BlockStmt, InfixOp, PrefixOp};
use crate::builtins::Builtin;
use crate::environment::Environment;

/// A runtime value.
///
/// Compound payloads sit behind `Rc`, so cloning a value is cheap.
#[derive(Debug, Clone)]
pub enum Value {
    Integer(i64),
    Bool(bool),
    Str(Rc<str>),
    Null,
    Array(Rc<[Value]>),
    Hash(Rc<HashMap<HashKey, Value>>),
    Function(Rc<FunctionValue>),
    Builtin(Builtin),
}

/// A user function: parameter names, body, and the environment that was
/// current at its definition.
pub struct FunctionValue {
    pub params: Vec<String>,
    pub body: BlockStmt,
    pub env: Rc<Environment>,
}

// The captured environment can contain the function itself, so a derived
// Debug would recurse forever.
impl fmt::Debug for FunctionValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("FunctionValue")
            .field("params", &self.params)
            .finish()
    }
}

/// Key of a hash value.  Only integers, booleans and strings hash; the
/// key carries its full payload, so the stored map needs no separate copy
/// of the original value.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum HashKey {
    Integer(i64),
    Bool(bool),
    Str(Rc<str>),
}

impl fmt::Display for HashKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            HashKey::Integer(value) => write!(f, "{}", value),
            HashKey::Bool(value) => write!(f, "{}", value),
            HashKey::Str(text) => write!(f, "{}", text),
        }
    }
}

impl Value {
    /// Type tag used in diagnostics.  Stable across the test suite.
    pub fn type_name(&self) -> &'static str {
        match self {
            Value::Integer(_) => "INTEGER",
            Value::Bool(_) => "BOOLEAN",
            Value::Str(_) => "STRING",
            Value::Null => "NULL",
            Value::Array(_) => "ARRAY",
            Value::Hash(_) => "HASH",
            Value::Function(_) => "FUNCTION",
            Value::Builtin(_) => "BUILTIN",
        }
    }

    pub fn hash_key(&self) -> Option<HashKey> {
        match self {
            Value::Integer(value) => Some(HashKey::Integer(*value)),
            Value::Bool(value) => Some(HashKey::Bool(*value)),
            Value::Str(text) => Some(HashKey::Str(Rc::clone(text))),
            _ => None,
        }
    }

    pub fn from_string(text: impl AsRef<str>) -> Value {
        Value::Str(Rc::from(text.as_ref()))
    }
}

/// Equality as observed by the language's `==`: tag + payload for scalars,
/// reference identity for compound values (the tagged-union rendition of
/// the original's pointer comparison).
impl PartialEq for Value {
    fn eq(&self, other: &Self) -> bool {
        match (self, other) {
            (Value::Integer(l), Value::Integer(r)) => l == r,
            (Value::Bool(l), Value::Bool(r)) => l == r,
            (Value::Str(l), Value::Str(r)) => l == r,
            (Value::Null, Value::Null) => true,
            (Value::Array(l), Value::Array(r)) => Rc::ptr_eq(l, r),
            (Value::Hash(l), Value::Hash(r)) => Rc::ptr_eq(l, r),
            (Value::Function(l), Value::Function(r)) => Rc::ptr_eq(l, r),
            (Value::Builtin(l), Value::Builtin(r)) => l == r,
            _ => false,
        }
    }
}

/// The inspect representation printed by the REPL and the batch driver.
impl fmt::Display for Value {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Value::Integer(value) => write!(f, "{}", value),
            Value::Bool(value) => write!(f, "{}", value),
            Value::Str(text) => write!(f, "{}", text),
            Value::Null => write!(f, "null"),
            Value::Array(elements) => {
                let elements = elements.iter().map(|e| e.to_string()).collect::<Vec<_>>();
                write!(f, "[{}]", elements.join(", "))
            }
            Value::Hash(pairs) => {
                let pairs = pairs
                    .iter()
                    .map(|(k, v)| format!("{}: {}", k, v))
                    .collect::<Vec<_>>();
                write!(f, "{{{}}}", pairs.join(", "))
            }
            Value::Function(func) => {
                write!(f, "fn({}) {}", func.params.join(", "), func.body)
            }
            Value::Builtin(_) => write!(f, "builtin function"),
        }
    }
}

/// Errors raised during evaluation.
///
/// These are never caught by the language: once produced, an error
/// propagates through every enclosing statement list and argument list
/// unchanged and surfaces to the host, which prints `ERROR: <message>`.
#[derive(Debug)]
pub enum RuntimeError {
    TypeMismatch {
        left: &'static str,
        op: InfixOp,
        right: &'static str,
    },
    UnknownPrefixOperator {
        op: PrefixOp,
        right: &'static str,
    },
    UnknownInfixOperator {
        left: &'static str,
        op: InfixOp,
        right: &'static str,
    },
    IdentifierNotFound(String),
    NotAFunction(&'static str),
    WrongArgumentCount {
        want: usize,
        got: usize,
    },
    WrongArgumentType {
        builtin: &'static str,
        want: &'static str,
        got: &'static str,
    },
    UnsupportedArgument {
        builtin: &'static str,
        got: &'static str,
    },
    UnusableHashKey(&'static str),
    IndexNotSupported(&'static str),
    DivisionByZero,
    Io(io::Error),
}

impl fmt::Display for RuntimeError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            RuntimeError::TypeMismatch { left, op, right } => {
                write!(f, "type mismatch: {} {} {}", left, op, right)
            }
            RuntimeError::UnknownPrefixOperator { op, right } => {
                write!(f, "unknown operator: {}{}", op, right)
            }
            RuntimeError::UnknownInfixOperator { left, op, right } => {
                write!(f, "unknown operator: {} {} {}", left, op, right)
            }
            RuntimeError::IdentifierNotFound(name) => {
                write!(f, "identifier not found: {}", name)
            }
            RuntimeError::NotAFunction(type_name) => {
                write!(f, "not a function: {}", type_name)
            }
            RuntimeError::WrongArgumentCount { want, got } => {
                write!(f, "wrong number of arguments: want={}, got={}", want, got)
            }
            RuntimeError::WrongArgumentType { builtin, want, got } => {
                write!(f, "argument to `{}` must be {}, got {}", builtin, want, got)
            }
            RuntimeError::UnsupportedArgument { builtin, got } => {
                write!(f, "argument to `{}` not supported, got {}", builtin, got)
            }
            RuntimeError::UnusableHashKey(type_name) => {
                write!(f, "unusable as hash key: {}", type_name)
            }
            RuntimeError::IndexNotSupported(type_name) => {
                write!(f, "index operation not supported: {}", type_name)
            }
            RuntimeError::DivisionByZero => write!(f, "division by zero"),
            RuntimeError::Io(e) => write!(f, "I/O error: {}", e),
        }
    }
}

impl Error for RuntimeError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        match self {
            RuntimeError::Io(e) => Some(e),
            _ => None,
        }
    }
}

impl From<io::Error> for RuntimeError {
    fn from(e: io::Error) -> RuntimeError {
        RuntimeError::Io(e)
    }
}
