//! Host-provided functions.

use std::io::Write;
use std::rc::Rc;

use crate::object::{RuntimeError, Value};

/// The fixed set of built-in functions.
///
/// Dispatch is by match rather than a function-pointer table so that
/// `puts` can reach the evaluator's output sink.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Builtin {
    Len,
    First,
    Last,
    Rest,
    Push,
    Puts,
}

impl Builtin {
    /// Resolve a name that was not found in the environment chain.
    pub fn lookup(name: &str) -> Option<Builtin> {
        match name {
            "len" => Some(Builtin::Len),
            "first" => Some(Builtin::First),
            "last" => Some(Builtin::Last),
            "rest" => Some(Builtin::Rest),
            "push" => Some(Builtin::Push),
            "puts" => Some(Builtin::Puts),
            _ => None,
        }
    }

    pub fn name(self) -> &'static str {
        match self {
            Builtin::Len => "len",
            Builtin::First => "first",
            Builtin::Last => "last",
            Builtin::Rest => "rest",
            Builtin::Push => "push",
            Builtin::Puts => "puts",
        }
    }

    pub fn apply<W: Write>(
        self,
        args: &[Value],
        output: &mut W,
    ) -> Result<Value, RuntimeError> {
        match self {
            Builtin::Len => {
                let arg = single_argument(args)?;
                match arg {
                    Value::Str(text) => Ok(Value::Integer(text.len() as i64)),
                    Value::Array(elements) => Ok(Value::Integer(elements.len() as i64)),
                    other => Err(RuntimeError::UnsupportedArgument {
                        builtin: self.name(),
                        got: other.type_name(),
                    }),
                }
            }
            Builtin::First => {
                let elements = array_argument(self, args)?;
                Ok(elements.first().cloned().unwrap_or(Value::Null))
            }
            Builtin::Last => {
                let elements = array_argument(self, args)?;
                Ok(elements.last().cloned().unwrap_or(Value::Null))
            }
            Builtin::Rest => {
                let elements = array_argument(self, args)?;
                if elements.is_empty() {
                    Ok(Value::Null)
                } else {
                    Ok(Value::Array(Rc::from(&elements[1..])))
                }
            }
            Builtin::Push => {
                if args.len() != 2 {
                    return Err(RuntimeError::WrongArgumentCount {
                        want: 2,
                        got: args.len(),
                    });
                }
                match &args[0] {
                    Value::Array(elements) => {
                        let mut pushed = elements.to_vec();
                        pushed.push(args[1].clone());
                        Ok(Value::Array(Rc::from(pushed)))
                    }
                    other => Err(RuntimeError::WrongArgumentType {
                        builtin: self.name(),
                        want: "ARRAY",
                        got: other.type_name(),
                    }),
                }
            }
            Builtin::Puts => {
                for arg in args {
                    writeln!(output, "{}", arg)?;
                }
                Ok(Value::Null)
            }
        }
    }
}

fn single_argument(args: &[Value]) -> Result<&Value, RuntimeError> {
    if args.len() != 1 {
        return Err(RuntimeError::WrongArgumentCount {
            want: 1,
            got: args.len(),
        });
    }
    Ok(&args[0])
}

fn array_argument(builtin: Builtin, args: &[Value]) -> Result<Rc<[Value]>, RuntimeError> {
    match single_argument(args)? {
        Value::Array(elements) => Ok(Rc::clone(elements)),
        other => Err(RuntimeError::WrongArgumentType {
            builtin: builtin.name(),
            want: "ARRAY",
            got: other.type_name(),
        }),
    }
}
