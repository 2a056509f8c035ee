//! API to control the interpreter.

use std::error::Error;
use std::fmt;
use std::io::Write;
use std::rc::Rc;

use crate::environment::Environment;
use crate::eval::Evaluator;
use crate::lexer::Lexer;
use crate::object::{RuntimeError, Value};
use crate::parser::Parser;

/// An interpreter session.
///
/// Each [`Interpreter::eval`] call runs one source text through the whole
/// pipeline (lexer, parser, evaluator) against a session-lifetime
/// environment, so definitions persist across calls.  `puts` output goes
/// to the writer the session was built with.
///
/// # Example
///
/// Define a function in one round, then call it in later rounds:
///
/// ```
/// # use rmonkey::interpreter::{Interpreter, MonkeyError};
/// let mut output: Vec<u8> = Vec::new();
/// let mut interp = Interpreter::new(&mut output);
///
/// interp.eval("let max = fn(x, y) { if (x > y) { x } else { y } };")?;
///
/// let value = interp.eval("max(10, 20)")?.expect("a value");
/// assert_eq!(value.to_string(), "20");
/// # Ok::<(), MonkeyError>(())
/// ```
#[derive(Debug)]
pub struct Interpreter<'t, W: Write> {
    evaluator: Evaluator<'t, W>,
    env: Rc<Environment>,
}

/// Errors the interpreter can raise.
#[derive(Debug)]
pub enum MonkeyError {
    /// Everything the parser recorded for the source text.
    Parse(Vec<String>),

    /// Error occurring during evaluation.
    Runtime(RuntimeError),
}

impl fmt::Display for MonkeyError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            MonkeyError::Parse(errors) => write!(f, "parser errors: {}", errors.join("; ")),
            MonkeyError::Runtime(e) => write!(f, "runtime error: {}", e),
        }
    }
}

impl Error for MonkeyError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        match self {
            MonkeyError::Parse(_) => None,
            MonkeyError::Runtime(e) => Some(e),
        }
    }
}

impl From<RuntimeError> for MonkeyError {
    fn from(e: RuntimeError) -> MonkeyError {
        MonkeyError::Runtime(e)
    }
}

impl<'t, W: Write> Interpreter<'t, W> {
    pub fn new(output: &'t mut W) -> Interpreter<'t, W> {
        Interpreter {
            evaluator: Evaluator::new(output),
            env: Environment::new(),
        }
    }

    /// Evaluate one source text.  `Ok(None)` means the text produced no
    /// value (for example a trailing `let`).
    pub fn eval(&mut self, source: &str) -> Result<Option<Value>, MonkeyError> {
        let mut parser = Parser::new(Lexer::new(source));
        let program = parser.parse_program();
        if !parser.errors().is_empty() {
            return Err(MonkeyError::Parse(parser.errors().to_vec()));
        }
        let result = self.evaluator.eval_program(&program, &self.env)?;
        Ok(result)
    }

    /// The writer the session prints to.  Drivers use this to interleave
    /// their own output (prompts, banners) with `puts` output.
    pub fn output(&mut self) -> &mut W {
        self.evaluator.output_mut()
    }
}
