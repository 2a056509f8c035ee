//! Read-eval-print loop.

use std::io::{self, BufRead, Write};

use crate::interpreter::{Interpreter, MonkeyError};

const PROMPT: &str = ">>";

/// Run the loop until `input` is exhausted.
///
/// Each line is a complete program, evaluated against one session
/// environment so definitions persist across lines.  Parse errors print a
/// banner plus one tab-indented message per error and the line is not
/// evaluated; runtime errors print as `ERROR: <message>`.  Only I/O
/// failures abort the loop.
pub fn run<R: BufRead, W: Write>(mut input: R, output: &mut W) -> io::Result<()> {
    let mut interp = Interpreter::new(output);
    let mut line = String::new();
    loop {
        write!(interp.output(), "{}", PROMPT)?;
        interp.output().flush()?;

        line.clear();
        if input.read_line(&mut line)? == 0 {
            return Ok(());
        }

        match interp.eval(&line) {
            Ok(Some(value)) => writeln!(interp.output(), "{}", value)?,
            Ok(None) => (),
            Err(MonkeyError::Parse(errors)) => {
                writeln!(
                    interp.output(),
                    "Woops! We ran into some monkey business here!"
                )?;
                for msg in &errors {
                    writeln!(interp.output(), "\t{}", msg)?;
                }
            }
            Err(MonkeyError::Runtime(e)) => writeln!(interp.output(), "ERROR: {}", e)?,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn repl(input: &str) -> String {
        let mut output: Vec<u8> = Vec::new();
        run(input.as_bytes(), &mut output).expect("repl I/O error");
        String::from_utf8(output).expect("cannot convert output to string")
    }

    #[test]
    fn prints_the_result_of_each_line() {
        assert_eq!(repl("1 + 2\n"), ">>3\n>>");
        assert_eq!(repl("1 + 2\n3 * 4\n"), ">>3\n>>12\n>>");
    }

    #[test]
    fn empty_input_exits_cleanly() {
        assert_eq!(repl(""), ">>");
    }

    #[test]
    fn a_binding_prints_nothing() {
        assert_eq!(repl("let x = 5;\nx\n"), ">>>>5\n>>");
    }

    #[test]
    fn definitions_persist_across_lines() {
        assert_eq!(
            repl("let add = fn(a, b) { a + b };\nadd(2, 3)\n"),
            ">>>>5\n>>"
        );
    }

    #[test]
    fn parse_errors_print_the_banner() {
        assert_eq!(
            repl("(1\n"),
            ">>Woops! We ran into some monkey business here!\n\
             \texpected next token to be ), got EOF instead\n\
             >>"
        );
    }

    #[test]
    fn the_session_survives_a_parse_error() {
        assert_eq!(
            repl("let x = 1;\n(\nx\n"),
            ">>>>Woops! We ran into some monkey business here!\n\
             \tno prefix parse function for EOF found\n\
             >>1\n>>"
        );
    }

    #[test]
    fn runtime_errors_print_inspect_style() {
        assert_eq!(repl("-true\n"), ">>ERROR: unknown operator: -BOOLEAN\n>>");
        assert_eq!(
            repl("foobar\n"),
            ">>ERROR: identifier not found: foobar\n>>"
        );
    }

    #[test]
    fn puts_output_interleaves_with_results() {
        assert_eq!(repl("puts(\"hi\")\n"), ">>hi\nnull\n>>");
    }
}
