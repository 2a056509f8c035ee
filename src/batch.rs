//! Batch driver: run test-case sources and render a combined report.
//!
//! The report format follows the interactive tools this replaces: each
//! case prints a numbered header, the source, the parser's pretty-print,
//! then either the parse errors or the evaluation output, separated by a
//! rule.

use serde::Deserialize;

use crate::environment::Environment;
use crate::eval::Evaluator;
use crate::lexer::Lexer;
use crate::parser::Parser;

/// The JSON input shape: `{"testCases": ["<src>", ...]}`.
#[derive(Debug, Deserialize)]
pub struct TestSuite {
    #[serde(rename = "testCases")]
    pub test_cases: Vec<String>,
}

/// Deserialize a suite and run every case.
pub fn run_json(json: &str) -> Result<String, serde_json::Error> {
    let suite: TestSuite = serde_json::from_str(json)?;
    Ok(run_suite(&suite))
}

/// Run every case of `suite`, each in a fresh environment.
pub fn run_suite(suite: &TestSuite) -> String {
    let mut report = String::new();
    for (i, case) in suite.test_cases.iter().enumerate() {
        render_case(&mut report, i + 1, case);
    }
    report
}

/// Run a single plain-text source.
pub fn run_source(source: &str) -> String {
    let mut report = String::new();
    render_case(&mut report, 1, source);
    report
}

fn render_case(report: &mut String, number: usize, source: &str) {
    report.push_str(&format!("test case {}:\n", number));
    report.push_str(source);
    report.push_str("\n\n");

    let mut parser = Parser::new(Lexer::new(source));
    let program = parser.parse_program();
    report.push_str(&program.to_string());
    report.push('\n');

    if !parser.errors().is_empty() {
        for msg in parser.errors() {
            report.push_str(&format!("\t{}\n", msg));
        }
    } else {
        let mut out: Vec<u8> = Vec::new();
        let env = Environment::new();
        match Evaluator::new(&mut out).eval_program(&program, &env) {
            Ok(result) => {
                report.push_str(&String::from_utf8_lossy(&out));
                if let Some(value) = result {
                    report.push_str(&format!("{}\n", value));
                }
            }
            Err(e) => report.push_str(&format!("ERROR: {}\n", e)),
        }
    }

    report.push_str("-------------\n\n");
}
