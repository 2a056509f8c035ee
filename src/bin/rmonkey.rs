//! Monkey interpreter command-line.
//!
//! When called without argument it drops into an interactive
//! read-evaluate-print loop.
//!
//! When called with arguments, each file is run through the batch driver
//! and its report is written to a companion `<path>.out` file.  A file
//! ending in `.json` is treated as a `{"testCases": [...]}` suite; any
//! other file is a single plain-text source.

use std::env;
use std::fs;
use std::io;

use anyhow::Context;

use rmonkey::{batch, repl};

fn main() -> Result<(), anyhow::Error> {
    let args = env::args().skip(1).collect::<Vec<_>>();
    if args.is_empty() {
        run_prompt()?;
    } else {
        for path in &args {
            run_file(path)?;
        }
    }
    Ok(())
}

fn run_file(path: &str) -> Result<(), anyhow::Error> {
    let source =
        fs::read_to_string(path).with_context(|| format!("failed to read {}", path))?;
    let report = if path.ends_with(".json") {
        batch::run_json(&source)
            .with_context(|| format!("failed to parse {} as a test suite", path))?
    } else {
        batch::run_source(&source)
    };
    let out_path = format!("{}.out", path);
    fs::write(&out_path, report).with_context(|| format!("failed to write {}", out_path))?;
    Ok(())
}

fn run_prompt() -> io::Result<()> {
    println!("Feel free to type in commands");
    let stdin = io::stdin();
    let mut stdout = io::stdout();
    repl::run(stdin.lock(), &mut stdout)
}
