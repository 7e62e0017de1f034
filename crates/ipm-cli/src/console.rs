//! Console output and prompts.

use colored::*;
use ipm_build::{CommandLine, CommandRunner, Result, RunStatus};
use miette::{miette, IntoDiagnostic};
use std::fmt::Display;
use std::io::Write;

pub fn info(msg: impl Display) {
    println!("{} {}", "[INFO]:".magenta(), msg);
}

pub fn success(msg: impl Display) {
    println!("{} {}", "[SUCCESS]:".green(), msg);
}

pub fn error(msg: impl Display) {
    eprintln!("{} {}", "[ERROR]:".red(), msg);
}

pub fn command(cmd: &CommandLine) {
    println!("{} {}\n", "[CMD]:".cyan(), cmd);
}

/// Ask for a line of input; surrounding whitespace is trimmed.
pub fn prompt(label: &str) -> miette::Result<String> {
    print!("{}: ", label.bold());
    std::io::stdout().flush().into_diagnostic()?;

    let mut input = String::new();
    let read = std::io::stdin().read_line(&mut input).into_diagnostic()?;
    if read == 0 {
        return Err(miette!("No input for {}", label));
    }
    Ok(input.trim().to_string())
}

/// Prints every command before handing it to the inner runner.
pub struct ConsoleRunner<R> {
    inner: R,
}

impl<R> ConsoleRunner<R> {
    pub fn new(inner: R) -> Self {
        Self { inner }
    }
}

impl<R: CommandRunner> CommandRunner for ConsoleRunner<R> {
    fn run(&mut self, cmd: &CommandLine) -> Result<RunStatus> {
        command(cmd);
        self.inner.run(cmd)
    }
}
