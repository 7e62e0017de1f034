//! Compile and link command assembly.
//!
//! Commands are argument vectors, never shell strings. The `Display` form
//! (space-joined, quoting arguments with whitespace) is what gets printed
//! and stored in compile_commands.json.

use crate::config::ProjectConfig;
use std::fmt;
use std::path::{Path, PathBuf};

/// A program and its arguments.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct CommandLine {
    pub program: String,
    pub args: Vec<String>,
}

impl CommandLine {
    pub fn new(program: impl Into<String>) -> Self {
        Self {
            program: program.into(),
            args: Vec::new(),
        }
    }

    /// Append one argument.
    pub fn arg(mut self, arg: impl Into<String>) -> Self {
        self.args.push(arg.into());
        self
    }

    /// Append several arguments.
    pub fn args<I, S>(mut self, args: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.args.extend(args.into_iter().map(Into::into));
        self
    }

    /// Append a path argument.
    pub fn path(self, path: &Path) -> Self {
        self.arg(path.display().to_string())
    }

    /// A `std::process::Command` running this command line.
    pub fn to_process(&self) -> std::process::Command {
        let mut cmd = std::process::Command::new(&self.program);
        cmd.args(&self.args);
        cmd
    }
}

impl fmt::Display for CommandLine {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write_word(f, &self.program)?;
        for arg in &self.args {
            f.write_str(" ")?;
            write_word(f, arg)?;
        }
        Ok(())
    }
}

fn write_word(f: &mut fmt::Formatter<'_>, word: &str) -> fmt::Result {
    if word.is_empty() || word.chars().any(char::is_whitespace) {
        write!(f, "\"{}\"", word.replace('"', "\\\""))
    } else {
        f.write_str(word)
    }
}

/// The compile step for one source file.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CompileUnit {
    pub source: PathBuf,
    pub object: PathBuf,
    pub command: CommandLine,
}

/// `-I<dir>` for every include directory, in declared order.
fn include_args(config: &ProjectConfig) -> impl Iterator<Item = String> + '_ {
    config
        .include_path
        .iter()
        .map(|dir| format!("-I{}", dir.display()))
}

/// `<cc> <flags> <includes> -o <object> -c <source>`
pub fn compile_command(config: &ProjectConfig, source: &Path, object: &Path) -> CommandLine {
    CommandLine::new(&config.cc)
        .args(&config.c_flags)
        .args(include_args(config))
        .arg("-o")
        .path(object)
        .arg("-c")
        .path(source)
}

/// One compile unit per source file, in source order.
pub fn compile_units(config: &ProjectConfig) -> Vec<CompileUnit> {
    config
        .units()
        .map(|(source, object)| CompileUnit {
            source: source.to_path_buf(),
            object: object.to_path_buf(),
            command: compile_command(config, source, object),
        })
        .collect()
}

/// `<cc> <flags> -o <out> <objects...> <-L dirs> <-l libs>`
pub fn link_command(config: &ProjectConfig) -> CommandLine {
    let mut cmd = CommandLine::new(&config.cc)
        .args(&config.c_flags)
        .arg("-o")
        .path(&config.out);

    for object in &config.o_files {
        cmd = cmd.path(object);
    }

    cmd.args(config.lib_path.iter().map(|dir| format!("-L{}", dir.display())))
        .args(config.libs.iter().map(|lib| format!("-l{}", lib)))
}
