//! compile_commands.json maintenance.
//!
//! Editors and clang tooling read this file to learn the exact compile
//! invocation of every source. Entries are keyed by source file and merged
//! into whatever the file already holds; entries for sources that are no
//! longer built are kept.

use crate::command::CompileUnit;
use crate::{BuildError, Result};
use indexmap::IndexMap;
use serde::{Deserialize, Serialize};
use std::path::Path;

/// File name of the compilation database, at the project root.
pub const COMPILE_COMMANDS_FILE: &str = "compile_commands.json";

/// A single compile command from compile_commands.json.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CompileCommand {
    /// The working directory for compilation.
    pub directory: String,

    /// The full compilation command (space-separated).
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub command: Option<String>,

    /// The compilation arguments (array form), as written by other tools.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub arguments: Option<Vec<String>>,

    /// The source file path.
    pub file: String,
}

impl CompileCommand {
    /// Entry for a unit compiled from `directory`.
    pub fn from_unit(unit: &CompileUnit, directory: &Path) -> Self {
        Self {
            directory: directory.display().to_string(),
            command: Some(unit.command.to_string()),
            arguments: None,
            file: unit.source.display().to_string(),
        }
    }
}

/// Collection of compile commands keyed by source file, in file order.
#[derive(Debug, Clone, Default)]
pub struct CompileCommands {
    commands: IndexMap<String, CompileCommand>,
}

impl CompileCommands {
    pub fn new() -> Self {
        Self::default()
    }

    /// Load compile commands from a JSON file.
    pub fn from_file(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path).map_err(|source| BuildError::Read {
            path: path.to_path_buf(),
            source,
        })?;
        Self::from_str(&content)
    }

    /// Load the file at `path` if it exists, otherwise start empty.
    pub fn load_or_default(path: &Path) -> Result<Self> {
        if path.is_file() {
            Self::from_file(path)
        } else {
            Ok(Self::new())
        }
    }

    /// Parse compile commands from a JSON string. A later entry for the same
    /// file replaces an earlier one.
    pub fn from_str(json: &str) -> Result<Self> {
        let entries: Vec<CompileCommand> = serde_json::from_str(json)?;
        let mut commands = Self::new();
        commands.merge(entries);
        Ok(commands)
    }

    /// Insert or replace entries. A replaced entry keeps its position.
    pub fn merge(&mut self, entries: impl IntoIterator<Item = CompileCommand>) {
        for entry in entries {
            self.commands.insert(entry.file.clone(), entry);
        }
    }

    pub fn len(&self) -> usize {
        self.commands.len()
    }

    pub fn is_empty(&self) -> bool {
        self.commands.is_empty()
    }

    /// All compile commands, in file order.
    pub fn commands(&self) -> impl Iterator<Item = &CompileCommand> {
        self.commands.values()
    }

    /// Find the compile command for a specific source file.
    pub fn find_command(&self, file: &str) -> Option<&CompileCommand> {
        self.commands.get(file)
    }

    /// Serialize as a JSON array with four-space indentation.
    pub fn to_json(&self) -> Result<String> {
        let entries: Vec<&CompileCommand> = self.commands().collect();
        let mut buf = Vec::new();
        let formatter = serde_json::ser::PrettyFormatter::with_indent(b"    ");
        let mut ser = serde_json::Serializer::with_formatter(&mut buf, formatter);
        entries.serialize(&mut ser)?;
        // serde_json only ever writes UTF-8.
        Ok(String::from_utf8_lossy(&buf).into_owned())
    }

    /// Replace the file at `path` with this collection.
    pub fn write(&self, path: &Path) -> Result<()> {
        std::fs::write(path, self.to_json()?).map_err(|source| BuildError::Write {
            path: path.to_path_buf(),
            source,
        })
    }
}

/// Merge `units` into the database at `path` and write it back.
pub fn update(path: &Path, directory: &Path, units: &[CompileUnit]) -> Result<CompileCommands> {
    let mut commands = CompileCommands::load_or_default(path)?;
    commands.merge(units.iter().map(|unit| CompileCommand::from_unit(unit, directory)));
    commands.write(path)?;
    Ok(commands)
}
