//! Configuration-driven build pipeline for C projects using the isolate
//! library.
//!
//! This crate provides:
//! - The project config format (`ipm_config.json`) and its resolution for a
//!   target platform
//! - Compile/link command assembly and sequential execution
//! - Shared library staging and object cleanup
//! - compile_commands.json maintenance
//! - Project scaffolding
//!
//! # Example
//!
//! ```json
//! {
//!   "platform": "auto",
//!   "build_mode": "debug",
//!   "isolate_path": "../isolate",
//!   "cc": "gcc",
//!   "out": { "windows": "game.exe", "linux": "game" },
//!   "c_files": ["main.c"],
//!   "c_flags": { "windows": [], "linux": ["-Wall"] },
//!   "include_path": { "windows": [], "linux": [] },
//!   "lib_path": { "windows": [], "linux": [] },
//!   "libs": { "windows": [], "linux": ["m"] },
//!   "dll_path": { "windows": [], "linux": [] }
//! }
//! ```

mod builder;
mod command;
mod compile_commands;
mod config;
mod error;
mod platform;
mod scaffold;
mod stage;

pub use builder::{BuildReport, Builder, CommandRunner, FailurePolicy, ProcessRunner, RunStatus};
pub use command::{compile_command, compile_units, link_command, CommandLine, CompileUnit};
pub use compile_commands::{CompileCommand, CompileCommands, COMPILE_COMMANDS_FILE};
pub use config::{
    object_path, BuildMode, IsolatePath, ProjectConfig, ProjectFile, DEFAULT_CONFIG_NAME,
    REQUIRED_KEYS,
};
pub use error::{BuildError, Result};
pub use platform::{normalize_separators, PerPlatform, Platform, PlatformDescriptor, PlatformSelector};
pub use scaffold::{generate_default, init_project};
pub use stage::{remove_objects, stage_shared_libs};
