//! Error types for ipm-build.

use miette::Diagnostic;
use std::path::PathBuf;
use thiserror::Error;

/// Result type for ipm-build operations.
pub type Result<T> = std::result::Result<T, BuildError>;

/// Errors that can occur while loading, scaffolding or building a project.
#[derive(Error, Diagnostic, Debug)]
pub enum BuildError {
    /// Configuration file does not exist.
    #[error("File not found: {}", .0.display())]
    #[diagnostic(code(ipm::config::not_found), help("run `ipm init` to create a project"))]
    ConfigNotFound(PathBuf),

    /// Failed to read a file.
    #[error("Failed to read {}: {source}", path.display())]
    #[diagnostic(code(ipm::io::read))]
    Read {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// Failed to write or create a file or directory.
    #[error("Failed to write {}: {source}", path.display())]
    #[diagnostic(code(ipm::io::write))]
    Write {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// Failed to parse JSON (config or compile_commands.json).
    #[error("Failed to parse JSON: {0}")]
    #[diagnostic(code(ipm::config::json))]
    ParseJson(#[from] serde_json::Error),

    /// A required top-level key is absent from the config.
    #[error("Missing key in config: `{0}`")]
    #[diagnostic(code(ipm::config::missing_key))]
    MissingKey(&'static str),

    /// A per-platform map has no entry for the target platform.
    #[error("`{key}` has no entry for platform `{platform}`")]
    #[diagnostic(code(ipm::config::missing_platform))]
    MissingPlatformEntry { key: &'static str, platform: String },

    /// Platform identifier other than `auto`, `windows` or `linux`.
    #[error("Unsupported platform: {0}")]
    #[diagnostic(code(ipm::platform::unsupported), help("expected one of: auto, windows, linux"))]
    UnsupportedPlatform(String),

    /// `init` target directory already exists.
    #[error("{} project already exists.", .0.display())]
    #[diagnostic(code(ipm::init::exists))]
    ProjectExists(PathBuf),

    /// A compiler, linker or program could not be started.
    #[error("Failed to execute `{program}`: {source}")]
    #[diagnostic(code(ipm::exec::spawn))]
    Spawn {
        program: String,
        #[source]
        source: std::io::Error,
    },

    /// A command exited unsuccessfully.
    #[error("Command failed ({status}): {command}")]
    #[diagnostic(
        code(ipm::exec::failed),
        help("pass --keep-going to continue the build after failed commands")
    )]
    CommandFailed { command: String, status: String },
}
