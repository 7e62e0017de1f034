//! Build execution.
//!
//! [`Builder::build`] runs the whole pipeline for one resolved project:
//! compile every source, link, stage shared libraries, delete objects and
//! update compile_commands.json. Commands go through a [`CommandRunner`] so
//! callers decide how they are reported and tests can record them.

use crate::command::{compile_units, link_command, CommandLine, CompileUnit};
use crate::compile_commands;
use crate::config::{BuildMode, ProjectConfig};
use crate::stage::{remove_objects, stage_shared_libs};
use crate::{BuildError, Result};
use std::fmt;
use std::path::PathBuf;
use tracing::{debug, info, warn};

/// Outcome of one finished command.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RunStatus {
    pub success: bool,
    /// Exit code, if the process exited normally.
    pub code: Option<i32>,
}

impl RunStatus {
    pub fn success() -> Self {
        Self {
            success: true,
            code: Some(0),
        }
    }

    pub fn failure(code: i32) -> Self {
        Self {
            success: false,
            code: Some(code),
        }
    }
}

impl From<std::process::ExitStatus> for RunStatus {
    fn from(status: std::process::ExitStatus) -> Self {
        Self {
            success: status.success(),
            code: status.code(),
        }
    }
}

impl fmt::Display for RunStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.code {
            Some(code) => write!(f, "exit code {}", code),
            None => f.write_str("terminated by signal"),
        }
    }
}

/// Executes command lines.
pub trait CommandRunner {
    fn run(&mut self, command: &CommandLine) -> Result<RunStatus>;
}

/// Runs commands as child processes sharing this process's stdio.
#[derive(Debug, Clone, Copy, Default)]
pub struct ProcessRunner;

impl CommandRunner for ProcessRunner {
    fn run(&mut self, command: &CommandLine) -> Result<RunStatus> {
        debug!(program = %command.program, args = command.args.len(), "spawning");
        let status = command
            .to_process()
            .status()
            .map_err(|source| BuildError::Spawn {
                program: command.program.clone(),
                source,
            })?;
        Ok(status.into())
    }
}

/// What to do when a command fails or cannot be started.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum FailurePolicy {
    /// Stop the build with an error.
    #[default]
    Halt,
    /// Log a warning and carry on with the next step.
    KeepGoing,
}

/// Everything a finished build did.
#[derive(Debug, Clone)]
pub struct BuildReport {
    pub build_mode: BuildMode,
    pub units: Vec<CompileUnit>,
    pub link: CommandLine,
    pub output: PathBuf,
    pub staged: Vec<PathBuf>,
    pub removed: Vec<PathBuf>,
    pub compile_commands: PathBuf,
    /// Commands that failed under [`FailurePolicy::KeepGoing`].
    pub failures: usize,
}

impl BuildReport {
    pub fn is_clean(&self) -> bool {
        self.failures == 0
    }
}

/// Runs the build pipeline for resolved projects.
pub struct Builder<R> {
    runner: R,
    policy: FailurePolicy,
}

impl<R: CommandRunner> Builder<R> {
    pub fn new(runner: R) -> Self {
        Self {
            runner,
            policy: FailurePolicy::default(),
        }
    }

    pub fn with_policy(mut self, policy: FailurePolicy) -> Self {
        self.policy = policy;
        self
    }

    pub fn runner(&self) -> &R {
        &self.runner
    }

    pub fn into_runner(self) -> R {
        self.runner
    }

    /// Build `config`: compile, link, stage, clean, update the database.
    pub fn build(&mut self, config: &ProjectConfig) -> Result<BuildReport> {
        info!(
            platform = %config.platform,
            mode = %config.build_mode,
            isolate = %config.isolate_path.display(),
            sources = config.c_files.len(),
            "building"
        );
        let mut failures = 0;

        let units = compile_units(config);
        for unit in &units {
            failures += self
                .exec(&unit.command)
                .map_err(|err| discard_objects(config, err))?;
        }

        std::fs::create_dir_all(&config.out_dir).map_err(|source| {
            discard_objects(
                config,
                BuildError::Write {
                    path: config.out_dir.clone(),
                    source,
                },
            )
        })?;

        let link = link_command(config);
        failures += self
            .exec(&link)
            .map_err(|err| discard_objects(config, err))?;

        let staged = stage_shared_libs(&config.dll_path, &config.out_dir, config.platform)?;
        let removed = remove_objects(&config.o_files)?;

        let compile_commands = config.compile_commands_path();
        compile_commands::update(&compile_commands, &config.project_dir, &units)?;

        Ok(BuildReport {
            build_mode: config.build_mode,
            units,
            link,
            output: config.out.clone(),
            staged,
            removed,
            compile_commands,
            failures,
        })
    }

    /// Run one command, returning 1 if it failed and the policy allows it.
    fn exec(&mut self, command: &CommandLine) -> Result<usize> {
        let result = self.runner.run(command);

        let err = match result {
            Ok(status) if status.success => return Ok(0),
            Ok(status) => BuildError::CommandFailed {
                command: command.to_string(),
                status: status.to_string(),
            },
            Err(err) => err,
        };

        match self.policy {
            FailurePolicy::Halt => Err(err),
            FailurePolicy::KeepGoing => {
                warn!(error = %err, "continuing after failed command");
                Ok(1)
            }
        }
    }
}

/// Remove whatever objects a halted build left behind, then hand back the
/// error that stopped it.
fn discard_objects(config: &ProjectConfig, err: BuildError) -> BuildError {
    if let Err(cleanup) = remove_objects(&config.o_files) {
        warn!(error = %cleanup, "could not remove objects after failed build");
    }
    err
}
