mod console;

use clap::{Args, Parser, Subcommand};
use console::ConsoleRunner;
use ipm_build::{
    init_project, BuildError, BuildReport, Builder, CommandLine, CommandRunner, FailurePolicy,
    Platform, ProcessRunner, ProjectConfig, RunStatus, DEFAULT_CONFIG_NAME,
};
use miette::{miette, Result};
use std::path::{Path, PathBuf};
use std::process::ExitCode;
use tracing_subscriber::EnvFilter;

#[derive(Parser)]
#[command(name = "ipm")]
#[command(author, version, about = "Project manager and build tool for isolate C projects")]
#[command(arg_required_else_help = true)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Initialize a new isolate project in the current directory
    Init {
        /// Project name (prompted if omitted)
        #[arg(long)]
        name: Option<String>,

        /// Path to the isolate library (prompted if omitted)
        #[arg(long)]
        isolate: Option<String>,
    },

    /// Build the project described by a config file
    Build(BuildArgs),

    /// Build the project, then run the program
    Run {
        #[command(flatten)]
        build: BuildArgs,

        /// Arguments passed to the program
        #[arg(last = true)]
        args: Vec<String>,
    },
}

#[derive(Args)]
struct BuildArgs {
    /// Config file
    #[arg(default_value = DEFAULT_CONFIG_NAME)]
    config: PathBuf,

    /// Platform used for `"platform": "auto"` (defaults to the host)
    #[arg(long, value_parser = parse_platform)]
    target: Option<Platform>,

    /// Keep building after a command fails
    #[arg(long)]
    keep_going: bool,
}

fn parse_platform(s: &str) -> std::result::Result<Platform, BuildError> {
    s.parse()
}

fn main() -> Result<ExitCode> {
    miette::set_hook(Box::new(|_| {
        Box::new(
            miette::MietteHandlerOpts::new()
                .terminal_links(true)
                .unicode(true)
                .context_lines(3)
                .build(),
        )
    }))?;

    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn")),
        )
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();

    match cli.command {
        Commands::Init { name, isolate } => {
            let name = match name {
                Some(name) => name,
                None => console::prompt("Project name")?,
            };
            if name.is_empty() {
                return Err(miette!("Project name cannot be empty"));
            }
            let isolate = match isolate {
                Some(isolate) => isolate,
                None => console::prompt("Isolate path")?,
            };

            console::info("Creating new project");
            let config = init_project(Path::new("."), &name, &isolate)?;
            console::success(format!("Created {}", config.display()));
        }

        Commands::Build(args) => {
            build(&args)?;
        }

        Commands::Run { build: args, args: program_args } => {
            let report = build(&args)?;
            ensure_runnable(&report)?;

            console::info(format!("Running {}", report.output.display()));
            let program = CommandLine::new(report.output.display().to_string()).args(program_args);
            let status = ProcessRunner.run(&program)?;
            return Ok(ExitCode::from(exit_code(status)));
        }
    }

    Ok(ExitCode::SUCCESS)
}

fn build(args: &BuildArgs) -> Result<BuildReport> {
    let host = match args.target {
        Some(platform) => platform,
        None => Platform::host()
            .ok_or_else(|| miette!("Unsupported host platform: {}", std::env::consts::OS))?,
    };

    tracing::debug!(config = %args.config.display(), %host, "loading project");
    console::info("Loading config file...");
    let config = ProjectConfig::load(&args.config, host)?;

    console::info("Building...");
    let policy = if args.keep_going {
        FailurePolicy::KeepGoing
    } else {
        FailurePolicy::Halt
    };
    let report = Builder::new(ConsoleRunner::new(ProcessRunner))
        .with_policy(policy)
        .build(&config)?;

    if report.is_clean() {
        console::success(format!(
            "Built {} ({})",
            report.output.display(),
            report.build_mode
        ));
    } else {
        console::error(format!(
            "{} command(s) failed while building {}",
            report.failures,
            report.output.display()
        ));
    }

    Ok(report)
}

/// Refuse to launch a program whose build reported failures; the binary on
/// disk may be from an earlier build.
fn ensure_runnable(report: &BuildReport) -> Result<()> {
    if report.is_clean() {
        Ok(())
    } else {
        Err(miette!(
            help = "fix the failing commands, or use `ipm build --keep-going` to build without running",
            "Not running {}: {} command(s) failed",
            report.output.display(),
            report.failures
        ))
    }
}

/// The program's exit code, or 1 if it has none that fits.
fn exit_code(status: RunStatus) -> u8 {
    status
        .code
        .and_then(|code| u8::try_from(code).ok())
        .unwrap_or(1)
}

#[cfg(test)]
mod tests {
    use super::*;
    use ipm_build::BuildMode;

    fn report(failures: usize) -> BuildReport {
        BuildReport {
            build_mode: BuildMode::Debug,
            units: Vec::new(),
            link: CommandLine::new("gcc"),
            output: PathBuf::from("bin/linux/prog"),
            staged: Vec::new(),
            removed: Vec::new(),
            compile_commands: PathBuf::from("compile_commands.json"),
            failures,
        }
    }

    #[test]
    fn test_run_with_program_args() {
        let cli = Cli::try_parse_from(["ipm", "run", "game.json", "--", "-w", "800"]).unwrap();

        match cli.command {
            Commands::Run { build, args } => {
                assert_eq!(build.config, PathBuf::from("game.json"));
                assert_eq!(args, vec!["-w", "800"]);
                assert!(!build.keep_going);
            }
            _ => panic!("expected run"),
        }
    }

    #[test]
    fn test_build_defaults() {
        let cli = Cli::try_parse_from(["ipm", "build", "--target", "windows", "--keep-going"]).unwrap();

        match cli.command {
            Commands::Build(args) => {
                assert_eq!(args.config, PathBuf::from(DEFAULT_CONFIG_NAME));
                assert_eq!(args.target, Some(Platform::Windows));
                assert!(args.keep_going);
            }
            _ => panic!("expected build"),
        }
    }

    #[test]
    fn test_rejects_unknown_target_and_command() {
        assert!(Cli::try_parse_from(["ipm", "build", "--target", "macos"]).is_err());
        assert!(Cli::try_parse_from(["ipm", "deploy"]).is_err());
        assert!(Cli::try_parse_from(["ipm"]).is_err());
    }

    #[test]
    fn test_init_flags() {
        let cli = Cli::try_parse_from(["ipm", "init", "--name", "game", "--isolate", "../isolate"]).unwrap();
        assert!(matches!(
            cli.command,
            Commands::Init { name: Some(ref n), isolate: Some(ref i) } if n == "game" && i == "../isolate"
        ));
    }

    #[test]
    fn test_run_requires_clean_build() {
        assert!(ensure_runnable(&report(0)).is_ok());

        let err = ensure_runnable(&report(2)).unwrap_err();
        assert!(err.to_string().contains("2 command(s) failed"));
    }

    #[test]
    fn test_exit_code_mapping() {
        assert_eq!(exit_code(RunStatus::success()), 0);
        assert_eq!(exit_code(RunStatus::failure(3)), 3);
        assert_eq!(exit_code(RunStatus::failure(-1)), 1);
        assert_eq!(exit_code(RunStatus { success: false, code: None }), 1);
    }
}
