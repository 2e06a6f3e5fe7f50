//! # quire CLI entry point
//!
//! Parses command-line arguments, loads configuration, and dispatches to
//! subcommand handlers.

use std::path::PathBuf;
use std::process::ExitCode;

use clap::{Parser, Subcommand};
use tracing_subscriber::EnvFilter;

use quire_cli::build::{run_build, BuildArgs};
use quire_cli::check::{run_check, CheckArgs};
use quire_cli::config::QuireConfig;
use quire_cli::fix::{run_fix, FixArgs};
use quire_cli::validate::{run_validate, ValidateArgs};
use quire_cli::verify::{run_verify, VerifyArgs};

/// quire: chapter template compliance and container packaging.
///
/// Checks chapters against the house template, retrofits legacy chapters,
/// builds mimetype-first containers, and runs the external conformance
/// tool over finished books.
#[derive(Parser, Debug)]
#[command(name = "quire", version, about, long_about = None)]
struct Cli {
    /// Enable verbose output. Repeat for more verbosity (-v, -vv, -vvv).
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    verbose: u8,

    /// Path to configuration file (default: ./quire.yaml if present).
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// Check chapters against the template and write a compliance report.
    Check(CheckArgs),

    /// Write remediated chapters to an output directory.
    Fix(FixArgs),

    /// Assemble a container from an unpacked package and verify it.
    Build(BuildArgs),

    /// Verify the packaging of an existing container.
    Verify(VerifyArgs),

    /// Run the external conformance tool over every container in a directory.
    Validate(ValidateArgs),
}

fn main() -> ExitCode {
    let cli = Cli::parse();

    let filter = match cli.verbose {
        0 => EnvFilter::new("warn"),
        1 => EnvFilter::new("info"),
        2 => EnvFilter::new("debug"),
        _ => EnvFilter::new("trace"),
    };

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .init();

    let work_dir = std::env::current_dir().unwrap_or_else(|_| PathBuf::from("."));
    tracing::debug!(work_dir = %work_dir.display(), "quire starting");

    let config = match QuireConfig::load(cli.config.as_deref(), &work_dir) {
        Ok(config) => config,
        Err(e) => {
            tracing::error!("{e:#}");
            return ExitCode::from(1);
        }
    };

    let result = match cli.command {
        Commands::Check(args) => run_check(&args, &config, &work_dir),
        Commands::Fix(args) => run_fix(&args, &config, &work_dir),
        Commands::Build(args) => run_build(&args, &work_dir),
        Commands::Verify(args) => run_verify(&args, &work_dir),
        Commands::Validate(args) => run_validate(&args, &config, &work_dir),
    };

    match result {
        Ok(code) => ExitCode::from(code),
        Err(e) => {
            tracing::error!("{e:#}");
            ExitCode::from(1)
        }
    }
}
