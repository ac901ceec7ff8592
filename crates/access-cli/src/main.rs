//! # access CLI entry point
//!
//! Parses command-line arguments and dispatches to subcommand handlers.

use std::process::ExitCode;

use clap::{Parser, Subcommand};
use tracing_subscriber::EnvFilter;

use access_cli::assemble::{run_assemble, AssembleArgs};
use access_cli::compile::{run_compile, CompileArgs};
use access_cli::delegate::{run_delegate, DelegateArgs};
use access_cli::verify::{run_verify, VerifyArgs};

/// Delegated access policy tool.
///
/// Compiles rules into attribute trees, assembles content-addressed
/// policies, verifies policy ids and signs delegate requests.
#[derive(Parser, Debug)]
#[command(name = "access", version, about, long_about = None)]
struct Cli {
    /// Emit logs as JSON lines.
    #[arg(long, global = true)]
    log_json: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// Compile a rule spec into its attribute tree.
    Compile(CompileArgs),

    /// Assemble policies from a delegation file.
    Assemble(AssembleArgs),

    /// Recompute and check policy ids.
    Verify(VerifyArgs),

    /// Produce signed delegate requests.
    Delegate(DelegateArgs),
}

fn main() -> ExitCode {
    let cli = Cli::parse();

    // Logs go to stderr so stdout stays machine-readable.
    let builder = tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .with_writer(std::io::stderr)
        .with_target(false);
    if cli.log_json {
        builder.json().init();
    } else {
        builder.init();
    }

    let result = match &cli.command {
        Commands::Compile(args) => run_compile(args),
        Commands::Assemble(args) => run_assemble(args),
        Commands::Verify(args) => run_verify(args),
        Commands::Delegate(args) => run_delegate(args),
    };

    match result {
        Ok(code) => ExitCode::from(code),
        Err(e) => {
            tracing::error!("{e:#}");
            ExitCode::from(1)
        }
    }
}
