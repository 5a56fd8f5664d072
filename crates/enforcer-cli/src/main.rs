//! # enforcer CLI entry point
//!
//! Parses command-line arguments and dispatches to subcommand handlers.

use std::path::PathBuf;
use std::process::ExitCode;

use clap::{Parser, Subcommand};
use tracing_subscriber::EnvFilter;

use enforcer_cli::edit::{run_edit, EditArgs};
use enforcer_cli::parse::{run_parse, ParseArgs};
use enforcer_cli::populate::{run_populate, PopulateArgs};
use enforcer_cli::validate::{run_validate, ValidateArgs};
use enforcer_cli::{load_config, EXIT_ERROR};

/// Schema enforcer: validate, populate, and edit values, and parse
/// request parameters, against Swagger 2 / OpenAPI schemas.
#[derive(Parser, Debug)]
#[command(name = "enforcer", version, about)]
struct Cli {
    /// Increase output verbosity (-v info, -vv debug, -vvv trace).
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    verbose: u8,

    /// Enforcer configuration file (JSON or YAML).
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// Report every validation failure of a value.
    Validate(ValidateArgs),
    /// Fill defaults, templates, and variables into a value.
    Populate(PopulateArgs),
    /// Apply assignments to a value under live enforcement.
    Edit(EditArgs),
    /// Parse request parameters against their declarations.
    Parse(ParseArgs),
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
        .with_writer(std::io::stderr)
        .init();

    let result = load_config(cli.config.as_deref()).and_then(|config| match &cli.command {
        Commands::Validate(args) => run_validate(args, &config),
        Commands::Populate(args) => run_populate(args, &config),
        Commands::Edit(args) => run_edit(args, &config),
        Commands::Parse(args) => run_parse(args, &config),
    });

    match result {
        Ok(code) => ExitCode::from(code),
        Err(e) => {
            tracing::error!("{e:#}");
            ExitCode::from(EXIT_ERROR)
        }
    }
}
