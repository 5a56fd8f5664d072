//! # Validate Subcommand
//!
//! Collects every validation failure of a value against a schema.

use std::path::PathBuf;

use anyhow::{Context, Result};
use clap::Args;
use enforcer_core::{EnforcerConfig, Params, ValidationError, Value};

use crate::document::{load_document, print_json, SchemaArgs};
use crate::EXIT_INVALID;

/// Arguments for the validate subcommand.
#[derive(Args, Debug)]
pub struct ValidateArgs {
    #[command(flatten)]
    pub schema: SchemaArgs,

    /// Value to validate (JSON or YAML).
    #[arg(long)]
    pub value: PathBuf,

    /// Print failures as a JSON array instead of one line each.
    #[arg(long)]
    pub json: bool,
}

/// Execute the validate subcommand.
pub fn run_validate(args: &ValidateArgs, config: &EnforcerConfig) -> Result<u8> {
    let errors = collect_errors(args, config)?;
    tracing::info!(failures = errors.len(), value = %args.value.display(), "validated");

    if args.json {
        print_json(&serde_json::to_value(&errors).context("failed to render failures")?)?;
    } else if errors.is_empty() {
        println!("OK: {}", args.value.display());
    } else {
        for error in &errors {
            println!("{error}");
        }
    }
    Ok(if errors.is_empty() { 0 } else { EXIT_INVALID })
}

fn collect_errors(args: &ValidateArgs, config: &EnforcerConfig) -> Result<Vec<ValidationError>> {
    let enforcer = args.schema.enforcer(config, Params::new())?;
    let raw = args.schema.raw_schema(&enforcer)?;
    let value: Value = load_document(&args.value)?;
    enforcer.errors(&raw, &value).context("failed to prepare schema")
}

#[cfg(test)]
mod tests {
    use super::*;

    fn args(dir: &std::path::Path, schema: &str, value: &str) -> ValidateArgs {
        let schema_path = dir.join("schema.yaml");
        let value_path = dir.join("value.json");
        std::fs::write(&schema_path, schema).unwrap();
        std::fs::write(&value_path, value).unwrap();
        ValidateArgs {
            schema: SchemaArgs {
                schema: Some(schema_path),
                definition: None,
                definitions: None,
            },
            value: value_path,
            json: true,
        }
    }

    #[test]
    fn test_valid_value_exits_zero() {
        let dir = tempfile::tempdir().unwrap();
        let args = args(dir.path(), "type: integer\nminimum: 1\n", "3");
        assert_eq!(run_validate(&args, &EnforcerConfig::default()).unwrap(), 0);
    }

    #[test]
    fn test_every_failure_collected() {
        let dir = tempfile::tempdir().unwrap();
        let args = args(dir.path(), "type: number\nmultipleOf: 5\nminimum: 10\n", "8");
        let errors = collect_errors(&args, &EnforcerConfig::default()).unwrap();
        let mut codes: Vec<_> = errors.iter().map(|e| e.code.as_str()).collect();
        codes.sort_unstable();
        assert_eq!(codes, vec!["NMIN", "NMULT"]);
        assert_eq!(run_validate(&args, &EnforcerConfig::default()).unwrap(), EXIT_INVALID);
    }

    #[test]
    fn test_malformed_schema_is_an_error() {
        let dir = tempfile::tempdir().unwrap();
        let args = args(dir.path(), "type: integer\nminimum: low\n", "3");
        let err = run_validate(&args, &EnforcerConfig::default()).unwrap_err();
        assert!(format!("{err:#}").contains("failed to prepare schema"));
    }
}
