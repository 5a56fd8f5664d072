//! # Populate Subcommand
//!
//! Fills absent values from `x-variable` parameters, `x-template`
//! templates, and `default`s, then prints the result.

use std::path::PathBuf;

use anyhow::{Context, Result};
use clap::Args;
use enforcer_core::{EnforcerConfig, Params, Value};
use enforcer_schema::Population;

use crate::document::{load_document, parse_params, print_json, SchemaArgs};

/// Arguments for the populate subcommand.
#[derive(Args, Debug)]
pub struct PopulateArgs {
    #[command(flatten)]
    pub schema: SchemaArgs,

    /// Starting value (JSON or YAML); omitted to derive one from scratch.
    #[arg(long)]
    pub value: Option<PathBuf>,

    /// Substitution parameter as NAME=VALUE (repeatable).
    #[arg(long = "param", value_name = "NAME=VALUE")]
    pub params: Vec<String>,

    /// File holding a parameter map; `--param` entries override it.
    #[arg(long)]
    pub params_file: Option<PathBuf>,
}

/// Execute the populate subcommand.
pub fn run_populate(args: &PopulateArgs, config: &EnforcerConfig) -> Result<u8> {
    let population = populate(args, config)?;
    tracing::info!(applied = population.applied, "populated");
    let output = population.value.map_or(serde_json::Value::Null, |value| value.to_json());
    print_json(&output)?;
    Ok(0)
}

fn populate(args: &PopulateArgs, config: &EnforcerConfig) -> Result<Population> {
    let mut params = match &args.params_file {
        Some(path) => load_document::<Params>(path)?,
        None => Params::new(),
    };
    params.extend(parse_params(&args.params)?);

    let enforcer = args.schema.enforcer(config, params)?;
    let raw = args.schema.raw_schema(&enforcer)?;
    let value = args.value.as_deref().map(load_document::<Value>).transpose()?;
    enforcer.populate(&raw, value).context("failed to prepare schema")
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn schema_file(dir: &std::path::Path) -> SchemaArgs {
        let path = dir.join("owner.yaml");
        std::fs::write(
            &path,
            r#"
type: object
required: [id, home]
properties:
  id:
    type: integer
    x-variable: id
  home:
    type: string
    x-template: "/owners/{id}"
  active:
    type: boolean
    default: true
"#,
        )
        .unwrap();
        SchemaArgs {
            schema: Some(path),
            definition: None,
            definitions: None,
        }
    }

    #[test]
    fn test_populate_from_params() {
        let dir = tempfile::tempdir().unwrap();
        let args = PopulateArgs {
            schema: schema_file(dir.path()),
            value: None,
            params: vec!["id=7".to_string()],
            params_file: None,
        };
        let population = populate(&args, &EnforcerConfig::default()).unwrap();
        assert!(population.applied);
        assert_eq!(
            population.value.unwrap(),
            Value::from(json!({"id": 7, "home": "/owners/7", "active": true}))
        );
    }

    #[test]
    fn test_params_file_overridden_by_flags() {
        let dir = tempfile::tempdir().unwrap();
        let params_path = dir.path().join("params.json");
        std::fs::write(&params_path, r#"{"id": 1}"#).unwrap();
        let value_path = dir.path().join("value.json");
        std::fs::write(&value_path, r#"{"active": false}"#).unwrap();
        let args = PopulateArgs {
            schema: schema_file(dir.path()),
            value: Some(value_path),
            params: vec!["id=2".to_string()],
            params_file: Some(params_path),
        };
        let population = populate(&args, &EnforcerConfig::default()).unwrap();
        assert_eq!(
            population.value.unwrap(),
            Value::from(json!({"id": 2, "home": "/owners/2", "active": false}))
        );
    }

    #[test]
    fn test_missing_required_leaves_value_absent() {
        let dir = tempfile::tempdir().unwrap();
        let args = PopulateArgs {
            schema: schema_file(dir.path()),
            value: None,
            params: Vec::new(),
            params_file: None,
        };
        let population = populate(&args, &EnforcerConfig::default()).unwrap();
        assert!(!population.applied);
        assert!(population.value.is_none());
        assert_eq!(run_populate(&args, &EnforcerConfig::default()).unwrap(), 0);
    }
}
