//! # Input Documents
//!
//! Every file the CLI reads is JSON or YAML; YAML is parsed for both since
//! it accepts JSON text. Schemas are selected either from a standalone file
//! or by name from a definitions document.

use std::path::{Path, PathBuf};

use anyhow::{bail, Context, Result};
use clap::Args;
use enforcer_core::{EnforcerConfig, Params, Value};
use enforcer_schema::Enforcer;
use serde::de::DeserializeOwned;
use serde_json::{json, Value as Json};

/// Read and parse a JSON or YAML file.
pub fn load_document<T: DeserializeOwned>(path: &Path) -> Result<T> {
    let content = std::fs::read_to_string(path)
        .with_context(|| format!("failed to read {}", path.display()))?;
    serde_yaml::from_str(&content).with_context(|| format!("invalid JSON or YAML in {}", path.display()))
}

/// Load an [`EnforcerConfig`], or the defaults when no file is given.
pub fn load_config(path: Option<&Path>) -> Result<EnforcerConfig> {
    match path {
        Some(path) => {
            let config: EnforcerConfig = load_document(path)?;
            tracing::debug!(path = %path.display(), "loaded configuration");
            Ok(config)
        }
        None => Ok(EnforcerConfig::default()),
    }
}

/// Where the governing schema comes from.
#[derive(Args, Debug, Clone)]
pub struct SchemaArgs {
    /// Schema document (JSON or YAML).
    #[arg(long, required_unless_present = "definition", conflicts_with = "definition")]
    pub schema: Option<PathBuf>,

    /// Name of a definition to use as the schema (requires --definitions).
    #[arg(long, requires = "definitions")]
    pub definition: Option<String>,

    /// Document holding named definitions: a Swagger 2 document or a bare
    /// name-to-schema map.
    #[arg(long)]
    pub definitions: Option<PathBuf>,
}

impl SchemaArgs {
    /// Build an [`Enforcer`] carrying the definitions and `params`.
    pub fn enforcer(&self, config: &EnforcerConfig, params: Params) -> Result<Enforcer> {
        let enforcer = Enforcer::new(config.clone()).with_params(params);
        let Some(path) = &self.definitions else {
            return Ok(enforcer);
        };
        let document: Json = load_document(path)?;
        let table = document.get("definitions").unwrap_or(&document);
        enforcer
            .with_raw_definitions(table)
            .with_context(|| format!("invalid definitions in {}", path.display()))
    }

    /// The raw schema to prepare.
    pub fn raw_schema(&self, enforcer: &Enforcer) -> Result<Json> {
        if let Some(name) = &self.definition {
            if enforcer.definitions().get(name).is_none() {
                bail!("no definition named {name:?}");
            }
            return Ok(json!({ "$ref": format!("#/definitions/{name}") }));
        }
        match &self.schema {
            Some(path) => load_document(path),
            None => bail!("either --schema or --definition is required"),
        }
    }
}

/// Parse `NAME=VALUE` pairs into population parameters. The value is read
/// as JSON when it parses, otherwise kept as a string.
pub fn parse_params(pairs: &[String]) -> Result<Params> {
    let mut params = Params::new();
    for pair in pairs {
        let (name, text) = pair
            .split_once('=')
            .with_context(|| format!("parameter {pair:?} is not NAME=VALUE"))?;
        params.insert(name.to_string(), literal(text));
    }
    Ok(params)
}

/// A command-line literal: JSON when it parses, else the text itself.
pub fn literal(text: &str) -> Value {
    match serde_json::from_str::<Json>(text) {
        Ok(json) => Value::from(json),
        Err(_) => Value::from(text),
    }
}

/// Print a value as pretty JSON on stdout.
pub fn print_json(value: &Json) -> Result<()> {
    let text = serde_json::to_string_pretty(value).context("failed to render output")?;
    println!("{text}");
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    #[test]
    fn test_load_json_and_yaml() {
        let dir = tempfile::tempdir().unwrap();
        let json_path = dir.path().join("a.json");
        std::fs::write(&json_path, r#"{"type": "string"}"#).unwrap();
        let yaml_path = dir.path().join("a.yaml");
        std::fs::write(&yaml_path, "type: string\n").unwrap();

        let a: Json = load_document(&json_path).unwrap();
        let b: Json = load_document(&yaml_path).unwrap();
        assert_eq!(a, b);
    }

    #[test]
    fn test_load_missing_file_has_context() {
        let err = load_document::<Json>(Path::new("/nonexistent/schema.yaml")).unwrap_err();
        assert!(format!("{err:#}").contains("failed to read"));
    }

    #[test]
    fn test_load_config_camel_case() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        writeln!(file, "autoFormat: true\nuseDefaults: false").unwrap();
        let config = load_config(Some(file.path())).unwrap();
        assert!(config.auto_format);
        assert!(!config.use_defaults);
        assert!(config.use_templates);
    }

    #[test]
    fn test_parse_params() {
        let params = parse_params(&["id=7".to_string(), "name=Rex".to_string()]).unwrap();
        assert_eq!(params.get("id"), Some(&Value::Integer(7)));
        assert_eq!(params.get("name"), Some(&Value::from("Rex")));
        assert!(parse_params(&["broken".to_string()]).is_err());
    }

    #[test]
    fn test_definition_selected_by_name() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("defs.yaml");
        std::fs::write(&path, "definitions:\n  Pet:\n    type: object\n").unwrap();
        let args = SchemaArgs {
            schema: None,
            definition: Some("Pet".to_string()),
            definitions: Some(path),
        };
        let enforcer = args.enforcer(&EnforcerConfig::default(), Params::new()).unwrap();
        assert_eq!(
            args.raw_schema(&enforcer).unwrap(),
            json!({"$ref": "#/definitions/Pet"})
        );

        let missing = SchemaArgs {
            definition: Some("Cat".to_string()),
            ..args
        };
        assert!(missing.raw_schema(&enforcer).is_err());
    }
}
