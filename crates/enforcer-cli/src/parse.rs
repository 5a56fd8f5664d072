//! # Parse Subcommand
//!
//! Parses raw request parameters against Swagger 2 parameter
//! declarations and prints the typed result.
//!
//! The request file carries already-decoded components:
//!
//! ```yaml
//! path: {ownerId: "7"}
//! query: {species: [dog, cat], limit: "10"}
//! headers: {X-Api-Key: secret}
//! body: {name: Rex}
//! ```

use std::collections::BTreeMap;
use std::path::PathBuf;

use anyhow::{Context, Result};
use clap::Args;
use enforcer_core::{EnforcerConfig, Value};
use enforcer_http::{parse_parameters, Parameter, ParameterErrors, ParsedRequest, RequestParts};
use enforcer_schema::Definitions;
use serde::Deserialize;
use serde_json::{json, Value as Json};

use crate::document::{load_document, print_json};
use crate::EXIT_INVALID;

/// Arguments for the parse subcommand.
#[derive(Args, Debug)]
pub struct ParseArgs {
    /// Parameter declarations: a list of parameter objects, or an
    /// operation object carrying `parameters`.
    #[arg(long)]
    pub parameters: PathBuf,

    /// Decoded request components (JSON or YAML).
    #[arg(long)]
    pub request: PathBuf,

    /// Document holding named definitions referenced by the parameters.
    #[arg(long)]
    pub definitions: Option<PathBuf>,
}

#[derive(Deserialize, Default)]
#[serde(default)]
struct RawRequest {
    path: BTreeMap<String, String>,
    query: BTreeMap<String, QueryValue>,
    headers: BTreeMap<String, String>,
    body: Option<Value>,
}

#[derive(Deserialize)]
#[serde(untagged)]
enum QueryValue {
    One(String),
    Many(Vec<String>),
}

impl From<RawRequest> for RequestParts {
    fn from(raw: RawRequest) -> Self {
        let mut parts = RequestParts::new();
        for (name, value) in raw.path {
            parts = parts.with_path(name, value);
        }
        for (name, value) in raw.query {
            let values = match value {
                QueryValue::One(value) => vec![value],
                QueryValue::Many(values) => values,
            };
            for value in values {
                parts = parts.with_query(name.clone(), value);
            }
        }
        for (name, value) in raw.headers {
            parts = parts.with_header(&name, value);
        }
        if let Some(body) = raw.body {
            parts = parts.with_body(body);
        }
        parts
    }
}

/// Execute the parse subcommand.
pub fn run_parse(args: &ParseArgs, config: &EnforcerConfig) -> Result<u8> {
    match parse(args, config)? {
        Ok(parsed) => {
            print_json(&render(&parsed))?;
            Ok(0)
        }
        Err(rejected) => {
            tracing::info!(failures = rejected.errors.len(), "request rejected");
            for error in &rejected.errors {
                println!("{error}");
            }
            Ok(EXIT_INVALID)
        }
    }
}

/// Load both documents and parse. The outer error is operational.
pub fn parse(args: &ParseArgs, config: &EnforcerConfig) -> Result<Result<ParsedRequest, ParameterErrors>> {
    let constraints = config.validation_constraints();
    let definitions = match &args.definitions {
        Some(path) => {
            let document: Json = load_document(path)?;
            let table = document.get("definitions").unwrap_or(&document);
            Definitions::prepare(table, &constraints)
                .with_context(|| format!("invalid definitions in {}", path.display()))?
        }
        None => Definitions::new(),
    };

    let document: Json = load_document(&args.parameters)?;
    let declared = document.get("parameters").unwrap_or(&document);
    let declared = declared
        .as_array()
        .with_context(|| format!("no parameter list in {}", args.parameters.display()))?;
    let parameters = declared
        .iter()
        .enumerate()
        .map(|(i, raw)| {
            Parameter::prepare(raw, &constraints).with_context(|| format!("invalid parameter #{i}"))
        })
        .collect::<Result<Vec<_>>>()?;

    let request: RawRequest = load_document(&args.request)?;
    Ok(parse_parameters(&parameters, &RequestParts::from(request), &definitions))
}

fn render(parsed: &ParsedRequest) -> Json {
    let section = |map: &enforcer_core::Map| Value::Object(map.clone()).to_json();
    json!({
        "path": section(&parsed.path),
        "query": section(&parsed.query),
        "headers": section(&parsed.headers),
        "body": parsed.body.as_ref().map_or(Json::Null, Value::to_json),
    })
}
