//! # Request Parameter Parsing
//!
//! Turns the already-decoded components of a request into typed values,
//! one declared [`Parameter`] at a time, and validates each against its
//! schema. Text is parsed strictly with the Format Library, so a
//! malformed date or base64 string fails with `FRMT`/`DATE` rather than
//! reaching the validator as an arbitrary string.
//!
//! Error paths are rooted at the component: `/query/limit`,
//! `/header/x-trace`, `/body/pets/0/name`.

use std::collections::BTreeMap;
use std::sync::Arc;

use enforcer_core::format::{parse_boolean, parse_integer, parse_number};
use enforcer_core::{ErrorCode, FormatError, Kind, Map, ValidationError, Value};
use enforcer_schema::{validate, Definitions, Schema};
use thiserror::Error;

use crate::parameter::{Location, Parameter};

/// Decoded request components. Header names match case-insensitively.
#[derive(Debug, Clone, Default)]
pub struct RequestParts {
    pub headers: BTreeMap<String, String>,
    pub query: BTreeMap<String, Vec<String>>,
    pub path: BTreeMap<String, String>,
    pub body: Option<Value>,
}

impl RequestParts {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_header(mut self, name: &str, value: impl Into<String>) -> Self {
        self.headers.insert(name.to_ascii_lowercase(), value.into());
        self
    }

    /// Append one query value; repeated names accumulate.
    pub fn with_query(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        self.query.entry(name.into()).or_default().push(value.into());
        self
    }

    pub fn with_path(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        self.path.insert(name.into(), value.into());
        self
    }

    pub fn with_body(mut self, body: Value) -> Self {
        self.body = Some(body);
        self
    }

    pub fn header(&self, name: &str) -> Option<&str> {
        self.headers
            .iter()
            .find(|(key, _)| key.eq_ignore_ascii_case(name))
            .map(|(_, value)| value.as_str())
    }

    /// Raw text for a non-body parameter; `None` when absent.
    fn texts(&self, parameter: &Parameter) -> Option<Vec<&str>> {
        let name = parameter.name.as_str();
        match parameter.location {
            Location::Path => self.path.get(name).map(|text| vec![text.as_str()]),
            Location::Query => self
                .query
                .get(name)
                .filter(|values| !values.is_empty())
                .map(|values| values.iter().map(String::as_str).collect()),
            Location::Header => self.header(name).map(|text| vec![text]),
            Location::Body => None,
        }
    }
}

/// Parsed, validated parameter values keyed by parameter name.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ParsedRequest {
    pub path: Map,
    pub query: Map,
    pub headers: Map,
    pub body: Option<Value>,
}

impl ParsedRequest {
    fn insert(&mut self, parameter: &Parameter, value: Value) {
        match parameter.location {
            Location::Path => {
                self.path.insert(parameter.name.clone(), value);
            }
            Location::Query => {
                self.query.insert(parameter.name.clone(), value);
            }
            Location::Header => {
                self.headers.insert(parameter.name.to_ascii_lowercase(), value);
            }
            Location::Body => self.body = Some(value),
        }
    }
}

/// Every parameter failure of a request.
#[derive(Error, Debug, Clone)]
#[error("request parameters failed validation ({} errors)", .errors.len())]
pub struct ParameterErrors {
    pub errors: Vec<ValidationError>,
}

impl ParameterErrors {
    /// The failures as one error: the single failure or an `MLTI` aggregate.
    pub fn into_validation(self) -> Option<ValidationError> {
        ValidationError::aggregate(self.errors)
    }
}

/// Parse and validate every declared parameter from `parts`.
pub fn parse_parameters(
    parameters: &[Parameter],
    parts: &RequestParts,
    definitions: &Definitions,
) -> Result<ParsedRequest, ParameterErrors> {
    let mut parsed = ParsedRequest::default();
    let mut errors = Vec::new();

    for parameter in parameters {
        let path = format!("/{}/{}", parameter.location, parameter.name);
        let value = match parameter.location {
            Location::Body => parts.body.clone().map(Ok),
            _ => parts
                .texts(parameter)
                .map(|texts| parse_texts(parameter, definitions, &texts, &path)),
        };

        let value = match value {
            Some(Ok(value)) => value,
            Some(Err(mut failures)) => {
                errors.append(&mut failures);
                continue;
            }
            None if parameter.required => {
                errors.push(ValidationError::new(
                    ErrorCode::Required,
                    &path,
                    format!("Missing required {} parameter: {}", parameter.location, parameter.name),
                ));
                continue;
            }
            None => match followed(&parameter.schema, definitions).default.clone() {
                Some(default) => default,
                None => continue,
            },
        };

        let failures = validate::validate_at(&parameter.schema, definitions, &path, &value);
        if failures.is_empty() {
            parsed.insert(parameter, value);
        } else {
            errors.extend(failures);
        }
    }

    if errors.is_empty() {
        Ok(parsed)
    } else {
        tracing::debug!(errors = errors.len(), "request parameters rejected");
        Err(ParameterErrors { errors })
    }
}

fn followed<'a>(schema: &'a Arc<Schema>, definitions: &'a Definitions) -> &'a Schema {
    definitions.follow(schema).map_or(schema.as_ref(), |s| s.as_ref())
}

fn parse_texts(
    parameter: &Parameter,
    definitions: &Definitions,
    texts: &[&str],
    path: &str,
) -> Result<Value, Vec<ValidationError>> {
    let schema = followed(&parameter.schema, definitions);
    let Some(first) = texts.first() else {
        return Ok(Value::Null);
    };
    if schema.kind != Kind::Array {
        return parse_text(schema, definitions, first).map_err(|e| vec![e.at(path)]);
    }

    let items: Vec<&str> = match parameter.collection_format.delimiter() {
        None => texts.to_vec(),
        Some(_) if first.is_empty() => Vec::new(),
        Some(delimiter) => first.split(delimiter).collect(),
    };
    parse_items(schema, definitions, &items, path)
}

fn parse_items(
    schema: &Schema,
    definitions: &Definitions,
    items: &[&str],
    path: &str,
) -> Result<Value, Vec<ValidationError>> {
    let mut values = Vec::with_capacity(items.len());
    let mut errors = Vec::new();
    for (i, text) in items.iter().enumerate() {
        let parsed = match &schema.items {
            Some(item_schema) => parse_text(followed(item_schema, definitions), definitions, text),
            None => Ok(Value::from(*text)),
        };
        match parsed {
            Ok(value) => values.push(value),
            Err(e) => errors.push(e.at(format!("{path}/{i}"))),
        }
    }
    if errors.is_empty() {
        Ok(Value::Array(values))
    } else {
        Err(errors)
    }
}

/// Strictly parse one string according to `schema`.
fn parse_text(schema: &Schema, definitions: &Definitions, text: &str) -> Result<Value, FormatError> {
    match schema.kind {
        Kind::Boolean => parse_boolean(text),
        Kind::Integer => parse_integer(text),
        Kind::Number => parse_number(text),
        Kind::String => match schema.format {
            Some(format) => format.parse(text),
            None => Ok(Value::from(text)),
        },
        Kind::Array => {
            let items: Vec<&str> = if text.is_empty() {
                Vec::new()
            } else {
                text.split(',').collect()
            };
            let mut values = Vec::with_capacity(items.len());
            for item in items {
                let value = match &schema.items {
                    Some(item_schema) => parse_text(followed(item_schema, definitions), definitions, item)?,
                    None => Value::from(item),
                };
                values.push(value);
            }
            Ok(Value::Array(values))
        }
        Kind::Object => serde_json::from_str::<serde_json::Value>(text)
            .ok()
            .filter(serde_json::Value::is_object)
            .map(Value::from)
            .ok_or_else(|| FormatError::syntax("a JSON object", text)),
        Kind::Untyped => Ok(Value::from(text)),
    }
}
