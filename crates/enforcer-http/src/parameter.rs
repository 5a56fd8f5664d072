//! # Parameter Definitions
//!
//! A request parameter as declared by a Swagger 2 operation: where it is
//! read from, whether it must be present, how array values are delimited,
//! and the schema its parsed value must satisfy.

use std::fmt;
use std::sync::Arc;

use enforcer_core::{Constraints, SchemaError};
use enforcer_schema::{prepare, Schema};
use serde::{Deserialize, Serialize};
use serde_json::Value as Json;

/// Request component a parameter is read from.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Location {
    Path,
    Query,
    Header,
    Body,
}

impl Location {
    pub fn as_str(&self) -> &'static str {
        match self {
            Location::Path => "path",
            Location::Query => "query",
            Location::Header => "header",
            Location::Body => "body",
        }
    }
}

impl fmt::Display for Location {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// How an array-typed parameter is written in a single string.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum CollectionFormat {
    /// Comma separated.
    #[default]
    Csv,
    /// Space separated.
    Ssv,
    /// Tab separated.
    Tsv,
    /// Pipe separated.
    Pipes,
    /// One query value per item (`?id=1&id=2`).
    Multi,
}

impl CollectionFormat {
    /// Item delimiter; `Multi` has none.
    pub fn delimiter(&self) -> Option<char> {
        match self {
            CollectionFormat::Csv => Some(','),
            CollectionFormat::Ssv => Some(' '),
            CollectionFormat::Tsv => Some('\t'),
            CollectionFormat::Pipes => Some('|'),
            CollectionFormat::Multi => None,
        }
    }
}

/// A declared request parameter.
#[derive(Debug, Clone)]
pub struct Parameter {
    pub name: String,
    pub location: Location,
    pub required: bool,
    pub schema: Arc<Schema>,
    pub collection_format: CollectionFormat,
}

/// Operation-level keys of a Swagger 2 parameter object that are not
/// schema keywords.
const PARAMETER_KEYS: &[&str] = &[
    "name",
    "in",
    "required",
    "collectionFormat",
    "description",
    "allowEmptyValue",
    "schema",
];

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct RawParameter {
    name: String,
    #[serde(rename = "in")]
    location: Location,
    #[serde(default)]
    required: bool,
    #[serde(default)]
    collection_format: CollectionFormat,
}

impl Parameter {
    /// A parameter; path parameters are always required.
    pub fn new(name: impl Into<String>, location: Location, schema: Arc<Schema>) -> Self {
        Self {
            name: name.into(),
            location,
            required: location == Location::Path,
            schema,
            collection_format: CollectionFormat::default(),
        }
    }

    pub fn required(mut self, required: bool) -> Self {
        self.required = required || self.location == Location::Path;
        self
    }

    pub fn with_collection_format(mut self, format: CollectionFormat) -> Self {
        self.collection_format = format;
        self
    }

    /// Prepare a Swagger 2 parameter object. Body parameters carry their
    /// schema under `schema`; all others are schemas themselves.
    pub fn prepare(raw: &Json, constraints: &Constraints) -> Result<Self, SchemaError> {
        let declared: RawParameter =
            serde_json::from_value(raw.clone()).map_err(|e| SchemaError::InvalidKeyword {
                path: "#".to_string(),
                keyword: "parameter".to_string(),
                reason: e.to_string(),
            })?;

        let schema = match declared.location {
            Location::Body => {
                let body = raw.get("schema").ok_or_else(|| SchemaError::InvalidKeyword {
                    path: "#".to_string(),
                    keyword: "schema".to_string(),
                    reason: "is required for body parameters".to_string(),
                })?;
                prepare(body, constraints)?
            }
            _ => {
                let mut stripped = raw.clone();
                if let Some(map) = stripped.as_object_mut() {
                    map.retain(|key, _| !PARAMETER_KEYS.contains(&key.as_str()));
                }
                prepare(&stripped, constraints)?
            }
        };

        Ok(Parameter::new(declared.name, declared.location, schema)
            .required(declared.required)
            .with_collection_format(declared.collection_format))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use enforcer_core::Kind;
    use serde_json::json;

    #[test]
    fn test_prepare_query_parameter() {
        let p = Parameter::prepare(
            &json!({
                "name": "ids",
                "in": "query",
                "type": "array",
                "collectionFormat": "pipes",
                "items": {"type": "integer"}
            }),
            &Constraints::all(),
        )
        .unwrap();
        assert_eq!(p.location, Location::Query);
        assert!(!p.required);
        assert_eq!(p.collection_format, CollectionFormat::Pipes);
        assert_eq!(p.schema.kind, Kind::Array);
    }

    #[test]
    fn test_path_parameter_always_required() {
        let p = Parameter::prepare(
            &json!({"name": "id", "in": "path", "type": "string"}),
            &Constraints::all(),
        )
        .unwrap();
        assert!(p.required);
    }

    #[test]
    fn test_body_parameter_uses_schema() {
        let p = Parameter::prepare(
            &json!({"name": "pet", "in": "body", "required": true, "schema": {"type": "object"}}),
            &Constraints::all(),
        )
        .unwrap();
        assert_eq!(p.schema.kind, Kind::Object);

        let err = Parameter::prepare(&json!({"name": "pet", "in": "body"}), &Constraints::all())
            .unwrap_err();
        assert!(matches!(err, SchemaError::InvalidKeyword { ref keyword, .. } if keyword == "schema"));
    }

    #[test]
    fn test_unknown_location_rejected() {
        let err = Parameter::prepare(
            &json!({"name": "x", "in": "cookie", "type": "string"}),
            &Constraints::all(),
        )
        .unwrap_err();
        assert!(matches!(err, SchemaError::InvalidKeyword { .. }));
    }
}
