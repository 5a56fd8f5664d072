//! # Schema Preparation
//!
//! Normalizes a raw JSON Schema (as found in Swagger 2 / OpenAPI 3
//! documents) into an immutable [`Schema`] tree shared through `Arc`.
//!
//! ## Invariants
//!
//! - A prepared schema's `kind` is fixed. When `type` is omitted it is
//!   inferred: `items` means array, `properties`/`additionalProperties`/
//!   `allOf` mean object, anything else is untyped.
//! - A constraint keyword whose switch is off in [`Constraints`] is absent
//!   from the prepared schema, never merely ignored downstream.
//! - Preparing an `Arc<Schema>` returns the same allocation, so
//!   `Arc::ptr_eq(&prepare(s, c)?, &s)` holds.
//!
//! ## References
//!
//! `$ref` values of the form `#/definitions/<name>`,
//! `#/components/schemas/<name>`, or a bare `<name>` become named links
//! into the [`Definitions`](crate::Definitions) table and are followed
//! lazily. Links are what make self-referencing graphs expressible
//! without reference cycles between `Arc`s.

use std::collections::BTreeMap;
use std::sync::Arc;

use enforcer_core::{Constraint, Constraints, Format, Kind, SchemaError, Value};
use regex::Regex;
use serde_json::Value as Json;

/// A numeric bound with its exclusivity flag.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Bound {
    pub value: f64,
    pub exclusive: bool,
}

/// A compiled `pattern`. Matching is unanchored unless the pattern anchors.
#[derive(Debug, Clone)]
pub struct Pattern {
    source: String,
    regex: Regex,
}

impl Pattern {
    pub fn as_str(&self) -> &str {
        &self.source
    }

    pub fn is_match(&self, text: &str) -> bool {
        self.regex.is_match(text)
    }
}

/// How keys not declared under `properties` are treated.
#[derive(Debug, Clone, Default)]
pub enum Additional {
    /// No `additionalProperties` keyword.
    #[default]
    Unspecified,
    /// `additionalProperties: false`.
    Forbidden,
    /// `additionalProperties: true` (an empty schema) or a sub-schema.
    Schema(Arc<Schema>),
}

/// Discriminator for polymorphic object schemas.
#[derive(Debug, Clone, PartialEq)]
pub struct Discriminator {
    /// Property of the value holding the variant name.
    pub property_name: String,
    /// Explicit variant name to definition name overrides.
    pub mapping: BTreeMap<String, String>,
}

/// A prepared, immutable schema.
#[derive(Debug, Clone)]
pub struct Schema {
    pub kind: Kind,
    /// Codec for string formats; unknown format names have none.
    pub format: Option<Format>,
    pub maximum: Option<Bound>,
    pub minimum: Option<Bound>,
    pub multiple_of: Option<f64>,
    pub max_length: Option<usize>,
    pub min_length: Option<usize>,
    pub pattern: Option<Pattern>,
    pub max_items: Option<usize>,
    pub min_items: Option<usize>,
    pub unique_items: bool,
    pub items: Option<Arc<Schema>>,
    pub max_properties: Option<usize>,
    pub min_properties: Option<usize>,
    pub properties: BTreeMap<String, Arc<Schema>>,
    pub additional: Additional,
    pub required: Vec<String>,
    pub enumeration: Option<Vec<Value>>,
    pub default: Option<Value>,
    /// `x-template`: placeholder text used to derive a missing value.
    pub template: Option<String>,
    /// `x-variable`: parameter whose value fills a missing value verbatim.
    pub variable: Option<String>,
    pub discriminator: Option<Discriminator>,
    pub all_of: Vec<Arc<Schema>>,
    /// Named link into the definitions table (`$ref`).
    pub reference: Option<String>,
}

impl Default for Schema {
    fn default() -> Self {
        Self::any()
    }
}

impl Schema {
    /// The empty schema: untyped, unconstrained.
    pub fn any() -> Self {
        Self {
            kind: Kind::Untyped,
            format: None,
            maximum: None,
            minimum: None,
            multiple_of: None,
            max_length: None,
            min_length: None,
            pattern: None,
            max_items: None,
            min_items: None,
            unique_items: false,
            items: None,
            max_properties: None,
            min_properties: None,
            properties: BTreeMap::new(),
            additional: Additional::Unspecified,
            required: Vec::new(),
            enumeration: None,
            default: None,
            template: None,
            variable: None,
            discriminator: None,
            all_of: Vec::new(),
            reference: None,
        }
    }

    /// A link to a named definition.
    pub fn link(name: impl Into<String>) -> Self {
        Self {
            reference: Some(name.into()),
            ..Self::any()
        }
    }

    /// Whether the effective constraints depend on `allOf` or a discriminator.
    pub fn is_composite(&self) -> bool {
        !self.all_of.is_empty() || self.discriminator.is_some()
    }

    /// Whether this schema restricts which keys an object may carry.
    pub fn constrains_keys(&self) -> bool {
        !self.properties.is_empty() || matches!(self.additional, Additional::Forbidden)
    }

    /// Sub-schema for an undeclared key, if one applies.
    pub fn additional_schema(&self) -> Option<&Arc<Schema>> {
        match &self.additional {
            Additional::Schema(schema) => Some(schema),
            _ => None,
        }
    }
}

/// Anything that can be turned into a prepared schema.
pub trait Prepare {
    fn prepare(self, constraints: &Constraints) -> Result<Arc<Schema>, SchemaError>;
}

impl Prepare for &Json {
    fn prepare(self, constraints: &Constraints) -> Result<Arc<Schema>, SchemaError> {
        let schema = build(self, constraints, "#")?;
        tracing::trace!(kind = %schema.kind, "schema prepared");
        Ok(Arc::new(schema))
    }
}

impl Prepare for Arc<Schema> {
    fn prepare(self, _constraints: &Constraints) -> Result<Arc<Schema>, SchemaError> {
        Ok(self)
    }
}

impl Prepare for &Arc<Schema> {
    fn prepare(self, _constraints: &Constraints) -> Result<Arc<Schema>, SchemaError> {
        Ok(Arc::clone(self))
    }
}

/// Prepare a raw or already-prepared schema.
pub fn prepare(raw: impl Prepare, constraints: &Constraints) -> Result<Arc<Schema>, SchemaError> {
    raw.prepare(constraints)
}

/// Strip a `$ref` down to the definition name it designates.
pub fn reference_name(reference: &str) -> Option<&str> {
    for prefix in ["#/definitions/", "#/components/schemas/"] {
        if let Some(name) = reference.strip_prefix(prefix) {
            return (!name.is_empty()).then_some(name);
        }
    }
    (!reference.is_empty() && !reference.starts_with('#')).then_some(reference)
}

// -- Keyword readers ---------------------------------------------------------

struct Reader<'a> {
    raw: &'a serde_json::Map<String, Json>,
    path: &'a str,
    constraints: &'a Constraints,
}

impl<'a> Reader<'a> {
    fn invalid(&self, keyword: &str, reason: &str) -> SchemaError {
        SchemaError::InvalidKeyword {
            path: self.path.to_string(),
            keyword: keyword.to_string(),
            reason: reason.to_string(),
        }
    }

    /// The keyword's raw value, or `None` when absent or switched off.
    fn gated(&self, keyword: &str, constraint: Constraint) -> Option<&'a Json> {
        if self.constraints.enabled(constraint) {
            self.raw.get(keyword)
        } else {
            None
        }
    }

    fn number(&self, keyword: &str, constraint: Constraint) -> Result<Option<f64>, SchemaError> {
        self.gated(keyword, constraint)
            .map(|v| v.as_f64().ok_or_else(|| self.invalid(keyword, "must be a number")))
            .transpose()
    }

    fn count(&self, keyword: &str, constraint: Constraint) -> Result<Option<usize>, SchemaError> {
        self.gated(keyword, constraint)
            .map(|v| {
                v.as_u64()
                    .map(|n| n as usize)
                    .ok_or_else(|| self.invalid(keyword, "must be a non-negative integer"))
            })
            .transpose()
    }

    fn text(&self, keyword: &str) -> Result<Option<String>, SchemaError> {
        self.raw
            .get(keyword)
            .map(|v| {
                v.as_str()
                    .map(str::to_string)
                    .ok_or_else(|| self.invalid(keyword, "must be a string"))
            })
            .transpose()
    }

    /// `maximum`/`minimum` combined with the boolean (Swagger 2) or numeric
    /// (OpenAPI 3.1) form of the matching `exclusive*` keyword.
    fn bound(
        &self,
        keyword: &str,
        exclusive_keyword: &str,
        constraint: Constraint,
        tighter: fn(f64, f64) -> bool,
    ) -> Result<Option<Bound>, SchemaError> {
        if !self.constraints.enabled(constraint) {
            return Ok(None);
        }
        let inclusive = self.number(keyword, constraint)?;
        match self.raw.get(exclusive_keyword) {
            None | Some(Json::Bool(false)) => Ok(inclusive.map(|value| Bound { value, exclusive: false })),
            Some(Json::Bool(true)) => Ok(inclusive.map(|value| Bound { value, exclusive: true })),
            Some(Json::Number(n)) => {
                let exclusive = n.as_f64().ok_or_else(|| self.invalid(exclusive_keyword, "must be a number"))?;
                Ok(Some(match inclusive {
                    Some(value) if !tighter(exclusive, value) => Bound { value, exclusive: false },
                    _ => Bound { value: exclusive, exclusive: true },
                }))
            }
            Some(_) => Err(self.invalid(exclusive_keyword, "must be a boolean or a number")),
        }
    }
}

fn child_path(path: &str, segment: &str) -> String {
    format!("{path}/{segment}")
}

fn build(raw: &Json, constraints: &Constraints, path: &str) -> Result<Schema, SchemaError> {
    let map = raw.as_object().ok_or_else(|| SchemaError::NotAnObject {
        path: path.to_string(),
    })?;
    let r = Reader {
        raw: map,
        path,
        constraints,
    };

    if let Some(reference) = map.get("$ref") {
        let text = reference
            .as_str()
            .ok_or_else(|| r.invalid("$ref", "must be a string"))?;
        let name = reference_name(text)
            .ok_or_else(|| r.invalid("$ref", "must name a local definition"))?;
        return Ok(Schema::link(name));
    }

    let kind = match map.get("type") {
        Some(Json::String(name)) => {
            Kind::from_name(name).ok_or_else(|| r.invalid("type", "names an unknown type"))?
        }
        Some(_) => return Err(r.invalid("type", "must be a string")),
        None if map.contains_key("items") => Kind::Array,
        None if ["properties", "additionalProperties", "allOf"]
            .iter()
            .any(|k| map.contains_key(*k)) =>
        {
            Kind::Object
        }
        None => Kind::Untyped,
    };

    let format = r.text("format")?.and_then(|name| Format::from_name(&name));

    let pattern = match r.gated("pattern", Constraint::Pattern) {
        Some(Json::String(source)) => {
            let regex = Regex::new(source).map_err(|e| SchemaError::InvalidPattern {
                path: path.to_string(),
                reason: e.to_string(),
            })?;
            Some(Pattern {
                source: source.clone(),
                regex,
            })
        }
        Some(_) => return Err(r.invalid("pattern", "must be a string")),
        None => None,
    };

    let unique_items = match r.gated("uniqueItems", Constraint::UniqueItems) {
        Some(v) => v
            .as_bool()
            .ok_or_else(|| r.invalid("uniqueItems", "must be a boolean"))?,
        None => false,
    };

    let items = map
        .get("items")
        .map(|sub| build(sub, constraints, &child_path(path, "items")).map(Arc::new))
        .transpose()?;

    let mut properties = BTreeMap::new();
    if let Some(raw_props) = map.get("properties") {
        let raw_props = raw_props
            .as_object()
            .ok_or_else(|| r.invalid("properties", "must be an object"))?;
        for (name, sub) in raw_props {
            let sub_path = child_path(path, &format!("properties/{name}"));
            properties.insert(name.clone(), Arc::new(build(sub, constraints, &sub_path)?));
        }
    }

    let additional = match r.gated("additionalProperties", Constraint::AdditionalProperties) {
        None => Additional::Unspecified,
        Some(Json::Bool(false)) => Additional::Forbidden,
        Some(Json::Bool(true)) => Additional::Schema(Arc::new(Schema::any())),
        Some(sub) => Additional::Schema(Arc::new(build(
            sub,
            constraints,
            &child_path(path, "additionalProperties"),
        )?)),
    };

    // Only the schema-level array form is authoritative; a per-property
    // `required: true` is ignored.
    let required = match r.gated("required", Constraint::Required) {
        Some(Json::Array(names)) => names
            .iter()
            .map(|n| {
                n.as_str()
                    .map(str::to_string)
                    .ok_or_else(|| r.invalid("required", "must list property names"))
            })
            .collect::<Result<Vec<_>, _>>()?,
        _ => Vec::new(),
    };

    let enumeration = match r.gated("enum", Constraint::Enum) {
        Some(Json::Array(options)) => Some(options.iter().map(Value::from).collect()),
        Some(_) => return Err(r.invalid("enum", "must be an array")),
        None => None,
    };

    let discriminator = match map.get("discriminator") {
        None => None,
        Some(Json::String(property_name)) => Some(Discriminator {
            property_name: property_name.clone(),
            mapping: BTreeMap::new(),
        }),
        Some(Json::Object(declared)) => {
            let property_name = declared
                .get("propertyName")
                .and_then(Json::as_str)
                .ok_or_else(|| r.invalid("discriminator", "must carry a propertyName"))?
                .to_string();
            let mut mapping = BTreeMap::new();
            if let Some(raw_mapping) = declared.get("mapping").and_then(Json::as_object) {
                for (key, target) in raw_mapping {
                    let name = target
                        .as_str()
                        .and_then(reference_name)
                        .ok_or_else(|| r.invalid("discriminator", "mapping must name definitions"))?;
                    mapping.insert(key.clone(), name.to_string());
                }
            }
            Some(Discriminator {
                property_name,
                mapping,
            })
        }
        Some(_) => return Err(r.invalid("discriminator", "must be a string or an object")),
    };

    let all_of = match map.get("allOf") {
        None => Vec::new(),
        Some(Json::Array(members)) => members
            .iter()
            .enumerate()
            .map(|(i, sub)| {
                build(sub, constraints, &child_path(path, &format!("allOf/{i}"))).map(Arc::new)
            })
            .collect::<Result<Vec<_>, _>>()?,
        Some(_) => return Err(r.invalid("allOf", "must be an array")),
    };

    Ok(Schema {
        kind,
        format,
        maximum: r.bound("maximum", "exclusiveMaximum", Constraint::Maximum, |e, i| e <= i)?,
        minimum: r.bound("minimum", "exclusiveMinimum", Constraint::Minimum, |e, i| e >= i)?,
        multiple_of: r.number("multipleOf", Constraint::MultipleOf)?,
        max_length: r.count("maxLength", Constraint::MaxLength)?,
        min_length: r.count("minLength", Constraint::MinLength)?,
        pattern,
        max_items: r.count("maxItems", Constraint::MaxItems)?,
        min_items: r.count("minItems", Constraint::MinItems)?,
        unique_items,
        items,
        max_properties: r.count("maxProperties", Constraint::MaxProperties)?,
        min_properties: r.count("minProperties", Constraint::MinProperties)?,
        properties,
        additional,
        required,
        enumeration,
        default: map.get("default").map(Value::from),
        template: r.text("x-template")?,
        variable: r.text("x-variable")?,
        discriminator,
        all_of,
        reference: None,
    })
}
