//! # Default & Template Population
//!
//! Fills absent values from `x-variable` parameters, `x-template` strings,
//! and `default` literals. Population only fills gaps: a provided scalar
//! is never replaced, and containers are only extended.
//!
//! ## Order of Derivation
//!
//! For an absent value:
//!
//! 1. `x-variable` names a supplied parameter: the parameter value
//!    (leniently formatted when `autoFormat` is on).
//! 2. `x-template`: placeholder substitution against the parameters. Only
//!    a template that actually changed counts; the result is converted
//!    to the schema's kind through the Format Library.
//! 3. `default`: a copy of the literal. With `defaultsUseParams`, string
//!    defaults go through substitution and object defaults are themselves
//!    populated.
//!
//! Arrays map population over their items. Objects populate every declared
//! property and every undeclared key against `additionalProperties`.
//! Composite schemas (`allOf`, discriminators) fill each resolved leaf's
//! properties into an empty object, merge the results later-wins, and
//! overlay the caller's own value. Leaves are not gated individually; the
//! required gate below runs once over the merged result, with the names
//! the composite itself requires plus those of every leaf.
//!
//! ## Required Gate
//!
//! If a schema declares `required` names and any is still absent after
//! filling, the fill is discarded and the input is returned untouched with
//! `applied == false`, so defaults never mask a missing required property.

use std::sync::Arc;

use enforcer_core::{coerce_for, same, EnforcerConfig, Kind, Map, Params, Value};

use crate::definitions::Definitions;
use crate::resolve::resolve_partial;
use crate::schema::Schema;
use crate::template::inject;

/// Outcome of population.
#[derive(Debug, Clone, PartialEq)]
pub struct Population {
    /// Whether anything was filled in.
    pub applied: bool,
    /// The populated value; `None` when nothing was provided or derived.
    pub value: Option<Value>,
}

impl Population {
    fn unchanged(value: Option<Value>) -> Self {
        Self {
            applied: false,
            value,
        }
    }

    fn filled(value: Value) -> Self {
        Self {
            applied: true,
            value: Some(value),
        }
    }
}

/// Populate `value` (or derive one when absent) from `schema`.
pub fn populate(
    schema: &Arc<Schema>,
    definitions: &Definitions,
    params: &Params,
    value: Option<Value>,
    config: &EnforcerConfig,
) -> Population {
    if !config.use_defaults && !config.use_templates {
        return Population::unchanged(value);
    }
    let mut filler = Filler {
        definitions,
        params,
        config,
        descending: Vec::new(),
    };
    let population = filler.fill(schema, value);
    tracing::trace!(applied = population.applied, "population finished");
    population
}

struct Filler<'a> {
    definitions: &'a Definitions,
    params: &'a Params,
    config: &'a EnforcerConfig,
    /// Schemas on the current descent; stops self-referencing schemas from
    /// expanding absent values forever.
    descending: Vec<*const Schema>,
}

impl Filler<'_> {
    fn fill(&mut self, schema: &Arc<Schema>, value: Option<Value>) -> Population {
        let definitions = self.definitions;
        let Some(schema) = definitions.follow(schema) else {
            return Population::unchanged(value);
        };
        if value.as_ref().is_some_and(|v| !v.is_container()) {
            return Population::unchanged(value);
        }
        let key = Arc::as_ptr(schema);
        if value.is_none() && self.descending.contains(&key) {
            return Population::unchanged(None);
        }

        self.descending.push(key);
        let population = if schema.is_composite() {
            self.composite(schema, value)
        } else {
            self.plain(schema, value)
        };
        self.descending.pop();
        population
    }

    fn plain(&mut self, schema: &Arc<Schema>, value: Option<Value>) -> Population {
        if value.is_none() {
            if let Some(derived) = self.derive(schema) {
                return Population::filled(derived);
            }
        }
        match schema.kind {
            Kind::Array => self.array(schema, value),
            Kind::Object => self.object(schema, value),
            _ => Population::unchanged(value),
        }
    }

    fn derive(&mut self, schema: &Arc<Schema>) -> Option<Value> {
        let config = self.config;
        if config.use_templates {
            if let Some(found) = schema.variable.as_ref().and_then(|name| self.params.get(name)) {
                return Some(if config.auto_format {
                    coerce_for(schema.kind, schema.format, found).unwrap_or_else(|_| found.clone())
                } else {
                    found.clone()
                });
            }
            if let Some(template) = &schema.template {
                let injected = inject(template, self.params, &config.replacement);
                if injected != *template {
                    return Some(convert(schema, injected));
                }
            }
        }
        if config.use_defaults {
            if let Some(default) = &schema.default {
                if !config.defaults_use_params {
                    return Some(default.clone());
                }
                return Some(match default {
                    Value::String(text) => {
                        let injected = inject(text, self.params, &config.replacement);
                        if injected != *text {
                            convert(schema, injected)
                        } else {
                            default.clone()
                        }
                    }
                    Value::Object(_) => self
                        .plain(schema, Some(default.clone()))
                        .value
                        .unwrap_or_else(|| default.clone()),
                    other => other.clone(),
                });
            }
        }
        None
    }

    fn array(&mut self, schema: &Schema, value: Option<Value>) -> Population {
        let (items, item_schema) = match (value, &schema.items) {
            (Some(Value::Array(items)), Some(item_schema)) => (items, item_schema),
            (value, _) => return Population::unchanged(value),
        };
        let mut changed = false;
        let filled: Vec<Value> = items
            .iter()
            .map(|item| {
                let population = self.fill(item_schema, Some(item.clone()));
                changed |= population.applied;
                population.value.unwrap_or_else(|| item.clone())
            })
            .collect();
        if changed {
            Population::filled(Value::Array(filled))
        } else {
            Population::unchanged(Some(Value::Array(items)))
        }
    }

    fn object(&mut self, schema: &Schema, value: Option<Value>) -> Population {
        let mut result = match &value {
            None => Map::new(),
            Some(Value::Object(map)) => map.clone(),
            Some(_) => return Population::unchanged(value),
        };
        let mut changed = self.fill_properties(schema, &mut result);

        if changed && missing_required(&schema.required, &result) {
            tracing::trace!("population discarded: required property still absent");
            changed = false;
        }
        if changed {
            Population::filled(Value::Object(result))
        } else {
            Population::unchanged(value)
        }
    }

    /// Fill declared and additional properties of `result` in place,
    /// without the required gate.
    fn fill_properties(&mut self, schema: &Schema, result: &mut Map) -> bool {
        let mut changed = false;
        for (name, sub) in &schema.properties {
            let population = self.fill(sub, result.get(name).cloned());
            if let (true, Some(filled)) = (population.applied, population.value) {
                result.insert(name.clone(), filled);
                changed = true;
            }
        }

        if let Some(additional) = schema.additional_schema() {
            let undeclared: Vec<String> = result
                .keys()
                .filter(|key| !schema.properties.contains_key(*key))
                .cloned()
                .collect();
            for key in undeclared {
                let population = self.fill(additional, result.get(&key).cloned());
                if let (true, Some(filled)) = (population.applied, population.value) {
                    result.insert(key, filled);
                    changed = true;
                }
            }
        }
        changed
    }

    fn composite(&mut self, schema: &Arc<Schema>, value: Option<Value>) -> Population {
        let own = match &value {
            None => Map::new(),
            Some(Value::Object(map)) => map.clone(),
            Some(_) => return Population::unchanged(value),
        };
        let resolution = resolve_partial(schema, self.definitions, &Value::Object(own.clone()));

        let mut merged = Map::new();
        let mut applied = false;
        // leaves are filled ungated; the gate applies once to the merged result
        for leaf in resolution.schemas.iter().filter(|leaf| leaf.kind == Kind::Object) {
            let mut filled = Map::new();
            if self.fill_properties(leaf, &mut filled) {
                merged.extend(filled);
                applied = true;
            }
        }
        merged.extend(own);

        let required: Vec<String> = schema
            .required
            .iter()
            .chain(resolution.schemas.iter().flat_map(|leaf| leaf.required.iter()))
            .cloned()
            .collect();
        if applied && missing_required(&required, &merged) {
            tracing::trace!("composite population discarded: required property still absent");
            applied = false;
        }

        let merged = Value::Object(merged);
        let differs = value.as_ref().map_or(true, |v| !same(v, &merged));
        if applied && differs {
            Population::filled(merged)
        } else {
            Population::unchanged(value)
        }
    }
}

fn missing_required(required: &[String], result: &Map) -> bool {
    required.iter().any(|name| !result.contains_key(name))
}

/// Convert substituted text to the schema's kind; text that cannot be
/// converted is kept so validation reports it.
fn convert(schema: &Schema, text: String) -> Value {
    let value = Value::String(text);
    match (schema.kind, schema.format) {
        (Kind::String, None) | (Kind::Array | Kind::Object | Kind::Untyped, _) => value,
        (kind, format) => coerce_for(kind, format, &value).unwrap_or_else(|e| {
            tracing::debug!(error = %e, "substituted value kept as text");
            value
        }),
    }
}
