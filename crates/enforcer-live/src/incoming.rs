//! Preparation of values entering an enforced value: population of
//! containers, then lenient formatting when `autoFormat` is on.

use std::sync::Arc;

use enforcer_core::{coerce_for, EnforcerConfig, FormatError, Kind, Params, Value};
use enforcer_schema::{populate, Definitions, Schema};

use crate::position::{child_schema, Key};

/// Everything incoming values are prepared against.
pub(crate) struct Context<'a> {
    pub definitions: &'a Definitions,
    pub config: &'a EnforcerConfig,
    pub params: &'a Params,
}

impl Context<'_> {
    /// Populate a container value, then apply auto-format.
    pub fn admit(&self, schema: &Arc<Schema>, value: Value) -> Result<Value, FormatError> {
        let value = if value.is_container() {
            populate(schema, self.definitions, self.params, Some(value), self.config)
                .value
                .unwrap_or_default()
        } else {
            value
        };
        self.auto_format(schema, value)
    }

    pub fn auto_format(&self, schema: &Arc<Schema>, value: Value) -> Result<Value, FormatError> {
        if !self.config.auto_format {
            return Ok(value);
        }
        format_value(self.definitions, schema, value)
    }
}

fn format_value(definitions: &Definitions, schema: &Arc<Schema>, value: Value) -> Result<Value, FormatError> {
    let Some(schema) = definitions.follow(schema) else {
        return Ok(value);
    };
    match value {
        Value::Array(items) => match &schema.items {
            Some(item_schema) => items
                .into_iter()
                .map(|item| format_value(definitions, item_schema, item))
                .collect::<Result<Vec<_>, _>>()
                .map(Value::Array),
            None => Ok(Value::Array(items)),
        },
        Value::Object(map) => {
            let container = Value::Object(map.clone());
            let mut formatted = map;
            for (key, item) in formatted.iter_mut() {
                let sub = child_schema(schema, definitions, &container, &Key::Name(key.clone()));
                *item = format_value(definitions, &sub, std::mem::take(item))?;
            }
            Ok(Value::Object(formatted))
        }
        scalar => match schema.kind {
            Kind::Boolean | Kind::Integer | Kind::Number => coerce_for(schema.kind, schema.format, &scalar),
            Kind::String if schema.format.is_some() => coerce_for(schema.kind, schema.format, &scalar),
            _ => Ok(scalar),
        },
    }
}
