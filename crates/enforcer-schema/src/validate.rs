//! # Structural Validator
//!
//! Recursive-descent checker for [`Value`]s against prepared schemas.
//!
//! ## Entry Points
//!
//! - [`collect`] returns every failure; it never fails itself.
//! - [`assert`] runs the same traversal and reports the failures as one
//!   error: the failure itself when there is exactly one, an `MLTI`
//!   aggregate otherwise. `collect` is empty exactly when `assert` is `Ok`.
//! - [`validate_at`] checks a sub-value, prefixing every path with the
//!   sub-value's position.
//!
//! Paths compose by appending `/<key>` or `/<index>` while descending.
//! Non-finite numbers are rejected with `TYPE` at every position; that
//! check cannot be switched off.

use std::sync::Arc;

use enforcer_core::equality::{contains, first_duplicate};
use enforcer_core::{ErrorCode, Kind, ValidationError, Value};

use crate::definitions::Definitions;
use crate::resolve::resolve_partial;
use crate::schema::{Bound, Schema};

/// Collect every validation failure of `value`.
pub fn collect(schema: &Arc<Schema>, definitions: &Definitions, value: &Value) -> Vec<ValidationError> {
    validate_at(schema, definitions, "", value)
}

/// Validate `value`, reporting a single error or an `MLTI` aggregate.
pub fn assert(schema: &Arc<Schema>, definitions: &Definitions, value: &Value) -> Result<(), ValidationError> {
    match ValidationError::aggregate(collect(schema, definitions, value)) {
        Some(error) => Err(error),
        None => Ok(()),
    }
}

/// Collect failures of a value located at `path` within a larger value.
pub fn validate_at(
    schema: &Arc<Schema>,
    definitions: &Definitions,
    path: &str,
    value: &Value,
) -> Vec<ValidationError> {
    let mut validator = Validator {
        definitions,
        errors: Vec::new(),
    };
    validator.check(schema, path, value);
    if !validator.errors.is_empty() {
        tracing::debug!(path, errors = validator.errors.len(), "value failed validation");
    }
    validator.errors
}

struct Validator<'a> {
    definitions: &'a Definitions,
    errors: Vec<ValidationError>,
}

impl Validator<'_> {
    fn error(&mut self, code: ErrorCode, path: &str, message: String) {
        self.errors.push(ValidationError::new(code, path, message));
    }

    fn type_error(&mut self, path: &str, expected: &str, value: &Value) {
        self.error(
            ErrorCode::Type,
            path,
            format!("Invalid type: Expected {expected}. Received: {value}"),
        );
    }

    fn check(&mut self, schema: &Arc<Schema>, path: &str, value: &Value) {
        if !scalar_serializable(value) {
            self.unserializable(path, value);
            return;
        }
        let definitions = self.definitions;
        let Some(schema) = definitions.follow(schema) else {
            let name = schema.reference.as_deref().unwrap_or_default();
            self.error(
                ErrorCode::Hierarchy,
                path,
                format!("Schema reference {name:?} does not name a known schema"),
            );
            return;
        };

        let type_ok = match schema.kind {
            Kind::Array => self.array(schema, path, value),
            Kind::Object => self.object(schema, path, value),
            Kind::Integer | Kind::Number => self.number(schema, path, value),
            Kind::String => self.string(schema, path, value),
            Kind::Boolean => {
                let ok = matches!(value, Value::Bool(_));
                if !ok {
                    self.type_error(path, "a boolean", value);
                }
                ok
            }
            Kind::Untyped => {
                if schema.is_composite() && matches!(value, Value::Object(_)) {
                    self.object(schema, path, value);
                } else {
                    self.serializable(path, value);
                }
                true
            }
        };

        if let (true, Some(options)) = (type_ok, &schema.enumeration) {
            let candidate = match schema.format {
                Some(format) if format.is_typed(value) => format
                    .encode(value)
                    .map(Value::String)
                    .unwrap_or_else(|_| value.clone()),
                _ => value.clone(),
            };
            if !contains(options, &candidate) {
                self.error(
                    ErrorCode::Enum,
                    path,
                    format!("Value {value} does not match any enum options."),
                );
            }
        }
    }

    fn unserializable(&mut self, path: &str, value: &Value) {
        self.error(
            ErrorCode::Type,
            path,
            format!("Invalid type. Value cannot be serialized to JSON: {value}"),
        );
    }

    /// Serializability of an unconstrained position, checked deeply.
    fn serializable(&mut self, path: &str, value: &Value) {
        match value {
            Value::Array(items) => {
                for (i, item) in items.iter().enumerate() {
                    self.serializable(&format!("{path}/{i}"), item);
                }
            }
            Value::Object(map) => {
                for (key, item) in map {
                    self.serializable(&format!("{path}/{key}"), item);
                }
            }
            scalar if !scalar_serializable(scalar) => self.unserializable(path, scalar),
            _ => {}
        }
    }

    fn array(&mut self, schema: &Schema, path: &str, value: &Value) -> bool {
        let Value::Array(items) = value else {
            self.type_error(path, "an array", value);
            return false;
        };
        let length = items.len();
        if let Some(max) = schema.max_items.filter(|max| length > *max) {
            self.error(
                ErrorCode::Length,
                path,
                format!("Array length {length} is greater than allowable maximum length {max}"),
            );
        }
        if let Some(min) = schema.min_items.filter(|min| length < *min) {
            self.error(
                ErrorCode::Length,
                path,
                format!("Array length {length} is less than allowable minimum length {min}"),
            );
        }
        if schema.unique_items {
            if let Some(index) = first_duplicate(items) {
                self.error(
                    ErrorCode::Unique,
                    path,
                    format!(
                        "Array requires that all items be unique. Value at index {index} is a duplicate: {}",
                        items[index]
                    ),
                );
            }
        }
        match &schema.items {
            Some(item_schema) => {
                for (i, item) in items.iter().enumerate() {
                    self.check(item_schema, &format!("{path}/{i}"), item);
                }
            }
            None => self.serializable(path, value),
        }
        true
    }

    fn object(&mut self, schema: &Arc<Schema>, path: &str, value: &Value) -> bool {
        let Value::Object(map) = value else {
            self.type_error(path, "a non-null object", value);
            return false;
        };

        let resolution = resolve_partial(schema, self.definitions, value);
        for missing in &resolution.unresolved {
            self.errors.push(missing.at(path));
        }
        let leaves = &resolution.schemas;

        for leaf in leaves {
            for name in &leaf.required {
                if !map.contains_key(name) {
                    self.error(
                        ErrorCode::Required,
                        &format!("{path}/{name}"),
                        format!("Missing required property: {name}"),
                    );
                }
            }
        }

        let count = map.len();
        for leaf in leaves {
            if let Some(max) = leaf.max_properties.filter(|max| count > *max) {
                self.error(
                    ErrorCode::Length,
                    path,
                    format!("The object has more properties than the allowed maximum: {max}"),
                );
            }
            if let Some(min) = leaf.min_properties.filter(|min| count < *min) {
                self.error(
                    ErrorCode::Length,
                    path,
                    format!("The object has fewer properties than the allowed minimum: {min}"),
                );
            }
        }

        for (key, item) in map {
            let child = format!("{path}/{key}");
            let declared: Vec<&Arc<Schema>> =
                leaves.iter().filter_map(|leaf| leaf.properties.get(key)).collect();
            if !declared.is_empty() {
                for sub in declared {
                    self.check(sub, &child, item);
                }
                continue;
            }
            let additional: Vec<&Arc<Schema>> =
                leaves.iter().filter_map(|leaf| leaf.additional_schema()).collect();
            if !additional.is_empty() {
                for sub in additional {
                    self.check(sub, &child, item);
                }
            } else if leaves.iter().any(|leaf| leaf.constrains_keys()) {
                self.error(
                    ErrorCode::NotPermitted,
                    &child,
                    format!("Property not allowed: {key}"),
                );
            } else {
                self.serializable(&child, item);
            }
        }
        true
    }

    fn number(&mut self, schema: &Schema, path: &str, value: &Value) -> bool {
        let integer = schema.kind == Kind::Integer;
        let number = match value {
            Value::Integer(i) => *i as f64,
            Value::Number(n) if !integer || n.fract() == 0.0 => *n,
            _ => {
                self.type_error(path, if integer { "an integer" } else { "a number" }, value);
                return false;
            }
        };

        if let Some(Bound { value: max, exclusive }) = schema.maximum {
            if exclusive && number >= max {
                self.error(
                    ErrorCode::NumberMax,
                    path,
                    format!("Value {value} over exclusive maximum {max}"),
                );
            } else if number > max {
                self.error(ErrorCode::NumberMax, path, format!("Value {value} over maximum {max}"));
            }
        }
        if let Some(Bound { value: min, exclusive }) = schema.minimum {
            if exclusive && number <= min {
                self.error(
                    ErrorCode::NumberMin,
                    path,
                    format!("Value {value} under exclusive minimum {min}"),
                );
            } else if number < min {
                self.error(ErrorCode::NumberMin, path, format!("Value {value} under minimum {min}"));
            }
        }
        if let Some(divisor) = schema.multiple_of {
            if !is_multiple(value, number, divisor) {
                self.error(
                    ErrorCode::NumberMultiple,
                    path,
                    format!("Value {value} not a multiple of {divisor}"),
                );
            }
        }
        true
    }

    fn string(&mut self, schema: &Schema, path: &str, value: &Value) -> bool {
        if let Some(format) = schema.format {
            if format.is_typed(value) {
                return true;
            }
            let Value::String(text) = value else {
                self.type_error(path, "a string", value);
                return false;
            };
            if let Err(e) = format.parse(text) {
                self.errors.push(e.at(path));
            }
            return true;
        }

        let Value::String(text) = value else {
            self.type_error(path, "a string", value);
            return false;
        };
        let length = text.chars().count();
        if let Some(max) = schema.max_length.filter(|max| length > *max) {
            self.error(
                ErrorCode::StringMax,
                path,
                format!("Value {text} has length ({length}) above max length {max}"),
            );
        }
        if let Some(min) = schema.min_length.filter(|min| length < *min) {
            self.error(
                ErrorCode::StringMin,
                path,
                format!("Value {text} has length ({length}) below min length {min}"),
            );
        }
        if let Some(pattern) = schema.pattern.as_ref().filter(|p| !p.is_match(text)) {
            self.error(
                ErrorCode::StringPattern,
                path,
                format!("Value {text} does not match pattern {}", pattern.as_str()),
            );
        }
        true
    }
}

fn scalar_serializable(value: &Value) -> bool {
    !matches!(value, Value::Number(n) if !n.is_finite())
}

/// Exact for integer operands; float quotients allow rounding noise.
fn is_multiple(value: &Value, number: f64, divisor: f64) -> bool {
    if divisor == 0.0 || !divisor.is_finite() {
        return true;
    }
    if let (Value::Integer(i), true) = (value, divisor.fract() == 0.0 && divisor.abs() < 9.0e15) {
        // i64::MIN % -1 overflows; every integer is a multiple of -1
        return i.checked_rem(divisor as i64).map_or(true, |r| r == 0);
    }
    let quotient = number / divisor;
    (quotient - quotient.round()).abs() <= 1e-9 * quotient.abs().max(1.0)
}
