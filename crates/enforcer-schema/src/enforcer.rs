//! # Enforcer Facade
//!
//! Bundles a configuration, a definitions table, and population
//! parameters so callers can prepare, validate, and populate without
//! threading all three through every call.
//!
//! Every entry point accepts either a raw schema (`&serde_json::Value`) or
//! an already-prepared `Arc<Schema>` through [`Prepare`]. With
//! `validateAll` on, `validate`, `errors`, and `populate` prepare raw
//! schemas with every constraint enabled; [`Enforcer::prepare`] always
//! honors the configured switches.

use std::sync::Arc;

use enforcer_core::{Constraints, EnforcerConfig, EnforcerError, Params, SchemaError, ValidationError, Value};
use serde_json::Value as Json;

use crate::definitions::Definitions;
use crate::populate::{populate, Population};
use crate::schema::{Prepare, Schema};
use crate::validate;

#[derive(Debug, Clone, Default)]
pub struct Enforcer {
    config: EnforcerConfig,
    definitions: Arc<Definitions>,
    params: Params,
}

impl Enforcer {
    pub fn new(config: EnforcerConfig) -> Self {
        Self {
            config,
            definitions: Arc::new(Definitions::new()),
            params: Params::new(),
        }
    }

    pub fn with_definitions(mut self, definitions: Definitions) -> Self {
        self.definitions = Arc::new(definitions);
        self
    }

    /// Prepare and install a raw `definitions` object.
    pub fn with_raw_definitions(mut self, raw: &Json) -> Result<Self, SchemaError> {
        let definitions = Definitions::prepare(raw, &self.config.validation_constraints())?;
        self.definitions = Arc::new(definitions);
        Ok(self)
    }

    /// Parameters used for template and default substitution.
    pub fn with_params(mut self, params: Params) -> Self {
        self.params = params;
        self
    }

    pub fn config(&self) -> &EnforcerConfig {
        &self.config
    }

    pub fn definitions(&self) -> &Arc<Definitions> {
        &self.definitions
    }

    pub fn params(&self) -> &Params {
        &self.params
    }

    /// Prepare a schema with the configured constraint switches.
    pub fn prepare(&self, raw: impl Prepare) -> Result<Arc<Schema>, SchemaError> {
        raw.prepare(&self.config.constraints)
    }

    fn prepare_for_validation(&self, raw: impl Prepare) -> Result<Arc<Schema>, SchemaError> {
        let constraints: Constraints = self.config.validation_constraints();
        raw.prepare(&constraints)
    }

    /// Validate `value`, failing with the single error or an `MLTI` aggregate.
    pub fn validate(&self, schema: impl Prepare, value: &Value) -> Result<(), EnforcerError> {
        let schema = self.prepare_for_validation(schema)?;
        validate::assert(&schema, &self.definitions, value)?;
        Ok(())
    }

    /// Every validation failure of `value`; empty when it is valid.
    pub fn errors(&self, schema: impl Prepare, value: &Value) -> Result<Vec<ValidationError>, SchemaError> {
        let schema = self.prepare_for_validation(schema)?;
        Ok(validate::collect(&schema, &self.definitions, value))
    }

    /// Fill gaps in `value` (or derive one when absent) from defaults and templates.
    pub fn populate(&self, schema: impl Prepare, value: Option<Value>) -> Result<Population, SchemaError> {
        let schema = self.prepare_for_validation(schema)?;
        Ok(populate(&schema, &self.definitions, &self.params, value, &self.config))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use enforcer_core::ErrorCode;
    use serde_json::json;

    #[test]
    fn test_validate_single_and_aggregate() {
        let enforcer = Enforcer::default();
        let schema = json!({"type": "number", "multipleOf": 5, "minimum": 10});
        let err = enforcer.validate(&schema, &Value::Integer(8)).unwrap_err();
        assert_eq!(err.code(), Some(ErrorCode::Multiple));

        let err = enforcer.validate(&schema, &Value::Integer(5)).unwrap_err();
        assert_eq!(err.code(), Some(ErrorCode::NumberMin));

        assert!(enforcer.validate(&schema, &Value::Integer(15)).is_ok());
    }

    #[test]
    fn test_errors_matches_validate() {
        let enforcer = Enforcer::default();
        let schema = json!({"type": "array", "items": {"type": "string", "minLength": 1}});
        let value = Value::from(json!(["Bob", "Jan", ""]));
        let errors = enforcer.errors(&schema, &value).unwrap();
        assert_eq!(errors.len(), 1);
        assert_eq!(errors[0].code, ErrorCode::StringMin);
        assert_eq!(errors[0].path, "/2");
        assert!(enforcer.validate(&schema, &value).is_err());
    }

    #[test]
    fn test_validate_all_overrides_switches() {
        let schema = json!({"type": "array", "minItems": 1});
        let empty = Value::array();

        let strict = Enforcer::default();
        assert_eq!(strict.errors(&schema, &empty).unwrap().len(), 1);

        let lenient = Enforcer::new(EnforcerConfig {
            validate_all: false,
            ..EnforcerConfig::default()
        });
        assert!(lenient.errors(&schema, &empty).unwrap().is_empty());
    }

    #[test]
    fn test_prepare_honors_switches() {
        let enforcer = Enforcer::default();
        let schema = enforcer.prepare(&json!({"type": "array", "minItems": 1})).unwrap();
        assert_eq!(schema.min_items, None);
        let again = enforcer.prepare(&schema).unwrap();
        assert!(Arc::ptr_eq(&schema, &again));
    }

    #[test]
    fn test_populate_with_params() {
        let mut params = Params::new();
        params.insert("user".into(), Value::from("ada"));
        let enforcer = Enforcer::default().with_params(params);
        let out = enforcer
            .populate(
                &json!({"type": "object", "properties": {"home": {"type": "string", "x-template": "/home/{user}"}}}),
                None,
            )
            .unwrap();
        assert!(out.applied);
        assert_eq!(out.value, Some(Value::from(json!({"home": "/home/ada"}))));
    }

    #[test]
    fn test_raw_definitions_and_discriminator() {
        let enforcer = Enforcer::default()
            .with_raw_definitions(&json!({
                "Pet": {"type": "object", "discriminator": "kind", "properties": {"kind": {"type": "string"}}},
                "Fish": {"allOf": [{"$ref": "#/definitions/Pet"}, {"properties": {"fins": {"type": "integer"}}}]}
            }))
            .unwrap();
        let pet = Arc::clone(enforcer.definitions().get("Pet").unwrap());
        let ok = Value::from(json!({"kind": "Fish", "fins": 2}));
        assert!(enforcer.validate(&pet, &ok).is_ok());
        let bad = Value::from(json!({"kind": "Fish", "fins": "two"}));
        let errors = enforcer.errors(&pet, &bad).unwrap();
        assert_eq!(errors[0].code, ErrorCode::Type);
        assert_eq!(errors[0].path, "/fins");
    }
}
