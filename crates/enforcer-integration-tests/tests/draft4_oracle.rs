//! Integration test: agreement with an independent Draft 4 validator.
//!
//! Restricted to the keyword subset both share and to schemas that state
//! `type` and `additionalProperties` explicitly, since the enforcer infers
//! `type` from structural keywords and treats undeclared properties as
//! not permitted when `properties` is present.

use enforcer_core::Value;
use enforcer_schema::Enforcer;
use proptest::prelude::*;
use serde_json::{json, Value as Json};

fn shared_subset() -> Vec<Json> {
    vec![
        json!({"type": "integer", "minimum": 0, "maximum": 50, "exclusiveMaximum": true}),
        json!({"type": "number", "multipleOf": 3}),
        json!({"type": "string", "minLength": 2, "maxLength": 5, "pattern": "^[a-c]+$"}),
        json!({"type": "string", "enum": ["a", "bb", "ccc"]}),
        json!({"type": "boolean"}),
        json!({"type": "array", "minItems": 1, "maxItems": 3, "uniqueItems": true}),
        json!({"type": "array", "items": {"type": "integer", "minimum": 10}}),
        json!({
            "type": "object",
            "required": ["a"],
            "minProperties": 1,
            "maxProperties": 3,
            "additionalProperties": true,
            "properties": {"a": {"type": "string"}, "b": {"type": "array", "items": {"type": "boolean"}}}
        }),
        json!({
            "type": "object",
            "additionalProperties": false,
            "properties": {"a": {"type": "integer"}, "c": {"type": "object", "additionalProperties": true}}
        }),
        json!({
            "type": "object",
            "additionalProperties": {"type": "string", "maxLength": 1}
        }),
        json!({
            "allOf": [
                {"type": "object", "required": ["a"], "additionalProperties": true},
                {"type": "object", "required": ["b"], "additionalProperties": true}
            ]
        }),
        json!({}),
    ]
}

fn json_value() -> impl Strategy<Value = Json> {
    let leaf = prop_oneof![
        Just(Json::Null),
        any::<bool>().prop_map(Json::Bool),
        (-5i64..60).prop_map(|n| json!(n)),
        "[a-d]{0,6}".prop_map(Json::String),
    ];
    leaf.prop_recursive(3, 24, 4, |inner| {
        prop_oneof![
            prop::collection::vec(inner.clone(), 0..5).prop_map(Json::Array),
            prop::collection::btree_map("[a-d]", inner, 0..4)
                .prop_map(|m| Json::Object(m.into_iter().collect())),
        ]
    })
}

fn agrees(schema: &Json, instance: &Json) -> Result<(), TestCaseError> {
    let oracle = jsonschema::draft4::new(schema).expect("Failed to compile Draft 4 schema");
    let expected = oracle.is_valid(instance);
    let errors = Enforcer::default()
        .errors(schema, &Value::from(instance))
        .expect("Failed to prepare schema");
    prop_assert_eq!(
        errors.is_empty(),
        expected,
        "schema {} instance {} errors {:?}",
        schema,
        instance,
        errors
    );
    Ok(())
}

proptest! {
    #![proptest_config(ProptestConfig::with_cases(512))]

    #[test]
    fn enforcer_agrees_with_draft4(index in 0usize..12, instance in json_value()) {
        let schemas = shared_subset();
        agrees(&schemas[index], &instance)?;
    }
}

#[test]
fn fixed_cases_agree() {
    let cases = [
        (json!({"type": "number", "multipleOf": 5, "minimum": 10}), json!(8)),
        (json!({"type": "number", "multipleOf": 5, "minimum": 10}), json!(15)),
        (json!({"type": "array", "items": {"type": "string", "minLength": 1}}), json!(["Bob", "Jan", ""])),
        (json!({"type": "array", "uniqueItems": true}), json!([{"a": [1]}, {"a": [1]}])),
        (json!({"type": "array", "uniqueItems": true}), json!([{"a": [1]}, {"a": [2]}])),
    ];
    for (schema, instance) in &cases {
        agrees(schema, instance).unwrap();
    }
}
