//! Integration test: live handles over discriminator-based schemas.
//!
//! The schema governing a handle is recomputed from the current root, so
//! switching a discriminator value changes which properties are accepted.

use enforcer_core::{Constraints, EnforcerConfig, ErrorCode, Value};
use enforcer_live::{Enforce, Entry};
use enforcer_schema::Enforcer;
use serde_json::json;

fn zoo() -> Enforcer {
    let config = EnforcerConfig::default().with_constraints(Constraints::all());
    Enforcer::new(config)
        .with_raw_definitions(&json!({
            "Animal": {
                "type": "object",
                "discriminator": "kind",
                "required": ["kind"],
                "properties": {"kind": {"type": "string"}, "name": {"type": "string"}}
            },
            "Bird": {
                "allOf": [
                    {"$ref": "#/definitions/Animal"},
                    {"properties": {"wingspan": {"type": "number", "minimum": 0}}}
                ]
            },
            "Snake": {
                "allOf": [
                    {"$ref": "#/definitions/Animal"},
                    {"properties": {"venomous": {"type": "boolean"}}}
                ]
            }
        }))
        .expect("Failed to prepare definitions")
}

fn enclosure() -> serde_json::Value {
    json!({
        "type": "object",
        "properties": {
            "residents": {"type": "array", "items": {"$ref": "#/definitions/Animal"}}
        }
    })
}

#[test]
fn test_variant_properties_follow_discriminator() {
    let handle = zoo()
        .enforce(
            &enclosure(),
            Some(Value::from(json!({"residents": [{"kind": "Bird", "name": "Polly"}]}))),
        )
        .unwrap();
    let polly = handle.child("residents").unwrap().child(0).unwrap();

    polly.set("wingspan", Value::Number(0.4)).unwrap();
    let err = polly.set("venomous", Value::Bool(true)).unwrap_err();
    assert_eq!(err.code(), Some(ErrorCode::NotPermitted));

    let err = polly.set("wingspan", Value::Number(-1.0)).unwrap_err();
    assert_eq!(err.code(), Some(ErrorCode::NumberMin));
    assert_eq!(err.as_validation().unwrap().path, "/residents/0/wingspan");
}

#[test]
fn test_switching_variant_must_keep_value_valid() {
    let handle = zoo()
        .enforce(
            &enclosure(),
            Some(Value::from(json!({"residents": [{"kind": "Bird", "wingspan": 1}]}))),
        )
        .unwrap();
    let bird = handle.child("residents").unwrap().child(0).unwrap();

    // a Snake has no wingspan, so the switch is rejected as a whole
    let err = bird.set("kind", Value::from("Snake")).unwrap_err();
    assert_eq!(err.code(), Some(ErrorCode::NotPermitted));

    bird.replace(Value::from(json!({"kind": "Snake", "venomous": false}))).unwrap();
    assert!(matches!(bird.get("venomous").unwrap(), Some(Entry::Value(Value::Bool(false)))));
}

#[test]
fn test_unknown_variant_and_required_discriminator() {
    let handle = zoo()
        .enforce(&enclosure(), Some(Value::from(json!({"residents": []}))))
        .unwrap();
    let residents = handle.child("residents").unwrap();

    let err = residents.push([Value::from(json!({"kind": "Dragon"}))]).unwrap_err();
    assert_eq!(err.code(), Some(ErrorCode::Hierarchy));

    residents.push([Value::from(json!({"kind": "Snake"}))]).unwrap();
    let snake = residents.child(0).unwrap();
    let err = snake.remove("kind").unwrap_err();
    assert_eq!(err.code(), Some(ErrorCode::Required));
    assert_eq!(
        handle.value().unwrap(),
        Value::from(json!({"residents": [{"kind": "Snake"}]}))
    );
}
