//! Integration test: parameters of a Swagger 2 operation declared in YAML,
//! parsed from decoded request components.

use enforcer_core::{Constraints, ErrorCode, Value};
use enforcer_http::{parse_parameters, Parameter, RequestParts};
use enforcer_schema::Definitions;
use serde_json::json;

const OPERATION: &str = r##"
parameters:
  - name: ownerId
    in: path
    type: integer
    minimum: 1
  - name: species
    in: query
    type: array
    collectionFormat: csv
    uniqueItems: true
    items:
      type: string
      enum: [cat, dog, bird]
  - name: bornAfter
    in: query
    type: string
    format: date
  - name: X-Api-Key
    in: header
    required: true
    type: string
    format: byte
  - name: filter
    in: body
    schema:
      $ref: "#/definitions/Filter"
"##;

fn operation() -> (Vec<Parameter>, Definitions) {
    let document: serde_json::Value = serde_yaml::from_str(OPERATION).expect("operation YAML must parse");
    let parameters = document["parameters"]
        .as_array()
        .expect("parameters must be a list")
        .iter()
        .map(|raw| Parameter::prepare(raw, &Constraints::all()).expect("parameter must prepare"))
        .collect();
    let definitions = Definitions::prepare(
        &json!({"Filter": {"type": "object", "properties": {"limit": {"type": "integer", "maximum": 100}}}}),
        &Constraints::all(),
    )
    .expect("definitions must prepare");
    (parameters, definitions)
}

#[test]
fn test_valid_request() {
    let (parameters, definitions) = operation();
    let parts = RequestParts::new()
        .with_path("ownerId", "7")
        .with_query("species", "cat,dog")
        .with_query("bornAfter", "2020-01-31")
        .with_header("x-api-key", "c2VjcmV0")
        .with_body(Value::from(json!({"limit": 10})));

    let parsed = parse_parameters(&parameters, &parts, &definitions).unwrap();
    assert_eq!(parsed.path.get("ownerId"), Some(&Value::Integer(7)));
    assert_eq!(parsed.query.get("species"), Some(&Value::from(json!(["cat", "dog"]))));
    assert!(matches!(parsed.query.get("bornAfter"), Some(Value::Date(_))));
    assert_eq!(parsed.headers.get("x-api-key"), Some(&Value::Bytes(b"secret".to_vec())));
    assert_eq!(parsed.body, Some(Value::from(json!({"limit": 10}))));
}

#[test]
fn test_every_failure_reported() {
    let (parameters, definitions) = operation();
    let parts = RequestParts::new()
        .with_path("ownerId", "0")
        .with_query("species", "cat,cat,fish")
        .with_query("bornAfter", "31/01/2020")
        .with_body(Value::from(json!({"limit": 500})));

    let err = parse_parameters(&parameters, &parts, &definitions).unwrap_err();
    let mut found: Vec<(String, String)> = err
        .errors
        .iter()
        .map(|e| (e.code.as_str().to_string(), e.path.clone()))
        .collect();
    found.sort();
    assert_eq!(
        found,
        vec![
            ("ENUM".to_string(), "/query/species/2".to_string()),
            ("FRMT".to_string(), "/query/bornAfter".to_string()),
            ("NMAX".to_string(), "/body/filter/limit".to_string()),
            ("NMIN".to_string(), "/path/ownerId".to_string()),
            ("REQ".to_string(), "/header/X-Api-Key".to_string()),
            ("UNIQ".to_string(), "/query/species".to_string()),
        ]
    );
    assert_eq!(err.into_validation().map(|e| e.code), Some(ErrorCode::Multiple));
}
