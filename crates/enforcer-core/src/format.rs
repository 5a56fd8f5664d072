//! # Format Library
//!
//! Codecs for the OpenAPI `format` vocabulary plus the strict and lenient
//! conversions for the primitive kinds.
//!
//! Each [`Format`] offers three operations:
//!
//! - `coerce`: lenient conversion of any reasonable input into the
//!   canonical wire string. Failure reports `TYPE`.
//! - `parse`: strict decoding of wire text into a typed [`Value`]
//!   (`Bytes`, `Date`, `DateTime`). Syntax failure reports `FRMT`,
//!   calendar failure reports `DATE`.
//! - `encode`: render a typed value (or valid wire text) canonically.
//!
//! For every input `x` that `coerce` accepts,
//! `encode(parse(coerce(x))) == coerce(x)`.

use std::fmt;

use base64::alphabet;
use base64::engine::general_purpose::{GeneralPurpose, GeneralPurposeConfig, STANDARD};
use base64::engine::DecodePaddingMode;
use base64::Engine;
use serde::{Deserialize, Serialize};

use crate::error::FormatError;
use crate::temporal;
use crate::value::Value;

/// Decoder that accepts non-zero trailing bits, so `ab==` decodes.
const LENIENT_BASE64: GeneralPurpose = GeneralPurpose::new(
    &alphabet::STANDARD,
    GeneralPurposeConfig::new()
        .with_decode_allow_trailing_bits(true)
        .with_decode_padding_mode(DecodePaddingMode::RequireCanonical),
);

const BINARY_EXPECTED: &str = "a binary octet string";
const BYTE_EXPECTED: &str = "a base64 encoded string";

/// The schema `type` of a value position.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Kind {
    Array,
    Object,
    Boolean,
    Integer,
    Number,
    String,
    /// No `type` keyword: any value is permitted.
    Untyped,
}

impl Kind {
    /// Look up a kind by its JSON Schema `type` name.
    pub fn from_name(name: &str) -> Option<Self> {
        match name {
            "array" => Some(Kind::Array),
            "object" => Some(Kind::Object),
            "boolean" => Some(Kind::Boolean),
            "integer" => Some(Kind::Integer),
            "number" => Some(Kind::Number),
            "string" => Some(Kind::String),
            _ => None,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Kind::Array => "array",
            Kind::Object => "object",
            Kind::Boolean => "boolean",
            Kind::Integer => "integer",
            Kind::Number => "number",
            Kind::String => "string",
            Kind::Untyped => "any",
        }
    }
}

impl fmt::Display for Kind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A string format with a dedicated codec.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Format {
    /// Octets written as `0`/`1` digits, eight per byte.
    Binary,
    /// Standard base64.
    Byte,
    /// `YYYY-MM-DD`.
    Date,
    /// `YYYY-MM-DDThh:mm:ss[.sss]Z`.
    DateTime,
}

impl Format {
    /// Look up a format by its OpenAPI name. Unknown names have no codec.
    pub fn from_name(name: &str) -> Option<Self> {
        match name {
            "binary" => Some(Format::Binary),
            "byte" => Some(Format::Byte),
            "date" => Some(Format::Date),
            "date-time" => Some(Format::DateTime),
            _ => None,
        }
    }

    pub fn name(&self) -> &'static str {
        match self {
            Format::Binary => "binary",
            Format::Byte => "byte",
            Format::Date => "date",
            Format::DateTime => "date-time",
        }
    }

    /// Leniently convert `value` into canonical wire text.
    pub fn coerce(&self, value: &Value) -> Result<Value, FormatError> {
        let text = match self {
            Format::Binary => bits(&octets(value, BINARY_EXPECTED)?),
            Format::Byte => match value {
                Value::Bool(true) => "AQ==".to_string(),
                Value::Bool(false) => String::new(),
                other => STANDARD.encode(octets(other, BYTE_EXPECTED)?),
            },
            Format::Date => temporal::format_date(&temporal::coerce_date(value)?),
            Format::DateTime => temporal::format_date_time(&temporal::coerce_instant(value)?),
        };
        Ok(Value::String(text))
    }

    /// Strictly decode wire text into a typed value.
    pub fn parse(&self, text: &str) -> Result<Value, FormatError> {
        match self {
            Format::Binary => parse_binary(text).map(Value::Bytes),
            Format::Byte => parse_byte(text).map(Value::Bytes),
            Format::Date => temporal::parse_date(text).map(Value::Date),
            Format::DateTime => temporal::parse_date_time(text).map(Value::DateTime),
        }
    }

    /// Render a typed value, or already-valid wire text, canonically.
    pub fn encode(&self, value: &Value) -> Result<String, FormatError> {
        let decoded;
        let value = match value {
            Value::String(text) => {
                decoded = self.parse(text)?;
                &decoded
            }
            other => other,
        };
        match (self, value) {
            (Format::Binary, Value::Bytes(bytes)) => Ok(bits(bytes)),
            (Format::Byte, Value::Bytes(bytes)) => Ok(STANDARD.encode(bytes)),
            (Format::Date, Value::Date(date)) => Ok(temporal::format_date(date)),
            (Format::Date, Value::DateTime(instant)) => {
                Ok(temporal::format_date(&instant.date_naive()))
            }
            (Format::DateTime, Value::DateTime(instant)) => Ok(temporal::format_date_time(instant)),
            (Format::DateTime, Value::Date(date)) => {
                Ok(temporal::format_date_time(&temporal::midnight(date)))
            }
            (format, other) => Err(FormatError::conversion(format.expected(), other)),
        }
    }

    /// Whether `value` is an already-decoded value of this format.
    pub fn is_typed(&self, value: &Value) -> bool {
        matches!(
            (self, value),
            (Format::Binary | Format::Byte, Value::Bytes(_))
                | (Format::Date, Value::Date(_))
                | (Format::DateTime, Value::DateTime(_))
        )
    }

    fn expected(&self) -> &'static str {
        match self {
            Format::Binary => BINARY_EXPECTED,
            Format::Byte => BYTE_EXPECTED,
            Format::Date => "a date",
            Format::DateTime => "a date-time",
        }
    }
}

impl fmt::Display for Format {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// The octets a byte-oriented format encodes for `value`.
///
/// Numbers are taken as an unsigned 32-bit quantity and emitted with the
/// fewest whole octets that hold it; strings contribute their UTF-8 bytes.
fn octets(value: &Value, expected: &'static str) -> Result<Vec<u8>, FormatError> {
    match value {
        Value::Bytes(bytes) => Ok(bytes.clone()),
        Value::String(text) => Ok(text.as_bytes().to_vec()),
        Value::Bool(b) => Ok(vec![u8::from(*b)]),
        Value::Integer(i) => Ok(number_octets(*i as u32)),
        Value::Number(n) if n.is_finite() => Ok(number_octets(n.trunc() as i64 as u32)),
        other => Err(FormatError::conversion(expected, other)),
    }
}

fn number_octets(n: u32) -> Vec<u8> {
    let bytes = n.to_be_bytes();
    let skip = bytes.iter().take(3).take_while(|b| **b == 0).count();
    bytes[skip..].to_vec()
}

fn bits(bytes: &[u8]) -> String {
    bytes.iter().map(|b| format!("{b:08b}")).collect()
}

fn parse_binary(text: &str) -> Result<Vec<u8>, FormatError> {
    let bytes = text.as_bytes();
    if bytes.len() % 8 != 0 || !bytes.iter().all(|b| *b == b'0' || *b == b'1') {
        return Err(FormatError::syntax(BINARY_EXPECTED, format!("{text:?}")));
    }
    Ok(bytes
        .chunks(8)
        .map(|octet| octet.iter().fold(0u8, |acc, b| (acc << 1) | (b - b'0')))
        .collect())
}

fn parse_byte(text: &str) -> Result<Vec<u8>, FormatError> {
    let syntax = || FormatError::syntax(BYTE_EXPECTED, format!("{text:?}"));
    let body = text.trim_end_matches('=');
    let padding = text.len() - body.len();
    if text.len() % 4 != 0
        || padding > 2
        || !body
            .bytes()
            .all(|b| b.is_ascii_alphanumeric() || b == b'+' || b == b'/')
    {
        return Err(syntax());
    }
    LENIENT_BASE64.decode(text).map_err(|_| syntax())
}

/// Leniently interpret a value as a boolean.
///
/// Strings are true unless empty or `"false"`; numbers are true unless
/// zero or NaN; containers and typed scalars are true.
pub fn coerce_boolean(value: &Value) -> Value {
    Value::Bool(match value {
        Value::Null => false,
        Value::Bool(b) => *b,
        Value::Integer(i) => *i != 0,
        Value::Number(n) => *n != 0.0 && !n.is_nan(),
        Value::String(s) => !(s.is_empty() || s == "false"),
        _ => true,
    })
}

/// Leniently interpret a value as an integer, rounding half away from zero.
pub fn coerce_integer(value: &Value) -> Result<Value, FormatError> {
    let fail = || FormatError::conversion("an integer", value);
    let n = match value {
        Value::Integer(i) => return Ok(Value::Integer(*i)),
        Value::Bool(b) => return Ok(Value::Integer(i64::from(*b))),
        Value::Number(n) => *n,
        Value::String(s) => lenient_float(s).ok_or_else(fail)?,
        Value::DateTime(instant) => return Ok(Value::Integer(instant.timestamp_millis())),
        _ => return Err(fail()),
    };
    let rounded = n.round();
    if rounded.is_finite() && rounded.abs() < 9.007_199_254_740_992e15 {
        Ok(Value::Integer(rounded as i64))
    } else {
        Err(fail())
    }
}

/// Leniently interpret a value as a number.
pub fn coerce_number(value: &Value) -> Result<Value, FormatError> {
    let fail = || FormatError::conversion("a number", value);
    match value {
        Value::Integer(_) => Ok(value.clone()),
        Value::Number(n) if n.is_finite() => Ok(value.clone()),
        Value::Bool(b) => Ok(Value::Integer(i64::from(*b))),
        Value::String(s) => lenient_float(s).map(Value::Number).ok_or_else(fail),
        Value::DateTime(instant) => Ok(Value::Integer(instant.timestamp_millis())),
        _ => Err(fail()),
    }
}

fn lenient_float(text: &str) -> Option<f64> {
    let trimmed = text.trim();
    if trimmed.is_empty() || trimmed.chars().any(|c| c.is_ascii_alphabetic() && c != 'e' && c != 'E') {
        return None;
    }
    trimmed.parse::<f64>().ok().filter(|n| n.is_finite())
}

/// Strictly parse `true` or `false`.
pub fn parse_boolean(text: &str) -> Result<Value, FormatError> {
    match text {
        "true" => Ok(Value::Bool(true)),
        "false" => Ok(Value::Bool(false)),
        _ => Err(FormatError::syntax("\"true\" or \"false\"", format!("{text:?}"))),
    }
}

/// Strictly parse an optionally signed run of digits.
pub fn parse_integer(text: &str) -> Result<Value, FormatError> {
    let syntax = || FormatError::syntax("an integer", format!("{text:?}"));
    let digits = text.strip_prefix('-').unwrap_or(text);
    if digits.is_empty() || !digits.bytes().all(|b| b.is_ascii_digit()) {
        return Err(syntax());
    }
    text.parse::<i64>().map(Value::Integer).map_err(|_| syntax())
}

/// Strictly parse a decimal number with optional fraction and exponent.
pub fn parse_number(text: &str) -> Result<Value, FormatError> {
    let syntax = || FormatError::syntax("a number", format!("{text:?}"));
    let unsigned = text.strip_prefix('-').unwrap_or(text);
    let (mantissa, exponent) = match unsigned.find(['e', 'E']) {
        Some(at) => (&unsigned[..at], Some(&unsigned[at + 1..])),
        None => (unsigned, None),
    };
    let (whole, fraction) = match mantissa.split_once('.') {
        Some((whole, fraction)) => (whole, Some(fraction)),
        None => (mantissa, None),
    };
    let all_digits = |s: &str| !s.is_empty() && s.bytes().all(|b| b.is_ascii_digit());
    let exponent_ok = exponent.map_or(true, |e| {
        all_digits(e.strip_prefix(['+', '-']).unwrap_or(e))
    });
    if !all_digits(whole) || !fraction.map_or(true, all_digits) || !exponent_ok {
        return Err(syntax());
    }
    text.parse::<f64>()
        .ok()
        .filter(|n| n.is_finite())
        .map(Value::Number)
        .ok_or_else(syntax)
}

/// Lenient conversion for a schema position of `kind` with an optional
/// `format`. Kinds without a conversion return the value unchanged.
pub fn coerce_for(kind: Kind, format: Option<Format>, value: &Value) -> Result<Value, FormatError> {
    match kind {
        Kind::Boolean => Ok(coerce_boolean(value)),
        Kind::Integer => coerce_integer(value),
        Kind::Number => coerce_number(value),
        Kind::String => match format {
            Some(format) => format.coerce(value),
            None => Ok(match value {
                Value::String(_) => value.clone(),
                Value::Null | Value::Array(_) | Value::Object(_) => value.clone(),
                scalar => Value::String(scalar.to_string()),
            }),
        },
        Kind::Array | Kind::Object | Kind::Untyped => Ok(value.clone()),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::ErrorCode;

    #[test]
    fn test_byte_coerce_string() {
        let coerced = Format::Byte.coerce(&Value::from("Hello")).unwrap();
        assert_eq!(coerced, Value::from("SGVsbG8="));
    }

    #[test]
    fn test_byte_coerce_booleans() {
        assert_eq!(Format::Byte.coerce(&Value::Bool(true)).unwrap(), Value::from("AQ=="));
        assert_eq!(Format::Byte.coerce(&Value::Bool(false)).unwrap(), Value::from(""));
    }

    #[test]
    fn test_byte_parse_accepts_loose_trailing_bits() {
        assert_eq!(Format::Byte.parse("ab==").unwrap(), Value::Bytes(vec![0x69]));
    }

    #[test]
    fn test_byte_parse_rejects_bad_length() {
        let err = Format::Byte.parse("abc").unwrap_err();
        assert_eq!(err.code, ErrorCode::Format);
        assert_eq!(Format::Byte.parse("ab=c").unwrap_err().code, ErrorCode::Format);
    }

    #[test]
    fn test_binary_coerce_number_pads_octets() {
        assert_eq!(Format::Binary.coerce(&Value::Integer(5)).unwrap(), Value::from("00000101"));
        assert_eq!(
            Format::Binary.coerce(&Value::Integer(256)).unwrap(),
            Value::from("0000000100000000")
        );
        assert_eq!(Format::Binary.coerce(&Value::Integer(0)).unwrap(), Value::from("00000000"));
    }

    #[test]
    fn test_binary_parse_and_encode() {
        let parsed = Format::Binary.parse("0100000101000010").unwrap();
        assert_eq!(parsed, Value::Bytes(b"AB".to_vec()));
        assert_eq!(Format::Binary.encode(&parsed).unwrap(), "0100000101000010");
        assert_eq!(Format::Binary.parse("0101").unwrap_err().code, ErrorCode::Format);
    }

    #[test]
    fn test_date_coerce_from_date_time() {
        let coerced = Format::Date.coerce(&Value::from("2000-01-01T10:00:00Z")).unwrap();
        assert_eq!(coerced, Value::from("2000-01-01"));
    }

    #[test]
    fn test_date_time_coerce_from_date() {
        let coerced = Format::DateTime.coerce(&Value::from("2000-01-01")).unwrap();
        assert_eq!(coerced, Value::from("2000-01-01T00:00:00.000Z"));
    }

    #[test]
    fn test_date_time_coerce_garbage_is_type() {
        let err = Format::DateTime.coerce(&Value::from("yesterday")).unwrap_err();
        assert_eq!(err.code, ErrorCode::Type);
    }

    #[test]
    fn test_encode_rejects_mismatched_value() {
        assert!(Format::Date.encode(&Value::Integer(4)).is_err());
    }

    #[test]
    fn test_coerce_boolean_truthiness() {
        assert_eq!(coerce_boolean(&Value::from("false")), Value::Bool(false));
        assert_eq!(coerce_boolean(&Value::from("")), Value::Bool(false));
        assert_eq!(coerce_boolean(&Value::from("no")), Value::Bool(true));
        assert_eq!(coerce_boolean(&Value::Integer(0)), Value::Bool(false));
    }

    #[test]
    fn test_coerce_integer_rounds() {
        assert_eq!(coerce_integer(&Value::from("2.5")).unwrap(), Value::Integer(3));
        assert_eq!(coerce_integer(&Value::Number(1.4)).unwrap(), Value::Integer(1));
        assert_eq!(coerce_integer(&Value::from("abc")).unwrap_err().code, ErrorCode::Type);
    }

    #[test]
    fn test_coerce_number_from_string() {
        assert_eq!(coerce_number(&Value::from("1.25")).unwrap(), Value::Number(1.25));
        assert!(coerce_number(&Value::from("NaN")).is_err());
        assert!(coerce_number(&Value::from("inf")).is_err());
    }

    #[test]
    fn test_strict_primitive_parsers() {
        assert_eq!(parse_boolean("true").unwrap(), Value::Bool(true));
        assert!(parse_boolean("TRUE").is_err());
        assert_eq!(parse_integer("-12").unwrap(), Value::Integer(-12));
        assert!(parse_integer("1.0").is_err());
        assert!(parse_integer("").is_err());
        assert_eq!(parse_number("1.5e2").unwrap(), Value::Number(150.0));
        assert!(parse_number("1.").is_err());
        assert!(parse_number(".5").is_err());
    }

    #[test]
    fn test_coerce_for_string_without_format() {
        let out = coerce_for(Kind::String, None, &Value::Integer(12)).unwrap();
        assert_eq!(out, Value::from("12"));
    }

    #[test]
    fn test_unknown_format_name() {
        assert_eq!(Format::from_name("uuid"), None);
        assert_eq!(Format::from_name("date-time"), Some(Format::DateTime));
    }

    mod proptests {
        use super::super::*;
        use proptest::prelude::*;

        fn any_scalar() -> impl Strategy<Value = Value> {
            prop_oneof![
                any::<bool>().prop_map(Value::Bool),
                any::<i64>().prop_map(Value::Integer),
                ".{0,24}".prop_map(Value::String),
                proptest::collection::vec(any::<u8>(), 0..24).prop_map(Value::Bytes),
                (0i64..4_102_444_800_000).prop_map(Value::Integer),
            ]
        }

        proptest! {
            #[test]
            fn prop_codec_round_trip(x in any_scalar()) {
                for format in [Format::Binary, Format::Byte, Format::Date, Format::DateTime] {
                    if let Ok(Value::String(wire)) = format.coerce(&x) {
                        let parsed = format.parse(&wire).unwrap();
                        prop_assert_eq!(format.encode(&parsed).unwrap(), wire);
                    }
                }
            }
        }
    }
}
