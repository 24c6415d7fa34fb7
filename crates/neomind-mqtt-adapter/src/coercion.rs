//! Value coercion between string payloads and typed values.
//!
//! Scalars use their canonical textual form (`42`, `2.5`, `true`). Arrays and
//! objects use JSON syntax. Array elements are first read as opaque text
//! tokens and then decoded through the element type, so nested arrays decode
//! recursively to any depth.

use std::sync::Arc;

use crate::error::CoercionError;
use crate::topic::{DecodeFn, EncodeFn};
use crate::value::{TypedValue, ValueType};

/// Decode a raw payload as `value_type`.
///
/// Either a fully formed value is returned or an error; a malformed element
/// fails the whole decode.
pub fn decode(value_type: &ValueType, raw: &str) -> Result<TypedValue, CoercionError> {
    match value_type {
        ValueType::Integer => raw
            .parse::<i64>()
            .map(TypedValue::Integer)
            .map_err(|e| CoercionError::new(value_type.name(), raw, e)),
        ValueType::Float => raw
            .parse::<f64>()
            .map(TypedValue::Float)
            .map_err(|e| CoercionError::new(value_type.name(), raw, e)),
        ValueType::Boolean => match raw {
            "true" => Ok(TypedValue::Boolean(true)),
            "false" => Ok(TypedValue::Boolean(false)),
            _ => Err(CoercionError::new(
                value_type.name(),
                raw,
                "expected \"true\" or \"false\"",
            )),
        },
        ValueType::Text => Ok(TypedValue::Text(raw.to_string())),
        ValueType::Array(element) => decode_array(value_type, element, raw),
        ValueType::Object => decode_object(value_type, raw),
    }
}

/// Encode a typed value as a payload string.
pub fn encode(value: &TypedValue) -> String {
    match value {
        TypedValue::Integer(i) => i.to_string(),
        TypedValue::Float(f) => f.to_string(),
        TypedValue::Boolean(b) => b.to_string(),
        TypedValue::Text(s) => s.clone(),
        TypedValue::Array(_) | TypedValue::Object(_) => value.to_json().to_string(),
    }
}

/// Decode function for `value_type`, suitable for an incoming binding.
pub fn decoder(value_type: ValueType) -> DecodeFn {
    Arc::new(move |raw: &str| decode(&value_type, raw))
}

/// Decode function that passes the payload through unchanged as text.
pub fn identity() -> DecodeFn {
    Arc::new(|raw: &str| Ok::<_, CoercionError>(TypedValue::Text(raw.to_string())))
}

/// Encode function that prepends `verb` to the encoded value.
pub fn prefixed(verb: impl Into<String>) -> EncodeFn {
    let verb = verb.into();
    Arc::new(move |value: &TypedValue| format!("{}{}", verb, encode(value)))
}

fn parse_json(value_type: &ValueType, raw: &str) -> Result<serde_json::Value, CoercionError> {
    serde_json::from_str(raw)
        .map_err(|e| CoercionError::new(value_type.name(), raw, format!("invalid JSON: {}", e)))
}

fn decode_array(
    value_type: &ValueType,
    element: &ValueType,
    raw: &str,
) -> Result<TypedValue, CoercionError> {
    let items = match parse_json(value_type, raw)? {
        serde_json::Value::Array(items) => items,
        other => {
            return Err(CoercionError::new(
                value_type.name(),
                raw,
                format!("expected a JSON array, found {}", json_kind(&other)),
            ))
        }
    };

    items
        .iter()
        .enumerate()
        .map(|(index, item)| {
            if item.is_null() {
                return Err(CoercionError::new(
                    value_type.name(),
                    raw,
                    format!("element {} is null", index),
                ));
            }
            decode(element, &token(item)).map_err(|e| {
                CoercionError::new(
                    value_type.name(),
                    raw,
                    format!("element {} is not a valid {}: {}", index, element, e.cause),
                )
            })
        })
        .collect::<Result<Vec<_>, _>>()
        .map(TypedValue::Array)
}

fn decode_object(value_type: &ValueType, raw: &str) -> Result<TypedValue, CoercionError> {
    let json = parse_json(value_type, raw)?;
    if !json.is_object() {
        return Err(CoercionError::new(
            value_type.name(),
            raw,
            format!("expected a JSON object, found {}", json_kind(&json)),
        ));
    }
    TypedValue::from_json(&json).map_err(|e| CoercionError::new(value_type.name(), raw, e.cause))
}

/// Text token of an array element: string contents, or the JSON text otherwise.
fn token(item: &serde_json::Value) -> String {
    match item {
        serde_json::Value::String(s) => s.clone(),
        other => other.to_string(),
    }
}

fn json_kind(value: &serde_json::Value) -> &'static str {
    match value {
        serde_json::Value::Null => "null",
        serde_json::Value::Bool(_) => "boolean",
        serde_json::Value::Number(_) => "number",
        serde_json::Value::String(_) => "string",
        serde_json::Value::Array(_) => "array",
        serde_json::Value::Object(_) => "object",
    }
}
