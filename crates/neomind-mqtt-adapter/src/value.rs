//! Typed values carried by properties, events and actions.

use std::collections::BTreeMap;
use std::fmt;

use serde::{Deserialize, Serialize};

use crate::error::CoercionError;

/// Runtime value produced and consumed by the coercion engine.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum TypedValue {
    Integer(i64),
    Float(f64),
    Boolean(bool),
    Text(String),
    /// Ordered sequence of values
    Array(Vec<TypedValue>),
    /// Key/value map of values
    Object(BTreeMap<String, TypedValue>),
}

impl TypedValue {
    pub fn as_i64(&self) -> Option<i64> {
        match self {
            Self::Integer(v) => Some(*v),
            _ => None,
        }
    }

    pub fn as_f64(&self) -> Option<f64> {
        match self {
            Self::Float(v) => Some(*v),
            Self::Integer(v) => Some(*v as f64),
            _ => None,
        }
    }

    pub fn as_bool(&self) -> Option<bool> {
        match self {
            Self::Boolean(v) => Some(*v),
            _ => None,
        }
    }

    pub fn as_str(&self) -> Option<&str> {
        match self {
            Self::Text(v) => Some(v),
            _ => None,
        }
    }

    pub fn as_array(&self) -> Option<&[TypedValue]> {
        match self {
            Self::Array(v) => Some(v),
            _ => None,
        }
    }

    pub fn as_object(&self) -> Option<&BTreeMap<String, TypedValue>> {
        match self {
            Self::Object(v) => Some(v),
            _ => None,
        }
    }

    /// Name of the variant, as used in error messages.
    pub fn kind(&self) -> &'static str {
        match self {
            Self::Integer(_) => "integer",
            Self::Float(_) => "float",
            Self::Boolean(_) => "boolean",
            Self::Text(_) => "text",
            Self::Array(_) => "array",
            Self::Object(_) => "object",
        }
    }

    /// Convert a JSON tree into a typed value.
    ///
    /// Numbers become `Integer` when they fit an `i64` and `Float` otherwise.
    /// `null` has no typed representation and is rejected.
    pub fn from_json(value: &serde_json::Value) -> Result<Self, CoercionError> {
        match value {
            serde_json::Value::Null => Err(CoercionError::new(
                ValueType::Object.name(),
                "null",
                "null has no typed representation",
            )),
            serde_json::Value::Bool(b) => Ok(Self::Boolean(*b)),
            serde_json::Value::Number(n) => {
                if let Some(i) = n.as_i64() {
                    Ok(Self::Integer(i))
                } else if let Some(f) = n.as_f64() {
                    Ok(Self::Float(f))
                } else {
                    Err(CoercionError::new(
                        ValueType::Float.name(),
                        &n.to_string(),
                        "number out of range",
                    ))
                }
            }
            serde_json::Value::String(s) => Ok(Self::Text(s.clone())),
            serde_json::Value::Array(items) => items
                .iter()
                .map(Self::from_json)
                .collect::<Result<Vec<_>, _>>()
                .map(Self::Array),
            serde_json::Value::Object(map) => map
                .iter()
                .map(|(k, v)| Ok((k.clone(), Self::from_json(v)?)))
                .collect::<Result<BTreeMap<_, _>, CoercionError>>()
                .map(Self::Object),
        }
    }

    /// Convert into a JSON tree.
    ///
    /// Non-finite floats have no JSON number form and are written as their
    /// textual representation (`"NaN"`, `"inf"`, `"-inf"`). This is lossy for
    /// objects: their fields carry no declared type, so such a field decodes
    /// back as `Text`. Arrays keep the float because elements are decoded
    /// through the declared element type.
    pub fn to_json(&self) -> serde_json::Value {
        match self {
            Self::Integer(i) => serde_json::Value::from(*i),
            Self::Float(f) => serde_json::Number::from_f64(*f)
                .map(serde_json::Value::Number)
                .unwrap_or_else(|| serde_json::Value::String(f.to_string())),
            Self::Boolean(b) => serde_json::Value::Bool(*b),
            Self::Text(s) => serde_json::Value::String(s.clone()),
            Self::Array(items) => {
                serde_json::Value::Array(items.iter().map(Self::to_json).collect())
            }
            Self::Object(map) => serde_json::Value::Object(
                map.iter().map(|(k, v)| (k.clone(), v.to_json())).collect(),
            ),
        }
    }
}

impl From<i64> for TypedValue {
    fn from(v: i64) -> Self {
        Self::Integer(v)
    }
}

impl From<f64> for TypedValue {
    fn from(v: f64) -> Self {
        Self::Float(v)
    }
}

impl From<bool> for TypedValue {
    fn from(v: bool) -> Self {
        Self::Boolean(v)
    }
}

impl From<&str> for TypedValue {
    fn from(v: &str) -> Self {
        Self::Text(v.to_string())
    }
}

impl From<String> for TypedValue {
    fn from(v: String) -> Self {
        Self::Text(v)
    }
}

impl From<Vec<TypedValue>> for TypedValue {
    fn from(v: Vec<TypedValue>) -> Self {
        Self::Array(v)
    }
}

/// Declared type of a binding or property.
///
/// Resolved from the names `int`, `double`, `float`, `boolean`, `string`,
/// `json-array` and `json-object`. Lookup is case-sensitive.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum ValueType {
    Integer,
    Float,
    Boolean,
    Text,
    /// Homogeneous sequence with the given element type
    Array(Box<ValueType>),
    /// Structured object, values are not checked against a schema
    Object,
}

impl ValueType {
    /// Build an array type over `element`.
    pub fn array(element: ValueType) -> Self {
        Self::Array(Box::new(element))
    }

    /// Resolve a declared type name.
    ///
    /// `json-array` needs an element type; it is ignored for every other name.
    pub fn resolve(name: &str, element: Option<ValueType>) -> Result<Self, CoercionError> {
        match name {
            "int" => Ok(Self::Integer),
            "double" | "float" => Ok(Self::Float),
            "boolean" => Ok(Self::Boolean),
            "string" => Ok(Self::Text),
            "json-object" => Ok(Self::Object),
            "json-array" => element.map(Self::array).ok_or_else(|| {
                CoercionError::new(name, "", "json-array requires an element type")
            }),
            other => Err(CoercionError::new(other, "", "unrecognized type name")),
        }
    }

    /// Canonical name of this type.
    pub fn name(&self) -> &'static str {
        match self {
            Self::Integer => "int",
            Self::Float => "double",
            Self::Boolean => "boolean",
            Self::Text => "string",
            Self::Array(_) => "json-array",
            Self::Object => "json-object",
        }
    }

    /// Whether `value` carries the tag this type implies, recursively for arrays.
    pub fn matches(&self, value: &TypedValue) -> bool {
        match (self, value) {
            (Self::Integer, TypedValue::Integer(_))
            | (Self::Float, TypedValue::Float(_))
            | (Self::Boolean, TypedValue::Boolean(_))
            | (Self::Text, TypedValue::Text(_))
            | (Self::Object, TypedValue::Object(_)) => true,
            (Self::Array(element), TypedValue::Array(items)) => {
                items.iter().all(|item| element.matches(item))
            }
            _ => false,
        }
    }
}

impl fmt::Display for ValueType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Array(element) => write!(f, "json-array<{}>", element),
            other => write!(f, "{}", other.name()),
        }
    }
}
