//! Shape detection for raw read results

use crate::error::DecodeError;
use serde_json::{Map, Value};

/// A read result after its shape has been identified
#[derive(Debug, Clone, PartialEq)]
pub enum RawRecord {
    /// Ordered fields in the struct's canonical order
    Positional(Vec<Value>),
    /// Fields keyed by name; numeric keys ("0", "1", …) are tolerated as positions
    Keyed(Map<String, Value>),
}

impl RawRecord {
    /// Identify the shape of `value`.
    ///
    /// A one-element array wrapping an array or object is unwrapped first: some
    /// transports return the output list of a call whose only output is the tuple.
    pub fn detect(value: Value) -> Result<Self, DecodeError> {
        match value {
            Value::Array(mut items) => {
                if items.len() == 1 && matches!(items[0], Value::Array(_) | Value::Object(_)) {
                    return Self::detect(items.remove(0));
                }
                Ok(Self::Positional(items))
            }
            Value::Object(map) => Ok(Self::Keyed(map)),
            other => Err(DecodeError::UnrecognizedShape {
                found: value_kind(&other),
            }),
        }
    }

    pub fn reader(&self) -> FieldReader<'_> {
        FieldReader { raw: self }
    }

    pub fn len(&self) -> usize {
        match self {
            Self::Positional(items) => items.len(),
            Self::Keyed(map) => map.len(),
        }
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

/// Name-first, position-second field access over a [`RawRecord`]
#[derive(Debug, Clone, Copy)]
pub struct FieldReader<'a> {
    raw: &'a RawRecord,
}

impl<'a> FieldReader<'a> {
    /// Look up a field. `null` counts as absent so the fallback still applies.
    pub fn field(&self, name: &str, position: usize) -> Option<&'a Value> {
        let found = match self.raw {
            RawRecord::Keyed(map) => map
                .get(name)
                .filter(|v| !v.is_null())
                .or_else(|| map.get(&position.to_string())),
            RawRecord::Positional(items) => items.get(position),
        };
        found.filter(|v| !v.is_null())
    }
}

pub(crate) fn value_kind(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "bool",
        Value::Number(_) => "number",
        Value::String(_) => "string",
        Value::Array(_) => "array",
        Value::Object(_) => "object",
    }
}
