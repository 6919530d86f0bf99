// src/normalize.rs
//! Typed value nodes → plain values.
//!
//! The output space is closed: scalars, ordered sequences, and ordered-key
//! mappings, with nothing left that points back into the semantic model.

use indexmap::IndexMap;
use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::path_de::{from_value_with_path, DecodeError};
use crate::semantic::{EnumMember, EnumValue, ModelDecl, Numeric, TypedValue};

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum NormalizedValue {
    Null,
    Bool(bool),
    Number(Numeric),
    String(String),
    Array(Vec<NormalizedValue>),
    Object(IndexMap<String, NormalizedValue>),   // key order preserved
}

#[derive(Debug, Error, PartialEq, Eq)]
pub enum ValueError {
    #[error(transparent)]
    Decode(#[from] DecodeError),
}

// -------------------- dispatch --------------------

pub fn get_value_type_value(value: &TypedValue) -> NormalizedValue {
    match value {
        TypedValue::StringLiteral { value } => NormalizedValue::String(value.clone()),
        TypedValue::BooleanLiteral { value } => NormalizedValue::Bool(*value),
        TypedValue::Null => NormalizedValue::Null,
        TypedValue::NumericLiteral { value } => NormalizedValue::Number(*value),
        TypedValue::EnumMemberReference { member } => enum_member_value(member),
        TypedValue::ArrayLiteral { values } => {
            NormalizedValue::Array(values.iter().map(get_value_type_value).collect())
        }
        TypedValue::ObjectLiteral { properties } => NormalizedValue::Object(
            properties
                .iter()
                .map(|(k, v)| (k.clone(), get_value_type_value(v)))
                .collect(),
        ),
    }
}

/// Explicit value when the member has one, otherwise its declared name.
fn enum_member_value(member: &EnumMember) -> NormalizedValue {
    match &member.value {
        Some(EnumValue::String(s)) => NormalizedValue::String(s.clone()),
        Some(EnumValue::Number(n)) => NormalizedValue::Number(*n),
        None => NormalizedValue::String(member.name.clone()),
    }
}

/// Normalized defaults of every property that declares one, in property order.
pub fn property_defaults(model: &ModelDecl) -> IndexMap<String, NormalizedValue> {
    model
        .properties
        .iter()
        .filter_map(|(name, prop)| {
            prop.default_value.as_ref().map(|v| (name.clone(), get_value_type_value(v)))
        })
        .collect()
}

// -------------------- decode + convert --------------------

/// Decode a typed value document. A `kind` tag outside the known variants is
/// a decode error, never coerced into a neighbouring variant.
pub fn decode_typed_value(doc: serde_json::Value) -> Result<TypedValue, ValueError> {
    Ok(from_value_with_path(doc)?)
}

impl From<NormalizedValue> for serde_json::Value {
    fn from(v: NormalizedValue) -> Self {
        use serde_json::Value;
        match v {
            NormalizedValue::Null => Value::Null,
            NormalizedValue::Bool(b) => Value::Bool(b),
            NormalizedValue::Number(Numeric::Integer(i)) => Value::from(i),
            // non-finite floats have no JSON form
            NormalizedValue::Number(Numeric::Float(f)) => serde_json::Number::from_f64(f.0)
                .map(Value::Number)
                .unwrap_or(Value::Null),
            NormalizedValue::String(s) => Value::String(s),
            NormalizedValue::Array(xs) => Value::Array(xs.into_iter().map(Value::from).collect()),
            NormalizedValue::Object(m) => {
                Value::Object(m.into_iter().map(|(k, v)| (k, Value::from(v))).collect())
            }
        }
    }
}
