//! Decoding of cty type descriptors as they appear in attribute `type` bytes.
//!
//! Primitive types are JSON strings (`"string"`, `"number"`, `"bool"`,
//! `"dynamic"`); collection and structural types are two-element arrays such
//! as `["list", "string"]` or `["object", {"name": "string"}]`.

use std::collections::BTreeMap;

use serde_json::Value;

use super::types::{ObjectType, SchemaType};
use crate::error::{ProviderError, Result};

/// A parsed wire type descriptor.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum WireType {
    Bool,
    Number,
    String,
    /// The `"dynamic"` pseudo-type. Parsed so it can be reported, never decoded.
    Dynamic,
    List(Box<WireType>),
    Set(Box<WireType>),
    Map(Box<WireType>),
    Object(BTreeMap<String, WireType>),
}

impl WireType {
    pub fn parse(descriptor: &Value) -> Result<WireType> {
        match descriptor {
            Value::String(atom) => match atom.as_str() {
                "bool" => Ok(WireType::Bool),
                "number" => Ok(WireType::Number),
                "string" => Ok(WireType::String),
                "dynamic" | "any" => Ok(WireType::Dynamic),
                other => Err(ProviderError::UnknownType(format!(
                    "unsupported primitive type '{}'",
                    other
                ))),
            },
            Value::Array(pair) if pair.len() == 2 => {
                let tag = pair[0].as_str().ok_or_else(|| {
                    ProviderError::UnknownType(format!(
                        "type tag must be a string, got {}",
                        pair[0]
                    ))
                })?;
                let payload = &pair[1];
                match tag {
                    "list" => Ok(WireType::List(Box::new(WireType::parse(payload)?))),
                    "set" => Ok(WireType::Set(Box::new(WireType::parse(payload)?))),
                    "map" => Ok(WireType::Map(Box::new(WireType::parse(payload)?))),
                    "object" => {
                        let fields = payload.as_object().ok_or_else(|| {
                            ProviderError::UnknownType(format!(
                                "object type payload must be a map, got {}",
                                payload
                            ))
                        })?;
                        let mut parsed = BTreeMap::new();
                        for (name, field) in fields {
                            parsed.insert(name.clone(), WireType::parse(field)?);
                        }
                        Ok(WireType::Object(parsed))
                    }
                    other => Err(ProviderError::UnknownType(format!(
                        "unsupported type tag '{}'",
                        other
                    ))),
                }
            }
            other => Err(ProviderError::UnknownType(format!(
                "malformed type descriptor {}",
                other
            ))),
        }
    }

    /// Render back to the wire JSON form.
    pub fn to_json(&self) -> Value {
        match self {
            WireType::Bool => Value::from("bool"),
            WireType::Number => Value::from("number"),
            WireType::String => Value::from("string"),
            WireType::Dynamic => Value::from("dynamic"),
            WireType::List(elem) => serde_json::json!(["list", elem.to_json()]),
            WireType::Set(elem) => serde_json::json!(["set", elem.to_json()]),
            WireType::Map(elem) => serde_json::json!(["map", elem.to_json()]),
            WireType::Object(fields) => {
                let fields: serde_json::Map<String, Value> = fields
                    .iter()
                    .map(|(name, ty)| (name.clone(), ty.to_json()))
                    .collect();
                serde_json::json!(["object", fields])
            }
        }
    }

    /// Convert to a [`SchemaType`]. Sets become arrays; element uniqueness is not tracked.
    pub fn to_schema_type(&self) -> Result<SchemaType> {
        match self {
            WireType::Bool => Ok(SchemaType::Boolean),
            WireType::Number => Ok(SchemaType::Number),
            WireType::String => Ok(SchemaType::String),
            WireType::Dynamic => Err(ProviderError::UnknownType(
                "dynamic (any) types are not supported".to_string(),
            )),
            WireType::List(elem) | WireType::Set(elem) => {
                Ok(SchemaType::array(elem.to_schema_type()?))
            }
            WireType::Map(elem) => Ok(SchemaType::map(elem.to_schema_type()?)),
            WireType::Object(fields) => {
                let mut object = ObjectType::new();
                for (name, field) in fields {
                    object.push(name.clone(), field.to_schema_type()?);
                }
                Ok(SchemaType::Object(object))
            }
        }
    }
}

/// Decode a JSON type descriptor into a [`SchemaType`].
pub fn decode(descriptor: &Value) -> Result<SchemaType> {
    WireType::parse(descriptor)?.to_schema_type()
}

/// Decode the raw `type` bytes of a schema attribute.
pub fn decode_bytes(bytes: &[u8]) -> Result<SchemaType> {
    let descriptor: Value = serde_json::from_slice(bytes).map_err(|e| {
        ProviderError::schema_read(format!("attribute type is not valid JSON: {}", e))
    })?;
    decode(&descriptor)
}
