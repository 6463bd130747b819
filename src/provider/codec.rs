//! Conversion between host values and the protocol's value encodings.
//!
//! Values travel as msgpack inside `DynamicValue`, except for the legacy
//! upgrade path which sends JSON bytes inside `RawState`.

use serde_json::{Map, Value};

use super::tfplugin5::{DynamicValue, RawState};
use crate::error::Result;
use crate::schema::{ObjectType, SchemaType};

/// Pack a host value as a msgpack `DynamicValue`.
pub fn to_dynamic(value: &Value) -> Result<DynamicValue> {
    Ok(DynamicValue {
        msgpack: rmp_serde::to_vec_named(value)?,
        json: vec![],
    })
}

/// Unpack a `DynamicValue`. A missing value or empty payload yields `None`.
pub fn from_dynamic(dv: Option<&DynamicValue>) -> Result<Option<Value>> {
    let dv = match dv {
        Some(dv) => dv,
        None => return Ok(None),
    };
    if !dv.msgpack.is_empty() {
        // rmpv keeps cty extension types (unknown values) instead of failing on them
        let raw = rmpv::decode::read_value(&mut &dv.msgpack[..])?;
        Ok(Some(rmpv_to_json(raw)))
    } else if !dv.json.is_empty() {
        Ok(Some(serde_json::from_slice(&dv.json)?))
    } else {
        Ok(None)
    }
}

/// Encode a host value as legacy JSON raw state.
pub fn to_raw_state(value: &Value) -> Result<RawState> {
    Ok(RawState {
        json: serde_json::to_vec(value)?,
        flatmap: Default::default(),
    })
}

/// Decode legacy raw state. A missing value or empty payload yields `None`.
pub fn from_raw_state(raw: Option<&RawState>) -> Result<Option<Value>> {
    match raw {
        Some(raw) if !raw.json.is_empty() => Ok(Some(serde_json::from_slice(&raw.json)?)),
        _ => Ok(None),
    }
}

/// Copy every declared property of `object` from `value`, using `null` for
/// anything absent. msgpack objects must carry every attribute of their type,
/// so nested object values are filled the same way.
pub fn optionals_to_nulls(value: &Value, object: &ObjectType) -> Map<String, Value> {
    let input = value.as_object();
    object
        .properties()
        .iter()
        .map(|property| {
            let v = match input.and_then(|m| m.get(&property.name)) {
                None | Some(Value::Null) => Value::Null,
                Some(v) => fill_nulls(v, &property.ty),
            };
            (property.name.clone(), v)
        })
        .collect()
}

fn fill_nulls(value: &Value, ty: &SchemaType) -> Value {
    match (ty.without_optional(), value) {
        (SchemaType::Object(object), Value::Object(_)) => {
            Value::Object(optionals_to_nulls(value, object))
        }
        (SchemaType::Array(elem), Value::Array(items)) => {
            Value::Array(items.iter().map(|item| fill_nulls(item, elem)).collect())
        }
        (SchemaType::Map(elem), Value::Object(entries)) => Value::Object(
            entries
                .iter()
                .map(|(k, item)| (k.clone(), fill_nulls(item, elem)))
                .collect(),
        ),
        _ => value.clone(),
    }
}

/// Convert rmpv::Value to serde_json::Value, handling cty extension types.
/// cty uses msgpack extension type 0 for "unknown" values (computed at apply time).
fn rmpv_to_json(val: rmpv::Value) -> Value {
    match val {
        rmpv::Value::Nil => Value::Null,
        rmpv::Value::Boolean(b) => Value::Bool(b),
        rmpv::Value::Integer(i) => {
            if let Some(n) = i.as_i64() {
                Value::Number(n.into())
            } else if let Some(n) = i.as_u64() {
                Value::Number(n.into())
            } else {
                Value::Null
            }
        }
        rmpv::Value::F32(f) => serde_json::Number::from_f64(f as f64)
            .map(Value::Number)
            .unwrap_or(Value::Null),
        rmpv::Value::F64(f) => serde_json::Number::from_f64(f)
            .map(Value::Number)
            .unwrap_or(Value::Null),
        rmpv::Value::String(s) => Value::String(s.into_str().unwrap_or_default()),
        rmpv::Value::Binary(b) => Value::String(String::from_utf8_lossy(&b).into_owned()),
        rmpv::Value::Array(arr) => Value::Array(arr.into_iter().map(rmpv_to_json).collect()),
        rmpv::Value::Map(entries) => {
            let mut map = Map::new();
            for (k, v) in entries {
                let key = match k {
                    rmpv::Value::String(s) => s.into_str().unwrap_or_default(),
                    other => format!("{}", other),
                };
                map.insert(key, rmpv_to_json(v));
            }
            Value::Object(map)
        }
        // Unknown values (ext type 0) and anything else opaque are treated as null
        rmpv::Value::Ext(_, _) => Value::Null,
    }
}
