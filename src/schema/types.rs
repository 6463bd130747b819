use serde::Serialize;
use serde_json::Value;

use crate::error::ValidationError;

/// Structural type of a value exchanged with a provider.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "type", content = "of", rename_all = "snake_case")]
pub enum SchemaType {
    Boolean,
    Number,
    String,
    Array(Box<SchemaType>),
    /// String-keyed map with a single element type.
    Map(Box<SchemaType>),
    Object(ObjectType),
    Optional(Box<SchemaType>),
}

impl SchemaType {
    pub fn array(element: SchemaType) -> Self {
        Self::Array(Box::new(element))
    }

    pub fn map(element: SchemaType) -> Self {
        Self::Map(Box::new(element))
    }

    /// Wrap in `Optional`. Already-optional types are returned unchanged.
    pub fn optional(inner: SchemaType) -> Self {
        match inner {
            Self::Optional(_) => inner,
            other => Self::Optional(Box::new(other)),
        }
    }

    pub fn is_optional(&self) -> bool {
        matches!(self, Self::Optional(_))
    }

    /// The type with any `Optional` wrapper removed.
    pub fn without_optional(&self) -> &SchemaType {
        match self {
            Self::Optional(inner) => inner.without_optional(),
            other => other,
        }
    }

    /// Short human-readable name, used in validation messages.
    pub fn describe(&self) -> String {
        match self {
            Self::Boolean => "boolean".to_string(),
            Self::Number => "number".to_string(),
            Self::String => "string".to_string(),
            Self::Array(elem) => format!("array of {}", elem.describe()),
            Self::Map(elem) => format!("map of {}", elem.describe()),
            Self::Object(_) => "object".to_string(),
            Self::Optional(inner) => format!("optional {}", inner.describe()),
        }
    }
}

/// A single named property of an [`ObjectType`].
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Property {
    pub name: String,
    #[serde(rename = "type")]
    pub ty: SchemaType,
}

impl Property {
    pub fn is_optional(&self) -> bool {
        self.ty.is_optional()
    }
}

/// Object type with uniquely named properties in declaration order.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
#[serde(transparent)]
pub struct ObjectType {
    properties: Vec<Property>,
}

impl ObjectType {
    pub fn new() -> Self {
        Self::default()
    }

    /// Builder-style insert. A property with an existing name replaces it in place.
    pub fn with(mut self, name: impl Into<String>, ty: SchemaType) -> Self {
        self.push(name.into(), ty);
        self
    }

    pub fn with_optional(self, name: impl Into<String>, ty: SchemaType) -> Self {
        self.with(name, SchemaType::optional(ty))
    }

    /// Append a property; returns false if the name was already declared.
    pub(crate) fn push(&mut self, name: String, ty: SchemaType) -> bool {
        if let Some(existing) = self.properties.iter_mut().find(|p| p.name == name) {
            existing.ty = ty;
            return false;
        }
        self.properties.push(Property { name, ty });
        true
    }

    pub fn get(&self, name: &str) -> Option<&SchemaType> {
        self.properties
            .iter()
            .find(|p| p.name == name)
            .map(|p| &p.ty)
    }

    pub fn contains(&self, name: &str) -> bool {
        self.get(name).is_some()
    }

    pub fn properties(&self) -> &[Property] {
        &self.properties
    }

    pub fn names(&self) -> impl Iterator<Item = &str> {
        self.properties.iter().map(|p| p.name.as_str())
    }

    pub fn len(&self) -> usize {
        self.properties.len()
    }

    pub fn is_empty(&self) -> bool {
        self.properties.is_empty()
    }

    /// Validate a host value against this object type.
    ///
    /// Properties are checked in declaration order and the first mismatch is
    /// returned. Optional properties that are absent or null are skipped, and
    /// keys the type does not declare are ignored.
    pub fn validate(&self, value: &Value) -> Result<(), ValidationError> {
        validate_object(self, value, "")
    }
}

impl FromIterator<(String, SchemaType)> for ObjectType {
    fn from_iter<I: IntoIterator<Item = (String, SchemaType)>>(iter: I) -> Self {
        let mut object = ObjectType::new();
        for (name, ty) in iter {
            object.push(name, ty);
        }
        object
    }
}

/// Validate `value` against `object`. Convenience wrapper over [`ObjectType::validate`].
pub fn validate(value: &Value, object: &ObjectType) -> Result<(), ValidationError> {
    object.validate(value)
}

fn validate_object(object: &ObjectType, value: &Value, path: &str) -> Result<(), ValidationError> {
    let map = match value {
        Value::Object(map) => map,
        other => {
            return Err(ValidationError::new(
                display_path(path),
                format!("expected object, got {}", value_kind(other)),
            ))
        }
    };

    for property in &object.properties {
        let field_path = join_field(path, &property.name);
        match (map.get(&property.name), &property.ty) {
            (None | Some(Value::Null), SchemaType::Optional(_)) => continue,
            (None | Some(Value::Null), _) => {
                return Err(ValidationError::new(
                    field_path,
                    "required property is missing",
                ))
            }
            (Some(v), ty) => validate_value(ty, v, &field_path)?,
        }
    }
    Ok(())
}

fn validate_value(ty: &SchemaType, value: &Value, path: &str) -> Result<(), ValidationError> {
    let mismatch = || {
        ValidationError::new(
            display_path(path),
            format!("expected {}, got {}", ty.describe(), value_kind(value)),
        )
    };

    match ty {
        SchemaType::Optional(inner) => {
            if value.is_null() {
                Ok(())
            } else {
                validate_value(inner, value, path)
            }
        }
        SchemaType::Boolean if value.is_boolean() => Ok(()),
        SchemaType::Number if value.is_number() => Ok(()),
        SchemaType::String if value.is_string() => Ok(()),
        SchemaType::Boolean | SchemaType::Number | SchemaType::String => Err(mismatch()),
        SchemaType::Array(elem) => {
            let items = value.as_array().ok_or_else(mismatch)?;
            for (i, item) in items.iter().enumerate() {
                validate_value(elem, item, &format!("{}[{}]", path, i))?;
            }
            Ok(())
        }
        SchemaType::Map(elem) => {
            let entries = value.as_object().ok_or_else(mismatch)?;
            for (key, item) in entries {
                validate_value(elem, item, &format!("{}[{:?}]", path, key))?;
            }
            Ok(())
        }
        SchemaType::Object(object) => validate_object(object, value, path),
    }
}

fn join_field(path: &str, name: &str) -> String {
    if path.is_empty() {
        name.to_string()
    } else {
        format!("{}.{}", path, name)
    }
}

fn display_path(path: &str) -> String {
    if path.is_empty() {
        "<root>".to_string()
    } else {
        path.to_string()
    }
}

fn value_kind(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "boolean",
        Value::Number(_) => "number",
        Value::String(_) => "string",
        Value::Array(_) => "array",
        Value::Object(_) => "object",
    }
}
