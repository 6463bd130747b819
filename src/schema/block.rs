use std::collections::HashMap;

use tracing::{debug, info};

use super::cty;
use super::types::{ObjectType, SchemaType};
use crate::error::{ProviderError, Result};
use crate::provider::tfplugin5::get_provider_schema;
use crate::provider::tfplugin5::schema::nested_block::NestingMode;
use crate::provider::tfplugin5::schema::{Attribute, Block, NestedBlock};

/// Which view of a block to build.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Kind {
    /// Configuration input: what the operator writes.
    Args,
    /// Persisted state: what the provider returns.
    Attrs,
}

impl std::fmt::Display for Kind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Kind::Args => write!(f, "args"),
            Kind::Attrs => write!(f, "attrs"),
        }
    }
}

/// Translate a schema block into an object type.
///
/// Nested blocks only appear in the `Args` view.
pub fn translate(block: &Block, kind: Kind) -> Result<ObjectType> {
    let mut object = ObjectType::new();

    for attr in &block.attributes {
        let (name, ty) = translate_attribute(attr, kind)?;
        if !object.push(name.clone(), ty) {
            return Err(ProviderError::schema_read(format!(
                "duplicate attribute '{}'",
                name
            )));
        }
    }

    if kind == Kind::Args {
        for nested in &block.block_types {
            let (name, ty) = translate_nested(nested, kind)?;
            if !object.push(name.clone(), ty) {
                return Err(ProviderError::schema_read(format!(
                    "nested block '{}' collides with another property",
                    name
                )));
            }
        }
    }

    Ok(object)
}

fn translate_attribute(attr: &Attribute, kind: Kind) -> Result<(String, SchemaType)> {
    if attr.name.is_empty() {
        return Err(ProviderError::schema_read("attribute has no name"));
    }
    if attr.r#type.is_empty() {
        return Err(ProviderError::schema_read(format!(
            "attribute '{}' has no type",
            attr.name
        )));
    }

    let ty = cty::decode_bytes(&attr.r#type)?;

    // An attribute with no flags at all is inconsistent; treat it as required.
    let unflagged = !attr.required && !attr.optional && !attr.computed;
    if unflagged {
        debug!(
            "Attribute '{}' sets none of required/optional/computed; treating as required",
            attr.name
        );
    }

    // Computed attributes may be absent before apply, so they are optional in
    // both views. In state only required attributes are guaranteed present.
    let optional = match kind {
        Kind::Attrs => !(attr.required || unflagged),
        Kind::Args => attr.optional || attr.computed,
    };

    let ty = if optional { SchemaType::optional(ty) } else { ty };
    Ok((attr.name.clone(), ty))
}

fn translate_nested(nested: &NestedBlock, kind: Kind) -> Result<(String, SchemaType)> {
    if nested.type_name.is_empty() {
        return Err(ProviderError::schema_read("nested block has no type name"));
    }
    let inner = nested.block.as_ref().ok_or_else(|| {
        ProviderError::schema_read(format!(
            "nested block '{}' has no block definition",
            nested.type_name
        ))
    })?;

    let invalid_mode = || {
        ProviderError::schema_read(format!(
            "nested block '{}' has invalid nesting mode {}",
            nested.type_name, nested.nesting
        ))
    };
    let mode = NestingMode::try_from(nested.nesting).map_err(|_| invalid_mode())?;

    let object = SchemaType::Object(translate(inner, kind)?);

    let ty = match mode {
        NestingMode::Single | NestingMode::Group => object,
        NestingMode::List | NestingMode::Set if nested.max_items == 1 => object,
        NestingMode::List | NestingMode::Set => SchemaType::array(object),
        NestingMode::Map => SchemaType::map(object),
        NestingMode::Invalid => return Err(invalid_mode()),
    };

    // A group block with no items is the same as an absent block.
    let required = nested.min_items > 0 && mode != NestingMode::Group;
    let ty = if required { ty } else { SchemaType::optional(ty) };

    Ok((nested.type_name.clone(), ty))
}

/// Every translated schema of a provider, built once from `GetSchema`.
#[derive(Debug, Clone, Default)]
pub struct ProviderSchemas {
    pub provider: ObjectType,
    pub provider_state: ObjectType,
    pub provider_meta: Option<ObjectType>,
    pub data_source_schemas: HashMap<String, ObjectType>,
    pub data_source_state_schemas: HashMap<String, ObjectType>,
    pub resource_schemas: HashMap<String, ObjectType>,
    pub resource_state_schemas: HashMap<String, ObjectType>,
    /// Schema version per resource type, as reported by the provider.
    pub resource_versions: HashMap<String, i64>,
}

impl ProviderSchemas {
    pub fn from_response(response: &get_provider_schema::Response) -> Result<Self> {
        let provider_block = response
            .provider
            .as_ref()
            .and_then(|s| s.block.as_ref())
            .ok_or_else(|| ProviderError::schema_read("provider schema has no block"))?;

        let provider_meta = response
            .provider_meta
            .as_ref()
            .and_then(|s| s.block.as_ref())
            .map(|block| translate(block, Kind::Args))
            .transpose()?;
        if provider_meta.is_some() {
            info!("Provider has provider_meta schema");
        }

        let mut schemas = ProviderSchemas {
            provider: translate(provider_block, Kind::Args)?,
            provider_state: translate(provider_block, Kind::Attrs)?,
            provider_meta,
            ..Default::default()
        };

        for (name, schema) in &response.data_source_schemas {
            let block = schema.block.as_ref().ok_or_else(|| {
                ProviderError::schema_read(format!("data source '{}' has no block", name))
            })?;
            schemas
                .data_source_schemas
                .insert(name.clone(), translate(block, Kind::Args)?);
            schemas
                .data_source_state_schemas
                .insert(name.clone(), translate(block, Kind::Attrs)?);
        }

        for (name, schema) in &response.resource_schemas {
            let block = schema.block.as_ref().ok_or_else(|| {
                ProviderError::schema_read(format!("resource '{}' has no block", name))
            })?;
            schemas
                .resource_schemas
                .insert(name.clone(), translate(block, Kind::Args)?);
            schemas
                .resource_state_schemas
                .insert(name.clone(), translate(block, Kind::Attrs)?);
            schemas.resource_versions.insert(name.clone(), schema.version);
        }

        info!(
            "Schema loaded: {} resource types, {} data source types",
            schemas.resource_schemas.len(),
            schemas.data_source_schemas.len()
        );
        Ok(schemas)
    }

    pub fn resource(&self, type_name: &str, kind: Kind) -> Option<&ObjectType> {
        match kind {
            Kind::Args => self.resource_schemas.get(type_name),
            Kind::Attrs => self.resource_state_schemas.get(type_name),
        }
    }

    pub fn data_source(&self, type_name: &str, kind: Kind) -> Option<&ObjectType> {
        match kind {
            Kind::Args => self.data_source_schemas.get(type_name),
            Kind::Attrs => self.data_source_state_schemas.get(type_name),
        }
    }

    pub fn provider(&self, kind: Kind) -> &ObjectType {
        match kind {
            Kind::Args => &self.provider,
            Kind::Attrs => &self.provider_state,
        }
    }

    /// Resource type names, sorted.
    pub fn resource_types(&self) -> Vec<String> {
        let mut names: Vec<String> = self.resource_schemas.keys().cloned().collect();
        names.sort();
        names
    }

    /// Data source type names, sorted.
    pub fn data_source_types(&self) -> Vec<String> {
        let mut names: Vec<String> = self.data_source_schemas.keys().cloned().collect();
        names.sort();
        names
    }
}
