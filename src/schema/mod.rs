//! Translation of provider wire schemas into a structural type system.

pub mod block;
pub mod cty;
pub mod types;

pub use block::{translate, Kind, ProviderSchemas};
pub use cty::WireType;
pub use types::{ObjectType, Property, SchemaType};
