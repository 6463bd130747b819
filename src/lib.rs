pub mod codegen;
pub mod error;
pub mod provider;
pub mod schema;

pub use error::{ProviderError, Result};
pub use provider::{
    ApplyResult, ChangeOptions, ImportedResource, LaunchOptions, PlanResult, PrivateData, Provider,
    ProviderRpc,
};
