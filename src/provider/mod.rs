pub mod client;
pub mod codec;
pub mod diagnostics;
pub mod private;
pub mod protocol;
pub mod rpc;

/// Generated gRPC types from the provider plugin protocol.
#[allow(clippy::all)]
#[allow(non_camel_case_types)]
pub mod tfplugin5 {
    #![doc(hidden)]
    tonic::include_proto!("tfplugin5");
}

pub use client::{ApplyResult, ChangeOptions, ImportedResource, PlanResult, Provider};
pub use private::PrivateData;
pub use protocol::{LaunchOptions, ProviderProcess};
pub use rpc::ProviderRpc;
