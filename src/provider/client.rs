use std::future::Future;
use std::path::Path;

use serde_json::Value;
use tonic::transport::Channel;
use tonic::Status;
use tracing::{debug, info};

use super::codec::{from_dynamic, optionals_to_nulls, to_dynamic, to_raw_state};
use super::diagnostics::{self, attribute_path_to_string};
use super::private::PrivateData;
use super::protocol::{self, LaunchOptions, ProviderProcess};
use super::rpc::ProviderRpc;
use super::tfplugin5::provider_client::ProviderClient;
use super::tfplugin5::{
    apply_resource_change, configure, get_provider_schema, import_resource_state,
    plan_resource_change, prepare_provider_config, read_data_source, read_resource, stop,
    upgrade_resource_state, validate_data_source_config, validate_resource_type_config,
    AttributePath, Diagnostic, DynamicValue,
};
use crate::error::{DiagnosticError, ProviderError, Result};
use crate::schema::{Kind, ObjectType, ProviderSchemas};

/// Version string reported to providers in `Configure`.
const CLIENT_VERSION: &str = env!("CARGO_PKG_VERSION");

/// Optional inputs for plan and apply.
#[derive(Debug, Clone, Default)]
pub struct ChangeOptions {
    /// Private data from the previous plan/apply/read of this resource.
    pub private: Option<PrivateData>,
    /// Resource configuration. Validated against the resource's config schema
    /// and sent with every declared attribute present.
    pub config: Option<Value>,
}

impl ChangeOptions {
    pub fn with_private(mut self, private: PrivateData) -> Self {
        self.private = Some(private);
        self
    }

    pub fn with_config(mut self, config: Value) -> Self {
        self.config = Some(config);
        self
    }
}

#[derive(Debug, Clone)]
pub struct PlanResult {
    pub planned_state: Value,
    pub planned_private: PrivateData,
    /// Attribute paths whose change forces replacement, as sent by the provider.
    pub requires_replace: Vec<AttributePath>,
}

impl PlanResult {
    pub fn requires_replace_paths(&self) -> Vec<String> {
        self.requires_replace
            .iter()
            .map(attribute_path_to_string)
            .collect()
    }
}

#[derive(Debug, Clone)]
pub struct ApplyResult {
    pub new_state: Value,
    pub private: PrivateData,
}

#[derive(Debug, Clone)]
pub struct ImportedResource {
    pub type_name: String,
    pub state: Value,
    pub private: PrivateData,
}

/// A provider plugin with its schema loaded.
///
/// Schema tables are built once in the constructor and only read afterwards,
/// so every lifecycle operation takes `&self` and may run concurrently.
pub struct Provider<R = ProviderClient<Channel>> {
    rpc: R,
    schemas: ProviderSchemas,
    process: Option<ProviderProcess>,
}

impl Provider<ProviderClient<Channel>> {
    /// Start a provider binary, connect to it and fetch its schema.
    pub async fn launch(binary_path: &Path, options: LaunchOptions) -> Result<Self> {
        let (client, process) = protocol::launch(binary_path, options).await?;
        // On failure the process is dropped here, and kill_on_drop reaps it
        let mut provider = Self::connect(client).await?;
        provider.process = Some(process);
        Ok(provider)
    }
}

impl<R: ProviderRpc> Provider<R> {
    /// Fetch and translate the schema over an already-connected transport.
    pub async fn connect(rpc: R) -> Result<Self> {
        info!("Fetching provider schema (this may take a moment for large providers)...");
        let response = exchange(
            "GetSchema",
            rpc.get_schema(get_provider_schema::Request {}),
        )
        .await?;
        let schemas = ProviderSchemas::from_response(&response)?;
        Ok(Self {
            rpc,
            schemas,
            process: None,
        })
    }

    pub fn schemas(&self) -> &ProviderSchemas {
        &self.schemas
    }

    pub fn provider_schema(&self, kind: Kind) -> &ObjectType {
        self.schemas.provider(kind)
    }

    pub fn resource_schema(&self, type_name: &str, kind: Kind) -> Option<&ObjectType> {
        self.schemas.resource(type_name, kind)
    }

    pub fn data_source_schema(&self, type_name: &str, kind: Kind) -> Option<&ObjectType> {
        self.schemas.data_source(type_name, kind)
    }

    pub fn resource_types(&self) -> Vec<String> {
        self.schemas.resource_types()
    }

    pub fn data_source_types(&self) -> Vec<String> {
        self.schemas.data_source_types()
    }

    /// Validate, prepare and send the provider configuration.
    pub async fn configure(&self, config: &Value) -> Result<()> {
        let config = encode_config(&self.schemas.provider, config)?;

        let prepared = exchange(
            "PrepareProviderConfig",
            self.rpc
                .prepare_provider_config(prepare_provider_config::Request {
                    config: Some(config),
                }),
        )
        .await?;
        let prepared_config = prepared
            .prepared_config
            .filter(|dv| !dv.msgpack.is_empty() || !dv.json.is_empty())
            .ok_or_else(|| {
                ProviderError::decode("PrepareProviderConfig returned no prepared config")
            })?;

        exchange(
            "Configure",
            self.rpc.configure(configure::Request {
                terraform_version: CLIENT_VERSION.to_string(),
                config: Some(prepared_config),
            }),
        )
        .await?;
        info!("Provider configured successfully");
        Ok(())
    }

    /// Ask the provider to validate a data source config. Diagnostics are
    /// returned in the response rather than raised.
    pub async fn validate_data_source_config(
        &self,
        type_name: &str,
        config: &Value,
    ) -> Result<validate_data_source_config::Response> {
        let request = validate_data_source_config::Request {
            type_name: type_name.to_string(),
            config: Some(to_dynamic(config)?),
        };
        Ok(self.rpc.validate_data_source_config(request).await?)
    }

    /// Ask the provider to validate a resource config. Diagnostics are
    /// returned in the response rather than raised.
    pub async fn validate_resource_type_config(
        &self,
        type_name: &str,
        config: &Value,
    ) -> Result<validate_resource_type_config::Response> {
        let request = validate_resource_type_config::Request {
            type_name: type_name.to_string(),
            config: Some(to_dynamic(config)?),
        };
        Ok(self.rpc.validate_resource_type_config(request).await?)
    }

    pub async fn read_data_source(&self, type_name: &str, config: &Value) -> Result<Value> {
        let schema = self.data_source_schema_or_err(type_name, Kind::Args)?;
        let request = read_data_source::Request {
            type_name: type_name.to_string(),
            config: Some(encode_config(schema, config)?),
            provider_meta: self.provider_meta()?,
        };
        let response = exchange("ReadDataSource", self.rpc.read_data_source(request)).await?;
        expect_value("ReadDataSource", "state", response.state.as_ref())
    }

    pub async fn plan_resource_change(
        &self,
        type_name: &str,
        prior_state: &Value,
        proposed_new_state: &Value,
        options: ChangeOptions,
    ) -> Result<PlanResult> {
        let (proposed_new_state, config) =
            self.prepare_change(type_name, proposed_new_state, options.config.as_ref())?;
        let request = plan_resource_change::Request {
            type_name: type_name.to_string(),
            prior_state: Some(to_dynamic(prior_state)?),
            proposed_new_state: Some(proposed_new_state),
            config,
            prior_private: private_bytes(options.private.as_ref())?,
            provider_meta: self.provider_meta()?,
        };
        let response =
            exchange("PlanResourceChange", self.rpc.plan_resource_change(request)).await?;

        let planned_state = expect_value(
            "PlanResourceChange",
            "planned state",
            response.planned_state.as_ref(),
        )?;
        Ok(PlanResult {
            planned_state,
            planned_private: PrivateData::from_bytes(&response.planned_private)?,
            requires_replace: response.requires_replace,
        })
    }

    pub async fn apply_resource_change(
        &self,
        type_name: &str,
        prior_state: &Value,
        planned_state: &Value,
        options: ChangeOptions,
    ) -> Result<ApplyResult> {
        let (planned_state, config) =
            self.prepare_change(type_name, planned_state, options.config.as_ref())?;
        let request = apply_resource_change::Request {
            type_name: type_name.to_string(),
            prior_state: Some(to_dynamic(prior_state)?),
            planned_state: Some(planned_state),
            config,
            planned_private: private_bytes(options.private.as_ref())?,
            provider_meta: self.provider_meta()?,
        };
        let response =
            exchange("ApplyResourceChange", self.rpc.apply_resource_change(request)).await?;

        let new_state = expect_value(
            "ApplyResourceChange",
            "new state",
            response.new_state.as_ref(),
        )?;
        Ok(ApplyResult {
            new_state,
            private: PrivateData::from_bytes(&response.private)?,
        })
    }

    /// Refresh a resource. `Ok(None)` means the resource no longer exists.
    pub async fn read_resource(
        &self,
        type_name: &str,
        current_state: &Value,
        private: Option<&PrivateData>,
    ) -> Result<Option<Value>> {
        self.resource_schema_or_err(type_name, Kind::Attrs)?;
        let request = read_resource::Request {
            type_name: type_name.to_string(),
            current_state: Some(to_dynamic(current_state)?),
            private: private_bytes(private)?,
            provider_meta: self.provider_meta()?,
        };
        let response = exchange("ReadResource", self.rpc.read_resource(request)).await?;
        let new_state = from_dynamic(response.new_state.as_ref())?.filter(|v| !v.is_null());
        if new_state.is_none() {
            debug!("ReadResource for {} returned no state; resource is gone", type_name);
        }
        Ok(new_state)
    }

    pub async fn import_resource_state(
        &self,
        type_name: &str,
        id: &str,
    ) -> Result<Vec<ImportedResource>> {
        let request = import_resource_state::Request {
            type_name: type_name.to_string(),
            id: id.to_string(),
        };
        let response =
            exchange("ImportResourceState", self.rpc.import_resource_state(request)).await?;

        response
            .imported_resources
            .into_iter()
            .map(|imported| {
                if imported.type_name.is_empty() {
                    return Err(ProviderError::decode(
                        "ImportResourceState returned a resource without a type name",
                    ));
                }
                let state = from_dynamic(imported.state.as_ref())?.ok_or_else(|| {
                    ProviderError::decode(format!(
                        "ImportResourceState returned no state for {}",
                        imported.type_name
                    ))
                })?;
                Ok(ImportedResource {
                    state,
                    private: PrivateData::from_bytes(&imported.private)?,
                    type_name: imported.type_name,
                })
            })
            .collect()
    }

    /// Upgrade state written by an older schema version. The state is sent as
    /// legacy JSON raw state.
    pub async fn upgrade_resource_state(
        &self,
        type_name: &str,
        version: i64,
        state: &Value,
    ) -> Result<Value> {
        let request = upgrade_resource_state::Request {
            type_name: type_name.to_string(),
            version,
            raw_state: Some(to_raw_state(state)?),
        };
        let response =
            exchange("UpgradeResourceState", self.rpc.upgrade_resource_state(request)).await?;
        expect_value(
            "UpgradeResourceState",
            "upgraded state",
            response.upgraded_state.as_ref(),
        )
    }

    /// Stop the provider and terminate its process. Returns whether the
    /// process (or, without one, the provider) was stopped.
    pub async fn shutdown(&mut self, signal: Option<i32>) -> bool {
        let stopped = match self.rpc.stop(stop::Request {}).await {
            Ok(response) if response.error.is_empty() => true,
            Ok(response) => {
                debug!("Provider Stop reported: {}", response.error);
                false
            }
            Err(e) => {
                debug!("Provider Stop RPC failed: {}", e);
                false
            }
        };
        match self.process.as_mut() {
            Some(process) => process.terminate(signal).await,
            None => stopped,
        }
    }

    fn resource_schema_or_err(&self, type_name: &str, kind: Kind) -> Result<&ObjectType> {
        self.schemas
            .resource(type_name, kind)
            .ok_or_else(|| ProviderError::InvalidType {
                kind: "resource",
                type_name: type_name.to_string(),
            })
    }

    fn data_source_schema_or_err(&self, type_name: &str, kind: Kind) -> Result<&ObjectType> {
        self.schemas
            .data_source(type_name, kind)
            .ok_or_else(|| ProviderError::InvalidType {
                kind: "data source",
                type_name: type_name.to_string(),
            })
    }

    /// Shared front half of plan and apply: check the type, validate the
    /// caller-authored state and encode it, and encode the optional config.
    fn prepare_change(
        &self,
        type_name: &str,
        state: &Value,
        config: Option<&Value>,
    ) -> Result<(DynamicValue, Option<DynamicValue>)> {
        let state_schema = self.resource_schema_or_err(type_name, Kind::Attrs)?;
        // A null state is a destroy
        if !state.is_null() {
            state_schema.validate(state)?;
        }
        let config = match config {
            Some(config) => {
                let schema = self.resource_schema_or_err(type_name, Kind::Args)?;
                Some(encode_config(schema, config)?)
            }
            None => None,
        };
        Ok((to_dynamic(state)?, config))
    }

    /// provider_meta with every declared attribute null, when the provider has one.
    fn provider_meta(&self) -> Result<Option<DynamicValue>> {
        self.schemas
            .provider_meta
            .as_ref()
            .map(|meta| to_dynamic(&Value::Object(optionals_to_nulls(&Value::Null, meta))))
            .transpose()
    }
}

/// Responses that carry a diagnostics list.
trait HasDiagnostics {
    fn diagnostics(&self) -> &[Diagnostic];
}

macro_rules! impl_has_diagnostics {
    ($($response:ty),* $(,)?) => {
        $(
            impl HasDiagnostics for $response {
                fn diagnostics(&self) -> &[Diagnostic] {
                    &self.diagnostics
                }
            }
        )*
    };
}

impl_has_diagnostics!(
    get_provider_schema::Response,
    prepare_provider_config::Response,
    configure::Response,
    read_data_source::Response,
    plan_resource_change::Response,
    apply_resource_change::Response,
    read_resource::Response,
    import_resource_state::Response,
    upgrade_resource_state::Response,
);

/// Await one RPC and turn any diagnostics it carries into an error.
async fn exchange<T, F>(operation: &'static str, call: F) -> Result<T>
where
    T: HasDiagnostics,
    F: Future<Output = std::result::Result<T, Status>>,
{
    debug!("Sending {} RPC", operation);
    let response = call.await?;
    if !response.diagnostics().is_empty() {
        let diagnostics = diagnostics::collect(operation, response.diagnostics());
        return Err(DiagnosticError {
            operation,
            diagnostics,
        }
        .into());
    }
    Ok(response)
}

/// Validate a configuration object, fill in nulls for omitted attributes and pack it.
fn encode_config(schema: &ObjectType, config: &Value) -> Result<DynamicValue> {
    schema.validate(config)?;
    to_dynamic(&Value::Object(optionals_to_nulls(config, schema)))
}

fn expect_value(operation: &str, field: &str, dv: Option<&DynamicValue>) -> Result<Value> {
    from_dynamic(dv)?
        .ok_or_else(|| ProviderError::decode(format!("{} returned no {}", operation, field)))
}

fn private_bytes(private: Option<&PrivateData>) -> Result<Vec<u8>> {
    match private {
        Some(private) => private.to_bytes(),
        None => Ok(vec![]),
    }
}
