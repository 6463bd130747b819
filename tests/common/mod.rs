#![allow(dead_code)]

use std::sync::{Arc, Mutex};

use async_trait::async_trait;
use serde_json::Value;
use tonic::Status;

use tfprovider::provider::codec::to_dynamic;
use tfprovider::provider::rpc::ProviderRpc;
use tfprovider::provider::tfplugin5::schema::nested_block::NestingMode;
use tfprovider::provider::tfplugin5::schema::{Attribute, Block, NestedBlock};
use tfprovider::provider::tfplugin5::{
    apply_resource_change, configure, diagnostic, get_provider_schema, import_resource_state,
    plan_resource_change, prepare_provider_config, read_data_source, read_resource, stop,
    upgrade_resource_state, validate_data_source_config, validate_resource_type_config,
    Diagnostic, DynamicValue, Schema,
};

// ─── Schema builders ─────────────────────────────────────────────────────────

pub fn attr(name: &str, ty: Value, required: bool, optional: bool, computed: bool) -> Attribute {
    Attribute {
        name: name.to_string(),
        r#type: serde_json::to_vec(&ty).unwrap(),
        required,
        optional,
        computed,
        ..Default::default()
    }
}

pub fn required(name: &str, ty: Value) -> Attribute {
    attr(name, ty, true, false, false)
}

pub fn optional(name: &str, ty: Value) -> Attribute {
    attr(name, ty, false, true, false)
}

pub fn computed(name: &str, ty: Value) -> Attribute {
    attr(name, ty, false, false, true)
}

pub fn nested(
    name: &str,
    mode: NestingMode,
    min_items: i64,
    max_items: i64,
    block: Block,
) -> NestedBlock {
    NestedBlock {
        type_name: name.to_string(),
        block: Some(block),
        nesting: mode as i32,
        min_items,
        max_items,
    }
}

pub fn block(attributes: Vec<Attribute>, block_types: Vec<NestedBlock>) -> Block {
    Block {
        attributes,
        block_types,
        ..Default::default()
    }
}

pub fn schema(version: i64, block: Block) -> Schema {
    Schema {
        version,
        block: Some(block),
    }
}

/// A small provider: config `{region (required), profile (optional)}`, a
/// `widget` resource with a nested `rule` list block, and a `lookup` data source.
pub fn widget_provider_schema() -> get_provider_schema::Response {
    let provider = block(
        vec![
            required("region", serde_json::json!("string")),
            optional("profile", serde_json::json!("string")),
        ],
        vec![],
    );

    let rule = block(
        vec![
            required("port", serde_json::json!("number")),
            optional("description", serde_json::json!("string")),
        ],
        vec![],
    );
    let widget = block(
        vec![
            computed("id", serde_json::json!("string")),
            required("name", serde_json::json!("string")),
            optional("size", serde_json::json!("number")),
            optional("tags", serde_json::json!(["map", "string"])),
        ],
        vec![nested("rule", NestingMode::List, 0, 0, rule)],
    );

    let lookup = block(
        vec![
            required("query", serde_json::json!("string")),
            computed("result", serde_json::json!("string")),
        ],
        vec![],
    );

    let mut response = get_provider_schema::Response {
        provider: Some(schema(0, provider)),
        ..Default::default()
    };
    response
        .resource_schemas
        .insert("widget".to_string(), schema(2, widget));
    response
        .data_source_schemas
        .insert("lookup".to_string(), schema(0, lookup));
    response
}

pub fn dynamic(value: Value) -> DynamicValue {
    to_dynamic(&value).unwrap()
}

pub fn error_diagnostic(summary: &str) -> Diagnostic {
    Diagnostic {
        severity: diagnostic::Severity::Error as i32,
        summary: summary.to_string(),
        detail: String::new(),
        attribute: None,
    }
}

// ─── Mock transport ──────────────────────────────────────────────────────────

/// Every request the mock received, in order.
#[derive(Debug, Clone)]
pub enum Recorded {
    GetSchema,
    PrepareProviderConfig(prepare_provider_config::Request),
    Configure(configure::Request),
    ValidateResourceTypeConfig(validate_resource_type_config::Request),
    ValidateDataSourceConfig(validate_data_source_config::Request),
    UpgradeResourceState(upgrade_resource_state::Request),
    ReadResource(read_resource::Request),
    PlanResourceChange(plan_resource_change::Request),
    ApplyResourceChange(apply_resource_change::Request),
    ImportResourceState(import_resource_state::Request),
    ReadDataSource(read_data_source::Request),
    Stop,
}

/// Canned responses plus a request log, shared between a test and its mock.
#[derive(Default)]
pub struct MockState {
    pub schema: Mutex<get_provider_schema::Response>,
    pub prepare: Mutex<prepare_provider_config::Response>,
    pub configure: Mutex<configure::Response>,
    pub validate_resource: Mutex<validate_resource_type_config::Response>,
    pub validate_data_source: Mutex<validate_data_source_config::Response>,
    pub upgrade: Mutex<upgrade_resource_state::Response>,
    pub read_resource: Mutex<read_resource::Response>,
    pub plan: Mutex<plan_resource_change::Response>,
    pub apply: Mutex<apply_resource_change::Response>,
    pub import: Mutex<import_resource_state::Response>,
    pub read_data_source: Mutex<read_data_source::Response>,
    pub fail_with: Mutex<Option<Status>>,
    pub requests: Mutex<Vec<Recorded>>,
}

impl MockState {
    pub fn with_schema(schema: get_provider_schema::Response) -> Arc<Self> {
        let state = MockState::default();
        *state.schema.lock().unwrap() = schema;
        Arc::new(state)
    }

    pub fn requests(&self) -> Vec<Recorded> {
        self.requests.lock().unwrap().clone()
    }

    /// Requests after the initial GetSchema.
    pub fn calls_after_schema(&self) -> Vec<Recorded> {
        self.requests()
            .into_iter()
            .filter(|r| !matches!(r, Recorded::GetSchema))
            .collect()
    }
}

#[derive(Clone)]
pub struct MockRpc(pub Arc<MockState>);

impl MockRpc {
    fn record<T: Clone>(&self, request: Recorded, response: &Mutex<T>) -> Result<T, Status> {
        self.0.requests.lock().unwrap().push(request);
        if let Some(status) = self.0.fail_with.lock().unwrap().clone() {
            return Err(status);
        }
        Ok(response.lock().unwrap().clone())
    }
}

#[async_trait]
impl ProviderRpc for MockRpc {
    async fn get_schema(
        &self,
        _request: get_provider_schema::Request,
    ) -> Result<get_provider_schema::Response, Status> {
        self.0.requests.lock().unwrap().push(Recorded::GetSchema);
        Ok(self.0.schema.lock().unwrap().clone())
    }

    async fn prepare_provider_config(
        &self,
        request: prepare_provider_config::Request,
    ) -> Result<prepare_provider_config::Response, Status> {
        self.record(Recorded::PrepareProviderConfig(request), &self.0.prepare)
    }

    async fn configure(
        &self,
        request: configure::Request,
    ) -> Result<configure::Response, Status> {
        self.record(Recorded::Configure(request), &self.0.configure)
    }

    async fn validate_resource_type_config(
        &self,
        request: validate_resource_type_config::Request,
    ) -> Result<validate_resource_type_config::Response, Status> {
        self.record(
            Recorded::ValidateResourceTypeConfig(request),
            &self.0.validate_resource,
        )
    }

    async fn validate_data_source_config(
        &self,
        request: validate_data_source_config::Request,
    ) -> Result<validate_data_source_config::Response, Status> {
        self.record(
            Recorded::ValidateDataSourceConfig(request),
            &self.0.validate_data_source,
        )
    }

    async fn upgrade_resource_state(
        &self,
        request: upgrade_resource_state::Request,
    ) -> Result<upgrade_resource_state::Response, Status> {
        self.record(Recorded::UpgradeResourceState(request), &self.0.upgrade)
    }

    async fn read_resource(
        &self,
        request: read_resource::Request,
    ) -> Result<read_resource::Response, Status> {
        self.record(Recorded::ReadResource(request), &self.0.read_resource)
    }

    async fn plan_resource_change(
        &self,
        request: plan_resource_change::Request,
    ) -> Result<plan_resource_change::Response, Status> {
        self.record(Recorded::PlanResourceChange(request), &self.0.plan)
    }

    async fn apply_resource_change(
        &self,
        request: apply_resource_change::Request,
    ) -> Result<apply_resource_change::Response, Status> {
        self.record(Recorded::ApplyResourceChange(request), &self.0.apply)
    }

    async fn import_resource_state(
        &self,
        request: import_resource_state::Request,
    ) -> Result<import_resource_state::Response, Status> {
        self.record(Recorded::ImportResourceState(request), &self.0.import)
    }

    async fn read_data_source(
        &self,
        request: read_data_source::Request,
    ) -> Result<read_data_source::Response, Status> {
        self.record(Recorded::ReadDataSource(request), &self.0.read_data_source)
    }

    async fn stop(&self, _request: stop::Request) -> Result<stop::Response, Status> {
        self.0.requests.lock().unwrap().push(Recorded::Stop);
        Ok(stop::Response::default())
    }
}
