use async_trait::async_trait;
use tonic::transport::Channel;
use tonic::Status;

use super::tfplugin5::provider_client::ProviderClient;
use super::tfplugin5::{
    apply_resource_change, configure, get_provider_schema, import_resource_state,
    plan_resource_change, prepare_provider_config, read_data_source, read_resource, stop,
    upgrade_resource_state, validate_data_source_config, validate_resource_type_config,
};

/// One async method per protocol operation.
///
/// Implemented for the generated tonic client; tests substitute their own.
#[async_trait]
pub trait ProviderRpc: Send + Sync {
    async fn get_schema(
        &self,
        request: get_provider_schema::Request,
    ) -> Result<get_provider_schema::Response, Status>;

    async fn prepare_provider_config(
        &self,
        request: prepare_provider_config::Request,
    ) -> Result<prepare_provider_config::Response, Status>;

    async fn configure(&self, request: configure::Request)
        -> Result<configure::Response, Status>;

    async fn validate_resource_type_config(
        &self,
        request: validate_resource_type_config::Request,
    ) -> Result<validate_resource_type_config::Response, Status>;

    async fn validate_data_source_config(
        &self,
        request: validate_data_source_config::Request,
    ) -> Result<validate_data_source_config::Response, Status>;

    async fn upgrade_resource_state(
        &self,
        request: upgrade_resource_state::Request,
    ) -> Result<upgrade_resource_state::Response, Status>;

    async fn read_resource(
        &self,
        request: read_resource::Request,
    ) -> Result<read_resource::Response, Status>;

    async fn plan_resource_change(
        &self,
        request: plan_resource_change::Request,
    ) -> Result<plan_resource_change::Response, Status>;

    async fn apply_resource_change(
        &self,
        request: apply_resource_change::Request,
    ) -> Result<apply_resource_change::Response, Status>;

    async fn import_resource_state(
        &self,
        request: import_resource_state::Request,
    ) -> Result<import_resource_state::Response, Status>;

    async fn read_data_source(
        &self,
        request: read_data_source::Request,
    ) -> Result<read_data_source::Response, Status>;

    async fn stop(&self, request: stop::Request) -> Result<stop::Response, Status>;
}

// Clone is cheap: clones share the underlying HTTP/2 channel, so each call
// gets its own client and `&self` stays shareable across tasks. Calls go
// through the inherent methods by path; `client.get_schema(..)` would resolve
// to this trait's `&self` method first.
#[async_trait]
impl ProviderRpc for ProviderClient<Channel> {
    async fn get_schema(
        &self,
        request: get_provider_schema::Request,
    ) -> Result<get_provider_schema::Response, Status> {
        let mut client = self.clone();
        Ok(ProviderClient::get_schema(&mut client, request)
            .await?
            .into_inner())
    }

    async fn prepare_provider_config(
        &self,
        request: prepare_provider_config::Request,
    ) -> Result<prepare_provider_config::Response, Status> {
        let mut client = self.clone();
        Ok(ProviderClient::prepare_provider_config(&mut client, request)
            .await?
            .into_inner())
    }

    async fn configure(
        &self,
        request: configure::Request,
    ) -> Result<configure::Response, Status> {
        let mut client = self.clone();
        Ok(ProviderClient::configure(&mut client, request)
            .await?
            .into_inner())
    }

    async fn validate_resource_type_config(
        &self,
        request: validate_resource_type_config::Request,
    ) -> Result<validate_resource_type_config::Response, Status> {
        let mut client = self.clone();
        Ok(ProviderClient::validate_resource_type_config(&mut client, request)
            .await?
            .into_inner())
    }

    async fn validate_data_source_config(
        &self,
        request: validate_data_source_config::Request,
    ) -> Result<validate_data_source_config::Response, Status> {
        let mut client = self.clone();
        Ok(ProviderClient::validate_data_source_config(&mut client, request)
            .await?
            .into_inner())
    }

    async fn upgrade_resource_state(
        &self,
        request: upgrade_resource_state::Request,
    ) -> Result<upgrade_resource_state::Response, Status> {
        let mut client = self.clone();
        Ok(ProviderClient::upgrade_resource_state(&mut client, request)
            .await?
            .into_inner())
    }

    async fn read_resource(
        &self,
        request: read_resource::Request,
    ) -> Result<read_resource::Response, Status> {
        let mut client = self.clone();
        Ok(ProviderClient::read_resource(&mut client, request)
            .await?
            .into_inner())
    }

    async fn plan_resource_change(
        &self,
        request: plan_resource_change::Request,
    ) -> Result<plan_resource_change::Response, Status> {
        let mut client = self.clone();
        Ok(ProviderClient::plan_resource_change(&mut client, request)
            .await?
            .into_inner())
    }

    async fn apply_resource_change(
        &self,
        request: apply_resource_change::Request,
    ) -> Result<apply_resource_change::Response, Status> {
        let mut client = self.clone();
        Ok(ProviderClient::apply_resource_change(&mut client, request)
            .await?
            .into_inner())
    }

    async fn import_resource_state(
        &self,
        request: import_resource_state::Request,
    ) -> Result<import_resource_state::Response, Status> {
        let mut client = self.clone();
        Ok(ProviderClient::import_resource_state(&mut client, request)
            .await?
            .into_inner())
    }

    async fn read_data_source(
        &self,
        request: read_data_source::Request,
    ) -> Result<read_data_source::Response, Status> {
        let mut client = self.clone();
        Ok(ProviderClient::read_data_source(&mut client, request)
            .await?
            .into_inner())
    }

    async fn stop(&self, request: stop::Request) -> Result<stop::Response, Status> {
        let mut client = self.clone();
        Ok(ProviderClient::stop(&mut client, request)
            .await?
            .into_inner())
    }
}
