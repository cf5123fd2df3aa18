// Copyright (c) Microsoft. All rights reserved.

use amlds_workspace_client_async::Error as ClientError;
use amlds_workspace_common::schema::response::DatastoreResource;
use amlds_workspace_common::{Datastore, WorkspaceScope};

use crate::error::{Error, ErrorKind};

const RESOURCE_MANAGER_ENDPOINT_ENV_VAR: &str = "AMLDS_RESOURCE_MANAGER_ENDPOINT";

/// Connection retries for the registration request. The PUT replaces the datastore wholesale, so
/// sending it twice is harmless.
const REGISTRATION_RETRIES: u32 = 2;

#[async_trait::async_trait]
pub(crate) trait WorkspaceFactory {
    type Registrar: DatastoreRegistrar;

    async fn connect(&self, scope: WorkspaceScope) -> Result<Self::Registrar, ClientError>;
}

#[async_trait::async_trait]
pub(crate) trait DatastoreRegistrar {
    async fn create_or_update_datastore(
        &self,
        datastore: &Datastore,
    ) -> Result<DatastoreResource, ClientError>;
}

#[async_trait::async_trait]
impl DatastoreRegistrar for amlds_workspace_client_async::Client {
    async fn create_or_update_datastore(
        &self,
        datastore: &Datastore,
    ) -> Result<DatastoreResource, ClientError> {
        amlds_workspace_client_async::Client::create_or_update_datastore(self, datastore).await
    }
}

/// Connects with the ambient credential chain, through the HTTPS proxy if one is configured.
pub(crate) struct CloudWorkspaceFactory {
    resource_manager: url::Url,
}

impl CloudWorkspaceFactory {
    pub(crate) fn from_env() -> Result<Self, ClientError> {
        let resource_manager = std::env::var(RESOURCE_MANAGER_ENDPOINT_ENV_VAR)
            .ok()
            .filter(|value| !value.is_empty());
        let resource_manager = resource_manager.as_deref().unwrap_or(
            amlds_workspace_client_async::DEFAULT_RESOURCE_MANAGER_ENDPOINT,
        );
        let resource_manager = url::Url::parse(resource_manager).map_err(|err| {
            ClientError::InvalidParameter(RESOURCE_MANAGER_ENDPOINT_ENV_VAR, err.to_string().into())
        })?;

        Ok(CloudWorkspaceFactory { resource_manager })
    }
}

#[async_trait::async_trait]
impl WorkspaceFactory for CloudWorkspaceFactory {
    type Registrar = amlds_workspace_client_async::Client;

    async fn connect(&self, scope: WorkspaceScope) -> Result<Self::Registrar, ClientError> {
        let proxy = http_common::ProxyConfig::from_env().map_err(ClientError::Request)?;
        let connector = http_common::cloud_connector(proxy).map_err(ClientError::Request)?;

        let credential = amlds_credential::DefaultCredential::new(&connector)
            .map_err(|err| ClientError::Authentication(Box::new(err)))?;
        log::debug!(
            "Credential sources: {}",
            credential.source_names().collect::<Vec<_>>().join(", ")
        );

        let client = amlds_workspace_client_async::Client::connect(
            &credential,
            scope,
            self.resource_manager.clone(),
            connector,
        )
        .await?
        .with_retry(REGISTRATION_RETRIES);

        Ok(client)
    }
}

/// Reads the DataOps config under `options.config_path_root_dir`, then registers the datastore
/// it describes in the workspace named by `options`.
pub(crate) async fn run<TFactory>(
    options: crate::Options,
    cwd: &std::path::Path,
    factory: &TFactory,
) -> Result<DatastoreResource, Error>
where
    TFactory: WorkspaceFactory + Sync,
{
    let config_path = crate::config::config_path(cwd, &options.config_path_root_dir);
    log::info!("Reading DataOps config from {}", config_path.display());

    let config: crate::config::DataOpsConfig =
        config_common::read_config(&config_path).map_err(ErrorKind::ReadConfig)?;

    let scope = WorkspaceScope {
        subscription_id: options.subscription_id,
        resource_group_name: options.resource_group_name,
        workspace_name: options.workspace_name,
    };
    let registrar = factory.connect(scope).await.map_err(ErrorKind::Connect)?;

    let datastore = config.into_datastore();
    let resource = registrar
        .create_or_update_datastore(&datastore)
        .await
        .map_err(|err| ErrorKind::RegisterDatastore(datastore.name.clone(), err))?;

    Ok(resource)
}
