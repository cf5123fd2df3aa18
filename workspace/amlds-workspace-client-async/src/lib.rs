// Copyright (c) Microsoft. All rights reserved.

#![deny(rust_2018_idioms)]
#![warn(clippy::all, clippy::pedantic)]
#![allow(clippy::missing_errors_doc, clippy::module_name_repetitions)]

mod error;
pub use error::Error;

use amlds_workspace_common::schema::{self, request, response};
use amlds_workspace_common::{Datastore, WorkspaceScope};

pub const DEFAULT_RESOURCE_MANAGER_ENDPOINT: &str = "https://management.azure.com";

const REQUEST_TIMEOUT: std::time::Duration = std::time::Duration::from_secs(30);

/// An authenticated handle to one Azure Machine Learning workspace.
pub struct Client {
    scope: WorkspaceScope,
    token: amlds_credential::AccessToken,
    resource_manager: url::Url,
    connector: http_common::CloudConnector,

    retries: u32,
}

impl Client {
    /// Acquires a management plane token from `credential` for the workspace identified by `scope`.
    ///
    /// Only the credential is checked here; whether the workspace exists is only known once a
    /// request is made against it.
    pub async fn connect(
        credential: &dyn amlds_credential::TokenCredential,
        scope: WorkspaceScope,
        resource_manager: url::Url,
        connector: http_common::CloudConnector,
    ) -> Result<Self, Error> {
        for (name, value) in [
            ("subscription_id", &scope.subscription_id),
            ("resource_group_name", &scope.resource_group_name),
            ("workspace_name", &scope.workspace_name),
        ] {
            if value.is_empty() {
                return Err(Error::InvalidParameter(name, "must not be empty".into()));
            }
        }

        let token_scope = format!(
            "{}/.default",
            resource_manager.as_str().trim_end_matches('/')
        );
        let token = credential
            .get_token(&token_scope)
            .await
            .map_err(|err| Error::Authentication(Box::new(err)))?;

        Ok(Client {
            scope,
            token,
            resource_manager,
            connector,
            retries: 0,
        })
    }

    /// Retries each request up to `retries` more times if the connection to the resource manager
    /// fails. Throttled requests are always retried.
    #[must_use]
    pub fn with_retry(mut self, retries: u32) -> Self {
        self.retries = retries;

        self
    }

    pub fn scope(&self) -> &WorkspaceScope {
        &self.scope
    }

    /// Creates the datastore, or replaces the datastore of the same name.
    pub async fn create_or_update_datastore(
        &self,
        datastore: &Datastore,
    ) -> Result<response::DatastoreResource, Error> {
        if datastore.name.is_empty() {
            return Err(Error::InvalidParameter("name", "must not be empty".into()));
        }

        let uri = self.datastore_uri(&datastore.name);
        let body = request::DatastoreResource::from(datastore);

        let mut request = http_common::HttpRequest::put(self.connector.clone(), &uri, &body)
            .map_err(Error::Request)?
            .with_retry(self.retries)
            .with_timeout(REQUEST_TIMEOUT);
        request
            .add_header(
                hyper::header::AUTHORIZATION,
                &format!("Bearer {}", self.token.token),
            )
            .map_err(Error::Request)?;

        log::info!(
            "Registering datastore {} ({} artifact {}) in workspace {}/{}",
            datastore.name,
            datastore.artifact.kind,
            datastore.artifact.name,
            self.scope.resource_group_name,
            self.scope.workspace_name,
        );

        let response = request.response().await.map_err(Error::Request)?;
        let (status, body) = response.into_parts();

        match status {
            hyper::StatusCode::OK | hyper::StatusCode::CREATED => {
                let resource: response::DatastoreResource = serde_json::from_slice(&body)
                    .map_err(|err| {
                        Error::Request(std::io::Error::new(std::io::ErrorKind::InvalidData, err))
                    })?;

                Ok(resource)
            }

            status => {
                let error = serde_json::from_slice::<response::ErrorResponse>(&body)
                    .map(|response| response.error)
                    .unwrap_or_else(|_| response::ApiError {
                        code: String::new(),
                        message: if body.is_empty() {
                            status
                                .canonical_reason()
                                .unwrap_or("unexpected response")
                                .to_owned()
                        } else {
                            String::from_utf8_lossy(&body).into_owned()
                        },
                    });

                Err(Error::from_status(status, error))
            }
        }
    }

    fn datastore_uri(&self, name: &str) -> String {
        format!(
            "{}/subscriptions/{}/resourceGroups/{}/providers/Microsoft.MachineLearningServices/workspaces/{}/datastores/{}?api-version={}",
            self.resource_manager.as_str().trim_end_matches('/'),
            http_common::encode_path_segment(&self.scope.subscription_id),
            http_common::encode_path_segment(&self.scope.resource_group_name),
            http_common::encode_path_segment(&self.scope.workspace_name),
            http_common::encode_path_segment(name),
            schema::API_VERSION,
        )
    }
}
