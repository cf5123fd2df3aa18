// Copyright (c) Microsoft. All rights reserved.

//! Wire types of the `Microsoft.MachineLearningServices/workspaces/datastores` resource.

pub const API_VERSION: &str = "2024-04-01";

pub mod request {
    /// Body of `PUT .../datastores/{name}`.
    #[derive(Debug, serde::Serialize)]
    pub struct DatastoreResource<'a> {
        pub properties: OneLakeDatastoreProperties<'a>,
    }

    #[derive(Debug, serde::Serialize)]
    #[serde(rename_all = "camelCase")]
    pub struct OneLakeDatastoreProperties<'a> {
        pub datastore_type: super::DatastoreType,
        pub description: &'a str,
        pub one_lake_workspace_name: &'a str,
        pub endpoint: &'a str,
        pub artifact: OneLakeArtifact<'a>,
        pub credentials: super::Credentials,
    }

    #[derive(Debug, serde::Serialize)]
    #[serde(rename_all = "camelCase")]
    pub struct OneLakeArtifact<'a> {
        pub artifact_type: crate::ArtifactType,
        pub artifact_name: &'a str,
    }

    impl<'a> From<&'a crate::Datastore> for DatastoreResource<'a> {
        fn from(datastore: &'a crate::Datastore) -> Self {
            DatastoreResource {
                properties: OneLakeDatastoreProperties {
                    datastore_type: super::DatastoreType::OneLake,
                    description: &datastore.description,
                    one_lake_workspace_name: &datastore.one_lake_workspace_name,
                    endpoint: &datastore.endpoint,
                    artifact: OneLakeArtifact {
                        artifact_type: datastore.artifact.kind,
                        artifact_name: &datastore.artifact.name,
                    },
                    credentials: super::Credentials::None,
                },
            }
        }
    }
}

pub mod response {
    #[derive(Debug, serde::Deserialize)]
    #[serde(rename_all = "camelCase")]
    pub struct DatastoreResource {
        /// The ARM resource id.
        pub id: String,
        pub name: String,
        #[serde(rename = "type")]
        pub resource_type: Option<String>,
        pub properties: DatastoreProperties,
    }

    #[derive(Debug, serde::Deserialize)]
    #[serde(rename_all = "camelCase")]
    pub struct DatastoreProperties {
        pub datastore_type: String,
        pub description: Option<String>,
        pub one_lake_workspace_name: Option<String>,
        pub endpoint: Option<String>,
        pub artifact: Option<OneLakeArtifact>,
        #[serde(default)]
        pub is_default: bool,
    }

    #[derive(Debug, serde::Deserialize)]
    #[serde(rename_all = "camelCase")]
    pub struct OneLakeArtifact {
        pub artifact_type: String,
        pub artifact_name: String,
    }

    /// Ref <https://github.com/Azure/azure-resource-manager-rpc/blob/master/v1.0/common-api-details.md#error-response-content>
    #[derive(Debug, serde::Deserialize)]
    pub struct ErrorResponse {
        pub error: ApiError,
    }

    #[derive(Clone, Debug, Default, serde::Deserialize)]
    pub struct ApiError {
        pub code: String,
        pub message: String,
    }

    impl std::fmt::Display for ApiError {
        fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
            if self.code.is_empty() {
                f.write_str(&self.message)
            } else {
                write!(f, "{}: {}", self.code, self.message)
            }
        }
    }
}

#[derive(Clone, Copy, Debug, serde::Serialize)]
pub enum DatastoreType {
    OneLake,
}

#[derive(Clone, Copy, Debug, serde::Serialize)]
#[serde(tag = "credentialsType")]
pub enum Credentials {
    /// Identity-based access: jobs reach the data with their own identity.
    None,
}
