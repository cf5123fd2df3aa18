// Copyright (c) Microsoft. All rights reserved.

use std::io::ErrorKind;

use crate::{AccessToken, Error};

const CLIENT_ID_ENV_VAR: &str = "AZURE_CLIENT_ID";
const IDENTITY_ENDPOINT_ENV_VAR: &str = "IDENTITY_ENDPOINT";
const IDENTITY_HEADER_ENV_VAR: &str = "IDENTITY_HEADER";
const IMDS_HOST_ENV_VAR: &str = "AZURE_POD_IDENTITY_AUTHORITY_HOST";

const DEFAULT_IMDS_HOST: &str = "http://169.254.169.254";
const IMDS_TOKEN_PATH: &str = "/metadata/identity/oauth2/token";
const IMDS_API_VERSION: &str = "2018-02-01";
const APP_SERVICE_API_VERSION: &str = "2019-08-01";

/// IMDS is link-local; if nothing answers quickly, there is no managed identity.
const IMDS_TIMEOUT: std::time::Duration = std::time::Duration::from_secs(3);

enum Source {
    /// App Service, Functions, Container Apps and Azure ML compute.
    AppService { endpoint: url::Url, header: String },

    /// The instance metadata service of VMs and scale sets.
    Imds { endpoint: url::Url },
}

/// The managed identity assigned to the machine this process runs on.
pub struct ManagedIdentityCredential {
    source: Source,
    client_id: Option<String>,
    connector: http_common::CloudConnector,
}

impl ManagedIdentityCredential {
    pub const NAME: &'static str = "managed identity";

    /// Uses the App Service endpoint if `IDENTITY_ENDPOINT` and `IDENTITY_HEADER` are set,
    /// otherwise IMDS. `AZURE_CLIENT_ID` selects a user-assigned identity.
    pub(crate) fn from_vars(
        var: impl Fn(&str) -> Option<String>,
        connector: http_common::CloudConnector,
    ) -> Result<Self, Error> {
        let client_id = crate::non_empty_var(&var, CLIENT_ID_ENV_VAR);

        let source = match (
            crate::non_empty_var(&var, IDENTITY_ENDPOINT_ENV_VAR),
            crate::non_empty_var(&var, IDENTITY_HEADER_ENV_VAR),
        ) {
            (Some(endpoint), Some(header)) => {
                let endpoint = url::Url::parse(&endpoint).map_err(|err| {
                    Error::InvalidEnvironment(IDENTITY_ENDPOINT_ENV_VAR, Box::new(err))
                })?;

                Source::AppService { endpoint, header }
            }

            _ => {
                let host = crate::non_empty_var(&var, IMDS_HOST_ENV_VAR)
                    .unwrap_or_else(|| DEFAULT_IMDS_HOST.to_owned());
                let endpoint = url::Url::parse(&host)
                    .and_then(|host| host.join(IMDS_TOKEN_PATH))
                    .map_err(|err| Error::InvalidEnvironment(IMDS_HOST_ENV_VAR, Box::new(err)))?;

                Source::Imds { endpoint }
            }
        };

        Ok(ManagedIdentityCredential {
            source,
            client_id,
            connector,
        })
    }

    fn request(&self, resource: &str) -> Result<http_common::HttpRequest<http_common::CloudConnector>, Error> {
        let (mut uri, api_version) = match &self.source {
            Source::AppService { endpoint, .. } => (endpoint.clone(), APP_SERVICE_API_VERSION),
            Source::Imds { endpoint } => (endpoint.clone(), IMDS_API_VERSION),
        };

        {
            let mut query = uri.query_pairs_mut();
            query
                .append_pair("api-version", api_version)
                .append_pair("resource", resource);
            if let Some(client_id) = &self.client_id {
                query.append_pair("client_id", client_id);
            }
        }

        let mut request = http_common::HttpRequest::get(self.connector.clone(), uri.as_str());

        match &self.source {
            Source::AppService { header, .. } => request
                .add_header(hyper::header::HeaderName::from_static("x-identity-header"), header)
                .map_err(|err| Error::InvalidEnvironment(IDENTITY_HEADER_ENV_VAR, Box::new(err)))?,

            Source::Imds { .. } => {
                request
                    .add_header(hyper::header::HeaderName::from_static("metadata"), "true")
                    .map_err(Error::Request)?;
                request = request.with_timeout(IMDS_TIMEOUT);
            }
        }

        Ok(request)
    }
}

#[async_trait::async_trait]
impl crate::TokenCredential for ManagedIdentityCredential {
    async fn get_token(&self, scope: &str) -> Result<AccessToken, Error> {
        let request = self.request(crate::scope_to_resource(scope))?;

        let response = match request.json_response().await {
            Ok(response) => response,

            Err(err)
                if matches!(self.source, Source::Imds { .. })
                    && matches!(err.kind(), ErrorKind::NotConnected | ErrorKind::TimedOut) =>
            {
                return Err(Error::Unavailable(
                    format!("instance metadata service is unreachable: {}", err).into(),
                ));
            }

            Err(err) => return Err(Error::Request(err)),
        };

        let token: crate::schema::ManagedIdentityToken =
            crate::schema::parse_token_response(response)?;

        Ok(AccessToken {
            token: token.access_token,
            expires_on: token.expires_on,
        })
    }
}

#[cfg(test)]
mod tests {
    use test_common::{MockResponse, MockServer};

    use crate::{Error, TokenCredential};

    fn token_response() -> MockResponse {
        MockResponse::json(
            hyper::StatusCode::OK,
            serde_json::json!({
                "access_token": "mi-token",
                "expires_on": "1700000000",
                "resource": "https://management.azure.com",
                "token_type": "Bearer",
            }),
        )
    }

    fn credential(vars: &[(&str, String)]) -> super::ManagedIdentityCredential {
        credential_with_connector(vars, http_common::cloud_connector(None).unwrap())
    }

    fn credential_with_connector(
        vars: &[(&str, String)],
        connector: http_common::CloudConnector,
    ) -> super::ManagedIdentityCredential {
        let vars: std::collections::HashMap<String, String> = vars
            .iter()
            .map(|(name, value)| ((*name).to_owned(), value.clone()))
            .collect();

        super::ManagedIdentityCredential::from_vars(|name| vars.get(name).cloned(), connector)
            .unwrap()
    }

    #[tokio::test]
    async fn imds() {
        let server = MockServer::start(|_| token_response()).await;

        let credential = credential(&[("AZURE_POD_IDENTITY_AUTHORITY_HOST", server.base_uri())]);
        let token = credential
            .get_token("https://management.azure.com/.default")
            .await
            .unwrap();
        assert_eq!("mi-token", token.token);
        assert_eq!(1_700_000_000, token.expires_on.unwrap().timestamp());

        let requests = server.requests();
        assert_eq!(1, requests.len());
        assert_eq!(hyper::Method::GET, requests[0].method);
        assert_eq!("/metadata/identity/oauth2/token", requests[0].path());
        assert_eq!(Some("2018-02-01"), requests[0].query_param("api-version"));
        assert_eq!(
            Some("https%3A%2F%2Fmanagement.azure.com"),
            requests[0].query_param("resource")
        );
        assert_eq!(None, requests[0].query_param("client_id"));
        assert_eq!("true", requests[0].headers["metadata"]);
    }

    #[tokio::test]
    async fn imds_is_not_proxied() {
        let proxy_server =
            MockServer::start(|_| MockResponse::text(hyper::StatusCode::BAD_GATEWAY, "")).await;
        let server = MockServer::start(|_| token_response()).await;

        let proxy = http_common::ProxyConfig::new(proxy_server.base_uri().parse().unwrap());
        let connector = http_common::cloud_connector(Some(proxy)).unwrap();

        let credential = credential_with_connector(
            &[("AZURE_POD_IDENTITY_AUTHORITY_HOST", server.base_uri())],
            connector,
        );
        let token = credential
            .get_token("https://management.azure.com/.default")
            .await
            .unwrap();
        assert_eq!("mi-token", token.token);

        assert_eq!(1, server.requests().len());
        assert!(proxy_server.requests().is_empty());
    }

    #[tokio::test]
    async fn app_service_with_user_assigned_identity() {
        let server = MockServer::start(|_| token_response()).await;

        let credential = credential(&[
            ("IDENTITY_ENDPOINT", server.uri("/msi/token")),
            ("IDENTITY_HEADER", "header-secret".to_owned()),
            ("AZURE_CLIENT_ID", "user-assigned".to_owned()),
        ]);
        let token = credential
            .get_token("https://management.azure.com/.default")
            .await
            .unwrap();
        assert_eq!("mi-token", token.token);

        let requests = server.requests();
        assert_eq!("/msi/token", requests[0].path());
        assert_eq!(Some("2019-08-01"), requests[0].query_param("api-version"));
        assert_eq!(Some("user-assigned"), requests[0].query_param("client_id"));
        assert_eq!("header-secret", requests[0].headers["x-identity-header"]);
        assert!(!requests[0].headers.contains_key("metadata"));
    }

    #[tokio::test]
    async fn no_identity_assigned() {
        let server = MockServer::start(|_| {
            MockResponse::json(
                hyper::StatusCode::BAD_REQUEST,
                serde_json::json!({
                    "error": "invalid_request",
                    "error_description": "Identity not found",
                }),
            )
        })
        .await;

        let credential = credential(&[("AZURE_POD_IDENTITY_AUTHORITY_HOST", server.base_uri())]);
        let err = credential
            .get_token("https://management.azure.com/.default")
            .await
            .unwrap_err();
        assert!(
            matches!(&err, Error::Rejected { status, message } if *status == hyper::StatusCode::BAD_REQUEST && message == "invalid_request: Identity not found"),
            "{err:?}"
        );
    }

    #[tokio::test]
    async fn imds_unreachable() {
        let addr = {
            let listener = std::net::TcpListener::bind("127.0.0.1:0").unwrap();
            listener.local_addr().unwrap()
        };

        let credential = credential(&[("AZURE_POD_IDENTITY_AUTHORITY_HOST", format!("http://{addr}"))]);
        let err = credential
            .get_token("https://management.azure.com/.default")
            .await
            .unwrap_err();
        assert!(matches!(err, Error::Unavailable(_)), "{err:?}");
    }
}
