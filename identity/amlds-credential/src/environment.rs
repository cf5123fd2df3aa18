// Copyright (c) Microsoft. All rights reserved.

use crate::{AccessToken, Error};

const TENANT_ID_ENV_VAR: &str = "AZURE_TENANT_ID";
const CLIENT_ID_ENV_VAR: &str = "AZURE_CLIENT_ID";
const CLIENT_SECRET_ENV_VAR: &str = "AZURE_CLIENT_SECRET";
const AUTHORITY_HOST_ENV_VAR: &str = "AZURE_AUTHORITY_HOST";

const DEFAULT_AUTHORITY_HOST: &str = "https://login.microsoftonline.com";

/// A service principal whose client secret is in the environment.
pub struct EnvironmentCredential {
    tenant_id: String,
    client_id: String,
    client_secret: String,
    authority_host: url::Url,
    connector: http_common::CloudConnector,
}

impl EnvironmentCredential {
    pub const NAME: &'static str = "environment";

    #[must_use]
    pub fn new(
        tenant_id: String,
        client_id: String,
        client_secret: String,
        authority_host: url::Url,
        connector: http_common::CloudConnector,
    ) -> Self {
        EnvironmentCredential {
            tenant_id,
            client_id,
            client_secret,
            authority_host,
            connector,
        }
    }

    /// Reads `AZURE_TENANT_ID`, `AZURE_CLIENT_ID`, `AZURE_CLIENT_SECRET` and, optionally,
    /// `AZURE_AUTHORITY_HOST`.
    pub(crate) fn from_vars(
        var: impl Fn(&str) -> Option<String>,
        connector: http_common::CloudConnector,
    ) -> Result<Self, Error> {
        let (tenant_id, client_id, client_secret) = match (
            crate::non_empty_var(&var, TENANT_ID_ENV_VAR),
            crate::non_empty_var(&var, CLIENT_ID_ENV_VAR),
            crate::non_empty_var(&var, CLIENT_SECRET_ENV_VAR),
        ) {
            (Some(tenant_id), Some(client_id), Some(client_secret)) => {
                (tenant_id, client_id, client_secret)
            }
            _ => {
                return Err(Error::Unavailable(
                    format!(
                        "{}, {} and {} must all be set",
                        TENANT_ID_ENV_VAR, CLIENT_ID_ENV_VAR, CLIENT_SECRET_ENV_VAR
                    )
                    .into(),
                ))
            }
        };

        let authority_host = crate::non_empty_var(&var, AUTHORITY_HOST_ENV_VAR)
            .unwrap_or_else(|| DEFAULT_AUTHORITY_HOST.to_owned());
        let authority_host = url::Url::parse(&authority_host)
            .map_err(|err| Error::InvalidEnvironment(AUTHORITY_HOST_ENV_VAR, Box::new(err)))?;

        Ok(EnvironmentCredential::new(
            tenant_id,
            client_id,
            client_secret,
            authority_host,
            connector,
        ))
    }

    fn token_uri(&self) -> String {
        format!(
            "{}/{}/oauth2/v2.0/token",
            self.authority_host.as_str().trim_end_matches('/'),
            http_common::encode_path_segment(&self.tenant_id),
        )
    }
}

#[async_trait::async_trait]
impl crate::TokenCredential for EnvironmentCredential {
    async fn get_token(&self, scope: &str) -> Result<AccessToken, Error> {
        let request = http_common::HttpRequest::post_form(
            self.connector.clone(),
            &self.token_uri(),
            &[
                ("grant_type", "client_credentials"),
                ("client_id", self.client_id.as_str()),
                ("client_secret", self.client_secret.as_str()),
                ("scope", scope),
            ],
        );

        let response = request.json_response().await.map_err(Error::Request)?;
        let token: crate::schema::ClientCredentialsToken =
            crate::schema::parse_token_response(response)?;

        let expires_on = token
            .expires_in
            .map(|expires_in| chrono::Utc::now() + chrono::Duration::seconds(expires_in));

        Ok(AccessToken {
            token: token.access_token,
            expires_on,
        })
    }
}

#[cfg(test)]
mod tests {
    use test_common::{MockResponse, MockServer};

    use crate::{Error, TokenCredential};

    fn credential(authority_host: &str) -> super::EnvironmentCredential {
        super::EnvironmentCredential::new(
            "my-tenant".to_owned(),
            "my-client".to_owned(),
            "my secret&".to_owned(),
            url::Url::parse(authority_host).unwrap(),
            http_common::cloud_connector(None).unwrap(),
        )
    }

    #[tokio::test]
    async fn client_credentials_grant() {
        let server = MockServer::start(|_| {
            MockResponse::json(
                hyper::StatusCode::OK,
                serde_json::json!({
                    "token_type": "Bearer",
                    "expires_in": 3599,
                    "ext_expires_in": 3599,
                    "access_token": "token-1",
                }),
            )
        })
        .await;

        let token = credential(&server.base_uri())
            .get_token("https://management.azure.com/.default")
            .await
            .unwrap();
        assert_eq!("token-1", token.token);
        assert!(token.expires_on.unwrap() > chrono::Utc::now());

        let requests = server.requests();
        assert_eq!(1, requests.len());
        assert_eq!(hyper::Method::POST, requests[0].method);
        assert_eq!("/my-tenant/oauth2/v2.0/token", requests[0].path());

        let form: Vec<(String, String)> =
            url::form_urlencoded::parse(requests[0].body.as_deref().unwrap().as_bytes())
                .into_owned()
                .collect();
        assert_eq!(
            vec![
                ("grant_type".to_owned(), "client_credentials".to_owned()),
                ("client_id".to_owned(), "my-client".to_owned()),
                ("client_secret".to_owned(), "my secret&".to_owned()),
                (
                    "scope".to_owned(),
                    "https://management.azure.com/.default".to_owned()
                ),
            ],
            form
        );
    }

    #[tokio::test]
    async fn rejected_secret() {
        let server = MockServer::start(|_| {
            MockResponse::json(
                hyper::StatusCode::UNAUTHORIZED,
                serde_json::json!({
                    "error": "invalid_client",
                    "error_description": "AADSTS7000215: Invalid client secret provided.",
                }),
            )
        })
        .await;

        let err = credential(&format!("{}/", server.base_uri()))
            .get_token("https://management.azure.com/.default")
            .await
            .unwrap_err();
        let Error::Rejected { status, message } = &err else {
            panic!("expected Rejected error, got {err:?}");
        };
        assert_eq!(hyper::StatusCode::UNAUTHORIZED, *status);
        assert!(message.starts_with("invalid_client: AADSTS7000215"), "{message}");
    }

    #[test]
    fn from_vars() {
        let connector = http_common::cloud_connector(None).unwrap();

        let credential = super::EnvironmentCredential::from_vars(
            |name| match name {
                "AZURE_TENANT_ID" => Some("t".to_owned()),
                "AZURE_CLIENT_ID" => Some("c".to_owned()),
                "AZURE_CLIENT_SECRET" => Some("s".to_owned()),
                "AZURE_AUTHORITY_HOST" => Some("https://login.microsoftonline.us/".to_owned()),
                _ => None,
            },
            connector.clone(),
        )
        .unwrap();
        assert_eq!(
            "https://login.microsoftonline.us/t/oauth2/v2.0/token",
            credential.token_uri()
        );

        let credential = super::EnvironmentCredential::from_vars(
            |name| match name {
                "AZURE_TENANT_ID" => Some("t".to_owned()),
                "AZURE_CLIENT_ID" => Some("c".to_owned()),
                "AZURE_CLIENT_SECRET" => Some("s".to_owned()),
                _ => None,
            },
            connector.clone(),
        )
        .unwrap();
        assert_eq!(
            "https://login.microsoftonline.com/t/oauth2/v2.0/token",
            credential.token_uri()
        );

        // An empty secret is as good as none.
        let result = super::EnvironmentCredential::from_vars(
            |name| match name {
                "AZURE_TENANT_ID" => Some("t".to_owned()),
                "AZURE_CLIENT_ID" => Some("c".to_owned()),
                "AZURE_CLIENT_SECRET" => Some(String::new()),
                _ => None,
            },
            connector.clone(),
        );
        assert!(matches!(result, Err(Error::Unavailable(_))));

        let result = super::EnvironmentCredential::from_vars(
            |name| match name {
                "AZURE_TENANT_ID" => Some("t".to_owned()),
                "AZURE_CLIENT_ID" => Some("c".to_owned()),
                "AZURE_CLIENT_SECRET" => Some("s".to_owned()),
                "AZURE_AUTHORITY_HOST" => Some("not a url".to_owned()),
                _ => None,
            },
            connector,
        );
        assert!(matches!(
            result,
            Err(Error::InvalidEnvironment("AZURE_AUTHORITY_HOST", _))
        ));
    }
}
