// Copyright (c) Microsoft. All rights reserved.

use chrono::TimeZone;

use crate::Error;

/// Client credentials grant. Ref <https://learn.microsoft.com/entra/identity-platform/v2-oauth2-client-creds-grant-flow>
#[derive(Debug, serde::Deserialize)]
pub(crate) struct ClientCredentialsToken {
    pub access_token: String,
    pub expires_in: Option<i64>,
}

/// Managed identity endpoints (IMDS and App Service). `expires_on` is epoch seconds, sent as
/// a string by some endpoints and as a number by others.
#[derive(Debug, serde::Deserialize)]
pub(crate) struct ManagedIdentityToken {
    pub access_token: String,
    #[serde(default, deserialize_with = "deserialize_epoch_seconds")]
    pub expires_on: Option<chrono::DateTime<chrono::Utc>>,
}

/// `az account get-access-token --output json`. `expires_on` only exists in Azure CLI 2.54 and later.
#[derive(Debug, serde::Deserialize)]
#[serde(rename_all = "camelCase")]
pub(crate) struct AzureCliToken {
    pub access_token: String,
    #[serde(
        default,
        rename = "expires_on",
        deserialize_with = "deserialize_epoch_seconds"
    )]
    pub expires_on: Option<chrono::DateTime<chrono::Utc>>,
}

/// The union of the error bodies that the identity endpoints send.
#[derive(Debug, Default, serde::Deserialize)]
pub(crate) struct ErrorResponse {
    pub error: Option<String>,
    pub error_description: Option<String>,
    #[serde(alias = "Message")]
    pub message: Option<String>,
}

impl ErrorResponse {
    fn into_message(self) -> Option<String> {
        match (self.error, self.error_description, self.message) {
            (Some(error), Some(description), _) => Some(format!("{}: {}", error, description)),
            (_, Some(message), _) | (_, None, Some(message)) | (Some(message), None, None) => {
                Some(message)
            }
            (None, None, None) => None,
        }
    }
}

/// Parses a token endpoint response: `TToken` if the status is 200, otherwise an
/// [`Error::Rejected`] carrying whatever message the endpoint sent.
pub(crate) fn parse_token_response<TToken>(response: http_common::HttpResponse) -> Result<TToken, Error>
where
    TToken: serde::de::DeserializeOwned,
{
    let (status, body) = response.into_parts();

    if status == hyper::StatusCode::OK {
        let token: TToken =
            serde_json::from_slice(&body).map_err(|err| Error::MalformedResponse(Box::new(err)))?;
        return Ok(token);
    }

    let message = serde_json::from_slice::<ErrorResponse>(&body)
        .ok()
        .and_then(ErrorResponse::into_message)
        .unwrap_or_else(|| String::from_utf8_lossy(&body).into_owned());

    Err(Error::Rejected { status, message })
}

fn deserialize_epoch_seconds<'de, D>(
    deserializer: D,
) -> Result<Option<chrono::DateTime<chrono::Utc>>, D::Error>
where
    D: serde::Deserializer<'de>,
{
    #[derive(serde::Deserialize)]
    #[serde(untagged)]
    enum EpochSeconds {
        Number(i64),
        String(String),
    }

    let value: Option<EpochSeconds> = serde::Deserialize::deserialize(deserializer)?;

    let seconds = match value {
        Some(EpochSeconds::Number(seconds)) => seconds,
        Some(EpochSeconds::String(seconds)) => seconds.parse().map_err(serde::de::Error::custom)?,
        None => return Ok(None),
    };

    let expires_on = chrono::Utc
        .timestamp_opt(seconds, 0)
        .single()
        .ok_or_else(|| serde::de::Error::custom(format!("{} is out of range", seconds)))?;

    Ok(Some(expires_on))
}
