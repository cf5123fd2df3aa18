// Copyright (c) Microsoft. All rights reserved.

use amlds_workspace_common::schema::response::ApiError;

#[derive(Debug)]
pub enum Error {
    InvalidParameter(&'static str, std::borrow::Cow<'static, str>),

    /// No token could be acquired, or the management plane did not accept it (401).
    Authentication(Box<dyn std::error::Error + Send + Sync>),

    /// The caller's identity has no rights on the workspace (403).
    Permission(ApiError),

    /// The subscription, resource group or workspace does not exist (404).
    NotFound(ApiError),

    /// The service rejected the datastore, eg because the endpoint is malformed or the
    /// artifact does not exist (400, 422).
    Validation(ApiError),

    /// Any other unsuccessful status.
    Service(hyper::StatusCode, ApiError),

    /// The request could not be sent, or the response could not be read.
    Request(std::io::Error),
}

impl Error {
    pub(crate) fn from_status(status: hyper::StatusCode, error: ApiError) -> Self {
        match status {
            hyper::StatusCode::UNAUTHORIZED => Error::Authentication(Box::new(
                std::io::Error::new(std::io::ErrorKind::PermissionDenied, error.to_string()),
            )),
            hyper::StatusCode::FORBIDDEN => Error::Permission(error),
            hyper::StatusCode::NOT_FOUND => Error::NotFound(error),
            hyper::StatusCode::BAD_REQUEST | hyper::StatusCode::UNPROCESSABLE_ENTITY => {
                Error::Validation(error)
            }
            status => Error::Service(status, error),
        }
    }
}

impl std::fmt::Display for Error {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Error::InvalidParameter(name, reason) => {
                write!(f, "parameter {:?} has an invalid value: {}", name, reason)
            }
            Error::Authentication(_) => f.write_str("could not authenticate to the workspace"),
            Error::Permission(error) => write!(f, "permission denied: {}", error),
            Error::NotFound(error) => write!(f, "not found: {}", error),
            Error::Validation(error) => write!(f, "the datastore was rejected: {}", error),
            Error::Service(status, error) => {
                write!(f, "the service responded with {}: {}", status, error)
            }
            Error::Request(_) => f.write_str("could not send request to the workspace"),
        }
    }
}

impl std::error::Error for Error {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        #[allow(clippy::match_same_arms)]
        match self {
            Error::InvalidParameter(..) => None,
            Error::Authentication(err) => Some(&**err),
            Error::Permission(_) | Error::NotFound(_) | Error::Validation(_) => None,
            Error::Service(..) => None,
            Error::Request(err) => Some(err),
        }
    }
}
