// Copyright (c) Microsoft. All rights reserved.

#[derive(Debug)]
pub enum Error {
    /// The credential source is not configured on this machine, eg the environment variables
    /// are not set or the Azure CLI is not installed.
    Unavailable(std::borrow::Cow<'static, str>),

    /// An environment variable has a value that could not be used.
    InvalidEnvironment(&'static str, Box<dyn std::error::Error + Send + Sync>),

    /// The identity provider could not be reached.
    Request(std::io::Error),

    /// The identity provider refused to issue a token.
    Rejected {
        status: hyper::StatusCode,
        message: String,
    },

    /// The Azure CLI ran but failed.
    CommandFailed(String),

    /// The identity provider responded with something that is not a token.
    MalformedResponse(Box<dyn std::error::Error + Send + Sync>),

    /// Every source of a credential chain failed. Holds each source's name and error, in the
    /// order the sources were tried.
    Chain(Vec<(&'static str, Error)>),
}

impl std::fmt::Display for Error {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Error::Unavailable(reason) => write!(f, "credential is unavailable: {}", reason),
            Error::InvalidEnvironment(name, _) => {
                write!(f, "environment variable {} has an invalid value", name)
            }
            Error::Request(_) => f.write_str("could not send token request"),
            Error::Rejected { status, message } => {
                write!(f, "token request was rejected ({}): {}", status, message)
            }
            Error::CommandFailed(stderr) => write!(f, "Azure CLI failed: {}", stderr.trim()),
            Error::MalformedResponse(_) => f.write_str("token response is malformed"),
            Error::Chain(errors) => {
                f.write_str("no credential source could provide a token")?;

                for (source, err) in errors {
                    write!(f, "\n  {}: {}", source, err)?;
                }

                Ok(())
            }
        }
    }
}

impl std::error::Error for Error {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        #[allow(clippy::match_same_arms)]
        match self {
            Error::Unavailable(_) => None,
            Error::InvalidEnvironment(_, err) => Some(&**err),
            Error::Request(err) => Some(err),
            Error::Rejected { .. } => None,
            Error::CommandFailed(_) => None,
            Error::MalformedResponse(err) => Some(&**err),
            Error::Chain(_) => None,
        }
    }
}
