// Copyright (c) Microsoft. All rights reserved.

#[derive(Debug)]
pub(crate) struct Error(pub(crate) ErrorKind, pub(crate) backtrace::Backtrace);

#[derive(Debug)]
pub(crate) enum ErrorKind {
    CurrentDir(std::io::Error),
    ReadConfig(config_common::error::Error),
    Connect(amlds_workspace_client_async::Error),
    RegisterDatastore(String, amlds_workspace_client_async::Error),
}

impl std::fmt::Display for ErrorKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ErrorKind::CurrentDir(_) => f.write_str("could not get current directory"),
            ErrorKind::ReadConfig(_) => f.write_str("could not read DataOps config"),
            ErrorKind::Connect(_) => f.write_str("could not connect to the workspace"),
            ErrorKind::RegisterDatastore(name, _) => {
                write!(f, "could not register datastore {}", name)
            }
        }
    }
}

impl std::error::Error for ErrorKind {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            ErrorKind::CurrentDir(err) => Some(err),
            ErrorKind::ReadConfig(err) => Some(err),
            ErrorKind::Connect(err) | ErrorKind::RegisterDatastore(_, err) => Some(err),
        }
    }
}

impl From<ErrorKind> for Error {
    fn from(err: ErrorKind) -> Self {
        Error(err, Default::default())
    }
}
