// Copyright (c) Microsoft. All rights reserved.

#[derive(Debug)]
pub enum Error {
    /// The config file does not exist.
    NotFound(std::path::PathBuf),

    /// The config file exists but could not be read.
    Read(std::path::PathBuf, std::io::Error),

    /// The config file is not valid JSON.
    Parse(std::path::PathBuf, serde_json::Error),

    /// The config file is valid JSON but does not have the expected shape,
    /// eg a required key is missing.
    Deserialize(std::path::PathBuf, serde_json::Error),
}

impl std::fmt::Display for Error {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Error::NotFound(path) => write!(f, "config file {} does not exist", path.display()),
            Error::Read(path, _) => write!(f, "could not read config from {}", path.display()),
            Error::Parse(path, _) => {
                write!(f, "config file {} is not valid JSON", path.display())
            }
            Error::Deserialize(path, _) => {
                write!(f, "config file {} has an invalid value", path.display())
            }
        }
    }
}

impl std::error::Error for Error {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            Error::NotFound(_) => None,
            Error::Read(_, err) => Some(err),
            Error::Parse(_, err) | Error::Deserialize(_, err) => Some(err),
        }
    }
}
