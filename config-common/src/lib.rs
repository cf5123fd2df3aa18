// Copyright (c) Microsoft. All rights reserved.

#![deny(rust_2018_idioms)]
#![warn(clippy::all, clippy::pedantic)]
#![allow(clippy::missing_errors_doc)]

pub mod error;

use crate::error::Error;

/// Reads the JSON document at `config_path` and deserializes it into `TConfig`.
///
/// The document is first parsed into a [`serde_json::Value`] so that malformed JSON and
/// a well-formed document with missing or mistyped keys are reported as different errors.
pub fn read_config<TConfig>(config_path: &std::path::Path) -> Result<TConfig, Error>
where
    TConfig: serde::de::DeserializeOwned,
{
    log::debug!("Reading config from {}", config_path.display());

    let config = match std::fs::read(config_path) {
        Ok(config) => config,
        Err(err) if err.kind() == std::io::ErrorKind::NotFound => {
            return Err(Error::NotFound(config_path.to_owned()))
        }
        Err(err) => return Err(Error::Read(config_path.to_owned(), err)),
    };

    let config: serde_json::Value = serde_json::from_slice(&config)
        .map_err(|err| Error::Parse(config_path.to_owned(), err))?;

    let config: TConfig = serde::Deserialize::deserialize(config)
        .map_err(|err| Error::Deserialize(config_path.to_owned(), err))?;

    Ok(config)
}
