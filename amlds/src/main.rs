// Copyright (c) Microsoft. All rights reserved.

//! Registers a OneLake lakehouse as a datastore of an Azure Machine Learning workspace.
//!
//! The datastore is described by `<config_path_root_dir>/configs/dataops_config.json`,
//! resolved against the current directory. Credentials are taken from the environment
//! (service principal, managed identity or the Azure CLI).

#![deny(rust_2018_idioms)]
#![warn(clippy::all, clippy::pedantic)]
#![allow(clippy::default_trait_access, clippy::module_name_repetitions)]

mod config;
mod error;
mod run;

use error::{Error, ErrorKind};

#[tokio::main(flavor = "current_thread")]
async fn main() {
    logger::try_init().expect("cannot fail to initialize global logger from the process entrypoint");

    if let Err(err) = main_inner().await {
        log::error!("{}", err.0);

        let mut source = std::error::Error::source(&err.0);
        while let Some(err) = source {
            log::error!("caused by: {}", err);
            source = std::error::Error::source(err);
        }

        log::error!("{:?}", err.1);

        std::process::exit(1);
    }
}

async fn main_inner() -> Result<(), Error> {
    let options: Options = structopt::StructOpt::from_args();

    log::info!("Starting amlds");

    let cwd = std::env::current_dir().map_err(ErrorKind::CurrentDir)?;
    let factory = run::CloudWorkspaceFactory::from_env().map_err(ErrorKind::Connect)?;

    let resource = run::run(options, &cwd, &factory).await?;
    log::info!("Registered datastore {} ({})", resource.name, resource.id);

    Ok(())
}

#[derive(Debug, structopt::StructOpt)]
#[structopt(about = "Registers a OneLake lakehouse as an Azure Machine Learning datastore")]
pub(crate) struct Options {
    /// Azure subscription id
    #[structopt(long = "subscription_id", value_name = "SUBSCRIPTION_ID")]
    pub(crate) subscription_id: String,

    /// Azure resource group
    #[structopt(long = "resource_group_name", value_name = "RESOURCE_GROUP_NAME")]
    pub(crate) resource_group_name: String,

    /// Azure ML workspace
    #[structopt(long = "workspace_name", value_name = "WORKSPACE_NAME")]
    pub(crate) workspace_name: String,

    /// Root dir for config file
    #[structopt(
        long = "config_path_root_dir",
        value_name = "CONFIG_PATH_ROOT_DIR",
        parse(try_from_os_str = parse_root_dir)
    )]
    pub(crate) config_path_root_dir: std::path::PathBuf,
}

/// Rejects an empty root. `.` names the current directory.
fn parse_root_dir(value: &std::ffi::OsStr) -> Result<std::path::PathBuf, std::ffi::OsString> {
    if value.is_empty() {
        return Err("must not be empty; use . for the current directory".into());
    }

    Ok(value.into())
}

#[cfg(test)]
mod tests {
    use structopt::StructOpt;

    #[test]
    fn parse_options() {
        let options = super::Options::from_iter_safe([
            "amlds",
            "--subscription_id",
            "sub1",
            "--resource_group_name",
            "rg1",
            "--workspace_name",
            "ws1",
            "--config_path_root_dir",
            "./proj",
        ])
        .unwrap();

        assert_eq!("sub1", options.subscription_id);
        assert_eq!("rg1", options.resource_group_name);
        assert_eq!("ws1", options.workspace_name);
        assert_eq!(
            std::path::Path::new("./proj"),
            options.config_path_root_dir
        );
    }

    #[test]
    fn every_flag_is_required() {
        let args = [
            ("--subscription_id", "sub1"),
            ("--resource_group_name", "rg1"),
            ("--workspace_name", "ws1"),
            ("--config_path_root_dir", "./proj"),
        ];

        for missing in 0..args.len() {
            let argv = std::iter::once("amlds").chain(
                args.iter()
                    .enumerate()
                    .filter(|(i, _)| *i != missing)
                    .flat_map(|(_, (flag, value))| [*flag, *value]),
            );

            let err = super::Options::from_iter_safe(argv).unwrap_err();
            assert_eq!(
                structopt::clap::ErrorKind::MissingRequiredArgument,
                err.kind,
                "{}",
                args[missing].0
            );
        }
    }

    #[test]
    fn empty_root_dir_is_rejected() {
        let args = |root_dir| {
            [
                "amlds",
                "--subscription_id",
                "sub1",
                "--resource_group_name",
                "rg1",
                "--workspace_name",
                "ws1",
                "--config_path_root_dir",
                root_dir,
            ]
        };

        let err = super::Options::from_iter_safe(args("")).unwrap_err();
        assert_eq!(structopt::clap::ErrorKind::ValueValidation, err.kind);

        let options = super::Options::from_iter_safe(args(".")).unwrap();
        assert_eq!(std::path::Path::new("."), options.config_path_root_dir);
    }

    #[test]
    fn kebab_case_flags_are_rejected() {
        let err = super::Options::from_iter_safe([
            "amlds",
            "--subscription-id",
            "sub1",
            "--resource_group_name",
            "rg1",
            "--workspace_name",
            "ws1",
            "--config_path_root_dir",
            "./proj",
        ])
        .unwrap_err();
        assert_eq!(structopt::clap::ErrorKind::UnknownArgument, err.kind);
    }
}
