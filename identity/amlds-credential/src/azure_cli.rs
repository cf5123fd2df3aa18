// Copyright (c) Microsoft. All rights reserved.

use crate::{AccessToken, Error};

const DEFAULT_TIMEOUT: std::time::Duration = std::time::Duration::from_secs(30);

/// The account that is signed in to the Azure CLI (`az login`).
pub struct AzureCliCredential {
    program: std::path::PathBuf,
}

impl AzureCliCredential {
    pub const NAME: &'static str = "Azure CLI";

    #[must_use]
    pub fn new() -> Self {
        let program = if cfg!(windows) { "az.cmd" } else { "az" };

        AzureCliCredential {
            program: program.into(),
        }
    }

    /// Runs `program` instead of the `az` found on `PATH`.
    #[must_use]
    pub fn with_program(mut self, program: impl Into<std::path::PathBuf>) -> Self {
        self.program = program.into();

        self
    }
}

impl Default for AzureCliCredential {
    fn default() -> Self {
        AzureCliCredential::new()
    }
}

#[async_trait::async_trait]
impl crate::TokenCredential for AzureCliCredential {
    async fn get_token(&self, scope: &str) -> Result<AccessToken, Error> {
        let resource = crate::scope_to_resource(scope);

        let output = tokio::process::Command::new(&self.program)
            .args(["account", "get-access-token", "--output", "json", "--resource"])
            .arg(resource)
            .kill_on_drop(true)
            .output();

        let output = match tokio::time::timeout(DEFAULT_TIMEOUT, output).await {
            Ok(Ok(output)) => output,

            Ok(Err(err)) if err.kind() == std::io::ErrorKind::NotFound => {
                return Err(Error::Unavailable(
                    format!("{} is not installed", self.program.display()).into(),
                ));
            }

            Ok(Err(err)) => return Err(Error::Request(err)),

            Err(_) => {
                return Err(Error::Unavailable(
                    format!(
                        "{} did not respond within {} seconds",
                        self.program.display(),
                        DEFAULT_TIMEOUT.as_secs()
                    )
                    .into(),
                ));
            }
        };

        if !output.status.success() {
            let stderr = String::from_utf8_lossy(&output.stderr).into_owned();

            if stderr.contains("az login") || stderr.contains("az account set") {
                return Err(Error::Unavailable("run 'az login' to sign in".into()));
            }

            return Err(Error::CommandFailed(stderr));
        }

        let token: crate::schema::AzureCliToken = serde_json::from_slice(&output.stdout)
            .map_err(|err| Error::MalformedResponse(Box::new(err)))?;

        Ok(AccessToken {
            token: token.access_token,
            expires_on: token.expires_on,
        })
    }
}
