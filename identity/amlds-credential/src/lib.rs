// Copyright (c) Microsoft. All rights reserved.

//! Access tokens for the Azure management plane.
//!
//! [`DefaultCredential`] tries, in order, a service principal configured through environment
//! variables, the machine's managed identity, and the signed-in Azure CLI, and uses the first
//! one that produces a token.

#![deny(rust_2018_idioms)]
#![warn(clippy::all, clippy::pedantic)]
#![allow(clippy::missing_errors_doc, clippy::module_name_repetitions)]

mod azure_cli;
pub use azure_cli::AzureCliCredential;

mod environment;
pub use environment::EnvironmentCredential;

mod error;
pub use error::Error;

mod managed_identity;
pub use managed_identity::ManagedIdentityCredential;

mod schema;

#[async_trait::async_trait]
pub trait TokenCredential: Send + Sync {
    /// Gets a token for `scope`, eg `https://management.azure.com/.default`
    async fn get_token(&self, scope: &str) -> Result<AccessToken, Error>;
}

#[derive(Clone)]
pub struct AccessToken {
    pub token: String,
    pub expires_on: Option<chrono::DateTime<chrono::Utc>>,
}

impl std::fmt::Debug for AccessToken {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AccessToken")
            .field("token", &"<redacted>")
            .field("expires_on", &self.expires_on)
            .finish()
    }
}

/// The ambient credential chain.
pub struct DefaultCredential {
    sources: Vec<(&'static str, Box<dyn TokenCredential>)>,

    /// Sources that were skipped when the chain was built, reported if every other source fails.
    skipped: Vec<(&'static str, Error)>,
}

impl DefaultCredential {
    pub fn new(connector: &http_common::CloudConnector) -> Result<Self, Error> {
        Self::from_vars(|name| std::env::var(name).ok(), connector)
    }

    fn from_vars(
        var: impl Fn(&str) -> Option<String>,
        connector: &http_common::CloudConnector,
    ) -> Result<Self, Error> {
        let mut sources: Vec<(&'static str, Box<dyn TokenCredential>)> = vec![];
        let mut skipped = vec![];

        match EnvironmentCredential::from_vars(&var, connector.clone()) {
            Ok(credential) => sources.push((EnvironmentCredential::NAME, Box::new(credential))),
            Err(err) => {
                log::debug!("Skipping {} credential: {}", EnvironmentCredential::NAME, err);
                skipped.push((EnvironmentCredential::NAME, err));
            }
        }

        sources.push((
            ManagedIdentityCredential::NAME,
            Box::new(ManagedIdentityCredential::from_vars(&var, connector.clone())?),
        ));

        sources.push((AzureCliCredential::NAME, Box::new(AzureCliCredential::new())));

        Ok(DefaultCredential { sources, skipped })
    }

    /// A chain of exactly `sources`, tried in order.
    #[must_use]
    pub fn with_sources(sources: Vec<(&'static str, Box<dyn TokenCredential>)>) -> Self {
        DefaultCredential {
            sources,
            skipped: vec![],
        }
    }

    pub fn source_names(&self) -> impl Iterator<Item = &'static str> + '_ {
        self.sources.iter().map(|(name, _)| *name)
    }
}

#[async_trait::async_trait]
impl TokenCredential for DefaultCredential {
    async fn get_token(&self, scope: &str) -> Result<AccessToken, Error> {
        let mut errors = vec![];

        for (name, source) in &self.sources {
            match source.get_token(scope).await {
                Ok(token) => {
                    log::info!("Acquired token for {} from {} credential", scope, name);
                    return Ok(token);
                }

                Err(err) => {
                    log::debug!("{} credential failed: {}", name, err);
                    errors.push((*name, err));
                }
            }
        }

        let mut skipped = self
            .skipped
            .iter()
            .map(|(name, err)| (*name, Error::Unavailable(err.to_string().into())))
            .collect::<Vec<_>>();
        skipped.append(&mut errors);

        Err(Error::Chain(skipped))
    }
}

/// Converts an OAuth2 scope into the `resource` form that the v1 endpoints (managed identity,
/// Azure CLI) expect, eg `https://management.azure.com/.default` -> `https://management.azure.com`
pub(crate) fn scope_to_resource(scope: &str) -> &str {
    scope
        .strip_suffix("/.default")
        .unwrap_or(scope)
}

/// Reads `name` via `var`, treating an empty value as unset.
pub(crate) fn non_empty_var(var: impl Fn(&str) -> Option<String>, name: &str) -> Option<String> {
    var(name).filter(|value| !value.is_empty())
}
