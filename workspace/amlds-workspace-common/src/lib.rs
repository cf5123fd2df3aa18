// Copyright (c) Microsoft. All rights reserved.

#![deny(rust_2018_idioms)]
#![warn(clippy::all, clippy::pedantic)]
#![allow(clippy::missing_errors_doc, clippy::module_name_repetitions)]

pub mod schema;

/// Identifies an Azure Machine Learning workspace.
#[derive(Clone, Debug, Eq, PartialEq)]
pub struct WorkspaceScope {
    pub subscription_id: String,
    pub resource_group_name: String,
    pub workspace_name: String,
}

/// A datastore that points an Azure Machine Learning workspace at an item in OneLake.
#[derive(Clone, Debug, Eq, PartialEq)]
pub struct Datastore {
    pub name: String,
    pub description: String,

    /// The Fabric workspace that holds the artifact.
    pub one_lake_workspace_name: String,

    /// The OneLake endpoint, eg `msit-onelake.dfs.fabric.microsoft.com`
    pub endpoint: String,

    pub artifact: OneLakeArtifact,
}

impl Datastore {
    /// A datastore backed by the lakehouse `artifact_name`.
    #[must_use]
    pub fn lake_house(
        name: String,
        description: String,
        one_lake_workspace_name: String,
        endpoint: String,
        artifact_name: String,
    ) -> Self {
        Datastore {
            name,
            description,
            one_lake_workspace_name,
            endpoint,
            artifact: OneLakeArtifact {
                name: artifact_name,
                kind: ArtifactType::LakeHouse,
            },
        }
    }
}

#[derive(Clone, Debug, Eq, PartialEq)]
pub struct OneLakeArtifact {
    pub name: String,
    pub kind: ArtifactType,
}

#[derive(Clone, Copy, Debug, Eq, PartialEq, serde::Deserialize, serde::Serialize)]
pub enum ArtifactType {
    #[serde(rename = "LakeHouse")]
    LakeHouse,
}

impl ArtifactType {
    pub fn as_str(self) -> &'static str {
        match self {
            ArtifactType::LakeHouse => "lake_house",
        }
    }
}

impl std::fmt::Display for ArtifactType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

#[cfg(test)]
mod tests {
    #[test]
    fn lake_house() {
        let datastore = super::Datastore::lake_house(
            "ds1".to_owned(),
            "d".to_owned(),
            "lw1".to_owned(),
            "https://ep".to_owned(),
            "art1".to_owned(),
        );

        assert_eq!("ds1", datastore.name);
        assert_eq!("d", datastore.description);
        assert_eq!("lw1", datastore.one_lake_workspace_name);
        assert_eq!("https://ep", datastore.endpoint);
        assert_eq!("art1", datastore.artifact.name);
        assert_eq!(super::ArtifactType::LakeHouse, datastore.artifact.kind);
        assert_eq!("lake_house", datastore.artifact.kind.to_string());
    }
}
