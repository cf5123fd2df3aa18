// Copyright (c) Microsoft. All rights reserved.

const CONFIG_DIR: &str = "configs";
const CONFIG_FILE_NAME: &str = "dataops_config.json";

/// `<root>/configs/dataops_config.json`
#[derive(Debug, serde::Deserialize)]
pub(crate) struct DataOpsConfig {
    #[serde(rename = "DATA_STORE_NAME")]
    pub(crate) data_store_name: String,

    #[serde(rename = "DATA_STORE_DESCRIPTION")]
    pub(crate) data_store_description: String,

    #[serde(rename = "ONELAKE")]
    pub(crate) one_lake: OneLakeConfig,
}

#[derive(Debug, serde::Deserialize)]
pub(crate) struct OneLakeConfig {
    #[serde(rename = "WORKSPACE_NAME")]
    pub(crate) workspace_name: String,

    #[serde(rename = "ENDPOINT")]
    pub(crate) endpoint: String,

    #[serde(rename = "ARTIFACT_NAME")]
    pub(crate) artifact_name: String,
}

impl DataOpsConfig {
    pub(crate) fn into_datastore(self) -> amlds_workspace_common::Datastore {
        amlds_workspace_common::Datastore::lake_house(
            self.data_store_name,
            self.data_store_description,
            self.one_lake.workspace_name,
            self.one_lake.endpoint,
            self.one_lake.artifact_name,
        )
    }
}

/// Resolves `root_dir` against `cwd`. An absolute `root_dir` is used as is.
pub(crate) fn config_path(cwd: &std::path::Path, root_dir: &std::path::Path) -> std::path::PathBuf {
    cwd.join(root_dir).join(CONFIG_DIR).join(CONFIG_FILE_NAME)
}
