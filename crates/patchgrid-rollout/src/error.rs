//! Error types for patch runs.

use std::path::PathBuf;

use patchgrid_core::{ConfigError, ExecError, FileError};
use patchgrid_groups::GroupFileError;
use patchgrid_inventory::InventoryError;
use thiserror::Error;

pub type RolloutResult<T> = Result<T, RolloutError>;

#[derive(Debug, Error)]
pub enum RolloutError {
    #[error("{}: {source}", .path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("could not render yaml: {0}")]
    Yaml(#[from] serde_yaml::Error),

    #[error("no packages given")]
    EmptyPackages,

    #[error("the folder '{}' does not exist", .0.display())]
    MissingFolder(PathBuf),

    #[error("the folder '{}' is empty", .0.display())]
    EmptyFolder(PathBuf),

    #[error("no deploy user; set [runner].deploy_user or $DEPLOY, or pass --nocreds/--askpass")]
    NoDeployUser,

    #[error(
        "inventory file {} must define one or more patch groups named \"pg#\" \
         (example: pg1, pg2, pg3)",
        .0.display()
    )]
    NoPatchGroups(PathBuf),

    #[error("no hosts found in region {0}")]
    NoHostsInRegion(String),

    #[error("invalid Cloud Storage destination '{0}', expected gs://<bucket>[/<path>]")]
    InvalidDestination(String),

    #[error("bucket {bucket} does not exist and could not be created: {source}")]
    BucketUnavailable {
        bucket: String,
        #[source]
        source: ExecError,
    },

    #[error("upload failed: {0}")]
    Upload(#[source] ExecError),

    #[error(transparent)]
    Config(#[from] ConfigError),

    #[error(transparent)]
    File(#[from] FileError),

    #[error(transparent)]
    GroupFile(#[from] GroupFileError),

    #[error(transparent)]
    Inventory(#[from] InventoryError),
}

impl RolloutError {
    pub(crate) fn io(path: impl Into<PathBuf>) -> impl FnOnce(std::io::Error) -> Self {
        let path = path.into();
        move |source| RolloutError::Io { path, source }
    }
}
