//! Error types for inventory fetching.

use std::path::PathBuf;

use patchgrid_core::ExecError;
use thiserror::Error;

/// None of these are recovered from; they abort the run.
#[derive(Debug, Error)]
pub enum InventoryError {
    #[error("could not read scope file {}: {source}", .path.display())]
    ScopeFile {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("scope is empty; add filter terms to the scope file or [inventory].scope")]
    EmptyScope,

    #[error(
        "could not determine GCP project; set [inventory].project or run \
         `gcloud config set project <id>`"
    )]
    NoProject,

    #[error("gcloud query failed: {0}")]
    Query(#[from] ExecError),

    #[error("malformed instance listing: {0}")]
    Malformed(#[from] serde_json::Error),
}
