//! Cloud Storage archival of a run directory.

use std::path::Path;

use patchgrid_core::{CommandSpec, Executor, GCLOUD};
use tracing::{info, warn};

use crate::error::{RolloutError, RolloutResult};

/// A `gs://<bucket>[/<path>]` destination.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GcsDestination {
    bucket: String,
    url: String,
}

impl GcsDestination {
    pub fn parse(url: &str) -> RolloutResult<Self> {
        let invalid = || RolloutError::InvalidDestination(url.to_string());

        let rest = url.trim().strip_prefix("gs://").ok_or_else(invalid)?;
        let bucket = rest.split('/').next().unwrap_or_default();
        if bucket.is_empty() {
            return Err(invalid());
        }

        Ok(Self {
            bucket: bucket.to_string(),
            url: url.trim().to_string(),
        })
    }

    pub fn bucket(&self) -> &str {
        &self.bucket
    }

    /// `gs://<bucket>`
    pub fn bucket_root(&self) -> String {
        format!("gs://{}", self.bucket)
    }

    pub fn url(&self) -> &str {
        &self.url
    }
}

pub struct ArchiveUploader<'a> {
    executor: &'a dyn Executor,
}

impl<'a> ArchiveUploader<'a> {
    pub fn new(executor: &'a dyn Executor) -> Self {
        Self { executor }
    }

    /// Create the bucket if listing it fails.
    pub fn ensure_bucket(&self, dest: &GcsDestination) -> RolloutResult<()> {
        let root = dest.bucket_root();
        let probe = CommandSpec::new(GCLOUD).args(["storage", "ls", "-b", root.as_str()]);

        match self.executor.query(&probe) {
            Ok(_) => Ok(()),
            Err(e) => {
                warn!(bucket = %dest.bucket(), error = %e, "bucket not reachable, creating it");
                let create =
                    CommandSpec::new(GCLOUD).args(["storage", "buckets", "create", root.as_str()]);
                self.executor
                    .run(&create)
                    .map_err(|source| RolloutError::BucketUnavailable {
                        bucket: dest.bucket().to_string(),
                        source,
                    })
            }
        }
    }

    /// Recursively copy `folder` to `dest`, creating the bucket if needed.
    pub fn upload(&self, folder: &Path, dest: &GcsDestination) -> RolloutResult<()> {
        if !folder.is_dir() {
            return Err(RolloutError::MissingFolder(folder.to_path_buf()));
        }
        let mut entries = std::fs::read_dir(folder).map_err(RolloutError::io(folder))?;
        if entries.next().is_none() {
            return Err(RolloutError::EmptyFolder(folder.to_path_buf()));
        }

        self.ensure_bucket(dest)?;

        let cp = CommandSpec::new(GCLOUD)
            .args(["storage", "cp", "-r"])
            .arg(folder.display().to_string())
            .arg(dest.url());
        self.executor.run(&cp).map_err(RolloutError::Upload)?;

        info!(folder = %folder.display(), dest = %dest.url(), "uploaded folder");
        Ok(())
    }
}
