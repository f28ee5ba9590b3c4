//! Per-run workspace: `patch-<timestamp>/{vars,logs}`.

use std::path::{Path, PathBuf};

use chrono::Local;
use patchgrid_core::SkipKind;
use serde::Serialize;
use tracing::info;

use crate::error::{RolloutError, RolloutResult};
use crate::skiplist::SkipList;

pub const SETUP_VARS_FILE: &str = "setupvars.yaml";

/// Region recorded in `setupvars.yaml` when an inventory override has none.
pub const DEFAULT_REGION: &str = "default";

#[derive(Serialize)]
struct SetupVars<'a> {
    region: &'a str,
    setup_dir: &'a Path,
    setup_vars_dir: &'a Path,
    logs_dir: &'a Path,
}

#[derive(Debug, Clone)]
pub struct RunWorkspace {
    dir: PathBuf,
    vars_dir: PathBuf,
    logs_dir: PathBuf,
    region: String,
}

impl RunWorkspace {
    /// `<parent>/patch-<timestamp>`.
    pub fn new(parent: &Path, timestamp: &str, region: &str) -> Self {
        let dir = parent.join(format!("patch-{timestamp}"));
        Self {
            vars_dir: dir.join("vars"),
            logs_dir: dir.join("logs"),
            dir,
            region: region.to_string(),
        }
    }

    /// Stamped with the local time as `YYYYMMDD-HHMMSS`.
    pub fn timestamped(parent: &Path, region: &str) -> Self {
        let timestamp = Local::now().format("%Y%m%d-%H%M%S").to_string();
        Self::new(parent, &timestamp, region)
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }

    pub fn vars_dir(&self) -> &Path {
        &self.vars_dir
    }

    pub fn logs_dir(&self) -> &Path {
        &self.logs_dir
    }

    pub fn region(&self) -> &str {
        &self.region
    }

    pub fn setup_vars_file(&self) -> PathBuf {
        self.vars_dir.join(SETUP_VARS_FILE)
    }

    pub fn skip_list(&self, kind: SkipKind) -> SkipList {
        SkipList::new(self.vars_dir.join(kind.file_name()))
    }

    /// Create the directory tree. Existing directories are fine.
    pub fn create(&self) -> RolloutResult<()> {
        for dir in [&self.dir, &self.vars_dir, &self.logs_dir] {
            std::fs::create_dir_all(dir).map_err(RolloutError::io(dir))?;
        }
        info!(dir = %self.dir.display(), "created run workspace");
        Ok(())
    }

    /// Write `vars/setupvars.yaml` unless it already exists.
    ///
    /// Returns whether the file was written.
    pub fn write_setup_vars(&self) -> RolloutResult<bool> {
        let path = self.setup_vars_file();
        if path.exists() {
            return Ok(false);
        }

        let vars = SetupVars {
            region: &self.region,
            setup_dir: &self.dir,
            setup_vars_dir: &self.vars_dir,
            logs_dir: &self.logs_dir,
        };
        std::fs::write(&path, serde_yaml::to_string(&vars)?).map_err(RolloutError::io(&path))?;
        info!(path = %path.display(), "created setup vars");
        Ok(true)
    }
}
