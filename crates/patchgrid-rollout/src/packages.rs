//! The `packages.yaml` manifest of packages a run upgrades.

use std::path::{Path, PathBuf};

use indexmap::IndexSet;
use serde::{Deserialize, Serialize};
use tracing::info;

use crate::error::{RolloutError, RolloutResult};

pub const PACKAGES_FILE: &str = "packages.yaml";

/// Split a comma-separated operator list, trimming and dropping blanks.
pub fn split_csv(list: &str) -> Vec<String> {
    list.split(',')
        .map(str::trim)
        .filter(|item| !item.is_empty())
        .map(str::to_string)
        .collect()
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PackageManifest {
    pub packages: Vec<String>,
}

impl PackageManifest {
    /// Deduplicated packages from a comma-separated list, first occurrence kept.
    pub fn from_csv(list: &str) -> RolloutResult<Self> {
        let packages: IndexSet<String> = split_csv(list).into_iter().collect();
        if packages.is_empty() {
            return Err(RolloutError::EmptyPackages);
        }
        Ok(Self {
            packages: packages.into_iter().collect(),
        })
    }

    pub fn render(&self) -> RolloutResult<String> {
        Ok(format!("---\n{}", serde_yaml::to_string(self)?))
    }

    /// Write `packages.yaml` into `dir`, which must already exist.
    pub fn write_to(&self, dir: &Path) -> RolloutResult<PathBuf> {
        if !dir.is_dir() {
            return Err(RolloutError::MissingFolder(dir.to_path_buf()));
        }
        let path = dir.join(PACKAGES_FILE);
        std::fs::write(&path, self.render()?).map_err(RolloutError::io(&path))?;
        info!(
            path = %path.display(),
            packages = self.packages.len(),
            "wrote package manifest"
        );
        Ok(path)
    }
}
