//! `patch-groups-<region>.yaml` inventory files.
//!
//! ```yaml
//! pg1:
//!   hosts:
//!     web-3: null
//!     db-1: null
//! ```

use std::collections::BTreeSet;
use std::path::{Path, PathBuf};

use indexmap::IndexMap;
use patchgrid_core::{FileError, validate_file};
use regex::Regex;
use serde::Serialize;
use serde_yaml::{Mapping, Value};
use thiserror::Error;
use tracing::info;

use crate::partition::PatchGroups;

#[derive(Debug, Error)]
pub enum GroupFileError {
    #[error("could not write {}: {source}", .path.display())]
    Write {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("could not read {}: {source}", .path.display())]
    Read {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("could not render patch groups: {0}")]
    Render(#[from] serde_yaml::Error),
    #[error("could not parse inventory {}: {source}", .path.display())]
    Parse {
        path: PathBuf,
        #[source]
        source: serde_yaml::Error,
    },
    #[error("group pattern: {0}")]
    Pattern(#[from] regex::Error),
    #[error(transparent)]
    Invalid(#[from] FileError),
}

#[derive(Serialize)]
struct GroupEntry<'a> {
    hosts: IndexMap<&'a str, Option<()>>,
}

pub fn group_file_name(region: &str) -> String {
    format!("patch-groups-{region}.yaml")
}

/// Render patch groups as an Ansible YAML inventory, groups in ascending order.
pub fn render_groups(groups: &PatchGroups) -> Result<String, GroupFileError> {
    let doc: IndexMap<String, GroupEntry<'_>> = groups
        .iter()
        .map(|(name, hosts)| {
            let hosts = hosts.iter().map(|h| (h.as_str(), None)).collect();
            (name, GroupEntry { hosts })
        })
        .collect();
    Ok(serde_yaml::to_string(&doc)?)
}

/// Write `patch-groups-<region>.yaml` into `dir` and return its path.
pub fn write_group_file(
    dir: &Path,
    region: &str,
    groups: &PatchGroups,
) -> Result<PathBuf, GroupFileError> {
    let path = dir.join(group_file_name(region));
    let content = render_groups(groups)?;
    std::fs::write(&path, content).map_err(|source| GroupFileError::Write {
        path: path.clone(),
        source,
    })?;
    info!(
        region,
        groups = groups.len(),
        path = %path.display(),
        "wrote patch group file"
    );
    Ok(path)
}

/// Group indices declared in an inventory file (`pg<N>` group keys), ascending.
///
/// Works on any YAML inventory, including hand-written ones where the groups
/// are nested under `all: children:`. Host keys are never groups, even when
/// a host happens to be named `pg<N>`.
pub fn declared_groups(path: &Path) -> Result<Vec<u32>, GroupFileError> {
    validate_file(path)?;
    let content = std::fs::read_to_string(path).map_err(|source| GroupFileError::Read {
        path: path.to_path_buf(),
        source,
    })?;
    let doc: Value = serde_yaml::from_str(&content).map_err(|source| GroupFileError::Parse {
        path: path.to_path_buf(),
        source,
    })?;

    let group_re = Regex::new(r"^pg(\d+)$")?;
    let mut indices = BTreeSet::new();
    if let Some(groups) = doc.as_mapping() {
        collect_groups(groups, &group_re, &mut indices);
    }
    Ok(indices.into_iter().collect())
}

/// Walk a group mapping and every nested `children:` mapping.
fn collect_groups(groups: &Mapping, group_re: &Regex, indices: &mut BTreeSet<u32>) {
    for (name, group) in groups {
        let index = name
            .as_str()
            .and_then(|name| group_re.captures(name))
            .and_then(|caps| caps[1].parse::<u32>().ok())
            .filter(|index| *index > 0);
        if let Some(index) = index {
            indices.insert(index);
        }
        if let Some(children) = group.get("children").and_then(Value::as_mapping) {
            collect_groups(children, group_re, indices);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::partition::create_patch_groups;
    use patchgrid_core::RoleHosts;

    fn sample_groups() -> PatchGroups {
        let mut roles = RoleHosts::new();
        roles.insert("web".to_string(), vec!["web-2".to_string(), "web-1".to_string()]);
        roles.insert("db".to_string(), vec!["db-1".to_string()]);
        create_patch_groups(&roles, "be-sharddb")
    }

    #[test]
    fn test_render_layout() {
        let yaml = render_groups(&sample_groups()).unwrap();
        assert_eq!(
            yaml,
            "pg1:\n  hosts:\n    web-2: null\n    db-1: null\npg2:\n  hosts:\n    web-1: null\n"
        );
    }

    #[test]
    fn test_render_orders_groups_numerically() {
        let mut roles = RoleHosts::new();
        roles.insert(
            "web".to_string(),
            (1..=11).map(|i| format!("web-{i}")).collect(),
        );
        let yaml = render_groups(&create_patch_groups(&roles, "be-sharddb")).unwrap();

        let pg2 = yaml.find("pg2:").unwrap();
        let pg10 = yaml.find("pg10:").unwrap();
        assert!(pg2 < pg10);
    }

    #[test]
    fn test_write_and_declared_groups() {
        let dir = tempfile::tempdir().unwrap();
        let path = write_group_file(dir.path(), "us-central1", &sample_groups()).unwrap();

        assert!(path.ends_with("patch-groups-us-central1.yaml"));
        assert_eq!(declared_groups(&path).unwrap(), vec![1, 2]);
    }

    #[test]
    fn test_declared_groups_nested_inventory() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("custom.yaml");
        std::fs::write(
            &path,
            "all:\n  children:\n    pg3:\n      hosts:\n        c: null\n    pg1:\n      hosts:\n        a: null\n    other:\n      hosts:\n        pg9-host: null\n",
        )
        .unwrap();

        assert_eq!(declared_groups(&path).unwrap(), vec![1, 3]);
    }

    #[test]
    fn test_declared_groups_ignores_host_keys() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("custom.yaml");
        std::fs::write(
            &path,
            "pg1:\n  hosts:\n    pg7: null\n    web-1: null\nweb:\n  hosts:\n    pg4: null\n  vars:\n    pg5: true\n",
        )
        .unwrap();

        assert_eq!(declared_groups(&path).unwrap(), vec![1]);
    }

    #[test]
    fn test_declared_groups_deeply_nested_children() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("custom.yaml");
        std::fs::write(
            &path,
            "all:\n  children:\n    east:\n      children:\n        pg2:\n          hosts:\n            pg8: null\n",
        )
        .unwrap();

        assert_eq!(declared_groups(&path).unwrap(), vec![2]);
    }

    #[test]
    fn test_declared_groups_rejects_malformed_yaml() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("custom.yaml");
        std::fs::write(&path, "pg1: [unclosed\n").unwrap();

        let err = declared_groups(&path).unwrap_err();
        assert!(matches!(err, GroupFileError::Parse { .. }));
    }

    #[test]
    fn test_declared_groups_none() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("custom.yaml");
        std::fs::write(&path, "web:\n  hosts:\n    a: null\n").unwrap();

        assert!(declared_groups(&path).unwrap().is_empty());
    }

    #[test]
    fn test_declared_groups_rejects_empty_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("empty.yaml");
        std::fs::write(&path, "").unwrap();

        let err = declared_groups(&path).unwrap_err();
        assert!(matches!(err, GroupFileError::Invalid(FileError::Empty(_))));
    }
}
