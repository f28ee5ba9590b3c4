//! Target planning and the sequential group loop.
//!
//! Targets run strictly one after another. A failed target is recorded
//! and the driver moves on to the next one; nothing is retried.

use std::fmt;
use std::path::{Path, PathBuf};

use patchgrid_core::{Executor, PatchgridConfig, Region, validate_file};
use patchgrid_groups::{create_patch_groups, declared_groups, write_group_file};
use patchgrid_inventory::GcloudInventory;
use tracing::{info, warn};

use crate::error::{RolloutError, RolloutResult};
use crate::runner::PlaybookRunner;
use crate::workspace::RunWorkspace;

/// An operator `--grouplist` may arrive wrapped in shell quotes.
fn strip_quotes(list: &str) -> String {
    list.trim().trim_matches(|c| c == '\'' || c == '"').to_string()
}

/// What to run, against which inventory.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UpgradePlan {
    pub inventory: PathBuf,
    /// Patch group names, or a single operator-supplied host pattern.
    pub targets: Vec<String>,
}

impl UpgradePlan {
    /// Plan against an operator-supplied inventory file.
    ///
    /// Without a grouplist, every `pg<N>` group declared in the file is a
    /// target, in ascending order.
    pub fn from_inventory_file(inventory: &Path, grouplist: Option<&str>) -> RolloutResult<Self> {
        validate_file(inventory)?;

        let targets = match grouplist {
            Some(list) => vec![strip_quotes(list)],
            None => {
                let indices = declared_groups(inventory)?;
                if indices.is_empty() {
                    return Err(RolloutError::NoPatchGroups(inventory.to_path_buf()));
                }
                indices.into_iter().map(patchgrid_core::group_name).collect()
            }
        };

        Ok(Self {
            inventory: inventory.to_path_buf(),
            targets,
        })
    }

    /// Fetch the fleet, partition `region` and write its patch-group file
    /// into the workspace's `vars/` directory.
    pub fn from_region(
        executor: &dyn Executor,
        config: &PatchgridConfig,
        workspace: &RunWorkspace,
        region: &Region,
        grouplist: Option<&str>,
    ) -> RolloutResult<Self> {
        let roster = GcloudInventory::new(executor, &config.inventory).fetch_roster()?;
        let no_hosts = || RolloutError::NoHostsInRegion(region.to_string());

        let hosts_by_role = roster.get(region.as_str()).ok_or_else(no_hosts)?;
        let groups = create_patch_groups(hosts_by_role, &config.inventory.reserved_role);
        if groups.is_empty() {
            return Err(no_hosts());
        }

        let inventory = write_group_file(workspace.vars_dir(), region.as_str(), &groups)?;
        let targets = match grouplist {
            Some(list) => vec![strip_quotes(list)],
            None => groups.iter().map(|(name, _)| name).collect(),
        };

        Ok(Self { inventory, targets })
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum StepStatus {
    Succeeded,
    Failed { reason: String },
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StepOutcome {
    pub target: String,
    pub status: StepStatus,
    /// Hosts the runner left in its retry artifact after this step.
    pub retry_hosts: Vec<String>,
}

impl StepOutcome {
    pub fn succeeded(&self) -> bool {
        self.status == StepStatus::Succeeded
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RunSummary {
    pub steps: Vec<StepOutcome>,
}

impl RunSummary {
    pub fn failed(&self) -> impl Iterator<Item = &StepOutcome> {
        self.steps.iter().filter(|step| !step.succeeded())
    }

    pub fn is_success(&self) -> bool {
        self.failed().next().is_none()
    }
}

impl fmt::Display for RunSummary {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for step in &self.steps {
            match &step.status {
                StepStatus::Succeeded => write!(f, "  ✓ {}", step.target)?,
                StepStatus::Failed { reason } => write!(f, "  ✗ {}: {reason}", step.target)?,
            }
            if !step.retry_hosts.is_empty() {
                write!(f, " (retry: {})", step.retry_hosts.join(", "))?;
            }
            writeln!(f)?;
        }
        Ok(())
    }
}

pub struct UpgradeDriver<'a> {
    runner: PlaybookRunner<'a>,
}

impl<'a> UpgradeDriver<'a> {
    pub fn new(runner: PlaybookRunner<'a>) -> Self {
        Self { runner }
    }

    /// Run one target to completion and scrape its retry artifact.
    pub fn step(&self, target: &str, inventory: &Path) -> StepOutcome {
        let status = match self.runner.run(target, inventory) {
            Ok(()) => StepStatus::Succeeded,
            Err(e) => {
                warn!(group = target, error = %e, "patch playbook failed, continuing");
                StepStatus::Failed {
                    reason: e.to_string(),
                }
            }
        };

        let retry_hosts = self.runner.process_retry_file(target).unwrap_or_else(|e| {
            warn!(group = target, error = %e, "could not process retry file");
            Vec::new()
        });

        StepOutcome {
            target: target.to_string(),
            status,
            retry_hosts,
        }
    }

    pub fn run(&self, plan: &UpgradePlan) -> RunSummary {
        let total = plan.targets.len();
        let mut summary = RunSummary::default();

        for (i, target) in plan.targets.iter().enumerate() {
            info!(group = %target, step = i + 1, total, "patching group");
            summary.steps.push(self.step(target, &plan.inventory));
        }

        let failed = summary.failed().count();
        info!(
            groups = total,
            succeeded = total - failed,
            failed,
            dir = %self.runner.workspace().dir().display(),
            "patch run finished"
        );
        summary
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn strip_quotes_removes_shell_quoting() {
        assert_eq!(strip_quotes("'web-1,web-2'"), "web-1,web-2");
        assert_eq!(strip_quotes("\"pg3\""), "pg3");
        assert_eq!(strip_quotes(" pg1 "), "pg1");
    }

    #[test]
    fn inventory_plan_uses_declared_groups() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("inventory.yaml");
        std::fs::write(&path, "pg2:\n  hosts:\n    b: null\npg1:\n  hosts:\n    a: null\n")
            .unwrap();

        let plan = UpgradePlan::from_inventory_file(&path, None).unwrap();
        assert_eq!(plan.targets, vec!["pg1", "pg2"]);
        assert_eq!(plan.inventory, path);
    }

    #[test]
    fn inventory_plan_grouplist_overrides() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("inventory.yaml");
        std::fs::write(&path, "pg1:\n  hosts:\n    a: null\n").unwrap();

        let plan = UpgradePlan::from_inventory_file(&path, Some("'web-1,web-2'")).unwrap();
        assert_eq!(plan.targets, vec!["web-1,web-2"]);
    }

    #[test]
    fn inventory_plan_without_groups_fails() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("inventory.yaml");
        std::fs::write(&path, "web:\n  hosts:\n    a: null\n").unwrap();

        let err = UpgradePlan::from_inventory_file(&path, None).unwrap_err();
        assert!(matches!(err, RolloutError::NoPatchGroups(_)));
        assert!(err.to_string().contains("pg1, pg2, pg3"));
    }

    #[test]
    fn inventory_plan_rejects_missing_file() {
        let dir = tempfile::tempdir().unwrap();
        let err = UpgradePlan::from_inventory_file(&dir.path().join("nope.yaml"), Some("pg1"))
            .unwrap_err();
        assert!(matches!(err, RolloutError::File(_)));
    }

    #[test]
    fn summary_display() {
        let summary = RunSummary {
            steps: vec![
                StepOutcome {
                    target: "pg1".to_string(),
                    status: StepStatus::Succeeded,
                    retry_hosts: Vec::new(),
                },
                StepOutcome {
                    target: "pg2".to_string(),
                    status: StepStatus::Failed {
                        reason: "exit code 2".to_string(),
                    },
                    retry_hosts: vec!["db-1".to_string()],
                },
            ],
        };

        assert!(!summary.is_success());
        assert_eq!(summary.failed().count(), 1);
        assert_eq!(
            summary.to_string(),
            "  ✓ pg1\n  ✗ pg2: exit code 2 (retry: db-1)\n"
        );
    }
}
