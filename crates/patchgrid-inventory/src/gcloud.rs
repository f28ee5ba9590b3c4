//! gcloud-backed inventory queries.

use patchgrid_core::config::InventoryConfig;
use patchgrid_core::{CommandSpec, Executor, GCLOUD, HostRoster, Instance};
use tracing::{debug, info};

use crate::error::InventoryError;
use crate::roster::{build_roster, parse_instances};
use crate::scope::Scope;

pub struct GcloudInventory<'a> {
    executor: &'a dyn Executor,
    config: &'a InventoryConfig,
}

impl<'a> GcloudInventory<'a> {
    pub fn new(executor: &'a dyn Executor, config: &'a InventoryConfig) -> Self {
        Self { executor, config }
    }

    /// Configured project, else the active gcloud configuration's project.
    pub fn project(&self) -> Result<String, InventoryError> {
        if let Some(project) = &self.config.project {
            return Ok(project.clone());
        }

        let cmd = CommandSpec::new(GCLOUD).args(["config", "get-value", "project"]);
        let project = self.executor.query(&cmd)?.trim().to_string();
        if project.is_empty() {
            return Err(InventoryError::NoProject);
        }
        Ok(project)
    }

    pub fn list_command(&self, project: &str, scope: &Scope) -> CommandSpec {
        CommandSpec::new(GCLOUD).args([
            "compute".to_string(),
            "instances".to_string(),
            "list".to_string(),
            format!("--project={project}"),
            format!("--filter={}", scope.filter_expression()),
            "--sort-by=name".to_string(),
            "--format=json".to_string(),
        ])
    }

    /// All in-scope, non-terminated instances, sorted by name.
    pub fn fetch_instances(&self) -> Result<Vec<Instance>, InventoryError> {
        let project = self.project()?;
        let scope = Scope::from_config(self.config)?;

        let cmd = self.list_command(&project, &scope);
        let listing = self.executor.query(&cmd)?;
        let instances = parse_instances(&listing, self.config)?;

        info!(
            project = %project,
            instances = instances.len(),
            "listed compute instances"
        );
        Ok(instances)
    }

    pub fn fetch_roster(&self) -> Result<HostRoster, InventoryError> {
        let roster = build_roster(&self.fetch_instances()?);
        for (region, hosts_by_role) in &roster {
            debug!(
                region = %region,
                roles = hosts_by_role.len(),
                hosts = hosts_by_role.values().map(Vec::len).sum::<usize>(),
                "built host roster"
            );
        }
        Ok(roster)
    }
}
