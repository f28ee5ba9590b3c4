//! Playbook runner — one ansible-playbook invocation per target.
//!
//! Every invocation gets its own log file under the run's `logs/` directory
//! and the tree/timer callbacks. After it exits, the `.retry` artifact in
//! the playbook directory is scraped into the `skiprole` list.

use std::path::{Path, PathBuf};

use patchgrid_core::config::RunnerConfig;
use patchgrid_core::{
    CommandSpec, Credentials, ExecError, Executor, PatchgridConfig, SkipKind, UpgradeMode,
    validate_file,
};
use serde_json::json;
use tracing::{debug, info, warn};
use walkdir::WalkDir;

use crate::error::{RolloutError, RolloutResult};
use crate::workspace::RunWorkspace;

/// Deploy identity from config, else the `$DEPLOY` value handed in by the caller.
pub fn deploy_credentials(
    config: &PatchgridConfig,
    env_user: Option<String>,
) -> RolloutResult<Credentials> {
    let user = config
        .runner
        .deploy_user
        .clone()
        .or(env_user)
        .filter(|user| !user.trim().is_empty())
        .ok_or(RolloutError::NoDeployUser)?;
    Ok(Credentials::Deploy {
        user,
        private_key: config.deploy_key()?,
    })
}

/// Per-target artifact name, safe for host patterns like `web-1,web-2`.
fn artifact_name(target: &str, ext: &str) -> String {
    let safe: String = target
        .chars()
        .map(|c| {
            if c.is_ascii_alphanumeric() || matches!(c, '-' | '_' | '.' | ',') {
                c
            } else {
                '_'
            }
        })
        .collect();
    format!("patch-{safe}.{ext}")
}

pub struct PlaybookRunner<'a> {
    executor: &'a dyn Executor,
    config: &'a RunnerConfig,
    workspace: &'a RunWorkspace,
    credentials: Credentials,
    mode: UpgradeMode,
}

impl<'a> PlaybookRunner<'a> {
    pub fn new(
        executor: &'a dyn Executor,
        config: &'a RunnerConfig,
        workspace: &'a RunWorkspace,
        credentials: Credentials,
        mode: UpgradeMode,
    ) -> Self {
        Self {
            executor,
            config,
            workspace,
            credentials,
            mode,
        }
    }

    pub fn workspace(&self) -> &RunWorkspace {
        self.workspace
    }

    pub fn command(&self, target: &str, inventory: &Path) -> CommandSpec {
        let logs_dir = self.workspace.logs_dir();
        let log_path = logs_dir.join(artifact_name(target, "log"));

        CommandSpec::new(&self.config.program)
            .env("ANSIBLE_RETRY_FILES_ENABLED", "True")
            .env("ANSIBLE_CALLBACKS_ENABLED", "tree,timer")
            .env("ANSIBLE_LOG_PATH", log_path.display().to_string())
            .env("ANSIBLE_DISPLAY_SKIPPED_HOSTS", "False")
            .env("ANSIBLE_CALLBACK_TREE_DIR", logs_dir.display().to_string())
            .arg("-i")
            .arg(inventory.display().to_string())
            .arg("-i")
            .arg(self.config.static_inventory.display().to_string())
            .args(self.credentials.args())
            .arg("-e")
            .arg(format!("@{}", self.workspace.setup_vars_file().display()))
            .arg("-e")
            .arg(json!({ "host_list": [target] }).to_string())
            .arg("-e")
            .arg(self.mode.extra_vars().to_string())
            .arg(self.config.playbook_path().display().to_string())
    }

    /// Run the playbook against `target` and block until it exits.
    pub fn run(&self, target: &str, inventory: &Path) -> Result<(), ExecError> {
        let cmd = self.command(target, inventory);
        debug!(group = target, command = %cmd, "running playbook");
        self.executor.run(&cmd)
    }

    /// First readable `*.retry` file in the playbook directory, by name.
    pub fn find_retry_file(&self) -> Option<PathBuf> {
        WalkDir::new(&self.config.playbook_dir)
            .min_depth(1)
            .max_depth(1)
            .sort_by_file_name()
            .into_iter()
            .filter_map(Result::ok)
            .map(|entry| entry.into_path())
            .filter(|path| path.extension().is_some_and(|ext| ext == "retry"))
            .find(|path| match validate_file(path) {
                Ok(()) => true,
                Err(e) => {
                    debug!(error = %e, "ignoring retry file");
                    false
                }
            })
    }

    /// Move the hosts named in the retry artifact onto the `skiprole` list,
    /// then file the artifact under `logs/` next to the target's log.
    ///
    /// Returns the hosts listed in the artifact, already skipped or not. A
    /// dry run only reads the artifact and leaves the skip list and the
    /// playbook directory untouched.
    pub fn process_retry_file(&self, target: &str) -> RolloutResult<Vec<String>> {
        let Some(path) = self.find_retry_file() else {
            return Ok(Vec::new());
        };

        let content = std::fs::read_to_string(&path).map_err(RolloutError::io(&path))?;
        let hosts: Vec<String> = content
            .lines()
            .map(str::trim)
            .filter(|line| !line.is_empty())
            .map(str::to_string)
            .collect();

        if self.executor.is_dry_run() {
            info!(
                retry_file = %path.display(),
                hosts = hosts.len(),
                "dry run, leaving retry file in place"
            );
            return Ok(hosts);
        }

        if !hosts.is_empty() {
            let added = self
                .workspace
                .skip_list(SkipKind::Role)
                .append(&hosts)?;
            info!(
                retry_file = %path.display(),
                hosts = hosts.len(),
                added,
                "processed retry file into skiprole"
            );
            if added < hosts.len() {
                warn!(
                    already_skipped = hosts.len() - added,
                    "retry file lists hosts that were already skipped"
                );
            }
        }

        let archived = self
            .workspace
            .logs_dir()
            .join(artifact_name(target, "retry"));
        if let Err(e) = archive_artifact(&path, &archived) {
            warn!(
                retry_file = %path.display(),
                dest = %archived.display(),
                error = %e,
                "could not move retry file into logs"
            );
        }
        Ok(hosts)
    }
}

/// Rename, or copy and remove when `from` and `to` sit on different filesystems.
fn archive_artifact(from: &Path, to: &Path) -> std::io::Result<()> {
    if std::fs::rename(from, to).is_ok() {
        return Ok(());
    }
    std::fs::copy(from, to)?;
    std::fs::remove_file(from)
}
