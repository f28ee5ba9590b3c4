//! Shared types used across patchgrid crates.

use std::path::PathBuf;

use indexmap::IndexMap;
use serde::{Deserialize, Serialize};
use serde_json::{Value, json};
use tracing::{info, warn};

/// Role → hosts for a single region, in roster order.
pub type RoleHosts = IndexMap<String, Vec<String>>;

/// Region → role → hosts. Keys keep first-seen order.
pub type HostRoster = IndexMap<String, RoleHosts>;

/// A compute instance as seen by the inventory fetcher.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Instance {
    pub name: String,
    pub region: String,
    pub role: Option<String>,
}

/// Name of patch group `index` (1-based), e.g. `pg3`.
pub fn group_name(index: u32) -> String {
    format!("pg{index}")
}

/// What the upgrade playbook should do on each host.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum UpgradeMode {
    /// Pre-checks and host validations only.
    #[default]
    Precheck,
    /// Report current package versions and what would change.
    PackageCheck,
    /// Upgrade packages and reboot hosts if required.
    Upgrade,
    /// Upgrade packages, never reboot.
    UpgradePackagesOnly,
}

impl UpgradeMode {
    /// Resolve the mode from the CLI flags.
    ///
    /// `pkgcheck` wins over any upgrade flag; `upgrade_pkgs_only` wins over `upgrade`.
    pub fn from_flags(pkgcheck: bool, upgrade: bool, upgrade_pkgs_only: bool) -> Self {
        if pkgcheck {
            if upgrade || upgrade_pkgs_only {
                warn!("upgrade flag cannot be used with pkgcheck, running pkgcheck only");
            }
            return UpgradeMode::PackageCheck;
        }
        if upgrade_pkgs_only {
            info!("upgrade packages only, skipping reboots even if required");
            return UpgradeMode::UpgradePackagesOnly;
        }
        if upgrade {
            info!("upgrade packages and reboot hosts if required");
            return UpgradeMode::Upgrade;
        }
        info!("running pre-checks and host validations");
        UpgradeMode::Precheck
    }

    /// Extra variables handed to the playbook.
    pub fn extra_vars(&self) -> Value {
        match self {
            UpgradeMode::PackageCheck => json!({ "run_pkgcheck": true }),
            UpgradeMode::UpgradePackagesOnly => json!({
                "run_precheck": true,
                "run_upgrade": true,
                "reboot_if_required": false,
            }),
            UpgradeMode::Upgrade => json!({ "run_precheck": true, "run_upgrade": true }),
            UpgradeMode::Precheck => json!({ "run_precheck": true, "run_upgrade": false }),
        }
    }
}

/// How the runner authenticates against the hosts.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Credentials {
    /// Pass nothing; rely on the runner's own configuration.
    None,
    /// Prompt for the SSH connection password (`-k`).
    AskPass,
    /// Prompt for the SSH and become passwords (`-kK`).
    AskPassBecome,
    /// Shared deploy identity.
    Deploy { user: String, private_key: PathBuf },
}

impl Credentials {
    pub fn args(&self) -> Vec<String> {
        match self {
            Credentials::None => Vec::new(),
            Credentials::AskPass => vec!["-k".to_string()],
            Credentials::AskPassBecome => vec!["-kK".to_string()],
            Credentials::Deploy { user, private_key } => vec![
                "--user".to_string(),
                user.clone(),
                "--private-key".to_string(),
                private_key.display().to_string(),
            ],
        }
    }
}

/// Which skip file a name goes to.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SkipKind {
    Host,
    Role,
}

impl SkipKind {
    pub fn file_name(&self) -> &'static str {
        match self {
            SkipKind::Host => "skiphost",
            SkipKind::Role => "skiprole",
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_group_name() {
        assert_eq!(group_name(1), "pg1");
        assert_eq!(group_name(12), "pg12");
    }

    #[test]
    fn test_mode_resolution() {
        assert_eq!(UpgradeMode::from_flags(false, false, false), UpgradeMode::Precheck);
        assert_eq!(UpgradeMode::from_flags(false, true, false), UpgradeMode::Upgrade);
        assert_eq!(
            UpgradeMode::from_flags(false, true, true),
            UpgradeMode::UpgradePackagesOnly
        );
        assert_eq!(UpgradeMode::from_flags(true, true, true), UpgradeMode::PackageCheck);
    }

    #[test]
    fn test_extra_vars() {
        assert_eq!(
            UpgradeMode::PackageCheck.extra_vars().to_string(),
            r#"{"run_pkgcheck":true}"#
        );
        assert_eq!(
            UpgradeMode::UpgradePackagesOnly.extra_vars().to_string(),
            r#"{"run_precheck":true,"run_upgrade":true,"reboot_if_required":false}"#
        );
        assert_eq!(
            UpgradeMode::Precheck.extra_vars()["run_upgrade"],
            Value::Bool(false)
        );
    }

    #[test]
    fn test_credential_args() {
        assert!(Credentials::None.args().is_empty());
        assert_eq!(Credentials::AskPass.args(), vec!["-k"]);
        assert_eq!(Credentials::AskPassBecome.args(), vec!["-kK"]);

        let deploy = Credentials::Deploy {
            user: "deploy".to_string(),
            private_key: PathBuf::from("/home/ops/.ssh/deploy"),
        };
        assert_eq!(
            deploy.args(),
            vec!["--user", "deploy", "--private-key", "/home/ops/.ssh/deploy"]
        );
    }
}
