//! `patchctl patch` — one rolling upgrade run.
//!
//! Sets up a timestamped run directory, seeds the skip lists and package
//! manifest, plans the targets and hands them to the driver. Optionally
//! archives the run directory once the last group has finished.

use std::path::PathBuf;

use anyhow::{Context, Result, bail};
use clap::Args;
use patchgrid_core::{Credentials, Executor, PatchgridConfig, Region, SkipKind, UpgradeMode};
use patchgrid_rollout::workspace::DEFAULT_REGION;
use patchgrid_rollout::{
    ArchiveUploader, GcsDestination, PackageManifest, PlaybookRunner, RunWorkspace, UpgradeDriver,
    UpgradePlan, deploy_credentials, split_csv,
};

#[derive(Args)]
pub struct PatchArgs {
    /// Comma-separated packages to upgrade
    packages: String,
    /// Region to patch, e.g. us-central1
    #[arg(short, long, required_unless_present = "inventory")]
    region: Option<String>,
    /// Inventory file to use instead of fetching the fleet.
    /// Its pg<N> groups become the targets.
    #[arg(short, long)]
    inventory: Option<PathBuf>,
    /// Run once against this host pattern instead of every patch group
    #[arg(short, long)]
    grouplist: Option<String>,
    /// Only report which packages would change
    #[arg(long)]
    pkgcheck: bool,
    /// Upgrade, rebooting hosts that need it
    #[arg(long)]
    upgrade: bool,
    /// Upgrade without rebooting
    #[arg(long)]
    upgradepkgsonly: bool,
    /// Pass no credential arguments to the playbook
    #[arg(long, conflicts_with_all = ["askpass", "askpassbecome"])]
    nocreds: bool,
    /// Prompt for the SSH password
    #[arg(long, conflicts_with = "askpassbecome")]
    askpass: bool,
    /// Prompt for the SSH and become passwords
    #[arg(long)]
    askpassbecome: bool,
    /// Comma-separated hosts to skip
    #[arg(long, value_name = "CSV")]
    skiphost: Option<String>,
    /// Comma-separated roles to skip
    #[arg(long, value_name = "CSV")]
    skiprole: Option<String>,
    /// Upload the run directory here when done
    #[arg(long, value_name = "gs://BUCKET/PATH")]
    archive: Option<String>,
}

impl PatchArgs {
    fn mode(&self) -> UpgradeMode {
        UpgradeMode::from_flags(self.pkgcheck, self.upgrade, self.upgradepkgsonly)
    }

    /// Explicit flags first, else the deploy identity.
    fn credentials(&self, config: &PatchgridConfig) -> Result<Credentials> {
        if self.nocreds {
            return Ok(Credentials::None);
        }
        if self.askpass {
            return Ok(Credentials::AskPass);
        }
        if self.askpassbecome {
            return Ok(Credentials::AskPassBecome);
        }
        Ok(deploy_credentials(config, std::env::var("DEPLOY").ok())?)
    }
}

pub fn patch(args: &PatchArgs, config: &PatchgridConfig, executor: &dyn Executor) -> Result<()> {
    // Validate everything before touching the filesystem
    let region = args.region.as_deref().map(Region::parse).transpose()?;
    let manifest = PackageManifest::from_csv(&args.packages)?;
    let archive = args.archive.as_deref().map(GcsDestination::parse).transpose()?;
    let credentials = args.credentials(config)?;
    let mode = args.mode();

    let root = config.workspace_root()?;
    let workspace = RunWorkspace::timestamped(
        &root,
        region.as_ref().map_or(DEFAULT_REGION, Region::as_str),
    );
    workspace
        .create()
        .with_context(|| format!("creating run directory under {}", root.display()))?;
    workspace.write_setup_vars()?;
    println!("✓ Created {}", workspace.dir().display());

    for (kind, list) in [(SkipKind::Host, &args.skiphost), (SkipKind::Role, &args.skiprole)] {
        if let Some(list) = list {
            let skip_list = workspace.skip_list(kind);
            let added = skip_list.append(split_csv(list))?;
            println!("  Skipping {added} more in {}", skip_list.path().display());
        }
    }

    let packages_file = manifest.write_to(workspace.vars_dir())?;
    println!("  Packages: {}", manifest.packages.join(", "));

    let grouplist = args.grouplist.as_deref();
    let plan = match (&args.inventory, &region) {
        (Some(inventory), _) => UpgradePlan::from_inventory_file(inventory, grouplist)?,
        (None, Some(region)) => {
            UpgradePlan::from_region(executor, config, &workspace, region, grouplist)?
        }
        (None, None) => bail!("either --region or --inventory is required"),
    };
    println!("  Inventory: {}", plan.inventory.display());
    println!("  Targets: {}", plan.targets.join(", "));
    tracing::debug!(packages = %packages_file.display(), "wrote package manifest");

    let runner = PlaybookRunner::new(executor, &config.runner, &workspace, credentials, mode);
    let summary = UpgradeDriver::new(runner).run(&plan);
    print!("{summary}");

    if let Some(dest) = &archive {
        ArchiveUploader::new(executor)
            .upload(workspace.dir(), dest)
            .with_context(|| format!("archiving {}", workspace.dir().display()))?;
        println!("✓ Archived to {}", dest.url());
    }

    let failed = summary.failed().count();
    if failed > 0 {
        bail!(
            "{failed} of {} targets failed; logs in {}",
            summary.steps.len(),
            workspace.logs_dir().display()
        );
    }
    println!("✓ Patched {} targets", summary.steps.len());
    Ok(())
}
