use std::path::Path;

use anyhow::{Context, Result};
use patchgrid_core::{Executor, PatchgridConfig};
use patchgrid_groups::{partition_roster, write_group_file};
use patchgrid_inventory::GcloudInventory;

pub fn groups(out_dir: &Path, config: &PatchgridConfig, executor: &dyn Executor) -> Result<()> {
    let roster = GcloudInventory::new(executor, &config.inventory).fetch_roster()?;
    let by_region = partition_roster(&roster, &config.inventory.reserved_role);

    if executor.is_dry_run() {
        println!("{}", serde_json::to_string_pretty(&roster)?);
        println!("{}", serde_json::to_string_pretty(&by_region)?);
    }

    std::fs::create_dir_all(out_dir)
        .with_context(|| format!("creating {}", out_dir.display()))?;
    for (region, groups) in &by_region {
        let path = write_group_file(out_dir, region, groups)?;
        println!(
            "✓ Generated {} ({} groups, {} hosts)",
            path.display(),
            groups.len(),
            groups.host_count()
        );
    }

    if by_region.is_empty() {
        println!("No hosts with a role label in scope; nothing written.");
    }
    Ok(())
}
