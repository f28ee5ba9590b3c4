use std::path::Path;

use patchgrid_rollout::PackageManifest;

pub fn packages(list: &str, folder: &Path) -> anyhow::Result<()> {
    let manifest = PackageManifest::from_csv(list)?;
    let path = manifest.write_to(folder)?;
    println!("✓ Generated {} ({} packages)", path.display(), manifest.packages.len());
    Ok(())
}
