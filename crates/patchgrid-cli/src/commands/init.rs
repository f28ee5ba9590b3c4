use std::path::Path;

use anyhow::{Context, bail};
use patchgrid_core::PatchgridConfig;
use patchgrid_core::config::DEFAULT_CONFIG_FILE;

pub fn init(path: &Path) -> anyhow::Result<()> {
    let output = path.join(DEFAULT_CONFIG_FILE);
    if output.exists() {
        bail!("{} already exists", output.display());
    }

    let config = PatchgridConfig::default().to_toml_string()?;
    std::fs::write(&output, config).with_context(|| format!("writing {}", output.display()))?;
    println!("✓ Generated {}", output.display());
    Ok(())
}
