use std::path::Path;

use anyhow::Context;
use patchgrid_core::Executor;
use patchgrid_rollout::{ArchiveUploader, GcsDestination};

pub fn upload(folder: &Path, dest: &str, executor: &dyn Executor) -> anyhow::Result<()> {
    let dest = GcsDestination::parse(dest)?;
    ArchiveUploader::new(executor)
        .upload(folder, &dest)
        .with_context(|| format!("uploading {}", folder.display()))?;
    println!("✓ Uploaded {} to {}", folder.display(), dest.url());
    Ok(())
}
