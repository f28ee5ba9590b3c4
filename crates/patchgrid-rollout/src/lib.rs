//! patchgrid rolling upgrades — one patch group at a time.
//!
//! This crate drives the upgrade playbook across a region's patch groups,
//! strictly in sequence. A failing group is recorded and the run moves on;
//! hosts the runner lists in its `.retry` artifact are added to the skip
//! list so later runs leave them out.
//!
//! # Components
//!
//! - **`workspace`** — Per-run directory tree and `setupvars.yaml`
//! - **`skiplist`** — Append-only, deduplicated skip files
//! - **`packages`** — `packages.yaml` manifest
//! - **`runner`** — Playbook invocation and retry scraping
//! - **`driver`** — Target planning and the sequential group loop
//! - **`archive`** — Upload of a run directory to Cloud Storage

pub mod archive;
pub mod driver;
pub mod error;
pub mod packages;
pub mod runner;
pub mod skiplist;
pub mod workspace;

pub use archive::{ArchiveUploader, GcsDestination};
pub use driver::{RunSummary, StepOutcome, StepStatus, UpgradeDriver, UpgradePlan};
pub use error::{RolloutError, RolloutResult};
pub use packages::{PackageManifest, split_csv};
pub use runner::{PlaybookRunner, deploy_credentials};
pub use skiplist::SkipList;
pub use workspace::RunWorkspace;
