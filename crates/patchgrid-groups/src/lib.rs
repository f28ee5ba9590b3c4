//! patchgrid patch groups — partitioning and inventory files.
//!
//! Hosts of a region are dealt into numbered patch groups (`pg1`, `pg2`, ...)
//! so an upgrade can be rolled out one group at a time. Group 1 receives the
//! first host of every role, group 2 the second, and so on; hosts of the
//! reserved sharded-database role never leave groups 1 and 2.
//!
//! # Components
//!
//! - **`partition`** — Group partitioner (round-robin transpose, reserved role split)
//! - **`file`** — `patch-groups-<region>.yaml` emitter and reader

pub mod file;
pub mod partition;

pub use file::{GroupFileError, declared_groups, group_file_name, render_groups, write_group_file};
pub use partition::{PatchGroups, create_patch_groups, partition_roster};
