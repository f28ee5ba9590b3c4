pub mod config;
pub mod exec;
pub mod files;
pub mod region;
pub mod types;

#[cfg(any(test, feature = "testing"))]
pub mod testing;

pub use config::{ConfigError, PatchgridConfig};
pub use files::{FileError, validate_file};
pub use exec::{CommandSpec, GCLOUD, DryRunExecutor, ExecError, Executor, SystemExecutor};
pub use region::{Region, RegionError};
pub use types::*;
