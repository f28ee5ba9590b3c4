use std::path::PathBuf;

use clap::{Parser, Subcommand};
use patchgrid_core::{DryRunExecutor, Executor, PatchgridConfig, SystemExecutor};

mod commands;

#[derive(Parser)]
#[command(
    name = "patchctl",
    about = "patchgrid — rolling package upgrades across a GCE fleet",
    version,
    propagate_version = true,
)]
struct Cli {
    /// Print side-effecting commands instead of running them.
    /// Read-only gcloud queries still run.
    #[arg(long, global = true)]
    debug: bool,
    /// Config file (default: ./patchgrid.toml when present)
    #[arg(long, global = true)]
    config: Option<PathBuf>,
    /// Raise log verbosity to debug
    #[arg(short, long, global = true)]
    verbose: bool,
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Upgrade packages one patch group at a time.
    ///
    /// Without --upgrade only the pre-checks run. Groups run in order;
    /// a failed group is reported and the run moves on to the next one.
    Patch(commands::patch::PatchArgs),
    /// Fetch the fleet and write a patch-group file per region
    Groups {
        /// Output directory (default: current directory)
        #[arg(short, long, default_value = ".")]
        out_dir: PathBuf,
    },
    /// Write a packages.yaml manifest
    Packages {
        /// Comma-separated package names
        packages: String,
        /// Folder to write into (default: current directory)
        #[arg(short, long, default_value = ".")]
        folder: PathBuf,
    },
    /// Upload a folder to Cloud Storage, creating the bucket if needed
    Upload {
        folder: PathBuf,
        /// Destination, gs://<bucket>[/<path>]
        dest: String,
    },
    /// Generate a patchgrid.toml with the default settings
    Init {
        #[arg(short, long, default_value = ".")]
        path: PathBuf,
    },
}

fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    let default_level = if cli.verbose { "patchgrid=debug" } else { "patchgrid=info" };
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::from_default_env()
                .add_directive(default_level.parse()?)
        )
        .init();

    let executor: Box<dyn Executor> = if cli.debug {
        Box::new(DryRunExecutor)
    } else {
        Box::new(SystemExecutor)
    };

    let config_path = cli.config;
    let load_config = || PatchgridConfig::load(config_path.as_deref());

    match cli.command {
        Commands::Patch(args) => {
            commands::patch::patch(&args, &load_config()?, executor.as_ref())
        }
        Commands::Groups { out_dir } => {
            commands::groups::groups(&out_dir, &load_config()?, executor.as_ref())
        }
        Commands::Packages { packages, folder } => {
            commands::packages::packages(&packages, &folder)
        }
        Commands::Upload { folder, dest } => {
            commands::upload::upload(&folder, &dest, executor.as_ref())
        }
        Commands::Init { path } => commands::init::init(&path),
    }
}
