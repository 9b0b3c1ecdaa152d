//! CLI argument parsing with clap

use std::path::PathBuf;

use brokkr_core::Platform;
use clap::{Args, Parser, Subcommand};

/// Brokkr - Java runtime discovery and management
#[derive(Parser, Debug)]
#[command(name = "brokkr")]
#[command(author, version, about, long_about = None)]
#[command(propagate_version = true)]
pub struct Cli {
    /// Increase verbosity (-v, -vv, -vvv)
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    pub verbose: u8,

    /// Suppress output
    #[arg(short, long, global = true)]
    pub quiet: bool,

    /// Path to the runtime settings file (default: ~/.brokkr/java-settings.json)
    #[arg(short, long, global = true)]
    pub config: Option<PathBuf>,

    /// Game directory whose local runtime store should be used
    #[arg(short, long, global = true)]
    pub game_dir: Option<PathBuf>,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand, Debug)]
pub enum Commands {
    /// List every discovered runtime
    List(ListArgs),

    /// Probe a java executable for its identity
    Probe(ProbeArgs),

    /// Pick the best runtime for a game version
    Select(SelectArgs),

    /// Register a java executable
    Add(AddArgs),

    /// Remove a runtime from the list
    Remove(RemoveArgs),

    /// Install a runtime archive into the managed store
    Install(InstallArgs),

    /// Uninstall a managed runtime
    Uninstall(UninstallArgs),
}

#[derive(Args, Debug)]
pub struct ListArgs {
    /// Re-probe every candidate instead of trusting cached results
    #[arg(long)]
    pub refresh: bool,
}

#[derive(Args, Debug)]
pub struct ProbeArgs {
    /// Path to a java executable
    pub executable: PathBuf,

    /// Skip the release-file fast path and force a subprocess probe
    #[arg(long)]
    pub slow: bool,
}

#[derive(Args, Debug)]
pub struct SelectArgs {
    /// Target game version, e.g. 1.20.4
    #[arg(long)]
    pub game: Option<String>,

    /// Forge patch version used by the target, if any
    #[arg(long)]
    pub forge: Option<String>,

    /// LaunchWrapper version used by the target, if any
    #[arg(long)]
    pub launch_wrapper: Option<String>,

    /// Java major version declared by the version metadata
    #[arg(long)]
    pub declared_java: Option<u32>,
}

#[derive(Args, Debug)]
pub struct AddArgs {
    /// Path to a java executable
    pub executable: PathBuf,
}

#[derive(Args, Debug)]
pub struct RemoveArgs {
    /// Executable path as shown by `brokkr list`
    pub executable: PathBuf,
}

#[derive(Args, Debug)]
pub struct InstallArgs {
    /// Path to a .tar.gz runtime archive
    pub archive: PathBuf,

    /// Name to install under, e.g. java-runtime-gamma
    #[arg(long)]
    pub name: String,

    /// Target platform (default: the host platform)
    #[arg(long)]
    pub platform: Option<Platform>,

    /// Install into the game directory's local store instead of the
    /// global one
    #[arg(long)]
    pub local: bool,
}

#[derive(Args, Debug)]
pub struct UninstallArgs {
    /// Installation name as used at install time
    pub name: String,

    /// Target platform (default: the host platform)
    #[arg(long)]
    pub platform: Option<Platform>,

    /// Uninstall from the game directory's local store
    #[arg(long)]
    pub local: bool,
}
