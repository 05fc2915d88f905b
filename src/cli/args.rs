//! CLI argument definitions using clap derive

use clap::{ArgAction, Args, Parser, Subcommand, ValueEnum};
use std::path::PathBuf;

/// cairn - build artifact cache for buildpacks
///
/// Restores cached dependency directories before a build and saves them
/// afterwards, keyed by the runtime signature that produced them.
#[derive(Parser, Debug)]
#[command(name = "cairn")]
#[command(author, version, about, long_about = None)]
#[command(propagate_version = true)]
pub struct Cli {
    /// Subcommand to execute
    #[command(subcommand)]
    pub command: Commands,

    /// Increase verbosity (-v info, -vv debug)
    #[arg(short, long, global = true, action = ArgAction::Count)]
    pub verbose: u8,

    /// Configuration file path
    #[arg(short, long, global = true, env = "CAIRN_CONFIG")]
    pub config: Option<PathBuf>,
}

/// Available commands
#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Show whether the cache can be restored for this build
    Status(StatusArgs),

    /// List the cache directories the project declares
    Dirs(DirsArgs),

    /// Restore cached directories into the workspace
    Restore(TransferArgs),

    /// Save workspace directories into the cache
    Save(TransferArgs),

    /// Remove everything from the cache
    Clear(ClearArgs),

    /// Record the current signature in the cache
    Sign(SignArgs),

    /// Pre-build step: restore the cache if it is valid
    BeforeBuild(BeforeBuildArgs),

    /// Post-build step: clear, save and sign the cache
    AfterBuild(AfterBuildArgs),

    /// Show what the cache currently holds
    Info(InfoArgs),

    /// Show or edit configuration
    Config(ConfigArgs),
}

/// Workspace and cache store locations
#[derive(Args, Debug, Clone)]
pub struct Locations {
    /// Build workspace (app directory)
    #[arg(short, long, env = "CAIRN_WORKSPACE", default_value = ".")]
    pub workspace: PathBuf,

    /// Persistent cache store directory
    #[arg(short, long, env = "CAIRN_STORE")]
    pub store: PathBuf,
}

/// Signature of the current build environment
#[derive(Args, Debug, Clone)]
pub struct SignatureArgs {
    /// Override the signature computed from package.json engines
    #[arg(long, env = "CAIRN_SIGNATURE")]
    pub signature: Option<String>,
}

/// Arguments for the status command
#[derive(Parser, Debug)]
pub struct StatusArgs {
    #[command(flatten)]
    pub locations: Locations,

    #[command(flatten)]
    pub signature: SignatureArgs,

    /// Treat the cache as invalidated
    #[arg(long)]
    pub invalidate: bool,

    /// Output format
    #[arg(short, long, default_value = "text")]
    pub format: OutputFormat,
}

/// Arguments for the dirs command
#[derive(Parser, Debug)]
pub struct DirsArgs {
    /// Build workspace (app directory)
    #[arg(short, long, env = "CAIRN_WORKSPACE", default_value = ".")]
    pub workspace: PathBuf,

    /// Apply the default directory when none are declared
    #[arg(long)]
    pub resolved: bool,
}

/// Arguments for the restore and save commands
#[derive(Parser, Debug)]
pub struct TransferArgs {
    #[command(flatten)]
    pub locations: Locations,

    /// Directories to transfer (defaults to the project's selection)
    pub paths: Vec<String>,
}

/// Arguments for the clear command
#[derive(Parser, Debug)]
pub struct ClearArgs {
    #[command(flatten)]
    pub locations: Locations,

    /// Skip confirmation prompt
    #[arg(short, long)]
    pub yes: bool,
}

/// Arguments for the sign command
#[derive(Parser, Debug)]
pub struct SignArgs {
    #[command(flatten)]
    pub locations: Locations,

    #[command(flatten)]
    pub signature: SignatureArgs,
}

/// Arguments for the before-build command
#[derive(Parser, Debug)]
pub struct BeforeBuildArgs {
    #[command(flatten)]
    pub locations: Locations,

    #[command(flatten)]
    pub signature: SignatureArgs,

    /// Ignore the existing cache for this build
    #[arg(long, env = "CAIRN_INVALIDATE")]
    pub invalidate: bool,
}

/// Arguments for the after-build command
#[derive(Parser, Debug)]
pub struct AfterBuildArgs {
    #[command(flatten)]
    pub locations: Locations,

    #[command(flatten)]
    pub signature: SignatureArgs,
}

/// Arguments for the info command
#[derive(Parser, Debug)]
pub struct InfoArgs {
    /// Persistent cache store directory
    #[arg(short, long, env = "CAIRN_STORE")]
    pub store: PathBuf,

    /// Output format
    #[arg(short, long, default_value = "text")]
    pub format: OutputFormat,
}

/// Arguments for the config command
#[derive(Parser, Debug)]
pub struct ConfigArgs {
    /// Subcommand for config
    #[command(subcommand)]
    pub action: Option<ConfigAction>,
}

/// Config subcommands
#[derive(Subcommand, Debug)]
pub enum ConfigAction {
    /// Show current configuration
    Show,

    /// Show configuration file path
    Path,

    /// Initialize default configuration
    Init {
        /// Overwrite existing configuration
        #[arg(short, long)]
        force: bool,
    },

    /// Set a configuration value
    Set {
        /// Configuration key (e.g., cache.format_version)
        key: String,
        /// Value to set
        value: String,
    },
}

/// Output format for status and info
#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum OutputFormat {
    /// Human-readable build log lines
    Text,
    /// JSON output
    Json,
}
