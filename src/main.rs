//! cairn - build artifact cache for buildpacks
//!
//! CLI entry point that dispatches to subcommands.

use cairn::cli::{Cli, Commands};
use cairn::config::{Config, ConfigManager};
use cairn::error::CairnResult;
use clap::Parser;
use console::style;
use std::process::ExitCode;
use tracing::debug;
use tracing_subscriber::EnvFilter;

#[tokio::main]
async fn main() -> ExitCode {
    match run().await {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            eprintln!("{} {}", style("Error:").red().bold(), e);
            if let Some(hint) = e.hint() {
                eprintln!("{} {}", style("Hint:").yellow(), hint);
            }
            ExitCode::FAILURE
        }
    }
}

fn init_logging(verbose: u8, config: &Config) {
    // 0 = warn, 1 = info, 2+ = debug
    let filter = match verbose {
        0 => EnvFilter::new("cairn=warn"),
        1 => EnvFilter::new("cairn=info"),
        _ => EnvFilter::new("cairn=debug"),
    };

    if config.general.json_logs() {
        tracing_subscriber::fmt()
            .json()
            .with_env_filter(filter)
            .with_writer(std::io::stderr)
            .init();
    } else {
        tracing_subscriber::fmt()
            .with_env_filter(filter)
            .with_writer(std::io::stderr)
            .with_target(false)
            .without_time()
            .init();
    }
}

async fn run() -> CairnResult<()> {
    let cli = Cli::parse();

    let config_manager = match cli.config {
        Some(ref path) => ConfigManager::with_path(path.clone()),
        None => ConfigManager::new(),
    };
    let config = config_manager.load().await?;

    init_logging(cli.verbose, &config);
    debug!("Using config {}", config_manager.path().display());

    match cli.command {
        Commands::Status(args) => cairn::cli::commands::status(args, &config).await,
        Commands::Dirs(args) => cairn::cli::commands::dirs(args, &config).await,
        Commands::Restore(args) => cairn::cli::commands::restore(args, &config).await,
        Commands::Save(args) => cairn::cli::commands::save(args, &config).await,
        Commands::Clear(args) => cairn::cli::commands::clear(args, &config).await,
        Commands::Sign(args) => cairn::cli::commands::sign(args, &config).await,
        Commands::BeforeBuild(args) => cairn::cli::commands::before_build(args, &config).await,
        Commands::AfterBuild(args) => cairn::cli::commands::after_build(args, &config).await,
        Commands::Info(args) => cairn::cli::commands::info(args, &config).await,
        Commands::Config(args) => {
            cairn::cli::commands::config(args, &config, &config_manager).await
        }
    }
}
