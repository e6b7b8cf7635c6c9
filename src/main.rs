//! vres - variant selection and artifact resolution
//!
//! CLI entry point that dispatches to subcommands.

use clap::Parser;
use console::style;
use std::process::ExitCode;
use tracing_subscriber::EnvFilter;
use variant_resolve::cli::{Cli, Commands};
use variant_resolve::config::ConfigManager;
use variant_resolve::error::{ResolveError, ResolveResult};

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

async fn run() -> ResolveResult<()> {
    let cli = Cli::parse();

    // An explicit --config must exist unless the config command is creating it
    let editing_config = matches!(cli.command, Commands::Config(_));
    let config_manager = match cli.config {
        Some(ref path) if !path.exists() && !editing_config => {
            return Err(ResolveError::ConfigNotFound(path.clone()))
        }
        Some(ref path) => ConfigManager::with_path(path.clone()),
        None => ConfigManager::new(),
    };
    let config = config_manager.load().await?;

    // Initialize logging: 0 = warn, 1 = info, 2+ = debug
    let filter = match cli.verbose {
        0 => EnvFilter::new("vres=warn,variant_resolve=warn"),
        1 => EnvFilter::new("vres=info,variant_resolve=info"),
        _ => EnvFilter::new("vres=debug,variant_resolve=debug"),
    };

    if config.general.log_format == "json" {
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

    // Dispatch to command
    match cli.command {
        Commands::Select(args) => variant_resolve::cli::commands::select(args, &config).await,
        Commands::Resolve(args) => variant_resolve::cli::commands::resolve(args, &config).await,
        Commands::Config(args) => {
            variant_resolve::cli::commands::config(args, &config_manager, &config).await
        }
    }
}
