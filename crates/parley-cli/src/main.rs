mod cli;
mod commands;
mod completions;
mod config;
mod error;
mod output;
mod setup;

use anyhow::Result;
use clap::Parser;
use cli::{Cli, Commands};
use parley_core::paths;
use setup::{build_generator, prepare_core};
use tracing_appender::non_blocking::WorkerGuard;
use tracing_subscriber::EnvFilter;

#[tokio::main]
async fn main() {
    let cli = Cli::parse();
    if let Err(err) = run(cli).await {
        error::handle_error(err);
    }
}

async fn run(cli: Cli) -> Result<()> {
    if let Commands::Completions { shell } = cli.command {
        completions::generate_completions(shell);
        return Ok(());
    }

    let _guard = init_logging(cli.verbose)?;
    let config = config::CliConfig::load();

    let db_path = cli.db_path.clone().or_else(|| config.default.db_path.clone());
    let core = prepare_core(db_path, &config).await?;

    match cli.command {
        Commands::Chat(args) => {
            let offline = args.offline || config.default.offline;
            let generator = build_generator(&config, offline)?;
            commands::chat::run(core, args, generator).await
        }
        Commands::History { command } => commands::history::run(core, command, cli.format).await,
        Commands::Completions { .. } => Ok(()),
    }
}

/// Log to a daily-rolling file under the data directory.
fn init_logging(verbose: bool) -> Result<WorkerGuard> {
    let log_dir = paths::logs_dir()?;
    let file_appender = tracing_appender::rolling::daily(log_dir, "parley.log");
    let (non_blocking, guard) = tracing_appender::non_blocking(file_appender);

    let default_level = if verbose { "debug" } else { "info" };
    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_level));

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(non_blocking)
        .with_ansi(false)
        .with_target(false)
        .with_level(true)
        .init();

    Ok(guard)
}
