//! Leaflet CLI - notes, folders and sync from the terminal
//!
//! `leaflet serve` exposes the same request handlers a desktop shell uses,
//! as JSON lines over stdin/stdout.

mod cli;
mod commands;
mod error;
#[cfg(test)]
mod tests;

use clap::Parser;
use tokio::io::BufReader;

use crate::cli::{Cli, Commands};
use crate::commands::common::AppContext;
use crate::commands::completions::run_completions;
use crate::commands::folder::run_folder;
use crate::commands::note::run_note;
use crate::commands::serve::serve;
use crate::commands::sync::run_sync;
use crate::error::CliError;

#[tokio::main]
async fn main() {
    if let Err(error) = run().await {
        eprintln!("Error: {error}");
        std::process::exit(1);
    }
}

async fn run() -> Result<(), CliError> {
    dotenvy::dotenv().ok();

    // stdout carries `serve` responses, so logs go to stderr.
    tracing_subscriber::fmt()
        .with_writer(std::io::stderr)
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("leaflet=info,leaflet_core=info")),
        )
        .init();

    let cli = Cli::parse();
    if let Commands::Completions { shell, output } = &cli.command {
        return run_completions(*shell, output.as_deref());
    }

    let app = AppContext::open(cli.db_path, cli.config, cli.user_id).await?;
    match cli.command {
        Commands::Note { command } => run_note(command, &app).await?,
        Commands::Folder { command } => run_folder(command, &app).await?,
        Commands::Sync { direction } => run_sync(direction.into(), &app).await?,
        Commands::Serve => {
            serve(
                app.handlers(),
                BufReader::new(tokio::io::stdin()),
                tokio::io::stdout(),
            )
            .await?;
        }
        Commands::Completions { .. } => {}
    }

    Ok(())
}
