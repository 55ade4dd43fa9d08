//! sheetbridge CLI entry point.

use std::process::ExitCode;

use clap::Parser;

use sheetbridge_client::cli::{Cli, Command, ConfigAction};
use sheetbridge_client::commands;
use sheetbridge_client::config::ClientConfig;
use sheetbridge_client::error::{ClientError, ClientResult};
use sheetbridge_core::{TracingConfig, init_tracing};

#[tokio::main]
async fn main() -> ExitCode {
    let cli = Cli::parse();

    let tracing_config = if cli.debug {
        TracingConfig::cli_debug()
    } else {
        TracingConfig::cli()
    };
    if let Err(e) = init_tracing(tracing_config) {
        eprintln!("warning: {}", e);
    }

    match run(cli).await {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            eprintln!("error: {}", e);
            if let Some(hint) = e.hint() {
                eprintln!("hint: {}", hint);
            }
            ExitCode::FAILURE
        }
    }
}

async fn run(cli: Cli) -> ClientResult<()> {
    let config = match cli.config {
        Some(ref path) => ClientConfig::load_from(path).map_err(ClientError::Config)?,
        None => ClientConfig::load().map_err(ClientError::Config)?,
    };

    match cli.command {
        Command::Token { target, json } => commands::token::run(&config, &target, json).await,
        Command::Connect { target, credential } => {
            commands::connection::connect(&config, &target, &credential)
        }
        Command::Disconnect { target } => commands::connection::disconnect(&config, &target),
        Command::Reconcile {
            user,
            rows,
            records,
            json,
        } => commands::reconcile::run(&config, &user, &rows, &records, json).await,
        Command::Config { action } => match action {
            ConfigAction::Dump => commands::config::dump(&config),
            ConfigAction::Validate => commands::config::validate(&config),
            ConfigAction::Path => commands::config::path(&config),
        },
    }
}
