use std::process::ExitCode;

use clap::Parser;
use taskbridge_core::{AppError, ConfigError};
use taskbridge_jira::JiraError;
use taskbridge_sync::SyncError;

mod cli;
mod commands;
mod progress;

#[tokio::main]
async fn main() -> ExitCode {
    let cli = cli::Cli::parse();

    if let Err(e) = taskbridge_core::init(cli.verbose) {
        eprintln!("Warning: logging unavailable: {}", e);
    }

    match commands::run(cli).await {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            tracing::debug!("{:?}", e);
            eprintln!("Error: {}", user_message(&e));
            ExitCode::FAILURE
        }
    }
}

/// Pick the friendliest message any layer offers for `err`.
fn user_message(err: &anyhow::Error) -> String {
    if let Some(e) = err.downcast_ref::<SyncError>() {
        return e.user_message();
    }
    if let Some(e) = err.downcast_ref::<JiraError>() {
        return e.user_message();
    }
    if let Some(e) = err.downcast_ref::<ConfigError>() {
        return format!("{}\n{}", e, e.user_message());
    }
    if let Some(e) = err.downcast_ref::<AppError>() {
        return format!("{}\n{}", e, e.user_message());
    }
    format!("{:#}", err)
}
