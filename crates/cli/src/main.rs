use std::process::ExitCode;

use clap::Parser;
use migration::{Migrator, MigratorTrait};
use sea_orm::{Database, DatabaseConnection};

mod cli;
mod commands;
mod error;
mod prompt;
mod render;
mod session;
mod settings;

use crate::{cli::Cli, commands::Context, error::Result, settings::Settings};

#[tokio::main]
async fn main() -> ExitCode {
    let cli = Cli::parse();
    let settings = match settings::load(&cli) {
        Ok(settings) => settings,
        Err(err) => {
            eprintln!("error: {err}");
            return ExitCode::FAILURE;
        }
    };

    tracing_subscriber::fmt()
        .with_env_filter(format!(
            "tally={level},engine={level}",
            level = settings.log_level
        ))
        .with_writer(std::io::stderr)
        .init();

    match run(cli, settings).await {
        Ok(()) => ExitCode::SUCCESS,
        Err(err) => {
            tracing::error!("command failed: {err}");
            eprintln!("error: {err}");
            ExitCode::FAILURE
        }
    }
}

async fn run(cli: Cli, settings: Settings) -> Result<()> {
    let db = connect_db(&settings.database_url).await?;
    let engine = engine::Engine::builder().database(db).build().await?;
    let ctx = Context::new(engine, settings.session_file);
    commands::run(&ctx, cli.command).await
}

async fn connect_db(database_url: &str) -> Result<DatabaseConnection> {
    tracing::debug!(database_url, "connecting");
    let db = Database::connect(database_url).await?;
    Migrator::up(&db, None).await?;
    Ok(db)
}
