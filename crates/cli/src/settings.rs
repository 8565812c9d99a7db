use std::path::PathBuf;

use serde::Deserialize;

use crate::{cli::Cli, error::Result};

const DEFAULT_CONFIG_NAME: &str = "tally";
const ENV_PREFIX: &str = "TALLY";

#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(default)]
pub struct Settings {
    pub database_url: String,
    pub session_file: PathBuf,
    pub log_level: String,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            database_url: "sqlite:./tally.db?mode=rwc".to_string(),
            session_file: PathBuf::from(".tally_session.json"),
            log_level: "warn".to_string(),
        }
    }
}

/// Resolve settings: defaults, then the TOML file, then `TALLY_*` variables,
/// then command line flags.
pub fn load(cli: &Cli) -> Result<Settings> {
    let file = match &cli.config {
        Some(path) => config::File::from(path.as_path()).required(true),
        None => config::File::with_name(DEFAULT_CONFIG_NAME).required(false),
    };
    let settings: Settings = config::Config::builder()
        .add_source(file)
        .add_source(config::Environment::with_prefix(ENV_PREFIX))
        .build()?
        .try_deserialize()?;

    Ok(apply_overrides(settings, cli))
}

fn apply_overrides(mut settings: Settings, cli: &Cli) -> Settings {
    if let Some(database_url) = &cli.database_url {
        settings.database_url = database_url.clone();
    }
    if let Some(session_file) = &cli.session_file {
        settings.session_file = session_file.clone();
    }
    if let Some(log_level) = &cli.log_level {
        settings.log_level = log_level.clone();
    }
    settings
}
