// litourney binary entry point

mod cli;
mod commands;

use anyhow::{Context, Result};
use clap::Parser;
use cli::{Cli, Command};
use common::config::Settings;
use common::telemetry::init_logging;
use tracing::{debug, error};

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    let settings = Settings::load_from_path(&cli.config_dir).with_context(|| {
        format!(
            "Failed to load configuration from {}",
            cli.config_dir.display()
        )
    })?;
    settings
        .validate()
        .map_err(|e| anyhow::anyhow!("Invalid configuration: {}", e))?;

    init_logging(
        &settings.observability.log_level,
        settings.observability.json,
    )?;

    debug!(
        config_dir = %cli.config_dir.display(),
        data_dir = %settings.storage.data_dir.display(),
        horizon_days = settings.scheduling.horizon_days,
        "Configuration loaded"
    );

    let result = match cli.command {
        Command::Setup {
            api_key,
            horizon_days,
        } => commands::setup(settings, &cli.config_dir, api_key, horizon_days),
        Command::Refresh => commands::refresh(&settings).await,
        Command::New(args) => commands::new(&settings, args),
        Command::List => commands::list(&settings),
        Command::Show { index } => commands::show(&settings, index),
        Command::Edit {
            index,
            field,
            value,
        } => commands::edit(&settings, index, &field, &value),
        Command::Delete { index } => commands::delete(&settings, index),
        Command::Validate => commands::validate_all(&settings),
        Command::Purge => commands::purge(&settings),
        Command::Create => commands::create(&settings).await,
        Command::Notify => commands::notify(&settings).await,
    };

    if let Err(e) = &result {
        error!(error = %e, "Command failed");
    }
    result
}
