use anyhow::{Context, bail};
use clap::{Parser, Subcommand};
use inquire::{Password, PasswordDisplayMode};
use weather_pipeline_core::{
    ProviderId, RunConfig, RunOutcome, Settings, pipeline, provider_from_config, report, store,
};

use crate::output;

/// Top-level CLI struct.
#[derive(Debug, Parser)]
#[command(name = "weather-pipeline", version, about = "Fetch, store and report city weather")]
pub struct Cli {
    #[command(subcommand)]
    pub command: Option<Command>,
}

#[derive(Debug, Subcommand)]
pub enum Command {
    /// Fetch every city, append to the database, print the reports (default).
    Run,

    /// Print the reports for what is already stored.
    Report,

    /// Save an API key for a provider in the settings file. Leave empty to remove it.
    Configure {
        /// Provider short name, e.g. "openweather".
        #[arg(default_value = "openweather")]
        provider: String,
    },
}

impl Cli {
    pub async fn run(self) -> anyhow::Result<()> {
        match self.command.unwrap_or(Command::Run) {
            Command::Run => run_pipeline().await,
            Command::Report => show_report(),
            Command::Configure { provider } => configure(&provider),
        }
    }
}

async fn run_pipeline() -> anyhow::Result<()> {
    let config = RunConfig::from_env();
    let provider = provider_from_config(&config)?;

    tracing::info!(
        cities = config.cities.len(),
        db = %config.db_path.display(),
        provider = %provider.id(),
        "Starting weather pipeline"
    );

    match pipeline::run(&config, provider.as_ref()).await? {
        RunOutcome::NoData => {}
        RunOutcome::Reported { report, .. } => output::print_report(&report),
    }

    Ok(())
}

fn show_report() -> anyhow::Result<()> {
    let config = RunConfig::default();

    if !config.db_path.exists() {
        bail!(
            "No database at {}.\nHint: run `weather-pipeline run` first.",
            config.db_path.display()
        );
    }

    let rows = store::count(&config.db_path, &config.table)?;
    tracing::info!("{} rows in {}", rows, config.db_path.display());

    let report = report::query(&config.db_path, &config.table)?;
    output::print_report(&report);
    Ok(())
}

fn configure(provider: &str) -> anyhow::Result<()> {
    let id = ProviderId::try_from(provider)?;
    if !id.requires_api_key() {
        bail!("Provider '{id}' needs no API key.");
    }

    let mut settings = Settings::load()?;

    let api_key = Password::new(&format!("API key for {id}:"))
        .with_display_mode(PasswordDisplayMode::Masked)
        .without_confirmation()
        .with_help_message("Leave empty to remove the stored key and use mock data")
        .prompt()
        .context("Failed to read API key")?;

    let api_key = api_key.trim();
    if api_key.is_empty() {
        settings.remove_api_key(id);
    } else {
        settings.upsert_api_key(id, api_key.to_string());
    }

    let path = settings.save()?;
    println!("Saved settings to {}", path.display());
    Ok(())
}
