use anyhow::Result;

use crate::{
    config::RunConfig,
    model::{Observation, Report},
    provider::WeatherProvider,
    report, store,
};

/// How a run ended when nothing went wrong with storage.
#[derive(Debug, Clone, PartialEq)]
pub enum RunOutcome {
    /// Every fetch failed; the store was not touched.
    NoData,
    /// Rows were saved and the queries ran.
    Reported { saved: usize, report: Report },
}

/// Fetch every configured city in order, pausing after each attempt. Failed cities are skipped.
pub async fn collect(config: &RunConfig, provider: &dyn WeatherProvider) -> Vec<Observation> {
    let mut rows = Vec::with_capacity(config.cities.len());

    for city in &config.cities {
        match provider.fetch(city).await {
            Ok(obs) => {
                tracing::debug!(city = %city, provider = %provider.id(), "fetched observation");
                rows.push(obs);
            }
            Err(err) => tracing::warn!("Failed to fetch {city}: {err}"),
        }

        tokio::time::sleep(config.sleep_between).await;
    }

    rows
}

/// One full pass: fetch, save, query.
pub async fn run(config: &RunConfig, provider: &dyn WeatherProvider) -> Result<RunOutcome> {
    let rows = collect(config, provider).await;

    if rows.is_empty() {
        tracing::error!("No data fetched. Exiting.");
        return Ok(RunOutcome::NoData);
    }

    let saved = store::append(&config.db_path, &config.table, &rows)?;
    tracing::info!("Saved {} rows to {}", saved, config.db_path.display());

    let report = report::query(&config.db_path, &config.table)?;
    Ok(RunOutcome::Reported { saved, report })
}
