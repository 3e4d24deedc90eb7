use std::{path::Path, time::Duration};

use async_trait::async_trait;
use weather_pipeline_core::{
    FetchError, Observation, ProviderId, RunConfig, RunOutcome, WeatherProvider, pipeline,
    provider::{mock::MockProvider, openweather::OpenWeatherProvider},
    Settings, provider_from_config, store,
};
use wiremock::matchers::{method, path, query_param};
use wiremock::{Mock, MockServer, ResponseTemplate};

fn test_config(db_path: &Path) -> RunConfig {
    RunConfig { db_path: db_path.to_path_buf(), sleep_between: Duration::ZERO, ..RunConfig::default() }
}

/// Always fails, like a provider whose every request is rejected.
#[derive(Debug)]
struct BrokenProvider;

#[async_trait]
impl WeatherProvider for BrokenProvider {
    fn id(&self) -> ProviderId {
        ProviderId::OpenWeather
    }

    async fn fetch(&self, _city: &str) -> Result<Observation, FetchError> {
        let source = serde_json::from_str::<serde_json::Value>("not json").unwrap_err();
        Err(FetchError::Parse { provider: ProviderId::OpenWeather, source })
    }
}

#[tokio::test]
async fn mock_run_stores_five_rows_and_reports_presets() {
    let dir = tempfile::tempdir().unwrap();
    let db = dir.path().join("weather_data.db");
    let config = test_config(&db);

    let provider = provider_from_config(&config).unwrap();
    assert_eq!(provider.id(), ProviderId::Mock);

    let outcome = pipeline::run(&config, provider.as_ref()).await.unwrap();
    let RunOutcome::Reported { saved, report } = outcome else {
        panic!("expected a report");
    };

    assert_eq!(saved, 5);
    assert_eq!(store::count(&db, "weather").unwrap(), 5);

    let cities: Vec<&str> = report.averages.iter().map(|a| a.city.as_str()).collect();
    assert_eq!(cities, vec!["Colombo", "Tokyo", "New York", "Sydney", "London"]);

    let colombo = &report.averages[0];
    assert_eq!(colombo.avg_temp, Some(30.0));
    assert_eq!(colombo.samples, 1);

    assert_eq!(report.latest.len(), 5);
    let latest = report.latest.iter().find(|o| o.city == "Colombo").unwrap();
    assert_eq!(latest.humidity, Some(70));
    assert_eq!(latest.weather.as_deref(), Some("sunny"));
    assert_eq!(latest.wind_speed, Some(4.5));

    let london = report.latest.iter().find(|o| o.city == "London").unwrap();
    assert_eq!(london.temperature, Some(15.5));
    assert_eq!(london.humidity, Some(80));
    assert_eq!(london.weather.as_deref(), Some("light rain"));
    assert_eq!(london.wind_speed, Some(5.2));
}

#[tokio::test]
async fn repeated_runs_append() {
    let dir = tempfile::tempdir().unwrap();
    let db = dir.path().join("weather_data.db");
    let config = test_config(&db);

    pipeline::run(&config, &MockProvider).await.unwrap();
    let outcome = pipeline::run(&config, &MockProvider).await.unwrap();

    let RunOutcome::Reported { report, .. } = outcome else {
        panic!("expected a report");
    };

    assert_eq!(store::count(&db, "weather").unwrap(), 10);
    assert!(report.averages.iter().all(|a| a.samples == 2));
    assert_eq!(report.averages[0].avg_temp, Some(30.0));
    // both runs may land in the same second, in which case ties are all returned
    assert!(report.latest.len() >= 5);
}

#[tokio::test]
async fn unknown_city_is_stored_with_null_measurements() {
    let dir = tempfile::tempdir().unwrap();
    let db = dir.path().join("weather_data.db");
    let config = RunConfig { cities: vec!["Atlantis".into(), "Tokyo".into()], ..test_config(&db) };

    let outcome = pipeline::run(&config, &MockProvider).await.unwrap();
    let RunOutcome::Reported { saved, report } = outcome else {
        panic!("expected a report");
    };

    assert_eq!(saved, 2);
    let atlantis = report.averages.iter().find(|a| a.city == "Atlantis").unwrap();
    assert_eq!(atlantis.avg_temp, None);
    assert_eq!(atlantis.samples, 1);
}

#[tokio::test]
async fn all_failures_leave_store_untouched() {
    let dir = tempfile::tempdir().unwrap();
    let db = dir.path().join("weather_data.db");
    let config = test_config(&db);

    let outcome = pipeline::run(&config, &BrokenProvider).await.unwrap();

    assert_eq!(outcome, RunOutcome::NoData);
    assert!(!db.exists());
}

#[tokio::test]
async fn pause_follows_every_attempt() {
    let dir = tempfile::tempdir().unwrap();
    let config = RunConfig {
        cities: vec!["A".into(), "B".into(), "C".into()],
        sleep_between: Duration::from_millis(40),
        ..test_config(&dir.path().join("weather_data.db"))
    };

    let started = std::time::Instant::now();
    let rows = pipeline::collect(&config, &BrokenProvider).await;

    assert!(rows.is_empty());
    assert!(started.elapsed() >= Duration::from_millis(120));
}

#[tokio::test]
async fn live_run_skips_failed_cities() {
    let mock_server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/data/2.5/weather"))
        .and(query_param("q", "London"))
        .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({
            "main": {"temp": 12.34, "humidity": 90},
            "weather": [{"description": "overcast clouds"}],
            "wind": {"speed": 3.3}
        })))
        .mount(&mock_server)
        .await;

    Mock::given(method("GET"))
        .and(path("/data/2.5/weather"))
        .and(query_param("q", "Nowhere"))
        .respond_with(ResponseTemplate::new(404).set_body_json(serde_json::json!({
            "cod": "404",
            "message": "city not found"
        })))
        .mount(&mock_server)
        .await;

    let dir = tempfile::tempdir().unwrap();
    let db = dir.path().join("weather_data.db");
    let config = RunConfig { cities: vec!["Nowhere".into(), "London".into()], ..test_config(&db) };

    let provider =
        OpenWeatherProvider::with_base_url("KEY".into(), &mock_server.uri(), config.request_timeout)
            .unwrap();

    let outcome = pipeline::run(&config, &provider).await.unwrap();
    let RunOutcome::Reported { saved, report } = outcome else {
        panic!("expected a report");
    };

    assert_eq!(saved, 1);
    assert_eq!(report.averages.len(), 1);
    assert_eq!(report.averages[0].city, "London");
    assert_eq!(report.averages[0].avg_temp, Some(12.34));
    assert_eq!(report.latest[0].weather.as_deref(), Some("overcast clouds"));
}

#[tokio::test]
async fn dotenv_key_selects_live_provider() {
    let dir = tempfile::tempdir().unwrap();
    let dotenv = dir.path().join(".env");
    std::fs::write(&dotenv, "OPENWEATHER_API_KEY=abc123\n").unwrap();

    let config = RunConfig::from_sources(None, &dotenv, &Settings::default());
    let provider = provider_from_config(&config).unwrap();

    assert_eq!(provider.id(), ProviderId::OpenWeather);
}

#[tokio::test]
async fn no_key_anywhere_selects_mock() {
    let dir = tempfile::tempdir().unwrap();

    let config = RunConfig::from_sources(None, &dir.path().join(".env"), &Settings::default());
    let provider = provider_from_config(&config).unwrap();

    assert_eq!(provider.id(), ProviderId::Mock);
}
