use async_trait::async_trait;
use reqwest::Client;
use serde::Deserialize;
use std::time::Duration;

use crate::model::Observation;

use super::{FetchError, ProviderId, WeatherProvider};

const DEFAULT_BASE_URL: &str = "https://api.openweathermap.org";

#[derive(Debug, Clone)]
pub struct OpenWeatherProvider {
    api_key: String,
    base_url: String,
    http: Client,
}

impl OpenWeatherProvider {
    pub fn new(api_key: String, timeout: Duration) -> Result<Self, FetchError> {
        Self::with_base_url(api_key, DEFAULT_BASE_URL, timeout)
    }

    /// Point the provider at another host, e.g. a local mock server.
    pub fn with_base_url(
        api_key: String,
        base_url: &str,
        timeout: Duration,
    ) -> Result<Self, FetchError> {
        let http = Client::builder()
            .timeout(timeout)
            .build()
            .map_err(|source| FetchError::Client { provider: ProviderId::OpenWeather, source })?;

        Ok(Self { api_key, base_url: base_url.trim_end_matches('/').to_string(), http })
    }

    async fn fetch_current(&self, city: &str) -> Result<Observation, FetchError> {
        let url = format!("{}/data/2.5/weather", self.base_url);
        let transport =
            |source: reqwest::Error| FetchError::Transport { provider: ProviderId::OpenWeather, source };

        let res = self
            .http
            .get(&url)
            .query(&[("q", city), ("appid", self.api_key.as_str()), ("units", "metric")])
            .send()
            .await
            .map_err(transport)?;

        let status = res.status();
        let body = res.text().await.map_err(transport)?;

        if !status.is_success() {
            return Err(FetchError::Status {
                provider: ProviderId::OpenWeather,
                status,
                body: truncate_body(&body),
            });
        }

        let parsed: OwCurrentResponse = serde_json::from_str(&body)
            .map_err(|source| FetchError::Parse { provider: ProviderId::OpenWeather, source })?;

        Ok(parsed.into_observation(city))
    }
}

// Every level is optional: a missing or null field just leaves that measurement absent.

#[derive(Debug, Default, Deserialize)]
struct OwMain {
    temp: Option<f64>,
    humidity: Option<u8>,
}

#[derive(Debug, Deserialize)]
struct OwWeather {
    description: Option<String>,
}

#[derive(Debug, Default, Deserialize)]
struct OwWind {
    speed: Option<f64>,
}

#[derive(Debug, Deserialize)]
struct OwCurrentResponse {
    main: Option<OwMain>,
    weather: Option<Vec<OwWeather>>,
    wind: Option<OwWind>,
}

impl OwCurrentResponse {
    fn into_observation(self, city: &str) -> Observation {
        let main = self.main.unwrap_or_default();
        let wind = self.wind.unwrap_or_default();
        let weather = self
            .weather
            .and_then(|list| list.into_iter().next())
            .and_then(|w| w.description);

        Observation {
            temperature: main.temp,
            humidity: main.humidity,
            weather,
            wind_speed: wind.speed,
            ..Observation::captured_now(city)
        }
    }
}

#[async_trait]
impl WeatherProvider for OpenWeatherProvider {
    fn id(&self) -> ProviderId {
        ProviderId::OpenWeather
    }

    async fn fetch(&self, city: &str) -> Result<Observation, FetchError> {
        self.fetch_current(city).await
    }
}

fn truncate_body(body: &str) -> String {
    const MAX: usize = 200;
    if body.chars().count() > MAX {
        format!("{}...", body.chars().take(MAX).collect::<String>())
    } else {
        body.to_string()
    }
}
