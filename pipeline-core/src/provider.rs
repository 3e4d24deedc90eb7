use crate::{
    Observation, RunConfig,
    provider::{mock::MockProvider, openweather::OpenWeatherProvider},
};
use async_trait::async_trait;
use std::fmt::Debug;
use thiserror::Error;

pub mod mock;
pub mod openweather;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ProviderId {
    Mock,
    OpenWeather,
}

impl ProviderId {
    pub fn as_str(&self) -> &'static str {
        match self {
            ProviderId::Mock => "mock",
            ProviderId::OpenWeather => "openweather",
        }
    }

    pub const fn all() -> &'static [ProviderId] {
        &[ProviderId::Mock, ProviderId::OpenWeather]
    }

    /// Whether the provider only works with a configured key.
    pub fn requires_api_key(&self) -> bool {
        matches!(self, ProviderId::OpenWeather)
    }
}

impl std::fmt::Display for ProviderId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl TryFrom<&str> for ProviderId {
    type Error = anyhow::Error;

    fn try_from(value: &str) -> Result<Self, Self::Error> {
        let lower = value.to_lowercase();

        ProviderId::all().iter().copied().find(|id| id.as_str() == lower).ok_or_else(|| {
            let supported: Vec<&str> = ProviderId::all().iter().map(ProviderId::as_str).collect();
            anyhow::anyhow!(
                "Unknown provider '{value}'. Supported providers: {}.",
                supported.join(", ")
            )
        })
    }
}

/// Why a single fetch produced no observation.
#[derive(Debug, Error)]
pub enum FetchError {
    #[error("failed to build {provider} HTTP client: {source}")]
    Client {
        provider: ProviderId,
        #[source]
        source: reqwest::Error,
    },

    #[error("request to {provider} failed: {source}")]
    Transport {
        provider: ProviderId,
        #[source]
        source: reqwest::Error,
    },

    #[error("{provider} responded with status {status}: {body}")]
    Status {
        provider: ProviderId,
        status: reqwest::StatusCode,
        body: String,
    },

    #[error("failed to parse {provider} response: {source}")]
    Parse {
        provider: ProviderId,
        #[source]
        source: serde_json::Error,
    },
}

#[async_trait]
pub trait WeatherProvider: Send + Sync + Debug {
    fn id(&self) -> ProviderId;

    /// Current conditions for `city`, stamped with the local capture time.
    async fn fetch(&self, city: &str) -> Result<Observation, FetchError>;
}

/// Pick the provider for the whole run: live when a usable key is configured, mock otherwise.
pub fn provider_from_config(config: &RunConfig) -> Result<Box<dyn WeatherProvider>, FetchError> {
    let boxed: Box<dyn WeatherProvider> = match config.api_key.as_deref() {
        Some(api_key) => {
            Box::new(OpenWeatherProvider::new(api_key.to_owned(), config.request_timeout)?)
        }
        None => {
            tracing::warn!("No valid API key found, running with mock data.");
            Box::new(MockProvider)
        }
    };

    tracing::debug!(provider = %boxed.id(), "provider selected");
    Ok(boxed)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn provider_id_as_str_roundtrip() {
        for id in ProviderId::all() {
            let s = id.as_str();
            let parsed = ProviderId::try_from(s).expect("roundtrip should succeed");
            assert_eq!(*id, parsed);
        }
    }

    #[test]
    fn unknown_provider_error() {
        let err = ProviderId::try_from("weatherapi").unwrap_err();
        let msg = err.to_string();
        assert!(msg.contains("Unknown provider"));
        assert!(msg.contains("mock, openweather"));
    }

    #[test]
    fn provider_id_parse_ignores_case() {
        assert_eq!(ProviderId::try_from("OpenWeather").unwrap(), ProviderId::OpenWeather);
    }

    #[test]
    fn only_live_provider_needs_a_key() {
        assert!(ProviderId::OpenWeather.requires_api_key());
        assert!(!ProviderId::Mock.requires_api_key());
    }

    #[test]
    fn no_key_selects_mock() {
        let cfg = RunConfig::default();
        let provider = provider_from_config(&cfg).unwrap();
        assert_eq!(provider.id(), ProviderId::Mock);
    }

    #[test]
    fn key_selects_openweather() {
        let cfg = RunConfig { api_key: Some("KEY".into()), ..RunConfig::default() };
        let provider = provider_from_config(&cfg).unwrap();
        assert_eq!(provider.id(), ProviderId::OpenWeather);
    }
}
