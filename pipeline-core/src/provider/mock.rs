use async_trait::async_trait;

use crate::model::Observation;

use super::{FetchError, ProviderId, WeatherProvider};

struct Preset {
    city: &'static str,
    temperature: f64,
    humidity: u8,
    weather: &'static str,
    wind_speed: f64,
}

const PRESETS: &[Preset] = &[
    Preset { city: "Colombo", temperature: 30.0, humidity: 70, weather: "sunny", wind_speed: 4.5 },
    Preset { city: "London", temperature: 15.5, humidity: 80, weather: "light rain", wind_speed: 5.2 },
    Preset { city: "New York", temperature: 20.3, humidity: 65, weather: "clear sky", wind_speed: 3.1 },
    Preset { city: "Tokyo", temperature: 22.0, humidity: 60, weather: "cloudy", wind_speed: 6.0 },
    Preset { city: "Sydney", temperature: 18.0, humidity: 55, weather: "windy", wind_speed: 7.5 },
];

/// Canned conditions for a handful of cities. Used when no API key is configured.
#[derive(Debug, Clone, Copy, Default)]
pub struct MockProvider;

impl MockProvider {
    /// Unknown cities still produce an observation, just with every measurement absent.
    pub fn observe(&self, city: &str) -> Observation {
        let mut obs = Observation::captured_now(city);

        if let Some(preset) = PRESETS.iter().find(|p| p.city == city) {
            obs.temperature = Some(preset.temperature);
            obs.humidity = Some(preset.humidity);
            obs.weather = Some(preset.weather.to_string());
            obs.wind_speed = Some(preset.wind_speed);
        }

        obs
    }
}

#[async_trait]
impl WeatherProvider for MockProvider {
    fn id(&self) -> ProviderId {
        ProviderId::Mock
    }

    async fn fetch(&self, city: &str) -> Result<Observation, FetchError> {
        Ok(self.observe(city))
    }
}
