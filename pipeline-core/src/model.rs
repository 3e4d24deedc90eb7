use chrono::{DateTime, NaiveDateTime, ParseResult, SubsecRound, Utc};
use serde::{Deserialize, Serialize};

/// Text form of [`Observation::timestamp`] as it is persisted.
pub const TIMESTAMP_FORMAT: &str = "%Y-%m-%d %H:%M:%S";

/// One weather reading for one city at one capture time.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Observation {
    pub city: String,
    /// Degrees Celsius.
    pub temperature: Option<f64>,
    /// Relative humidity, percent.
    pub humidity: Option<u8>,
    pub weather: Option<String>,
    pub wind_speed: Option<f64>,
    /// Capture time on our side, whole seconds. Never the provider's clock.
    pub timestamp: DateTime<Utc>,
}

impl Observation {
    /// An observation for `city` with no measurements, stamped with the current time.
    pub fn captured_now(city: impl Into<String>) -> Self {
        Self {
            city: city.into(),
            temperature: None,
            humidity: None,
            weather: None,
            wind_speed: None,
            timestamp: Utc::now().trunc_subsecs(0),
        }
    }

    pub fn timestamp_text(&self) -> String {
        self.timestamp.format(TIMESTAMP_FORMAT).to_string()
    }
}

/// Inverse of [`Observation::timestamp_text`].
pub fn parse_timestamp(text: &str) -> ParseResult<DateTime<Utc>> {
    NaiveDateTime::parse_from_str(text, TIMESTAMP_FORMAT).map(|ndt| ndt.and_utc())
}

/// Mean temperature and sample count for one city.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct CityAverage {
    pub city: String,
    /// Rounded to two decimals. `None` when every stored temperature is null.
    pub avg_temp: Option<f64>,
    pub samples: i64,
}

/// Result of the two read queries over the observation table.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct Report {
    /// One row per city, highest mean first.
    pub averages: Vec<CityAverage>,
    /// Rows at each city's latest timestamp. Ties are all kept.
    pub latest: Vec<Observation>,
}
