//! Core library for the `weather-pipeline` batch job.
//!
//! This crate defines:
//! - Run configuration & credentials handling
//! - Mock and OpenWeather providers behind one trait
//! - Append-only SQLite storage and the two report queries
//! - The fetch → save → query pipeline itself
//!
//! It is used by `weather-pipeline`, but can also be driven from tests or other binaries.

pub mod config;
pub mod model;
pub mod pipeline;
pub mod provider;
pub mod report;
pub mod store;

pub use config::{RunConfig, Settings};
pub use model::{CityAverage, Observation, Report};
pub use pipeline::RunOutcome;
pub use provider::{FetchError, ProviderId, WeatherProvider, provider_from_config};
