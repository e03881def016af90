use crate::{
    Config,
    error::WeatherError,
    model::{GeocodeCandidate, ResolvedLocation},
    provider::open_meteo::OpenMeteoProvider,
};
use async_trait::async_trait;
use serde::Deserialize;
use std::fmt::Debug;

pub mod open_meteo;

/// Geocoding plus forecast retrieval against a single weather backend.
#[async_trait]
pub trait WeatherProvider: Send + Sync + Debug {
    /// Candidates for a place name, most relevant first. Empty means no match.
    async fn geocode(&self, query: &str) -> Result<Vec<GeocodeCandidate>, WeatherError>;

    /// Current, hourly and daily series for the location in one request.
    async fn forecast(&self, location: &ResolvedLocation) -> Result<ForecastPayload, WeatherError>;
}

/// Raw forecast response. Series are parallel arrays indexed by position; their lengths are
/// not guaranteed to match.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct ForecastPayload {
    #[serde(default)]
    pub utc_offset_seconds: i32,
    #[serde(default)]
    pub current: CurrentBlock,
    #[serde(default)]
    pub hourly: HourlyBlock,
    #[serde(default)]
    pub daily: DailyBlock,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct CurrentBlock {
    pub temperature_2m: Option<f64>,
    pub relative_humidity_2m: Option<f64>,
    pub apparent_temperature: Option<f64>,
    pub is_day: Option<u8>,
    pub precipitation: Option<f64>,
    pub rain: Option<f64>,
    pub showers: Option<f64>,
    pub snowfall: Option<f64>,
    pub weather_code: Option<i32>,
    pub pressure_msl: Option<f64>,
    pub wind_speed_10m: Option<f64>,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct HourlyBlock {
    #[serde(default)]
    pub time: Vec<String>,
    #[serde(default)]
    pub temperature_2m: Vec<Option<f64>>,
    #[serde(default)]
    pub weather_code: Vec<Option<i32>>,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct DailyBlock {
    #[serde(default)]
    pub time: Vec<String>,
    #[serde(default)]
    pub weather_code: Vec<Option<i32>>,
    #[serde(default)]
    pub temperature_2m_max: Vec<Option<f64>>,
    #[serde(default)]
    pub temperature_2m_min: Vec<Option<f64>>,
    #[serde(default)]
    pub sunrise: Vec<String>,
    #[serde(default)]
    pub sunset: Vec<String>,
    #[serde(default)]
    pub uv_index_max: Vec<Option<f64>>,
}

/// Construct the production weather provider from config.
pub fn provider_from_config(config: &Config) -> Result<Box<dyn WeatherProvider>, WeatherError> {
    let provider = OpenMeteoProvider::new(&config.language, config.request_timeout())?;
    Ok(Box::new(provider))
}
