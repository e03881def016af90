use async_trait::async_trait;
use reqwest::Client;
use serde::{Deserialize, Serialize};
use std::time::Duration;
use tracing::debug;

use crate::{
    error::{WeatherError, truncate_body},
    model::{GeocodeCandidate, ResolvedLocation},
};

use super::{ForecastPayload, WeatherProvider};

pub const GEOCODING_URL: &str = "https://geocoding-api.open-meteo.com/v1/search";
pub const FORECAST_URL: &str = "https://api.open-meteo.com/v1/forecast";

const GEOCODE_CANDIDATES: u8 = 5;
const FORECAST_DAYS: u8 = 6;
const CURRENT_FIELDS: &str = "temperature_2m,relative_humidity_2m,apparent_temperature,is_day,\
precipitation,rain,showers,snowfall,weather_code,pressure_msl,wind_speed_10m";
const HOURLY_FIELDS: &str = "temperature_2m,weather_code";
const DAILY_FIELDS: &str =
    "weather_code,temperature_2m_max,temperature_2m_min,sunrise,sunset,uv_index_max";

#[derive(Debug, Clone)]
pub struct OpenMeteoProvider {
    http: Client,
    geocoding_url: String,
    forecast_url: String,
    language: String,
}

impl OpenMeteoProvider {
    pub fn new(language: &str, timeout: Duration) -> Result<Self, WeatherError> {
        Self::with_endpoints(GEOCODING_URL, FORECAST_URL, language, timeout)
    }

    /// Point the provider at other endpoints, e.g. a local mock server.
    pub fn with_endpoints(
        geocoding_url: &str,
        forecast_url: &str,
        language: &str,
        timeout: Duration,
    ) -> Result<Self, WeatherError> {
        let http = Client::builder().timeout(timeout).build()?;

        Ok(Self {
            http,
            geocoding_url: geocoding_url.to_string(),
            forecast_url: forecast_url.to_string(),
            language: language.to_string(),
        })
    }

    async fn get_body<Q: Serialize + ?Sized>(
        &self,
        url: &str,
        query: &Q,
        what: &str,
    ) -> Result<String, WeatherError> {
        let res = self
            .http
            .get(url)
            .query(query)
            .send()
            .await
            .map_err(|e| WeatherError::provider(format!("{what} request failed: {e}")))?;

        let status = res.status();
        let body = res
            .text()
            .await
            .map_err(|e| WeatherError::provider(format!("Failed to read {what} body: {e}")))?;

        if !status.is_success() {
            return Err(WeatherError::provider(format!(
                "{what} request failed with status {}: {}",
                status,
                truncate_body(&body),
            )));
        }

        Ok(body)
    }
}

#[derive(Debug, Serialize)]
struct GeocodeQuery<'a> {
    name: &'a str,
    count: u8,
    language: &'a str,
    format: &'a str,
}

#[derive(Debug, Deserialize)]
struct GeocodeResponse {
    #[serde(default)]
    results: Vec<GeocodeCandidate>,
}

#[derive(Debug, Serialize)]
struct ForecastQuery<'a> {
    latitude: f64,
    longitude: f64,
    current: &'a str,
    hourly: &'a str,
    daily: &'a str,
    timezone: &'a str,
    forecast_days: u8,
}

#[async_trait]
impl WeatherProvider for OpenMeteoProvider {
    async fn geocode(&self, query: &str) -> Result<Vec<GeocodeCandidate>, WeatherError> {
        let params = GeocodeQuery {
            name: query,
            count: GEOCODE_CANDIDATES,
            language: &self.language,
            format: "json",
        };

        let body = self.get_body(&self.geocoding_url, &params, "Geocoding").await?;
        let parsed: GeocodeResponse = serde_json::from_str(&body)
            .map_err(|e| WeatherError::provider(format!("Failed to parse geocoding JSON: {e}")))?;

        debug!("Geocoding '{}' returned {} candidates", query, parsed.results.len());
        Ok(parsed.results)
    }

    async fn forecast(&self, location: &ResolvedLocation) -> Result<ForecastPayload, WeatherError> {
        let params = ForecastQuery {
            latitude: location.latitude,
            longitude: location.longitude,
            current: CURRENT_FIELDS,
            hourly: HOURLY_FIELDS,
            daily: DAILY_FIELDS,
            timezone: "auto",
            forecast_days: FORECAST_DAYS,
        };

        let body = self.get_body(&self.forecast_url, &params, "Forecast").await?;
        serde_json::from_str(&body)
            .map_err(|e| WeatherError::provider(format!("Failed to parse forecast JSON: {e}")))
    }
}
