//! Deterministic fakes for the provider, generator and geolocator capabilities.

use async_trait::async_trait;
use parking_lot::Mutex;
use std::{
    collections::HashMap,
    sync::atomic::{AtomicBool, AtomicUsize, Ordering},
    time::Duration,
};
use tokio::sync::Semaphore;

use crate::{
    ai::{GenerationRequest, TextGenerator},
    error::{AiError, GeolocationError, WeatherError},
    geolocation::{Coordinates, Geolocator},
    model::{DailyForecast, GeocodeCandidate, HourlyForecast, ResolvedLocation, WeatherData},
    provider::{CurrentBlock, DailyBlock, ForecastPayload, HourlyBlock, WeatherProvider},
};

/// Forecast with 6 full days of hourly data starting at local midnight.
pub fn payload() -> ForecastPayload {
    let hours = 6 * 24;
    let days = 6;

    ForecastPayload {
        utc_offset_seconds: 0,
        current: CurrentBlock {
            temperature_2m: Some(18.3),
            relative_humidity_2m: Some(71.0),
            apparent_temperature: Some(17.6),
            is_day: Some(1),
            weather_code: Some(3),
            pressure_msl: Some(1012.8),
            wind_speed_10m: Some(9.4),
            ..Default::default()
        },
        hourly: HourlyBlock {
            time: (0..hours)
                .map(|h| format!("2024-05-{:02}T{:02}:00", 1 + h / 24, h % 24))
                .collect(),
            temperature_2m: (0..hours).map(|h| Some(12.0 + (h % 24) as f64 / 2.0)).collect(),
            weather_code: vec![Some(3); hours],
        },
        daily: DailyBlock {
            time: (0..days).map(|d| format!("2024-05-{:02}", 1 + d)).collect(),
            weather_code: vec![Some(61); days],
            temperature_2m_max: vec![Some(22.4); days],
            temperature_2m_min: vec![Some(11.6); days],
            sunrise: vec!["2024-05-01T04:50".to_string(); days],
            sunset: vec!["2024-05-01T18:30".to_string(); days],
            uv_index_max: vec![Some(5.2); days],
        },
    }
}

/// A small, already-normalized snapshot.
pub fn snapshot(city: &str) -> WeatherData {
    WeatherData {
        city: city.to_string(),
        country: "Japan".to_string(),
        temperature: 18,
        feels_like: 18,
        condition: "Overcast".to_string(),
        humidity: 71,
        wind_speed: 9,
        pressure: 1013,
        uv_index: 5,
        sunrise: "04:50".to_string(),
        sunset: "18:30".to_string(),
        hourly: vec![HourlyForecast { time: "09:00".to_string(), temp: 16 }],
        daily: ["Today", "Thu", "Fri", "Sat", "Sun"]
            .iter()
            .map(|day| DailyForecast {
                day: day.to_string(),
                high: 22,
                low: 12,
                condition: "Slight rain".to_string(),
            })
            .collect(),
        source: Some("Open-Meteo".to_string()),
    }
}

#[derive(Debug, Default)]
pub struct FakeProvider {
    candidates: Vec<GeocodeCandidate>,
    delays: HashMap<String, Duration>,
    fail_forecast: AtomicBool,
    geocode_calls: AtomicUsize,
    forecast_calls: AtomicUsize,
    last_query: Mutex<Option<String>>,
}

impl FakeProvider {
    /// Returned for any query that starts with `name` (case-insensitive).
    pub fn with_candidate(mut self, name: &str, latitude: f64, longitude: f64) -> Self {
        self.candidates.push(GeocodeCandidate {
            name: name.to_string(),
            admin1: None,
            country: Some("Testland".to_string()),
            latitude,
            longitude,
        });
        self
    }

    /// Delay geocoding of `query` by `delay`.
    pub fn with_delay(mut self, query: &str, delay: Duration) -> Self {
        self.delays.insert(query.to_string(), delay);
        self
    }

    pub fn fail_forecasts(&self) {
        self.fail_forecast.store(true, Ordering::SeqCst);
    }

    pub fn geocode_calls(&self) -> usize {
        self.geocode_calls.load(Ordering::SeqCst)
    }

    pub fn forecast_calls(&self) -> usize {
        self.forecast_calls.load(Ordering::SeqCst)
    }

    pub fn last_query(&self) -> Option<String> {
        self.last_query.lock().clone()
    }
}

#[async_trait]
impl WeatherProvider for FakeProvider {
    async fn geocode(&self, query: &str) -> Result<Vec<GeocodeCandidate>, WeatherError> {
        self.geocode_calls.fetch_add(1, Ordering::SeqCst);
        *self.last_query.lock() = Some(query.to_string());

        if let Some(delay) = self.delays.get(query) {
            tokio::time::sleep(*delay).await;
        }

        let lower = query.to_lowercase();
        Ok(self
            .candidates
            .iter()
            .filter(|c| lower.starts_with(&c.name.to_lowercase()))
            .cloned()
            .collect())
    }

    async fn forecast(&self, _location: &ResolvedLocation) -> Result<ForecastPayload, WeatherError> {
        self.forecast_calls.fetch_add(1, Ordering::SeqCst);

        if self.fail_forecast.load(Ordering::SeqCst) {
            return Err(WeatherError::provider("status 503"));
        }

        Ok(payload())
    }
}

#[derive(Debug)]
pub struct FakeGenerator {
    reply: Option<String>,
    gate: Option<Semaphore>,
    calls: AtomicUsize,
    last_request: Mutex<Option<GenerationRequest>>,
}

impl FakeGenerator {
    pub fn replying(text: &str) -> Self {
        Self {
            reply: Some(text.to_string()),
            gate: None,
            calls: AtomicUsize::new(0),
            last_request: Mutex::new(None),
        }
    }

    pub fn failing() -> Self {
        Self {
            reply: None,
            ..Self::replying("")
        }
    }

    /// Hold every call until [`FakeGenerator::release`].
    pub fn gated(mut self) -> Self {
        self.gate = Some(Semaphore::new(0));
        self
    }

    pub fn release(&self) {
        if let Some(gate) = &self.gate {
            gate.add_permits(Semaphore::MAX_PERMITS / 2);
        }
    }

    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }

    pub fn last_request(&self) -> Option<GenerationRequest> {
        self.last_request.lock().clone()
    }

    pub async fn wait_for_calls(&self, n: usize) {
        while self.calls() < n {
            tokio::task::yield_now().await;
        }
    }
}

#[async_trait]
impl TextGenerator for FakeGenerator {
    async fn generate(&self, request: &GenerationRequest) -> Result<String, AiError> {
        *self.last_request.lock() = Some(request.clone());
        self.calls.fetch_add(1, Ordering::SeqCst);

        if let Some(gate) = &self.gate {
            let _permit = gate
                .acquire()
                .await
                .map_err(|e| AiError::Request(e.to_string()))?;
        }

        self.reply
            .clone()
            .ok_or_else(|| AiError::Status { status: 500, body: "boom".to_string() })
    }
}

#[derive(Debug)]
pub enum FakeGeolocator {
    At(Coordinates),
    Failing(Mutex<Option<GeolocationError>>),
    Hanging,
}

impl FakeGeolocator {
    pub fn at(latitude: f64, longitude: f64) -> Self {
        Self::At(Coordinates { latitude, longitude })
    }

    pub fn failing(err: GeolocationError) -> Self {
        Self::Failing(Mutex::new(Some(err)))
    }

    pub fn hanging() -> Self {
        Self::Hanging
    }
}

#[async_trait]
impl Geolocator for FakeGeolocator {
    async fn locate(&self) -> Result<Coordinates, GeolocationError> {
        match self {
            Self::At(coords) => Ok(*coords),
            Self::Failing(err) => Err(err
                .lock()
                .take()
                .unwrap_or_else(|| GeolocationError::Unavailable("already failed".to_string()))),
            Self::Hanging => std::future::pending().await,
        }
    }
}
