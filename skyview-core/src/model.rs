use serde::{Deserialize, Serialize};

/// Canonical coordinates plus display names for one query.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ResolvedLocation {
    pub latitude: f64,
    pub longitude: f64,
    pub display_name: String,
    pub region: String,
}

/// One geocoding match, in provider relevance order.
#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct GeocodeCandidate {
    pub name: String,
    #[serde(default)]
    pub admin1: Option<String>,
    #[serde(default)]
    pub country: Option<String>,
    pub latitude: f64,
    pub longitude: f64,
}

impl GeocodeCandidate {
    /// "admin1, country", skipping empty parts.
    pub fn region(&self) -> String {
        [self.admin1.as_deref(), self.country.as_deref()]
            .into_iter()
            .flatten()
            .map(str::trim)
            .filter(|s| !s.is_empty())
            .collect::<Vec<_>>()
            .join(", ")
    }
}

impl From<GeocodeCandidate> for ResolvedLocation {
    fn from(candidate: GeocodeCandidate) -> Self {
        let region = candidate.region();
        Self {
            latitude: candidate.latitude,
            longitude: candidate.longitude,
            display_name: candidate.name,
            region,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct HourlyForecast {
    pub time: String,
    pub temp: i32,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DailyForecast {
    pub day: String,
    pub high: i32,
    pub low: i32,
    pub condition: String,
}

/// UI-ready snapshot produced by one pipeline run. Numbers are already rounded.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct WeatherData {
    pub city: String,
    pub country: String,
    pub temperature: i32,
    pub feels_like: i32,
    pub condition: String,
    pub humidity: i32,
    pub wind_speed: i32,
    pub pressure: i32,
    pub uv_index: i32,
    pub sunrise: String,
    pub sunset: String,
    pub hourly: Vec<HourlyForecast>,
    pub daily: Vec<DailyForecast>,
    pub source: Option<String>,
}

/// Structured deep-analysis result. Missing fields are empty strings.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct AiAnalysis {
    pub advice: String,
    pub outfit: String,
    pub details: String,
}

/// State of one enrichment tier.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub enum Enrichment<T> {
    #[default]
    Empty,
    Pending,
    Ready(T),
    Failed(String),
}

impl<T> Enrichment<T> {
    pub fn is_pending(&self) -> bool {
        matches!(self, Enrichment::Pending)
    }

    pub fn ready(&self) -> Option<&T> {
        match self {
            Enrichment::Ready(value) => Some(value),
            _ => None,
        }
    }
}
