//! Core library for the `skyview` CLI.
//!
//! This crate defines:
//! - Location resolution (place names, coordinate pairs, device position)
//! - Forecast retrieval and normalization into a UI-ready snapshot
//! - Quick summary and deep analysis from a generative-text provider
//! - Per-viewport session state with stale-result protection
//! - Configuration and the favorites store
//!
//! It is used by `skyview-cli`, but can also be reused by other front ends.

pub mod ai;
pub mod conditions;
pub mod config;
pub mod error;
pub mod favorites;
pub mod geolocation;
pub mod model;
pub mod normalize;
pub mod provider;
pub mod resolver;
pub mod session;
pub mod theme;

#[cfg(test)]
mod testing;

pub use ai::{AnalysisPanel, EnrichmentSettings, TextGenerator};
pub use config::{AiConfig, Config};
pub use error::{AiError, AnalysisError, GeolocationError, WeatherError};
pub use favorites::{FavoritesStore, FileFavorites, MemoryFavorites};
pub use geolocation::{Coordinates, Geolocator, IpGeolocator};
pub use model::{
    AiAnalysis, DailyForecast, Enrichment, GeocodeCandidate, HourlyForecast, ResolvedLocation,
    WeatherData,
};
pub use provider::{ForecastPayload, WeatherProvider};
pub use resolver::LocationResolver;
pub use session::{QueryOutcome, SessionEvent, WeatherSession};
pub use theme::ThemeId;
