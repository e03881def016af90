//! Turns raw user input into a [`ResolvedLocation`].
//!
//! Input is either a `"lat, lng"` pair, which is used as-is, or a place name that is
//! looked up through the provider's geocoding service.

use tracing::debug;

use crate::{error::WeatherError, model::ResolvedLocation, provider::WeatherProvider};

/// Display name used for raw coordinate input, where no name lookup is attempted.
pub const CURRENT_LOCATION: &str = "Current Location";

pub struct LocationResolver;

impl LocationResolver {
    pub async fn resolve(
        provider: &dyn WeatherProvider,
        input: &str,
    ) -> Result<ResolvedLocation, WeatherError> {
        let input = input.trim();
        debug!("Resolving location input: {:?}", input);

        if let Some((latitude, longitude)) = parse_coordinates(input) {
            return Ok(ResolvedLocation {
                latitude,
                longitude,
                display_name: CURRENT_LOCATION.to_string(),
                region: format!("{latitude:.2}, {longitude:.2}"),
            });
        }

        if input.is_empty() {
            return Err(WeatherError::NotFound(String::new()));
        }

        let candidate = provider
            .geocode(input)
            .await?
            .into_iter()
            .next()
            .ok_or_else(|| WeatherError::NotFound(input.to_string()))?;

        debug!(
            "Found location: {} ({:.4}, {:.4})",
            candidate.name, candidate.latitude, candidate.longitude
        );

        Ok(candidate.into())
    }
}

/// `"lat, lng"` with exactly two segments that both parse as finite floats.
pub fn parse_coordinates(input: &str) -> Option<(f64, f64)> {
    let (lat, lng) = input.split_once(',')?;
    if lng.contains(',') {
        return None;
    }

    let lat: f64 = lat.trim().parse().ok()?;
    let lng: f64 = lng.trim().parse().ok()?;

    (lat.is_finite() && lng.is_finite()).then_some((lat, lng))
}

/// Format coordinates the way [`parse_coordinates`] reads them.
pub fn format_coordinates(latitude: f64, longitude: f64) -> String {
    format!("{latitude}, {longitude}")
}
