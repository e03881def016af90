//! Device position acquisition.
//!
//! The CLI has no position sensor, so the production source asks an IP geolocation
//! service. Every lookup is bounded by an explicit timeout.

use async_trait::async_trait;
use reqwest::{Client, StatusCode};
use serde::Deserialize;
use std::{fmt::Debug, time::Duration};
use tracing::debug;

use crate::error::GeolocationError;

pub const IP_GEOLOCATION_URL: &str = "https://ipapi.co/json/";

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Coordinates {
    pub latitude: f64,
    pub longitude: f64,
}

#[async_trait]
pub trait Geolocator: Send + Sync + Debug {
    async fn locate(&self) -> Result<Coordinates, GeolocationError>;
}

/// Single bounded wait for a position.
pub async fn locate_with_timeout(
    geolocator: &dyn Geolocator,
    timeout: Duration,
) -> Result<Coordinates, GeolocationError> {
    tokio::time::timeout(timeout, geolocator.locate())
        .await
        .unwrap_or(Err(GeolocationError::Timeout))
}

/// Informational text shown after the fallback location has loaded.
pub fn advisory_message(err: &GeolocationError, fallback: &str) -> String {
    match err {
        GeolocationError::Denied(_) => {
            format!("Location access was denied, showing weather for {fallback} instead.")
        }
        GeolocationError::Unavailable(_) | GeolocationError::Timeout => {
            format!("Could not determine your location, showing weather for {fallback} instead.")
        }
    }
}

#[derive(Debug, Clone)]
pub struct IpGeolocator {
    http: Client,
    url: String,
}

#[derive(Debug, Deserialize)]
struct IpLookupResponse {
    latitude: Option<f64>,
    longitude: Option<f64>,
    #[serde(default)]
    reason: Option<String>,
}

impl IpGeolocator {
    pub fn new() -> Result<Self, GeolocationError> {
        Self::with_url(IP_GEOLOCATION_URL)
    }

    pub fn with_url(url: &str) -> Result<Self, GeolocationError> {
        let http = Client::builder()
            .build()
            .map_err(|e| GeolocationError::Unavailable(e.to_string()))?;

        Ok(Self {
            http,
            url: url.to_string(),
        })
    }
}

#[async_trait]
impl Geolocator for IpGeolocator {
    async fn locate(&self) -> Result<Coordinates, GeolocationError> {
        let res = self
            .http
            .get(&self.url)
            .send()
            .await
            .map_err(|e| GeolocationError::Unavailable(e.to_string()))?;

        let status = res.status();
        if matches!(status, StatusCode::FORBIDDEN | StatusCode::UNAUTHORIZED) {
            return Err(GeolocationError::Denied(format!("lookup returned {status}")));
        }
        if !status.is_success() {
            return Err(GeolocationError::Unavailable(format!("lookup returned {status}")));
        }

        let body: IpLookupResponse = res
            .json()
            .await
            .map_err(|e| GeolocationError::Unavailable(e.to_string()))?;

        match (body.latitude, body.longitude) {
            (Some(latitude), Some(longitude)) => {
                debug!("IP geolocation: ({:.4}, {:.4})", latitude, longitude);
                Ok(Coordinates { latitude, longitude })
            }
            _ => Err(GeolocationError::Unavailable(
                body.reason.unwrap_or_else(|| "no coordinates in response".to_string()),
            )),
        }
    }
}
