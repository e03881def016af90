use thiserror::Error;

/// Failures of the resolution pipeline (resolver, fetcher). Both abort the query.
#[derive(Debug, Error)]
pub enum WeatherError {
    /// Geocoding returned no candidate for the input.
    #[error("Location not found: {0}")]
    NotFound(String),

    /// Transport, status or payload failure from the weather provider.
    #[error("Weather provider error: {0}")]
    Provider(String),
}

impl WeatherError {
    pub fn provider<S: Into<String>>(message: S) -> Self {
        Self::Provider(message.into())
    }

    /// Single banner text shown to the user when a query fails.
    pub fn user_message(&self) -> String {
        match self {
            WeatherError::NotFound(query) if query.trim().is_empty() => {
                "Enter a city name or a \"lat, lng\" pair.".to_string()
            }
            WeatherError::NotFound(query) => {
                format!("Could not find \"{query}\". Check the spelling or try a nearby city.")
            }
            WeatherError::Provider(_) => {
                "Unable to load weather right now. Please try again.".to_string()
            }
        }
    }
}

impl From<reqwest::Error> for WeatherError {
    fn from(err: reqwest::Error) -> Self {
        Self::Provider(err.to_string())
    }
}

/// Failures of a single generative-text request.
#[derive(Debug, Error)]
pub enum AiError {
    #[error("AI request failed: {0}")]
    Request(String),

    #[error("AI provider returned status {status}: {body}")]
    Status { status: u16, body: String },

    #[error("AI provider returned no text")]
    EmptyResponse,
}

impl From<reqwest::Error> for AiError {
    fn from(err: reqwest::Error) -> Self {
        Self::Request(err.to_string())
    }
}

/// Failures of the deep analysis tier. Never surfaced as a blocking error.
#[derive(Debug, Error)]
pub enum AnalysisError {
    #[error(transparent)]
    Provider(#[from] AiError),

    #[error("Analysis response does not match the expected schema: {0}")]
    Schema(String),

    #[error("Analysis request timed out")]
    Timeout,
}

/// Device position could not be obtained; triggers the fallback-location flow.
#[derive(Debug, Error)]
pub enum GeolocationError {
    #[error("Location permission denied: {0}")]
    Denied(String),

    #[error("Location service unavailable: {0}")]
    Unavailable(String),

    #[error("Location request timed out")]
    Timeout,
}

/// Shorten an upstream response body for inclusion in an error message.
pub(crate) fn truncate_body(body: &str) -> String {
    const MAX: usize = 200;
    match body.char_indices().nth(MAX) {
        Some((idx, _)) => format!("{}...", &body[..idx]),
        None => body.to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn truncate_keeps_short_bodies() {
        assert_eq!(truncate_body("oops"), "oops");
    }

    #[test]
    fn truncate_cuts_long_bodies_on_char_boundary() {
        let body = "é".repeat(300);
        let out = truncate_body(&body);
        assert!(out.ends_with("..."));
        assert_eq!(out.chars().count(), 203);
    }

    #[test]
    fn not_found_message_mentions_query() {
        let err = WeatherError::NotFound("Atlantis".into());
        assert!(err.user_message().contains("Atlantis"));
        assert_eq!(err.to_string(), "Location not found: Atlantis");
    }

    #[test]
    fn blank_query_has_its_own_message() {
        let message = WeatherError::NotFound(String::new()).user_message();
        assert!(!message.contains("\"\""));
        assert!(message.contains("city name"));
    }

    #[test]
    fn provider_message_hides_details() {
        let err = WeatherError::provider("status 502: bad gateway");
        assert!(!err.user_message().contains("502"));
    }

    #[test]
    fn ai_error_converts_into_analysis_error() {
        let err: AnalysisError = AiError::EmptyResponse.into();
        assert!(matches!(err, AnalysisError::Provider(AiError::EmptyResponse)));
        assert_eq!(err.to_string(), "AI provider returned no text");
    }
}
