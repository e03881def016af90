//! AI enrichment on top of a snapshot.
//!
//! Two tiers share one [`TextGenerator`]:
//! - a quick free-text summary that degrades to an empty string on any failure
//! - a schema-constrained deep analysis that reports [`AnalysisError`]
//!
//! Neither tier can block or fail the snapshot itself.

use async_trait::async_trait;
use parking_lot::Mutex;
use serde_json::{Value, json};
use std::{fmt::Debug, time::Duration};
use tracing::{debug, warn};

use crate::{
    Config,
    ai::gemini::GeminiGenerator,
    error::{AiError, AnalysisError},
    model::{AiAnalysis, Enrichment, WeatherData},
};

pub mod gemini;

/// One request to a generative-text model.
#[derive(Debug, Clone, PartialEq)]
pub struct GenerationRequest {
    pub model: String,
    pub prompt: String,
    /// JSON schema the response must follow. `None` means free text.
    pub response_schema: Option<Value>,
    /// Reasoning token budget, for models that support it.
    pub thinking_budget: Option<u32>,
    /// Deadline for this call. `None` uses the generator's default request timeout.
    pub timeout: Option<Duration>,
}

#[async_trait]
pub trait TextGenerator: Send + Sync + Debug {
    async fn generate(&self, request: &GenerationRequest) -> Result<String, AiError>;
}

/// Model selection for both tiers.
#[derive(Debug, Clone, PartialEq)]
pub struct EnrichmentSettings {
    /// Request the quick summary for every applied snapshot.
    pub quick_summary: bool,
    pub summary_model: String,
    pub analysis_model: String,
    pub thinking_budget: u32,
    pub analysis_timeout: Duration,
}

/// Construct the production generator, or `None` when no API key is configured.
pub fn generator_from_config(config: &Config) -> Result<Option<Box<dyn TextGenerator>>, AiError> {
    let Some(api_key) = config.ai_api_key() else {
        return Ok(None);
    };

    let generator = GeminiGenerator::new(api_key.to_owned(), config.request_timeout())?;
    Ok(Some(Box::new(generator)))
}

const MARKUP_CHARS: &[char] = &['*', '#', '`', '_'];

/// Free-text one-liner for the snapshot. Returns an empty string on any failure.
pub async fn summarize(
    generator: &dyn TextGenerator,
    model: &str,
    snapshot: &WeatherData,
) -> String {
    let request = GenerationRequest {
        model: model.to_string(),
        prompt: summary_prompt(snapshot),
        response_schema: None,
        thinking_budget: None,
        timeout: None,
    };

    match generator.generate(&request).await {
        Ok(text) => strip_markup(&text),
        Err(e) => {
            warn!("Quick summary failed for {}: {}", snapshot.city, e);
            String::new()
        }
    }
}

/// Structured advice for the snapshot, constrained to the three-field schema.
/// Bounded by `settings.analysis_timeout`, not by the generator's default request timeout.
pub async fn analyze(
    generator: &dyn TextGenerator,
    settings: &EnrichmentSettings,
    snapshot: &WeatherData,
) -> Result<AiAnalysis, AnalysisError> {
    let request = GenerationRequest {
        model: settings.analysis_model.clone(),
        prompt: analysis_prompt(snapshot),
        response_schema: Some(analysis_schema()),
        thinking_budget: Some(settings.thinking_budget),
        timeout: Some(settings.analysis_timeout),
    };

    let text = generator.generate(&request).await?;
    parse_analysis(&text)
}

pub fn strip_markup(text: &str) -> String {
    text.replace(MARKUP_CHARS, "").trim().to_string()
}

fn summary_prompt(snapshot: &WeatherData) -> String {
    format!(
        "Write one short, friendly sentence describing the weather in {}: {} and {}°C. \
         Plain text only, no markdown.",
        snapshot.city, snapshot.condition, snapshot.temperature
    )
}

fn analysis_prompt(snapshot: &WeatherData) -> String {
    let daily = serde_json::to_string(&snapshot.daily).unwrap_or_else(|_| "[]".to_string());

    format!(
        "You are a meteorologist and lifestyle assistant. Current weather in {city}: {condition}, \
         temperature {temp}°C, feels like {feels}°C, humidity {humidity}%, wind {wind} km/h, \
         UV index {uv}. Five-day forecast: {daily}.\n\
         Respond in JSON with three fields: \"advice\" (practical advice for the day), \
         \"outfit\" (what to wear), and \"details\" (a short explanation of the forecast trend).",
        city = snapshot.city,
        condition = snapshot.condition,
        temp = snapshot.temperature,
        feels = snapshot.feels_like,
        humidity = snapshot.humidity,
        wind = snapshot.wind_speed,
        uv = snapshot.uv_index,
    )
}

/// JSON schema for [`AiAnalysis`], in the provider's OpenAPI subset.
pub fn analysis_schema() -> Value {
    json!({
        "type": "OBJECT",
        "properties": {
            "advice": { "type": "STRING" },
            "outfit": { "type": "STRING" },
            "details": { "type": "STRING" }
        },
        "required": ["advice", "outfit", "details"]
    })
}

/// Parse the model output. Anything that is not a JSON object is a schema error; missing or
/// non-string fields become empty strings.
pub fn parse_analysis(text: &str) -> Result<AiAnalysis, AnalysisError> {
    let value: Value = serde_json::from_str(text.trim())
        .map_err(|e| AnalysisError::Schema(format!("invalid JSON: {e}")))?;

    let Value::Object(fields) = value else {
        return Err(AnalysisError::Schema("expected a JSON object".to_string()));
    };

    let field = |name: &str| {
        fields
            .get(name)
            .and_then(Value::as_str)
            .unwrap_or_default()
            .to_string()
    };

    Ok(AiAnalysis {
        advice: field("advice"),
        outfit: field("outfit"),
        details: field("details"),
    })
}

/// Deep-analysis state for one snapshot. At most one request is in flight at a time.
#[derive(Debug, Default)]
pub struct AnalysisPanel {
    state: Mutex<Enrichment<AiAnalysis>>,
    last_error: Mutex<Option<String>>,
}

impl AnalysisPanel {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn state(&self) -> Enrichment<AiAnalysis> {
        self.state.lock().clone()
    }

    pub fn last_error(&self) -> Option<String> {
        self.last_error.lock().clone()
    }

    /// Run the deep analysis unless one is already pending.
    ///
    /// Returns `false` when the call was a no-op. On failure the panel returns to its
    /// pre-request state and the error is kept in [`AnalysisPanel::last_error`].
    pub async fn request(
        &self,
        generator: &dyn TextGenerator,
        settings: &EnrichmentSettings,
        snapshot: &WeatherData,
    ) -> bool {
        {
            let mut state = self.state.lock();
            if state.is_pending() {
                debug!("Deep analysis already in flight for {}", snapshot.city);
                return false;
            }
            *state = Enrichment::Pending;
        }
        let guard = PendingGuard { state: &self.state };

        let outcome =
            tokio::time::timeout(settings.analysis_timeout, analyze(generator, settings, snapshot))
                .await
                .unwrap_or(Err(AnalysisError::Timeout));

        match outcome {
            Ok(analysis) => {
                *self.last_error.lock() = None;
                *self.state.lock() = Enrichment::Ready(analysis);
            }
            Err(e) => {
                warn!("Deep analysis failed for {}: {}", snapshot.city, e);
                *self.last_error.lock() = Some(e.to_string());
                *self.state.lock() = Enrichment::Empty;
            }
        }
        drop(guard);

        true
    }
}

/// Clears `Pending` if the request future is dropped before it settles.
struct PendingGuard<'a> {
    state: &'a Mutex<Enrichment<AiAnalysis>>,
}

impl Drop for PendingGuard<'_> {
    fn drop(&mut self) {
        let mut state = self.state.lock();
        if state.is_pending() {
            *state = Enrichment::Empty;
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testing::{FakeGenerator, snapshot};
    use std::sync::Arc;

    fn settings() -> EnrichmentSettings {
        EnrichmentSettings {
            quick_summary: true,
            summary_model: "fast".into(),
            analysis_model: "deep".into(),
            thinking_budget: 32768,
            analysis_timeout: Duration::from_secs(5),
        }
    }

    #[test]
    fn strips_markup_characters() {
        assert_eq!(strip_markup("  **Sunny** day in #Tokyo_ `now` \n"), "Sunny day in Tokyo now");
    }

    #[test]
    fn parses_complete_analysis() {
        let parsed =
            parse_analysis(r#"{"advice": "Go out", "outfit": "T-shirt", "details": "Warm"}"#)
                .unwrap();
        assert_eq!(parsed.advice, "Go out");
        assert_eq!(parsed.outfit, "T-shirt");
        assert_eq!(parsed.details, "Warm");
    }

    #[test]
    fn missing_or_mistyped_fields_become_empty() {
        let parsed = parse_analysis(r#"{"advice": "Go out", "outfit": 3}"#).unwrap();
        assert_eq!(parsed.advice, "Go out");
        assert_eq!(parsed.outfit, "");
        assert_eq!(parsed.details, "");
    }

    #[test]
    fn malformed_json_is_schema_error() {
        assert!(matches!(parse_analysis("{advice: nope"), Err(AnalysisError::Schema(_))));
        assert!(matches!(parse_analysis(r#"["a", "b"]"#), Err(AnalysisError::Schema(_))));
        assert!(matches!(parse_analysis(""), Err(AnalysisError::Schema(_))));
    }

    #[test]
    fn schema_requires_three_string_fields() {
        let schema = analysis_schema();
        assert_eq!(schema["required"], json!(["advice", "outfit", "details"]));
        assert_eq!(schema["properties"]["outfit"]["type"], "STRING");
    }

    #[tokio::test]
    async fn summary_embeds_snapshot_and_strips_markup() {
        let generator = FakeGenerator::replying("**Mild** and cloudy in Tokyo.");

        let summary = summarize(&generator, "fast", &snapshot("Tokyo")).await;

        assert_eq!(summary, "Mild and cloudy in Tokyo.");
        let request = generator.last_request().unwrap();
        assert_eq!(request.model, "fast");
        assert!(request.prompt.contains("Tokyo"));
        assert!(request.prompt.contains("Overcast"));
        assert!(request.response_schema.is_none());
    }

    #[tokio::test]
    async fn summary_failure_is_empty_string() {
        let generator = FakeGenerator::failing();

        let summary = summarize(&generator, "fast", &snapshot("Tokyo")).await;

        assert_eq!(summary, "");
    }

    #[tokio::test]
    async fn analysis_request_is_structured_with_budget() {
        let generator =
            FakeGenerator::replying(r#"{"advice": "a", "outfit": "b", "details": "c"}"#);

        let result = analyze(&generator, &settings(), &snapshot("Tokyo")).await.unwrap();

        assert_eq!(result.details, "c");
        let request = generator.last_request().unwrap();
        assert_eq!(request.model, "deep");
        assert_eq!(request.thinking_budget, Some(32768));
        assert_eq!(request.timeout, Some(Duration::from_secs(5)));
        assert!(request.response_schema.is_some());
        assert!(request.prompt.contains("Today"));
    }

    #[tokio::test]
    async fn malformed_analysis_leaves_panel_empty() {
        let generator = FakeGenerator::replying("not json at all");
        let panel = AnalysisPanel::new();

        let ran = panel.request(&generator, &settings(), &snapshot("Tokyo")).await;

        assert!(ran);
        assert_eq!(panel.state(), Enrichment::Empty);
        assert!(panel.last_error().unwrap().contains("schema"));
    }

    #[tokio::test]
    async fn successful_analysis_is_ready() {
        let generator =
            FakeGenerator::replying(r#"{"advice": "a", "outfit": "b", "details": "c"}"#);
        let panel = AnalysisPanel::new();

        panel.request(&generator, &settings(), &snapshot("Tokyo")).await;

        assert_eq!(panel.state().ready().map(|a| a.advice.as_str()), Some("a"));
        assert!(panel.last_error().is_none());
    }

    #[tokio::test]
    async fn second_request_while_pending_is_noop() {
        let generator = Arc::new(
            FakeGenerator::replying(r#"{"advice": "a", "outfit": "b", "details": "c"}"#)
                .gated(),
        );
        let panel = Arc::new(AnalysisPanel::new());
        let snap = snapshot("Tokyo");

        let first = {
            let (generator, panel, snap) = (generator.clone(), panel.clone(), snap.clone());
            tokio::spawn(async move { panel.request(generator.as_ref(), &settings(), &snap).await })
        };
        generator.wait_for_calls(1).await;
        assert!(panel.state().is_pending());

        let second = panel.request(generator.as_ref(), &settings(), &snap).await;
        assert!(!second);

        generator.release();
        assert!(first.await.unwrap());
        assert_eq!(generator.calls(), 1);
        assert!(panel.state().ready().is_some());
    }

    #[tokio::test(start_paused = true)]
    async fn hung_analysis_times_out() {
        let generator = FakeGenerator::replying("{}").gated();
        let panel = AnalysisPanel::new();
        let mut settings = settings();
        settings.analysis_timeout = Duration::from_millis(50);

        panel.request(&generator, &settings, &snapshot("Tokyo")).await;

        assert_eq!(panel.state(), Enrichment::Empty);
        assert!(panel.last_error().unwrap().contains("timed out"));
    }

    #[tokio::test(start_paused = true)]
    async fn cancelled_request_releases_panel() {
        let hung = FakeGenerator::replying("{}").gated();
        let panel = AnalysisPanel::new();
        let snap = snapshot("Tokyo");

        let cancelled = tokio::time::timeout(
            Duration::from_millis(20),
            panel.request(&hung, &settings(), &snap),
        )
        .await;
        assert!(cancelled.is_err());
        assert_eq!(panel.state(), Enrichment::Empty);

        let generator =
            FakeGenerator::replying(r#"{"advice": "a", "outfit": "b", "details": "c"}"#);
        assert!(panel.request(&generator, &settings(), &snap).await);
        assert!(panel.state().ready().is_some());
    }

    #[tokio::test]
    async fn summary_uses_default_request_timeout() {
        let generator = FakeGenerator::replying("Sunny.");

        summarize(&generator, "fast", &snapshot("Tokyo")).await;

        assert_eq!(generator.last_request().unwrap().timeout, None);
    }
}
