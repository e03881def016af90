use async_trait::async_trait;
use reqwest::Client;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::time::Duration;
use tracing::debug;

use crate::error::{AiError, truncate_body};

use super::{GenerationRequest, TextGenerator};

pub const GEMINI_BASE_URL: &str = "https://generativelanguage.googleapis.com";

#[derive(Debug, Clone)]
pub struct GeminiGenerator {
    api_key: String,
    base_url: String,
    /// Applied to requests that do not carry their own deadline.
    request_timeout: Duration,
    http: Client,
}

impl GeminiGenerator {
    pub fn new(api_key: String, request_timeout: Duration) -> Result<Self, AiError> {
        Self::with_base_url(api_key, GEMINI_BASE_URL, request_timeout)
    }

    pub fn with_base_url(
        api_key: String,
        base_url: &str,
        request_timeout: Duration,
    ) -> Result<Self, AiError> {
        // No client-wide timeout: deep analyses set a longer per-request deadline.
        let http = Client::builder().connect_timeout(request_timeout).build()?;

        Ok(Self {
            api_key,
            base_url: base_url.trim_end_matches('/').to_string(),
            request_timeout,
            http,
        })
    }

    fn endpoint(&self, model: &str) -> String {
        format!("{}/v1beta/models/{}:generateContent", self.base_url, model)
    }
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct GenerateContentRequest<'a> {
    contents: Vec<Content<'a>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    generation_config: Option<GenerationConfig<'a>>,
}

#[derive(Debug, Serialize)]
struct Content<'a> {
    role: &'a str,
    parts: Vec<RequestPart<'a>>,
}

#[derive(Debug, Serialize)]
struct RequestPart<'a> {
    text: &'a str,
}

#[derive(Debug, Default, Serialize)]
#[serde(rename_all = "camelCase")]
struct GenerationConfig<'a> {
    #[serde(skip_serializing_if = "Option::is_none")]
    response_mime_type: Option<&'a str>,
    #[serde(skip_serializing_if = "Option::is_none")]
    response_schema: Option<&'a Value>,
    #[serde(skip_serializing_if = "Option::is_none")]
    thinking_config: Option<ThinkingConfig>,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct ThinkingConfig {
    thinking_budget: u32,
}

#[derive(Debug, Deserialize)]
struct GenerateContentResponse {
    #[serde(default)]
    candidates: Vec<Candidate>,
}

#[derive(Debug, Deserialize)]
struct Candidate {
    content: Option<ResponseContent>,
}

#[derive(Debug, Deserialize)]
struct ResponseContent {
    #[serde(default)]
    parts: Vec<ResponsePart>,
}

#[derive(Debug, Deserialize)]
struct ResponsePart {
    text: Option<String>,
    // Reasoning summaries, not answer text.
    #[serde(default)]
    thought: bool,
}

fn build_body(request: &GenerationRequest) -> GenerateContentRequest<'_> {
    let generation_config = match (&request.response_schema, request.thinking_budget) {
        (None, None) => None,
        (schema, budget) => Some(GenerationConfig {
            response_mime_type: schema.as_ref().map(|_| "application/json"),
            response_schema: schema.as_ref(),
            thinking_config: budget.map(|thinking_budget| ThinkingConfig { thinking_budget }),
        }),
    };

    GenerateContentRequest {
        contents: vec![Content {
            role: "user",
            parts: vec![RequestPart { text: &request.prompt }],
        }],
        generation_config,
    }
}

fn extract_text(response: GenerateContentResponse) -> Result<String, AiError> {
    let text: String = response
        .candidates
        .into_iter()
        .next()
        .and_then(|c| c.content)
        .map(|content| {
            content
                .parts
                .into_iter()
                .filter(|p| !p.thought)
                .filter_map(|p| p.text)
                .collect()
        })
        .unwrap_or_default();

    if text.trim().is_empty() {
        return Err(AiError::EmptyResponse);
    }

    Ok(text)
}

#[async_trait]
impl TextGenerator for GeminiGenerator {
    async fn generate(&self, request: &GenerationRequest) -> Result<String, AiError> {
        debug!(
            "Gemini request: model={}, structured={}",
            request.model,
            request.response_schema.is_some()
        );

        let res = self
            .http
            .post(self.endpoint(&request.model))
            .header("x-goog-api-key", &self.api_key)
            .timeout(request.timeout.unwrap_or(self.request_timeout))
            .json(&build_body(request))
            .send()
            .await?;

        let status = res.status();
        let body = res.text().await?;

        if !status.is_success() {
            return Err(AiError::Status {
                status: status.as_u16(),
                body: truncate_body(&body),
            });
        }

        let parsed: GenerateContentResponse = serde_json::from_str(&body)
            .map_err(|e| AiError::Request(format!("Failed to parse Gemini response: {e}")))?;

        extract_text(parsed)
    }
}
