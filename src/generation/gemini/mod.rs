
use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use tracing::debug;
use url::Url;

use crate::config::{ApiKey, Config};

const DEFAULT_BASE_URL: &str = "https://generativelanguage.googleapis.com";

/// HTTP client for the Gemini text-generation API.
///
/// One request per answer: no retry, no backoff, no streaming. A network or
/// API failure is returned to the caller unfiltered.
pub struct GeminiClient {
    base_url: Url,
    model: String,
    temperature: f32,
    api_key: ApiKey,
    agent: ureq::Agent,
}

#[derive(Debug, Serialize)]
struct GenerateRequest {
    contents: Vec<Content>,
    #[serde(rename = "generationConfig")]
    generation_config: GenerationSettings,
}

#[derive(Debug, Serialize, Deserialize)]
struct Content {
    #[serde(skip_serializing_if = "Option::is_none")]
    role: Option<String>,
    parts: Vec<Part>,
}

#[derive(Debug, Serialize, Deserialize)]
struct Part {
    text: String,
}

#[derive(Debug, Serialize)]
struct GenerationSettings {
    temperature: f32,
}

#[derive(Debug, Deserialize)]
struct GenerateResponse {
    #[serde(default)]
    candidates: Vec<Candidate>,
}

#[derive(Debug, Deserialize)]
struct Candidate {
    content: Content,
}

impl GeminiClient {
    #[inline]
    pub fn new(config: &Config, api_key: ApiKey) -> Result<Self> {
        let base_url = Url::parse(DEFAULT_BASE_URL).context("Failed to parse Gemini base URL")?;

        // Timeouts stay at the HTTP client's defaults.
        let agent = ureq::Agent::config_builder().build().into();

        Ok(Self {
            base_url,
            model: config.generation.model.clone(),
            temperature: config.generation.temperature,
            api_key,
            agent,
        })
    }

    /// Override the API endpoint. Used by tests against a mock server.
    #[inline]
    pub fn with_base_url(mut self, base_url: Url) -> Self {
        self.base_url = base_url;
        self
    }

    /// Name of the generation model this client targets.
    #[inline]
    pub fn model(&self) -> &str {
        &self.model
    }

    /// Send one composed prompt and return the model's text response
    /// unmodified.
    #[inline]
    pub fn generate(&self, prompt: &str) -> Result<String> {
        debug!(
            "Generating answer with model {} (prompt length: {})",
            self.model,
            prompt.len()
        );

        let request = GenerateRequest {
            contents: vec![Content {
                role: Some("user".to_string()),
                parts: vec![Part {
                    text: prompt.to_string(),
                }],
            }],
            generation_config: GenerationSettings {
                temperature: self.temperature,
            },
        };

        let url = self
            .base_url
            .join(&format!("/v1beta/models/{}:generateContent", self.model))
            .context("Failed to build generateContent URL")?;

        let request_json =
            serde_json::to_string(&request).context("Failed to serialize generation request")?;

        let response_text = self
            .agent
            .post(url.as_str())
            .header("Content-Type", "application/json")
            .header("x-goog-api-key", self.api_key.expose())
            .send(&request_json)
            .and_then(|mut resp| resp.body_mut().read_to_string())
            .context("Failed to call generation API")?;

        let response: GenerateResponse =
            serde_json::from_str(&response_text).context("Failed to parse generation response")?;

        let candidate = response
            .candidates
            .into_iter()
            .next()
            .context("Generation response contained no candidates")?;

        let text = candidate
            .content
            .parts
            .into_iter()
            .map(|part| part.text)
            .collect::<Vec<_>>()
            .join("");

        debug!("Generated answer ({} chars)", text.len());

        Ok(text)
    }
}
