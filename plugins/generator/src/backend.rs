//! Upstream text generation seam and its HTTP implementation

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use std::time::Duration;
use tracing::{debug, error};
use webcraft_core::{GeneratorConfig, Result, WebcraftError};

/// A single-prompt generation request
#[derive(Debug, Clone, PartialEq)]
pub struct GenerationRequest {
    pub prompt: String,
    pub max_output_tokens: u32,
    pub temperature: f32,
}

impl GenerationRequest {
    pub fn new<S: Into<String>>(prompt: S, config: &GeneratorConfig) -> Self {
        Self {
            prompt: prompt.into(),
            max_output_tokens: config.max_output_tokens,
            temperature: config.temperature,
        }
    }
}

/// Anything that answers a prompt with text
#[async_trait]
pub trait TextGenerator: Send + Sync {
    async fn generate_text(&self, request: &GenerationRequest) -> Result<String>;
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct ApiRequest<'a> {
    contents: Vec<ApiContent<'a>>,
    generation_config: ApiGenerationConfig,
}

#[derive(Serialize)]
struct ApiContent<'a> {
    parts: Vec<ApiPart<'a>>,
}

#[derive(Serialize)]
struct ApiPart<'a> {
    text: &'a str,
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct ApiGenerationConfig {
    max_output_tokens: u32,
    temperature: f32,
}

#[derive(Debug, Default, Deserialize)]
#[serde(default)]
struct ApiResponse {
    candidates: Vec<ApiCandidate>,
}

#[derive(Debug, Default, Deserialize)]
#[serde(default)]
struct ApiCandidate {
    content: ApiCandidateContent,
}

#[derive(Debug, Default, Deserialize)]
#[serde(default)]
struct ApiCandidateContent {
    parts: Vec<ApiResponsePart>,
}

#[derive(Debug, Default, Deserialize)]
#[serde(default)]
struct ApiResponsePart {
    text: Option<String>,
}

impl ApiResponse {
    /// `candidates[0].content.parts[0].text`
    fn into_text(self) -> Option<String> {
        self.candidates
            .into_iter()
            .next()?
            .content
            .parts
            .into_iter()
            .next()?
            .text
            .filter(|text| !text.trim().is_empty())
    }
}

/// Generative language API over HTTPS
#[derive(Debug, Clone)]
pub struct GeminiBackend {
    client: reqwest::Client,
    url: String,
    api_key: String,
}

impl GeminiBackend {
    pub fn new(config: &GeneratorConfig) -> Result<Self> {
        let api_key = config.resolve_api_key().ok_or_else(|| {
            WebcraftError::config(format!(
                "No generation API key configured. Set generator.api_key or {}.",
                webcraft_core::config::API_KEY_ENV
            ))
        })?;
        let client = reqwest::Client::builder()
            .timeout(Duration::from_secs(config.timeout_secs))
            .build()
            .map_err(|e| WebcraftError::generation(format!("Failed to build HTTP client: {}", e)))?;

        Ok(Self {
            client,
            url: format!(
                "{}/{}:generateContent",
                config.endpoint.trim_end_matches('/'),
                config.model
            ),
            api_key,
        })
    }
}

#[async_trait]
impl TextGenerator for GeminiBackend {
    async fn generate_text(&self, request: &GenerationRequest) -> Result<String> {
        let body = ApiRequest {
            contents: vec![ApiContent {
                parts: vec![ApiPart {
                    text: &request.prompt,
                }],
            }],
            generation_config: ApiGenerationConfig {
                max_output_tokens: request.max_output_tokens,
                temperature: request.temperature,
            },
        };

        debug!("POST {} ({} prompt bytes)", self.url, request.prompt.len());
        let response = self
            .client
            .post(&self.url)
            .query(&[("key", self.api_key.as_str())])
            .json(&body)
            .send()
            .await
            .map_err(|e| {
                error!("Generation request failed: {}", e);
                WebcraftError::generation(format!("Failed to reach the generation API: {}", e))
            })?;

        let status = response.status();
        if !status.is_success() {
            let detail = response.text().await.unwrap_or_default();
            error!("Generation API returned {}: {}", status, detail);
            return Err(WebcraftError::generation(format!(
                "The generation API returned {}",
                status
            )));
        }

        let parsed: ApiResponse = response
            .json()
            .await
            .map_err(|e| WebcraftError::generation(format!("Unreadable generation response: {}", e)))?;
        parsed
            .into_text()
            .ok_or_else(|| WebcraftError::generation("No content generated from the AI"))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_request_body_shape() {
        let body = ApiRequest {
            contents: vec![ApiContent {
                parts: vec![ApiPart { text: "hello" }],
            }],
            generation_config: ApiGenerationConfig {
                max_output_tokens: 30000,
                temperature: 1.0,
            },
        };
        let json = serde_json::to_value(&body).unwrap();
        assert_eq!(json["contents"][0]["parts"][0]["text"], "hello");
        assert_eq!(json["generationConfig"]["maxOutputTokens"], 30000);
        assert_eq!(json["generationConfig"]["temperature"], 1.0);
    }

    #[test]
    fn test_first_candidate_text_is_used() {
        let response: ApiResponse = serde_json::from_str(
            r#"{"candidates":[{"content":{"parts":[{"text":"HTML_START x HTML_END"},{"text":"ignored"}]}},{"content":{"parts":[{"text":"second"}]}}]}"#,
        )
        .unwrap();
        assert_eq!(response.into_text().as_deref(), Some("HTML_START x HTML_END"));

        let empty: ApiResponse = serde_json::from_str(r#"{"candidates":[]}"#).unwrap();
        assert_eq!(empty.into_text(), None);
        let blocked: ApiResponse =
            serde_json::from_str(r#"{"promptFeedback":{"blockReason":"SAFETY"}}"#).unwrap();
        assert_eq!(blocked.into_text(), None);
    }

    #[test]
    fn test_backend_requires_a_key() {
        let mut config = GeneratorConfig::default();
        config.api_key = Some("test-key".to_string());
        config.model = "gemini-pro".to_string();
        let backend = GeminiBackend::new(&config).unwrap();
        assert_eq!(
            backend.url,
            "https://generativelanguage.googleapis.com/v1beta/models/gemini-pro:generateContent"
        );
    }
}
