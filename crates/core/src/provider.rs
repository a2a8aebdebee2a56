use std::{fmt, time::Duration};

use async_trait::async_trait;
use serde::{Deserialize, Serialize};

use crate::config::GenerationConfig;

const EMPTY_RESPONSE_TEXT: &str = "No response generated from Gemini";

#[derive(Debug, thiserror::Error)]
pub enum GenerationError {
    #[error("Missing API key: {env_var} environment variable is not set")]
    MissingApiKey { env_var: String },

    #[error("HTTP error: {0}")]
    HttpError(#[from] reqwest::Error),

    #[error("Gemini API returned {status}: {body}")]
    ApiError { status: u16, body: String },
}

/// A remote model that turns a prompt body into generated text.
#[async_trait]
pub trait TextGenerator: Send + Sync {
    fn model(&self) -> &str;

    async fn generate(&self, prompt: &str) -> Result<String, GenerationError>;
}

#[derive(Debug, Serialize)]
struct GenerateRequest<'a> {
    contents: [Content<'a>; 1],
}

#[derive(Debug, Serialize)]
struct Content<'a> {
    parts: [Part<'a>; 1],
}

#[derive(Debug, Serialize)]
struct Part<'a> {
    text: &'a str,
}

#[derive(Debug, Default, Deserialize)]
struct GenerateResponse {
    #[serde(default)]
    candidates: Vec<Candidate>,
}

#[derive(Debug, Deserialize)]
struct Candidate {
    #[serde(default)]
    content: Option<ResponseContent>,
}

#[derive(Debug, Deserialize)]
struct ResponseContent {
    #[serde(default)]
    parts: Vec<ResponsePart>,
}

#[derive(Debug, Deserialize)]
struct ResponsePart {
    #[serde(default)]
    text: Option<String>,
}

impl GenerateResponse {
    fn into_text(self) -> String {
        let text: String = self
            .candidates
            .into_iter()
            .next()
            .and_then(|c| c.content)
            .map(|content| {
                content
                    .parts
                    .into_iter()
                    .filter_map(|p| p.text)
                    .collect()
            })
            .unwrap_or_default();

        if text.trim().is_empty() {
            EMPTY_RESPONSE_TEXT.to_string()
        } else {
            text
        }
    }
}

/// Gemini `generateContent` over plain HTTP.
pub struct GeminiClient {
    config: GenerationConfig,
    api_key: Option<String>,
    client: reqwest::Client,
}

impl fmt::Debug for GeminiClient {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("GeminiClient")
            .field("model", &self.config.model)
            .field("base_url", &self.config.base_url)
            .field("api_key", &self.api_key.as_ref().map(|_| "[REDACTED]"))
            .finish()
    }
}

impl GeminiClient {
    /// The API key is resolved here but only checked when it is needed.
    pub fn new(config: GenerationConfig) -> Result<Self, GenerationError> {
        let client = reqwest::Client::builder()
            .timeout(Duration::from_secs(config.timeout_secs))
            .build()?;
        let api_key = config.resolve_api_key();

        Ok(Self {
            config,
            api_key,
            client,
        })
    }

    pub fn name(&self) -> &'static str {
        "Gemini"
    }

    /// Validate that an API key is available for this client
    pub fn validate_api_key(&self) -> Result<&str, GenerationError> {
        self.api_key
            .as_deref()
            .ok_or_else(|| GenerationError::MissingApiKey {
                env_var: self.config.api_key_env.clone(),
            })
    }

    fn endpoint(&self) -> String {
        format!(
            "{}/models/{}:generateContent",
            self.config.base_url.trim_end_matches('/'),
            self.config.model
        )
    }
}

#[async_trait]
impl TextGenerator for GeminiClient {
    fn model(&self) -> &str {
        &self.config.model
    }

    async fn generate(&self, prompt: &str) -> Result<String, GenerationError> {
        let api_key = self.validate_api_key()?;

        let request = GenerateRequest {
            contents: [Content {
                parts: [Part { text: prompt }],
            }],
        };

        tracing::info!(model = %self.config.model, chars = prompt.len(), "Querying {}", self.name());

        let response = self
            .client
            .post(self.endpoint())
            .header("x-goog-api-key", api_key)
            .json(&request)
            .send()
            .await?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(GenerationError::ApiError {
                status: status.as_u16(),
                body,
            });
        }

        let parsed: GenerateResponse = response.json().await?;
        Ok(parsed.into_text())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn config_without_key() -> GenerationConfig {
        GenerationConfig {
            api_key_env: "YTPREP_TEST_UNSET_VARIABLE".into(),
            ..Default::default()
        }
    }

    #[tokio::test]
    async fn missing_key_fails_before_network() {
        let client = GeminiClient::new(config_without_key()).unwrap();
        let err = client.generate("hello").await.unwrap_err();
        match err {
            GenerationError::MissingApiKey { env_var } => {
                assert_eq!(env_var, "YTPREP_TEST_UNSET_VARIABLE")
            }
            other => panic!("unexpected error: {other}"),
        }
    }

    #[test]
    fn endpoint_includes_model() {
        let client = GeminiClient::new(GenerationConfig {
            base_url: "http://localhost:9999/v1beta/".into(),
            model: "gemini-2.5-flash".into(),
            ..config_without_key()
        })
        .unwrap();
        assert_eq!(
            client.endpoint(),
            "http://localhost:9999/v1beta/models/gemini-2.5-flash:generateContent"
        );
    }

    #[test]
    fn request_body_shape() {
        let request = GenerateRequest {
            contents: [Content {
                parts: [Part { text: "hi" }],
            }],
        };
        let json = serde_json::to_value(&request).unwrap();
        assert_eq!(json["contents"][0]["parts"][0]["text"], "hi");
    }

    #[test]
    fn response_text_joins_parts() {
        let raw = r#"{"candidates":[{"content":{"parts":[{"text":"1. A\n"},{"text":"2. B"}]}}]}"#;
        let parsed: GenerateResponse = serde_json::from_str(raw).unwrap();
        assert_eq!(parsed.into_text(), "1. A\n2. B");
    }

    #[test]
    fn empty_response_uses_fallback_text() {
        let parsed: GenerateResponse =
            serde_json::from_str(r#"{"promptFeedback":{"blockReason":"SAFETY"}}"#).unwrap();
        assert_eq!(parsed.into_text(), EMPTY_RESPONSE_TEXT);
    }

    #[test]
    fn debug_hides_key() {
        let client = GeminiClient::new(GenerationConfig {
            api_key: "super-secret".into(),
            ..Default::default()
        })
        .unwrap();
        assert!(!format!("{:?}", client).contains("super-secret"));
    }
}
