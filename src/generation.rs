//! Text generation for free-text replies
//!
//! Provides the [`TextGenerator`] trait with a Gemini implementation, and
//! [`GenerationService`], which bounds every call with a timeout and a
//! circuit breaker so a slow or failing service never stalls a handler.

use async_trait::async_trait;
use reqwest::Client;
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use std::time::Duration;
use thiserror::Error;
use tracing::{debug, warn};

use crate::circuit_breaker::CircuitBreaker;
use crate::config::GenerationConfig;

pub const GEMINI_BASE_URL: &str = "https://generativelanguage.googleapis.com/v1beta";
const API_KEY_HEADER: &str = "x-goog-api-key";

/// Text generation errors
#[derive(Error, Debug)]
pub enum GenerationError {
    #[error("HTTP request failed: {0}")]
    Http(#[from] reqwest::Error),

    #[error("API error ({code}): {message}")]
    Api { code: u16, message: String },

    #[error("Response contained no text")]
    EmptyResponse,

    #[error("Missing API key")]
    MissingApiKey,

    #[error("Generation timed out after {0:?}")]
    Timeout(Duration),

    #[error("Generation temporarily disabled after repeated failures")]
    CircuitOpen,
}

/// Abstraction over text generation providers.
#[async_trait]
pub trait TextGenerator: Send + Sync {
    /// Generate a reply for the prompt.
    async fn generate(&self, prompt: &str) -> Result<String, GenerationError>;

    /// Provider name for logging.
    fn name(&self) -> &str;
}

// Gemini API structs (private)

#[derive(Debug, Serialize)]
struct GenerateRequest {
    contents: Vec<Content>,
}

#[derive(Debug, Serialize, Deserialize)]
struct Content {
    #[serde(default)]
    parts: Vec<Part>,
}

#[derive(Debug, Serialize, Deserialize)]
struct Part {
    #[serde(default)]
    text: Option<String>,
}

#[derive(Debug, Deserialize)]
struct GenerateResponse {
    #[serde(default)]
    candidates: Vec<Candidate>,
}

#[derive(Debug, Deserialize)]
struct Candidate {
    content: Option<Content>,
}

#[derive(Debug, Deserialize)]
struct ErrorResponse {
    error: Option<ErrorDetail>,
}

#[derive(Debug, Deserialize)]
struct ErrorDetail {
    code: u16,
    message: String,
}

/// Gemini client calling the `generateContent` endpoint.
#[derive(Debug, Clone)]
pub struct GeminiClient {
    client: Client,
    api_key: String,
    model: String,
    base_url: String,
}

impl GeminiClient {
    pub fn new(api_key: &str, model: &str, timeout: Duration) -> Result<Self, GenerationError> {
        Self::with_base_url(api_key, model, timeout, GEMINI_BASE_URL.to_string())
    }

    /// Create a client with a custom base URL (for testing)
    pub fn with_base_url(
        api_key: &str,
        model: &str,
        timeout: Duration,
        base_url: String,
    ) -> Result<Self, GenerationError> {
        if api_key.is_empty() {
            return Err(GenerationError::MissingApiKey);
        }

        let client = Client::builder().timeout(timeout).build()?;

        Ok(Self {
            client,
            api_key: api_key.to_string(),
            model: model.to_string(),
            base_url,
        })
    }
}

#[async_trait]
impl TextGenerator for GeminiClient {
    async fn generate(&self, prompt: &str) -> Result<String, GenerationError> {
        // Request errors include the URL, so the key must stay out of it
        let url = format!("{}/models/{}:generateContent", self.base_url, self.model);

        let request = GenerateRequest {
            contents: vec![Content {
                parts: vec![Part {
                    text: Some(prompt.to_string()),
                }],
            }],
        };

        let response = self
            .client
            .post(&url)
            .header(API_KEY_HEADER, &self.api_key)
            .json(&request)
            .send()
            .await?;
        let status = response.status();

        if !status.is_success() {
            let error_body = response.text().await.unwrap_or_default();
            let (code, message) = serde_json::from_str::<ErrorResponse>(&error_body)
                .ok()
                .and_then(|e| e.error)
                .map(|e| (e.code, e.message))
                .unwrap_or((status.as_u16(), error_body));

            warn!(code = code, message = %message, "Gemini API error");
            return Err(GenerationError::Api { code, message });
        }

        let body: GenerateResponse = response.json().await?;

        let text: String = body
            .candidates
            .into_iter()
            .next()
            .and_then(|candidate| candidate.content)
            .map(|content| {
                content
                    .parts
                    .into_iter()
                    .filter_map(|part| part.text)
                    .collect()
            })
            .unwrap_or_default();

        if text.trim().is_empty() {
            return Err(GenerationError::EmptyResponse);
        }

        Ok(text)
    }

    fn name(&self) -> &str {
        "gemini"
    }
}

/// Generation with a bounded call time and a circuit breaker
pub struct GenerationService {
    generator: Option<Arc<dyn TextGenerator>>,
    breaker: CircuitBreaker,
    timeout: Duration,
}

impl GenerationService {
    pub fn new(
        generator: Option<Arc<dyn TextGenerator>>,
        breaker: CircuitBreaker,
        timeout: Duration,
    ) -> Self {
        Self {
            generator,
            breaker,
            timeout,
        }
    }

    /// Build the Gemini-backed service; disabled when no API key is configured
    pub fn from_config(config: &GenerationConfig, timeout: Duration) -> Result<Self, GenerationError> {
        let generator: Option<Arc<dyn TextGenerator>> = match config.api_key.as_deref() {
            Some(key) => {
                let client = GeminiClient::new(key, &config.model, timeout)?;
                Some(Arc::new(client) as Arc<dyn TextGenerator>)
            }
            None => {
                warn!("GEMINI_API_KEY not set, free-text replies are disabled");
                None
            }
        };

        Ok(Self::new(
            generator,
            CircuitBreaker::new(config.breaker.clone()),
            timeout,
        ))
    }

    /// Forward a prompt to the generator
    pub async fn reply(&self, prompt: &str) -> Result<String, GenerationError> {
        let generator = self.generator.as_ref().ok_or(GenerationError::MissingApiKey)?;

        if self.breaker.is_open() {
            return Err(GenerationError::CircuitOpen);
        }

        debug!(provider = generator.name(), prompt_length = prompt.len(), "Forwarding prompt");

        let result = match tokio::time::timeout(self.timeout, generator.generate(prompt)).await {
            Ok(result) => result,
            Err(_) => Err(GenerationError::Timeout(self.timeout)),
        };

        match &result {
            Ok(_) => self.breaker.record_success(),
            Err(_) => self.breaker.record_failure(),
        }

        result
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::BreakerConfig;

    struct Echo;

    #[async_trait]
    impl TextGenerator for Echo {
        async fn generate(&self, prompt: &str) -> Result<String, GenerationError> {
            Ok(format!("echo: {prompt}"))
        }

        fn name(&self) -> &str {
            "echo"
        }
    }

    struct Failing;

    #[async_trait]
    impl TextGenerator for Failing {
        async fn generate(&self, _prompt: &str) -> Result<String, GenerationError> {
            Err(GenerationError::EmptyResponse)
        }

        fn name(&self) -> &str {
            "failing"
        }
    }

    struct Slow;

    #[async_trait]
    impl TextGenerator for Slow {
        async fn generate(&self, _prompt: &str) -> Result<String, GenerationError> {
            tokio::time::sleep(Duration::from_secs(5)).await;
            Ok("late".to_string())
        }

        fn name(&self) -> &str {
            "slow"
        }
    }

    fn service(generator: Option<Arc<dyn TextGenerator>>, threshold: u32) -> GenerationService {
        GenerationService::new(
            generator,
            CircuitBreaker::new(BreakerConfig {
                failure_threshold: threshold,
                reset_after: Duration::from_secs(60),
            }),
            Duration::from_millis(50),
        )
    }

    #[test]
    fn test_client_requires_api_key() {
        let result = GeminiClient::new("", "gemini-2.0-flash", Duration::from_secs(1));
        assert!(matches!(result, Err(GenerationError::MissingApiKey)));
    }

    #[tokio::test]
    async fn test_reply_passes_through() {
        let service = service(Some(Arc::new(Echo)), 3);
        assert_eq!(service.reply("hi").await.unwrap(), "echo: hi");
    }

    #[tokio::test]
    async fn test_reply_without_generator() {
        let service = service(None, 3);
        assert!(matches!(
            service.reply("hi").await,
            Err(GenerationError::MissingApiKey)
        ));
    }

    #[tokio::test]
    async fn test_reply_times_out() {
        let service = service(Some(Arc::new(Slow)), 3);
        assert!(matches!(
            service.reply("hi").await,
            Err(GenerationError::Timeout(_))
        ));
    }

    #[tokio::test]
    async fn test_breaker_opens_after_failures() {
        let service = service(Some(Arc::new(Failing)), 2);

        assert!(matches!(service.reply("a").await, Err(GenerationError::EmptyResponse)));
        assert!(matches!(service.reply("b").await, Err(GenerationError::EmptyResponse)));
        assert!(matches!(service.reply("c").await, Err(GenerationError::CircuitOpen)));
    }
}
