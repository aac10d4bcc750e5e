//! Google Gemini generateContent adapter

use std::time::{Duration, Instant};

use async_trait::async_trait;
use serde_json::{json, Value};
use tokio::sync::RwLock;
use tracing::{debug, error};

use crate::core::prompt::{build_messages, flatten_messages};
use crate::traits::Provider;
use crate::types::{LlmResponse, ProviderConfig, ProviderId};

const DEFAULT_ENDPOINT: &str = "https://generativelanguage.googleapis.com";

/// Adapter for the Gemini generateContent API
///
/// Gemini has no role-separated turns, so the system prompt and user turn
/// are flattened into a single text block.
pub struct GeminiProvider {
    config: ProviderConfig,
    endpoint: String,
    client: RwLock<Option<reqwest::Client>>,
}

impl GeminiProvider {
    pub fn new(config: ProviderConfig) -> Self {
        Self::with_endpoint(config, DEFAULT_ENDPOINT)
    }

    /// Point the adapter at a different base URL (used by tests)
    pub fn with_endpoint(config: ProviderConfig, endpoint: impl Into<String>) -> Self {
        Self {
            config,
            endpoint: endpoint.into(),
            client: RwLock::new(None),
        }
    }

    async fn session(&self) -> Result<reqwest::Client, String> {
        {
            let guard = self.client.read().await;
            if let Some(client) = guard.as_ref() {
                return Ok(client.clone());
            }
        }
        let mut guard = self.client.write().await;
        if let Some(client) = guard.as_ref() {
            return Ok(client.clone());
        }
        let client = reqwest::Client::builder()
            .timeout(Duration::from_secs(self.config.timeout_seconds))
            .build()
            .map_err(|e| format!("failed to build http client: {e}"))?;
        *guard = Some(client.clone());
        Ok(client)
    }

    fn safety_settings() -> Value {
        let categories = [
            "HARM_CATEGORY_HARASSMENT",
            "HARM_CATEGORY_HATE_SPEECH",
            "HARM_CATEGORY_SEXUALLY_EXPLICIT",
            "HARM_CATEGORY_DANGEROUS_CONTENT",
        ];
        Value::Array(
            categories
                .iter()
                .map(|category| json!({ "category": category, "threshold": "BLOCK_ONLY_HIGH" }))
                .collect(),
        )
    }
}

#[async_trait]
impl Provider for GeminiProvider {
    fn id(&self) -> ProviderId {
        ProviderId::Gemini
    }

    async fn generate<'a>(
        &self,
        prompt: &str,
        context: Option<&'a str>,
        system_prompt: Option<&'a str>,
    ) -> LlmResponse {
        let started = Instant::now();

        let client = match self.session().await {
            Ok(client) => client,
            Err(e) => return LlmResponse::failure(self.id(), &self.config.model, 0.0, e),
        };

        let full_prompt = flatten_messages(&build_messages(prompt, context, system_prompt));
        let payload = json!({
            "contents": [{ "parts": [{ "text": full_prompt }] }],
            "generationConfig": {
                "temperature": self.config.temperature,
                "maxOutputTokens": self.config.max_tokens,
                "topP": 0.95,
                "topK": 40,
            },
            "safetySettings": Self::safety_settings(),
        });

        let url = format!(
            "{}/v1beta/models/{}:generateContent",
            self.endpoint, self.config.model
        );
        let response = match client
            .post(&url)
            .query(&[("key", self.config.api_key.as_str())])
            .json(&payload)
            .send()
            .await
        {
            Ok(response) => response,
            Err(e) => {
                let latency = started.elapsed().as_secs_f64();
                let message = if e.is_timeout() {
                    format!("timeout after {}s", self.config.timeout_seconds)
                } else {
                    format!("network error: {e}")
                };
                error!(provider = %self.id(), error = %message, "request failed");
                return LlmResponse::failure(self.id(), &self.config.model, latency, message);
            }
        };

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            let latency = started.elapsed().as_secs_f64();
            error!(provider = %self.id(), %status, "API error");
            return LlmResponse::failure(
                self.id(),
                &self.config.model,
                latency,
                format!("API error ({status}): {body}"),
            );
        }

        let data: Value = match response.json().await {
            Ok(data) => data,
            Err(e) => {
                let latency = started.elapsed().as_secs_f64();
                return LlmResponse::failure(
                    self.id(),
                    &self.config.model,
                    latency,
                    format!("malformed response: {e}"),
                );
            }
        };
        let latency = started.elapsed().as_secs_f64();

        let candidates = data
            .get("candidates")
            .and_then(|c| c.as_array())
            .cloned()
            .unwrap_or_default();
        if candidates.is_empty() {
            return LlmResponse::failure(
                self.id(),
                &self.config.model,
                latency,
                "empty response: no candidates returned",
            );
        }

        let content = match candidates[0]
            .get("content")
            .and_then(|content| content.get("parts"))
            .and_then(|parts| parts.get(0))
            .and_then(|part| part.get("text"))
            .and_then(|text| text.as_str())
        {
            Some(content) => content.to_string(),
            None => {
                return LlmResponse::failure(
                    self.id(),
                    &self.config.model,
                    latency,
                    "malformed response: no text in candidate",
                )
            }
        };

        let usage = data.get("usageMetadata");
        let prompt_tokens = usage
            .and_then(|u| u.get("promptTokenCount"))
            .and_then(|t| t.as_u64())
            .unwrap_or(0) as u32;
        let completion_tokens = usage
            .and_then(|u| u.get("candidatesTokenCount"))
            .and_then(|t| t.as_u64())
            .unwrap_or(0) as u32;
        let tokens_used = prompt_tokens + completion_tokens;

        let mut metadata = std::collections::HashMap::new();
        if let Some(finish_reason) = candidates[0].get("finishReason") {
            metadata.insert("finish_reason".to_string(), finish_reason.clone());
        }
        metadata.insert("prompt_tokens".to_string(), json!(prompt_tokens));
        metadata.insert("completion_tokens".to_string(), json!(completion_tokens));
        if let Some(safety_ratings) = candidates[0].get("safetyRatings") {
            metadata.insert("safety_ratings".to_string(), safety_ratings.clone());
        }

        debug!(provider = %self.id(), tokens_used, latency, "generation complete");

        LlmResponse::success(
            self.id(),
            content,
            &self.config.model,
            latency,
            tokens_used,
            metadata,
        )
    }

    async fn close(&self) {
        let mut guard = self.client.write().await;
        *guard = None;
    }
}
