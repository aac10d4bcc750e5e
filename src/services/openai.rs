//! OpenAI chat-completions adapter

use std::time::{Duration, Instant};

use async_trait::async_trait;
use serde_json::{json, Value};
use tokio::sync::RwLock;
use tracing::{debug, error};

use crate::core::prompt::build_messages;
use crate::traits::Provider;
use crate::types::{LlmResponse, ProviderConfig, ProviderId};

const DEFAULT_ENDPOINT: &str = "https://api.openai.com";

/// Adapter for the OpenAI chat-completions API
pub struct OpenAiProvider {
    config: ProviderConfig,
    endpoint: String,
    client: RwLock<Option<reqwest::Client>>,
}

impl OpenAiProvider {
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

    /// Lazily build the long-lived HTTP session, reused across calls
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
}

#[async_trait]
impl Provider for OpenAiProvider {
    fn id(&self) -> ProviderId {
        ProviderId::OpenAi
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
            // Config-level rejection before any I/O; latency stays zero
            Err(e) => return LlmResponse::failure(self.id(), &self.config.model, 0.0, e),
        };

        let messages = build_messages(prompt, context, system_prompt);
        let payload = json!({
            "model": self.config.model,
            "messages": messages,
            "temperature": self.config.temperature,
            "max_tokens": self.config.max_tokens,
        });

        let response = match client
            .post(format!("{}/v1/chat/completions", self.endpoint))
            .bearer_auth(&self.config.api_key)
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

        let content = match data
            .get("choices")
            .and_then(|choices| choices.get(0))
            .and_then(|choice| choice.get("message"))
            .and_then(|message| message.get("content"))
            .and_then(|content| content.as_str())
        {
            Some(content) => content.to_string(),
            None => {
                return LlmResponse::failure(
                    self.id(),
                    &self.config.model,
                    latency,
                    "malformed response: no content in choices",
                )
            }
        };

        let usage = data.get("usage");
        let tokens_used = usage
            .and_then(|u| u.get("total_tokens"))
            .and_then(|t| t.as_u64())
            .unwrap_or(0) as u32;

        let mut metadata = std::collections::HashMap::new();
        if let Some(finish_reason) = data
            .get("choices")
            .and_then(|choices| choices.get(0))
            .and_then(|choice| choice.get("finish_reason"))
        {
            metadata.insert("finish_reason".to_string(), finish_reason.clone());
        }
        if let Some(usage) = usage {
            metadata.insert(
                "prompt_tokens".to_string(),
                usage.get("prompt_tokens").cloned().unwrap_or(json!(0)),
            );
            metadata.insert(
                "completion_tokens".to_string(),
                usage.get("completion_tokens").cloned().unwrap_or(json!(0)),
            );
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
