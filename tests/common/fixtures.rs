//! Test fixtures: canned responses and a scriptable stub provider

use std::collections::HashMap;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;

use ensemble::traits::Provider;
use ensemble::types::{LlmResponse, ProviderId};

/// Query whose terms all appear in the rich answer
pub const RICH_QUERY: &str = "youth housing support program";

/// A detailed, well-structured answer: markdown table, several numeric
/// tokens, a .go.kr URL, a phone number, and domain keywords. Scores well
/// above the consensus floor.
pub fn rich_content() -> String {
    "Youth housing support program overview. Eligibility requires age 19 to 34 and income \
     below 3,500,000 per month. The benefit amount is 200,000 per month for up to 12 months. \
     Applications are open until 2025-12-31.\n\n\
     | Item | Value |\n| Monthly amount | 200,000 |\n| Period | 12 months |\n\n\
     - Apply online with the required documents.\n\
     - Contact the office at 02-1234-5678 for questions.\n\n\
     See the official website at https://www.youthcenter.go.kr for the full policy details. \
     The application deadline and requirement list are posted there. Support continues while \
     eligibility holds."
        .to_string()
}

/// Success envelope for the rich answer, slow (2.5s)
pub fn rich_response(provider: ProviderId) -> LlmResponse {
    LlmResponse::success(
        provider,
        rich_content(),
        "rich-model",
        2.5,
        420,
        HashMap::new(),
    )
}

/// Success envelope for a 10-character generic answer, fast (0.5s)
pub fn short_response(provider: ProviderId) -> LlmResponse {
    LlmResponse::success(provider, "No idea...", "short-model", 0.5, 8, HashMap::new())
}

/// Failure envelope tagged as a timeout
pub fn timeout_response(provider: ProviderId) -> LlmResponse {
    LlmResponse::failure(provider, "slow-model", 30.0, "timeout after 30s")
}

/// Scriptable provider stub returning a canned envelope
pub struct StubProvider {
    id: ProviderId,
    response: LlmResponse,
    delay: Option<Duration>,
    panics: bool,
    close_calls: Arc<AtomicUsize>,
}

impl StubProvider {
    pub fn new(id: ProviderId, response: LlmResponse) -> Self {
        Self {
            id,
            response,
            delay: None,
            panics: false,
            close_calls: Arc::new(AtomicUsize::new(0)),
        }
    }

    /// Sleep this long inside `generate`, to exercise real concurrency
    pub fn with_delay(mut self, delay: Duration) -> Self {
        self.delay = Some(delay);
        self
    }

    /// Panic inside `generate`, to exercise the orchestrator's task boundary
    pub fn panicking(mut self) -> Self {
        self.panics = true;
        self
    }

    pub fn close_counter(&self) -> Arc<AtomicUsize> {
        Arc::clone(&self.close_calls)
    }
}

#[async_trait]
impl Provider for StubProvider {
    fn id(&self) -> ProviderId {
        self.id
    }

    async fn generate<'a>(
        &self,
        _prompt: &str,
        _context: Option<&'a str>,
        _system_prompt: Option<&'a str>,
    ) -> LlmResponse {
        if self.panics {
            panic!("stub provider panic");
        }
        if let Some(delay) = self.delay {
            tokio::time::sleep(delay).await;
        }
        self.response.clone()
    }

    async fn close(&self) {
        self.close_calls.fetch_add(1, Ordering::SeqCst);
    }
}
