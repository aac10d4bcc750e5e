//! Provider trait definition for dependency injection

use async_trait::async_trait;

use crate::types::{LlmResponse, ProviderId};

/// Uniform contract every backend adapter implements
///
/// `generate` is infallible by type: adapters convert every failure mode
/// (timeout, transport error, non-success status, malformed payload) into a
/// failed `LlmResponse` so one misbehaving backend can never abort a batch.
#[mockall::automock]
#[async_trait]
pub trait Provider: Send + Sync {
    /// Identifier of the backend this adapter talks to
    fn id(&self) -> ProviderId;

    /// Generate a completion for the prompt, optionally grounded in
    /// retrieved context and steered by a system prompt
    async fn generate<'a>(
        &self,
        prompt: &str,
        context: Option<&'a str>,
        system_prompt: Option<&'a str>,
    ) -> LlmResponse;

    /// Release the adapter's network session; safe to call more than once
    async fn close(&self);
}

impl std::fmt::Debug for dyn Provider {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Provider").field("id", &self.id()).finish()
    }
}
