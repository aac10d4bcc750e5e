//! Fan-out/fan-in orchestration across provider adapters
//!
//! One `generate` call dispatches every active provider concurrently, waits
//! for all of them to settle, evaluates the batch, and applies the
//! configured selection strategy. No state persists between calls.

use std::collections::HashMap;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::Instant;

use chrono::Utc;
use tracing::{error, info, warn};

use crate::core::evaluator::{EvaluationResult, ResponseEvaluator};
use crate::error::{EnsembleError, EnsembleResult};
use crate::services::ProviderRegistry;
use crate::traits::Provider;
use crate::types::{
    LlmResponse, OrchestratorConfig, OrchestratorResult, ProviderId, ResultMetadata,
    SelectionStrategy,
};

/// Returned as the selected text when every provider fails
pub const FALLBACK_RESPONSE: &str = "No provider was able to generate a response.";

/// Minimum composite score for the CONSENSUS strategy. Deliberately lower
/// than the evaluator's standalone `DEFAULT_CONSENSUS_THRESHOLD`.
const CONSENSUS_SCORE_FLOOR: f64 = 60.0;

/// Multi-provider generation orchestrator
///
/// The provider map is built once at construction and read-only during
/// `generate`; aggregation happens strictly after the join point, so no
/// locking is needed.
pub struct Orchestrator {
    providers: HashMap<ProviderId, Arc<dyn Provider>>,
    evaluator: ResponseEvaluator,
    strategy: SelectionStrategy,
    closed: AtomicBool,
}

impl Orchestrator {
    /// Build an orchestrator from configuration, activating every enabled
    /// provider that has a credential
    pub fn new(config: OrchestratorConfig) -> Self {
        let providers =
            ProviderRegistry::create_active(&config.enabled_providers, &config.provider_configs());
        info!(active = providers.len(), strategy = %config.strategy, "orchestrator initialized");
        Self::with_providers(providers, config.strategy)
    }

    /// Build an orchestrator over pre-constructed providers (dependency
    /// injection; used by tests and embedders)
    pub fn with_providers(
        providers: HashMap<ProviderId, Arc<dyn Provider>>,
        strategy: SelectionStrategy,
    ) -> Self {
        Self {
            providers,
            evaluator: ResponseEvaluator::new(),
            strategy,
            closed: AtomicBool::new(false),
        }
    }

    /// Replace the default evaluator (custom weights or keyword list)
    pub fn with_evaluator(mut self, evaluator: ResponseEvaluator) -> Self {
        self.evaluator = evaluator;
        self
    }

    /// Activation state per provider
    pub fn provider_status(&self) -> HashMap<ProviderId, bool> {
        ProviderId::ALL
            .iter()
            .map(|&id| (id, self.providers.contains_key(&id)))
            .collect()
    }

    /// Query every active provider concurrently and select one response
    ///
    /// Fails only when no providers are active. Provider-level failures are
    /// absorbed into the result; when every provider fails the result is the
    /// sentinel (no selected provider, fixed fallback text), not an error.
    pub async fn generate(
        &self,
        prompt: &str,
        context: Option<&str>,
        system_prompt: Option<&str>,
    ) -> EnsembleResult<OrchestratorResult> {
        if self.providers.is_empty() {
            return Err(EnsembleError::NoActiveProviders);
        }

        let started = Instant::now();

        // Deterministic dispatch order; also the FASTEST tie-break order
        let mut invoked: Vec<ProviderId> = self.providers.keys().copied().collect();
        invoked.sort_by_key(|id| id.as_str());

        info!(providers = invoked.len(), "dispatching parallel generation");

        let mut handles = Vec::with_capacity(invoked.len());
        for &id in &invoked {
            let provider = Arc::clone(&self.providers[&id]);
            let prompt = prompt.to_string();
            let context = context.map(str::to_string);
            let system_prompt = system_prompt.map(str::to_string);
            let handle = tokio::spawn(async move {
                provider
                    .generate(&prompt, context.as_deref(), system_prompt.as_deref())
                    .await
            });
            handles.push((id, handle));
        }

        // Join every call before evaluating; no early return even for FASTEST
        let mut responses = Vec::with_capacity(handles.len());
        for (id, handle) in handles {
            match handle.await {
                Ok(response) => responses.push(response),
                Err(e) => {
                    // A panicked adapter task must not abort the batch
                    error!(provider = %id, error = %e, "provider task failed");
                    responses.push(LlmResponse::failure(
                        id,
                        "",
                        0.0,
                        format!("provider task failed: {e}"),
                    ));
                }
            }
        }

        let total_latency = started.elapsed().as_secs_f64();

        let evaluations = self.evaluator.evaluate_all(&responses, prompt, context);
        let selected = self.select_response(&responses, &evaluations);

        let success_count = responses.iter().filter(|r| r.success).count();
        let scores = evaluations
            .iter()
            .map(|e| (e.provider, e.total_score))
            .collect();

        let result = OrchestratorResult {
            selected_text: selected
                .map(|r| r.content.clone())
                .unwrap_or_else(|| FALLBACK_RESPONSE.to_string()),
            selected_provider: selected.map(|r| r.provider),
            all_responses: responses,
            evaluations,
            total_latency,
            strategy_used: self.strategy,
            metadata: ResultMetadata {
                timestamp: Utc::now(),
                providers_invoked: invoked,
                success_count,
                scores,
            },
        };

        info!(
            selected = %result
                .selected_provider
                .map(|p| p.as_str())
                .unwrap_or("none"),
            total_latency,
            success_count,
            "parallel generation complete"
        );

        Ok(result)
    }

    /// Apply the selection strategy over the successful envelopes
    fn select_response<'a>(
        &self,
        responses: &'a [LlmResponse],
        evaluations: &[EvaluationResult],
    ) -> Option<&'a LlmResponse> {
        let successful: Vec<&LlmResponse> = responses.iter().filter(|r| r.success).collect();
        if successful.is_empty() {
            warn!("no successful responses");
            return None;
        }

        match self.strategy {
            SelectionStrategy::Fastest => {
                // min_by keeps the first of equally-fast responses, i.e. the
                // dispatch (lexicographic) order breaks ties
                successful
                    .iter()
                    .copied()
                    .min_by(|a, b| {
                        a.latency
                            .partial_cmp(&b.latency)
                            .unwrap_or(std::cmp::Ordering::Equal)
                    })
            }
            SelectionStrategy::Consensus => {
                let consensus = self.evaluator.consensus(evaluations, CONSENSUS_SCORE_FLOOR);
                if let Some(best) = consensus.first() {
                    if let Some(response) = successful
                        .iter()
                        .copied()
                        .find(|r| r.provider == best.provider)
                    {
                        return Some(response);
                    }
                }
                warn!("consensus empty, falling back to best quality");
                best_quality(&successful, evaluations)
            }
            SelectionStrategy::BestQuality => best_quality(&successful, evaluations),
        }
    }

    /// Release every provider's session; idempotent
    pub async fn close(&self) {
        if self.closed.swap(true, Ordering::SeqCst) {
            return;
        }
        for provider in self.providers.values() {
            provider.close().await;
        }
        info!("all provider sessions closed");
    }
}

/// Pick the highest-ranked evaluation whose provider produced a successful
/// envelope
fn best_quality<'a>(
    successful: &[&'a LlmResponse],
    evaluations: &[EvaluationResult],
) -> Option<&'a LlmResponse> {
    for evaluation in evaluations {
        if let Some(response) = successful
            .iter()
            .copied()
            .find(|r| r.provider == evaluation.provider)
        {
            return Some(response);
        }
    }
    successful.first().copied()
}

/// One-shot convenience: build an orchestrator, generate, and clean up
pub async fn quick_generate(
    prompt: &str,
    context: Option<&str>,
    config: OrchestratorConfig,
) -> EnsembleResult<String> {
    let orchestrator = Orchestrator::new(config);
    let result = orchestrator.generate(prompt, context, None).await;
    orchestrator.close().await;
    Ok(result?.selected_text)
}
