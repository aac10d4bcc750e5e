//! Core types used throughout the ensemble system

use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::env;
use std::fmt;

use chrono::{DateTime, Utc};

use crate::error::{EnsembleError, EnsembleResult};

/// LLM providers available in the system
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum ProviderId {
    OpenAi,
    Groq,
    Gemini,
}

impl ProviderId {
    /// All providers known to the registry
    pub const ALL: [ProviderId; 3] = [ProviderId::OpenAi, ProviderId::Groq, ProviderId::Gemini];

    pub fn as_str(&self) -> &'static str {
        match self {
            ProviderId::OpenAi => "openai",
            ProviderId::Groq => "groq",
            ProviderId::Gemini => "gemini",
        }
    }

    /// Comma-separated list of known provider names, for error messages
    pub fn known_names() -> String {
        Self::ALL
            .iter()
            .map(|p| p.as_str())
            .collect::<Vec<_>>()
            .join(", ")
    }

    /// Default model for this provider
    pub fn default_model(&self) -> &'static str {
        match self {
            ProviderId::OpenAi => "gpt-4o-mini",
            ProviderId::Groq => "llama-3.1-70b-versatile",
            ProviderId::Gemini => "gemini-1.5-pro",
        }
    }
}

impl fmt::Display for ProviderId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

impl std::str::FromStr for ProviderId {
    type Err = EnsembleError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "openai" => Ok(ProviderId::OpenAi),
            "groq" => Ok(ProviderId::Groq),
            "gemini" | "google" => Ok(ProviderId::Gemini),
            other => Err(EnsembleError::UnknownProvider {
                name: other.to_string(),
                available: ProviderId::known_names(),
            }),
        }
    }
}

/// Immutable per-provider configuration; never mutated after construction
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ProviderConfig {
    pub api_key: String,
    pub model: String,
    pub temperature: f32,
    pub max_tokens: u32,
    pub timeout_seconds: u64,
}

impl ProviderConfig {
    pub fn new(api_key: impl Into<String>, model: impl Into<String>) -> Self {
        Self {
            api_key: api_key.into(),
            model: model.into(),
            ..Self::default()
        }
    }
}

impl Default for ProviderConfig {
    fn default() -> Self {
        Self {
            api_key: String::new(),
            model: String::new(),
            temperature: 0.7,
            max_tokens: 2000,
            timeout_seconds: 30,
        }
    }
}

/// A single provider's generation outcome, success or failure
///
/// Invariant: `success == false` implies empty content and a non-empty error.
/// Latency is measured wall-clock seconds; zero only on immediate
/// configuration-level rejection.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LlmResponse {
    pub provider: ProviderId,
    pub content: String,
    pub model: String,
    pub latency: f64,
    pub tokens_used: u32,
    pub success: bool,
    pub error: Option<String>,
    pub metadata: HashMap<String, serde_json::Value>,
}

impl LlmResponse {
    /// Build a successful envelope
    pub fn success(
        provider: ProviderId,
        content: impl Into<String>,
        model: impl Into<String>,
        latency: f64,
        tokens_used: u32,
        metadata: HashMap<String, serde_json::Value>,
    ) -> Self {
        Self {
            provider,
            content: content.into(),
            model: model.into(),
            latency,
            tokens_used,
            success: true,
            error: None,
            metadata,
        }
    }

    /// Build a failed envelope; content is always empty on failure
    pub fn failure(
        provider: ProviderId,
        model: impl Into<String>,
        latency: f64,
        error: impl Into<String>,
    ) -> Self {
        let error = error.into();
        let error = if error.is_empty() {
            "unknown error".to_string()
        } else {
            error
        };
        Self {
            provider,
            content: String::new(),
            model: model.into(),
            latency,
            tokens_used: 0,
            success: false,
            error: Some(error),
            metadata: HashMap::new(),
        }
    }
}

/// Strategy for selecting one response among the successful envelopes
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub enum SelectionStrategy {
    /// Highest composite evaluation score (default)
    #[default]
    BestQuality,
    /// Lowest measured latency among successes. Selection still waits for
    /// every provider to settle, so this changes the criterion, not the
    /// wait time. Ties go to the first provider in dispatch order
    /// (lexicographic by provider id), which is an arbitrary choice.
    Fastest,
    /// Highest-scoring response among those at or above the consensus
    /// floor; falls back to BestQuality when nothing reaches it
    Consensus,
}

impl SelectionStrategy {
    pub fn as_str(&self) -> &'static str {
        match self {
            SelectionStrategy::BestQuality => "best_quality",
            SelectionStrategy::Fastest => "fastest",
            SelectionStrategy::Consensus => "consensus",
        }
    }
}

impl fmt::Display for SelectionStrategy {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

impl std::str::FromStr for SelectionStrategy {
    type Err = EnsembleError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "best_quality" => Ok(SelectionStrategy::BestQuality),
            "fastest" => Ok(SelectionStrategy::Fastest),
            "consensus" => Ok(SelectionStrategy::Consensus),
            other => Err(EnsembleError::ConfigError {
                message: format!(
                    "unknown selection strategy '{other}'. valid options: best_quality, fastest, consensus"
                ),
            }),
        }
    }
}

/// Top-level ensemble configuration
///
/// Providers without an API key are skipped at construction time rather
/// than failing startup.
#[derive(Debug, Clone)]
pub struct OrchestratorConfig {
    pub openai_api_key: Option<String>,
    pub groq_api_key: Option<String>,
    pub gemini_api_key: Option<String>,

    pub openai_model: String,
    pub groq_model: String,
    pub gemini_model: String,

    pub enabled_providers: Vec<ProviderId>,
    pub strategy: SelectionStrategy,
    pub timeout_seconds: u64,
    pub temperature: f32,
    pub max_tokens: u32,
}

impl Default for OrchestratorConfig {
    fn default() -> Self {
        Self {
            openai_api_key: None,
            groq_api_key: None,
            gemini_api_key: None,
            openai_model: ProviderId::OpenAi.default_model().to_string(),
            groq_model: ProviderId::Groq.default_model().to_string(),
            gemini_model: ProviderId::Gemini.default_model().to_string(),
            enabled_providers: ProviderId::ALL.to_vec(),
            strategy: SelectionStrategy::default(),
            timeout_seconds: 30,
            temperature: 0.7,
            max_tokens: 2000,
        }
    }
}

impl OrchestratorConfig {
    /// Load configuration from environment variables
    ///
    /// Environment variables:
    /// - OPENAI_API_KEY / GROQ_API_KEY / GEMINI_API_KEY: provider credentials
    /// - OPENAI_MODEL / GROQ_MODEL / GEMINI_MODEL: model overrides
    /// - ENSEMBLE_PROVIDERS: comma-separated provider list (default: all)
    /// - ENSEMBLE_STRATEGY: best_quality|fastest|consensus
    /// - ENSEMBLE_TIMEOUT_SECONDS: per-provider request timeout
    pub fn from_env() -> EnsembleResult<Self> {
        let mut config = Self {
            openai_api_key: env::var("OPENAI_API_KEY").ok().filter(|k| !k.is_empty()),
            groq_api_key: env::var("GROQ_API_KEY").ok().filter(|k| !k.is_empty()),
            gemini_api_key: env::var("GEMINI_API_KEY").ok().filter(|k| !k.is_empty()),
            ..Self::default()
        };

        if let Ok(model) = env::var("OPENAI_MODEL") {
            config.openai_model = model;
        }
        if let Ok(model) = env::var("GROQ_MODEL") {
            config.groq_model = model;
        }
        if let Ok(model) = env::var("GEMINI_MODEL") {
            config.gemini_model = model;
        }

        if let Ok(providers) = env::var("ENSEMBLE_PROVIDERS") {
            config.enabled_providers = providers
                .split(',')
                .map(|name| name.trim().parse())
                .collect::<Result<Vec<ProviderId>, _>>()?;
        }

        if let Ok(strategy) = env::var("ENSEMBLE_STRATEGY") {
            config.strategy = strategy.parse()?;
        }

        if let Ok(timeout) = env::var("ENSEMBLE_TIMEOUT_SECONDS") {
            config.timeout_seconds =
                timeout
                    .parse()
                    .map_err(|e| EnsembleError::ConfigError {
                        message: format!("invalid ENSEMBLE_TIMEOUT_SECONDS '{timeout}': {e}"),
                    })?;
        }

        Ok(config)
    }

    /// Expand into one immutable `ProviderConfig` per known provider
    ///
    /// Providers with no credential get an empty api_key and are filtered
    /// out later by the registry.
    pub fn provider_configs(&self) -> HashMap<ProviderId, ProviderConfig> {
        let mut configs = HashMap::new();
        for provider in ProviderId::ALL {
            let (api_key, model) = match provider {
                ProviderId::OpenAi => (&self.openai_api_key, &self.openai_model),
                ProviderId::Groq => (&self.groq_api_key, &self.groq_model),
                ProviderId::Gemini => (&self.gemini_api_key, &self.gemini_model),
            };
            configs.insert(
                provider,
                ProviderConfig {
                    api_key: api_key.clone().unwrap_or_default(),
                    model: model.clone(),
                    temperature: self.temperature,
                    max_tokens: self.max_tokens,
                    timeout_seconds: self.timeout_seconds,
                },
            );
        }
        configs
    }
}

/// Metadata attached to every orchestrator result
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ResultMetadata {
    pub timestamp: DateTime<Utc>,
    pub providers_invoked: Vec<ProviderId>,
    pub success_count: usize,
    pub scores: HashMap<ProviderId, f64>,
}

/// Terminal output of one orchestrator `generate` call
///
/// `selected_provider == None` is the sentinel for "no provider succeeded";
/// `selected_text` then carries a fixed fallback message and the call still
/// returns `Ok`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct OrchestratorResult {
    pub selected_text: String,
    pub all_responses: Vec<LlmResponse>,
    /// Sorted descending by composite score
    pub evaluations: Vec<crate::core::evaluator::EvaluationResult>,
    pub selected_provider: Option<ProviderId>,
    pub total_latency: f64,
    pub strategy_used: SelectionStrategy,
    pub metadata: ResultMetadata,
}
