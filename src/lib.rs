//! Multi-provider LLM generation with automatic response evaluation
//!
//! Fans a prompt out to every configured provider (OpenAI, Groq, Gemini)
//! concurrently, scores each answer against a weighted rubric, and selects
//! one response according to the configured strategy. Provider failures are
//! isolated: a timeout or protocol error in one backend never aborts the
//! batch.

pub mod core;
pub mod error;
pub mod orchestrator;
pub mod services;
pub mod traits;
pub mod types;

// Re-export main types
pub use crate::core::evaluator::{
    Criterion, EvaluationResult, EvaluationWeights, ResponseEvaluator,
    DEFAULT_CONSENSUS_THRESHOLD,
};
pub use crate::core::prompt::{build_messages, ChatMessage};
pub use error::{EnsembleError, EnsembleResult};
pub use orchestrator::{quick_generate, Orchestrator, FALLBACK_RESPONSE};
pub use services::{GeminiProvider, GroqProvider, OpenAiProvider, ProviderRegistry};
pub use traits::Provider;
pub use types::*;
