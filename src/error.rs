//! Ensemble error types

use thiserror::Error;

/// Result type for ensemble operations
pub type EnsembleResult<T> = Result<T, EnsembleError>;

/// Ensemble error types
///
/// Provider-level failures (timeout, transport, protocol) never appear here:
/// adapters convert them into failed response envelopes. The only error a
/// `generate` call can return is `NoActiveProviders`.
#[derive(Error, Debug)]
pub enum EnsembleError {
    #[error("no active providers configured")]
    NoActiveProviders,

    #[error("unknown provider '{name}'. available: {available}")]
    UnknownProvider { name: String, available: String },

    #[error("configuration error: {message}")]
    ConfigError { message: String },
}
