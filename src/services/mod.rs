//! Provider adapters and the registry that constructs them

pub mod gemini;
pub mod groq;
pub mod openai;
pub mod registry;

pub use gemini::GeminiProvider;
pub use groq::GroqProvider;
pub use openai::OpenAiProvider;
pub use registry::ProviderRegistry;

#[cfg(test)]
mod tests;
