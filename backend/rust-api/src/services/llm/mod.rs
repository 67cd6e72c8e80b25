//! Text-completion clients used by the quiz generator.

pub mod error;
pub mod gemini;
pub mod mock;

use async_trait::async_trait;
use serde::Serialize;

pub use error::ProviderError;
pub use gemini::GeminiProvider;
pub use mock::MockProvider;

/// A model that turns a prompt into text.
#[async_trait]
pub trait LlmProvider: Send + Sync {
    fn name(&self) -> &str;

    /// Model identifier requests are sent to.
    fn model(&self) -> &str;

    async fn complete(&self, prompt: &str) -> Result<String, ProviderError>;
}

#[derive(Debug, Clone, Serialize)]
pub struct ModelInfo {
    pub name: String,
    pub display_name: Option<String>,
    pub supported_methods: Vec<String>,
}
